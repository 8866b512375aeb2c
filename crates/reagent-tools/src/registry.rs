use std::fmt::Write;

#[derive(Debug, Clone)]
pub struct ToolDef {
    pub id: String,
    pub description: String,
    pub schema: schemars::Schema,
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    #[must_use]
    pub fn from_definitions(tools: Vec<ToolDef>) -> Self {
        Self { tools }
    }

    /// Registration index of the tool named `id`.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.tools.iter().position(|t| t.id == id)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.id.as_str()).collect()
    }

    /// Describe every tool for the system prompt.
    #[must_use]
    pub fn format_for_prompt(&self) -> String {
        let mut out = String::new();
        for tool in &self.tools {
            format_tool(&mut out, tool);
        }
        out
    }
}

fn format_tool(out: &mut String, tool: &ToolDef) {
    let _ = writeln!(out, "> Tool Name: {}", tool.id);
    let _ = writeln!(out, "Tool Description: {}", tool.description);
    let params = params_of(&tool.schema);
    if !params.is_empty() {
        let _ = writeln!(out, "Tool Args:");
        for p in params {
            let need = if p.required { "required" } else { "optional" };
            let _ = writeln!(out, "  - {}: {} ({}, {need})", p.name, p.description, p.ty);
        }
    }
    out.push('\n');
}

struct Param<'a> {
    name: &'a str,
    description: &'a str,
    ty: &'a str,
    required: bool,
}

/// The JSON type of a property. `Option<T>` shows up either as a type array
/// containing `"null"` or as an `anyOf` with a null branch.
fn property_type(prop: &serde_json::Value) -> &str {
    match prop.get("type") {
        Some(serde_json::Value::String(ty)) => Some(ty.as_str()),
        Some(serde_json::Value::Array(types)) => types.iter().find_map(non_null),
        _ => prop
            .get("anyOf")
            .and_then(serde_json::Value::as_array)
            .and_then(|branches| branches.iter().find_map(|b| b.get("type").and_then(non_null))),
    }
    .unwrap_or("string")
}

fn non_null(ty: &serde_json::Value) -> Option<&str> {
    ty.as_str().filter(|t| *t != "null")
}

fn params_of(schema: &schemars::Schema) -> Vec<Param<'_>> {
    let Some(serde_json::Value::Object(props)) = schema.get("properties") else {
        return Vec::new();
    };
    let required: Vec<&str> = schema
        .get("required")
        .and_then(serde_json::Value::as_array)
        .map(|names| names.iter().filter_map(serde_json::Value::as_str).collect())
        .unwrap_or_default();

    props
        .iter()
        .map(|(name, prop)| Param {
            name,
            description: prop
                .get("description")
                .and_then(serde_json::Value::as_str)
                .unwrap_or(""),
            ty: property_type(prop),
            required: required.contains(&name.as_str()),
        })
        .collect()
}
