use std::collections::HashSet;

use crate::executor::{Tool, ToolError, ToolOutput};
use crate::registry::{ToolDef, ToolRegistry};

/// Owns the tools available to one agent run and dispatches calls by name.
///
/// Definitions are taken once at construction; `registry` is index-aligned with `tools`.
#[derive(Default)]
pub struct ToolSet {
    tools: Vec<Box<dyn Tool>>,
    registry: ToolRegistry,
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.registry.names())
            .finish()
    }
}

impl ToolSet {
    /// # Errors
    ///
    /// Returns `ToolError::DuplicateTool` if two tools share a name.
    pub fn new(tools: Vec<Box<dyn Tool>>) -> Result<Self, ToolError> {
        let definitions: Vec<ToolDef> = tools.iter().map(|t| t.definition()).collect();
        let mut seen = HashSet::new();
        if let Some(dup) = definitions.iter().find(|d| !seen.insert(d.id.as_str())) {
            return Err(ToolError::DuplicateTool(dup.id.clone()));
        }
        Ok(Self {
            tools,
            registry: ToolRegistry::from_definitions(definitions),
        })
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke the tool named `name` with `input`.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::UnknownTool` for an unregistered name, or the tool's own error.
    pub async fn call(
        &self,
        name: &str,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        let idx = self
            .registry
            .position(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_owned()))?;
        self.tools[idx].call(input).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::function::{FunctionTool, arithmetic_tools};

    fn arithmetic_set() -> ToolSet {
        ToolSet::new(
            arithmetic_tools()
                .into_iter()
                .map(|t| Box::new(t) as Box<dyn Tool>)
                .collect(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn dispatches_by_name() {
        let out = arithmetic_set()
            .call("multiply", json!({"a": 6, "b": 7}))
            .await
            .unwrap();
        assert_eq!(out.summary, "42");
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let err = arithmetic_set()
            .call("divide", json!({"a": 1, "b": 1}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "divide"));
    }

    #[test]
    fn duplicate_names_rejected() {
        let make = || {
            Box::new(FunctionTool::from_fn(
                "echo",
                "Echo",
                |s: String| Ok::<_, ToolError>(s),
            )) as Box<dyn Tool>
        };
        let err = ToolSet::new(vec![make(), make()]).unwrap_err();
        assert!(matches!(err, ToolError::DuplicateTool(_)));
    }

    struct CountingTool {
        definitions: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    impl Tool for CountingTool {
        fn definition(&self) -> ToolDef {
            self.definitions.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            ToolDef {
                id: "count".into(),
                description: "Counts".into(),
                schema: schemars::json_schema!({"type": "object"}),
            }
        }

        fn call(&self, _input: serde_json::Value) -> crate::executor::ToolFuture<'_> {
            Box::pin(std::future::ready(Ok(ToolOutput {
                tool_name: "count".into(),
                summary: "ok".into(),
            })))
        }
    }

    #[tokio::test]
    async fn definitions_are_read_once_at_construction() {
        let definitions = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let set = ToolSet::new(vec![Box::new(CountingTool {
            definitions: std::sync::Arc::clone(&definitions),
        })])
        .unwrap();
        for _ in 0..3 {
            set.call("count", json!({})).await.unwrap();
        }
        let _ = set.registry().format_for_prompt();
        assert_eq!(definitions.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn registry_reflects_tools() {
        let set = arithmetic_set();
        assert_eq!(set.len(), 3);
        assert_eq!(set.registry().names(), vec!["multiply", "add", "subtract"]);
    }
}
