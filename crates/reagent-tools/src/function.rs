use std::fmt::Display;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::executor::{Tool, ToolError, ToolFuture, ToolOutput, deserialize_params};
use crate::registry::ToolDef;

type BoxedFn = Box<dyn Fn(serde_json::Value) -> Result<String, ToolError> + Send + Sync>;

/// A synchronous function exposed as a tool, with its schema derived from the
/// parameter type.
pub struct FunctionTool {
    def: ToolDef,
    func: BoxedFn,
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("id", &self.def.id)
            .finish_non_exhaustive()
    }
}

impl FunctionTool {
    pub fn from_fn<T, R, F>(
        name: impl Into<String>,
        description: impl Into<String>,
        func: F,
    ) -> Self
    where
        T: DeserializeOwned + JsonSchema,
        R: Display,
        F: Fn(T) -> Result<R, ToolError> + Send + Sync + 'static,
    {
        Self {
            def: ToolDef {
                id: name.into(),
                description: description.into(),
                schema: schemars::schema_for!(T),
            },
            func: Box::new(move |input| {
                let params: T = deserialize_params(input)?;
                func(params).map(|r| r.to_string())
            }),
        }
    }
}

impl Tool for FunctionTool {
    fn definition(&self) -> ToolDef {
        self.def.clone()
    }

    fn call(&self, input: serde_json::Value) -> ToolFuture<'_> {
        let result = (self.func)(input).map(|summary| ToolOutput {
            tool_name: self.def.id.clone(),
            summary,
        });
        Box::pin(std::future::ready(result))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct Operands {
    /// First integer
    pub a: i64,
    /// Second integer
    pub b: i64,
}

fn overflow(op: &str, a: i64, b: i64) -> ToolError {
    ToolError::Execution(format!("integer overflow computing {a} {op} {b}"))
}

/// `add`, `subtract` and `multiply` over 64-bit integers.
#[must_use]
pub fn arithmetic_tools() -> Vec<FunctionTool> {
    vec![
        FunctionTool::from_fn(
            "multiply",
            "Multiply two integers and returns the result integer",
            |Operands { a, b }| a.checked_mul(b).ok_or_else(|| overflow("*", a, b)),
        ),
        FunctionTool::from_fn(
            "add",
            "Add two integers and returns the result integer",
            |Operands { a, b }| a.checked_add(b).ok_or_else(|| overflow("+", a, b)),
        ),
        FunctionTool::from_fn(
            "subtract",
            "Subtract two integers and returns the result integer",
            |Operands { a, b }| a.checked_sub(b).ok_or_else(|| overflow("-", a, b)),
        ),
    ]
}
