use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::registry::ToolDef;

/// Structured result from tool execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub tool_name: String,
    pub summary: String,
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary)
    }
}

pub const MAX_TOOL_OUTPUT_CHARS: usize = 30_000;

/// Truncate tool output that exceeds `MAX_TOOL_OUTPUT_CHARS` using head+tail split.
#[must_use]
pub fn truncate_tool_output(output: &str) -> String {
    if output.len() <= MAX_TOOL_OUTPUT_CHARS {
        return output.to_string();
    }

    let half = MAX_TOOL_OUTPUT_CHARS / 2;
    let mut head_end = half;
    while !output.is_char_boundary(head_end) {
        head_end -= 1;
    }
    let mut tail_start = output.len() - half;
    while !output.is_char_boundary(tail_start) {
        tail_start += 1;
    }
    let head = &output[..head_end];
    let tail = &output[tail_start..];
    let truncated = tail_start - head_end;

    format!(
        "{head}\n\n... [truncated {truncated} chars, showing first and last ~{half} chars] ...\n\n{tail}"
    )
}

/// Errors that can occur during tool execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),

    #[error("invalid tool parameters: {message}")]
    InvalidParams { message: String },

    #[error("execution failed: {0}")]
    Execution(String),

    #[error("query failed: {0}")]
    Query(#[from] reagent_index::QueryError),
}

/// Deserialize a JSON tool input into a typed parameter struct.
///
/// # Errors
///
/// Returns `ToolError::InvalidParams` when deserialization fails.
pub fn deserialize_params<T: serde::de::DeserializeOwned>(
    input: serde_json::Value,
) -> Result<T, ToolError> {
    serde_json::from_value(input).map_err(|e| ToolError::InvalidParams {
        message: e.to_string(),
    })
}

pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<ToolOutput, ToolError>> + Send + 'a>>;

/// A named capability the agent can invoke with JSON input.
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDef;

    fn call(&self, input: serde_json::Value) -> ToolFuture<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_output_untouched() {
        assert_eq!(truncate_tool_output("revenue"), "revenue");
    }

    #[test]
    fn long_output_keeps_head_and_tail() {
        let output = format!("{}{}", "a".repeat(MAX_TOOL_OUTPUT_CHARS), "b".repeat(100));
        let truncated = truncate_tool_output(&output);
        assert!(truncated.len() < output.len());
        assert!(truncated.starts_with('a'));
        assert!(truncated.ends_with('b'));
        assert!(truncated.contains("[truncated 100 chars"));
    }

    #[test]
    fn multibyte_output_truncates_on_char_boundary() {
        let output = "é".repeat(MAX_TOOL_OUTPUT_CHARS);
        let truncated = truncate_tool_output(&output);
        assert!(truncated.contains("truncated"));
    }

    #[test]
    fn display_uses_summary() {
        let out = ToolOutput {
            tool_name: "add".into(),
            summary: "42".into(),
        };
        assert_eq!(out.to_string(), "42");
    }

    #[test]
    fn deserialize_params_reports_invalid_input() {
        #[derive(Debug, serde::Deserialize)]
        struct Params {
            #[allow(dead_code)]
            a: i64,
        }
        let err = deserialize_params::<Params>(serde_json::json!({"b": 1})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidParams { .. }));
    }
}
