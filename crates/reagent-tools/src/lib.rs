//! Tools an agent can call: query engines over indexes and plain functions.

pub mod executor;
pub mod function;
pub mod query_engine;
pub mod registry;
pub mod toolset;

pub use executor::{
    MAX_TOOL_OUTPUT_CHARS, Tool, ToolError, ToolFuture, ToolOutput, truncate_tool_output,
};
pub use function::{FunctionTool, arithmetic_tools};
pub use query_engine::{QueryEngineTool, query_tool_definition};
pub use registry::{ToolDef, ToolRegistry};
pub use toolset::ToolSet;
