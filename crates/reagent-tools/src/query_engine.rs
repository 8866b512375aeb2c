use std::sync::Arc;

use reagent_index::QueryEngine;
use reagent_llm::LlmProvider;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::executor::{Tool, ToolFuture, ToolOutput, deserialize_params, truncate_tool_output};
use crate::registry::ToolDef;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryParams {
    /// A detailed plain text question
    pub input: String,
}

/// Exposes a [`QueryEngine`] to the agent under a configured name.
#[derive(Debug)]
pub struct QueryEngineTool<P> {
    engine: Arc<QueryEngine<P>>,
    name: String,
    description: String,
}

impl<P> QueryEngineTool<P> {
    #[must_use]
    pub fn new(
        engine: Arc<QueryEngine<P>>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Definition of a query tool, available before any engine exists.
#[must_use]
pub fn query_tool_definition(name: &str, description: &str) -> ToolDef {
    ToolDef {
        id: name.to_owned(),
        description: description.to_owned(),
        schema: schemars::schema_for!(QueryParams),
    }
}

impl<P: LlmProvider + 'static> Tool for QueryEngineTool<P> {
    fn definition(&self) -> ToolDef {
        query_tool_definition(&self.name, &self.description)
    }

    fn call(&self, input: serde_json::Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let question = match input {
                serde_json::Value::String(s) => s,
                other => deserialize_params::<QueryParams>(other)?.input,
            };
            tracing::debug!(tool = %self.name, %question, "querying engine");

            let response = self.engine.query(&question).await?;
            Ok(ToolOutput {
                tool_name: self.name.clone(),
                summary: truncate_tool_output(&response.answer),
            })
        })
    }
}
