//! Configuration, the ReAct agent loop, and the wiring that turns a [`config::Config`]
//! into indexes, query engines and tools.

pub mod agent;
pub mod bootstrap;
pub mod config;

pub use agent::{Agent, AgentError, AgentResponse, ReasoningStep};
pub use config::Config;
