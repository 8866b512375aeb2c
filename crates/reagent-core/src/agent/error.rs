#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] reagent_llm::LlmError),

    #[error("LLM request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("reached the limit of {iterations} reasoning steps without an answer")]
    MaxIterations { iterations: usize },
}
