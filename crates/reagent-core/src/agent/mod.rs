mod error;
pub mod parser;
pub mod prompt;

use std::collections::BTreeMap;
use std::time::Duration;

use reagent_llm::{LlmProvider, Message};
use reagent_tools::ToolSet;
use tracing::Instrument;

pub use error::AgentError;
pub use parser::{ParseError, ReasoningStep, parse_reasoning};

const DEFAULT_MAX_ITERATIONS: usize = 10;
const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct AgentResponse {
    pub answer: String,
    pub steps: Vec<ReasoningStep>,
    /// Tools that returned an observation, in first-use order.
    pub sources: Vec<String>,
}

/// A single-turn ReAct agent: it alternates model replies and tool observations
/// until the model produces an answer.
pub struct Agent<P> {
    provider: P,
    tools: ToolSet,
    max_iterations: usize,
    verbose: bool,
    llm_timeout: Duration,
}

impl<P: std::fmt::Debug> std::fmt::Debug for Agent<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("provider", &self.provider)
            .field("tools", &self.tools.registry().names())
            .field("max_iterations", &self.max_iterations)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider> Agent<P> {
    #[must_use]
    pub fn new(provider: P, tools: ToolSet) -> Self {
        Self {
            provider,
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            verbose: false,
            llm_timeout: DEFAULT_LLM_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.registry().names()
    }

    #[must_use]
    pub fn prompts(&self) -> BTreeMap<&'static str, String> {
        prompt::prompt_templates(self.tools.registry())
    }

    /// Answer `question`, calling tools as the model requests them.
    ///
    /// Tool failures and malformed replies are fed back to the model as observations.
    ///
    /// # Errors
    ///
    /// Returns an error if the LLM call fails or times out, or if no answer arrives
    /// within the iteration budget.
    pub async fn chat(&self, question: &str) -> Result<AgentResponse, AgentError> {
        let mut messages = vec![
            Message::system(prompt::render_system_header(self.tools.registry())),
            Message::user(question),
        ];
        let mut steps = Vec::new();
        let mut sources: Vec<String> = Vec::new();

        for iteration in 0..self.max_iterations {
            let reply = self.call_llm(&messages, iteration).await?;

            let step = match parse_reasoning(&reply) {
                Ok(step) => step,
                Err(err) => {
                    tracing::warn!(iteration, %err, "unparseable agent reply");
                    messages.push(Message::assistant(reply));
                    let observation = prompt::format_reminder(&err);
                    self.record(&mut steps, ReasoningStep::Observation { observation });
                    push_observation(&mut messages, &steps);
                    continue;
                }
            };

            match step {
                ReasoningStep::Answer { ref answer, .. } => {
                    let answer = answer.clone();
                    self.record(&mut steps, step);
                    return Ok(AgentResponse {
                        answer,
                        steps,
                        sources,
                    });
                }
                ReasoningStep::Action {
                    ref action,
                    ref input,
                    ..
                } => {
                    let observation = match self.tools.call(action, input.clone()).await {
                        Ok(output) => {
                            if !sources.contains(action) {
                                sources.push(action.clone());
                            }
                            output.summary
                        }
                        Err(err) => {
                            tracing::warn!(tool = %action, %err, "tool call failed");
                            format!("Error: {err}")
                        }
                    };
                    messages.push(Message::assistant(step.to_string()));
                    self.record(&mut steps, step);
                    self.record(&mut steps, ReasoningStep::Observation { observation });
                    push_observation(&mut messages, &steps);
                }
                ReasoningStep::Observation { .. } => {}
            }
        }

        tracing::warn!(
            iterations = self.max_iterations,
            "agent stopped without an answer"
        );
        Err(AgentError::MaxIterations {
            iterations: self.max_iterations,
        })
    }

    async fn call_llm(&self, messages: &[Message], iteration: usize) -> Result<String, AgentError> {
        let span = tracing::info_span!("llm_call", provider = self.provider.name(), iteration);
        let chat = self.provider.chat(messages).instrument(span);
        match tokio::time::timeout(self.llm_timeout, chat).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AgentError::Timeout {
                seconds: self.llm_timeout.as_secs(),
            }),
        }
    }

    fn record(&self, steps: &mut Vec<ReasoningStep>, step: ReasoningStep) {
        if self.verbose {
            tracing::info!("{step}");
        } else {
            tracing::debug!("{step}");
        }
        steps.push(step);
    }
}

fn push_observation(messages: &mut Vec<Message>, steps: &[ReasoningStep]) {
    if let Some(step @ ReasoningStep::Observation { .. }) = steps.last() {
        messages.push(Message::user(step.to_string()));
    }
}
