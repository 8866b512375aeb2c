use std::future::Future;
use std::time::Duration;

use ollama_rs::Ollama;
use ollama_rs::generation::chat::ChatMessage;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message, Role};

const DEFAULT_PORT: u16 = 11434;

#[derive(Debug)]
pub struct ModelInfo {
    pub context_length: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Ollama,
    model: String,
    embedding_model: String,
    request_timeout: Duration,
}

impl OllamaProvider {
    #[must_use]
    pub fn new(base_url: &str, model: String, embedding_model: String) -> Self {
        let (host, port) = parse_host_port(base_url);
        Self {
            client: Ollama::new(host, port),
            model,
            embedding_model,
            request_timeout: Duration::from_secs(120),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Context window of the chat model, as reported by `/api/show`.
    ///
    /// # Errors
    ///
    /// Fails when the server cannot be reached or does not know the model.
    pub async fn fetch_model_info(&self) -> Result<ModelInfo, LlmError> {
        let info = self
            .client
            .show_model_info(self.model.clone())
            .await
            .map_err(|e| LlmError::Other(format!("show {}: {e}", self.model)))?;

        let from_metadata = info
            .model_info
            .iter()
            .filter(|(key, _)| key.ends_with(".context_length"))
            .find_map(|(_, value)| value.as_u64())
            .and_then(|n| usize::try_from(n).ok());

        Ok(ModelInfo {
            context_length: from_metadata.or_else(|| parse_num_ctx(&info.parameters)),
        })
    }

    /// Lists local models as a cheap reachability probe.
    ///
    /// # Errors
    ///
    /// Fails when nothing answers at the configured base URL.
    pub async fn health_check(&self) -> Result<(), LlmError> {
        match self.client.list_local_models().await {
            Ok(models) => {
                tracing::debug!(models = models.len(), "ollama reachable");
                Ok(())
            }
            Err(e) => Err(LlmError::Other(format!(
                "Ollama is not reachable, start it with `ollama serve`: {e}"
            ))),
        }
    }

    async fn with_deadline<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, LlmError>>,
    ) -> Result<T, LlmError> {
        tokio::time::timeout(self.request_timeout, fut)
            .await
            .map_err(|_| LlmError::Timeout {
                operation,
                seconds: self.request_timeout.as_secs(),
            })?
    }
}

impl LlmProvider for OllamaProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let ollama_messages: Vec<ChatMessage> = messages.iter().map(convert_message).collect();
        let request = ChatMessageRequest::new(self.model.clone(), ollama_messages);

        let response = self
            .with_deadline("Ollama chat request", async {
                self.client
                    .send_chat_messages(request)
                    .await
                    .map_err(|e| LlmError::Other(format!("Ollama chat request failed: {e}")))
            })
            .await?;

        tracing::debug!(
            model = %self.model,
            len = response.message.content.len(),
            "ollama chat completed"
        );
        Ok(response.message.content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let request = GenerateEmbeddingsRequest::new(
            self.embedding_model.clone(),
            EmbeddingsInput::from(text),
        );

        let response = self
            .with_deadline("Ollama embedding request", async {
                self.client
                    .generate_embeddings(request)
                    .await
                    .map_err(|e| LlmError::Other(format!("Ollama embedding request failed: {e}")))
            })
            .await?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse {
                provider: "ollama".into(),
            })
    }

    fn supports_embeddings(&self) -> bool {
        true
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ollama"
    }
}

fn convert_message(msg: &Message) -> ChatMessage {
    let text = msg.content.clone();
    match msg.role {
        Role::System => ChatMessage::system(text),
        Role::Assistant => ChatMessage::assistant(text),
        Role::User => ChatMessage::user(text),
    }
}

/// `num_ctx` from the `parameters` block of `/api/show`, one `key value` per line.
fn parse_num_ctx(parameters: &str) -> Option<usize> {
    parameters.lines().find_map(|line| {
        let (key, value) = line.trim().split_once(char::is_whitespace)?;
        if key == "num_ctx" {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

/// ollama-rs wants the host and port separately.
fn parse_host_port(url: &str) -> (String, u16) {
    let url = url.trim_end_matches('/');
    match url.rsplit_once(':').map(|(host, port)| (host, port.parse::<u16>())) {
        Some((host, Ok(port))) => (host.to_owned(), port),
        _ => (url.to_owned(), DEFAULT_PORT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OllamaProvider {
        OllamaProvider::new("http://localhost:11434", "llama3".into(), "embed".into())
    }

    #[test]
    fn accessors_report_configured_models() {
        let provider = OllamaProvider::new(
            "http://localhost:11434",
            "llama3".into(),
            "nomic-embed-text".into(),
        );
        assert_eq!(provider.model(), "llama3");
        assert_eq!(provider.embedding_model(), "nomic-embed-text");
    }

    #[test]
    fn default_timeout_is_two_minutes() {
        assert_eq!(provider().request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn with_timeout_overrides_default() {
        let p = provider().with_timeout(Duration::from_secs(5));
        assert_eq!(p.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn name_and_embedding_support() {
        let p = provider();
        assert_eq!(p.name(), "ollama");
        assert!(p.supports_embeddings());
    }

    #[test]
    fn context_length_read_from_show_parameters() {
        let params = "stop \"<|eot_id|>\"\nnum_ctx                        8192\ntemperature 0.1";
        assert_eq!(parse_num_ctx(params), Some(8192));
        assert_eq!(parse_num_ctx("num_ctxx 4096"), None);
        assert_eq!(parse_num_ctx("num_ctx lots"), None);
        assert_eq!(parse_num_ctx(""), None);
    }

    #[test]
    fn base_url_split_into_host_and_port() {
        let cases = [
            ("http://localhost:11434", "http://localhost", 11434),
            ("http://gpu-box:8080/", "http://gpu-box", 8080),
            ("http://localhost", "http://localhost", DEFAULT_PORT),
            ("http://localhost:abc", "http://localhost:abc", DEFAULT_PORT),
        ];
        for (url, host, port) in cases {
            assert_eq!(parse_host_port(url), (host.to_owned(), port), "{url}");
        }
    }

    #[test]
    fn convert_message_keeps_content() {
        for msg in [
            Message::system("rules"),
            Message::user("question"),
            Message::assistant("answer"),
        ] {
            assert_eq!(convert_message(&msg).content, msg.content);
        }
    }

    #[tokio::test]
    async fn health_check_unreachable_server_fails() {
        let p = OllamaProvider::new("http://127.0.0.1:1", "m".into(), "e".into())
            .with_timeout(Duration::from_secs(2));
        assert!(p.health_check().await.is_err());
    }

    #[tokio::test]
    async fn chat_unreachable_server_fails() {
        let p = OllamaProvider::new("http://127.0.0.1:1", "m".into(), "e".into())
            .with_timeout(Duration::from_secs(2));
        let result = p.chat(&[Message::user("hi")]).await;
        assert!(result.is_err());
    }
}
