//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use innerspell_core::domain::InterpretationPrompt;
use innerspell_core::ports::{InterpretError, Interpreter};

#[derive(Debug, Clone)]
pub struct HttpInterpreterConfig {
    /// Base URL up to and excluding `/chat/completions`.
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
    pub max_tokens: u32,
}

impl HttpInterpreterConfig {
    /// `None` when `AI_PROVIDER_URL` is not set.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("AI_PROVIDER_URL").ok()?;

        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: std::env::var("AI_PROVIDER_API_KEY").ok(),
            model: std::env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            timeout: Duration::from_secs(
                std::env::var("AI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_tokens: 1200,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

pub struct HttpInterpreter {
    client: reqwest::Client,
    config: HttpInterpreterConfig,
}

impl HttpInterpreter {
    pub fn new(config: HttpInterpreterConfig) -> Result<Self, InterpretError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InterpretError::Provider(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn build_request<'a>(&'a self, prompt: &'a InterpretationPrompt) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: 0.8,
        }
    }
}

fn extract_content(response: ChatResponse) -> Result<String, InterpretError> {
    response
        .choices
        .into_iter()
        .filter_map(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .find(|c| !c.is_empty())
        .ok_or_else(|| InterpretError::InvalidResponse("no content in choices".to_string()))
}

#[async_trait]
impl Interpreter for HttpInterpreter {
    async fn interpret(&self, prompt: &InterpretationPrompt) -> Result<String, InterpretError> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let mut request = self.client.post(&url).json(&self.build_request(prompt));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| InterpretError::Provider(e.to_string()))?
            .error_for_status()
            .map_err(|e| InterpretError::Provider(e.to_string()))?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| InterpretError::InvalidResponse(e.to_string()))?;

        extract_content(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpreter() -> HttpInterpreter {
        HttpInterpreter::new(HttpInterpreterConfig {
            base_url: "http://localhost:9".to_string(),
            api_key: None,
            model: "test-model".to_string(),
            timeout: Duration::from_secs(1),
            max_tokens: 100,
        })
        .unwrap()
    }

    #[test]
    fn test_request_shape() {
        let interpreter = interpreter();
        let prompt = InterpretationPrompt {
            system: "be kind".to_string(),
            user: "Question: ?".to_string(),
        };

        let body = serde_json::to_value(interpreter.build_request(&prompt)).unwrap();

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Question: ?");
        assert_eq!(body["max_tokens"], 100);
    }

    #[test]
    fn test_extract_first_non_empty_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"  "}},{"message":{"content":" The Star "}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(response).unwrap(), "The Star");
    }

    #[test]
    fn test_extract_without_choices() {
        let response: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            extract_content(response),
            Err(InterpretError::InvalidResponse(_))
        ));
    }
}
