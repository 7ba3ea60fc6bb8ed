//! OpenAI-compatible chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::recommendations::{Prompt, ServiceUnavailable, TextGenerator};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Longest error body kept in a `ServiceUnavailable::Status`.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl OpenAiClient {
    /// An empty or missing key leaves the client unconfigured.
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, ServiceUnavailable> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceUnavailable::Network(e.to_string()))?;
        Ok(Self::with_client(base_url, api_key, http))
    }

    pub fn with_client(base_url: &str, api_key: Option<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            http,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: &Prompt, model: &str) -> Result<String, ServiceUnavailable> {
        let key = self.api_key.as_deref().ok_or(ServiceUnavailable::NotConfigured)?;
        let request = ChatRequest {
            model,
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
            temperature: prompt.temperature,
            max_tokens: prompt.max_tokens,
        };

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceUnavailable::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ServiceUnavailable::Status {
                status: status.as_u16(),
                body: truncate(body),
            });
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ServiceUnavailable::Malformed(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ServiceUnavailable::Malformed("no message content".to_string()))?;

        debug!(kind = prompt.kind.as_str(), model, chars = content.len(), "Chat completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::recommendations::PromptKind;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn prompt() -> Prompt {
        Prompt {
            kind: PromptKind::DeviceOptimization,
            system: "You are an advisor".into(),
            user: "Device: heat pump".into(),
            temperature: 0.5,
            max_tokens: 1000,
        }
    }

    #[tokio::test]
    async fn sends_chat_request_with_bearer_key() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk-test");
                assert_eq!(body["model"], "gpt-4o-mini");
                assert_eq!(body["messages"][0]["role"], "system");
                assert_eq!(body["messages"][1]["content"], "Device: heat pump");
                assert_eq!(body["max_tokens"], 1000);
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "1. Clean the filter"}}]
                }))
            }),
        );
        let base = serve(router).await;
        let client = OpenAiClient::new(&base, Some("sk-test".into()), Duration::from_secs(5)).unwrap();

        let text = client.generate(&prompt(), "gpt-4o-mini").await.unwrap();
        assert_eq!(text, "1. Clean the filter");
    }

    #[tokio::test]
    async fn maps_error_status() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base = serve(router).await;
        let client = OpenAiClient::new(&base, Some("sk-test".into()), Duration::from_secs(5)).unwrap();

        let err = client.generate(&prompt(), "m").await.unwrap_err();
        assert_eq!(
            err,
            ServiceUnavailable::Status {
                status: 429,
                body: "slow down".into()
            }
        );
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn empty_choices_are_malformed() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({"choices": []})) }),
        );
        let base = serve(router).await;
        let client = OpenAiClient::new(&base, Some("sk-test".into()), Duration::from_secs(5)).unwrap();

        let err = client.generate(&prompt(), "m").await.unwrap_err();
        assert!(matches!(err, ServiceUnavailable::Malformed(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        // Bind then drop so nothing listens on the port.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OpenAiClient::new(
            &format!("http://{}", addr),
            Some("sk-test".into()),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = client.generate(&prompt(), "m").await.unwrap_err();
        assert!(matches!(err, ServiceUnavailable::Network(_)));
    }

    #[test]
    fn blank_key_is_unconfigured() {
        let client = OpenAiClient::new(DEFAULT_BASE_URL, Some("  ".into()), Duration::from_secs(1)).unwrap();
        assert!(!client.is_configured());
        let client = OpenAiClient::new(DEFAULT_BASE_URL, None, Duration::from_secs(1)).unwrap();
        assert!(!client.is_configured());
    }
}
