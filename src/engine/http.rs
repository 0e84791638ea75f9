use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::SummarizerConfig;
use crate::engine::traits::{Availability, SummaryEngine};
use crate::errors::{EnrichmentError, TabfeedResult};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
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

/// Summarizer backed by an OpenAI-compatible chat completions API
pub struct HttpSummaryEngine {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
}

impl HttpSummaryEngine {
    pub fn new(config: &SummarizerConfig, timeout: Duration) -> TabfeedResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_base: normalize_api_base(&config.url),
            api_key: config.api_key.clone(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl SummaryEngine for HttpSummaryEngine {
    fn availability(&self) -> Availability {
        if self.api_base.is_empty() {
            Availability::Unavailable("summarizer URL is empty".to_string())
        } else {
            Availability::Available
        }
    }

    async fn summarize(&self, instructions: &str, prompt: &str) -> Result<String, EnrichmentError> {
        let payload = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: instructions,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
        };

        let mut request = self.client.post(self.completions_url()).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EnrichmentError::Engine(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Engine(format!(
                "engine returned status {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| EnrichmentError::Engine(format!("invalid engine response: {}", e)))?;

        extract_text(parsed)
    }
}

fn extract_text(response: ChatResponse) -> Result<String, EnrichmentError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| EnrichmentError::Engine("engine returned an empty response".to_string()))
}

fn normalize_api_base(base: &str) -> String {
    base.trim()
        .trim_end_matches('/')
        .trim_end_matches("/chat/completions")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(url: &str) -> HttpSummaryEngine {
        let config = SummarizerConfig {
            url: url.to_string(),
            api_key: None,
            model: None,
        };
        HttpSummaryEngine::new(&config, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_completions_url_from_base() {
        assert_eq!(
            engine("http://localhost:11434/v1/").completions_url(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_completions_url_from_full_endpoint() {
        assert_eq!(
            engine("https://api.openai.com/v1/chat/completions").completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_default_model_and_availability() {
        let engine = engine("http://localhost:11434/v1");
        assert_eq!(engine.model, DEFAULT_MODEL);
        assert!(engine.availability().is_available());
    }

    #[test]
    fn test_extract_text() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"A summary."}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "A summary.");
    }

    #[test]
    fn test_extract_text_empty_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_text(response),
            Err(EnrichmentError::Engine(_))
        ));
    }
}
