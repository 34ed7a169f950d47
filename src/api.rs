//! Summarization service client.
//!
//! The service is an OpenAI-compatible chat-completions endpoint (DeepSeek by
//! default). One article is one non-streaming request carrying a fixed system
//! instruction and a user prompt rendered from [`SummarizerConfig`].
//!
//! # Architecture
//!
//! - [`Summarize`]: the capability the pipeline depends on
//! - [`ChatCompletionsClient`]: the HTTP implementation
//!
//! There is no retry: a non-success response is returned as
//! [`PipelineError::Summarization`] and aborts the run.

use crate::config::SummarizerConfig;
use crate::error::PipelineError;
use crate::utils::truncate_for_log;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Text in, summary out.
///
/// The pipeline only depends on this trait, so tests can substitute a
/// scripted summarizer for the HTTP client.
pub trait Summarize {
    /// Summarize one article body. `title` may be missing.
    ///
    /// # Arguments
    ///
    /// * `title` - Article headline, if the page had one
    /// * `content` - Full article body
    ///
    /// # Returns
    ///
    /// The summary text, or an error if the request failed.
    async fn summarize(&self, title: Option<&str>, content: &str) -> Result<String, Box<dyn Error>>;
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// HTTP client for a chat-completions endpoint.
///
/// The API key is sent as a bearer token and never appears in `Debug` output.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    api_key: String,
    config: SummarizerConfig,
}

impl fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("api_url", &self.config.api_url)
            .field("model", &self.config.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ChatCompletionsClient {
    /// Create a client for the endpoint and model in `config`.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer token for the service
    /// * `config` - Endpoint, model and prompts
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = ChatCompletionsClient::new(api_key, SummarizerConfig::load(None)?);
    /// let summary = client.summarize(Some("Headline"), "Body").await?;
    /// ```
    pub fn new(api_key: String, config: SummarizerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            config,
        }
    }

    /// System instruction plus the rendered user prompt, non-streaming.
    fn request_body(&self, title: Option<&str>, content: &str) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.config.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: self.config.render_user_prompt(title, content),
                },
            ],
            stream: false,
        }
    }
}

/// Pull the assistant text out of a chat-completions response body.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyCompletion`] if `choices` is empty, or a
/// serde error if the body is not a chat-completions response.
fn completion_text(body: &str) -> Result<String, Box<dyn Error>> {
    let response: ChatResponse = serde_json::from_str(body)?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(PipelineError::EmptyCompletion)?;
    Ok(choice.message.content)
}

impl Summarize for ChatCompletionsClient {
    /// Send one chat-completions request and return the first choice.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request cannot be sent or the body cannot be read
    /// - The status is not 2xx ([`PipelineError::Summarization`], body truncated)
    /// - The response has no choices ([`PipelineError::EmptyCompletion`])
    #[instrument(level = "info", skip_all, fields(title = title.unwrap_or("")))]
    async fn summarize(&self, title: Option<&str>, content: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(title, content))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let dt = t0.elapsed();

        if !status.is_success() {
            error!(
                status = status.as_u16(),
                elapsed_ms = dt.as_millis() as u128,
                body = %truncate_for_log(&body, 300),
                "Summarization request failed"
            );
            return Err(PipelineError::Summarization {
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            }
            .into());
        }

        let summary = completion_text(&body)?;
        info!(
            elapsed_ms = dt.as_millis() as u128,
            chars = summary.chars().count(),
            "Summarization succeeded"
        );
        Ok(summary)
    }
}

#[cfg(test)]
pub mod fake {
    use super::Summarize;
    use std::cell::RefCell;
    use std::error::Error;

    /// Echoes the title back; fails on the call number given to `failing_at`.
    #[derive(Debug, Default)]
    pub struct FakeSummarizer {
        pub calls: RefCell<Vec<Option<String>>>,
        fail_at: Option<usize>,
    }

    impl FakeSummarizer {
        /// Fails on the `call`-th request (1-based) with a 500.
        pub fn failing_at(call: usize) -> Self {
            Self {
                fail_at: Some(call),
                ..Self::default()
            }
        }
    }

    impl Summarize for FakeSummarizer {
        async fn summarize(
            &self,
            title: Option<&str>,
            _content: &str,
        ) -> Result<String, Box<dyn Error>> {
            let mut calls = self.calls.borrow_mut();
            calls.push(title.map(str::to_string));
            if self.fail_at == Some(calls.len()) {
                return Err(crate::error::PipelineError::Summarization {
                    status: 500,
                    body: "boom".to_string(),
                }
                .into());
            }
            Ok(format!("Summary of {}", title.unwrap_or("untitled")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let client = ChatCompletionsClient::new("key".to_string(), SummarizerConfig::default());
        let body = serde_json::to_value(client.request_body(Some("Headline"), "Body text")).unwrap();

        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("Headline"));
        assert!(user.contains("Body text"));
    }

    #[test]
    fn test_completion_text() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Özet"},"finish_reason":"stop"}]}"#;
        assert_eq!(completion_text(body).unwrap(), "Özet");
    }

    #[test]
    fn test_completion_without_choices() {
        let err = completion_text(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::EmptyCompletion)
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = ChatCompletionsClient::new("sk-secret".to_string(), SummarizerConfig::default());
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("deepseek-chat"));
    }
}
