//! The text-completion provider boundary.
//!
//! A provider takes one rendered [`Prompt`] and returns the raw reply text.
//! It knows nothing about codes or suggestions; decoding happens afterwards.

use std::future::Future;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{Error, Result, prompt::Prompt};

/// Abstraction over an external text-completion service.
///
/// Implementations must not retry on their own; retry policy belongs to the
/// caller.
pub trait SuggestionProvider: Send + Sync {
  /// Send `prompt` and return the reply text.
  ///
  /// Returns [`Error::EmptyResponse`] if the service answered without text.
  fn complete<'a>(
    &'a self,
    prompt: &'a Prompt,
  ) -> impl Future<Output = Result<String>> + Send + 'a;
}

// ─── OpenAI-compatible chat completions ──────────────────────────────────────

/// Connection settings for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsConfig {
  /// Base URL without the endpoint path, e.g. `https://api.openai.com/v1`.
  pub base_url:    String,
  pub model:       String,
  /// Sent as a bearer token when present.
  pub api_key:     Option<String>,
  pub temperature: f32,
}

/// A [`SuggestionProvider`] backed by an OpenAI-compatible chat endpoint.
///
/// Clones share the inner [`reqwest::Client`] connection pool.
#[derive(Clone)]
pub struct ChatCompletionsProvider {
  client: Client,
  config: ChatCompletionsConfig,
}

impl ChatCompletionsProvider {
  pub fn new(config: ChatCompletionsConfig) -> Result<Self> {
    let client = Client::builder().build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
  }

  async fn send(&self, prompt: &Prompt) -> Result<String> {
    let body = json!({
      "model": self.config.model,
      "temperature": self.config.temperature,
      "messages": [
        { "role": "system", "content": prompt.system },
        { "role": "user", "content": prompt.user },
      ],
    });

    let mut request = self.client.post(self.url()).json(&body);
    if let Some(key) = &self.config.api_key {
      request = request.bearer_auth(key);
    }

    let resp = request
      .send()
      .await
      .map_err(|e| Error::Unavailable(format!("request failed: {e}")))?;

    let status = resp.status();
    let text = resp
      .text()
      .await
      .map_err(|e| Error::Unavailable(format!("reading response body: {e}")))?;

    if !status.is_success() {
      return Err(Error::Unavailable(format!("{status}: {}", text.trim())));
    }

    extract_reply(&text)
  }
}

impl SuggestionProvider for ChatCompletionsProvider {
  fn complete<'a>(
    &'a self,
    prompt: &'a Prompt,
  ) -> impl Future<Output = Result<String>> + Send + 'a {
    self.send(prompt)
  }
}

// ─── Response envelope ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: Message,
}

#[derive(Deserialize)]
struct Message {
  content: Option<String>,
}

/// Pull the first choice's message text out of a chat-completions body.
fn extract_reply(body: &str) -> Result<String> {
  let parsed: ChatResponse =
    serde_json::from_str(body).map_err(|e| Error::InvalidBody(e.to_string()))?;

  parsed
    .choices
    .into_iter()
    .next()
    .and_then(|c| c.message.content)
    .filter(|content| !content.trim().is_empty())
    .ok_or(Error::EmptyResponse)
}
