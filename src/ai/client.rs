// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Blocking chat-completions client for DeepSeek with bounded exponential-backoff retry
// role: ai/client
// inputs: API key, endpoint URL, model name, prompt text; RetryPolicy and an injectable sleeper
// outputs: Trimmed completion text or a typed ApiError
// side_effects: HTTPS POST per attempt; progress lines on stdout; sleeps between attempts
// invariants:
// - At most policy.max_attempts requests per generate call
// - Delay before attempt n+1 is base * 2^(n-1); no jitter
// - Only 429, 5xx, timeouts, transport failures and empty choice lists are retried
// - Ok(text) is never empty
// errors: ApiError (thiserror); Exhausted wraps the last retryable failure
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ui;

pub const DEFAULT_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek-reasoner";
pub const MAX_OUTPUT_TOKENS: u32 = 8000;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("API returned HTTP {code}: {body}")]
  Status { code: u16, body: String },

  #[error("request timed out")]
  Timeout,

  #[error("network error: {0}")]
  Transport(String),

  #[error("API returned no completions")]
  NoCompletions,

  #[error("could not parse API response: {0}")]
  Malformed(String),

  #[error("API returned an empty message")]
  EmptyContent,

  #[error("giving up after {attempts} attempts: {last}")]
  Exhausted { attempts: u32, last: Box<ApiError> },
}

impl ApiError {
  pub fn is_retryable(&self) -> bool {
    match self {
      ApiError::Status { code, .. } => *code == 429 || *code >= 500,
      ApiError::Timeout | ApiError::Transport(_) | ApiError::NoCompletions => true,
      ApiError::Malformed(_) | ApiError::EmptyContent | ApiError::Exhausted { .. } => false,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts including the first request.
  pub max_attempts: u32,
  pub base_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_attempts: 3, base_delay: Duration::from_millis(1000) }
  }
}

impl RetryPolicy {
  /// Delay after failed attempt `attempt` (1-based).
  pub fn delay_for(&self, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    self.base_delay.saturating_mul(factor)
  }
}

/// Seam between command handlers and the HTTP client.
pub trait TextGenerator {
  fn generate(&self, prompt: &str) -> Result<String, ApiError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessage<'a>>,
  max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
  role: &'a str,
  content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Option<Vec<Choice>>,
}

#[derive(Deserialize)]
struct Choice {
  #[serde(default)]
  message: Option<ReplyMessage>,
}

#[derive(Deserialize)]
struct ReplyMessage {
  #[serde(default)]
  content: Option<String>,
  #[serde(default)]
  reasoning_content: Option<String>,
}

pub type Sleeper = Box<dyn Fn(Duration) + Send + Sync>;

pub struct DeepSeekClient {
  api_key: String,
  url: String,
  model: String,
  agent: ureq::Agent,
  policy: RetryPolicy,
  sleeper: Sleeper,
}

impl fmt::Debug for DeepSeekClient {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DeepSeekClient")
      .field("api_key", &"<redacted>")
      .field("url", &self.url)
      .field("model", &self.model)
      .field("policy", &self.policy)
      .finish_non_exhaustive()
  }
}

impl DeepSeekClient {
  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      api_key: api_key.into(),
      url: DEFAULT_API_URL.to_string(),
      model: DEFAULT_MODEL.to_string(),
      agent: build_agent(REQUEST_TIMEOUT),
      policy: RetryPolicy::default(),
      sleeper: Box::new(std::thread::sleep),
    }
  }

  pub fn with_url(mut self, url: impl Into<String>) -> Self {
    self.url = url.into();
    self
  }

  pub fn with_model(mut self, model: impl Into<String>) -> Self {
    self.model = model.into();
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.agent = build_agent(timeout);
    self
  }

  pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn with_sleeper<F>(mut self, sleeper: F) -> Self
  where
    F: Fn(Duration) + Send + Sync + 'static,
  {
    self.sleeper = Box::new(sleeper);
    self
  }

  fn attempt(&self, request: &ChatRequest<'_>) -> Result<String, ApiError> {
    let resp = self
      .agent
      .post(&self.url)
      .set("Authorization", &format!("Bearer {}", self.api_key))
      .send_json(request);

    match resp {
      Ok(r) => {
        let text = r.into_string().map_err(|e| ApiError::Transport(e.to_string()))?;
        parse_completion(&text)
      }
      Err(ureq::Error::Status(code, r)) => {
        let body = r.into_string().unwrap_or_default();
        Err(ApiError::Status { code, body })
      }
      Err(ureq::Error::Transport(t)) => Err(classify_transport(&t)),
    }
  }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
  ureq::AgentBuilder::new().timeout(timeout).build()
}

fn classify_transport(t: &ureq::Transport) -> ApiError {
  let text = t.to_string();
  let timed_out = std::error::Error::source(t)
    .and_then(|s| s.downcast_ref::<std::io::Error>())
    .map(|e| matches!(e.kind(), std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock))
    .unwrap_or(false);

  if timed_out || text.contains("timed out") {
    ApiError::Timeout
  } else {
    ApiError::Transport(text)
  }
}

/// Take `choices[0].message.content` and strip surrounding whitespace and quotes.
fn parse_completion(text: &str) -> Result<String, ApiError> {
  let parsed: ChatResponse = serde_json::from_str(text).map_err(|e| ApiError::Malformed(e.to_string()))?;

  let Some(first) = parsed.choices.and_then(|c| c.into_iter().next()) else {
    return Err(ApiError::NoCompletions);
  };

  let message = first.message;
  if let Some(reasoning) = message.as_ref().and_then(|m| m.reasoning_content.as_deref()) {
    tracing::debug!(reasoning_chars = reasoning.chars().count(), "model returned reasoning");
  }

  let content = message.and_then(|m| m.content).unwrap_or_default();
  let cleaned = clean_reply(&content);

  if cleaned.is_empty() {
    Err(ApiError::EmptyContent)
  } else {
    Ok(cleaned)
  }
}

fn clean_reply(content: &str) -> String {
  content.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace()).to_string()
}

fn report_failure(err: &ApiError, attempt: u32, max: u32) {
  match err {
    ApiError::Status { code, body } => {
      ui::warn(&format!("API Error (attempt {}/{}): {}", attempt, max, code));
      if !body.trim().is_empty() {
        ui::dim(&format!("Response: {}", body.trim()));
      }
    }
    ApiError::NoCompletions => ui::warn(&format!("No response from API (attempt {}/{})", attempt, max)),
    ApiError::Timeout => ui::warn(&format!("Request timeout (attempt {}/{})", attempt, max)),
    ApiError::Transport(msg) => ui::warn(&format!("Network error (attempt {}/{}): {}", attempt, max, msg)),
    other => ui::warn(&format!("Error calling DeepSeek API (attempt {}/{}): {}", attempt, max, other)),
  }
}

impl TextGenerator for DeepSeekClient {
  fn generate(&self, prompt: &str) -> Result<String, ApiError> {
    let request = ChatRequest {
      model: &self.model,
      messages: vec![ChatMessage { role: "user", content: prompt }],
      max_tokens: MAX_OUTPUT_TOKENS,
    };
    let max = self.policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
      ui::dim(&format!("Calling {} (attempt {}/{})...", self.model, attempt, max));
      tracing::debug!(url = %self.url, model = %self.model, attempt, prompt_chars = prompt.chars().count(), "chat completion request");

      let err = match self.attempt(&request) {
        Ok(text) => return Ok(text),
        Err(err) => err,
      };

      tracing::debug!(attempt, error = %err, retryable = err.is_retryable(), "chat completion failed");
      report_failure(&err, attempt, max);

      if !err.is_retryable() {
        return Err(err);
      }
      if attempt >= max {
        return Err(ApiError::Exhausted { attempts: max, last: Box::new(err) });
      }

      let delay = self.policy.delay_for(attempt);
      ui::dim(&format!("Retrying in {}ms...", delay.as_millis()));
      (self.sleeper)(delay);
      attempt += 1;
    }
  }
}
