// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Remote chat-completion seam (OpenAI-compatible) with HTTP, env-scripted, and in-memory backends
// role: analysis/remote-call
// inputs: CompletionRequest (model, system+user messages, temperature, max_tokens); env PRD_TEST_COMPLETIONS
// outputs: Reply text from choices[0].message.content, or a typed CompletionError
// side_effects: HTTPS POST to the completions endpoint (HTTP backend only)
// invariants:
// - Every backend is Send + Sync so batches can be dispatched from a thread pool
// - The env-scripted backend is selected whenever PRD_TEST_COMPLETIONS is set
// - Failures are values, never panics
// errors: CompletionError (status, transport, missing content, scripted)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

use crate::ext::serde_json::JsonFetch;
use crate::util::truncate_chars;

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_COMPLETIONS_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const TEMPERATURE: f32 = 0.3;

const SCRIPT_ENV: &str = "PRD_TEST_COMPLETIONS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  System,
  User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
  pub role: Role,
  pub content: String,
}

impl ChatMessage {
  pub fn system(content: impl Into<String>) -> Self {
    Self {
      role: Role::System,
      content: content.into(),
    }
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self {
      role: Role::User,
      content: content.into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
  pub model: String,
  pub messages: Vec<ChatMessage>,
  pub temperature: f32,
  pub max_tokens: u32,
}

impl CompletionRequest {
  pub fn user_prompt(&self) -> &str {
    self
      .messages
      .iter()
      .find(|m| m.role == Role::User)
      .map(|m| m.content.as_str())
      .unwrap_or("")
  }
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
  #[error("completion endpoint returned HTTP {status}: {body}")]
  Status { status: u16, body: String },
  #[error("completion transport failed: {0}")]
  Transport(String),
  #[error("completion response carried no message content")]
  MissingContent,
  #[error("scripted failure: {0}")]
  Scripted(String),
}

/// One remote chat-completion call.
pub trait CompletionApi: Send + Sync {
  fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// Connection settings for the HTTP backend.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
  pub api_key: String,
  pub url: String,
  pub timeout: Duration,
}

struct HttpCompletions {
  agent: ureq::Agent,
  api_key: String,
  url: String,
}

impl HttpCompletions {
  fn new(settings: &CompletionSettings) -> Self {
    let agent = ureq::AgentBuilder::new().timeout(settings.timeout).build();

    Self {
      agent,
      api_key: settings.api_key.clone(),
      url: settings.url.clone(),
    }
  }
}

impl CompletionApi for HttpCompletions {
  fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
    tracing::debug!(
      model = %request.model,
      max_tokens = request.max_tokens,
      prompt_chars = request.user_prompt().len(),
      "posting chat completion"
    );

    let resp = self
      .agent
      .post(&self.url)
      .set("Authorization", &format!("Bearer {}", self.api_key))
      .set("Content-Type", "application/json")
      .send_json(request);

    match resp {
      Ok(r) => {
        let v: serde_json::Value = r.into_json().map_err(|e| CompletionError::Transport(e.to_string()))?;

        v.fetch("choices.0.message.content")
          .to::<String>()
          .map(|s| s.trim().to_string())
          .ok_or(CompletionError::MissingContent)
      }
      Err(ureq::Error::Status(status, r)) => {
        let body = r.into_string().unwrap_or_default();

        Err(CompletionError::Status {
          status,
          body: truncate_chars(&body, 300).to_string(),
        })
      }
      Err(ureq::Error::Transport(t)) => Err(CompletionError::Transport(t.to_string())),
    }
  }
}

/// Replies scripted through `PRD_TEST_COMPLETIONS`: a JSON array where a string is a reply
/// and `{"error": "..."}` is a failed call. Calls past the end of the script fail.
struct EnvCompletions {
  script: Mutex<VecDeque<serde_json::Value>>,
}

impl EnvCompletions {
  fn from_env() -> Option<Self> {
    let raw = std::env::var(SCRIPT_ENV).ok()?;

    let items = match serde_json::from_str::<serde_json::Value>(&raw) {
      Ok(serde_json::Value::Array(items)) => items,
      Ok(_) | Err(_) => {
        tracing::warn!("{} is not a JSON array; every completion will fail", SCRIPT_ENV);
        Vec::new()
      }
    };

    Some(Self {
      script: Mutex::new(items.into()),
    })
  }
}

impl CompletionApi for EnvCompletions {
  fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
    let next = self
      .script
      .lock()
      .map_err(|_| CompletionError::Scripted("script lock poisoned".into()))?
      .pop_front();

    match next {
      Some(serde_json::Value::String(reply)) => Ok(reply),
      Some(other) => {
        let msg = other.fetch("error").to::<String>().unwrap_or_else(|| other.to_string());
        Err(CompletionError::Scripted(msg))
      }
      None => Err(CompletionError::Scripted("script exhausted".into())),
    }
  }
}

/// True when completions are scripted from the environment (no API key needed).
pub fn env_wants_mock() -> bool {
  std::env::var(SCRIPT_ENV).is_ok()
}

pub fn build_completions(settings: &CompletionSettings) -> Box<dyn CompletionApi> {
  if let Some(scripted) = EnvCompletions::from_env() {
    tracing::debug!("using scripted completions from {}", SCRIPT_ENV);
    return Box::new(scripted);
  }

  Box::new(HttpCompletions::new(settings))
}

/// The explicitly constructed model client handed to the summarizer and aggregator.
pub struct ModelClient {
  api: Box<dyn CompletionApi>,
  model: String,
}

impl ModelClient {
  pub fn new(api: Box<dyn CompletionApi>, model: impl Into<String>) -> Self {
    Self {
      api,
      model: model.into(),
    }
  }

  pub fn model(&self) -> &str {
    &self.model
  }

  /// Send a system persona plus one user prompt at the fixed low temperature.
  pub fn chat(&self, system: &str, user: &str, max_tokens: u32) -> Result<String, CompletionError> {
    let request = CompletionRequest {
      model: self.model.clone(),
      messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
      temperature: TEMPERATURE,
      max_tokens,
    };

    self.api.complete(&request)
  }
}

/// In-memory backend for tests: replies are handed out in order and every request is recorded.
#[cfg(any(test, feature = "testutil"))]
pub struct ScriptedCompletions {
  replies: Mutex<VecDeque<Result<String, CompletionError>>>,
  seen: std::sync::Arc<Mutex<Vec<CompletionRequest>>>,
}

#[cfg(any(test, feature = "testutil"))]
impl ScriptedCompletions {
  pub fn new(replies: Vec<Result<String, CompletionError>>) -> Self {
    Self {
      replies: Mutex::new(replies.into()),
      seen: std::sync::Arc::new(Mutex::new(Vec::new())),
    }
  }

  /// Shared handle onto the recorded requests, usable after the backend is boxed.
  pub fn recorder(&self) -> std::sync::Arc<Mutex<Vec<CompletionRequest>>> {
    self.seen.clone()
  }
}

#[cfg(any(test, feature = "testutil"))]
impl CompletionApi for ScriptedCompletions {
  fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
    if let Ok(mut seen) = self.seen.lock() {
      seen.push(request.clone());
    }

    self
      .replies
      .lock()
      .ok()
      .and_then(|mut q| q.pop_front())
      .unwrap_or_else(|| Err(CompletionError::Scripted("script exhausted".into())))
  }
}

/// Backend whose reply is computed from the request, for order-independent tests.
#[cfg(any(test, feature = "testutil"))]
pub struct FnCompletions<F>(pub F);

#[cfg(any(test, feature = "testutil"))]
impl<F> CompletionApi for FnCompletions<F>
where
  F: Fn(&CompletionRequest) -> Result<String, CompletionError> + Send + Sync,
{
  fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
    (self.0)(request)
  }
}
