// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Resolve credentials and remote-service settings from flags, environment, and the gh CLI
// role: config/credentials
// inputs: Optional explicit flags; env GITHUB_TOKEN, GH_TOKEN; `gh auth token`; completion flags (clap env fallbacks already applied)
// outputs: GitHub token string; CompletionSettings
// side_effects: May spawn `gh auth token`
// invariants:
// - Token discovery order is --token, GITHUB_TOKEN, GH_TOKEN, then `gh auth token`; blank values are skipped
// - When env fixtures are active, credentials are optional
// errors: ConfigError when a required credential is missing
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::time::Duration;

use crate::analysis::completion::{self, CompletionSettings};
use crate::github::api as gh_api;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("no GitHub token found; pass --token, set GITHUB_TOKEN or GH_TOKEN, or run `gh auth login`")]
  MissingGithubToken,
  #[error("no completions API key found; pass --api-key or set GROQ_API_KEY")]
  MissingApiKey,
}

fn non_blank(s: Option<String>) -> Option<String> {
  s.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn gh_cli_token() -> Option<String> {
  let output = std::process::Command::new("gh").args(["auth", "token"]).output().ok()?;

  if !output.status.success() {
    return None;
  }

  non_blank(Some(String::from_utf8_lossy(&output.stdout).to_string()))
}

/// Discover a GitHub token: explicit flag, env vars, then `gh auth token`.
pub fn discover_github_token(explicit: Option<&str>) -> Option<String> {
  non_blank(explicit.map(str::to_string))
    .or_else(|| non_blank(std::env::var("GITHUB_TOKEN").ok()))
    .or_else(|| non_blank(std::env::var("GH_TOKEN").ok()))
    .or_else(gh_cli_token)
}

/// Token for commands that talk to GitHub; fixture runs need none.
pub fn github_token(explicit: Option<&str>) -> Result<String, ConfigError> {
  match discover_github_token(explicit) {
    Some(t) => Ok(t),
    None if gh_api::env_wants_mock() => Ok(String::new()),
    None => Err(ConfigError::MissingGithubToken),
  }
}

pub fn completion_settings(
  api_key: Option<String>,
  url: Option<String>,
  timeout_secs: u64,
) -> Result<CompletionSettings, ConfigError> {
  let api_key = match non_blank(api_key) {
    Some(k) => k,
    None if completion::env_wants_mock() => String::new(),
    None => return Err(ConfigError::MissingApiKey),
  };

  Ok(CompletionSettings {
    api_key,
    url: non_blank(url).unwrap_or_else(|| completion::DEFAULT_COMPLETIONS_URL.to_string()),
    timeout: Duration::from_secs(timeout_secs),
  })
}
