// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Subcommand orchestration: wire normalized config to GitHub, store, export, enrichment and analysis
// role: commands/namespace
// inputs: Effective configs from cli::normalize_*; resolved "now"
// outputs: Files on disk; human-readable results on stdout
// side_effects: Network, filesystem, stdout
// invariants: Logs go to stderr via tracing; only results are printed to stdout
// errors: anyhow with context; contract errors exit non-zero
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::Result;

use crate::cli::TokenArgs;
use crate::config;
use crate::github::{build_api, GithubClient};

pub mod account;
pub mod analyze;
pub mod enrich;
pub mod fetch;

/// Build a GitHub client from the token discovery chain.
pub fn github_client(auth: &TokenArgs) -> Result<GithubClient> {
  let token = config::github_token(auth.token.as_deref())?;

  Ok(GithubClient::new(build_api(token, auth.api_url.clone())))
}
