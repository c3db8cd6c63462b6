// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Add per-file diff data (files, files_count) to stored pr_*.json files
// role: enrichment/pr-files
// inputs: PR JSON paths or directories; owner/repo; a FileSource (GitHub client or test double)
// outputs: Rewritten PR JSON files; EnrichOutcome per file and aggregated EnrichStats
// side_effects: Network calls via FileSource; rewrites files in place (pretty JSON)
// invariants:
// - Files that already carry a non-empty `files` list are skipped untouched
// - Patches are kept only when changes < PATCH_MAX_CHANGES and truncated to PATCH_MAX_CHARS
// - Unknown keys in the stored JSON are preserved
// errors: Per-file failures become EnrichOutcome::Failed; a missing directory is an error
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::ext::serde_json::JsonFetch;
use crate::github::api::GhResult;
use crate::github::GithubClient;
use crate::model::FileChange;
use crate::store;
use crate::util::truncate_chars;

pub const PATCH_MAX_CHANGES: i64 = 500;
pub const PATCH_MAX_CHARS: usize = 1500;

/// Where file lists come from.
pub trait FileSource {
  fn pr_files(&self, owner: &str, repo: &str, number: i64) -> GhResult<Vec<FileChange>>;
}

impl FileSource for GithubClient {
  fn pr_files(&self, owner: &str, repo: &str, number: i64) -> GhResult<Vec<FileChange>> {
    GithubClient::pr_files(self, owner, repo, number)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichOutcome {
  Enriched { files: usize },
  Skipped,
  Failed(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichStats {
  pub repositories: usize,
  pub total: usize,
  pub enriched: usize,
  pub skipped: usize,
  pub failed: usize,
}

impl EnrichStats {
  fn record(&mut self, outcome: &EnrichOutcome) {
    match outcome {
      EnrichOutcome::Enriched { .. } => self.enriched += 1,
      EnrichOutcome::Skipped => self.skipped += 1,
      EnrichOutcome::Failed(_) => self.failed += 1,
    }
  }

  fn absorb(&mut self, other: &EnrichStats) {
    self.total += other.total;
    self.enriched += other.enriched;
    self.skipped += other.skipped;
    self.failed += other.failed;
  }
}

/// Keep the essential fields; attach a bounded patch only for small text diffs.
pub fn simplify(files: Vec<FileChange>) -> Vec<FileChange> {
  files
    .into_iter()
    .map(|f| {
      let patch = f
        .patch
        .filter(|p| !p.is_empty() && f.changes < PATCH_MAX_CHANGES)
        .map(|p| truncate_chars(&p, PATCH_MAX_CHARS).to_string());

      FileChange { patch, ..f }
    })
    .collect()
}

/// `(owner, repo)` named by a pull request URL such as `https://github.com/acme/api/pull/12`.
pub fn repo_from_url(url: &str) -> Option<(String, String)> {
  static RE_PR_URL: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"^https?://[^/]+/([^/]+)/([^/]+)/pull/\d+/?$").unwrap());

  let caps = RE_PR_URL.captures(url.trim())?;
  Some((caps[1].to_string(), caps[2].to_string()))
}

/// Repository named by the `html_url` stored in a PR file, when it belongs to `owner`.
pub fn repo_hint(path: &Path, owner: &str) -> Option<String> {
  let text = std::fs::read_to_string(path).ok()?;
  let pr: serde_json::Value = serde_json::from_str(&text).ok()?;
  let url = pr.fetch("html_url").to::<String>()?;

  repo_from_url(&url)
    .filter(|(o, _)| o.eq_ignore_ascii_case(owner))
    .map(|(_, repo)| repo)
}

fn has_files(pr: &serde_json::Value) -> bool {
  pr.fetch("files").value().and_then(|f| f.as_array()).is_some_and(|a| !a.is_empty())
}

fn try_enrich(source: &dyn FileSource, path: &Path, owner: &str, repo: &str) -> Result<EnrichOutcome> {
  let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
  let mut pr: serde_json::Value = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;

  if has_files(&pr) {
    tracing::debug!(file = %path.display(), "already has files; skipping");
    return Ok(EnrichOutcome::Skipped);
  }

  let number = pr.fetch("number").to::<i64>().filter(|n| *n != 0);
  let Some(number) = number else {
    bail!("no PR number in {}", path.display());
  };

  let files = simplify(source.pr_files(owner, repo, number)?);
  let count = files.len();

  let Some(obj) = pr.as_object_mut() else {
    bail!("{} is not a JSON object", path.display());
  };
  obj.insert("files".into(), serde_json::to_value(&files)?);
  obj.insert("files_count".into(), serde_json::json!(count));

  let out = serde_json::to_string_pretty(&pr)?;
  std::fs::write(path, out).with_context(|| format!("writing {}", path.display()))?;

  tracing::debug!(number, files = count, "enriched PR");

  Ok(EnrichOutcome::Enriched { files: count })
}

pub fn enrich_pr_file(source: &dyn FileSource, path: &Path, owner: &str, repo: &str) -> EnrichOutcome {
  match try_enrich(source, path, owner, repo) {
    Ok(outcome) => outcome,
    Err(e) => {
      let msg = format!("{:#}", e);
      tracing::warn!(file = %path.display(), error = %msg, "enrichment failed");
      EnrichOutcome::Failed(msg)
    }
  }
}

/// Enrich every pr_*.json under `dir`. Without `repo`, each file's parent directory names it.
pub fn enrich_directory(
  source: &dyn FileSource,
  dir: &Path,
  owner: &str,
  repo: Option<&str>,
  recursive: bool,
) -> Result<EnrichStats> {
  let files = store::pr_files(dir, recursive)?;
  let mut stats = EnrichStats {
    total: files.len(),
    ..Default::default()
  };

  if files.is_empty() {
    tracing::warn!(dir = %dir.display(), "no PR files found");
    return Ok(stats);
  }

  tracing::info!(count = files.len(), dir = %dir.display(), "enriching PR files");

  for path in &files {
    let inferred = path
      .parent()
      .and_then(|p| p.file_name())
      .and_then(|n| n.to_str());

    let outcome = match repo.or(inferred) {
      Some(r) => enrich_pr_file(source, path, owner, r),
      None => {
        tracing::warn!(file = %path.display(), "cannot determine repository");
        EnrichOutcome::Failed("cannot determine repository".into())
      }
    };

    stats.record(&outcome);
  }

  Ok(stats)
}

/// Enrich each repository directory directly under `org_dir`.
pub fn enrich_organization(source: &dyn FileSource, org_dir: &Path, owner: &str) -> Result<EnrichStats> {
  if !org_dir.is_dir() {
    bail!("organization directory not found: {}", org_dir.display());
  }

  let mut repo_dirs: Vec<_> = std::fs::read_dir(org_dir)
    .with_context(|| format!("listing {}", org_dir.display()))?
    .filter_map(|e| e.ok())
    .map(|e| e.path())
    .filter(|p| p.is_dir())
    .collect();
  repo_dirs.sort();

  let mut total = EnrichStats {
    repositories: repo_dirs.len(),
    ..Default::default()
  };

  for dir in &repo_dirs {
    let name = dir.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    tracing::info!(repo = name, "enriching repository");

    let stats = enrich_directory(source, dir, owner, Some(name), false)?;
    total.absorb(&stats);
  }

  Ok(total)
}
