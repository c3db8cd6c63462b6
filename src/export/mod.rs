// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Write fetched pull requests to disk as JSON, CSV, or Markdown under <out>/<org>/<repo>/
// role: export/namespace
// inputs: PullRequests per repository; output root; organization name; "now"
// outputs: Files on disk; paths of written files
// side_effects: Creates directories; writes files
// invariants:
// - Repositories with no PRs are not written individually
// - Multi-repo runs also write an org-level combined artifact (CSV/Markdown)
// errors: IO errors bubble with file path context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use indexmap::IndexMap;

use crate::model::{ExportStatistics, PullRequest, StateCounts};
use crate::util::ensure_dir;

pub mod csv;
pub mod json;
pub mod markdown;

pub type RepoPrs = IndexMap<String, Vec<PullRequest>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
  Json,
  Csv,
  Markdown,
  All,
}

impl ExportFormat {
  pub fn includes_json(self) -> bool {
    matches!(self, ExportFormat::Json | ExportFormat::All)
  }
}

pub trait Exporter {
  fn name(&self) -> &'static str;

  /// Write one repository's PRs; returns the paths written.
  fn export(&self, out: &Path, org: &str, repo: &str, prs: &[PullRequest], now: DateTime<Local>) -> Result<Vec<PathBuf>>;

  /// Org-level artifact for multi-repo runs (none by default).
  fn export_index(&self, _out: &Path, _org: &str, _repos: &RepoPrs, _now: DateTime<Local>) -> Result<Vec<PathBuf>> {
    Ok(Vec::new())
  }

  fn export_multiple(&self, out: &Path, org: &str, repos: &RepoPrs, now: DateTime<Local>) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for (repo, prs) in repos {
      if !prs.is_empty() {
        written.extend(self.export(out, org, repo, prs, now)?);
      }
    }

    written.extend(self.export_index(out, org, repos, now)?);

    Ok(written)
  }
}

pub fn exporters_for(format: ExportFormat) -> Vec<Box<dyn Exporter>> {
  match format {
    ExportFormat::Json => vec![Box::new(json::JsonExporter)],
    ExportFormat::Csv => vec![Box::new(csv::CsvExporter)],
    ExportFormat::Markdown => vec![Box::new(markdown::MarkdownExporter)],
    ExportFormat::All => vec![
      Box::new(json::JsonExporter),
      Box::new(csv::CsvExporter),
      Box::new(markdown::MarkdownExporter),
    ],
  }
}

pub fn repo_dir(out: &Path, org: &str, repo: &str) -> Result<PathBuf> {
  let dir = out.join(org).join(repo);
  ensure_dir(&dir)?;
  Ok(dir)
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
  std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

/// Open first by raw state, then merged, otherwise closed.
pub fn state_counts(prs: &[PullRequest]) -> StateCounts {
  let mut counts = StateCounts::default();

  for pr in prs {
    if pr.state == "open" {
      counts.open += 1;
    } else if pr.merged_at().is_some() {
      counts.merged += 1;
    } else {
      counts.closed += 1;
    }
  }

  counts
}

/// Counts plus the date span, taking `prs` as already sorted newest first.
pub fn export_statistics(prs: &[PullRequest]) -> ExportStatistics {
  ExportStatistics {
    by_state: state_counts(prs),
    oldest: prs.last().and_then(|p| p.created_at.clone()),
    newest: prs.first().and_then(|p| p.created_at.clone()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  pub(crate) fn fixed_now() -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).single().unwrap()
  }

  pub(crate) fn sample_prs() -> Vec<PullRequest> {
    serde_json::from_value(serde_json::json!([
      {
        "number": 12, "title": "Add login, \"fast\"", "state": "closed",
        "created_at": "2024-03-01T10:00:00Z", "closed_at": "2024-03-02T10:00:00Z",
        "html_url": "https://github.com/acme/api/pull/12", "user": { "login": "dev" },
        "labels": [{ "name": "feature" }, { "name": "auth" }], "comments": 4,
        "pull_request": { "merged_at": "2024-03-02T10:00:00Z" },
        "files": [{ "filename": "a.rs", "additions": 10, "deletions": 2 }, { "filename": "b.rs", "additions": 1, "deletions": 0 }],
        "body": "Implements the login flow"
      },
      {
        "number": 7, "title": "Fix crash", "state": "open", "created_at": "2024-01-15T08:00:00Z",
        "html_url": "https://github.com/acme/api/pull/7", "user": { "login": "dev" }, "labels": [], "comments": 0
      },
      {
        "number": 3, "title": "Abandoned", "state": "closed", "created_at": "2023-12-01T08:00:00Z",
        "html_url": "https://github.com/acme/api/pull/3", "pull_request": { "merged_at": null }
      }
    ]))
    .unwrap()
  }

  #[test]
  fn statistics_follow_export_rules() {
    let s = export_statistics(&sample_prs());
    assert_eq!(s.by_state, StateCounts { open: 1, closed: 1, merged: 1 });
    assert_eq!(s.newest.as_deref(), Some("2024-03-01T10:00:00Z"));
    assert_eq!(s.oldest.as_deref(), Some("2023-12-01T08:00:00Z"));
  }

  #[test]
  fn all_format_writes_every_kind_and_skips_empty_repos() {
    let td = tempfile::TempDir::new().unwrap();
    let mut repos = RepoPrs::new();
    repos.insert("api".into(), sample_prs());
    repos.insert("empty".into(), Vec::new());

    for exporter in exporters_for(ExportFormat::All) {
      exporter.export_multiple(td.path(), "acme", &repos, fixed_now()).unwrap();
    }

    let api = td.path().join("acme/api");
    for f in ["pr_12.json", "pr_7.json", "pr_3.json", "summary.json", "pull_requests.csv", "pull_requests.md"] {
      assert!(api.join(f).is_file(), "missing {}", f);
    }
    assert!(!td.path().join("acme/empty").exists());
    assert!(td.path().join("acme/all_pull_requests.csv").is_file());
    assert!(td.path().join("acme/README.md").is_file());
  }
}
