// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Render PRs as a readable Markdown report per repository plus an org README index
// role: export/markdown
// inputs: PRs per repository, org, output root, now
// outputs: <out>/<org>/<repo>/pull_requests.md; <out>/<org>/README.md
// side_effects: Creates directories; writes files
// invariants: Description previews are at most 200 characters plus an ellipsis
// errors: IO errors bubble with file path context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Local};

use super::{repo_dir, state_counts, write_text, Exporter, RepoPrs};
use crate::model::{LifecycleState, PullRequest};
use crate::util::{ensure_dir, truncate_chars};

pub const PREVIEW_CHARS: usize = 200;

const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct MarkdownExporter;

fn status_line(pr: &PullRequest) -> &'static str {
  if pr.state == "open" {
    return "🟢 Open";
  }

  match pr.lifecycle() {
    LifecycleState::Merged => "🟣 Merged",
    _ => "🔴 Closed",
  }
}

fn preview(body: &str) -> String {
  let head = truncate_chars(body, PREVIEW_CHARS);
  if head.len() < body.len() {
    format!("{}...", head)
  } else {
    head.to_string()
  }
}

fn render_pr(out: &mut String, pr: &PullRequest) {
  let _ = writeln!(out, "### #{} - {}\n", pr.number, pr.title);
  let _ = writeln!(out, "**Status:** {}\n", status_line(pr));
  let _ = writeln!(out, "**Author:** @{}\n", pr.author_login().unwrap_or("unknown"));
  let _ = writeln!(out, "**Created:** {}\n", pr.created_at.as_deref().unwrap_or("N/A"));

  if let Some(closed) = pr.closed_at.as_deref().filter(|s| !s.is_empty()) {
    let _ = writeln!(out, "**Closed:** {}\n", closed);
  }

  if let Some(merged) = pr.merged_at() {
    let _ = writeln!(out, "**Merged:** {}\n", merged);
  }

  if !pr.labels.is_empty() {
    let labels: Vec<String> = pr.label_names().iter().map(|l| format!("`{}`", l)).collect();
    let _ = writeln!(out, "**Labels:** {}\n", labels.join(", "));
  }

  let url = pr.html_url.as_deref().unwrap_or_default();
  let _ = writeln!(out, "**URL:** [{}]({})\n", url, url);

  if let Some(body) = pr.body.as_deref().filter(|b| !b.is_empty()) {
    let _ = writeln!(out, "**Description:**\n```\n{}\n```\n", preview(body));
  }

  out.push_str("---\n\n");
}

pub fn render_repo(org: &str, repo: &str, prs: &[PullRequest], now: DateTime<Local>) -> String {
  let mut out = String::new();

  let _ = writeln!(out, "# Pull Requests - {}/{}\n", org, repo);
  let _ = writeln!(out, "**Total PRs:** {}\n", prs.len());
  let _ = writeln!(out, "**Exported:** {}\n", now.format(STAMP_FORMAT));

  if !prs.is_empty() {
    let counts = state_counts(prs);
    out.push_str("## Statistics\n\n");
    let _ = writeln!(out, "- Open: {}", counts.open);
    let _ = writeln!(out, "- Merged: {}", counts.merged);
    let _ = writeln!(out, "- Closed: {}\n", counts.closed);
  }

  out.push_str("## Pull Requests\n\n");

  for pr in prs {
    render_pr(&mut out, pr);
  }

  out
}

pub fn render_index(org: &str, repos: &RepoPrs, now: DateTime<Local>) -> String {
  let total: usize = repos.values().map(Vec::len).sum();
  let mut out = String::new();

  let _ = writeln!(out, "# Pull Requests Report - {}\n", org);
  let _ = writeln!(out, "**Exported:** {}\n", now.format(STAMP_FORMAT));
  let _ = writeln!(out, "**Total Repositories:** {}\n", repos.len());
  let _ = writeln!(out, "**Total PRs:** {}\n", total);
  out.push_str("## Repositories\n\n");

  for (repo, prs) in repos {
    let _ = writeln!(out, "### {}\n", repo);
    let _ = writeln!(out, "- Total PRs: {}", prs.len());

    if !prs.is_empty() {
      let counts = state_counts(prs);
      let _ = writeln!(out, "- Open: {}", counts.open);
      let _ = writeln!(out, "- Merged: {}", counts.merged);
      let _ = writeln!(out, "- Closed: {}", counts.closed);
    }

    let _ = writeln!(out, "- [View Details]({}/pull_requests.md)\n", repo);
  }

  out
}

impl Exporter for MarkdownExporter {
  fn name(&self) -> &'static str {
    "markdown"
  }

  fn export(&self, out: &Path, org: &str, repo: &str, prs: &[PullRequest], now: DateTime<Local>) -> Result<Vec<PathBuf>> {
    let path = repo_dir(out, org, repo)?.join("pull_requests.md");
    write_text(&path, &render_repo(org, repo, prs, now))?;

    tracing::info!(count = prs.len(), path = %path.display(), "saved Markdown");

    Ok(vec![path])
  }

  fn export_index(&self, out: &Path, org: &str, repos: &RepoPrs, now: DateTime<Local>) -> Result<Vec<PathBuf>> {
    let org_dir = out.join(org);
    ensure_dir(&org_dir)?;

    let path = org_dir.join("README.md");
    write_text(&path, &render_index(org, repos, now))?;

    Ok(vec![path])
  }
}
