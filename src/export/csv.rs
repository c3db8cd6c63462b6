// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Write PRs as RFC 4180 CSV, per repository and as an org-wide combined sheet
// role: export/csv
// inputs: PRs per repository, org, output root
// outputs: <out>/<org>/<repo>/pull_requests.csv; <out>/<org>/all_pull_requests.csv
// side_effects: Creates directories; writes files
// invariants:
// - Fields containing a comma, quote, CR or LF are quoted with inner quotes doubled
// - Rows end with CRLF
// errors: IO errors bubble with file path context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Local};

use super::{repo_dir, write_text, Exporter, RepoPrs};
use crate::model::PullRequest;
use crate::util::ensure_dir;

pub const REPO_COLUMNS: [&str; 14] = [
  "number",
  "title",
  "state",
  "is_merged",
  "author",
  "created_at",
  "updated_at",
  "closed_at",
  "merged_at",
  "url",
  "labels",
  "comments",
  "additions",
  "deletions",
];

pub const COMBINED_COLUMNS: [&str; 13] = [
  "repository",
  "number",
  "title",
  "state",
  "is_merged",
  "author",
  "created_at",
  "updated_at",
  "closed_at",
  "merged_at",
  "url",
  "labels",
  "comments",
];

pub struct CsvExporter;

pub fn escape_field(field: &str) -> Cow<'_, str> {
  if field.contains([',', '"', '\r', '\n']) {
    Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
  } else {
    Cow::Borrowed(field)
  }
}

fn push_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
  let line: Vec<Cow<'_, str>> = fields.iter().map(|f| escape_field(f.as_ref())).collect();
  out.push_str(&line.join(","));
  out.push_str("\r\n");
}

/// Line totals from enriched files, else top-level counts, else zero.
fn line_totals(pr: &PullRequest) -> (i64, i64) {
  if let Some(files) = pr.files.as_ref().filter(|f| !f.is_empty()) {
    return files.iter().fold((0, 0), |(a, d), f| (a + f.additions, d + f.deletions));
  }

  let count = |key: &str| pr.extra.get(key).and_then(|v| v.as_i64()).unwrap_or(0);
  (count("additions"), count("deletions"))
}

/// Columns shared by both sheets, from `number` through `comments`.
fn common_cells(pr: &PullRequest) -> Vec<String> {
  let opt = |s: Option<&str>| s.unwrap_or_default().to_string();

  vec![
    pr.number.to_string(),
    pr.title.clone(),
    pr.state.clone(),
    if pr.merged_at().is_some() { "Yes" } else { "No" }.to_string(),
    opt(pr.author_login()),
    opt(pr.created_at.as_deref()),
    opt(pr.updated_at.as_deref()),
    opt(pr.closed_at.as_deref()),
    opt(pr.merged_at()),
    opt(pr.html_url.as_deref()),
    pr.label_names().join(", "),
    pr.comments.to_string(),
  ]
}

pub fn render_repo(prs: &[PullRequest]) -> String {
  let mut out = String::new();
  push_row(&mut out, &REPO_COLUMNS);

  for pr in prs {
    let mut cells = common_cells(pr);
    let (additions, deletions) = line_totals(pr);
    cells.push(additions.to_string());
    cells.push(deletions.to_string());
    push_row(&mut out, &cells);
  }

  out
}

pub fn render_combined(repos: &RepoPrs) -> String {
  let mut out = String::new();
  push_row(&mut out, &COMBINED_COLUMNS);

  for (repo, prs) in repos {
    for pr in prs {
      let mut cells = vec![repo.clone()];
      cells.extend(common_cells(pr));
      push_row(&mut out, &cells);
    }
  }

  out
}

impl Exporter for CsvExporter {
  fn name(&self) -> &'static str {
    "csv"
  }

  fn export(&self, out: &Path, org: &str, repo: &str, prs: &[PullRequest], _now: DateTime<Local>) -> Result<Vec<PathBuf>> {
    let path = repo_dir(out, org, repo)?.join("pull_requests.csv");
    write_text(&path, &render_repo(prs))?;

    tracing::info!(count = prs.len(), path = %path.display(), "saved CSV");

    Ok(vec![path])
  }

  fn export_index(&self, out: &Path, org: &str, repos: &RepoPrs, _now: DateTime<Local>) -> Result<Vec<PathBuf>> {
    let org_dir = out.join(org);
    ensure_dir(&org_dir)?;

    let path = org_dir.join("all_pull_requests.csv");
    write_text(&path, &render_combined(repos))?;

    tracing::info!(path = %path.display(), "saved combined CSV");

    Ok(vec![path])
  }
}
