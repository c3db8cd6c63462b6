// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Load stored pr_*.json files and compute summary statistics over them
// role: storage/local
// inputs: Directory path, recursive flag
// outputs: Vec<PullRequest> newest first; PrStatistics
// side_effects: Reads files
// invariants:
// - Only files named pr_*.json are loaded; summary.json and others are ignored
// - Unreadable or malformed files are logged and skipped
// - Sorted by created_at descending; records without created_at sort last
// errors: Missing directory is an error; individual file failures are not
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

use crate::model::{DateRange, PrStatistics, PullRequest};

pub fn is_pr_file(path: &Path) -> bool {
  let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
    return false;
  };

  name.starts_with("pr_") && name.ends_with(".json")
}

/// Paths of pr_*.json files under `dir`, in path order.
pub fn pr_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
  if !dir.is_dir() {
    bail!("input directory not found: {}", dir.display());
  }

  let walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
  let walker = if recursive { walker } else { walker.max_depth(1) };

  let mut out = Vec::new();

  for entry in walker {
    let entry = match entry {
      Ok(e) => e,
      Err(e) => {
        tracing::warn!(error = %e, "skipping unreadable directory entry");
        continue;
      }
    };

    if entry.file_type().is_file() && is_pr_file(entry.path()) {
      out.push(entry.into_path());
    }
  }

  Ok(out)
}

pub fn read_pr(path: &Path) -> Result<PullRequest> {
  let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

  serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Newest first by created_at; missing timestamps go last, ties keep input order.
pub fn sort_newest_first(prs: &mut [PullRequest]) {
  prs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

pub fn load_prs(dir: &Path, recursive: bool) -> Result<Vec<PullRequest>> {
  let files = pr_files(dir, recursive)?;

  tracing::info!(count = files.len(), dir = %dir.display(), "found PR files");

  let mut prs: Vec<PullRequest> = files
    .iter()
    .filter_map(|path| match read_pr(path) {
      Ok(pr) => Some(pr),
      Err(e) => {
        tracing::warn!(error = %format!("{:#}", e), "skipping PR file");
        None
      }
    })
    .collect();

  sort_newest_first(&mut prs);

  Ok(prs)
}

pub fn statistics(prs: &[PullRequest]) -> PrStatistics {
  let mut stats = PrStatistics {
    total: prs.len(),
    ..Default::default()
  };

  for pr in prs {
    let state = if pr.merged_at().is_some() {
      "merged".to_string()
    } else if pr.state.is_empty() {
      "unknown".to_string()
    } else {
      pr.state.clone()
    };

    *stats.by_state.entry(state).or_default() += 1;

    for label in &pr.labels {
      let name = if label.name.is_empty() { "unknown" } else { label.name.as_str() };
      *stats.by_labels.entry(name.to_string()).or_default() += 1;
    }
  }

  let dates = prs.iter().filter_map(|p| p.created_at.as_deref()).filter(|d| !d.is_empty());

  stats.date_range = DateRange {
    oldest: dates.clone().min().map(str::to_string),
    newest: dates.max().map(str::to_string),
  };

  stats
}
