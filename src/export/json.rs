// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Write one pretty JSON file per PR plus a summary.json per repository
// role: export/json
// inputs: PRs (newest first), org, repo, now
// outputs: <out>/<org>/<repo>/pr_<n>.json and summary.json
// side_effects: Creates directories; writes files
// invariants: PR files keep every key of the fetched record, so they load back through the store unchanged
// errors: IO and serialization errors bubble with file path context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use super::{export_statistics, repo_dir, Exporter};
use crate::model::{ExportSummary, PullRequest};
use crate::util::iso_now;

pub struct JsonExporter;

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
  let bytes = serde_json::to_vec_pretty(value)?;
  std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

impl Exporter for JsonExporter {
  fn name(&self) -> &'static str {
    "json"
  }

  fn export(&self, out: &Path, org: &str, repo: &str, prs: &[PullRequest], now: DateTime<Local>) -> Result<Vec<PathBuf>> {
    let dir = repo_dir(out, org, repo)?;
    let mut written = Vec::with_capacity(prs.len() + 1);

    for pr in prs {
      let path = dir.join(format!("pr_{}.json", pr.number));
      write_json(&path, pr)?;
      written.push(path);
    }

    let summary = ExportSummary {
      organization: org.to_string(),
      repository: repo.to_string(),
      total_prs: prs.len(),
      exported_at: iso_now(now),
      pr_numbers: prs.iter().map(|p| p.number).collect(),
      statistics: export_statistics(prs),
    };

    let summary_path = dir.join("summary.json");
    write_json(&summary_path, &summary)?;
    written.push(summary_path);

    tracing::info!(count = prs.len(), dir = %dir.display(), "saved PR JSON files");

    Ok(written)
  }
}
