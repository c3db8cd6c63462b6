// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Load stored PRs, run the batching pipeline, and write the analysis report as YAML or JSON
// role: commands/analyze
// inputs: AnalyzeConfig; ModelClient; now
// outputs: AnalysisReport written to the output path; summary preview on stdout
// side_effects: Reads PR files; completion calls; writes the report file
// invariants:
// - metadata.analyzed_at comes from the effective "now"
// - Field order in the report follows the requested field list
// - Model failures never fail the command; they surface as fallback content
// errors: Missing input directory, missing API key, invalid batch size, and write failures
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use crate::analysis::completion::{build_completions, ModelClient};
use crate::analysis::{analyze, AnalyzeOptions};
use crate::cli::{AnalyzeConfig, ReportFormat};
use crate::config;
use crate::model::{AnalysisReport, ReportMetadata};
use crate::store;
use crate::util::{ensure_dir, iso_now};

const PREVIEW_LINES: usize = 5;

pub fn build_report(client: &ModelClient, cfg: &AnalyzeConfig, now: DateTime<Local>) -> Result<AnalysisReport> {
  let prs = store::load_prs(&cfg.input, cfg.recursive)?;
  let statistics = store::statistics(&prs);

  tracing::info!(
    prs = prs.len(),
    batch_size = cfg.batch_size,
    jobs = cfg.jobs,
    model = client.model(),
    "analysis plan"
  );

  let options = AnalyzeOptions {
    batch_size: cfg.batch_size,
    jobs: cfg.jobs,
  };
  let result = analyze(client, &prs, &cfg.fields, &options)?;

  Ok(AnalysisReport {
    metadata: ReportMetadata {
      total_prs: prs.len(),
      input_path: cfg.input.display().to_string(),
      analyzed_at: iso_now(now),
      statistics,
    },
    fields: result.fields,
    summary: result.summary,
  })
}

pub fn render_report(report: &AnalysisReport, format: ReportFormat) -> Result<String> {
  match format {
    ReportFormat::Yaml => Ok(serde_yaml::to_string(report)?),
    ReportFormat::Json => Ok(serde_json::to_string_pretty(report)? + "\n"),
  }
}

pub fn write_report(path: &Path, report: &AnalysisReport, format: ReportFormat) -> Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    ensure_dir(parent)?;
  }

  let text = render_report(report, format)?;
  std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

pub fn run(cfg: AnalyzeConfig, now: DateTime<Local>) -> Result<()> {
  let settings = config::completion_settings(cfg.api_key.clone(), cfg.completions_url.clone(), cfg.timeout_secs)?;
  let client = ModelClient::new(build_completions(&settings), cfg.model.clone());

  let report = build_report(&client, &cfg, now)?;
  write_report(&cfg.output, &report, cfg.format)?;

  println!("Analyzed {} PRs; report saved to {}", report.metadata.total_prs, cfg.output.display());

  let lines: Vec<&str> = report.summary.lines().collect();
  for line in lines.iter().take(PREVIEW_LINES) {
    println!("  {}", line);
  }
  if lines.len() > PREVIEW_LINES {
    println!("  ... ({} more lines)", lines.len() - PREVIEW_LINES);
  }

  Ok(())
}
