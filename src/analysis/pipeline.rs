// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Drive compress -> batch -> summarize -> aggregate end to end with optional bounded parallel dispatch
// role: analysis/orchestration
// inputs: ModelClient, ordered PullRequests, requested field names, AnalyzeOptions (batch size, jobs)
// outputs: FinalResult
// side_effects: One completion call per batch plus one for aggregation
// invariants:
// - Batch results reach the aggregator in batch order regardless of completion order
// - Aggregation starts only after every batch has produced a result
// - One batch's failure never affects its siblings
// - Empty records or empty field list short-circuit without calling the model
// errors: AnalysisError::InvalidBatchSize is the only error returned
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use rayon::prelude::*;

use super::aggregate::aggregate;
use super::batch::{make_batches, DEFAULT_BATCH_SIZE};
use super::completion::ModelClient;
use super::summarize::{summarize_batch_outcome, BatchOutcome};
use super::AnalysisError;
use crate::model::{BatchResult, FinalResult, PullRequest};

pub const NO_DATA_SUMMARY: &str = "No data available";

#[derive(Debug, Clone, Copy)]
pub struct AnalyzeOptions {
  pub batch_size: usize,
  pub jobs: usize,
}

impl Default for AnalyzeOptions {
  fn default() -> Self {
    Self {
      batch_size: DEFAULT_BATCH_SIZE,
      jobs: 1,
    }
  }
}

fn no_data(fields: &[String]) -> FinalResult {
  FinalResult {
    fields: fields.iter().map(|f| (f.clone(), Vec::new())).collect(),
    summary: NO_DATA_SUMMARY.to_string(),
  }
}

fn run_batch(client: &ModelClient, index: usize, count: usize, batch: &[PullRequest], fields: &[String]) -> BatchOutcome {
  let _span = tracing::info_span!("batch", index = index + 1, of = count).entered();

  tracing::info!(records = batch.len(), "analyzing batch {}/{}", index + 1, count);

  summarize_batch_outcome(client, batch, fields)
}

fn summarize_all(client: &ModelClient, batches: &[&[PullRequest]], fields: &[String], jobs: usize) -> Vec<BatchOutcome> {
  let count = batches.len();

  let sequential = || {
    batches
      .iter()
      .enumerate()
      .map(|(i, b)| run_batch(client, i, count, b, fields))
      .collect::<Vec<_>>()
  };

  if jobs <= 1 || count <= 1 {
    return sequential();
  }

  match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
    Ok(pool) => pool.install(|| {
      batches
        .par_iter()
        .enumerate()
        .map(|(i, b)| run_batch(client, i, count, b, fields))
        .collect()
    }),
    Err(e) => {
      tracing::warn!(error = %e, "could not start batch worker pool; running sequentially");
      sequential()
    }
  }
}

pub fn analyze(
  client: &ModelClient,
  records: &[PullRequest],
  fields: &[String],
  options: &AnalyzeOptions,
) -> Result<FinalResult, AnalysisError> {
  let batches = make_batches(records, options.batch_size)?;

  if records.is_empty() || fields.is_empty() {
    tracing::warn!(records = records.len(), fields = fields.len(), "nothing to analyze");
    return Ok(no_data(fields));
  }

  tracing::info!(
    total = records.len(),
    batches = batches.len(),
    batch_size = options.batch_size,
    jobs = options.jobs,
    "analysis plan"
  );

  let outcomes = summarize_all(client, &batches, fields, options.jobs);

  let failed = outcomes.iter().filter(|o| !o.is_parsed()).count();
  if failed > 0 {
    tracing::warn!(failed, of = outcomes.len(), "some batches degraded to empty results");
  }

  let results: Vec<BatchResult> = outcomes.into_iter().map(BatchOutcome::into_result).collect();

  tracing::info!("aggregating {} batch results", results.len());

  Ok(aggregate(client, &results, fields, records.len()))
}
