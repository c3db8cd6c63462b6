// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Merge per-batch results into one FinalResult via a second model call, with a deterministic manual fallback
// role: analysis/reduce-stage
// inputs: ModelClient, ordered BatchResults, requested field names, total record count
// outputs: FinalResult whose fields are exactly the requested names, in request order
// side_effects: At most one remote completion call
// invariants:
// - Fallback runs on call failure or an unparseable/non-object reply, never after a successful parse
// - Fallback dedup keeps first-seen order; summary falls back to a fixed sentence
// - An empty batch list never reaches the model
// errors: None surface; the aggregator always produces a FinalResult
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashSet;

use super::completion::ModelClient;
use super::prompts;
use super::summarize::{field_map_of, parse_object_reply};
use crate::model::{BatchResult, FieldMap, FinalResult};

pub const AGGREGATE_MAX_TOKENS: u32 = 6000;
pub const FALLBACK_SUMMARY: &str = "Analysis completed successfully.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatePath {
  Model,
  Fallback,
}

/// Reorder and fill `fields` so it has exactly the requested keys, dropping everything else.
fn conform(mut fields: FieldMap, requested: &[String]) -> FieldMap {
  requested
    .iter()
    .map(|name| (name.clone(), fields.swap_remove(name).unwrap_or_default()))
    .collect()
}

pub fn manual_merge(batch_results: &[BatchResult], fields: &[String]) -> FinalResult {
  let mut merged = FieldMap::new();

  for name in fields {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut entries: Vec<String> = Vec::new();

    for entry in batch_results.iter().filter_map(|r| r.fields.get(name)).flatten() {
      if seen.insert(entry.as_str()) {
        entries.push(entry.clone());
      }
    }

    merged.insert(name.clone(), entries);
  }

  let summaries: Vec<&str> = batch_results
    .iter()
    .map(|r| r.partial_summary.as_str())
    .filter(|s| !s.is_empty())
    .collect();

  let summary = if summaries.is_empty() {
    FALLBACK_SUMMARY.to_string()
  } else {
    summaries.join(" ")
  };

  FinalResult { fields: merged, summary }
}

pub fn aggregate_with_path(
  client: &ModelClient,
  batch_results: &[BatchResult],
  fields: &[String],
  total: usize,
) -> (FinalResult, AggregatePath) {
  if batch_results.is_empty() {
    return (manual_merge(batch_results, fields), AggregatePath::Fallback);
  }

  let results_json = match serde_json::to_string_pretty(batch_results) {
    Ok(s) => s,
    Err(e) => {
      tracing::warn!(error = %e, "could not serialize batch results; merging manually");
      return (manual_merge(batch_results, fields), AggregatePath::Fallback);
    }
  };

  let summary_lines = batch_results
    .iter()
    .enumerate()
    .map(|(i, r)| format!("Batch {}: {}", i + 1, r.partial_summary))
    .collect::<Vec<_>>()
    .join("\n");

  let prompt = prompts::aggregate_prompt(batch_results.len(), &results_json, &summary_lines, total, fields);

  let reply = match client.chat(prompts::AGGREGATE_SYSTEM, &prompt, AGGREGATE_MAX_TOKENS) {
    Ok(r) => r,
    Err(e) => {
      tracing::warn!(error = %e, "aggregation completion failed; merging manually");
      return (manual_merge(batch_results, fields), AggregatePath::Fallback);
    }
  };

  match parse_object_reply(&reply) {
    Ok(obj) => {
      let result = FinalResult {
        fields: conform(field_map_of(obj.get("fields")), fields),
        summary: obj.get("summary").and_then(|s| s.as_str()).unwrap_or_default().to_string(),
      };

      (result, AggregatePath::Model)
    }
    Err(e) => {
      tracing::warn!(error = %e, "aggregation reply is not valid JSON; merging manually");
      (manual_merge(batch_results, fields), AggregatePath::Fallback)
    }
  }
}

pub fn aggregate(client: &ModelClient, batch_results: &[BatchResult], fields: &[String], total: usize) -> FinalResult {
  aggregate_with_path(client, batch_results, fields, total).0
}
