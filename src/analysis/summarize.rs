// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Summarize one batch of pull requests into per-field entries plus a partial summary via one model call
// role: analysis/map-stage
// inputs: ModelClient, batch of PullRequest, requested field names
// outputs: BatchOutcome (Parsed | CallFailed | Malformed), each carrying the BatchResult to use
// side_effects: One remote completion call per batch
// invariants:
// - Always yields exactly one BatchResult per batch; failures degrade to BatchResult::empty
// - Model output is fence-stripped before JSON parsing; non-object JSON counts as malformed
// errors: None surface; call and parse failures are logged with distinct warnings
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use super::compress::compress;
use super::completion::ModelClient;
use super::fences::strip_code_fences;
use super::prompts;
use crate::model::{BatchResult, FieldMap, PullRequest};

pub const RECORD_SEPARATOR: &str = "\n\n---\n\n";
pub const BATCH_MAX_TOKENS: u32 = 4000;

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
  Parsed(BatchResult),
  CallFailed(BatchResult),
  Malformed(BatchResult),
}

impl BatchOutcome {
  pub fn into_result(self) -> BatchResult {
    match self {
      BatchOutcome::Parsed(r) | BatchOutcome::CallFailed(r) | BatchOutcome::Malformed(r) => r,
    }
  }

  pub fn is_parsed(&self) -> bool {
    matches!(self, BatchOutcome::Parsed(_))
  }
}

/// Read a value as a list of entries: arrays keep their items, a bare string is one entry.
pub(crate) fn entries_of(v: &serde_json::Value) -> Vec<String> {
  match v {
    serde_json::Value::Array(items) => items
      .iter()
      .filter_map(|item| match item {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
      })
      .collect(),
    serde_json::Value::String(s) => vec![s.clone()],
    _ => Vec::new(),
  }
}

/// Every key of a `fields` object, in reply order; anything other than an object is empty.
pub(crate) fn field_map_of(v: Option<&serde_json::Value>) -> FieldMap {
  v.and_then(|f| f.as_object())
    .map(|obj| obj.iter().map(|(k, v)| (k.clone(), entries_of(v))).collect())
    .unwrap_or_default()
}

/// Strip fences and parse; anything but a JSON object is an error.
pub(crate) fn parse_object_reply(raw: &str) -> Result<serde_json::Map<String, serde_json::Value>, String> {
  match serde_json::from_str::<serde_json::Value>(strip_code_fences(raw)) {
    Ok(serde_json::Value::Object(map)) => Ok(map),
    Ok(other) => Err(format!("expected a JSON object, got {}", json_kind(&other))),
    Err(e) => Err(e.to_string()),
  }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
  match v {
    serde_json::Value::Null => "null",
    serde_json::Value::Bool(_) => "a boolean",
    serde_json::Value::Number(_) => "a number",
    serde_json::Value::String(_) => "a string",
    serde_json::Value::Array(_) => "an array",
    serde_json::Value::Object(_) => "an object",
  }
}

pub fn batch_text(batch: &[PullRequest]) -> String {
  batch.iter().map(compress).collect::<Vec<_>>().join(RECORD_SEPARATOR)
}

pub fn summarize_batch_outcome(client: &ModelClient, batch: &[PullRequest], fields: &[String]) -> BatchOutcome {
  let prompt = prompts::batch_prompt(batch.len(), fields, &batch_text(batch));

  let reply = match client.chat(prompts::BATCH_SYSTEM, &prompt, BATCH_MAX_TOKENS) {
    Ok(r) => r,
    Err(e) => {
      tracing::warn!(error = %e, records = batch.len(), "batch completion failed; using empty result");
      return BatchOutcome::CallFailed(BatchResult::empty(fields));
    }
  };

  match parse_object_reply(&reply) {
    Ok(obj) => {
      let result = BatchResult {
        fields: field_map_of(obj.get("fields")),
        partial_summary: obj
          .get("partial_summary")
          .and_then(|s| s.as_str())
          .unwrap_or_default()
          .to_string(),
      };

      tracing::debug!(records = batch.len(), keys = result.fields.len(), "batch summarized");

      BatchOutcome::Parsed(result)
    }
    Err(e) => {
      tracing::warn!(error = %e, records = batch.len(), "batch reply is not valid JSON; using empty result");
      BatchOutcome::Malformed(BatchResult::empty(fields))
    }
  }
}

/// Summarize one batch, collapsing failures to an empty result.
///
/// The pipeline keeps the [`BatchOutcome`] to count degraded batches; callers that
/// only need the result use this.
#[cfg(any(test, feature = "testutil"))]
pub fn summarize_batch(client: &ModelClient, batch: &[PullRequest], fields: &[String]) -> BatchResult {
  summarize_batch_outcome(client, batch, fields).into_result()
}
