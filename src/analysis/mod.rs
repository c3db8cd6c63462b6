// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: LLM batching pipeline that turns stored pull requests into resume-style field lists and a prose summary
// role: module/aggregation
// outputs: compress, make_batches, summarize_batch, aggregate, analyze, and the CompletionApi seam
// invariants: Model failures degrade to defined fallbacks; only caller contract violations are errors
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod aggregate;
pub mod batch;
pub mod completion;
pub mod compress;
pub mod fences;
pub mod pipeline;
pub mod prompts;
pub mod summarize;

pub use pipeline::{analyze, AnalyzeOptions};

pub const DEFAULT_FIELDS: [&str; 4] = ["Key Achievements", "Technologies Used", "Projects Completed", "Bug Fixes"];

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
  #[error("batch size must be at least 1 (got {0})")]
  InvalidBatchSize(usize),
}
