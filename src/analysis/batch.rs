// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Partition an ordered slice of records into contiguous fixed-size batches
// role: analysis/batching
// inputs: &[T], batch size
// outputs: Vec<&[T]> borrowing the input
// invariants:
// - Order preserved; concatenating batches reproduces the input
// - Every batch has `size` items except possibly the last
// - Empty input yields no batches
// errors: InvalidBatchSize when size == 0
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use super::AnalysisError;

pub const DEFAULT_BATCH_SIZE: usize = 15;

pub fn make_batches<T>(records: &[T], size: usize) -> Result<Vec<&[T]>, AnalysisError> {
  if size == 0 {
    return Err(AnalysisError::InvalidBatchSize(size));
  }

  Ok(records.chunks(size).collect())
}
