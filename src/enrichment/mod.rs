// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Namespace for enrichment of stored PRs with data fetched after export
// role: enrichment/namespace
// outputs: Public submodules implementing specific enrichments
// invariants: Each enrichment isolates external integrations behind a trait and reports per-file outcomes
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod pr_files;
