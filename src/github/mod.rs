// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: GitHub REST access: the transport seam (api) and typed operations over it (client)
// role: module/aggregation
// outputs: GithubClient, GithubError, PrQuery, StateFilter
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod api;
pub mod client;

pub use api::{build_api, GithubError};
pub use client::{GithubClient, PrQuery, StateFilter};
