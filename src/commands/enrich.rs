// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Pick the enrichment mode for a path (single file, repository directory, organization directory) and run it
// role: commands/enrich
// inputs: EnrichArgs; FileSource
// outputs: EnrichStats
// side_effects: Rewrites PR JSON files; network via FileSource
// invariants:
// - With --repo, or when the directory holds pr_*.json files itself, it is treated as one repository
// - Otherwise each subdirectory is a repository
// - A single file without --repo takes its repository from its html_url, else its parent directory
// errors: Missing input path is an error
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;

use anyhow::{bail, Result};

use crate::cli::EnrichArgs;
use crate::enrichment::pr_files::{
  enrich_directory, enrich_organization, enrich_pr_file, repo_hint, EnrichOutcome, EnrichStats, FileSource,
};
use crate::store;

/// Repository for a lone file: --repo, then the PR's own URL, then the parent directory name.
fn single_file(source: &dyn FileSource, path: &Path, owner: &str, repo: Option<&str>) -> Result<EnrichStats> {
  let inferred = || {
    repo_hint(path, owner).or_else(|| {
      path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(str::to_string)
    })
  };

  let Some(repo) = repo.map(str::to_string).or_else(inferred) else {
    bail!("cannot determine the repository for {}; pass --repo", path.display());
  };

  let mut stats = EnrichStats {
    repositories: 1,
    total: 1,
    ..Default::default()
  };

  match enrich_pr_file(source, path, owner, &repo) {
    EnrichOutcome::Enriched { .. } => stats.enriched = 1,
    EnrichOutcome::Skipped => stats.skipped = 1,
    EnrichOutcome::Failed(_) => stats.failed = 1,
  }

  Ok(stats)
}

pub fn execute(source: &dyn FileSource, args: &EnrichArgs) -> Result<EnrichStats> {
  let input = args.input.as_path();

  if input.is_file() {
    return single_file(source, input, &args.owner, args.repo.as_deref());
  }

  if !input.is_dir() {
    bail!("input path not found: {}", input.display());
  }

  let holds_prs = !store::pr_files(input, false)?.is_empty();

  if args.repo.is_some() || holds_prs || args.recursive {
    tracing::info!(owner = %args.owner, repo = ?args.repo, "enriching repository directory");
    let mut stats = enrich_directory(source, input, &args.owner, args.repo.as_deref(), args.recursive)?;
    stats.repositories = 1;
    return Ok(stats);
  }

  tracing::info!(owner = %args.owner, "enriching organization directory");
  enrich_organization(source, input, &args.owner)
}

pub fn run(args: EnrichArgs) -> Result<()> {
  let client = super::github_client(&args.auth)?;

  if let Ok(rl) = client.rate_limit_status() {
    tracing::info!(remaining = rl.remaining, "rate limit before enrichment");
  }

  let stats = execute(&client, &args)?;

  println!("Total PRs: {}", stats.total);
  println!("Enriched: {}", stats.enriched);
  println!("Skipped (already enriched): {}", stats.skipped);
  println!("Failed: {}", stats.failed);
  if stats.repositories > 1 {
    println!("Repositories: {}", stats.repositories);
  }

  Ok(())
}
