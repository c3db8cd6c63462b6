// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Fetch PRs for one repository or every repository of an org, export them, and optionally enrich with files
// role: commands/fetch
// inputs: FetchConfig; GithubClient; now
// outputs: Export files under <output>/<org>/; FetchReport
// side_effects: Network; filesystem writes
// invariants:
// - Author defaults to the authenticated user
// - A failing repository in a multi-repo run contributes an empty list instead of aborting
// - Nothing is written when no PRs match
// errors: GitHub errors for the single-repo path, user lookup, and repo listing abort the run
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use crate::cli::FetchConfig;
use crate::enrichment::pr_files::{enrich_directory, enrich_organization, EnrichStats};
use crate::export::{exporters_for, RepoPrs};
use crate::github::GithubClient;

#[derive(Debug, Default)]
pub struct FetchReport {
  pub author: String,
  pub repositories: usize,
  pub total_prs: usize,
  pub enrichment: Option<EnrichStats>,
}

fn resolve_author(client: &GithubClient, cfg: &FetchConfig) -> Result<String> {
  match &cfg.author {
    Some(a) => Ok(a.clone()),
    None => client.current_user().context("looking up the authenticated user"),
  }
}

pub fn execute(client: &GithubClient, cfg: &FetchConfig, now: DateTime<Local>) -> Result<FetchReport> {
  let author = resolve_author(client, cfg)?;
  let mut query = cfg.query.clone();
  query.author = author.clone();

  tracing::info!(author = %author, org = %cfg.org, repo = ?cfg.repo, "fetching pull requests");

  let exporters = exporters_for(cfg.format);
  let mut report = FetchReport {
    author,
    ..Default::default()
  };

  match &cfg.repo {
    Some(repo) => {
      let prs = client
        .pull_requests(&cfg.org, repo, &query)
        .with_context(|| format!("fetching pull requests from {}/{}", cfg.org, repo))?;

      report.repositories = 1;
      report.total_prs = prs.len();

      if prs.is_empty() {
        tracing::warn!("no pull requests found");
        return Ok(report);
      }

      for exporter in &exporters {
        exporter.export(&cfg.output, &cfg.org, repo, &prs, now)?;
      }

      if cfg.include_files {
        let dir = cfg.output.join(&cfg.org).join(repo);
        report.enrichment = Some(enrich_directory(client, &dir, &cfg.org, Some(repo), false)?);
      }
    }
    None => {
      let names: Vec<String> = client
        .repositories(&cfg.org)
        .with_context(|| format!("listing repositories of {}", cfg.org))?
        .into_iter()
        .map(|r| r.name)
        .collect();

      let repo_prs: RepoPrs = client.pull_requests_from_repos(&cfg.org, &names, &query);

      report.repositories = repo_prs.len();
      report.total_prs = repo_prs.values().map(Vec::len).sum();

      if report.total_prs == 0 {
        tracing::warn!(repositories = report.repositories, "no pull requests found");
        return Ok(report);
      }

      for exporter in &exporters {
        exporter.export_multiple(&cfg.output, &cfg.org, &repo_prs, now)?;
        tracing::debug!(format = exporter.name(), "export finished");
      }

      if cfg.include_files {
        let dir = cfg.output.join(&cfg.org);
        report.enrichment = Some(enrich_organization(client, &dir, &cfg.org)?);
      }
    }
  }

  Ok(report)
}

pub fn run(cfg: FetchConfig, now: DateTime<Local>) -> Result<()> {
  let client = super::github_client(&cfg.auth)?;
  let report = execute(&client, &cfg, now)?;

  if report.total_prs == 0 {
    println!("No pull requests by {} found in {}", report.author, cfg.org);
    return Ok(());
  }

  println!(
    "Exported {} pull requests by {} from {} repositories to {}",
    report.total_prs,
    report.author,
    report.repositories,
    cfg.output.join(&cfg.org).display()
  );

  if let Some(stats) = report.enrichment {
    println!(
      "Enriched {}/{} (skipped {}, failed {})",
      stats.enriched, stats.total, stats.skipped, stats.failed
    );
  }

  Ok(())
}
