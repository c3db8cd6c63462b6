// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Account-level listings: rate limit, organizations, repositories
// role: commands/account
// inputs: GithubClient; output writer
// outputs: Plain-text tables on the writer
// side_effects: Network calls through the client
// errors: GithubError surfaces as anyhow
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::Write;

use anyhow::Result;
use chrono::{Local, TimeZone};

use crate::github::GithubClient;

pub fn rate_limit<W: Write>(client: &GithubClient, out: &mut W) -> Result<()> {
  let rl = client.rate_limit_status()?;

  let reset = Local
    .timestamp_opt(rl.reset, 0)
    .single()
    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
    .unwrap_or_else(|| rl.reset.to_string());

  writeln!(out, "Limit: {}", rl.limit)?;
  writeln!(out, "Remaining: {}", rl.remaining)?;
  writeln!(out, "Resets at: {}", reset)?;

  Ok(())
}

pub fn organizations<W: Write>(client: &GithubClient, out: &mut W) -> Result<()> {
  let orgs = client.organizations()?;

  if orgs.is_empty() {
    writeln!(out, "No organizations found")?;
    return Ok(());
  }

  for org in &orgs {
    match org.description.as_deref().filter(|d| !d.is_empty()) {
      Some(d) => writeln!(out, "{}\t{}", org.login, d)?,
      None => writeln!(out, "{}", org.login)?,
    }
  }

  Ok(())
}

pub fn repositories<W: Write>(client: &GithubClient, org: &str, out: &mut W) -> Result<()> {
  let repos = client.repositories(org)?;

  if repos.is_empty() {
    writeln!(out, "No repositories found in {}", org)?;
    return Ok(());
  }

  for r in &repos {
    let visibility = if r.private { "private" } else { "public" };
    let updated = r.updated_at.as_deref().map(|u| u.get(..10).unwrap_or(u)).unwrap_or("-");
    writeln!(out, "{}\t{}\t{}\t{}", r.name, visibility, updated, r.description.as_deref().unwrap_or(""))?;
  }

  Ok(())
}
