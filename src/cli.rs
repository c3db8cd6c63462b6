use anyhow::{bail, Result};
use chrono::{DateTime, Local};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::analysis::batch::DEFAULT_BATCH_SIZE;
use crate::analysis::completion::{DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::analysis::DEFAULT_FIELDS;
use crate::export::ExportFormat;
use crate::github::{PrQuery, StateFilter};
use crate::util;

#[derive(Parser, Debug)]
#[command(
    name = "pr-digest",
    version,
    about = "Fetch GitHub pull requests, enrich them with diffs, and summarize them with an LLM",
    long_about = None
)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Option<Command>,

  /// Debug-level logging (RUST_LOG still wins)
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,

  /// Override the "now" instant for date phrases and timestamps (hidden; tests only)
  #[arg(long = "now-override", hide = true, global = true)]
  pub now_override: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Fetch pull requests from one or all repositories of an organization and export them
  Fetch(FetchArgs),
  /// Add per-file diff data to stored pr_*.json files
  Enrich(EnrichArgs),
  /// Summarize stored pull requests into a resume-style report
  Analyze(AnalyzeArgs),
  /// Show the GitHub API rate limit for the current token
  RateLimit(TokenArgs),
  /// List organizations of the authenticated user
  Orgs(TokenArgs),
  /// List repositories of an organization
  Repos(ReposArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct TokenArgs {
  /// GitHub token (falls back to GITHUB_TOKEN, GH_TOKEN, then `gh auth token`)
  #[arg(long)]
  pub token: Option<String>,

  /// GitHub API base URL
  #[arg(long, env = "GITHUB_API_URL", hide_env_values = true)]
  pub api_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ReposArgs {
  /// Organization or user login
  pub org: String,

  #[command(flatten)]
  pub auth: TokenArgs,
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
  /// Organization or user that owns the repositories
  pub org: String,

  /// Single repository; omit to fetch from every repository of the organization
  #[arg(long)]
  pub repo: Option<String>,

  /// PR author (default: the authenticated user)
  #[arg(long)]
  pub author: Option<String>,

  /// PR states to include, comma separated
  #[arg(long, value_enum, value_delimiter = ',', default_value = "all")]
  pub state: Vec<StateFilter>,

  /// Only merged PRs
  #[arg(long)]
  pub merged_only: bool,

  /// Require a label (repeatable)
  #[arg(long = "label")]
  pub labels: Vec<String>,

  /// Created on or after: YYYY-MM-DD or a phrase like "last month"
  #[arg(long)]
  pub since: Option<String>,

  /// Created on or before: YYYY-MM-DD or a phrase like "yesterday"
  #[arg(long)]
  pub until: Option<String>,

  /// Export format
  #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
  pub format: ExportFormat,

  /// Output root directory
  #[arg(long, env = "OUTPUT_DIR", default_value = "github_prs")]
  pub output: PathBuf,

  /// Fetch per-file diffs for the exported PRs (requires JSON output)
  #[arg(long)]
  pub include_files: bool,

  #[command(flatten)]
  pub auth: TokenArgs,
}

#[derive(Args, Debug, Clone)]
pub struct EnrichArgs {
  /// A pr_*.json file, a repository directory, or an organization directory
  pub input: PathBuf,

  /// Repository owner (organization or user)
  #[arg(long)]
  pub owner: String,

  /// Repository name; omit to infer from each file's directory
  #[arg(long)]
  pub repo: Option<String>,

  /// Walk subdirectories
  #[arg(long)]
  pub recursive: bool,

  #[command(flatten)]
  pub auth: TokenArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
  Yaml,
  Json,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
  /// Directory of pr_*.json files
  pub input: PathBuf,

  /// Report fields, comma separated
  #[arg(long, value_delimiter = ',')]
  pub fields: Vec<String>,

  /// Records per model call
  #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
  pub batch_size: usize,

  /// Batches summarized concurrently
  #[arg(long, default_value_t = 1)]
  pub jobs: usize,

  /// Report path
  #[arg(long, default_value = "resume.yaml")]
  pub output: PathBuf,

  /// Report format
  #[arg(long, value_enum, default_value_t = ReportFormat::Yaml)]
  pub format: ReportFormat,

  /// Completions API key
  #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
  pub api_key: Option<String>,

  /// Model name
  #[arg(long, env = "PR_DIGEST_MODEL", default_value = DEFAULT_MODEL)]
  pub model: String,

  /// OpenAI-compatible chat completions endpoint
  #[arg(long, env = "PR_DIGEST_COMPLETIONS_URL")]
  pub completions_url: Option<String>,

  /// Per-request timeout for model calls
  #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
  pub timeout_secs: u64,

  /// Load pr_*.json files from subdirectories too
  #[arg(long)]
  pub recursive: bool,
}

#[derive(Debug)]
pub struct FetchConfig {
  pub org: String,
  pub repo: Option<String>,
  pub author: Option<String>,
  pub query: PrQuery,
  pub format: ExportFormat,
  pub output: PathBuf,
  pub include_files: bool,
  pub auth: TokenArgs,
}

pub fn normalize_fetch(args: FetchArgs, now: DateTime<Local>) -> Result<FetchConfig> {
  if args.include_files && !args.format.includes_json() {
    bail!("--include-files needs JSON output; use --format json or --format all");
  }

  let since = args.since.as_deref().map(|s| util::resolve_date_filter(s, now)).transpose()?;
  let until = args.until.as_deref().map(|s| util::resolve_date_filter(s, now)).transpose()?;

  if let (Some(s), Some(u)) = (&since, &until) {
    if s > u {
      bail!("--since {} is after --until {}", s, u);
    }
  }

  let query = PrQuery {
    author: args.author.clone().unwrap_or_default(),
    states: args.state,
    labels: args.labels,
    since,
    until,
    merged_only: args.merged_only,
  };

  Ok(FetchConfig {
    org: args.org,
    repo: args.repo.filter(|r| !r.trim().is_empty()),
    author: args.author.filter(|a| !a.trim().is_empty()),
    query,
    format: args.format,
    output: args.output,
    include_files: args.include_files,
    auth: args.auth,
  })
}

#[derive(Debug)]
pub struct AnalyzeConfig {
  pub input: PathBuf,
  pub fields: Vec<String>,
  pub batch_size: usize,
  pub jobs: usize,
  pub output: PathBuf,
  pub format: ReportFormat,
  pub api_key: Option<String>,
  pub model: String,
  pub completions_url: Option<String>,
  pub timeout_secs: u64,
  pub recursive: bool,
}

pub fn normalize_analyze(args: AnalyzeArgs) -> Result<AnalyzeConfig> {
  if args.batch_size == 0 {
    bail!("--batch-size must be at least 1");
  }

  if args.jobs == 0 {
    bail!("--jobs must be at least 1");
  }

  let mut fields: Vec<String> = Vec::new();
  for f in args.fields.iter().map(|f| f.trim()).filter(|f| !f.is_empty()) {
    if !fields.iter().any(|x| x == f) {
      fields.push(f.to_string());
    }
  }

  if fields.is_empty() {
    fields = DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect();
  }

  Ok(AnalyzeConfig {
    input: args.input,
    fields,
    batch_size: args.batch_size,
    jobs: args.jobs,
    output: args.output,
    format: args.format,
    api_key: args.api_key,
    model: args.model,
    completions_url: args.completions_url,
    timeout_secs: args.timeout_secs,
    recursive: args.recursive,
  })
}
