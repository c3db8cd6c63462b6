use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod analysis;
mod cli;
mod commands;
mod config;
mod enrichment;
mod export;
mod ext;
mod github;
mod model;
mod store;
mod util;

use crate::cli::{normalize_analyze, normalize_fetch, Cli, Command};

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  let _ = tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
    .with(filter)
    .try_init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  init_tracing(cli.verbose);

  // Phase 1: resolve "now" once for date phrases and timestamps
  let now = util::effective_now(util::parse_now(cli.now_override.as_deref()));

  // Phase 2: dispatch
  let Some(command) = cli.command else {
    bail!("no command given; run with --help for usage");
  };

  match command {
    Command::Fetch(args) => commands::fetch::run(normalize_fetch(args, now)?, now),
    Command::Enrich(args) => commands::enrich::run(args),
    Command::Analyze(args) => commands::analyze::run(normalize_analyze(args)?, now),
    Command::RateLimit(auth) => {
      let client = commands::github_client(&auth)?;
      commands::account::rate_limit(&client, &mut std::io::stdout().lock())
    }
    Command::Orgs(auth) => {
      let client = commands::github_client(&auth)?;
      commands::account::organizations(&client, &mut std::io::stdout().lock())
    }
    Command::Repos(args) => {
      let client = commands::github_client(&args.auth)?;
      commands::account::repositories(&client, &args.org, &mut std::io::stdout().lock())
    }
  }
}
