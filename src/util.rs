// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for paths, text truncation, "now" handling, date filter parsing, and man page rendering
// role: utilities/helpers
// inputs: Various primitives; DateTime; paths; clap CommandFactory
// outputs: Truncated strings, ISO timestamps, resolved date filters, man page text
// side_effects: ensure_dir creates directories
// invariants:
// - truncate_chars never splits UTF-8
// - effective_now is the single source of "now" so tests can pin it
// errors: IO and parse errors bubble with context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Months, NaiveDate, SecondsFormat};
use chrono_english::Interval;
use clap::CommandFactory;

/// First `max_chars` characters of `text` (whole string when shorter).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
  match text.char_indices().nth(max_chars) {
    Some((idx, _)) => &text[..idx],
    None => text,
  }
}

/// Returns the effective "now" given an optional override.
pub fn effective_now(override_now: Option<DateTime<Local>>) -> DateTime<Local> {
  override_now.unwrap_or_else(Local::now)
}

/// Parse the hidden `--now-override` value (RFC3339 or naive `YYYY-MM-DDTHH:MM:SS` in local time).
pub fn parse_now(s: Option<&str>) -> Option<DateTime<Local>> {
  let s = s?;

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Local));
  }

  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
    .ok()
    .and_then(|naive| naive.and_local_timezone(Local).single())
}

pub fn iso_now(now: DateTime<Local>) -> String {
  now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Resolve a date filter for the search API into `YYYY-MM-DD`.
///
/// Accepts a literal date or an English phrase such as "last month" or "3 weeks ago".
pub fn resolve_date_filter(input: &str, now: DateTime<Local>) -> Result<String> {
  let trimmed = input.trim();

  if trimmed.is_empty() {
    bail!("empty date filter");
  }

  if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
    return Ok(d.format("%Y-%m-%d").to_string());
  }

  // Offsets ("2 days ago", "3 weeks") first, then absolute phrases ("last friday")
  if let Ok(interval) = chrono_english::parse_duration(trimmed) {
    let shifted = match interval {
      Interval::Seconds(secs) => Some(now + chrono::Duration::seconds(secs.into())),
      Interval::Days(days) => Some(now + chrono::Duration::days(days.into())),
      Interval::Months(months) if months < 0 => now.checked_sub_months(Months::new(months.unsigned_abs())),
      Interval::Months(months) => now.checked_add_months(Months::new(months.unsigned_abs())),
    };

    let shifted = shifted.ok_or_else(|| anyhow::anyhow!("date '{}' is out of range", trimmed))?;
    return Ok(shifted.format("%Y-%m-%d").to_string());
  }

  let parsed = chrono_english::parse_date_string(trimmed, now, chrono_english::Dialect::Us)
    .map_err(|e| anyhow::anyhow!("unrecognized date '{}': {}", trimmed, e))?;

  Ok(parsed.format("%Y-%m-%d").to_string())
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
  std::fs::create_dir_all(dir).with_context(|| format!("creating directory {}", dir.display()))
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
pub fn render_man_page<T: CommandFactory>() -> Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
