//! test-support: helpers for robust, nextest-friendly tests.
//!
//! Add as a dev-dependency in your top-level `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test_support = { path = "tests/support", features = ["serde"] }
//! ```
//!
//! Then in tests:
//! ```rust,ignore
//! use test_support::{cmd_bin, fixtures_dir, write_pr_dir};
//!
//! #[test]
//! fn example() {
//!     let td = test_support::tempdir();
//!     write_pr_dir(td.path(), &[test_support::pr_json(1, "Add cache", "closed", true)]);
//!     let _root = fixtures_dir();
//! }
//! ```

use once_cell::sync::Lazy;
use tracing_subscriber::{fmt, EnvFilter};

use std::{
    env,
    path::{Path, PathBuf},
};

/// Binary under test.
pub const BIN: &str = "pr-digest";

/// Initialize `tracing` once, honoring `RUST_LOG` and writing via the test writer.
///
/// Safe to call from multiple tests; only the first call configures the global subscriber.
pub fn init_tracing() {
    static INIT: Lazy<()> = Lazy::new(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("warn,test=info"))
            .unwrap();
        // with_test_writer() causes logs to appear alongside failing tests only (cargo/nextest)
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
    Lazy::force(&INIT);
}

/// Return the path to the repository's `tests/fixtures` directory.
///
/// This crate lives at `<repo>/tests/support`, so the fixtures sit next to it.
pub fn fixtures_dir() -> PathBuf {
    let support = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    support
        .parent()
        .map(|tests| tests.join("fixtures"))
        .unwrap_or_else(|| support.join("fixtures"))
}

/// A minimal search-API pull request record.
#[cfg(feature = "serde")]
pub fn pr_json(number: i64, title: &str, state: &str, merged: bool) -> serde_json::Value {
    let merged_at = merged.then(|| format!("2024-02-{:02}T12:00:00Z", (number % 28) + 1));
    serde_json::json!({
        "number": number,
        "title": title,
        "state": state,
        "body": format!("Body of {title}"),
        "created_at": format!("2024-01-{:02}T09:00:00Z", (number % 28) + 1),
        "html_url": format!("https://github.com/acme/api/pull/{number}"),
        "user": { "login": "dev" },
        "labels": [],
        "comments": 0,
        "pull_request": { "merged_at": merged_at }
    })
}

/// Write each record as `pr_<number>.json` under `dir` (created if needed).
#[cfg(feature = "serde")]
pub fn write_pr_dir(dir: &Path, prs: &[serde_json::Value]) {
    std::fs::create_dir_all(dir).expect("create PR dir");
    for pr in prs {
        let n = pr["number"].as_i64().expect("PR number");
        let text = serde_json::to_string_pretty(pr).expect("serialize PR");
        std::fs::write(dir.join(format!("pr_{n}.json")), text).expect("write PR file");
    }
}

/// Create a temp directory that deletes on drop.
pub fn tempdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create tempdir")
}

/// Run the binary under test with `assert_cmd`, isolated from ambient credentials.
///
/// Tokens, API keys, endpoints and fixture variables from the developer's shell are
/// cleared so each test states exactly what it provides.
pub fn cmd_bin() -> assert_cmd::Command {
    init_tracing();
    let mut cmd = assert_cmd::Command::cargo_bin(BIN).expect("binary target not found");
    for key in [
        "GITHUB_TOKEN",
        "GH_TOKEN",
        "GROQ_API_KEY",
        "GITHUB_API_URL",
        "OUTPUT_DIR",
        "PR_DIGEST_MODEL",
        "PR_DIGEST_COMPLETIONS_URL",
        "PRD_TEST_COMPLETIONS",
        "RUST_LOG",
    ] {
        cmd.env_remove(key);
    }
    for (key, _) in env::vars().filter(|(k, _)| k.starts_with("PRD_TEST_GH_")) {
        cmd.env_remove(key);
    }
    cmd
}
