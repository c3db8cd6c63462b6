use predicates::prelude::*;
use test_support::{cmd_bin, pr_json, tempdir};

fn github_fixtures(cmd: &mut assert_cmd::Command) -> &mut assert_cmd::Command {
  let search = serde_json::json!({
    "acme/api": [
      pr_json(12, "Add login, \"fast\"", "closed", true),
      pr_json(7, "Fix crash", "open", false)
    ],
    "acme/web": [pr_json(3, "Restyle header", "closed", false)]
  });

  cmd
    .env("PRD_TEST_GH_USER_JSON", r#"{"login": "dev"}"#)
    .env(
      "PRD_TEST_GH_REPOS_JSON",
      r#"{"acme": [{"name": "api"}, {"name": "web"}, {"name": "broken"}, {"name": "docs"}]}"#,
    )
    .env("PRD_TEST_GH_SEARCH_JSON", search.to_string())
    .env("PRD_TEST_GH_FAIL_REPOS", "acme/broken")
    .env(
      "PRD_TEST_GH_FILES_JSON",
      r#"[{"filename": "src/app.ts", "status": "modified", "additions": 5, "deletions": 2, "changes": 7, "patch": "+const a = 1;"}]"#,
    )
}

#[test]
fn org_wide_fetch_exports_every_format() {
  let td = tempdir();

  github_fixtures(&mut cmd_bin())
    .args(["fetch", "acme", "--format", "all", "--output", td.path().to_str().unwrap()])
    .args(["--now-override", "2025-01-02T03:04:05"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Exported 3 pull requests by dev from 4 repositories"));

  let org = td.path().join("acme");
  for f in ["api/pr_12.json", "api/pr_7.json", "api/summary.json", "api/pull_requests.csv", "api/pull_requests.md", "web/pr_3.json"] {
    assert!(org.join(f).is_file(), "missing {}", f);
  }
  assert!(!org.join("broken").exists());
  assert!(!org.join("docs").exists());

  let combined = std::fs::read_to_string(org.join("all_pull_requests.csv")).unwrap();
  let lines: Vec<&str> = combined.lines().collect();
  assert_eq!(lines[0], "repository,number,title,state,is_merged,author,created_at,updated_at,closed_at,merged_at,url,labels,comments");
  assert!(lines[1].starts_with("api,12,\"Add login, \"\"fast\"\"\",closed,Yes,dev,"));
  assert!(lines[3].starts_with("web,3,Restyle header,closed,No,dev,"));

  let readme = std::fs::read_to_string(org.join("README.md")).unwrap();
  assert!(readme.contains("# Pull Requests Report - acme"));
  assert!(readme.contains("**Exported:** 2025-01-02 03:04:05"));
  assert!(readme.contains("**Total Repositories:** 4"));
  assert!(readme.contains("- [View Details](web/pull_requests.md)"));

  let summary: serde_json::Value =
    serde_json::from_str(&std::fs::read_to_string(org.join("api/summary.json")).unwrap()).unwrap();
  assert_eq!(summary["pr_numbers"], serde_json::json!([12, 7]));
  assert_eq!(summary["statistics"]["by_state"], serde_json::json!({ "open": 1, "closed": 0, "merged": 1 }));
}

#[test]
fn single_repo_fetch_with_files() {
  let td = tempdir();

  github_fixtures(&mut cmd_bin())
    .args(["fetch", "acme", "--repo", "api", "--author", "someone", "--include-files"])
    .args(["--output", td.path().to_str().unwrap()])
    .assert()
    .success()
    .stdout(predicate::str::contains("by someone"))
    .stdout(predicate::str::contains("Enriched 2/2"));

  let pr: serde_json::Value =
    serde_json::from_str(&std::fs::read_to_string(td.path().join("acme/api/pr_7.json")).unwrap()).unwrap();
  assert_eq!(pr["files_count"], 1);
  assert_eq!(pr["files"][0]["patch"], "+const a = 1;");
  // JSON-only export writes no CSV or combined artifacts
  assert!(!td.path().join("acme/api/pull_requests.csv").exists());
  assert!(!td.path().join("acme/all_pull_requests.csv").exists());
}

#[test]
fn failing_single_repo_is_an_error() {
  let td = tempdir();

  github_fixtures(&mut cmd_bin())
    .args(["fetch", "acme", "--repo", "broken", "--output", td.path().to_str().unwrap()])
    .assert()
    .failure()
    .stderr(predicate::str::contains("acme/broken"));
}

#[test]
fn empty_result_writes_nothing() {
  let td = tempdir();

  github_fixtures(&mut cmd_bin())
    .args(["fetch", "acme", "--repo", "docs", "--output", td.path().to_str().unwrap()])
    .assert()
    .success()
    .stdout(predicate::str::contains("No pull requests"));

  assert!(!td.path().join("acme").exists());
}

#[test]
fn include_files_needs_json() {
  github_fixtures(&mut cmd_bin())
    .args(["fetch", "acme", "--format", "csv", "--include-files"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--include-files"));
}
