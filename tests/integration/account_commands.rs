use predicates::prelude::*;
use test_support::cmd_bin;

#[test]
fn rate_limit_prints_core_budget() {
  cmd_bin()
    .env(
      "PRD_TEST_GH_RATE_LIMIT_JSON",
      r#"{"resources": {"core": {"limit": 5000, "remaining": 4990, "reset": 1735787045}}}"#,
    )
    .args(["rate-limit"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Limit: 5000"))
    .stdout(predicate::str::contains("Remaining: 4990"))
    .stdout(predicate::str::contains("Resets at: 2025-01-0"));
}

#[test]
fn lists_orgs_and_repos() {
  cmd_bin()
    .env("PRD_TEST_GH_ORGS_JSON", r#"[{"login": "acme", "description": "Rockets"}]"#)
    .args(["orgs"])
    .assert()
    .success()
    .stdout("acme\tRockets\n");

  cmd_bin()
    .env(
      "PRD_TEST_GH_REPOS_JSON",
      r#"{"acme": [{"name": "api", "private": false, "updated_at": "2024-06-01T10:00:00Z", "description": null}]}"#,
    )
    .args(["repos", "acme"])
    .assert()
    .success()
    .stdout("api\tpublic\t2024-06-01\t\n");
}
