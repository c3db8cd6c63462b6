use std::path::Path;

use predicates::prelude::*;
use test_support::{cmd_bin, fixtures_dir, tempdir};

fn copy_tree(from: &Path, to: &Path) {
  std::fs::create_dir_all(to).unwrap();
  for entry in std::fs::read_dir(from).unwrap() {
    let entry = entry.unwrap();
    let target = to.join(entry.file_name());
    if entry.path().is_dir() {
      copy_tree(&entry.path(), &target);
    } else {
      std::fs::copy(entry.path(), target).unwrap();
    }
  }
}

const FILES: &str = r#"{
  "87": [{"filename": "app/auth.py", "status": "modified", "additions": 4, "deletions": 1, "changes": 5, "patch": "+    return 401"}],
  "90": [{"filename": "gateway/schema.graphql", "status": "added", "additions": 900, "deletions": 0, "changes": 900, "patch": "+type Query"}]
}"#;

#[test]
fn organization_directory_is_enriched_in_place() {
  let td = tempdir();
  copy_tree(&fixtures_dir().join("acme"), &td.path().join("acme"));

  cmd_bin()
    .env("PRD_TEST_GH_FILES_JSON", FILES)
    .args(["enrich", td.path().join("acme").to_str().unwrap(), "--owner", "acme"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Total PRs: 3"))
    .stdout(predicate::str::contains("Enriched: 2"))
    .stdout(predicate::str::contains("Skipped (already enriched): 1"));

  let read = |n: i64| -> serde_json::Value {
    let path = td.path().join(format!("acme/api/pr_{n}.json"));
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
  };

  let fixed = read(87);
  assert_eq!(fixed["files_count"], 1);
  assert_eq!(fixed["files"][0]["patch"], "+    return 401");
  assert_eq!(fixed["labels"][0]["name"], "bug");

  // large diffs keep their counts but drop the patch text
  let gateway = read(90);
  assert_eq!(gateway["files"][0]["changes"], 900);
  assert!(gateway["files"][0].get("patch").is_none());

  // already-enriched record is left as it was
  let cached = read(101);
  assert_eq!(cached["files_count"], 2);
}

#[test]
fn missing_token_without_fixtures_fails() {
  let td = tempdir();

  cmd_bin()
    .env("PATH", td.path())
    .args(["enrich", td.path().to_str().unwrap(), "--owner", "acme"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no GitHub token"));
}
