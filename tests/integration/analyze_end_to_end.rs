use predicates::prelude::*;
use test_support::{cmd_bin, fixtures_dir, pr_json, tempdir, write_pr_dir};

const NOW: &str = "2025-01-02T03:04:05Z";

fn script(replies: &[serde_json::Value]) -> String {
  serde_json::Value::Array(replies.to_vec()).to_string()
}

fn batch_reply(achievement: &str, summary: &str) -> serde_json::Value {
  serde_json::Value::String(
    serde_json::json!({
      "fields": { "Key Achievements": [achievement], "Bug Fixes": ["Fixed crash"] },
      "partial_summary": summary
    })
    .to_string(),
  )
}

#[test]
fn writes_json_report_from_model_replies() {
  let td = tempdir();
  let out = td.path().join("resume.json");
  let input = fixtures_dir().join("acme/api");

  let aggregate = format!(
    "```json\n{}\n```",
    serde_json::json!({
      "fields": {
        "Bug Fixes": ["Fixed token crash"],
        "Key Achievements": ["Cut session latency 40% with Redis"],
        "Unrequested": ["dropped"]
      },
      "summary": "Backend engineer focused on performance."
    })
  );

  cmd_bin()
    .env("PRD_TEST_COMPLETIONS", script(&[batch_reply("Added Redis cache", "Perf work."), aggregate.into()]))
    .args(["analyze", input.to_str().unwrap(), "--format", "json", "--output", out.to_str().unwrap()])
    .args(["--now-override", NOW])
    .assert()
    .success()
    .stdout(predicate::str::contains("Analyzed 3 PRs"))
    .stdout(predicate::str::contains("Backend engineer focused on performance."));

  let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
  let keys: Vec<&str> = v["fields"].as_object().unwrap().keys().map(String::as_str).collect();
  assert_eq!(keys, ["Key Achievements", "Technologies Used", "Projects Completed", "Bug Fixes"]);
  assert_eq!(v["fields"]["Technologies Used"], serde_json::json!([]));
  assert_eq!(v["summary"], "Backend engineer focused on performance.");
  assert_eq!(v["metadata"]["total_prs"], 3);
  assert_eq!(v["metadata"]["statistics"]["by_state"]["merged"], 2);
  assert_eq!(v["metadata"]["statistics"]["by_state"]["open"], 1);
  assert!(v["metadata"]["analyzed_at"].as_str().unwrap().starts_with("2025-01-0"));
}

#[test]
fn aggregation_failure_falls_back_to_merged_batches() {
  let td = tempdir();
  let input = td.path().join("prs");
  let prs: Vec<serde_json::Value> = (1..=3).map(|n| pr_json(n, &format!("Change {n}"), "closed", true)).collect();
  write_pr_dir(&input, &prs);
  let out = td.path().join("resume.yaml");

  cmd_bin()
    .env(
      "PRD_TEST_COMPLETIONS",
      script(&[
        batch_reply("Shipped A", "First half."),
        batch_reply("Shipped B", "Second half."),
        serde_json::json!({ "error": "upstream 503" }),
      ]),
    )
    .args(["analyze", input.to_str().unwrap(), "--batch-size", "2", "--fields", "Key Achievements,Bug Fixes"])
    .args(["--output", out.to_str().unwrap()])
    .assert()
    .success();

  let yaml: serde_yaml::Value = serde_yaml::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
  assert_eq!(yaml["summary"].as_str(), Some("First half. Second half."));

  let achievements: Vec<&str> = yaml["fields"]["Key Achievements"]
    .as_sequence()
    .unwrap()
    .iter()
    .filter_map(|e| e.as_str())
    .collect();
  assert_eq!(achievements, ["Shipped A", "Shipped B"]);

  // duplicate "Fixed crash" from both batches appears once
  assert_eq!(yaml["fields"]["Bug Fixes"].as_sequence().unwrap().len(), 1);
}

#[test]
fn unparseable_batch_degrades_without_failing() {
  let td = tempdir();
  let out = td.path().join("resume.json");
  let input = fixtures_dir().join("acme/api");

  cmd_bin()
    .env("PRD_TEST_COMPLETIONS", script(&["I cannot help with that.".into(), "still not json".into()]))
    .args(["analyze", input.to_str().unwrap(), "--format", "json", "--output", out.to_str().unwrap()])
    .assert()
    .success();

  let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
  assert_eq!(v["summary"], "Analysis completed successfully.");
  assert!(v["fields"].as_object().unwrap().values().all(|e| e == &serde_json::json!([])));
}

#[test]
fn missing_api_key_is_a_contract_error() {
  let input = fixtures_dir().join("acme/api");

  cmd_bin()
    .args(["analyze", input.to_str().unwrap()])
    .assert()
    .failure()
    .stderr(predicate::str::contains("GROQ_API_KEY"));
}

#[test]
fn missing_input_directory_fails() {
  let td = tempdir();

  cmd_bin()
    .env("PRD_TEST_COMPLETIONS", "[]")
    .args(["analyze", td.path().join("nope").to_str().unwrap()])
    .args(["--output", td.path().join("r.yaml").to_str().unwrap()])
    .assert()
    .failure()
    .stderr(predicate::str::contains("not found"));
}
