use jsonschema::validator_for;
use test_support::{cmd_bin, fixtures_dir, pr_json, tempdir};

fn read_schema(name: &str) -> serde_json::Value {
  let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
  let path = manifest_dir.join("tests").join("schemas").join(name);
  let data = std::fs::read(&path).expect("schema file");
  serde_json::from_slice(&data).expect("valid schema JSON")
}

fn compile_schema(name: &str) -> jsonschema::Validator {
  let schema = read_schema(name);
  validator_for(&schema).expect("compile schema")
}

fn read_json(path: &std::path::Path) -> serde_json::Value {
  serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn analysis_report_conforms_to_schema() {
  let td = tempdir();
  let out = td.path().join("resume.json");
  let reply = serde_json::json!({ "fields": { "Key Achievements": ["Shipped caching"] }, "partial_summary": "Cache work." });

  let status = cmd_bin()
    .env("PRD_TEST_COMPLETIONS", serde_json::json!([reply.to_string()]).to_string())
    .args(["analyze", fixtures_dir().join("acme/api").to_str().unwrap()])
    .args(["--format", "json", "--output", out.to_str().unwrap()])
    .output()
    .unwrap()
    .status;
  assert!(status.success());

  let v = read_json(&out);
  compile_schema("analysis-report.schema.json")
    .validate(&v)
    .expect("schema validation failed for analysis report");
}

#[test]
fn export_summary_conforms_to_schema() {
  let td = tempdir();
  let search = serde_json::json!([pr_json(5, "Docs", "closed", false), pr_json(4, "Lint", "open", false)]);

  let status = cmd_bin()
    .env("PRD_TEST_GH_USER_JSON", r#"{"login": "dev"}"#)
    .env("PRD_TEST_GH_SEARCH_JSON", search.to_string())
    .args(["fetch", "acme", "--repo", "site", "--output", td.path().to_str().unwrap()])
    .output()
    .unwrap()
    .status;
  assert!(status.success());

  let v = read_json(&td.path().join("acme/site/summary.json"));
  compile_schema("export-summary.schema.json")
    .validate(&v)
    .expect("schema validation failed for summary.json");
}
