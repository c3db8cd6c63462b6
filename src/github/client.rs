// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Typed GitHub operations over the GithubApi seam: pagination, PR search queries, multi-state and multi-repo fetches
// role: github/client
// inputs: Box<dyn GithubApi>; PrQuery (author, states, labels, since/until, merged_only)
// outputs: PullRequest lists, org/repo summaries, rate limit status, PR file lists
// invariants:
// - per_page=100; org/repo listing stops on an empty page; search and files stop on a short page
// - PR files are capped at MAX_PR_FILES
// - Several states are fetched separately, deduplicated by number (first seen wins), sorted newest first
// - In multi-repo fetches a failing repo yields an empty list and the rest continue
// errors: GithubError from the seam
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::api::{search_items, GhResult, GithubApi, GithubError, PER_PAGE};
use crate::ext::serde_json::JsonFetch;
use crate::model::{FileChange, PullRequest};

pub const MAX_PR_FILES: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
  All,
  Open,
  Closed,
  Merged,
}

impl fmt::Display for StateFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      StateFilter::All => "all",
      StateFilter::Open => "open",
      StateFilter::Closed => "closed",
      StateFilter::Merged => "merged",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrQuery {
  pub author: String,
  pub states: Vec<StateFilter>,
  pub labels: Vec<String>,
  pub since: Option<String>,
  pub until: Option<String>,
  pub merged_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgSummary {
  #[serde(default)]
  pub login: String,
  #[serde(default)]
  pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub full_name: Option<String>,
  #[serde(default)]
  pub private: bool,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimit {
  pub limit: i64,
  pub remaining: i64,
  pub reset: i64,
}

/// Build the issue-search query for one state.
pub fn search_query(owner: &str, repo: &str, state: StateFilter, query: &PrQuery) -> String {
  let mut parts = vec![
    format!("repo:{}/{}", owner, repo),
    "type:pr".to_string(),
    format!("author:{}", query.author),
  ];

  match state {
    StateFilter::Merged => parts.push("is:merged".into()),
    StateFilter::All => {}
    other => {
      parts.push(format!("is:{}", other));
      if query.merged_only && other == StateFilter::Closed {
        parts.push("is:merged".into());
      }
    }
  }

  for label in &query.labels {
    parts.push(format!("label:{}", label));
  }

  if let Some(since) = &query.since {
    parts.push(format!("created:>={}", since));
  }

  if let Some(until) = &query.until {
    parts.push(format!("created:<={}", until));
  }

  parts.join(" ")
}

fn decode_items<T: serde::de::DeserializeOwned>(items: Vec<serde_json::Value>, what: &str) -> Vec<T> {
  items
    .into_iter()
    .filter_map(|v| match serde_json::from_value::<T>(v) {
      Ok(t) => Some(t),
      Err(e) => {
        tracing::warn!(error = %e, "skipping malformed {}", what);
        None
      }
    })
    .collect()
}

pub struct GithubClient {
  api: Box<dyn GithubApi>,
}

impl GithubClient {
  pub fn new(api: Box<dyn GithubApi>) -> Self {
    Self { api }
  }

  pub fn current_user(&self) -> GhResult<String> {
    let v = self.api.current_user_json()?;

    v.fetch("login").to::<String>().ok_or_else(|| GithubError::Decode {
      url: "/user".into(),
      message: "missing login".into(),
    })
  }

  /// Collect pages until one comes back empty.
  fn collect_until_empty<F>(&self, mut page_fn: F) -> GhResult<Vec<serde_json::Value>>
  where
    F: FnMut(u32) -> GhResult<serde_json::Value>,
  {
    let mut out = Vec::new();
    let mut page = 1;

    loop {
      let items = page_fn(page)?.as_array().cloned().unwrap_or_default();

      if items.is_empty() {
        break;
      }

      out.extend(items);
      page += 1;
    }

    Ok(out)
  }

  pub fn organizations(&self) -> GhResult<Vec<OrgSummary>> {
    let raw = self.collect_until_empty(|page| self.api.user_orgs_page(page))?;
    tracing::debug!(count = raw.len(), "fetched organizations");

    Ok(decode_items(raw, "organization"))
  }

  pub fn repositories(&self, org: &str) -> GhResult<Vec<RepoSummary>> {
    let raw = self.collect_until_empty(|page| self.api.org_repos_page(org, page))?;
    tracing::debug!(org, count = raw.len(), "fetched repositories");

    Ok(decode_items(raw, "repository"))
  }

  fn pull_requests_for_state(&self, owner: &str, repo: &str, state: StateFilter, query: &PrQuery) -> GhResult<Vec<PullRequest>> {
    let q = search_query(owner, repo, state, query);
    let mut out = Vec::new();
    let mut page = 1;

    tracing::debug!(query = %q, "searching pull requests");

    loop {
      let items = search_items(&self.api.search_issues_page(&q, page)?);

      if items.is_empty() {
        break;
      }

      let short = items.len() < PER_PAGE;
      out.extend(decode_items::<PullRequest>(items, "pull request"));

      if short {
        break;
      }

      page += 1;
    }

    Ok(out)
  }

  pub fn pull_requests(&self, owner: &str, repo: &str, query: &PrQuery) -> GhResult<Vec<PullRequest>> {
    if query.states.is_empty() || query.states.contains(&StateFilter::All) {
      return self.pull_requests_for_state(owner, repo, StateFilter::All, query);
    }

    let mut seen: HashSet<i64> = HashSet::new();
    let mut all = Vec::new();

    for state in &query.states {
      for pr in self.pull_requests_for_state(owner, repo, *state, query)? {
        if seen.insert(pr.number) {
          all.push(pr);
        }
      }
      tracing::debug!(state = %state, unique = all.len(), "merged state results");
    }

    // Newest first; missing created_at sorts last.
    all.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(all)
  }

  pub fn pull_requests_from_repos(&self, owner: &str, repos: &[String], query: &PrQuery) -> IndexMap<String, Vec<PullRequest>> {
    let mut results = IndexMap::new();

    for repo in repos {
      let prs = match self.pull_requests(owner, repo, query) {
        Ok(prs) => {
          tracing::info!(repo = %repo, count = prs.len(), "fetched pull requests");
          prs
        }
        Err(e) => {
          tracing::warn!(repo = %repo, error = %e, "failed to fetch pull requests; continuing");
          Vec::new()
        }
      };

      results.insert(repo.clone(), prs);
    }

    results
  }

  pub fn rate_limit_status(&self) -> GhResult<RateLimit> {
    let v = self.api.rate_limit_json()?;

    Ok(RateLimit {
      limit: v.fetch("resources.core.limit").to_or_default(),
      remaining: v.fetch("resources.core.remaining").to_or_default(),
      reset: v.fetch("resources.core.reset").to_or_default(),
    })
  }

  pub fn pr_files(&self, owner: &str, repo: &str, number: i64) -> GhResult<Vec<FileChange>> {
    let mut files: Vec<serde_json::Value> = Vec::new();
    let mut page = 1;

    loop {
      let items = self.api.pr_files_page(owner, repo, number, page)?.as_array().cloned().unwrap_or_default();

      if items.is_empty() {
        break;
      }

      let short = items.len() < PER_PAGE;
      files.extend(items);

      if short || files.len() >= MAX_PR_FILES {
        break;
      }

      page += 1;
    }

    files.truncate(MAX_PR_FILES);

    Ok(decode_items(files, "file entry"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::RefCell;
  use std::collections::HashMap;

  /// In-memory seam: search results keyed by query string, list endpoints by page count.
  #[derive(Default)]
  struct FakeApi {
    search: HashMap<String, Vec<serde_json::Value>>,
    failing_repos: Vec<String>,
    org_pages: usize,
    file_count: usize,
    calls: RefCell<Vec<String>>,
  }

  fn pr_json(number: i64, created: &str) -> serde_json::Value {
    serde_json::json!({ "number": number, "title": format!("PR {}", number), "state": "open", "created_at": created })
  }

  fn numbered(n: usize, key: &str) -> Vec<serde_json::Value> {
    (0..n).map(|i| serde_json::json!({ key: format!("{}-{}", key, i) })).collect()
  }

  impl GithubApi for FakeApi {
    fn current_user_json(&self) -> GhResult<serde_json::Value> {
      Ok(serde_json::json!({ "login": "me" }))
    }

    fn user_orgs_page(&self, page: u32) -> GhResult<serde_json::Value> {
      self.calls.borrow_mut().push(format!("orgs:{}", page));
      let items = if (page as usize) <= self.org_pages { numbered(PER_PAGE, "login") } else { vec![] };
      Ok(serde_json::Value::Array(items))
    }

    fn org_repos_page(&self, _org: &str, page: u32) -> GhResult<serde_json::Value> {
      self.calls.borrow_mut().push(format!("repos:{}", page));
      let items = if page == 1 { numbered(3, "name") } else { vec![] };
      Ok(serde_json::Value::Array(items))
    }

    fn search_issues_page(&self, query: &str, page: u32) -> GhResult<serde_json::Value> {
      self.calls.borrow_mut().push(format!("search:{}:{}", query, page));
      if self.failing_repos.iter().any(|r| query.contains(&format!("repo:o/{} ", r))) {
        return Err(GithubError::NotFound(query.to_string()));
      }
      let all = self.search.get(query).cloned().unwrap_or_default();
      let start = (page as usize - 1) * PER_PAGE;
      let items: Vec<_> = all.into_iter().skip(start).take(PER_PAGE).collect();
      Ok(serde_json::json!({ "items": items }))
    }

    fn pr_files_page(&self, _owner: &str, _repo: &str, _number: i64, page: u32) -> GhResult<serde_json::Value> {
      self.calls.borrow_mut().push(format!("files:{}", page));
      let start = (page as usize - 1) * PER_PAGE;
      let n = self.file_count.saturating_sub(start).min(PER_PAGE);
      Ok(serde_json::Value::Array(
        (0..n)
          .map(|i| serde_json::json!({ "filename": format!("f{}.rs", start + i), "status": "modified", "sha": "x" }))
          .collect(),
      ))
    }

    fn rate_limit_json(&self) -> GhResult<serde_json::Value> {
      Ok(serde_json::json!({ "resources": { "core": { "limit": 5000, "remaining": 4321, "reset": 1700000000 } } }))
    }
  }

  fn query(states: &[StateFilter]) -> PrQuery {
    PrQuery {
      author: "me".into(),
      states: states.to_vec(),
      ..Default::default()
    }
  }

  #[test]
  fn search_query_variants() {
    let mut q = query(&[]);
    assert_eq!(search_query("o", "r", StateFilter::All, &q), "repo:o/r type:pr author:me");
    assert_eq!(search_query("o", "r", StateFilter::Merged, &q), "repo:o/r type:pr author:me is:merged");
    assert_eq!(search_query("o", "r", StateFilter::Closed, &q), "repo:o/r type:pr author:me is:closed");

    q.merged_only = true;
    q.labels = vec!["bug".into(), "ui".into()];
    q.since = Some("2024-01-01".into());
    q.until = Some("2024-06-30".into());
    assert_eq!(
      search_query("o", "r", StateFilter::Closed, &q),
      "repo:o/r type:pr author:me is:closed is:merged label:bug label:ui created:>=2024-01-01 created:<=2024-06-30"
    );
    assert_eq!(
      search_query("o", "r", StateFilter::Open, &q),
      "repo:o/r type:pr author:me is:open label:bug label:ui created:>=2024-01-01 created:<=2024-06-30"
    );
  }

  #[test]
  fn multiple_states_dedup_and_sort_newest_first() {
    let mut api = FakeApi::default();
    api.search.insert(
      "repo:o/r type:pr author:me is:open".into(),
      vec![pr_json(1, "2024-01-01T00:00:00Z"), pr_json(3, "2024-03-01T00:00:00Z")],
    );
    api.search.insert(
      "repo:o/r type:pr author:me is:merged".into(),
      vec![pr_json(3, "2024-03-01T00:00:00Z"), pr_json(2, "2024-02-01T00:00:00Z")],
    );
    let client = GithubClient::new(Box::new(api));

    let prs = client
      .pull_requests("o", "r", &query(&[StateFilter::Open, StateFilter::Merged]))
      .unwrap();
    assert_eq!(prs.iter().map(|p| p.number).collect::<Vec<_>>(), vec![3, 2, 1]);
  }

  #[test]
  fn all_state_uses_a_single_query() {
    let mut api = FakeApi::default();
    api.search.insert("repo:o/r type:pr author:me".into(), vec![pr_json(9, "2024-01-01")]);
    let client = GithubClient::new(Box::new(api));

    let prs = client
      .pull_requests("o", "r", &query(&[StateFilter::Open, StateFilter::All]))
      .unwrap();
    assert_eq!(prs.len(), 1);
  }

  #[test]
  fn search_paginates_until_short_page() {
    let mut api = FakeApi::default();
    let many: Vec<_> = (0..250).map(|i| pr_json(i, "2024-01-01")).collect();
    api.search.insert("repo:o/r type:pr author:me".into(), many);
    let client = GithubClient::new(Box::new(api));

    let prs = client.pull_requests("o", "r", &query(&[StateFilter::All])).unwrap();
    assert_eq!(prs.len(), 250);
  }

  #[test]
  fn exact_multiple_of_page_size_needs_one_empty_page() {
    let mut api = FakeApi::default();
    let many: Vec<_> = (0..200).map(|i| pr_json(i, "2024-01-01")).collect();
    api.search.insert("repo:o/r type:pr author:me".into(), many);
    let client = GithubClient::new(Box::new(api));

    assert_eq!(client.pull_requests("o", "r", &query(&[])).unwrap().len(), 200);
  }

  #[test]
  fn org_listing_stops_on_empty_page() {
    let api = FakeApi {
      org_pages: 2,
      ..Default::default()
    };
    let client = GithubClient::new(Box::new(api));
    let orgs = client.organizations().unwrap();
    assert_eq!(orgs.len(), 200);
    assert_eq!(orgs[0].login, "login-0");

    let repos = client.repositories("o").unwrap();
    assert_eq!(repos.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["name-0", "name-1", "name-2"]);
  }

  #[test]
  fn pr_files_are_capped() {
    let api = FakeApi {
      file_count: 450,
      ..Default::default()
    };
    let client = GithubClient::new(Box::new(api));
    let files = client.pr_files("o", "r", 1).unwrap();
    assert_eq!(files.len(), MAX_PR_FILES);
    assert_eq!(files[0].filename, "f0.rs");

    let api = FakeApi {
      file_count: 42,
      ..Default::default()
    };
    assert_eq!(GithubClient::new(Box::new(api)).pr_files("o", "r", 1).unwrap().len(), 42);
  }

  #[test]
  fn failing_repo_yields_empty_list() {
    let mut api = FakeApi {
      failing_repos: vec!["bad".into()],
      ..Default::default()
    };
    api.search.insert("repo:o/good type:pr author:me".into(), vec![pr_json(1, "2024-01-01")]);
    let client = GithubClient::new(Box::new(api));

    let repos = vec!["bad".to_string(), "good".to_string()];
    let out = client.pull_requests_from_repos("o", &repos, &query(&[StateFilter::All]));
    assert_eq!(out.keys().collect::<Vec<_>>(), vec!["bad", "good"]);
    assert!(out["bad"].is_empty());
    assert_eq!(out["good"].len(), 1);
  }

  #[test]
  fn rate_limit_and_current_user() {
    let client = GithubClient::new(Box::new(FakeApi::default()));
    let rl = client.rate_limit_status().unwrap();
    assert_eq!(rl.remaining, 4321);
    assert_eq!(rl.reset, 1700000000);
    assert_eq!(client.current_user().unwrap(), "me");
  }
}
