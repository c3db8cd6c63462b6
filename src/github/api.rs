// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: GitHub REST seam: one call per endpoint page, with an HTTP backend (retry, rate-limit wait) and an env-fixture backend
// role: github/api
// inputs: token, base URL; env PRD_TEST_GH_* fixtures for the mock backend
// outputs: Raw serde_json::Value pages or a typed GithubError
// side_effects: Network calls; sleeps on rate limit and between retries
// invariants:
// - 401/403/404 map to dedicated errors and are never retried
// - A 403 with X-RateLimit-Remaining: 0 waits until reset + 1s without consuming a retry
// - Other failures are retried up to MAX_ATTEMPTS with exponential backoff
// - The env backend is chosen whenever any PRD_TEST_GH_* variable is set
// errors: GithubError
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::time::Duration;

use crate::ext::serde_json::JsonFetch;
use crate::util::truncate_chars;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const PER_PAGE: usize = 100;
pub const MAX_ATTEMPTS: u32 = 3;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "pr-digest";
const ENV_PREFIX: &str = "PRD_TEST_GH_";

#[derive(Debug, thiserror::Error)]
pub enum GithubError {
  #[error("invalid GitHub token; check your credentials")]
  InvalidToken,
  #[error("access forbidden; make sure the token has the 'repo' scope")]
  Forbidden,
  #[error("resource not found: {0} (check the organization/repository name)")]
  NotFound(String),
  #[error("GitHub returned HTTP {status} for {url}")]
  Http { status: u16, url: String },
  #[error("request to {url} failed: {message}")]
  Transport { url: String, message: String },
  #[error("unexpected response from {url}: {message}")]
  Decode { url: String, message: String },
}

pub type GhResult<T> = Result<T, GithubError>;

// --- Trait seam for GitHub API ---
pub trait GithubApi {
  fn current_user_json(&self) -> GhResult<serde_json::Value>;
  fn user_orgs_page(&self, page: u32) -> GhResult<serde_json::Value>;
  fn org_repos_page(&self, org: &str, page: u32) -> GhResult<serde_json::Value>;
  fn search_issues_page(&self, query: &str, page: u32) -> GhResult<serde_json::Value>;
  fn pr_files_page(&self, owner: &str, repo: &str, number: i64, page: u32) -> GhResult<serde_json::Value>;
  fn rate_limit_json(&self) -> GhResult<serde_json::Value>;
}

struct GithubHttpApi {
  agent: ureq::Agent,
  base_url: String,
  token: String,
  backoff_base: Duration,
}

impl GithubHttpApi {
  fn new(token: String, base_url: String) -> Self {
    let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();

    Self {
      agent,
      base_url: base_url.trim_end_matches('/').to_string(),
      token,
      backoff_base: Duration::from_secs(1),
    }
  }

  /// Seconds to wait when a response says the rate limit is exhausted.
  fn rate_limit_wait(resp: &ureq::Response) -> Option<u64> {
    let remaining = resp.header("X-RateLimit-Remaining")?.trim().parse::<i64>().ok()?;

    if remaining != 0 {
      return None;
    }

    let reset = resp.header("X-RateLimit-Reset")?.trim().parse::<i64>().ok()?;
    let wait = reset - chrono::Utc::now().timestamp();

    (wait > 0).then_some(wait as u64 + 1)
  }

  fn get(&self, path: &str, query: &[(&str, String)]) -> GhResult<serde_json::Value> {
    let url = format!("{}{}", self.base_url, path);
    let mut attempt: u32 = 0;

    loop {
      let mut req = self
        .agent
        .get(&url)
        .set("Authorization", &format!("token {}", self.token))
        .set("Accept", "application/vnd.github.v3+json")
        .set("User-Agent", USER_AGENT);

      for (k, v) in query {
        req = req.query(k, v);
      }

      tracing::debug!(url = %url, attempt = attempt + 1, "GET");

      let failure = match req.call() {
        Ok(resp) => {
          return resp.into_json::<serde_json::Value>().map_err(|e| GithubError::Decode {
            url: url.clone(),
            message: e.to_string(),
          });
        }
        Err(ureq::Error::Status(403, resp)) => {
          if let Some(wait) = Self::rate_limit_wait(&resp) {
            tracing::warn!("rate limit exceeded; waiting {} seconds", wait);
            std::thread::sleep(Duration::from_secs(wait));
            continue;
          }

          return Err(GithubError::Forbidden);
        }
        Err(ureq::Error::Status(401, _)) => return Err(GithubError::InvalidToken),
        Err(ureq::Error::Status(404, _)) => return Err(GithubError::NotFound(path.to_string())),
        Err(ureq::Error::Status(status, resp)) => {
          let body = resp.into_string().unwrap_or_default();
          tracing::debug!(status, body = %truncate_chars(&body, 200), "GitHub error response");

          GithubError::Http { status, url: url.clone() }
        }
        Err(ureq::Error::Transport(t)) => GithubError::Transport {
          url: url.clone(),
          message: t.to_string(),
        },
      };

      attempt += 1;

      if attempt >= MAX_ATTEMPTS {
        return Err(failure);
      }

      tracing::warn!(error = %failure, "retrying ({}/{})", attempt, MAX_ATTEMPTS);
      std::thread::sleep(self.backoff_base * 2u32.pow(attempt));
    }
  }

  fn page_query(page: u32) -> Vec<(&'static str, String)> {
    vec![("per_page", PER_PAGE.to_string()), ("page", page.to_string())]
  }
}

impl GithubApi for GithubHttpApi {
  fn current_user_json(&self) -> GhResult<serde_json::Value> {
    self.get("/user", &[])
  }

  fn user_orgs_page(&self, page: u32) -> GhResult<serde_json::Value> {
    self.get("/user/orgs", &Self::page_query(page))
  }

  fn org_repos_page(&self, org: &str, page: u32) -> GhResult<serde_json::Value> {
    let mut q = Self::page_query(page);
    q.push(("type", "all".to_string()));
    self.get(&format!("/orgs/{}/repos", org), &q)
  }

  fn search_issues_page(&self, query: &str, page: u32) -> GhResult<serde_json::Value> {
    let mut q = vec![("q", query.to_string())];
    q.extend(Self::page_query(page));
    q.push(("sort", "created".to_string()));
    q.push(("order", "desc".to_string()));
    self.get("/search/issues", &q)
  }

  fn pr_files_page(&self, owner: &str, repo: &str, number: i64, page: u32) -> GhResult<serde_json::Value> {
    self.get(
      &format!("/repos/{}/{}/pulls/{}/files", owner, repo, number),
      &Self::page_query(page),
    )
  }

  fn rate_limit_json(&self) -> GhResult<serde_json::Value> {
    self.get("/rate_limit", &[])
  }
}

/// Fixture-driven backend for CLI tests. Lists are served whole on page 1 and empty afterwards.
///
/// - `PRD_TEST_GH_USER_JSON`: `/user` object
/// - `PRD_TEST_GH_ORGS_JSON`: array of orgs
/// - `PRD_TEST_GH_REPOS_JSON`: array of repos, or object keyed by org
/// - `PRD_TEST_GH_SEARCH_JSON`: array of issue items, or object keyed by `owner/repo`
/// - `PRD_TEST_GH_FILES_JSON`: array of files, or object keyed by PR number
/// - `PRD_TEST_GH_RATE_LIMIT_JSON`: `/rate_limit` object
/// - `PRD_TEST_GH_FAIL_REPOS`: comma-separated `owner/repo` names whose search returns 404
struct GithubEnvApi;

impl GithubEnvApi {
  fn read(name: &str) -> Option<serde_json::Value> {
    let raw = std::env::var(format!("{}{}", ENV_PREFIX, name)).ok()?;
    serde_json::from_str::<serde_json::Value>(&raw).ok()
  }

  /// An array as-is, or the entry under `key` when the fixture is an object.
  fn select(v: serde_json::Value, key: &str) -> serde_json::Value {
    match v {
      serde_json::Value::Object(mut m) => m.remove(key).unwrap_or_else(|| serde_json::json!([])),
      other => other,
    }
  }

  fn list_page(name: &str, key: &str, page: u32) -> serde_json::Value {
    if page > 1 {
      return serde_json::json!([]);
    }

    Self::read(name)
      .map(|v| Self::select(v, key))
      .unwrap_or_else(|| serde_json::json!([]))
  }

  fn repo_of_query(query: &str) -> &str {
    query
      .split_whitespace()
      .find_map(|part| part.strip_prefix("repo:"))
      .unwrap_or("")
  }
}

impl GithubApi for GithubEnvApi {
  fn current_user_json(&self) -> GhResult<serde_json::Value> {
    Self::read("USER_JSON").ok_or(GithubError::InvalidToken)
  }

  fn user_orgs_page(&self, page: u32) -> GhResult<serde_json::Value> {
    Ok(Self::list_page("ORGS_JSON", "", page))
  }

  fn org_repos_page(&self, org: &str, page: u32) -> GhResult<serde_json::Value> {
    Ok(Self::list_page("REPOS_JSON", org, page))
  }

  fn search_issues_page(&self, query: &str, page: u32) -> GhResult<serde_json::Value> {
    let repo = Self::repo_of_query(query);

    let failing = std::env::var(format!("{}FAIL_REPOS", ENV_PREFIX)).unwrap_or_default();
    if failing.split(',').map(str::trim).any(|r| !r.is_empty() && r == repo) {
      return Err(GithubError::NotFound(format!("/search/issues?q={}", query)));
    }

    let items = Self::list_page("SEARCH_JSON", repo, page);
    let total = items.as_array().map(|a| a.len()).unwrap_or(0);

    Ok(serde_json::json!({ "total_count": total, "items": items }))
  }

  fn pr_files_page(&self, _owner: &str, _repo: &str, number: i64, page: u32) -> GhResult<serde_json::Value> {
    Ok(Self::list_page("FILES_JSON", &number.to_string(), page))
  }

  fn rate_limit_json(&self) -> GhResult<serde_json::Value> {
    Ok(Self::read("RATE_LIMIT_JSON").unwrap_or_else(|| {
      serde_json::json!({ "resources": { "core": { "limit": 5000, "remaining": 5000, "reset": 0 } } })
    }))
  }
}

pub fn env_wants_mock() -> bool {
  std::env::vars().any(|(k, _)| k.starts_with(ENV_PREFIX))
}

pub fn build_api(token: String, base_url: Option<String>) -> Box<dyn GithubApi> {
  if env_wants_mock() {
    tracing::debug!("using GitHub fixtures from {}* variables", ENV_PREFIX);
    return Box::new(GithubEnvApi);
  }

  let base = base_url
    .filter(|s| !s.trim().is_empty())
    .unwrap_or_else(|| DEFAULT_API_URL.to_string());

  Box::new(GithubHttpApi::new(token, base))
}

// Public constructors for dependency injection in higher layers/tests.
#[cfg(any(test, feature = "testutil"))]
pub fn make_http_api(token: String, base_url: String, backoff_base: Duration) -> Box<dyn GithubApi> {
  let mut api = GithubHttpApi::new(token, base_url);
  api.backoff_base = backoff_base;
  Box::new(api)
}

#[cfg(any(test, feature = "testutil"))]
pub fn make_env_api() -> Box<dyn GithubApi> {
  Box::new(GithubEnvApi)
}

/// `items` of a search page (missing or malformed → empty).
pub fn search_items(page: &serde_json::Value) -> Vec<serde_json::Value> {
  page.fetch("items").to_or_default::<Vec<serde_json::Value>>()
}
