// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the JSON model (pull requests, file changes, analysis results, reports) shared by fetch, store, export and analysis
// role: model/types
// outputs: Serializable structs with stable field names; unknown GitHub keys preserved on pull requests
// invariants: Stored PR JSON round-trips losslessly; FinalResult field order follows the requested FieldSet
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ordered mapping of field name to the entries produced for it.
pub type FieldMap = IndexMap<String, Vec<String>>;

/// Reads an explicit JSON `null` as the type's default, like a missing key.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Label {
  #[serde(default, deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PrUser {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub login: Option<String>,
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The `pull_request` sub-object the search API attaches to issue items.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PullRequestLinks {
  #[serde(default)]
  pub merged_at: Option<String>,
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
  Added,
  Modified,
  Removed,
  Renamed,
  Copied,
  Changed,
  Unchanged,
  #[default]
  #[serde(other)]
  Unknown,
}

impl ChangeKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ChangeKind::Added => "added",
      ChangeKind::Modified => "modified",
      ChangeKind::Removed => "removed",
      ChangeKind::Renamed => "renamed",
      ChangeKind::Copied => "copied",
      ChangeKind::Changed => "changed",
      ChangeKind::Unchanged => "unchanged",
      ChangeKind::Unknown => "unknown",
    }
  }
}

impl fmt::Display for ChangeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct FileChange {
  #[serde(default, deserialize_with = "null_as_default")]
  pub filename: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub status: ChangeKind,
  #[serde(default, deserialize_with = "null_as_default")]
  pub additions: i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub deletions: i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub changes: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub patch: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
  Open,
  Closed,
  Merged,
  Unknown,
}

impl LifecycleState {
  pub fn as_str(&self) -> &'static str {
    match self {
      LifecycleState::Open => "open",
      LifecycleState::Closed => "closed",
      LifecycleState::Merged => "merged",
      LifecycleState::Unknown => "unknown",
    }
  }
}

impl fmt::Display for LifecycleState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A pull request as returned by the issue search API, optionally enriched with `files`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PullRequest {
  pub number: i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub title: String,
  #[serde(default)]
  pub body: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub state: String,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_at: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub closed_at: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub html_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user: Option<PrUser>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub labels: Vec<Label>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub comments: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pull_request: Option<PullRequestLinks>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub files: Option<Vec<FileChange>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub files_count: Option<usize>,
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PullRequest {
  pub fn merged_at(&self) -> Option<&str> {
    self
      .pull_request
      .as_ref()
      .and_then(|p| p.merged_at.as_deref())
      .filter(|s| !s.is_empty())
  }

  /// Derived state: a merge timestamp wins over the raw open/closed state.
  pub fn lifecycle(&self) -> LifecycleState {
    if self.merged_at().is_some() {
      return LifecycleState::Merged;
    }

    match self.state.as_str() {
      "open" => LifecycleState::Open,
      "closed" => LifecycleState::Closed,
      _ => LifecycleState::Unknown,
    }
  }

  pub fn author_login(&self) -> Option<&str> {
    self.user.as_ref().and_then(|u| u.login.as_deref())
  }

  pub fn label_names(&self) -> Vec<&str> {
    self.labels.iter().map(|l| l.name.as_str()).collect()
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BatchResult {
  #[serde(default)]
  pub fields: FieldMap,
  #[serde(default)]
  pub partial_summary: String,
}

impl BatchResult {
  /// Every requested field mapped to an empty list, with an empty partial summary.
  pub fn empty(fields: &[String]) -> Self {
    Self {
      fields: fields.iter().map(|f| (f.clone(), Vec::new())).collect(),
      partial_summary: String::new(),
    }
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct FinalResult {
  pub fields: FieldMap,
  pub summary: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DateRange {
  pub oldest: Option<String>,
  pub newest: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PrStatistics {
  pub total: usize,
  pub by_state: BTreeMap<String, usize>,
  pub by_labels: BTreeMap<String, usize>,
  pub date_range: DateRange,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReportMetadata {
  pub total_prs: usize,
  pub input_path: String,
  pub analyzed_at: String,
  pub statistics: PrStatistics,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalysisReport {
  pub metadata: ReportMetadata,
  pub fields: FieldMap,
  pub summary: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
  pub open: usize,
  pub closed: usize,
  pub merged: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ExportStatistics {
  pub by_state: StateCounts,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub oldest: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub newest: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExportSummary {
  pub organization: String,
  pub repository: String,
  pub total_prs: usize,
  pub exported_at: String,
  pub pr_numbers: Vec<i64>,
  pub statistics: ExportStatistics,
}
