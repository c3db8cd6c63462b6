// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Render one pull request into a bounded, prompt-ready text block (header, file summary, technology tags, key added lines)
// role: analysis/compressor
// inputs: &PullRequest (optionally enriched with files)
// outputs: String; write-only input for the completion model
// invariants:
// - Pure and deterministic; never fails (absent body/created_at render as empty/N/A)
// - Body capped at 300 chars; at most 10 listed files; at most 5 excerpted files with 3 lines each
// - No "Files changed"/"Key code changes" sections without file data
// - Total output length is not capped
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;

use crate::model::{FileChange, PullRequest};
use crate::util::truncate_chars;

const BODY_MAX_CHARS: usize = 300;
const MAX_LISTED_FILES: usize = 10;
const MAX_EXCERPT_FILES: usize = 5;
const MAX_LINES_PER_FILE: usize = 3;

static TECH_BY_EXTENSION: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
  HashMap::from([
    ("py", "Python"),
    ("js", "JavaScript"),
    ("jsx", "React"),
    ("ts", "TypeScript"),
    ("tsx", "React/TypeScript"),
    ("java", "Java"),
    ("go", "Go"),
    ("rs", "Rust"),
    ("cpp", "C++"),
    ("c", "C"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("vue", "Vue"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("scss", "SCSS"),
    ("yaml", "YAML"),
    ("yml", "YAML"),
    ("json", "JSON"),
    ("md", "Markdown"),
    ("sql", "SQL"),
    ("sh", "Shell"),
  ])
});

const SOURCE_EXTENSIONS: &[&str] = &[
  ".py", ".ts", ".tsx", ".js", ".jsx", ".java", ".go", ".rs", ".cpp", ".c", ".rb", ".php", ".vue", ".html", ".css",
  ".scss",
];

const STRUCTURAL_KEYWORDS: &[&str] = &[
  "import ",
  "from ",
  "class ",
  "def ",
  "function ",
  "const ",
  "let ",
  "var ",
  "interface ",
  "type ",
  "@",
  "async ",
  "export ",
];

const EXCLUDED_PATH_PARTS: &[&str] = &[
  ".lock",
  "package-lock.json",
  "yarn.lock",
  "poetry.lock",
  ".idea/",
  ".vscode/",
  "node_modules/",
  "__pycache__/",
];

/// Technology tag for a path, from the text after its last `.`.
pub fn technology_for(path: &str) -> Option<&'static str> {
  if !path.contains('.') {
    return None;
  }
  let ext = path.rsplit('.').next().unwrap_or("").to_lowercase();
  TECH_BY_EXTENSION.get(ext.as_str()).copied()
}

pub fn is_excluded(path: &str) -> bool {
  EXCLUDED_PATH_PARTS.iter().any(|part| path.contains(part))
}

fn is_source_file(path: &str) -> bool {
  SOURCE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Added diff lines carrying import/definition keywords, rendered with a 4-space indent.
pub fn key_added_lines(patch: &str) -> Vec<String> {
  let mut out = Vec::new();

  for line in patch.split('\n') {
    if !line.starts_with('+') || line.starts_with("+++") {
      continue;
    }
    let stripped = line[1..].trim();

    if STRUCTURAL_KEYWORDS.iter().any(|kw| stripped.contains(kw)) {
      out.push(format!("    {}", line));
      if out.len() >= MAX_LINES_PER_FILE {
        break;
      }
    }
  }

  out
}

fn file_line(f: &FileChange) -> String {
  format!("  - {}: +{} -{} ({})", f.filename, f.additions, f.deletions, f.status)
}

fn render_files(files: &[FileChange]) -> String {
  let mut out = String::new();

  let total_additions: i64 = files.iter().map(|f| f.additions).sum();
  let total_deletions: i64 = files.iter().map(|f| f.deletions).sum();
  out.push_str(&format!(
    "\n\nFiles changed ({}): +{} -{}",
    files.len(),
    total_additions,
    total_deletions
  ));

  let informative: Vec<&FileChange> = files.iter().filter(|f| !is_excluded(&f.filename)).collect();
  let listed = &informative[..informative.len().min(MAX_LISTED_FILES)];

  let technologies: BTreeSet<&str> = listed.iter().filter_map(|f| technology_for(&f.filename)).collect();
  if !technologies.is_empty() {
    let tags: Vec<&str> = technologies.into_iter().collect();
    out.push_str(&format!("\nTechnologies: {}", tags.join(", ")));
  }

  if !listed.is_empty() {
    let lines: Vec<String> = listed.iter().map(|f| file_line(f)).collect();
    out.push('\n');
    out.push_str(&lines.join("\n"));
  }

  if informative.len() > MAX_LISTED_FILES {
    out.push_str(&format!("\n  ... and {} more files", informative.len() - MAX_LISTED_FILES));
  }

  let with_patch: Vec<&&FileChange> = informative
    .iter()
    .filter(|f| f.patch.as_deref().is_some_and(|p| !p.is_empty()) && is_source_file(&f.filename))
    .take(MAX_EXCERPT_FILES)
    .collect();

  if !with_patch.is_empty() {
    out.push_str("\n\nKey code changes:");
    for f in with_patch {
      out.push('\n');
      out.push_str(&file_line(f));

      let key_lines = key_added_lines(f.patch.as_deref().unwrap_or(""));
      if !key_lines.is_empty() {
        out.push('\n');
        out.push_str(&key_lines.join("\n"));
      }
    }
  }

  out
}

/// Compress a pull request into the text block fed to the summarization prompt.
pub fn compress(pr: &PullRequest) -> String {
  let body = truncate_chars(pr.body.as_deref().unwrap_or(""), BODY_MAX_CHARS);
  let labels = pr.label_names();
  let labels = if labels.is_empty() { "None".to_string() } else { labels.join(", ") };

  let mut out = format!(
    "PR #{}: {}\nState: {}\nCreated: {}\nLabels: {}\nComments: {}\nDescription: {}...",
    pr.number,
    pr.title,
    pr.lifecycle(),
    pr.created_at.as_deref().unwrap_or("N/A"),
    labels,
    pr.comments,
    body
  );

  if let Some(files) = pr.files.as_deref().filter(|f| !f.is_empty()) {
    out.push_str(&render_files(files));
  }

  out
}
