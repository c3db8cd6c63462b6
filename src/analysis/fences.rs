// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Remove markdown code fences that models wrap around JSON replies
// role: analysis/parsing
// inputs: Raw model reply text
// outputs: Trimmed inner text ready for serde_json
// invariants:
// - Opening fence (with optional language tag) and closing fence are stripped independently
// - Text without fences is only trimmed
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

const FENCE: &str = "```";

/// Strip a leading ```` ```lang ```` line and a trailing ```` ``` ```` from `raw`.
pub fn strip_code_fences(raw: &str) -> &str {
  let mut text = raw.trim();

  if let Some(rest) = text.strip_prefix(FENCE) {
    // Language tag runs up to the first newline; a tag never contains JSON punctuation.
    let tag_len = rest
      .find(|c: char| c == '\n' || c == '{' || c == '[')
      .unwrap_or(rest.len());

    let tag = &rest[..tag_len];
    text = if tag.trim().chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
      &rest[tag_len..]
    } else {
      rest
    };
  }

  let text = text.trim();

  text.strip_suffix(FENCE).unwrap_or(text).trim()
}
