// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Prompt text for the batch summarizer and the aggregator
// role: analysis/prompts
// inputs: Compressed batch text or serialized batch results, the requested field names, PR totals
// outputs: System personas (BATCH_SYSTEM, AGGREGATE_SYSTEM) and user prompts (batch_prompt, aggregate_prompt)
// invariants: The batch prompt lists every requested field; both prompts ask for JSON with a `fields` map keyed by the first field
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub const BATCH_SYSTEM: &str = "You are writing a professional resume from the developer's perspective. \
Analyze code changes to identify exact technologies and write in first person: 'I implemented...', \
'I developed...', 'I architected...'. Be specific about technologies, frameworks, and libraries seen in the code.";

pub const AGGREGATE_SYSTEM: &str = "You are writing a professional technical resume from the developer's perspective. \
Write in first person using formal professional style: 'I implemented...', 'I developed...', 'I architected...'. \
Create comprehensive summaries that highlight technical achievements, exact technologies used, and measurable impact.";

fn anchor_field(fields: &[String]) -> &str {
  fields.first().map(String::as_str).unwrap_or("Key Achievements")
}

pub fn batch_prompt(batch_len: usize, fields: &[String], records_text: &str) -> String {
  format!(
    r#"You are analyzing pull requests for a professional resume. Write from the developer's perspective in first person.

Analyze these {count} pull requests and extract information for the following fields:
{field_list}

Pull Requests (with code snippets):
{records_text}

Instructions:
1. Analyze code patches to identify EXACT technologies, frameworks, and libraries used (e.g., "Chakra UI", "Framer Motion", not just "React")
2. Extract specific features and technical achievements from the code
3. Write in first person professional style: "I implemented...", "I developed...", "I architected..."
4. Be specific about technical decisions and impact

Output must be valid JSON with this structure:
{{
  "fields": {{
    "{anchor}": ["I implemented feature X using technology Y", "I developed..."],
    ...
  }},
  "partial_summary": "Brief first-person summary: I worked on..., I implemented..."
}}

Focus on technical depth, specific technologies from code, and professional achievements."#,
    count = batch_len,
    field_list = fields.join(", "),
    records_text = records_text,
    anchor = anchor_field(fields),
  )
}

pub fn aggregate_prompt(batch_count: usize, results_json: &str, summary_lines: &str, total: usize, fields: &[String]) -> String {
  format!(
    r#"Combine these {batch_count} partial analysis results into a final comprehensive resume output.

Partial Results:
{results_json}

Batch Summaries:
{summary_lines}

Total PRs analyzed: {total}

Tasks:
1. Merge all field lists (combine items, remove duplicates, keep most important)
2. Create comprehensive first-person professional summary (2-3 paragraphs)
3. Write as the developer: "I implemented...", "I developed...", "I architected..."
4. Ensure professional tone suitable for a resume

Output must be valid JSON:
{{
  "fields": {{
    "{anchor}": ["I implemented X", "I developed Y", ...],
    ...
  }},
  "summary": "First-person professional summary: I worked on... I implemented... I achieved..."
}}

The summary should:
- Highlight key technical achievements and impact
- Specify exact technologies, frameworks, and tools used
- Demonstrate technical depth and leadership
- Be written in professional first-person style suitable for a resume"#,
    anchor = anchor_field(fields),
  )
}
