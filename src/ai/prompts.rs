// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Build commit and PR prompts from diffs, truncating oversized diffs to the model's context budget
// role: ai/prompts
// inputs: Diff text, detail level, output language
// outputs: Prompt strings ready for TextGenerator::generate
// side_effects: Prints a warning when a diff is truncated
// invariants:
// - truncate counts chars, not bytes; within-budget input is returned unchanged
// - Truncated output keeps the first max/2 and last max-max/2 chars around a marker naming the omitted count
// - Every prompt names the output language and embeds the (possibly truncated) diff verbatim
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use crate::ai::client::MAX_OUTPUT_TOKENS;
use crate::ui;

pub const CONTEXT_TOKENS: usize = 131_072;
/// Completion tokens plus headroom for the template itself.
pub const RESERVED_TOKENS: usize = MAX_OUTPUT_TOKENS as usize + 8_000;
/// Conservative for code diffs.
pub const CHARS_PER_TOKEN: usize = 3;
pub const MAX_PROMPT_CHARS: usize = (CONTEXT_TOKENS - RESERVED_TOKENS) * CHARS_PER_TOKEN;

/// Keep the head and tail of `text` so the whole fits in `max_chars` plus the marker.
pub fn truncate(text: &str, max_chars: usize) -> String {
  let len = text.chars().count();
  if text.is_empty() || len <= max_chars {
    return text.to_string();
  }

  let head_len = max_chars / 2;
  let tail_len = max_chars - head_len;

  let head: String = text.chars().take(head_len).collect();
  let tail: String = text.chars().skip(len - tail_len).collect();

  format!("{}\n\n...[TRUNCATED - {} characters omitted]...\n\n{}", head, len - max_chars, tail)
}

/// [`truncate`] to [`MAX_PROMPT_CHARS`], telling the user when it bites.
pub fn fit_to_budget(diff: &str) -> String {
  let len = diff.chars().count();
  if len > MAX_PROMPT_CHARS {
    ui::warn(&format!("Diff is too large ({} chars). Truncating to {} chars...", len, MAX_PROMPT_CHARS));
    tracing::info!(diff_chars = len, budget = MAX_PROMPT_CHARS, "diff truncated");
  }
  truncate(diff, MAX_PROMPT_CHARS)
}

pub fn commit_prompt(diff: &str, detailed: bool, language: &str) -> String {
  let diff = fit_to_budget(diff);

  if detailed {
    format!(
      "You are an expert at writing git commit messages. From the git diff below, write a detailed conventional commit with a title line and a body.

LANGUAGE: Write the commit message in {language}.

FORMAT REQUIREMENTS:
1. TITLE LINE (required):
   - Begin with a conventional commit type: feat, fix, docs, style, refactor, test, chore
   - Use the imperative mood: 'add', not 'added' or 'adds'
   - Keep the subject within 50 characters
   - Example: 'feat: add user authentication with JWT'

2. BODY (required):
   - Leave one blank line after the title
   - Write 1-2 paragraphs describing the change
   - List the key changes as bullet points ('-' or '*')
   - Name the important files added or modified
   - Wrap lines under 72 characters
   - Explain why the change was made, not only what changed

3. STYLE:
   - Clear, professional {language}
   - Present tense
   - Specific about the technical implementation

Git diff:
{diff}

Write the complete commit message (title and body):"
    )
  } else {
    format!(
      "You are an expert at writing git commit messages. From the git diff below, write one concise, descriptive commit message in conventional commits format.

LANGUAGE: Write the commit message in {language}.

The commit message must:
- Begin with a type (feat, fix, docs, style, refactor, test, chore)
- Use the imperative mood (e.g. 'add', not 'added' or 'adds')
- Keep the subject within 50 characters
- Contain no extra formatting, quotes or explanations
- Be returned on its own, with nothing else

Git diff:
{diff}

Write only the commit message:"
    )
  }
}

pub fn pr_prompt(diff: &str, detailed: bool, language: &str) -> String {
  let diff = fit_to_budget(diff);

  if detailed {
    format!(
      "You are an expert at writing pull request descriptions. From the git diff between two branches below, write a detailed pull request description in Markdown.

LANGUAGE: Write the description in {language}.

FORMAT REQUIREMENTS:
1. TITLE: A concise PR title in conventional commit style
2. SUMMARY: A paragraph explaining the overall purpose of the changes
3. CHANGES: A detailed bullet list of every change, grouped by category (features, fixes, refactoring, ...)
4. FILES CHANGED: The key files modified and what changed in each
5. TESTING: How to test the changes
6. NOTES: Breaking changes, migration steps or other remarks, if any

STYLE:
- Clear, professional {language}
- Proper Markdown (headers, lists, code blocks)
- Cover every change in the diff
- Call out breaking changes

Git diff:
{diff}

Write the complete pull request description in Markdown:"
    )
  } else {
    format!(
      "You are an expert at writing pull request descriptions. From the git diff between two branches below, write a concise pull request description in Markdown.

LANGUAGE: Write the description in {language}.

FORMAT REQUIREMENTS:
1. TITLE: A concise PR title in conventional commit style
2. SUMMARY: A short paragraph explaining the purpose of the changes
3. CHANGES: A bullet list of the key changes

STYLE:
- Clear, professional {language}
- Proper Markdown (headers, lists)
- Concise, covering the important changes
- Return only the Markdown content

Git diff:
{diff}

Write the pull request description in Markdown:"
    )
  }
}
