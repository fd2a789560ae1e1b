// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for running git, naming saved files, padding menu columns, and man page rendering
// role: utilities/helpers
// inputs: Repo path and git args; timestamps; branch names; clap CommandFactory
// outputs: git stdout or contextual errors, stable file names, troff man page text
// side_effects: run_git invokes subprocesses; write_markdown writes into the working directory
// invariants:
// - run_git succeeds only on exit 0 and surfaces stderr otherwise
// - saved file names are filesystem-safe (no path separators from branch names)
// errors: run_git surfaces command + stderr; IO errors bubble with context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::CommandFactory;

use crate::process::Invocation;

pub fn run_git(repo: &str, args: &[&str]) -> Result<String> {
  let out = Invocation::new("git", args).current_dir(repo).run();

  if out.success() {
    Ok(out.stdout)
  } else {
    anyhow::bail!("git {} failed: {}", args.join(" "), out.stderr.trim())
  }
}

/// `commit-message-20250812-140300.md`
pub fn commit_message_file_name(now: DateTime<Local>) -> String {
  format!("commit-message-{}.md", now.format("%Y%m%d-%H%M%S"))
}

/// `pr-description-feature-x-to-main-20250812-140300.md`
pub fn pr_description_file_name(from: &str, to: &str, now: DateTime<Local>) -> String {
  format!(
    "pr-description-{}-to-{}-{}.md",
    file_safe(from),
    file_safe(to),
    now.format("%Y%m%d-%H%M%S")
  )
}

fn file_safe(name: &str) -> String {
  name.replace(&['/', '\\'][..], "-")
}

/// Write generated Markdown into `dir`, returning the path written.
pub fn write_markdown(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
  let path = dir.join(file_name);
  std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
  Ok(path)
}

/// Right-pad `s` to `width` characters (char-aware, unlike `{:width$}` on mixed scripts).
pub fn pad(s: &str, width: usize) -> String {
  let len = s.chars().count();
  if len >= width {
    s.to_string()
  } else {
    format!("{}{}", s, " ".repeat(width - len))
  }
}

/// Shorten to `max` characters, ending in "..." when clipped.
pub fn ellipsize(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    return s.to_string();
  }
  let keep: String = s.chars().take(max.saturating_sub(3)).collect();
  format!("{}...", keep)
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> anyhow::Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
