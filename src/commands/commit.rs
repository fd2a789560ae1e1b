// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: `commit`: generate a message for the working tree changes, commit everything and push
// role: commands/commit
// inputs: EffectiveConfig (repo, API settings), CommitOptions, TextGenerator, Prompter, current time
// outputs: A new commit on the current branch pushed to its upstream (or origin)
// side_effects: git add/commit/push; clipboard; optional commit-message-*.md in the repo dir
// invariants:
// - A clean work tree never calls the generator and goes straight to push
// - Without --confirm a missing upstream is set to origin/<branch> automatically
// - Declining a confirmation leaves the repository unchanged and exits successfully
// errors: Not a git repo, missing API key, generation failure, git add/commit/push failure
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};

use crate::ai::{prompts, TextGenerator};
use crate::cli::{CommitOptions, EffectiveConfig};
use crate::clipboard;
use crate::commands::build_generator;
use crate::gitio::{self, PushOutcome};
use crate::ui::{self, Cancelled, Prompter};
use crate::util::{commit_message_file_name, write_markdown};

const UPSTREAM_REMOTE: &str = "origin";

pub fn run(cfg: &EffectiveConfig, opts: &CommitOptions, prompter: &mut dyn Prompter) -> Result<()> {
  if !gitio::is_git_repository(&cfg.repo) {
    bail!("Not a git repository. Please run this command from within a git repository.");
  }
  let generator = build_generator(&cfg.api)?;
  execute(&cfg.repo, opts, &generator, prompter, Local::now())
}

/// Everything after the environment checks, with the generator and clock injected.
pub fn execute(
  repo: &str,
  opts: &CommitOptions,
  generator: &dyn TextGenerator,
  prompter: &mut dyn Prompter,
  now: DateTime<Local>,
) -> Result<()> {
  ui::info("📊 Analyzing git changes...");
  let diff = gitio::working_tree_diff(repo);
  let has_changes = !diff.trim().is_empty();

  if has_changes {
    ui::dim(&format!("Found changes ({} characters)", diff.chars().count()));

    let mode = if opts.detailed { " (detailed mode)" } else { "" };
    ui::info(&format!("🤖 Generating commit message...{}", mode));
    let message = generator
      .generate(&prompts::commit_prompt(&diff, opts.detailed, &opts.language))
      .context("Failed to generate commit message")?;

    ui::panel("Commit Message", &message);
    if clipboard::copy(&message) {
      ui::success("Copied to clipboard");
    } else {
      ui::warn("Could not copy to clipboard");
    }

    if opts.save {
      let path = write_markdown(Path::new(repo), &commit_message_file_name(now), &message)?;
      ui::success(&format!("Commit message saved to: {}", path.display()));
    }

    if opts.confirm {
      if !prompter.confirm("Do you want to proceed with this commit?", false)? {
        ui::warn("Commit cancelled.");
        return Ok(());
      }
    } else {
      ui::dim("Proceeding automatically (use --confirm to review)...");
    }

    ui::info("⚙️  Executing git commands...");
    ui::dim("   git add .");
    gitio::add_all(repo)?;
    ui::dim("   git commit");
    gitio::commit(repo, &message)?;
  } else {
    ui::warn("No changes detected in the repository.");
    if opts.confirm {
      if !prompter.confirm("No changes to commit. Do you want to push existing commits?", false)? {
        ui::warn("Push cancelled.");
        return Ok(());
      }
    } else {
      ui::dim("No changes to commit, proceeding with push...");
    }
  }

  push_with_upstream_fallback(repo, opts.confirm, prompter)?;

  if has_changes {
    ui::success("Successfully committed and pushed changes!");
  } else {
    ui::success("Successfully pushed changes!");
  }
  Ok(())
}

/// `git push`, setting the upstream when the branch has none. Declining the upstream push is [`Cancelled`].
fn push_with_upstream_fallback(repo: &str, confirm: bool, prompter: &mut dyn Prompter) -> Result<()> {
  ui::dim("   git push");
  let stderr = match gitio::push(repo, None) {
    PushOutcome::Pushed => return Ok(()),
    PushOutcome::Failed(stderr) => bail!("git push failed: {}", stderr.trim()),
    PushOutcome::NoUpstream(stderr) => stderr,
  };
  tracing::debug!(stderr = %stderr.trim(), "push has no upstream");

  let Some(branch) = gitio::current_branch(repo) else {
    bail!("The current branch has no upstream branch. Set it with: git push --set-upstream origin <branch-name>");
  };

  if confirm {
    ui::warn(&format!("The current branch '{}' has no upstream branch.", branch));
    let question = format!("Do you want to push and set upstream to {}/{}?", UPSTREAM_REMOTE, branch);
    if !prompter.confirm(&question, false)? {
      return Err(Cancelled("Push cancelled.").into());
    }
  }

  ui::dim(&format!("   git push --set-upstream {} {}", UPSTREAM_REMOTE, branch));
  gitio::push_set_upstream(repo, UPSTREAM_REMOTE, &branch)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ai::ApiError;
  use crate::ui::ScriptedPrompter;
  use chrono::TimeZone;
  use std::cell::RefCell;
  use test_support::{attach_bare_remote, git_output, init_fixture_repo};

  struct CannedGenerator {
    reply: Option<String>,
    prompts: RefCell<Vec<String>>,
  }

  impl CannedGenerator {
    fn ok(text: &str) -> Self {
      Self { reply: Some(text.to_string()), prompts: RefCell::default() }
    }

    fn failing() -> Self {
      Self { reply: None, prompts: RefCell::default() }
    }
  }

  impl TextGenerator for CannedGenerator {
    fn generate(&self, prompt: &str) -> Result<String, ApiError> {
      self.prompts.borrow_mut().push(prompt.to_string());
      self.reply.clone().ok_or(ApiError::EmptyContent)
    }
  }

  fn opts(confirm: bool, save: bool) -> CommitOptions {
    CommitOptions { confirm, detailed: false, language: "spanish".into(), save }
  }

  fn now() -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 8, 15, 12, 0, 5).single().unwrap()
  }

  #[test]
  fn commits_and_pushes_with_automatic_upstream() {
    let fixture = init_fixture_repo();
    let remote = attach_bare_remote(fixture.path(), "origin");
    let path = fixture.path().to_str().unwrap();
    std::fs::write(fixture.path().join("README.md"), "# shop\n").unwrap();

    let generator = CannedGenerator::ok("docs: add readme");
    let mut p = ScriptedPrompter::new(&[]);
    execute(path, &opts(false, true), &generator, &mut p, now()).unwrap();

    assert_eq!(git_output(fixture.path(), &["log", "-1", "--format=%s"]), "docs: add readme");
    assert_eq!(git_output(remote.path(), &["log", "-1", "--format=%s", "main"]), "docs: add readme");
    assert!(generator.prompts.borrow()[0].contains("spanish"));

    let saved = std::fs::read_to_string(fixture.path().join("commit-message-20250815-120005.md")).unwrap();
    assert_eq!(saved, "docs: add readme");
  }

  #[test]
  fn clean_tree_skips_generation_and_pushes() {
    let fixture = init_fixture_repo();
    let remote = attach_bare_remote(fixture.path(), "origin");
    let generator = CannedGenerator::failing();
    let mut p = ScriptedPrompter::new(&[]);

    execute(fixture.path().to_str().unwrap(), &opts(false, false), &generator, &mut p, now()).unwrap();

    assert!(generator.prompts.borrow().is_empty());
    assert_eq!(git_output(remote.path(), &["log", "-1", "--format=%s", "main"]), "feat: add user model");
  }

  #[test]
  fn declining_confirmation_leaves_changes_uncommitted() {
    let fixture = init_fixture_repo();
    let path = fixture.path().to_str().unwrap();
    std::fs::write(fixture.path().join("README.md"), "# shop\n").unwrap();

    let generator = CannedGenerator::ok("docs: add readme");
    let mut p = ScriptedPrompter::new(&["n"]);
    execute(path, &opts(true, false), &generator, &mut p, now()).unwrap();

    assert_eq!(git_output(fixture.path(), &["log", "-1", "--format=%s"]), "feat: add user model");
    assert!(!gitio::working_tree_diff(path).trim().is_empty());
  }

  #[test]
  fn confirm_mode_asks_before_setting_upstream() {
    let fixture = init_fixture_repo();
    let remote = attach_bare_remote(fixture.path(), "origin");
    std::fs::write(fixture.path().join("README.md"), "# shop\n").unwrap();

    let generator = CannedGenerator::ok("docs: add readme");
    let mut p = ScriptedPrompter::new(&["y", "n"]);
    let err = execute(fixture.path().to_str().unwrap(), &opts(true, false), &generator, &mut p, now()).unwrap_err();
    assert!(err.downcast_ref::<Cancelled>().is_some());

    assert_eq!(git_output(fixture.path(), &["log", "-1", "--format=%s"]), "docs: add readme");
    let remote_heads = git_output(remote.path(), &["for-each-ref", "--format=%(refname)", "refs/heads/main"]);
    assert!(remote_heads.is_empty());
  }

  #[test]
  fn generation_failure_is_fatal_and_commits_nothing() {
    let fixture = init_fixture_repo();
    std::fs::write(fixture.path().join("README.md"), "# shop\n").unwrap();
    let generator = CannedGenerator::failing();
    let mut p = ScriptedPrompter::new(&[]);

    let err = execute(fixture.path().to_str().unwrap(), &opts(false, false), &generator, &mut p, now()).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to generate commit message"));
    assert_eq!(git_output(fixture.path(), &["log", "-1", "--format=%s"]), "feat: add user model");
  }

  #[test]
  fn push_without_remote_fails() {
    let fixture = init_fixture_repo();
    let generator = CannedGenerator::failing();
    let mut p = ScriptedPrompter::new(&[]);
    assert!(execute(fixture.path().to_str().unwrap(), &opts(false, false), &generator, &mut p, now()).is_err());
  }
}
