// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: `pr`: pick source and target branches, then generate a pull request description from their diff
// role: commands/pr
// inputs: EffectiveConfig, PrOptions, TextGenerator, Prompter, current time
// outputs: PR description shown in a panel, copied to the clipboard, optionally saved
// side_effects: git branch/diff; clipboard; optional pr-description-*.md in the repo dir
// invariants:
// - The target menu never offers the chosen source branch
// - Back from the target menu returns to the source menu; back from the source menu ends the command
// - An empty diff between the branches is a warning, not a failure
// errors: Not a git repo, missing API key, fewer than two branches, generation failure
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};

use crate::ai::{prompts, TextGenerator};
use crate::cli::{EffectiveConfig, PrOptions};
use crate::clipboard;
use crate::commands::{branch_menu_lines, build_generator};
use crate::gitio;
use crate::model::Branch;
use crate::ui::{self, Prompter};
use crate::util::{pr_description_file_name, write_markdown};

pub fn run(cfg: &EffectiveConfig, opts: &PrOptions, prompter: &mut dyn Prompter) -> Result<()> {
  if !gitio::is_git_repository(&cfg.repo) {
    bail!("Not a git repository. Please run this command from within a git repository.");
  }
  let generator = build_generator(&cfg.api)?;
  execute(&cfg.repo, opts, &generator, prompter, Local::now())
}

/// Source then target branch; `None` when the user backs out of the source menu.
fn choose_branches(branches: &[Branch], prompter: &mut dyn Prompter) -> Result<Option<(String, String)>> {
  let lines = branch_menu_lines(branches);

  loop {
    let Some(from_idx) = prompter.select("📋 Select source branch (branch with changes):", &lines, true)? else {
      return Ok(None);
    };
    let from = branches[from_idx].name.clone();
    ui::success(&format!("Source branch: {}", from));

    let targets: Vec<usize> = (0..branches.len()).filter(|&i| branches[i].name != from).collect();
    let target_lines: Vec<String> = targets.iter().map(|&i| lines[i].clone()).collect();

    let Some(to_pick) = prompter.select("📋 Select target branch (branch to merge into):", &target_lines, true)? else {
      continue;
    };
    let to = branches[targets[to_pick]].name.clone();
    ui::success(&format!("Target branch: {}", to));

    return Ok(Some((from, to)));
  }
}

pub fn execute(
  repo: &str,
  opts: &PrOptions,
  generator: &dyn TextGenerator,
  prompter: &mut dyn Prompter,
  now: DateTime<Local>,
) -> Result<()> {
  ui::heading("📋 PR Description Generator");

  ui::info("🔍 Fetching branches...");
  let branches = gitio::list_branches(repo);
  if branches.len() < 2 {
    bail!("Need at least 2 branches to compare.");
  }

  let Some((from, to)) = choose_branches(&branches, prompter)? else {
    return Ok(());
  };

  ui::info(&format!("📊 Analyzing differences between {} and {}...", from, to));
  let diff = gitio::branch_diff(repo, &from, &to);
  if diff.trim().is_empty() {
    ui::warn("No differences found between the selected branches.");
    return Ok(());
  }
  ui::dim(&format!("Found differences ({} characters)", diff.chars().count()));

  let mode = if opts.detailed { " (detailed mode)" } else { "" };
  ui::info(&format!("🤖 Generating PR description...{}", mode));
  let description = generator
    .generate(&prompts::pr_prompt(&diff, opts.detailed, &opts.language))
    .context("Failed to generate PR description")?;

  ui::panel("PR Description", &description);
  if clipboard::copy(&description) {
    ui::success("Copied to clipboard");
  } else {
    ui::warn("Could not copy to clipboard");
  }

  if opts.save {
    let path = write_markdown(Path::new(repo), &pr_description_file_name(&from, &to, now), &description)?;
    ui::success(&format!("PR description saved to: {}", path.display()));
  }

  Ok(())
}
