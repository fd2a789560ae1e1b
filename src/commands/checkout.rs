// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: `checkout`: fetch, pick any other local or remote branch from a menu, switch to it and pull
// role: commands/checkout
// inputs: Repo path, Prompter
// outputs: Working tree on the chosen branch
// side_effects: git fetch/checkout/pull
// invariants:
// - The current branch is never offered
// - A remote branch is checked out as a tracking branch, or as the existing local branch of the same name
// - Fetch and pull failures are warnings only
// errors: Not a git repo, checkout failure
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{bail, Result};

use crate::commands::branch_menu_lines;
use crate::gitio;
use crate::model::{Branch, BranchKind};
use crate::ui::{self, Prompter};

pub fn run(repo: &str, prompter: &mut dyn Prompter) -> Result<()> {
  if !gitio::is_git_repository(repo) {
    bail!("Not a git repository. Please run this command from within a git repository.");
  }

  ui::heading("🔀 Interactive Branch Checkout");

  ui::info("🔄 Fetching remote branches...");
  if !gitio::fetch_all(repo) {
    ui::warn("Could not fetch remote branches. Continuing with known branches...");
  }

  let mut branches = gitio::list_branches(repo);
  if let Some(current) = gitio::current_branch(repo) {
    branches.retain(|b| b.name != current);
    ui::info(&format!("Current branch: {}", current));
  }

  if branches.is_empty() {
    ui::warn("No other branches found.");
    return Ok(());
  }

  let lines = branch_menu_lines(&branches);
  let Some(idx) = prompter.select("📋 Select branch to checkout:", &lines, true)? else {
    return Ok(());
  };

  let switched_to = switch(repo, &branches[idx])?;
  ui::success(&format!("Switched to branch '{}'", switched_to));

  ui::info("🔄 Pulling latest changes...");
  if !gitio::pull(repo) {
    ui::warn("Could not pull latest changes.");
  }
  Ok(())
}

/// Check out `branch`, returning the name HEAD now points at.
fn switch(repo: &str, branch: &Branch) -> Result<String> {
  if branch.kind == BranchKind::Local {
    ui::info(&format!("⚙️  Checking out {}...", branch.name));
    gitio::checkout(repo, &branch.name)?;
    return Ok(branch.name.clone());
  }

  let local = branch.local_name();
  ui::info(&format!("⚙️  Checking out remote branch {} as {}...", branch.name, local));
  match gitio::checkout_tracking(repo, &branch.name) {
    Ok(()) => Ok(local.to_string()),
    Err(err) => {
      tracing::debug!(error = %err, "tracking checkout failed");
      ui::warn("Tracking branch may already exist. Trying local checkout...");
      match gitio::checkout(repo, local) {
        Ok(()) => Ok(local.to_string()),
        Err(_) => bail!("Failed to checkout branch '{}'.", branch.name),
      }
    }
  }
}
