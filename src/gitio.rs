// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Typed git operations used by commit, pr, checkout and Azure repo flows
// role: git/io
// inputs: Repo path (working dir for git), branch/remote names, commit messages
// outputs: Diff text, branch listings, push outcomes, Result<()> for mutating steps
// side_effects: Spawns git; mutating helpers change the index, refs and remotes
// invariants:
// - Arguments are passed as separate argv entries (no shell quoting)
// - Symbolic HEAD refs (origin/HEAD) never appear in branch listings
// - working_tree_diff is empty iff there are no staged, unstaged or untracked changes
// errors: Mutating helpers surface git stderr; read helpers degrade to empty/None
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::Result;

use crate::model::{Branch, BranchKind};
use crate::process::{self, Invocation};
use crate::util::run_git;

const BRANCH_FORMAT: &str = "--format=%(refname:short)|%(committerdate:format:%Y-%m-%d %H:%M)|%(refname)";

pub fn is_git_repository(repo: &str) -> bool {
  Invocation::new("git", &["rev-parse", "--git-dir"]).current_dir(repo).run().success()
}

/// Staged, unstaged and untracked changes as one labelled text blob.
pub fn working_tree_diff(repo: &str) -> String {
  let staged = run_git(repo, &["diff", "--cached"]).unwrap_or_default();
  let unstaged = run_git(repo, &["diff"]).unwrap_or_default();
  let untracked = run_git(repo, &["ls-files", "--others", "--exclude-standard"]).unwrap_or_default();

  assemble_diff(&staged, &unstaged, &untracked)
}

fn assemble_diff(staged: &str, unstaged: &str, untracked: &str) -> String {
  let mut out = String::new();

  if !staged.trim().is_empty() {
    out.push_str("=== Staged Changes ===\n");
    out.push_str(staged);
    out.push_str("\n\n");
  }

  if !unstaged.trim().is_empty() {
    out.push_str("=== Unstaged Changes ===\n");
    out.push_str(unstaged);
    out.push_str("\n\n");
  }

  if !untracked.trim().is_empty() {
    out.push_str("=== New Files (Untracked) ===\n");
    out.push_str(untracked);
    out.push('\n');
  }

  out
}

/// `None` when detached or when git fails.
pub fn current_branch(repo: &str) -> Option<String> {
  let out = run_git(repo, &["branch", "--show-current"]).ok()?;
  let name = out.trim();
  if name.is_empty() {
    None
  } else {
    Some(name.to_string())
  }
}

/// Local and remote branches, most recently committed first.
pub fn list_branches(repo: &str) -> Vec<Branch> {
  match run_git(repo, &["branch", "-a", "--sort=-committerdate", BRANCH_FORMAT]) {
    Ok(out) => parse_branch_listing(&out),
    Err(err) => {
      tracing::debug!(error = %err, "branch listing failed");
      Vec::new()
    }
  }
}

/// Parse `name|date|refname` lines produced by [`BRANCH_FORMAT`].
pub fn parse_branch_listing(out: &str) -> Vec<Branch> {
  out
    .lines()
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .filter_map(|line| {
      let mut parts = line.splitn(3, '|');
      let name = parts.next()?.trim();
      let date = parts.next()?.trim();
      let refname = parts.next()?.trim();

      if refname.ends_with("/HEAD") {
        return None;
      }

      let kind = if refname.starts_with("refs/remotes/") { BranchKind::Remote } else { BranchKind::Local };

      Some(Branch { name: name.to_string(), kind, date: date.to_string() })
    })
    .collect()
}

/// Changes on `from` since it diverged from `to` (`git diff to...from`).
pub fn branch_diff(repo: &str, from: &str, to: &str) -> String {
  run_git(repo, &["diff", &format!("{}...{}", to, from)]).unwrap_or_default()
}

pub fn add_all(repo: &str) -> Result<()> {
  run_git(repo, &["add", "."]).map(|_| ())
}

pub fn commit(repo: &str, message: &str) -> Result<()> {
  run_git(repo, &["commit", "-m", message]).map(|_| ())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
  Pushed,
  /// The branch has no upstream; carries git's stderr.
  NoUpstream(String),
  Failed(String),
}

/// `git push [remote]`, classifying the missing-upstream failure.
pub fn push(repo: &str, remote: Option<&str>) -> PushOutcome {
  let mut args = vec!["push"];
  if let Some(r) = remote {
    args.push(r);
  }

  let out = Invocation::new("git", &args).current_dir(repo).run();

  if out.success() {
    PushOutcome::Pushed
  } else if out.stderr.contains("no upstream branch") {
    PushOutcome::NoUpstream(out.stderr)
  } else {
    PushOutcome::Failed(out.stderr)
  }
}

pub fn push_set_upstream(repo: &str, remote: &str, branch: &str) -> Result<()> {
  run_git(repo, &["push", "--set-upstream", remote, branch]).map(|_| ())
}

pub fn fetch_all(repo: &str) -> bool {
  run_git(repo, &["fetch", "--all", "--prune"]).is_ok()
}

pub fn checkout(repo: &str, name: &str) -> Result<()> {
  run_git(repo, &["checkout", name]).map(|_| ())
}

/// `git checkout -t origin/x` creating a local tracking branch.
pub fn checkout_tracking(repo: &str, remote_branch: &str) -> Result<()> {
  run_git(repo, &["checkout", "-t", remote_branch]).map(|_| ())
}

pub fn pull(repo: &str) -> bool {
  run_git(repo, &["pull"]).is_ok()
}

pub fn remote_url(repo: &str, name: &str) -> Option<String> {
  run_git(repo, &["remote", "get-url", name]).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub fn remote_add(repo: &str, name: &str, url: &str) -> Result<()> {
  run_git(repo, &["remote", "add", name, url]).map(|_| ())
}

pub fn remote_remove(repo: &str, name: &str) -> Result<()> {
  run_git(repo, &["remote", "remove", name]).map(|_| ())
}

pub fn head_sha(repo: &str) -> Option<String> {
  run_git(repo, &["rev-parse", "HEAD"]).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Clone with progress on the terminal.
pub fn clone_interactive(url: &str, target_dir: &str) -> bool {
  process::run_interactive("git", &["clone", url, target_dir])
}
