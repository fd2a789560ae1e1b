// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Seam over the Azure CLI (`az`) with auth-expiry detection and one-shot re-login retry
// role: azure/cli
// inputs: az argument lists; Prompter for the re-login offer
// outputs: Captured stdout (Ok) or stderr (Err) per call; bool for interactive calls
// side_effects: Spawns az (via cmd.exe /c on Windows); interactive calls own the terminal
// invariants:
// - A failed call is retried at most once, and only after a successful re-login
// - Auth detection is substring-based on az stderr
// errors: Capture failures are values (Err(stderr)); prompt IO errors bubble as anyhow
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::process;
use crate::ui::{self, Prompter};

/// Resource id Azure AD issues Azure DevOps tokens for (`az rest --resource`).
pub const DEVOPS_RESOURCE: &str = "499b84ac-1321-427f-aa17-267ca6975798";

pub trait AzCli {
  /// stdout on exit 0, stderr otherwise.
  fn capture(&self, args: &[&str]) -> Result<String, String>;

  /// Run attached to the terminal (login, extension install).
  fn interactive(&self, args: &[&str]) -> bool;
}

pub struct SystemAz;

fn command_line(args: &[&str]) -> (&'static str, Vec<String>) {
  let mut full: Vec<String> = Vec::with_capacity(args.len() + 2);
  let program = if cfg!(windows) {
    full.push("/c".into());
    full.push("az".into());
    "cmd.exe"
  } else {
    "az"
  };
  full.extend(args.iter().map(|a| a.to_string()));
  (program, full)
}

impl AzCli for SystemAz {
  fn capture(&self, args: &[&str]) -> Result<String, String> {
    let (program, full) = command_line(args);
    process::run_capturing_with_error(program, &full)
  }

  fn interactive(&self, args: &[&str]) -> bool {
    let (program, full) = command_line(args);
    process::run_interactive(program, &full)
  }
}

static AUTH_ERROR: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"AADSTS(?:50078|700082|50076|70043|50173|700024|65001)|InvalidAuthenticationToken|Authentication failed")
    .unwrap()
});

/// Expired MFA, expired or bad tokens, missing consent.
pub fn is_auth_error(stderr: &str) -> bool {
  AUTH_ERROR.is_match(stderr)
}

/// Offer `az logout` + `az login`. `Ok(true)` when the new login succeeded.
pub fn relogin(az: &dyn AzCli, prompter: &mut dyn Prompter) -> Result<bool> {
  ui::warn("Your Azure session has expired or requires re-authentication.");
  let options = vec!["Yes, re-login".to_string(), "Cancel".to_string()];
  if prompter.select("Would you like to re-login to Azure?", &options, false)? != Some(0) {
    return Ok(false);
  }

  ui::info("🔐 Starting Azure re-authentication...");
  if !az.interactive(&["logout"]) {
    ui::dim("Note: logout returned an error (may already be logged out).");
  }

  if !az.interactive(&["login"]) {
    ui::error("Azure login failed.");
    return Ok(false);
  }

  ui::success("Successfully re-authenticated with Azure.");
  Ok(true)
}

/// [`AzCli::capture`], retried once after re-login when the failure looks like expired auth.
pub fn capture_with_relogin(az: &dyn AzCli, prompter: &mut dyn Prompter, args: &[&str]) -> Result<Result<String, String>> {
  match az.capture(args) {
    Err(stderr) if is_auth_error(&stderr) => {
      tracing::info!(args = ?args, "az call failed with an auth error");
      if !relogin(az, prompter)? {
        return Ok(Err(stderr));
      }
      Ok(az.capture(args))
    }
    other => Ok(other),
  }
}

/// Scripted `az` for tests: responses are matched by argument prefix and consumed in order.
#[cfg(test)]
pub struct FakeAz {
  responses: std::cell::RefCell<Vec<(String, Result<String, String>)>>,
  pub calls: std::cell::RefCell<Vec<String>>,
  pub interactive_ok: bool,
}

#[cfg(test)]
impl FakeAz {
  pub fn new() -> Self {
    Self { responses: Default::default(), calls: Default::default(), interactive_ok: true }
  }

  pub fn ok(self, prefix: &str, stdout: &str) -> Self {
    self.responses.borrow_mut().push((prefix.to_string(), Ok(stdout.to_string())));
    self
  }

  pub fn fail(self, prefix: &str, stderr: &str) -> Self {
    self.responses.borrow_mut().push((prefix.to_string(), Err(stderr.to_string())));
    self
  }

  pub fn called(&self, prefix: &str) -> bool {
    self.calls.borrow().iter().any(|c| c.starts_with(prefix))
  }

  pub fn call_matching(&self, prefix: &str) -> Option<String> {
    self.calls.borrow().iter().find(|c| c.starts_with(prefix)).cloned()
  }
}

#[cfg(test)]
impl AzCli for FakeAz {
  fn capture(&self, args: &[&str]) -> Result<String, String> {
    let line = args.join(" ");
    self.calls.borrow_mut().push(line.clone());
    let mut responses = self.responses.borrow_mut();
    match responses.iter().position(|(p, _)| line.starts_with(p.as_str())) {
      Some(i) => responses.remove(i).1,
      None => Err(format!("unexpected az call: {}", line)),
    }
  }

  fn interactive(&self, args: &[&str]) -> bool {
    self.calls.borrow_mut().push(args.join(" "));
    self.interactive_ok
  }
}
