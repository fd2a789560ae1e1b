// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Azure DevOps preflight (az installed, extension, login) and organization/project selection
// role: azure/setup
// inputs: AzCli, Prompter
// outputs: AzureTarget (organization, org URL, project) or None when the user backs out
// side_effects: May install the azure-devops extension and run interactive az login
// invariants:
// - Organizations and projects are offered sorted case-insensitively
// - Back from the project menu returns to the organization menu; back from organizations cancels
// - Org discovery failures fall back to manual entry, never to an error
// errors: Missing az, failed extension install, failed login, empty project list
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{bail, Result};
use serde_json::Value;

use crate::azure::az::{capture_with_relogin, AzCli, DEVOPS_RESOURCE};
use crate::ext::serde_json::{parse_listing, parse_object, JsonFetch};
use crate::ui::{self, Cancelled, Prompter};

const PROFILE_URL: &str = "https://app.vssps.visualstudio.com/_apis/profile/profiles/me?api-version=7.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureTarget {
  pub organization: String,
  pub org_url: String,
  pub project: String,
}

impl AzureTarget {
  /// `organization` may be a bare name or a full `https://dev.azure.com/<org>` URL.
  pub fn new(organization: &str, project: &str) -> Self {
    let organization = organization.trim().trim_end_matches('/');
    let (name, url) = if organization.starts_with("http://") || organization.starts_with("https://") {
      let name = organization.rsplit('/').next().unwrap_or(organization);
      (name.to_string(), organization.to_string())
    } else {
      (organization.to_string(), format!("https://dev.azure.com/{}", organization))
    };

    Self { organization: name, org_url: url, project: project.to_string() }
  }
}

pub fn ensure_cli(az: &dyn AzCli) -> Result<()> {
  if az.capture(&["--version"]).is_err() {
    bail!("Azure CLI (az) is not installed. Install it from: https://docs.microsoft.com/en-us/cli/azure/install-azure-cli");
  }
  Ok(())
}

pub fn ensure_extension(az: &dyn AzCli) -> Result<()> {
  ui::info("🔍 Checking Azure DevOps extension...");
  if az.capture(&["extension", "show", "--name", "azure-devops", "--output", "json"]).is_err() {
    ui::info("📦 Installing Azure DevOps extension...");
    if !az.interactive(&["extension", "add", "--name", "azure-devops"]) {
      bail!("Failed to install Azure DevOps extension.");
    }
  }
  ui::success("Azure DevOps extension available.");
  Ok(())
}

pub fn ensure_login(az: &dyn AzCli) -> Result<()> {
  match az.capture(&["account", "show", "--output", "json"]) {
    Ok(text) => match parse_object(&text) {
      Some(account) => ui::success(&format!("Logged into Azure as: {}", account_user(&account))),
      None => ui::success("Already logged into Azure."),
    },
    Err(_) => {
      ui::info("🔐 Not logged into Azure. Starting interactive login...");
      if !az.interactive(&["login"]) {
        bail!("Azure login failed.");
      }
      ui::success("Successfully logged into Azure.");
    }
  }
  Ok(())
}

fn account_user(account: &Value) -> String {
  account.fetch("user.name").text_or("unknown")
}

/// az installed, extension present, logged in.
pub fn preflight(az: &dyn AzCli) -> Result<()> {
  ensure_cli(az)?;
  ensure_extension(az)?;
  ensure_login(az)
}

pub fn parse_profile_id(text: &str) -> Option<String> {
  parse_object(text)?.fetch("id").to::<String>().filter(|s| !s.is_empty())
}

/// `accountName` of every entry in an accounts listing.
pub fn parse_account_names(text: &str) -> Vec<String> {
  parse_listing(text).iter().filter_map(|a| a.fetch("accountName").to::<String>()).collect()
}

/// `name` of every entry in a listing (projects, repositories).
pub fn parse_names(text: &str) -> Vec<String> {
  parse_listing(text).iter().filter_map(|p| p.fetch("name").to::<String>()).collect()
}

pub fn sort_names(names: &mut [String]) {
  names.sort_by_key(|n| n.to_lowercase());
}

/// Organizations of the signed-in user via the profile and accounts REST endpoints.
pub fn fetch_organizations(az: &dyn AzCli, prompter: &mut dyn Prompter) -> Result<Vec<String>> {
  ui::info("📋 Fetching organizations...");

  let profile = capture_with_relogin(
    az,
    prompter,
    &["rest", "--method", "get", "--resource", DEVOPS_RESOURCE, "--url", PROFILE_URL],
  )?;

  let member_id = match profile {
    Ok(text) => parse_profile_id(&text),
    Err(stderr) => {
      ui::error(&format!("Failed to fetch Azure DevOps profile: {}", stderr.trim()));
      None
    }
  };

  let Some(member_id) = member_id else {
    return Ok(Vec::new());
  };

  let accounts_url = format!("https://app.vssps.visualstudio.com/_apis/accounts?memberId={}&api-version=7.0", member_id);
  let accounts = capture_with_relogin(
    az,
    prompter,
    &["rest", "--method", "get", "--resource", DEVOPS_RESOURCE, "--url", &accounts_url],
  )?;

  match accounts {
    Ok(text) => Ok(parse_account_names(&text)),
    Err(stderr) => {
      ui::error(&format!("Failed to fetch organizations: {}", stderr.trim()));
      Ok(Vec::new())
    }
  }
}

pub fn fetch_projects(az: &dyn AzCli, prompter: &mut dyn Prompter, org_url: &str) -> Result<Vec<String>> {
  ui::info("📋 Fetching projects...");
  let out = capture_with_relogin(az, prompter, &["devops", "project", "list", "--organization", org_url, "--output", "json"])?;
  Ok(out.map(|text| parse_names(&text)).unwrap_or_default())
}

/// Manual entry when discovery found nothing. `None` on cancel or blank input.
fn manual_organization(prompter: &mut dyn Prompter) -> Result<Option<String>> {
  ui::warn("Could not automatically detect Azure DevOps organizations.");
  ui::dim("This can happen if your Azure account is not linked to Azure DevOps via the API.");

  let options = vec!["Enter organization name manually".to_string(), "Cancel".to_string()];
  if prompter.select("How would you like to specify the organization?", &options, false)? != Some(0) {
    return Ok(None);
  }

  let name = prompter.text("Organization name (from https://dev.azure.com/<organization>)", Some(""))?;
  let name = name.trim();
  Ok(if name.is_empty() { None } else { Some(name.to_string()) })
}

/// [`select_target`] for commands that cannot continue without one.
pub fn require_target(az: &dyn AzCli, prompter: &mut dyn Prompter) -> Result<AzureTarget> {
  select_target(az, prompter)?.ok_or_else(|| Cancelled("Cancelled.").into())
}

/// Preflight, then pick organization and project. `None` when the user backs out.
pub fn select_target(az: &dyn AzCli, prompter: &mut dyn Prompter) -> Result<Option<AzureTarget>> {
  preflight(az)?;

  let mut organizations = fetch_organizations(az, prompter)?;
  if organizations.is_empty() {
    match manual_organization(prompter)? {
      Some(name) => organizations.push(name),
      None => return Ok(None),
    }
  }
  sort_names(&mut organizations);

  loop {
    let Some(org_idx) = prompter.select("📋 Select organization:", &organizations, true)? else {
      return Ok(None);
    };
    let organization = &organizations[org_idx];
    let org_url = format!("https://dev.azure.com/{}", organization);
    ui::success(&format!("Organization: {}", organization));

    let mut projects = fetch_projects(az, prompter, &org_url)?;
    if projects.is_empty() {
      bail!("No projects found in organization '{}'.", organization);
    }
    sort_names(&mut projects);

    let Some(project_idx) = prompter.select("📋 Select project:", &projects, true)? else {
      continue;
    };
    ui::success(&format!("Project: {}", projects[project_idx]));

    return Ok(Some(AzureTarget::new(organization, &projects[project_idx])));
  }
}
