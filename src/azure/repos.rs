// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Azure DevOps repositories: create-or-reuse plus remote wiring, and clone from a picked repository
// role: azure/repos
// inputs: Working directory, AzCli, Prompter, AzureTarget from setup
// outputs: Configured git remote or a fresh clone
// side_effects: az repos show/create/list; git remote add/remove, optional push, git clone
// invariants:
// - An existing repository is reused only after explicit confirmation
// - Replacing origin removes it before the new remote is added
// - Back from the remote-name menu returns to the repository-name prompt
// errors: Not a git repo (new), create failure, missing remote URL, remote add failure, clone failure
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::azure::az::{capture_with_relogin, AzCli};
use crate::azure::setup::{self, AzureTarget};
use crate::ext::serde_json::{parse_listing, parse_object, JsonFetch};
use crate::gitio;
use crate::model::AzureRepo;
use crate::ui::{self, Cancelled, Prompter};

const DEFAULT_REMOTE: &str = "origin";

fn repo_from_json(v: &serde_json::Value) -> Option<AzureRepo> {
  let name = v.fetch("name").to::<String>()?;
  let remote_url = v.fetch("remoteUrl").to::<String>()?;
  Some(AzureRepo {
    name,
    remote_url,
    id: v.fetch("id").to::<String>(),
    project_id: v.fetch("project.id").to::<String>(),
  })
}

/// A single repository object from `az repos show|create`.
pub fn parse_repo(text: &str) -> Option<AzureRepo> {
  parse_object(text).as_ref().and_then(repo_from_json)
}

/// Repositories with both a name and a remote URL, sorted by name ignoring case.
pub fn parse_repo_listing(text: &str) -> Vec<AzureRepo> {
  let mut repos: Vec<AzureRepo> = parse_listing(text).iter().filter_map(repo_from_json).collect();
  repos.sort_by_key(|r| r.name.to_lowercase());
  repos
}

pub fn show_repo(az: &dyn AzCli, target: &AzureTarget, name: &str) -> Option<AzureRepo> {
  let out = az.capture(&[
    "repos",
    "show",
    "--repository",
    name,
    "--organization",
    &target.org_url,
    "--project",
    &target.project,
    "--output",
    "json",
  ]);
  out.ok().and_then(|text| parse_repo(&text))
}

pub fn create_repo(az: &dyn AzCli, target: &AzureTarget, name: &str) -> Result<AzureRepo> {
  let out = az.capture(&[
    "repos",
    "create",
    "--name",
    name,
    "--organization",
    &target.org_url,
    "--project",
    &target.project,
    "--output",
    "json",
  ]);

  match out {
    Ok(text) => parse_repo(&text).context("Repository created but could not get remote URL."),
    Err(stderr) => bail!("Failed to create repository: {}", stderr.trim()),
  }
}

pub fn list_repos(az: &dyn AzCli, prompter: &mut dyn Prompter, target: &AzureTarget) -> Result<Vec<AzureRepo>> {
  ui::info("📋 Fetching repositories...");
  let out = capture_with_relogin(
    az,
    prompter,
    &["repos", "list", "--organization", &target.org_url, "--project", &target.project, "--output", "json"],
  )?;
  Ok(out.map(|text| parse_repo_listing(&text)).unwrap_or_default())
}

fn dir_name(dir: &str) -> String {
  Path::new(dir)
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .filter(|n| !n.is_empty())
    .unwrap_or_else(|| "repository".to_string())
}

/// Pick the remote name for the Azure repository. `None` means back.
fn choose_remote_name(repo: &str, prompter: &mut dyn Prompter) -> Result<Option<String>> {
  let Some(existing) = gitio::remote_url(repo, DEFAULT_REMOTE) else {
    return Ok(Some(DEFAULT_REMOTE.to_string()));
  };

  ui::warn(&format!("Remote 'origin' already exists: {}", existing));
  let options = vec!["azure".to_string(), "origin (replace)".to_string(), "custom".to_string()];

  match prompter.select("Select remote name for Azure DevOps:", &options, true)? {
    None => Ok(None),
    Some(0) => Ok(Some("azure".to_string())),
    Some(1) => {
      gitio::remote_remove(repo, DEFAULT_REMOTE)?;
      Ok(Some(DEFAULT_REMOTE.to_string()))
    }
    Some(_) => Ok(Some(prompter.text("Enter remote name", Some("azure"))?)),
  }
}

fn offer_push(repo: &str, remote: &str, prompter: &mut dyn Prompter) -> Result<()> {
  let (Some(branch), Some(_)) = (gitio::current_branch(repo), gitio::head_sha(repo)) else {
    return Ok(());
  };

  if !prompter.confirm(&format!("Push '{}' to '{}' now?", branch, remote), false)? {
    return Ok(());
  }

  match gitio::push_set_upstream(repo, remote, &branch) {
    Ok(()) => ui::success(&format!("Pushed '{}' to '{}'.", branch, remote)),
    Err(err) => ui::warn(&format!("Push failed: {:#}", err)),
  }
  Ok(())
}

/// `azure-devops repo new`
pub fn create(repo: &str, az: &dyn AzCli, prompter: &mut dyn Prompter) -> Result<()> {
  ui::heading("☁️  Azure DevOps - Create New Repository");

  if !gitio::is_git_repository(repo) {
    bail!("Not a git repository. Run this command from the repository you want to publish.");
  }

  let target = setup::require_target(az, prompter)?;

  let default_name = dir_name(repo);

  loop {
    let name = prompter.text("📝 Repository name", Some(&default_name))?;

    ui::info(&format!("🔍 Checking if repository '{}' already exists...", name));
    let azure_repo = match show_repo(az, &target, &name) {
      Some(existing) => {
        ui::warn(&format!("Repository '{}' already exists: {}", name, existing.remote_url));
        let options = vec!["Use existing repository".to_string(), "Cancel".to_string()];
        if prompter.select("What do you want to do?", &options, false)? != Some(0) {
          return Err(Cancelled("Cancelled.").into());
        }
        ui::success(&format!("Using existing repository: {}", existing.remote_url));
        existing
      }
      None => {
        ui::info(&format!("🔨 Creating repository '{}'...", name));
        let created = create_repo(az, &target, &name)?;
        ui::success(&format!("Repository created: {}", created.remote_url));
        created
      }
    };

    let Some(remote) = choose_remote_name(repo, prompter)? else {
      continue;
    };

    gitio::remote_add(repo, &remote, &azure_repo.remote_url)
      .with_context(|| format!("Failed to add remote '{}'", remote))?;
    ui::success(&format!("Remote '{}' configured: {}", remote, azure_repo.remote_url));

    return offer_push(repo, &remote, prompter);
  }
}

/// `azure-devops repo checkout`
pub fn clone(cwd: &str, az: &dyn AzCli, prompter: &mut dyn Prompter) -> Result<()> {
  ui::heading("☁️  Azure DevOps - Clone Repository");

  let target = setup::require_target(az, prompter)?;

  let repos = list_repos(az, prompter, &target)?;
  if repos.is_empty() {
    bail!("No repositories found in project '{}'.", target.project);
  }

  let names: Vec<String> = repos.iter().map(|r| r.name.clone()).collect();
  let Some(idx) = prompter.select("📋 Select repository to clone:", &names, true)? else {
    return Ok(());
  };
  let chosen = &repos[idx];
  ui::success(&format!("Repository: {}", chosen.name));

  let default_dir = Path::new(cwd).join(&chosen.name).to_string_lossy().to_string();
  let target_dir = prompter.text("📁 Clone into directory", Some(&default_dir))?;

  ui::info(&format!("🔄 Cloning {}...", chosen.name));
  if !gitio::clone_interactive(&chosen.remote_url, &target_dir) {
    bail!("Failed to clone repository.");
  }

  ui::success(&format!("Repository cloned successfully into: {}", target_dir));
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::azure::az::FakeAz;
  use crate::ui::{ScriptedPrompter, BACK_LABEL};
  use test_support::{git_output, init_fixture_repo};

  const SHOP_JSON: &str =
    r#"{"id":"r-1","name":"shop","remoteUrl":"https://acme@dev.azure.com/acme/Web/_git/shop","project":{"id":"p-1","name":"Web"}}"#;

  fn ready_az() -> FakeAz {
    FakeAz::new()
      .ok("--version", "azure-cli")
      .ok("extension show", "{}")
      .ok("account show", r#"{"user":{"name":"ada@example.com"}}"#)
      .ok("rest", r#"{"id":"m-1"}"#)
      .ok("rest", r#"[{"accountName":"acme"}]"#)
      .ok("devops project list", r#"[{"name":"Web"}]"#)
  }

  #[test]
  fn parses_repo_objects_and_listings() {
    let repo = parse_repo(SHOP_JSON).unwrap();
    assert_eq!(repo.name, "shop");
    assert_eq!(repo.id.as_deref(), Some("r-1"));
    assert_eq!(repo.project_id.as_deref(), Some("p-1"));

    let listing = parse_repo_listing(
      r#"[{"name":"zeta","remoteUrl":"u1"},{"name":"Alpha","remoteUrl":"u2"},{"name":"no-url"}]"#,
    );
    let names: Vec<&str> = listing.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "zeta"]);
  }

  #[test]
  fn creates_repo_and_adds_origin() {
    let fixture = init_fixture_repo();
    let path = fixture.path().to_str().unwrap();
    let az = ready_az().fail("repos show", "TF401019: does not exist").ok("repos create --name shop", SHOP_JSON);

    let mut p = ScriptedPrompter::new(&["acme", "Web", "shop", "n"]);
    create(path, &az, &mut p).unwrap();

    assert_eq!(
      git_output(fixture.path(), &["remote", "get-url", "origin"]),
      "https://acme@dev.azure.com/acme/Web/_git/shop"
    );
    assert!(az.called("repos create --name shop --organization https://dev.azure.com/acme --project Web"));
  }

  #[test]
  fn existing_origin_can_be_kept_under_azure_name() {
    let fixture = init_fixture_repo();
    let path = fixture.path().to_str().unwrap();
    gitio::remote_add(path, "origin", "git@github.com:acme/shop.git").unwrap();
    let az = ready_az().ok("repos show", SHOP_JSON).ok("repos show", SHOP_JSON);

    let mut p = ScriptedPrompter::new(&[
      "acme",
      "Web",
      "shop",
      "Use existing repository",
      BACK_LABEL,
      "shop",
      "Use existing repository",
      "azure",
      "n",
    ]);
    create(path, &az, &mut p).unwrap();

    assert_eq!(git_output(fixture.path(), &["remote", "get-url", "origin"]), "git@github.com:acme/shop.git");
    assert_eq!(
      git_output(fixture.path(), &["remote", "get-url", "azure"]),
      "https://acme@dev.azure.com/acme/Web/_git/shop"
    );
  }

  #[test]
  fn cancelling_existing_repo_changes_nothing() {
    let fixture = init_fixture_repo();
    let path = fixture.path().to_str().unwrap();
    let az = ready_az().ok("repos show", SHOP_JSON);

    let mut p = ScriptedPrompter::new(&["acme", "Web", "shop", "Cancel"]);
    let err = create(path, &az, &mut p).unwrap_err();
    assert!(err.downcast_ref::<Cancelled>().is_some());
    assert_eq!(gitio::remote_url(path, "origin"), None);
  }

  #[test]
  fn backing_out_of_organizations_cancels_new() {
    let fixture = init_fixture_repo();
    let az = ready_az();
    let mut p = ScriptedPrompter::new(&[BACK_LABEL]);
    let err = create(fixture.path().to_str().unwrap(), &az, &mut p).unwrap_err();
    assert_eq!(err.to_string(), "Cancelled.");
    assert!(!az.called("repos"));
  }

  #[test]
  fn new_outside_git_repo_fails_before_touching_azure() {
    let dir = tempfile::TempDir::new().unwrap();
    let az = FakeAz::new();
    let mut p = ScriptedPrompter::new(&[]);
    assert!(create(dir.path().to_str().unwrap(), &az, &mut p).is_err());
    assert!(az.calls.borrow().is_empty());
  }

  #[test]
  fn clone_with_no_repositories_fails() {
    let az = ready_az().ok("repos list", "[]");
    let mut p = ScriptedPrompter::new(&["acme", "Web"]);
    let err = clone("/tmp", &az, &mut p).unwrap_err();
    assert!(err.to_string().contains("No repositories found"));
  }

  #[test]
  fn clone_back_is_a_clean_exit() {
    let az = ready_az().ok("repos list", r#"{"value":[{"name":"shop","remoteUrl":"u"}]}"#);
    let mut p = ScriptedPrompter::new(&["acme", "Web", BACK_LABEL]);
    clone("/tmp", &az, &mut p).unwrap();
  }

  #[test]
  fn clones_chosen_repository_into_default_dir() {
    let source = init_fixture_repo();
    let dest = tempfile::TempDir::new().unwrap();
    let listing = format!(r#"[{{"name":"shop","remoteUrl":"{}"}}]"#, source.path().display());
    let az = ready_az().ok("repos list", &listing);

    let mut p = ScriptedPrompter::new(&["acme", "Web", "shop", ""]);
    clone(dest.path().to_str().unwrap(), &az, &mut p).unwrap();

    assert!(dest.path().join("shop/app/models/user.rb").exists());
  }
}
