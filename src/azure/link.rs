// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Link the current branch and/or HEAD commit to a work item as Azure DevOps artifact links
// role: azure/link
// inputs: Repo path with an Azure DevOps remote; optional WorkItemRef; AzCli; Prompter
// outputs: JSON-patch applied to the work item's relations
// side_effects: az repos show, az rest PATCH; writes a temporary request body file
// invariants:
// - Remote coordinates come from origin first, then a remote named azure
// - Artifact URLs use the repository and project GUIDs, never names
// - Branch names are percent-encoded inside the ref artifact URL
// errors: No Azure remote, repo lookup failure, detached HEAD with a branch link, PATCH failure
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::Write;

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::azure::az::{capture_with_relogin, AzCli, DEVOPS_RESOURCE};
use crate::azure::boards::prompt_id;
use crate::azure::repos::show_repo;
use crate::azure::setup::{self, AzureTarget};
use crate::cli::WorkItemRef;
use crate::gitio;
use crate::model::AzureRemote;
use crate::ui::{self, Prompter};

const REMOTE_NAMES: [&str; 2] = ["origin", "azure"];

static RE_HTTPS: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^https?://(?:[^@/]+@)?dev\.azure\.com/([^/]+)/([^/]+)/_git/([^/?#]+?)/?$").unwrap()
});

static RE_VISUALSTUDIO: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^https?://(?:[^@/]+@)?([^./]+)\.visualstudio\.com/(?:DefaultCollection/)?([^/]+)/_git/([^/?#]+?)/?$")
    .unwrap()
});

static RE_SSH: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^(?:ssh://)?[^@/]+@(?:ssh\.dev\.azure\.com|vs-ssh\.visualstudio\.com)[:/]v3/([^/]+)/([^/]+)/([^/]+?)/?$")
    .unwrap()
});

/// Percent-decoded text; undecodable input is kept as written.
fn percent_decode(s: &str) -> String {
  urlencoding::decode(s).map(|d| d.into_owned()).unwrap_or_else(|_| s.to_string())
}

/// Organization, project and repository from any Azure DevOps git remote URL form.
pub fn parse_azure_remote(url: &str) -> Option<AzureRemote> {
  let url = url.trim();
  let caps = RE_HTTPS
    .captures(url)
    .or_else(|| RE_VISUALSTUDIO.captures(url))
    .or_else(|| RE_SSH.captures(url))?;

  let part = |i: usize| caps.get(i).map(|m| percent_decode(m.as_str()));
  Some(AzureRemote { organization: part(1)?, project: part(2)?, repository: part(3)? })
}

pub fn branch_artifact_url(project_id: &str, repo_id: &str, branch: &str) -> String {
  format!("vstfs:///Git/Ref/{}%2F{}%2FGB{}", project_id, repo_id, urlencoding::encode(branch))
}

pub fn commit_artifact_url(project_id: &str, repo_id: &str, sha: &str) -> String {
  format!("vstfs:///Git/Commit/{}%2F{}%2F{}", project_id, repo_id, sha)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
  Branch(String),
  Commit(String),
}

impl Artifact {
  fn link_name(&self) -> &'static str {
    match self {
      Artifact::Branch(_) => "Branch",
      Artifact::Commit(_) => "Fixed in Commit",
    }
  }

  fn url(&self, project_id: &str, repo_id: &str) -> String {
    match self {
      Artifact::Branch(name) => branch_artifact_url(project_id, repo_id, name),
      Artifact::Commit(sha) => commit_artifact_url(project_id, repo_id, sha),
    }
  }
}

/// JSON-patch document appending one ArtifactLink relation per artifact.
pub fn patch_body(project_id: &str, repo_id: &str, artifacts: &[Artifact]) -> Value {
  Value::Array(
    artifacts
      .iter()
      .map(|a| {
        json!({
          "op": "add",
          "path": "/relations/-",
          "value": {
            "rel": "ArtifactLink",
            "url": a.url(project_id, repo_id),
            "attributes": { "name": a.link_name() }
          }
        })
      })
      .collect(),
  )
}

fn find_azure_remote(repo: &str) -> Option<AzureRemote> {
  REMOTE_NAMES.iter().filter_map(|name| gitio::remote_url(repo, name)).find_map(|url| parse_azure_remote(&url))
}

fn choose_artifacts(repo: &str, prompter: &mut dyn Prompter) -> Result<Option<Vec<Artifact>>> {
  let branch = gitio::current_branch(repo);
  let sha = gitio::head_sha(repo);

  let short = sha.as_deref().map(|s| s.chars().take(8).collect::<String>()).unwrap_or_else(|| "-".to_string());
  let options = vec![
    format!("Current branch ({})", branch.as_deref().unwrap_or("detached")),
    format!("Latest commit ({})", short),
    "Both".to_string(),
  ];

  let Some(choice) = prompter.select("🔗 What do you want to link?", &options, true)? else {
    return Ok(None);
  };

  let mut artifacts = Vec::new();
  if choice == 0 || choice == 2 {
    let Some(b) = branch else {
      bail!("HEAD is detached; there is no branch to link.");
    };
    artifacts.push(Artifact::Branch(b));
  }
  if choice == 1 || choice == 2 {
    let Some(s) = sha else {
      bail!("The repository has no commits to link.");
    };
    artifacts.push(Artifact::Commit(s));
  }
  Ok(Some(artifacts))
}

/// `azure-devops link`
pub fn link_work_item(
  repo: &str,
  az: &dyn AzCli,
  prompter: &mut dyn Prompter,
  given: Option<WorkItemRef>,
) -> Result<()> {
  ui::heading("☁️  Azure DevOps - Link Work Item");

  if !gitio::is_git_repository(repo) {
    bail!("Not a git repository.");
  }

  let Some(remote) = find_azure_remote(repo) else {
    bail!("No Azure DevOps remote found (looked at 'origin' and 'azure').");
  };
  tracing::debug!(?remote, "azure remote");

  setup::preflight(az)?;

  let (target, id) = match given {
    Some(r) => (AzureTarget::new(&r.organization, &r.project), r.id),
    None => {
      ui::info(&format!("Organization: {}  Project: {}", remote.organization, remote.project));
      (AzureTarget::new(&remote.organization, &remote.project), prompt_id(prompter)?)
    }
  };

  ui::info(&format!("🔍 Looking up repository '{}'...", remote.repository));
  let azure_repo = show_repo(az, &target, &remote.repository)
    .with_context(|| format!("Repository '{}' not found in project '{}'", remote.repository, target.project))?;
  let (Some(repo_id), Some(project_id)) = (azure_repo.id.as_deref(), azure_repo.project_id.as_deref()) else {
    bail!("Repository '{}' lookup did not return its ids.", remote.repository);
  };

  let Some(artifacts) = choose_artifacts(repo, prompter)? else {
    return Ok(());
  };

  let body = patch_body(project_id, repo_id, &artifacts);
  let mut file = tempfile::Builder::new()
    .prefix("yitpush-link-")
    .suffix(".json")
    .tempfile()
    .context("creating request body file")?;
  file.write_all(body.to_string().as_bytes()).context("writing request body file")?;
  file.flush()?;

  let url = format!("{}/_apis/wit/workitems/{}?api-version=7.0", target.org_url, id);
  let body_arg = format!("@{}", file.path().display());

  ui::info(&format!("🔗 Linking to work item #{}...", id));
  let out = capture_with_relogin(
    az,
    prompter,
    &[
      "rest",
      "--method",
      "patch",
      "--resource",
      DEVOPS_RESOURCE,
      "--url",
      &url,
      "--headers",
      "Content-Type=application/json-patch+json",
      "--body",
      &body_arg,
    ],
  )?;

  if let Err(stderr) = out {
    bail!("Failed to link work item #{}: {}", id, stderr.trim());
  }

  for artifact in &artifacts {
    match artifact {
      Artifact::Branch(b) => ui::success(&format!("Branch '{}' linked to #{}.", b, id)),
      Artifact::Commit(s) => ui::success(&format!("Commit {} linked to #{}.", s, id)),
    }
  }
  Ok(())
}
