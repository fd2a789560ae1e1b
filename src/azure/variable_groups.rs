// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Browse pipeline variable groups of a project and show their variables with secrets masked
// role: azure/variable_groups
// inputs: AzCli, Prompter, AzureTarget from setup
// outputs: Menu of groups; Name/Value table for the chosen group
// side_effects: az pipelines variable-group list; terminal output
// invariants:
// - Secret values are never printed
// - Missing id or name render as "-", missing description as empty
// - Back from the group menu ends the command cleanly
// errors: az listing failure bails with the captured stderr
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{bail, Result};
use serde_json::Value;

use crate::azure::az::{capture_with_relogin, AzCli};
use crate::azure::setup;
use crate::ext::serde_json::{parse_listing, JsonFetch};
use crate::model::{GroupVariable, VariableGroup};
use crate::ui::{self, Prompter};
use crate::util::{ellipsize, pad};

const DESCRIPTION_WIDTH: usize = 30;

fn group_variables(group: &Value) -> Vec<GroupVariable> {
  let Some(Value::Object(vars)) = group.fetch("variables").raw() else {
    return Vec::new();
  };

  vars
    .iter()
    .map(|(name, v)| GroupVariable {
      name: name.clone(),
      value: v.fetch("value").text_or(""),
      is_secret: v.fetch("isSecret").to_or_default::<bool>(),
    })
    .collect()
}

pub fn parse_variable_groups(text: &str) -> Vec<VariableGroup> {
  parse_listing(text)
    .iter()
    .map(|g| VariableGroup {
      id: g.fetch("id").text_or("-"),
      name: g.fetch("name").text_or("-"),
      description: g.fetch("description").text_or(""),
      variables: group_variables(g),
    })
    .collect()
}

/// One aligned menu line per group: id, name, clipped description, variable count.
pub fn menu_lines(groups: &[VariableGroup]) -> Vec<String> {
  let width = |f: fn(&VariableGroup) -> usize| groups.iter().map(f).max().unwrap_or(0);
  let id_w = width(|g| g.id.chars().count()) + 2;
  let name_w = width(|g| g.name.chars().count()) + 2;
  let desc_w = width(|g| g.description.chars().count()).min(DESCRIPTION_WIDTH) + 2;

  groups
    .iter()
    .map(|g| {
      format!(
        "{}{}{}Vars: {}",
        pad(&g.id, id_w),
        pad(&g.name, name_w),
        pad(&ellipsize(&g.description, DESCRIPTION_WIDTH), desc_w),
        g.variables.len()
      )
    })
    .collect()
}

fn show_group(group: &VariableGroup) {
  println!();
  ui::heading(&format!("📦 {} (ID: {})", group.name, group.id));
  if !group.description.is_empty() {
    ui::dim(&group.description);
  }

  if group.variables.is_empty() {
    ui::warn("This group has no variables.");
    return;
  }

  let rows: Vec<Vec<String>> =
    group.variables.iter().map(|v| vec![v.name.clone(), v.display_value().to_string()]).collect();
  println!("{}", ui::render_table(&["Name", "Value"], &rows));
}

/// `azure-devops variable-group list`
pub fn list(az: &dyn AzCli, prompter: &mut dyn Prompter) -> Result<()> {
  ui::heading("☁️  Azure DevOps - Variable Groups");

  let target = setup::require_target(az, prompter)?;

  ui::info("📋 Fetching variable groups...");
  let out = capture_with_relogin(
    az,
    prompter,
    &[
      "pipelines",
      "variable-group",
      "list",
      "--organization",
      &target.org_url,
      "--project",
      &target.project,
      "--output",
      "json",
    ],
  )?;

  let groups = match out {
    Ok(text) => parse_variable_groups(&text),
    Err(stderr) => bail!("Failed to list variable groups: {}", stderr.trim()),
  };

  if groups.is_empty() {
    ui::warn(&format!("No variable groups found in project '{}'.", target.project));
    return Ok(());
  }

  let lines = menu_lines(&groups);
  loop {
    let Some(idx) = prompter.select("📋 Select a variable group:", &lines, true)? else {
      return Ok(());
    };
    show_group(&groups[idx]);
    prompter.pause("Press Enter to return to the list...")?;
  }
}
