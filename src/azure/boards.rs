// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: User story (HU) helpers: create child tasks under a story and list its child work items
// role: azure/boards
// inputs: Optional WorkItemRef from the CLI; AzCli; Prompter
// outputs: New Task work items parented to the story; a table of children
// side_effects: az boards work-item show/create/relation add
// invariants:
// - New tasks inherit the story's area and iteration paths
// - An empty task title ends the entry loop
// - A failed task does not stop the remaining ones; the command fails at the end
// errors: Story lookup failure, any task creation or parenting failure
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{bail, Result};
use serde_json::Value;

use crate::azure::az::{capture_with_relogin, AzCli};
use crate::azure::setup::{self, AzureTarget};
use crate::cli::WorkItemRef;
use crate::ext::serde_json::{parse_object, JsonFetch};
use crate::model::WorkItem;
use crate::ui::{self, Prompter};

const CHILD_RELATION: &str = "System.LinkTypes.Hierarchy-Forward";

fn field(item: &Value, name: &str) -> Option<String> {
  item.get("fields").and_then(|f| f.get(name)).and_then(|v| v.as_str()).map(str::to_string)
}

/// Work item id from the last segment of a relation URL (`.../workItems/123`).
fn id_from_url(url: &str) -> Option<u64> {
  url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

pub fn parse_work_item(text: &str) -> Option<WorkItem> {
  let item = parse_object(text)?;
  let id = item.fetch("id").to::<u64>()?;

  let child_ids = item
    .fetch("relations")
    .to_or_default::<Vec<Value>>()
    .iter()
    .filter(|r| r.fetch("rel").to::<String>().as_deref() == Some(CHILD_RELATION))
    .filter_map(|r| r.fetch("url").to::<String>())
    .filter_map(|url| id_from_url(&url))
    .collect();

  Some(WorkItem {
    id,
    kind: field(&item, "System.WorkItemType").unwrap_or_else(|| "-".to_string()),
    title: field(&item, "System.Title").unwrap_or_default(),
    state: field(&item, "System.State").unwrap_or_else(|| "-".to_string()),
    area_path: field(&item, "System.AreaPath"),
    iteration_path: field(&item, "System.IterationPath"),
    child_ids,
  })
}

pub fn show_work_item(
  az: &dyn AzCli,
  prompter: &mut dyn Prompter,
  target: &AzureTarget,
  id: u64,
) -> Result<Result<WorkItem, String>> {
  let id = id.to_string();
  let out = capture_with_relogin(
    az,
    prompter,
    &["boards", "work-item", "show", "--id", &id, "--organization", &target.org_url, "--output", "json"],
  )?;

  Ok(out.and_then(|text| parse_work_item(&text).ok_or_else(|| "unrecognised work item JSON".to_string())))
}

/// Create a Task in the story's area and iteration. Returns the new id.
pub fn create_task(
  az: &dyn AzCli,
  prompter: &mut dyn Prompter,
  target: &AzureTarget,
  story: &WorkItem,
  title: &str,
) -> Result<Result<u64, String>> {
  let mut args = vec![
    "boards",
    "work-item",
    "create",
    "--type",
    "Task",
    "--title",
    title,
    "--project",
    target.project.as_str(),
    "--organization",
    target.org_url.as_str(),
    "--output",
    "json",
  ];
  if let Some(area) = &story.area_path {
    args.extend(["--area", area.as_str()]);
  }
  if let Some(iteration) = &story.iteration_path {
    args.extend(["--iteration", iteration.as_str()]);
  }

  let out = capture_with_relogin(az, prompter, &args)?;
  Ok(out.and_then(|text| {
    parse_object(&text)
      .and_then(|v| v.fetch("id").to::<u64>())
      .ok_or_else(|| "created work item has no id".to_string())
  }))
}

pub fn add_parent(
  az: &dyn AzCli,
  prompter: &mut dyn Prompter,
  target: &AzureTarget,
  child: u64,
  parent: u64,
) -> Result<Result<(), String>> {
  let (child, parent) = (child.to_string(), parent.to_string());
  let out = capture_with_relogin(
    az,
    prompter,
    &[
      "boards",
      "work-item",
      "relation",
      "add",
      "--id",
      &child,
      "--relation-type",
      "parent",
      "--target-id",
      &parent,
      "--organization",
      &target.org_url,
      "--output",
      "json",
    ],
  )?;
  Ok(out.map(|_| ()))
}

/// Coordinates from the CLI (preflight only) or interactively (org, project, then id).
pub fn resolve(
  az: &dyn AzCli,
  prompter: &mut dyn Prompter,
  given: Option<WorkItemRef>,
) -> Result<(AzureTarget, u64)> {
  if let Some(r) = given {
    setup::preflight(az)?;
    return Ok((AzureTarget::new(&r.organization, &r.project), r.id));
  }

  let target = setup::require_target(az, prompter)?;
  let id = prompt_id(prompter)?;
  Ok((target, id))
}

pub fn prompt_id(prompter: &mut dyn Prompter) -> Result<u64> {
  loop {
    let answer = prompter.text("🔢 Work item ID", None)?;
    match answer.trim().parse::<u64>() {
      Ok(id) => return Ok(id),
      Err(_) => ui::warn(&format!("'{}' is not a valid work item ID.", answer.trim())),
    }
  }
}

fn fetch_story(az: &dyn AzCli, prompter: &mut dyn Prompter, target: &AzureTarget, id: u64) -> Result<WorkItem> {
  ui::info(&format!("🔍 Fetching work item {}...", id));
  match show_work_item(az, prompter, target, id)? {
    Ok(item) => Ok(item),
    Err(stderr) => bail!("Failed to fetch work item {}: {}", id, stderr.trim()),
  }
}

fn story_panel(story: &WorkItem) -> String {
  let mut body = format!("{} #{}: {}\nState: {}", story.kind, story.id, story.title, story.state);
  if let Some(area) = &story.area_path {
    body.push_str(&format!("\nArea: {}", area));
  }
  if let Some(iteration) = &story.iteration_path {
    body.push_str(&format!("\nIteration: {}", iteration));
  }
  body
}

/// `azure-devops hu task`
pub fn create_tasks(az: &dyn AzCli, prompter: &mut dyn Prompter, given: Option<WorkItemRef>) -> Result<()> {
  ui::heading("☁️  Azure DevOps - Create Tasks");

  let (target, id) = resolve(az, prompter, given)?;

  let story = fetch_story(az, prompter, &target, id)?;
  ui::panel("User Story", &story_panel(&story));
  ui::dim("Enter one task title per prompt; leave empty to finish.");

  let mut created = 0usize;
  let mut failed = 0usize;

  loop {
    let title = prompter.text("📝 Task title", Some(""))?;
    let title = title.trim();
    if title.is_empty() {
      break;
    }

    let task_id = match create_task(az, prompter, &target, &story, title)? {
      Ok(task_id) => task_id,
      Err(stderr) => {
        ui::error(&format!("Failed to create task '{}': {}", title, stderr.trim()));
        failed += 1;
        continue;
      }
    };

    match add_parent(az, prompter, &target, task_id, story.id)? {
      Ok(()) => {
        ui::success(&format!("Task #{} created under #{}: {}", task_id, story.id, title));
        created += 1;
      }
      Err(stderr) => {
        ui::error(&format!("Task #{} created but could not be linked to #{}: {}", task_id, story.id, stderr.trim()));
        failed += 1;
      }
    }
  }

  tracing::debug!(created, failed, story = story.id, "task entry finished");
  if failed > 0 {
    bail!("{} task(s) failed ({} created).", failed, created);
  }
  if created == 0 {
    ui::warn("No tasks created.");
  } else {
    ui::success(&format!("{} task(s) created.", created));
  }
  Ok(())
}

/// `azure-devops hu list`
pub fn list_children(az: &dyn AzCli, prompter: &mut dyn Prompter, given: Option<WorkItemRef>) -> Result<()> {
  ui::heading("☁️  Azure DevOps - User Story Tasks");

  let (target, id) = resolve(az, prompter, given)?;

  let story = fetch_story(az, prompter, &target, id)?;
  ui::panel("User Story", &story_panel(&story));

  if story.child_ids.is_empty() {
    ui::warn(&format!("Work item #{} has no child items.", story.id));
    return Ok(());
  }

  let mut rows = Vec::with_capacity(story.child_ids.len());
  for child in &story.child_ids {
    let row = match show_work_item(az, prompter, &target, *child)? {
      Ok(item) => vec![item.id.to_string(), item.kind, item.state, item.title],
      Err(stderr) => {
        tracing::debug!(child, stderr = %stderr.trim(), "child work item lookup failed");
        vec![child.to_string(), "-".to_string(), "-".to_string(), "(unavailable)".to_string()]
      }
    };
    rows.push(row);
  }

  println!("{}", ui::render_table(&["ID", "Type", "State", "Title"], &rows));
  Ok(())
}
