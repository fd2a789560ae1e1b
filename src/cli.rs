// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Command-line surface (clap derive) and normalization into an EffectiveConfig
// role: cli/config
// inputs: argv; environment (DEEPSEEK_API_KEY, YITPUSH_API_URL, YITPUSH_MODEL)
// outputs: EffectiveConfig with a resolved Action, API settings and working directory
// invariants:
// - Blank environment values are treated as absent
// - Work-item coordinates are given all together (org, project, id) or not at all
// - --language defaults to "english" and accepts the --lang alias
// errors: normalize bails on partial work-item coordinates or a missing subcommand
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use crate::ai::client::{DEFAULT_API_URL, DEFAULT_MODEL};

#[derive(Parser, Debug)]
#[command(
    name = "yitpush",
    version,
    about = "AI-generated commit messages and PR descriptions, branch checkout, and Azure DevOps helpers",
    long_about = None
)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Option<Command>,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Generate a commit message for all changes, commit them and push
  Commit(CommitArgs),

  /// Generate a pull request description from the diff between two branches
  Pr(PrArgs),

  /// Pick a local or remote branch from a menu and check it out
  Checkout,

  /// Azure DevOps helpers (repositories, variable groups, work items)
  #[command(name = "azure-devops", subcommand)]
  AzureDevops(AzureCommand),
}

#[derive(Args, Debug, Clone)]
pub struct CommitArgs {
  /// Ask before committing (and before setting an upstream branch)
  #[arg(long)]
  pub confirm: bool,

  /// Generate a title plus a descriptive body
  #[arg(long)]
  pub detailed: bool,

  /// Language for the generated message
  #[arg(long, visible_alias = "lang", default_value = "english")]
  pub language: String,

  /// Also write the message to commit-message-<timestamp>.md
  #[arg(long)]
  pub save: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PrArgs {
  /// Include files changed, testing and notes sections
  #[arg(long)]
  pub detailed: bool,

  /// Language for the generated description
  #[arg(long, visible_alias = "lang", default_value = "english")]
  pub language: String,

  /// Also write the description to pr-description-<from>-to-<to>-<timestamp>.md
  #[arg(long)]
  pub save: bool,
}

#[derive(Subcommand, Debug)]
pub enum AzureCommand {
  /// Create or clone Azure DevOps repositories
  #[command(subcommand)]
  Repo(RepoAction),

  /// Inspect pipeline variable groups
  #[command(name = "variable-group", subcommand)]
  VariableGroup(VariableGroupAction),

  /// Work with a user story (HU): add tasks or list its children
  #[command(subcommand)]
  Hu(HuAction),

  /// Link the current branch and/or latest commit to a work item
  Link(WorkItemArgs),
}

#[derive(Subcommand, Debug)]
pub enum RepoAction {
  /// Create a repository (or reuse an existing one) and add it as a git remote
  New,
  /// Choose a repository and clone it
  Checkout,
}

#[derive(Subcommand, Debug)]
pub enum VariableGroupAction {
  /// List variable groups and browse their variables
  List,
}

#[derive(Subcommand, Debug)]
pub enum HuAction {
  /// Create child tasks under a user story
  Task(WorkItemArgs),
  /// List the child work items of a user story
  List(WorkItemArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct WorkItemArgs {
  /// Organization name or URL
  pub organization: Option<String>,
  /// Project name
  pub project: Option<String>,
  /// Work item id
  pub id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItemRef {
  pub organization: String,
  pub project: String,
  pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOptions {
  pub confirm: bool,
  pub detailed: bool,
  pub language: String,
  pub save: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrOptions {
  pub detailed: bool,
  pub language: String,
  pub save: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  Commit(CommitOptions),
  Pr(PrOptions),
  Checkout,
  RepoNew,
  RepoCheckout,
  VariableGroupList,
  HuTask(Option<WorkItemRef>),
  HuList(Option<WorkItemRef>),
  Link(Option<WorkItemRef>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
  pub api_key: Option<String>,
  pub url: String,
  pub model: String,
}

#[derive(Debug, Clone)]
pub struct EffectiveConfig {
  /// Working directory every git and file operation runs in.
  pub repo: String,
  pub action: Action,
  pub api: ApiSettings,
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  let repo = std::env::current_dir().map(|p| p.to_string_lossy().to_string()).unwrap_or_else(|_| ".".to_string());
  normalize_with(cli, repo, |key| std::env::var(key).ok())
}

/// [`normalize`] with an injectable working directory and environment lookup.
pub fn normalize_with<F>(cli: Cli, repo: String, env: F) -> Result<EffectiveConfig>
where
  F: Fn(&str) -> Option<String>,
{
  let Some(command) = cli.command else {
    bail!("No command given; run `yitpush --help` for usage")
  };

  let action = match command {
    Command::Commit(a) => Action::Commit(CommitOptions {
      confirm: a.confirm,
      detailed: a.detailed,
      language: a.language,
      save: a.save,
    }),
    Command::Pr(a) => Action::Pr(PrOptions { detailed: a.detailed, language: a.language, save: a.save }),
    Command::Checkout => Action::Checkout,
    Command::AzureDevops(az) => match az {
      AzureCommand::Repo(RepoAction::New) => Action::RepoNew,
      AzureCommand::Repo(RepoAction::Checkout) => Action::RepoCheckout,
      AzureCommand::VariableGroup(VariableGroupAction::List) => Action::VariableGroupList,
      AzureCommand::Hu(HuAction::Task(w)) => Action::HuTask(work_item_ref(w)?),
      AzureCommand::Hu(HuAction::List(w)) => Action::HuList(work_item_ref(w)?),
      AzureCommand::Link(w) => Action::Link(work_item_ref(w)?),
    },
  };

  let non_blank = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

  let api = ApiSettings {
    api_key: non_blank("DEEPSEEK_API_KEY"),
    url: non_blank("YITPUSH_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
    model: non_blank("YITPUSH_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
  };

  Ok(EffectiveConfig { repo, action, api })
}

fn work_item_ref(args: WorkItemArgs) -> Result<Option<WorkItemRef>> {
  match (args.organization, args.project, args.id) {
    (Some(organization), Some(project), Some(id)) => Ok(Some(WorkItemRef { organization, project, id })),
    (None, None, None) => Ok(None),
    _ => bail!("Provide all of <ORGANIZATION> <PROJECT> <ID>, or none to choose interactively"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["yitpush"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
  }

  fn normalize_env(cli: Cli, vars: &[(&str, &str)]) -> Result<EffectiveConfig> {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    normalize_with(cli, "/work".into(), move |k| map.get(k).cloned())
  }

  #[test]
  fn commit_flags_and_language_alias() {
    let cfg = normalize_env(parse(&["commit", "--confirm", "--detailed", "--lang", "spanish", "--save"]), &[]).unwrap();
    assert_eq!(
      cfg.action,
      Action::Commit(CommitOptions { confirm: true, detailed: true, language: "spanish".into(), save: true })
    );
    assert_eq!(cfg.repo, "/work");
  }

  #[test]
  fn language_defaults_to_english() {
    let cfg = normalize_env(parse(&["pr"]), &[]).unwrap();
    assert_eq!(cfg.action, Action::Pr(PrOptions { detailed: false, language: "english".into(), save: false }));
  }

  #[test]
  fn azure_subcommands_map_to_actions() {
    assert_eq!(normalize_env(parse(&["azure-devops", "repo", "new"]), &[]).unwrap().action, Action::RepoNew);
    assert_eq!(normalize_env(parse(&["azure-devops", "repo", "checkout"]), &[]).unwrap().action, Action::RepoCheckout);
    assert_eq!(
      normalize_env(parse(&["azure-devops", "variable-group", "list"]), &[]).unwrap().action,
      Action::VariableGroupList
    );
    assert_eq!(normalize_env(parse(&["azure-devops", "hu", "list"]), &[]).unwrap().action, Action::HuList(None));
  }

  #[test]
  fn work_item_coordinates_all_or_none() {
    let cfg = normalize_env(parse(&["azure-devops", "hu", "task", "acme", "Web Shop", "42"]), &[]).unwrap();
    assert_eq!(
      cfg.action,
      Action::HuTask(Some(WorkItemRef { organization: "acme".into(), project: "Web Shop".into(), id: 42 }))
    );

    assert!(normalize_env(parse(&["azure-devops", "link", "acme"]), &[]).is_err());
    assert!(normalize_env(parse(&["azure-devops", "link", "acme", "Web"]), &[]).is_err());
  }

  #[test]
  fn non_numeric_work_item_id_is_rejected() {
    assert!(Cli::try_parse_from(["yitpush", "azure-devops", "link", "acme", "Web", "abc"]).is_err());
  }

  #[test]
  fn unknown_subcommands_are_rejected() {
    assert!(Cli::try_parse_from(["yitpush", "frobnicate"]).is_err());
    assert!(Cli::try_parse_from(["yitpush", "azure-devops", "repo", "delete"]).is_err());
  }

  #[test]
  fn api_settings_from_env_with_blank_as_absent() {
    let cfg = normalize_env(parse(&["commit"]), &[("DEEPSEEK_API_KEY", "   ")]).unwrap();
    assert_eq!(cfg.api.api_key, None);
    assert_eq!(cfg.api.url, DEFAULT_API_URL);
    assert_eq!(cfg.api.model, DEFAULT_MODEL);

    let cfg = normalize_env(
      parse(&["commit"]),
      &[("DEEPSEEK_API_KEY", "sk-1"), ("YITPUSH_API_URL", "http://127.0.0.1:9/v1"), ("YITPUSH_MODEL", "deepseek-chat")],
    )
    .unwrap();
    assert_eq!(cfg.api.api_key.as_deref(), Some("sk-1"));
    assert_eq!(cfg.api.url, "http://127.0.0.1:9/v1");
    assert_eq!(cfg.api.model, "deepseek-chat");
  }

  #[test]
  #[serial_test::serial]
  fn normalize_reads_process_environment() {
    let _env = test_support::EnvGuard::set_many(&[("DEEPSEEK_API_KEY", " sk-env "), ("YITPUSH_MODEL", "deepseek-chat")]);
    let cfg = normalize(parse(&["pr"])).unwrap();
    assert_eq!(cfg.api.api_key.as_deref(), Some("sk-env"));
    assert_eq!(cfg.api.model, "deepseek-chat");
    assert!(!cfg.repo.is_empty());
  }

  #[test]
  fn missing_command_is_an_error() {
    assert!(normalize_env(parse(&[]), &[]).is_err());
  }
}
