// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Route a normalized Action to its handler with the real terminal, az and API client wired in
// role: commands/dispatch
// inputs: EffectiveConfig from cli::normalize
// outputs: anyhow::Result<()> per handler; Ok also covers user cancellation
// invariants:
// - Handlers receive their collaborators as trait objects; only dispatch builds the concrete ones
// - The API key is checked only by commands that generate text
// errors: Propagated from handlers unchanged
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod checkout;
pub mod commit;
pub mod pr;

use anyhow::{Context, Result};

use crate::ai::DeepSeekClient;
use crate::azure::{az::SystemAz, boards, link, repos, variable_groups};
use crate::cli::{Action, ApiSettings, EffectiveConfig};
use crate::model::Branch;
use crate::ui::TerminalPrompter;
use crate::util::pad;

pub fn dispatch(cfg: &EffectiveConfig) -> Result<()> {
  let mut prompter = TerminalPrompter::stdio();
  let az = SystemAz;
  tracing::debug!(action = ?cfg.action, repo = %cfg.repo, "dispatch");

  match &cfg.action {
    Action::Commit(opts) => commit::run(cfg, opts, &mut prompter),
    Action::Pr(opts) => pr::run(cfg, opts, &mut prompter),
    Action::Checkout => checkout::run(&cfg.repo, &mut prompter),
    Action::RepoNew => repos::create(&cfg.repo, &az, &mut prompter),
    Action::RepoCheckout => repos::clone(&cfg.repo, &az, &mut prompter),
    Action::VariableGroupList => variable_groups::list(&az, &mut prompter),
    Action::HuTask(given) => boards::create_tasks(&az, &mut prompter, given.clone()),
    Action::HuList(given) => boards::list_children(&az, &mut prompter, given.clone()),
    Action::Link(given) => link::link_work_item(&cfg.repo, &az, &mut prompter, given.clone()),
  }
}

/// DeepSeek client from the normalized settings; fails when no key is configured.
pub fn build_generator(api: &ApiSettings) -> Result<DeepSeekClient> {
  let key = api.api_key.as_deref().context(
    "DEEPSEEK_API_KEY environment variable not found. Set it with: export DEEPSEEK_API_KEY='your-api-key-here'",
  )?;
  Ok(DeepSeekClient::new(key).with_url(api.url.as_str()).with_model(api.model.as_str()))
}

/// Aligned `name  kind  date` lines for branch menus.
pub fn branch_menu_lines(branches: &[Branch]) -> Vec<String> {
  let name_w = branches.iter().map(|b| b.name.chars().count()).max().unwrap_or(0) + 2;
  branches
    .iter()
    .map(|b| format!("{} {} {}", pad(&b.name, name_w), pad(&b.kind.to_string(), 8), b.date).trim_end().to_string())
    .collect()
}
