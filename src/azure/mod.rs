// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Azure DevOps workflows driven through the az CLI
// role: azure
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod az;
pub mod boards;
pub mod link;
pub mod repos;
pub mod setup;
pub mod variable_groups;
