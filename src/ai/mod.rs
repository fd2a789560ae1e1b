// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Text generation for commit messages and PR descriptions (client + prompt construction)
// role: module/aggregation
// outputs: DeepSeekClient, TextGenerator seam, prompt builders
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod client;
pub mod prompts;

pub use client::{ApiError, DeepSeekClient, TextGenerator};
