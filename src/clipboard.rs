// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Best-effort copy of generated text to the system clipboard via platform tools
// role: io/clipboard
// inputs: Text to copy
// outputs: bool (copied or not)
// side_effects: Spawns pbcopy / clip / wl-copy / xclip / xsel with the text on stdin
// invariants: Never fails the calling command; first tool that exits 0 wins
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use crate::process::run_with_input;

#[cfg(target_os = "macos")]
const CANDIDATES: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(windows)]
const CANDIDATES: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(not(any(target_os = "macos", windows)))]
const CANDIDATES: &[(&str, &[&str])] = &[
  ("wl-copy", &[]),
  ("xclip", &["-selection", "clipboard"]),
  ("xsel", &["--clipboard", "--input"]),
];

pub fn copy(text: &str) -> bool {
  for &(program, args) in CANDIDATES {
    if run_with_input(program, args, text.as_bytes()) {
      tracing::debug!(program, "copied to clipboard");
      return true;
    }
  }

  tracing::debug!("no clipboard tool accepted the text");
  false
}
