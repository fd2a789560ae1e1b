// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Run external executables (git, az, clipboard tools) and observe their outcome without OS-specific process APIs
// role: process/runner
// inputs: Program name, ordered args, capture mode, optional working dir and stdin bytes
// outputs: Captured stdout/stderr plus exit code; tagged Ok(stdout)/Err(stderr); interactive success flag
// side_effects: Spawns child processes; interactive mode hands the terminal to the child
// invariants:
// - Exit code 0 is the only success signal
// - Both pipes are drained to EOF before the exit status is awaited
// - Spawn failure is reported as exit code -1 with the OS error in stderr
// errors: Never returned; folded into the outcome
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;

/// Exit code used when the child could not be started or died from a signal.
pub const NO_EXIT_CODE: i32 = -1;

/// How the child's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
  /// Both streams go to the null device.
  Discard,
  /// Both streams are piped and collected.
  Both,
  /// The child inherits the terminal.
  Inherit,
}

/// What a finished child left behind.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
  pub stdout: String,
  pub stderr: String,
  pub code: i32,
}

impl Outcome {
  pub fn success(&self) -> bool {
    self.code == 0
  }

  pub fn into_result(self) -> Result<String, String> {
    if self.success() {
      Ok(self.stdout)
    } else {
      Err(self.stderr)
    }
  }

  fn spawn_failed(program: &str, err: std::io::Error) -> Self {
    Outcome {
      stdout: String::new(),
      stderr: format!("failed to start {}: {}", program, err),
      code: NO_EXIT_CODE,
    }
  }
}

/// A single external command, built up and then run once.
#[derive(Debug, Clone)]
pub struct Invocation {
  program: String,
  args: Vec<String>,
  capture: Capture,
  cwd: Option<PathBuf>,
  input: Option<Vec<u8>>,
}

impl Invocation {
  pub fn new<S: AsRef<str>>(program: &str, args: &[S]) -> Self {
    Self {
      program: program.to_string(),
      args: args.iter().map(|a| a.as_ref().to_string()).collect(),
      capture: Capture::Both,
      cwd: None,
      input: None,
    }
  }

  pub fn capture(mut self, capture: Capture) -> Self {
    self.capture = capture;
    self
  }

  pub fn current_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
    self.cwd = Some(dir.as_ref().to_path_buf());
    self
  }

  /// Bytes written to the child's stdin, which is closed afterwards.
  pub fn input(mut self, bytes: impl Into<Vec<u8>>) -> Self {
    self.input = Some(bytes.into());
    self
  }

  pub fn run(self) -> Outcome {
    let mut cmd = Command::new(&self.program);
    cmd.args(&self.args);

    if let Some(dir) = &self.cwd {
      cmd.current_dir(dir);
    }

    match self.capture {
      Capture::Discard => {
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
      }
      Capture::Both => {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
      }
      Capture::Inherit => {}
    }

    let stdin = match (&self.input, self.capture) {
      (Some(_), _) => Stdio::piped(),
      (None, Capture::Inherit) => Stdio::inherit(),
      (None, _) => Stdio::null(),
    };
    cmd.stdin(stdin);

    let outcome = match cmd.spawn() {
      Ok(child) => finish(child, self.input),
      Err(err) => Outcome::spawn_failed(&self.program, err),
    };

    tracing::debug!(program = %self.program, args = ?self.args, code = outcome.code, "process finished");

    outcome
  }
}

/// Feed stdin, drain both pipes concurrently, then reap the child.
fn finish(mut child: Child, input: Option<Vec<u8>>) -> Outcome {
  let feeder = match (child.stdin.take(), input) {
    (Some(mut stdin), Some(bytes)) => Some(thread::spawn(move || {
      let _ = stdin.write_all(&bytes);
    })),
    _ => None,
  };

  let stderr_reader = child.stderr.take().map(|mut pipe| {
    thread::spawn(move || {
      let mut buf = Vec::new();
      let _ = pipe.read_to_end(&mut buf);
      buf
    })
  });

  let mut stdout_buf = Vec::new();

  if let Some(mut pipe) = child.stdout.take() {
    let _ = pipe.read_to_end(&mut stdout_buf);
  }

  let stderr_buf = stderr_reader.and_then(|h| h.join().ok()).unwrap_or_default();

  if let Some(h) = feeder {
    let _ = h.join();
  }

  let code = match child.wait() {
    Ok(status) => status.code().unwrap_or(NO_EXIT_CODE),
    Err(_) => NO_EXIT_CODE,
  };

  Outcome {
    stdout: String::from_utf8_lossy(&stdout_buf).to_string(),
    stderr: String::from_utf8_lossy(&stderr_buf).to_string(),
    code,
  }
}

/// Run with both streams captured; returns stdout and the exit code.
pub fn run_capturing<S: AsRef<str>>(program: &str, args: &[S]) -> (String, i32) {
  let out = Invocation::new(program, args).run();
  (out.stdout, out.code)
}

/// Run with both streams captured; `Ok(stdout)` on exit 0, `Err(stderr)` otherwise.
pub fn run_capturing_with_error<S: AsRef<str>>(program: &str, args: &[S]) -> Result<String, String> {
  Invocation::new(program, args).run().into_result()
}

/// Run attached to the terminal; true on exit 0.
pub fn run_interactive<S: AsRef<str>>(program: &str, args: &[S]) -> bool {
  Invocation::new(program, args).capture(Capture::Inherit).run().success()
}

/// Run with `input` piped to stdin and output discarded; true on exit 0.
pub fn run_with_input<S: AsRef<str>>(program: &str, args: &[S], input: &[u8]) -> bool {
  Invocation::new(program, args)
    .capture(Capture::Discard)
    .input(input.to_vec())
    .run()
    .success()
}
