//! test-support: helpers shared by yitpush unit and integration tests.
//!
//! Add as a dev-dependency in the top-level `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test_support = { path = "tests/support" }
//! ```
//!
//! Then in tests:
//! ```rust,ignore
//! use test_support::{init_fixture_repo, MockServer, MockResponse};
//!
//! let repo = init_fixture_repo();
//! let server = MockServer::start(vec![MockResponse::json(200, "{}")]);
//! ```

use once_cell::sync::Lazy;
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use std::env;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::Command;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Initialize `tracing` once, honoring `RUST_LOG` and writing via the test writer.
///
/// Safe to call from multiple tests; only the first call configures the global subscriber.
pub fn init_tracing() {
  static INIT: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_default_env()
      .or_else(|_| EnvFilter::try_new("warn"))
      .unwrap();
    // with_test_writer() causes logs to appear alongside failing tests only
    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
  });
  Lazy::force(&INIT);
}

/// Run the yitpush binary with colors off and no ambient API configuration.
pub fn cmd_bin() -> assert_cmd::Command {
  init_tracing();
  let mut cmd = assert_cmd::Command::cargo_bin("yitpush").expect("binary target not found");
  cmd.env("NO_COLOR", "1");
  cmd.env_remove("DEEPSEEK_API_KEY");
  cmd.env_remove("YITPUSH_API_URL");
  cmd.env_remove("YITPUSH_MODEL");
  cmd
}

/// Run git in `repo`, asserting success.
pub fn git(repo: &Path, args: &[&str]) {
  let status = Command::new("git").args(args).current_dir(repo).status().unwrap();
  assert!(status.success(), "git {:?} failed", args);
}

/// Run git in `repo` and return trimmed stdout.
pub fn git_output(repo: &Path, args: &[&str]) -> String {
  let out = Command::new("git").args(args).current_dir(repo).output().unwrap();
  assert!(out.status.success(), "git {:?} failed", args);
  String::from_utf8_lossy(&out.stdout).trim().to_string()
}

fn commit_dated(repo: &Path, message: &str, date: &str) {
  let status = Command::new("git")
    .arg("commit")
    .arg("-q")
    .arg("-m")
    .arg(message)
    .current_dir(repo)
    .env("GIT_AUTHOR_DATE", date)
    .env("GIT_COMMITTER_DATE", date)
    .status()
    .unwrap();

  assert!(status.success());
}

/// A repo with `main` (one commit) and `feature/alpha` (one more commit), left on `main`.
pub fn init_fixture_repo() -> tempfile::TempDir {
  let dir = tempfile::TempDir::new().unwrap();

  git(dir.path(), &["init", "-q", "-b", "main"]);
  git(dir.path(), &["config", "user.name", "Fixture Bot"]);
  git(dir.path(), &["config", "user.email", "fixture@example.com"]);
  git(dir.path(), &["config", "commit.gpgsign", "false"]);
  git(dir.path(), &["config", "push.autoSetupRemote", "false"]);

  std::fs::create_dir_all(dir.path().join("app/models")).unwrap();
  std::fs::write(dir.path().join("app/models/user.rb"), "class User; end\n").unwrap();
  git(dir.path(), &["add", "."]);
  commit_dated(dir.path(), "feat: add user model", "2025-08-12T14:03:00");

  git(dir.path(), &["checkout", "-q", "-b", "feature/alpha"]);
  std::fs::create_dir_all(dir.path().join("app/services")).unwrap();
  std::fs::write(
    dir.path().join("app/services/payment_service.rb"),
    "class PaymentService; end\n",
  )
  .unwrap();
  git(dir.path(), &["add", "."]);
  commit_dated(dir.path(), "refactor: extract payment service", "2025-08-13T09:12:00");

  git(dir.path(), &["switch", "-q", "main"]);

  dir
}

/// Create a bare repository and register it as remote `name` of `repo`.
/// The returned handle owns the bare repo's directory.
pub fn attach_bare_remote(repo: &Path, name: &str) -> tempfile::TempDir {
  let bare = tempfile::TempDir::new().unwrap();
  git(bare.path(), &["init", "-q", "--bare"]);
  git(repo, &["remote", "add", name, bare.path().to_str().unwrap()]);
  bare
}

/// Canned HTTP response served by [`MockServer`].
#[derive(Debug, Clone)]
pub struct MockResponse {
  pub status: u16,
  pub body: String,
}

impl MockResponse {
  pub fn json(status: u16, body: &str) -> Self {
    Self { status, body: body.to_string() }
  }

  /// A chat-completions success carrying one choice with `content`.
  pub fn completion(content: &str) -> Self {
    let body = json!({
      "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    });
    Self { status: 200, body: body.to_string() }
  }
}

/// What the client sent for one request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
  pub head: String,
  pub body: String,
}

impl RecordedRequest {
  pub fn header(&self, name: &str) -> Option<String> {
    let wanted = name.to_ascii_lowercase();
    self.head.lines().find_map(|line| {
      let (k, v) = line.split_once(':')?;
      if k.trim().to_ascii_lowercase() == wanted {
        Some(v.trim().to_string())
      } else {
        None
      }
    })
  }
}

/// Minimal HTTP/1.1 server on 127.0.0.1 that answers one connection per canned
/// response, in order, then stops listening.
pub struct MockServer {
  pub url: String,
  handle: Option<JoinHandle<Vec<RecordedRequest>>>,
}

impl MockServer {
  pub fn start(responses: Vec<MockResponse>) -> Self {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
      let mut seen = Vec::new();
      for resp in responses {
        let Ok((stream, _)) = listener.accept() else { break };
        if let Some(req) = serve_one(stream, &resp) {
          seen.push(req);
        }
      }
      seen
    });

    Self { url: format!("http://{}/v1/chat/completions", addr), handle: Some(handle) }
  }

  /// Wait for every canned response to be served and return the recorded requests.
  pub fn finish(mut self) -> Vec<RecordedRequest> {
    self.handle.take().map(|h| h.join().unwrap()).unwrap_or_default()
  }
}

fn serve_one(stream: TcpStream, resp: &MockResponse) -> Option<RecordedRequest> {
  let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
  let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));

  let mut reader = BufReader::new(stream.try_clone().ok()?);
  let mut head = String::new();
  let mut content_length = 0usize;

  loop {
    let mut line = String::new();
    if reader.read_line(&mut line).ok()? == 0 {
      break;
    }
    if line == "\r\n" || line == "\n" {
      break;
    }
    if let Some((k, v)) = line.split_once(':') {
      if k.trim().eq_ignore_ascii_case("content-length") {
        content_length = v.trim().parse().unwrap_or(0);
      }
    }
    head.push_str(&line);
  }

  let mut body = vec![0u8; content_length];
  reader.read_exact(&mut body).ok()?;

  let reply = format!(
    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
    resp.status,
    reason(resp.status),
    resp.body.len(),
    resp.body
  );
  let mut stream = stream;
  let _ = stream.write_all(reply.as_bytes());
  let _ = stream.flush();

  Some(RecordedRequest { head, body: String::from_utf8_lossy(&body).to_string() })
}

fn reason(status: u16) -> &'static str {
  match status {
    200 => "OK",
    400 => "Bad Request",
    401 => "Unauthorized",
    429 => "Too Many Requests",
    500 => "Internal Server Error",
    503 => "Service Unavailable",
    _ => "Status",
  }
}

/// Guard for temporarily setting environment variables.
pub struct EnvGuard {
  prev: Vec<(String, Option<String>)>,
}

impl EnvGuard {
  pub fn set_many(kv: &[(&str, &str)]) -> Self {
    let mut prev = Vec::with_capacity(kv.len());
    for (k, v) in kv {
      prev.push((k.to_string(), env::var(k).ok()));
      env::set_var(k, v);
    }
    Self { prev }
  }
}

impl Drop for EnvGuard {
  fn drop(&mut self) {
    for (k, old) in self.prev.drain(..) {
      match old {
        Some(v) => env::set_var(&k, v),
        None => env::remove_var(&k),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn completion_body_escapes_content() {
    let resp = MockResponse::completion("feat: \"quoted\"\n\n- tab\there");
    let parsed: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
    assert_eq!(parsed["choices"][0]["message"]["content"], "feat: \"quoted\"\n\n- tab\there");
    assert_eq!(resp.status, 200);
  }
}
