use predicates::prelude::*;
use test_support::{attach_bare_remote, git_output, init_fixture_repo, MockResponse, MockServer};

#[test]
fn commit_outside_git_repo_exits_one() {
  let dir = tempfile::TempDir::new().unwrap();
  test_support::cmd_bin()
    .current_dir(dir.path())
    .env("DEEPSEEK_API_KEY", "dummy")
    .arg("commit")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Not a git repository"));
}

#[test]
fn commit_without_api_key_exits_one() {
  let repo = init_fixture_repo();
  test_support::cmd_bin()
    .current_dir(repo.path())
    .arg("commit")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("DEEPSEEK_API_KEY"));
}

#[test]
fn blank_api_key_counts_as_missing() {
  let repo = init_fixture_repo();
  test_support::cmd_bin()
    .current_dir(repo.path())
    .env("DEEPSEEK_API_KEY", "   ")
    .arg("pr")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("DEEPSEEK_API_KEY"));
}

#[test]
fn clean_tree_commit_pushes_and_sets_upstream() {
  let repo = init_fixture_repo();
  let remote = attach_bare_remote(repo.path(), "origin");

  test_support::cmd_bin()
    .current_dir(repo.path())
    .env("DEEPSEEK_API_KEY", "dummy")
    .env("YITPUSH_API_URL", "http://127.0.0.1:9/unreachable")
    .arg("commit")
    .assert()
    .success()
    .stdout(predicate::str::contains("No changes detected").and(predicate::str::contains("Successfully pushed")));

  assert_eq!(git_output(remote.path(), &["log", "-1", "--format=%s", "main"]), "feat: add user model");
  assert_eq!(git_output(repo.path(), &["rev-parse", "--abbrev-ref", "main@{upstream}"]), "origin/main");
}

#[test]
fn commit_uses_generated_message_from_api() {
  let repo = init_fixture_repo();
  let remote = attach_bare_remote(repo.path(), "origin");
  std::fs::write(repo.path().join("README.md"), "# shop\n").unwrap();

  let server = MockServer::start(vec![MockResponse::completion("\"docs: add readme\"")]);

  test_support::cmd_bin()
    .current_dir(repo.path())
    .env("DEEPSEEK_API_KEY", "sk-integration")
    .env("YITPUSH_API_URL", &server.url)
    .args(["commit", "--lang", "german"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Commit Message"));

  let requests = server.finish();
  assert_eq!(requests.len(), 1);
  assert_eq!(requests[0].header("authorization").as_deref(), Some("Bearer sk-integration"));
  assert!(requests[0].body.contains("deepseek-reasoner"));
  assert!(requests[0].body.contains("german"));

  assert_eq!(git_output(repo.path(), &["log", "-1", "--format=%s"]), "docs: add readme");
  assert_eq!(git_output(remote.path(), &["log", "-1", "--format=%s", "main"]), "docs: add readme");
}

#[test]
fn api_auth_failure_exits_one_without_committing() {
  let repo = init_fixture_repo();
  std::fs::write(repo.path().join("README.md"), "# shop\n").unwrap();
  let server = MockServer::start(vec![MockResponse::json(401, r#"{"error":"invalid key"}"#)]);

  test_support::cmd_bin()
    .current_dir(repo.path())
    .env("DEEPSEEK_API_KEY", "sk-bad")
    .env("YITPUSH_API_URL", &server.url)
    .arg("commit")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Failed to generate commit message"));

  assert_eq!(server.finish().len(), 1);
  assert_eq!(git_output(repo.path(), &["log", "-1", "--format=%s"]), "feat: add user model");
}
