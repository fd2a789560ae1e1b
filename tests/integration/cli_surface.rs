use predicates::prelude::*;

#[test]
fn help_lists_commands_and_exits_zero() {
  test_support::cmd_bin()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("commit").and(predicate::str::contains("azure-devops")));

  test_support::cmd_bin().arg("help").assert().success();
}

#[test]
fn no_command_prints_banner_and_help() {
  test_support::cmd_bin()
    .assert()
    .success()
    .stdout(predicate::str::contains("YitPush - AI-Powered Git Commit Tool").and(predicate::str::contains("Usage")));
}

#[test]
fn version_exits_zero() {
  test_support::cmd_bin().arg("--version").assert().success().stdout(predicate::str::contains("yitpush"));
}

#[test]
fn unknown_command_exits_one() {
  test_support::cmd_bin().arg("frobnicate").assert().code(1);
}

#[test]
fn partial_work_item_coordinates_exit_one() {
  test_support::cmd_bin()
    .args(["azure-devops", "hu", "task", "acme", "Web"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("<ORGANIZATION> <PROJECT> <ID>"));
}

#[test]
fn non_numeric_work_item_id_exits_one() {
  test_support::cmd_bin().args(["azure-devops", "link", "acme", "Web", "abc"]).assert().code(1);
}
