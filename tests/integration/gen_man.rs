use assert_cmd::Command;

#[test]
fn gen_man_outputs_troff_without_banner() {
  let mut cmd = Command::cargo_bin("yitpush").unwrap();
  let out = cmd.env("NO_COLOR", "1").args(["--gen-man"]).output().unwrap();
  assert!(out.status.success());
  let text = String::from_utf8_lossy(&out.stdout);
  // clap_mangen puts a roff prelude before the .TH title line
  assert!(text.contains("\n.TH "), "expected troff man header");
  assert!(text.contains(".SH NAME"));
  assert!(text.contains("yitpush"));
  assert!(!text.contains("YitPush - AI-Powered"));
}
