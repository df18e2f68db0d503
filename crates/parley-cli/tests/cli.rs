use assert_cmd::Command;
use predicates::str::{contains, starts_with};
use tempfile::TempDir;

fn parley(data_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("parley"));
    cmd.env("PARLEY_DIR", data_dir.path())
        .env("PARLEY_CONFIG", data_dir.path().join("config.toml"))
        .env("PARLEY_DB_PATH", data_dir.path().join("parley.db"))
        .env_remove("OPENAI_API_KEY")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("parley"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(contains("Parley"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("parley"));
    cmd.arg("--version").assert().success();
}

#[test]
fn test_cli_completions() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("parley"));
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(starts_with("_parley"));
}

#[test]
fn test_empty_history() {
    let data_dir = tempfile::tempdir().unwrap();
    parley(&data_dir)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(contains("No conversations yet."));

    parley(&data_dir)
        .args(["history", "list", "--format", "json"])
        .assert()
        .success()
        .stdout(contains("[]"));
}

#[test]
fn test_offline_chat_is_recorded_in_history() {
    let data_dir = tempfile::tempdir().unwrap();
    parley(&data_dir)
        .args(["chat", "--offline"])
        .write_stdin("hello there\n\n/quit\n")
        .assert()
        .success()
        .stdout(contains("You: hello there"))
        .stdout(contains("Assistant: echo: hello there"));

    parley(&data_dir)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(contains("hello there..."))
        .stdout(contains("Today"));

    parley(&data_dir)
        .args(["history", "list", "--format", "json"])
        .assert()
        .success()
        .stdout(contains("\"message_count\": 2"))
        .stdout(contains("\"total_tokens\": 4"));

    parley(&data_dir)
        .args(["history", "show", "conv_"])
        .assert()
        .success()
        .stdout(contains("Messages: 2"))
        .stdout(contains("Assistant: echo: hello there (4 tokens)"));
}

#[test]
fn test_show_unknown_conversation_fails() {
    let data_dir = tempfile::tempdir().unwrap();
    parley(&data_dir)
        .args(["history", "show", "nope"])
        .assert()
        .failure()
        .stderr(contains("Conversation not found: nope"));
}

#[test]
fn test_online_chat_without_key_fails() {
    let data_dir = tempfile::tempdir().unwrap();
    parley(&data_dir)
        .arg("chat")
        .write_stdin("/quit\n")
        .assert()
        .failure()
        .stderr(contains("API key not found"))
        .stderr(contains("parley chat --offline"));
}
