use assert_cmd::Command;
use predicates::str::{contains, diff};

#[test]
fn debugs_counter() {
    let mut cmd = Command::cargo_bin("c8").unwrap();
    cmd.arg("debug")
        .arg("tests/files/counter.asm")
        .arg("--headless")
        .arg("--minimal")
        .arg("--command")
        .arg(include_str!("commands/counter"));

    cmd.assert()
        .success()
        .stdout(contains("Completed"))
        .stderr(diff("V0: 01\nV0: 02\n"));
}

#[test]
fn prints_help_message() {
    let mut cmd = Command::cargo_bin("c8").unwrap();
    cmd.arg("debug")
        .arg("tests/files/counter.asm")
        .arg("--headless")
        .arg("--minimal")
        .arg("--command")
        .arg("help");
    cmd.assert()
        .success()
        .stderr(diff(include_str!("../src/debugger/help.txt").to_string() + "\n"));
}

#[test]
fn reports_command_errors() {
    let mut cmd = Command::cargo_bin("c8").unwrap();
    cmd.arg("debug")
        .arg("tests/files/counter.asm")
        .arg("--headless")
        .arg("--minimal")
        .arg("--command")
        .arg("jump; set V0; set V0 $100; load /nonexistent/c8/state; quit");
    cmd.assert().success().stderr(diff(
        "Invalid command\nNot enough arguments.\nInvalid argument\nInvalid file\n",
    ));
}

#[test]
fn prints_state() {
    let mut cmd = Command::cargo_bin("c8").unwrap();
    cmd.arg("debug")
        .arg("tests/files/counter.asm")
        .arg("--headless")
        .arg("--minimal")
        .arg("-q")
        .arg("ls")
        .arg("--command")
        .arg("print; print $202; print quirks");
    cmd.assert()
        .success()
        .stderr(contains("$200: 6000\tLD V0, 0x00\n"))
        .stderr(contains("PC: 200\t\tSP: 00\n"))
        .stderr(contains("Stack:\n"))
        .stderr(contains("$202: 7001\tADD V0, 0x01\n"))
        .stderr(contains("Quirks: ls\n"));
}

#[test]
fn steps_through_program() {
    let mut cmd = Command::cargo_bin("c8").unwrap();
    cmd.arg("debug")
        .arg("tests/files/counter.asm")
        .arg("--headless")
        .arg("--minimal")
        .arg("--command")
        .arg("next; next; print PC; print V0; continue");
    cmd.assert()
        .success()
        .stderr(diff("PC: 204\nV0: 01\n"));
}

#[test]
fn enters_debugger_with_flag() {
    let mut cmd = Command::cargo_bin("c8").unwrap();
    cmd.arg("run")
        .arg("tests/files/counter.asm")
        .arg("--headless")
        .arg("--minimal")
        .arg("-d")
        .write_stdin("print SP\ncontinue\n");
    cmd.assert()
        .success()
        .stderr(diff("SP: 00\n"))
        .stdout(contains("Completed"));
}
