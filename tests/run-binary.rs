use assert_cmd::prelude::*;
use std::process::Command;

#[test]
fn run_fess_corridor() {
    let output = "Solving levels/custom/02-one-way.txt using fess...
Found solution: UUU
Moves: 3
";

    Command::main_binary()
        .unwrap()
        .env_remove("RUST_LOG")
        .arg("levels/custom/02-one-way.txt")
        .assert()
        .success()
        .stdout(output)
        .stderr("");
}

#[test]
fn run_astar_simplest() {
    let output = "Solving levels/custom/01-simplest.txt using astar...
Found solution: R
Moves: 1
";

    Command::main_binary()
        .unwrap()
        .env_remove("RUST_LOG")
        .arg("--method")
        .arg("astar")
        .arg("levels/custom/01-simplest.txt")
        .assert()
        .success()
        .stdout(output)
        .stderr("");
}

#[test]
fn run_unsolvable_level() {
    let output = "Solving levels/custom/04-corner-dead.txt using fess...
No solution: search space exhausted
";

    Command::main_binary()
        .unwrap()
        .env_remove("RUST_LOG")
        .arg("levels/custom/04-corner-dead.txt")
        .assert()
        .success()
        .stdout(output)
        .stderr("");
}

#[test]
fn run_bad_method() {
    Command::main_binary()
        .unwrap()
        .env_remove("RUST_LOG")
        .arg("--method")
        .arg("bogus")
        .arg("levels/custom/01-simplest.txt")
        .assert()
        .failure()
        .stdout("");
}
