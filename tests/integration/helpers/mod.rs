//! Helper utilities for integration tests.

pub mod assertions;
pub mod sam_generator;

pub use assertions::*;
pub use sam_generator::*;

use std::process::{Command, Output};

/// Runs the samshard binary with `args` and returns its captured output.
pub fn run_samshard(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_samshard"))
        .args(args)
        .output()
        .expect("Failed to run samshard")
}

/// Runs the samshard binary and panics with its stderr if it fails.
pub fn run_samshard_ok(args: &[&str]) -> Output {
    let output = run_samshard(args);
    assert!(
        output.status.success(),
        "samshard {} failed:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    output
}
