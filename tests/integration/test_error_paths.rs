//! Error path integration tests.
//!
//! These tests verify that fatal conditions stop the run with exit status 1 and a message,
//! and that record-level problems never do.

use std::fs;

use tempfile::TempDir;

use crate::helpers::{SamBuilder, run_samshard, run_samshard_ok, write_descriptor, write_fasta};

fn assert_fails_with(args: &[&str], message: &str) {
    let output = run_samshard(args);
    assert_eq!(output.status.code(), Some(1), "expected exit status 1 for {args:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(message), "stderr missing {message:?}:\n{stderr}");
}

#[test]
fn test_missing_reference_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.sam");
    SamBuilder::new().read("a", "chr1", 1).write(&input);

    assert_fails_with(
        &[
            "plan",
            "-r",
            dir.path().join("missing.fa").to_str().unwrap(),
            "-i",
            input.to_str().unwrap(),
            "-o",
            dir.path().join("regions.txt").to_str().unwrap(),
        ],
        "does not exist",
    );
}

#[test]
fn test_empty_allow_list_intersection_is_fatal() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("ref.fa");
    let input = dir.path().join("input.sam");
    write_fasta(&reference, &[("scaffold_1", 100)]);
    SamBuilder::new().read("a", "scaffold_1", 1).write(&input);

    assert_fails_with(
        &[
            "plan",
            "-r",
            reference.to_str().unwrap(),
            "-i",
            input.to_str().unwrap(),
            "-o",
            dir.path().join("regions.txt").to_str().unwrap(),
        ],
        "No usable sequences",
    );
}

#[test]
fn test_too_many_regions_is_fatal() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("ref.fa");
    let input = dir.path().join("input.sam");
    write_fasta(&reference, &[("chr1", 1000)]);
    SamBuilder::new().read("a", "chr1", 1).write(&input);

    assert_fails_with(
        &[
            "plan",
            "-r",
            reference.to_str().unwrap(),
            "-i",
            input.to_str().unwrap(),
            "-o",
            dir.path().join("regions.txt").to_str().unwrap(),
            "--uniform",
            "10",
            "--max-regions",
            "5",
        ],
        "exceeds the configured maximum",
    );
}

#[test]
fn test_malformed_descriptor_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.sam");
    let regions = dir.path().join("regions.txt");
    SamBuilder::new().read("a", "chr1", 1).write(&input);
    fs::write(&regions, "chr1 1 100\nchr1 0 50\n").unwrap();

    assert_fails_with(
        &[
            "split",
            "-i",
            input.to_str().unwrap(),
            "-R",
            regions.to_str().unwrap(),
            "-o",
            dir.path().join("shards").to_str().unwrap(),
        ],
        "line 2",
    );
}

#[test]
fn test_output_path_that_is_a_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.sam");
    let regions = dir.path().join("regions.txt");
    let not_a_dir = dir.path().join("occupied");
    SamBuilder::new().read("a", "chr1", 1).write(&input);
    write_descriptor(&regions, &[("chr1", 1, 100)]);
    fs::write(&not_a_dir, "x").unwrap();

    assert_fails_with(
        &[
            "split",
            "-i",
            input.to_str().unwrap(),
            "-R",
            regions.to_str().unwrap(),
            "-o",
            not_a_dir.to_str().unwrap(),
        ],
        "is not a directory",
    );
}

#[test]
fn test_invalid_slack_factor_is_fatal() {
    let dir = TempDir::new().unwrap();
    let in_dir = dir.path().join("shards");
    fs::create_dir(&in_dir).unwrap();

    assert_fails_with(
        &[
            "process",
            "-i",
            in_dir.to_str().unwrap(),
            "-o",
            dir.path().join("out").to_str().unwrap(),
            "--slack-factor",
            "1.0",
        ],
        "slack-factor",
    );
}

#[test]
fn test_bad_records_do_not_fail_the_run() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.sam");
    let regions = dir.path().join("regions.txt");
    let out_dir = dir.path().join("shards");
    SamBuilder::new()
        .raw("only\tfive\tfields\there\tx")
        .raw("r\t0\tchr1\tNaN\t60")
        .read("ok", "chr1", 50)
        .write(&input);
    write_descriptor(&regions, &[("chr1", 1, 100)]);

    run_samshard_ok(&[
        "split",
        "-i",
        input.to_str().unwrap(),
        "-R",
        regions.to_str().unwrap(),
        "-o",
        out_dir.to_str().unwrap(),
    ]);
    let processed = dir.path().join("processed");
    run_samshard_ok(&["process", "-i", out_dir.to_str().unwrap(), "-o", processed.to_str().unwrap()]);
    assert!(processed.join("chr1_1_100.sorted.markdup.sam").exists());
}

#[test]
fn test_empty_shard_directory_succeeds() {
    let dir = TempDir::new().unwrap();
    let in_dir = dir.path().join("shards");
    fs::create_dir(&in_dir).unwrap();
    run_samshard_ok(&["process", "-i", in_dir.to_str().unwrap(), "-o", dir.path().join("out").to_str().unwrap()]);
}
