//! End-to-end CLI tests for the plan command.

use std::fs;

use tempfile::TempDir;

use crate::helpers::{SamBuilder, run_samshard_ok, write_fai, write_fasta};

fn descriptor_lines(text: &str) -> Vec<&str> {
    text.lines().filter(|l| !l.starts_with('#')).collect()
}

#[test]
fn test_plan_greedy_regions() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("ref.fa");
    let input = dir.path().join("input.sam");
    let output = dir.path().join("regions.txt");
    let metrics = dir.path().join("plan_metrics.tsv");

    write_fasta(&reference, &[("chr1", 2500), ("chr2", 1000), ("chr3", 500)]);
    SamBuilder::new()
        .sequence("chr1", 2500)
        .sequence("chr2", 1000)
        .read("r1", "chr1", 10)
        .read("r2", "chr1", 1500)
        .read("r3", "chr3", 5)
        .write(&input);

    run_samshard_ok(&[
        "plan",
        "-r",
        reference.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--allow-list",
        "chr1,chr2",
        "--target-size",
        "1",
        "--metrics",
        metrics.to_str().unwrap(),
    ]);

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("#sequence\tstart\tend\n"));
    assert_eq!(
        descriptor_lines(&text),
        vec!["chr1\t1\t1000", "chr1\t1001\t2000", "chr1\t2001\t2500", "chr2\t1\t1000"]
    );

    let metrics_text = fs::read_to_string(&metrics).unwrap();
    let mut rows = metrics_text.lines();
    let header: Vec<&str> = rows.next().unwrap().split('\t').collect();
    let values: Vec<&str> = rows.next().unwrap().split('\t').collect();
    let column = |name: &str| values[header.iter().position(|h| *h == name).unwrap()];
    assert_eq!(column("sequences"), "2");
    assert_eq!(column("regions"), "4");
    assert_eq!(column("records_seen"), "3");
    assert_eq!(column("records_weighted"), "2");
}

#[test]
fn test_plan_large_target_gives_one_region_per_sequence() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("ref.fa");
    let input = dir.path().join("input.sam");
    let output = dir.path().join("regions.txt");

    write_fasta(&reference, &[("chr1", 2500), ("chr2", 1000)]);
    SamBuilder::new().read("r1", "chr1", 10).read("r2", "chr2", 999).write(&input);

    run_samshard_ok(&[
        "plan",
        "-r",
        reference.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ]);

    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(descriptor_lines(&text), vec!["chr1\t1\t2500", "chr2\t1\t1000"]);
}

#[test]
fn test_plan_uniform_from_fai() {
    let dir = TempDir::new().unwrap();
    let fai = dir.path().join("ref.fa.fai");
    let input = dir.path().join("input.sam");
    let output = dir.path().join("regions.txt");

    write_fai(&fai, &[("chr1", 2000), ("chr2", 1000)]);
    SamBuilder::new().read("r1", "chr1", 10).write(&input);

    run_samshard_ok(&[
        "plan",
        "-r",
        fai.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--uniform",
        "4",
    ]);

    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(
        descriptor_lines(&text),
        vec!["chr1\t1\t750", "chr1\t751\t1500", "chr1\t1501\t2000", "chr2\t1\t750", "chr2\t751\t1000"]
    );
}

#[test]
fn test_plan_prefers_sibling_fai() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("ref.fa");
    let input = dir.path().join("input.sam");
    let output = dir.path().join("regions.txt");

    write_fasta(&reference, &[("chr1", 100)]);
    // the index disagrees with the FASTA on purpose
    write_fai(&dir.path().join("ref.fa.fai"), &[("chr1", 5000)]);
    SamBuilder::new().read("r1", "chr1", 10).write(&input);

    run_samshard_ok(&[
        "plan",
        "-r",
        reference.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ]);

    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(descriptor_lines(&text), vec!["chr1\t1\t5000"]);
}

#[test]
fn test_plan_standard_allow_list_skips_other_sequences() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("ref.fa");
    let input = dir.path().join("input.sam");
    let output = dir.path().join("regions.txt");

    write_fasta(&reference, &[("chr1", 300), ("chrUn_gl000220", 200), ("chrM", 100), ("chrX", 400)]);
    SamBuilder::new().read("r1", "chrM", 10).read("r2", "chrX", 10).write(&input);

    run_samshard_ok(&[
        "plan",
        "-r",
        reference.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ]);

    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(descriptor_lines(&text), vec!["chr1\t1\t300", "chrX\t1\t400"]);
}
