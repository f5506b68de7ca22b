//! End-to-end CLI tests for the shard command.

use std::collections::BTreeSet;
use std::fs;

use samshard_lib::region::ShardName;
use tempfile::TempDir;

use crate::helpers::{
    SamBuilder, field, file_names, header_lines, record_lines, run_samshard_ok, write_fasta,
};

#[test]
fn test_shard_writes_every_assigned_record_once() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("ref.fa");
    let input = dir.path().join("input.sam");
    let out_dir = dir.path().join("shards");
    let regions_out = dir.path().join("regions.txt");

    write_fasta(&reference, &[("chr1", 5000), ("chr2", 3000)]);
    let mut sam = SamBuilder::new().sequence("chr1", 5000).sequence("chr2", 3000);
    let mut expected = BTreeSet::new();
    for i in 0..60i64 {
        let (rname, pos) = if i % 3 == 0 { ("chr2", 1 + i * 45) } else { ("chr1", 1 + i * 80) };
        let name = format!("r{i}");
        sam = sam.read(&name, rname, pos);
        expected.insert(name);
    }
    sam = sam.read("off_end", "chr2", 3001).read("other", "chrZ", 5);
    sam.write(&input);

    run_samshard_ok(&[
        "shard",
        "-r",
        reference.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "-o",
        out_dir.to_str().unwrap(),
        "--target-size",
        "500",
        "--regions-out",
        regions_out.to_str().unwrap(),
    ]);

    let names = file_names(&out_dir);
    assert!(names.len() > 2, "expected several shards, got {names:?}");

    let mut seen = BTreeSet::new();
    for name in &names {
        let shard = ShardName::parse(name).expect("shard names should parse");
        let path = out_dir.join(name);
        assert_eq!(header_lines(&path).len(), 3, "header replicated into {name}");
        for line in record_lines(&path) {
            assert_eq!(field(&line, 2), shard.sequence);
            let pos: u64 = field(&line, 3).parse().unwrap();
            assert!(shard.start <= pos && pos <= shard.end, "{line} outside {name}");
            assert!(seen.insert(field(&line, 0).to_string()), "record written twice");
        }
    }
    assert_eq!(seen, expected);

    // every shard corresponds to a line of the written descriptor
    let descriptor = fs::read_to_string(&regions_out).unwrap();
    for name in &names {
        let shard = ShardName::parse(name).unwrap();
        let line = format!("{}\t{}\t{}", shard.sequence, shard.start, shard.end);
        assert!(descriptor.lines().any(|l| l == line), "{line} missing from descriptor");
    }
}

#[test]
fn test_shard_keeps_input_order_within_a_shard() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("ref.fa");
    let input = dir.path().join("input.sam");
    let out_dir = dir.path().join("shards");

    write_fasta(&reference, &[("chr1", 1000)]);
    SamBuilder::new()
        .read("late", "chr1", 900)
        .read("early", "chr1", 5)
        .read("middle", "chr1", 400)
        .write(&input);

    run_samshard_ok(&[
        "shard",
        "-r",
        reference.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "-o",
        out_dir.to_str().unwrap(),
    ]);

    assert_eq!(file_names(&out_dir), vec!["chr1_1_1000.sam"]);
    let records = record_lines(&out_dir.join("chr1_1_1000.sam"));
    let order: Vec<&str> = records.iter().map(|l| field(l, 0)).collect();
    assert_eq!(order, vec!["late", "early", "middle"]);
}

#[test]
fn test_shard_uniform_names_carry_index() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("ref.fa");
    let input = dir.path().join("input.sam");
    let out_dir = dir.path().join("shards");

    write_fasta(&reference, &[("chr1", 1000), ("chr2", 1000)]);
    SamBuilder::new().read("a", "chr1", 10).read("b", "chr2", 900).write(&input);

    run_samshard_ok(&[
        "shard",
        "-r",
        reference.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "-o",
        out_dir.to_str().unwrap(),
        "--uniform",
        "4",
    ]);

    assert_eq!(file_names(&out_dir), vec!["chr1_1_500_0.sam", "chr2_501_1000_3.sam"]);
}
