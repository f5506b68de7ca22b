//! End-to-end CLI tests for the process command, alone and after sharding.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::helpers::{
    SamBuilder, assert_coordinate_sorted, assert_duplicate, field, file_names, flag_of,
    header_lines, record_lines, run_samshard_ok, write_fasta,
};

/// A shard with one duplicate pair, one unmapped and one secondary record at the same key.
fn duplicate_shard() -> SamBuilder {
    SamBuilder::new()
        .sequence("chr1", 10_000)
        .record("late", 0, "chr1", 900, "=", 1000, "IIII")
        .record("low", 0, "chr1", 100, "=", 200, "++++")
        .record("high", 0, "chr1", 100, "chr1", 200, "IIII")
        .record("second", 256, "chr1", 100, "=", 200, "IIII")
        .record("unmapped", 4, "chr1", 100, "=", 200, "IIII")
        .record("tie_a", 0x1 | 0x10, "chr1", 500, "=", 600, "5555")
        .record("tie_b", 0x1 | 0x10, "chr1", 500, "=", 600, "5555")
        .record("mate_rev", 0x1 | 0x20, "chr1", 500, "=", 600, "5555")
}

fn process(in_dir: &Path, out_dir: &Path, extra: &[&str]) {
    let mut args = vec!["process", "-i", in_dir.to_str().unwrap(), "-o", out_dir.to_str().unwrap()];
    args.extend_from_slice(extra);
    run_samshard_ok(&args);
}

#[test]
fn test_process_all_mode_sorts_and_marks() {
    let dir = TempDir::new().unwrap();
    let in_dir = dir.path().join("shards");
    let out_dir = dir.path().join("out");
    fs::create_dir(&in_dir).unwrap();
    duplicate_shard().write(&in_dir.join("chr1_1_10000.sam"));

    process(&in_dir, &out_dir, &[]);

    assert_eq!(file_names(&out_dir), vec!["chr1_1_10000.sorted.markdup.sam"]);
    let path = out_dir.join("chr1_1_10000.sorted.markdup.sam");
    assert_eq!(header_lines(&path).len(), 2);

    let records = record_lines(&path);
    assert_eq!(records.len(), 8);
    assert_coordinate_sorted(&records);

    assert_duplicate(&records, "high", false);
    assert_duplicate(&records, "low", true);
    assert_duplicate(&records, "late", false);
    assert_eq!(flag_of(crate::helpers::find_record(&records, "second")), 256);
    assert_eq!(flag_of(crate::helpers::find_record(&records, "unmapped")), 4);
    assert_duplicate(&records, "tie_a", false);
    assert_duplicate(&records, "tie_b", true);
    assert_duplicate(&records, "mate_rev", false);
}

#[test]
fn test_process_sort_mode_only_reorders() {
    let dir = TempDir::new().unwrap();
    let in_dir = dir.path().join("shards");
    let out_dir = dir.path().join("out");
    fs::create_dir(&in_dir).unwrap();
    let shard = in_dir.join("chr1_1_10000.sam");
    duplicate_shard().write(&shard);

    process(&in_dir, &out_dir, &["--mode", "sort"]);

    let sorted = out_dir.join("chr1_1_10000.sorted.sam");
    let records = record_lines(&sorted);
    assert_coordinate_sorted(&records);
    let mut before = record_lines(&shard);
    let mut after = records.clone();
    before.sort();
    after.sort();
    assert_eq!(before, after);

    // sorting sorted output changes nothing
    let again_in = dir.path().join("again");
    let again_out = dir.path().join("again_out");
    fs::create_dir(&again_in).unwrap();
    fs::copy(&sorted, again_in.join("x.sam")).unwrap();
    process(&again_in, &again_out, &["--mode", "sort"]);
    assert_eq!(
        fs::read(again_out.join("x.sorted.sam")).unwrap(),
        fs::read(&sorted).unwrap()
    );
}

#[test]
fn test_process_markdup_mode_keeps_order() {
    let dir = TempDir::new().unwrap();
    let in_dir = dir.path().join("shards");
    let out_dir = dir.path().join("out");
    fs::create_dir(&in_dir).unwrap();
    let shard = in_dir.join("s.sam");
    duplicate_shard().write(&shard);

    process(&in_dir, &out_dir, &["--mode", "markdup"]);

    let records = record_lines(&out_dir.join("s.markdup.sam"));
    let order: Vec<&str> = records.iter().map(|l| field(l, 0)).collect();
    assert_eq!(order, vec!["late", "low", "high", "second", "unmapped", "tie_a", "tie_b", "mate_rev"]);
    assert_duplicate(&records, "low", true);
}

#[test]
fn test_process_skips_oversize_and_failed_shards() {
    let dir = TempDir::new().unwrap();
    let in_dir = dir.path().join("shards");
    let out_dir = dir.path().join("out");
    let metrics = dir.path().join("process.tsv");
    fs::create_dir(&in_dir).unwrap();

    SamBuilder::new().read("a", "chr1", 1).write(&in_dir.join("a.sam"));
    fs::write(in_dir.join("b.sam"), "\n\n").unwrap();
    let mut big = SamBuilder::new();
    for i in 0..100 {
        big = big.read(&format!("r{i}"), "chr1", i);
    }
    big.write(&in_dir.join("c.sam"));
    fs::write(in_dir.join("readme.txt"), "not a shard").unwrap();

    process(
        &in_dir,
        &out_dir,
        &["--width", "2", "--max-shard-size", "1K", "--metrics", metrics.to_str().unwrap()],
    );

    assert_eq!(file_names(&out_dir), vec!["a.sorted.markdup.sam"]);

    let metrics_text = fs::read_to_string(&metrics).unwrap();
    let mut rows = metrics_text.lines();
    let header: Vec<&str> = rows.next().unwrap().split('\t').collect();
    let values: Vec<&str> = rows.next().unwrap().split('\t').collect();
    let column = |name: &str| values[header.iter().position(|h| *h == name).unwrap()];
    assert_eq!(column("shards_total"), "3");
    assert_eq!(column("shards_processed"), "1");
    assert_eq!(column("shards_failed"), "1");
    assert_eq!(column("shards_skipped_oversize"), "1");
    assert_eq!(column("batches"), "1");
}

#[test]
fn test_shard_then_process_pipeline() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("ref.fa");
    let input = dir.path().join("input.sam");
    let shard_dir = dir.path().join("shards");
    let out_dir = dir.path().join("processed");

    write_fasta(&reference, &[("chr1", 4000), ("chr2", 2000)]);
    let mut sam = SamBuilder::new().sequence("chr1", 4000).sequence("chr2", 2000);
    for i in (0..40i64).rev() {
        let rname = if i % 2 == 0 { "chr1" } else { "chr2" };
        sam = sam.record(&format!("r{i}"), 0, rname, 1 + i * 45, "*", 0, "IIII");
        // an exact duplicate of every fifth read, with lower quality
        if i % 5 == 0 {
            sam = sam.record(&format!("d{i}"), 0, rname, 1 + i * 45, "*", 0, "$$$$");
        }
    }
    sam.write(&input);

    run_samshard_ok(&[
        "shard",
        "-r",
        reference.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "-o",
        shard_dir.to_str().unwrap(),
        "--target-size",
        "400",
    ]);
    process(&shard_dir, &out_dir, &["--threads", "2", "--width", "3"]);

    let inputs = file_names(&shard_dir);
    let outputs = file_names(&out_dir);
    assert_eq!(inputs.len(), outputs.len());

    let mut total = 0;
    let mut duplicates = Vec::new();
    for name in &outputs {
        assert!(name.ends_with(".sorted.markdup.sam"));
        let records = record_lines(&out_dir.join(name));
        assert_coordinate_sorted(&records);
        total += records.len();
        for line in &records {
            if flag_of(line) & 0x400 != 0 {
                duplicates.push(field(line, 0).to_string());
            }
        }
    }
    duplicates.sort();
    assert_eq!(total, 48);
    assert_eq!(duplicates, vec!["d0", "d10", "d15", "d20", "d25", "d30", "d35", "d5"]);
}

#[test]
fn test_process_ignores_non_sam_suffixes() {
    let dir = TempDir::new().unwrap();
    let in_dir = dir.path().join("shards");
    let out_dir = dir.path().join("out");
    fs::create_dir(&in_dir).unwrap();
    SamBuilder::new().read("current", "chr1", 5).write(&in_dir.join("a.sam"));
    SamBuilder::new().read("stale", "chr1", 5).write(&in_dir.join("a.sam.prev"));

    process(&in_dir, &out_dir, &[]);

    assert_eq!(file_names(&out_dir), vec!["a.sorted.markdup.sam"]);
    let records = record_lines(&out_dir.join("a.sorted.markdup.sam"));
    assert_eq!(records.len(), 1);
    assert_eq!(field(&records[0], 0), "current");
}
