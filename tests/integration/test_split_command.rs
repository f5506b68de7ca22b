//! End-to-end CLI tests for the split command.

use std::fs;

use tempfile::TempDir;

use crate::helpers::{
    SamBuilder, field, file_names, header_lines, record_lines, run_samshard_ok, write_descriptor,
};

fn input_sam() -> SamBuilder {
    SamBuilder::new()
        .sequence("chr1", 2000)
        .sequence("chr2", 1000)
        .read("a", "chr1", 10)
        .read("b", "chr1", 1500)
        .read("c", "chr1", 20)
        .read("d", "chr2", 600)
        .read("e", "chr9", 1)
        .read("f", "chr1", 0)
        .raw("bad")
}

#[test]
fn test_split_routes_records_by_region() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.sam");
    let regions = dir.path().join("regions.txt");
    let out_dir = dir.path().join("shards");
    let metrics = dir.path().join("split.tsv");

    input_sam().write(&input);
    write_descriptor(&regions, &[("chr1", 1001, 2000), ("chr1", 1, 1000), ("chr2", 1, 500)]);

    run_samshard_ok(&[
        "split",
        "-i",
        input.to_str().unwrap(),
        "-R",
        regions.to_str().unwrap(),
        "-o",
        out_dir.to_str().unwrap(),
        "--metrics",
        metrics.to_str().unwrap(),
    ]);

    assert_eq!(file_names(&out_dir), vec!["chr1_1001_2000.sam", "chr1_1_1000.sam"]);

    let first = out_dir.join("chr1_1_1000.sam");
    assert_eq!(
        header_lines(&first),
        vec!["@HD\tVN:1.6\tSO:unsorted", "@SQ\tSN:chr1\tLN:2000", "@SQ\tSN:chr2\tLN:1000"]
    );
    let names: Vec<String> = record_lines(&first).iter().map(|l| field(l, 0).to_string()).collect();
    assert_eq!(names, vec!["a", "c"]);

    let second = record_lines(&out_dir.join("chr1_1001_2000.sam"));
    assert_eq!(second.len(), 1);
    assert_eq!(field(&second[0], 0), "b");

    let metrics_text = fs::read_to_string(&metrics).unwrap();
    let mut rows = metrics_text.lines();
    let header: Vec<&str> = rows.next().unwrap().split('\t').collect();
    let values: Vec<&str> = rows.next().unwrap().split('\t').collect();
    let column = |name: &str| values[header.iter().position(|h| *h == name).unwrap()];
    assert_eq!(column("records_seen"), "7");
    assert_eq!(column("records_assigned"), "3");
    assert_eq!(column("dropped_unparsable"), "1");
    assert_eq!(column("dropped_unknown_sequence"), "1");
    assert_eq!(column("dropped_out_of_range"), "1");
    assert_eq!(column("dropped_uncovered"), "1");
    assert_eq!(column("shards_written"), "2");
}

#[test]
fn test_split_with_tiny_buffer_writes_header_once() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.sam");
    let regions = dir.path().join("regions.txt");
    let out_dir = dir.path().join("shards");

    let mut sam = SamBuilder::new().sequence("chr1", 10_000);
    for i in 1..=200 {
        sam = sam.read(&format!("q{i}"), "chr1", i * 7);
    }
    sam.write(&input);
    write_descriptor(&regions, &[("chr1", 1, 10_000)]);

    run_samshard_ok(&[
        "split",
        "-i",
        input.to_str().unwrap(),
        "-R",
        regions.to_str().unwrap(),
        "-o",
        out_dir.to_str().unwrap(),
        "--buffer-size",
        "64",
    ]);

    let shard = out_dir.join("chr1_1_10000.sam");
    assert_eq!(header_lines(&shard).len(), 2);
    let records = record_lines(&shard);
    assert_eq!(records.len(), 200);
    assert_eq!(field(&records[0], 0), "q1");
    assert_eq!(field(&records[199], 0), "q200");
    assert_eq!(fs::read_to_string(&shard).unwrap(), sam_text_for_shard(&input));
}

/// Input text with blank lines removed, which is what a single all-covering shard holds.
fn sam_text_for_shard(input: &std::path::Path) -> String {
    fs::read_to_string(input).unwrap().lines().map(|l| format!("{l}\n")).collect()
}
