use super::*;
use datafile::encode_data_record;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_generation(dir: &Path, generation: u64, records: &[(u32, &[u8], &[u8])]) {
    let mut bytes = Vec::new();
    for (ts, key, value) in records {
        bytes.extend_from_slice(&encode_data_record(*ts, key, value).unwrap());
    }
    fs::write(dir.join(format!("{}.data", generation)), bytes).unwrap();
}

fn session(bc: &mut Bitcask, commands: &str) -> String {
    let mut out = Vec::new();
    run(bc, commands.as_bytes(), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn loaded(dir: &Path) -> Bitcask {
    let mut bc = Bitcask::open(dir);
    bc.load().unwrap();
    bc
}

#[test]
fn get_prints_value_or_nil() {
    let dir = tempdir().unwrap();
    write_generation(dir.path(), 1, &[(1, b"name", b"Alice")]);
    let mut bc = loaded(dir.path());

    let out = session(&mut bc, "GET name\nGET missing\nGET\n");
    assert!(out.contains("Alice\n"));
    assert!(out.contains("(nil)\n"));
    assert!(out.contains("ERR usage: GET key"));
}

#[test]
fn scan_lists_entries_with_count() {
    let dir = tempdir().unwrap();
    write_generation(dir.path(), 1, &[(1, b"a", b"1"), (1, b"b", b"2"), (2, b"a", b"3")]);
    let mut bc = loaded(dir.path());

    let out = session(&mut bc, "SCAN\n");
    assert!(out.contains("a -> 3\n"));
    assert!(out.contains("b -> 2\n"));
    assert!(!out.contains("a -> 1"));
    assert!(out.contains("(2 entries)"));
}

#[test]
fn empty_directory_prints_empty() {
    let dir = tempdir().unwrap();
    let mut bc = loaded(dir.path());

    let out = session(&mut bc, "SCAN\nKEYS\nFILES\nSIZE\n");
    assert_eq!(out.matches("(empty)").count(), 3);
    assert!(out.contains("> 0\n"));
}

#[test]
fn keys_and_size_leave_out_tombstoned_keys() {
    let dir = tempdir().unwrap();
    write_generation(
        dir.path(),
        1,
        &[(1, b"x", b"1"), (1, b"y", b"2"), (2, b"y", bitcask::TOMBSTONE)],
    );
    let mut bc = loaded(dir.path());

    let out = session(&mut bc, "KEYS\nSIZE\nGET y\nSCAN\n");
    assert!(out.contains("> x\n"));
    assert!(!out.lines().any(|l| l == "y"));
    assert!(out.contains("(1 keys)"));
    assert!(out.contains("> 1\n"));
    assert!(out.contains("(nil)"));
    assert!(out.contains("(1 entries)"));
}

#[test]
fn files_lists_generations_in_order() {
    let dir = tempdir().unwrap();
    write_generation(dir.path(), 12, &[(1, b"a", b"1")]);
    write_generation(dir.path(), 2, &[(1, b"b", b"1")]);
    let mut bc = loaded(dir.path());

    let out = session(&mut bc, "FILES\n");
    let names: Vec<&str> = out
        .lines()
        .filter_map(|l| l.rsplit('/').next())
        .filter(|n| n.ends_with(".data"))
        .collect();
    assert_eq!(names, vec!["2.data", "12.data"]);
    assert!(out.contains("(2 files)"));
}

#[test]
fn reload_sees_new_generations() {
    let dir = tempdir().unwrap();
    write_generation(dir.path(), 1, &[(1, b"k", b"old")]);
    let mut bc = loaded(dir.path());
    write_generation(dir.path(), 2, &[(2, b"k", b"new")]);

    let out = session(&mut bc, "GET k\nRELOAD\nGET k\n");
    assert!(out.contains("old\n"));
    assert!(out.contains("OK (generations=2, keys=1, skipped=0)"));
    assert!(out.contains("new\n"));
}

#[test]
fn stats_and_unknown_commands() {
    let dir = tempdir().unwrap();
    let mut bc = loaded(dir.path());

    let out = session(&mut bc, "stats\nFROB\n");
    assert!(out.contains("Bitcask {"));
    assert!(out.contains("unknown command: FROB"));
}

#[test]
fn exit_stops_processing() {
    let dir = tempdir().unwrap();
    write_generation(dir.path(), 1, &[(1, b"a", b"1")]);
    let mut bc = loaded(dir.path());

    let out = session(&mut bc, "QUIT\nGET a\n");
    assert!(out.contains("bye"));
    assert!(!out.contains("1\n"));
}

#[test]
fn banner_reports_load() {
    let dir = tempdir().unwrap();
    write_generation(dir.path(), 1, &[(1, b"a", b"1"), (1, b"b", b"2")]);
    let mut bc = Bitcask::open(dir.path());
    let report = bc.load().unwrap();

    let line = banner(&bc, &report);
    assert!(line.contains("generations=1"));
    assert!(line.contains("keys=2"));
    assert!(line.contains("skipped=0"));
}
