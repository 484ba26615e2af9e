//! Directory preparation: log mirroring and provenance across reorganizations


use musicman_library::materialize::PROVENANCE_FILE;
use musicman_library::{Command, Reconciler, RunOptions};
use std::fs;
use tempfile::TempDir;
use test_helpers::*;

#[tokio::test]
async fn test_provenance_survives_repeated_reorganization() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let reader = FakeReader::new();
    let original = reader.add(root, "rips/album/01.flac", raw_full("A", "X", "One", "1", "1999"));

    let options = RunOptions::default();
    let transcoder = FakeTranscoder::new();
    let reconciler = Reconciler::new(&options, &reader, &transcoder);

    let first = root.join("first");
    reconciler
        .run(&Command::Copy { inputs: vec![root.join("rips")] }, &first)
        .await
        .unwrap();

    // The reorganized copy becomes the next source
    reader.add(
        &first,
        "A/X [1999]/01 - One.flac",
        raw_full("A", "X", "One", "1", "1999"),
    );
    let second = root.join("second");
    reconciler
        .run(&Command::Copy { inputs: vec![first.clone()] }, &second)
        .await
        .unwrap();

    let expected = format!("{}\n", original.parent().unwrap().display());
    assert_eq!(
        fs::read_to_string(first.join("A/X [1999]").join(PROVENANCE_FILE)).unwrap(),
        expected
    );
    assert_eq!(
        fs::read_to_string(second.join("A/X [1999]").join(PROVENANCE_FILE)).unwrap(),
        expected
    );
}

#[tokio::test]
async fn test_logs_are_mirrored_without_overwriting() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let reader = FakeReader::new();
    reader.add(root, "in/01.flac", raw("A", "X", "One"));
    reader.add(root, "in/02.flac", raw("A", "X", "Two"));
    fs::write(root.join("in/rip.log"), b"new log").unwrap();
    fs::write(root.join("in/cue.log"), b"cue log").unwrap();
    fs::write(root.join("in/notes.txt"), b"notes").unwrap();
    fs::create_dir(root.join("in/old.log")).unwrap();

    let out = root.join("out");
    fs::create_dir_all(out.join("A/X")).unwrap();
    fs::write(out.join("A/X/rip.log"), b"kept log").unwrap();

    let options = RunOptions {
        copy_only: true,
        ..Default::default()
    };
    let transcoder = FakeTranscoder::new();
    Reconciler::new(&options, &reader, &transcoder)
        .run(&Command::Copy { inputs: vec![root.join("in")] }, &out)
        .await
        .unwrap();

    assert_eq!(
        list_files(&out),
        vec!["A/X/One.flac", "A/X/Two.flac", "A/X/cue.log", "A/X/moved_from", "A/X/rip.log"]
    );
    assert_eq!(fs::read(out.join("A/X/rip.log")).unwrap(), b"kept log");
    assert_eq!(fs::read(out.join("A/X/cue.log")).unwrap(), b"cue log");
}

#[tokio::test]
async fn test_albums_from_one_directory_get_own_provenance() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let reader = FakeReader::new();
    reader.add(root, "mixed/01.flac", raw("A", "X", "One"));
    reader.add(root, "mixed/02.flac", raw("B", "Y", "Two"));

    let options = RunOptions::default();
    let transcoder = FakeTranscoder::new();
    let out = root.join("out");
    Reconciler::new(&options, &reader, &transcoder)
        .run(&Command::Copy { inputs: vec![root.join("mixed")] }, &out)
        .await
        .unwrap();

    let expected = format!("{}\n", root.join("mixed").display());
    for album in ["A/X", "B/Y"] {
        assert_eq!(
            fs::read_to_string(out.join(album).join(PROVENANCE_FILE)).unwrap(),
            expected
        );
    }
}
