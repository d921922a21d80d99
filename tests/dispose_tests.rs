use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use dupestream::actions::{dispose_duplicates, dispose_to_trash, DisposeError};
use dupestream::duplicates::DuplicateGroup;
use dupestream::scanner::FileEntry;
use tempfile::tempdir;

#[test]
fn test_dispose_missing_path_returns_not_found() {
    let dir = tempdir().unwrap();
    let gone = dir.path().join("vanished.txt");

    let err = dispose_to_trash(&gone).unwrap_err();
    assert!(matches!(err, DisposeError::NotFound(_)));
}

#[test]
fn test_dispose_missing_path_performs_no_mutation() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("bystander.txt"), b"untouched").unwrap();

    let _ = dispose_to_trash(&dir.path().join("vanished.txt"));

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names.len(), 1);
    assert_eq!(
        fs::read(dir.path().join("bystander.txt")).unwrap(),
        b"untouched"
    );
}

#[test]
fn test_not_found_error_carries_the_path() {
    let err = dispose_to_trash(&PathBuf::from("/nowhere/file.bin")).unwrap_err();
    match err {
        DisposeError::NotFound(path) => assert_eq!(path, PathBuf::from("/nowhere/file.bin")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn test_batch_dispose_never_touches_first_member() {
    let dir = tempdir().unwrap();
    let keep = dir.path().join("original.txt");
    fs::write(&keep, b"data!!!").unwrap();

    let entry = |path: PathBuf| FileEntry::new(path, 7, SystemTime::UNIX_EPOCH);
    let group = DuplicateGroup::new(
        [1u8; 32],
        7,
        vec![
            entry(keep.clone()),
            entry(dir.path().join("copy1.txt")),
            entry(dir.path().join("copy2.txt")),
        ],
    );

    // The copies are already gone; both attempts fail individually while
    // the preserved original is never touched.
    let result = dispose_duplicates(&group);

    assert!(keep.exists());
    assert_eq!(result.failure_count(), 2);
    assert_eq!(result.success_count(), 0);
    assert_eq!(result.bytes_freed, 0);
}
