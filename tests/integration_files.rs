//! Integration tests for reading and deleting reviewed files.

use assert_fs::prelude::*;
use near_dup_finder::error::{DedupError, FileError};
use near_dup_finder::{delete_files, read_file};
use predicates::prelude::*;

#[test]
fn delete_removes_files_and_reports_failures() {
    let temp = assert_fs::TempDir::new().unwrap();
    let keep = temp.child("keep.jpg");
    let dup_a = temp.child("dup_a.jpg");
    let dup_b = temp.child("dup_b.png");
    keep.write_binary(b"keep").unwrap();
    dup_a.write_binary(b"a").unwrap();
    dup_b.write_binary(b"b").unwrap();
    let missing = temp.child("missing.jpg");

    let report = delete_files(&[
        dup_a.path().to_path_buf(),
        missing.path().to_path_buf(),
        dup_b.path().to_path_buf(),
    ]);

    assert_eq!(report.deleted_count, 2);
    assert_eq!(report.failed_paths, vec![missing.path().to_path_buf()]);
    dup_a.assert(predicate::path::missing());
    dup_b.assert(predicate::path::missing());
    keep.assert(predicate::path::exists());
}

#[test]
fn delete_skips_directories() {
    let temp = assert_fs::TempDir::new().unwrap();
    let folder = temp.child("album.jpg");
    folder.create_dir_all().unwrap();

    let report = delete_files(&[folder.path()]);

    assert_eq!(report.deleted_count, 0);
    assert_eq!(report.failed_count(), 1);
    folder.assert(predicate::path::is_dir());
}

#[test]
fn delete_empty_batch_is_a_noop() {
    let paths: [&std::path::Path; 0] = [];
    let report = delete_files(&paths);

    assert_eq!(report.deleted_count, 0);
    assert!(report.failed_paths.is_empty());
}

#[test]
fn read_returns_exact_bytes() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("photo.jpg");
    let content: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    file.write_binary(&content).unwrap();

    let bytes = read_file(file.path()).unwrap();

    assert_eq!(&bytes[..], &content[..]);
    file.assert(predicate::path::is_file());
}

#[test]
fn read_missing_file_is_not_found() {
    let temp = assert_fs::TempDir::new().unwrap();

    let result = read_file(temp.child("gone.png").path());

    assert!(matches!(
        result,
        Err(DedupError::File(FileError::NotFound { .. }))
    ));
}

#[test]
fn read_directory_is_not_found() {
    let temp = assert_fs::TempDir::new().unwrap();

    let result = read_file(temp.path());

    assert!(matches!(
        result,
        Err(DedupError::File(FileError::NotFound { .. }))
    ));
}
