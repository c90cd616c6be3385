//! Fingerprint determinism and failure behaviour on real files.

use mirror_fs::fingerprint::{self, fingerprint_file_with_chunk_size};
use mirror_fs::{Error, fingerprint_bytes, fingerprint_file};
use mirror_test_utils::TestTree;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(4096)]
#[case(fingerprint::DEFAULT_CHUNK_SIZE)]
fn chunk_size_does_not_change_fingerprint(#[case] chunk_size: usize) {
    let tree = TestTree::new();
    let content = patterned(10_000);
    tree.write("data.bin", &content);

    let digest = fingerprint_file_with_chunk_size(&tree.path("data.bin"), chunk_size).unwrap();
    assert_eq!(digest, fingerprint_bytes(&content));
}

#[test]
fn same_content_same_fingerprint_across_files() {
    let tree = TestTree::new();
    tree.write("a.txt", "X");
    tree.write("sub/b.txt", "X");

    let a = fingerprint_file(&tree.path("a.txt")).unwrap();
    let b = fingerprint_file(&tree.path("sub/b.txt")).unwrap();
    assert_eq!(a, b);
}

#[test]
fn single_byte_change_changes_fingerprint() {
    let tree = TestTree::new();
    let mut content = patterned(2 * 1024 * 1024 + 17);
    tree.write("big.bin", &content);
    let before = fingerprint_file(&tree.path("big.bin")).unwrap();

    let last = content.len() - 1;
    content[last] ^= 0xff;
    tree.write("big.bin", &content);
    let after = fingerprint_file(&tree.path("big.bin")).unwrap();

    assert_ne!(before, after);
}

#[test]
fn empty_file_fingerprints_as_empty_input() {
    let tree = TestTree::new();
    tree.write("empty", "");

    let digest = fingerprint_file(&tree.path("empty")).unwrap();
    assert_eq!(digest, fingerprint_bytes(b""));
}

#[test]
fn missing_file_is_an_io_error() {
    let tree = TestTree::new();
    let result = fingerprint_file(&tree.path("nope.txt"));

    match result {
        Err(Error::Io { path, source }) => {
            assert_eq!(path, tree.path("nope.txt"));
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected Io error, got {:?}", other),
    }
}

#[cfg(unix)]
#[test]
fn unreadable_file_is_an_io_error() {
    use std::fs::{self, Permissions};
    use std::os::unix::fs::PermissionsExt;

    if mirror_test_utils::is_root() {
        eprintln!("Skipping test: running as root bypasses permission checks");
        return;
    }

    let tree = TestTree::new();
    tree.write("secret.txt", "secret");
    let path = tree.path("secret.txt");
    fs::set_permissions(&path, Permissions::from_mode(0o000)).unwrap();

    let result = fingerprint_file(&path);

    let _ = fs::set_permissions(&path, Permissions::from_mode(0o644));
    assert_eq!(result.unwrap_err().io_kind(), Some(std::io::ErrorKind::PermissionDenied));
}
