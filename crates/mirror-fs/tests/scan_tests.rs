//! Tree scanning over real directory layouts.

use mirror_fs::{
    Error, RelativePath, ScanOptions, SkipReason, SymlinkPolicy, TreeScanner, fingerprint_bytes,
};
use mirror_test_utils::TestTree;
use pretty_assertions::assert_eq;

fn rel(path: &str) -> RelativePath {
    RelativePath::new(path).unwrap()
}

fn scanner(symlinks: SymlinkPolicy) -> TreeScanner {
    TreeScanner::new(ScanOptions {
        symlinks,
        ..ScanOptions::default()
    })
}

#[test]
fn scan_records_nested_files_with_forward_slashes() {
    let tree = TestTree::new();
    tree.write("a.txt", "X");
    tree.write("sub/b.txt", "Y");
    tree.write("sub/deeper/c.txt", "Z");
    tree.mkdir("empty");

    let scan = TreeScanner::default().scan(tree.root()).unwrap();
    let paths: Vec<&str> = scan.snapshot.paths().map(RelativePath::as_str).collect();

    assert_eq!(paths, vec!["a.txt", "sub/b.txt", "sub/deeper/c.txt"]);
    assert_eq!(scan.snapshot.get(&rel("sub/b.txt")), Some(&fingerprint_bytes(b"Y")));
}

#[test]
fn rescanning_unchanged_tree_yields_equal_snapshot() {
    let tree = TestTree::new();
    tree.write("a.txt", "X");
    tree.write("sub/b.txt", "Y");

    let first = TreeScanner::default().scan(tree.root()).unwrap();
    let second = TreeScanner::default().scan(tree.root()).unwrap();
    assert_eq!(first.snapshot, second.snapshot);
}

#[test]
fn scan_of_file_root_is_empty() {
    // WalkDir yields only the root itself for a file, which min_depth drops
    let tree = TestTree::new();
    tree.write("plain.txt", "X");

    let scan = TreeScanner::default().scan(&tree.path("plain.txt")).unwrap();
    assert!(scan.snapshot.is_empty());
}

#[test]
fn scan_of_missing_root_fails() {
    let tree = TestTree::new();
    let result = TreeScanner::default().scan(&tree.path("missing"));
    assert!(matches!(result, Err(Error::Io { .. })));
}

#[cfg(unix)]
mod unix_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::{self, Permissions};
    use std::os::unix::fs::{PermissionsExt, symlink};

    #[test]
    fn follow_fingerprints_link_target_under_link_path() {
        let tree = TestTree::new();
        tree.write("real.txt", "target");
        symlink(tree.path("real.txt"), tree.path("link.txt")).unwrap();

        let scan = scanner(SymlinkPolicy::Follow).scan(tree.root()).unwrap();

        assert_eq!(scan.snapshot.len(), 2);
        assert_eq!(
            scan.snapshot.get(&rel("link.txt")),
            Some(&fingerprint_bytes(b"target"))
        );
    }

    #[test]
    fn follow_never_descends_into_linked_directories() {
        let outside = TestTree::new();
        outside.write("inner.txt", "I");
        let tree = TestTree::new();
        tree.write("own.txt", "O");
        symlink(outside.root(), tree.path("linked")).unwrap();

        let scan = scanner(SymlinkPolicy::Follow).scan(tree.root()).unwrap();

        let paths: Vec<&str> = scan.snapshot.paths().map(RelativePath::as_str).collect();
        assert_eq!(paths, vec!["own.txt"]);
        assert_eq!(scan.skipped.len(), 1);
        assert_eq!(scan.skipped[0].reason, SkipReason::DirectorySymlink);
        assert_eq!(scan.skipped[0].path, tree.path("linked"));
    }

    #[test]
    fn skip_policy_ignores_links() {
        let tree = TestTree::new();
        tree.write("real.txt", "target");
        symlink(tree.path("real.txt"), tree.path("link.txt")).unwrap();

        let scan = scanner(SymlinkPolicy::Skip).scan(tree.root()).unwrap();

        let paths: Vec<&str> = scan.snapshot.paths().map(RelativePath::as_str).collect();
        assert_eq!(paths, vec!["real.txt"]);
        assert!(scan.skipped.is_empty());
    }

    #[test]
    fn link_to_ancestor_does_not_loop() {
        let tree = TestTree::new();
        tree.write("dir/file.txt", "F");
        symlink(tree.path("dir"), tree.path("dir/loop")).unwrap();

        let scan = scanner(SymlinkPolicy::Follow).scan(tree.root()).unwrap();

        assert_eq!(scan.snapshot.len(), 1);
        assert!(scan.snapshot.contains(&rel("dir/file.txt")));
        assert_eq!(scan.skipped.len(), 1);
        assert_eq!(scan.skipped[0].reason, SkipReason::DirectorySymlink);
    }

    #[test]
    fn replica_scan_records_links_without_following() {
        let outside = TestTree::new();
        outside.write("precious.txt", "P");
        let tree = TestTree::new();
        tree.write("real.txt", "R");
        symlink(outside.root(), tree.path("dir-link")).unwrap();
        symlink(tree.path("real.txt"), tree.path("file-link")).unwrap();
        symlink(tree.path("gone.txt"), tree.path("dangling")).unwrap();

        let scan = TreeScanner::default().scan_replica(tree.root()).unwrap();

        let files: Vec<&str> = scan.snapshot.paths().map(RelativePath::as_str).collect();
        let links: Vec<&str> = scan.snapshot.links().map(RelativePath::as_str).collect();
        assert_eq!(files, vec!["real.txt"]);
        assert_eq!(links, vec!["dangling", "dir-link", "file-link"]);
        assert!(scan.snapshot.is_link(&rel("dir-link")));
        assert!(scan.skipped.is_empty());
    }

    #[test]
    fn dangling_symlink_is_skipped() {
        let tree = TestTree::new();
        tree.write("kept.txt", "K");
        symlink(tree.path("vanished.txt"), tree.path("dangling.txt")).unwrap();

        let scan = scanner(SymlinkPolicy::Follow).scan(tree.root()).unwrap();

        assert_eq!(scan.snapshot.len(), 1);
        assert_eq!(scan.skipped.len(), 1);
        assert_eq!(scan.skipped[0].reason, SkipReason::DanglingSymlink);
        assert_eq!(scan.skipped[0].path, tree.path("dangling.txt"));
    }

    #[test]
    fn self_referencing_link_is_skipped_as_dangling() {
        let tree = TestTree::new();
        tree.write("kept.txt", "K");
        symlink(tree.path("self"), tree.path("self")).unwrap();

        let scan = scanner(SymlinkPolicy::Follow).scan(tree.root()).unwrap();

        assert_eq!(scan.snapshot.len(), 1);
        assert_eq!(scan.skipped.len(), 1);
        assert_eq!(scan.skipped[0].reason, SkipReason::DanglingSymlink);
    }

    #[test]
    fn unlistable_directory_fails_whole_scan() {
        if mirror_test_utils::is_root() {
            eprintln!("Skipping test: running as root bypasses permission checks");
            return;
        }

        let tree = TestTree::new();
        tree.write("visible.txt", "V");
        tree.write("locked/hidden.txt", "H");
        let locked = tree.path("locked");
        fs::set_permissions(&locked, Permissions::from_mode(0o000)).unwrap();

        let result = TreeScanner::default().scan(tree.root());

        let _ = fs::set_permissions(&locked, Permissions::from_mode(0o755));
        assert!(
            matches!(result, Err(Error::Io { .. })),
            "a partial snapshot must never be returned"
        );
    }
}
