//! # Snapshot Store
//!
//! Content-addressed archive of pre-render repository states, kept under
//! a per-user cache root. An entry is named
//! `<repo-name>-<hash-of-vcs-dir>`; archiving the same content twice
//! replaces the entry rather than duplicating it (archives are not
//! versioned beyond one level).
//!
//! The scratch working copy is *moved* into the archive before the
//! rendering engine runs; the version-control directory is later copied
//! back out of the archive and spliced into the rendered tree, which is
//! what guarantees history survives regeneration.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::workspace::{copy_dir, move_dir};

/// On-disk archive of pre-render repository snapshots.
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The per-user default cache root for this tool.
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".retemplate-cache"))
            .join("retemplate")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Archive location for a repository with the given content address.
    pub fn entry_path(&self, repo_name: &str, vcs_hash: &str) -> PathBuf {
        self.root.join(format!("{repo_name}-{vcs_hash}"))
    }

    /// Move `scratch_repo` into the archive at `entry`, replacing any
    /// prior snapshot with the same content address.
    pub fn archive(&self, scratch_repo: &Path, entry: &Path) -> Result<()> {
        if entry.is_dir() {
            fs::remove_dir_all(entry)?;
        }
        fs::create_dir_all(&self.root)?;
        move_dir(scratch_repo, entry)?;
        Ok(())
    }

    /// Copy the archived version-control directory back out into a
    /// rendered tree.
    pub fn restore_vcs_dir(&self, entry: &Path, rendered_repo: &Path) -> Result<()> {
        let archived_git = entry.join(".git");
        if !archived_git.is_dir() {
            return Err(Error::Snapshot {
                message: format!("no version-control directory in {}", entry.display()),
            });
        }
        copy_dir(&archived_git, &rendered_repo.join(".git"))
    }

    /// Delete every archived snapshot.
    ///
    /// Returns `false` when there was no cache directory to clean.
    pub fn gc(&self) -> Result<bool> {
        if !self.root.is_dir() {
            return Ok(false);
        }
        for child in fs::read_dir(&self.root)? {
            let path = child?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        Ok(true)
    }
}

/// Content hash of a directory tree: sha256 over the sorted relative
/// paths and file contents.
pub fn dir_hash(path: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(path)
            .expect("walkdir yields children of path");
        hasher.update(relative.to_string_lossy().as_bytes());
        hasher.update(fs::read(entry.path())?);
    }

    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    Ok(hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_tree(root: &Path, files: &[(&str, &str)]) {
        for (rel, content) in files {
            let path = root.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
    }

    #[test]
    fn test_dir_hash_deterministic() {
        let dir = TempDir::new().unwrap();
        make_tree(dir.path(), &[("a.txt", "1"), ("sub/b.txt", "2")]);

        let first = dir_hash(dir.path()).unwrap();
        let second = dir_hash(dir.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_dir_hash_sensitive_to_content() {
        let dir = TempDir::new().unwrap();
        make_tree(dir.path(), &[("a.txt", "1")]);
        let before = dir_hash(dir.path()).unwrap();

        fs::write(dir.path().join("a.txt"), "changed").unwrap();
        let after = dir_hash(dir.path()).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_dir_hash_sensitive_to_paths() {
        let one = TempDir::new().unwrap();
        let two = TempDir::new().unwrap();
        make_tree(one.path(), &[("a.txt", "same")]);
        make_tree(two.path(), &[("b.txt", "same")]);
        assert_ne!(dir_hash(one.path()).unwrap(), dir_hash(two.path()).unwrap());
    }

    #[test]
    fn test_entry_path_naming() {
        let store = SnapshotStore::new(PathBuf::from("/cache"));
        assert_eq!(
            store.entry_path("proj", "abc123"),
            PathBuf::from("/cache/proj-abc123")
        );
    }

    #[test]
    fn test_archive_moves_and_replaces() {
        let cache = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let store = SnapshotStore::new(cache.path().to_path_buf());

        let copy1 = scratch.path().join("proj");
        make_tree(&copy1, &[("old.txt", "first")]);
        let entry = store.entry_path("proj", "h1");
        store.archive(&copy1, &entry).unwrap();

        assert!(!copy1.exists(), "archive must move, not copy");
        assert!(entry.join("old.txt").is_file());

        // Same content address again: replaced, not duplicated or merged
        let copy2 = scratch.path().join("proj");
        make_tree(&copy2, &[("new.txt", "second")]);
        store.archive(&copy2, &entry).unwrap();

        assert!(entry.join("new.txt").is_file());
        assert!(!entry.join("old.txt").exists());
        assert_eq!(fs::read_dir(cache.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_restore_vcs_dir() {
        let cache = TempDir::new().unwrap();
        let store = SnapshotStore::new(cache.path().to_path_buf());
        let entry = store.entry_path("proj", "h1");
        make_tree(&entry, &[(".git/HEAD", "ref: refs/heads/main"), ("f", "x")]);

        let rendered = TempDir::new().unwrap();
        store.restore_vcs_dir(&entry, rendered.path()).unwrap();
        assert_eq!(
            fs::read_to_string(rendered.path().join(".git/HEAD")).unwrap(),
            "ref: refs/heads/main"
        );
    }

    #[test]
    fn test_restore_vcs_dir_missing_archive() {
        let cache = TempDir::new().unwrap();
        let store = SnapshotStore::new(cache.path().to_path_buf());
        let rendered = TempDir::new().unwrap();
        let err = store
            .restore_vcs_dir(&cache.path().join("proj-h1"), rendered.path())
            .unwrap_err();
        assert!(matches!(err, Error::Snapshot { .. }));
    }

    #[test]
    fn test_gc_removes_all_entries() {
        let cache = TempDir::new().unwrap();
        let store = SnapshotStore::new(cache.path().to_path_buf());
        make_tree(&cache.path().join("proj-h1"), &[("f", "x")]);
        make_tree(&cache.path().join("other-h2"), &[("g", "y")]);

        assert!(store.gc().unwrap());
        assert_eq!(fs::read_dir(cache.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_gc_without_cache_dir() {
        let cache = TempDir::new().unwrap();
        let store = SnapshotStore::new(cache.path().join("nonexistent"));
        assert!(!store.gc().unwrap());
    }
}
