//! Sequential pre-order directory walker.
//!
//! The walker is the "eyes" of the scanner: it yields every entry below a root
//! exactly once, parents before their descendants, without following symbolic
//! links. Each directory is read in one go and its children are kept as plain
//! `(path, kind)` records, so no directory handle stays open while the caller
//! works on an entry.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::errors::{Result, TlError};

/// Filesystem type of a walked entry, as seen without following links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

impl EntryKind {
    /// Only real directories count; a symlink to a directory is a `Symlink`.
    #[must_use]
    pub const fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Lowercase word used in human output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Symlink => "symlink",
        }
    }

    /// Classify a `FileType` obtained without following links.
    #[must_use]
    pub fn from_file_type(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else {
            // Sockets, FIFOs and device nodes are named like files.
            Self::File
        }
    }
}

/// A single entry discovered during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// The root as given, joined with every component down to this entry.
    pub path: PathBuf,
    pub kind: EntryKind,
    /// 1 for direct children of the root.
    pub depth: usize,
}

/// Lazy pre-order walk below one root directory.
///
/// Unreadable directories surface as one `TlError::ScanIo` item right after the
/// directory's own entry; the walk then carries on with the remaining siblings.
pub struct TreeWalker {
    /// Children still to be yielded, in reverse order so `pop` gives the next one.
    stack: Vec<WalkEntry>,
    /// Directory whose children are read on the next call.
    expand: Option<(PathBuf, usize)>,
    pending_error: Option<TlError>,
}

impl TreeWalker {
    /// Validate `root` and prepare a walk below it.
    ///
    /// The root must exist and be a directory (a symlink to a directory is
    /// accepted here); otherwise `TlError::InvalidRoot` is returned before any
    /// entry is read.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let meta = fs::metadata(root).map_err(|err| TlError::InvalidRoot {
            path: root.to_path_buf(),
            details: err.to_string(),
        })?;
        if !meta.is_dir() {
            return Err(TlError::InvalidRoot {
                path: root.to_path_buf(),
                details: "not a directory".to_string(),
            });
        }

        Ok(Self {
            stack: Vec::new(),
            expand: Some((root.to_path_buf(), 0)),
            pending_error: None,
        })
    }

    fn expand_directory(&mut self, dir: &Path, depth: usize) {
        let reader = match fs::read_dir(dir) {
            Ok(reader) => reader,
            Err(source) => {
                self.pending_error = Some(TlError::ScanIo {
                    path: dir.to_path_buf(),
                    source,
                });
                return;
            }
        };

        let mut children = Vec::new();
        for entry_result in reader {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(source) => {
                    // Keep what was listed so far; the rest of this directory is skipped.
                    self.pending_error = Some(TlError::ScanIo {
                        path: dir.to_path_buf(),
                        source,
                    });
                    break;
                }
            };
            let path = entry.path();
            // file_type() is usually free from the dirent; fall back to lstat.
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(_) => match fs::symlink_metadata(&path) {
                    Ok(meta) => meta.file_type(),
                    // Vanished between listing and classification.
                    Err(_) => continue,
                },
            };
            children.push(WalkEntry {
                path,
                kind: EntryKind::from_file_type(file_type),
                depth: depth + 1,
            });
        }

        self.stack.extend(children.into_iter().rev());
    }
}

impl Iterator for TreeWalker {
    type Item = Result<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending_error.take() {
            return Some(Err(err));
        }

        if let Some((dir, depth)) = self.expand.take() {
            self.expand_directory(&dir, depth);
            if let Some(err) = self.pending_error.take() {
                return Some(Err(err));
            }
        }

        let entry = self.stack.pop()?;
        if entry.kind.is_dir() {
            self.expand = Some((entry.path.clone(), entry.depth));
        }
        Some(Ok(entry))
    }
}

// ──────────────────── tests ────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn walk_all(root: &Path) -> Vec<WalkEntry> {
        TreeWalker::new(root)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn walks_simple_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/file.txt"), "data").unwrap();
        fs::write(root.join("top.txt"), "data").unwrap();

        let entries = walk_all(root);
        let paths: HashSet<PathBuf> = entries.iter().map(|e| e.path.clone()).collect();

        assert_eq!(entries.len(), 4);
        assert!(paths.contains(&root.join("a")));
        assert!(paths.contains(&root.join("a/b")));
        assert!(paths.contains(&root.join("a/b/file.txt")));
        assert!(paths.contains(&root.join("top.txt")));
        assert!(!paths.contains(root), "the root itself is not an entry");
    }

    #[test]
    fn parents_come_before_descendants() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("x/y/z")).unwrap();
        fs::write(root.join("x/y/z/leaf"), "").unwrap();
        fs::create_dir(root.join("w")).unwrap();

        let entries = walk_all(root);
        for (index, entry) in entries.iter().enumerate() {
            if let Some(parent) = entry.path.parent()
                && parent != root
            {
                let parent_index = entries
                    .iter()
                    .position(|e| e.path == parent)
                    .expect("parent must be walked");
                assert!(parent_index < index, "{parent:?} after {:?}", entry.path);
            }
        }
    }

    #[test]
    fn records_depth_and_kind() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir(root.join("dir")).unwrap();
        fs::write(root.join("dir/file"), "").unwrap();

        let entries = walk_all(root);
        let dir = entries.iter().find(|e| e.path == root.join("dir")).unwrap();
        let file = entries
            .iter()
            .find(|e| e.path == root.join("dir/file"))
            .unwrap();
        assert_eq!((dir.kind, dir.depth), (EntryKind::Directory, 1));
        assert_eq!((file.kind, file.depth), (EntryKind::File, 2));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_reported_but_not_followed() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir(root.join("real")).unwrap();
        fs::write(root.join("real/inside"), "").unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("link")).unwrap();

        let entries = walk_all(root);
        let link = entries.iter().find(|e| e.path == root.join("link")).unwrap();
        assert_eq!(link.kind, EntryKind::Symlink);
        assert!(!link.kind.is_dir());
        assert!(
            !entries.iter().any(|e| e.path.starts_with(root.join("link/"))
                && e.path != root.join("link")),
            "walker must not descend through the link"
        );
    }

    #[cfg(unix)]
    #[test]
    fn self_referencing_link_does_not_loop() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir(root.join("loop")).unwrap();
        std::os::unix::fs::symlink("..", root.join("loop/up")).unwrap();

        let entries = walk_all(root);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn handles_empty_directory() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(walk_all(tmp.path()).is_empty());
    }

    #[test]
    fn nonexistent_root_is_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing");
        let err = TreeWalker::new(&missing).err().expect("must fail");
        assert_eq!(err.code(), "TL-2001");
    }

    #[test]
    fn file_root_is_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain");
        fs::write(&file, "").unwrap();
        let err = TreeWalker::new(&file).err().expect("must fail");
        assert!(matches!(err, TlError::InvalidRoot { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_yields_error_and_walk_continues() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let locked = root.join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden"), "").unwrap();
        fs::write(root.join("visible"), "").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root bypasses permission bits; nothing to observe in that case.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let items: Vec<Result<WalkEntry>> = TreeWalker::new(root).unwrap().collect();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let errors: Vec<&TlError> = items.iter().filter_map(|i| i.as_ref().err()).collect();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], TlError::ScanIo { path, .. } if path == &locked));

        let paths: Vec<&PathBuf> = items
            .iter()
            .filter_map(|i| i.as_ref().ok().map(|e| &e.path))
            .collect();
        assert!(paths.contains(&&locked));
        assert!(paths.contains(&&root.join("visible")));
        assert!(!paths.contains(&&locked.join("hidden")));
    }
}
