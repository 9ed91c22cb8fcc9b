/*!
 * Order-stable repository traversal
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::vec;

use walkdir::WalkDir;

use crate::error::{Result, SerializerError};
use crate::exclusion::ExclusionSet;
use crate::types::{Entry, EntryKind};

/// A child discovered while listing a directory
#[derive(Debug)]
struct Child {
    abs_path: PathBuf,
    kind: EntryKind,
    /// Symlinked entries are never descended into
    linked: bool,
    problem: Option<String>,
}

/// Pending children of one directory on the traversal stack
struct Frame {
    children: vec::IntoIter<Child>,
    depth: usize,
}

/// Depth-first walker yielding entries lazily in a deterministic order
///
/// Directories come before files among siblings, each group sorted by name,
/// and every directory is yielded before its children. Excluded entries are
/// never yielded and excluded directories are never entered.
///
/// Symlinked directories inside the root are listed but not entered, so
/// their contents appear once under the real directory.
pub struct Walker {
    root: PathBuf,
    exclusions: ExclusionSet,
    stack: Vec<Frame>,
}

impl Walker {
    /// Start a traversal of `root`
    pub fn new(root: &Path, exclusions: ExclusionSet) -> Result<Self> {
        let root = fs::canonicalize(root)
            .map_err(|_| SerializerError::InvalidRoot(root.to_path_buf()))?;
        if !root.is_dir() {
            return Err(SerializerError::InvalidRoot(root));
        }

        let mut walker = Self {
            root: root.clone(),
            exclusions,
            stack: Vec::new(),
        };

        let children = walker.list(&root)?;
        walker.stack.push(Frame {
            children: children.into_iter(),
            depth: 1,
        });

        Ok(walker)
    }

    /// Canonical repository root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List the non-excluded children of a directory, sorted
    fn list(&self, dir: &Path) -> Result<Vec<Child>> {
        let mut children = Vec::new();

        for item in WalkDir::new(dir).min_depth(1).max_depth(1) {
            match item {
                Ok(entry) => {
                    if let Some(child) = self.resolve(entry.path(), entry.path_is_symlink(), entry.file_type().is_dir()) {
                        children.push(child);
                    }
                }
                Err(e) => match e.path() {
                    Some(path) if path != dir => {
                        log::debug!("Failed to inspect {}: {}", path.display(), e);
                        children.push(Child {
                            abs_path: path.to_path_buf(),
                            kind: EntryKind::File,
                            linked: false,
                            problem: Some(describe(&e)),
                        });
                    }
                    _ => return Err(SerializerError::Io(e.into())),
                },
            }
        }

        children.sort_by(|a, b| {
            (a.kind != EntryKind::Directory)
                .cmp(&(b.kind != EntryKind::Directory))
                .then_with(|| a.abs_path.file_name().cmp(&b.abs_path.file_name()))
        });

        Ok(children)
    }

    /// Classify one listed path, `None` when it is excluded
    fn resolve(&self, path: &Path, is_symlink: bool, is_dir: bool) -> Option<Child> {
        if !is_symlink {
            let kind = if is_dir {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            return self.admit(path, kind).then(|| Child {
                abs_path: path.to_path_buf(),
                kind,
                linked: false,
                problem: None,
            });
        }

        let unreadable = |reason: String| Child {
            abs_path: path.to_path_buf(),
            kind: EntryKind::File,
            linked: false,
            problem: Some(reason),
        };

        let real = match fs::canonicalize(path) {
            Ok(real) => real,
            Err(e) => {
                return self
                    .admit(path, EntryKind::File)
                    .then(|| unreadable(format!("broken symlink: {}", e)));
            }
        };

        if !real.starts_with(&self.root) {
            return self
                .admit(path, EntryKind::File)
                .then(|| unreadable("symlink points outside the repository".to_string()));
        }

        let kind = if real.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        if kind == EntryKind::Directory && path.parent().is_some_and(|p| p.starts_with(&real)) {
            log::warn!(
                "Skipping {}: it links to its own ancestor {}",
                path.display(),
                real.display()
            );
            return None;
        }

        if !self.admit(path, kind) || self.target_excluded(&real, kind) {
            return None;
        }

        Some(Child {
            abs_path: path.to_path_buf(),
            kind,
            linked: true,
            problem: None,
        })
    }

    /// Whether a link target, or any directory above it inside the root, is excluded
    fn target_excluded(&self, real: &Path, kind: EntryKind) -> bool {
        let Ok(relative) = real.strip_prefix(&self.root) else {
            return true;
        };

        let mut current = self.root.clone();
        let mut components = relative.components().peekable();
        while let Some(component) = components.next() {
            current.push(component);
            let excluded = if components.peek().is_none() {
                !self.admit(&current, kind)
            } else {
                self.exclusions.excludes_dir(&current)
            };
            if excluded {
                return true;
            }
        }

        false
    }

    fn admit(&self, path: &Path, kind: EntryKind) -> bool {
        match kind {
            EntryKind::Directory => !self.exclusions.excludes_dir(path),
            EntryKind::File => !self.exclusions.excludes_file(path),
        }
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_path_buf()
    }

    /// Turn a child into an entry, descending into directories
    fn visit(&mut self, child: Child, depth: usize) -> Option<Entry> {
        let mut entry = Entry {
            path: self.relative(&child.abs_path),
            abs_path: child.abs_path,
            kind: child.kind,
            depth,
            problem: child.problem,
        };

        if entry.kind != EntryKind::Directory || entry.problem.is_some() || child.linked {
            return Some(entry);
        }

        log::debug!("Entering {}", entry.path.display());
        match self.list(&entry.abs_path) {
            Ok(children) => self.stack.push(Frame {
                children: children.into_iter(),
                depth: depth + 1,
            }),
            Err(e) => {
                log::debug!("Failed to list {}: {}", entry.path.display(), e);
                entry.problem = Some(unwrap_io_message(&e));
            }
        }

        Some(entry)
    }
}

impl Iterator for Walker {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        loop {
            let frame = self.stack.last_mut()?;
            let depth = frame.depth;
            let Some(child) = frame.children.next() else {
                self.stack.pop();
                continue;
            };

            if let Some(entry) = self.visit(child, depth) {
                return Some(entry);
            }
        }
    }
}

fn describe(err: &walkdir::Error) -> String {
    match err.io_error() {
        Some(io) => io.to_string(),
        None => err.to_string(),
    }
}

fn unwrap_io_message(err: &SerializerError) -> String {
    match err {
        SerializerError::Io(io) => io.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn names(walker: Walker) -> Vec<(String, usize)> {
        walker
            .map(|e| {
                let mut name = e.path.to_string_lossy().replace('\\', "/");
                if e.is_dir() {
                    name.push('/');
                }
                (name, e.depth)
            })
            .collect()
    }

    #[test]
    fn test_order_is_directories_first_then_names() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b_dir/inner")).unwrap();
        fs::create_dir(root.join("a_dir")).unwrap();
        File::create(root.join("z.txt")).unwrap();
        File::create(root.join("a.txt")).unwrap();
        File::create(root.join("b_dir/file.py")).unwrap();

        let walker = Walker::new(root, ExclusionSet::new()).unwrap();
        assert_eq!(
            names(walker),
            vec![
                ("a_dir/".to_string(), 1),
                ("b_dir/".to_string(), 1),
                ("b_dir/inner/".to_string(), 2),
                ("b_dir/file.py".to_string(), 2),
                ("a.txt".to_string(), 1),
                ("z.txt".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_excluded_directory_is_not_entered() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        let mut f = File::create(root.join(".git/config")).unwrap();
        writeln!(f, "[core]").unwrap();
        File::create(root.join("main.py")).unwrap();

        let walker = Walker::new(root, ExclusionSet::new()).unwrap();
        assert_eq!(names(walker), vec![("main.py".to_string(), 1)]);
    }

    #[test]
    fn test_invalid_root() {
        let result = Walker::new(Path::new("/no/such/root"), ExclusionSet::new());
        assert!(matches!(result, Err(SerializerError::InvalidRoot(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("pkg")).unwrap();
        File::create(root.join("pkg/mod.py")).unwrap();
        std::os::unix::fs::symlink(root.join("pkg"), root.join("pkg/loop")).unwrap();

        let walker = Walker::new(root, ExclusionSet::new()).unwrap();
        assert_eq!(
            names(walker),
            vec![("pkg/".to_string(), 1), ("pkg/mod.py".to_string(), 2)]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_outside_root_is_unreadable() {
        let outside = tempdir().unwrap();
        File::create(outside.path().join("secret.txt")).unwrap();
        let dir = tempdir().unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            dir.path().join("link.txt"),
        )
        .unwrap();

        let entries: Vec<Entry> = Walker::new(dir.path(), ExclusionSet::new())
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].problem.as_deref(),
            Some("symlink points outside the repository")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_is_unreadable() {
        let dir = tempdir().unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

        let entries: Vec<Entry> = Walker::new(dir.path(), ExclusionSet::new())
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::File);
        assert!(entries[0]
            .problem
            .as_deref()
            .unwrap()
            .starts_with("broken symlink"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_listed_without_descending() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("real")).unwrap();
        File::create(root.join("real/a.js")).unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("alias")).unwrap();

        let walker = Walker::new(root, ExclusionSet::new()).unwrap();
        assert_eq!(
            names(walker),
            vec![
                ("alias/".to_string(), 1),
                ("real/".to_string(), 1),
                ("real/a.js".to_string(), 2),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_excluded_directory_is_skipped() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        let mut f = File::create(root.join(".git/config")).unwrap();
        writeln!(f, "[core]").unwrap();
        File::create(root.join("main.py")).unwrap();
        std::os::unix::fs::symlink(root.join(".git"), root.join("vcs")).unwrap();
        std::os::unix::fs::symlink(root.join(".git/config"), root.join("settings")).unwrap();

        let walker = Walker::new(root, ExclusionSet::new()).unwrap();
        assert_eq!(names(walker), vec![("main.py".to_string(), 1)]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_excluded_file_is_skipped() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        File::create(root.join("debug.log")).unwrap();
        std::os::unix::fs::symlink(root.join("debug.log"), root.join("latest")).unwrap();

        let walker = Walker::new(root, ExclusionSet::new()).unwrap();
        assert!(names(walker).is_empty());
    }
}
