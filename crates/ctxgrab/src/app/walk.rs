//! Directory tree walking.

use std::io;
use std::path::{Path, PathBuf};

use ignore::{DirEntry, WalkBuilder};

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::model::SourceEntry;

/// Names starting with a dot are never listed nor descended into.
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

/// Walks a directory into an ordered [`SourceEntry`] hierarchy.
///
/// Children keep the order the directory listing produced; nothing is sorted.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeWalker;

impl TreeWalker {
    pub fn new() -> Self {
        Self
    }

    /// Walk the directory `root`. A regular file is refused.
    pub fn walk(&self, root: &Path) -> EngineResult<SourceEntry> {
        if root.is_file() {
            return Err(EngineError::NotADirectory(root.to_path_buf()));
        }
        let mut stack: Vec<SourceEntry> = Vec::new();

        for result in visible_walker(root).build() {
            let entry = result.map_err(|err| walk_error(root, err))?;
            let depth = entry.depth();
            let node = to_source_entry(&entry);

            if depth == 0 {
                stack.push(node);
                continue;
            }

            while stack.len() > depth {
                fold_top(&mut stack);
            }

            if node.is_dir {
                stack.push(node);
            } else if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
            }
        }

        while stack.len() > 1 {
            fold_top(&mut stack);
        }

        let root_entry = stack.pop().ok_or_else(|| {
            EngineError::filesystem(
                root,
                io::Error::new(io::ErrorKind::NotFound, "walk produced no root entry"),
            )
        })?;
        tracing::debug!(
            root = %root.display(),
            entries = root_entry.descendants().count() - 1,
            "walked tree"
        );
        Ok(root_entry)
    }
}

fn fold_top(stack: &mut Vec<SourceEntry>) {
    if let Some(done) = stack.pop()
        && let Some(parent) = stack.last_mut()
    {
        parent.children.push(done);
    }
}

/// Sequential walker that skips dot-prefixed entries below the root.
pub(crate) fn visible_walker(root: &Path) -> WalkBuilder {
    let mut builder = raw_walker(root);
    builder.filter_entry(|entry| {
        entry.depth() == 0 || !is_hidden_name(&entry.file_name().to_string_lossy())
    });
    builder
}

/// Sequential walker with every ignore-file filter disabled.
pub(crate) fn raw_walker(root: &Path) -> WalkBuilder {
    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false).follow_links(false);
    builder
}

fn to_source_entry(entry: &DirEntry) -> SourceEntry {
    let path = entry.path().to_path_buf();
    let name = entry
        .file_name()
        .to_str()
        .map(str::to_owned)
        .unwrap_or_else(|| path.display().to_string());
    let is_dir = entry.file_type().is_some_and(|ty| ty.is_dir());
    if is_dir {
        SourceEntry::dir(path, name)
    } else {
        SourceEntry::file(path, name)
    }
}

pub(crate) fn walk_error(root: &Path, err: ignore::Error) -> EngineError {
    let path = error_path(&err).unwrap_or_else(|| root.to_path_buf());
    let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::other("directory walk failed"));
    EngineError::filesystem(path, source)
}

fn error_path(err: &ignore::Error) -> Option<PathBuf> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        _ => None,
    }
}

/// Depth-first search for the first visible file called `file_name`.
pub fn find_file_by_name(root: &Path, file_name: &str) -> EngineResult<Option<PathBuf>> {
    for result in visible_walker(root).build() {
        let entry = result.map_err(|err| walk_error(root, err))?;
        let is_file = entry.file_type().is_some_and(|ty| !ty.is_dir());
        if is_file && entry.file_name() == file_name {
            return Ok(Some(entry.into_path()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;

    fn names(entry: &SourceEntry) -> Vec<String> {
        let mut names: Vec<_> = entry.children.iter().map(|c| c.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn builds_nested_hierarchy() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("pkg/sub"))?;
        fs::write(root.join("pkg/a.go"), "package pkg")?;
        fs::write(root.join("pkg/sub/b.go"), "package sub")?;
        fs::write(root.join("main.go"), "package main")?;

        let tree = TreeWalker::new().walk(root)?;
        assert!(tree.is_dir);
        assert_eq!(names(&tree), vec!["main.go", "pkg"]);

        let pkg = tree
            .children
            .iter()
            .find(|c| c.name == "pkg")
            .expect("pkg listed");
        assert!(pkg.is_dir);
        assert_eq!(names(pkg), vec!["a.go", "sub"]);

        let sub = pkg
            .children
            .iter()
            .find(|c| c.name == "sub")
            .expect("sub listed");
        assert_eq!(names(sub), vec!["b.go"]);
        assert_eq!(sub.children[0].path, root.join("pkg/sub/b.go"));
        Ok(())
    }

    #[test]
    fn hidden_entries_and_their_subtrees_are_excluded() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join(".git/objects"))?;
        fs::write(root.join(".git/objects/blob.go"), "package x")?;
        fs::write(root.join(".env"), "SECRET=1")?;
        fs::write(root.join("visible.go"), "package v")?;

        let tree = TreeWalker::new().walk(root)?;
        let all: Vec<_> = tree.descendants().skip(1).map(|e| e.name.clone()).collect();
        assert_eq!(all, vec!["visible.go"]);
        Ok(())
    }

    #[test]
    fn hidden_root_is_still_walked() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().join(".workspace");
        fs::create_dir_all(&root)?;
        fs::write(root.join("a.go"), "package a")?;

        let tree = TreeWalker::new().walk(&root)?;
        assert_eq!(names(&tree), vec!["a.go"]);
        Ok(())
    }

    #[test]
    fn missing_root_is_a_filesystem_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = TreeWalker::new().walk(&temp.path().join("absent"));
        assert!(matches!(result, Err(EngineError::Filesystem { .. })));
    }

    #[test]
    fn file_root_is_refused() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("main.go");
        fs::write(&file, "package main")?;
        match TreeWalker::new().walk(&file) {
            Err(EngineError::NotADirectory(path)) => assert_eq!(path, file),
            other => panic!("expected NotADirectory, got {other:?}"),
        }
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_is_a_filesystem_error() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir()?;
        let locked = temp.path().join("locked");
        fs::create_dir_all(&locked)?;
        fs::write(locked.join("a.go"), "package a")?;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;
        if fs::read_dir(&locked).is_ok() {
            // Privileged users read through mode bits.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;
            return Ok(());
        }

        let result = TreeWalker::new().walk(temp.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;
        match result {
            Err(EngineError::Filesystem { path, .. }) => assert_eq!(path, locked),
            other => panic!("expected Filesystem error, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn finds_file_by_name_skipping_hidden_dirs() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join(".cache"))?;
        fs::create_dir_all(root.join("src/deep"))?;
        fs::write(root.join(".cache/target.go"), "")?;
        fs::write(root.join("src/deep/target.go"), "")?;

        let found = find_file_by_name(root, "target.go")?;
        assert_eq!(found, Some(root.join("src/deep/target.go")));
        assert_eq!(find_file_by_name(root, "nope.go")?, None);
        Ok(())
    }
}
