//! Reading files into transport-ready payloads.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::app::walk::{visible_walker, walk_error};
use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::model::{GrabEntry, GrabPayload};

/// All-or-nothing reader for an explicit list of files.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileCollector;

impl FileCollector {
    pub fn new() -> Self {
        Self
    }

    /// Read every path in order. The first missing path or directory aborts
    /// the batch and nothing is returned.
    pub fn collect<P: AsRef<Path>>(&self, paths: &[P]) -> EngineResult<GrabPayload> {
        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            entries.push(read_entry(path.as_ref())?);
        }
        tracing::debug!(files = entries.len(), "collected files");
        Ok(GrabPayload::new(entries))
    }
}

fn read_entry(path: &Path) -> EngineResult<GrabEntry> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(EngineError::NotFound(path.to_path_buf()));
        }
        Err(err) => return Err(EngineError::filesystem(path, err)),
    };
    if metadata.is_dir() {
        return Err(EngineError::NotAFile(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|err| EngineError::filesystem(path, err))?;
    Ok(GrabEntry {
        path: path.to_path_buf(),
        content: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

/// Gathers the code files of a directory, selected by file-name globs.
#[derive(Debug, Clone)]
pub struct DirectoryGatherer {
    include: GlobSet,
}

impl DirectoryGatherer {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> EngineResult<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = Glob::new(pattern).map_err(|err| EngineError::Pattern {
                pattern: pattern.to_owned(),
                message: err.to_string(),
            })?;
            builder.add(glob);
        }
        let include = builder.build().map_err(|err| EngineError::Pattern {
            pattern: String::new(),
            message: err.to_string(),
        })?;
        Ok(Self { include })
    }

    pub fn is_code_file(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| self.include.is_match(Path::new(name)))
    }

    /// Code files under `root` in walk order. Unreadable files are skipped
    /// with a warning; a directory without any code file is an error.
    pub fn gather(&self, root: &Path) -> EngineResult<GrabPayload> {
        let mut entries = Vec::new();
        for result in visible_walker(root).build() {
            let entry = result.map_err(|err| walk_error(root, err))?;
            let is_file = entry.file_type().is_some_and(|ty| ty.is_file());
            if !is_file || !self.is_code_file(entry.path()) {
                continue;
            }
            match fs::read(entry.path()) {
                Ok(bytes) => entries.push(GrabEntry {
                    path: entry.path().to_path_buf(),
                    content: String::from_utf8_lossy(&bytes).into_owned(),
                }),
                Err(err) => {
                    tracing::warn!(path = %entry.path().display(), error = %err, "skipping unreadable file")
                }
            }
        }
        if entries.is_empty() {
            return Err(EngineError::NoCodeFiles(root.to_path_buf()));
        }
        tracing::debug!(root = %root.display(), files = entries.len(), "gathered directory");
        Ok(GrabPayload::new(entries))
    }
}

/// Join per-folder payloads with the folder separator.
pub fn join_folders(payloads: &[GrabPayload]) -> String {
    payloads
        .iter()
        .map(GrabPayload::render)
        .collect::<Vec<_>>()
        .join(GrabPayload::FOLDER_SEPARATOR)
}

/// Paths given on the command line, split by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrabTargets {
    Files(Vec<PathBuf>),
    Directories(Vec<PathBuf>),
}

impl GrabTargets {
    /// Every path must exist, and all must be files or all directories.
    pub fn classify(paths: Vec<PathBuf>) -> EngineResult<Self> {
        let mut dirs = 0;
        for path in &paths {
            let metadata =
                fs::metadata(path).map_err(|_| EngineError::NotFound(path.clone()))?;
            if metadata.is_dir() {
                dirs += 1;
            }
        }
        match dirs {
            0 => Ok(GrabTargets::Files(paths)),
            n if n == paths.len() => Ok(GrabTargets::Directories(paths)),
            _ => Err(EngineError::MixedTargets),
        }
    }
}
