//! Volume guard for bulk capture operations.

use std::fs;
use std::path::{Path, PathBuf};

use crate::app::walk::{raw_walker, walk_error};
use crate::domain::errors::{AbortReason, EngineError, EngineResult};
use crate::infra::config::Config;
use crate::infra::prompt::Prompter;

/// Tunables for the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPolicy {
    pub max_files: usize,
    pub protected_markers: Vec<String>,
    pub home: Option<PathBuf>,
}

impl GuardPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_files: config.guard.max_files,
            protected_markers: config.guard.protected_markers.clone(),
            home: dirs_next::home_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Abort(AbortReason),
}

impl GuardDecision {
    pub fn into_result(self) -> EngineResult<()> {
        match self {
            GuardDecision::Proceed => Ok(()),
            GuardDecision::Abort(reason) => Err(EngineError::Policy(reason)),
        }
    }
}

/// Refuses root/home and protected directories, and asks before capturing
/// directories with more files than the policy ceiling.
pub struct VolumeGuard<'a> {
    policy: GuardPolicy,
    prompter: &'a dyn Prompter,
    counter: FileCounter,
}

/// Counts the files below a directory.
pub type FileCounter = fn(&Path) -> EngineResult<usize>;

impl<'a> VolumeGuard<'a> {
    pub fn new(policy: GuardPolicy, prompter: &'a dyn Prompter) -> Self {
        Self {
            policy,
            prompter,
            counter: count_files,
        }
    }

    pub fn with_counter(mut self, counter: FileCounter) -> Self {
        self.counter = counter;
        self
    }

    pub fn check(&self, path: &Path) -> GuardDecision {
        let decision = self.decide(path);
        match &decision {
            GuardDecision::Proceed => tracing::debug!(path = %path.display(), "guard passed"),
            GuardDecision::Abort(reason) => {
                tracing::info!(path = %path.display(), %reason, "guard refused")
            }
        }
        decision
    }

    fn decide(&self, path: &Path) -> GuardDecision {
        let resolved = resolve(path);
        if resolved.parent().is_none() || self.is_home(&resolved) {
            return GuardDecision::Abort(AbortReason::RootOrHome(resolved));
        }

        let dir = if resolved.is_dir() {
            resolved.as_path()
        } else {
            resolved.parent().unwrap_or(&resolved)
        };
        if let Some(marker) = self
            .policy
            .protected_markers
            .iter()
            .find(|marker| dir.join(marker).exists())
        {
            return GuardDecision::Abort(AbortReason::Protected {
                dir: dir.to_path_buf(),
                marker: marker.clone(),
            });
        }

        if !resolved.is_dir() {
            return GuardDecision::Proceed;
        }

        let files = match (self.counter)(path) {
            Ok(files) => files,
            Err(err) => {
                return GuardDecision::Abort(AbortReason::CountFailed {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                });
            }
        };
        if files <= self.policy.max_files {
            return GuardDecision::Proceed;
        }

        let question = format!(
            "The directory '{}' contains {files} files. Proceed?",
            path.display()
        );
        match self.prompter.confirm(&question) {
            Ok(true) => GuardDecision::Proceed,
            Ok(false) => GuardDecision::Abort(AbortReason::DeclinedSize {
                path: path.to_path_buf(),
                files,
            }),
            Err(err) => {
                tracing::warn!(error = %err, "confirmation failed, treating as decline");
                GuardDecision::Abort(AbortReason::DeclinedSize {
                    path: path.to_path_buf(),
                    files,
                })
            }
        }
    }

    fn is_home(&self, resolved: &Path) -> bool {
        self.policy
            .home
            .as_deref()
            .is_some_and(|home| resolve(home) == resolved)
    }
}

fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Count every regular file below `root`, hidden ones included.
pub fn count_files(root: &Path) -> EngineResult<usize> {
    let mut count = 0;
    for result in raw_walker(root).build() {
        let entry = result.map_err(|err| walk_error(root, err))?;
        if entry.file_type().is_some_and(|ty| !ty.is_dir()) {
            count += 1;
        }
    }
    Ok(count)
}
