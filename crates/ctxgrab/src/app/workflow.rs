//! Command workflows composing the engine components.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::app::assemble::{ContextAssembler, Task, parse_response, response_schema};
use crate::app::collect::{DirectoryGatherer, FileCollector, GrabTargets, join_folders};
use crate::app::extract::{self, ExtractMode, SymbolIndex};
use crate::app::guard::{GuardDecision, GuardPolicy, VolumeGuard};
use crate::app::render::{self, RenderStyle};
use crate::app::walk::{TreeWalker, find_file_by_name};
use crate::domain::errors::EngineError;
use crate::domain::model::{ContextResponse, GrabPayload, ResponseKind, SourceEntry};
use crate::infra::config::Config;
use crate::infra::git;
use crate::infra::prompt::Prompter;
use crate::infra::service::{ReasoningService, ServiceRequest};
use crate::infra::staging::StagingArea;

/// Inputs of the smartgrab round trip that may come from flags.
#[derive(Debug, Clone, Default)]
pub struct SmartGrabOptions {
    pub feature: Option<String>,
    pub description: Option<String>,
    /// Parse the existing reply instead of calling the service.
    pub reuse_output: bool,
}

/// Result of applying a code bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Written(PathBuf),
    NoScripts,
}

pub struct Workflow<'a> {
    config: &'a Config,
    prompter: &'a dyn Prompter,
    base: PathBuf,
}

impl<'a> Workflow<'a> {
    pub fn new(config: &'a Config, prompter: &'a dyn Prompter) -> Self {
        Self {
            config,
            prompter,
            base: PathBuf::from("."),
        }
    }

    /// Directory used as the default target and for file-name searches.
    pub fn in_dir(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = base.into();
        self
    }

    fn guard(&self) -> VolumeGuard<'_> {
        VolumeGuard::new(GuardPolicy::from_config(self.config), self.prompter)
    }

    fn walk(&self, root: &Path) -> Result<SourceEntry> {
        if !root.exists() {
            return Err(EngineError::NotFound(root.to_path_buf()).into());
        }
        Ok(TreeWalker::new().walk(root)?)
    }

    /// Directory structure only.
    pub fn tree(&self, root: &Path, style: RenderStyle) -> Result<String> {
        let tree = self.walk(root)?;
        Ok(render::render(&tree, &SymbolIndex::new(), style))
    }

    /// Directory structure with symbol sub-lines under every Go file.
    pub fn tree_with_symbols(
        &self,
        root: &Path,
        mode: ExtractMode,
        style: RenderStyle,
    ) -> Result<String> {
        let tree = self.walk(root)?;
        let extractions = extract::extract_tree(mode.extractor().as_ref(), &tree)?;
        Ok(render::render(&tree, &extract::index(extractions), style))
    }

    /// `File:` / `Package:` listing of every Go file.
    pub fn summary(&self, root: &Path) -> Result<String> {
        let tree = self.walk(root)?;
        let extractions = extract::extract_tree(ExtractMode::Syntactic.extractor().as_ref(), &tree)?;
        Ok(render::render_listing(&extractions))
    }

    /// Exported functions with their doc comments.
    pub fn public_catalog(&self, root: &Path) -> Result<String> {
        let tree = self.walk(root)?;
        let extractions = extract::extract_tree(ExtractMode::Lexical.extractor().as_ref(), &tree)?;
        Ok(render::render_public_catalog(&extractions))
    }

    /// Read files or directories into one payload text.
    pub fn grab(&self, paths: Vec<PathBuf>) -> Result<String> {
        match paths.len() {
            0 => self.grab_one(&self.base),
            1 => self.grab_one(&paths[0]),
            _ => match GrabTargets::classify(paths)? {
                GrabTargets::Files(files) => {
                    for file in &files {
                        self.guard().check(file).into_result()?;
                    }
                    Ok(FileCollector::new().collect(&files)?.render())
                }
                GrabTargets::Directories(dirs) => self.grab_folders(&dirs),
            },
        }
    }

    fn grab_one(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            let name = path.to_string_lossy();
            tracing::info!(%name, "searching for file by name");
            let found = find_file_by_name(&self.base, &name)?
                .ok_or_else(|| EngineError::NotFound(path.to_path_buf()))?;
            return Ok(FileCollector::new().collect(&[found])?.render());
        }

        self.guard().check(path).into_result()?;
        let payload = if path.is_dir() {
            self.gatherer()?.gather(path)?
        } else {
            FileCollector::new().collect(&[path])?
        };
        Ok(payload.render())
    }

    fn grab_folders(&self, dirs: &[PathBuf]) -> Result<String> {
        let gatherer = self.gatherer()?;
        let mut payloads = Vec::new();
        for dir in dirs {
            if let GuardDecision::Abort(reason) = self.guard().check(dir) {
                tracing::warn!(dir = %dir.display(), %reason, "skipping folder");
                continue;
            }
            match gatherer.gather(dir) {
                Ok(payload) => payloads.push(payload),
                Err(EngineError::NoCodeFiles(dir)) => {
                    tracing::warn!(dir = %dir.display(), "skipping folder without code files")
                }
                Err(err) => return Err(err.into()),
            }
        }
        if payloads.is_empty() {
            bail!("no folders were grabbed");
        }
        Ok(join_folders(&payloads))
    }

    fn gatherer(&self) -> Result<DirectoryGatherer> {
        Ok(DirectoryGatherer::new(&self.config.grab.include)?)
    }

    /// Ask the reasoning service which files a feature needs and collect them.
    pub fn smartgrab(
        &self,
        root: &Path,
        options: SmartGrabOptions,
        service: &dyn ReasoningService,
        staging: &StagingArea,
    ) -> Result<GrabPayload> {
        self.guard().check(root).into_result()?;

        if options.reuse_output {
            tracing::info!(path = %staging.output_path().display(), "reusing staged reply");
        } else {
            let feature = match options.feature {
                Some(feature) => feature,
                None => git::feature_branch(root)?,
            };
            let description = match options.description {
                Some(description) => description,
                None => self
                    .prompter
                    .read_line("Please enter a detailed feature description")?,
            };
            let summary =
                self.tree_with_symbols(root, ExtractMode::Syntactic, RenderStyle::Plain)?;

            let kind = ResponseKind::FileSelection;
            let task = Task {
                feature: &feature,
                description: &description,
            };
            let request = ContextAssembler::new()?.build_request(kind, &task, &summary)?;
            staging.write_input(&request.prompt)?;

            let reply = service.complete(&ServiceRequest::new(
                &request,
                &self.config.service.model,
                response_schema(kind)?,
            ))?;
            staging.write_output(&reply)?;
        }

        let raw = staging.read_output()?;
        let ContextResponse::FileSelection(selection) =
            parse_response(&raw, ResponseKind::FileSelection)?
        else {
            bail!("reply is not a file selection");
        };
        tracing::info!(files = ?selection.files, "files selected");
        Ok(FileCollector::new().collect(&selection.files)?)
    }

    /// Stage an implementation prompt built from the lexical symbol tree.
    pub fn prepare_implementation(&self, root: &Path, staging: &StagingArea) -> Result<()> {
        let summary = self.tree_with_symbols(root, ExtractMode::Lexical, RenderStyle::Plain)?;
        let request = ContextAssembler::new()?.build_request(
            ResponseKind::CodeBundle,
            &Task::default(),
            &summary,
        )?;
        staging.write_input(&request.prompt)
    }

    /// Write the first script of the staged code bundle to its file name.
    pub fn apply_implementation(&self, staging: &StagingArea) -> Result<Applied> {
        let raw = staging.read_output()?;
        let ContextResponse::CodeBundle(bundle) = parse_response(&raw, ResponseKind::CodeBundle)?
        else {
            bail!("reply is not a code bundle");
        };
        let Some(script) = bundle.scripts.first() else {
            return Ok(Applied::NoScripts);
        };
        let target = self.base.join(contained_path(&bundle.filename)?);
        fs::write(&target, script)
            .with_context(|| format!("failed to write {}", target.display()))?;
        Ok(Applied::Written(target))
    }
}

/// Reply file names must stay below the working directory.
fn contained_path(name: &str) -> Result<&Path> {
    let path = Path::new(name);
    let escapes = path
        .components()
        .any(|part| !matches!(part, Component::Normal(_) | Component::CurDir));
    if escapes || name.is_empty() {
        return Err(EngineError::EscapingPath(path.to_path_buf()).into());
    }
    Ok(path)
}
