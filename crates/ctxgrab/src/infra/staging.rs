//! `input.md` / `output.md` staging files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::infra::config::Config;

/// Outbound prompt and raw reply files, overwritten on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingArea {
    input: PathBuf,
    output: PathBuf,
}

impl StagingArea {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Staging files named by the config, relative to `base`.
    pub fn from_config(config: &Config, base: &Path) -> Self {
        Self::new(
            base.join(&config.staging.input),
            base.join(&config.staging.output),
        )
    }

    pub fn input_path(&self) -> &Path {
        &self.input
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    pub fn write_input(&self, prompt: &str) -> Result<()> {
        write(&self.input, prompt)
    }

    pub fn read_input(&self) -> Result<String> {
        fs::read_to_string(&self.input)
            .with_context(|| format!("failed to read {}", self.input.display()))
    }

    pub fn write_output(&self, reply: &str) -> Result<()> {
        write(&self.output, reply)
    }

    pub fn read_output(&self) -> Result<Vec<u8>> {
        fs::read(&self.output).with_context(|| format!("failed to read {}", self.output.display()))
    }
}

fn write(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "staged");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_files_are_overwritten() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let staging = StagingArea::from_config(&Config::default(), temp.path());
        assert_eq!(staging.input_path(), temp.path().join("input.md"));

        staging.write_input("first")?;
        staging.write_input("second")?;
        assert_eq!(staging.read_input()?, "second");

        staging.write_output(r#"{"files":[]}"#)?;
        assert_eq!(staging.read_output()?, br#"{"files":[]}"#);
        Ok(())
    }

    #[test]
    fn missing_output_is_an_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let staging = StagingArea::new(temp.path().join("in.md"), temp.path().join("out.md"));
        assert!(staging.read_output().is_err());
        Ok(())
    }
}
