//! Payload transport: system clipboard or a plain file.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};

/// Where a finished payload goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Clipboard,
    File(PathBuf),
}

impl Transport {
    pub fn from_output(output: Option<PathBuf>) -> Self {
        output.map_or(Transport::Clipboard, Transport::File)
    }

    /// Hand `text` over and describe where it went.
    pub fn deliver(&self, text: &str) -> Result<String> {
        match self {
            Transport::Clipboard => {
                let backend = Clipboard::new().copy(text)?;
                tracing::debug!(backend, bytes = text.len(), "payload copied");
                Ok("clipboard".to_owned())
            }
            Transport::File(path) => {
                fs::write(path, text)
                    .with_context(|| format!("failed to write payload to {}", path.display()))?;
                Ok(path.display().to_string())
            }
        }
    }
}

/// Cross-platform clipboard helper with fallbacks for headless environments.
pub struct Clipboard {
    primary: Option<arboard::Clipboard>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self {
            primary: arboard::Clipboard::new().ok(),
        }
    }

    /// Copy text and return the name of the backend that accepted it.
    pub fn copy(&mut self, text: &str) -> Result<&'static str> {
        if let Some(primary) = self.primary.as_mut()
            && primary.set_text(text.to_owned()).is_ok()
        {
            return Ok("arboard");
        }

        self.primary = None;
        for command in fallback_commands() {
            match pipe_to(command, text) {
                Ok(()) => return Ok(command[0]),
                Err(err) => tracing::trace!(error = %err, "clipboard fallback failed"),
            }
        }
        Err(anyhow!("no clipboard backend accepted the payload"))
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

fn pipe_to(command: &[&str], text: &str) -> Result<()> {
    let (program, args) = command
        .split_first()
        .context("clipboard command missing program")?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn clipboard command: {program}"))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .context("failed to write clipboard contents")?;
    }

    let status = child
        .wait()
        .with_context(|| format!("clipboard command did not exit cleanly: {program}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("{program} exited with status {status}"))
    }
}

#[cfg(target_os = "macos")]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    vec![&["pbcopy"]]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    vec![&["xclip", "-selection", "clipboard"], &["wl-copy"]]
}

#[cfg(target_os = "windows")]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    vec![&["powershell.exe", "-NoProfile", "-Command", "Set-Clipboard"]]
}

#[cfg(not(any(unix, target_os = "windows")))]
fn fallback_commands() -> Vec<&'static [&'static str]> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_selects_file_transport() {
        assert_eq!(Transport::from_output(None), Transport::Clipboard);
        assert_eq!(
            Transport::from_output(Some("out.txt".into())),
            Transport::File("out.txt".into())
        );
    }

    #[test]
    fn file_transport_writes_payload() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let target = temp.path().join("payload.txt");
        let where_to = Transport::File(target.clone()).deliver(">>> a.go\npackage a\n")?;
        assert_eq!(where_to, target.display().to_string());
        assert_eq!(fs::read_to_string(target)?, ">>> a.go\npackage a\n");
        Ok(())
    }
}
