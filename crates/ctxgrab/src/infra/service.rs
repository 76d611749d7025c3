//! Boundary to the external reasoning service.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow, bail};

use crate::domain::model::{ContextRequest, ResponseKind};
use crate::infra::config;
use crate::infra::prompt::Prompter;

/// Everything the service needs for one round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    pub prompt: String,
    pub kind: ResponseKind,
    pub model: String,
    /// Strict JSON schema the reply must satisfy.
    pub schema: serde_json::Value,
}

impl ServiceRequest {
    pub fn new(request: &ContextRequest, model: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            prompt: request.prompt.clone(),
            kind: request.kind,
            model: model.into(),
            schema,
        }
    }
}

/// Sends a prompt and returns the raw structured reply.
pub trait ReasoningService {
    fn complete(&self, request: &ServiceRequest) -> Result<String>;
}

/// Runs a configured program: prompt on stdin, JSON reply on stdout.
pub struct ExternalCommandService<'a> {
    command: Vec<String>,
    api_key_env: String,
    prompter: &'a dyn Prompter,
}

impl<'a> ExternalCommandService<'a> {
    pub fn new(settings: &config::Service, prompter: &'a dyn Prompter) -> Self {
        Self {
            command: settings.command.clone(),
            api_key_env: settings.api_key_env.clone(),
            prompter,
        }
    }

    fn api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(&self.api_key_env)
            && !key.trim().is_empty()
        {
            return Ok(key);
        }
        let key = self
            .prompter
            .read_secret(&format!("Enter your {}", self.api_key_env))?;
        if key.is_empty() {
            bail!("no value provided for {}", self.api_key_env);
        }
        Ok(key)
    }
}

impl ReasoningService for ExternalCommandService<'_> {
    fn complete(&self, request: &ServiceRequest) -> Result<String> {
        let (program, args) = self.command.split_first().ok_or_else(|| {
            anyhow!("no reasoning service configured; set [service].command or CTXGRAB_SERVICE_COMMAND")
        })?;
        let api_key = self.api_key()?;

        tracing::info!(program, model = %request.model, kind = ?request.kind, "calling reasoning service");
        let mut child = Command::new(program)
            .args(args)
            .env("CTXGRAB_RESPONSE_SCHEMA", request.schema.to_string())
            .env("CTXGRAB_MODEL", &request.model)
            .env(&self.api_key_env, api_key)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn reasoning service: {program}"))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.prompt.as_bytes())
                .context("failed to send prompt to reasoning service")?;
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("reasoning service did not exit cleanly: {program}"))?;
        if !output.status.success() {
            bail!("reasoning service exited with status {}", output.status);
        }
        String::from_utf8(output.stdout).context("reasoning service reply is not UTF-8")
    }
}
