//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".ctxgrab/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub guard: Guard,
    #[serde(default)]
    pub grab: Grab,
    #[serde(default)]
    pub staging: Staging,
    #[serde(default)]
    pub service: Service,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guard {
    #[serde(default = "Guard::default_max_files")]
    pub max_files: usize,
    #[serde(default)]
    pub protected_markers: Vec<String>,
}

impl Guard {
    fn default_max_files() -> usize {
        200
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self {
            max_files: Self::default_max_files(),
            protected_markers: vec![".config".into(), "ws_info.toml".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grab {
    /// File-name globs selecting code files inside grabbed directories.
    #[serde(default)]
    pub include: Vec<String>,
}

impl Default for Grab {
    fn default() -> Self {
        Self {
            include: [
                "*.go", "*.py", "*.js", "*.java", "*.cpp", "*.c", "*.cs", "*.rb", "*.php",
                "*.html", "*.css", "*.sh",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staging {
    #[serde(default = "Staging::default_input")]
    pub input: String,
    #[serde(default = "Staging::default_output")]
    pub output: String,
}

impl Staging {
    fn default_input() -> String {
        "input.md".into()
    }

    fn default_output() -> String {
        "output.md".into()
    }
}

impl Default for Staging {
    fn default() -> Self {
        Self {
            input: Self::default_input(),
            output: Self::default_output(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Program and arguments receiving the prompt on stdin.
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default = "Service::default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "Service::default_model")]
    pub model: String,
}

impl Service {
    fn default_api_key_env() -> String {
        "OPENAI_API_KEY".into()
    }

    fn default_model() -> String {
        "gpt-4o-2024-08-06".into()
    }
}

impl Default for Service {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            api_key_env: Self::default_api_key_env(),
            model: Self::default_model(),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    max_files: Option<String>,
    service_command: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            max_files: env::var("CTXGRAB_MAX_FILES").ok(),
            service_command: env::var("CTXGRAB_SERVICE_COMMAND").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(max_files: &str, service_command: &str) -> Self {
        Self {
            max_files: Some(max_files.to_owned()),
            service_command: Some(service_command.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading user config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        apply_env_overrides(merged, env_overrides)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data).with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            guard: merge_guard(self.guard, other.guard),
            grab: Grab {
                include: union(self.grab.include, other.grab.include),
            },
            staging: merge_staging(self.staging, other.staging),
            service: merge_service(self.service, other.service),
        }
    }
}

fn merge_guard(base: Guard, overlay: Guard) -> Guard {
    Guard {
        max_files: choose(base.max_files, overlay.max_files, Guard::default_max_files),
        protected_markers: union(base.protected_markers, overlay.protected_markers),
    }
}

fn merge_staging(base: Staging, overlay: Staging) -> Staging {
    Staging {
        input: choose(base.input, overlay.input, Staging::default_input),
        output: choose(base.output, overlay.output, Staging::default_output),
    }
}

fn merge_service(base: Service, overlay: Service) -> Service {
    Service {
        command: if overlay.command.is_empty() {
            base.command
        } else {
            overlay.command
        },
        api_key_env: choose(
            base.api_key_env,
            overlay.api_key_env,
            Service::default_api_key_env,
        ),
        model: choose(base.model, overlay.model, Service::default_model),
    }
}

fn choose<T: PartialEq>(base: T, overlay: T, default_fn: fn() -> T) -> T {
    if overlay != default_fn() {
        overlay
    } else {
        base
    }
}

fn union(base: Vec<String>, overlay: Vec<String>) -> Vec<String> {
    let mut merged: BTreeSet<String> = base.into_iter().collect();
    merged.extend(overlay);
    merged.into_iter().collect()
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("ctxgrab/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Result<Config> {
    if let Some(max_files) = env.max_files {
        config.guard.max_files = max_files
            .trim()
            .parse()
            .with_context(|| format!("CTXGRAB_MAX_FILES is not a number: {max_files}"))?;
    }
    if let Some(command) = env.service_command {
        config.service.command = command.split_whitespace().map(String::from).collect();
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_no_files() -> Result<()> {
        let config = Config::load_with_layers(None, None, EnvOverrides::default())?;
        assert_eq!(config.guard.max_files, 200);
        assert!(config.guard.protected_markers.contains(&"ws_info.toml".into()));
        assert!(config.grab.include.contains(&"*.go".into()));
        assert_eq!(config.staging.input, "input.md");
        assert!(config.service.command.is_empty());
        Ok(())
    }

    #[test]
    fn merge_global_and_workspace() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[guard]
max_files = 50
[service]
command = ["llm", "--json"]
"#,
        )?;

        let workspace_dir = temp.path().join("repo");
        fs::create_dir_all(workspace_dir.join(".ctxgrab"))?;
        fs::create_dir_all(workspace_dir.join(".git"))?;
        fs::write(
            workspace_dir.join(".ctxgrab/config.toml"),
            r#"
[guard]
protected_markers = ["DO_NOT_GRAB"]
[grab]
include = ["*.rs"]
[staging]
output = "reply.json"
"#,
        )?;

        let config = Config::load_with_layers(
            Some(global),
            Some(workspace_dir.join(".ctxgrab/config.toml")),
            EnvOverrides::default(),
        )?;

        assert_eq!(config.guard.max_files, 50);
        assert!(config.guard.protected_markers.contains(&"DO_NOT_GRAB".into()));
        assert!(config.guard.protected_markers.contains(&".config".into()));
        assert!(config.grab.include.contains(&"*.rs".into()));
        assert!(config.grab.include.contains(&"*.go".into()));
        assert_eq!(config.staging.input, "input.md");
        assert_eq!(config.staging.output, "reply.json");
        assert_eq!(config.service.command, vec!["llm", "--json"]);
        Ok(())
    }

    #[test]
    fn env_overrides_take_precedence() -> Result<()> {
        let overrides = EnvOverrides::for_tests("7", "my-llm --strict");
        let config = Config::load_with_layers(None, None, overrides)?;
        assert_eq!(config.guard.max_files, 7);
        assert_eq!(config.service.command, vec!["my-llm", "--strict"]);
        Ok(())
    }

    #[test]
    fn invalid_env_number_is_rejected() {
        let overrides = EnvOverrides::for_tests("many", "x");
        assert!(Config::load_with_layers(None, None, overrides).is_err());
    }

    #[test]
    fn invalid_config_returns_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("broken.toml");
        fs::write(&file, "this is not toml")?;
        let result = Config::from_file(&file);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn finds_repo_root_from_nested_dir() -> Result<()> {
        let temp = tempfile::tempdir()?;
        fs::create_dir_all(temp.path().join(".git"))?;
        fs::create_dir_all(temp.path().join("a/b"))?;
        assert_eq!(
            find_repo_root(&temp.path().join("a/b")),
            Some(temp.path().to_path_buf())
        );
        Ok(())
    }
}
