pub mod actions;
pub mod api;
pub mod code_engine;
pub mod error;
pub mod logging;
pub mod utils;
pub mod webhook;

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use actions::ActionRunner;
use code_engine::CodeEngine;
use error::HookError;

pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_CODE_ENGINE_API_URL: &str = "https://app.alooma.com/rest";

/// Repository configuration file: maps `owner/name` or
/// `owner/name/branch:<branch>` to an entry.
pub type ReposConfig = HashMap<String, RepoConfig>;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RepoConfig {
    pub path: Option<String>,
    pub key: Option<String>,
    #[serde(default)]
    pub action: Vec<String>,
}

impl RepoConfig {
    /// Returns the shared secret, if a non-empty one is configured.
    pub fn secret(&self) -> Option<&str> {
        self.key.as_deref().filter(|k| !k.is_empty())
    }

    /// Working directory for actions; the current directory when unset.
    pub fn working_dir(&self) -> &Path {
        match self.path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => Path::new(path),
            None => Path::new("."),
        }
    }

    pub fn has_actions(&self) -> bool {
        !self.action.is_empty()
    }
}

/// Read and parse the repository configuration file.
pub async fn load_repos_config(path: &Path) -> Result<ReposConfig, HookError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        HookError::RepoConfigError(format!("Failed to read '{}': {}", path.display(), e))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        HookError::RepoConfigError(format!("Failed to parse '{}': {}", path.display(), e))
    })
}

#[derive(Debug, Clone)]
pub struct CodeEngineSettings {
    pub api_url: String,
    pub account: String,
    pub api_key: String,
}

/// Process-wide settings, read once at start-up.
#[derive(Debug, Clone)]
pub struct Settings {
    pub repos_json_path: PathBuf,
    pub code_engine_file_path: PathBuf,
    pub code_engine: CodeEngineSettings,
    pub use_proxy_fix: bool,
    pub debug: bool,
    pub action_timeout: Option<Duration>,
    pub abort_on_action_failure: bool,
    pub log_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self, HookError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HookError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| HookError::ConfigError(format!("{} must be set", name)))
        };
        let flag = |name: &str| lookup(name).as_deref() == Some("true");

        let action_timeout = match lookup("ACTION_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    HookError::ConfigError(format!("ACTION_TIMEOUT_SECS is not a number: {}", raw))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            repos_json_path: PathBuf::from(required("REPOS_JSON_PATH")?),
            code_engine_file_path: PathBuf::from(required("CODE_ENGINE_FILE_PATH")?),
            code_engine: CodeEngineSettings {
                api_url: lookup("CODE_ENGINE_API_URL")
                    .unwrap_or_else(|| DEFAULT_CODE_ENGINE_API_URL.to_string()),
                account: required("CODE_ENGINE_ACCOUNT")?,
                api_key: required("CODE_ENGINE_API_KEY")?,
            },
            use_proxy_fix: flag("USE_PROXYFIX"),
            debug: flag("DEBUG"),
            action_timeout,
            abort_on_action_failure: flag("ABORT_ON_ACTION_FAILURE"),
            log_dir: lookup("LOG_DIR").map(PathBuf::from),
        })
    }
}

/// Listen port from the first command-line argument, falling back to
/// [`DEFAULT_PORT`] when absent or invalid.
pub fn parse_port<I>(mut args: I) -> u16
where
    I: Iterator<Item = String>,
{
    args.next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

pub struct AppState {
    pub settings: Settings,
    pub runner: Arc<dyn ActionRunner>,
    pub code_engine: Arc<dyn CodeEngine>,
}

pub type SharedState = Arc<AppState>;
