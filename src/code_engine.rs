//! Code engine bundle construction and upload client.

use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::CodeEngineSettings;
use crate::error::HookError;

const SCRIPT_EXTENSION: &str = ".py";
const PACKAGE_INIT: &str = "__init__.py";

/// Module name to source text.
pub type CodeBundle = BTreeMap<String, String>;

/// External code engine service.
#[async_trait]
pub trait CodeEngine: Send + Sync {
    /// Replace the deployed code with `bundle`.
    async fn set_code(&self, bundle: &CodeBundle) -> Result<(), HookError>;
}

/// Collects every script file directly inside `dir`, skipping the package
/// initializer. Keys are file names with `/` normalized to `.`.
pub async fn collect_bundle(dir: &Path) -> Result<CodeBundle, HookError> {
    let mut bundle = CodeBundle::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name();
        let Some(module) = file_name.to_str() else {
            debug!("Skipping non UTF-8 file name {:?}", file_name);
            continue;
        };
        if !module.ends_with(SCRIPT_EXTENSION) || module == PACKAGE_INIT {
            continue;
        }
        // follows symlinks; dangling links are skipped like directories
        match tokio::fs::metadata(entry.path()).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                debug!("Skipping {:?}: {}", entry.path(), e);
                continue;
            }
        }

        let contents = tokio::fs::read_to_string(entry.path()).await?;
        bundle.insert(module.replace('/', "."), contents);
    }

    Ok(bundle)
}

/// HTTP client for the code engine REST API.
pub struct HttpCodeEngine {
    client: Client,
    settings: CodeEngineSettings,
}

impl HttpCodeEngine {
    pub fn new(settings: CodeEngineSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/code-engine/code",
            self.settings.api_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CodeEngine for HttpCodeEngine {
    async fn set_code(&self, bundle: &CodeBundle) -> Result<(), HookError> {
        let url = self.endpoint();
        info!("Uploading {} module(s) to {}", bundle.len(), url);

        let response = self
            .client
            .post(&url)
            .query(&[("account", self.settings.account.as_str())])
            .bearer_auth(&self.settings.api_key)
            .json(bundle)
            .send()
            .await
            .map_err(|e| HookError::UploadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HookError::UploadFailed(format!("{}: {}", status, body)));
        }

        Ok(())
    }
}
