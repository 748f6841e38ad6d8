use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use crate::actions::Actions;
use crate::ai::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::ai::{GeminiClient, GeminiConfig};
use crate::history::{FileStorage, ScanHistory};
use crate::probe::{HttpProbe, ProbePolicy};

/// Generative model settings.
#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// Gemini API key (falls back to GOOGLE_API_KEY).
    #[arg(long = "api-key", env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used for every report.
    #[arg(long, env = "AEGIS_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the Generative Language API.
    #[arg(long = "model-endpoint", env = "AEGIS_MODEL_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Overall timeout for one model call, in seconds.
    #[arg(long = "model-timeout-secs", default_value_t = 120)]
    pub timeout_secs: u64,
}

pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;

/// Pen-test reachability probe settings.
#[derive(Debug, Clone, Args)]
pub struct ProbeArgs {
    /// Whether pen tests must pass a HEAD probe first: always | never.
    #[arg(long = "probe-policy", env = "AEGIS_PROBE_POLICY", default_value = "always")]
    pub policy: ProbePolicy,

    /// HEAD probe timeout in milliseconds.
    #[arg(long = "probe-timeout-ms", default_value_t = DEFAULT_PROBE_TIMEOUT_MS)]
    pub timeout_ms: u64,
}

/// Where scan history is persisted.
#[derive(Debug, Clone, Args)]
pub struct StorageArgs {
    /// Directory holding the scan history file.
    #[arg(long = "data-dir", env = "AEGIS_DATA_DIR", default_value = ".aegis")]
    pub data_dir: PathBuf,

    /// Maximum size of the persisted history in bytes (unlimited if omitted).
    #[arg(long = "history-quota")]
    pub quota: Option<usize>,
}

impl ModelArgs {
    pub fn gemini_config(&self) -> Result<GeminiConfig> {
        let api_key = self
            .api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .context("Gemini API key required. Set GEMINI_API_KEY or use --api-key.")?;
        Ok(GeminiConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

impl StorageArgs {
    pub fn file_storage(&self) -> FileStorage {
        let storage = FileStorage::new(&self.data_dir);
        match self.quota {
            Some(quota) => storage.with_quota(quota),
            None => storage,
        }
    }

    pub fn open_history(&self) -> ScanHistory<FileStorage> {
        ScanHistory::new(self.file_storage())
    }
}

/// Wire the Gemini client and HTTP probe into [`Actions`].
///
/// Commands that never probe pass `None`, which disables the probe.
pub fn build_actions(model: &ModelArgs, probe: Option<&ProbeArgs>) -> Result<Actions> {
    let client = GeminiClient::new(model.gemini_config()?).context("failed to create model client")?;
    let (policy, timeout_ms) = match probe {
        Some(p) => (p.policy, p.timeout_ms),
        None => (ProbePolicy::Never, DEFAULT_PROBE_TIMEOUT_MS),
    };
    let http_probe = HttpProbe::new(Duration::from_millis(timeout_ms))
        .context("failed to create reachability probe")?;
    Ok(Actions::new(Arc::new(client), Arc::new(http_probe), policy))
}
