use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("target responded with HTTP {0}")]
    Status(u16),
    #[error("target could not be reached: {0}")]
    Network(String),
}

/// Advisory reachability check run before a pen test.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self, target: &Url) -> Result<(), ProbeError>;
}

/// Whether a pen test must pass the reachability probe before the model is called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbePolicy {
    #[default]
    Always,
    Never,
}

impl FromStr for ProbePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" | "on" => Ok(ProbePolicy::Always),
            "never" | "off" => Ok(ProbePolicy::Never),
            other => Err(format!("unknown probe policy '{other}', expected 'always' or 'never'")),
        }
    }
}

/// Issues a single HEAD request, following redirects, and inspects only the status.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::limited(10))
            .build()
            .map_err(|e| ProbeError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
    async fn probe(&self, target: &Url) -> Result<(), ProbeError> {
        let response = self
            .client
            .head(target.clone())
            .send()
            .await
            .map_err(|e| ProbeError::Network(e.to_string()))?;
        let status = response.status();
        debug!(%target, status = status.as_u16(), "reachability probe finished");
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status(status.as_u16()))
        }
    }
}
