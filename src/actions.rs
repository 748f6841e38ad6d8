//! Request handling shared by the HTTP API and the CLI.
//!
//! Each action walks `validating-url -> [probing-reachability] -> invoking-model`
//! and ends in either a report or a single user-facing error string.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::ai::{self, AiError, ModelClient, ModelOutput};
use crate::probe::{ProbeError, ProbePolicy, ReachabilityProbe};
use crate::types::{AuthCheckReport, PenTestReport, VulnerabilityReport};

/// Which model-backed flow failed; renders as the message prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Scan,
    PenTest,
    AuthCheck,
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Flow::Scan => "Failed to scan the URL.",
            Flow::PenTest => "Failed to run the penetration test.",
            Flow::AuthCheck => "Failed to check authentication.",
        })
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Invalid URL. Please include http:// or https://")]
    InvalidUrl,
    #[error("Target is unreachable: {0}")]
    Unreachable(#[from] ProbeError),
    #[error("{flow} {source}")]
    Model { flow: Flow, source: AiError },
}

/// Wire shape of an action result: `{ "report": ... }` or `{ "error": "..." }`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ActionOutcome<T> {
    Report { report: T },
    Error { error: String },
}

impl<T> From<Result<T, ActionError>> for ActionOutcome<T> {
    fn from(res: Result<T, ActionError>) -> Self {
        match res {
            Ok(report) => ActionOutcome::Report { report },
            Err(e) => ActionOutcome::Error {
                error: e.to_string(),
            },
        }
    }
}

/// Accept only absolute `http://` or `https://` URLs with a host.
///
/// The scheme check runs on the input as given, so leading whitespace is rejected.
pub fn validate_target_url(raw: &str) -> Result<Url, ActionError> {
    if !raw.starts_with("http://") && !raw.starts_with("https://") {
        return Err(ActionError::InvalidUrl);
    }
    let url = Url::parse(raw).map_err(|_| ActionError::InvalidUrl)?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ActionError::InvalidUrl);
    }
    Ok(url)
}

#[derive(Clone)]
pub struct Actions {
    model: Arc<dyn ModelClient>,
    probe: Arc<dyn ReachabilityProbe>,
    probe_policy: ProbePolicy,
}

impl Actions {
    pub fn new(
        model: Arc<dyn ModelClient>,
        probe: Arc<dyn ReachabilityProbe>,
        probe_policy: ProbePolicy,
    ) -> Self {
        Self {
            model,
            probe,
            probe_policy,
        }
    }

    pub fn probe_policy(&self) -> ProbePolicy {
        self.probe_policy
    }

    pub async fn perform_scan(&self, target_url: &str) -> Result<VulnerabilityReport, ActionError> {
        let url = validate_target_url(target_url)?;
        self.run_model(Flow::Scan, &url).await
    }

    pub async fn perform_pen_test(&self, target_url: &str) -> Result<PenTestReport, ActionError> {
        let url = validate_target_url(target_url)?;
        if self.probe_policy == ProbePolicy::Always {
            info!(%url, "probing reachability");
            if let Err(e) = self.probe.probe(&url).await {
                warn!(%url, error = %e, "reachability probe failed");
                return Err(e.into());
            }
        }
        self.run_model(Flow::PenTest, &url).await
    }

    pub async fn check_authentication(
        &self,
        target_url: &str,
    ) -> Result<AuthCheckReport, ActionError> {
        let url = validate_target_url(target_url)?;
        self.run_model(Flow::AuthCheck, &url).await
    }

    async fn run_model<T: ModelOutput>(&self, flow: Flow, url: &Url) -> Result<T, ActionError> {
        info!(%url, flow = T::FLOW, model = self.model.model(), "invoking model");
        match ai::invoke::<T>(self.model.as_ref(), url.as_str()).await {
            Ok(report) => {
                info!(%url, flow = T::FLOW, "report generated");
                Ok(report)
            }
            Err(source) => {
                warn!(%url, flow = T::FLOW, error = %source, "model invocation failed");
                Err(ActionError::Model { flow, source })
            }
        }
    }
}
