//! Generative model invocation.
//!
//! Every report is produced by one model call constrained by a prompt and a
//! declared output schema. The answer is coerced into the typed report and
//! validated; anything that does not fit is an error. No retries.

pub mod error;
pub mod gemini;
pub mod prompts;
pub mod schema;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

pub use error::{AiError, AiResult};
pub use gemini::{GeminiClient, GeminiConfig};

use crate::types::{AuthCheckReport, PenTestReport, VulnerabilityReport};

/// A single structured-output request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Flow name, for logs.
    pub name: &'static str,
    pub prompt: String,
    pub schema: Value,
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Run the request and return the model's JSON answer, unvalidated.
    async fn generate(&self, request: &GenerationRequest) -> AiResult<Value>;
}

/// A report type the model can be asked to produce.
pub trait ModelOutput: DeserializeOwned + Send {
    const FLOW: &'static str;

    fn prompt(target_url: &str) -> String;

    fn schema() -> Value;

    /// Semantic checks serde cannot express.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl ModelOutput for VulnerabilityReport {
    const FLOW: &'static str = "generateVulnerabilityReport";

    fn prompt(target_url: &str) -> String {
        prompts::render(prompts::VULNERABILITY_REPORT, target_url)
    }

    fn schema() -> Value {
        schema::vulnerability_report()
    }

    fn validate(&self) -> Result<(), String> {
        VulnerabilityReport::validate(self)
    }
}

impl ModelOutput for PenTestReport {
    const FLOW: &'static str = "performPenTest";

    fn prompt(target_url: &str) -> String {
        prompts::render(prompts::PEN_TEST, target_url)
    }

    fn schema() -> Value {
        schema::pen_test_report()
    }
}

impl ModelOutput for AuthCheckReport {
    const FLOW: &'static str = "checkAuthentication";

    fn prompt(target_url: &str) -> String {
        prompts::render(prompts::AUTH_CHECK, target_url)
    }

    fn schema() -> Value {
        schema::auth_check_report()
    }
}

/// Ask `client` for a `T` describing `target_url`.
pub async fn invoke<T: ModelOutput>(client: &dyn ModelClient, target_url: &str) -> AiResult<T> {
    let request = GenerationRequest {
        name: T::FLOW,
        prompt: T::prompt(target_url),
        schema: T::schema(),
    };
    let value = client.generate(&request).await?;
    let output: T = serde_json::from_value(value)?;
    if let Err(reason) = output.validate() {
        warn!(flow = T::FLOW, %reason, "model output failed validation");
        return Err(AiError::SchemaMismatch(reason));
    }
    debug!(flow = T::FLOW, provider = client.name(), "model output accepted");
    Ok(output)
}
