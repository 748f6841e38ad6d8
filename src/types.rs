use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::risk;

/// Severity label attached to a reported vulnerability.
///
/// `Unknown` only exists so that history written by older releases keeps
/// loading; model output carrying it is rejected by [`VulnerabilityReport::validate`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding in a vulnerability report.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Vulnerability {
    pub name: String,
    pub severity: Severity,
    pub description: String,
    pub remediation: String,
}

/// Report returned by the vulnerability scan action.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityReport {
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
}

impl VulnerabilityReport {
    /// Reject findings whose severity falls outside the four declared levels.
    pub fn validate(&self) -> Result<(), String> {
        match self
            .vulnerabilities
            .iter()
            .position(|v| v.severity == Severity::Unknown)
        {
            Some(idx) => Err(format!(
                "vulnerabilities[{idx}].severity is not one of Critical, High, Medium, Low"
            )),
            None => Ok(()),
        }
    }
}

/// One simulated attack attempt in a pen-test report.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttackVector {
    pub vector: String,
    pub description: String,
    pub exploited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cve: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

/// Narrative report returned by the simulated penetration test action.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PenTestReport {
    pub executive_summary: String,
    pub attack_narrative: String,
    #[serde(default)]
    pub simulated_attack_vectors: Vec<AttackVector>,
}

impl PenTestReport {
    pub fn exploited_count(&self) -> usize {
        self.simulated_attack_vectors
            .iter()
            .filter(|v| v.exploited)
            .count()
    }
}

/// Assessment of whether authenticated areas of the target can be tested.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthCheckReport {
    pub can_access_authenticated_areas: bool,
    pub feedback: String,
}

/// A persisted, immutable record of one successful vulnerability scan.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanHistoryItem {
    pub id: String,
    pub target_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub scan_date: OffsetDateTime,
    pub risk_score: u8,
    pub report: VulnerabilityReport,
}

impl ScanHistoryItem {
    /// Build a fresh history record; the risk score is always derived from the report.
    pub fn from_report(target_url: impl Into<String>, report: VulnerabilityReport) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            target_url: target_url.into(),
            scan_date: OffsetDateTime::now_utc(),
            risk_score: risk::risk_score(&report.vulnerabilities),
            report,
        }
    }
}
