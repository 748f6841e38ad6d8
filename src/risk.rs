use serde::Serialize;

use crate::types::{Severity, Vulnerability};

/// Upper bound of the risk score.
pub const MAX_RISK_SCORE: u8 = 100;

impl Severity {
    /// Contribution of one finding of this severity to the risk score.
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Critical => 10,
            Severity::High => 7,
            Severity::Medium => 4,
            Severity::Low => 1,
            Severity::Unknown => 0,
        }
    }
}

/// Sum the severity weights of `vulnerabilities` and clamp to [`MAX_RISK_SCORE`].
///
/// Order does not matter and an empty slice scores 0.
pub fn risk_score(vulnerabilities: &[Vulnerability]) -> u8 {
    let total = vulnerabilities
        .iter()
        .fold(0u32, |acc, v| acc.saturating_add(v.severity.weight()));
    total.min(u32::from(MAX_RISK_SCORE)) as u8
}

/// Coarse label for a risk score, used when listing history.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    Critical,
    High,
    Medium,
    Low,
}

impl RiskBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s > 70 => RiskBand::Critical,
            s if s > 40 => RiskBand::High,
            s if s > 10 => RiskBand::Medium,
            _ => RiskBand::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Critical => "Critical",
            RiskBand::High => "High",
            RiskBand::Medium => "Medium",
            RiskBand::Low => "Low",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vuln(severity: Severity) -> Vulnerability {
        Vulnerability {
            name: format!("{severity} finding"),
            severity,
            description: String::new(),
            remediation: String::new(),
        }
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(risk_score(&[]), 0);
    }

    #[test]
    fn single_critical_is_ten() {
        assert_eq!(risk_score(&[vuln(Severity::Critical)]), 10);
    }

    #[test]
    fn clamps_at_one_hundred() {
        let many = vec![vuln(Severity::Critical); 11];
        assert_eq!(risk_score(&many), 100);
        let lots = vec![vuln(Severity::High); 1_000];
        assert_eq!(risk_score(&lots), 100);
    }

    #[test]
    fn weights_per_severity() {
        let mixed = [
            vuln(Severity::Critical),
            vuln(Severity::High),
            vuln(Severity::Medium),
            vuln(Severity::Low),
            vuln(Severity::Unknown),
        ];
        assert_eq!(risk_score(&mixed), 22);
    }

    #[test]
    fn order_independent() {
        let a = [vuln(Severity::Low), vuln(Severity::Critical), vuln(Severity::Medium)];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(risk_score(&a), risk_score(&b));
    }

    #[test]
    fn band_thresholds() {
        assert_eq!(RiskBand::from_score(0), RiskBand::Low);
        assert_eq!(RiskBand::from_score(10), RiskBand::Low);
        assert_eq!(RiskBand::from_score(11), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(41), RiskBand::High);
        assert_eq!(RiskBand::from_score(70), RiskBand::High);
        assert_eq!(RiskBand::from_score(71), RiskBand::Critical);
    }
}
