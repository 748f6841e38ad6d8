//! Declared response schemas, in the OpenAPI subset accepted as `responseSchema`.

use serde_json::{json, Value};

pub fn vulnerability_report() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "vulnerabilities": {
                "type": "ARRAY",
                "description": "Vulnerabilities identified for the target.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING", "description": "Short title of the vulnerability." },
                        "severity": {
                            "type": "STRING",
                            "format": "enum",
                            "enum": ["Critical", "High", "Medium", "Low"]
                        },
                        "description": { "type": "STRING" },
                        "remediation": { "type": "STRING" }
                    },
                    "required": ["name", "severity", "description", "remediation"]
                }
            }
        },
        "required": ["vulnerabilities"]
    })
}

pub fn pen_test_report() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "executiveSummary": {
                "type": "STRING",
                "description": "High-level summary of the findings for a non-technical audience."
            },
            "attackNarrative": {
                "type": "STRING",
                "description": "Step-by-step narrative of the simulated attack."
            },
            "simulatedAttackVectors": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "vector": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "exploited": { "type": "BOOLEAN" },
                        "cve": { "type": "STRING", "nullable": true },
                        "poc": { "type": "STRING", "nullable": true },
                        "remediation": { "type": "STRING", "nullable": true }
                    },
                    "required": ["vector", "description", "exploited"]
                }
            }
        },
        "required": ["executiveSummary", "attackNarrative", "simulatedAttackVectors"]
    })
}

pub fn auth_check_report() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "canAccessAuthenticatedAreas": { "type": "BOOLEAN" },
            "feedback": { "type": "STRING" }
        },
        "required": ["canAccessAuthenticatedAreas", "feedback"]
    })
}
