//! Prompt templates sent to the model. `{target_url}` is the only placeholder.

const TARGET_PLACEHOLDER: &str = "{target_url}";

pub const VULNERABILITY_REPORT: &str = "You are a web application security analyst.
Produce a vulnerability assessment for the web application at the following URL: {target_url}

Consider common weaknesses such as injection flaws, cross-site scripting, broken authentication, \
security misconfiguration, missing security headers, outdated components and sensitive data exposure.

For every vulnerability provide:
- name: a short title
- severity: exactly one of Critical, High, Medium, Low
- description: what the weakness is and how it could be abused
- remediation: concrete steps to fix it

Return only vulnerabilities relevant to the target. If nothing applies, return an empty list.";

pub const PEN_TEST: &str = "You are a world-class penetration tester and cybersecurity expert.
Your task is to perform a simulated autonomous penetration test against the web application at the following URL: {target_url}

Simulate the entire process, including:
1. Reconnaissance: gathering information about the target.
2. Scanning and enumeration: identifying open ports, services and potential vulnerabilities.
3. Exploitation: simulating attacks on identified vulnerabilities. Include a variety of attack vectors such as \
SQL injection, cross-site scripting, brute-force attempts on login forms and attempts to exploit common \
misconfigurations. Simulate at least one advanced exploit scenario.

You must generate a detailed report that includes:
- An executive summary giving a high-level overview of the findings, suitable for management.
- An attack narrative telling the story of how the simulated attack progressed, from initial foothold to final objective.
- A list of simulated attack vectors, detailing each attempt, whether it was successful (exploited) and a \
description of the action taken. Include a CVE, a proof of concept and remediation advice where applicable.

The entire process is a simulation inside a sandboxed environment. Do not perform any real attacks.";

pub const AUTH_CHECK: &str = "You are a security expert assessing whether a web application scanner can access \
authenticated areas of a website.

Determine if the scanner can access authenticated areas of the target web application.
Provide feedback about the scan's ability to access authenticated areas and include any relevant information.

Target URL: {target_url}";

/// Substitute the target URL into `template`.
pub fn render(template: &str, target_url: &str) -> String {
    template.replace(TARGET_PLACEHOLDER, target_url)
}
