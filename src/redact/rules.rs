//! Redaction rules
//!
//! ORDER MATTERS: provider-specific patterns come before the generic
//! `api_key=` / `password=` assignments, so a Stripe key is reported as
//! [STRIPE_API_KEY_REDACTED] rather than [SECRET_REDACTED].

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Clone)]
pub struct RedactionRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub replacement: &'static str,
}

fn rule(name: &'static str, pattern: &str, replacement: &'static str) -> RedactionRule {
    RedactionRule { name, pattern: Regex::new(pattern).expect("valid regex"), replacement }
}

pub static DEFAULT_RULES: Lazy<Vec<RedactionRule>> = Lazy::new(|| {
    vec![
        // AWS
        rule("aws_access_key", r"\bAKIA[0-9A-Z]{16}\b", "[AWS_ACCESS_KEY_REDACTED]"),
        rule(
            "aws_secret_key",
            r#"(?i)(aws[_\-]?secret[_\-]?access[_\-]?key['"]?\s*[=:]\s*['"]?)[A-Za-z0-9/+=]{40}"#,
            "${1}[AWS_SECRET_KEY_REDACTED]",
        ),
        // GitHub
        rule("github_token", r"\bgh[pousr]_[A-Za-z0-9]{36}\b", "[GITHUB_TOKEN_REDACTED]"),
        // Anthropic before OpenAI: both start with `sk-`.
        rule("anthropic_key", r"\bsk-ant-[A-Za-z0-9\-_]{80,}", "[ANTHROPIC_API_KEY_REDACTED]"),
        rule("openai_project_key", r"\bsk-proj-[A-Za-z0-9\-_]{48,}", "[OPENAI_API_KEY_REDACTED]"),
        rule("openai_key", r"\bsk-[A-Za-z0-9]{48}\b", "[OPENAI_API_KEY_REDACTED]"),
        // Slack
        rule(
            "slack_token",
            r"\bxox[baprs]-[0-9]{10,13}-[0-9]{10,13}-[A-Za-z0-9]{24}\b",
            "[SLACK_TOKEN_REDACTED]",
        ),
        rule(
            "slack_webhook",
            r"https://hooks\.slack\.com/services/T[A-Z0-9]+/B[A-Z0-9]+/[A-Za-z0-9]+",
            "[SLACK_WEBHOOK_REDACTED]",
        ),
        // Payments and messaging
        rule(
            "stripe_key",
            r"\b[sr]k_(?:live|test)_[A-Za-z0-9]{24,}\b",
            "[STRIPE_API_KEY_REDACTED]",
        ),
        rule("twilio_key", r"\bSK[a-f0-9]{32}\b", "[TWILIO_API_KEY_REDACTED]"),
        rule(
            "sendgrid_key",
            r"\bSG\.[A-Za-z0-9\-_]{22}\.[A-Za-z0-9\-_]{43}",
            "[SENDGRID_API_KEY_REDACTED]",
        ),
        // Key material and tokens
        rule(
            "private_key",
            r"-----BEGIN (?:RSA |EC |DSA |OPENSSH |PGP )?PRIVATE KEY(?: BLOCK)?-----",
            "[PRIVATE_KEY_REDACTED]",
        ),
        rule(
            "jwt",
            r"\beyJ[A-Za-z0-9\-_]+\.eyJ[A-Za-z0-9\-_]+\.[A-Za-z0-9\-_]+",
            "[JWT_TOKEN_REDACTED]",
        ),
        // Credentials embedded in URLs: keep scheme, user and host.
        rule(
            "database_url",
            r"(?i)\b((?:postgres|postgresql|mysql|mongodb|redis)://[^:\s/@]+:)[^@\s]+(@)",
            "${1}[DATABASE_PASSWORD_REDACTED]${2}",
        ),
        rule("basic_auth", r"\b(https?://[^:\s/@]+:)[^@\s]+(@)", "${1}[BASIC_AUTH_REDACTED]${2}"),
        // Generic assignments (check last)
        rule(
            "generic_api_key",
            r#"(?i)((?:api[_\-]?key|apikey)['"]?\s*[=:]\s*['"]?)[A-Za-z0-9\-_]{20,}"#,
            "${1}[API_KEY_REDACTED]",
        ),
        rule(
            "generic_secret",
            r#"(?i)((?:secret|password|passwd|pwd)['"]?\s*[=:]\s*['"]?)[^\s'"\[][^\s'"]{7,}"#,
            "${1}[SECRET_REDACTED]",
        ),
    ]
});
