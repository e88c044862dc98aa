use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulefigError {
    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in config file")]
    UnknownKeys(Vec<RulefigError>),

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] confique::Error),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Invalid rule shape for {target}: {reason}")]
    InvalidRuleShape { target: String, reason: String },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Rule not found: {0}")]
    RuleNotFound(String),
}

impl RulefigError {
    pub(crate) fn shape(target: impl Into<String>, reason: impl Into<String>) -> Self {
        RulefigError::InvalidRuleShape {
            target: target.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_formats_correctly() {
        let err = RulefigError::UnknownKey {
            key: "typo_key".into(),
            path: "/work/app/rulefig.toml".into(),
            line: 42,
        };
        let msg = err.to_string();
        assert!(msg.contains("typo_key"));
        assert!(msg.contains("rulefig.toml"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn invalid_rule_shape_names_target() {
        let err = RulefigError::shape("vuehtml", "missing `test`");
        let msg = err.to_string();
        assert!(msg.contains("vuehtml"));
        assert!(msg.contains("missing `test`"));
    }

    #[test]
    fn rule_not_found_formats() {
        let err = RulefigError::RuleNotFound("sass".into());
        assert!(err.to_string().contains("sass"));
    }
}
