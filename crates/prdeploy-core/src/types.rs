//! Core type definitions shared across the pipeline

use crate::error::{Error, Result};
use std::borrow::Cow;

/// Default trigger phrase when the `trigger_phrase` input is unset
pub const DEFAULT_TRIGGER_PHRASE: &str = "deploy to";

/// Default GitHub REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default GitHub web endpoint, used for links in comments
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// Action inputs, read once at process start and passed to every component.
///
/// Borrowing via `Cow` lets the CLI hand over its parsed arguments without
/// copying them.
#[derive(Clone)]
pub struct InputConfig<'a> {
    // Trigger
    pub trigger_phrase: Cow<'a, str>,

    // Environment whitelist
    pub environment_validation_file: Option<Cow<'a, str>>,

    // Eligibility overrides
    pub allow_draft: bool,
    pub ignore_status_checks: bool,

    // Reporting
    pub comment: bool,
    pub react: bool,

    // GitHub endpoints
    pub api_url: Cow<'a, str>,
    pub server_url: Cow<'a, str>,
    pub token: Option<Cow<'a, str>>,
}

impl<'a> Default for InputConfig<'a> {
    fn default() -> Self {
        Self {
            trigger_phrase: Cow::Borrowed(DEFAULT_TRIGGER_PHRASE),
            environment_validation_file: None,
            allow_draft: false,
            ignore_status_checks: false,
            comment: true,
            react: true,
            api_url: Cow::Borrowed(DEFAULT_API_URL),
            server_url: Cow::Borrowed(DEFAULT_SERVER_URL),
            token: None,
        }
    }
}

impl std::fmt::Debug for InputConfig<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputConfig")
            .field("trigger_phrase", &self.trigger_phrase)
            .field(
                "environment_validation_file",
                &self.environment_validation_file,
            )
            .field("allow_draft", &self.allow_draft)
            .field("ignore_status_checks", &self.ignore_status_checks)
            .field("comment", &self.comment)
            .field("react", &self.react)
            .field("api_url", &self.api_url)
            .field("server_url", &self.server_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl<'a> InputConfig<'a> {
    /// Reject inputs no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.trigger_phrase.trim().is_empty() {
            return Err(Error::Config(
                "trigger_phrase must not be empty".to_string(),
            ));
        }
        if self
            .environment_validation_file
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
        {
            return Err(Error::Config(
                "environment_validation_file must not be blank when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a boolean action input.
    ///
    /// Actions hand every input over as a string; unset optional inputs
    /// arrive as `""`, which maps to `default`.
    pub fn parse_flag(name: &str, value: Option<&str>, default: bool) -> Result<bool> {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(default);
        };
        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(Error::Config(format!(
                "input '{}' must be a boolean, got '{}'",
                name, raw
            ))),
        }
    }
}

/// Pull request facts consumed by one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// PR number within the base repository
    pub number: u64,
    /// Draft flag
    pub draft: bool,
    /// Already merged
    pub merged: bool,
    /// `state == "open"`
    pub open: bool,
    /// No merge conflict with the base branch is known
    pub mergeable: bool,
    /// Head commit SHA, the ref every deployment targets
    pub head_sha: String,
}

/// Where run results are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// GitHub Actions: `$GITHUB_OUTPUT` plus a summary on stdout
    Gha,
    /// One JSON object on stdout
    Json,
    /// Human-readable text on stdout
    Text,
}

impl OutputFormat {
    /// Resolve an explicit choice, falling back to auto-detection.
    pub fn detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("gha") => OutputFormat::Gha,
            Some("json") => OutputFormat::Json,
            Some("text") => OutputFormat::Text,
            _ => {
                if std::env::var("GITHUB_ACTIONS").is_ok() {
                    OutputFormat::Gha
                } else {
                    OutputFormat::Text
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_config_default() {
        let config = InputConfig::default();
        assert_eq!(config.trigger_phrase, "deploy to");
        assert!(config.environment_validation_file.is_none());
        assert!(!config.allow_draft);
        assert!(!config.ignore_status_checks);
        assert!(config.comment);
        assert!(config.react);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_validate_rejects_blank_trigger() {
        let config = InputConfig {
            trigger_phrase: Cow::Borrowed("   "),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(InputConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_whitelist_path() {
        let config = InputConfig {
            environment_validation_file: Some(Cow::Borrowed(" ")),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(InputConfig::parse_flag("comment", Some("true"), false).unwrap());
        assert!(InputConfig::parse_flag("comment", Some("TRUE"), false).unwrap());
        assert!(InputConfig::parse_flag("comment", Some("1"), false).unwrap());
        assert!(!InputConfig::parse_flag("comment", Some("False"), true).unwrap());
        assert!(!InputConfig::parse_flag("comment", Some("off"), true).unwrap());
        // Empty and missing fall back to the default
        assert!(InputConfig::parse_flag("comment", Some(""), true).unwrap());
        assert!(!InputConfig::parse_flag("allow_draft", None, false).unwrap());
        assert!(InputConfig::parse_flag("comment", Some("maybe"), true).is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = InputConfig {
            token: Some(Cow::Borrowed("ghp_SuperSecret123")),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("ghp_SuperSecret123"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_output_format_explicit() {
        assert_eq!(OutputFormat::detect(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::detect(Some("text")), OutputFormat::Text);
        assert_eq!(OutputFormat::detect(Some("gha")), OutputFormat::Gha);
    }
}
