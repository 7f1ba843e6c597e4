//! Environment whitelist loading and resolution
//!
//! The whitelist document is an ordered list of environments:
//!
//! ```json
//! [
//!   { "name": "production", "production": true },
//!   { "name": "review", "transient": true },
//!   { "name": "test" }
//! ]
//! ```
//!
//! YAML is accepted when the file ends in `.yml` or `.yaml`. The document is
//! validated as a whole when loaded; a broken whitelist is a configuration
//! error for the run, never a per-comment rejection.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// A deployable environment and its GitHub deployment flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentSpec {
    /// Unique environment name, matched case-sensitively
    pub name: String,
    /// Torn down once the deployment is no longer needed
    #[serde(default)]
    pub transient: bool,
    /// Directly used by end users
    #[serde(default)]
    pub production: bool,
}

impl EnvironmentSpec {
    /// An environment accepted without a whitelist: both flags off.
    pub fn ad_hoc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transient: false,
            production: false,
        }
    }
}

/// Why a requested environment was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// Not listed in the whitelist
    NotInWhitelist,
    /// Nothing was requested
    EmptyName,
}

impl RejectionReason {
    /// Short reason shown to the commenter
    pub const fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::NotInWhitelist => "not in whitelist",
            RejectionReason::EmptyName => "no environment specified",
        }
    }
}

/// A requested environment the whitelist does not permit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentRejected {
    /// The name as requested
    pub environment: String,
    /// Why it was refused
    pub reason: RejectionReason,
}

impl fmt::Display for EnvironmentRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "environment '{}' {}", self.environment, self.reason.as_str())
    }
}

/// Whitelist document syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON array
    Json,
    /// YAML sequence
    Yaml,
}

impl DocumentFormat {
    /// Pick the syntax from the file extension; JSON unless `.yml`/`.yaml`.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
                DocumentFormat::Yaml
            }
            _ => DocumentFormat::Json,
        }
    }
}

/// Which environments a run may deploy to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Whitelist {
    /// No whitelist configured: any non-empty name is accepted
    Unrestricted,
    /// Only the listed environments, in document order
    Restricted(Vec<EnvironmentSpec>),
}

impl Whitelist {
    /// Parse and validate a whitelist document.
    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self> {
        let entries: Vec<EnvironmentSpec> = match format {
            DocumentFormat::Json => serde_json::from_str(content)
                .map_err(|e| Error::Config(format!("invalid environment whitelist: {}", e)))?,
            DocumentFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| Error::Config(format!("invalid environment whitelist: {}", e)))?,
        };

        let mut seen = HashSet::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if entry.name.is_empty() {
                return Err(Error::Config(format!(
                    "environment whitelist entry {} has an empty name",
                    index
                )));
            }
            if entry.name.trim() != entry.name {
                return Err(Error::Config(format!(
                    "environment whitelist entry '{}' has surrounding whitespace",
                    entry.name
                )));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(Error::Config(format!(
                    "environment whitelist lists '{}' more than once",
                    entry.name
                )));
            }
        }

        if entries.is_empty() {
            tracing::warn!("environment whitelist is empty, every request will be rejected");
        }

        Ok(Whitelist::Restricted(entries))
    }

    /// Read and validate a whitelist file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read environment whitelist '{}': {}",
                path.display(),
                e
            ))
        })?;
        let whitelist = Self::parse(&content, DocumentFormat::from_path(path))?;
        tracing::debug!(
            path = %path.display(),
            entries = whitelist.len(),
            "loaded environment whitelist"
        );
        Ok(whitelist)
    }

    /// Load the whitelist named by the configuration, if any.
    pub fn from_path(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load(Path::new(p)),
            None => Ok(Whitelist::Unrestricted),
        }
    }

    /// Number of listed environments; zero when unrestricted.
    pub fn len(&self) -> usize {
        match self {
            Whitelist::Unrestricted => 0,
            Whitelist::Restricted(entries) => entries.len(),
        }
    }

    /// Whether no environment is listed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a requested environment to its spec.
    pub fn resolve(&self, requested: &str) -> std::result::Result<EnvironmentSpec, EnvironmentRejected> {
        if requested.is_empty() {
            return Err(EnvironmentRejected {
                environment: String::new(),
                reason: RejectionReason::EmptyName,
            });
        }

        match self {
            Whitelist::Unrestricted => Ok(EnvironmentSpec::ad_hoc(requested)),
            Whitelist::Restricted(entries) => entries
                .iter()
                .find(|entry| entry.name == requested)
                .cloned()
                .ok_or_else(|| EnvironmentRejected {
                    environment: requested.to_string(),
                    reason: RejectionReason::NotInWhitelist,
                }),
        }
    }
}
