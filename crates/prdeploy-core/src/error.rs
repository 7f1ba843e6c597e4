//! Error types for prdeploy-core
//!
//! Only failures that abort a run live here. Rejections of a single
//! deployment request (unknown environment, draft PR, red checks, a refused
//! deployment) are ordinary [`RunOutcome`](crate::outcome::RunOutcome) values.

/// Result type alias for prdeploy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for prdeploy operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration: bad action inputs or a malformed whitelist
    #[error("Configuration error: {0}")]
    Config(String),

    /// Webhook event payload is missing or not an issue comment
    #[error("Event error: {0}")]
    Event(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// GitHub answered with a non-success status
    #[error("GitHub API error ({status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Raw response body as returned by the API
        body: String,
    },

    /// API rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(String),

    /// YAML decoding error
    #[error("YAML error: {0}")]
    Yaml(String),

    /// Runtime error (Tokio, output sinks)
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml(err.to_string())
    }
}

/// Fieldless error category for cheap matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// Configuration error
    Config,
    /// Event payload error
    Event,
    /// HTTP transport error
    Http,
    /// Non-success API response
    Api,
    /// API rate limit exceeded
    RateLimitExceeded,
    /// I/O operation error
    Io,
    /// JSON decoding error
    Json,
    /// YAML decoding error
    Yaml,
    /// Runtime error
    Runtime,
}

impl Error {
    /// Get the error kind.
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::Event(_) => ErrorKind::Event,
            Error::Http(_) => ErrorKind::Http,
            Error::Api { .. } => ErrorKind::Api,
            Error::RateLimitExceeded(_) => ErrorKind::RateLimitExceeded,
            Error::Io(_) => ErrorKind::Io,
            Error::Json(_) => ErrorKind::Json,
            Error::Yaml(_) => ErrorKind::Yaml,
            Error::Runtime(_) => ErrorKind::Runtime,
        }
    }

    /// Borrow the error message without the category prefix.
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Error::Config(msg)
            | Error::Event(msg)
            | Error::Http(msg)
            | Error::RateLimitExceeded(msg)
            | Error::Json(msg)
            | Error::Yaml(msg)
            | Error::Runtime(msg) => msg,
            Error::Api { body, .. } => body,
            Error::Io(_) => "I/O error",
        }
    }

    /// Whether this error means the repository or workflow is set up wrong,
    /// as opposed to GitHub being unreachable.
    #[inline]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.kind(), ErrorKind::Config | ErrorKind::Yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_is_copy() {
        let err = Error::Config("test".to_string());
        let k = err.kind();
        let k2 = k;
        assert_eq!(k, k2);
    }

    #[test]
    fn test_error_kind_repr_u8() {
        assert_eq!(std::mem::size_of::<ErrorKind>(), 1);
    }

    #[test]
    fn test_error_message_borrows() {
        let err = Error::Config("bad whitelist".to_string());
        assert_eq!(err.message(), "bad whitelist");
        assert_eq!(err.to_string(), "Configuration error: bad whitelist");
    }

    #[test]
    fn test_api_error_display_keeps_body_verbatim() {
        let err = Error::Api {
            status: 422,
            body: r#"{"message":"No ref found for: abc"}"#.to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.message(), r#"{"message":"No ref found for: abc"}"#);
        assert!(err.to_string().starts_with("GitHub API error (422)"));
    }

    #[test]
    fn test_all_error_variants_have_kind() {
        let cases: Vec<(Error, ErrorKind)> = vec![
            (Error::Config("c".into()), ErrorKind::Config),
            (Error::Event("e".into()), ErrorKind::Event),
            (Error::Http("h".into()), ErrorKind::Http),
            (
                Error::Api {
                    status: 500,
                    body: "b".into(),
                },
                ErrorKind::Api,
            ),
            (
                Error::RateLimitExceeded("rl".into()),
                ErrorKind::RateLimitExceeded,
            ),
            (Error::Io(std::io::Error::other("io")), ErrorKind::Io),
            (Error::Json("j".into()), ErrorKind::Json),
            (Error::Yaml("y".into()), ErrorKind::Yaml),
            (Error::Runtime("r".into()), ErrorKind::Runtime),
        ];

        for (err, expected_kind) in cases {
            assert_eq!(err.kind(), expected_kind, "Mismatch for {:?}", err);
        }
    }

    #[test]
    fn test_is_configuration() {
        assert!(Error::Config("x".into()).is_configuration());
        assert!(Error::Yaml("x".into()).is_configuration());
        assert!(!Error::Http("x".into()).is_configuration());
        assert!(!Error::Event("x".into()).is_configuration());
    }

    #[test]
    fn test_error_messages_never_contain_token_patterns() {
        let token_patterns = ["ghp_", "gho_", "ghs_", "github_pat_", "Bearer "];
        let errors: Vec<Error> = vec![
            Error::Config("config error".into()),
            Error::Http("http error".into()),
            Error::Event("event error".into()),
            Error::Runtime("runtime error".into()),
            Error::RateLimitExceeded("rate limit exceeded".into()),
        ];

        for err in &errors {
            let display = format!("{}", err);
            let debug = format!("{:?}", err);
            for pattern in &token_patterns {
                assert!(!err.message().contains(pattern));
                assert!(!display.contains(pattern), "{}", display);
                assert!(!debug.contains(pattern), "{}", debug);
            }
        }
    }
}
