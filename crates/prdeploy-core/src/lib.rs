//! # prdeploy core
//!
//! Turns pull request comments such as `deploy to staging` into GitHub
//! deployments.
//!
//! A run goes through these stages, each of which can end it:
//! - **Trigger**: find the configured phrase in the comment
//! - **Environment**: resolve the requested name against the whitelist
//! - **Eligibility**: draft, merge and status-check gate on the PR
//! - **Deployment**: create exactly one deployment for the PR head
//! - **Reporting**: feedback comment, reaction and action outputs
//!
//! GitHub access sits behind the traits in [`traits`], so the pipeline runs
//! the same against [`GitHubClient`] and in-memory fakes.
//!
//! ## Example
//!
//! ```no_run
//! use prdeploy_core::{handle_comment_event, InputConfig};
//! use std::borrow::Cow;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = InputConfig {
//!     token: Some(Cow::Borrowed("ghp_example")),
//!     environment_validation_file: Some(Cow::Borrowed(".github/environments.json")),
//!     ..Default::default()
//! };
//!
//! let report = handle_comment_event(&config, None).await?;
//! println!("outcome: {}", report.outcome.label());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod coordination;
pub mod deployment;
pub mod eligibility;
pub mod environment;
pub mod error;
pub mod event;
pub mod http;
pub mod outcome;
pub mod output;
pub mod telemetry;
pub mod traits;
pub mod trigger;
pub mod types;

pub use coordination::{DeployRunner, RunReport};
pub use deployment::{DeploymentFailed, DeploymentRequest, DeploymentResult};
pub use eligibility::{ChecksState, ChecksSummary, EligibilityReport, IneligibleReason};
pub use environment::{EnvironmentSpec, Whitelist};
pub use error::{Error, Result};
pub use event::{CommentEvent, EventKind};
pub use http::GitHubClient;
pub use outcome::{Outputs, RunOutcome};
pub use trigger::{TriggerMatch, TriggerParser};
pub use types::{InputConfig, OutputFormat, PullRequest};

use std::path::Path;

/// Handle the `issue_comment` event of the current workflow run
///
/// Reads the payload from `event_path`, or from `GITHUB_EVENT_PATH` when it
/// is `None`, talks to the GitHub API at `config.api_url`, and returns what
/// happened. Rejections and failed deployments are reported in the returned
/// [`RunReport`]; only configuration, event and PR-lookup problems are errors.
pub async fn handle_comment_event(
    config: &InputConfig<'_>,
    event_path: Option<&Path>,
) -> Result<RunReport> {
    config.validate()?;
    if config.token.is_none() {
        return Err(Error::Config("GITHUB_TOKEN is required".to_string()));
    }

    let event = match event_path {
        Some(path) => CommentEvent::load(path)?,
        None => CommentEvent::from_env()?,
    };
    let client = GitHubClient::from_config(config);
    DeployRunner::new(&client, config).run_event(&event).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        let _ = env!("CARGO_PKG_VERSION");
    }

    #[tokio::test]
    async fn test_token_required() {
        let config = InputConfig::default();
        let err = handle_comment_event(&config, None).await.unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_plain_issue_comment_not_triggered() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("event.json");
        let payload = serde_json::json!({
            "action": "created",
            "issue": { "number": 3 },
            "comment": { "id": 1, "body": "deploy to qa", "user": { "login": "octocat" } },
            "repository": { "full_name": "acme/widgets" }
        });
        std::fs::write(&path, payload.to_string()).unwrap();

        // Unroutable API: the run must finish without any request
        let config = InputConfig {
            token: Some(std::borrow::Cow::Borrowed("t")),
            api_url: std::borrow::Cow::Borrowed("http://127.0.0.1:9"),
            ..Default::default()
        };
        let report = handle_comment_event(&config, Some(&path)).await.unwrap();
        assert_eq!(report.outcome, RunOutcome::NotTriggered);
    }

    #[tokio::test]
    async fn test_missing_event_file_is_error() {
        let config = InputConfig {
            token: Some(std::borrow::Cow::Borrowed("t")),
            ..Default::default()
        };
        let err = handle_comment_event(&config, Some(Path::new("/nonexistent/event.json")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Event(_)));
    }
}
