//! Deployment request construction and submission
//!
//! A request is submitted exactly once. Creation is not idempotent on the
//! GitHub side, so errors are reported as-is and never retried.

use crate::eligibility::Eligible;
use crate::environment::EnvironmentSpec;
use crate::error::Error;
use crate::traits::DeploymentApi;
use crate::types::PullRequest;
use serde::Serialize;

/// Body of `POST /repos/{owner}/{repo}/deployments`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentRequest {
    /// Commit SHA to deploy
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Target environment name
    pub environment: String,
    /// Free-form description shown in the GitHub UI
    pub description: String,
    /// Environment is torn down later
    pub transient_environment: bool,
    /// Environment is user-facing
    pub production_environment: bool,
    /// Always off: deploying must never merge the base branch into the PR
    pub auto_merge: bool,
    /// Always empty: the eligibility gate already decided on checks
    pub required_contexts: Vec<String>,
}

impl DeploymentRequest {
    /// Build the request for a resolved environment and an eligible PR.
    ///
    /// The [`Eligible`] token can only come from a passed eligibility gate.
    pub fn new(environment: &EnvironmentSpec, pr: &PullRequest, _eligible: Eligible) -> Self {
        Self {
            git_ref: pr.head_sha.clone(),
            environment: environment.name.clone(),
            description: format!("Automatic deployment from #{}", pr.number),
            transient_environment: environment.transient,
            production_environment: environment.production,
            auto_merge: false,
            required_contexts: Vec::new(),
        }
    }
}

/// Identifiers of a created deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    /// Deployment id
    pub id: String,
    /// API URL of the deployment object
    pub api_url: String,
}

/// The hosting API refused or failed to create the deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentFailed {
    /// Error text as returned, unmodified
    pub error: String,
}

impl From<Error> for DeploymentFailed {
    fn from(err: Error) -> Self {
        let error = match err {
            Error::Api { body, .. } => body,
            other => other.to_string(),
        };
        Self { error }
    }
}

/// Submits deployment requests to a [`DeploymentApi`]
pub struct DeploymentOrchestrator<'a, A> {
    api: &'a A,
    repo: &'a str,
}

impl<'a, A: DeploymentApi> DeploymentOrchestrator<'a, A> {
    /// Create an orchestrator deploying in `repo` (`owner/name`)
    pub fn new(api: &'a A, repo: &'a str) -> Self {
        Self { api, repo }
    }

    /// Build and submit one deployment request.
    pub async fn deploy(
        &self,
        environment: &EnvironmentSpec,
        pr: &PullRequest,
        eligible: Eligible,
    ) -> Result<DeploymentResult, DeploymentFailed> {
        let request = DeploymentRequest::new(environment, pr, eligible);
        tracing::info!(
            repo = self.repo,
            git_ref = %request.git_ref,
            environment = %request.environment,
            transient = request.transient_environment,
            production = request.production_environment,
            "creating deployment"
        );

        match self.api.create_deployment(self.repo, &request).await {
            Ok(result) => {
                tracing::info!(id = %result.id, url = %result.api_url, "deployment created");
                Ok(result)
            }
            Err(err) => {
                tracing::warn!(error = %err, "deployment creation failed");
                Err(DeploymentFailed::from(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::{ChecksState, EligibilityChecker, EligibilityReport};

    fn eligible() -> Eligible {
        EligibilityChecker::new()
            .evaluate(&EligibilityReport {
                is_draft: false,
                is_merged: false,
                is_open: true,
                is_mergeable: true,
                checks_state: ChecksState::Success,
                blocking_contexts: Vec::new(),
                allow_draft: false,
                ignore_checks: false,
            })
            .unwrap()
    }

    fn pr() -> PullRequest {
        PullRequest {
            number: 42,
            draft: false,
            merged: false,
            open: true,
            head_sha: "0123abcd".to_string(),
            mergeable: true,
        }
    }

    #[test]
    fn test_request_from_spec() {
        let spec = EnvironmentSpec {
            name: "review".to_string(),
            transient: true,
            production: false,
        };
        let request = DeploymentRequest::new(&spec, &pr(), eligible());
        assert_eq!(request.git_ref, "0123abcd");
        assert_eq!(request.environment, "review");
        assert!(request.transient_environment);
        assert!(!request.production_environment);
        assert!(!request.auto_merge);
        assert!(request.required_contexts.is_empty());
        assert_eq!(request.description, "Automatic deployment from #42");
    }

    #[test]
    fn test_request_wire_shape() {
        let request = DeploymentRequest::new(&EnvironmentSpec::ad_hoc("qa"), &pr(), eligible());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ref": "0123abcd",
                "environment": "qa",
                "description": "Automatic deployment from #42",
                "transient_environment": false,
                "production_environment": false,
                "auto_merge": false,
                "required_contexts": [],
            })
        );
    }

    #[test]
    fn test_failure_keeps_api_body_verbatim() {
        let failed = DeploymentFailed::from(Error::Api {
            status: 409,
            body: r#"{"message":"Conflict merging main into feature"}"#.to_string(),
        });
        assert_eq!(failed.error, r#"{"message":"Conflict merging main into feature"}"#);

        let failed = DeploymentFailed::from(Error::Http("connection reset".to_string()));
        assert_eq!(failed.error, "HTTP error: connection reset");
    }
}
