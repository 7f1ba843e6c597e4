//! Terminal run outcomes and how they are reported
//!
//! Every run ends in exactly one [`RunOutcome`]. The reporter turns it into
//! an optional PR comment and the `deployment_id` / `deployment_api_url`
//! outputs, which are only set for [`RunOutcome::Deployed`].

use crate::deployment::{DeploymentFailed, DeploymentResult};
use crate::eligibility::IneligiblePr;
use crate::environment::{EnvironmentRejected, RejectionReason};
use crate::types::InputConfig;
use serde::Serialize;
use std::fmt::Write;

/// Why a matched request was not deployed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The environment is not permitted
    Environment(EnvironmentRejected),
    /// The pull request failed the eligibility gate
    Ineligible {
        /// Requested environment
        environment: String,
        /// First failed rule
        pr: IneligiblePr,
    },
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The comment was not a deployment request
    NotTriggered,
    /// The request was refused before any deployment call
    Rejected(Rejection),
    /// GitHub refused or failed to create the deployment
    DeploymentFailed {
        /// Requested environment
        environment: String,
        /// Error as returned
        failure: DeploymentFailed,
    },
    /// A deployment was created
    Deployed {
        /// Deployed environment
        environment: String,
        /// Created deployment
        result: DeploymentResult,
    },
}

impl RunOutcome {
    /// Stable machine name of the outcome
    pub const fn label(&self) -> &'static str {
        match self {
            RunOutcome::NotTriggered => "not_triggered",
            RunOutcome::Rejected(_) => "rejected",
            RunOutcome::DeploymentFailed { .. } => "deployment_failed",
            RunOutcome::Deployed { .. } => "deployed",
        }
    }

    /// The created deployment, if any
    pub fn deployment(&self) -> Option<&DeploymentResult> {
        match self {
            RunOutcome::Deployed { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Whether the outcome should be surfaced as an error annotation
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            RunOutcome::Rejected(_) | RunOutcome::DeploymentFailed { .. }
        )
    }
}

/// Machine-readable run outputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outputs {
    /// Created deployment id
    pub deployment_id: Option<String>,
    /// Created deployment API URL
    pub deployment_api_url: Option<String>,
}

impl Outputs {
    /// Outputs for an outcome; empty unless deployed.
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        match outcome.deployment() {
            Some(result) => Self {
                deployment_id: Some(result.id.clone()),
                deployment_api_url: Some(result.api_url.clone()),
            },
            None => Self::default(),
        }
    }

    /// Whether nothing is set
    pub fn is_empty(&self) -> bool {
        self.deployment_id.is_none() && self.deployment_api_url.is_none()
    }

    /// Set outputs as `(name, value)` pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("deployment_id", self.deployment_id.as_deref()),
            ("deployment_api_url", self.deployment_api_url.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
    }
}

/// Event details comments refer to
#[derive(Debug, Clone, Copy)]
pub struct CommentContext<'a> {
    /// Login of the commenter
    pub author: &'a str,
    /// Repository the deployment belongs to, `owner/name`
    pub repo: &'a str,
}

/// Maps outcomes to comments and outputs
#[derive(Debug, Clone, Copy)]
pub struct OutcomeReporter<'a> {
    comment_enabled: bool,
    server_url: &'a str,
}

impl<'a> OutcomeReporter<'a> {
    /// Create a reporter from the run configuration
    pub fn new(config: &'a InputConfig<'_>) -> Self {
        Self {
            comment_enabled: config.comment,
            server_url: config.server_url.trim_end_matches('/'),
        }
    }

    /// Comment to post for `outcome`; `None` when commenting is disabled or
    /// the comment was not a deployment request.
    pub fn comment_body(&self, outcome: &RunOutcome, ctx: &CommentContext<'_>) -> Option<String> {
        if !self.comment_enabled {
            return None;
        }
        self.render(outcome, ctx)
    }

    /// Render the message for `outcome`, regardless of the comment setting.
    pub fn render(&self, outcome: &RunOutcome, ctx: &CommentContext<'_>) -> Option<String> {
        match outcome {
            RunOutcome::NotTriggered => None,
            RunOutcome::Rejected(Rejection::Environment(rejected)) => {
                Some(match rejected.reason {
                    RejectionReason::EmptyName => {
                        "Deployment failed: no environment specified.".to_string()
                    }
                    RejectionReason::NotInWhitelist => format!(
                        "Deployment to {env} failed: environment {env} is {reason}.",
                        env = code_span(&rejected.environment),
                        reason = rejected.reason.as_str(),
                    ),
                })
            }
            RunOutcome::Rejected(Rejection::Ineligible { environment, pr }) => {
                let mut body = format!(
                    "Deployment to {} failed: {}.",
                    code_span(environment),
                    pr.reason.as_str()
                );
                if !pr.blocking_contexts.is_empty() {
                    body.push_str("\n\nThe following status checks are not green:");
                    for context in &pr.blocking_contexts {
                        let _ = write!(body, "\n* {}", context);
                    }
                }
                Some(body)
            }
            RunOutcome::DeploymentFailed {
                environment,
                failure,
            } => Some(format!(
                "Deployment to {} failed: failed to create deployment ({}).",
                code_span(environment),
                failure.error
            )),
            RunOutcome::Deployed { environment, .. } => Some(format!(
                "@{}: Triggered [deployment]({}/{}/deployments) to {}.",
                ctx.author,
                self.server_url,
                ctx.repo,
                code_span(environment)
            )),
        }
    }

    /// Outputs for `outcome`
    pub fn outputs(&self, outcome: &RunOutcome) -> Outputs {
        Outputs::from_outcome(outcome)
    }
}

/// Wrap `text` in a Markdown code span so mentions and links in it stay inert.
fn code_span(text: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in text.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    let fence = "`".repeat(longest + 1);
    if text.starts_with('`') || text.ends_with('`') {
        format!("{fence} {text} {fence}")
    } else {
        format!("{fence}{text}{fence}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::IneligibleReason;

    const CTX: CommentContext<'static> = CommentContext {
        author: "octocat",
        repo: "acme/widgets",
    };

    fn deployed() -> RunOutcome {
        RunOutcome::Deployed {
            environment: "production".to_string(),
            result: DeploymentResult {
                id: "123456".to_string(),
                api_url: "https://api.github.com/repos/acme/widgets/deployments/123456"
                    .to_string(),
            },
        }
    }

    #[test]
    fn test_not_triggered_is_silent() {
        let config = InputConfig::default();
        let reporter = OutcomeReporter::new(&config);
        assert_eq!(reporter.comment_body(&RunOutcome::NotTriggered, &CTX), None);
        assert!(reporter.outputs(&RunOutcome::NotTriggered).is_empty());
    }

    #[test]
    fn test_deployed_outputs_round_trip_id() {
        let config = InputConfig::default();
        let reporter = OutcomeReporter::new(&config);
        let outcome = deployed();
        let outputs = reporter.outputs(&outcome);
        assert_eq!(outputs.deployment_id.as_deref(), Some("123456"));
        assert_eq!(
            outputs.pairs().collect::<Vec<_>>(),
            vec![
                ("deployment_id", "123456"),
                (
                    "deployment_api_url",
                    "https://api.github.com/repos/acme/widgets/deployments/123456"
                ),
            ]
        );
    }

    #[test]
    fn test_deployed_comment() {
        let config = InputConfig::default();
        let body = OutcomeReporter::new(&config)
            .comment_body(&deployed(), &CTX)
            .unwrap();
        assert_eq!(
            body,
            "@octocat: Triggered [deployment](https://github.com/acme/widgets/deployments) to `production`."
        );
    }

    #[test]
    fn test_comment_disabled() {
        let config = InputConfig {
            comment: false,
            ..Default::default()
        };
        let reporter = OutcomeReporter::new(&config);
        assert_eq!(reporter.comment_body(&deployed(), &CTX), None);
        assert!(reporter.render(&deployed(), &CTX).is_some());
        // Outputs do not depend on commenting
        assert!(!reporter.outputs(&deployed()).is_empty());
    }

    #[test]
    fn test_rejections_leave_outputs_empty() {
        let config = InputConfig::default();
        let reporter = OutcomeReporter::new(&config);
        let outcome = RunOutcome::Rejected(Rejection::Environment(EnvironmentRejected {
            environment: "staging".to_string(),
            reason: RejectionReason::NotInWhitelist,
        }));
        assert!(reporter.outputs(&outcome).is_empty());
        assert_eq!(
            reporter.comment_body(&outcome, &CTX).unwrap(),
            "Deployment to `staging` failed: environment `staging` is not in whitelist."
        );
    }

    #[test]
    fn test_ineligible_comment_lists_checks() {
        let config = InputConfig::default();
        let outcome = RunOutcome::Rejected(Rejection::Ineligible {
            environment: "production".to_string(),
            pr: IneligiblePr {
                reason: IneligibleReason::ChecksFailed,
                blocking_contexts: vec!["ci/test".to_string(), "lint".to_string()],
            },
        });
        let body = OutcomeReporter::new(&config)
            .comment_body(&outcome, &CTX)
            .unwrap();
        assert_eq!(
            body,
            "Deployment to `production` failed: status checks failed.\n\n\
             The following status checks are not green:\n* ci/test\n* lint"
        );
        assert!(outcome.is_failure());
    }

    #[test]
    fn test_deployment_failed_comment() {
        let config = InputConfig::default();
        let outcome = RunOutcome::DeploymentFailed {
            environment: "qa".to_string(),
            failure: DeploymentFailed {
                error: "Conflict".to_string(),
            },
        };
        let reporter = OutcomeReporter::new(&config);
        assert_eq!(
            reporter.comment_body(&outcome, &CTX).unwrap(),
            "Deployment to `qa` failed: failed to create deployment (Conflict)."
        );
        assert!(reporter.outputs(&outcome).is_empty());
        assert_eq!(outcome.label(), "deployment_failed");
    }

    #[test]
    fn test_environment_mentions_stay_inert() {
        let config = InputConfig::default();
        let reporter = OutcomeReporter::new(&config);
        let outcome = RunOutcome::Rejected(Rejection::Ineligible {
            environment: "@acme/admins".to_string(),
            pr: IneligiblePr {
                reason: IneligibleReason::Draft,
                blocking_contexts: Vec::new(),
            },
        });
        assert_eq!(
            reporter.comment_body(&outcome, &CTX).unwrap(),
            "Deployment to `@acme/admins` failed: PR is a draft."
        );

        let outcome = RunOutcome::Deployed {
            environment: "#1 @here".to_string(),
            result: DeploymentResult {
                id: "1".to_string(),
                api_url: String::new(),
            },
        };
        let body = reporter.render(&outcome, &CTX).unwrap();
        assert!(body.ends_with(" to `#1 @here`."));
    }

    #[test]
    fn test_code_span_fences_backticks() {
        assert_eq!(code_span("qa"), "`qa`");
        assert_eq!(code_span("a`b"), "``a`b``");
        assert_eq!(code_span("`x``"), "``` `x`` ```");
    }

    #[test]
    fn test_server_url_trailing_slash() {
        let config = InputConfig {
            server_url: std::borrow::Cow::Borrowed("https://ghe.example.com/"),
            ..Default::default()
        };
        let body = OutcomeReporter::new(&config).render(&deployed(), &CTX).unwrap();
        assert!(body.contains("(https://ghe.example.com/acme/widgets/deployments)"));
    }
}
