//! Run coordinator: one comment event in, one [`RunOutcome`] out

use crate::deployment::DeploymentOrchestrator;
use crate::eligibility::{ChecksSummary, EligibilityChecker, EligibilityReport};
use crate::environment::Whitelist;
use crate::error::Result;
use crate::event::{CommentEvent, EventKind};
use crate::outcome::{CommentContext, OutcomeReporter, Outputs, Rejection, RunOutcome};
use crate::traits::{CommentPoster, DeploymentApi, PullRequestSource};
use crate::trigger::TriggerParser;
use crate::types::InputConfig;

/// Reaction added to the triggering comment once a deployment exists
pub const DEPLOYED_REACTION: &str = "rocket";

/// What a finished run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Terminal outcome
    pub outcome: RunOutcome,
    /// `deployment_id` / `deployment_api_url`
    pub outputs: Outputs,
    /// Feedback text for the outcome, whether or not it was posted
    pub message: Option<String>,
    /// A feedback comment was posted
    pub comment_posted: bool,
    /// The triggering comment got a reaction
    pub reacted: bool,
}

impl RunReport {
    /// Report for an event that was never a deployment request
    pub fn not_triggered() -> Self {
        Self {
            outcome: RunOutcome::NotTriggered,
            outputs: Outputs::default(),
            message: None,
            comment_posted: false,
            reacted: false,
        }
    }
}

/// Drives the decision pipeline against a GitHub implementation
pub struct DeployRunner<'a, G> {
    github: &'a G,
    config: &'a InputConfig<'a>,
}

impl<'a, G> DeployRunner<'a, G>
where
    G: PullRequestSource + DeploymentApi + CommentPoster,
{
    /// Create a runner
    pub fn new(github: &'a G, config: &'a InputConfig<'a>) -> Self {
        Self { github, config }
    }

    /// Decide and report for a loaded event.
    pub async fn run_event(&self, event: &EventKind) -> Result<RunReport> {
        match event {
            EventKind::Ignored(reason) => {
                tracing::info!(reason = *reason, "event ignored");
                Ok(RunReport::not_triggered())
            }
            EventKind::Comment(comment) => self.run(comment).await,
        }
    }

    /// Decide and report for one comment.
    pub async fn run(&self, event: &CommentEvent) -> Result<RunReport> {
        let outcome = self.decide(event).await?;
        Ok(self.report(event, outcome).await)
    }

    /// Run the pipeline up to the terminal outcome, without any feedback.
    ///
    /// Errors are fatal: a broken whitelist, or a PR whose state could not
    /// be read. Everything else ends in a [`RunOutcome`].
    pub async fn decide(&self, event: &CommentEvent) -> Result<RunOutcome> {
        let parser = TriggerParser::from_config(self.config);
        let matched = parser.parse(&event.body);
        let Some(requested) = matched.environment() else {
            tracing::debug!(phrase = parser.phrase(), "comment is not a deployment request");
            return Ok(RunOutcome::NotTriggered);
        };
        tracing::info!(
            repo = %event.repo,
            pr = event.pr_number,
            environment = requested,
            "deployment requested"
        );

        let whitelist = Whitelist::from_path(self.config.environment_validation_file.as_deref())?;
        let environment = match whitelist.resolve(requested) {
            Ok(spec) => spec,
            Err(rejected) => {
                tracing::warn!(%rejected, "environment rejected");
                return Ok(RunOutcome::Rejected(Rejection::Environment(rejected)));
            }
        };

        let pr = self
            .github
            .pull_request(&event.repo, event.pr_number)
            .await?;

        let checks = if self.config.ignore_status_checks {
            ChecksSummary::default()
        } else {
            self.github.checks(&event.repo, &pr.head_sha).await?
        };
        tracing::debug!(
            draft = pr.draft,
            merged = pr.merged,
            open = pr.open,
            mergeable = pr.mergeable,
            checks = checks.state.as_str(),
            "pull request state"
        );

        let report = EligibilityReport::new(&pr, checks, self.config);
        let eligible = match EligibilityChecker::new().evaluate(&report) {
            Ok(token) => token,
            Err(ineligible) => {
                tracing::warn!(reason = %ineligible.reason, "pull request not eligible");
                return Ok(RunOutcome::Rejected(Rejection::Ineligible {
                    environment: environment.name,
                    pr: ineligible,
                }));
            }
        };

        let orchestrator = DeploymentOrchestrator::new(self.github, &event.repo);
        Ok(match orchestrator.deploy(&environment, &pr, eligible).await {
            Ok(result) => RunOutcome::Deployed {
                environment: environment.name,
                result,
            },
            Err(failure) => RunOutcome::DeploymentFailed {
                environment: environment.name,
                failure,
            },
        })
    }

    /// Post feedback for `outcome` and compute outputs.
    ///
    /// Feedback failures are logged and never change the outputs.
    pub async fn report(&self, event: &CommentEvent, outcome: RunOutcome) -> RunReport {
        let reporter = OutcomeReporter::new(self.config);
        let outputs = reporter.outputs(&outcome);
        let ctx = CommentContext {
            author: &event.author,
            repo: &event.repo,
        };

        let message = reporter.render(&outcome, &ctx);

        let mut comment_posted = false;
        if let Some(body) = reporter.comment_body(&outcome, &ctx) {
            match self
                .github
                .post_comment(&event.repo, event.pr_number, &body)
                .await
            {
                Ok(()) => comment_posted = true,
                Err(e) => tracing::warn!(error = %e, "failed to post outcome comment"),
            }
        }

        let mut reacted = false;
        if self.config.react && outcome.deployment().is_some() {
            match self
                .github
                .add_reaction(&event.repo, event.comment_id, DEPLOYED_REACTION)
                .await
            {
                Ok(()) => reacted = true,
                Err(e) => tracing::warn!(error = %e, "failed to react to comment"),
            }
        }

        RunReport {
            outcome,
            outputs,
            message,
            comment_posted,
            reacted,
        }
    }
}
