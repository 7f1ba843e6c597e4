//! Collaborator traits at the I/O seams of a run
//!
//! The run coordinator is generic over these, so the decision pipeline can be
//! driven by [`GitHubClient`](crate::http::GitHubClient) in production and by
//! in-memory fakes in tests. Futures are returned as `impl Future + Send`,
//! no boxing.
//!
//! `repo` arguments are `owner/name` full names.

use crate::deployment::{DeploymentRequest, DeploymentResult};
use crate::eligibility::ChecksSummary;
use crate::error::Result;
use crate::types::PullRequest;
use std::future::Future;

/// Read-only pull request facts
pub trait PullRequestSource {
    /// Fetch the pull request's draft/merge/open state and head commit
    fn pull_request(&self, repo: &str, number: u64)
        -> impl Future<Output = Result<PullRequest>> + Send;

    /// Aggregate commit statuses and check runs for `sha`
    fn checks(&self, repo: &str, sha: &str) -> impl Future<Output = Result<ChecksSummary>> + Send;
}

/// Deployment object store
pub trait DeploymentApi {
    /// Create one deployment. Not idempotent: every call creates a record.
    fn create_deployment(
        &self,
        repo: &str,
        request: &DeploymentRequest,
    ) -> impl Future<Output = Result<DeploymentResult>> + Send;
}

/// Feedback on the pull request conversation
pub trait CommentPoster {
    /// Post a comment on the pull request
    fn post_comment(
        &self,
        repo: &str,
        issue_number: u64,
        body: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// React to the triggering comment (`rocket`, `eyes`, ...)
    fn add_reaction(
        &self,
        repo: &str,
        comment_id: u64,
        content: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}
