//! GitHub REST API client for pull requests, checks, deployments and comments

use crate::deployment::{DeploymentRequest, DeploymentResult};
use crate::eligibility::{ChecksState, ChecksSummary};
use crate::error::{Error, Result};
use crate::traits::{CommentPoster, DeploymentApi, PullRequestSource};
use crate::types::{InputConfig, PullRequest};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// GitHub API pull request object
#[derive(Debug, Deserialize)]
struct GitHubPullRequest {
    number: u64,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    merged: bool,
    merged_at: Option<String>,
    state: String,
    /// `null` while GitHub is still computing it
    mergeable: Option<bool>,
    mergeable_state: Option<String>,
    head: GitHubHead,
}

#[derive(Debug, Deserialize)]
struct GitHubHead {
    sha: String,
}

/// Upper bound on pages fetched for one listing
const MAX_PAGES: u32 = 50;

/// Items per page requested from list endpoints
const PER_PAGE: usize = 100;

/// A paginated listing that reports its total size
trait Paged: DeserializeOwned {
    fn total_count(&self) -> usize;
    fn item_count(&self) -> usize;
    fn append(&mut self, next: Self);
}

/// GitHub API combined commit status
#[derive(Debug, Deserialize)]
struct GitHubCombinedStatus {
    state: String,
    total_count: u32,
    statuses: Vec<GitHubStatus>,
}

impl Paged for GitHubCombinedStatus {
    fn total_count(&self) -> usize {
        self.total_count as usize
    }

    fn item_count(&self) -> usize {
        self.statuses.len()
    }

    fn append(&mut self, next: Self) {
        self.statuses.extend(next.statuses);
    }
}

#[derive(Debug, Deserialize)]
struct GitHubStatus {
    context: String,
    state: String,
}

/// GitHub API response for check runs list
#[derive(Debug, Deserialize)]
struct GitHubCheckRuns {
    total_count: u32,
    check_runs: Vec<GitHubCheckRun>,
}

impl Paged for GitHubCheckRuns {
    fn total_count(&self) -> usize {
        self.total_count as usize
    }

    fn item_count(&self) -> usize {
        self.check_runs.len()
    }

    fn append(&mut self, next: Self) {
        self.check_runs.extend(next.check_runs);
    }
}

#[derive(Debug, Deserialize)]
struct GitHubCheckRun {
    name: String,
    status: String,
    conclusion: Option<String>,
}

/// GitHub API deployment object
#[derive(Debug, Deserialize)]
struct GitHubDeployment {
    id: u64,
    url: String,
}

impl GitHubPullRequest {
    fn into_pull_request(self) -> PullRequest {
        PullRequest {
            number: self.number,
            draft: self.draft,
            merged: self.merged || self.merged_at.is_some(),
            open: self.state == "open",
            mergeable: self.mergeable != Some(false)
                && self.mergeable_state.as_deref() != Some("dirty"),
            head_sha: self.head.sha,
        }
    }
}

/// Fold a combined status and check runs into one summary.
fn summarize_checks(status: &GitHubCombinedStatus, runs: &GitHubCheckRuns) -> ChecksSummary {
    let mut summary = ChecksSummary::default();

    // A combined status with no statuses reports "pending"; it means nothing.
    if status.total_count > 0 {
        summary.state = summary.state.merge(ChecksState::from_status(&status.state));
        for s in &status.statuses {
            summary.record(&s.context, ChecksState::from_status(&s.state));
        }
    }

    for run in &runs.check_runs {
        summary.record(
            &run.name,
            ChecksState::from_check_run(&run.status, run.conclusion.as_deref()),
        );
    }

    summary
}

/// GitHub REST client used for every API call of a run
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Create a new GitHub API client
    pub fn new(base_url: String, token: Option<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );

        let client = reqwest::Client::builder()
            .user_agent(concat!("prdeploy/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Create from the run configuration
    pub fn from_config(config: &InputConfig<'_>) -> Self {
        Self::new(
            config.api_url.to_string(),
            config.token.as_ref().map(|t| t.to_string()),
        )
    }

    /// API base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, url);

        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        request
    }

    /// Send a request and reject non-success responses.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(format!("{} request failed: {}", what, e)))?;

        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            let remaining = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            if remaining.as_deref() == Some("0") {
                return Err(Error::RateLimitExceeded(format!(
                    "GitHub API rate limit exceeded while fetching {}",
                    what
                )));
            }
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %body, "{} failed", what);
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        self.send(request, what)
            .await?
            .json()
            .await
            .map_err(|e| Error::Json(format!("failed to parse {} response: {}", what, e)))
    }

    /// Fetch every page of a listing, until `total_count` items are in or a
    /// page comes back empty.
    async fn get_all_pages<P: Paged>(&self, path: &str, what: &str) -> Result<P> {
        let per_page = PER_PAGE.to_string();
        let mut page = 1u32;
        let request = self
            .request(Method::GET, path)
            .query(&[("per_page", per_page.as_str()), ("page", "1")]);
        let mut listing: P = self.send_json(request, what).await?;

        while listing.item_count() < listing.total_count() {
            page += 1;
            if page > MAX_PAGES {
                return Err(Error::Runtime(format!(
                    "too many pages in {} response",
                    what
                )));
            }

            let page_number = page.to_string();
            let request = self
                .request(Method::GET, path)
                .query(&[("per_page", per_page.as_str()), ("page", page_number.as_str())]);
            let next: P = self.send_json(request, what).await?;
            if next.item_count() == 0 {
                break;
            }
            listing.append(next);
        }

        Ok(listing)
    }

    /// Get a pull request
    ///
    /// Endpoint: GET /repos/{owner}/{repo}/pulls/{number}
    pub async fn get_pull_request(&self, repo: &str, number: u64) -> Result<PullRequest> {
        let request = self.request(Method::GET, &format!("/repos/{}/pulls/{}", repo, number));
        let pr: GitHubPullRequest = self.send_json(request, "pull request").await?;
        Ok(pr.into_pull_request())
    }

    /// Get the combined status and check runs of a commit
    ///
    /// Endpoints: GET /repos/{owner}/{repo}/commits/{sha}/status and
    /// GET /repos/{owner}/{repo}/commits/{sha}/check-runs
    pub async fn get_checks(&self, repo: &str, sha: &str) -> Result<ChecksSummary> {
        let status: GitHubCombinedStatus = self
            .get_all_pages(&format!("/repos/{}/commits/{}/status", repo, sha), "commit status")
            .await?;
        let runs: GitHubCheckRuns = self
            .get_all_pages(
                &format!("/repos/{}/commits/{}/check-runs", repo, sha),
                "check runs",
            )
            .await?;

        let summary = summarize_checks(&status, &runs);
        tracing::debug!(
            sha,
            state = summary.state.as_str(),
            blocking = ?summary.blocking_contexts,
            "aggregated commit checks"
        );
        Ok(summary)
    }

    /// Create a deployment
    ///
    /// Endpoint: POST /repos/{owner}/{repo}/deployments
    pub async fn post_deployment(
        &self,
        repo: &str,
        deployment: &DeploymentRequest,
    ) -> Result<DeploymentResult> {
        let request = self
            .request(Method::POST, &format!("/repos/{}/deployments", repo))
            .json(deployment);
        let response = self.send(request, "deployment").await?;

        // 202 means GitHub merged the base branch instead of deploying.
        if response.status() != StatusCode::CREATED {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        let created: GitHubDeployment = response
            .json()
            .await
            .map_err(|e| Error::Json(format!("failed to parse deployment response: {}", e)))?;

        Ok(DeploymentResult {
            id: created.id.to_string(),
            api_url: created.url,
        })
    }

    /// Create an issue comment
    ///
    /// Endpoint: POST /repos/{owner}/{repo}/issues/{number}/comments
    pub async fn create_comment(&self, repo: &str, issue_number: u64, body: &str) -> Result<()> {
        let request = self
            .request(
                Method::POST,
                &format!("/repos/{}/issues/{}/comments", repo, issue_number),
            )
            .json(&serde_json::json!({ "body": body }));
        self.send(request, "comment").await?;
        Ok(())
    }

    /// React to an issue comment
    ///
    /// Endpoint: POST /repos/{owner}/{repo}/issues/comments/{comment_id}/reactions
    pub async fn create_reaction(&self, repo: &str, comment_id: u64, content: &str) -> Result<()> {
        let request = self
            .request(
                Method::POST,
                &format!("/repos/{}/issues/comments/{}/reactions", repo, comment_id),
            )
            .json(&serde_json::json!({ "content": content }));
        self.send(request, "reaction").await?;
        Ok(())
    }
}

impl PullRequestSource for GitHubClient {
    async fn pull_request(&self, repo: &str, number: u64) -> Result<PullRequest> {
        self.get_pull_request(repo, number).await
    }

    async fn checks(&self, repo: &str, sha: &str) -> Result<ChecksSummary> {
        self.get_checks(repo, sha).await
    }
}

impl DeploymentApi for GitHubClient {
    async fn create_deployment(
        &self,
        repo: &str,
        request: &DeploymentRequest,
    ) -> Result<DeploymentResult> {
        self.post_deployment(repo, request).await
    }
}

impl CommentPoster for GitHubClient {
    async fn post_comment(&self, repo: &str, issue_number: u64, body: &str) -> Result<()> {
        self.create_comment(repo, issue_number, body).await
    }

    async fn add_reaction(&self, repo: &str, comment_id: u64, content: &str) -> Result<()> {
        self.create_reaction(repo, comment_id, content).await
    }
}
