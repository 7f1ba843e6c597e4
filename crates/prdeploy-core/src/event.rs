//! `issue_comment` webhook payload loading
//!
//! GitHub writes the triggering event to `GITHUB_EVENT_PATH`. Only comment
//! creations on pull requests are acted on; other issue-comment events are
//! skipped quietly, and payloads that are not issue comments at all are an
//! error because the workflow is wired to the wrong trigger.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawEvent {
    action: Option<String>,
    issue: Option<RawIssue>,
    comment: Option<RawComment>,
    repository: Option<RawRepository>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    id: u64,
    body: Option<String>,
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    full_name: String,
}

/// A new comment on a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEvent {
    /// Base repository, `owner/name`
    pub repo: String,
    /// Pull request number
    pub pr_number: u64,
    /// Comment id, target of the reaction
    pub comment_id: u64,
    /// Comment text
    pub body: String,
    /// Comment author login
    pub author: String,
}

/// What the payload means for this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A pull request comment was created
    Comment(CommentEvent),
    /// Nothing to do; the reason is logged
    Ignored(&'static str),
}

impl CommentEvent {
    /// Interpret a raw event payload.
    pub fn parse(payload: &str) -> Result<EventKind> {
        let raw: RawEvent = serde_json::from_str(payload)
            .map_err(|e| Error::Event(format!("invalid event payload: {}", e)))?;

        let Some(issue) = raw.issue else {
            return Err(Error::Event(
                "this event doesn't seem to be an issue comment".to_string(),
            ));
        };

        if raw.action.as_deref() != Some("created") {
            return Ok(EventKind::Ignored("not a comment creation"));
        }

        if issue.pull_request.as_ref().map_or(true, |v| v.is_null()) {
            return Ok(EventKind::Ignored("not a pull request comment"));
        }

        let comment = raw
            .comment
            .ok_or_else(|| Error::Event("issue comment event without a comment".to_string()))?;
        let repository = raw.repository.ok_or_else(|| {
            Error::Event("issue comment event without a repository".to_string())
        })?;
        validate_full_name(&repository.full_name)?;

        Ok(EventKind::Comment(CommentEvent {
            repo: repository.full_name,
            pr_number: issue.number,
            comment_id: comment.id,
            body: comment.body.unwrap_or_default(),
            author: comment.user.login,
        }))
    }

    /// Read and interpret the payload file.
    pub fn load(path: &Path) -> Result<EventKind> {
        let payload = std::fs::read_to_string(path).map_err(|e| {
            Error::Event(format!(
                "failed to read event payload '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&payload)
    }

    /// Read the payload named by `GITHUB_EVENT_PATH`.
    pub fn from_env() -> Result<EventKind> {
        let path = std::env::var("GITHUB_EVENT_PATH")
            .map_err(|_| Error::Config("GITHUB_EVENT_PATH not set".to_string()))?;
        Self::load(Path::new(&path))
    }
}

fn validate_full_name(full_name: &str) -> Result<()> {
    let mut parts = full_name.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(()),
        _ => Err(Error::Event(format!(
            "invalid repository name: {}",
            full_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn payload(action: &str, pull_request: serde_json::Value) -> String {
        serde_json::json!({
            "action": action,
            "issue": { "number": 7, "pull_request": pull_request },
            "comment": {
                "id": 1001,
                "body": "deploy to staging",
                "user": { "login": "octocat" }
            },
            "repository": { "full_name": "acme/widgets" }
        })
        .to_string()
    }

    #[test]
    fn test_pull_request_comment() {
        let kind = CommentEvent::parse(&payload(
            "created",
            serde_json::json!({ "url": "https://api.github.com/repos/acme/widgets/pulls/7" }),
        ))
        .unwrap();

        assert_eq!(
            kind,
            EventKind::Comment(CommentEvent {
                repo: "acme/widgets".to_string(),
                pr_number: 7,
                comment_id: 1001,
                body: "deploy to staging".to_string(),
                author: "octocat".to_string(),
            })
        );
    }

    #[test]
    fn test_edited_comment_is_ignored() {
        let kind = CommentEvent::parse(&payload("edited", serde_json::json!({}))).unwrap();
        assert_eq!(kind, EventKind::Ignored("not a comment creation"));
    }

    #[test]
    fn test_plain_issue_comment_is_ignored() {
        let kind = CommentEvent::parse(&payload("created", serde_json::Value::Null)).unwrap();
        assert_eq!(kind, EventKind::Ignored("not a pull request comment"));
    }

    #[test]
    fn test_non_comment_event_is_error() {
        let err = CommentEvent::parse(r#"{"action":"opened","pull_request":{}}"#).unwrap_err();
        assert_matches!(err, Error::Event(_));
    }

    #[test]
    fn test_garbage_is_error() {
        assert_matches!(CommentEvent::parse("{"), Err(Error::Event(_)));
    }

    #[test]
    fn test_invalid_repository_name() {
        assert!(validate_full_name("acme").is_err());
        assert!(validate_full_name("acme/widgets/extra").is_err());
        assert!(validate_full_name("/widgets").is_err());
        assert!(validate_full_name("acme/widgets").is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(&path, payload("created", serde_json::json!({}))).unwrap();
        assert_matches!(CommentEvent::load(&path), Ok(EventKind::Comment(_)));
    }
}
