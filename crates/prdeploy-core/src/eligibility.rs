//! Pull request eligibility gate
//!
//! Rules are kept in one ordered table, [`RULES`]. The first rule a report
//! violates is the only reason reported, so a draft PR is always reported as
//! a draft even when its checks are red too.

use crate::types::{InputConfig, PullRequest};
use std::fmt;

/// Combined state of the commit statuses and check runs on the head commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksState {
    /// At least one status or check has not finished
    Pending,
    /// At least one status or check failed
    Failed,
    /// Everything reported is green
    Success,
    /// Nothing is configured for the commit
    #[default]
    None,
}

impl ChecksState {
    /// Parse a commit-status state (`success`, `pending`, `failure`, `error`).
    pub fn from_status(state: &str) -> Self {
        match state {
            "success" => ChecksState::Success,
            "pending" => ChecksState::Pending,
            "failure" | "error" => ChecksState::Failed,
            _ => ChecksState::None,
        }
    }

    /// Parse a check-run `status` / `conclusion` pair.
    pub fn from_check_run(status: &str, conclusion: Option<&str>) -> Self {
        if status != "completed" {
            return ChecksState::Pending;
        }
        match conclusion {
            Some("success" | "neutral" | "skipped") => ChecksState::Success,
            Some(
                "failure" | "timed_out" | "cancelled" | "action_required" | "startup_failure"
                | "stale",
            ) => ChecksState::Failed,
            _ => ChecksState::Pending,
        }
    }

    /// Merge two states: failure beats pending beats success beats none.
    pub fn merge(self, other: Self) -> Self {
        if other.precedence() > self.precedence() {
            other
        } else {
            self
        }
    }

    #[inline]
    const fn precedence(self) -> u8 {
        match self {
            ChecksState::None => 0,
            ChecksState::Success => 1,
            ChecksState::Pending => 2,
            ChecksState::Failed => 3,
        }
    }

    /// Lowercase name
    pub const fn as_str(&self) -> &'static str {
        match self {
            ChecksState::Pending => "pending",
            ChecksState::Failed => "failed",
            ChecksState::Success => "success",
            ChecksState::None => "none",
        }
    }
}

/// Aggregated checks for one commit, with the names of those not green
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksSummary {
    /// Combined state
    pub state: ChecksState,
    /// Contexts / check names that are pending or failed
    pub blocking_contexts: Vec<String>,
}

impl ChecksSummary {
    /// Fold one status or check run into the summary.
    pub fn record(&mut self, name: &str, state: ChecksState) {
        if matches!(state, ChecksState::Pending | ChecksState::Failed) {
            self.blocking_contexts.push(name.to_string());
        }
        self.state = self.state.merge(state);
    }
}

/// Facts the gate decides on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityReport {
    /// PR is a draft
    pub is_draft: bool,
    /// PR is already merged
    pub is_merged: bool,
    /// PR state is `open`
    pub is_open: bool,
    /// No merge conflict with the base branch is known
    pub is_mergeable: bool,
    /// Aggregated status checks of the head commit
    pub checks_state: ChecksState,
    /// Non-green status contexts and check runs
    pub blocking_contexts: Vec<String>,
    /// `allow_draft` input
    pub allow_draft: bool,
    /// `ignore_status_checks` input
    pub ignore_checks: bool,
}

impl EligibilityReport {
    /// Build a report from the PR, its checks, and the run overrides.
    pub fn new(pr: &PullRequest, checks: ChecksSummary, config: &InputConfig<'_>) -> Self {
        Self {
            is_draft: pr.draft,
            is_merged: pr.merged,
            is_open: pr.open,
            is_mergeable: pr.mergeable,
            checks_state: checks.state,
            blocking_contexts: checks.blocking_contexts,
            allow_draft: config.allow_draft,
            ignore_checks: config.ignore_status_checks,
        }
    }
}

/// One gate rule; see [`RULES`] for the order they are tried in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibleReason {
    /// Draft PR without `allow_draft`
    Draft,
    /// PR already merged
    Merged,
    /// PR closed
    NotOpen,
    /// Head conflicts with the base branch
    NotMergeable,
    /// Checks still running
    ChecksPending,
    /// Checks red
    ChecksFailed,
}

/// Gate rules in priority order. The first violated rule wins.
pub const RULES: &[IneligibleReason] = &[
    IneligibleReason::Draft,
    IneligibleReason::Merged,
    IneligibleReason::NotOpen,
    IneligibleReason::NotMergeable,
    IneligibleReason::ChecksPending,
    IneligibleReason::ChecksFailed,
];

impl IneligibleReason {
    /// Whether this rule blocks the report
    pub fn violated_by(&self, report: &EligibilityReport) -> bool {
        match self {
            IneligibleReason::Draft => report.is_draft && !report.allow_draft,
            IneligibleReason::Merged => report.is_merged,
            IneligibleReason::NotOpen => !report.is_open,
            IneligibleReason::NotMergeable => !report.is_mergeable,
            IneligibleReason::ChecksPending => {
                report.checks_state == ChecksState::Pending && !report.ignore_checks
            }
            IneligibleReason::ChecksFailed => {
                report.checks_state == ChecksState::Failed && !report.ignore_checks
            }
        }
    }

    /// Reason shown to the commenter
    pub const fn as_str(&self) -> &'static str {
        match self {
            IneligibleReason::Draft => "PR is a draft",
            IneligibleReason::Merged => "PR is already merged",
            IneligibleReason::NotOpen => "PR is not open",
            IneligibleReason::NotMergeable => "PR can't be cleanly merged with base branch",
            IneligibleReason::ChecksPending => "status checks pending",
            IneligibleReason::ChecksFailed => "status checks failed",
        }
    }

    /// Whether the reason concerns status checks
    pub const fn is_checks(&self) -> bool {
        matches!(self, IneligibleReason::ChecksPending | IneligibleReason::ChecksFailed)
    }
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proof that a report passed the gate.
///
/// Only [`EligibilityChecker::evaluate`] creates one, and building a
/// deployment request requires it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligible {
    _private: (),
}

/// A PR the gate refused, with the single reason reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IneligiblePr {
    /// First violated rule
    pub reason: IneligibleReason,
    /// Non-green checks, filled for check-related reasons
    pub blocking_contexts: Vec<String>,
}

/// Evaluates reports against [`RULES`]
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityChecker;

impl EligibilityChecker {
    /// Create a checker
    pub fn new() -> Self {
        Self
    }

    /// Decide pass/fail.
    pub fn evaluate(&self, report: &EligibilityReport) -> Result<Eligible, IneligiblePr> {
        match RULES.iter().find(|rule| rule.violated_by(report)) {
            None => Ok(Eligible { _private: () }),
            Some(&reason) => Err(IneligiblePr {
                reason,
                blocking_contexts: if reason.is_checks() {
                    report.blocking_contexts.clone()
                } else {
                    Vec::new()
                },
            }),
        }
    }
}
