//! Inbound webhook body shapes.
//!
//! These structs cover only the fields Herald reads from GitHub's `issues` and
//! `pull_request` webhook payloads; everything else in the body is ignored by
//! `serde`. Each nested object converts into its domain value type through an
//! explicit field-by-field `From` impl, so a renamed or missing field shows up
//! at compile time rather than as a silently empty message.

use serde::Deserialize;

use crate::{
    Actor, BranchName, IssueNumber, IssueSubject, PullRequestNumber, PullRequestSubject,
};

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// The `action` field of a webhook body.
///
/// Only [`EventAction::Opened`] triggers a notification. Every other value is
/// kept verbatim so it can be logged, and is otherwise ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum EventAction {
    Opened,
    Other(String),
}

impl EventAction {
    pub fn is_opened(&self) -> bool {
        matches!(self, Self::Opened)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Opened => "opened",
            Self::Other(action) => action,
        }
    }
}

impl From<String> for EventAction {
    fn from(value: String) -> Self {
        if value == "opened" {
            Self::Opened
        } else {
            Self::Other(value)
        }
    }
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Shared objects
// ---------------------------------------------------------------------------

/// The `sender` object present on every webhook body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SenderObject {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
}

impl From<SenderObject> for Actor {
    fn from(sender: SenderObject) -> Self {
        Actor {
            name: sender.login,
            profile_url: sender.html_url,
            avatar_url: sender.avatar_url,
        }
    }
}

/// An entry of an issue's `labels` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabelObject {
    pub name: String,
}

/// The `head` / `base` object of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefObject {
    #[serde(rename = "ref")]
    pub ref_name: BranchName,
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// Body of an `issues` webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueEventBody {
    pub action: EventAction,
    pub issue: IssueObject,
    pub sender: SenderObject,
}

/// The `issue` object of an `issues` webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueObject {
    pub number: IssueNumber,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub labels: Vec<LabelObject>,
}

impl From<IssueObject> for IssueSubject {
    fn from(issue: IssueObject) -> Self {
        IssueSubject {
            number: issue.number,
            title: issue.title,
            url: issue.html_url.unwrap_or(issue.url),
            labels: issue.labels.into_iter().map(|label| label.name).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pull requests
// ---------------------------------------------------------------------------

/// Body of a `pull_request` webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestEventBody {
    pub action: EventAction,
    pub pull_request: PullRequestObject,
    pub sender: SenderObject,
}

/// The `pull_request` object of a `pull_request` webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestObject {
    pub number: PullRequestNumber,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub html_url: Option<String>,
    /// Number of commits on the pull request at the time of the event.
    #[serde(default)]
    pub commits: u64,
    pub head: RefObject,
    pub base: RefObject,
}

impl From<PullRequestObject> for PullRequestSubject {
    fn from(pull_request: PullRequestObject) -> Self {
        PullRequestSubject {
            number: pull_request.number,
            title: pull_request.title,
            url: pull_request.html_url.unwrap_or(pull_request.url),
            source_branch: pull_request.head.ref_name,
            target_branch: pull_request.base.ref_name,
            number_of_commits: pull_request.commits,
        }
    }
}
