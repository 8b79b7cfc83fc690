//! Value types that flow through the notification pipeline.
//!
//! Every value here is built once per webhook delivery and dropped when the
//! delivery has been handled. Nothing is cached or mutated after
//! construction.

use serde::{Deserialize, Serialize};

use crate::{BranchName, ChannelId, CommitSha, IssueNumber, PullRequestNumber};

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;

// ---------------------------------------------------------------------------
// Subjects and actors
// ---------------------------------------------------------------------------

/// The person who triggered a webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// GitHub login.
    pub name: String,
    /// Browser URL of the actor's profile.
    pub profile_url: String,
    /// URL of the actor's avatar image.
    pub avatar_url: String,
}

/// An issue as described by an inbound webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSubject {
    pub number: IssueNumber,
    pub title: String,
    pub url: String,
    /// Label names in the order GitHub lists them.
    pub labels: Vec<String>,
}

/// A pull request as described by an inbound webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSubject {
    pub number: PullRequestNumber,
    pub title: String,
    pub url: String,
    /// The head branch being merged.
    pub source_branch: BranchName,
    /// The base branch being merged into.
    pub target_branch: BranchName,
    pub number_of_commits: u64,
}

// ---------------------------------------------------------------------------
// Source repository records
// ---------------------------------------------------------------------------

/// One commit of a pull request, as returned by the source repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub sha: CommitSha,
    pub message: String,
}

/// The user an issue is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub login: String,
    pub avatar_url: String,
}

/// An issue returned by a label query against the source repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub number: IssueNumber,
    pub title: String,
    pub url: String,
    pub assignee: Option<Assignee>,
}

// ---------------------------------------------------------------------------
// Rich messages
// ---------------------------------------------------------------------------

/// An RGB accent colour for a rich message, written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccentColor(u32);

impl AccentColor {
    /// Creates a colour from a packed `0xRRGGBB` value.
    ///
    /// Bits above the low 24 are discarded.
    pub const fn from_rgb(rgb: u32) -> Self {
        Self(rgb & 0x00FF_FFFF)
    }

    /// Parses a `#RRGGBB` string. The leading `#` is optional.
    ///
    /// Returns `None` unless exactly six hex digits remain.
    pub fn from_hex(value: &str) -> Option<Self> {
        let digits = value.strip_prefix('#').unwrap_or(value);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self)
    }

    /// Returns the packed `0xRRGGBB` value.
    pub fn as_rgb(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for AccentColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:06X}", self.0)
    }
}

impl TryFrom<String> for AccentColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("'{value}' is not a #RRGGBB colour"))
    }
}

impl From<AccentColor> for String {
    fn from(value: AccentColor) -> Self {
        value.to_string()
    }
}

/// The author block shown at the top of a rich message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAuthor {
    pub name: String,
    pub url: String,
}

/// A labelled name/value pair rendered in the body of a rich message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub name: String,
    pub value: String,
}

/// A vendor-agnostic rich ("embed") chat message.
///
/// `custom_fields` is rendered in order; builders must not reorder or
/// deduplicate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichMessage {
    pub color: AccentColor,
    pub title: String,
    pub url: String,
    pub author: MessageAuthor,
    /// Image URL shown beside the message.
    pub thumbnail: String,
    pub description: Option<String>,
    pub custom_fields: Vec<CustomField>,
}

/// A plain-text message bound for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendTextMessage {
    pub message: String,
    pub channel_id: ChannelId,
}

/// A rich message bound for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEmbedMessage {
    pub message: RichMessage,
    pub channel_id: ChannelId,
}
