//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! an [`IssueNumber`] with a [`PullRequestNumber`] even though both are `u64`
//! under the hood, or a [`ChannelId`] with a [`RepositoryName`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(test)]
#[path = "identifiers_tests.rs"]
mod tests;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (GitHub-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: GitHub-integer-backed
// ---------------------------------------------------------------------------

u64_id! {
    /// The repository-scoped number GitHub assigns to an issue.
    IssueNumber
}

u64_id! {
    /// The repository-scoped number GitHub assigns to a pull request.
    PullRequestNumber
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a chat channel that messages are posted to.
    ///
    /// Discord channel ids are snowflakes; they are kept as strings so that no
    /// precision is lost on the way through JSON.
    ChannelId
}

string_id! {
    /// A Git branch name (e.g. `"main"`, `"feature/login"`).
    BranchName
}

string_id! {
    /// A Git commit SHA (40-character lowercase hex string).
    CommitSha
}

/// Number of leading SHA characters shown in chat messages.
pub const SHORT_SHA_LEN: usize = 7;

impl CommitSha {
    /// Returns the abbreviated form of the SHA: its first seven characters.
    ///
    /// SHAs shorter than seven characters are returned whole.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(SHORT_SHA_LEN) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

string_id! {
    /// Identifies one webhook delivery, taken from the `X-GitHub-Delivery`
    /// header. Used only to correlate log lines.
    DeliveryId
}

impl DeliveryId {
    /// Generates a random delivery id for requests that arrive without one.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

// ---------------------------------------------------------------------------
// RepositoryName
// ---------------------------------------------------------------------------

/// Identifies a GitHub repository in `"owner/repo"` format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryName {
    owner: String,
    name: String,
}

impl RepositoryName {
    /// Parses an `"owner/repo"` string.
    ///
    /// Returns `None` unless the value contains exactly one `/` with a
    /// non-empty segment on each side.
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let (owner, name) = value.as_ref().split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// The account or organisation that owns the repository.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The repository name without its owner.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl TryFrom<String> for RepositoryName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value).ok_or_else(|| format!("'{value}' is not in owner/repo format"))
    }
}

impl From<RepositoryName> for String {
    fn from(value: RepositoryName) -> Self {
        value.to_string()
    }
}
