//! Port doubles shared by the handler and controller tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pipeline::{
    Actor, BranchName, ChannelId, CommitSha, CommitSummary, IssueNumber, IssueSummary,
    MessageSink, MessageSinkError, NotificationError, PullRequestNumber, PullRequestSubject,
    RepositoryName, SendEmbedMessage, SendTextMessage, SourceRepository, SourceRepositoryError,
    StaticNotificationConfig,
};

use crate::{CommandHandler, IssueCreatedPayload, PullRequestCreatedPayload};

pub const ISSUES_CHANNEL: &str = "111";
pub const PULL_REQUESTS_CHANNEL: &str = "222";
pub const REPOSITORY: &str = "octo-org/herald";

pub fn test_config() -> Arc<StaticNotificationConfig> {
    Arc::new(StaticNotificationConfig::new(
        ChannelId::new(ISSUES_CHANNEL).unwrap(),
        ChannelId::new(PULL_REQUESTS_CHANNEL).unwrap(),
        RepositoryName::new(REPOSITORY).unwrap(),
    ))
}

/// Ordered record of port calls, shared between doubles so tests can assert
/// sequencing across ports.
pub type CallLog = Arc<Mutex<Vec<String>>>;

// ---------------------------------------------------------------------------
// Message sink
// ---------------------------------------------------------------------------

/// Records every message it is given; optionally fails every send.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub embeds: Arc<Mutex<Vec<SendEmbedMessage>>>,
    pub texts: Arc<Mutex<Vec<SendTextMessage>>>,
    log: CallLog,
    fail_with: Option<fn() -> MessageSinkError>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn failing(fail_with: fn() -> MessageSinkError) -> Self {
        Self {
            fail_with: Some(fail_with),
            ..Self::default()
        }
    }

    pub fn sent_embeds(&self) -> Vec<SendEmbedMessage> {
        self.embeds.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send_text_message(&self, payload: SendTextMessage) -> Result<(), MessageSinkError> {
        self.log.lock().unwrap().push("send_text_message".to_string());
        if let Some(fail) = self.fail_with {
            return Err(fail());
        }
        self.texts.lock().unwrap().push(payload);
        Ok(())
    }

    async fn send_embed_message(
        &self,
        payload: SendEmbedMessage,
    ) -> Result<(), MessageSinkError> {
        self.log.lock().unwrap().push("send_embed_message".to_string());
        if let Some(fail) = self.fail_with {
            return Err(fail());
        }
        self.embeds.lock().unwrap().push(payload);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Source repository
// ---------------------------------------------------------------------------

/// Returns preset commits and records the queries it receives.
#[derive(Clone, Default)]
pub struct StubRepository {
    commits: Vec<CommitSummary>,
    pub queries: Arc<Mutex<Vec<(RepositoryName, PullRequestNumber)>>>,
    log: CallLog,
    fail_with: Option<fn() -> SourceRepositoryError>,
}

impl StubRepository {
    pub fn with_commits(commits: Vec<CommitSummary>, log: CallLog) -> Self {
        Self {
            commits,
            log,
            ..Self::default()
        }
    }

    pub fn failing(fail_with: fn() -> SourceRepositoryError) -> Self {
        Self {
            fail_with: Some(fail_with),
            ..Self::default()
        }
    }
}

#[async_trait]
impl SourceRepository for StubRepository {
    async fn get_pull_request_commits(
        &self,
        repository: &RepositoryName,
        pull_request: PullRequestNumber,
    ) -> Result<Vec<CommitSummary>, SourceRepositoryError> {
        self.log
            .lock()
            .unwrap()
            .push("get_pull_request_commits".to_string());
        self.queries
            .lock()
            .unwrap()
            .push((repository.clone(), pull_request));
        if let Some(fail) = self.fail_with {
            return Err(fail());
        }
        Ok(self.commits.clone())
    }

    async fn get_issues_by_label(
        &self,
        _repository: &RepositoryName,
        _label: &str,
    ) -> Result<Vec<IssueSummary>, SourceRepositoryError> {
        Ok(vec![])
    }
}

// ---------------------------------------------------------------------------
// Command handler
// ---------------------------------------------------------------------------

/// Records the payloads it is executed with; optionally fails.
pub struct RecordingHandler<P> {
    pub payloads: Arc<Mutex<Vec<P>>>,
    fail_with: Option<fn() -> NotificationError>,
}

impl<P> RecordingHandler<P> {
    pub fn new() -> Self {
        Self {
            payloads: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(fail_with: fn() -> NotificationError) -> Self {
        Self {
            payloads: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(fail_with),
        }
    }
}

#[async_trait]
impl<P: Send + Sync + 'static> CommandHandler for RecordingHandler<P> {
    type Payload = P;

    async fn execute(&self, payload: P) -> Result<(), NotificationError> {
        self.payloads.lock().unwrap().push(payload);
        match self.fail_with {
            Some(fail) => Err(fail()),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn commit(sha: &str, message: &str) -> CommitSummary {
    CommitSummary {
        sha: CommitSha::new(sha).unwrap(),
        message: message.to_string(),
    }
}

pub fn issue_payload(labels: &[&str]) -> IssueCreatedPayload {
    IssueCreatedPayload {
        issue_title: "Bug".to_string(),
        issue_url: "https://github.com/octo-org/herald/issues/42".to_string(),
        issue_number: IssueNumber::new(42),
        issue_labels: labels.iter().map(|l| l.to_string()).collect(),
        creator_name: "alice".to_string(),
        creator_avatar_url: "https://avatars.example.com/alice".to_string(),
        creator_html_url: "https://github.com/alice".to_string(),
    }
}

pub fn pull_request_payload() -> PullRequestCreatedPayload {
    PullRequestCreatedPayload {
        pull_request: PullRequestSubject {
            number: PullRequestNumber::new(7),
            title: "Add feature".to_string(),
            url: "https://github.com/octo-org/herald/pull/7".to_string(),
            source_branch: BranchName::new("feature/x").unwrap(),
            target_branch: BranchName::new("main").unwrap(),
            number_of_commits: 2,
        },
        creator: Actor {
            name: "bob".to_string(),
            profile_url: "https://github.com/bob".to_string(),
            avatar_url: "https://avatars.example.com/bob".to_string(),
        },
    }
}
