use super::*;
use crate::testing::{
    commit, pull_request_payload, test_config, CallLog, RecordingSink, StubRepository,
    PULL_REQUESTS_CHANNEL, REPOSITORY,
};
use pipeline::{
    ChannelId, MessageSinkError, PullRequestNumber, RepositoryName, SourceRepositoryError,
};

fn handler(sink: &RecordingSink, repository: &StubRepository) -> PullRequestCreatedHandler {
    PullRequestCreatedHandler::new(
        Arc::new(sink.clone()),
        Arc::new(repository.clone()),
        test_config(),
    )
}

#[tokio::test]
async fn test_sends_embed_with_commit_fields() {
    let log = CallLog::default();
    let sink = RecordingSink::with_log(log.clone());
    let repository = StubRepository::with_commits(
        vec![
            commit("a1b2c3d4e5f6a7b8", "Add parser"),
            commit("0011223344556677", "Fix tests"),
        ],
        log,
    );

    handler(&sink, &repository)
        .execute(pull_request_payload())
        .await
        .unwrap();

    let sent = sink.sent_embeds();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].channel_id,
        ChannelId::new(PULL_REQUESTS_CHANNEL).unwrap()
    );

    let message = &sent[0].message;
    assert_eq!(message.title, "#7: Add feature");
    assert_eq!(message.color, PULL_REQUEST_COLOR);
    assert_eq!(
        message.description.as_deref(),
        Some("Merge 2 commits from `feature/x` into `main`")
    );
    assert_eq!(message.author.name, "bob");
    assert_eq!(message.author.url, "https://github.com/bob");
    assert_eq!(message.thumbnail, "https://avatars.example.com/bob");

    assert_eq!(message.custom_fields.len(), 2);
    assert_eq!(message.custom_fields[0].name, "a1b2c3d");
    assert_eq!(message.custom_fields[0].value, "Add parser");
    assert_eq!(message.custom_fields[1].name, "0011223");
    assert_eq!(message.custom_fields[1].value, "Fix tests");
}

#[tokio::test]
async fn test_queries_configured_repository_before_sending() {
    let log = CallLog::default();
    let sink = RecordingSink::with_log(log.clone());
    let repository = StubRepository::with_commits(vec![], log.clone());

    handler(&sink, &repository)
        .execute(pull_request_payload())
        .await
        .unwrap();

    assert_eq!(
        repository.queries.lock().unwrap().as_slice(),
        &[(
            RepositoryName::new(REPOSITORY).unwrap(),
            PullRequestNumber::new(7)
        )]
    );
    assert_eq!(
        log.lock().unwrap().as_slice(),
        &["get_pull_request_commits", "send_embed_message"]
    );
}

#[tokio::test]
async fn test_field_count_follows_returned_commits_not_payload_count() {
    let log = CallLog::default();
    let sink = RecordingSink::with_log(log.clone());
    let commits = (0..5)
        .map(|i| commit(&format!("{i:040}"), &format!("commit {i}")))
        .collect();
    let repository = StubRepository::with_commits(commits, log);

    handler(&sink, &repository)
        .execute(pull_request_payload())
        .await
        .unwrap();

    let fields = &sink.sent_embeds()[0].message.custom_fields;
    assert_eq!(fields.len(), 5);
    let values: Vec<&str> = fields.iter().map(|f| f.value.as_str()).collect();
    assert_eq!(
        values,
        ["commit 0", "commit 1", "commit 2", "commit 3", "commit 4"]
    );
}

#[tokio::test]
async fn test_repository_failure_sends_nothing() {
    let sink = RecordingSink::new();
    let repository = StubRepository::failing(|| SourceRepositoryError::NotFound {
        resource: "pulls/7".to_string(),
    });

    let result = handler(&sink, &repository)
        .execute(pull_request_payload())
        .await;

    assert!(matches!(
        result,
        Err(NotificationError::Enrichment(
            SourceRepositoryError::NotFound { .. }
        ))
    ));
    assert!(sink.sent_embeds().is_empty());
}

#[tokio::test]
async fn test_sink_failure_propagates() {
    let sink = RecordingSink::failing(|| MessageSinkError::RateLimited { retry_after: None });
    let repository = StubRepository::with_commits(vec![], CallLog::default());

    let result = handler(&sink, &repository)
        .execute(pull_request_payload())
        .await;

    assert!(matches!(
        result,
        Err(NotificationError::Delivery(
            MessageSinkError::RateLimited { .. }
        ))
    ));
}

#[test]
fn test_build_message_keeps_duplicate_commits() {
    let commits = [commit("aaaaaaaaaa", "same"), commit("aaaaaaaaaa", "same")];

    let message = build_pull_request_message(&pull_request_payload(), &commits);

    assert_eq!(message.custom_fields.len(), 2);
    assert_eq!(message.custom_fields[0], message.custom_fields[1]);
}
