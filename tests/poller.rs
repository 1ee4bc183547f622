//! Inbox-polling scenarios against a mock mail-capture server.

use dm_account_client::{
    Error, MailhogClient, PollConfig, TieBreak, TokenPoller, TokenQuery,
};
use httpmock::prelude::*;
use serde_json::{Value, json};
use std::time::Duration;

fn inbox(items: Vec<Value>) -> Value {
    json!({
        "total": items.len(),
        "count": items.len(),
        "start": 0,
        "items": items,
    })
}

fn activation_mail(login: &str, to: &str, token: &str) -> Value {
    let body = json!({
        "Login": login,
        "ConfirmationLinkUrl": format!("http://localhost:5051/v1/account/{token}"),
    });
    json!({
        "ID": format!("id-{token}"),
        "Content": {
            "Headers": {"From": ["noreply@dm.am"], "To": [to]},
            "Body": body.to_string(),
        }
    })
}

fn fast_config() -> PollConfig {
    PollConfig {
        interval: Duration::ZERO,
        ..PollConfig::default()
    }
}

fn poller(server: &MockServer, config: PollConfig) -> TokenPoller {
    let mailhog = MailhogClient::new(server.base_url()).unwrap();
    TokenPoller::with_config(mailhog, config)
}

#[tokio::test]
async fn single_match_returns_trailing_token_segment() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/messages");
            then.status(200)
                .json_body(inbox(vec![activation_mail("alice", "alice@example.com", "abc123")]));
        })
        .await;

    let token = poller(&server, fast_config())
        .poll(&TokenQuery::activation_by_login("alice"))
        .await
        .unwrap();

    assert_eq!(token, "abc123");
    mock.assert_async().await;
}

#[tokio::test]
async fn empty_inbox_exhausts_the_attempt_budget() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/messages");
            then.status(200).json_body(inbox(vec![]));
        })
        .await;

    let err = poller(&server, fast_config())
        .poll(&TokenQuery::activation_by_login("alice"))
        .await
        .unwrap_err();

    match err {
        Error::TokenNotFound { match_key, attempts } => {
            assert_eq!(match_key, "alice");
            assert_eq!(attempts, 5);
        }
        other => panic!("expected TokenNotFound, got {other:?}"),
    }
    // One inbox fetch per attempt, nothing more.
    mock.assert_hits_async(5).await;
}

#[tokio::test]
async fn last_match_wins_by_default() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/messages");
            then.status(200).json_body(inbox(vec![
                activation_mail("alice", "alice@example.com", "older"),
                activation_mail("alice", "alice@example.com", "newer"),
            ]));
        })
        .await;

    let token = poller(&server, fast_config())
        .poll(&TokenQuery::activation_by_login("alice"))
        .await
        .unwrap();

    assert_eq!(token, "newer");
}

#[tokio::test]
async fn first_match_wins_when_configured() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/messages");
            then.status(200).json_body(inbox(vec![
                activation_mail("alice", "alice@example.com", "older"),
                activation_mail("alice", "alice@example.com", "newer"),
            ]));
        })
        .await;

    let config = PollConfig {
        tie_break: TieBreak::First,
        ..fast_config()
    };
    let token = poller(&server, config)
        .poll(&TokenQuery::activation_by_login("alice"))
        .await
        .unwrap();

    assert_eq!(token, "older");
}

#[tokio::test]
async fn repeated_polls_of_an_unchanged_inbox_agree() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/messages");
            then.status(200)
                .json_body(inbox(vec![activation_mail("alice", "alice@example.com", "stable")]));
        })
        .await;

    let poller = poller(&server, fast_config());
    let query = TokenQuery::activation_by_login("alice");
    let first = poller.poll(&query).await.unwrap();
    let second = poller.poll(&query).await.unwrap();

    assert_eq!(first, "stable");
    assert_eq!(first, second);
    mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn malformed_messages_are_skipped_not_fatal() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/messages");
            then.status(200).json_body(inbox(vec![
                json!({
                    "ID": "garbled",
                    "Content": {"Headers": {"To": ["alice@example.com"]}, "Body": "<html>not json</html>"},
                }),
                json!({
                    // Matching login but no link field at all.
                    "ID": "linkless",
                    "Content": {"Headers": {"To": ["alice@example.com"]}, "Body": json!({"Login": "alice"}).to_string()},
                }),
                activation_mail("alice", "alice@example.com", "abc123"),
            ]));
        })
        .await;

    let token = poller(&server, fast_config())
        .poll(&TokenQuery::activation_by_login("alice"))
        .await
        .unwrap();

    assert_eq!(token, "abc123");
}

#[tokio::test]
async fn missing_link_field_keeps_polling_until_exhaustion() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/messages");
            then.status(200).json_body(inbox(vec![json!({
                "ID": "linkless",
                "Content": {"Headers": {"To": ["alice@example.com"]}, "Body": json!({"Login": "alice"}).to_string()},
            })]));
        })
        .await;

    let config = PollConfig {
        max_attempts: 3,
        ..fast_config()
    };
    let err = poller(&server, config)
        .poll(&TokenQuery::activation_by_login("alice"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::TokenNotFound { attempts: 3, .. }));
    mock.assert_hits_async(3).await;
}

#[tokio::test]
async fn recipient_matching_reads_the_to_header() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/messages");
            then.status(200).json_body(inbox(vec![
                // Login field still names the old identity; only the To
                // header carries the changed address.
                activation_mail("alice", "alice.new@example.com", "post-change"),
                activation_mail("bob", "bob@example.com", "other"),
            ]));
        })
        .await;

    let token = poller(&server, fast_config())
        .poll(&TokenQuery::activation_by_recipient("alice.new@example.com"))
        .await
        .unwrap();

    assert_eq!(token, "post-change");
}

#[tokio::test]
async fn transport_errors_propagate_without_retry() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/messages");
            then.status(500);
        })
        .await;

    let err = poller(&server, fast_config())
        .poll(&TokenQuery::activation_by_login("alice"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Request(_)));
    // The failing fetch aborts the poll; no further attempts are made.
    mock.assert_hits_async(1).await;
}
