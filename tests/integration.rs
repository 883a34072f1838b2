//! Integration tests for mailbox-stats.
//!
//! These tests require a real IMAP server and are disabled by default.
//! To run them:
//!
//! ```bash
//! # Set environment variables
//! export MAILBOX_STATS_TEST_HOST="imap.example.com"
//! export MAILBOX_STATS_TEST_EMAIL="your@email.com"
//! export MAILBOX_STATS_TEST_PASSWORD="your-app-password"
//!
//! # Optional: non-default port
//! export MAILBOX_STATS_TEST_PORT="993"
//!
//! # Run with the integration-tests feature
//! cargo test --features integration-tests -- --ignored
//! ```

use mailbox_stats::{report, ImapMailboxClient, MailboxConfig, SessionHandle, SessionState};
use std::env;

// ─────────────────────────────────────────────────────────────────────────────
// Test Configuration Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn get_test_config() -> Option<MailboxConfig> {
    dotenvy::dotenv().ok();
    let host = env::var("MAILBOX_STATS_TEST_HOST").ok()?;
    let email = env::var("MAILBOX_STATS_TEST_EMAIL").ok()?;
    let password = env::var("MAILBOX_STATS_TEST_PASSWORD").ok()?;

    let mut builder = MailboxConfig::builder()
        .host(host)
        .username(email)
        .password(password);

    if let Ok(port) = env::var("MAILBOX_STATS_TEST_PORT") {
        builder = builder.port(port.parse().ok()?);
    }

    builder.build().ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "requires real IMAP server"]
async fn test_connect_and_close() {
    let config = get_test_config().expect("Test config from environment variables");

    let mut session = SessionHandle::connect(ImapMailboxClient::new(), &config)
        .await
        .expect("Failed to connect");

    assert_eq!(session.state(), SessionState::Connected);

    session.close().await;
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
#[ignore = "requires real IMAP server"]
async fn test_list_contains_inbox() {
    let config = get_test_config().expect("Test config from environment variables");

    let mut session = SessionHandle::connect(ImapMailboxClient::new(), &config)
        .await
        .expect("Failed to connect");

    let mailboxes = session.list_mailboxes().await.expect("Failed to list");
    assert!(
        mailboxes.iter().any(|name| name.eq_ignore_ascii_case("INBOX")),
        "server did not report an INBOX: {mailboxes:?}"
    );

    session.close().await;
}

// ─────────────────────────────────────────────────────────────────────────────
// Full Run Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "requires real IMAP server"]
async fn test_full_run_produces_report() {
    let config = get_test_config().expect("Test config from environment variables");

    let aggregate = mailbox_stats::run(ImapMailboxClient::new(), &config)
        .await
        .expect("Run failed");

    // Counter invariants hold regardless of mailbox contents
    let sender_total: u64 = aggregate.sender_counts().values().sum();
    assert!(sender_total <= aggregate.message_count() as u64);

    match report::format_report(&aggregate) {
        Ok(text) => {
            assert!(text.contains("Total messages"));
            println!("{text}");
        }
        Err(e) => {
            // An empty mailbox is the only acceptable reporting failure
            assert!(aggregate.is_empty(), "unexpected report error: {e}");
        }
    }
}

#[tokio::test]
#[ignore = "requires intentionally wrong credentials"]
async fn test_invalid_credentials() {
    let config = MailboxConfig::builder()
        .host("imap.gmail.com")
        .username("test@gmail.com")
        .password("wrong-password")
        .build()
        .expect("valid config structure");

    let result = mailbox_stats::run(ImapMailboxClient::new(), &config).await;

    assert!(result.is_err());
    let err = result.unwrap_err();

    // Authentication errors are retryable (could be temporary server issue)
    println!("Connection error: {}", err);
    println!("Category: {}", err.category());
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Tests (no server required)
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_invalid_username_format() {
    let result = MailboxConfig::builder()
        .host("imap.example.com")
        .username("not-an-email")
        .password("password")
        .build();

    assert!(result.is_err());
}

#[tokio::test]
async fn test_missing_required_fields() {
    // Missing host
    let result = MailboxConfig::builder()
        .username("test@example.com")
        .password("password")
        .build();
    assert!(result.is_err());

    // Missing username
    let result = MailboxConfig::builder()
        .host("imap.example.com")
        .password("password")
        .build();
    assert!(result.is_err());

    // Missing password
    let result = MailboxConfig::builder()
        .host("imap.example.com")
        .username("test@example.com")
        .build();
    assert!(result.is_err());
}
