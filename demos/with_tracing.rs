//! Example: Using tracing for observability.
//!
//! This example demonstrates how to enable structured logging using
//! the `tracing` ecosystem. All lifecycle operations in mailbox-stats emit
//! tracing spans and events.
//!
//! # Usage
//!
//! ```bash
//! export IMAP_HOST="imap.gmail.com"
//! export IMAP_USERNAME="your@email.com"
//! export IMAP_PASSWORD="your-app-password"
//! # Set log level (trace, debug, info, warn, error)
//! export RUST_LOG=mailbox_stats=debug
//!
//! cargo run --example with_tracing
//! ```

use mailbox_stats::{report, ImapMailboxClient, MailboxConfig};
use std::env;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> mailbox_stats::Result<()> {
    // Initialize tracing subscriber with environment filter
    // Use RUST_LOG environment variable to control log levels
    // Example: RUST_LOG=mailbox_stats=debug,info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mailbox_stats=info")),
        )
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let host = env::var("IMAP_HOST").expect("IMAP_HOST environment variable required");
    let username = env::var("IMAP_USERNAME").expect("IMAP_USERNAME environment variable required");
    let password = env::var("IMAP_PASSWORD").expect("IMAP_PASSWORD environment variable required");

    tracing::info!(host = %host, username = %username, "Starting mailbox-stats example");

    let config = MailboxConfig::builder()
        .host(&host)
        .username(&username)
        .password(password)
        .build()?;

    tracing::debug!("Configuration built successfully");

    // The run emits spans for connection, TLS, authentication, selection,
    // and the fetch phase
    let aggregate = mailbox_stats::run(ImapMailboxClient::new(), &config).await?;

    tracing::info!(
        messages = aggregate.message_count(),
        senders = aggregate.sender_counts().len(),
        tags = aggregate.tag_counts().len(),
        "Aggregation complete"
    );

    println!("\n{}", report::format_report(&aggregate)?);

    tracing::info!("Example completed successfully");

    Ok(())
}
