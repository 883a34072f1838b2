//! Example: produce a statistics report for an inbox.
//!
//! Connects to the configured server, aggregates metadata for every message
//! in INBOX, and prints the formatted report.
//!
//! # Usage
//!
//! ```bash
//! export IMAP_HOST="imap.gmail.com"
//! export IMAP_USERNAME="your@email.com"
//! export IMAP_PASSWORD="your-app-password"
//! cargo run --example inbox_report
//! ```

use mailbox_stats::{report, ImapMailboxClient, MailboxConfig};
use std::env;

#[tokio::main]
async fn main() -> mailbox_stats::Result<()> {
    let host = env::var("IMAP_HOST").expect("IMAP_HOST environment variable required");
    let username = env::var("IMAP_USERNAME").expect("IMAP_USERNAME environment variable required");
    let password = env::var("IMAP_PASSWORD").expect("IMAP_PASSWORD environment variable required");

    let mut builder = MailboxConfig::builder()
        .host(&host)
        .username(&username)
        .password(password);

    if let Ok(port) = env::var("IMAP_PORT") {
        builder = builder.port(port.parse().expect("IMAP_PORT must be a port number"));
    }

    let config = builder.build()?;

    println!("Connecting to {} as {}...", config.server_address(), username);

    let aggregate = mailbox_stats::run(ImapMailboxClient::new(), &config).await?;

    println!("Processed {} messages.\n", aggregate.message_count());
    println!("{}", report::format_report(&aggregate)?);

    Ok(())
}
