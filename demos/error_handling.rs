//! Example: Proper error handling with retries.
//!
//! This example demonstrates how to handle errors properly, including
//! implementing retry logic based on error retryability.
//!
//! # Usage
//!
//! ```bash
//! export IMAP_HOST="imap.gmail.com"
//! export IMAP_USERNAME="your@email.com"
//! export IMAP_PASSWORD="your-app-password"
//! cargo run --example error_handling
//! ```

use mailbox_stats::{
    report, Error, ErrorCategory, ImapMailboxClient, MailboxConfig, StatsAggregate,
};
use std::env;
use std::time::Duration;

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Run the pipeline with automatic retry for transient failures
async fn run_with_retry(config: &MailboxConfig) -> Result<StatsAggregate, Error> {
    let mut last_error = None;
    let mut backoff = INITIAL_BACKOFF;

    for attempt in 1..=MAX_RETRIES {
        println!("Run attempt {}/{}...", attempt, MAX_RETRIES);

        match mailbox_stats::run(ImapMailboxClient::new(), config).await {
            Ok(aggregate) => {
                println!("Run completed successfully!");
                return Ok(aggregate);
            }
            Err(e) => {
                println!("  Error: {}", e);
                println!("  Category: {}", e.category());
                println!("  Retryable: {}", e.is_retryable());

                if e.is_retryable() && attempt < MAX_RETRIES {
                    println!("  Retrying in {:?}...", backoff);
                    tokio::time::sleep(backoff).await;
                    backoff *= 2; // Exponential backoff
                    last_error = Some(e);
                } else {
                    return Err(e);
                }
            }
        }
    }

    Err(last_error.unwrap())
}

#[tokio::main]
async fn main() {
    let host = env::var("IMAP_HOST").expect("IMAP_HOST environment variable required");
    let username = env::var("IMAP_USERNAME").expect("IMAP_USERNAME environment variable required");
    let password = env::var("IMAP_PASSWORD").expect("IMAP_PASSWORD environment variable required");

    println!("Mailbox Stats - Error Handling Example\n");
    println!("======================================\n");

    // Build configuration
    let config = match MailboxConfig::builder()
        .host(&host)
        .username(&username)
        .password(password)
        .connect_timeout(Duration::from_secs(10))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("This error is NOT retryable - fix your configuration");
            std::process::exit(1);
        }
    };

    // Run with retry logic
    let aggregate = match run_with_retry(&config).await {
        Ok(aggregate) => aggregate,
        Err(e) => {
            match e.category() {
                ErrorCategory::NotFound => {
                    eprintln!("\nMailbox not found: {}", e);
                }
                ErrorCategory::Network | ErrorCategory::Timeout => {
                    eprintln!("\nNetwork/timeout error persisted across retries: {}", e);
                }
                ErrorCategory::Data => {
                    eprintln!("\nA malformed message aborted the run: {}", e);
                }
                _ => {
                    eprintln!("\nRun failed: {}", e);
                }
            }
            std::process::exit(1);
        }
    };

    // An empty mailbox is the one reporting error worth special-casing
    match report::format_report(&aggregate) {
        Ok(text) => println!("\n{text}"),
        Err(Error::EmptyDataset) => println!("\nThe mailbox is empty - nothing to report."),
        Err(e) => eprintln!("\nReport error: {}", e),
    }

    println!("Done!");
}
