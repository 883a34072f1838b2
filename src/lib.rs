//! # mailbox-stats
//!
//! Async IMAP client that aggregates mailbox statistics from message metadata.
//!
//! This crate connects to a mailbox server, bulk-fetches message metadata
//! (size + envelope) from the INBOX, and produces rankable in-memory
//! statistics:
//!
//! - per-sender message counts
//! - per-tag counts (a tag is a `[bracketed]` token in the subject line)
//! - the size distribution across all messages
//!
//! Aggregation is single-pass and non-durable: a run yields either a
//! complete [`StatsAggregate`] or an error, never both.
//!
//! ## Features
//!
//! - **`observability`**: Enables OpenTelemetry integration for distributed tracing.
//!   Without this feature, tracing spans are still emitted but require no OTEL dependencies.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailbox_stats::{report, ImapMailboxClient, MailboxConfig};
//!
//! # async fn example() -> mailbox_stats::Result<()> {
//! // Configure the connection
//! let config = MailboxConfig::builder()
//!     .host("imap.gmail.com")
//!     .username("user@gmail.com")
//!     .password("app-password")  // Use app-specific password for Gmail
//!     .build()?;
//!
//! // One run: connect, fetch, aggregate, close
//! let aggregate = mailbox_stats::run(ImapMailboxClient::new(), &config).await?;
//!
//! println!("{}", report::format_report(&aggregate)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Driving the session directly
//!
//! The pipeline is a thin composition over [`SessionHandle`], which enforces
//! the session lifecycle (connect, list, select, fetch, close) over any
//! [`MailboxClient`] implementation. Out-of-order operations fail with
//! [`Error::InvalidState`] rather than acting on a half-open session:
//!
//! ```no_run
//! use futures::StreamExt;
//! use mailbox_stats::session::MetadataField;
//! use mailbox_stats::{ImapMailboxClient, MailboxConfig, SessionHandle, StatsAggregate};
//!
//! # async fn example() -> mailbox_stats::Result<()> {
//! # let config = MailboxConfig::builder()
//! #     .host("imap.example.com").username("a@b.c").password("x").build()?;
//! let mut session = SessionHandle::connect(ImapMailboxClient::new(), &config).await?;
//! let mut aggregate = StatsAggregate::new();
//!
//! session.select_mailbox("INBOX").await?;
//! let mut stream = session
//!     .fetch_metadata("1:*", &[MetadataField::Size, MetadataField::Envelope])
//!     .await?;
//! while let Some(message) = stream.next().await {
//!     aggregate.process_message(&message?)?;
//! }
//! drop(stream);
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All errors implement `std::error::Error` and provide context. Use [`Error::is_retryable`]
//! to determine if an operation can be retried:
//!
//! ```
//! use mailbox_stats::Error;
//!
//! fn handle_error(error: &Error) {
//!     if error.is_retryable() {
//!         println!("Transient error, can retry: {}", error);
//!     } else {
//!         println!("Permanent error: {}", error);
//!     }
//! }
//! ```
//!
//! ## Observability
//!
//! The crate uses `tracing` for instrumentation. All lifecycle operations emit
//! spans with structured fields suitable for distributed tracing.
//!
//! ### Span Naming Convention
//!
//! - `pipeline::run` - Full statistics run
//! - `SessionHandle::connect` - Session establishment
//! - `SessionHandle::fetch_metadata` - Metadata fetch
//! - `SessionHandle::close` - Session teardown
//! - `imap::connect` - IMAP transport + authentication
//! - `connection::establish` - TCP/TLS connection
//!
//! ### Standard Fields
//!
//! - `host` - Mailbox server hostname
//! - `mailbox` - Mailbox name
//! - `range` - Fetch sequence range
//! - `exists` - Message count of the selected mailbox
//!
//! Enable the `observability` feature for OpenTelemetry integration.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod config;
pub mod error;
pub mod metadata;
pub mod report;
pub mod session;
pub mod stats;
pub mod tags;

// Internal modules
mod connection;
mod imap;
mod pipeline;

// Re-exports for ergonomic API
pub use config::{MailboxConfig, MailboxConfigBuilder, TimeoutConfig};
pub use email_address::EmailAddress;
pub use error::{Error, ErrorCategory, Result};
pub use imap::ImapMailboxClient;
pub use metadata::{Address, Envelope, MessageMetadata};
pub use pipeline::run;
pub use session::{MailboxClient, MailboxInfo, SessionHandle, SessionState};
pub use stats::StatsAggregate;
