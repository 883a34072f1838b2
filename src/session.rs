//! Session lifecycle management.
//!
//! A mailbox session progresses through an ordered set of states:
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> MailboxListed
//!     -> MailboxSelected -> Fetching -> Closing -> Closed
//! ```
//!
//! with a terminal [`Failed`](SessionState::Failed) state reachable from any
//! non-terminal state. [`SessionHandle`] enforces these transitions over any
//! [`MailboxClient`] implementation: an operation attempted out of order
//! fails with [`Error::InvalidState`] naming the expected and actual states,
//! so a half-open session can never be acted on silently.
//!
//! # Example
//!
//! ```no_run
//! use mailbox_stats::{ImapMailboxClient, MailboxConfig, SessionHandle};
//! use mailbox_stats::session::MetadataField;
//! use futures::StreamExt;
//!
//! # async fn example() -> mailbox_stats::Result<()> {
//! # let config = MailboxConfig::builder()
//! #     .host("imap.example.com").username("a@b.c").password("x").build()?;
//! let mut session = SessionHandle::connect(ImapMailboxClient::new(), &config).await?;
//!
//! let info = session.select_mailbox("INBOX").await?;
//! println!("INBOX holds {} messages", info.exists);
//!
//! let mut stream = session
//!     .fetch_metadata("1:*", &[MetadataField::Size, MetadataField::Envelope])
//!     .await?;
//! while let Some(message) = stream.next().await {
//!     println!("{:?}", message?);
//! }
//! drop(stream);
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```

use crate::config::MailboxConfig;
use crate::error::{Error, Result};
use crate::metadata::MessageMetadata;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, instrument, warn};

/// The states of a mailbox session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No connection attempt has been made.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Connected and authenticated.
    Connected,
    /// Mailboxes have been enumerated.
    MailboxListed,
    /// A mailbox is selected and readable.
    MailboxSelected,
    /// A metadata fetch stream is being consumed.
    Fetching,
    /// Logout/close in progress.
    Closing,
    /// The session is closed.
    Closed,
    /// Terminal failure state; no further protocol operations are valid.
    Failed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Disconnected => "Disconnected",
            SessionState::Connecting => "Connecting",
            SessionState::Connected => "Connected",
            SessionState::MailboxListed => "MailboxListed",
            SessionState::MailboxSelected => "MailboxSelected",
            SessionState::Fetching => "Fetching",
            SessionState::Closing => "Closing",
            SessionState::Closed => "Closed",
            SessionState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Metadata items to request in a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    /// Message size in bytes.
    Size,
    /// Structured envelope (sender, subject).
    Envelope,
}

impl MetadataField {
    /// The IMAP fetch item for this field.
    #[must_use]
    pub fn as_fetch_item(self) -> &'static str {
        match self {
            MetadataField::Size => "RFC822.SIZE",
            MetadataField::Envelope => "ENVELOPE",
        }
    }
}

/// Information about a selected mailbox.
#[derive(Debug, Clone, Copy, Default)]
pub struct MailboxInfo {
    /// Number of messages in the mailbox.
    pub exists: u32,
}

/// The operations a mailbox backend must provide.
///
/// The statistics pipeline is polymorphic over any implementation of this
/// trait - the bundled [`ImapMailboxClient`](crate::ImapMailboxClient) speaks
/// IMAP over TLS, and tests drive the same pipeline with a scripted
/// in-memory client. Implementations do not enforce call ordering; that is
/// [`SessionHandle`]'s job.
#[async_trait]
pub trait MailboxClient: Send {
    /// Establishes the transport and authenticates.
    async fn connect(&mut self, config: &MailboxConfig) -> Result<()>;

    /// Enumerates the mailbox names available on the server.
    async fn list_mailboxes(&mut self) -> Result<Vec<String>>;

    /// Selects a mailbox for reading.
    ///
    /// Fails with [`Error::MailboxNotFound`] when the name is unknown to the
    /// server.
    async fn select_mailbox(&mut self, mailbox: &str) -> Result<MailboxInfo>;

    /// Fetches message metadata for a sequence range.
    ///
    /// The returned stream is lazy, finite, yields messages in ascending
    /// sequence-number order, and can be consumed exactly once.
    async fn fetch_metadata(
        &mut self,
        range: &str,
        fields: &[MetadataField],
    ) -> Result<BoxStream<'_, Result<MessageMetadata>>>;

    /// Logs out of the server.
    async fn logout(&mut self) -> Result<()>;

    /// Releases the transport.
    async fn close(&mut self) -> Result<()>;
}

/// A stateful session over a [`MailboxClient`].
///
/// Owns the client for the duration of a run. One handle serves one run;
/// it must not be shared across concurrent runs (nothing here is
/// synchronized, by construction the aggregate has a single writer).
pub struct SessionHandle<C: MailboxClient> {
    client: C,
    state: SessionState,
}

impl<C: MailboxClient> std::fmt::Debug for SessionHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<C: MailboxClient> SessionHandle<C> {
    /// Connects and authenticates, returning a handle in the
    /// [`Connected`](SessionState::Connected) state.
    ///
    /// # Errors
    ///
    /// Propagates the client's connection error; no handle is returned on
    /// failure (there is nothing to close - the client never reached a
    /// usable state).
    #[instrument(
        name = "SessionHandle::connect",
        skip_all,
        fields(host = %config.host, port = config.port, tls = config.tls)
    )]
    pub async fn connect(client: C, config: &MailboxConfig) -> Result<Self> {
        let mut handle = Self {
            client,
            state: SessionState::Connecting,
        };

        match handle.client.connect(config).await {
            Ok(()) => {
                handle.state = SessionState::Connected;
                debug!("session connected");
                Ok(handle)
            }
            Err(error) => Err(error),
        }
    }

    /// Returns the current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Enumerates mailbox names.
    ///
    /// Valid only in [`Connected`](SessionState::Connected); transitions to
    /// [`MailboxListed`](SessionState::MailboxListed).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] out of order, or the client's error
    /// (transitioning to `Failed`).
    #[instrument(name = "SessionHandle::list_mailboxes", skip(self))]
    pub async fn list_mailboxes(&mut self) -> Result<Vec<String>> {
        self.require("list_mailboxes", "Connected", &[SessionState::Connected])?;

        match self.client.list_mailboxes().await {
            Ok(names) => {
                self.state = SessionState::MailboxListed;
                debug!(count = names.len(), "mailboxes listed");
                Ok(names)
            }
            Err(error) => {
                self.state = SessionState::Failed;
                Err(error)
            }
        }
    }

    /// Selects a mailbox for reading.
    ///
    /// Valid in [`Connected`](SessionState::Connected) or
    /// [`MailboxListed`](SessionState::MailboxListed); transitions to
    /// [`MailboxSelected`](SessionState::MailboxSelected).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] out of order,
    /// [`Error::MailboxNotFound`] for an unknown name, or the client's error
    /// (transitioning to `Failed`).
    #[instrument(name = "SessionHandle::select_mailbox", skip(self), fields(mailbox = %mailbox))]
    pub async fn select_mailbox(&mut self, mailbox: &str) -> Result<MailboxInfo> {
        self.require(
            "select_mailbox",
            "Connected or MailboxListed",
            &[SessionState::Connected, SessionState::MailboxListed],
        )?;

        match self.client.select_mailbox(mailbox).await {
            Ok(info) => {
                self.state = SessionState::MailboxSelected;
                debug!(exists = info.exists, "mailbox selected");
                Ok(info)
            }
            Err(error) => {
                self.state = SessionState::Failed;
                Err(error)
            }
        }
    }

    /// Fetches message metadata for a sequence range.
    ///
    /// Valid only in [`MailboxSelected`](SessionState::MailboxSelected);
    /// transitions to [`Fetching`](SessionState::Fetching) for the lifetime
    /// of the returned stream, then back to `MailboxSelected` once the
    /// stream is exhausted. The stream is forward-only and not restartable -
    /// it borrows the handle, so no other session operation is possible
    /// until it is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] out of order, or the client's error
    /// (transitioning to `Failed`).
    #[instrument(name = "SessionHandle::fetch_metadata", skip_all, fields(range = %range))]
    pub async fn fetch_metadata(
        &mut self,
        range: &str,
        fields: &[MetadataField],
    ) -> Result<MetadataStream<'_>> {
        self.require(
            "fetch_metadata",
            "MailboxSelected",
            &[SessionState::MailboxSelected],
        )?;

        let Self { client, state } = self;
        match client.fetch_metadata(range, fields).await {
            Ok(inner) => {
                *state = SessionState::Fetching;
                Ok(MetadataStream { inner, state })
            }
            Err(error) => {
                *state = SessionState::Failed;
                Err(error)
            }
        }
    }

    /// Closes the session: best-effort logout, then transport release.
    ///
    /// Intermediate failures are logged but never propagated - close-time
    /// errors must not abort an already-successful run. The handle ends in
    /// [`Closed`](SessionState::Closed) regardless. Calling this on an
    /// already `Closed` or `Failed` handle is a no-op (on `Failed`, the
    /// transport is released when the client is dropped).
    #[instrument(name = "SessionHandle::close", skip(self))]
    pub async fn close(&mut self) {
        if matches!(self.state, SessionState::Closed | SessionState::Failed) {
            debug!(state = %self.state, "close is a no-op");
            return;
        }

        self.state = SessionState::Closing;

        if let Err(error) = self.client.logout().await {
            warn!(error = %error, "logout failed during close");
        }
        if let Err(error) = self.client.close().await {
            warn!(error = %error, "transport close failed");
        }

        self.state = SessionState::Closed;
        debug!("session closed");
    }

    fn require(
        &self,
        operation: &'static str,
        expected: &'static str,
        allowed: &[SessionState],
    ) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation,
                expected,
                actual: self.state,
            })
        }
    }
}

/// One-shot stream of message metadata borrowed from a [`SessionHandle`].
///
/// Yields messages in ascending sequence-number order. When the underlying
/// stream is exhausted the session returns to
/// [`MailboxSelected`](SessionState::MailboxSelected); when it yields an
/// error the session is marked [`Failed`](SessionState::Failed).
pub struct MetadataStream<'a> {
    inner: BoxStream<'a, Result<MessageMetadata>>,
    state: &'a mut SessionState,
}

impl Stream for MetadataStream<'_> {
    type Item = Result<MessageMetadata>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(None) => {
                if *this.state == SessionState::Fetching {
                    *this.state = SessionState::MailboxSelected;
                }
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(error))) => {
                *this.state = SessionState::Failed;
                Poll::Ready(Some(Err(error)))
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for MetadataStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataStream")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
