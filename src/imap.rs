//! The bundled IMAP implementation of [`MailboxClient`].
//!
//! Wraps async-imap with per-operation timeouts and maps wire-level fetch
//! results into [`MessageMetadata`]. Call ordering is not enforced here -
//! that is [`SessionHandle`](crate::SessionHandle)'s job; misuse surfaces as
//! [`Error::InvalidState`] against a disconnected session.

use crate::config::{MailboxConfig, TimeoutConfig};
use crate::connection::{establish_stream, MailboxStream};
use crate::error::{Error, Result};
use crate::metadata::{Address, Envelope, MessageMetadata};
use crate::session::{MailboxClient, MailboxInfo, MetadataField, SessionState};
use async_imap::Session;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use imap_proto::types::{Address as ImapAddress, Envelope as ImapEnvelope};
use tracing::{debug, instrument};

/// IMAP session over the configured transport.
type ImapSession = Session<MailboxStream>;

/// Mailbox client speaking IMAP over TLS (or plain TCP when TLS is
/// disabled in the configuration).
///
/// # Example
///
/// ```no_run
/// use mailbox_stats::{ImapMailboxClient, MailboxConfig};
///
/// # async fn example() -> mailbox_stats::Result<()> {
/// let config = MailboxConfig::builder()
///     .host("imap.example.com")
///     .username("user@example.com")
///     .password("app-password")
///     .build()?;
///
/// let aggregate = mailbox_stats::run(ImapMailboxClient::new(), &config).await?;
/// # Ok(())
/// # }
/// ```
pub struct ImapMailboxClient {
    session: Option<ImapSession>,
    timeouts: TimeoutConfig,
}

impl ImapMailboxClient {
    /// Creates a disconnected client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            session: None,
            timeouts: TimeoutConfig::default(),
        }
    }

    fn session_mut(&mut self, operation: &'static str) -> Result<&mut ImapSession> {
        self.session.as_mut().ok_or(Error::InvalidState {
            operation,
            expected: "Connected",
            actual: SessionState::Disconnected,
        })
    }
}

impl Default for ImapMailboxClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ImapMailboxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapMailboxClient")
            .field("connected", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MailboxClient for ImapMailboxClient {
    #[instrument(
        name = "imap::connect",
        skip_all,
        fields(host = %config.host, username = %config.username())
    )]
    async fn connect(&mut self, config: &MailboxConfig) -> Result<()> {
        let target_addr = config.server_address();
        let timeouts = config.timeouts.clone();

        let stream = tokio::time::timeout(
            timeouts.connect,
            establish_stream(&config.host, &target_addr, config.tls),
        )
        .await
        .map_err(|_| Error::ConnectTimeout {
            target: target_addr.clone(),
            timeout: timeouts.connect,
        })??;

        debug!("transport established");

        if config.compression {
            // This backend cannot negotiate COMPRESS=DEFLATE; the flag is
            // meaningful to clients that can.
            debug!("compression requested but not negotiated");
        }

        let client = async_imap::Client::new(stream);

        let session = tokio::time::timeout(
            timeouts.auth,
            client.login(config.username(), config.password()),
        )
        .await
        .map_err(|_| Error::AuthTimeout {
            username: config.username().to_string(),
            timeout: timeouts.auth,
        })?
        .map_err(|e| Error::Login {
            username: config.username().to_string(),
            source: e.0,
        })?;

        debug!("authenticated");

        self.timeouts = timeouts;
        self.session = Some(session);
        Ok(())
    }

    #[instrument(name = "imap::list_mailboxes", skip(self))]
    async fn list_mailboxes(&mut self) -> Result<Vec<String>> {
        let session = self.session_mut("list_mailboxes")?;

        let mut stream = session
            .list(Some(""), Some("*"))
            .await
            .map_err(|source| Error::ListMailboxes { source })?
            .boxed();

        let mut names = Vec::new();
        while let Some(item) = stream.next().await {
            let name = item.map_err(|source| Error::ListMailboxes { source })?;
            names.push(name.name().to_string());
        }

        debug!(count = names.len(), "mailboxes listed");
        Ok(names)
    }

    #[instrument(name = "imap::select_mailbox", skip(self), fields(mailbox = %mailbox))]
    async fn select_mailbox(&mut self, mailbox: &str) -> Result<MailboxInfo> {
        let timeout = self.timeouts.select;
        let session = self.session_mut("select_mailbox")?;

        let selected = tokio::time::timeout(timeout, session.select(mailbox))
            .await
            .map_err(|_| Error::SelectTimeout {
                mailbox: mailbox.to_string(),
                timeout,
            })?
            .map_err(|source| match source {
                // A NO response means the server rejected the name
                async_imap::error::Error::No(_) => Error::MailboxNotFound {
                    mailbox: mailbox.to_string(),
                },
                source => Error::SelectMailbox {
                    mailbox: mailbox.to_string(),
                    source,
                },
            })?;

        debug!(exists = selected.exists, "mailbox selected");
        Ok(MailboxInfo {
            exists: selected.exists,
        })
    }

    #[instrument(name = "imap::fetch_metadata", skip_all, fields(range = %range))]
    async fn fetch_metadata(
        &mut self,
        range: &str,
        fields: &[MetadataField],
    ) -> Result<BoxStream<'_, Result<MessageMetadata>>> {
        let timeout = self.timeouts.fetch;
        let query = fetch_query(fields);
        let session = self.session_mut("fetch_metadata")?;

        debug!(query = %query, "issuing fetch");

        let stream = tokio::time::timeout(timeout, session.fetch(range.to_string(), query))
            .await
            .map_err(|_| Error::FetchTimeout {
                range: range.to_string(),
                timeout,
            })?
            .map_err(|source| Error::Fetch {
                range: range.to_string(),
                source,
            })?;

        Ok(stream
            .map(|item| {
                item.map(|fetch| to_metadata(&fetch))
                    .map_err(|source| Error::FetchMessage { source })
            })
            .boxed())
    }

    #[instrument(name = "imap::logout", skip(self))]
    async fn logout(&mut self) -> Result<()> {
        let timeout = self.timeouts.logout;
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        tokio::time::timeout(timeout, session.logout())
            .await
            .map_err(|_| Error::LogoutTimeout { timeout })?
            .map_err(|source| Error::Logout { source })
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the session closes the underlying transport
        if self.session.take().is_some() {
            debug!("transport released");
        }
        Ok(())
    }
}

/// Builds the IMAP fetch query for the requested metadata fields.
fn fetch_query(fields: &[MetadataField]) -> String {
    let items: Vec<&str> = fields.iter().map(|field| field.as_fetch_item()).collect();
    format!("({})", items.join(" "))
}

/// Maps a wire-level fetch result into the aggregation-facing metadata type.
fn to_metadata(fetch: &async_imap::types::Fetch) -> MessageMetadata {
    MessageMetadata {
        seq: fetch.message,
        size: fetch.size,
        envelope: fetch.envelope().map(convert_envelope),
    }
}

fn convert_envelope(envelope: &ImapEnvelope<'_>) -> Envelope {
    Envelope {
        subject: envelope.subject.as_deref().map(decode),
        from: envelope
            .from
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(convert_address)
            .collect(),
    }
}

fn convert_address(address: &ImapAddress<'_>) -> Address {
    Address {
        name: address.name.as_deref().map(decode),
        address: match (&address.mailbox, &address.host) {
            (Some(mailbox), Some(host)) => Some(format!("{}@{}", decode(mailbox), decode(host))),
            _ => None,
        },
    }
}

/// Decodes raw envelope bytes; invalid UTF-8 is replaced rather than fatal.
fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn empty_envelope() -> ImapEnvelope<'static> {
        ImapEnvelope {
            date: None,
            subject: None,
            from: None,
            sender: None,
            reply_to: None,
            to: None,
            cc: None,
            bcc: None,
            in_reply_to: None,
            message_id: None,
        }
    }

    #[test]
    fn test_fetch_query() {
        assert_eq!(
            fetch_query(&[MetadataField::Size, MetadataField::Envelope]),
            "(RFC822.SIZE ENVELOPE)"
        );
        assert_eq!(fetch_query(&[MetadataField::Envelope]), "(ENVELOPE)");
    }

    #[test]
    fn test_convert_envelope() {
        let envelope = ImapEnvelope {
            subject: Some(Cow::Borrowed(b"[ci] nightly build".as_slice())),
            from: Some(vec![ImapAddress {
                name: Some(Cow::Borrowed(b"CI".as_slice())),
                adl: None,
                mailbox: Some(Cow::Borrowed(b"builds".as_slice())),
                host: Some(Cow::Borrowed(b"example.com".as_slice())),
            }]),
            ..empty_envelope()
        };

        let converted = convert_envelope(&envelope);
        assert_eq!(converted.subject.as_deref(), Some("[ci] nightly build"));
        assert_eq!(converted.sender_address(), Some("builds@example.com"));
    }

    #[test]
    fn test_convert_envelope_without_from() {
        let converted = convert_envelope(&empty_envelope());
        assert_eq!(converted.subject, None);
        assert!(converted.from.is_empty());
        assert_eq!(converted.sender_address(), None);
    }

    #[test]
    fn test_convert_address_without_host() {
        let address = ImapAddress {
            name: None,
            adl: None,
            mailbox: Some(Cow::Borrowed(b"postmaster".as_slice())),
            host: None,
        };
        assert_eq!(convert_address(&address).address, None);
    }
}
