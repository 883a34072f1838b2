//! The end-to-end statistics pipeline.

use crate::config::MailboxConfig;
use crate::error::Result;
use crate::session::{MailboxClient, MetadataField, SessionHandle};
use crate::stats::StatsAggregate;
use futures::StreamExt;
use tracing::{debug, instrument};

/// The mailbox a run reads.
const INBOX: &str = "INBOX";

/// Runs the full pipeline: connect, enumerate mailboxes, select INBOX,
/// fetch metadata for every message, aggregate, close.
///
/// Messages are processed strictly sequentially - the aggregate has a single
/// writer and no internal synchronization. On success the aggregate is
/// returned by value and is no longer written to. On any failure after
/// connect, the session is still closed best-effort before the original
/// error is returned; cleanup failures never mask the original cause, and no
/// partial aggregate is ever returned.
///
/// # Errors
///
/// Propagates connection, selection, fetch, and per-message validation
/// errors. A session that fails at connect never reaches the fetch phase.
///
/// # Example
///
/// ```no_run
/// use mailbox_stats::{report, ImapMailboxClient, MailboxConfig};
///
/// # async fn example() -> mailbox_stats::Result<()> {
/// let config = MailboxConfig::builder()
///     .host("imap.example.com")
///     .username("user@example.com")
///     .password("app-password")
///     .build()?;
///
/// let aggregate = mailbox_stats::run(ImapMailboxClient::new(), &config).await?;
/// println!("{}", report::format_report(&aggregate)?);
/// # Ok(())
/// # }
/// ```
#[instrument(name = "pipeline::run", skip_all, fields(host = %config.host))]
pub async fn run<C: MailboxClient>(client: C, config: &MailboxConfig) -> Result<StatsAggregate> {
    // Connect failure means there is no handle to clean up
    let mut session = SessionHandle::connect(client, config).await?;

    let mut aggregate = StatsAggregate::new();
    let result = drive(&mut session, &mut aggregate).await;

    // Best-effort cleanup on every exit path past connect; close never fails
    session.close().await;

    result.map(|()| aggregate)
}

/// Drives a connected session through the fetch phase, filling the aggregate.
async fn drive<C: MailboxClient>(
    session: &mut SessionHandle<C>,
    aggregate: &mut StatsAggregate,
) -> Result<()> {
    // Informational only; the run always reads INBOX
    let mailboxes = session.list_mailboxes().await?;
    debug!(mailboxes = ?mailboxes, "available mailboxes");

    let info = session.select_mailbox(INBOX).await?;
    debug!(exists = info.exists, "opened inbox");

    let mut stream = session
        .fetch_metadata("1:*", &[MetadataField::Size, MetadataField::Envelope])
        .await?;

    while let Some(item) = stream.next().await {
        let message = item?;
        aggregate.process_message(&message)?;
    }

    debug!(messages = aggregate.message_count(), "fetch phase complete");
    Ok(())
}
