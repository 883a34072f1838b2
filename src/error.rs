//! Error types for the mailbox-stats crate.
//!
//! All errors implement [`std::error::Error`] and provide context about what went wrong.
//! Errors are categorized by their retryability - see [`Error::is_retryable`].

use crate::session::SessionState;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a statistics run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration / validation errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Username is not a valid email address.
    #[error("invalid username format: {username}")]
    InvalidUsername {
        /// The invalid username.
        username: String,
    },

    /// Invalid DNS name for TLS.
    #[error("invalid DNS name for host '{host}'")]
    InvalidDnsName {
        /// The invalid hostname.
        host: String,
        /// The underlying DNS name error.
        #[source]
        source: rustls::client::InvalidDnsNameError,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Network / connection errors (RETRYABLE)
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to establish TCP connection.
    #[error("failed to connect to {target}")]
    TcpConnect {
        /// The target address that failed.
        target: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to establish TLS connection.
    #[error("failed to establish TLS connection to {target}")]
    TlsConnect {
        /// The target address that failed.
        target: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Timeout errors (mixed retryability)
    // ─────────────────────────────────────────────────────────────────────────
    /// Connection timeout.
    #[error("connection timeout to {target} after {timeout:?}")]
    ConnectTimeout {
        /// The target address.
        target: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Authentication timeout.
    #[error("authentication timeout for {username} after {timeout:?}")]
    AuthTimeout {
        /// The username used for authentication.
        username: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Mailbox selection timeout.
    #[error("mailbox selection timeout for '{mailbox}' after {timeout:?}")]
    SelectTimeout {
        /// The mailbox name.
        mailbox: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Metadata fetch timeout.
    #[error("metadata fetch timeout for range {range} after {timeout:?}")]
    FetchTimeout {
        /// The sequence range being fetched.
        range: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Logout timeout (not critical).
    #[error("logout timeout after {timeout:?}")]
    LogoutTimeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Protocol errors (RETRYABLE - could be transient server issues)
    // ─────────────────────────────────────────────────────────────────────────
    /// IMAP login failed.
    #[error("IMAP login failed for {username}")]
    Login {
        /// The username used for login.
        username: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Failed to enumerate mailboxes.
    #[error("failed to list mailboxes")]
    ListMailboxes {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Failed to select mailbox for a reason other than the name being unknown.
    #[error("failed to select mailbox '{mailbox}'")]
    SelectMailbox {
        /// The mailbox name.
        mailbox: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP fetch failed.
    #[error("IMAP fetch failed for range {range}")]
    Fetch {
        /// The sequence range that failed.
        range: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Failed to retrieve a message from the fetch stream.
    #[error("failed to retrieve message from fetch stream")]
    FetchMessage {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP logout failed.
    #[error("IMAP logout failed")]
    Logout {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Session-level protocol failure reported by a mailbox client.
    ///
    /// The bundled IMAP client uses the more specific variants above; this
    /// variant exists so alternate [`MailboxClient`](crate::MailboxClient)
    /// implementations can report failures without depending on a particular
    /// backend's error type.
    #[error("protocol failure during {operation}: {message}")]
    Protocol {
        /// The lifecycle operation that failed.
        operation: &'static str,
        /// Description of the failure.
        message: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Session state errors (NOT retryable - caller bug)
    // ─────────────────────────────────────────────────────────────────────────
    /// A lifecycle operation was attempted out of order.
    #[error("cannot {operation} in state {actual}: expected {expected}")]
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
        /// The state(s) the operation is valid in.
        expected: &'static str,
        /// The state the session was actually in.
        actual: SessionState,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Data errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// The requested mailbox does not exist on the server.
    #[error("mailbox '{mailbox}' does not exist on the server")]
    MailboxNotFound {
        /// The mailbox name that was requested.
        mailbox: String,
    },

    /// A retrieved message is missing a field required for aggregation.
    #[error("message {seq} is missing required field '{field}'")]
    MalformedMessage {
        /// Sequence number of the offending message.
        seq: u32,
        /// The missing field.
        field: &'static str,
    },

    /// An average was requested over an empty size sample.
    #[error("cannot compute average size of an empty sample")]
    EmptyDataset,

    /// Failed to serialize counters for the report dump.
    #[error("failed to serialize report data")]
    Serialize {
        /// The underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Returns `true` if this error represents a transient failure that might succeed on retry.
    ///
    /// Use this to implement retry logic:
    ///
    /// ```ignore
    /// if error.is_retryable() {
    ///     // Backoff and retry
    /// } else {
    ///     // Fail permanently
    /// }
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            // RETRYABLE errors: network, operation timeouts, protocol failures
            Error::TcpConnect { .. }
            | Error::TlsConnect { .. }
            | Error::ConnectTimeout { .. }
            | Error::AuthTimeout { .. }
            | Error::SelectTimeout { .. }
            | Error::FetchTimeout { .. }
            | Error::Login { .. }
            | Error::ListMailboxes { .. }
            | Error::SelectMailbox { .. }
            | Error::Fetch { .. }
            | Error::FetchMessage { .. }
            | Error::Protocol { .. } => true,

            // NOT retryable: config errors, caller bugs, missing data, logout
            Error::InvalidConfig { .. }
            | Error::InvalidUsername { .. }
            | Error::InvalidDnsName { .. }
            | Error::LogoutTimeout { .. }
            | Error::Logout { .. }
            | Error::InvalidState { .. }
            | Error::MailboxNotFound { .. }
            | Error::MalformedMessage { .. }
            | Error::EmptyDataset
            | Error::Serialize { .. } => false,
        }
    }

    /// Returns the error category for metrics/logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidConfig { .. }
            | Error::InvalidUsername { .. }
            | Error::InvalidDnsName { .. } => ErrorCategory::Configuration,

            Error::TcpConnect { .. } | Error::TlsConnect { .. } => ErrorCategory::Network,

            Error::ConnectTimeout { .. }
            | Error::AuthTimeout { .. }
            | Error::SelectTimeout { .. }
            | Error::FetchTimeout { .. }
            | Error::LogoutTimeout { .. } => ErrorCategory::Timeout,

            Error::Login { .. }
            | Error::ListMailboxes { .. }
            | Error::SelectMailbox { .. }
            | Error::Fetch { .. }
            | Error::FetchMessage { .. }
            | Error::Logout { .. }
            | Error::Protocol { .. } => ErrorCategory::Protocol,

            Error::InvalidState { .. } => ErrorCategory::State,

            Error::MailboxNotFound { .. } => ErrorCategory::NotFound,

            Error::MalformedMessage { .. } | Error::EmptyDataset | Error::Serialize { .. } => {
                ErrorCategory::Data
            }
        }
    }
}

/// Error categories for metrics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration or validation errors.
    Configuration,
    /// Network connectivity errors.
    Network,
    /// Timeout errors.
    Timeout,
    /// Session protocol errors.
    Protocol,
    /// Lifecycle operations attempted out of order.
    State,
    /// Requested mailbox not found.
    NotFound,
    /// Malformed or insufficient data.
    Data,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Timeout => write!(f, "timeout"),
            ErrorCategory::Protocol => write!(f, "protocol"),
            ErrorCategory::State => write!(f, "state"),
            ErrorCategory::NotFound => write!(f, "not_found"),
            ErrorCategory::Data => write!(f, "data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        // Configuration errors are not retryable
        let err = Error::InvalidUsername {
            username: "bad".into(),
        };
        assert!(!err.is_retryable());

        // Network errors are retryable
        let err = Error::TcpConnect {
            target: "imap.example.com:993".into(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(err.is_retryable());

        // State errors indicate a caller bug and are not retryable
        let err = Error::InvalidState {
            operation: "fetch_metadata",
            expected: "MailboxSelected",
            actual: SessionState::Connected,
        };
        assert!(!err.is_retryable());

        // A malformed message will not improve on retry
        let err = Error::MalformedMessage {
            seq: 7,
            field: "size",
        };
        assert!(!err.is_retryable());

        assert!(!Error::EmptyDataset.is_retryable());
    }

    #[test]
    fn test_error_categories() {
        let err = Error::InvalidConfig {
            message: "host is required".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);

        let err = Error::ConnectTimeout {
            target: "imap.example.com:993".into(),
            timeout: Duration::from_secs(10),
        };
        assert_eq!(err.category(), ErrorCategory::Timeout);

        let err = Error::MailboxNotFound {
            mailbox: "INBOX".into(),
        };
        assert_eq!(err.category(), ErrorCategory::NotFound);

        let err = Error::Protocol {
            operation: "connect",
            message: "greeting was garbage".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Protocol);

        assert_eq!(Error::EmptyDataset.category(), ErrorCategory::Data);
    }

    #[test]
    fn test_invalid_state_names_both_states() {
        let err = Error::InvalidState {
            operation: "list_mailboxes",
            expected: "Connected",
            actual: SessionState::MailboxSelected,
        };
        let message = err.to_string();
        assert!(message.contains("list_mailboxes"));
        assert!(message.contains("Connected"));
        assert!(message.contains("MailboxSelected"));
    }
}
