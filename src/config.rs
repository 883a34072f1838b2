//! Configuration for a mailbox statistics run.
//!
//! Use [`MailboxConfigBuilder`] to create a configuration with sensible defaults:
//!
//! ```
//! use mailbox_stats::MailboxConfig;
//!
//! let config = MailboxConfig::builder()
//!     .host("imap.example.com")
//!     .username("user@example.com")
//!     .password("app-password")
//!     .build()
//!     .expect("valid config");
//! ```

use crate::error::{Error, Result};
use email_address::EmailAddress;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Configuration for connecting to a mailbox server.
///
/// Create using [`MailboxConfig::builder()`]. The configuration is immutable
/// once a session starts; the session takes it by reference and never writes
/// back.
///
/// Note: The `password` field is stored as a [`SecretString`] to prevent
/// accidental logging of sensitive credentials. The `username` field is
/// stored as a validated [`EmailAddress`] type.
#[derive(Clone)]
pub struct MailboxConfig {
    /// Server hostname. Required; there is no discovery fallback.
    pub host: String,
    /// Server port (default: 993 for IMAPS).
    pub port: u16,
    /// Login username, stored as a validated `EmailAddress`.
    username: EmailAddress,
    /// Login password or app-specific password (protected from accidental logging).
    password: SecretString,
    /// Whether to negotiate TLS for the connection (default: true).
    pub tls: bool,
    /// Whether the client should request transport compression (default: true).
    pub compression: bool,
    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
}

impl std::fmt::Debug for MailboxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username.as_str())
            .field("password", &"[REDACTED]")
            .field("tls", &self.tls)
            .field("compression", &self.compression)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl MailboxConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> MailboxConfigBuilder {
        MailboxConfigBuilder::default()
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns a reference to the validated username address.
    #[must_use]
    pub fn username_address(&self) -> &EmailAddress {
        &self.username
    }

    /// Returns the password as a string slice.
    ///
    /// Use this method when you need to pass the password to authentication.
    /// The password is intentionally not directly accessible to prevent accidental logging.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Returns the full server address as "host:port".
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Timeout configuration for the lifecycle operations.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for establishing the TCP/TLS connection.
    pub connect: Duration,
    /// Timeout for authentication.
    pub auth: Duration,
    /// Timeout for selecting a mailbox.
    pub select: Duration,
    /// Timeout for issuing a metadata fetch.
    pub fetch: Duration,
    /// Timeout for the logout operation.
    pub logout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            auth: Duration::from_secs(30),
            select: Duration::from_secs(10),
            fetch: Duration::from_secs(30),
            logout: Duration::from_secs(5),
        }
    }
}

/// Validates a username as an email address.
fn validate_username(username: &str) -> Result<EmailAddress> {
    EmailAddress::parse_with_options(username, email_address::Options::default()).map_err(|_| {
        Error::InvalidUsername {
            username: username.to_string(),
        }
    })
}

/// Builder for [`MailboxConfig`].
#[derive(Debug, Default)]
pub struct MailboxConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    tls: Option<bool>,
    compression: Option<bool>,
    timeouts: Option<TimeoutConfig>,
}

impl MailboxConfigBuilder {
    /// Sets the server hostname (required).
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the server port.
    ///
    /// Default is 993 (IMAPS with TLS).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the login username (required).
    ///
    /// Must be a syntactically valid email address.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the password (required).
    ///
    /// For Gmail/Outlook, use an app-specific password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Enables or disables TLS for the connection.
    ///
    /// Default is enabled. With TLS disabled the connection is plain TCP;
    /// only do this against servers you control.
    #[must_use]
    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Enables or disables transport compression.
    ///
    /// Default is enabled. Whether compression is actually negotiated is up
    /// to the mailbox client implementation.
    #[must_use]
    pub fn compression(mut self, compression: bool) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Sets timeout configuration.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts
            .get_or_insert_with(TimeoutConfig::default)
            .connect = timeout;
        self
    }

    /// Sets the authentication timeout.
    #[must_use]
    pub fn auth_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.get_or_insert_with(TimeoutConfig::default).auth = timeout;
        self
    }

    /// Sets the metadata fetch timeout.
    #[must_use]
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts
            .get_or_insert_with(TimeoutConfig::default)
            .fetch = timeout;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing or invalid.
    pub fn build(self) -> Result<MailboxConfig> {
        let host = self.host.ok_or_else(|| Error::InvalidConfig {
            message: "host is required".into(),
        })?;

        if host.is_empty() {
            return Err(Error::InvalidConfig {
                message: "host must not be empty".into(),
            });
        }

        let username_raw = self.username.ok_or_else(|| Error::InvalidConfig {
            message: "username is required".into(),
        })?;

        // Validate username format using the email_address crate
        let username = validate_username(&username_raw)?;

        let password_raw = self.password.ok_or_else(|| Error::InvalidConfig {
            message: "password is required".into(),
        })?;

        Ok(MailboxConfig {
            host,
            port: self.port.unwrap_or(993),
            username,
            password: SecretString::from(password_raw),
            tls: self.tls.unwrap_or(true),
            compression: self.compression.unwrap_or(true),
            timeouts: self.timeouts.unwrap_or_default(),
        })
    }
}
