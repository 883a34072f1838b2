//! Internal module for establishing transport connections to mailbox servers.
//!
//! Supports TLS (the default) and plain TCP when TLS is disabled in the
//! configuration.

use crate::error::{Error, Result};
use rustls::ClientConfig;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, instrument};
use webpki_roots::TLS_SERVER_ROOTS;

/// A TLS stream over TCP.
pub(crate) type TlsStream = tokio_rustls::client::TlsStream<TcpStream>;

/// The transport a session runs over: TLS or plain TCP.
///
/// One enum so a single session type serves both configurations.
#[derive(Debug)]
pub(crate) enum MailboxStream {
    Tls(TlsStream),
    Plain(TcpStream),
}

impl AsyncRead for MailboxStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MailboxStream::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
            MailboxStream::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for MailboxStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            MailboxStream::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
            MailboxStream::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MailboxStream::Tls(stream) => Pin::new(stream).poll_flush(cx),
            MailboxStream::Plain(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MailboxStream::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
            MailboxStream::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Establishes the transport to a mailbox server.
///
/// With `tls` enabled, performs a TLS handshake on top of the TCP
/// connection; otherwise the raw TCP stream is used as-is.
#[instrument(
    name = "connection::establish",
    skip_all,
    fields(host = %host, target_addr = %target_addr, tls = tls)
)]
pub(crate) async fn establish_stream(
    host: &str,
    target_addr: &str,
    tls: bool,
) -> Result<MailboxStream> {
    let tcp_stream = connect_tcp(target_addr).await?;

    if !tls {
        debug!("using plain TCP transport");
        return Ok(MailboxStream::Plain(tcp_stream));
    }

    let connector = create_tls_connector();
    let server_name = parse_server_name(host)?;

    debug!("Performing TLS handshake");

    let tls_stream = connector
        .connect(server_name, tcp_stream)
        .await
        .map_err(|source| Error::TlsConnect {
            target: target_addr.to_string(),
            source,
        })?;

    Ok(MailboxStream::Tls(tls_stream))
}

/// Creates a TLS connector with system root certificates.
fn create_tls_connector() -> TlsConnector {
    let mut root_cert_store = rustls::RootCertStore::empty();
    root_cert_store.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|ta| {
        rustls::OwnedTrustAnchor::from_subject_spki_name_constraints(
            ta.subject,
            ta.spki,
            ta.name_constraints,
        )
    }));

    let tls_config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(root_cert_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(tls_config))
}

/// Parses server name for TLS SNI.
fn parse_server_name(host: &str) -> Result<rustls::ServerName> {
    rustls::ServerName::try_from(host).map_err(|source| Error::InvalidDnsName {
        host: host.to_string(),
        source,
    })
}

/// Direct TCP connection.
#[instrument(name = "connection::tcp", skip_all, fields(target = %target_addr))]
async fn connect_tcp(target_addr: &str) -> Result<TcpStream> {
    debug!("Establishing TCP connection");

    TcpStream::connect(target_addr)
        .await
        .map_err(|source| Error::TcpConnect {
            target: target_addr.to_string(),
            source,
        })
}
