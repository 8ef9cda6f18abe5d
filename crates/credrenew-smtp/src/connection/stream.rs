//! TCP and TLS transports.

use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

use crate::error::{Error, Result};

/// TLS-wrapped TCP stream.
pub type TlsStream = tokio_rustls::client::TlsStream<TcpStream>;

/// Connects over plain TCP (port 25 or 587 before STARTTLS).
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn connect(hostname: &str, port: u16) -> Result<TcpStream> {
    Ok(TcpStream::connect((hostname, port)).await?)
}

/// Connects with implicit TLS (port 465).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails.
pub async fn connect_tls(hostname: &str, port: u16) -> Result<TlsStream> {
    let tcp = connect(hostname, port).await?;
    upgrade(tcp, hostname).await
}

/// Runs the TLS handshake on an established TCP stream.
pub(crate) async fn upgrade(tcp: TcpStream, hostname: &str) -> Result<TlsStream> {
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("invalid TLS server name: {hostname}")))?;
    Ok(tls_connector().connect(server_name, tcp).await?)
}

/// TLS connector trusting the Mozilla root set.
fn tls_connector() -> TlsConnector {
    let roots = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}
