//! TCP connect and TLS handshake for one hop.

use std::net::SocketAddr;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use url::{Host, Url};

use super::{MaybeTlsStream, TlsConfigCache, TrustMode};
use crate::error::{self, Error, TlsError};

/// Opens connections for the executor.
#[derive(Debug, Default)]
pub struct Connector {
    tls: TlsConfigCache,
}

impl Connector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve, connect and, for `https`, complete the TLS handshake.
    pub async fn connect(
        &self,
        url: &Url,
        trust_mode: TrustMode,
        use_native_certs: bool,
    ) -> Result<MaybeTlsStream, Error> {
        let https = match url.scheme() {
            "http" => false,
            "https" => true,
            other => {
                return Err(error::builder(format!("unsupported scheme: {other}"))
                    .with_url(url.clone()));
            }
        };
        let host = url
            .host()
            .ok_or_else(|| error::builder("url has no host").with_url(url.clone()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| error::builder("url has no port").with_url(url.clone()))?;

        let addrs = resolve(&host, port)
            .await
            .map_err(|e| error::connect(e, url.clone()))?;
        let tcp = connect_to_address_list(&addrs)
            .await
            .map_err(|e| error::connect(e, url.clone()))?;
        if let Err(e) = tcp.set_nodelay(true) {
            tracing::debug!(target: "courier::connect", error = %e, "Failed to set TCP_NODELAY");
        }

        if !https {
            return Ok(MaybeTlsStream::Plain(tcp));
        }

        let server_name = server_name(&host)?;
        let config = self
            .tls
            .get(trust_mode, use_native_certs)
            .map_err(error::tls)?;
        let tls = TlsConnector::from(config)
            .connect(server_name, tcp)
            .await
            .map_err(|e| error::tls(TlsError::Handshake(e)).with_url(url.clone()))?;

        tracing::trace!(target: "courier::connect", url = %url, "TLS handshake complete");
        Ok(MaybeTlsStream::Tls(Box::new(tls)))
    }
}

async fn resolve(host: &Host<&str>, port: u16) -> std::io::Result<Vec<SocketAddr>> {
    match host {
        Host::Ipv4(ip) => Ok(vec![SocketAddr::from((*ip, port))]),
        Host::Ipv6(ip) => Ok(vec![SocketAddr::from((*ip, port))]),
        Host::Domain(domain) => Ok(tokio::net::lookup_host((*domain, port)).await?.collect()),
    }
}

/// Connect to the first address that accepts.
async fn connect_to_address_list(addrs: &[SocketAddr]) -> std::io::Result<TcpStream> {
    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!(target: "courier::connect", %addr, error = %e, "Failed to connect");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses to connect to")
    }))
}

fn server_name(host: &Host<&str>) -> Result<ServerName<'static>, Error> {
    match host {
        Host::Domain(domain) => ServerName::try_from(domain.to_string())
            .map_err(|_| error::tls(TlsError::InvalidServerName(domain.to_string()))),
        Host::Ipv4(ip) => Ok(ServerName::from(std::net::IpAddr::V4(*ip))),
        Host::Ipv6(ip) => Ok(ServerName::from(std::net::IpAddr::V6(*ip))),
    }
}
