//! Moving one request over one mutual-TLS connection

use std::future::Future;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use url::{Host, Url};

use crate::error::{self, Error};
use crate::tls::TlsSessionConfig;

/// Sends a fully buffered request and buffers the response
///
/// The seam between the retry executor and the network. Tests substitute
/// scripted implementations.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        session: &TlsSessionConfig,
        url: &Url,
        request: http::Request<Bytes>,
    ) -> impl Future<Output = Result<http::Response<Bytes>, Error>> + Send;
}

/// HTTP/1.1 over a fresh `tokio-rustls` connection per request
#[derive(Debug, Clone, Copy, Default)]
pub struct HyperTransport;

fn connect_target(url: &Url) -> Result<(String, u16), Error> {
    let host = match url.host() {
        Some(Host::Domain(domain)) => domain.to_owned(),
        Some(Host::Ipv4(ip)) => ip.to_string(),
        Some(Host::Ipv6(ip)) => ip.to_string(),
        None => return Err(error::builder("URL has no host").with_url(url.clone())),
    };
    let port = url.port_or_known_default().unwrap_or(443);
    Ok((host, port))
}

impl Transport for HyperTransport {
    async fn send(
        &self,
        session: &TlsSessionConfig,
        url: &Url,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<Bytes>, Error> {
        let (host, port) = connect_target(url)?;
        let stream = session.connect(&host, port).await?;

        let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .map_err(error::network)?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(target: "tether::transport", error = %e, "Connection closed with error");
            }
        });

        let (parts, body) = request.into_parts();
        let response = sender
            .send_request(http::Request::from_parts(parts, Full::new(body)))
            .await
            .map_err(error::network)?;

        let (parts, body) = response.into_parts();
        let body = body.collect().await.map_err(error::network)?.to_bytes();
        Ok(http::Response::from_parts(parts, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_defaults_to_https_port() {
        let url = Url::parse("https://api.example.test/v1").unwrap();
        assert_eq!(connect_target(&url).unwrap(), ("api.example.test".to_owned(), 443));
    }

    #[test]
    fn target_unbrackets_ipv6_literals() {
        let url = Url::parse("https://[::1]:8443/").unwrap();
        assert_eq!(connect_target(&url).unwrap(), ("::1".to_owned(), 8443));
    }
}
