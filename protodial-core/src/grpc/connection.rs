//! # Per-call Connection
//!
//! A single TCP + TLS + HTTP/2 connection, opened for one call and closed right after.
//!
//! The HTTP/2 connection is driven by a dedicated task. Closing drops the request handle,
//! which lets that task shut the connection down gracefully, and then waits for the task so
//! that any teardown failure is reported instead of lost.
use super::client::GrpcClient;
use crate::BoxError;
use hyper::client::conn::http2;
use hyper_util::rt::{TokioExecutor, TokioIo};
use rustls::ClientConfig;
use rustls::pki_types::ServerName;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_rustls::TlsConnector;

/// Sent as `user-agent` on every request.
pub const USER_AGENT: &str = concat!("protodial/", env!("CARGO_PKG_VERSION"));

/// Errors raised while dialing, talking to, or closing a connection.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
    #[error("Failed to connect to '{addr}': '{source}'")]
    Connect {
        addr: String,
        source: std::io::Error,
    },
    #[error("Invalid TLS configuration: '{0}'")]
    Tls(#[from] rustls::Error),
    #[error("TLS handshake with '{addr}' failed: '{source}'")]
    Handshake {
        addr: String,
        source: std::io::Error,
    },
    #[error("HTTP/2 handshake with '{addr}' failed: '{source}'")]
    Http2 {
        addr: String,
        source: hyper::Error,
    },
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    #[error("Connection terminated with an error: '{0}'")]
    Transport(#[source] BoxError),
}

/// The request half of an HTTP/2 connection, usable as a `tonic` transport.
#[derive(Debug, Clone)]
pub struct Http2Sender(http2::SendRequest<tonic::body::Body>);

impl tower_service::Service<http::Request<tonic::body::Body>> for Http2Sender {
    type Response = http::Response<hyper::body::Incoming>;
    type Error = hyper::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.0.poll_ready(cx)
    }

    fn call(&mut self, mut request: http::Request<tonic::body::Body>) -> Self::Future {
        request.headers_mut().insert(
            http::header::USER_AGENT,
            http::HeaderValue::from_static(USER_AGENT),
        );
        Box::pin(self.0.send_request(request))
    }
}

/// An open connection to one server.
#[derive(Debug)]
pub struct Connection {
    sender: Http2Sender,
    driver: JoinHandle<Result<(), hyper::Error>>,
    origin: http::Uri,
}

impl Connection {
    /// Dials `hostname:port`, performs the TLS handshake and negotiates HTTP/2.
    pub async fn open(
        hostname: &str,
        port: &str,
        tls: Arc<ClientConfig>,
    ) -> Result<Self, NetworkError> {
        let addr = authority(hostname, port)?;

        let server_name = ServerName::try_from(hostname.trim_matches(['[', ']']).to_string())
            .map_err(|_| NetworkError::InvalidAddress(addr.clone()))?;

        let origin = format!("https://{addr}")
            .parse::<http::Uri>()
            .map_err(|_| NetworkError::InvalidAddress(addr.clone()))?;

        tracing::debug!(%addr, "Dialing");

        let tcp = TcpStream::connect(&addr)
            .await
            .map_err(|source| NetworkError::Connect {
                addr: addr.clone(),
                source,
            })?;

        tcp.set_nodelay(true)
            .map_err(|source| NetworkError::Connect {
                addr: addr.clone(),
                source,
            })?;

        let stream = TlsConnector::from(tls)
            .connect(server_name, tcp)
            .await
            .map_err(|source| NetworkError::Handshake {
                addr: addr.clone(),
                source,
            })?;

        let (sender, connection) = http2::handshake(TokioExecutor::new(), TokioIo::new(stream))
            .await
            .map_err(|source| NetworkError::Http2 {
                addr: addr.clone(),
                source,
            })?;

        let driver = tokio::spawn(connection);

        Ok(Self {
            sender: Http2Sender(sender),
            driver,
            origin,
        })
    }

    /// A gRPC client multiplexed over this connection.
    ///
    /// Every client must be dropped before [`Connection::close`] can complete.
    pub fn client(&self) -> GrpcClient<Http2Sender> {
        GrpcClient::with_origin(self.sender.clone(), self.origin.clone())
    }

    /// Shuts the connection down and reports how the HTTP/2 session ended.
    pub async fn close(self) -> Result<(), NetworkError> {
        drop(self.sender);

        match self.driver.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(NetworkError::Transport(e.into())),
            Err(e) => Err(NetworkError::Transport(e.into())),
        }
    }
}

/// `host:port`, with IPv6 literals bracketed.
fn authority(hostname: &str, port: &str) -> Result<String, NetworkError> {
    let hostname = hostname.trim();
    let port = port.trim();

    if hostname.is_empty() || port.parse::<u16>().is_err() {
        return Err(NetworkError::InvalidAddress(format!("{hostname}:{port}")));
    }

    if hostname.contains(':') && !hostname.starts_with('[') {
        Ok(format!("[{hostname}]:{port}"))
    } else {
        Ok(format!("{hostname}:{port}"))
    }
}
