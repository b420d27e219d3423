//! # Invoker
//!
//! Performs unary gRPC calls whose request is given as JSON and whose response is
//! rendered back to JSON.
//!
//! Each [`Invoker::send`] is self-contained:
//!
//! 1. Resolve the method in the [`Registry`] and decode the JSON request against its input type.
//! 2. Open a fresh TLS connection to the configured server.
//! 3. Perform the call with the configured metadata attached.
//! 4. Close the connection and render the response.
//!
//! ```rust,no_run
//! use protodial_core::invoker::{ConnectionConfig, Invoker};
//! use protodial_core::schema::load_registry;
//! use std::path::{Path, PathBuf};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = load_registry(&[PathBuf::from("protos")], Path::new("protos/greeter.proto"))?;
//!
//! let invoker = Invoker::new(
//!     ConnectionConfig::new("localhost", "50051").with_metadata("authorization", "Bearer t0k3n"),
//! );
//!
//! let reply = invoker
//!     .send(&registry, "helloworld.Greeter", "SayHello", r#"{"name": "world"}"#)
//!     .await?;
//!
//! println!("{}", reply.json);
//! # Ok(())
//! # }
//! ```
mod config;

pub use crate::grpc::connection::NetworkError;
pub use crate::grpc::tls::TlsVerification;
pub use config::ConnectionConfig;

use crate::grpc::client::GrpcRequestError;
use crate::grpc::connection::Connection;
use crate::grpc::tls;
use crate::json::{self, DecodeError, EncodeError};
use crate::schema::{LookupError, Registry};
use std::future::Future;
use std::time::Duration;

/// Errors that can occur while sending a request.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("Method '{0}' is streaming, only unary methods can be called")]
    Unsupported(String),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("gRPC client request error: '{0}'")]
    Request(#[from] GrpcRequestError),
    #[error("gRPC call failed: code={:?} message={:?}", .0.code(), .0.message())]
    Status(tonic::Status),
}

/// The outcome of a successful call.
#[derive(Debug)]
pub struct Reply {
    /// The response message as pretty printed JSON.
    pub json: String,
    /// Set when the call succeeded but the connection did not shut down cleanly.
    pub close_error: Option<NetworkError>,
}

/// Sends dynamic requests to the configured server.
#[derive(Debug, Clone, Default)]
pub struct Invoker {
    config: ConnectionConfig,
}

impl Invoker {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Replaces the hostname, port and metadata used by subsequent calls.
    ///
    /// TLS mode and timeout are left untouched.
    pub fn configure<K, V>(
        &mut self,
        hostname: impl Into<String>,
        port: impl Into<String>,
        metadata: impl IntoIterator<Item = (K, V)>,
    ) where
        K: Into<String>,
        V: Into<String>,
    {
        self.config.hostname = hostname.into();
        self.config.port = port.into();
        self.config.metadata = metadata
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
    }

    /// Replaces the whole configuration.
    pub fn reconfigure(&mut self, config: ConnectionConfig) {
        self.config = config;
    }

    /// Calls `service`/`method` with `json` as request body.
    ///
    /// # Arguments
    ///
    /// * `service` - Fully qualified service name (e.g. `helloworld.Greeter`).
    /// * `method` - Method name (e.g. `SayHello`).
    /// * `json` - Request body. Keys unknown to the input message are ignored.
    ///
    /// # Returns
    ///
    /// * `Ok(Reply)` - The response as JSON, plus any error raised while closing the connection.
    /// * `Err(InvokeError)` - The request could not be built, sent, or was answered with an
    ///   error status. A failed call always takes precedence over a failed close.
    #[tracing::instrument(
        skip(self, registry, json),
        fields(addr = %self.config.address())
    )]
    pub async fn send(
        &self,
        registry: &Registry,
        service: &str,
        method: &str,
        json: &str,
    ) -> Result<Reply, InvokeError> {
        let config = self.config.clone();

        let method = registry.resolve_method(&format!("{service}.{method}"))?;

        if method.is_client_streaming() || method.is_server_streaming() {
            return Err(InvokeError::Unsupported(method.full_name().to_string()));
        }

        let request = json::decode_message(method.input(), json)?;

        let headers: Vec<(String, String)> = config
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if config.tls == TlsVerification::Insecure {
            tracing::warn!("Server certificate verification is disabled");
        }

        let tls = tls::client_config(config.tls).map_err(NetworkError::from)?;

        let connection = deadline(
            config.timeout,
            Connection::open(&config.hostname, &config.port, tls),
        )
        .await?;

        let result = {
            let mut client = connection.client();
            deadline(config.timeout, async {
                client
                    .unary(&method, request, headers)
                    .await?
                    .map_err(InvokeError::Status)
            })
            .await
        };

        let closed = deadline(config.timeout, connection.close()).await;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                if let Err(close_err) = &closed {
                    tracing::debug!(error = %close_err, "Connection close failed after a failed call");
                }
                return Err(err);
            }
        };

        let close_error = closed.err();
        if let Some(err) = &close_error {
            tracing::warn!(error = %err, "Connection did not close cleanly");
        }

        let json = json::encode_message(&response)?;

        tracing::info!(method = method.full_name(), "Call succeeded");

        Ok(Reply { json, close_error })
    }
}

/// Runs `fut`, failing with [`NetworkError::Timeout`] once `limit` elapses.
async fn deadline<T, E>(
    limit: Option<Duration>,
    fut: impl Future<Output = Result<T, E>>,
) -> Result<T, E>
where
    E: From<NetworkError>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| E::from(NetworkError::Timeout(limit)))?,
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_keeps_tls_mode_and_timeout() {
        let mut invoker = Invoker::new(
            ConnectionConfig::new("old", "1")
                .with_tls(TlsVerification::Insecure)
                .with_timeout(Duration::from_secs(3))
                .with_metadata("stale", "yes"),
        );

        invoker.configure("new.host", "8443", [("x-api-key", "secret")]);

        let config = invoker.config();
        assert_eq!(config.address(), "new.host:8443");
        assert_eq!(config.tls, TlsVerification::Insecure);
        assert_eq!(config.timeout, Some(Duration::from_secs(3)));
        assert_eq!(config.metadata.len(), 1);
        assert_eq!(config.metadata["x-api-key"], "secret");
    }

    #[test]
    fn configure_accepts_empty_metadata() {
        let mut invoker = Invoker::default();
        invoker.configure("h", "1", Vec::<(String, String)>::new());
        assert!(invoker.config().metadata.is_empty());
    }

    #[test]
    fn reconfigure_replaces_every_setting() {
        let mut invoker = Invoker::new(
            ConnectionConfig::new("old", "1")
                .with_tls(TlsVerification::Insecure)
                .with_metadata("stale", "yes"),
        );

        invoker.reconfigure(
            ConnectionConfig::new("fresh", "2").with_timeout(Duration::from_secs(1)),
        );

        let config = invoker.config();
        assert_eq!(config.address(), "fresh:2");
        assert_eq!(config.tls, TlsVerification::WebPki);
        assert_eq!(config.timeout, Some(Duration::from_secs(1)));
        assert!(config.metadata.is_empty());
    }

    #[tokio::test]
    async fn deadline_times_out_pending_futures() {
        let result: Result<(), NetworkError> = deadline(
            Some(Duration::from_millis(10)),
            std::future::pending::<Result<(), NetworkError>>(),
        )
        .await;

        assert!(matches!(result, Err(NetworkError::Timeout(_))));
    }
}
