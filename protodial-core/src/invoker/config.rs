use crate::grpc::tls::TlsVerification;
use std::collections::BTreeMap;
use std::time::Duration;

/// Where and how to connect for a call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub hostname: String,
    pub port: String,
    /// Sent as gRPC metadata on every call. Keys are unique; the last insert wins.
    pub metadata: BTreeMap<String, String>,
    pub tls: TlsVerification,
    /// Applies separately to dialing, to the call and to closing the connection.
    pub timeout: Option<Duration>,
}

impl ConnectionConfig {
    pub fn new(hostname: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port: port.into(),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_tls(mut self, tls: TlsVerification) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}
