use common::echo_registry;
use echo_service::EchoServiceServer;
use echo_service_impl::EchoServiceImpl;
use hyper::server::conn::http2;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use protodial_core::invoker::{
    ConnectionConfig, InvokeError, Invoker, NetworkError, TlsVerification,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, pem::PemObject};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tower_service::Service;

mod common;
mod echo_service_impl;

// Self-signed for `localhost` and 127.0.0.1.
const CERT: &[u8] = include_bytes!("tls/server.crt");
const KEY: &[u8] = include_bytes!("tls/server.key");

struct TlsEchoServer {
    port: u16,
    user_agents: Arc<Mutex<Vec<String>>>,
}

/// Serves the echo service over TLS + HTTP/2 on an ephemeral port.
async fn spawn_tls_echo_server() -> TlsEchoServer {
    let cert = CertificateDer::from_pem_slice(CERT).unwrap();
    let key = PrivateKeyDer::from_pem_slice(KEY).unwrap();

    let mut config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(vec![cert], key)
    .unwrap();
    config.alpn_protocols = vec![b"h2".to_vec()];

    let acceptor = TlsAcceptor::from(Arc::new(config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let user_agents = Arc::new(Mutex::new(Vec::new()));
    let seen = user_agents.clone();

    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let seen = seen.clone();

            tokio::spawn(async move {
                let Ok(tls) = acceptor.accept(tcp).await else {
                    return;
                };

                let echo = EchoServiceServer::new(EchoServiceImpl);
                let service = service_fn(move |request: http::Request<hyper::body::Incoming>| {
                    if let Some(agent) = request
                        .headers()
                        .get(http::header::USER_AGENT)
                        .and_then(|v| v.to_str().ok())
                    {
                        seen.lock().unwrap().push(agent.to_string());
                    }

                    let mut echo = echo.clone();
                    async move { echo.call(request).await }
                });

                let _ = http2::Builder::new(TokioExecutor::new())
                    .serve_connection(TokioIo::new(tls), service)
                    .await;
            });
        }
    });

    TlsEchoServer { port, user_agents }
}

fn config(server: &TlsEchoServer) -> ConnectionConfig {
    ConnectionConfig::new("localhost", server.port.to_string())
        .with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_unary_call_over_tls() {
    let server = spawn_tls_echo_server().await;
    let registry = echo_registry();

    let invoker = Invoker::new(
        config(&server)
            .with_tls(TlsVerification::Insecure)
            .with_metadata("x-echo-suffix", "!!"),
    );

    let reply = invoker
        .send(&registry, "echo.EchoService", "UnaryEcho", r#"{"message": "hi"}"#)
        .await
        .unwrap();

    assert_eq!(reply.json, "{\n  \"message\": \"hi!!\"\n}");
    assert!(reply.close_error.is_none());

    let user_agents = server.user_agents.lock().unwrap();
    assert_eq!(user_agents.len(), 1);
    assert!(user_agents[0].starts_with("protodial/"));
}

#[tokio::test]
async fn test_error_status_over_tls() {
    let server = spawn_tls_echo_server().await;
    let registry = echo_registry();

    let mut invoker = Invoker::default();
    invoker.reconfigure(config(&server).with_tls(TlsVerification::Insecure));

    let err = invoker
        .send(&registry, "echo.EchoService", "Fail", r#"{"message": "no"}"#)
        .await
        .unwrap_err();

    match err {
        InvokeError::Status(status) => {
            assert_eq!(status.code(), tonic::Code::FailedPrecondition);
            assert_eq!(status.message(), "no");
        }
        other => panic!("Unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_each_call_opens_its_own_connection() {
    let server = spawn_tls_echo_server().await;
    let registry = echo_registry();

    let invoker = Invoker::new(config(&server).with_tls(TlsVerification::Insecure));

    for message in ["one", "two"] {
        let reply = invoker
            .send(
                &registry,
                "echo.EchoService",
                "UnaryEcho",
                &format!(r#"{{"message": "{message}"}}"#),
            )
            .await
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&reply.json).unwrap();
        assert_eq!(value["message"], message);
    }

    assert_eq!(server.user_agents.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_untrusted_certificate_is_rejected_by_default() {
    let server = spawn_tls_echo_server().await;
    let registry = echo_registry();

    let err = Invoker::new(config(&server))
        .send(&registry, "echo.EchoService", "UnaryEcho", r#"{"message": "hi"}"#)
        .await
        .unwrap_err();

    assert!(matches!(err, InvokeError::Network(NetworkError::Handshake { .. })));
    assert!(server.user_agents.lock().unwrap().is_empty());
}
