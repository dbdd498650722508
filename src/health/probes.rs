//! Concrete dependency checkers selected from configuration.
//!
//! Each probe performs a single round trip and honours the deadline carried by
//! the `CheckContext`. Nothing is retried.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::instrument;

use crate::config::DependencyConfig;

use super::checker::{CheckContext, CheckError, DependencyChecker};

const REDIS_PING: &[u8] = b"PING\r\n";
const REDIS_PONG: &str = "+PONG";

/// Longest reply line read from a redis probe
const REDIS_REPLY_LIMIT: u64 = 512;

/// Build the checker described by `config`.
pub fn build_checker(config: &DependencyConfig) -> Arc<dyn DependencyChecker> {
    match config {
        DependencyConfig::Tcp { address } => Arc::new(TcpChecker::new(address.clone())),
        DependencyConfig::Redis { address } => Arc::new(RedisChecker::new(address.clone())),
        DependencyConfig::Http { url } => Arc::new(HttpChecker::new(url.clone())),
    }
}

async fn connect(address: &str) -> Result<TcpStream, CheckError> {
    TcpStream::connect(address)
        .await
        .map_err(|source| CheckError::Connect {
            address: address.to_string(),
            source,
        })
}

/// Succeeds once a TCP connection is established.
#[derive(Debug, Clone)]
pub struct TcpChecker {
    address: String,
}

impl TcpChecker {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl DependencyChecker for TcpChecker {
    #[instrument(name = "probe::tcp", skip_all, fields(address = %self.address))]
    async fn check(&self, ctx: &CheckContext) -> Result<(), CheckError> {
        ctx.run(async {
            connect(&self.address).await?;
            tracing::debug!("TCP probe connected");
            Ok(())
        })
        .await
    }
}

/// Sends an inline `PING` and expects `+PONG`.
#[derive(Debug, Clone)]
pub struct RedisChecker {
    address: String,
}

impl RedisChecker {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl DependencyChecker for RedisChecker {
    #[instrument(name = "probe::redis", skip_all, fields(address = %self.address))]
    async fn check(&self, ctx: &CheckContext) -> Result<(), CheckError> {
        ctx.run(async {
            let mut stream = connect(&self.address).await?;
            stream.write_all(REDIS_PING).await?;

            let mut reader = BufReader::new(stream).take(REDIS_REPLY_LIMIT);
            let mut line = String::new();
            reader.read_line(&mut line).await?;

            let reply = line.trim_end_matches(['\r', '\n']);
            if reply == REDIS_PONG {
                tracing::debug!("Redis probe answered");
                Ok(())
            } else {
                Err(CheckError::UnexpectedReply(reply.to_string()))
            }
        })
        .await
    }
}

/// Issues `GET` against a URL and expects a 2xx status.
#[derive(Debug, Clone)]
pub struct HttpChecker {
    url: String,
    client: reqwest::Client,
}

impl HttpChecker {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl DependencyChecker for HttpChecker {
    #[instrument(name = "probe::http", skip_all, fields(url = %self.url))]
    async fn check(&self, ctx: &CheckContext) -> Result<(), CheckError> {
        ctx.run(async {
            let response = self.client.get(&self.url).send().await?;
            let status = response.status();
            if status.is_success() {
                tracing::debug!(status = status.as_u16(), "HTTP probe answered");
                Ok(())
            } else {
                Err(CheckError::Status(status.as_u16()))
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::time::Instant;

    /// Address of a port nothing listens on.
    async fn closed_address() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        addr
    }

    /// Minimal server that answers one PING with `reply`.
    async fn spawn_redis_stub(reply: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let _ = socket.read(&mut buf).await;
            socket.write_all(reply).await.unwrap();
        });
        addr
    }

    async fn spawn_http_stub(status: http::StatusCode) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = axum::Router::new().route("/ping", axum::routing::get(move || async move { status }));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/ping")
    }

    #[tokio::test]
    async fn test_tcp_probe_succeeds_when_listening() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let checker = TcpChecker::new(listener.local_addr().unwrap().to_string());
        assert!(checker.check(&CheckContext::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_tcp_probe_fails_on_closed_port() {
        let checker = TcpChecker::new(closed_address().await);
        let result = checker.check(&CheckContext::new()).await;
        assert!(matches!(result, Err(CheckError::Connect { .. })));
    }

    #[tokio::test]
    async fn test_redis_probe_accepts_pong() {
        let checker = RedisChecker::new(spawn_redis_stub(b"+PONG\r\n").await);
        assert!(checker.check(&CheckContext::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_redis_probe_rejects_error_reply() {
        let checker = RedisChecker::new(spawn_redis_stub(b"-NOAUTH Authentication required.\r\n").await);
        let result = checker.check(&CheckContext::new()).await;
        match result {
            Err(CheckError::UnexpectedReply(reply)) => {
                assert_eq!(reply, "-NOAUTH Authentication required.")
            }
            other => panic!("expected UnexpectedReply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_redis_reply_is_capped_without_newline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let _ = socket.read(&mut buf).await;
            let chunk = [b'a'; 1024];
            for _ in 0..64 {
                if socket.write_all(&chunk).await.is_err() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let checker = RedisChecker::new(addr);
        let result = checker.check(&CheckContext::new()).await;
        match result {
            Err(CheckError::UnexpectedReply(reply)) => {
                assert_eq!(reply.len(), REDIS_REPLY_LIMIT as usize)
            }
            other => panic!("expected UnexpectedReply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_redis_probe_times_out_on_silent_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let checker = RedisChecker::new(addr);
        let ctx = CheckContext::with_deadline(Instant::now() + Duration::from_millis(100));
        let result = checker.check(&ctx).await;
        assert!(matches!(result, Err(CheckError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_http_probe_accepts_success() {
        let checker = HttpChecker::new(spawn_http_stub(http::StatusCode::NO_CONTENT).await);
        assert!(checker.check(&CheckContext::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_http_probe_rejects_server_error() {
        let checker =
            HttpChecker::new(spawn_http_stub(http::StatusCode::SERVICE_UNAVAILABLE).await);
        let result = checker.check(&CheckContext::new()).await;
        assert!(matches!(result, Err(CheckError::Status(503))));
    }

    #[tokio::test]
    async fn test_build_checker_from_config() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = DependencyConfig::Tcp {
            address: listener.local_addr().unwrap().to_string(),
        };
        let checker = build_checker(&config);
        assert!(checker.check(&CheckContext::new()).await.is_ok());
    }
}
