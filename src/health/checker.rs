//! Dependency checker capability and the request context it runs under.

use std::convert::Infallible;
use std::future::Future;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use http::request::Parts;
use tokio::time::Instant;

/// Deadline attached to a request by the hosting server's middleware.
#[derive(Clone, Copy, Debug)]
pub struct RequestDeadline(pub Instant);

/// Request-scoped context handed to a dependency check.
///
/// Client cancellation reaches the check by the handler future being dropped.
/// A deadline, when present, bounds how long the check may wait.
#[derive(Clone, Copy, Debug, Default)]
pub struct CheckContext {
    deadline: Option<Instant>,
}

impl CheckContext {
    /// Context without a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drive `fut` to completion unless the deadline passes first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, CheckError>
    where
        F: Future<Output = Result<T, CheckError>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| CheckError::DeadlineExceeded)?,
            None => fut.await,
        }
    }
}

impl<S> FromRequestParts<S> for CheckContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(match parts.extensions.get::<RequestDeadline>() {
            Some(RequestDeadline(deadline)) => Self::with_deadline(*deadline),
            None => Self::new(),
        })
    }
}

/// Why a dependency could not be reached.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("connection to {address} failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected reply: {0:?}")]
    UnexpectedReply(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("dependency responded with status {0}")]
    Status(u16),

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Connectivity check against a single external dependency.
///
/// Implementations are shared across concurrent requests and must tolerate
/// concurrent invocation.
#[async_trait]
pub trait DependencyChecker: Send + Sync {
    /// Attempt a round trip to the dependency.
    async fn check(&self, ctx: &CheckContext) -> Result<(), CheckError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_without_deadline_completes() {
        let ctx = CheckContext::new();
        let result = ctx.run(async { Ok::<_, CheckError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_run_passes_through_errors() {
        let ctx = CheckContext::new();
        let result: Result<(), _> = ctx.run(async { Err(CheckError::Status(500)) }).await;
        assert!(matches!(result, Err(CheckError::Status(500))));
    }

    #[tokio::test]
    async fn test_run_stops_at_deadline() {
        let ctx = CheckContext::with_deadline(Instant::now() + Duration::from_millis(20));
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(CheckError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_context_extracted_from_request_extension() {
        let deadline = Instant::now() + Duration::from_secs(1);
        let request = http::Request::builder()
            .extension(RequestDeadline(deadline))
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let ctx = CheckContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.deadline(), Some(deadline));
    }

    #[tokio::test]
    async fn test_context_without_extension_has_no_deadline() {
        let (mut parts, _) = http::Request::new(()).into_parts();
        let ctx = CheckContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(ctx.deadline().is_none());
    }
}
