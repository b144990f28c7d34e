//! Per-request execution context: request id, deadline and cancellation.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ExecutionFailure;

/// Carried into every store call of one paged query.
///
/// When the token is cancelled or the deadline passes, the in-flight store
/// step is abandoned and the transaction is rolled back before the error is
/// returned.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    request_id: Option<String>,
    deadline: Option<Instant>,
    cancellation: CancellationToken,
}

impl ExecContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Run one store step unless the request is cancelled or out of time.
    pub(crate) async fn guard<F, T>(&self, step: F) -> Result<T, ExecutionFailure>
    where
        F: Future<Output = Result<T, ExecutionFailure>>,
    {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(ExecutionFailure::Cancelled),
            _ = deadline => Err(ExecutionFailure::DeadlineExceeded),
            result = step => result,
        }
    }
}
