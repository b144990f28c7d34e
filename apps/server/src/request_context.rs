//! Per-request context injected by the request id middleware.

use std::time::Duration;

use pagewise_query::ExecContext;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    /// Execution context for one list query issued by this request.
    pub fn exec_context(&self, timeout: Duration) -> ExecContext {
        ExecContext::new()
            .with_request_id(self.request_id.clone())
            .with_timeout(timeout)
    }
}
