//! Layer factories for middleware

use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::{DefaultOnFailure, TraceLayer},
};
use tracing::Level;

/// HTTP tracing middleware
///
/// Failed responses are logged at warn; the error response itself carries
/// the one error-level line for a failed request.
pub fn trace() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http().on_failure(DefaultOnFailure::new().level(Level::WARN))
}
