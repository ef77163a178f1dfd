//! HTTP middleware: authentication extractors, error envelopes and request metrics

pub mod auth;
pub mod error_response;
pub mod metrics;

pub use auth::{AuthUser, OptionalAuth};
pub use error_response::normalize_error_response;
pub use metrics::ObservabilityLayer;
