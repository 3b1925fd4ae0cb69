//! Sync layer: the `Backend` seam and its reqwest-based HTTP implementation.

mod backend;
mod error;

pub use backend::Backend;
pub use error::{ApiError, ApiResult, TransportError, error_message_from_body};

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::ApiClient;
