//! HTTP-boundary response envelopes.
//!
//! The HTTP layer itself is an external collaborator; these types pin
//! down the JSON bodies it serializes so error contracts stay uniform.

use serde::Serialize;
use shop_commerce::CommerceError;

/// The `{success: false, message}` error body, paired with the HTTP
/// status the error maps to.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub message: String,
    #[serde(skip)]
    pub status: u16,
}

impl ApiError {
    /// Build the boundary representation of an error.
    ///
    /// Server-side failures are masked with a generic message so
    /// internals never leak to clients.
    pub fn from_error(err: &CommerceError) -> Self {
        let message = if err.is_server_error() {
            "Server Error".to_string()
        } else {
            err.to_string()
        };
        Self {
            success: false,
            message,
            status: err.http_status(),
        }
    }
}

/// The `{success: true, message}` acknowledgement body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
