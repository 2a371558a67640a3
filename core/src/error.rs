//! Error types for the fluent curl client.
//!
//! # Design
//! Only failures that stop a call before or around the engine surface as
//! `Err`. Transport failures (DNS, connect, TLS, timeout) are outcomes of a
//! completed transfer and land in the client's `error_code` /
//! `error_message` instead, so a batch never aborts because one member
//! failed.

use crate::http::ContentType;

/// Errors returned by client, coordinator and encoder operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The native transfer engine refused the baseline configuration.
    #[error("transfer engine unavailable: {0}")]
    EngineUnavailable(#[source] curl::Error),

    /// The engine rejected an option while configuring a request.
    #[error("transfer engine rejected option: {0}")]
    Engine(#[from] curl::Error),

    /// A multipart form part could not be assembled.
    #[error("multipart form rejected: {0}")]
    Form(#[from] curl::FormError),

    /// The shared multi-handle failed while driving a batch.
    #[error("multi transfer failed: {0}")]
    Multi(#[from] curl::MultiError),

    /// The body has no encoding under the configured content type.
    #[error("cannot encode {body} body as {content_type}")]
    InvalidRequestBody {
        content_type: ContentType,
        body: &'static str,
    },

    /// A structured body could not be serialized.
    #[error("body serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Query or form pairs could not be urlencoded.
    #[error("urlencoding failed: {0}")]
    Urlencode(#[from] serde_urlencoded::ser::Error),

    /// The download target could not be opened.
    #[error("download file: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration value from the environment is malformed.
    #[error("invalid configuration {key}={value}")]
    Config { key: &'static str, value: String },

    /// The client's engine handle has been released by `close()`.
    #[error("client is closed")]
    Closed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
