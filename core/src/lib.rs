//! Fluent HTTP client over libcurl.
//!
//! # Overview
//! A `Client` collects request configuration through chained calls,
//! executes one transfer and keeps the results (status, headers, body,
//! diagnostics, transport error) on itself. A `Coordinator` runs several
//! batched clients concurrently through one multi-handle and fans the
//! results back out to each client.
//!
//! ```no_run
//! use fluent_curl::{Client, Coordinator};
//!
//! # fn main() -> fluent_curl::Result<()> {
//! let mut client = Client::new()?;
//! client.as_json().get(("http://example.com/search", [("keywords", "grass")]))?;
//! if client.error_code() == 0 {
//!     println!("{} {:?}", client.response_code(), client.response_json());
//! }
//!
//! let mut a = Client::new()?;
//! let mut b = Client::new()?;
//! a.multi().get("http://example.com/a")?;
//! b.multi().post("http://example.com/b", [("name", "grass")])?;
//! Coordinator::new().exec(&mut [&mut a, &mut b])?;
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - Setters mutate a `Request` snapshot; every request derives the full
//!   engine option set from it (`EngineOption` is a closed enum).
//! - Transport failures never surface as `Err`; they are captured in
//!   `error_code()` / `error_message()`. `Err` is for configuration and
//!   engine setup failures that happen before any I/O.
//! - Header capture runs in the engine's header callback for both single
//!   and batched execution.

pub mod capture;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod encode;
pub mod engine;
pub mod error;
pub mod http;
pub mod request;
pub mod response;
pub mod url;

pub use capture::Progress;
pub use client::{Client, Mode};
pub use config::ClientConfig;
pub use coordinator::Coordinator;
pub use encode::{encode_body, FormPart, PartValue, Payload};
pub use engine::{EngineOption, TransferInfo};
pub use error::{Error, Result};
pub use http::{Body, ContentType, Method, Target};
pub use request::Request;
pub use response::{Response, ResponseBody};
pub use url::build_url;
