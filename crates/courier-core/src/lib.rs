//! # Courier Core
//!
//! Core types and helpers shared by every Courier crate:
//! - Error types
//! - Response body alias
//! - `Set-Cookie` construction and request cookie lookup
//! - Content-type sniffing

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod cookies;
pub mod error;
pub mod sniff;

pub use cookies::{request_cookie, set_cookie_header, Cookie, CookieOptions, SameSite};
pub use error::{Error, Result};
pub use sniff::{detect_content_type, json_content_type};

// Re-export commonly used HTTP types
pub use bytes::Bytes;
pub use http::{Method, Request, Response, StatusCode};

/// Body type used for fully buffered responses
pub type Body = http_body_util::Full<Bytes>;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cookies::{Cookie, CookieOptions, SameSite};
    pub use crate::error::{Error, Result};
    pub use crate::sniff::{detect_content_type, json_content_type};
    pub use crate::Body;
}
