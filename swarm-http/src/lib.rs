//! Minimal HTTP/1.1 client for driving virtual users: whole-body reads, an overall per-request
//! deadline, and an error taxonomy that separates "never reached the target" from caller bugs.

#![forbid(unsafe_code)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, HttpClient};
pub use error::{Error, ErrorKind, Result};
pub use types::{HttpRequest, HttpResponse};
