//! HTTP transport for the scanning API.

mod http;

pub use http::{HttpTransport, TransportError, AUTH_HEADER};
