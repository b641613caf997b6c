//! HTTP security controls

mod headers;

pub use headers::security_headers_middleware;
