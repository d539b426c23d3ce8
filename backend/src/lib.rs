//! Business card backend for a WeChat mini-program.
//!
//! The crate is laid out hexagonally: [`domain`] holds the session registry,
//! profile resolver, token refresher and card service behind port traits;
//! [`inbound`] adapts HTTP requests onto them; [`outbound`] implements the
//! ports against PostgreSQL, process memory and the WeChat open platform.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(test)]
mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
pub use middleware::trace::TraceId;
