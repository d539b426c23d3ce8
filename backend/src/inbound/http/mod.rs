//! HTTP inbound adapter exposing the mini-program endpoints.

pub mod cards;
pub mod error;
pub mod health;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
