//! Outbound adapters implementing the domain ports.
//!
//! - **persistence**: PostgreSQL card store via Diesel.
//! - **memory**: in-process card store for development and tests.
//! - **wechat**: reqwest client for the WeChat open platform.
//!
//! Adapters translate between domain types and infrastructure shapes; they
//! hold no business rules.

pub mod memory;
pub mod persistence;
pub mod wechat;
