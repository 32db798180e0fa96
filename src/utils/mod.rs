//! Utilities Module
//!
//! Common utilities used across the crate.

mod http;
mod json;
pub mod logging;
#[cfg(test)]
pub(crate) mod test_server;

pub use http::*;
pub use json::*;
