//! Common utilities module
//!
//! Error type and status-code handling shared by both native facades.

pub mod error;

pub use error::{DplError, Result, StatusCode};
