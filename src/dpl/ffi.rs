//! Native ABI layer
//!
//! Plain `#[repr(C)]` records and string helpers shared by the camera and utility
//! bindings. Nothing in here calls into a library.

pub mod types;
pub mod wide;

#[cfg(test)]
mod tests;

pub use wide::{WChar, MAX_PATH};
