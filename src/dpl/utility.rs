//! Disparity visualization facade over `IscUtility`

pub mod api;
pub mod facade;
pub mod native;
pub mod types;


pub use api::UtilityApi;
pub use facade::{ColorMapped, ImageView, IscUtility};
pub use native::NativeUtility;
pub use types::UtilityConfig;
