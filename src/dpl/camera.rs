//! Camera and data-processing facade over `IscDplC`
//!
//! `IscDpl` owns a library session, `Grab` an active acquisition. All native calls
//! go through the `DplApi` trait so the facade can run against a mock in tests.

pub mod api;
pub mod facade;
pub mod file_header;
pub mod frame;
pub mod native;
pub mod types;


pub use api::{DplApi, OptionQuery, OptionTarget, OptionType, OptionValue, ValueKind};
pub use facade::{DataSource, DepthSample, Grab, IscDpl, OptionRange, ScalarOption};
pub use file_header::RAW_FILE_HEADER_SIZE;
pub use frame::{BufferState, FrameBuffers, FrameStatus, PlaneBuffer};
pub use native::NativeDpl;
pub use types::{
    AreaStatistics, CameraGeometry, CameraInfo, CameraModel, CameraParameter, ColorMode, DplConfig,
    GetColorMode, GrabMode, GrabSettings, ModuleParameter, ParameterEntry, ParameterValue,
    RawFileHeader, Rect, Roi3d, ShutterMode, StartMode, Statistics,
};
