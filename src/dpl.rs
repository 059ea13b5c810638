//! Rust binding for the ISC stereo camera SDK
//!
//! `camera` drives `IscDplC` (acquisition, playback and the data-processing
//! modules), `utility` drives `IscUtility` (disparity colour maps). `output` and
//! `driver` make up the example viewer.

pub mod camera;
pub mod common;
pub mod driver;
pub mod ffi;
pub mod output;
pub mod utility;

pub use common::{DplError, Result, StatusCode};

pub use camera::{
    BufferState, CameraGeometry, DataSource, DplConfig, FrameBuffers, FrameStatus, Grab, IscDpl,
    NativeDpl, StartMode,
};

pub use utility::{ColorMapped, ImageView, IscUtility, NativeUtility, UtilityConfig};

pub use output::{DisplayPlane, FrameSink, Raster, SnapshotConfig, TiffCompression, TiffSnapshotSink};

pub use driver::{run_loop, CtrlCSignal, LoopOptions, LoopReport, StopSignal};
