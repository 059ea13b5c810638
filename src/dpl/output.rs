//! Display and export of retrieved frames

pub mod csv;
pub mod sink;
pub mod tiff_sink;

#[cfg(test)]
mod tests;

pub use csv::{write_disparity_csv, write_distance_csv};
pub use sink::{DisplayPlane, FrameSink, Raster};
pub use tiff_sink::{SnapshotConfig, SnapshotConfigBuilder, TiffCompression, TiffSnapshotSink};
