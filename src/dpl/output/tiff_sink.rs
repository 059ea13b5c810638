//! Snapshot display: each plane is periodically rewritten as a TIFF file

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{colortype, Compression, TiffEncoder};
use tracing::{debug, info, instrument};

use crate::dpl::common::error::{DplError, Result};
use crate::dpl::output::sink::{DisplayPlane, FrameSink, Raster};

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    Lzw,
    DeflateFast,
    DeflateBalanced,
    DeflateBest,
}

impl TiffCompression {
    fn to_encoder(self) -> Compression {
        match self {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        }
    }
}

/// Where and how often snapshots are refreshed.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub directory: PathBuf,
    /// Write on every `every`-th poll; 1 writes every frame.
    pub every: u32,
    pub compression: TiffCompression,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./snapshots"),
            every: 10,
            compression: TiffCompression::None,
        }
    }
}

impl SnapshotConfig {
    pub fn builder() -> SnapshotConfigBuilder {
        SnapshotConfigBuilder::default()
    }
}

/// Builder for SnapshotConfig
#[derive(Default)]
pub struct SnapshotConfigBuilder {
    directory: Option<PathBuf>,
    every: Option<u32>,
    compression: Option<TiffCompression>,
}

impl SnapshotConfigBuilder {
    pub fn directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn every(mut self, polls: u32) -> Self {
        self.every = Some(polls);
        self
    }

    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn build(self) -> SnapshotConfig {
        let default = SnapshotConfig::default();
        SnapshotConfig {
            directory: self.directory.unwrap_or(default.directory),
            every: self.every.unwrap_or(default.every).max(1),
            compression: self.compression.unwrap_or(default.compression),
        }
    }
}

/// `FrameSink` that keeps `base.tiff`, `color.tiff` and `depth.tiff` up to date.
pub struct TiffSnapshotSink {
    config: SnapshotConfig,
    poll: u64,
    written: u64,
}

impl TiffSnapshotSink {
    #[instrument(skip(config), fields(directory = %config.directory.display()))]
    pub fn new(config: SnapshotConfig) -> Result<Self> {
        fs::create_dir_all(&config.directory)?;
        info!(every = config.every, "Writing display snapshots");
        Ok(Self {
            config,
            poll: 0,
            written: 0,
        })
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Number of snapshot files written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn path_of(&self, plane: DisplayPlane) -> PathBuf {
        self.config.directory.join(format!("{}.tiff", plane.name()))
    }

    fn due(&self) -> bool {
        self.poll % u64::from(self.config.every) == 0
    }
}

impl FrameSink for TiffSnapshotSink {
    fn show(&mut self, plane: DisplayPlane, image: Raster<'_>) -> Result<()> {
        if !self.due() {
            return Ok(());
        }
        let encoded = encode(&image, self.config.compression)?;
        let path = self.path_of(plane);
        replace_file(&path, &encoded)?;
        self.written += 1;
        debug!(plane = plane.name(), bytes = encoded.len(), "Snapshot written");
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.poll += 1;
        Ok(())
    }
}

/// Encodes a grey or BGR raster as TIFF.
pub fn encode(image: &Raster<'_>, compression: TiffCompression) -> Result<Vec<u8>> {
    let len = image.width * image.height * image.channels;
    if image.width == 0 || image.height == 0 {
        return Err(DplError::InvalidDimensions(image.width, image.height));
    }
    if image.data.len() < len {
        return Err(DplError::InvalidArgument(format!(
            "raster {}x{}x{} needs {} bytes, got {}",
            image.width,
            image.height,
            image.channels,
            len,
            image.data.len()
        )));
    }

    let mut buffer = Vec::new();
    let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
        .map_err(|e| DplError::EncodeError(e.to_string()))?
        .with_compression(compression.to_encoder());

    let (width, height) = (image.width as u32, image.height as u32);
    match image.channels {
        1 => encoder
            .write_image::<colortype::Gray8>(width, height, &image.data[..len])
            .map_err(|e| DplError::EncodeError(e.to_string()))?,
        3 => {
            let rgb = bgr_to_rgb(&image.data[..len]);
            encoder
                .write_image::<colortype::RGB8>(width, height, &rgb)
                .map_err(|e| DplError::EncodeError(e.to_string()))?
        }
        n => {
            return Err(DplError::InvalidArgument(format!("unsupported channel count {}", n)));
        }
    }

    Ok(buffer)
}

fn bgr_to_rgb(bgr: &[u8]) -> Vec<u8> {
    bgr.chunks_exact(3).flat_map(|p| [p[2], p[1], p[0]]).collect()
}

/// Readers never observe a partially written file.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tiff.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
