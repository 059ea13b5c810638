use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, instrument, warn};

use crate::dpl::camera::types::{CameraModel, RawFileHeader};
use crate::dpl::common::error::{DplError, Result};
use crate::dpl::ffi::types::FILE_MARK_LEN;
use crate::dpl::ffi::wide::read_narrow;

/// Size of the header at the start of every recording.
pub const RAW_FILE_HEADER_SIZE: usize = 128;

const MARK_SUFFIX: &str = "RAW DATA";

fn i32_at(bytes: &[u8], offset: usize) -> i32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    i32::from_le_bytes(word)
}

fn f32_at(bytes: &[u8], offset: usize) -> f32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    f32::from_le_bytes(word)
}

impl RawFileHeader {
    /// Decodes the little-endian header of a recording.
    ///
    /// An unfamiliar marker is only logged; the SDK writes `"Unknown RAW DAT"` for
    /// models it does not name and still plays those files back.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < RAW_FILE_HEADER_SIZE {
            return Err(DplError::InvalidFileHeader(format!(
                "expected {} bytes, got {}",
                RAW_FILE_HEADER_SIZE,
                bytes.len()
            )));
        }

        let mark = read_narrow(&bytes[..FILE_MARK_LEN]);
        if !mark.ends_with(MARK_SUFFIX) {
            warn!(mark = %mark, "unrecognised recording marker");
        }

        let header_size = i32_at(bytes, 36);
        if header_size as usize != RAW_FILE_HEADER_SIZE {
            return Err(DplError::InvalidFileHeader(format!(
                "header size {} (expected {})",
                header_size, RAW_FILE_HEADER_SIZE
            )));
        }

        let max_width = i32_at(bytes, 44);
        let max_height = i32_at(bytes, 48);
        if max_width <= 0 || max_height <= 0 {
            return Err(DplError::InvalidDimensions(
                max_width.max(0) as usize,
                max_height.max(0) as usize,
            ));
        }

        Ok(Self {
            mark,
            version: i32_at(bytes, 32),
            header_size,
            camera_model: CameraModel::from_raw(i32_at(bytes, 40)),
            max_width: max_width as usize,
            max_height: max_height as usize,
            d_inf: f32_at(bytes, 52),
            bf: f32_at(bytes, 56),
            dz: f32_at(bytes, 60),
            base_length: f32_at(bytes, 64),
            grab_mode: i32_at(bytes, 68),
            shutter_mode: i32_at(bytes, 72),
            color_mode: i32_at(bytes, 76),
        })
    }

    /// Reads and validates the header of a recording without involving the native library.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut bytes = [0u8; RAW_FILE_HEADER_SIZE];
        File::open(path.as_ref())?.read_exact(&mut bytes)?;
        let header = Self::parse(&bytes)?;
        debug!(
            mark = %header.mark,
            width = header.max_width,
            height = header.max_height,
            grab_mode = header.grab_mode,
            "Read recording header"
        );
        Ok(header)
    }
}
