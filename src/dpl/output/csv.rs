//! Plain-text export of one disparity frame

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{info, instrument};

use crate::dpl::camera::types::CameraGeometry;
use crate::dpl::common::error::{DplError, Result};

/// Writes `disparity` as comma-separated rows, one line per image row.
#[instrument(skip(path, disparity), fields(path = %path.as_ref().display()))]
pub fn write_disparity_csv<P: AsRef<Path>>(path: P, width: usize, height: usize, disparity: &[f32]) -> Result<()> {
    write_rows(path.as_ref(), width, height, disparity)?;
    info!(width, height, "Disparity exported");
    Ok(())
}

/// Writes the metric distance of every pixel; pixels at or below `d_inf` are 0.
#[instrument(skip(path, geometry, disparity), fields(path = %path.as_ref().display()))]
pub fn write_distance_csv<P: AsRef<Path>>(
    path: P,
    geometry: &CameraGeometry,
    width: usize,
    height: usize,
    disparity: &[f32],
) -> Result<()> {
    let distance: Vec<f32> = disparity
        .iter()
        .map(|&d| geometry.distance_from_disparity(d))
        .collect();
    write_rows(path.as_ref(), width, height, &distance)?;
    info!(width, height, "Distance exported");
    Ok(())
}

fn write_rows(path: &Path, width: usize, height: usize, values: &[f32]) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(DplError::InvalidDimensions(width, height));
    }
    if values.len() < width * height {
        return Err(DplError::InvalidArgument(format!(
            "{}x{} frame needs {} values, got {}",
            width,
            height,
            width * height,
            values.len()
        )));
    }

    let mut out = BufWriter::new(File::create(path)?);
    for row in values[..width * height].chunks_exact(width) {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                out.write_all(b",")?;
            }
            write!(out, "{}", value)?;
        }
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
