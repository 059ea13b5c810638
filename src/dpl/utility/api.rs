use crate::dpl::common::error::Result;
use crate::dpl::ffi::types::DplIscUtilityParameter;

/// Typed entry points of the visualization library.
pub trait UtilityApi {
    fn initialize(&self, parameter: &DplIscUtilityParameter) -> Result<()>;
    fn terminate(&self) -> Result<()>;
    fn rebuild_color_map(&self, min_distance: f64, max_distance: f64);

    /// Writes `width * height` BGR pixels into `bgr`, coloured by metric distance.
    fn disparity_to_distance_image(&self, width: i32, height: i32, disparity: &[f32], bgr: &mut [u8]) -> Result<()>;

    /// Writes `width * height` BGR pixels into `bgr`, coloured by disparity.
    fn disparity_to_image(&self, width: i32, height: i32, disparity: &[f32], bgr: &mut [u8]) -> Result<()>;
}
