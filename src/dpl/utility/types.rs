//! Display configuration for the visualization library

use crate::dpl::camera::types::CameraGeometry;
use crate::dpl::ffi::types::DplIscUtilityParameter;

/// Colour-map ranges and drawing options.
#[derive(Debug, Clone, PartialEq)]
pub struct UtilityConfig {
    /// Camera mounting angle in degrees.
    pub camera_angle: f64,
    /// Whether to draw pixels outside the display range.
    pub draw_outside_bounds: bool,
    /// Distance range in metres
    pub min_distance: f64,
    pub max_distance: f64,
    pub step_distance: f64,
    /// Disparity range in pixels
    pub min_disparity: f64,
    pub max_disparity: f64,
    pub step_disparity: f64,
}

impl Default for UtilityConfig {
    fn default() -> Self {
        Self {
            camera_angle: 0.0,
            draw_outside_bounds: true,
            min_distance: 0.5,
            max_distance: 20.0,
            step_distance: 0.01,
            min_disparity: 0.0,
            max_disparity: 255.0,
            step_disparity: 0.25,
        }
    }
}

impl UtilityConfig {
    pub fn builder() -> UtilityConfigBuilder {
        UtilityConfigBuilder::default()
    }

    pub(crate) fn to_native(&self, geometry: &CameraGeometry) -> DplIscUtilityParameter {
        DplIscUtilityParameter {
            max_width: geometry.max_width as i32,
            max_height: geometry.max_height as i32,
            base_length: geometry.base_length as f64,
            d_inf: geometry.d_inf as f64,
            bf: geometry.bf as f64,
            camera_angle: self.camera_angle,
            draw_outside_bounds: self.draw_outside_bounds,
            min_distance: self.min_distance,
            max_distance: self.max_distance,
            step_distance: self.step_distance,
            min_disparity: self.min_disparity,
            max_disparity: self.max_disparity,
            step_disparity: self.step_disparity,
        }
    }
}

/// Builder for UtilityConfig
#[derive(Default)]
pub struct UtilityConfigBuilder {
    camera_angle: Option<f64>,
    draw_outside_bounds: Option<bool>,
    distance_range: Option<(f64, f64, f64)>,
    disparity_range: Option<(f64, f64, f64)>,
}

impl UtilityConfigBuilder {
    pub fn camera_angle(mut self, degrees: f64) -> Self {
        self.camera_angle = Some(degrees);
        self
    }

    pub fn draw_outside_bounds(mut self, draw: bool) -> Self {
        self.draw_outside_bounds = Some(draw);
        self
    }

    pub fn distance_range(mut self, min: f64, max: f64, step: f64) -> Self {
        self.distance_range = Some((min, max, step));
        self
    }

    pub fn disparity_range(mut self, min: f64, max: f64, step: f64) -> Self {
        self.disparity_range = Some((min, max, step));
        self
    }

    pub fn build(self) -> UtilityConfig {
        let default = UtilityConfig::default();
        let (min_distance, max_distance, step_distance) = self.distance_range.unwrap_or((
            default.min_distance,
            default.max_distance,
            default.step_distance,
        ));
        let (min_disparity, max_disparity, step_disparity) = self.disparity_range.unwrap_or((
            default.min_disparity,
            default.max_disparity,
            default.step_disparity,
        ));
        UtilityConfig {
            camera_angle: self.camera_angle.unwrap_or(default.camera_angle),
            draw_outside_bounds: self.draw_outside_bounds.unwrap_or(default.draw_outside_bounds),
            min_distance,
            max_distance,
            step_distance,
            min_disparity,
            max_disparity,
            step_disparity,
        }
    }
}
