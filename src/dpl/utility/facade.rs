use std::marker::PhantomData;

use tracing::{error, info, instrument, warn};

use crate::dpl::camera::types::CameraGeometry;
use crate::dpl::common::error::{DplError, Result};
use crate::dpl::utility::api::UtilityApi;
use crate::dpl::utility::native::NativeUtility;
use crate::dpl::utility::types::UtilityConfig;

/// Borrowed BGR image, `width * height * 3` bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

impl ImageView<'_> {
    pub const CHANNELS: usize = 3;
}

/// Result of a conversion. The image is valid, zero-filled, even when `result` is an error.
#[derive(Debug)]
pub struct ColorMapped<'a> {
    pub result: Result<()>,
    pub image: ImageView<'a>,
}

#[derive(Debug, Clone, Copy)]
enum Conversion {
    Distance,
    Disparity,
}

/// Visualization library session with its owned BGR output buffer.
///
/// The library keeps global state with no thread-safety guarantee, so a session
/// stays on the thread that opened it.
///
/// ```compile_fail
/// use isc_dpl_rs::dpl::utility::{IscUtility, NativeUtility};
/// fn assert_send<T: Send>() {}
/// assert_send::<IscUtility<NativeUtility>>();
/// ```
///
/// ```compile_fail
/// use isc_dpl_rs::dpl::utility::{IscUtility, NativeUtility};
/// fn assert_sync<T: Sync>() {}
/// assert_sync::<IscUtility<NativeUtility>>();
/// ```
pub struct IscUtility<U: UtilityApi = NativeUtility> {
    api: U,
    config: UtilityConfig,
    geometry: CameraGeometry,
    bgr: Vec<u8>,
    initialized: bool,
    _not_send: PhantomData<*const ()>,
}

impl IscUtility<NativeUtility> {
    pub fn open(geometry: CameraGeometry, config: UtilityConfig) -> Result<Self> {
        Self::with_api(NativeUtility::load()?, geometry, config)
    }
}

impl<U: UtilityApi> IscUtility<U> {
    #[instrument(skip(api, geometry, config), fields(width = geometry.max_width, height = geometry.max_height))]
    pub fn with_api(api: U, geometry: CameraGeometry, config: UtilityConfig) -> Result<Self> {
        if geometry.max_width == 0 || geometry.max_height == 0 {
            return Err(DplError::InvalidDimensions(geometry.max_width, geometry.max_height));
        }

        api.initialize(&config.to_native(&geometry))?;
        info!(
            min_distance = config.min_distance,
            max_distance = config.max_distance,
            "Utility initialized"
        );

        Ok(Self {
            api,
            bgr: vec![0; geometry.max_width * geometry.max_height * ImageView::CHANNELS],
            config,
            geometry,
            initialized: true,
            _not_send: PhantomData,
        })
    }

    pub fn config(&self) -> &UtilityConfig {
        &self.config
    }

    pub fn geometry(&self) -> CameraGeometry {
        self.geometry
    }

    /// Colour-maps a disparity frame by metric distance.
    pub fn disparity_to_distance_image(&mut self, width: usize, height: usize, disparity: &[f32]) -> ColorMapped<'_> {
        self.convert(Conversion::Distance, width, height, disparity)
    }

    /// Colour-maps a disparity frame by raw disparity.
    pub fn disparity_to_image(&mut self, width: usize, height: usize, disparity: &[f32]) -> ColorMapped<'_> {
        self.convert(Conversion::Disparity, width, height, disparity)
    }

    fn convert(&mut self, conversion: Conversion, width: usize, height: usize, disparity: &[f32]) -> ColorMapped<'_> {
        let len = width * height * ImageView::CHANNELS;
        if self.bgr.len() < len {
            warn!(width, height, "Frame larger than initialized maximum, growing output buffer");
            self.bgr.resize(len, 0);
        }

        let result = if width == 0 || height == 0 {
            Err(DplError::InvalidDimensions(width, height))
        } else if disparity.len() < width * height {
            Err(DplError::InvalidArgument(format!(
                "{}x{} frame needs {} disparity values, got {}",
                width,
                height,
                width * height,
                disparity.len()
            )))
        } else {
            let output = &mut self.bgr[..len];
            match conversion {
                Conversion::Distance => {
                    self.api
                        .disparity_to_distance_image(width as i32, height as i32, disparity, output)
                }
                Conversion::Disparity => {
                    self.api.disparity_to_image(width as i32, height as i32, disparity, output)
                }
            }
        };

        if let Err(e) = &result {
            error!(?conversion, "Conversion failed: {}", e);
            self.bgr[..len].fill(0);
        }

        ColorMapped {
            result,
            image: ImageView {
                width,
                height,
                data: &self.bgr[..len],
            },
        }
    }

    /// Rebuilds the distance colour map for a new display range.
    pub fn rebuild_color_map(&mut self, min_distance: f64, max_distance: f64) -> Result<()> {
        if !(min_distance < max_distance) {
            return Err(DplError::InvalidArgument(format!(
                "empty distance range {}..{}",
                min_distance, max_distance
            )));
        }
        self.api.rebuild_color_map(min_distance, max_distance);
        self.config.min_distance = min_distance;
        self.config.max_distance = max_distance;
        Ok(())
    }

    pub fn terminate(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;
        self.api.terminate()?;
        info!("Utility terminated");
        Ok(())
    }
}

impl<U: UtilityApi> Drop for IscUtility<U> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("Utility teardown failed: {}", e);
        }
    }
}
