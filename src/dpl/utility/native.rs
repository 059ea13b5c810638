use std::os::raw::{c_double, c_float, c_int};
use std::path::Path;

use libloading::Library;
use tracing::debug;

use crate::dpl::common::error::{check_utility, DplError, Result};
use crate::dpl::ffi::types::DplIscUtilityParameter;
use crate::dpl::utility::api::UtilityApi;

/// Base name of the visualization library.
pub const UTILITY_LIBRARY: &str = "IscUtility";

type FnInitialize = unsafe extern "C" fn(*mut DplIscUtilityParameter) -> c_int;
type FnTerminate = unsafe extern "C" fn() -> c_int;
type FnRebuild = unsafe extern "C" fn(c_double, c_double);
type FnConvert = unsafe extern "C" fn(c_int, c_int, *mut c_float, *mut u8) -> c_int;

pub struct NativeUtility {
    initialize: FnInitialize,
    terminate: FnTerminate,
    rebuild_color_map: FnRebuild,
    disparity_to_distance_image: FnConvert,
    disparity_to_image: FnConvert,
    _lib: Library,
}

fn symbol<F: Copy>(lib: &Library, name: &'static str) -> Result<F> {
    // SAFETY: `F` is the C signature `name` is exported with.
    let symbol = unsafe { lib.get::<F>(name.as_bytes()) }
        .map_err(|source| DplError::MissingSymbol { name, source })?;
    Ok(*symbol)
}

impl NativeUtility {
    pub fn load() -> Result<Self> {
        let path = Path::new("./").join(libloading::library_filename(UTILITY_LIBRARY));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading utility library");
        // SAFETY: see `NativeDpl::load_from`.
        let lib = unsafe { Library::new(path) }.map_err(|source| DplError::LibraryLoad {
            name: path.display().to_string(),
            source,
        })?;

        Ok(Self {
            initialize: symbol(&lib, "DplIscUtilityInitialize")?,
            terminate: symbol(&lib, "DplIscUtilityTerminate")?,
            rebuild_color_map: symbol(&lib, "DplIscUtilityRebuildDrawColorMap")?,
            disparity_to_distance_image: symbol(&lib, "Disparity2DistanceImage")?,
            disparity_to_image: symbol(&lib, "Disparity2Image")?,
            _lib: lib,
        })
    }
}

/// Shared precondition of both conversions: the slices cover the requested frame.
fn check_sizes(width: i32, height: i32, disparity: &[f32], bgr: &[u8]) -> Result<()> {
    if width <= 0 || height <= 0 {
        return Err(DplError::InvalidDimensions(width.max(0) as usize, height.max(0) as usize));
    }
    let pixels = width as usize * height as usize;
    if disparity.len() < pixels || bgr.len() < pixels * 3 {
        return Err(DplError::InvalidArgument(format!(
            "{}x{} frame needs {} disparity values and {} output bytes, got {} and {}",
            width,
            height,
            pixels,
            pixels * 3,
            disparity.len(),
            bgr.len()
        )));
    }
    Ok(())
}

impl UtilityApi for NativeUtility {
    fn initialize(&self, parameter: &DplIscUtilityParameter) -> Result<()> {
        let mut parameter = *parameter;
        // SAFETY: `parameter` is valid for the duration of the call.
        check_utility("DplIscUtilityInitialize", unsafe { (self.initialize)(&mut parameter) })
    }

    fn terminate(&self) -> Result<()> {
        // SAFETY: no arguments.
        check_utility("DplIscUtilityTerminate", unsafe { (self.terminate)() })
    }

    fn rebuild_color_map(&self, min_distance: f64, max_distance: f64) {
        // SAFETY: arguments are passed by value.
        unsafe { (self.rebuild_color_map)(min_distance, max_distance) }
    }

    fn disparity_to_distance_image(&self, width: i32, height: i32, disparity: &[f32], bgr: &mut [u8]) -> Result<()> {
        check_sizes(width, height, disparity, bgr)?;
        // SAFETY: sizes were checked above; the library only reads `disparity`.
        check_utility("Disparity2DistanceImage", unsafe {
            (self.disparity_to_distance_image)(width, height, disparity.as_ptr() as *mut c_float, bgr.as_mut_ptr())
        })
    }

    fn disparity_to_image(&self, width: i32, height: i32, disparity: &[f32], bgr: &mut [u8]) -> Result<()> {
        check_sizes(width, height, disparity, bgr)?;
        // SAFETY: as above.
        check_utility("Disparity2Image", unsafe {
            (self.disparity_to_image)(width, height, disparity.as_ptr() as *mut c_float, bgr.as_mut_ptr())
        })
    }
}
