//! `#[repr(C)]` mirrors of the records exchanged with `IscDplC` and `IscUtility`.
//!
//! Field order, widths and alignment follow the vendor headers exactly. Enumerated
//! values are kept as raw `i32` here; the safe enums live in `camera::types`.

#![allow(non_snake_case)]

use std::os::raw::{c_double, c_float, c_int, c_uint};

use super::wide::{WChar, MAX_PATH};

/// Number of frames carried by one `IscImageInfo` (latest, previous, merged).
pub const FRAME_SLOTS: usize = 3;
/// Frame slot holding the most recent data.
pub const LATEST_FRAME: usize = 0;
pub const MAX_MODULE_PARAMETERS: usize = 48;
pub const MAX_MODULE_STATUS: usize = 4;
pub const MODULE_NAME_LEN: usize = 32;
pub const FILE_MARK_LEN: usize = 32;

macro_rules! zeroed_default {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Default for $ty {
                fn default() -> Self {
                    // SAFETY: plain C record; all-zero is a valid value for every
                    // field (integers, floats, `false`, null pointers).
                    unsafe { std::mem::zeroed() }
                }
            }
        )*
    };
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IscDplConfiguration {
    pub configuration_file_path: [WChar; MAX_PATH],
    pub log_file_path: [WChar; MAX_PATH],
    /// 0:NONE 1:FATAL 2:ERROR 3:WARN 4:INFO 5:DEBUG 6:TRACE
    pub log_level: c_int,
    pub enabled_camera: bool,
    pub isc_camera_model: c_int,
    pub save_image_path: [WChar; MAX_PATH],
    pub load_image_path: [WChar; MAX_PATH],
    pub enabled_data_proc_module: bool,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IscCameraSpecificParameter {
    pub d_inf: c_float,
    pub bf: c_float,
    pub base_length: c_float,
    pub dz: c_float,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IscCameraStatus {
    pub error_code: c_uint,
    pub data_receive_tact_time: c_double,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ImageType {
    pub width: c_int,
    pub height: c_int,
    pub channel_count: c_int,
    pub image: *mut u8,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DepthType {
    pub width: c_int,
    pub height: c_int,
    pub image: *mut c_float,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FrameData {
    pub camera_status: IscCameraStatus,
    pub frameNo: c_int,
    pub gain: c_int,
    pub exposure: c_int,
    /// Base (reference side) image.
    pub p1: ImageType,
    /// Compare image, corrected or raw depending on grab mode.
    pub p2: ImageType,
    pub color: ImageType,
    pub depth: DepthType,
    pub raw: ImageType,
    pub raw_color: ImageType,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IscImageInfo {
    pub camera_specific_parameter: IscCameraSpecificParameter,
    pub grab: c_int,
    pub color_grab_mode: c_int,
    pub shutter_mode: c_int,
    pub frame_data: [FrameData; FRAME_SLOTS],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IscRawFileHeader {
    pub mark: [u8; FILE_MARK_LEN],
    pub version: c_int,
    pub header_size: c_int,
    /// 0:VM 1:XC 2:4K 3:4KA 4:4KJ 99:unknown
    pub camera_model: c_int,
    pub max_width: c_int,
    pub max_height: c_int,
    pub d_inf: c_float,
    pub bf: c_float,
    pub dz: c_float,
    pub base_length: c_float,
    pub grab_mode: c_int,
    pub shutter_mode: c_int,
    pub color_mode: c_int,
    pub reserve: [c_int; 12],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IscGetMode {
    /// Time-out for one retrieval, in milliseconds.
    pub wait_time: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IscPlayModeParameter {
    pub interval: c_int,
    pub play_file_name: [WChar; MAX_PATH],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IscGrabStartMode {
    pub isc_grab_mode: c_int,
    pub isc_grab_color_mode: c_int,
    pub isc_get_mode: IscGetMode,
    pub isc_get_raw_mode: c_int,
    pub isc_get_color_mode: c_int,
    pub isc_record_mode: c_int,
    pub isc_play_mode: c_int,
    pub isc_play_mode_parameter: IscPlayModeParameter,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IscDataProcStartMode {
    pub enabled_stereo_matching: bool,
    pub enabled_frame_decoder: bool,
    pub enabled_disparity_filter: bool,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IscStartMode {
    pub isc_grab_start_mode: IscGrabStartMode,
    pub isc_dataproc_start_mode: IscDataProcStartMode,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Statistics {
    pub max_value: c_float,
    pub min_value: c_float,
    pub std_dev: c_float,
    pub average: c_float,
    pub median: c_float,
    pub mode: c_float,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Roi3D {
    pub width: c_float,
    pub height: c_float,
    pub distance: c_float,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IscAreaDataStatistics {
    pub x: c_int,
    pub y: c_int,
    pub width: c_int,
    pub height: c_int,
    pub min_distance: c_float,
    pub max_distance: c_float,
    pub statistics_depth: Statistics,
    pub statistics_distance: Statistics,
    pub roi_3d: Roi3D,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ParameterSet {
    /// 0:int 1:float 2:double
    pub value_type: c_int,
    pub value_int: c_int,
    pub value_float: c_float,
    pub value_double: c_double,
    pub category: [WChar; 32],
    pub name: [WChar; 16],
    pub description: [WChar; 32],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IscDataProcModuleParameter {
    pub module_index: c_int,
    pub module_name: [WChar; MODULE_NAME_LEN],
    pub parameter_count: c_int,
    pub parameter_set: [ParameterSet; MAX_MODULE_PARAMETERS],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IscDataProcStatus {
    pub error_code: c_int,
    pub proc_tact_time: c_double,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IscDataProcModuleStatus {
    pub module_names: [u8; MODULE_NAME_LEN],
    pub error_code: c_int,
    pub processing_time: c_double,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IscDataProcResultData {
    pub number_of_modules_processed: c_int,
    pub maximum_number_of_modules: c_int,
    pub maximum_number_of_modulename: c_int,
    pub status: IscDataProcStatus,
    pub module_status: [IscDataProcModuleStatus; MAX_MODULE_STATUS],
    pub isc_image_info: IscImageInfo,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DplIscUtilityParameter {
    pub max_width: c_int,
    pub max_height: c_int,
    pub base_length: c_double,
    pub d_inf: c_double,
    pub bf: c_double,
    pub camera_angle: c_double,
    /// Whether to draw pixels outside the display range.
    pub draw_outside_bounds: bool,
    pub min_distance: c_double,
    pub max_distance: c_double,
    pub step_distance: c_double,
    pub min_disparity: c_double,
    pub max_disparity: c_double,
    pub step_disparity: c_double,
}

zeroed_default!(
    IscDplConfiguration,
    IscCameraSpecificParameter,
    IscCameraStatus,
    ImageType,
    DepthType,
    FrameData,
    IscImageInfo,
    IscRawFileHeader,
    IscGetMode,
    IscPlayModeParameter,
    IscGrabStartMode,
    IscDataProcStartMode,
    IscStartMode,
    Statistics,
    Roi3D,
    IscAreaDataStatistics,
    ParameterSet,
    IscDataProcModuleParameter,
    IscDataProcStatus,
    IscDataProcModuleStatus,
    IscDataProcResultData,
    DplIscUtilityParameter,
);
