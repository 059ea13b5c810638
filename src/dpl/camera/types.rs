//! Safe camera/processing types
//!
//! Typed counterparts of the vendor enumerations and records, plus the builders used to
//! configure `DplInitialize` and `DplStart`.

use std::os::raw::c_int;
use std::path::PathBuf;

use crate::dpl::common::error::{DplError, Result};
use crate::dpl::ffi::types::{
    IscAreaDataStatistics, IscDataProcModuleParameter, IscDplConfiguration, IscGrabStartMode,
    IscRawFileHeader, IscStartMode, MAX_MODULE_PARAMETERS,
};
use crate::dpl::ffi::wide::{read_narrow, read_wide, write_wide};

/// Supported camera families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraModel {
    Vm,
    Xc,
    FourK,
    FourKA,
    FourKJ,
    Unknown,
}

impl CameraModel {
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => CameraModel::Vm,
            1 => CameraModel::Xc,
            2 => CameraModel::FourK,
            3 => CameraModel::FourKA,
            4 => CameraModel::FourKJ,
            _ => CameraModel::Unknown,
        }
    }

    pub fn as_raw(self) -> c_int {
        match self {
            CameraModel::Vm => 0,
            CameraModel::Xc => 1,
            CameraModel::FourK => 2,
            CameraModel::FourKA => 3,
            CameraModel::FourKJ => 4,
            CameraModel::Unknown => 5,
        }
    }
}

/// Capture pipeline stage requested from the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabMode {
    /// Corrected base image plus hardware disparity.
    Parallax,
    /// Corrected base and compare images.
    Correct,
    /// Uncorrected images.
    BeforeCorrect,
    BayerS0,
    BayerS1,
}

impl GrabMode {
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            1 => Some(GrabMode::Parallax),
            2 => Some(GrabMode::Correct),
            3 => Some(GrabMode::BeforeCorrect),
            4 => Some(GrabMode::BayerS0),
            5 => Some(GrabMode::BayerS1),
            _ => None,
        }
    }

    pub fn as_raw(self) -> c_int {
        match self {
            GrabMode::Parallax => 1,
            GrabMode::Correct => 2,
            GrabMode::BeforeCorrect => 3,
            GrabMode::BayerS0 => 4,
            GrabMode::BayerS1 => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Off,
    On,
}

impl ColorMode {
    pub fn from_raw(value: i32) -> Self {
        if value == 1 { ColorMode::On } else { ColorMode::Off }
    }

    pub fn as_raw(self) -> c_int {
        match self {
            ColorMode::Off => 0,
            ColorMode::On => 1,
        }
    }
}

/// Post-processing applied to the colour image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetColorMode {
    /// yuv -> bgr
    Bgr,
    /// yuv -> bgr -> correct
    Correct,
    /// yuv -> bgr -> correct -> auto white balance
    Awb,
    /// yuv -> bgr -> auto white balance
    AwbNoCorrect,
}

impl GetColorMode {
    pub fn from_raw(value: i32) -> Self {
        match value {
            1 => GetColorMode::Correct,
            2 => GetColorMode::Awb,
            3 => GetColorMode::AwbNoCorrect,
            _ => GetColorMode::Bgr,
        }
    }

    pub fn as_raw(self) -> c_int {
        match self {
            GetColorMode::Bgr => 0,
            GetColorMode::Correct => 1,
            GetColorMode::Awb => 2,
            GetColorMode::AwbNoCorrect => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterMode {
    Manual,
    Single,
    Double,
    /// Double shutter, alternate variant.
    Double2,
}

impl ShutterMode {
    pub fn from_raw(value: i32) -> Result<Self> {
        match value {
            0 => Ok(ShutterMode::Manual),
            1 => Ok(ShutterMode::Single),
            2 => Ok(ShutterMode::Double),
            3 => Ok(ShutterMode::Double2),
            other => Err(DplError::InvalidArgument(format!(
                "unknown shutter mode {}",
                other
            ))),
        }
    }

    pub fn as_raw(self) -> c_int {
        match self {
            ShutterMode::Manual => 0,
            ShutterMode::Single => 1,
            ShutterMode::Double => 2,
            ShutterMode::Double2 => 3,
        }
    }
}

/// Read-mostly camera-dependent constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraInfo {
    Bf,
    DInf,
    Dz,
    /// Base length in metres.
    BaseLength,
    /// Horizontal stereo view angle in degrees.
    ViewAngle,
    ProductId,
    SerialNumber,
    FpgaVersion,
    WidthMax,
    HeightMax,
}

impl CameraInfo {
    pub fn as_raw(self) -> c_int {
        self as c_int
    }
}

/// Camera control parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraParameter {
    MonoS0Image,
    MonoS1Image,
    DepthData,
    ColorImage,
    ColorImageCorrect,
    AlternatelyColorImage,
    BayerColorImage,
    ShutterMode,
    ManualShutter,
    SingleShutter,
    DoubleShutter,
    DoubleShutter2,
    Exposure,
    FineExposure,
    Gain,
    HrMode,
    HdrMode,
    AutoCalibration,
    ManualCalibration,
    OcclusionRemoval,
    PeculiarRemoval,
    SelfCalibration,
    GenericRead,
    GenericWrite,
}

impl CameraParameter {
    pub fn as_raw(self) -> c_int {
        self as c_int
    }
}

/// Stereo constants needed to turn disparity into distance, plus the maximum image size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraGeometry {
    pub base_length: f32,
    pub bf: f32,
    pub d_inf: f32,
    pub max_width: usize,
    pub max_height: usize,
}

impl CameraGeometry {
    /// Metric distance for a disparity value; zero where the disparity carries no depth.
    pub fn distance_from_disparity(&self, disparity: f32) -> f32 {
        if disparity > self.d_inf {
            self.bf / (disparity - self.d_inf)
        } else {
            0.0
        }
    }

    pub fn from_file_header(header: &RawFileHeader) -> Self {
        Self {
            base_length: header.base_length,
            bf: header.bf,
            d_inf: header.d_inf,
            max_width: header.max_width,
            max_height: header.max_height,
        }
    }
}

/// Decoded playback file header.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFileHeader {
    pub mark: String,
    pub version: i32,
    pub header_size: i32,
    pub camera_model: CameraModel,
    pub max_width: usize,
    pub max_height: usize,
    pub d_inf: f32,
    pub bf: f32,
    pub dz: f32,
    pub base_length: f32,
    /// Raw grab mode; recordings made in unsupported modes are kept as-is.
    pub grab_mode: i32,
    pub shutter_mode: i32,
    pub color_mode: i32,
}

impl From<&IscRawFileHeader> for RawFileHeader {
    fn from(raw: &IscRawFileHeader) -> Self {
        Self {
            mark: read_narrow(&raw.mark),
            version: raw.version,
            header_size: raw.header_size,
            camera_model: CameraModel::from_raw(raw.camera_model),
            max_width: raw.max_width.max(0) as usize,
            max_height: raw.max_height.max(0) as usize,
            d_inf: raw.d_inf,
            bf: raw.bf,
            dz: raw.dz,
            base_length: raw.base_length,
            grab_mode: raw.grab_mode,
            shutter_mode: raw.shutter_mode,
            color_mode: raw.color_mode,
        }
    }
}

/// Configuration passed to `DplInitialize`.
#[derive(Debug, Clone)]
pub struct DplConfig {
    pub configuration_file_path: PathBuf,
    pub log_file_path: PathBuf,
    /// 0:NONE 1:FATAL 2:ERROR 3:WARN 4:INFO 5:DEBUG 6:TRACE
    pub log_level: i32,
    pub enabled_camera: bool,
    pub camera_model: CameraModel,
    pub save_image_path: PathBuf,
    pub load_image_path: PathBuf,
    pub enabled_data_proc_module: bool,
    /// Shutter mode applied to a live camera right after initialization.
    pub shutter_mode: ShutterMode,
}

impl Default for DplConfig {
    fn default() -> Self {
        let temp = std::env::temp_dir();
        Self {
            configuration_file_path: PathBuf::from("./"),
            log_file_path: temp.clone(),
            log_level: 0,
            enabled_camera: true,
            camera_model: CameraModel::Vm,
            save_image_path: temp.clone(),
            load_image_path: temp,
            enabled_data_proc_module: true,
            shutter_mode: ShutterMode::Single,
        }
    }
}

impl DplConfig {
    pub fn builder() -> DplConfigBuilder {
        DplConfigBuilder::default()
    }

    pub(crate) fn to_native(&self) -> Result<IscDplConfiguration> {
        let mut native = IscDplConfiguration::default();
        write_wide(
            &mut native.configuration_file_path,
            &self.configuration_file_path.to_string_lossy(),
        )?;
        write_wide(&mut native.log_file_path, &self.log_file_path.to_string_lossy())?;
        write_wide(&mut native.save_image_path, &self.save_image_path.to_string_lossy())?;
        write_wide(&mut native.load_image_path, &self.load_image_path.to_string_lossy())?;
        native.log_level = self.log_level;
        native.enabled_camera = self.enabled_camera;
        native.isc_camera_model = self.camera_model.as_raw();
        native.enabled_data_proc_module = self.enabled_data_proc_module;
        Ok(native)
    }
}

/// Builder for DplConfig
#[derive(Default)]
pub struct DplConfigBuilder {
    configuration_file_path: Option<PathBuf>,
    log_file_path: Option<PathBuf>,
    log_level: Option<i32>,
    enabled_camera: Option<bool>,
    camera_model: Option<CameraModel>,
    save_image_path: Option<PathBuf>,
    load_image_path: Option<PathBuf>,
    enabled_data_proc_module: Option<bool>,
    shutter_mode: Option<ShutterMode>,
}

impl DplConfigBuilder {
    pub fn configuration_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.configuration_file_path = Some(path.into());
        self
    }

    pub fn log_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file_path = Some(path.into());
        self
    }

    pub fn log_level(mut self, level: i32) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn enabled_camera(mut self, enabled: bool) -> Self {
        self.enabled_camera = Some(enabled);
        self
    }

    pub fn camera_model(mut self, model: CameraModel) -> Self {
        self.camera_model = Some(model);
        self
    }

    pub fn save_image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_image_path = Some(path.into());
        self
    }

    pub fn load_image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.load_image_path = Some(path.into());
        self
    }

    pub fn enabled_data_proc_module(mut self, enabled: bool) -> Self {
        self.enabled_data_proc_module = Some(enabled);
        self
    }

    pub fn shutter_mode(mut self, mode: ShutterMode) -> Self {
        self.shutter_mode = Some(mode);
        self
    }

    pub fn build(self) -> DplConfig {
        let default = DplConfig::default();
        DplConfig {
            configuration_file_path: self
                .configuration_file_path
                .unwrap_or(default.configuration_file_path),
            log_file_path: self.log_file_path.unwrap_or(default.log_file_path),
            log_level: self.log_level.unwrap_or(default.log_level),
            enabled_camera: self.enabled_camera.unwrap_or(default.enabled_camera),
            camera_model: self.camera_model.unwrap_or(default.camera_model),
            save_image_path: self.save_image_path.unwrap_or(default.save_image_path),
            load_image_path: self.load_image_path.unwrap_or(default.load_image_path),
            enabled_data_proc_module: self
                .enabled_data_proc_module
                .unwrap_or(default.enabled_data_proc_module),
            shutter_mode: self.shutter_mode.unwrap_or(default.shutter_mode),
        }
    }
}

/// Everything `DplStart` needs. Rebuilt into a native record before each start.
#[derive(Debug, Clone, PartialEq)]
pub struct StartMode {
    pub grab_mode: GrabMode,
    pub color_mode: ColorMode,
    /// Time-out of one retrieval, in milliseconds.
    pub wait_time_ms: i32,
    pub get_raw: bool,
    pub get_color_mode: GetColorMode,
    pub record: bool,
    /// Recorded file to play back; `None` grabs from the camera.
    pub play_file: Option<PathBuf>,
    pub play_interval_ms: i32,
    pub stereo_matching: bool,
    pub frame_decoder: bool,
    pub disparity_filter: bool,
}

impl Default for StartMode {
    fn default() -> Self {
        Self {
            grab_mode: GrabMode::Parallax,
            color_mode: ColorMode::On,
            wait_time_ms: 100,
            get_raw: true,
            get_color_mode: GetColorMode::Awb,
            record: false,
            play_file: None,
            play_interval_ms: 16,
            stereo_matching: false,
            frame_decoder: false,
            disparity_filter: false,
        }
    }
}

impl StartMode {
    /// Live camera. Run mode 0 grabs hardware parallax with no host processing;
    /// any other value grabs corrected images and runs the full processing chain.
    pub fn for_camera(run_mode: u8) -> Self {
        let base = StartMode::default();
        if run_mode == 0 {
            base
        } else {
            base.grab_mode(GrabMode::Correct).processing(true, true, true)
        }
    }

    /// Playback of a recorded file, derived from its header.
    ///
    /// With `show_disparity` the frame decoder and filter run on parallax recordings.
    pub fn for_playback(header: &RawFileHeader, file: impl Into<PathBuf>, show_disparity: bool) -> Self {
        let base = StartMode {
            color_mode: ColorMode::from_raw(header.color_mode),
            play_file: Some(file.into()),
            ..StartMode::default()
        };

        match GrabMode::from_raw(header.grab_mode) {
            Some(GrabMode::Correct) => base.grab_mode(GrabMode::Correct).processing(true, true, true),
            Some(GrabMode::Parallax) => base
                .grab_mode(GrabMode::Parallax)
                .processing(false, show_disparity, show_disparity),
            _ => {
                tracing::warn!(
                    grab_mode = header.grab_mode,
                    "unsupported grab mode in recording, playing back as parallax"
                );
                base.grab_mode(GrabMode::Parallax)
                    .processing(false, show_disparity, show_disparity)
            }
        }
    }

    pub fn grab_mode(mut self, mode: GrabMode) -> Self {
        self.grab_mode = mode;
        self
    }

    pub fn color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = mode;
        self
    }

    pub fn wait_time_ms(mut self, wait: i32) -> Self {
        self.wait_time_ms = wait;
        self
    }

    pub fn record(mut self, record: bool) -> Self {
        self.record = record;
        self
    }

    pub fn processing(mut self, stereo_matching: bool, frame_decoder: bool, disparity_filter: bool) -> Self {
        self.stereo_matching = stereo_matching;
        self.frame_decoder = frame_decoder;
        self.disparity_filter = disparity_filter;
        self
    }

    pub fn is_playback(&self) -> bool {
        self.play_file.is_some()
    }

    pub(crate) fn to_native(&self) -> Result<IscStartMode> {
        let mut native = IscStartMode::default();
        let grab = &mut native.isc_grab_start_mode;
        grab.isc_grab_mode = self.grab_mode.as_raw();
        grab.isc_grab_color_mode = self.color_mode.as_raw();
        grab.isc_get_mode.wait_time = self.wait_time_ms;
        grab.isc_get_raw_mode = self.get_raw as c_int;
        grab.isc_get_color_mode = self.get_color_mode.as_raw();
        grab.isc_record_mode = self.record as c_int;
        grab.isc_play_mode = self.play_file.is_some() as c_int;
        grab.isc_play_mode_parameter.interval = self.play_interval_ms;
        if let Some(file) = &self.play_file {
            write_wide(
                &mut grab.isc_play_mode_parameter.play_file_name,
                &file.to_string_lossy(),
            )?;
        }

        let proc = &mut native.isc_dataproc_start_mode;
        proc.enabled_stereo_matching = self.stereo_matching;
        proc.enabled_frame_decoder = self.frame_decoder;
        proc.enabled_disparity_filter = self.disparity_filter;
        Ok(native)
    }
}

/// Current grab settings as reported by `DplGetGrabMode`.
#[derive(Debug, Clone, PartialEq)]
pub struct GrabSettings {
    pub grab_mode: Option<GrabMode>,
    pub color_mode: ColorMode,
    pub wait_time_ms: i32,
    pub get_raw: bool,
    pub get_color_mode: GetColorMode,
    pub record: bool,
    pub play: bool,
    pub play_interval_ms: i32,
    pub play_file: String,
}

impl From<&IscGrabStartMode> for GrabSettings {
    fn from(raw: &IscGrabStartMode) -> Self {
        Self {
            grab_mode: GrabMode::from_raw(raw.isc_grab_mode),
            color_mode: ColorMode::from_raw(raw.isc_grab_color_mode),
            wait_time_ms: raw.isc_get_mode.wait_time,
            get_raw: raw.isc_get_raw_mode != 0,
            get_color_mode: GetColorMode::from_raw(raw.isc_get_color_mode),
            record: raw.isc_record_mode != 0,
            play: raw.isc_play_mode != 0,
            play_interval_ms: raw.isc_play_mode_parameter.interval,
            play_file: read_wide(&raw.isc_play_mode_parameter.play_file_name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Statistics {
    pub max_value: f32,
    pub min_value: f32,
    pub std_dev: f32,
    pub average: f32,
    pub median: f32,
    pub mode: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Roi3d {
    pub width: f32,
    pub height: f32,
    pub distance: f32,
}

/// Rectangle in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Disparity and distance statistics over a region of the last frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaStatistics {
    pub region: Rect,
    pub min_distance: f32,
    pub max_distance: f32,
    pub disparity: Statistics,
    pub distance: Statistics,
    pub roi: Roi3d,
}

impl From<&crate::dpl::ffi::types::Statistics> for Statistics {
    fn from(raw: &crate::dpl::ffi::types::Statistics) -> Self {
        Self {
            max_value: raw.max_value,
            min_value: raw.min_value,
            std_dev: raw.std_dev,
            average: raw.average,
            median: raw.median,
            mode: raw.mode,
        }
    }
}

impl From<&IscAreaDataStatistics> for AreaStatistics {
    fn from(raw: &IscAreaDataStatistics) -> Self {
        Self {
            region: Rect {
                x: raw.x,
                y: raw.y,
                width: raw.width,
                height: raw.height,
            },
            min_distance: raw.min_distance,
            max_distance: raw.max_distance,
            disparity: Statistics::from(&raw.statistics_depth),
            distance: Statistics::from(&raw.statistics_distance),
            roi: Roi3d {
                width: raw.roi_3d.width,
                height: raw.roi_3d.height,
                distance: raw.roi_3d.distance,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    Int(i32),
    Float(f32),
    Double(f64),
}

/// One tunable of a data-processing module.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterEntry {
    pub category: String,
    pub name: String,
    pub description: String,
    pub value: ParameterValue,
}

/// Parameter table of a data-processing module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleParameter {
    pub module_index: i32,
    pub module_name: String,
    pub parameters: Vec<ParameterEntry>,
}

impl From<&IscDataProcModuleParameter> for ModuleParameter {
    fn from(raw: &IscDataProcModuleParameter) -> Self {
        let count = (raw.parameter_count.max(0) as usize).min(MAX_MODULE_PARAMETERS);
        let parameters = raw.parameter_set[..count]
            .iter()
            .map(|set| ParameterEntry {
                category: read_wide(&set.category),
                name: read_wide(&set.name),
                description: read_wide(&set.description),
                value: match set.value_type {
                    0 => ParameterValue::Int(set.value_int),
                    1 => ParameterValue::Float(set.value_float),
                    _ => ParameterValue::Double(set.value_double),
                },
            })
            .collect();

        Self {
            module_index: raw.module_index,
            module_name: read_wide(&raw.module_name),
            parameters,
        }
    }
}

impl ModuleParameter {
    pub(crate) fn to_native(&self) -> Result<Box<IscDataProcModuleParameter>> {
        if self.parameters.len() > MAX_MODULE_PARAMETERS {
            return Err(DplError::InvalidArgument(format!(
                "module {} has {} parameters, at most {} are supported",
                self.module_name,
                self.parameters.len(),
                MAX_MODULE_PARAMETERS
            )));
        }

        let mut native = Box::<IscDataProcModuleParameter>::default();
        native.module_index = self.module_index;
        write_wide(&mut native.module_name, &self.module_name)?;
        native.parameter_count = self.parameters.len() as c_int;

        for (set, entry) in native.parameter_set.iter_mut().zip(&self.parameters) {
            write_wide(&mut set.category, &entry.category)?;
            write_wide(&mut set.name, &entry.name)?;
            write_wide(&mut set.description, &entry.description)?;
            match entry.value {
                ParameterValue::Int(v) => {
                    set.value_type = 0;
                    set.value_int = v;
                }
                ParameterValue::Float(v) => {
                    set.value_type = 1;
                    set.value_float = v;
                }
                ParameterValue::Double(v) => {
                    set.value_type = 2;
                    set.value_double = v;
                }
            }
        }

        Ok(native)
    }
}
