use crate::dpl::camera::types::{CameraInfo, CameraParameter, ShutterMode};
use crate::dpl::common::error::Result;
use crate::dpl::ffi::types::{
    IscAreaDataStatistics, IscDataProcModuleParameter, IscDataProcResultData, IscDplConfiguration,
    IscGrabStartMode, IscImageInfo, IscRawFileHeader, IscStartMode,
};

/// Which option table an option lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionTarget {
    Info(CameraInfo),
    Param(CameraParameter),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionQuery {
    Implemented,
    Readable,
    Writable,
}

/// Which value of an option to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Current,
    Min,
    Max,
    Inc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Int,
    Float,
    Bool,
    U64,
    Shutter,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    U64(u64),
    Shutter(ShutterMode),
}

impl OptionValue {
    pub fn option_type(&self) -> OptionType {
        match self {
            OptionValue::Int(_) => OptionType::Int,
            OptionValue::Float(_) => OptionType::Float,
            OptionValue::Bool(_) => OptionType::Bool,
            OptionValue::U64(_) => OptionType::U64,
            OptionValue::Shutter(_) => OptionType::Shutter,
        }
    }
}

/// Typed entry points of the camera/processing library.
///
/// Every method maps to one native call; status codes are already checked.
/// Buffers handed in by reference must stay alive while the native side holds them.
pub trait DplApi {
    fn initialize(&self, config: &IscDplConfiguration) -> Result<()>;
    fn terminate(&self) -> Result<()>;

    fn option_is(&self, query: OptionQuery, target: OptionTarget) -> bool;
    fn get_option(&self, target: OptionTarget, kind: ValueKind, ty: OptionType) -> Result<OptionValue>;
    fn set_option(&self, target: OptionTarget, value: OptionValue) -> Result<()>;
    fn get_string_option(&self, target: OptionTarget, max_len: usize) -> Result<String>;
    fn set_string_option(&self, target: OptionTarget, value: &str) -> Result<()>;

    fn start(&self, mode: &IscStartMode) -> Result<()>;
    fn stop(&self) -> Result<()>;
    fn get_grab_mode(&self) -> Result<IscGrabStartMode>;

    fn initialize_image_info(&self, info: &mut IscImageInfo) -> Result<()>;
    fn release_image_info(&self, info: &mut IscImageInfo) -> Result<()>;
    fn get_camera_data(&self, info: &mut IscImageInfo) -> Result<()>;
    fn get_file_information(&self, path: &str) -> Result<IscRawFileHeader>;

    /// Returns `(disparity, depth)` at a pixel.
    fn position_depth(&self, x: i32, y: i32, info: &IscImageInfo) -> Result<(f32, f32)>;
    fn position_3d(&self, x: i32, y: i32, info: &IscImageInfo) -> Result<(f32, f32, f32)>;
    fn area_statistics(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        info: &IscImageInfo,
    ) -> Result<IscAreaDataStatistics>;

    fn total_module_count(&self) -> Result<i32>;
    fn module_name(&self, index: i32) -> Result<String>;
    fn get_module_parameter(&self, index: i32) -> Result<Box<IscDataProcModuleParameter>>;
    fn set_module_parameter(&self, param: &IscDataProcModuleParameter, persist: bool) -> Result<()>;
    fn parameter_file_name(&self, index: i32) -> Result<String>;
    fn reload_parameter_file(&self, index: i32, path: &str, valid: bool) -> Result<()>;

    fn initialize_result_data(&self, data: &mut IscDataProcResultData) -> Result<()>;
    fn release_result_data(&self, data: &mut IscDataProcResultData) -> Result<()>;
    fn get_data_proc_module_data(&self, data: &mut IscDataProcResultData) -> Result<()>;
}
