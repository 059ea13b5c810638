use std::ffi::CString;
use std::os::raw::{c_char, c_float, c_int, c_uint};
use std::path::Path;

use libloading::Library;
use tracing::debug;

use crate::dpl::camera::api::{DplApi, OptionQuery, OptionTarget, OptionType, OptionValue, ValueKind};
use crate::dpl::camera::types::ShutterMode;
use crate::dpl::common::error::{check, DplError, Result};
use crate::dpl::ffi::types::{
    IscAreaDataStatistics, IscDataProcModuleParameter, IscDataProcResultData, IscDplConfiguration,
    IscGrabStartMode, IscImageInfo, IscRawFileHeader, IscStartMode, MODULE_NAME_LEN,
};
use crate::dpl::ffi::wide::{read_narrow, read_wide, to_wide_nul, WChar, MAX_PATH};

/// Base name of the camera/processing library.
pub const DPL_LIBRARY: &str = "IscDplC";

type FnStatus = unsafe extern "C" fn() -> c_uint;
type FnConfig = unsafe extern "C" fn(*mut IscDplConfiguration) -> c_uint;
type FnIs = unsafe extern "C" fn(c_int) -> bool;
type FnGetInt = unsafe extern "C" fn(c_int, *mut c_int) -> c_uint;
type FnSetInt = unsafe extern "C" fn(c_int, c_int) -> c_uint;
type FnGetFloat = unsafe extern "C" fn(c_int, *mut c_float) -> c_uint;
type FnSetFloat = unsafe extern "C" fn(c_int, c_float) -> c_uint;
type FnGetBool = unsafe extern "C" fn(c_int, *mut bool) -> c_uint;
type FnSetBool = unsafe extern "C" fn(c_int, bool) -> c_uint;
type FnGetChar = unsafe extern "C" fn(c_int, *mut c_char, c_int) -> c_uint;
type FnSetChar = unsafe extern "C" fn(c_int, *mut c_char) -> c_uint;
type FnGetU64 = unsafe extern "C" fn(c_int, *mut u64) -> c_uint;
type FnSetU64 = unsafe extern "C" fn(c_int, u64) -> c_uint;
type FnStart = unsafe extern "C" fn(*mut IscStartMode) -> c_uint;
type FnGrabMode = unsafe extern "C" fn(*mut IscGrabStartMode) -> c_uint;
type FnImageInfo = unsafe extern "C" fn(*mut IscImageInfo) -> c_uint;
type FnFileInfo = unsafe extern "C" fn(*mut WChar, *mut IscRawFileHeader) -> c_uint;
type FnPositionDepth =
    unsafe extern "C" fn(c_int, c_int, *mut IscImageInfo, *mut c_float, *mut c_float) -> c_uint;
type FnPosition3d = unsafe extern "C" fn(
    c_int,
    c_int,
    *mut IscImageInfo,
    *mut c_float,
    *mut c_float,
    *mut c_float,
) -> c_uint;
type FnAreaStatistics = unsafe extern "C" fn(
    c_int,
    c_int,
    c_int,
    c_int,
    *mut IscImageInfo,
    *mut IscAreaDataStatistics,
) -> c_uint;
type FnCount = unsafe extern "C" fn(*mut c_int) -> c_uint;
type FnIndexedWide = unsafe extern "C" fn(c_int, *mut WChar, c_int) -> c_uint;
type FnGetModuleParameter = unsafe extern "C" fn(c_int, *mut IscDataProcModuleParameter) -> c_uint;
type FnSetModuleParameter =
    unsafe extern "C" fn(c_int, *mut IscDataProcModuleParameter, bool) -> c_uint;
type FnReload = unsafe extern "C" fn(c_int, *mut WChar, c_int) -> c_uint;
type FnResultData = unsafe extern "C" fn(*mut IscDataProcResultData) -> c_uint;

/// A resolved entry point together with its exported name.
#[derive(Clone, Copy)]
struct Bound<F> {
    name: &'static str,
    f: F,
}

fn bind<F: Copy>(lib: &Library, name: &'static str) -> Result<Bound<F>> {
    // SAFETY: every `F` used with `bind` is the exact C signature of `name` as
    // declared by the vendor header.
    let symbol = unsafe { lib.get::<F>(name.as_bytes()) }
        .map_err(|source| DplError::MissingSymbol { name, source })?;
    Ok(Bound { name, f: *symbol })
}

/// Device option accessors. The library exports one set for camera info and
/// one for camera parameters, differing only in the name infix.
struct OptionTable {
    is_implemented: Bound<FnIs>,
    is_readable: Bound<FnIs>,
    is_writable: Bound<FnIs>,
    min_int: Bound<FnGetInt>,
    max_int: Bound<FnGetInt>,
    inc_int: Bound<FnGetInt>,
    get_int: Bound<FnGetInt>,
    set_int: Bound<FnSetInt>,
    min_float: Bound<FnGetFloat>,
    max_float: Bound<FnGetFloat>,
    get_float: Bound<FnGetFloat>,
    set_float: Bound<FnSetFloat>,
    get_bool: Bound<FnGetBool>,
    set_bool: Bound<FnSetBool>,
    get_char: Bound<FnGetChar>,
    set_char: Bound<FnSetChar>,
    min_u64: Bound<FnGetU64>,
    max_u64: Bound<FnGetU64>,
    inc_u64: Bound<FnGetU64>,
    get_u64: Bound<FnGetU64>,
    set_u64: Bound<FnSetU64>,
}

macro_rules! option_table {
    ($lib:expr, $table:literal) => {
        OptionTable {
            is_implemented: bind($lib, concat!("DplDeviceOptionIsImplemented", $table))?,
            is_readable: bind($lib, concat!("DplDeviceOptionIsReadable", $table))?,
            is_writable: bind($lib, concat!("DplDeviceOptionIsWritable", $table))?,
            min_int: bind($lib, concat!("DplDeviceGetOptionMin", $table, "Int"))?,
            max_int: bind($lib, concat!("DplDeviceGetOptionMax", $table, "Int"))?,
            inc_int: bind($lib, concat!("DplDeviceGetOptionInc", $table, "Int"))?,
            get_int: bind($lib, concat!("DplDeviceGetOption", $table, "Int"))?,
            set_int: bind($lib, concat!("DplDeviceSetOption", $table, "Int"))?,
            min_float: bind($lib, concat!("DplDeviceGetOptionMin", $table, "Float"))?,
            max_float: bind($lib, concat!("DplDeviceGetOptionMax", $table, "Float"))?,
            get_float: bind($lib, concat!("DplDeviceGetOption", $table, "Float"))?,
            set_float: bind($lib, concat!("DplDeviceSetOption", $table, "Float"))?,
            get_bool: bind($lib, concat!("DplDeviceGetOption", $table, "Bool"))?,
            set_bool: bind($lib, concat!("DplDeviceSetOption", $table, "Bool"))?,
            get_char: bind($lib, concat!("DplDeviceGetOption", $table, "Char"))?,
            set_char: bind($lib, concat!("DplDeviceSetOption", $table, "Char"))?,
            min_u64: bind($lib, concat!("DplDeviceGetOptionMin", $table, "Int64"))?,
            max_u64: bind($lib, concat!("DplDeviceGetOptionMax", $table, "Int64"))?,
            inc_u64: bind($lib, concat!("DplDeviceGetOptionInc", $table, "Int64"))?,
            get_u64: bind($lib, concat!("DplDeviceGetOption", $table, "Int64"))?,
            set_u64: bind($lib, concat!("DplDeviceSetOption", $table, "Int64"))?,
        }
    };
}

/// `DplApi` backed by the vendor shared library.
///
/// The library handle is kept for as long as any function pointer may be called.
pub struct NativeDpl {
    initialize: Bound<FnConfig>,
    terminate: Bound<FnStatus>,
    info: OptionTable,
    para: OptionTable,
    get_shutter: Bound<FnGetInt>,
    set_shutter: Bound<FnSetInt>,
    start: Bound<FnStart>,
    stop: Bound<FnStatus>,
    get_grab_mode: Bound<FnGrabMode>,
    initialize_image_info: Bound<FnImageInfo>,
    release_image_info: Bound<FnImageInfo>,
    get_camera_data: Bound<FnImageInfo>,
    get_file_information: Bound<FnFileInfo>,
    position_depth: Bound<FnPositionDepth>,
    position_3d: Bound<FnPosition3d>,
    area_statistics: Bound<FnAreaStatistics>,
    total_module_count: Bound<FnCount>,
    module_name: Bound<FnIndexedWide>,
    get_module_parameter: Bound<FnGetModuleParameter>,
    set_module_parameter: Bound<FnSetModuleParameter>,
    parameter_file_name: Bound<FnIndexedWide>,
    reload_parameter_file: Bound<FnReload>,
    initialize_result_data: Bound<FnResultData>,
    release_result_data: Bound<FnResultData>,
    get_data_proc_module_data: Bound<FnResultData>,
    _lib: Library,
}

impl NativeDpl {
    /// Loads the library from the working directory.
    pub fn load() -> Result<Self> {
        let path = Path::new("./").join(libloading::library_filename(DPL_LIBRARY));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading camera library");
        // SAFETY: loading runs the library's initialisers; the vendor library has
        // no load-time requirements beyond its own dependencies being present.
        let lib = unsafe { Library::new(path) }.map_err(|source| DplError::LibraryLoad {
            name: path.display().to_string(),
            source,
        })?;

        let dpl = Self {
            initialize: bind(&lib, "DplInitialize")?,
            terminate: bind(&lib, "DplTerminate")?,
            info: option_table!(&lib, "Info"),
            para: option_table!(&lib, "Para"),
            get_shutter: bind(&lib, "DplDeviceGetOptionParaShMode")?,
            set_shutter: bind(&lib, "DplDeviceSetOptionParaShMode")?,
            start: bind(&lib, "DplStart")?,
            stop: bind(&lib, "DplStop")?,
            get_grab_mode: bind(&lib, "DplGetGrabMode")?,
            initialize_image_info: bind(&lib, "DplInitializeIscIamgeinfo")?,
            release_image_info: bind(&lib, "DplReleaeIscIamgeinfo")?,
            get_camera_data: bind(&lib, "DplGetCameraData")?,
            get_file_information: bind(&lib, "DplGetFileInformation")?,
            position_depth: bind(&lib, "DplGetPositionDepth")?,
            position_3d: bind(&lib, "DplGetPosition3D")?,
            area_statistics: bind(&lib, "DplGetAreaStatistics")?,
            total_module_count: bind(&lib, "DplGetTotalModuleCount")?,
            module_name: bind(&lib, "DplGetModuleNameByIndex")?,
            get_module_parameter: bind(&lib, "DplGetDataProcModuleParameter")?,
            set_module_parameter: bind(&lib, "DplSetDataProcModuleParameter")?,
            parameter_file_name: bind(&lib, "DplGetParameterFileName")?,
            reload_parameter_file: bind(&lib, "DplReloadParameterFromFile")?,
            initialize_result_data: bind(&lib, "DplInitializeIscDataProcResultData")?,
            release_result_data: bind(&lib, "DplReleaeIscDataProcResultData")?,
            get_data_proc_module_data: bind(&lib, "DplGetDataProcModuleData")?,
            _lib: lib,
        };

        debug!("Camera library symbols resolved");
        Ok(dpl)
    }

    fn table(&self, target: OptionTarget) -> (&OptionTable, c_int) {
        match target {
            OptionTarget::Info(info) => (&self.info, info.as_raw()),
            OptionTarget::Param(param) => (&self.para, param.as_raw()),
        }
    }
}

fn unsupported(target: OptionTarget, kind: ValueKind, ty: OptionType) -> DplError {
    DplError::InvalidArgument(format!("{:?} {:?} value of {:?} is not available", ty, kind, target))
}

impl DplApi for NativeDpl {
    fn initialize(&self, config: &IscDplConfiguration) -> Result<()> {
        let mut config = *config;
        // SAFETY: `config` is a valid, writable record for the duration of the call.
        check(self.initialize.name, unsafe { (self.initialize.f)(&mut config) })
    }

    fn terminate(&self) -> Result<()> {
        // SAFETY: no arguments.
        check(self.terminate.name, unsafe { (self.terminate.f)() })
    }

    fn option_is(&self, query: OptionQuery, target: OptionTarget) -> bool {
        let (table, id) = self.table(target);
        let entry = match query {
            OptionQuery::Implemented => table.is_implemented,
            OptionQuery::Readable => table.is_readable,
            OptionQuery::Writable => table.is_writable,
        };
        // SAFETY: plain integer argument.
        unsafe { (entry.f)(id) }
    }

    fn get_option(&self, target: OptionTarget, kind: ValueKind, ty: OptionType) -> Result<OptionValue> {
        let (table, id) = self.table(target);

        // SAFETY (all arms): each out-pointer refers to a local that outlives the call.
        match ty {
            OptionType::Int => {
                let entry = match kind {
                    ValueKind::Current => table.get_int,
                    ValueKind::Min => table.min_int,
                    ValueKind::Max => table.max_int,
                    ValueKind::Inc => table.inc_int,
                };
                let mut value: c_int = 0;
                check(entry.name, unsafe { (entry.f)(id, &mut value) })?;
                Ok(OptionValue::Int(value))
            }
            OptionType::Float => {
                let entry = match kind {
                    ValueKind::Current => table.get_float,
                    ValueKind::Min => table.min_float,
                    ValueKind::Max => table.max_float,
                    ValueKind::Inc => return Err(unsupported(target, kind, ty)),
                };
                let mut value: c_float = 0.0;
                check(entry.name, unsafe { (entry.f)(id, &mut value) })?;
                Ok(OptionValue::Float(value))
            }
            OptionType::Bool => {
                if kind != ValueKind::Current {
                    return Err(unsupported(target, kind, ty));
                }
                let mut value = false;
                check(table.get_bool.name, unsafe { (table.get_bool.f)(id, &mut value) })?;
                Ok(OptionValue::Bool(value))
            }
            OptionType::U64 => {
                let entry = match kind {
                    ValueKind::Current => table.get_u64,
                    ValueKind::Min => table.min_u64,
                    ValueKind::Max => table.max_u64,
                    ValueKind::Inc => table.inc_u64,
                };
                let mut value: u64 = 0;
                check(entry.name, unsafe { (entry.f)(id, &mut value) })?;
                Ok(OptionValue::U64(value))
            }
            OptionType::Shutter => {
                if kind != ValueKind::Current || matches!(target, OptionTarget::Info(_)) {
                    return Err(unsupported(target, kind, ty));
                }
                let mut value: c_int = 0;
                check(self.get_shutter.name, unsafe { (self.get_shutter.f)(id, &mut value) })?;
                Ok(OptionValue::Shutter(ShutterMode::from_raw(value)?))
            }
        }
    }

    fn set_option(&self, target: OptionTarget, value: OptionValue) -> Result<()> {
        let (table, id) = self.table(target);

        // SAFETY (all arms): arguments are passed by value.
        match value {
            OptionValue::Int(v) => check(table.set_int.name, unsafe { (table.set_int.f)(id, v) }),
            OptionValue::Float(v) => {
                check(table.set_float.name, unsafe { (table.set_float.f)(id, v) })
            }
            OptionValue::Bool(v) => check(table.set_bool.name, unsafe { (table.set_bool.f)(id, v) }),
            OptionValue::U64(v) => check(table.set_u64.name, unsafe { (table.set_u64.f)(id, v) }),
            OptionValue::Shutter(mode) => {
                if let OptionTarget::Info(_) = target {
                    return Err(unsupported(target, ValueKind::Current, OptionType::Shutter));
                }
                check(self.set_shutter.name, unsafe {
                    (self.set_shutter.f)(id, mode.as_raw())
                })
            }
        }
    }

    fn get_string_option(&self, target: OptionTarget, max_len: usize) -> Result<String> {
        let (table, id) = self.table(target);
        let mut buffer = vec![0u8; max_len.max(1)];
        // SAFETY: the library writes at most `max_len` bytes into `buffer`.
        check(table.get_char.name, unsafe {
            (table.get_char.f)(id, buffer.as_mut_ptr() as *mut c_char, buffer.len() as c_int)
        })?;
        Ok(read_narrow(&buffer))
    }

    fn set_string_option(&self, target: OptionTarget, value: &str) -> Result<()> {
        let (table, id) = self.table(target);
        let value = CString::new(value)
            .map_err(|e| DplError::InvalidArgument(format!("option string: {}", e)))?;
        let mut bytes = value.into_bytes_with_nul();
        // SAFETY: `bytes` is NUL-terminated and lives across the call.
        check(table.set_char.name, unsafe {
            (table.set_char.f)(id, bytes.as_mut_ptr() as *mut c_char)
        })
    }

    fn start(&self, mode: &IscStartMode) -> Result<()> {
        let mut mode = *mode;
        // SAFETY: `mode` is a valid record for the duration of the call.
        check(self.start.name, unsafe { (self.start.f)(&mut mode) })
    }

    fn stop(&self) -> Result<()> {
        // SAFETY: no arguments.
        check(self.stop.name, unsafe { (self.stop.f)() })
    }

    fn get_grab_mode(&self) -> Result<IscGrabStartMode> {
        let mut mode = IscGrabStartMode::default();
        // SAFETY: `mode` is a valid out-record.
        check(self.get_grab_mode.name, unsafe { (self.get_grab_mode.f)(&mut mode) })?;
        Ok(mode)
    }

    fn initialize_image_info(&self, info: &mut IscImageInfo) -> Result<()> {
        // SAFETY: `info` stays at a fixed address until it is released.
        check(self.initialize_image_info.name, unsafe {
            (self.initialize_image_info.f)(info)
        })
    }

    fn release_image_info(&self, info: &mut IscImageInfo) -> Result<()> {
        // SAFETY: `info` was initialised by `initialize_image_info`.
        check(self.release_image_info.name, unsafe { (self.release_image_info.f)(info) })
    }

    fn get_camera_data(&self, info: &mut IscImageInfo) -> Result<()> {
        // SAFETY: `info` was initialised by `initialize_image_info`.
        check(self.get_camera_data.name, unsafe { (self.get_camera_data.f)(info) })
    }

    fn get_file_information(&self, path: &str) -> Result<IscRawFileHeader> {
        let mut name = to_wide_nul(path);
        let mut header = IscRawFileHeader::default();
        // SAFETY: `name` is NUL-terminated; `header` is a valid out-record.
        check(self.get_file_information.name, unsafe {
            (self.get_file_information.f)(name.as_mut_ptr(), &mut header)
        })?;
        Ok(header)
    }

    fn position_depth(&self, x: i32, y: i32, info: &IscImageInfo) -> Result<(f32, f32)> {
        let mut info = *info;
        let (mut disparity, mut depth) = (0.0, 0.0);
        // SAFETY: the copied record still points at library-owned frame memory,
        // which is only read.
        check(self.position_depth.name, unsafe {
            (self.position_depth.f)(x, y, &mut info, &mut disparity, &mut depth)
        })?;
        Ok((disparity, depth))
    }

    fn position_3d(&self, x: i32, y: i32, info: &IscImageInfo) -> Result<(f32, f32, f32)> {
        let mut info = *info;
        let (mut px, mut py, mut pz) = (0.0, 0.0, 0.0);
        // SAFETY: as for `position_depth`.
        check(self.position_3d.name, unsafe {
            (self.position_3d.f)(x, y, &mut info, &mut px, &mut py, &mut pz)
        })?;
        Ok((px, py, pz))
    }

    fn area_statistics(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        info: &IscImageInfo,
    ) -> Result<IscAreaDataStatistics> {
        let mut info = *info;
        let mut stats = IscAreaDataStatistics::default();
        // SAFETY: as for `position_depth`.
        check(self.area_statistics.name, unsafe {
            (self.area_statistics.f)(x, y, width, height, &mut info, &mut stats)
        })?;
        Ok(stats)
    }

    fn total_module_count(&self) -> Result<i32> {
        let mut count: c_int = 0;
        // SAFETY: `count` is a valid out-pointer.
        check(self.total_module_count.name, unsafe { (self.total_module_count.f)(&mut count) })?;
        Ok(count)
    }

    fn module_name(&self, index: i32) -> Result<String> {
        let mut name = [0 as WChar; MODULE_NAME_LEN];
        // SAFETY: the library writes at most `MODULE_NAME_LEN` characters.
        check(self.module_name.name, unsafe {
            (self.module_name.f)(index, name.as_mut_ptr(), MODULE_NAME_LEN as c_int)
        })?;
        Ok(read_wide(&name))
    }

    fn get_module_parameter(&self, index: i32) -> Result<Box<IscDataProcModuleParameter>> {
        let mut param = Box::<IscDataProcModuleParameter>::default();
        // SAFETY: `param` is a valid, heap-allocated out-record.
        check(self.get_module_parameter.name, unsafe {
            (self.get_module_parameter.f)(index, &mut *param)
        })?;
        Ok(param)
    }

    fn set_module_parameter(&self, param: &IscDataProcModuleParameter, persist: bool) -> Result<()> {
        let mut param = Box::new(*param);
        // SAFETY: `param` is a valid record for the duration of the call.
        check(self.set_module_parameter.name, unsafe {
            (self.set_module_parameter.f)(param.module_index, &mut *param, persist)
        })
    }

    fn parameter_file_name(&self, index: i32) -> Result<String> {
        let mut name = [0 as WChar; MAX_PATH];
        // SAFETY: the library writes at most `MAX_PATH` characters.
        check(self.parameter_file_name.name, unsafe {
            (self.parameter_file_name.f)(index, name.as_mut_ptr(), MAX_PATH as c_int)
        })?;
        Ok(read_wide(&name))
    }

    fn reload_parameter_file(&self, index: i32, path: &str, valid: bool) -> Result<()> {
        let mut name = to_wide_nul(path);
        // SAFETY: `name` is NUL-terminated.
        check(self.reload_parameter_file.name, unsafe {
            (self.reload_parameter_file.f)(index, name.as_mut_ptr(), valid as c_int)
        })
    }

    fn initialize_result_data(&self, data: &mut IscDataProcResultData) -> Result<()> {
        // SAFETY: `data` stays at a fixed address until it is released.
        check(self.initialize_result_data.name, unsafe {
            (self.initialize_result_data.f)(data)
        })
    }

    fn release_result_data(&self, data: &mut IscDataProcResultData) -> Result<()> {
        // SAFETY: `data` was initialised by `initialize_result_data`.
        check(self.release_result_data.name, unsafe { (self.release_result_data.f)(data) })
    }

    fn get_data_proc_module_data(&self, data: &mut IscDataProcResultData) -> Result<()> {
        // SAFETY: `data` was initialised by `initialize_result_data`.
        check(self.get_data_proc_module_data.name, unsafe {
            (self.get_data_proc_module_data.f)(data)
        })
    }
}
