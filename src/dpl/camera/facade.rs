use std::path::Path;

use tracing::{debug, error, info, instrument, warn};

use crate::dpl::camera::api::{DplApi, OptionQuery, OptionTarget, OptionType, OptionValue, ValueKind};
use crate::dpl::camera::frame::{FrameBuffers, FrameStatus};
use crate::dpl::camera::native::NativeDpl;
use crate::dpl::camera::types::{
    AreaStatistics, CameraGeometry, CameraInfo, CameraModel, CameraParameter, DplConfig,
    GrabSettings, ModuleParameter, RawFileHeader, Rect, ShutterMode, StartMode,
};
use crate::dpl::common::error::{DplError, Result};
use crate::dpl::ffi::types::{IscDataProcResultData, IscImageInfo, LATEST_FRAME};

/// Where a frame is pulled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Images as delivered by the camera (`DplGetCameraData`).
    Camera,
    /// Output of the host-side processing modules (`DplGetDataProcModuleData`).
    DataProcessing,
}

/// Value types that can be read and written as device options.
pub trait ScalarOption: Sized {
    const TYPE: OptionType;

    fn from_value(value: OptionValue) -> Result<Self>;
    fn into_value(self) -> OptionValue;
}

macro_rules! scalar_option {
    ($ty:ty, $variant:ident) => {
        impl ScalarOption for $ty {
            const TYPE: OptionType = OptionType::$variant;

            fn from_value(value: OptionValue) -> Result<Self> {
                match value {
                    OptionValue::$variant(v) => Ok(v),
                    other => Err(DplError::InvalidArgument(format!(
                        "expected {:?} option value, got {:?}",
                        OptionType::$variant,
                        other
                    ))),
                }
            }

            fn into_value(self) -> OptionValue {
                OptionValue::$variant(self)
            }
        }
    };
}

scalar_option!(i32, Int);
scalar_option!(f32, Float);
scalar_option!(bool, Bool);
scalar_option!(u64, U64);
scalar_option!(ShutterMode, Shutter);

/// Limits of a numeric option. Float options have no increment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionRange<T> {
    pub min: T,
    pub max: T,
    pub inc: Option<T>,
}

/// Disparity and metric depth at one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthSample {
    pub disparity: f32,
    pub depth: f32,
}

/// Camera/processing library session.
///
/// Owns the native image-info and result buffers. Dropping it releases them and
/// terminates the library in the reverse order of acquisition.
pub struct IscDpl<A: DplApi = NativeDpl> {
    api: A,
    image_info: Box<IscImageInfo>,
    result_data: Box<IscDataProcResultData>,
    geometry: CameraGeometry,
    file_header: Option<RawFileHeader>,
    initialized: bool,
    image_info_ready: bool,
    result_data_ready: bool,
}

impl IscDpl<NativeDpl> {
    /// Opens a live camera through the vendor library in the working directory.
    pub fn open(config: DplConfig) -> Result<Self> {
        Self::with_api(NativeDpl::load()?, config)
    }

    /// Opens a recording for playback; geometry comes from the file header.
    pub fn open_file<P: AsRef<Path>>(config: DplConfig, play_file: P) -> Result<Self> {
        Self::with_api_file(NativeDpl::load()?, config, play_file)
    }
}

impl<A: DplApi> IscDpl<A> {
    fn initialize(api: A, config: &DplConfig) -> Result<Self> {
        let native_config = config.to_native()?;

        let mut dpl = Self {
            api,
            image_info: Box::default(),
            result_data: Box::default(),
            geometry: CameraGeometry::default(),
            file_header: None,
            initialized: false,
            image_info_ready: false,
            result_data_ready: false,
        };

        {
            let _span = tracing::info_span!("dpl_initialize").entered();
            dpl.api.initialize(&native_config)?;
            dpl.initialized = true;
        }

        {
            let _span = tracing::info_span!("allocate_buffers").entered();
            dpl.api.initialize_image_info(&mut dpl.image_info)?;
            dpl.image_info_ready = true;
            dpl.api.initialize_result_data(&mut dpl.result_data)?;
            dpl.result_data_ready = true;
        }

        Ok(dpl)
    }

    /// Live-camera session over a custom API implementation.
    #[instrument(skip(api, config), fields(model = ?config.camera_model))]
    pub fn with_api(api: A, config: DplConfig) -> Result<Self> {
        let config = DplConfig {
            enabled_camera: true,
            ..config
        };
        let mut dpl = Self::initialize(api, &config)?;

        dpl.geometry = dpl.read_geometry()?;
        info!(
            base_length = dpl.geometry.base_length,
            bf = dpl.geometry.bf,
            d_inf = dpl.geometry.d_inf,
            width = dpl.geometry.max_width,
            height = dpl.geometry.max_height,
            "Camera geometry"
        );

        dpl.set_shutter_mode(config.shutter_mode)?;
        let shutter = dpl.shutter_mode()?;
        info!(?shutter, "Shutter mode");

        info!("Camera initialized");
        Ok(dpl)
    }

    /// Playback session over a custom API implementation.
    #[instrument(skip(api, config, play_file), fields(file = %play_file.as_ref().display()))]
    pub fn with_api_file<P: AsRef<Path>>(api: A, config: DplConfig, play_file: P) -> Result<Self> {
        let camera_model = if config.camera_model == CameraModel::Vm {
            // Playback needs some model; the header carries the real one.
            CameraModel::Xc
        } else {
            config.camera_model
        };
        let config = DplConfig {
            enabled_camera: false,
            camera_model,
            ..config
        };
        let mut dpl = Self::initialize(api, &config)?;

        let raw = dpl.api.get_file_information(&play_file.as_ref().to_string_lossy())?;
        let header = RawFileHeader::from(&raw);
        info!(
            model = ?header.camera_model,
            width = header.max_width,
            height = header.max_height,
            base_length = header.base_length,
            bf = header.bf,
            d_inf = header.d_inf,
            grab_mode = header.grab_mode,
            shutter_mode = header.shutter_mode,
            color_mode = header.color_mode,
            "Recording information"
        );

        if header.max_width == 0 || header.max_height == 0 {
            return Err(DplError::InvalidDimensions(header.max_width, header.max_height));
        }

        dpl.geometry = CameraGeometry::from_file_header(&header);
        dpl.file_header = Some(header);

        info!("Playback initialized");
        Ok(dpl)
    }

    fn read_geometry(&self) -> Result<CameraGeometry> {
        let _span = tracing::info_span!("read_geometry").entered();

        let width = self.get_option::<i32>(OptionTarget::Info(CameraInfo::WidthMax))?;
        let height = self.get_option::<i32>(OptionTarget::Info(CameraInfo::HeightMax))?;
        if width <= 0 || height <= 0 {
            return Err(DplError::InvalidDimensions(
                width.max(0) as usize,
                height.max(0) as usize,
            ));
        }

        Ok(CameraGeometry {
            base_length: self.get_option(OptionTarget::Info(CameraInfo::BaseLength))?,
            bf: self.get_option(OptionTarget::Info(CameraInfo::Bf))?,
            d_inf: self.get_option(OptionTarget::Info(CameraInfo::DInf))?,
            max_width: width as usize,
            max_height: height as usize,
        })
    }

    pub fn geometry(&self) -> CameraGeometry {
        self.geometry
    }

    /// Header of the recording in playback sessions.
    pub fn file_header(&self) -> Option<&RawFileHeader> {
        self.file_header.as_ref()
    }

    /// Buffers sized for the largest frame this session can deliver.
    pub fn frame_buffers(&self) -> FrameBuffers {
        FrameBuffers::new(self.geometry.max_width, self.geometry.max_height)
    }

    /// Starts acquisition. Acquisition stops when the returned guard is stopped or dropped.
    #[instrument(skip(self, mode), fields(grab_mode = ?mode.grab_mode, playback = mode.is_playback()))]
    pub fn start(&mut self, mode: &StartMode) -> Result<Grab<'_, A>> {
        let native = mode.to_native()?;
        self.api.start(&native)?;
        info!("Acquisition started");
        Ok(Grab {
            dpl: self,
            last_source: None,
            stopped: false,
        })
    }

    pub fn grab_mode(&self) -> Result<GrabSettings> {
        Ok(GrabSettings::from(&self.api.get_grab_mode()?))
    }

    pub fn option_is(&self, query: OptionQuery, target: OptionTarget) -> bool {
        self.api.option_is(query, target)
    }

    pub fn get_option<T: ScalarOption>(&self, target: OptionTarget) -> Result<T> {
        T::from_value(self.api.get_option(target, ValueKind::Current, T::TYPE)?)
    }

    pub fn option_range<T: ScalarOption>(&self, target: OptionTarget) -> Result<OptionRange<T>> {
        let min = T::from_value(self.api.get_option(target, ValueKind::Min, T::TYPE)?)?;
        let max = T::from_value(self.api.get_option(target, ValueKind::Max, T::TYPE)?)?;
        let inc = match T::TYPE {
            OptionType::Float => None,
            _ => Some(T::from_value(self.api.get_option(target, ValueKind::Inc, T::TYPE)?)?),
        };
        Ok(OptionRange { min, max, inc })
    }

    pub fn set_option<T: ScalarOption>(&self, target: OptionTarget, value: T) -> Result<()> {
        let value = value.into_value();
        debug!(?target, ?value, "Setting option");
        self.api.set_option(target, value)
    }

    pub fn get_string_option(&self, target: OptionTarget, max_len: usize) -> Result<String> {
        self.api.get_string_option(target, max_len)
    }

    pub fn set_string_option(&self, target: OptionTarget, value: &str) -> Result<()> {
        self.api.set_string_option(target, value)
    }

    pub fn exposure(&self) -> Result<i32> {
        self.get_option(OptionTarget::Param(CameraParameter::Exposure))
    }

    pub fn set_exposure(&self, value: i32) -> Result<()> {
        self.set_option(OptionTarget::Param(CameraParameter::Exposure), value)
    }

    pub fn gain(&self) -> Result<i32> {
        self.get_option(OptionTarget::Param(CameraParameter::Gain))
    }

    pub fn set_gain(&self, value: i32) -> Result<()> {
        self.set_option(OptionTarget::Param(CameraParameter::Gain), value)
    }

    pub fn shutter_mode(&self) -> Result<ShutterMode> {
        self.get_option(OptionTarget::Param(CameraParameter::ShutterMode))
    }

    pub fn set_shutter_mode(&self, mode: ShutterMode) -> Result<()> {
        self.set_option(OptionTarget::Param(CameraParameter::ShutterMode), mode)
    }

    pub fn set_auto_calibration(&self, enabled: bool) -> Result<()> {
        self.set_option(OptionTarget::Param(CameraParameter::AutoCalibration), enabled)
    }

    /// Forces one run of the camera's calibration.
    pub fn run_manual_calibration(&self) -> Result<()> {
        self.set_option(OptionTarget::Param(CameraParameter::ManualCalibration), true)
    }

    pub fn module_count(&self) -> Result<usize> {
        Ok(self.api.total_module_count()?.max(0) as usize)
    }

    pub fn module_name(&self, index: usize) -> Result<String> {
        self.api.module_name(index as i32)
    }

    pub fn module_parameter(&self, index: usize) -> Result<ModuleParameter> {
        let raw = self.api.get_module_parameter(index as i32)?;
        Ok(ModuleParameter::from(&*raw))
    }

    /// Applies a module's parameters; with `persist` they are also written to its parameter file.
    pub fn set_module_parameter(&self, parameter: &ModuleParameter, persist: bool) -> Result<()> {
        let raw = parameter.to_native()?;
        self.api.set_module_parameter(&raw, persist)
    }

    pub fn parameter_file_name(&self, index: usize) -> Result<String> {
        self.api.parameter_file_name(index as i32)
    }

    pub fn reload_parameter_file<P: AsRef<Path>>(&self, index: usize, path: P, valid: bool) -> Result<()> {
        self.api
            .reload_parameter_file(index as i32, &path.as_ref().to_string_lossy(), valid)
    }

    /// Releases all native resources. Prefer this over dropping to observe errors.
    pub fn terminate(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        let mut first_error = None;

        if self.result_data_ready {
            self.result_data_ready = false;
            if let Err(e) = self.api.release_result_data(&mut self.result_data) {
                first_error.get_or_insert(e);
            }
        }

        if self.image_info_ready {
            self.image_info_ready = false;
            if let Err(e) = self.api.release_image_info(&mut self.image_info) {
                first_error.get_or_insert(e);
            }
        }

        if self.initialized {
            self.initialized = false;
            if let Err(e) = self.api.terminate() {
                first_error.get_or_insert(e);
            }
            info!("Camera library terminated");
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<A: DplApi> Drop for IscDpl<A> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("Teardown failed: {}", e);
        }
    }
}

/// An active acquisition.
pub struct Grab<'a, A: DplApi = NativeDpl> {
    dpl: &'a mut IscDpl<A>,
    last_source: Option<DataSource>,
    stopped: bool,
}

impl<'a, A: DplApi> Grab<'a, A> {
    /// The session this acquisition belongs to, for option access while grabbing.
    pub fn camera(&self) -> &IscDpl<A> {
        &*self.dpl
    }

    /// Retrieves the latest frame and copies its planes into `buffers`.
    ///
    /// A failed native retrieval is reported through the returned states, not as an error.
    pub fn get_frame(&mut self, source: DataSource, buffers: &mut FrameBuffers) -> Result<FrameStatus> {
        let dpl = &mut *self.dpl;
        let fetched = match source {
            DataSource::Camera => dpl.api.get_camera_data(&mut dpl.image_info),
            DataSource::DataProcessing => dpl.api.get_data_proc_module_data(&mut dpl.result_data),
        };

        match fetched {
            Ok(()) => {}
            Err(DplError::Native { code, .. }) => {
                self.last_source = None;
                buffers.clear();
                return Ok(FrameStatus::failed(code));
            }
            Err(e) => return Err(e),
        }

        let info = match source {
            DataSource::Camera => &*dpl.image_info,
            DataSource::DataProcessing => &dpl.result_data.isc_image_info,
        };
        // SAFETY: the library just filled `info`; its pointers stay valid until the
        // next retrieval, and `fill_from` copies out before returning.
        let status = unsafe { buffers.fill_from(&info.frame_data[LATEST_FRAME]) };
        self.last_source = Some(source);
        Ok(status)
    }

    fn last_info(&self) -> Result<&IscImageInfo> {
        match self.last_source {
            Some(DataSource::Camera) => Ok(&*self.dpl.image_info),
            Some(DataSource::DataProcessing) => Ok(&self.dpl.result_data.isc_image_info),
            None => Err(DplError::NotInitialized("no frame has been retrieved")),
        }
    }

    /// Disparity and depth at a pixel of the last retrieved frame.
    pub fn depth_at(&self, x: i32, y: i32) -> Result<DepthSample> {
        let (disparity, depth) = self.dpl.api.position_depth(x, y, self.last_info()?)?;
        Ok(DepthSample { disparity, depth })
    }

    /// Camera-space coordinates of a pixel of the last retrieved frame.
    pub fn position_3d(&self, x: i32, y: i32) -> Result<(f32, f32, f32)> {
        self.dpl.api.position_3d(x, y, self.last_info()?)
    }

    pub fn area_statistics(&self, region: Rect) -> Result<AreaStatistics> {
        let raw = self.dpl.api.area_statistics(
            region.x,
            region.y,
            region.width,
            region.height,
            self.last_info()?,
        )?;
        Ok(AreaStatistics::from(&raw))
    }

    pub fn stop(mut self) -> Result<()> {
        self.stopped = true;
        self.dpl.api.stop()?;
        info!("Acquisition stopped");
        Ok(())
    }
}

impl<A: DplApi> Drop for Grab<'_, A> {
    fn drop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            warn!("Acquisition dropped while running, stopping");
            if let Err(e) = self.dpl.api.stop() {
                error!("Stop failed: {}", e);
            }
        }
    }
}
