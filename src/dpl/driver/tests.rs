#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tempfile::TempDir;

    use crate::dpl::camera::api::{DplApi, OptionQuery, OptionTarget, OptionType, OptionValue, ValueKind};
    use crate::dpl::camera::facade::{DataSource, IscDpl};
    use crate::dpl::camera::types::{CameraInfo, DplConfig, ShutterMode, StartMode};
    use crate::dpl::common::error::{DplError, Result, StatusCode};
    use crate::dpl::driver::run::{run_loop, LoopOptions, StopSignal};
    use crate::dpl::driver::timing::{LoopTimings, StepTiming, Timer};
    use crate::dpl::ffi::types::*;
    use crate::dpl::output::sink::{DisplayPlane, FrameSink, Raster};
    use crate::dpl::utility::api::UtilityApi;
    use crate::dpl::utility::facade::IscUtility;
    use crate::dpl::utility::types::UtilityConfig;

    const WIDTH: i32 = 4;
    const HEIGHT: i32 = 2;

    #[derive(Clone, Copy)]
    enum Poll {
        Full,
        BaseOnly,
        NoBase,
        Fail,
    }

    struct MockDpl {
        calls: Arc<Mutex<Vec<String>>>,
        script: Mutex<VecDeque<Poll>>,
        shutter: Mutex<i32>,
        base: Vec<u8>,
        color: Vec<u8>,
        depth: Vec<f32>,
    }

    impl MockDpl {
        fn new(calls: Arc<Mutex<Vec<String>>>, script: &[Poll]) -> Self {
            let pixels = (WIDTH * HEIGHT) as usize;
            Self {
                calls,
                script: Mutex::new(script.iter().copied().collect()),
                shutter: Mutex::new(ShutterMode::Single.as_raw()),
                base: vec![1; pixels],
                color: vec![2; pixels * 3],
                depth: (0..pixels).map(|i| i as f32).collect(),
            }
        }

        fn record(&self, name: &str) {
            self.calls.lock().unwrap().push(name.to_string());
        }
    }

    impl DplApi for MockDpl {
        fn initialize(&self, _config: &IscDplConfiguration) -> Result<()> {
            self.record("DplInitialize");
            Ok(())
        }

        fn terminate(&self) -> Result<()> {
            self.record("DplTerminate");
            Ok(())
        }

        fn option_is(&self, _query: OptionQuery, _target: OptionTarget) -> bool {
            true
        }

        fn get_option(&self, target: OptionTarget, _kind: ValueKind, ty: OptionType) -> Result<OptionValue> {
            Ok(match (target, ty) {
                (OptionTarget::Info(CameraInfo::WidthMax), _) => OptionValue::Int(WIDTH),
                (OptionTarget::Info(CameraInfo::HeightMax), _) => OptionValue::Int(HEIGHT),
                (OptionTarget::Info(CameraInfo::Bf), _) => OptionValue::Float(40.0),
                (OptionTarget::Info(CameraInfo::DInf), _) => OptionValue::Float(2.0),
                (_, OptionType::Shutter) => OptionValue::Shutter(ShutterMode::from_raw(*self.shutter.lock().unwrap())?),
                (_, OptionType::Float) => OptionValue::Float(0.1),
                (_, OptionType::Bool) => OptionValue::Bool(false),
                (_, OptionType::U64) => OptionValue::U64(0),
                (_, OptionType::Int) => OptionValue::Int(0),
            })
        }

        fn set_option(&self, _target: OptionTarget, value: OptionValue) -> Result<()> {
            if let OptionValue::Shutter(mode) = value {
                *self.shutter.lock().unwrap() = mode.as_raw();
            }
            Ok(())
        }

        fn get_string_option(&self, _target: OptionTarget, _max_len: usize) -> Result<String> {
            Ok(String::new())
        }

        fn set_string_option(&self, _target: OptionTarget, _value: &str) -> Result<()> {
            Ok(())
        }

        fn start(&self, _mode: &IscStartMode) -> Result<()> {
            self.record("DplStart");
            Ok(())
        }

        fn stop(&self) -> Result<()> {
            self.record("DplStop");
            Ok(())
        }

        fn get_grab_mode(&self) -> Result<IscGrabStartMode> {
            Ok(IscGrabStartMode::default())
        }

        fn initialize_image_info(&self, _info: &mut IscImageInfo) -> Result<()> {
            Ok(())
        }

        fn release_image_info(&self, _info: &mut IscImageInfo) -> Result<()> {
            Ok(())
        }

        fn get_camera_data(&self, info: &mut IscImageInfo) -> Result<()> {
            self.record("DplGetCameraData");
            let poll = self.script.lock().unwrap().pop_front().unwrap_or(Poll::NoBase);
            let frame = &mut info.frame_data[LATEST_FRAME];
            *frame = FrameData::default();
            match poll {
                Poll::Fail => {
                    return Err(DplError::Native {
                        call: "DplGetCameraData",
                        code: StatusCode(0x8000_0001),
                    });
                }
                Poll::NoBase => return Ok(()),
                Poll::Full | Poll::BaseOnly => {}
            }
            frame.p1 = ImageType {
                width: WIDTH,
                height: HEIGHT,
                channel_count: 1,
                image: self.base.as_ptr() as *mut u8,
            };
            if let Poll::Full = poll {
                frame.color = ImageType {
                    width: WIDTH,
                    height: HEIGHT,
                    channel_count: 3,
                    image: self.color.as_ptr() as *mut u8,
                };
                frame.depth = DepthType {
                    width: WIDTH,
                    height: HEIGHT,
                    image: self.depth.as_ptr() as *mut f32,
                };
            }
            Ok(())
        }

        fn get_file_information(&self, _path: &str) -> Result<IscRawFileHeader> {
            Ok(IscRawFileHeader::default())
        }

        fn position_depth(&self, _x: i32, _y: i32, _info: &IscImageInfo) -> Result<(f32, f32)> {
            Ok((0.0, 0.0))
        }

        fn position_3d(&self, _x: i32, _y: i32, _info: &IscImageInfo) -> Result<(f32, f32, f32)> {
            Ok((0.0, 0.0, 0.0))
        }

        fn area_statistics(
            &self,
            _x: i32,
            _y: i32,
            _width: i32,
            _height: i32,
            _info: &IscImageInfo,
        ) -> Result<IscAreaDataStatistics> {
            Ok(IscAreaDataStatistics::default())
        }

        fn total_module_count(&self) -> Result<i32> {
            Ok(0)
        }

        fn module_name(&self, _index: i32) -> Result<String> {
            Ok(String::new())
        }

        fn get_module_parameter(&self, _index: i32) -> Result<Box<IscDataProcModuleParameter>> {
            Ok(Box::default())
        }

        fn set_module_parameter(&self, _param: &IscDataProcModuleParameter, _persist: bool) -> Result<()> {
            Ok(())
        }

        fn parameter_file_name(&self, _index: i32) -> Result<String> {
            Ok(String::new())
        }

        fn reload_parameter_file(&self, _index: i32, _path: &str, _valid: bool) -> Result<()> {
            Ok(())
        }

        fn initialize_result_data(&self, _data: &mut IscDataProcResultData) -> Result<()> {
            Ok(())
        }

        fn release_result_data(&self, _data: &mut IscDataProcResultData) -> Result<()> {
            Ok(())
        }

        fn get_data_proc_module_data(&self, _data: &mut IscDataProcResultData) -> Result<()> {
            self.record("DplGetDataProcModuleData");
            Ok(())
        }
    }

    struct MockUtility {
        fail: bool,
    }

    impl UtilityApi for MockUtility {
        fn initialize(&self, _parameter: &DplIscUtilityParameter) -> Result<()> {
            Ok(())
        }

        fn terminate(&self) -> Result<()> {
            Ok(())
        }

        fn rebuild_color_map(&self, _min_distance: f64, _max_distance: f64) {}

        fn disparity_to_distance_image(&self, _width: i32, _height: i32, _disparity: &[f32], bgr: &mut [u8]) -> Result<()> {
            if self.fail {
                return Err(DplError::Utility { call: "Disparity2DistanceImage", code: -1 });
            }
            bgr.fill(9);
            Ok(())
        }

        fn disparity_to_image(&self, _width: i32, _height: i32, _disparity: &[f32], bgr: &mut [u8]) -> Result<()> {
            bgr.fill(8);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockSink {
        shown: Arc<Mutex<Vec<(DisplayPlane, usize, usize, usize, u8)>>>,
        frames: u32,
    }

    impl FrameSink for MockSink {
        fn show(&mut self, plane: DisplayPlane, image: Raster<'_>) -> Result<()> {
            let first = image.data.first().copied().unwrap_or(0);
            self.shown
                .lock()
                .unwrap()
                .push((plane, image.width, image.height, image.channels, first));
            Ok(())
        }

        fn end_frame(&mut self) -> Result<()> {
            self.frames += 1;
            Ok(())
        }
    }

    /// Fires after a fixed number of checks.
    struct StopAfter {
        remaining: Mutex<u32>,
    }

    impl StopSignal for StopAfter {
        fn should_stop(&self) -> bool {
            let mut remaining = self.remaining.lock().unwrap();
            if *remaining == 0 {
                return true;
            }
            *remaining -= 1;
            false
        }
    }

    fn options() -> LoopOptions {
        LoopOptions {
            poll_interval: Duration::ZERO,
            ..LoopOptions::default()
        }
    }

    fn open(calls: &Arc<Mutex<Vec<String>>>, script: &[Poll]) -> IscDpl<MockDpl> {
        IscDpl::with_api(MockDpl::new(calls.clone(), script), DplConfig::default()).unwrap()
    }

    fn utility(dpl: &IscDpl<MockDpl>, fail: bool) -> IscUtility<MockUtility> {
        IscUtility::with_api(MockUtility { fail }, dpl.geometry(), UtilityConfig::default()).unwrap()
    }

    #[test]
    fn test_full_frames_reach_every_plane() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut dpl = open(&calls, &[Poll::Full, Poll::Full]);
        let mut utility = utility(&dpl, false);
        let mut sink = MockSink::default();
        let shown = sink.shown.clone();

        let mut grab = dpl.start(&StartMode::default()).unwrap();
        let options = LoopOptions {
            max_polls: Some(2),
            ..options()
        };
        let report = run_loop(&mut grab, &mut utility, &mut sink, &AtomicBool::new(false), &options).unwrap();
        grab.stop().unwrap();

        assert_eq!((report.polls, report.frames, report.failed), (2, 2, 0));
        assert_eq!(sink.frames, 2);
        let shown = shown.lock().unwrap();
        assert_eq!(shown.len(), 6);
        assert_eq!(shown[0], (DisplayPlane::Base, 4, 2, 1, 1));
        assert_eq!(shown[1], (DisplayPlane::Color, 4, 2, 3, 2));
        assert_eq!(shown[2], (DisplayPlane::Depth, 4, 2, 3, 9));
        assert_eq!(report.timings.get_step("get").unwrap().count, 2);
        assert_eq!(report.timings.get_step("convert").unwrap().count, 2);
    }

    #[test]
    fn test_missing_planes_are_skipped() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut dpl = open(&calls, &[Poll::BaseOnly, Poll::NoBase, Poll::Fail]);
        let mut utility = utility(&dpl, false);
        let mut sink = MockSink::default();
        let shown = sink.shown.clone();

        let mut grab = dpl.start(&StartMode::default()).unwrap();
        let options = LoopOptions {
            max_polls: Some(3),
            ..options()
        };
        let report = run_loop(&mut grab, &mut utility, &mut sink, &AtomicBool::new(false), &options).unwrap();
        drop(grab);

        assert_eq!((report.polls, report.frames, report.failed), (3, 1, 1));
        assert_eq!(sink.frames, 3);
        let shown = shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, DisplayPlane::Base);
        assert!(report.timings.get_step("convert").is_none());
    }

    #[test]
    fn test_failed_conversion_is_not_displayed() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut dpl = open(&calls, &[Poll::Full]);
        let mut utility = utility(&dpl, true);
        let mut sink = MockSink::default();
        let shown = sink.shown.clone();

        let mut grab = dpl.start(&StartMode::default()).unwrap();
        let options = LoopOptions {
            max_polls: Some(1),
            ..options()
        };
        run_loop(&mut grab, &mut utility, &mut sink, &AtomicBool::new(false), &options).unwrap();
        drop(grab);

        let planes: Vec<DisplayPlane> = shown.lock().unwrap().iter().map(|s| s.0).collect();
        assert_eq!(planes, vec![DisplayPlane::Base, DisplayPlane::Color]);
    }

    #[test]
    fn test_stop_signal_ends_loop_and_caller_stops_grab() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut dpl = open(&calls, &[Poll::Full; 10]);
        let mut utility = utility(&dpl, false);
        let mut sink = MockSink::default();
        let stop = StopAfter {
            remaining: Mutex::new(3),
        };

        let mut grab = dpl.start(&StartMode::default()).unwrap();
        let report = run_loop(&mut grab, &mut utility, &mut sink, &stop, &options()).unwrap();
        grab.stop().unwrap();
        dpl.terminate().unwrap();

        assert_eq!(report.polls, 3);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.iter().filter(|c| *c == "DplGetCameraData").count(), 3);
        let tail: Vec<&str> = calls.iter().rev().take(2).map(String::as_str).collect();
        assert_eq!(tail, vec!["DplTerminate", "DplStop"]);
    }

    #[test]
    fn test_raised_flag_skips_polling() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut dpl = open(&calls, &[Poll::Full]);
        let mut utility = utility(&dpl, false);
        let mut sink = MockSink::default();
        let stop = AtomicBool::new(false);
        stop.store(true, Ordering::SeqCst);

        let mut grab = dpl.start(&StartMode::default()).unwrap();
        let report = run_loop(&mut grab, &mut utility, &mut sink, &stop, &options()).unwrap();
        drop(grab);

        assert_eq!(report.polls, 0);
        assert!(!calls.lock().unwrap().contains(&"DplGetCameraData".to_string()));
    }

    #[test]
    fn test_data_processing_source() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut dpl = open(&calls, &[]);
        let mut utility = utility(&dpl, false);
        let mut sink = MockSink::default();

        let mut grab = dpl.start(&StartMode::default()).unwrap();
        let options = LoopOptions {
            source: DataSource::DataProcessing,
            max_polls: Some(1),
            ..options()
        };
        let report = run_loop(&mut grab, &mut utility, &mut sink, &AtomicBool::new(false), &options).unwrap();
        drop(grab);

        assert_eq!(report.frames, 0);
        let calls = calls.lock().unwrap();
        assert!(calls.contains(&"DplGetDataProcModuleData".to_string()));
        assert!(!calls.contains(&"DplGetCameraData".to_string()));
    }

    #[test]
    fn test_csv_export_per_frame() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut dpl = open(&calls, &[Poll::Full, Poll::Full]);
        let mut utility = utility(&dpl, false);
        let mut sink = MockSink::default();

        let mut grab = dpl.start(&StartMode::default()).unwrap();
        let options = LoopOptions {
            max_polls: Some(2),
            csv_directory: Some(dir.path().to_path_buf()),
            ..options()
        };
        run_loop(&mut grab, &mut utility, &mut sink, &AtomicBool::new(false), &options).unwrap();
        drop(grab);

        for index in 0..2 {
            assert!(dir.path().join(format!("Disparity_{}.csv", index)).exists());
        }
        // Rotated disparity: the first row is 7,6,5,4.
        let distance = fs::read_to_string(dir.path().join("Distance_0.csv")).unwrap();
        let first_row: Vec<&str> = distance.lines().next().unwrap().split(',').collect();
        assert_eq!(first_row, vec!["8", "10", "13.333333", "20"]);
    }

    #[test]
    fn test_loop_timings_aggregate() {
        let mut timings = LoopTimings::new();
        timings.add_step("get", Duration::from_millis(4));
        timings.add_step("convert", Duration::from_millis(2));
        timings.add_step("get", Duration::from_millis(8));

        let get = timings.get_step("get").unwrap();
        assert_eq!(get.count, 2);
        assert_eq!(get.max, Duration::from_millis(8));
        assert_eq!(get.mean(), Duration::from_millis(6));
        assert_eq!(timings.total_duration(), Duration::from_millis(14));
        assert_eq!(timings.steps()[1].name, "convert");

        let (name, elapsed) = Timer::start("display").stop();
        timings.add_step(name, elapsed);
        assert_eq!(timings.steps().len(), 3);
    }

    #[test]
    fn test_mean_survives_huge_counts() {
        let step = StepTiming {
            name: "get".to_string(),
            count: 1 << 32,
            total: Duration::from_secs(1 << 32),
            max: Duration::from_secs(2),
        };
        assert_eq!(step.mean(), Duration::from_secs(1));

        let empty = StepTiming {
            count: 0,
            total: Duration::ZERO,
            ..step
        };
        assert_eq!(empty.mean(), Duration::ZERO);
    }
}
