//! Single-threaded poll loop of the example viewer

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, info_span, warn};

use crate::dpl::camera::api::DplApi;
use crate::dpl::camera::facade::{DataSource, Grab};
use crate::dpl::camera::frame::BufferState;
use crate::dpl::common::error::Result;
use crate::dpl::driver::timing::{LoopTimings, Timer};
use crate::dpl::output::csv::{write_disparity_csv, write_distance_csv};
use crate::dpl::output::sink::{DisplayPlane, FrameSink, Raster};
use crate::dpl::utility::api::UtilityApi;
use crate::dpl::utility::facade::IscUtility;

/// Checked once per iteration, before the next retrieval.
pub trait StopSignal {
    fn should_stop(&self) -> bool;
}

impl StopSignal for AtomicBool {
    fn should_stop(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

/// Stop request raised by Ctrl+C.
#[derive(Clone)]
pub struct CtrlCSignal {
    stop: Arc<AtomicBool>,
}

impl CtrlCSignal {
    /// Installs the process-wide handler. Only one may exist per process.
    pub fn install() -> std::result::Result<Self, ctrlc::Error> {
        let stop = Arc::new(AtomicBool::new(false));
        let handler_flag = stop.clone();
        ctrlc::set_handler(move || {
            handler_flag.store(true, Ordering::SeqCst);
        })?;
        Ok(Self { stop })
    }
}

impl StopSignal for CtrlCSignal {
    fn should_stop(&self) -> bool {
        self.stop.should_stop()
    }
}

#[derive(Debug, Clone)]
pub struct LoopOptions {
    pub source: DataSource,
    /// Colour by metric distance instead of raw disparity.
    pub distance_colors: bool,
    /// Pause between polls, on top of the native wait.
    pub poll_interval: Duration,
    /// Stop after this many polls.
    pub max_polls: Option<u64>,
    /// Export every displayed disparity frame as CSV into this directory.
    pub csv_directory: Option<PathBuf>,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            source: DataSource::Camera,
            distance_colors: true,
            poll_interval: Duration::from_millis(10),
            max_polls: None,
            csv_directory: None,
        }
    }
}

/// What happened over the lifetime of a loop.
#[derive(Debug, Default)]
pub struct LoopReport {
    pub polls: u64,
    /// Polls with a displayed base image.
    pub frames: u64,
    /// Polls whose retrieval call failed.
    pub failed: u64,
    pub timings: LoopTimings,
}

/// Polls `grab` until `stop` fires or `max_polls` is reached.
///
/// The grab is left running; the caller stops it.
pub fn run_loop<A, U, S, T>(
    grab: &mut Grab<'_, A>,
    utility: &mut IscUtility<U>,
    sink: &mut S,
    stop: &T,
    options: &LoopOptions,
) -> Result<LoopReport>
where
    A: DplApi,
    U: UtilityApi,
    S: FrameSink,
    T: StopSignal + ?Sized,
{
    let _span = info_span!("poll_loop", source = ?options.source).entered();
    let geometry = grab.camera().geometry();
    let mut buffers = grab.camera().frame_buffers();
    let mut report = LoopReport::default();

    while !stop.should_stop() {
        if options.max_polls.is_some_and(|max| report.polls >= max) {
            break;
        }

        let timer = Timer::start("get");
        let status = grab.get_frame(options.source, &mut buffers)?;
        report.timings.record(timer.stop());
        report.polls += 1;

        match status.base {
            BufferState::Ready => {
                report.frames += 1;
                if !status.camera_error.is_ok() {
                    warn!(frame = status.frame_no, code = %status.camera_error, "Camera reported an error");
                }

                let timer = Timer::start("display");
                sink.show(DisplayPlane::Base, Raster::from(&buffers.base))?;
                if status.color.is_ready() {
                    sink.show(DisplayPlane::Color, Raster::from(&buffers.color))?;
                }
                report.timings.record(timer.stop());

                if status.depth.is_ready() {
                    let (width, height) = (buffers.depth.width(), buffers.depth.height());
                    let disparity = buffers.depth.data();

                    let timer = Timer::start("convert");
                    let mapped = if options.distance_colors {
                        utility.disparity_to_distance_image(width, height, disparity)
                    } else {
                        utility.disparity_to_image(width, height, disparity)
                    };
                    report.timings.record(timer.stop());

                    if mapped.result.is_ok() {
                        let timer = Timer::start("display");
                        sink.show(DisplayPlane::Depth, Raster::from(mapped.image))?;
                        report.timings.record(timer.stop());
                    }

                    if let Some(dir) = &options.csv_directory {
                        let index = report.frames - 1;
                        write_disparity_csv(dir.join(format!("Disparity_{}.csv", index)), width, height, disparity)?;
                        write_distance_csv(
                            dir.join(format!("Distance_{}.csv", index)),
                            &geometry,
                            width,
                            height,
                            disparity,
                        )?;
                    }
                }
            }
            BufferState::Failed(code) => {
                report.failed += 1;
                debug!(%code, "Retrieval failed");
            }
            BufferState::Absent => {}
        }

        sink.end_frame()?;
        if !options.poll_interval.is_zero() {
            thread::sleep(options.poll_interval);
        }
    }

    info!(polls = report.polls, frames = report.frames, failed = report.failed, "Poll loop finished");
    report.timings.log_summary();
    Ok(report)
}
