use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use isc_dpl_rs::dpl::camera::CameraModel;
use isc_dpl_rs::dpl::{
    run_loop, CtrlCSignal, DataSource, DplConfig, IscDpl, IscUtility, LoopOptions, SnapshotConfig, StartMode,
    TiffSnapshotSink, UtilityConfig,
};
use isc_dpl_rs::logger;

use tracing::{error, info};

#[derive(Parser)]
#[command(name = "isc_dpl_rs", about = "ISC stereo camera viewer", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// View a connected camera
    Camera {
        /// 0: VM, 1: XC
        #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
        camera: u8,
        /// 0: camera disparity, 1: data-processing disparity
        #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
        mode: u8,
    },
    /// Play back a recorded file
    Play {
        file: PathBuf,
        /// 0: camera disparity, 1: data-processing disparity
        #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
        show: u8,
    },
}

fn source_for(selector: u8) -> DataSource {
    if selector == 0 {
        DataSource::Camera
    } else {
        DataSource::DataProcessing
    }
}

fn main() {
    let config = DplConfig::default();
    logger::init(logger::level_name(config.log_level));

    let cli = Cli::parse();
    if let Err(e) = run(cli, config) {
        error!("{:#}", e);
        std::process::exit(-1);
    }
    info!("Exit the application");
}

fn run(cli: Cli, config: DplConfig) -> Result<()> {
    let stop = CtrlCSignal::install().context("Failed to install Ctrl+C handler")?;

    match cli.command {
        Command::Camera { camera, mode } => {
            let model = if camera == 0 { CameraModel::Vm } else { CameraModel::Xc };
            info!(?model, mode, "Opening camera");

            let config = DplConfig::builder()
                .camera_model(model)
                .log_level(config.log_level)
                .build();
            let dpl = IscDpl::open(config).context("Camera initialization failed")?;
            view(dpl, StartMode::for_camera(mode), source_for(mode), &stop)
        }
        Command::Play { file, show } => {
            info!(file = %file.display(), show, "Opening recording");

            let dpl = IscDpl::open_file(config, &file)
                .with_context(|| format!("Playback initialization failed: {}", file.display()))?;
            let header = dpl.file_header().context("Recording header unavailable")?;
            let start = StartMode::for_playback(header, &file, show == 1);
            view(dpl, start, source_for(show), &stop)
        }
    }
}

fn view(mut dpl: IscDpl, start: StartMode, source: DataSource, stop: &CtrlCSignal) -> Result<()> {
    let geometry = dpl.geometry();
    info!(
        width = geometry.max_width,
        height = geometry.max_height,
        bf = geometry.bf,
        d_inf = geometry.d_inf,
        "Camera geometry"
    );

    let mut utility = IscUtility::open(geometry, UtilityConfig::default()).context("Utility initialization failed")?;
    let mut sink = TiffSnapshotSink::new(SnapshotConfig::default()).context("Cannot prepare snapshot directory")?;

    let mut grab = dpl.start(&start).context("Start failed")?;
    info!("Press Ctrl+C to stop");

    let options = LoopOptions {
        source,
        ..LoopOptions::default()
    };
    run_loop(&mut grab, &mut utility, &mut sink, stop, &options).context("Poll loop failed")?;

    grab.stop().context("Stop failed")?;
    utility.terminate().context("Utility terminate failed")?;
    dpl.terminate().context("Terminate failed")?;
    info!("Terminate successful");
    Ok(())
}
