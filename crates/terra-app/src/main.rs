//! `terra`: headless fly-through over a streamed terrain map.

use std::process::ExitCode;

use clap::Parser;
use terra_app::{AppError, Flight, StreamingSession};
use terra_cache::HostUploader;
use terra_config::{CliArgs, Config};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("terra: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), AppError> {
    let config_dir = match &args.config {
        Some(dir) => dir.clone(),
        None => Config::default_dir()?,
    };
    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(args);

    terra_log::init_logging(
        Some(&config_dir.join("logs")),
        cfg!(debug_assertions),
        Some(&config),
    );

    let mut session = StreamingSession::open(&config, HostUploader::new())?;
    let flight = Flight::across(session.map().info(), config.debug.frames);

    for frame in 0..flight.frames() {
        let (position, target) = flight.pose(frame);
        session.camera_mut().look_from(position, target);
        let report = session.frame();
        tracing::info!(
            frame = report.frame,
            frontier = report.frontier,
            culled = report.selection.culled,
            textures = report.textures,
            activated = report.activated,
            released = report.released,
            failed = report.failed,
            resident = report.cache.active + report.cache.inactive,
            evictions = report.cache.evictions,
            "Frame streamed"
        );
    }

    let stats = session.cache().stats();
    tracing::info!(
        frames = session.frame_count(),
        loads = stats.loads,
        evictions = stats.evictions,
        failed_loads = stats.failed_loads,
        resident_bytes = stats.resident_bytes,
        uploads = session.cache().uploader().uploads(),
        "Fly-through complete"
    );
    Ok(())
}
