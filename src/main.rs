use std::{env, fs, path::Path};

use fern::colors::{Color, ColoredLevelConfig};
use log::{error, info};

use crate::actors::messages::RigEvent;
use crate::config::{load_config, RigConf, SETTINGS, SYSTEM};

mod actors;
mod config;
mod frame;
mod handoff;
mod modules;
mod pose;
mod registered_modules;
mod spawn;
mod tests;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        panic!("
            [ERROR] Invalid number of input parameters.
            Usage: cargo run -- [PATH_TO_SYSTEM_CONFIG_FILE] [PATH_TO_CAMERA_CONFIG_FILE]
        ");
    }
    let system_config_file = args[1].to_owned();
    let camera_config_file = args[2].to_owned();

    let (module_info, log_level) = load_config(&system_config_file, &camera_config_file)?;

    setup_logger(&log_level)?;

    let grabber = registered_modules::build_grabber(&module_info)?;
    let tracker_factory = registered_modules::build_tracker_factory(&module_info);
    let visualizer = registered_modules::build_visualizer(&module_info);

    let handles = spawn::launch_rig(grabber, tracker_factory, visualizer, RigConf::from_settings());
    spawn::install_ctrlc_handler(&handles);
    info!("Rig running; Ctrl+C to stop");

    // Supervise: the first thread to leave its loop (fault, end of stream,
    // Ctrl+C) stops the sibling; then both are joined.
    match handles.events.recv() {
        Ok(RigEvent::AcquisitionExited { result }) => {
            if let Err(e) = result {
                error!("Shutting down after acquisition fault: {}", e);
            } else {
                info!("Acquisition finished; draining and shutting down");
            }
        }
        Ok(RigEvent::OrchestratorExited { frames_processed, result }) => {
            if let Err(e) = result {
                error!("Shutting down after processing fault at frame {}: {}", frames_processed, e);
            } else {
                info!("Orchestrator finished after {} frames", frames_processed);
            }
        }
        Err(_) => {}
    }
    handles.request_stop();
    handles.join();

    Ok(())
}

fn setup_logger(level: &str) -> Result<(), fern::InitError> {
    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red)
        .trace(Color::Magenta);

    let results_folder = SETTINGS.get::<String>(SYSTEM, "results_folder");
    fs::create_dir_all(&results_folder)?;

    let log_level = match level {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Trace,
    };

    let start_time = chrono::Local::now();

    let terminal_output = fern::Dispatch::new()
        .level(log_level)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{color_line}[{time} {target}:{line_num} {level}{color_line}] {message}\x1B[0m",
                color_line = format_args!(
                    "\x1B[{}m",
                    colors.get_color(&record.level()).to_fg_str()
                ),
                level = colors.color(record.level()),
                time = (chrono::Local::now() - start_time).num_milliseconds() as f64 / 1000.0,
                target = record.file().unwrap_or("unknown"),
                line_num = record.line().unwrap_or(0),
                message = message
            ))
        })
        .chain(std::io::stdout());

    let file_output = fern::Dispatch::new()
        .level(log_level)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{time} {target}:{line_num} {level}] {message}",
                time = (chrono::Local::now() - start_time).num_milliseconds() as f64 / 1000.0,
                target = record.file().unwrap_or("unknown"),
                line_num = record.line().unwrap_or(0),
                level = record.level(),
                message = message
            ))
        })
        .chain(fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(Path::new(&results_folder).join("output.log"))?
        );

    fern::Dispatch::new()
        .chain(terminal_output)
        .chain(file_output)
        .apply()?;

    Ok(())
}
