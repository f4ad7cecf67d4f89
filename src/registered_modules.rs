use log::error;

use crate::actors::orchestrator::TrackerFactory;
use crate::config::{ModuleConf, CAMERA, SETTINGS, SYSTEM};
use crate::frame::Calibration;
use crate::modules::grabber::{DatasetGrabber, SyntheticGrabber};
use crate::modules::module_definitions::{CameraGrabber, Visualizer};
use crate::modules::tracker::NullTracker;
use crate::modules::visualizer::{NullVisualizer, TrajectoryVisualizer};

// COLLABORATOR MODULES: these are the names the rest of the system uses to
// refer to a collaborator; the config file's tag picks the implementation,
// so nothing here leaks into the orchestration core.
pub static GRABBER: &str = "GRABBER";
pub static TRACKER: &str = "TRACKER";
pub static VISUALIZER: &str = "VISUALIZER";

fn tag_for(modules: &[ModuleConf], name: &str) -> String {
    modules
        .iter()
        .find(|m| m.name == name)
        .map(|m| m.tag.clone())
        .unwrap_or_default()
}

// Recorded and synthetic sources report the configured rig calibration, the
// way the real driver reports the one burned into the camera.
fn calibration_from_settings() -> Calibration {
    Calibration::from_parts(
        SETTINGS.get::<f64>(CAMERA, "fx"),
        SETTINGS.get::<f64>(CAMERA, "fy"),
        SETTINGS.get::<f64>(CAMERA, "cx"),
        SETTINGS.get::<f64>(CAMERA, "cy"),
        SETTINGS.get::<f64>(CAMERA, "baseline"),
    )
}

pub fn build_grabber(modules: &[ModuleConf]) -> Result<Box<dyn CameraGrabber>, Box<dyn std::error::Error>> {
    let tag = tag_for(modules, GRABBER);
    match tag.as_str() {
        "dataset" => {
            let left_dir = SETTINGS.get::<String>(GRABBER, "left_dir");
            let right_dir = SETTINGS.get::<String>(GRABBER, "right_dir");
            Ok(Box::new(DatasetGrabber::new(left_dir, right_dir, calibration_from_settings())))
        }
        "synthetic" => {
            let frame_limit = SETTINGS.get::<i32>(GRABBER, "frame_limit") as u64;
            Ok(Box::new(SyntheticGrabber::new(frame_limit, calibration_from_settings())))
        }
        other => Err(format!("Grabber not implemented: {}", other).into()),
    }
}

pub fn build_tracker_factory(modules: &[ModuleConf]) -> TrackerFactory {
    let tag = tag_for(modules, TRACKER);
    match tag.as_str() {
        "null" => {}
        other => error!("Tracker not implemented: {}; falling back to the null tracker", other),
    }
    Box::new(|camera| Box::new(NullTracker::new(camera)))
}

pub fn build_visualizer(modules: &[ModuleConf]) -> Box<dyn Visualizer> {
    if !SETTINGS.get::<bool>(SYSTEM, "show_visualizer") {
        return Box::new(NullVisualizer);
    }
    let tag = tag_for(modules, VISUALIZER);
    match tag.as_str() {
        "trajectory" => Box::new(TrajectoryVisualizer::new(
            SETTINGS.get::<String>(SYSTEM, "results_folder"),
            SETTINGS.get::<String>(SYSTEM, "trajectory_file_name"),
        )),
        other => {
            error!("Visualizer not implemented: {}", other);
            Box::new(NullVisualizer)
        }
    }
}
