/// *** File- and generator-backed stereo sources. *** //
///
/// The bumblebee driver is an external collaborator; these grabbers let the
/// rig run against recorded sequences and synthetic frames through the same
/// seam. The dataset grabber paces delivery at the profile rate so the
/// acquisition loop sees hardware-like timing.

use glob::glob;
use log::info;
use spin_sleep::LoopHelper;

use crate::frame::{Calibration, Image};
use crate::modules::module_definitions::{CameraGrabber, GrabError};

/// Parse a profile string like "FRAMERATE_20" into a target rate.
fn target_fps(frame_rate_profile: &str) -> Result<f64, GrabError> {
    frame_rate_profile
        .rsplit('_')
        .next()
        .and_then(|suffix| suffix.parse::<f64>().ok())
        .ok_or_else(|| GrabError::DeviceUnavailable(
            format!("unsupported frame rate profile '{}'", frame_rate_profile),
        ))
}

fn list_images(img_dir: &str) -> Result<Vec<String>, GrabError> {
    let glob_str = format!("{}/*.png", img_dir);
    let mut image_paths = Vec::new();
    let entries = glob(&glob_str)
        .map_err(|e| GrabError::DeviceUnavailable(format!("bad glob pattern {}: {}", glob_str, e)))?;
    for entry in entries {
        let path = entry.map_err(|e| GrabError::DeviceUnavailable(e.to_string()))?;
        match path.to_str() {
            Some(path_str) => image_paths.push(path_str.to_owned()),
            None => return Err(GrabError::DeviceUnavailable(format!("invalid path under {}", img_dir))),
        }
    }
    Ok(image_paths)
}

fn decode_into(path: &str, target: &mut Image) -> Result<(), GrabError> {
    let decoded = image::open(path)
        .map_err(|e| GrabError::BadFrame(format!("{}: {}", path, e)))?
        .to_luma8();
    if decoded.width() != target.width() || decoded.height() != target.height() {
        return Err(GrabError::BadFrame(format!(
            "{}: {}x{} does not match configured {}x{}",
            path, decoded.width(), decoded.height(), target.width(), target.height()
        )));
    }
    target
        .fill_from(decoded.as_raw())
        .map_err(|e| GrabError::BadFrame(format!("{}: {}", path, e)))
}

/// Replays a recorded stereo sequence from two image directories, paced at
/// the configured frame-rate profile.
pub struct DatasetGrabber {
    left_dir: String,
    right_dir: String,
    calibration: Calibration,
    left_paths: Vec<String>,
    right_paths: Vec<String>,
    next: usize,
    loop_helper: Option<LoopHelper>,
    opened: bool,
}

impl DatasetGrabber {
    pub fn new(left_dir: String, right_dir: String, calibration: Calibration) -> DatasetGrabber {
        DatasetGrabber {
            left_dir,
            right_dir,
            calibration,
            left_paths: Vec::new(),
            right_paths: Vec::new(),
            next: 0,
            loop_helper: None,
            opened: false,
        }
    }
}

impl CameraGrabber for DatasetGrabber {
    fn open(&mut self, _width: u32, _height: u32, frame_rate_profile: &str) -> Result<(), GrabError> {
        self.left_paths = list_images(&self.left_dir)?;
        self.right_paths = list_images(&self.right_dir)?;

        if self.left_paths.is_empty() {
            return Err(GrabError::DeviceUnavailable(format!("no images under {}", self.left_dir)));
        }
        if self.left_paths.len() != self.right_paths.len() {
            return Err(GrabError::DeviceUnavailable(format!(
                "unpaired stereo sequence: {} left vs {} right images",
                self.left_paths.len(), self.right_paths.len()
            )));
        }

        let fps = target_fps(frame_rate_profile)?;
        self.loop_helper = Some(LoopHelper::builder().build_with_target_rate(fps));
        self.opened = true;
        info!("Dataset grabber: {} stereo pairs at {} fps", self.left_paths.len(), fps);
        Ok(())
    }

    fn calibration(&self) -> Result<Calibration, GrabError> {
        if !self.opened {
            return Err(GrabError::DeviceUnavailable("calibration requested before open".to_string()));
        }
        Ok(self.calibration)
    }

    fn grab_stereo_pair(&mut self, left: &mut Image, right: &mut Image) -> Result<(), GrabError> {
        if !self.opened {
            return Err(GrabError::DeviceUnavailable("grab before open".to_string()));
        }
        if self.next >= self.left_paths.len() {
            return Err(GrabError::EndOfStream);
        }

        // Sleep out the remainder of the frame period, like the hardware would
        if let Some(loop_helper) = &mut self.loop_helper {
            loop_helper.loop_sleep();
        }

        decode_into(&self.left_paths[self.next], left)?;
        decode_into(&self.right_paths[self.next], right)?;

        if let Some(loop_helper) = &mut self.loop_helper {
            loop_helper.loop_start();
        }
        self.next += 1;
        Ok(())
    }
}

/// Deterministic generated frames for smoke runs and tests: a gradient that
/// drifts with the frame count, with the right image offset horizontally to
/// fake a disparity.
pub struct SyntheticGrabber {
    frame_limit: u64,
    grabbed: u64,
    calibration: Calibration,
    opened: bool,
}

impl SyntheticGrabber {
    pub fn new(frame_limit: u64, calibration: Calibration) -> SyntheticGrabber {
        SyntheticGrabber {
            frame_limit,
            grabbed: 0,
            calibration,
            opened: false,
        }
    }
}

impl CameraGrabber for SyntheticGrabber {
    fn open(&mut self, _width: u32, _height: u32, _frame_rate_profile: &str) -> Result<(), GrabError> {
        self.opened = true;
        Ok(())
    }

    fn calibration(&self) -> Result<Calibration, GrabError> {
        if !self.opened {
            return Err(GrabError::DeviceUnavailable("calibration requested before open".to_string()));
        }
        Ok(self.calibration)
    }

    fn grab_stereo_pair(&mut self, left: &mut Image, right: &mut Image) -> Result<(), GrabError> {
        if !self.opened {
            return Err(GrabError::DeviceUnavailable("grab before open".to_string()));
        }
        if self.grabbed >= self.frame_limit {
            return Err(GrabError::EndOfStream);
        }

        let width = left.width() as u64;
        let drift = self.grabbed * 3;
        fill_gradient(left, width, drift);
        fill_gradient(right, width, drift + 8); // fixed fake disparity

        self.grabbed += 1;
        Ok(())
    }
}

fn fill_gradient(image: &mut Image, width: u64, drift: u64) {
    for (i, px) in image.as_mut_slice().iter_mut().enumerate() {
        let x = i as u64 % width;
        let y = i as u64 / width;
        *px = ((x + y + drift) & 0xff) as u8;
    }
}
