use log::warn;

use crate::frame::Image;
use crate::modules::camera::PinholeStereoCamera;
use crate::modules::module_definitions::{FrameTracker, TrackError, TrackingReport};
use crate::pose::Pose;

/// Stand-in for the point/line odometry pipeline, which plugs in as an
/// external collaborator. Reports identity motion and zero matches, so every
/// cycle shows up as degraded telemetry while keeping the rig runnable
/// end-to-end.
pub struct NullTracker {
    camera: PinholeStereoCamera,
    warned: bool,
}

impl NullTracker {
    pub fn new(camera: PinholeStereoCamera) -> NullTracker {
        NullTracker {
            camera,
            warned: false,
        }
    }
}

impl FrameTracker for NullTracker {
    fn ingest(&mut self, _left: &Image, _right: &Image, _frame_index: u64) -> Result<(), TrackError> {
        Ok(())
    }

    fn estimate_pose(&mut self) -> Result<Pose, TrackError> {
        if !self.warned {
            warn!(
                "No tracker implementation wired in ({}x{} rig); reporting identity motion",
                self.camera.width(), self.camera.height()
            );
            self.warned = true;
        }
        Ok(Pose::identity())
    }

    fn report(&self) -> TrackingReport {
        TrackingReport::default()
    }
}
