use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Receiver;
use log::{info, warn};

use crate::actors::messages::Telemetry;
use crate::config::RigConf;
use crate::frame::Calibration;
use crate::handoff::{FrameHandoff, HandoffClosed};
use crate::modules::camera::PinholeStereoCamera;
use crate::modules::module_definitions::{FrameTracker, TrackError, Visualizer};
use crate::pose::Covariance;

/// Built once calibration is known; the tracker implementation usually wraps
/// the camera model.
pub type TrackerFactory = Box<dyn FnOnce(PinholeStereoCamera) -> Box<dyn FrameTracker> + Send>;

/// Consumer side of the rig: waits for a published frame, runs the per-frame
/// pipeline in a fixed order (track, optimize, telemetry, release), and
/// hands the slot back to the producer. This loop is the system heartbeat;
/// its period is max(acquisition time, processing time).
pub struct Orchestrator {
    handoff: Arc<FrameHandoff>,
    calibration_rx: Receiver<Calibration>,
    tracker_factory: Option<TrackerFactory>,
    visualizer: Box<dyn Visualizer>,
    conf: RigConf,
    frame_counter: u64,
}

impl Orchestrator {
    pub fn new(
        handoff: Arc<FrameHandoff>,
        calibration_rx: Receiver<Calibration>,
        tracker_factory: TrackerFactory,
        visualizer: Box<dyn Visualizer>,
        conf: RigConf,
    ) -> Orchestrator {
        Orchestrator {
            handoff,
            calibration_rx,
            tracker_factory: Some(tracker_factory),
            visualizer,
            conf,
            frame_counter: 0,
        }
    }

    pub fn frames_processed(&self) -> u64 {
        self.frame_counter
    }

    pub fn run(&mut self) -> Result<(), TrackError> {
        // Bootstrap, consumer half: calibration arrives exactly once, before
        // any read. Camera model and tracker cannot exist without it.
        let calibration = match self.calibration_rx.recv() {
            Ok(calibration) => calibration,
            // Producer died during its own bootstrap; it reports the fault.
            Err(_) => return Ok(()),
        };
        let camera = PinholeStereoCamera::from_calibration(self.conf.width, self.conf.height, &calibration);
        let factory = self.tracker_factory.take().expect("orchestrator loop started twice");
        let mut tracker = factory(camera);

        loop {
            // Stop is signaled through handoff closure, which still lets a
            // frame published before the close drain through.
            let slot = match self.handoff.acquire_for_read() {
                Ok(slot) => slot,
                Err(HandoffClosed) => break,
            };

            let started = Instant::now();
            tracker.ingest(&slot.left, &slot.right, slot.index)?;
            let increment = tracker.estimate_pose()?;
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

            let report = tracker.report();
            let telemetry = Telemetry {
                frame_index: slot.index,
                latency_ms,
                matched_pt: report.matched_pt,
                inlier_pt: report.inlier_pt,
                matched_ls: report.matched_ls,
                inlier_ls: report.inlier_ls,
                residual: report.residual,
            };

            self.visualizer.set_telemetry(&telemetry);
            self.visualizer.set_covariance(&report.covariance.unwrap_or_else(Covariance::identity));
            self.visualizer.set_pose(&increment);
            self.visualizer.set_image(&slot.left);
            self.visualizer.refresh();

            info!(
                "Frame: {} \t Residual error: {:.8} \t Proc. time: {:.3} ms \t Points: {} ({}) \t Lines: {} ({})",
                telemetry.frame_index, telemetry.residual, telemetry.latency_ms,
                telemetry.matched_pt, telemetry.inlier_pt,
                telemetry.matched_ls, telemetry.inlier_ls
            );

            if slot.index != self.frame_counter {
                // Strict alternation should make this impossible.
                warn!("Frame order slip: expected {}, got {}", self.frame_counter, slot.index);
            }

            // Hand the slot back to the producer, then advance.
            drop(slot);
            self.frame_counter += 1;
        }
        Ok(())
    }
}
