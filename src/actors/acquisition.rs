use std::sync::{atomic::{AtomicBool, Ordering}, Arc};

use crossbeam_channel::Sender;
use log::info;

use crate::config::RigConf;
use crate::frame::{Calibration, StereoFrame};
use crate::handoff::{FrameHandoff, HandoffClosed};
use crate::modules::module_definitions::{CameraGrabber, GrabError};

/// Producer side of the rig: owns the grabber, fills the shared slot.
///
/// Bootstrap happens on this thread because the grabber owns the
/// calibration: open the device, send the calibration across (exactly once),
/// prime the slot with the first pair. Steady state is then
/// acquire-for-write, grab in place, publish.
pub struct Acquisition {
    grabber: Box<dyn CameraGrabber>,
    handoff: Arc<FrameHandoff>,
    stop: Arc<AtomicBool>,
    calibration_tx: Sender<Calibration>,
    conf: RigConf,
    next_index: u64,
}

impl Acquisition {
    pub fn new(
        grabber: Box<dyn CameraGrabber>,
        handoff: Arc<FrameHandoff>,
        stop: Arc<AtomicBool>,
        calibration_tx: Sender<Calibration>,
        conf: RigConf,
    ) -> Acquisition {
        Acquisition {
            grabber,
            handoff,
            stop,
            calibration_tx,
            conf,
            next_index: 0,
        }
    }

    /// Runs until the stream ends, the rig stops, or the grabber faults.
    /// A grabber fault propagates out; the spawn wrapper escalates it.
    pub fn run(&mut self) -> Result<(), GrabError> {
        self.grabber.open(self.conf.width, self.conf.height, &self.conf.frame_rate_profile)?;
        let calibration = self.grabber.calibration()?;
        if self.calibration_tx.send(calibration).is_err() {
            // Consumer already gone; nothing to produce for.
            return Ok(());
        }

        // Prime the slot so the orchestrator's first read succeeds, then loop.
        if !self.fill_one()? {
            return Ok(());
        }
        info!("First stereo frame primed; entering grab loop");

        while !self.stop.load(Ordering::SeqCst) {
            if !self.fill_one()? {
                break;
            }
        }
        Ok(())
    }

    /// One write phase of the handshake. Returns false when the loop should
    /// end without error (handoff closed or dataset exhausted); a dropped
    /// unpublished slot rolls back to Empty so no torn frame is exposed.
    fn fill_one(&mut self) -> Result<bool, GrabError> {
        let mut slot = match self.handoff.acquire_for_write() {
            Ok(slot) => slot,
            Err(HandoffClosed) => return Ok(false),
        };

        let frame: &mut StereoFrame = &mut slot;
        match self.grabber.grab_stereo_pair(&mut frame.left, &mut frame.right) {
            Ok(()) => {}
            Err(GrabError::EndOfStream) => {
                info!("Stereo stream ended after {} frames", self.next_index);
                return Ok(false);
            }
            Err(e) => return Err(e),
        }

        frame.index = self.next_index;
        self.next_index += 1;
        slot.publish();
        Ok(true)
    }
}
