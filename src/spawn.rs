/// *** Wires the handoff, channels, and the two rig threads together. *** //

use std::sync::{atomic::{AtomicBool, Ordering}, Arc};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver};
use log::{error, warn};

use crate::actors::acquisition::Acquisition;
use crate::actors::messages::RigEvent;
use crate::actors::orchestrator::{Orchestrator, TrackerFactory};
use crate::config::RigConf;
use crate::handoff::FrameHandoff;
use crate::modules::module_definitions::{CameraGrabber, Visualizer};

/// Handles held by the supervising (main) thread.
pub struct RigHandles {
    stop: Arc<AtomicBool>,
    handoff: Arc<FrameHandoff>,
    pub events: Receiver<RigEvent>,
    acquisition_join: JoinHandle<()>,
    orchestrator_join: JoinHandle<()>,
}

impl RigHandles {
    /// Idempotent. Closing the handoff wakes whichever thread is blocked on
    /// it; a frame already published still drains before the consumer exits.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.handoff.close();
    }

    pub fn handoff(&self) -> &Arc<FrameHandoff> {
        &self.handoff
    }

    pub fn join(self) {
        self.acquisition_join.join().expect("acquisition thread panicked");
        self.orchestrator_join.join().expect("orchestrator thread panicked");
    }
}

/// Stops the sibling thread no matter how the owning thread leaves its loop,
/// including a panic inside a collaborator: dropped during unwind, it still
/// wakes whoever is blocked mid-handshake.
struct Escalation {
    stop: Arc<AtomicBool>,
    handoff: Arc<FrameHandoff>,
}

impl Drop for Escalation {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.handoff.close();
    }
}

/// Launch the rig: one single-slot handoff shared by exactly two long-lived
/// threads. Collaborators are injected here so tests can drive the whole rig
/// with fakes. Both threads report their exit through the event channel and
/// close the handoff on the way out, so a dead thread can never leave its
/// sibling blocked mid-handshake.
pub fn launch_rig(
    grabber: Box<dyn CameraGrabber>,
    tracker_factory: TrackerFactory,
    visualizer: Box<dyn Visualizer>,
    conf: RigConf,
) -> RigHandles {
    let handoff = Arc::new(FrameHandoff::new(conf.width, conf.height));
    let stop = Arc::new(AtomicBool::new(false));
    // Calibration crosses exactly once, producer to consumer, before either
    // steady-state loop starts.
    let (calibration_tx, calibration_rx) = bounded(1);
    let (events_tx, events) = unbounded();

    let mut acquisition = Acquisition::new(
        grabber, handoff.clone(), stop.clone(), calibration_tx, conf.clone(),
    );
    let acquisition_escalation = Escalation { stop: stop.clone(), handoff: handoff.clone() };
    let acquisition_events = events_tx.clone();
    let acquisition_join = thread::spawn(move || {
        let _escalation = acquisition_escalation;
        let result = acquisition.run();
        if let Err(e) = &result {
            error!("Acquisition thread died: {}", e);
        }
        let _ = acquisition_events.send(RigEvent::AcquisitionExited { result });
    });

    let mut orchestrator = Orchestrator::new(
        handoff.clone(), calibration_rx, tracker_factory, visualizer, conf,
    );
    let orchestrator_escalation = Escalation { stop: stop.clone(), handoff: handoff.clone() };
    let orchestrator_join = thread::spawn(move || {
        let _escalation = orchestrator_escalation;
        let result = orchestrator.run();
        if let Err(e) = &result {
            error!("Orchestrator thread died: {}", e);
        }
        let _ = events_tx.send(RigEvent::OrchestratorExited {
            frames_processed: orchestrator.frames_processed(),
            result,
        });
    });

    RigHandles {
        stop,
        handoff,
        events,
        acquisition_join,
        orchestrator_join,
    }
}

pub fn install_ctrlc_handler(handles: &RigHandles) {
    let stop = handles.stop.clone();
    let handoff = handles.handoff.clone();
    ctrlc::set_handler(move || {
        warn!("received Ctrl+C!");
        stop.store(true, Ordering::SeqCst);
        handoff.close();
    })
    .expect("Error setting Ctrl-C handler");
}
