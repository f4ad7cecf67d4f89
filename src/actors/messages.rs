use crate::modules::module_definitions::{GrabError, TrackError};

//* ORCHESTRATOR -> VISUALIZER */
/// Per-cycle diagnostic bundle. Produced and consumed within one
/// orchestration cycle; nothing here feeds back into control.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    pub frame_index: u64,
    pub latency_ms: f64,
    pub matched_pt: usize,
    pub inlier_pt: usize,
    pub matched_ls: usize,
    pub inlier_ls: usize,
    pub residual: f64,
}

//* THREADS -> SUPERVISOR */
/// Sent to the main thread when a rig thread leaves its loop, normally or
/// not. The supervisor stops the sibling and joins both either way; a frame
/// pipeline with one dead end cannot make progress.
#[derive(Debug)]
pub enum RigEvent {
    AcquisitionExited { result: Result<(), GrabError> },
    OrchestratorExited { frames_processed: u64, result: Result<(), TrackError> },
}
