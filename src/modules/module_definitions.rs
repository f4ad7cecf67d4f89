/// *** Traits for collaborator modules. *** //
///
/// The rig core only sequences these; the hardware driver and the odometry
/// math live behind the seams.

use std::fmt;

use crate::actors::messages::Telemetry;
use crate::frame::{Calibration, Image};
use crate::pose::{Covariance, Pose};

/// *** Camera grabber *** //
///
/// Hardware-paced stereo source. `grab_stereo_pair` blocks until the next
/// synchronized pair and fills the caller's buffers in place.
pub trait CameraGrabber: Send {
    fn open(&mut self, width: u32, height: u32, frame_rate_profile: &str) -> Result<(), GrabError>;
    fn calibration(&self) -> Result<Calibration, GrabError>;
    fn grab_stereo_pair(&mut self, left: &mut Image, right: &mut Image) -> Result<(), GrabError>;
}

/// Grabber faults are fatal to acquisition: with no frames there is no
/// progress to be made, so the thread escalates instead of retrying.
#[derive(Debug)]
pub enum GrabError {
    /// The device (or backing dataset) could not be opened or stopped responding.
    DeviceUnavailable(String),
    /// A dataset-backed source ran out of frames. Normal termination.
    EndOfStream,
    /// A frame was delivered but could not be decoded into the shared buffer.
    BadFrame(String),
}

impl fmt::Display for GrabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrabError::DeviceUnavailable(msg) => write!(f, "grabber unavailable: {}", msg),
            GrabError::EndOfStream => write!(f, "end of stream"),
            GrabError::BadFrame(msg) => write!(f, "bad frame: {}", msg),
        }
    }
}
impl std::error::Error for GrabError {}

/// *** Frame tracker *** //
///
/// The per-frame odometry pipeline: ingest a stereo pair, estimate the
/// incremental pose, expose the match/inlier counters for telemetry.
/// Degraded tracking (few matches, high residual) is NOT an error; it shows
/// up in the report and the loop continues. `TrackError` is reserved for
/// conditions the tracker cannot absorb locally.
pub trait FrameTracker: Send {
    fn ingest(&mut self, left: &Image, right: &Image, frame_index: u64) -> Result<(), TrackError>;
    fn estimate_pose(&mut self) -> Result<Pose, TrackError>;
    fn report(&self) -> TrackingReport;
}

/// Per-frame counters read back from the tracker after pose estimation.
#[derive(Debug, Clone, Default)]
pub struct TrackingReport {
    pub matched_pt: usize,
    pub inlier_pt: usize,
    pub matched_ls: usize,
    pub inlier_ls: usize,
    pub residual: f64,
    pub covariance: Option<Covariance>,
}

#[derive(Debug)]
pub enum TrackError {
    Unrecoverable(String),
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackError::Unrecoverable(msg) => write!(f, "tracking failed: {}", msg),
        }
    }
}
impl std::error::Error for TrackError {}

/// *** Visualizer *** //
///
/// Per-cycle telemetry sink. Called in a fixed order each frame:
/// telemetry, covariance, pose, image, then refresh.
pub trait Visualizer: Send {
    fn set_telemetry(&mut self, telemetry: &Telemetry);
    fn set_covariance(&mut self, covariance: &Covariance);
    fn set_pose(&mut self, increment: &Pose);
    fn set_image(&mut self, left: &Image);
    fn refresh(&mut self);
}
