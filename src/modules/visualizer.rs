/// *** Headless telemetry sinks. *** //
///
/// The MRPT scene window of the original rig is an external collaborator;
/// headless runs get the same per-frame data as a log line plus a trajectory
/// file written at teardown.

use std::{fs::File, io::{BufWriter, Write}, path::Path};

use log::{debug, warn};

use crate::actors::messages::Telemetry;
use crate::frame::Image;
use crate::modules::module_definitions::Visualizer;
use crate::pose::{Covariance, Pose};

/// Chains the per-frame increments into a world pose and dumps the
/// trajectory in TUM format (`index tx ty tz qx qy qz qw`) when dropped.
pub struct TrajectoryVisualizer {
    results_folder: String,
    trajectory_filename: String,
    world_pose: Pose,
    trajectory: Vec<(u64, Pose)>,
    current: Telemetry,
}

impl TrajectoryVisualizer {
    pub fn new(results_folder: String, trajectory_filename: String) -> TrajectoryVisualizer {
        TrajectoryVisualizer {
            results_folder,
            trajectory_filename,
            world_pose: Pose::identity(),
            trajectory: Vec::new(),
            current: Telemetry::default(),
        }
    }

    fn write_trajectory(&self) -> std::io::Result<()> {
        let path = Path::new(&self.results_folder).join(&self.trajectory_filename);
        let mut f = BufWriter::new(File::create(&path)?);
        for (index, pose) in &self.trajectory {
            let trans = pose.get_translation();
            let rot = pose.get_quaternion();
            writeln!(
                f,
                "{} {:.7} {:.7} {:.7} {:.7} {:.7} {:.7} {:.7}",
                index,
                trans[0], trans[1], trans[2],
                rot.i, rot.j, rot.k, rot.w
            )?;
        }
        Ok(())
    }
}

impl Visualizer for TrajectoryVisualizer {
    fn set_telemetry(&mut self, telemetry: &Telemetry) {
        self.current = telemetry.clone();
    }

    fn set_covariance(&mut self, covariance: &Covariance) {
        debug!("Covariance trace: {:.6}", covariance.trace());
    }

    fn set_pose(&mut self, increment: &Pose) {
        self.world_pose = self.world_pose.compose(increment);
    }

    fn set_image(&mut self, left: &Image) {
        debug!("Frame {} image {}x{}", self.current.frame_index, left.width(), left.height());
    }

    fn refresh(&mut self) {
        self.trajectory.push((self.current.frame_index, self.world_pose));
    }
}

impl Drop for TrajectoryVisualizer {
    fn drop(&mut self) {
        match self.write_trajectory() {
            Ok(()) => debug!(
                "Wrote {} trajectory rows to {}/{}",
                self.trajectory.len(), self.results_folder, self.trajectory_filename
            ),
            Err(e) => {
                warn!(
                    "Could not write trajectory file {}/{}: {}",
                    self.results_folder, self.trajectory_filename, e
                );
                println!("Here is the trajectory: ");
                for (index, pose) in &self.trajectory {
                    let trans = pose.get_translation();
                    let rot = pose.get_quaternion();
                    println!(
                        "{} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4}",
                        index,
                        trans[0], trans[1], trans[2],
                        rot.i, rot.j, rot.k, rot.w
                    );
                }
            }
        }
    }
}

/// Discards everything. Used when the UI is switched off.
pub struct NullVisualizer;

impl Visualizer for NullVisualizer {
    fn set_telemetry(&mut self, _telemetry: &Telemetry) {}
    fn set_covariance(&mut self, _covariance: &Covariance) {}
    fn set_pose(&mut self, _increment: &Pose) {}
    fn set_image(&mut self, _left: &Image) {}
    fn refresh(&mut self) {}
}
