use std::ops::Deref;

use nalgebra::{IsometryMatrix3, Matrix6, Rotation3, Translation3, UnitQuaternion, Vector3};

/// Rigid-body transform. Each cycle the tracker reports one of these as the
/// incremental motion between consecutive frames; the trajectory sink chains
/// them into a world pose.
#[derive(Clone, Copy, Debug)]
pub struct Pose(IsometryMatrix3<f64>);

pub type Covariance = Matrix6<f64>;

impl Pose {
    pub fn new(translation: Vector3<f64>, rotation: nalgebra::Matrix3<f64>) -> Pose {
        let trans = Translation3::from(translation);
        let rot = Rotation3::from_matrix(&rotation);
        Pose(IsometryMatrix3::from_parts(trans, rot))
    }

    pub fn identity() -> Pose {
        Pose(IsometryMatrix3::identity())
    }

    pub fn get_translation(&self) -> Vector3<f64> {
        self.0.translation.vector
    }

    pub fn get_quaternion(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_rotation_matrix(&self.0.rotation)
    }

    /// World pose after applying `increment` to this pose.
    pub fn compose(&self, increment: &Pose) -> Pose {
        Pose(self.0 * increment.0)
    }

    pub fn inverse(&self) -> Pose {
        Pose(self.0.inverse())
    }
}

impl Default for Pose {
    fn default() -> Pose {
        Pose::identity()
    }
}

impl Deref for Pose {
    type Target = IsometryMatrix3<f64>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
