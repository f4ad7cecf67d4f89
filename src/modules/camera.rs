use log::info;

use nalgebra::{Point3, Vector3};

use crate::frame::Calibration;

/// Rectified pinhole stereo model, built once during bootstrap from the
/// calibration the grabber reports. The tracker owns the projection math;
/// the rig only constructs the model and passes it along.
#[derive(Debug, Clone, Copy)]
pub struct PinholeStereoCamera {
    width: u32,
    height: u32,
    fx: f64,
    fy: f64,
    cx: f64,
    cy: f64,
    baseline: f64,
}

impl PinholeStereoCamera {
    pub fn from_calibration(width: u32, height: u32, calibration: &Calibration) -> PinholeStereoCamera {
        let camera = PinholeStereoCamera {
            width,
            height,
            fx: calibration.fx(),
            fy: calibration.fy(),
            cx: calibration.cx(),
            cy: calibration.cy(),
            baseline: calibration.baseline,
        };
        info!(
            "Camera model: {}x{} fx={:.2} fy={:.2} cx={:.2} cy={:.2} b={:.4}",
            camera.width, camera.height, camera.fx, camera.fy, camera.cx, camera.cy, camera.baseline
        );
        camera
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn fx(&self) -> f64 { self.fx }
    pub fn fy(&self) -> f64 { self.fy }
    pub fn cx(&self) -> f64 { self.cx }
    pub fn cy(&self) -> f64 { self.cy }
    pub fn baseline(&self) -> f64 { self.baseline }

    /// Baseline times fx, the disparity-to-depth constant.
    pub fn bf(&self) -> f64 {
        self.baseline * self.fx
    }

    pub fn project(&self, point: &Point3<f64>) -> (f64, f64) {
        (
            self.fx * point.x / point.z + self.cx,
            self.fy * point.y / point.z + self.cy,
        )
    }

    /// Back-project a pixel with known disparity into the left camera frame.
    pub fn unproject_stereo(&self, u: f64, v: f64, disparity: f64) -> Option<Vector3<f64>> {
        if disparity <= 0.0 {
            return None;
        }
        let z = self.bf() / disparity;
        Some(Vector3::new(
            (u - self.cx) * z / self.fx,
            (v - self.cy) * z / self.fy,
            z,
        ))
    }
}
