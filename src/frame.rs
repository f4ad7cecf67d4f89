/// *** Image and frame containers shared between the acquisition and processing threads. *** //

use nalgebra::Matrix3;

/// Grayscale image with a fixed-size backing buffer.
/// The buffer is allocated once and refilled in place each cycle, so the
/// grab loop never touches the heap.
#[derive(Debug, Clone)]
pub struct Image {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Image {
    pub fn new(width: u32, height: u32) -> Image {
        Image {
            width,
            height,
            data: vec![0u8; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Overwrite the pixel data in place. `pixels` must match the allocated
    /// dimensions exactly; a grabber delivering the wrong resolution is a
    /// driver fault, not something to resize around.
    pub fn fill_from(&mut self, pixels: &[u8]) -> Result<(), ImageSizeMismatch> {
        if pixels.len() != self.data.len() {
            return Err(ImageSizeMismatch {
                expected: self.data.len(),
                got: pixels.len(),
            });
        }
        self.data.copy_from_slice(pixels);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSizeMismatch {
    pub expected: usize,
    pub got: usize,
}

impl std::fmt::Display for ImageSizeMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "image buffer size mismatch: expected {} bytes, got {}", self.expected, self.got)
    }
}
impl std::error::Error for ImageSizeMismatch {}

/// The single buffered unit exchanged through the handoff: one synchronized
/// left/right capture plus its position in the acquisition order.
#[derive(Debug)]
pub struct StereoFrame {
    pub left: Image,
    pub right: Image,
    pub index: u64,
}

impl StereoFrame {
    pub fn new(width: u32, height: u32) -> StereoFrame {
        StereoFrame {
            left: Image::new(width, height),
            right: Image::new(width, height),
            index: 0,
        }
    }
}

/// Stereo rig calibration as reported by the grabber: pinhole intrinsics
/// plus the baseline between the two cameras. Retrieved once during
/// bootstrap, immutable afterwards.
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    pub intrinsics: Matrix3<f64>,
    pub baseline: f64,
}

impl Calibration {
    pub fn new(intrinsics: Matrix3<f64>, baseline: f64) -> Calibration {
        Calibration { intrinsics, baseline }
    }

    pub fn from_parts(fx: f64, fy: f64, cx: f64, cy: f64, baseline: f64) -> Calibration {
        let intrinsics = Matrix3::new(
            fx, 0.0, cx,
            0.0, fy, cy,
            0.0, 0.0, 1.0,
        );
        Calibration { intrinsics, baseline }
    }

    pub fn fx(&self) -> f64 { self.intrinsics[(0, 0)] }
    pub fn fy(&self) -> f64 { self.intrinsics[(1, 1)] }
    pub fn cx(&self) -> f64 { self.intrinsics[(0, 2)] }
    pub fn cy(&self) -> f64 { self.intrinsics[(1, 2)] }
}
