use crate::error::{Result, VoronoiError};

/// Bounding box ID for the x-min face, it is negative to prevent conflicts with particle IDs.
pub const BOX_ID_LEFT: i32 = -1;
/// Bounding box ID for the x-max face.
pub const BOX_ID_RIGHT: i32 = -2;
/// Bounding box ID for the y-min face.
pub const BOX_ID_FRONT: i32 = -3;
/// Bounding box ID for the y-max face.
pub const BOX_ID_BACK: i32 = -4;
/// Bounding box ID for the z-min face.
pub const BOX_ID_BOTTOM: i32 = -5;
/// Bounding box ID for the z-max face.
pub const BOX_ID_TOP: i32 = -6;

/// Axis-aligned bounding box of the tessellation domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// Checks that every axis is finite and strictly increasing.
    pub fn validate(&self) -> Result<()> {
        for axis in 0..3 {
            let (min, max) = (self.min[axis], self.max[axis]);
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(VoronoiError::InvalidBounds { axis, min, max });
            }
        }
        Ok(())
    }

    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn volume(&self) -> f64 {
        let [w, h, d] = self.size();
        w * h * d
    }

    pub fn contains(&self, point: &[f64; 3]) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new([0.0; 3], [1.0; 3])
    }
}
