use crate::bounds::BoundingBox;
use crate::error::{Result, VoronoiError};

/// Block count per axis used when none is given, as in voro++ wrappers.
pub const DEFAULT_BLOCKS: [usize; 3] = [6, 6, 6];
/// Initial particle capacity reserved per bucket.
pub const DEFAULT_BUCKET_CAPACITY: usize = 8;

/// Construction parameters of a [`Container`](crate::Container).
///
/// The block counts only tune performance: any positive values produce the
/// same cells. Aim for roughly 5 to 10 particles per block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContainerConfig {
    /// The domain in which particles live.
    pub bounds: BoundingBox,
    /// Number of grid blocks along x, y and z.
    pub blocks: [usize; 3],
    /// Wrap-around per axis. Off by default.
    pub periodic: [bool; 3],
    /// Particles reserved per bucket on construction.
    pub bucket_capacity: usize,
}

impl ContainerConfig {
    pub fn new(bounds: BoundingBox) -> Self {
        Self { bounds, ..Self::default() }
    }

    pub fn with_blocks(mut self, nx: usize, ny: usize, nz: usize) -> Self {
        self.blocks = [nx, ny, nz];
        self
    }

    pub fn with_periodic(mut self, x: bool, y: bool, z: bool) -> Self {
        self.periodic = [x, y, z];
        self
    }

    pub fn with_bucket_capacity(mut self, capacity: usize) -> Self {
        self.bucket_capacity = capacity;
        self
    }

    /// Picks block counts so that `expected_particles` spread to about
    /// `per_block` particles per block, keeping blocks roughly cubic.
    pub fn with_blocks_for(mut self, expected_particles: usize, per_block: f64) -> Self {
        let [w, h, d] = self.bounds.size();
        let volume = w * h * d;
        if expected_particles == 0 || !(volume > 0.0) || !(per_block > 0.0) {
            return self;
        }
        let side = (volume * per_block / expected_particles as f64).cbrt();
        self.blocks = [
            ((w / side).round() as usize).max(1),
            ((h / side).round() as usize).max(1),
            ((d / side).round() as usize).max(1),
        ];
        self
    }

    /// Fails on inverted bounds or zero block counts.
    pub fn validate(&self) -> Result<()> {
        self.bounds.validate()?;
        if self.blocks.iter().any(|&n| n == 0) {
            return Err(VoronoiError::InvalidBlockCount { blocks: self.blocks });
        }
        Ok(())
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            bounds: BoundingBox::default(),
            blocks: DEFAULT_BLOCKS,
            periodic: [false; 3],
            bucket_capacity: DEFAULT_BUCKET_CAPACITY,
        }
    }
}
