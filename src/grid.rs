use crate::bounds::BoundingBox;
use crate::error::{Result, VoronoiError};
use log::debug;

/// A seed point with its caller-assigned id.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub id: i32,
    pub position: [f64; 3],
}

/// Location of a stored particle: bucket index and slot inside the bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParticleRef {
    pub bucket: usize,
    pub index: usize,
}

/// A uniform bucket grid over the domain that owns the particles.
///
/// Buckets are addressed by `ix + iy * nx + iz * nx * ny`. Neighbor search
/// walks cubic shells of blocks around the query block in increasing
/// Chebyshev distance, so closer candidates are generally seen first.
#[derive(Clone, Debug)]
pub struct GridIndex {
    bounds: BoundingBox,
    /// Number of blocks along x, y and z.
    blocks: [usize; 3],
    periodic: [bool; 3],
    /// Side length of one block per axis.
    block_size: [f64; 3],
    /// Scale factor from coordinate to block index.
    grid_scale: [f64; 3],
    buckets: Vec<Vec<Particle>>,
    count: usize,
}

impl GridIndex {
    pub fn new(bounds: BoundingBox, blocks: [usize; 3], periodic: [bool; 3], bucket_capacity: usize) -> Result<Self> {
        bounds.validate()?;
        if blocks.iter().any(|&n| n == 0) {
            return Err(VoronoiError::InvalidBlockCount { blocks });
        }

        let size = bounds.size();
        let block_size = [
            size[0] / blocks[0] as f64,
            size[1] / blocks[1] as f64,
            size[2] / blocks[2] as f64,
        ];
        let grid_scale = [1.0 / block_size[0], 1.0 / block_size[1], 1.0 / block_size[2]];
        let total = blocks[0] * blocks[1] * blocks[2];

        Ok(Self {
            bounds,
            blocks,
            periodic,
            block_size,
            grid_scale,
            buckets: (0..total).map(|_| Vec::with_capacity(bucket_capacity)).collect(),
            count: 0,
        })
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn blocks(&self) -> [usize; 3] {
        self.blocks
    }

    pub fn periodic(&self) -> [bool; 3] {
        self.periodic
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Stores a particle in the bucket containing its position.
    ///
    /// Periodic axes wrap the coordinate into the domain. On other axes a
    /// position outside the domain is kept as given and filed under the
    /// nearest edge bucket.
    pub fn insert(&mut self, id: i32, position: [f64; 3]) -> ParticleRef {
        let mut position = position;
        for axis in 0..3 {
            if self.periodic[axis] {
                let min = self.bounds.min[axis];
                let length = self.bounds.max[axis] - min;
                position[axis] = min + (position[axis] - min).rem_euclid(length);
            }
        }
        if !self.bounds.contains(&position) {
            debug!("particle {} at {:?} lies outside the domain, clamped to an edge block", id, position);
        }

        let bucket = self.bucket_index(self.block_of(&position));
        self.buckets[bucket].push(Particle { id, position });
        self.count += 1;
        ParticleRef { bucket, index: self.buckets[bucket].len() - 1 }
    }

    /// Removes every particle. Bucket allocations and geometry are kept.
    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(|bucket| bucket.clear());
        self.count = 0;
    }

    pub fn get(&self, particle: ParticleRef) -> Option<&Particle> {
        self.buckets.get(particle.bucket)?.get(particle.index)
    }

    pub fn bucket(&self, bucket: usize) -> &[Particle] {
        &self.buckets[bucket]
    }

    /// All particles in bucket order, insertion order within a bucket.
    pub fn particles(&self) -> impl Iterator<Item = (ParticleRef, &Particle)> + '_ {
        self.buckets.iter().enumerate().flat_map(|(bucket, particles)| {
            particles
                .iter()
                .enumerate()
                .map(move |(index, particle)| (ParticleRef { bucket, index }, particle))
        })
    }

    /// First particle with the given id, in bucket order.
    pub fn find(&self, id: i32) -> Option<ParticleRef> {
        self.particles().find(|(_, p)| p.id == id).map(|(r, _)| r)
    }

    /// Block coordinates containing `position`, clamped to the grid.
    pub fn block_of(&self, position: &[f64; 3]) -> [usize; 3] {
        let mut block = [0; 3];
        for axis in 0..3 {
            let limit = (self.blocks[axis] - 1) as f64;
            let scaled = ((position[axis] - self.bounds.min[axis]) * self.grid_scale[axis]).floor();
            block[axis] = scaled.clamp(0.0, limit) as usize;
        }
        block
    }

    /// Calculates the linear index of the bucket at the given block coordinates.
    pub fn bucket_index(&self, block: [usize; 3]) -> usize {
        block[0] + block[1] * self.blocks[0] + block[2] * self.blocks[0] * self.blocks[1]
    }

    /// Calls `f(bucket, shift)` for every block at Chebyshev distance exactly
    /// `radius` from `center`, z-major then y then x.
    ///
    /// On periodic axes block coordinates wrap and `shift` is the offset to
    /// add to particle positions in that bucket to get the image seen from
    /// `center`. Blocks beyond a non-periodic edge are skipped.
    pub fn for_each_in_block_shell<F>(&self, center: [usize; 3], radius: usize, mut f: F)
    where
        F: FnMut(usize, [f64; 3]),
    {
        let r = radius as isize;
        for dz in -r..=r {
            for dy in -r..=r {
                if dz.abs() == r || dy.abs() == r {
                    for dx in -r..=r {
                        self.visit_block(center, [dx, dy, dz], &mut f);
                    }
                } else {
                    self.visit_block(center, [-r, dy, dz], &mut f);
                    self.visit_block(center, [r, dy, dz], &mut f);
                }
            }
        }
    }

    /// Lower bound of the squared distance from `position` to any block of
    /// the shell at `radius` around `center`.
    ///
    /// Blocks within `radius - 1` fill a box around `center`; every shell
    /// block lies outside it, so the distance to the box boundary bounds
    /// them all.
    pub fn shell_lower_bound_sq(&self, position: &[f64; 3], center: [usize; 3], radius: usize) -> f64 {
        if radius == 0 {
            return 0.0;
        }
        let inner = radius as f64 - 1.0;
        let mut gap = f64::INFINITY;
        for axis in 0..3 {
            let lo = self.bounds.min[axis] + (center[axis] as f64 - inner) * self.block_size[axis];
            let hi = self.bounds.min[axis] + (center[axis] as f64 + inner + 1.0) * self.block_size[axis];
            gap = gap.min(position[axis] - lo).min(hi - position[axis]);
        }
        let gap = gap.max(0.0);
        gap * gap
    }

    /// True when the shell at `radius` and every later one hold no blocks.
    pub fn shell_exhausted(&self, center: [usize; 3], radius: usize) -> bool {
        (0..3).all(|axis| {
            !self.periodic[axis] && radius > center[axis].max(self.blocks[axis] - 1 - center[axis])
        })
    }

    /// Squared distance from `position` to a block shifted by `shift`.
    pub fn block_min_dist_sq(&self, position: &[f64; 3], bucket: usize, shift: [f64; 3]) -> f64 {
        let nx = self.blocks[0];
        let nxy = nx * self.blocks[1];
        let block = [bucket % nx, (bucket % nxy) / nx, bucket / nxy];

        let mut dist_sq = 0.0;
        for axis in 0..3 {
            let lo = self.bounds.min[axis] + block[axis] as f64 * self.block_size[axis] + shift[axis];
            let hi = lo + self.block_size[axis];
            let d = if position[axis] < lo {
                lo - position[axis]
            } else if position[axis] > hi {
                position[axis] - hi
            } else {
                0.0
            };
            dist_sq += d * d;
        }
        dist_sq
    }

    /// Visits candidate neighbors of `position` shell by shell.
    ///
    /// `visitor(particle, image_position, max_dist_sq)` returns the updated
    /// `max_dist_sq`: the squared radius of the cell being built. A neighbor
    /// farther than twice that radius cannot cut the cell, so blocks beyond
    /// it are skipped and the walk stops once a whole shell is out of reach.
    /// `origin` is skipped unless seen through a periodic image.
    pub fn visit_neighbors<F>(&self, origin: Option<ParticleRef>, position: [f64; 3], max_dist_sq: &mut f64, mut visitor: F)
    where
        F: FnMut(&Particle, [f64; 3], f64) -> f64,
    {
        let center = self.block_of(&position);
        let mut radius = 0;

        loop {
            if self.shell_exhausted(center, radius) {
                break;
            }
            if self.shell_lower_bound_sq(&position, center, radius) > 4.0 * *max_dist_sq {
                break;
            }

            self.for_each_in_block_shell(center, radius, |bucket, shift| {
                if self.block_min_dist_sq(&position, bucket, shift) > 4.0 * *max_dist_sq {
                    return;
                }
                let unshifted = shift == [0.0; 3];
                for (index, particle) in self.buckets[bucket].iter().enumerate() {
                    if unshifted && origin == Some(ParticleRef { bucket, index }) {
                        continue;
                    }
                    let image = [
                        particle.position[0] + shift[0],
                        particle.position[1] + shift[1],
                        particle.position[2] + shift[2],
                    ];
                    *max_dist_sq = visitor(particle, image, *max_dist_sq);
                }
            });

            radius += 1;
        }
    }

    fn visit_block<F>(&self, center: [usize; 3], offset: [isize; 3], f: &mut F)
    where
        F: FnMut(usize, [f64; 3]),
    {
        let mut block = [0; 3];
        let mut shift = [0.0; 3];
        for axis in 0..3 {
            let n = self.blocks[axis] as isize;
            let b = center[axis] as isize + offset[axis];
            if self.periodic[axis] {
                block[axis] = b.rem_euclid(n) as usize;
                shift[axis] = b.div_euclid(n) as f64 * (self.bounds.max[axis] - self.bounds.min[axis]);
            } else if b >= 0 && b < n {
                block[axis] = b as usize;
            } else {
                return;
            }
        }
        f(self.bucket_index(block), shift);
    }
}
