use crate::bounds::BoundingBox;
use crate::cell::{CellScratch, ConvexCell, CutOutcome};
use crate::config::ContainerConfig;
use crate::error::{Result, VoronoiError};
use crate::extract::ExtractedCell;
use crate::grid::{GridIndex, Particle, ParticleRef};
use crate::wall::{Wall, WallRegistry};
use log::{debug, trace, warn};
use rand::prelude::*;
use rand::rngs::StdRng;

/// A Voronoi container: particles in a bucket grid plus the walls that bound
/// their cells.
///
/// Cells are computed on demand and never cached, so every query reflects
/// the current particles and walls.
#[derive(Debug)]
pub struct Container {
    config: ContainerConfig,
    grid: GridIndex,
    walls: WallRegistry,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Result<Self> {
        config.validate()?;
        let grid = GridIndex::new(config.bounds, config.blocks, config.periodic, config.bucket_capacity)?;
        debug!(
            "created container over {:?}..{:?} with {:?} blocks, periodic {:?}",
            config.bounds.min, config.bounds.max, config.blocks, config.periodic
        );
        Ok(Self { config, grid, walls: WallRegistry::new() })
    }

    /// Container over `bounds` with the default grid and no periodicity.
    pub fn from_bounds(bounds: BoundingBox) -> Result<Self> {
        Self::new(ContainerConfig::new(bounds))
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    pub fn add_point(&mut self, id: i32, x: f64, y: f64, z: f64) -> ParticleRef {
        self.grid.insert(id, [x, y, z])
    }

    /// Inserts a batch from parallel sequences. Nothing is inserted unless
    /// all four have the same length.
    pub fn add_points(&mut self, ids: &[i32], xs: &[f64], ys: &[f64], zs: &[f64]) -> Result<()> {
        let n = ids.len();
        if xs.len() != n || ys.len() != n || zs.len() != n {
            return Err(VoronoiError::BatchLengthMismatch { ids: n, xs: xs.len(), ys: ys.len(), zs: zs.len() });
        }
        for i in 0..n {
            self.grid.insert(ids[i], [xs[i], ys[i], zs[i]]);
        }
        Ok(())
    }

    /// Registers a wall and returns the label its faces will carry.
    pub fn add_wall(&mut self, wall: Wall) -> Result<i32> {
        self.walls.push(wall)
    }

    pub fn clear_walls(&mut self) {
        self.walls.clear();
    }

    pub fn walls(&self) -> &WallRegistry {
        &self.walls
    }

    /// Removes all particles. Walls stay registered.
    pub fn clear(&mut self) {
        debug!("clearing {} particles", self.grid.len());
        self.grid.clear();
    }

    pub fn particle_count(&self) -> usize {
        self.grid.len()
    }

    pub fn particles(&self) -> impl Iterator<Item = (ParticleRef, &Particle)> + '_ {
        self.grid.particles()
    }

    /// True when the point lies in the domain (on non-periodic axes) and
    /// inside every wall.
    pub fn point_inside(&self, x: f64, y: f64, z: f64) -> bool {
        let point = [x, y, z];
        let bounds = self.grid.bounds();
        let periodic = self.grid.periodic();
        let in_domain = (0..3).all(|axis| periodic[axis] || (point[axis] >= bounds.min[axis] && point[axis] <= bounds.max[axis]));
        in_domain && self.walls.point_inside(&point)
    }

    /// Computes the cell of a stored particle. `None` for a stale reference.
    pub fn compute_cell(&self, particle: ParticleRef) -> Option<ConvexCell> {
        let p = *self.grid.get(particle)?;
        let mut cell = ConvexCell::default();
        let mut scratch = CellScratch::default();
        self.build_cell(particle, &p, &mut cell, &mut scratch);
        Some(cell)
    }

    /// Calls `f` with every particle and its cell, in bucket order.
    pub fn for_each_cell<F>(&self, mut f: F)
    where
        F: FnMut(&Particle, &ConvexCell),
    {
        let mut cell = ConvexCell::default();
        let mut scratch = CellScratch::default();
        for (origin, particle) in self.grid.particles() {
            self.build_cell(origin, particle, &mut cell, &mut scratch);
            f(particle, &cell);
        }
    }

    pub fn map_cells<T, F>(&self, mut f: F) -> Vec<T>
    where
        F: FnMut(&Particle, &ConvexCell) -> T,
    {
        let mut out = Vec::with_capacity(self.grid.len());
        self.for_each_cell(|particle, cell| out.push(f(particle, cell)));
        out
    }

    /// Meshes of all cells in bucket order. Emptied cells are included with
    /// no vertices so callers can detect them.
    pub fn all_cells(&self) -> Vec<ExtractedCell> {
        self.map_cells(extract)
    }

    /// The cell of the first particle with `id`, or the sentinel cell
    /// (id 0, volume 0, no geometry) when no particle matches.
    pub fn cell_by_id(&self, id: i32) -> ExtractedCell {
        self.try_cell_by_id(id).unwrap_or_else(ExtractedCell::sentinel)
    }

    /// Like [`cell_by_id`](Self::cell_by_id) but reports a miss as `None`.
    pub fn try_cell_by_id(&self, id: i32) -> Option<ExtractedCell> {
        let origin = self.grid.find(id)?;
        let particle = *self.grid.get(origin)?;
        let mut cell = ConvexCell::default();
        let mut scratch = CellScratch::default();
        self.build_cell(origin, &particle, &mut cell, &mut scratch);
        Some(extract(&particle, &cell))
    }

    /// Inserts up to `count` uniformly random particles that satisfy
    /// [`point_inside`](Self::point_inside). Ids continue from the largest
    /// id already present, so they never collide with caller ids. Returns
    /// how many were added.
    pub fn add_random_points(&mut self, count: usize, seed: u64) -> usize {
        let mut rng = StdRng::seed_from_u64(seed);
        let bounds = self.config.bounds;
        let [w, h, d] = bounds.size();
        let first_id = self.grid.particles().map(|(_, p)| p.id).max().map_or(0, |id| id.saturating_add(1).max(0));

        let mut found = 0;
        let max_attempts = count.saturating_mul(1000);
        let mut attempts = 0;

        while found < count && attempts < max_attempts {
            attempts += 1;
            let x = bounds.min[0] + rng.r#gen::<f64>() * w;
            let y = bounds.min[1] + rng.r#gen::<f64>() * h;
            let z = bounds.min[2] + rng.r#gen::<f64>() * d;

            if self.point_inside(x, y, z) {
                self.grid.insert(first_id.saturating_add(found as i32), [x, y, z]);
                found += 1;
            }
        }
        if found < count {
            warn!("placed {} of {} random particles after {} attempts", found, count, attempts);
        }
        found
    }

    fn build_cell(&self, origin: ParticleRef, particle: &Particle, cell: &mut ConvexCell, scratch: &mut CellScratch) {
        let p = particle.position;
        let bounds = self.grid.bounds();
        let periodic = self.grid.periodic();

        let mut lo = [0.0; 3];
        let mut hi = [0.0; 3];
        for axis in 0..3 {
            if periodic[axis] {
                let half = 0.5 * (bounds.max[axis] - bounds.min[axis]);
                lo[axis] = -half;
                hi[axis] = half;
            } else {
                lo[axis] = bounds.min[axis] - p[axis];
                hi[axis] = bounds.max[axis] - p[axis];
            }
        }
        cell.init(lo[0], hi[0], lo[1], hi[1], lo[2], hi[2]);

        // 1. Clip against walls
        if self.walls.apply(cell, &p, scratch) == CutOutcome::Emptied {
            trace!("cell {} emptied by walls", particle.id);
            return;
        }

        // 2. Clip against neighbors found by the grid
        let mut current_max_dist_sq = cell.max_radius_sq();
        self.grid.visit_neighbors(Some(origin), p, &mut current_max_dist_sq, |other, image, cur_dist| {
            let dx = image[0] - p[0];
            let dy = image[1] - p[1];
            let dz = image[2] - p[2];

            let dist_sq = dx * dx + dy * dy + dz * dz;
            if dist_sq == 0.0 {
                trace!("particle {} coincides with {}, skipping", other.id, particle.id);
                return cur_dist;
            }
            if dist_sq > 4.0 * cur_dist {
                return cur_dist;
            }

            match cell.plane_with_scratch([dx, dy, dz], 0.5 * dist_sq, dist_sq, other.id, scratch) {
                Ok(CutOutcome::Cut) => cell.max_radius_sq(),
                Ok(CutOutcome::Emptied) => 0.0,
                Ok(CutOutcome::Unchanged) => cur_dist,
                Err(e) => {
                    warn!("bisector of {} and {} rejected: {}", particle.id, other.id, e);
                    cur_dist
                }
            }
        });

        trace!("cell {} computed: {} vertices, volume {}", particle.id, cell.vertex_count(), cell.volume());
    }
}

fn extract(particle: &Particle, cell: &ConvexCell) -> ExtractedCell {
    if cell.is_empty() {
        ExtractedCell::degenerate(particle.id, particle.position)
    } else {
        ExtractedCell::from_cell(cell, particle.id, particle.position)
    }
}
