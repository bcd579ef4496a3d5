//! One step of Lloyd's algorithm: move every particle to its cell centroid.

use crate::container::Container;
use log::warn;
use std::collections::BTreeMap;

impl Container {
    /// Centroids of all cells, indexed by particle id.
    ///
    /// The output has `max id + 1` entries; ids with no particle stay at
    /// `[0, 0, 0]`. Negative ids cannot be indexed and are skipped. A cell
    /// emptied by walls keeps its particle's current position. Particles are
    /// not moved: feed the result back through a fresh container to iterate.
    pub fn relax(&self) -> Vec<[f64; 3]> {
        let size = self
            .particles()
            .map(|(_, p)| p.id)
            .filter(|&id| id >= 0)
            .max()
            .map_or(0, |id| id as usize + 1);
        let mut positions = vec![[0.0; 3]; size];

        self.for_each_cell(|particle, cell| {
            if particle.id < 0 {
                warn!("particle id {} is negative and has no slot in the relaxed array", particle.id);
                return;
            }
            positions[particle.id as usize] = next_position(particle.position, cell);
        });
        positions
    }

    /// Same step as [`relax`](Self::relax), keyed by id. Suits sparse or
    /// negative ids. With duplicate ids the last cell in bucket order wins.
    pub fn relax_by_id(&self) -> BTreeMap<i32, [f64; 3]> {
        let mut positions = BTreeMap::new();
        self.for_each_cell(|particle, cell| {
            positions.insert(particle.id, next_position(particle.position, cell));
        });
        positions
    }
}

fn next_position(position: [f64; 3], cell: &crate::cell::ConvexCell) -> [f64; 3] {
    if cell.is_empty() {
        return position;
    }
    let c = cell.centroid();
    [position[0] + c[0], position[1] + c[1], position[2] + c[2]]
}
