use crate::cell::ConvexCell;
use std::collections::BTreeSet;

/// Mesh of one finished cell in world coordinates.
///
/// `neighbors[i]` is the label of `faces[i]`: a particle id, a box id
/// (`-1..=-6`) or a wall id (`<= -10`). Face loops run counter-clockwise
/// seen from outside the cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedCell {
    pub id: i32,
    pub position: [f64; 3],
    pub volume: f64,
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<Vec<usize>>,
    /// Unique undirected edges as sorted `[low, high]` index pairs.
    pub edges: Vec<[usize; 2]>,
    pub neighbors: Vec<i32>,
}

impl ExtractedCell {
    /// Walks the adjacency graph of `cell` and emits its mesh.
    pub fn from_cell(cell: &ConvexCell, id: i32, position: [f64; 3]) -> Self {
        let vertices = (0..cell.vertex_count())
            .map(|i| {
                let v = cell.vertex(i);
                [v[0] + position[0], v[1] + position[1], v[2] + position[2]]
            })
            .collect();

        let mut faces = Vec::with_capacity(cell.face_count());
        let mut neighbors = Vec::with_capacity(cell.face_count());
        let mut edges = BTreeSet::new();
        for (label, face) in cell.face_loops() {
            for (j, &a) in face.iter().enumerate() {
                let b = face[(j + 1) % face.len()];
                edges.insert([a.min(b), a.max(b)]);
            }
            neighbors.push(label);
            faces.push(face);
        }

        Self {
            id,
            position,
            volume: cell.volume(),
            vertices,
            faces,
            edges: edges.into_iter().collect(),
            neighbors,
        }
    }

    /// The value returned for lookups that match no particle.
    pub fn sentinel() -> Self {
        Self::default()
    }

    /// An emptied cell that keeps its particle's identity.
    pub fn degenerate(id: i32, position: [f64; 3]) -> Self {
        Self { id, position, ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Area of face `index`.
    pub fn face_area(&self, index: usize) -> f64 {
        let face = &self.faces[index];
        if face.len() < 3 {
            return 0.0;
        }
        let v0 = self.vertices[face[0]];
        let mut sum = [0.0; 3];
        for i in 1..face.len() - 1 {
            let v1 = self.vertices[face[i]];
            let v2 = self.vertices[face[i + 1]];
            let a = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let b = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
            sum[0] += a[1] * b[2] - a[2] * b[1];
            sum[1] += a[2] * b[0] - a[0] * b[2];
            sum[2] += a[0] * b[1] - a[1] * b[0];
        }
        0.5 * (sum[0] * sum[0] + sum[1] * sum[1] + sum[2] * sum[2]).sqrt()
    }

    pub fn surface_area(&self) -> f64 {
        (0..self.faces.len()).map(|i| self.face_area(i)).sum()
    }
}
