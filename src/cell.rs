use crate::bounds::{BOX_ID_BACK, BOX_ID_BOTTOM, BOX_ID_FRONT, BOX_ID_LEFT, BOX_ID_RIGHT, BOX_ID_TOP};
use crate::error::{Result, VoronoiError};
use std::collections::HashMap;

/// Relative tolerance for classifying a vertex as lying on a cutting plane.
const PLANE_TOLERANCE: f64 = 1e-11;
/// Relative volume below which a clipped cell counts as collapsed.
const VOLUME_TOLERANCE: f64 = 1e-12;

/// Face loops of the unit box, counter-clockwise seen from outside.
const BOX_FACES: [(i32, [usize; 4]); 6] = [
    (BOX_ID_BOTTOM, [3, 2, 1, 0]),
    (BOX_ID_TOP, [4, 5, 6, 7]),
    (BOX_ID_FRONT, [0, 1, 5, 4]),
    (BOX_ID_BACK, [2, 3, 7, 6]),
    (BOX_ID_LEFT, [0, 4, 7, 3]),
    (BOX_ID_RIGHT, [1, 2, 6, 5]),
];

/// Result of clipping a cell by a half-space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CutOutcome {
    /// Every vertex was inside; the cell is untouched.
    Unchanged,
    /// The plane removed part of the cell.
    Cut,
    /// The plane removed all remaining volume.
    Emptied,
}

/// Flat storage of labelled face loops.
#[derive(Default, Clone, Debug)]
struct FaceLoops {
    labels: Vec<i32>,
    counts: Vec<usize>,
    indices: Vec<usize>,
}

impl FaceLoops {
    fn clear(&mut self) {
        self.labels.clear();
        self.counts.clear();
        self.indices.clear();
    }

    fn push(&mut self, label: i32, face: &[usize]) {
        self.labels.push(label);
        self.counts.push(face.len());
        self.indices.extend_from_slice(face);
    }

    fn iter(&self) -> impl Iterator<Item = (i32, &[usize])> + '_ {
        let mut offset = 0;
        self.labels.iter().zip(&self.counts).map(move |(&label, &count)| {
            let face = &self.indices[offset..offset + count];
            offset += count;
            (label, face)
        })
    }
}

/// Scratch buffer to reuse allocations during clipping.
#[derive(Default, Clone, Debug)]
pub struct CellScratch {
    dists: Vec<f64>,
    faces: FaceLoops,
    clipped: FaceLoops,
    positions: Vec<f64>,
    compact: Vec<f64>,
    crossings: HashMap<(usize, usize), usize>,
    // (exit?, vertex) in face-walk order
    events: Vec<(bool, usize)>,
    // directed edges of the new face
    segments: Vec<(usize, usize)>,
    lid: Vec<usize>,
    remap: Vec<usize>,
    // per vertex: (to, face slot, previous vertex on that face)
    corners: Vec<Vec<(usize, usize, usize)>>,
}

/// A convex polyhedron stored as a vertex-adjacency graph.
///
/// Vertices live in an arena and are addressed by index. Coordinates are
/// relative to the cell origin, which the tessellation places at the
/// particle. For every vertex the outgoing edges are kept in order, and each
/// edge knows the face slot on its left, so that walking "next edge with the
/// same face" traces a face loop counter-clockwise seen from outside.
#[derive(Clone, Debug, Default)]
pub struct ConvexCell {
    // Flat array of vertices [x, y, z, x, y, z, ...]
    vertices: Vec<f64>,
    // Edges for vertex i are at edge_buffer[vertex_offsets[i] .. vertex_offsets[i] + vertex_counts[i]]
    edge_buffer: Vec<usize>,
    // face_buffer[k] is the face slot to the left of the edge at edge_buffer[k]
    face_buffer: Vec<usize>,
    vertex_offsets: Vec<usize>,
    vertex_counts: Vec<usize>,
    // Label of every face slot: a particle id, a box id or a wall id.
    face_labels: Vec<i32>,
    volume: f64,
    max_radius_sq: f64,
}

impl ConvexCell {
    /// Creates an axis-aligned box cell spanning `min` to `max`.
    pub fn new_box(min: [f64; 3], max: [f64; 3]) -> Self {
        let mut cell = Self::default();
        cell.init(min[0], max[0], min[1], max[1], min[2], max[2]);
        cell
    }

    /// Resets the cell to an axis-aligned box. Faces carry the box ids.
    pub fn init(&mut self, xmin: f64, xmax: f64, ymin: f64, ymax: f64, zmin: f64, zmax: f64) {
        self.vertices.clear();
        self.vertices.extend_from_slice(&[
            xmin, ymin, zmin, // 0
            xmax, ymin, zmin, // 1
            xmax, ymax, zmin, // 2
            xmin, ymax, zmin, // 3
            xmin, ymin, zmax, // 4
            xmax, ymin, zmax, // 5
            xmax, ymax, zmax, // 6
            xmin, ymax, zmax, // 7
        ]);

        let mut faces = FaceLoops::default();
        for (label, face) in BOX_FACES.iter() {
            faces.push(*label, face);
        }
        let mut corners = Vec::new();
        self.rebuild(8, &faces, &mut corners);
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_counts.len()
    }

    pub fn face_count(&self) -> usize {
        self.face_labels.len()
    }

    /// Position of vertex `index` relative to the cell origin.
    pub fn vertex(&self, index: usize) -> [f64; 3] {
        [
            self.vertices[index * 3],
            self.vertices[index * 3 + 1],
            self.vertices[index * 3 + 2],
        ]
    }

    /// Ordered neighbor indices of vertex `index`.
    pub fn edges(&self, index: usize) -> &[usize] {
        let start = self.vertex_offsets[index];
        &self.edge_buffer[start..start + self.vertex_counts[index]]
    }

    /// Volume of the cell, refreshed after every cut.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Squared distance from the origin to the furthest vertex.
    pub fn max_radius_sq(&self) -> f64 {
        self.max_radius_sq
    }

    /// Labelled face loops in traversal order.
    ///
    /// Faces are visited exactly once, in the order their first edge is met
    /// while scanning vertices by index, so the output is stable for a given
    /// cell state.
    pub fn face_loops(&self) -> Vec<(i32, Vec<usize>)> {
        let mut faces = FaceLoops::default();
        self.collect_faces(&mut faces);
        faces.iter().map(|(label, face)| (label, face.to_vec())).collect()
    }

    /// Centroid relative to the cell origin, from the divergence theorem.
    pub fn centroid(&self) -> [f64; 3] {
        let mut faces = FaceLoops::default();
        self.collect_faces(&mut faces);

        let mut centroid_x: f64 = 0.0;
        let mut centroid_y: f64 = 0.0;
        let mut centroid_z: f64 = 0.0;
        let mut total_volume: f64 = 0.0;

        for (_, face) in faces.iter() {
            let v0 = self.vertex(face[0]);
            for i in 1..face.len().saturating_sub(1) {
                let v1 = self.vertex(face[i]);
                let v2 = self.vertex(face[i + 1]);

                let det = dot(v0, cross(v1, v2));
                total_volume += det;

                centroid_x += det * (v0[0] + v1[0] + v2[0]);
                centroid_y += det * (v0[1] + v1[1] + v2[1]);
                centroid_z += det * (v0[2] + v1[2] + v2[2]);
            }
        }

        if total_volume.abs() < 1e-300 {
            return [0.0, 0.0, 0.0];
        }

        let factor = 1.0 / (4.0 * total_volume);
        [centroid_x * factor, centroid_y * factor, centroid_z * factor]
    }

    /// Clips the cell, keeping the half-space `normal · x <= d`.
    ///
    /// The new face is labelled `face_id`.
    pub fn plane(&mut self, normal: [f64; 3], d: f64, face_id: i32) -> Result<CutOutcome> {
        let rsq = dot(normal, normal);
        self.plane_rsq(normal, d, rsq, face_id)
    }

    /// Same as [`plane`](Self::plane) with a precomputed `|normal|²`.
    pub fn plane_rsq(&mut self, normal: [f64; 3], d: f64, rsq: f64, face_id: i32) -> Result<CutOutcome> {
        let mut scratch = CellScratch::default();
        self.plane_with_scratch(normal, d, rsq, face_id, &mut scratch)
    }

    pub fn plane_with_scratch(
        &mut self,
        normal: [f64; 3],
        d: f64,
        rsq: f64,
        face_id: i32,
        scratch: &mut CellScratch,
    ) -> Result<CutOutcome> {
        if !(rsq > 0.0) || !rsq.is_finite() || !d.is_finite() || normal.iter().any(|c| !c.is_finite()) {
            return Err(VoronoiError::DegenerateNormal { normal });
        }
        if self.is_empty() {
            return Ok(CutOutcome::Unchanged);
        }

        let CellScratch {
            dists,
            faces,
            clipped,
            positions,
            compact,
            crossings,
            events,
            segments,
            lid,
            remap,
            corners,
        } = scratch;

        let num_verts = self.vertex_count();
        let radius = self.max_radius_sq.sqrt();
        let tolerance = PLANE_TOLERANCE * rsq.sqrt() * radius;

        // 1. Classify vertices. Ties count as inside.
        dists.clear();
        let mut outside = 0;
        for i in 0..num_verts {
            let s = dot(self.vertex(i), normal) - d;
            if s > tolerance {
                outside += 1;
            }
            dists.push(s);
        }

        if outside == 0 {
            return Ok(CutOutcome::Unchanged);
        }
        if outside == num_verts {
            self.clear();
            return Ok(CutOutcome::Emptied);
        }
        let dists: &[f64] = dists;

        // 2. Clip every face loop
        self.collect_faces(faces);
        positions.clear();
        positions.extend_from_slice(&self.vertices);
        crossings.clear();
        segments.clear();
        clipped.clear();

        let on_plane = |i: usize, dists: &[f64]| i >= num_verts || dists[i].abs() <= tolerance;

        for (label, face) in faces.iter() {
            let count = face.len();
            let start = clipped.indices.len();
            events.clear();

            for j in 0..count {
                let a = face[j];
                let b = face[(j + 1) % count];
                let a_in = dists[a] <= tolerance;
                let b_in = dists[b] <= tolerance;

                if a_in {
                    push_distinct(&mut clipped.indices, start, a);
                    if !b_in {
                        let x = crossing(a, b, dists, tolerance, &self.vertices, positions, crossings);
                        push_distinct(&mut clipped.indices, start, x);
                        events.push((true, x));
                    }
                } else if b_in {
                    let e = crossing(b, a, dists, tolerance, &self.vertices, positions, crossings);
                    push_distinct(&mut clipped.indices, start, e);
                    events.push((false, e));
                }
            }
            while clipped.indices.len() - start > 1 && clipped.indices[start] == clipped.indices[clipped.indices.len() - 1] {
                clipped.indices.pop();
            }

            let kept = &clipped.indices[start..];
            let degenerate = kept.iter().all(|&i| on_plane(i, dists));

            if degenerate {
                // The face lies in the plane: its edges move to the new face
                // except the closing edges from an exit to its entry.
                for j in 0..kept.len() {
                    let u = kept[j];
                    let v = kept[(j + 1) % kept.len()];
                    if u == v || is_closing_edge(events, u, v) {
                        continue;
                    }
                    segments.push((u, v));
                }
                clipped.indices.truncate(start);
                continue;
            }

            for i in 0..events.len() {
                let (is_exit, x) = events[i];
                if !is_exit {
                    continue;
                }
                for step in 1..=events.len() {
                    let (next_is_exit, e) = events[(i + step) % events.len()];
                    if !next_is_exit {
                        if e != x {
                            segments.push((e, x));
                        }
                        break;
                    }
                }
            }

            if clipped.indices.len() - start >= 3 {
                clipped.labels.push(label);
                clipped.counts.push(clipped.indices.len() - start);
            } else {
                clipped.indices.truncate(start);
            }
        }

        // 3. Reconstruct the new face from the segments
        if segments.len() >= 3 {
            if !chain_segments(segments, lid) {
                sort_around_normal(segments, positions, normal, lid);
            }
            if lid.len() >= 3 {
                clipped.push(face_id, lid);
            }
        }

        // 4. Compact the arena: surviving old vertices first, then new ones
        let total = positions.len() / 3;
        remap.clear();
        remap.resize(total, usize::MAX);
        for &i in &clipped.indices {
            remap[i] = 0;
        }
        compact.clear();
        let mut next = 0;
        for i in 0..total {
            if remap[i] == 0 {
                remap[i] = next;
                next += 1;
                compact.extend_from_slice(&positions[i * 3..i * 3 + 3]);
            }
        }
        for i in clipped.indices.iter_mut() {
            *i = remap[*i];
        }

        std::mem::swap(&mut self.vertices, compact);
        self.rebuild(next, clipped, corners);

        if self.face_count() < 4 || self.volume <= VOLUME_TOLERANCE * radius.powi(3) {
            self.clear();
            return Ok(CutOutcome::Emptied);
        }
        Ok(CutOutcome::Cut)
    }

    /// Checks the adjacency invariants: every edge has its reverse, every
    /// face closes with at least three vertices and Euler's formula holds.
    pub fn is_valid(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        let mut edge_count = 0;
        for u in 0..self.vertex_count() {
            let edges = self.edges(u);
            if edges.len() < 3 {
                return false;
            }
            for &v in edges {
                if v >= self.vertex_count() || !self.edges(v).contains(&u) {
                    return false;
                }
            }
            edge_count += edges.len();
        }
        let faces = self.face_loops();
        if faces.len() != self.face_count() || faces.iter().any(|(_, face)| face.len() < 3) {
            return false;
        }
        let v = self.vertex_count() as i64;
        let e = (edge_count / 2) as i64;
        let f = faces.len() as i64;
        v - e + f == 2
    }

    fn clear(&mut self) {
        self.vertices.clear();
        self.edge_buffer.clear();
        self.face_buffer.clear();
        self.vertex_offsets.clear();
        self.vertex_counts.clear();
        self.face_labels.clear();
        self.volume = 0.0;
        self.max_radius_sq = 0.0;
    }

    /// Finds the edge leaving `vertex` whose left face is `face`.
    fn edge_with_face(&self, vertex: usize, face: usize) -> Option<usize> {
        let start = self.vertex_offsets[vertex];
        let count = self.vertex_counts[vertex];
        (start..start + count)
            .find(|&k| self.face_buffer[k] == face)
            .map(|k| self.edge_buffer[k])
    }

    fn collect_faces(&self, out: &mut FaceLoops) {
        out.clear();
        let num_verts = self.vertex_count();
        let mut seen = vec![false; self.face_labels.len()];

        for u in 0..num_verts {
            let start = self.vertex_offsets[u];
            for k in start..start + self.vertex_counts[u] {
                let face = self.face_buffer[k];
                if seen[face] {
                    continue;
                }
                seen[face] = true;

                let begin = out.indices.len();
                let mut curr = u;
                let mut next = self.edge_buffer[k];
                loop {
                    out.indices.push(curr);
                    if next == u || out.indices.len() - begin > num_verts {
                        break;
                    }
                    let Some(after) = self.edge_with_face(next, face) else { break };
                    curr = next;
                    next = after;
                }
                out.labels.push(self.face_labels[face]);
                out.counts.push(out.indices.len() - begin);
            }
        }
    }

    /// Rebuilds the adjacency buffers from face loops and refreshes the
    /// cached metrics. `self.vertices` must already hold `num_verts` vertices.
    fn rebuild(&mut self, num_verts: usize, faces: &FaceLoops, corners: &mut Vec<Vec<(usize, usize, usize)>>) {
        corners.iter_mut().for_each(|c| c.clear());
        if corners.len() < num_verts {
            corners.resize_with(num_verts, Vec::new);
        }

        self.face_labels.clear();
        for (slot, (label, face)) in faces.iter().enumerate() {
            self.face_labels.push(label);
            let count = face.len();
            for j in 0..count {
                let u = face[j];
                let next = face[(j + 1) % count];
                let prev = face[(j + count - 1) % count];
                corners[u].push((next, slot, prev));
            }
        }

        self.edge_buffer.clear();
        self.face_buffer.clear();
        self.vertex_offsets.clear();
        self.vertex_counts.clear();

        for corner in corners.iter().take(num_verts) {
            self.vertex_offsets.push(self.edge_buffer.len());
            // Edge u->next has its face on the left; the following edge
            // around u is u->prev.
            let mut used = vec![false; corner.len()];
            let mut current = 0;
            for _ in 0..corner.len() {
                if used[current] {
                    match used.iter().position(|&u| !u) {
                        Some(free) => current = free,
                        None => break,
                    }
                }
                used[current] = true;
                let (to, slot, prev) = corner[current];
                self.edge_buffer.push(to);
                self.face_buffer.push(slot);
                if let Some(follow) = corner.iter().position(|&(t, _, _)| t == prev) {
                    current = follow;
                }
            }
            self.vertex_counts.push(corner.len());
        }

        self.volume = loops_volume(&self.vertices, faces);
        self.max_radius_sq = (0..num_verts)
            .map(|i| {
                let v = self.vertex(i);
                dot(v, v)
            })
            .fold(0.0, f64::max);
    }
}

#[inline]
fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn push_distinct(indices: &mut Vec<usize>, start: usize, index: usize) {
    if indices.len() == start || indices[indices.len() - 1] != index {
        indices.push(index);
    }
}

/// Returns the vertex where edge `kept -> out` meets the plane. An on-plane
/// kept vertex is its own intersection.
fn crossing(
    kept: usize,
    out: usize,
    dists: &[f64],
    tolerance: f64,
    vertices: &[f64],
    positions: &mut Vec<f64>,
    crossings: &mut HashMap<(usize, usize), usize>,
) -> usize {
    if dists[kept] >= -tolerance {
        return kept;
    }
    let key = (kept.min(out), kept.max(out));
    *crossings.entry(key).or_insert_with(|| {
        let d_s = dists[kept];
        let d_e = dists[out];
        let t = (d_s / (d_s - d_e)).clamp(0.0, 1.0);
        let index = positions.len() / 3;
        for axis in 0..3 {
            let a = vertices[kept * 3 + axis];
            let b = vertices[out * 3 + axis];
            positions.push(a + t * (b - a));
        }
        index
    })
}

fn is_closing_edge(events: &[(bool, usize)], u: usize, v: usize) -> bool {
    events.iter().any(|&(is_exit, x)| is_exit && x == u) && events.iter().any(|&(is_exit, e)| !is_exit && e == v)
}

/// Chains directed segments into one closed loop. Returns false if they do
/// not form a single cycle.
fn chain_segments(segments: &[(usize, usize)], lid: &mut Vec<usize>) -> bool {
    lid.clear();
    let (first, mut next) = segments[0];
    lid.push(first);
    while lid.len() <= segments.len() {
        if next == first {
            return lid.len() == segments.len();
        }
        lid.push(next);
        match segments.iter().find(|&&(s, _)| s == next) {
            Some(&(_, e)) => next = e,
            None => return false,
        }
    }
    false
}

/// Fallback ordering of the new face: sort its vertices by angle around
/// the plane normal, counter-clockwise seen from outside.
fn sort_around_normal(segments: &[(usize, usize)], positions: &[f64], normal: [f64; 3], lid: &mut Vec<usize>) {
    lid.clear();
    for &(a, b) in segments {
        for v in [a, b] {
            if !lid.contains(&v) {
                lid.push(v);
            }
        }
    }
    let point = |i: usize| [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]];

    let mut center = [0.0; 3];
    for &i in lid.iter() {
        let p = point(i);
        for axis in 0..3 {
            center[axis] += p[axis] / lid.len() as f64;
        }
    }

    let helper = if normal[0].abs() < 0.9 * normal[0].hypot(normal[1]).hypot(normal[2]) {
        [1.0, 0.0, 0.0]
    } else {
        [0.0, 1.0, 0.0]
    };
    let e1 = cross(normal, helper);
    let e2 = cross(normal, e1);

    let angle = |i: usize| {
        let p = point(i);
        let r = [p[0] - center[0], p[1] - center[1], p[2] - center[2]];
        // e1 x e2 points along the normal.
        dot(r, e2).atan2(dot(r, e1))
    };
    lid.sort_by(|&a, &b| angle(a).total_cmp(&angle(b)));
}

fn loops_volume(vertices: &[f64], faces: &FaceLoops) -> f64 {
    let vertex = |i: usize| [vertices[i * 3], vertices[i * 3 + 1], vertices[i * 3 + 2]];
    let mut volume: f64 = 0.0;
    for (_, face) in faces.iter() {
        if face.len() < 3 {
            continue;
        }
        // Use the first vertex of the face as a pivot for fan triangulation
        let v0 = vertex(face[0]);
        for i in 1..face.len() - 1 {
            volume += dot(v0, cross(vertex(face[i]), vertex(face[i + 1])));
        }
    }
    (volume / 6.0).abs()
}
