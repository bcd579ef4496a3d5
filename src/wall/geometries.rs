use super::{WallCut, WallGeometry};

fn normalize(v: [f64; 3], fallback: [f64; 3]) -> [f64; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len == 0.0 || !len.is_finite() {
        fallback
    } else {
        [v[0] / len, v[1] / len, v[2] / len]
    }
}

/// Cut through `point` with outward `normal`, relative to `position`.
fn tangent_cut(point: [f64; 3], normal: [f64; 3], position: &[f64; 3]) -> WallCut {
    WallCut {
        normal,
        offset: normal[0] * (point[0] - position[0])
            + normal[1] * (point[1] - position[1])
            + normal[2] * (point[2] - position[2]),
    }
}

/// A wall defined by a plane. The valid region is `normal · x <= offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneGeometry {
    /// The outward normal of the plane, pointing away from the valid region.
    pub normal: [f64; 3],
    pub offset: f64,
}

impl PlaneGeometry {
    pub fn new(normal: [f64; 3], offset: f64) -> Self {
        Self { normal, offset }
    }
}

impl WallGeometry for PlaneGeometry {
    fn point_inside(&self, point: &[f64; 3]) -> bool {
        let n = self.normal;
        n[0] * point[0] + n[1] * point[1] + n[2] * point[2] <= self.offset
    }

    fn cut(&self, position: &[f64; 3]) -> Option<WallCut> {
        let n = self.normal;
        Some(WallCut {
            normal: n,
            offset: self.offset - (n[0] * position[0] + n[1] * position[1] + n[2] * position[2]),
        })
    }
}

/// A wall defined by a sphere.
///
/// The valid region is inside the sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereGeometry {
    /// The center of the sphere.
    pub center: [f64; 3],
    /// The radius of the sphere.
    pub radius: f64,
}

impl SphereGeometry {
    pub fn new(center: [f64; 3], radius: f64) -> Self {
        Self { center, radius }
    }
}

impl WallGeometry for SphereGeometry {
    fn point_inside(&self, point: &[f64; 3]) -> bool {
        let dx = point[0] - self.center[0];
        let dy = point[1] - self.center[1];
        let dz = point[2] - self.center[2];
        (dx * dx + dy * dy + dz * dz) <= self.radius * self.radius
    }

    fn cut(&self, position: &[f64; 3]) -> Option<WallCut> {
        let dx = position[0] - self.center[0];
        let dy = position[1] - self.center[1];
        let dz = position[2] - self.center[2];
        let dist = (dx * dx + dy * dy + dz * dz).sqrt();

        if dist == 0.0 {
            return None;
        }

        // Normal at surface pointing OUT of sphere (away from center)
        let nx = dx / dist;
        let ny = dy / dist;
        let nz = dz / dist;

        Some(WallCut { normal: [nx, ny, nz], offset: self.radius - dist })
    }
}

/// A wall defined by an infinite cylinder.
///
/// The valid region is inside the cylinder.
#[derive(Debug, Clone, PartialEq)]
pub struct CylinderGeometry {
    /// A point on the cylinder's axis.
    pub center: [f64; 3],
    /// The direction of the cylinder's axis, normalized.
    pub axis: [f64; 3],
    /// The radius of the cylinder.
    pub radius: f64,
}

impl CylinderGeometry {
    /// Creates a new `CylinderGeometry`. The axis is normalized; a zero axis
    /// falls back to +z.
    pub fn new(center: [f64; 3], axis: [f64; 3], radius: f64) -> Self {
        Self { center, axis: normalize(axis, [0.0, 0.0, 1.0]), radius }
    }

    fn radial(&self, point: &[f64; 3]) -> (f64, [f64; 3]) {
        let dx = point[0] - self.center[0];
        let dy = point[1] - self.center[1];
        let dz = point[2] - self.center[2];

        let dot = dx * self.axis[0] + dy * self.axis[1] + dz * self.axis[2];
        (dot, [dx - dot * self.axis[0], dy - dot * self.axis[1], dz - dot * self.axis[2]])
    }
}

impl WallGeometry for CylinderGeometry {
    fn point_inside(&self, point: &[f64; 3]) -> bool {
        let (_, perp) = self.radial(point);
        (perp[0] * perp[0] + perp[1] * perp[1] + perp[2] * perp[2]) <= self.radius * self.radius
    }

    fn cut(&self, position: &[f64; 3]) -> Option<WallCut> {
        let (dot, perp) = self.radial(position);
        let dist = (perp[0] * perp[0] + perp[1] * perp[1] + perp[2] * perp[2]).sqrt();
        if dist == 0.0 {
            return None;
        }

        // Project to cylinder surface
        let scale = self.radius / dist;
        let surface = [
            self.center[0] + dot * self.axis[0] + perp[0] * scale,
            self.center[1] + dot * self.axis[1] + perp[1] * scale,
            self.center[2] + dot * self.axis[2] + perp[2] * scale,
        ];

        // Normal pointing OUT (away from axis)
        let normal = [perp[0] / dist, perp[1] / dist, perp[2] / dist];
        Some(tangent_cut(surface, normal, position))
    }
}

/// A wall defined by an infinite one-sided cone.
///
/// The valid region is inside the cone.
#[derive(Debug, Clone, PartialEq)]
pub struct ConeGeometry {
    /// The apex of the cone.
    pub apex: [f64; 3],
    /// The direction of the cone's axis (pointing into the cone), normalized.
    pub axis: [f64; 3],
    /// The half-angle of the cone in radians.
    pub half_angle: f64,
}

impl ConeGeometry {
    pub fn new(apex: [f64; 3], axis: [f64; 3], half_angle: f64) -> Self {
        Self { apex, axis: normalize(axis, [0.0, 0.0, 1.0]), half_angle }
    }
}

impl WallGeometry for ConeGeometry {
    fn point_inside(&self, point: &[f64; 3]) -> bool {
        let dx = point[0] - self.apex[0];
        let dy = point[1] - self.apex[1];
        let dz = point[2] - self.apex[2];

        let h = dx * self.axis[0] + dy * self.axis[1] + dz * self.axis[2];
        let px = dx - h * self.axis[0];
        let py = dy - h * self.axis[1];
        let pz = dz - h * self.axis[2];
        let r = (px * px + py * py + pz * pz).sqrt();

        h >= 0.0 && r <= h * self.half_angle.tan()
    }

    fn cut(&self, position: &[f64; 3]) -> Option<WallCut> {
        let dx = position[0] - self.apex[0];
        let dy = position[1] - self.apex[1];
        let dz = position[2] - self.apex[2];

        let h = dx * self.axis[0] + dy * self.axis[1] + dz * self.axis[2];
        let px = dx - h * self.axis[0];
        let py = dy - h * self.axis[1];
        let pz = dz - h * self.axis[2];
        let r = (px * px + py * py + pz * pz).sqrt();

        if r == 0.0 {
            return None;
        }

        let r_dir = [px / r, py / r, pz / r];
        let cos_a = self.half_angle.cos();
        let sin_a = self.half_angle.sin();

        // Signed distance to the cone surface in the (r, h) half-plane
        let dist = r * cos_a - h * sin_a;
        let foot_r = r - dist * cos_a;
        let foot_h = h + dist * sin_a;

        if foot_h < 0.0 {
            // The foot falls behind the apex: cut through the apex instead.
            let dist_apex = (dx * dx + dy * dy + dz * dz).sqrt();
            if dist_apex == 0.0 {
                return None;
            }
            let normal = [dx / dist_apex, dy / dist_apex, dz / dist_apex];
            return Some(tangent_cut(self.apex, normal, position));
        }

        let surface = [
            self.apex[0] + foot_h * self.axis[0] + foot_r * r_dir[0],
            self.apex[1] + foot_h * self.axis[1] + foot_r * r_dir[1],
            self.apex[2] + foot_h * self.axis[2] + foot_r * r_dir[2],
        ];
        let normal = [
            cos_a * r_dir[0] - sin_a * self.axis[0],
            cos_a * r_dir[1] - sin_a * self.axis[1],
            cos_a * r_dir[2] - sin_a * self.axis[2],
        ];
        Some(tangent_cut(surface, normal, position))
    }
}
