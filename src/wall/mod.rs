pub mod geometries;

use crate::cell::{CellScratch, ConvexCell, CutOutcome};
use crate::error::{Result, VoronoiError};
use geometries::{ConeGeometry, CylinderGeometry, PlaneGeometry, SphereGeometry};
use log::warn;

/// The maximum ID for walls. Wall IDs must be less than or equal to this value
/// to avoid conflicts with non-negative particle IDs and the bounding box IDs.
pub const WALL_ID_START: i32 = -10;

/// A half-space cut relative to a particle: keeps `normal · (x - p) <= offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallCut {
    pub normal: [f64; 3],
    pub offset: f64,
}

/// Trait defining the geometry of a built-in wall.
pub trait WallGeometry: Send + std::fmt::Debug {
    /// Checks if a point is inside the valid region defined by the wall.
    fn point_inside(&self, point: &[f64; 3]) -> bool;

    /// Calculates the clipping plane for the cell of the particle at `position`.
    /// The normal points OUT of the valid region. `None` means no cut.
    fn cut(&self, position: &[f64; 3]) -> Option<WallCut>;
}

/// Answer of a [`CustomWall`] to a cut request.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CutResponse {
    pub cut: bool,
    /// Outward normal, relative to the particle.
    pub normal: [f64; 3],
    pub offset: f64,
}

impl CutResponse {
    pub fn no_cut() -> Self {
        Self::default()
    }

    pub fn plane(normal: [f64; 3], offset: f64) -> Self {
        Self { cut: true, normal, offset }
    }
}

/// A wall supplied from outside the crate as a predicate plus a cut function.
///
/// Both calls happen synchronously during cell computation and must not
/// re-enter the container.
pub trait CustomWall: Send + std::fmt::Debug {
    fn point_inside(&self, x: f64, y: f64, z: f64) -> bool;

    /// The cut for the cell of the particle at `(x, y, z)`, in coordinates
    /// relative to that particle.
    fn cut_cell(&self, x: f64, y: f64, z: f64) -> CutResponse;
}

/// Adapter turning a pair of closures into a [`CustomWall`].
pub struct FnWall<P, C> {
    point_inside: P,
    cut_cell: C,
}

impl<P, C> std::fmt::Debug for FnWall<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnWall").finish_non_exhaustive()
    }
}

impl<P, C> CustomWall for FnWall<P, C>
where
    P: Fn(f64, f64, f64) -> bool + Send,
    C: Fn(f64, f64, f64) -> CutResponse + Send,
{
    fn point_inside(&self, x: f64, y: f64, z: f64) -> bool {
        (self.point_inside)(x, y, z)
    }

    fn cut_cell(&self, x: f64, y: f64, z: f64) -> CutResponse {
        (self.cut_cell)(x, y, z)
    }
}

/// The surface a wall cuts along.
#[derive(Debug)]
pub enum WallShape {
    Plane(PlaneGeometry),
    Sphere(SphereGeometry),
    Cylinder(CylinderGeometry),
    Cone(ConeGeometry),
    Custom(Box<dyn CustomWall>),
}

/// A clipping boundary applied to every cell of a container.
///
/// Faces created by the wall are labelled with its id, reported in the
/// `neighbors` of extracted cells.
#[derive(Debug)]
pub struct Wall {
    id: Option<i32>,
    shape: WallShape,
}

impl Wall {
    /// Keeps the half-space `normal · x <= offset`.
    pub fn plane(normal: [f64; 3], offset: f64) -> Self {
        Self::from_shape(WallShape::Plane(PlaneGeometry::new(normal, offset)))
    }

    pub fn sphere(center: [f64; 3], radius: f64) -> Self {
        Self::from_shape(WallShape::Sphere(SphereGeometry::new(center, radius)))
    }

    pub fn cylinder(axis_point: [f64; 3], axis: [f64; 3], radius: f64) -> Self {
        Self::from_shape(WallShape::Cylinder(CylinderGeometry::new(axis_point, axis, radius)))
    }

    pub fn cone(apex: [f64; 3], axis: [f64; 3], half_angle: f64) -> Self {
        Self::from_shape(WallShape::Cone(ConeGeometry::new(apex, axis, half_angle)))
    }

    pub fn custom(wall: impl CustomWall + 'static) -> Self {
        Self::from_shape(WallShape::Custom(Box::new(wall)))
    }

    pub fn from_fns<P, C>(point_inside: P, cut_cell: C) -> Self
    where
        P: Fn(f64, f64, f64) -> bool + Send + 'static,
        C: Fn(f64, f64, f64) -> CutResponse + Send + 'static,
    {
        Self::custom(FnWall { point_inside, cut_cell })
    }

    pub fn from_shape(shape: WallShape) -> Self {
        Self { id: None, shape }
    }

    /// Tags the wall. The id must be `<= WALL_ID_START`, checked on registration.
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn shape(&self) -> &WallShape {
        &self.shape
    }

    pub fn point_inside(&self, point: &[f64; 3]) -> bool {
        match &self.shape {
            WallShape::Plane(g) => g.point_inside(point),
            WallShape::Sphere(g) => g.point_inside(point),
            WallShape::Cylinder(g) => g.point_inside(point),
            WallShape::Cone(g) => g.point_inside(point),
            WallShape::Custom(c) => c.point_inside(point[0], point[1], point[2]),
        }
    }

    /// The cut this wall applies to the cell of the particle at `position`.
    pub fn cut_cell(&self, position: &[f64; 3]) -> Option<WallCut> {
        match &self.shape {
            WallShape::Plane(g) => g.cut(position),
            WallShape::Sphere(g) => g.cut(position),
            WallShape::Cylinder(g) => g.cut(position),
            WallShape::Cone(g) => g.cut(position),
            WallShape::Custom(c) => {
                let response = c.cut_cell(position[0], position[1], position[2]);
                if !response.cut {
                    return None;
                }
                let n = response.normal;
                let well_formed = n.iter().all(|v| v.is_finite())
                    && response.offset.is_finite()
                    && n.iter().any(|&v| v != 0.0);
                if !well_formed {
                    warn!("custom wall returned a malformed cut {:?} at {:?}, ignoring it", response, position);
                    return None;
                }
                Some(WallCut { normal: n, offset: response.offset })
            }
        }
    }
}

/// Ordered walls of a container together with their face labels.
#[derive(Debug, Default)]
pub struct WallRegistry {
    walls: Vec<(i32, Wall)>,
}

impl WallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a wall. Untagged walls are labelled
    /// `WALL_ID_START - registration index`.
    pub fn push(&mut self, wall: Wall) -> Result<i32> {
        let label = match wall.id {
            Some(id) if id > WALL_ID_START => {
                return Err(VoronoiError::InvalidWallId { id, max: WALL_ID_START });
            }
            Some(id) => id,
            None => WALL_ID_START - self.walls.len() as i32,
        };
        self.walls.push((label, wall));
        Ok(label)
    }

    pub fn clear(&mut self) {
        self.walls.clear();
    }

    pub fn len(&self) -> usize {
        self.walls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty()
    }

    /// Walls with their labels, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &Wall)> + '_ {
        self.walls.iter().map(|(label, wall)| (*label, wall))
    }

    /// True when `point` is inside every wall.
    pub fn point_inside(&self, point: &[f64; 3]) -> bool {
        self.walls.iter().all(|(_, wall)| wall.point_inside(point))
    }

    /// Applies every wall to a cell centred at `position`, in registration
    /// order. Stops as soon as the cell is emptied.
    pub fn apply(&self, cell: &mut ConvexCell, position: &[f64; 3], scratch: &mut CellScratch) -> CutOutcome {
        let mut outcome = CutOutcome::Unchanged;
        for (label, wall) in &self.walls {
            let Some(cut) = wall.cut_cell(position) else { continue };
            let n = cut.normal;
            let rsq = n[0] * n[0] + n[1] * n[1] + n[2] * n[2];
            match cell.plane_with_scratch(n, cut.offset, rsq, *label, scratch) {
                Ok(CutOutcome::Emptied) => return CutOutcome::Emptied,
                Ok(CutOutcome::Cut) => outcome = CutOutcome::Cut,
                Ok(CutOutcome::Unchanged) => {}
                Err(e) => warn!("wall {} could not cut the cell at {:?}: {}", label, position, e),
            }
        }
        outcome
    }
}
