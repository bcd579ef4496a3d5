//! # voroflux
//!
//! `voroflux` computes 3D Voronoi tessellations of seed particles inside an
//! axis-aligned box, in Rust or compiled to WebAssembly.
//!
//! ## Features
//!
//! - **Container kernel**: particles live in a uniform bucket grid; each cell is
//!   built by clipping a box against bisecting planes of progressively farther
//!   neighbors until none can reach it.
//! - **Walls**: planes, spheres, cylinders, cones and custom cut callbacks
//!   bound every cell.
//! - **Periodicity**: optional wrap-around per axis.
//! - **Geometry**: vertices, face loops, edges, neighbor ids, volumes and
//!   centroids, plus one-step Lloyd relaxation.
//!
//! ## Example
//!
//! ```
//! use voroflux::{BoundingBox, Container};
//!
//! let mut container = Container::from_bounds(BoundingBox::new([0.0; 3], [10.0; 3])).unwrap();
//! container.add_point(0, 2.0, 5.0, 5.0);
//! container.add_point(1, 8.0, 5.0, 5.0);
//!
//! let total: f64 = container.all_cells().iter().map(|c| c.volume).sum();
//! assert!((total - 1000.0).abs() < 1e-9);
//! ```

mod bounds;
mod cell;
mod config;
mod container;
mod error;
mod extract;
mod grid;
mod relax;
pub mod wall;
pub mod wasm;

pub use bounds::BoundingBox;
pub use bounds::BOX_ID_BOTTOM;
pub use bounds::BOX_ID_TOP;
pub use bounds::BOX_ID_FRONT;
pub use bounds::BOX_ID_BACK;
pub use bounds::BOX_ID_LEFT;
pub use bounds::BOX_ID_RIGHT;
pub use cell::{CellScratch, ConvexCell, CutOutcome};
pub use config::{ContainerConfig, DEFAULT_BLOCKS, DEFAULT_BUCKET_CAPACITY};
pub use container::Container;
pub use error::{Result, VoronoiError};
pub use extract::ExtractedCell;
pub use grid::{GridIndex, Particle, ParticleRef};
pub use wall::{CustomWall, CutResponse, Wall, WallCut, WallRegistry, WALL_ID_START};
