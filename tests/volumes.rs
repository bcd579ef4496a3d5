use std::f64::consts::PI;
use voroflux::{BoundingBox, Container, ContainerConfig, CutResponse, Wall};

const GRID_SIZE: usize = 20;

/// Fills the container with a regular lattice, keeping only points inside
/// the walls.
fn fill_grid(container: &mut Container, size: f64) {
    let n = GRID_SIZE;
    let step = size / n as f64;
    let offset = step / 2.0;

    let mut id = 0;
    for x in 0..n {
        for y in 0..n {
            for z in 0..n {
                let p = [x as f64 * step + offset, y as f64 * step + offset, z as f64 * step + offset];
                if container.point_inside(p[0], p[1], p[2]) {
                    container.add_point(id, p[0], p[1], p[2]);
                    id += 1;
                }
            }
        }
    }
}

macro_rules! test_volume {
    ($test_name:ident, $wall:expr, $expected:expr, $tolerance:expr) => {
        #[test]
        fn $test_name() {
            let size = 10.0;
            let bounds = BoundingBox::new([0.0; 3], [size; 3]);
            let mut container = Container::new(ContainerConfig::new(bounds).with_blocks(8, 8, 8)).unwrap();
            container.add_wall($wall(size)).unwrap();
            fill_grid(&mut container, size);

            let total_volume: f64 = container.all_cells().iter().map(|c| c.volume).sum();
            let expected_volume = $expected;

            let error = (total_volume - expected_volume).abs() / expected_volume;
            println!(
                "{} Volume: Got {:.4}, Expected {:.4}, Error {:.4}%",
                stringify!($test_name),
                total_volume,
                expected_volume,
                error * 100.0
            );
            assert!(error < $tolerance, "Volume error too high: {:.4}%", error * 100.0);
        }
    };
}

test_volume!(
    test_sphere_volume,
    |size: f64| Wall::sphere([size / 2.0; 3], 4.0),
    4.0 / 3.0 * PI * 4.0f64.powi(3),
    0.02
);

test_volume!(
    test_cylinder_volume,
    |size: f64| Wall::cylinder([size / 2.0, size / 2.0, 0.0], [0.0, 0.0, 1.0], 4.0),
    PI * 4.0f64.powi(2) * 10.0,
    0.02
);

test_volume!(
    test_cone_volume,
    |size: f64| Wall::cone([size / 2.0, size / 2.0, 0.0], [0.0, 0.0, 1.0], 0.4f64.atan()),
    PI * 4.0f64.powi(2) * 10.0 / 3.0,
    0.04
);

test_volume!(
    test_plane_volume_is_exact,
    |size: f64| Wall::plane([1.0, 1.0, 1.0], 1.5 * size),
    500.0,
    1e-9
);

test_volume!(
    test_custom_sphere_volume,
    |size: f64| {
        let c = size / 2.0;
        let r = 4.0;
        Wall::from_fns(
            move |x, y, z| (x - c).powi(2) + (y - c).powi(2) + (z - c).powi(2) <= r * r,
            move |x, y, z| {
                let d = [x - c, y - c, z - c];
                let len = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
                if len == 0.0 {
                    return CutResponse::no_cut();
                }
                CutResponse::plane([d[0] / len, d[1] / len, d[2] / len], r - len)
            },
        )
    },
    4.0 / 3.0 * PI * 4.0f64.powi(3),
    0.02
);

#[test]
fn test_volume_conservation_random_points() {
    for (blocks, seed) in [([1, 1, 1], 1), ([6, 6, 6], 2), ([13, 5, 2], 3)] {
        let bounds = BoundingBox::new([-1.0, 0.0, 2.0], [3.0, 1.5, 4.0]);
        let [nx, ny, nz] = blocks;
        let mut container = Container::new(ContainerConfig::new(bounds).with_blocks(nx, ny, nz)).unwrap();
        container.add_random_points(300, seed);

        let cells = container.all_cells();
        assert_eq!(cells.len(), 300);
        let total: f64 = cells.iter().map(|c| c.volume).sum();
        assert!(
            (total - bounds.volume()).abs() < 1e-8 * bounds.volume(),
            "blocks {:?}: got {}, expected {}",
            blocks,
            total,
            bounds.volume()
        );
    }
}

#[test]
fn test_volume_conservation_periodic() {
    for periodic in [[true, true, true], [true, false, false], [false, true, true]] {
        let bounds = BoundingBox::new([0.0; 3], [2.0, 1.0, 1.5]);
        let config = ContainerConfig::new(bounds)
            .with_blocks(4, 3, 3)
            .with_periodic(periodic[0], periodic[1], periodic[2]);
        let mut container = Container::new(config).unwrap();
        container.add_random_points(60, 5);

        let total: f64 = container.all_cells().iter().map(|c| c.volume).sum();
        assert!(
            (total - 3.0).abs() < 1e-8,
            "periodic {:?}: got {}",
            periodic,
            total
        );
    }
}

#[test]
fn test_periodic_single_particle_fills_domain() {
    let config = ContainerConfig::new(BoundingBox::new([0.0; 3], [1.0; 3])).with_periodic(true, true, true);
    let mut container = Container::new(config).unwrap();
    container.add_point(0, 0.9, 0.1, 0.5);
    let cell = container.cell_by_id(0);
    assert!((cell.volume - 1.0).abs() < 1e-12);
    assert_eq!(cell.faces.len(), 6);
}

#[test]
fn test_volume_conservation_across_scales() {
    for scale in [1e-9, 1e-6, 1.0, 1e6] {
        let bounds = BoundingBox::new([0.0; 3], [scale; 3]);
        let mut container = Container::new(ContainerConfig::new(bounds).with_blocks(5, 5, 5)).unwrap();
        assert_eq!(container.add_random_points(200, 17), 200);

        let total: f64 = container.all_cells().iter().map(|c| c.volume).sum();
        let error = (total - bounds.volume()).abs() / bounds.volume();
        assert!(error < 1e-10, "scale {}: relative volume error {}", scale, error);
    }
}
