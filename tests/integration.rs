use voroflux::{BoundingBox, Container, ContainerConfig, ConvexCell, CutResponse, Wall, BOX_ID_LEFT};

fn container(size: f64) -> Container {
    Container::from_bounds(BoundingBox::new([0.0; 3], [size; 3])).unwrap()
}

#[test]
fn test_cell_metrics() {
    // Create a 10x20x30 box
    let cell = ConvexCell::new_box([0.0; 3], [10.0, 20.0, 30.0]);

    // Test Volume
    // 10 * 20 * 30 = 6000
    let vol = cell.volume();
    assert!((vol - 6000.0).abs() < 1e-6, "Expected volume 6000, got {}", vol);

    // Test Centroid
    // Center should be at (5, 10, 15)
    let c = cell.centroid();
    assert!((c[0] - 5.0).abs() < 1e-6, "Centroid X mismatch");
    assert!((c[1] - 10.0).abs() < 1e-6, "Centroid Y mismatch");
    assert!((c[2] - 15.0).abs() < 1e-6, "Centroid Z mismatch");
}

#[test]
fn test_single_particle_cube() {
    let mut c = container(10.0);
    c.add_point(42, 3.0, 7.0, 1.0);

    let cell = c.cell_by_id(42);
    assert_eq!(cell.id, 42);
    assert_eq!(cell.position, [3.0, 7.0, 1.0]);
    assert!((cell.volume - 1000.0).abs() < 1e-9, "got {}", cell.volume);
    assert_eq!(cell.vertices.len(), 8);
    assert_eq!(cell.faces.len(), 6);
    assert_eq!(cell.edges.len(), 12);
    assert!(cell.neighbors.iter().all(|&n| (-6..=-1).contains(&n)));
}

#[test]
fn test_two_particles_share_one_face() {
    let mut c = container(10.0);
    c.add_point(0, 1.0, 1.0, 1.0);
    c.add_point(1, 9.0, 9.0, 9.0);

    let cells = c.all_cells();
    assert_eq!(cells.len(), 2);
    let total: f64 = cells.iter().map(|cell| cell.volume).sum();
    assert!((total - 1000.0).abs() < 1e-9, "Total volume should be 1000, got {}", total);

    for cell in &cells {
        let other = 1 - cell.id;
        let count = cell.neighbors.iter().filter(|&&n| n == other).count();
        assert_eq!(count, 1, "cell {} lists {} {} times", cell.id, other, count);
    }
}

#[test]
fn test_tessellation_cells_octet() {
    let mut c = Container::new(ContainerConfig::new(BoundingBox::new([0.0; 3], [100.0; 3])).with_blocks(10, 10, 10)).unwrap();

    let mut id = 0;
    for x in [25.0, 75.0] {
        for y in [25.0, 75.0] {
            for z in [25.0, 75.0] {
                c.add_point(id, x, y, z);
                id += 1;
            }
        }
    }

    let cells = c.all_cells();
    assert_eq!(cells.len(), 8);
    let mut total_vol = 0.0;
    for cell in &cells {
        assert!((cell.volume - 125_000.0).abs() < 1e-3, "Cell volume should be 125,000, got {}", cell.volume);
        assert_eq!(cell.faces.len(), 6);
        // Three box faces and three particle neighbors.
        assert_eq!(cell.neighbors.iter().filter(|&&n| n >= 0).count(), 3);
        total_vol += cell.volume;
    }
    assert!((total_vol - 1_000_000.0).abs() < 1e-3, "Total volume should be 1,000,000, got {}", total_vol);
}

#[test]
fn test_sentinel_on_miss() {
    let mut c = container(1.0);
    c.add_point(5, 0.5, 0.5, 0.5);
    let miss = c.cell_by_id(6);
    assert_eq!(miss.id, 0);
    assert_eq!(miss.volume, 0.0);
    assert!(miss.vertices.is_empty() && miss.faces.is_empty() && miss.edges.is_empty());
}

#[test]
fn test_duplicate_ids_return_first_in_bucket_order() {
    let mut c = container(10.0);
    c.add_point(1, 1.0, 1.0, 1.0);
    c.add_point(1, 9.0, 9.0, 9.0);
    assert_eq!(c.particle_count(), 2);
    assert_eq!(c.cell_by_id(1).position, [1.0, 1.0, 1.0]);
}

#[test]
fn test_clear_then_reinsert_reproduces_cells() {
    let mut c = container(5.0);
    c.add_wall(Wall::sphere([2.5; 3], 2.4)).unwrap();
    let added = c.add_random_points(40, 11);
    let points: Vec<(i32, [f64; 3])> = c.particles().map(|(_, p)| (p.id, p.position)).collect();
    let before = c.all_cells();

    c.clear();
    assert_eq!(c.particle_count(), 0);
    assert_eq!(c.walls().len(), 1);
    for (id, p) in &points {
        c.add_point(*id, p[0], p[1], p[2]);
    }
    let after = c.all_cells();
    assert_eq!(added, 40);
    assert_eq!(before, after);
}

#[test]
fn test_declining_custom_wall_is_no_wall() {
    let mut plain = container(3.0);
    plain.add_random_points(25, 3);
    let expected = plain.all_cells();

    let mut walled = container(3.0);
    walled
        .add_wall(Wall::from_fns(|_, _, _| true, |_, _, _| CutResponse::no_cut()))
        .unwrap();
    walled.add_random_points(25, 3);
    assert_eq!(walled.all_cells(), expected);
}

#[test]
fn test_custom_wall_matches_builtin_plane() {
    let mut builtin = container(2.0);
    builtin.add_wall(Wall::plane([0.0, 0.0, 1.0], 1.2).with_id(-20)).unwrap();

    let mut custom = container(2.0);
    custom
        .add_wall(
            Wall::from_fns(|_, _, z| z <= 1.2, |_, _, z| CutResponse::plane([0.0, 0.0, 1.0], 1.2 - z)).with_id(-20),
        )
        .unwrap();

    for c in [&mut builtin, &mut custom] {
        c.add_point(0, 0.5, 0.5, 0.5);
        c.add_point(1, 1.5, 1.5, 0.5);
    }
    let a = builtin.all_cells();
    let b = custom.all_cells();
    for (x, y) in a.iter().zip(&b) {
        assert!((x.volume - y.volume).abs() < 1e-12);
        assert!(x.neighbors.contains(&-20));
        assert_eq!(x.neighbors, y.neighbors);
    }
    let total: f64 = a.iter().map(|c| c.volume).sum();
    assert!((total - 4.8).abs() < 1e-9, "got {}", total);
}

#[test]
fn test_degenerate_cells_are_reported_empty() {
    let mut c = container(1.0);
    // Keeps x <= 0.5 only; the second particle's cell lies entirely beyond it.
    c.add_wall(Wall::plane([1.0, 0.0, 0.0], 0.5)).unwrap();
    c.add_point(0, 0.25, 0.5, 0.5);
    c.add_point(1, 0.95, 0.5, 0.5);

    let cells = c.all_cells();
    assert_eq!(cells.len(), 2);
    let empty = cells.iter().find(|cell| cell.id == 1).unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.volume, 0.0);
    assert_eq!(empty.position, [0.95, 0.5, 0.5]);

    let full = cells.iter().find(|cell| cell.id == 0).unwrap();
    assert!((full.volume - 0.5).abs() < 1e-9);
    assert!(full.neighbors.contains(&BOX_ID_LEFT));
    assert!(!full.neighbors.contains(&1));
}

#[test]
fn test_relaxation_converges() {
    // A 4 x 1 x 1 slab settles into four unit cubes.
    let bounds = BoundingBox::new([0.0; 3], [4.0, 1.0, 1.0]);
    let mut points = vec![[0.2, 0.3, 0.6], [0.9, 0.7, 0.4], [1.1, 0.4, 0.5], [3.9, 0.6, 0.3]];

    for _ in 0..200 {
        let mut c = Container::new(ContainerConfig::new(bounds).with_blocks(4, 1, 1)).unwrap();
        for (id, p) in points.iter().enumerate() {
            c.add_point(id as i32, p[0], p[1], p[2]);
        }
        points = c.relax();
        assert_eq!(points.len(), 4);
    }

    for (i, p) in points.iter().enumerate() {
        assert!((p[0] - (i as f64 + 0.5)).abs() < 1e-3, "particle {} at {:?}", i, p);
        assert!((p[1] - 0.5).abs() < 1e-3);
        assert!((p[2] - 0.5).abs() < 1e-3);
    }
}

#[test]
fn test_relaxation_of_cube_corners_reaches_fixed_point() {
    let bounds = BoundingBox::new([0.0; 3], [10.0; 3]);
    let mut points = vec![[0.0, 0.0, 0.0], [10.0, 10.0, 0.0], [10.0, 0.0, 10.0], [0.0, 10.0, 10.0]];
    let mut movement = f64::INFINITY;

    for _ in 0..300 {
        let mut c = Container::from_bounds(bounds).unwrap();
        for (id, p) in points.iter().enumerate() {
            c.add_point(id as i32, p[0], p[1], p[2]);
        }
        for cell in c.all_cells() {
            assert!((cell.volume - 250.0).abs() < 1e-6, "cell {} volume {}", cell.id, cell.volume);
        }

        let next = c.relax();
        movement = points
            .iter()
            .zip(&next)
            .map(|(a, b)| ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt())
            .fold(0.0, f64::max);
        points = next;
    }

    assert!(movement < 1e-6, "particles still move by {}", movement);
    for p in &points {
        assert!(p.iter().all(|&x| (0.0..=10.0).contains(&x)));
    }
}
