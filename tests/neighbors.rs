use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use voroflux::{BoundingBox, Container, ContainerConfig, ConvexCell, ExtractedCell};

fn random_container(count: usize, size: f64, blocks: usize, seed: u64) -> (Container, Vec<[f64; 3]>) {
    let bounds = BoundingBox::new([0.0; 3], [size; 3]);
    let mut container = Container::new(ContainerConfig::new(bounds).with_blocks(blocks, blocks, blocks)).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = Vec::with_capacity(count);
    for i in 0..count {
        let p = [rng.gen_range(0.0..size), rng.gen_range(0.0..size), rng.gen_range(0.0..size)];
        container.add_point(i as i32, p[0], p[1], p[2]);
        points.push(p);
    }
    (container, points)
}

fn by_id(cells: Vec<ExtractedCell>) -> HashMap<i32, ExtractedCell> {
    cells.into_iter().map(|c| (c.id, c)).collect()
}

#[test]
fn test_two_cells_neighbors() {
    let bounds = BoundingBox::new([0.0; 3], [10.0; 3]);
    let mut container = Container::new(ContainerConfig::new(bounds).with_blocks(1, 1, 1)).unwrap();

    // Two points: one at left, one at right
    container.add_point(0, 2.5, 5.0, 5.0);
    container.add_point(1, 7.5, 5.0, 5.0);

    let c0 = container.cell_by_id(0);
    let c1 = container.cell_by_id(1);

    // c0 should have neighbor 1
    assert!(c0.neighbors.contains(&1));
    // c1 should have neighbor 0
    assert!(c1.neighbors.contains(&0));
    assert!((c0.volume - 500.0).abs() < 1e-9);
}

#[test]
fn test_neighbor_reciprocity_random() {
    let (container, _) = random_container(27, 30.0, 5, 27);
    let cells = by_id(container.all_cells());

    for (id, cell) in &cells {
        for &n_id in &cell.neighbors {
            if n_id < 0 {
                // Boundary or wall
                assert!((-6..=-1).contains(&n_id));
                continue;
            }
            let neighbor_neighbors = &cells[&n_id].neighbors;
            assert!(
                neighbor_neighbors.contains(id),
                "Cell {} claims neighbor {}, but {} does not claim {}",
                id,
                n_id,
                n_id,
                id
            );
        }
    }
}

#[test]
fn test_each_neighbor_listed_once() {
    let (container, _) = random_container(80, 1.0, 4, 8);
    for cell in container.all_cells() {
        let mut particles: Vec<i32> = cell.neighbors.iter().copied().filter(|&n| n >= 0).collect();
        let total = particles.len();
        particles.sort();
        particles.dedup();
        assert_eq!(particles.len(), total, "cell {} repeats a neighbor: {:?}", cell.id, cell.neighbors);
        assert!(!particles.contains(&cell.id));
    }
}

#[test]
fn test_grid_search_matches_brute_force() {
    let size = 4.0;
    for blocks in [1, 3, 7] {
        let (container, points) = random_container(60, size, blocks, 99);
        let cells = by_id(container.all_cells());

        for (i, p) in points.iter().enumerate() {
            let mut cell = ConvexCell::new_box([-p[0], -p[1], -p[2]], [size - p[0], size - p[1], size - p[2]]);
            for (j, q) in points.iter().enumerate() {
                if i == j {
                    continue;
                }
                let d = [q[0] - p[0], q[1] - p[1], q[2] - p[2]];
                let rsq = d[0] * d[0] + d[1] * d[1] + d[2] * d[2];
                cell.plane(d, 0.5 * rsq, j as i32).unwrap();
            }

            let expected = cell.volume();
            let got = cells[&(i as i32)].volume;
            assert!(
                (expected - got).abs() < 1e-10,
                "blocks {}: particle {} volume {} vs brute force {}",
                blocks,
                i,
                got,
                expected
            );

            let mut brute: Vec<i32> = cell.face_loops().into_iter().map(|(label, _)| label).collect();
            let mut grid = cells[&(i as i32)].neighbors.clone();
            brute.sort();
            grid.sort();
            assert_eq!(brute, grid, "blocks {}: particle {}", blocks, i);
        }
    }
}

#[test]
fn test_faces_are_outward_and_closed() {
    let (container, _) = random_container(40, 2.0, 3, 4);
    for cell in container.all_cells() {
        let v = &cell.vertices;
        let e = cell.edges.len() as i64;
        assert_eq!(v.len() as i64 - e + cell.faces.len() as i64, 2, "cell {} breaks Euler's formula", cell.id);

        for face in &cell.faces {
            assert!(face.len() >= 3);
            // Newell normal of the loop must point away from the particle.
            let mut n = [0.0; 3];
            for (j, &a) in face.iter().enumerate() {
                let a = v[a];
                let b = v[face[(j + 1) % face.len()]];
                n[0] += (a[1] - b[1]) * (a[2] + b[2]);
                n[1] += (a[2] - b[2]) * (a[0] + b[0]);
                n[2] += (a[0] - b[0]) * (a[1] + b[1]);
            }
            let a = v[face[0]];
            let r = [a[0] - cell.position[0], a[1] - cell.position[1], a[2] - cell.position[2]];
            assert!(n[0] * r[0] + n[1] * r[1] + n[2] * r[2] > 0.0, "cell {} has an inward face", cell.id);
        }
    }
}
