use super::support::*;
use super::*;
use snake_types::ItemSighting;

#[test]
fn north_ray_reaches_the_edge_and_sees_the_goal() {
    let mut sim = open_sim(1);
    configure_sim(&mut sim, &[(15, 15), (15, 16), (15, 17)], (15, 4));

    let ray = sim.cast_ray(RayDirection::North);

    assert_eq!(ray.distance, 16);
    assert_eq!(ray.blocked_by, RayBlocker::Wall);
    assert!(ray.target_seen);
    assert_eq!(ray.item, None);
}

#[test]
fn south_ray_stops_on_the_neck() {
    let mut sim = open_sim(2);
    configure_sim(&mut sim, &[(15, 15), (15, 16), (15, 17)], (15, 4));

    let ray = sim.cast_ray(RayDirection::South);

    assert_eq!(ray.distance, 1);
    assert_eq!(ray.blocked_by, RayBlocker::Body);
    assert!(!ray.target_seen);
}

#[test]
fn diagonal_ray_counts_cells_to_the_corner() {
    let mut sim = open_sim(3);
    configure_sim(&mut sim, &[(15, 15), (15, 16), (15, 17)], (2, 2));

    let ray = sim.cast_ray(RayDirection::NorthEast);

    assert_eq!(ray.distance, 15);
    assert_eq!(ray.blocked_by, RayBlocker::Wall);
    assert!(!ray.target_seen);
}

#[test]
fn obstacles_stop_rays_as_walls() {
    let mut sim = open_sim(4);
    configure_sim(&mut sim, &[(15, 15), (15, 16), (15, 17)], (2, 15));
    place_obstacle(&mut sim, (11, 15));

    let ray = sim.cast_ray(RayDirection::West);

    assert_eq!(ray.distance, 4);
    assert_eq!(ray.blocked_by, RayBlocker::Wall);
    assert!(!ray.target_seen, "goal sits behind the obstacle");
}

#[test]
fn ray_reports_the_nearest_item() {
    let mut sim = open_sim(5);
    configure_sim(&mut sim, &[(15, 15), (15, 16), (15, 17)], (2, 2));
    place_item(&mut sim, ItemKind::Slow, (20, 15));
    place_item(&mut sim, ItemKind::Cutter, (18, 15));

    let ray = sim.cast_ray(RayDirection::East);

    assert_eq!(
        ray.item,
        Some(ItemSighting {
            kind: ItemKind::Cutter,
            distance: 3,
        })
    );
    assert_eq!(ray.distance, 15);
}

#[test]
fn open_portal_replaces_goal_as_ray_target() {
    let mut sim = open_sim(6);
    configure_sim(&mut sim, &[(15, 15), (15, 16), (15, 17)], (15, 4));
    sim.portal = Some(Cell::new(25, 15));

    assert!(!sim.cast_ray(RayDirection::North).target_seen);
    assert!(sim.cast_ray(RayDirection::East).target_seen);
}

#[test]
fn perceive_returns_rays_in_compass_order() {
    let sim = open_sim(7);
    let rays = sim.perceive();

    let directions: Vec<RayDirection> = rays.iter().map(|ray| ray.direction).collect();
    assert_eq!(directions, RayDirection::ALL.to_vec());
    for ray in rays {
        assert_eq!(ray, sim.cast_ray(ray.direction));
        assert!(ray.distance >= 1);
    }
}
