//! Tests for sector generation and teardown.

#[cfg(test)]
mod tests {
    use crate::grid::{GridNode, GridSettings, NodeConnection};
    use crate::sector::*;
    use crate::ship::{Ship, ShipMotion};
    use crate::spatial::SpatialHash;
    use crate::station::{Station, StationModule, StationModules};
    use crate::{create_simulation_app, run_simulation_tick, SimulationConfig};
    use bevy::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_sector(side_nodes: u32, is_3d: bool) -> SectorConfig {
        SectorConfig {
            side_length: side_nodes as f32,
            side_nodes,
            is_3d,
            ..Default::default()
        }
    }

    fn count<T: Component>(app: &mut App) -> usize {
        app.world_mut()
            .query_filtered::<(), With<T>>()
            .iter(app.world())
            .count()
    }

    #[test]
    fn test_border_classification_2d() {
        assert!(is_border_coords(UVec3::new(0, 1, 0), 3, false));
        assert!(is_border_coords(UVec3::new(2, 2, 0), 3, false));
        assert!(!is_border_coords(UVec3::new(1, 1, 0), 3, false));
        // z не учитывается в 2D
        assert!(!is_border_coords(UVec3::new(1, 1, 2), 3, false));
    }

    #[test]
    fn test_border_classification_3d() {
        assert!(is_border_coords(UVec3::new(1, 1, 0), 3, true));
        assert!(is_border_coords(UVec3::new(1, 1, 2), 3, true));
        assert!(!is_border_coords(UVec3::new(1, 1, 1), 3, true));
    }

    #[test]
    fn test_lattice_3x3_is_centred() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let lattice = build_lattice(&small_sector(3, false), &mut rng);

        assert_eq!(lattice.len(), 9);
        assert_eq!(lattice.iter().filter(|n| n.is_border).count(), 8);

        let interior: Vec<_> = lattice.iter().filter(|n| !n.is_border).collect();
        assert_eq!(interior.len(), 1);
        assert_eq!(interior[0].coords, UVec3::new(1, 1, 0));
        assert_eq!(interior[0].position, Vec3::ZERO);

        assert_eq!(lattice[0].position, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(lattice[8].position, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_lattice_offset_by_start_position() {
        let config = SectorConfig {
            start_position: [10.0, -5.0, 0.0],
            ..small_sector(3, false)
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let lattice = build_lattice(&config, &mut rng);

        assert_eq!(lattice[4].position, Vec3::new(10.0, -5.0, 0.0));
    }

    #[test]
    fn test_every_border_connects_to_interior_3x3() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let lattice = build_lattice(&small_sector(3, false), &mut rng);
        let plan = plan_border_connections(&lattice);

        assert_eq!(plan.len(), 8);
        for (border, interior) in plan {
            assert!(lattice[border].is_border);
            assert_eq!(interior, 4);
        }
    }

    #[test]
    fn test_lattice_3x3x3() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let lattice = build_lattice(&small_sector(3, true), &mut rng);

        assert_eq!(lattice.len(), 27);
        assert_eq!(lattice.iter().filter(|n| n.is_border).count(), 26);
        assert_eq!(plan_border_connections(&lattice).len(), 26);
    }

    #[test]
    fn test_two_nodes_per_side_has_no_connections() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let lattice = build_lattice(&small_sector(2, false), &mut rng);

        assert!(lattice.iter().all(|n| n.is_border));
        assert!(plan_border_connections(&lattice).is_empty());
    }

    #[test]
    fn test_nearest_interior_tie_keeps_first() {
        let lattice = [
            LatticeNode {
                coords: UVec3::ZERO,
                position: Vec3::ZERO,
                is_border: true,
            },
            LatticeNode {
                coords: UVec3::new(1, 0, 0),
                position: Vec3::new(1.0, 0.0, 0.0),
                is_border: false,
            },
            LatticeNode {
                coords: UVec3::new(2, 0, 0),
                position: Vec3::new(-1.0, 0.0, 0.0),
                is_border: false,
            },
        ];

        assert_eq!(plan_border_connections(&lattice), vec![(0, 1)]);
    }

    #[test]
    fn test_jitter_moves_only_interior_and_is_seeded() {
        let config = SectorConfig {
            node_jitter: 0.3,
            ..small_sector(5, false)
        };
        let plain = build_lattice(&small_sector(5, false), &mut ChaCha8Rng::seed_from_u64(7));
        let first = build_lattice(&config, &mut ChaCha8Rng::seed_from_u64(7));
        let second = build_lattice(&config, &mut ChaCha8Rng::seed_from_u64(7));
        let other = build_lattice(&config, &mut ChaCha8Rng::seed_from_u64(8));

        assert_eq!(first, second);
        assert_ne!(first, other);

        let max_offset = 0.3 * config.node_distance();
        for (jittered, original) in first.iter().zip(&plain) {
            if jittered.is_border {
                assert_eq!(jittered.position, original.position);
            } else {
                let offset = jittered.position - original.position;
                assert!(offset.x.abs() <= max_offset + 1e-6);
                assert!(offset.y.abs() <= max_offset + 1e-6);
                assert_eq!(offset.z, 0.0);
            }
        }
    }

    #[test]
    fn test_load_sector_spawns_everything() {
        let mut app = create_simulation_app(SimulationConfig::default());
        let config = SectorConfig {
            stations: vec![StationConfig {
                position: [0.5, 0.5, 0.0],
                modules: vec![StationModule::node_puller(2.0, 0.01, 0.0, 0.1)],
            }],
            ..small_sector(3, false)
        };

        let layout = load_sector(app.world_mut(), &config).expect("valid sector");

        assert_eq!(layout.nodes.len(), 9);
        assert_eq!(layout.border_count, 8);
        assert_eq!(layout.connections.len(), 8);
        assert_eq!(layout.stations.len(), 1);

        assert_eq!(count::<GridNode>(&mut app), 9);
        assert_eq!(count::<NodeConnection>(&mut app), 8);
        assert_eq!(count::<Station>(&mut app), 1);
        assert_eq!(count::<Ship>(&mut app), 1);

        assert_eq!(app.world().resource::<GridSettings>().node_distance, 1.0);

        let modules = app.world().get::<StationModules>(layout.stations[0]).expect("station modules");
        assert_eq!(modules.len(), 1);

        let ship = app.world().get::<ShipMotion>(layout.ship).expect("ship motion");
        assert_eq!(ship.position(), Vec3::ZERO);

        let transform = app.world().get::<Transform>(layout.nodes[0]).expect("node transform");
        assert_eq!(transform.scale, Vec3::splat(config.node_size));
    }

    #[test]
    fn test_load_sector_sizes_spatial_hash() {
        let mut app = create_simulation_app(SimulationConfig::default());
        assert_eq!(app.world().resource::<SpatialHash>().num_side_buckets(), 64);

        let config = SectorConfig {
            side_length: 200.0,
            side_nodes: 10,
            ..Default::default()
        };
        load_sector(app.world_mut(), &config).expect("valid sector");
        assert_eq!(app.world().resource::<SpatialHash>().num_side_buckets(), 200);

        // Смещённый сектор: hash покрывает и сдвиг start_position
        let shifted = SectorConfig {
            side_length: 20.0,
            side_nodes: 10,
            start_position: [85.0, -40.0, 0.0],
            ..Default::default()
        };
        let hash = sector_spatial_hash(&shifted, &SimulationConfig::default().spatial);
        assert_eq!(hash.num_side_buckets(), 190);
        assert_ne!(hash.hash(Vec2::new(94.0, -49.0)), hash.hash(Vec2::new(76.0, -31.0)));
    }

    #[test]
    fn test_load_sector_rejects_invalid_config() {
        let mut app = create_simulation_app(SimulationConfig::default());
        let config = small_sector(1, false);

        assert_eq!(
            load_sector(app.world_mut(), &config).map(|_| ()),
            Err(SectorConfigError::TooFewNodes(1))
        );
        assert_eq!(count::<GridNode>(&mut app), 0);
        assert_eq!(count::<Ship>(&mut app), 0);
    }

    #[test]
    fn test_border_flags_survive_simulation() {
        let mut app = create_simulation_app(SimulationConfig::default());
        let config = SectorConfig {
            stations: vec![StationConfig {
                position: [0.3, 0.2, 0.0],
                modules: vec![StationModule::node_puller(2.0, 0.05, 0.02, 0.05)],
            }],
            ..small_sector(6, false)
        };
        let layout = load_sector(app.world_mut(), &config).expect("valid sector");

        let border_before: Vec<bool> = layout
            .nodes
            .iter()
            .map(|&e| app.world().get::<GridNode>(e).map(|n| n.is_border()).unwrap_or(false))
            .collect();

        for _ in 0..30 {
            run_simulation_tick(&mut app);
        }

        for (&entity, &was_border) in layout.nodes.iter().zip(&border_before) {
            if let Some(node) = app.world().get::<GridNode>(entity) {
                assert_eq!(node.is_border(), was_border);
            } else {
                // Удалить могли только interior node
                assert!(!was_border);
            }
        }
    }

    #[test]
    fn test_unload_sector_clears_world_and_hash() {
        let mut app = create_simulation_app(SimulationConfig::default());
        let config = SectorConfig {
            stations: vec![StationConfig {
                position: [5.0, 5.0, 0.0],
                modules: vec![StationModule::sphere_collider(1.0, 0.5)],
            }],
            ..small_sector(4, false)
        };
        load_sector(app.world_mut(), &config).expect("valid sector");
        run_simulation_tick(&mut app);
        assert!(!app.world().resource::<SpatialHash>().is_empty());

        unload_sector(app.world_mut());

        assert_eq!(count::<GridNode>(&mut app), 0);
        assert_eq!(count::<NodeConnection>(&mut app), 0);
        assert_eq!(count::<Station>(&mut app), 0);
        assert_eq!(count::<Ship>(&mut app), 0);
        assert!(app.world().resource::<SpatialHash>().is_empty());

        // Пустой мир продолжает тикать
        run_simulation_tick(&mut app);
    }
}
