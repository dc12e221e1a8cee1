//! Tests for ship local frame math.

#[cfg(test)]
mod tests {
    use crate::grid::GridNode;
    use crate::ship::*;
    use crate::spatial::SpatialHash;
    use bevy::prelude::*;
    use std::collections::HashMap;

    fn entity(i: u32) -> Entity {
        Entity::from_raw(i)
    }

    #[test]
    fn test_closest_nodes_sorted_insertion() {
        let mut closest = ClosestNodes::default();

        assert!(closest.offer(entity(1), 5.0));
        assert!(closest.offer(entity(2), 2.0));
        assert!(closest.offer(entity(3), 9.0));
        assert_eq!(closest.as_slice(), &[entity(2), entity(1), entity(3)]);

        // Ближе всех → в начало, самый дальний выпадает
        assert!(closest.offer(entity(4), 1.0));
        assert_eq!(closest.as_slice(), &[entity(4), entity(2), entity(1)]);
        assert_eq!(closest.distances(), &[1.0, 2.0, 5.0]);

        // Дальше худшего → отклонён
        assert!(!closest.offer(entity(5), 7.0));
        assert_eq!(closest.len(), FRAME_NODES);
    }

    #[test]
    fn test_closest_nodes_tie_broken_by_position() {
        let candidates = [
            (entity(1), Vec3::new(1.0, 0.0, 0.0)),
            (entity(2), Vec3::new(0.0, 1.0, 0.0)),
            (entity(3), Vec3::new(-1.0, 0.0, 0.0)),
            (entity(4), Vec3::new(0.0, -1.0, 0.0)),
        ];

        let mut forward = ClosestNodes::default();
        for (e, p) in candidates {
            forward.offer_at(e, p.length_squared(), p);
        }
        let mut backward = ClosestNodes::default();
        for (e, p) in candidates.into_iter().rev() {
            backward.offer_at(e, p.length_squared(), p);
        }

        // Все на расстоянии 1: порядок по x, потом y, от порядка обхода не зависит
        assert_eq!(forward.as_slice(), &[entity(3), entity(4), entity(2)]);
        assert_eq!(forward.as_slice(), backward.as_slice());
    }

    #[test]
    fn test_find_closest_skips_dead() {
        let mut dead = GridNode::interior(Vec3::new(0.1, 0.0, 0.0));
        dead.is_dead = true;

        let nodes = [
            (entity(1), dead),
            (entity(2), GridNode::interior(Vec3::new(1.0, 0.0, 0.0))),
            (entity(3), GridNode::border(Vec3::new(2.0, 0.0, 0.0))),
            (entity(4), GridNode::interior(Vec3::new(3.0, 0.0, 0.0))),
            (entity(5), GridNode::interior(Vec3::new(4.0, 0.0, 0.0))),
        ];

        let closest = find_closest_nodes(Vec3::ZERO, nodes.iter().map(|(e, n)| (*e, n)));
        assert_eq!(closest.as_slice(), &[entity(2), entity(3), entity(4)]);
    }

    #[test]
    fn test_frame_with_one_node_falls_back_to_prev_pos() {
        let positions: HashMap<Entity, Vec3> = [(entity(1), Vec3::new(10.0, 0.0, 0.0))].into();
        let lookup = |e: Entity| positions.get(&e).copied();

        let mut closest = ClosestNodes::default();
        closest.offer(entity(1), 1.0);

        let prev_pos = Vec3::new(-3.0, 2.0, 0.0);
        assert_eq!(resolve_frame_position(&closest, lookup), None);
        assert_eq!(average_frame_position(&closest, lookup, prev_pos), prev_pos);
    }

    #[test]
    fn test_frame_with_removed_node_falls_back() {
        let positions: HashMap<Entity, Vec3> =
            [(entity(1), Vec3::ZERO), (entity(2), Vec3::X)].into();

        let mut closest = ClosestNodes::default();
        closest.offer(entity(1), 0.0);
        closest.offer(entity(2), 1.0);
        closest.offer(entity(3), 2.0); // нет в positions — удалён

        let prev_pos = Vec3::splat(7.0);
        assert_eq!(
            average_frame_position(&closest, |e| positions.get(&e).copied(), prev_pos),
            prev_pos
        );
    }

    #[test]
    fn test_frame_average_of_three() {
        let positions: HashMap<Entity, Vec3> = [
            (entity(1), Vec3::new(0.0, 0.0, 0.0)),
            (entity(2), Vec3::new(3.0, 0.0, 0.0)),
            (entity(3), Vec3::new(0.0, 3.0, 0.0)),
        ]
        .into();

        let mut closest = ClosestNodes::default();
        for i in 1..=3 {
            closest.offer(entity(i), i as f32);
        }

        let average = resolve_frame_position(&closest, |e| positions.get(&e).copied());
        assert_eq!(average, Some(Vec3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn test_verlet_without_frame_correction() {
        let mut motion = ShipMotion::at_rest(Vec3::ZERO);
        motion.prev_pos = Vec3::new(-1.0, 0.0, 0.0); // скорость +1/тик
        let dt = 0.5;
        let accel = Vec3::new(0.0, 4.0, 0.0);

        let ship = motion.next_pos;
        integrate_verlet(&mut motion, ship, accel, dt);

        // next = 2·0 − (−1, 0) + (0, 4)·0.25
        assert_eq!(motion.next_pos, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(motion.prev_pos, Vec3::ZERO);
        assert_eq!(motion.vel, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_verlet_follows_moving_frame() {
        let mut motion = ShipMotion::at_rest(Vec3::ZERO);
        let dt = 0.5;

        // Frame сдвинулся на +2 по X: корабль подтягивается на dt доли
        integrate_verlet(&mut motion, Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO, dt);

        assert_eq!(motion.prev_pos, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(motion.next_pos, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(motion.vel, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_bounce_off_sphere() {
        let mut motion = ShipMotion::at_rest(Vec3::new(0.5, 0.0, 0.0));
        motion.vel = Vec3::new(-1.0, 0.0, 0.0);

        assert!(bounce_off_sphere(&mut motion, Vec3::ZERO, 2.0, 0.5));
        assert_eq!(motion.next_pos, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(motion.vel, Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(motion.next_pos - motion.prev_pos, motion.vel);

        // Снаружи — без изменений
        let before = motion;
        assert!(!bounce_off_sphere(&mut motion, Vec3::new(10.0, 0.0, 0.0), 1.0, 0.5));
        assert_eq!(motion, before);
    }

    #[test]
    fn test_hashed_search_matches_linear_on_lattice() {
        let mut hash = SpatialHash::new(1.0, 16.0, 16);
        let mut nodes = Vec::new();

        let mut id = 0;
        for y in -3..=3 {
            for x in -3..=3 {
                let node = GridNode::interior(Vec3::new(x as f32 * 1.5, y as f32 * 1.5, 0.0));
                hash.insert(entity(id), node.position.truncate());
                nodes.push((entity(id), node));
                id += 1;
            }
        }

        let lookup: HashMap<Entity, Vec3> = nodes.iter().map(|(e, n)| (*e, n.position)).collect();
        let ship = Vec3::new(0.2, 0.1, 0.0);

        let linear = find_closest_nodes(ship, nodes.iter().map(|(e, n)| (*e, n)));
        let hashed = find_closest_nodes_hashed(ship, &hash, |e| lookup.get(&e).copied());

        assert_eq!(linear.as_slice(), hashed.as_slice());
    }
}
