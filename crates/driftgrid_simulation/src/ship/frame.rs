//! Local frame: поиск ближайших nodes, усреднение, Verlet шаг
//!
//! Чистые функции без ECS — системы в `systems.rs` только собирают данные.

use bevy::prelude::*;

use super::components::{ClosestNodes, ShipMotion, FRAME_NODES};
use crate::grid::GridNode;
use crate::spatial::SpatialHash;

/// Линейный поиск 3 ближайших живых nodes (O(3·N))
pub fn find_closest_nodes<'a>(
    ship_position: Vec3,
    nodes: impl IntoIterator<Item = (Entity, &'a GridNode)>,
) -> ClosestNodes {
    let mut closest = ClosestNodes::default();
    for (entity, node) in nodes {
        if node.is_dead {
            continue;
        }
        closest.offer_at(entity, ship_position.distance_squared(node.position), node.position);
    }
    closest
}

/// Поиск через spatial hash (XY плоскость, приблизительный)
///
/// `node_position` → None = node удалён или мёртв.
pub fn find_closest_nodes_hashed(
    ship_position: Vec3,
    hash: &SpatialHash,
    node_position: impl Fn(Entity) -> Option<Vec3>,
) -> ClosestNodes {
    let candidates = hash.k_nearest(ship_position.truncate(), FRAME_NODES, |entity| {
        node_position(entity).map(|p| p.truncate())
    });

    let mut closest = ClosestNodes::default();
    for entity in candidates {
        if let Some(position) = node_position(entity) {
            closest.offer_at(entity, ship_position.distance_squared(position), position);
        }
    }
    closest
}

/// Среднее 3 nodes frame'а. None если разрешились не все 3
pub fn resolve_frame_position(
    closest: &ClosestNodes,
    node_position: impl Fn(Entity) -> Option<Vec3>,
) -> Option<Vec3> {
    if !closest.is_full() {
        return None;
    }

    let mut sum = Vec3::ZERO;
    for &entity in closest.as_slice() {
        sum += node_position(entity)?;
    }
    Some(sum / FRAME_NODES as f32)
}

/// Позиция frame'а; при неполном frame — `prev_pos` корабля (не частичное среднее)
pub fn average_frame_position(
    closest: &ClosestNodes,
    node_position: impl Fn(Entity) -> Option<Vec3>,
    prev_pos: Vec3,
) -> Vec3 {
    resolve_frame_position(closest, node_position).unwrap_or(prev_pos)
}

/// Position-Verlet шаг с подтяжкой к `target` (frame + offset)
///
/// current = ship + (target − ship)·dt
/// next    = 2·current − prev + accel·dt²
pub fn integrate_verlet(motion: &mut ShipMotion, target: Vec3, accel: Vec3, dt: f32) {
    let ship_position = motion.next_pos;
    let current = ship_position + (target - ship_position) * dt;
    let next = 2.0 * current - motion.prev_pos + accel * dt * dt;

    motion.prev_pos = current;
    motion.vel = next - current;
    motion.next_pos = next;
}
