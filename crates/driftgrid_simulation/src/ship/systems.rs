//! Ship systems: local frame capture → fields → Verlet → colliders → Transform

use bevy::prelude::*;

use super::components::{FieldAcceleration, LocalFrame, Ship, ShipMotion};
use super::frame::{find_closest_nodes, find_closest_nodes_hashed, integrate_verlet, resolve_frame_position};
use crate::config::{FrameSearch, SimulationClock, SimulationConfig};
use crate::grid::field::field_force;
use crate::grid::GridNode;
use crate::spatial::SpatialHash;
use crate::station::{Station, StationModules};

fn live_node_position(nodes: &Query<&GridNode>, entity: Entity) -> Option<Vec3> {
    nodes.get(entity).ok().filter(|node| !node.is_dead).map(|node| node.position)
}

/// Система: 3 ближайших node + offset корабля относительно frame
///
/// Работает ДО движения сетки: offset фиксирует положение корабля относительно
/// старых позиций nodes, integrate_ships потом догоняет новые.
pub fn capture_local_frames(
    config: Res<SimulationConfig>,
    hash: Res<SpatialHash>,
    nodes: Query<&GridNode>,
    all_nodes: Query<(Entity, &GridNode)>,
    mut ships: Query<(&ShipMotion, &mut LocalFrame), With<Ship>>,
) {
    let search = config.frame_search;

    ships.par_iter_mut().for_each(|(motion, mut frame)| {
        let ship_position = motion.position();

        let closest = match search {
            FrameSearch::LinearScan => find_closest_nodes(ship_position, all_nodes.iter()),
            FrameSearch::SpatialHash => {
                find_closest_nodes_hashed(ship_position, &hash, |e| live_node_position(&nodes, e))
            }
        };

        let frame_position = resolve_frame_position(&closest, |e| live_node_position(&nodes, e));

        frame.closest = closest;
        frame.anchored = frame_position.is_some();
        frame.offset = ship_position - frame_position.unwrap_or(motion.prev_pos);
    });
}

/// Система: ускорение кораблей от ShipRepellent модулей
///
/// Направление — от станции; perpendicular = cross(away, +Z).
pub fn apply_ship_repellents(
    stations: Query<(&Transform, &StationModules), With<Station>>,
    mut ships: Query<(&ShipMotion, &mut FieldAcceleration), With<Ship>>,
) {
    let repellents: Vec<_> = stations
        .iter()
        .flat_map(|(transform, modules)| {
            let position = transform.translation;
            modules
                .iter()
                .filter_map(move |module| module.as_ship_repellent().map(|params| (position, params)))
        })
        .collect();

    ships.par_iter_mut().for_each(|(motion, mut field)| {
        let ship_position = motion.position();
        let mut accel = Vec3::ZERO;

        for (station_position, params) in &repellents {
            let distance_squared = ship_position.distance_squared(*station_position);
            let away = (ship_position - *station_position).normalize_or_zero();
            accel += field_force(away, distance_squared, params);
        }

        field.0 = accel;
    });
}

/// Система: Verlet шаг в local frame
///
/// Коррекция к frame + offset применяется только если frame разрешился
/// и при capture, и сейчас (node мог умереть в этом тике).
pub fn integrate_ships(
    clock: Res<SimulationClock>,
    nodes: Query<&GridNode>,
    mut ships: Query<(&mut ShipMotion, &LocalFrame, &FieldAcceleration), With<Ship>>,
) {
    let dt = clock.delta_seconds;

    ships.par_iter_mut().for_each(|(mut motion, frame, field)| {
        let ship_position = motion.position();

        let target = if frame.anchored {
            resolve_frame_position(&frame.closest, |e| live_node_position(&nodes, e))
                .map(|frame_position| frame_position + frame.offset)
                .unwrap_or(ship_position)
        } else {
            ship_position
        };

        let accel = motion.accel + field.0;
        integrate_verlet(&mut motion, target, accel, dt);
    });
}

/// Отталкивание от сферы: позиция на поверхность, нормальная компонента отражается
pub fn bounce_off_sphere(motion: &mut ShipMotion, center: Vec3, size: f32, bounciness: f32) -> bool {
    let offset = motion.next_pos - center;
    if offset.length_squared() >= size * size {
        return false;
    }

    let normal = offset.try_normalize().unwrap_or(Vec3::X);
    let mut velocity = motion.vel;
    let inward = velocity.dot(normal);
    if inward < 0.0 {
        velocity -= (1.0 + bounciness) * inward * normal;
    }

    motion.next_pos = center + normal * size;
    motion.vel = velocity;
    // Неявная скорость Verlet = next − prev
    motion.prev_pos = motion.next_pos - velocity;
    true
}

/// Система: ShipSphereCollider модули
pub fn resolve_sphere_colliders(
    stations: Query<(&Transform, &StationModules), With<Station>>,
    mut ships: Query<&mut ShipMotion, With<Ship>>,
) {
    let colliders: Vec<_> = stations
        .iter()
        .flat_map(|(transform, modules)| {
            let position = transform.translation;
            modules
                .iter()
                .filter_map(move |module| module.as_sphere_collider().map(|params| (position, params)))
        })
        .collect();

    if colliders.is_empty() {
        return;
    }

    ships.par_iter_mut().for_each(|mut motion| {
        for (center, params) in &colliders {
            bounce_off_sphere(&mut motion, *center, params.size, params.bounciness);
        }
    });
}

/// Система: ShipMotion → Transform (translation + facing)
pub fn sync_ship_transforms(mut ships: Query<(&ShipMotion, &mut Transform), Changed<ShipMotion>>) {
    for (motion, mut transform) in ships.iter_mut() {
        transform.translation = motion.next_pos;
        if let Some(facing) = motion.facing.try_normalize() {
            transform.rotation = Quat::from_rotation_arc(Vec3::Y, facing);
        }
    }
}
