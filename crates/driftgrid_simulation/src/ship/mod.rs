//! Ships — интеграция движения в local frame сетки
//!
//! Local frame = среднее 3 ближайших живых nodes. Корабль интегрируется
//! position-Verlet'ом с подтяжкой к frame + offset, поэтому дрейфует вместе
//! с деформацией сетки без чтения velocity nodes.

pub mod components;
pub mod frame;
pub mod systems;

#[cfg(test)]
mod frame_tests;

pub use components::{spawn_ship, ClosestNodes, FieldAcceleration, LocalFrame, Ship, ShipMotion, FRAME_NODES};
pub use frame::{
    average_frame_position, find_closest_nodes, find_closest_nodes_hashed, integrate_verlet,
    resolve_frame_position,
};
pub use systems::{
    apply_ship_repellents, bounce_off_sphere, capture_local_frames, integrate_ships, resolve_sphere_colliders,
    sync_ship_transforms,
};

use bevy::prelude::*;

use crate::SimulationSet;

/// Ship Plugin
///
/// Порядок выполнения:
/// 1. capture_local_frames (FrameCapture) — до движения сетки
/// 2. apply_ship_repellents → integrate_ships → resolve_sphere_colliders (Ships)
/// 3. sync_ship_transforms (Sync)
pub struct ShipPlugin;

impl Plugin for ShipPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, capture_local_frames.in_set(SimulationSet::FrameCapture));

        app.add_systems(
            FixedUpdate,
            (apply_ship_repellents, integrate_ships, resolve_sphere_colliders)
                .chain()
                .in_set(SimulationSet::Ships),
        );

        app.add_systems(FixedUpdate, sync_ship_transforms.in_set(SimulationSet::Sync));
    }
}
