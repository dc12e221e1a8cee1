//! Node grid — деформируемая сетка nodes + connections
//!
//! Порядок фаз в тике (SimulationSet::Grid, строго последовательно):
//! 1. apply_station_fields — velocity от NodePuller модулей, поглощение
//! 2. integrate_node_positions — position += velocity
//! 3. subdivide_connections — split рёбер длиннее 2 × node_distance
//! 4. reconnect_split_nodes — новые nodes занимают пустой конец ребра
//! 5. cull_dead_nodes — despawn поглощённых nodes
//!
//! Внутри фазы порядок по entities не гарантирован (par_iter), фазы
//! разделены барьером: Commands применяются между ними.

use bevy::prelude::*;

pub mod components;
pub mod field;
pub mod systems;


pub use components::{ConnectionEnd, GridNode, GridSettings, GridStats, NeedsConnection, NodeConnection};
pub use field::{field_force, node_puller_sample, FieldSample};
pub use systems::{
    apply_station_fields, cull_dead_nodes, integrate_node_positions, reconnect_split_nodes, split_end_to_null,
    subdivide_connections, sync_node_transforms, update_grid_stats,
};

use crate::SimulationSet;

/// Grid Plugin
///
/// Фазы 1-5 в SimulationSet::Grid, Transform/stats в SimulationSet::Sync.
pub struct GridPlugin;

impl Plugin for GridPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GridSettings>()
            .init_resource::<GridStats>();

        app.add_systems(
            FixedUpdate,
            (
                apply_station_fields,
                integrate_node_positions,
                subdivide_connections,
                reconnect_split_nodes,
                cull_dead_nodes,
            )
                .chain() // Барьер между фазами
                .in_set(SimulationSet::Grid),
        );

        app.add_systems(
            FixedUpdate,
            (sync_node_transforms, update_grid_stats).in_set(SimulationSet::Sync),
        );
    }
}
