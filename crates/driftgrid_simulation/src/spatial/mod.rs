//! Spatial indexing module
//!
//! Uniform spatial hash по плоскости XY + precomputed shell table для
//! expanding-ring k-nearest поиска.
//!
//! Индексируются grid nodes. Порядок в тике:
//! 1. cull (grid) — удаляет мёртвые nodes из hash
//! 2. sync_spatial_index — insert новых, перенос сдвинувшихся
//! 3. apply_spatial_resize — точка синхронизации, никто не читает hash параллельно

pub mod hash;
pub mod shells;
pub mod systems;


pub use hash::{SpatialHandle, SpatialHash};
pub use shells::ShellSearchTable;
pub use systems::{apply_spatial_resize, sync_spatial_index};

use bevy::prelude::*;

use crate::config::SimulationConfig;
use crate::SimulationSet;

/// Spatial Plugin
///
/// SpatialHash создаётся из `SimulationConfig::spatial` (или default).
pub struct SpatialIndexPlugin;

impl Plugin for SpatialIndexPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<SpatialHash>() {
            let config = app
                .world()
                .get_resource::<SimulationConfig>()
                .map(|c| c.spatial.clone())
                .unwrap_or_default();
            app.insert_resource(SpatialHash::from_config(&config));
        }

        app.add_systems(
            FixedUpdate,
            (sync_spatial_index, apply_spatial_resize)
                .chain()
                .in_set(SimulationSet::SpatialIndex),
        );
    }
}
