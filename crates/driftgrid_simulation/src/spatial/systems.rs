//! Spatial index systems.

use bevy::prelude::*;

use super::SpatialHash;
use crate::grid::GridNode;

/// Система: синхронизация hash с позициями nodes
///
/// Новые nodes вставляются, сдвинувшиеся переезжают в новый bucket.
/// Nodes, отброшенные переполненным bucket'ом, пробуем вставить снова каждый тик
/// (после resize они попадут в индекс).
pub fn sync_spatial_index(mut hash: ResMut<SpatialHash>, nodes: Query<(Entity, &GridNode)>) {
    for (entity, node) in nodes.iter() {
        if node.is_dead {
            continue;
        }

        let position = node.position.truncate();
        if !hash.update(entity, position) {
            hash.insert(entity, position);
        }
    }
}

/// Система: отложенный resize (bucket перевалил за половину capacity)
pub fn apply_spatial_resize(mut hash: ResMut<SpatialHash>) {
    if hash.apply_pending_resize() {
        crate::log(&format!(
            "SpatialHash resized: capacity {} ({} entities, {} dropped inserts so far)",
            hash.capacity(),
            hash.len(),
            hash.dropped_inserts()
        ));
    }
}
