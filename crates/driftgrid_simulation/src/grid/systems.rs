//! Grid systems — фазы тика сетки
//!
//! Каждая фаза читает только результат предыдущей (chain + apply_deferred между ними).
//! Структурные изменения (spawn / remove marker / despawn) идут через Commands.

use bevy::prelude::*;

use super::components::{ConnectionEnd, GridNode, GridSettings, GridStats, NeedsConnection, NodeConnection};
use super::field::{node_puller_sample, FieldSample};
use crate::spatial::SpatialHash;
use crate::station::{FieldParams, Station, StationModules};

/// Snapshot активного NodePuller модуля (собирается до параллельного прохода)
#[derive(Debug, Clone, Copy)]
struct PullerSnapshot {
    position: Vec3,
    params: FieldParams,
    radius: f32,
}

fn collect_pullers(stations: &Query<(&Transform, &StationModules), With<Station>>) -> Vec<PullerSnapshot> {
    stations
        .iter()
        .flat_map(|(transform, modules)| {
            let position = transform.translation;
            modules.iter().filter_map(move |module| {
                module.as_node_puller().map(|params| PullerSnapshot {
                    position,
                    params,
                    radius: module.radius,
                })
            })
        })
        .collect()
}

/// Фаза 1: velocity от полей станций
///
/// Velocity non-border nodes пересчитывается с нуля.
/// Node внутри радиуса любого NodePuller помечается мёртвым и остаётся без velocity.
pub fn apply_station_fields(
    mut nodes: Query<&mut GridNode>,
    stations: Query<(&Transform, &StationModules), With<Station>>,
) {
    let pullers = collect_pullers(&stations);

    nodes.par_iter_mut().for_each(|mut node| {
        if !node.is_field_driven() {
            return;
        }

        let mut velocity = Vec3::ZERO;
        for puller in &pullers {
            match node_puller_sample(node.position, puller.position, &puller.params, puller.radius) {
                FieldSample::Absorbed => {
                    node.is_dead = true;
                    node.velocity = Vec3::ZERO;
                    return;
                }
                FieldSample::Velocity(v) => velocity += v,
            }
        }

        node.velocity = velocity;
    });
}

/// Фаза 2: явный Euler, один шаг на тик (velocity уже в units/tick)
pub fn integrate_node_positions(mut nodes: Query<&mut GridNode>) {
    nodes.par_iter_mut().for_each(|mut node| {
        if node.is_dead || node.velocity == Vec3::ZERO {
            return;
        }
        let velocity = node.velocity;
        node.position += velocity;
    });
}

/// Какой конец обнулить при split: border конец остаётся якорем
///
/// Ни один / оба border → сохраняем A, обнуляем B.
pub fn split_end_to_null(a_is_border: bool, b_is_border: bool) -> ConnectionEnd {
    if b_is_border && !a_is_border {
        ConnectionEnd::A
    } else {
        ConnectionEnd::B
    }
}

/// Node, который ещё участвует в графе (есть и не поглощён в этом тике)
fn live_node<'a>(nodes: &'a Query<&GridNode>, entity: Entity) -> Option<&'a GridNode> {
    nodes.get(entity).ok().filter(|node| !node.is_dead)
}

/// Фаза 3: деление перерастянутых рёбер
///
/// Для ребра длиннее 2 × node_distance:
/// - spawn нового node в середине с `NeedsConnection { connection }`
/// - non-border конец ребра обнуляется
///
/// Ребро с удалённым или мёртвым endpoint'ом пропускается: поглощённый в
/// фазе 1 node уже не кандидат, connection остаётся висеть (см. DESIGN.md).
/// Оба конца None → warning + skip.
pub fn subdivide_connections(
    mut connections: Query<(Entity, &mut NodeConnection)>,
    nodes: Query<&GridNode>,
    settings: Res<GridSettings>,
    mut stats: ResMut<GridStats>,
    par_commands: ParallelCommands,
) {
    let threshold_squared = settings.split_threshold_squared();
    let mut dangling = 0;
    let mut malformed = 0;

    // Malformed/dangling считаем последовательно (дёшево), split — параллельно
    for (entity, connection) in connections.iter() {
        if connection.is_malformed() {
            malformed += 1;
            crate::log_warning(&format!("Grid: connection {:?} has both ends null, skipping", entity));
            continue;
        }
        if let Some((a, b)) = connection.endpoints() {
            if live_node(&nodes, a).is_none() || live_node(&nodes, b).is_none() {
                dangling += 1;
            }
        }
    }

    connections.par_iter_mut().for_each(|(entity, mut connection)| {
        let Some((a, b)) = connection.endpoints() else {
            return;
        };
        let (Some(node_a), Some(node_b)) = (live_node(&nodes, a), live_node(&nodes, b)) else {
            return;
        };

        if node_a.position.distance_squared(node_b.position) <= threshold_squared {
            return;
        }

        let midpoint = (node_a.position + node_b.position) * 0.5;
        let end = split_end_to_null(node_a.is_border(), node_b.is_border());
        connection.set_end(end, None);

        par_commands.command_scope(|mut commands| {
            commands.spawn((
                GridNode::interior(midpoint),
                NeedsConnection { connection: entity },
                Transform::from_translation(midpoint),
            ));
        });
    });

    stats.dangling_skipped = dangling;
    stats.malformed_skipped = malformed;
}

/// Фаза 4: привязка новых nodes к пустому концу своего connection
///
/// Маркер снимается всегда, даже если connection пропал или уже привязан.
pub fn reconnect_split_nodes(
    mut commands: Commands,
    pending: Query<(Entity, &NeedsConnection)>,
    mut connections: Query<&mut NodeConnection>,
    mut stats: ResMut<GridStats>,
) {
    let mut splits = 0;

    for (node, needs) in pending.iter() {
        match connections.get_mut(needs.connection) {
            Ok(mut connection) => {
                if connection.bind(node) {
                    splits += 1;
                } else {
                    crate::log_warning(&format!(
                        "Grid: connection {:?} has no free end for split node {:?}",
                        needs.connection, node
                    ));
                }
            }
            Err(_) => {
                crate::log_warning(&format!(
                    "Grid: split node {:?} references missing connection {:?}",
                    node, needs.connection
                ));
            }
        }

        commands.entity(node).remove::<NeedsConnection>();
    }

    stats.splits = splits;
}

/// Фаза 5: удаление мёртвых nodes (+ из spatial hash)
///
/// Connections на удалённые nodes не трогаем — subdivide их пропускает.
pub fn cull_dead_nodes(
    mut commands: Commands,
    nodes: Query<(Entity, &GridNode)>,
    mut hash: ResMut<SpatialHash>,
    mut stats: ResMut<GridStats>,
) {
    let mut culled = 0;

    for (entity, node) in nodes.iter() {
        if !node.is_dead {
            continue;
        }
        hash.remove(entity);
        commands.entity(entity).despawn();
        culled += 1;
    }

    if culled > 0 {
        crate::log(&format!("Grid: {} nodes absorbed by stations", culled));
    }
    stats.culled = culled;
}

/// Система: GridNode.position → Transform (для render collaborator)
pub fn sync_node_transforms(mut nodes: Query<(&GridNode, &mut Transform), Changed<GridNode>>) {
    for (node, mut transform) in nodes.iter_mut() {
        transform.translation = node.position;
    }
}

/// Система: счётчики nodes / connections
pub fn update_grid_stats(
    nodes: Query<(), With<GridNode>>,
    connections: Query<(), With<NodeConnection>>,
    mut stats: ResMut<GridStats>,
) {
    stats.nodes = nodes.iter().count();
    stats.connections = connections.iter().count();
}
