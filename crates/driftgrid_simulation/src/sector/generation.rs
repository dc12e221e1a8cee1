//! Генерация сектора: решётка nodes, border→interior connections, станции, корабль
//!
//! Border = любая координата решётки 0 или side_nodes − 1 (по используемым осям).
//! Классификация — чистая функция координат, после spawn не пересчитывается.

use bevy::prelude::*;
use rand::Rng;

use super::config::{SectorConfig, SectorConfigError};
use crate::grid::{GridNode, GridSettings, NodeConnection};
use crate::ship::{spawn_ship, Ship};
use crate::spatial::SpatialHash;
use crate::station::{spawn_station, Station};
use crate::config::{SimulationConfig, SpatialHashConfig};
use crate::DeterministicRng;

/// Node решётки до spawn (план)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeNode {
    pub coords: UVec3,
    pub position: Vec3,
    pub is_border: bool,
}

/// Что заспавнила генерация
#[derive(Debug, Clone)]
pub struct SectorLayout {
    pub nodes: Vec<Entity>,
    pub border_count: usize,
    pub connections: Vec<Entity>,
    pub stations: Vec<Entity>,
    pub ship: Entity,
}

pub fn is_border_coords(coords: UVec3, side_nodes: u32, is_3d: bool) -> bool {
    let last = side_nodes.saturating_sub(1);
    let on_edge = |c: u32| c == 0 || c == last;

    on_edge(coords.x) || on_edge(coords.y) || (is_3d && on_edge(coords.z))
}

/// План решётки: позиции центрированы на start_position
///
/// Jitter сдвигает только interior nodes (border остаются на рамке).
pub fn build_lattice(config: &SectorConfig, rng: &mut impl Rng) -> Vec<LatticeNode> {
    let n = config.side_nodes;
    let depth = if config.is_3d { n } else { 1 };
    let spacing = config.node_distance();
    let half_extent = (n.saturating_sub(1)) as f32 * spacing * 0.5;
    let start = Vec3::from_array(config.start_position);
    let max_jitter = config.node_jitter * spacing;

    let mut nodes = Vec::with_capacity(config.node_count());

    for z in 0..depth {
        for y in 0..n {
            for x in 0..n {
                let coords = UVec3::new(x, y, z);
                let is_border = is_border_coords(coords, n, config.is_3d);

                let mut local = Vec3::new(
                    x as f32 * spacing - half_extent,
                    y as f32 * spacing - half_extent,
                    0.0,
                );
                if config.is_3d {
                    local.z = z as f32 * spacing - half_extent;
                }

                if !is_border && max_jitter > 0.0 {
                    local.x += rng.gen_range(-max_jitter..=max_jitter);
                    local.y += rng.gen_range(-max_jitter..=max_jitter);
                    if config.is_3d {
                        local.z += rng.gen_range(-max_jitter..=max_jitter);
                    }
                }

                nodes.push(LatticeNode {
                    coords,
                    position: start + local,
                    is_border,
                });
            }
        }
    }

    nodes
}

/// Пары (border index, ближайший interior index)
///
/// One-shot поиск ближайшего (O(B·I)), при равенстве побеждает первый найденный.
/// Без interior nodes (side_nodes == 2) connections нет.
pub fn plan_border_connections(nodes: &[LatticeNode]) -> Vec<(usize, usize)> {
    let interior: Vec<usize> = (0..nodes.len()).filter(|&i| !nodes[i].is_border).collect();
    if interior.is_empty() {
        return Vec::new();
    }

    nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.is_border)
        .filter_map(|(border_index, border)| {
            let mut best: Option<(usize, f32)> = None;
            for &candidate in &interior {
                let distance = border.position.distance_squared(nodes[candidate].position);
                if best.map_or(true, |(_, d)| distance < d) {
                    best = Some((candidate, distance));
                }
            }
            best.map(|(interior_index, _)| (border_index, interior_index))
        })
        .collect()
}

/// Spawn сектора через Commands
///
/// Вставляет `GridSettings` (node_distance) как resource.
pub fn spawn_sector(
    commands: &mut Commands,
    config: &SectorConfig,
    rng: &mut impl Rng,
) -> Result<SectorLayout, SectorConfigError> {
    config.validate()?;

    let lattice = build_lattice(config, rng);
    let scale = Vec3::splat(config.node_size);

    let nodes: Vec<Entity> = lattice
        .iter()
        .map(|planned| {
            commands
                .spawn((
                    GridNode::new(planned.position, planned.is_border),
                    Transform::from_translation(planned.position).with_scale(scale),
                ))
                .id()
        })
        .collect();

    let connections: Vec<Entity> = plan_border_connections(&lattice)
        .into_iter()
        .map(|(border, interior)| {
            commands
                .spawn(NodeConnection::new(nodes[border], nodes[interior]))
                .id()
        })
        .collect();

    let stations: Vec<Entity> = config
        .stations
        .iter()
        .map(|station| spawn_station(commands, Vec3::from_array(station.position), &station.modules))
        .collect();

    let ship = spawn_ship(commands, Vec3::from_array(config.start_position));

    commands.insert_resource(GridSettings {
        node_distance: config.node_distance(),
    });

    let border_count = lattice.iter().filter(|n| n.is_border).count();
    crate::log_info(&format!(
        "Sector generated: {} nodes ({} border), {} connections, {} stations",
        nodes.len(),
        border_count,
        connections.len(),
        stations.len()
    ));

    Ok(SectorLayout {
        nodes,
        border_count,
        connections,
        stations,
        ship,
    })
}

/// SpatialHash под размер сектора
///
/// Hash центрирован в (0, 0), поэтому сторона = side_length + 2 × сдвиг
/// start_position по XY. Bucket size и capacity берутся из `SpatialHashConfig`.
pub fn sector_spatial_hash(config: &SectorConfig, spatial: &SpatialHashConfig) -> SpatialHash {
    let reach = config.start_position[0].abs().max(config.start_position[1].abs());
    SpatialHash::new(
        spatial.bucket_size,
        config.side_length + 2.0 * reach,
        spatial.initial_capacity,
    )
}

/// Загрузить сектор в World (RNG из `DeterministicRng`)
///
/// SpatialHash пересоздаётся под размеры сектора.
pub fn load_sector(world: &mut World, config: &SectorConfig) -> Result<SectorLayout, SectorConfigError> {
    if !world.contains_resource::<DeterministicRng>() {
        world.insert_resource(DeterministicRng::new(0));
    }

    let layout = world.resource_scope(|world, mut rng: Mut<DeterministicRng>| {
        let mut commands = world.commands();
        spawn_sector(&mut commands, config, &mut rng.rng)
    })?;

    let spatial = world
        .get_resource::<SimulationConfig>()
        .map(|c| c.spatial.clone())
        .unwrap_or_default();
    let hash = sector_spatial_hash(config, &spatial);
    crate::log(&format!(
        "SpatialHash rebuilt for sector: {} side buckets",
        hash.num_side_buckets()
    ));
    world.insert_resource(hash);

    world.flush();
    Ok(layout)
}

/// Batch teardown: все nodes, connections, станции и корабли + очистка hash
pub fn unload_sector(world: &mut World) {
    let mut doomed: Vec<Entity> = Vec::new();
    doomed.extend(world.query_filtered::<Entity, With<GridNode>>().iter(world));
    doomed.extend(world.query_filtered::<Entity, With<NodeConnection>>().iter(world));
    doomed.extend(world.query_filtered::<Entity, With<Station>>().iter(world));
    doomed.extend(world.query_filtered::<Entity, With<Ship>>().iter(world));

    let count = doomed.len();
    for entity in doomed {
        world.despawn(entity);
    }

    if let Some(mut hash) = world.get_resource_mut::<SpatialHash>() {
        hash.clear();
    }

    crate::log_info(&format!("Sector unloaded: {} entities despawned", count));
}
