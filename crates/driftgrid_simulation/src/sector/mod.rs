//! Sector — конфиг, генерация и выгрузка
//!
//! Сектор = решётка grid nodes + станции + стартовый корабль.
//! Connections уничтожаются только вместе с сектором (`unload_sector`).

pub mod config;
pub mod generation;

#[cfg(test)]
mod generation_tests;

pub use config::{SectorConfig, SectorConfigError, StationConfig, MAX_SECTOR_NODES};
pub use generation::{
    build_lattice, is_border_coords, load_sector, plan_border_connections, sector_spatial_hash, spawn_sector,
    unload_sector, LatticeNode, SectorLayout,
};
