//! Sector конфиг (приходит от внешнего JSON loader'а)

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::station::{StationModule, MAX_STATION_MODULES};

/// Верхняя граница размера решётки (nodes на сектор)
pub const MAX_SECTOR_NODES: usize = 1 << 22;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    pub position: [f32; 3],
    #[serde(default)]
    pub modules: Vec<StationModule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorConfig {
    /// Сторона сектора (world units)
    pub side_length: f32,
    /// Nodes на сторону решётки
    pub side_nodes: u32,
    /// Решётка side_nodes³ вместо side_nodes²
    pub is_3d: bool,
    /// Визуальный размер node (scale Transform)
    pub node_size: f32,
    pub stations: Vec<StationConfig>,
    /// Центр решётки и точка spawn корабля
    pub start_position: [f32; 3],
    /// Случайный сдвиг interior nodes, в долях node_distance
    pub node_jitter: f32,
}

impl Default for SectorConfig {
    fn default() -> Self {
        Self {
            side_length: 20.0,
            side_nodes: 20,
            is_3d: false,
            node_size: 0.1,
            stations: Vec::new(),
            start_position: [0.0; 3],
            node_jitter: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SectorConfigError {
    #[error("side_nodes must be at least 2, got {0}")]
    TooFewNodes(u32),
    #[error("sector would have {count} nodes, at most {max} supported")]
    TooManyNodes { count: usize, max: usize },
    #[error("side_length must be positive, got {0}")]
    InvalidSideLength(f32),
    #[error("node_size must be positive, got {0}")]
    InvalidNodeSize(f32),
    #[error("node_jitter must be in [0, 0.5), got {0}")]
    InvalidJitter(f32),
    #[error("station {station} has {count} modules, at most {max} supported")]
    TooManyModules {
        station: usize,
        count: usize,
        max: usize,
    },
}

impl SectorConfig {
    /// Шаг решётки
    pub fn node_distance(&self) -> f32 {
        self.side_length / self.side_nodes as f32
    }

    /// side_nodes² (2D) или side_nodes³ (3D), в usize без переполнения u32
    pub fn node_count(&self) -> usize {
        let side = self.side_nodes as usize;
        let depth = if self.is_3d { side } else { 1 };
        side.saturating_mul(side).saturating_mul(depth)
    }

    pub fn validate(&self) -> Result<(), SectorConfigError> {
        if self.side_nodes < 2 {
            return Err(SectorConfigError::TooFewNodes(self.side_nodes));
        }
        let count = self.node_count();
        if count > MAX_SECTOR_NODES {
            return Err(SectorConfigError::TooManyNodes {
                count,
                max: MAX_SECTOR_NODES,
            });
        }
        if !(self.side_length > 0.0) {
            return Err(SectorConfigError::InvalidSideLength(self.side_length));
        }
        if !(self.node_size > 0.0) {
            return Err(SectorConfigError::InvalidNodeSize(self.node_size));
        }
        if !(0.0..0.5).contains(&self.node_jitter) {
            return Err(SectorConfigError::InvalidJitter(self.node_jitter));
        }

        for (index, station) in self.stations.iter().enumerate() {
            if station.modules.len() > MAX_STATION_MODULES {
                return Err(SectorConfigError::TooManyModules {
                    station: index,
                    count: station.modules.len(),
                    max: MAX_STATION_MODULES,
                });
            }
        }

        Ok(())
    }
}
