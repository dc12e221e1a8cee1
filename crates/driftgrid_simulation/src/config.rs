//! Конфигурация симуляции (Resources)
//!
//! `SimulationConfig` — глобальные параметры тика и индекса.
//! Параметры конкретного сектора — в `sector::SectorConfig`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Как корабль ищет 3 ближайших node для local frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameSearch {
    /// O(3·N) линейный проход по всем живым nodes
    #[default]
    LinearScan,
    /// k-nearest через SpatialHash (приблизительный)
    SpatialHash,
}

/// Размеры spatial hash
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialHashConfig {
    /// Сторона bucket'а (world units)
    pub bucket_size: f32,
    /// Сторона покрываемого квадрата, центр в (0, 0)
    pub total_side_length: f32,
    /// Стартовая capacity bucket'а (дальше удваивается)
    pub initial_capacity: usize,
}

impl Default for SpatialHashConfig {
    fn default() -> Self {
        Self {
            bucket_size: 1.0,
            total_side_length: 64.0,
            initial_capacity: 8,
        }
    }
}

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Частота FixedUpdate
    pub tick_hz: f64,
    /// Seed для DeterministicRng
    pub seed: u64,
    pub frame_search: FrameSearch,
    pub spatial: SpatialHashConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60.0,
            seed: 42,
            frame_search: FrameSearch::LinearScan,
            spatial: SpatialHashConfig::default(),
        }
    }
}

/// Явный контекст тика (вместо глобального Time singleton)
///
/// Обновляется один раз в начале тика системой `advance_clock`.
/// Хост меняет dt через `Time::<Fixed>::set_timestep`, не через этот resource.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimulationClock {
    pub delta_seconds: f32,
    pub tick: u64,
}

/// Система: dt = фиксированный timestep (детерминизм, не зависит от wall clock)
pub fn advance_clock(mut clock: ResMut<SimulationClock>, time: Res<Time<Fixed>>) {
    clock.delta_seconds = time.timestep().as_secs_f32();
    clock.tick += 1;
}
