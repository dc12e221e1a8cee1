//! DRIFTGRID Simulation Core
//!
//! ECS-симуляция на Bevy 0.16 (headless)
//!
//! Подсистемы:
//! - grid: деформируемая сетка nodes/connections под полями станций
//! - spatial: uniform spatial hash + shell search для k-nearest
//! - ship: position-Verlet в local frame 3 ближайших nodes
//! - sector: конфиг, генерация решётки, выгрузка
//!
//! Один тик = один прогон FixedUpdate. Фазы разделены SimulationSet (chain),
//! структурные изменения только через Commands на барьерах.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod config;
pub mod grid;
pub mod logger;
pub mod sector;
pub mod ship;
pub mod spatial;
pub mod station;

// Re-export базовых типов для удобства
pub use config::{advance_clock, FrameSearch, SimulationClock, SimulationConfig, SpatialHashConfig};
pub use grid::{GridNode, GridPlugin, GridSettings, GridStats, NeedsConnection, NodeConnection};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, LogLevel};
pub use sector::{load_sector, unload_sector, SectorConfig, SectorConfigError, SectorLayout};
pub use ship::{LocalFrame, Ship, ShipMotion, ShipPlugin};
pub use spatial::{SpatialHash, SpatialIndexPlugin};
pub use station::{ModuleKind, Station, StationModule, StationModules};

/// Фазы тика (выполняются строго по порядку)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// SimulationClock
    Clock,
    /// Корабли снимают offset относительно ещё не сдвинутой сетки
    FrameCapture,
    /// Фазы сетки 1-5
    Grid,
    /// Синхронизация hash + отложенный resize
    SpatialIndex,
    /// Поля, Verlet, коллайдеры кораблей
    Ships,
    /// Transform для render collaborator, статистика
    Sync,
}

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// Берёт `SimulationConfig` из World если он уже вставлен, иначе default.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<SimulationConfig>()
            .cloned()
            .unwrap_or_default();

        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(config.seed));
        }

        app
            // Fixed timestep для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(config.tick_hz))
            .insert_resource(config)
            .init_resource::<SimulationClock>()
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Clock,
                    SimulationSet::FrameCapture,
                    SimulationSet::Grid,
                    SimulationSet::SpatialIndex,
                    SimulationSet::Ships,
                    SimulationSet::Sync,
                )
                    .chain(),
            )
            .add_systems(FixedUpdate, advance_clock.in_set(SimulationSet::Clock))
            // Подсистемы
            .add_plugins((SpatialIndexPlugin, GridPlugin, ShipPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции (без SimulationPlugin)
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(SimulationConfig {
            seed,
            ..Default::default()
        })
        .insert_resource(DeterministicRng::new(seed));

    app
}

/// Headless App с полной симуляцией и заданным конфигом
pub fn create_simulation_app(config: SimulationConfig) -> App {
    let mut app = create_headless_app(config.seed);
    app.insert_resource(config);
    app.add_plugins(SimulationPlugin);
    app
}

/// Один тик симуляции вне зависимости от wall clock
///
/// `app.update()` гоняет FixedUpdate по реальному времени (0..N раз за кадр),
/// тесты и headless бинарь тикают явно.
pub fn run_simulation_tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
