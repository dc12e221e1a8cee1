//! Stations — источники полей в секторе
//!
//! Станция = entity с Transform (позиция) + StationModules (до 3 typed модулей).
//! Params модуля интерпретируются по типу:
//! - NodePuller / ShipRepellent: order, strength, perpendicular strength
//! - Dock: max docking speed, dock distance, undock thrust
//! - ShipSphereCollider: collider size, bounciness

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub const MAX_STATION_MODULES: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Reflect)]
pub enum ModuleKind {
    #[default]
    None,
    NodePuller,
    ShipRepellent,
    Dock,
    ShipSphereCollider,
}

/// Один модуль станции (descriptor из sector конфига)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub struct StationModule {
    pub kind: ModuleKind,
    #[serde(default)]
    pub params: [f32; 3],
    /// Радиус поглощения nodes (только NodePuller)
    #[serde(default)]
    pub radius: f32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Default for StationModule {
    fn default() -> Self {
        Self {
            kind: ModuleKind::None,
            params: [0.0; 3],
            radius: 0.0,
            active: true,
        }
    }
}

/// Параметры поля NodePuller / ShipRepellent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldParams {
    /// Сила спадает как r^(2·(order−1))
    pub order: f32,
    pub strength: f32,
    /// Вихревая компонента (cross(dir, +Z))
    pub perpendicular: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DockParams {
    pub max_docking_speed: f32,
    pub dock_distance: f32,
    pub undock_thrust: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereColliderParams {
    pub size: f32,
    pub bounciness: f32,
}

impl StationModule {
    pub fn node_puller(order: f32, strength: f32, perpendicular: f32, radius: f32) -> Self {
        Self {
            kind: ModuleKind::NodePuller,
            params: [order, strength, perpendicular],
            radius,
            active: true,
        }
    }

    pub fn ship_repellent(order: f32, strength: f32, perpendicular: f32) -> Self {
        Self {
            kind: ModuleKind::ShipRepellent,
            params: [order, strength, perpendicular],
            ..default()
        }
    }

    pub fn sphere_collider(size: f32, bounciness: f32) -> Self {
        Self {
            kind: ModuleKind::ShipSphereCollider,
            params: [size, bounciness, 0.0],
            ..default()
        }
    }

    fn field_params(&self) -> FieldParams {
        FieldParams {
            order: self.params[0],
            strength: self.params[1],
            perpendicular: self.params[2],
        }
    }

    /// Только активный модуль нужного типа
    pub fn as_node_puller(&self) -> Option<FieldParams> {
        (self.active && self.kind == ModuleKind::NodePuller).then(|| self.field_params())
    }

    pub fn as_ship_repellent(&self) -> Option<FieldParams> {
        (self.active && self.kind == ModuleKind::ShipRepellent).then(|| self.field_params())
    }

    pub fn as_dock(&self) -> Option<DockParams> {
        (self.active && self.kind == ModuleKind::Dock).then(|| DockParams {
            max_docking_speed: self.params[0],
            dock_distance: self.params[1],
            undock_thrust: self.params[2],
        })
    }

    pub fn as_sphere_collider(&self) -> Option<SphereColliderParams> {
        (self.active && self.kind == ModuleKind::ShipSphereCollider).then(|| SphereColliderParams {
            size: self.params[0],
            bounciness: self.params[1],
        })
    }
}

/// Станция (позиция — Transform)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(StationModules, Transform)]
pub struct Station;

/// Fixed-capacity список модулей станции
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct StationModules {
    modules: [StationModule; MAX_STATION_MODULES],
    len: usize,
}

impl StationModules {
    /// Лишние модули (> MAX_STATION_MODULES) отбрасываются
    pub fn from_slice(modules: &[StationModule]) -> Self {
        let mut result = Self::default();
        for module in modules {
            if !result.push(*module) {
                break;
            }
        }
        result
    }

    /// `false` если список уже полный
    pub fn push(&mut self, module: StationModule) -> bool {
        if self.len == MAX_STATION_MODULES {
            return false;
        }
        self.modules[self.len] = module;
        self.len += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &StationModule> {
        self.modules[..self.len].iter()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut StationModule> {
        self.modules[..self.len].get_mut(index)
    }
}

/// Spawn helper: станция с модулями в позиции
pub fn spawn_station(commands: &mut Commands, position: Vec3, modules: &[StationModule]) -> Entity {
    commands
        .spawn((
            Station,
            StationModules::from_slice(modules),
            Transform::from_translation(position),
        ))
        .id()
}
