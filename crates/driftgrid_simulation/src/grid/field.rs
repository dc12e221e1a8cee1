//! Поле станции: расчёт вклада одного модуля в velocity точки
//!
//! Формула (r² = distance²):
//!   v += strength / (r²)^(order−1) · dir + perpendicular / (r²)^(order−1) · cross(dir, +Z)
//!
//! order = 2 → классическое 1/r².

use bevy::prelude::*;

use crate::station::FieldParams;

/// Результат поля для одного node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldSample {
    /// Node внутри радиуса модуля — поглощён станцией
    Absorbed,
    Velocity(Vec3),
}

/// Вклад поля с направлением `dir` (уже нормализованным)
///
/// Общая часть для NodePuller (dir к станции) и ShipRepellent (dir от станции).
pub fn field_force(dir: Vec3, distance_squared: f32, params: &FieldParams) -> Vec3 {
    let falloff = distance_squared.powf(params.order - 1.0);
    if falloff <= 0.0 || !falloff.is_finite() {
        return Vec3::ZERO;
    }

    let perpendicular_dir = dir.cross(Vec3::Z);
    (params.strength / falloff) * dir + (params.perpendicular / falloff) * perpendicular_dir
}

/// NodePuller: притяжение node к станции (или поглощение)
pub fn node_puller_sample(
    node_position: Vec3,
    station_position: Vec3,
    params: &FieldParams,
    absorb_radius: f32,
) -> FieldSample {
    let distance_squared = node_position.distance_squared(station_position);
    if distance_squared < absorb_radius * absorb_radius {
        return FieldSample::Absorbed;
    }

    let dir = (station_position - node_position).normalize_or_zero();
    FieldSample::Velocity(field_force(dir, distance_squared, params))
}
