//! Ship компоненты: Verlet состояние, local frame, внешнее ускорение полей

use bevy::prelude::*;
use std::cmp::Ordering;

/// Сколько nodes задают local frame корабля
pub const FRAME_NODES: usize = 3;

/// Корабль (Required: ShipMotion, LocalFrame, FieldAcceleration)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(ShipMotion, LocalFrame, FieldAcceleration, Transform)]
pub struct Ship;

/// Position-Verlet состояние
///
/// Текущая позиция корабля = `next_pos` прошлого тика.
/// `accel` и `facing` пишет внешний контроллер (input / AI), остальное — integrator.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ShipMotion {
    pub prev_pos: Vec3,
    pub next_pos: Vec3,
    pub accel: Vec3,
    pub vel: Vec3,
    pub facing: Vec3,
}

impl Default for ShipMotion {
    fn default() -> Self {
        Self::at_rest(Vec3::ZERO)
    }
}

impl ShipMotion {
    pub fn at_rest(position: Vec3) -> Self {
        Self {
            prev_pos: position,
            next_pos: position,
            accel: Vec3::ZERO,
            vel: Vec3::ZERO,
            facing: Vec3::Y,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.next_pos
    }
}

/// До 3 ближайших nodes, отсортированы по расстоянию (ближайший первый)
///
/// Более близкий node вставляется перед дальними и сдвигает их назад,
/// самый дальний выпадает. Равные расстояния упорядочиваются по позиции
/// (x, потом y, потом z): порядок обхода query между запусками не стабилен.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ClosestNodes {
    nodes: [Entity; FRAME_NODES],
    distances: [f32; FRAME_NODES],
    positions: [Vec3; FRAME_NODES],
    len: usize,
}

impl Default for ClosestNodes {
    fn default() -> Self {
        Self {
            nodes: [Entity::PLACEHOLDER; FRAME_NODES],
            distances: [f32::INFINITY; FRAME_NODES],
            positions: [Vec3::ZERO; FRAME_NODES],
            len: 0,
        }
    }
}

/// Порядок кандидатов: расстояние, затем позиция по осям
pub fn rank_candidates(a: (f32, Vec3), b: (f32, Vec3)) -> Ordering {
    a.0.total_cmp(&b.0)
        .then_with(|| a.1.x.total_cmp(&b.1.x))
        .then_with(|| a.1.y.total_cmp(&b.1.y))
        .then_with(|| a.1.z.total_cmp(&b.1.z))
}

impl ClosestNodes {
    /// Предложить кандидата без позиции. При равенстве побеждает предложенный раньше
    pub fn offer(&mut self, node: Entity, distance_squared: f32) -> bool {
        self.offer_at(node, distance_squared, Vec3::ZERO)
    }

    /// Предложить кандидата. `true` если он попал в top-3
    pub fn offer_at(&mut self, node: Entity, distance_squared: f32, position: Vec3) -> bool {
        let candidate = (distance_squared, position);
        let ranks_before = |i: usize| {
            rank_candidates(candidate, (self.distances[i], self.positions[i])) == Ordering::Less
        };

        if self.len == FRAME_NODES && !ranks_before(FRAME_NODES - 1) {
            return false;
        }

        let index = (0..self.len).find(|&i| ranks_before(i)).unwrap_or(self.len);

        let last = self.len.min(FRAME_NODES - 1);
        for j in (index..last).rev() {
            self.nodes[j + 1] = self.nodes[j];
            self.distances[j + 1] = self.distances[j];
            self.positions[j + 1] = self.positions[j];
        }

        self.nodes[index] = node;
        self.distances[index] = distance_squared;
        self.positions[index] = position;
        self.len = (self.len + 1).min(FRAME_NODES);
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == FRAME_NODES
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.nodes[..self.len]
    }

    pub fn distances(&self) -> &[f32] {
        &self.distances[..self.len]
    }
}

/// Local frame корабля на текущий тик
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct LocalFrame {
    pub closest: ClosestNodes,
    /// ship − frame, снимается до движения сетки
    pub offset: Vec3,
    /// Frame разрешился (3 живых node) в момент снятия offset
    pub anchored: bool,
}

/// Ускорение от ShipRepellent модулей станций (пересчитывается каждый тик)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct FieldAcceleration(pub Vec3);

/// Spawn helper: корабль в покое
pub fn spawn_ship(commands: &mut Commands, position: Vec3) -> Entity {
    commands
        .spawn((
            Ship,
            ShipMotion::at_rest(position),
            Transform::from_translation(position),
        ))
        .id()
}
