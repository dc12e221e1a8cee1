//! Grid компоненты: nodes, connections, маркеры split протокола

use bevy::prelude::*;

/// Узел деформируемой сетки (point mass)
///
/// Инварианты:
/// - `is_border` задаётся при создании и больше никогда не меняется
/// - border node не получает velocity от полей и не поглощается станциями
/// - `is_dead` ставится один раз, node удаляется в cull фазе того же тика
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
#[require(Transform)]
pub struct GridNode {
    pub position: Vec3,
    pub velocity: Vec3,
    is_border: bool,
    pub is_dead: bool,
}

impl GridNode {
    pub fn new(position: Vec3, is_border: bool) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            is_border,
            is_dead: false,
        }
    }

    pub fn interior(position: Vec3) -> Self {
        Self::new(position, false)
    }

    pub fn border(position: Vec3) -> Self {
        Self::new(position, true)
    }

    pub fn is_border(&self) -> bool {
        self.is_border
    }

    /// Живой и не border — участвует в field фазе
    pub fn is_field_driven(&self) -> bool {
        !self.is_border && !self.is_dead
    }
}

/// Какой конец connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ConnectionEnd {
    A,
    B,
}

/// Неориентированное ребро между двумя nodes (отдельная entity, владеет граф)
///
/// Инвариант: максимум один конец `None` (состояние split).
/// Оба `None` — malformed, такой connection не должен существовать.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct NodeConnection {
    pub a: Option<Entity>,
    pub b: Option<Entity>,
}

impl NodeConnection {
    pub fn new(a: Entity, b: Entity) -> Self {
        Self { a: Some(a), b: Some(b) }
    }

    /// Оба конца привязаны
    pub fn endpoints(&self) -> Option<(Entity, Entity)> {
        Some((self.a?, self.b?))
    }

    pub fn is_malformed(&self) -> bool {
        self.a.is_none() && self.b.is_none()
    }

    /// Первый пустой конец (A приоритетнее)
    pub fn null_end(&self) -> Option<ConnectionEnd> {
        if self.a.is_none() {
            Some(ConnectionEnd::A)
        } else if self.b.is_none() {
            Some(ConnectionEnd::B)
        } else {
            None
        }
    }

    pub fn end(&self, end: ConnectionEnd) -> Option<Entity> {
        match end {
            ConnectionEnd::A => self.a,
            ConnectionEnd::B => self.b,
        }
    }

    pub fn set_end(&mut self, end: ConnectionEnd, node: Option<Entity>) {
        match end {
            ConnectionEnd::A => self.a = node,
            ConnectionEnd::B => self.b = node,
        }
    }

    /// Привязать node в первый пустой конец. `false` если пустых нет
    pub fn bind(&mut self, node: Entity) -> bool {
        match self.null_end() {
            Some(end) => {
                self.set_end(end, Some(node));
                true
            }
            None => false,
        }
    }

    pub fn touches(&self, node: Entity) -> bool {
        self.a == Some(node) || self.b == Some(node)
    }
}

/// Транзитный маркер: node создан split'ом и ждёт привязки к `connection`
///
/// Живёт от subdivide фазы до reconnect фазы того же тика.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct NeedsConnection {
    pub connection: Entity,
}

/// Параметры сетки текущего сектора
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct GridSettings {
    /// Шаг исходной решётки (side_length / side_nodes)
    pub node_distance: f32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self { node_distance: 1.0 }
    }
}

impl GridSettings {
    /// Ребро длиннее 2 × node_distance делится пополам
    pub fn split_threshold_squared(&self) -> f32 {
        let threshold = 2.0 * self.node_distance;
        threshold * threshold
    }
}

/// Диагностика последнего тика
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridStats {
    pub nodes: usize,
    pub connections: usize,
    pub splits: usize,
    pub culled: usize,
    /// Connections с удалённым endpoint'ом (окно после смерти node)
    pub dangling_skipped: usize,
    pub malformed_skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_bind_fills_null_end() {
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        let c = Entity::from_raw(3);

        let mut connection = NodeConnection::new(a, b);
        assert_eq!(connection.endpoints(), Some((a, b)));
        assert!(!connection.bind(c));

        connection.set_end(ConnectionEnd::B, None);
        assert_eq!(connection.null_end(), Some(ConnectionEnd::B));
        assert!(connection.endpoints().is_none());

        assert!(connection.bind(c));
        assert_eq!(connection.endpoints(), Some((a, c)));
        assert!(connection.touches(c));
        assert!(!connection.touches(b));
    }

    #[test]
    fn test_malformed_connection_binds_a_first() {
        let mut connection = NodeConnection { a: None, b: None };
        assert!(connection.is_malformed());

        let node = Entity::from_raw(7);
        assert!(connection.bind(node));
        assert_eq!(connection.a, Some(node));
        assert!(!connection.is_malformed());
    }

    #[test]
    fn test_split_threshold() {
        let settings = GridSettings { node_distance: 1.5 };
        assert_eq!(settings.split_threshold_squared(), 9.0);
    }

    #[test]
    fn test_border_flag_fixed_at_creation() {
        let node = GridNode::border(Vec3::ONE);
        assert!(node.is_border());
        assert!(!node.is_field_driven());

        let mut interior = GridNode::interior(Vec3::ZERO);
        assert!(interior.is_field_driven());
        interior.is_dead = true;
        assert!(!interior.is_field_driven());
    }
}
