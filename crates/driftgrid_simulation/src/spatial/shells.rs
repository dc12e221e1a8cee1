//! Shell search table — кольца bucket offset'ов для expanding-ring поиска
//!
//! Shell `r` = все целочисленные offset'ы `(dx, dy)` с `max(|dx|, |dy|) == r`
//! (граница квадрата), отсортированные по `dx² + dy²`.
//! Shell 0 = только центральный bucket.
//!
//! Строится один раз при создании SpatialHash, дальше только читается.

use bevy::prelude::*;

#[derive(Debug, Clone)]
pub struct ShellSearchTable {
    /// Все offset'ы подряд, shell за shell'ом
    offsets: Vec<IVec2>,
    /// `starts[r]..starts[r + 1]` — диапазон shell `r` в `offsets`
    starts: Vec<usize>,
}

impl ShellSearchTable {
    /// Построить таблицу для shell'ов `0..=max_radius`
    pub fn new(max_radius: u32) -> Self {
        let max_radius = max_radius as i32;
        let mut offsets = Vec::new();
        let mut starts = Vec::with_capacity(max_radius as usize + 2);

        for radius in 0..=max_radius {
            starts.push(offsets.len());

            let mut ring: Vec<IVec2> = Vec::with_capacity((8 * radius.max(1)) as usize);
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs().max(dy.abs()) == radius {
                        ring.push(IVec2::new(dx, dy));
                    }
                }
            }

            // Стабильный порядок: расстояние, потом dy, потом dx
            ring.sort_by_key(|o| (o.length_squared(), o.y, o.x));
            offsets.extend(ring);
        }
        starts.push(offsets.len());

        Self { offsets, starts }
    }

    /// Количество shell'ов (max_radius + 1)
    pub fn shell_count(&self) -> usize {
        self.starts.len() - 1
    }

    /// Offset'ы shell `radius` (пусто если radius вне таблицы)
    pub fn shell(&self, radius: usize) -> &[IVec2] {
        if radius >= self.shell_count() {
            return &[];
        }
        &self.offsets[self.starts[radius]..self.starts[radius + 1]]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[IVec2]> + '_ {
        (0..self.shell_count()).map(move |r| self.shell(r))
    }
}
