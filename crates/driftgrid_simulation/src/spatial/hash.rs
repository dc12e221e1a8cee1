//! Uniform spatial hash (2D, фиксированная сетка bucket'ов)
//!
//! Layout:
//! - `num_side_buckets × num_side_buckets` bucket'ов, покрывающих квадрат
//!   `[-side/2, side/2)²` вокруг начала координат
//! - каждый bucket = слайс из `capacity` слотов в плоском `entities_in_buckets`
//! - слоты за `bucket_counts[b]` — мусор
//!
//! Переполнение bucket'а = insert молча отбрасывается (lossy деградация).
//! Рост capacity отложенный: insert только поднимает флаг, `resize()` вызывается
//! в точке синхронизации (отдельная система, `&mut` доступ).

use bevy::prelude::*;
use std::collections::HashMap;

use super::shells::ShellSearchTable;
use crate::config::SpatialHashConfig;

/// Результат успешного insert: в какой bucket попала entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialHandle {
    pub bucket: usize,
}

#[derive(Debug, Clone, Copy)]
struct SlotRef {
    bucket: usize,
    slot: usize,
}

#[derive(Resource, Debug, Clone)]
pub struct SpatialHash {
    bucket_size: f32,
    inv_bucket_size: f32,
    /// Сдвиг мировых координат в положительный квадрант (side / 2)
    offset: f32,
    num_side_buckets: usize,
    capacity: usize,

    entities_in_buckets: Vec<Entity>,
    bucket_counts: Vec<usize>,

    /// Entity → текущий слот (для O(1) swap-remove)
    locations: HashMap<Entity, SlotRef>,

    shells: ShellSearchTable,

    resize_pending: bool,
    dropped_inserts: u64,
}

impl SpatialHash {
    pub fn new(bucket_size: f32, total_side_length: f32, capacity: usize) -> Self {
        let bucket_size = bucket_size.max(f32::EPSILON);
        let num_side_buckets = ((total_side_length / bucket_size).ceil() as usize).max(1);
        let num_buckets = num_side_buckets * num_side_buckets;
        let capacity = capacity.max(1);

        Self {
            bucket_size,
            inv_bucket_size: 1.0 / bucket_size,
            offset: total_side_length * 0.5,
            num_side_buckets,
            capacity,
            entities_in_buckets: vec![Entity::PLACEHOLDER; num_buckets * capacity],
            bucket_counts: vec![0; num_buckets],
            locations: HashMap::new(),
            shells: ShellSearchTable::new(num_side_buckets as u32),
            resize_pending: false,
            dropped_inserts: 0,
        }
    }

    pub fn from_config(config: &SpatialHashConfig) -> Self {
        Self::new(
            config.bucket_size,
            config.total_side_length,
            config.initial_capacity,
        )
    }

    pub fn bucket_size(&self) -> f32 {
        self.bucket_size
    }

    pub fn num_side_buckets(&self) -> usize {
        self.num_side_buckets
    }

    pub fn num_buckets(&self) -> usize {
        self.bucket_counts.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn bucket_counts(&self) -> &[usize] {
        &self.bucket_counts
    }

    /// Живые entity bucket'а (порядок внутри bucket'а не стабилен)
    pub fn bucket_entities(&self, bucket: usize) -> &[Entity] {
        let Some(&count) = self.bucket_counts.get(bucket) else {
            return &[];
        };
        let base = bucket * self.capacity;
        &self.entities_in_buckets[base..base + count]
    }

    /// Количество проиндексированных entity
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.locations.contains_key(&entity)
    }

    pub fn bucket_of(&self, entity: Entity) -> Option<usize> {
        self.locations.get(&entity).map(|loc| loc.bucket)
    }

    pub fn resize_pending(&self) -> bool {
        self.resize_pending
    }

    /// Сколько insert'ов было отброшено из-за полного bucket'а (за всё время)
    pub fn dropped_inserts(&self) -> u64 {
        self.dropped_inserts
    }

    /// Координаты клетки без clamp (могут быть вне сетки)
    fn cell_of(&self, position: Vec2) -> IVec2 {
        let scaled = (position + Vec2::splat(self.offset)) * self.inv_bucket_size;
        IVec2::new(scaled.x.floor() as i32, scaled.y.floor() as i32)
    }

    /// Клетка, прижатая к сетке по каждой оси (центр для shell поиска)
    fn clamped_cell(&self, position: Vec2) -> IVec2 {
        let max = self.num_side_buckets as i32 - 1;
        self.cell_of(position).clamp(IVec2::ZERO, IVec2::splat(max))
    }

    /// Позиция → плоский индекс bucket'а
    ///
    /// Clamp делается по плоскому индексу, поэтому далёкие точки вне сетки
    /// могут попасть в один и тот же крайний bucket. Это допустимо.
    pub fn hash(&self, position: Vec2) -> usize {
        let cell = self.cell_of(position);
        let side = self.num_side_buckets as i64;
        let flat = cell.x as i64 + cell.y as i64 * side;
        flat.clamp(0, self.num_buckets() as i64 - 1) as usize
    }

    pub fn insert(&mut self, entity: Entity, position: Vec2) -> Option<SpatialHandle> {
        // Повторный insert = перемещение, дубликатов в bucket'ах не бывает
        if self.locations.contains_key(&entity) {
            self.remove(entity);
        }

        let bucket = self.hash(position);
        let count = self.bucket_counts[bucket];

        if count >= self.capacity {
            self.dropped_inserts += 1;
            if self.dropped_inserts == 1 {
                crate::log_warning(&format!(
                    "SpatialHash: bucket {} full (capacity {}), dropping inserts until resize",
                    bucket, self.capacity
                ));
            }
            return None;
        }

        self.entities_in_buckets[bucket * self.capacity + count] = entity;
        self.bucket_counts[bucket] = count + 1;
        self.locations.insert(entity, SlotRef { bucket, slot: count });

        if count + 1 > self.capacity / 2 {
            self.resize_pending = true;
        }

        Some(SpatialHandle { bucket })
    }

    /// Перенести entity если она сменила bucket
    ///
    /// Возвращает `true` если entity проиндексирована после вызова.
    /// Не проиндексированная entity не вставляется (для этого есть `insert`).
    pub fn update(&mut self, entity: Entity, new_position: Vec2) -> bool {
        let Some(loc) = self.locations.get(&entity).copied() else {
            return false;
        };

        if loc.bucket == self.hash(new_position) {
            return true;
        }

        self.remove(entity);
        self.insert(entity, new_position).is_some()
    }

    /// Swap-remove: последний слот bucket'а переезжает на место удалённого
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(loc) = self.locations.remove(&entity) else {
            return false;
        };

        let base = loc.bucket * self.capacity;
        let last = self.bucket_counts[loc.bucket] - 1;

        if loc.slot != last {
            let moved = self.entities_in_buckets[base + last];
            self.entities_in_buckets[base + loc.slot] = moved;
            if let Some(moved_loc) = self.locations.get_mut(&moved) {
                moved_loc.slot = loc.slot;
            }
        }

        self.entities_in_buckets[base + last] = Entity::PLACEHOLDER;
        self.bucket_counts[loc.bucket] = last;
        true
    }

    pub fn clear(&mut self) {
        self.bucket_counts.iter_mut().for_each(|c| *c = 0);
        self.entities_in_buckets.fill(Entity::PLACEHOLDER);
        self.locations.clear();
        self.resize_pending = false;
    }

    /// k ближайших к `point` (см. `k_nearest_by`)
    pub fn k_nearest(
        &self,
        point: Vec2,
        k: usize,
        position_of: impl Fn(Entity) -> Option<Vec2>,
    ) -> Vec<Entity> {
        self.k_nearest_by(point, k, position_of, |_| true)
    }

    /// Expanding-ring поиск k ближайших
    ///
    /// Shell'ы обходятся по возрастанию радиуса. Кандидаты одного shell'а
    /// сортируются по реальному расстоянию до `point` (при равенстве — по x, потом y)
    /// и добавляются пока не наберётся `k`.
    /// Результат приблизительный: ближняя entity из следующего shell'а может
    /// оказаться ближе последних взятых из текущего.
    ///
    /// `position_of` → None = entity не кандидат (удалена / нет позиции).
    pub fn k_nearest_by(
        &self,
        point: Vec2,
        k: usize,
        position_of: impl Fn(Entity) -> Option<Vec2>,
        accept: impl Fn(Entity) -> bool,
    ) -> Vec<Entity> {
        let mut result = Vec::with_capacity(k);
        if k == 0 || self.is_empty() {
            return result;
        }

        let center = self.clamped_cell(point);
        let side = self.num_side_buckets as i32;
        let mut shell_hits: Vec<(f32, Vec2, Entity)> = Vec::new();

        for shell in self.shells.iter() {
            shell_hits.clear();

            for offset in shell {
                let cell = center + *offset;
                // Без wraparound
                if cell.x < 0 || cell.y < 0 || cell.x >= side || cell.y >= side {
                    continue;
                }

                let bucket = (cell.x + cell.y * side) as usize;
                for &entity in self.bucket_entities(bucket) {
                    if !accept(entity) {
                        continue;
                    }
                    if let Some(position) = position_of(entity) {
                        shell_hits.push((position.distance_squared(point), position, entity));
                    }
                }
            }

            // Равные расстояния — по позиции: порядок внутри bucket'а зависит от истории swap-remove
            shell_hits.sort_by(|a, b| {
                a.0.total_cmp(&b.0)
                    .then_with(|| a.1.x.total_cmp(&b.1.x))
                    .then_with(|| a.1.y.total_cmp(&b.1.y))
            });

            for &(_, _, entity) in &shell_hits {
                result.push(entity);
                if result.len() == k {
                    return result;
                }
            }
        }

        result
    }

    /// Удвоить capacity всех bucket'ов
    ///
    /// Копирование bucket-major: bucket и порядок внутри bucket'а сохраняются,
    /// поэтому `locations` остаются валидными.
    pub fn resize(&mut self) {
        let old_capacity = self.capacity;
        let new_capacity = old_capacity * 2;
        let mut next = vec![Entity::PLACEHOLDER; self.num_buckets() * new_capacity];

        for (bucket, &count) in self.bucket_counts.iter().enumerate() {
            let src = bucket * old_capacity;
            let dst = bucket * new_capacity;
            next[dst..dst + count].copy_from_slice(&self.entities_in_buckets[src..src + count]);
        }

        self.entities_in_buckets = next;
        self.capacity = new_capacity;
        self.resize_pending = self.bucket_counts.iter().any(|&c| c > new_capacity / 2);
    }

    /// Выполнить отложенный resize (если был запрошен). `true` = resize был
    pub fn apply_pending_resize(&mut self) -> bool {
        if !self.resize_pending {
            return false;
        }
        self.resize();
        true
    }
}
