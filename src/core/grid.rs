/*!
 * 过滤网格
 *
 * - `FiltrationGrid`: 每个方向一条严格递增的阈值序列
 * - `GridShape`: 网格形状与位置的打包整数键（行主序，最后一个方向变化最快）
 * - `Grid<T>`: 按打包键存储的单元格，支持稠密（Vec）与稀疏（HashMap）两种布局
 *
 * # 打包键
 *
 * ```text
 * size = (2, 1)            // 方向 0 有 3 个坐标，方向 1 有 2 个
 * key((i, j)) = i * 2 + j  // (0,0)=0 (0,1)=1 (1,0)=2 ... (2,1)=5
 * ```
 */

use crate::error::{PersistenceError, Result};
use crate::types::{Position, Value};
use std::collections::HashMap;

// ============================================================================
// FiltrationGrid
// ============================================================================

/// r 个方向的阈值序列
///
/// 方向 i 上的网格尺寸为 `thresholds[i].len() - 1`。
#[derive(Debug, Clone, PartialEq)]
pub struct FiltrationGrid {
    thresholds: Vec<Vec<Value>>,
}

impl FiltrationGrid {
    /// # Errors
    ///
    /// `InvalidInput`: 没有方向、某方向为空、含非有限值或不严格递增
    pub fn new(thresholds: Vec<Vec<Value>>) -> Result<Self> {
        if thresholds.is_empty() {
            return Err(PersistenceError::InvalidInput(
                "filtration needs at least one direction".to_string(),
            ));
        }
        for (direction, values) in thresholds.iter().enumerate() {
            if values.is_empty() {
                return Err(PersistenceError::InvalidInput(format!(
                    "direction {} has no thresholds",
                    direction
                )));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(PersistenceError::InvalidInput(format!(
                    "direction {} has a non-finite threshold",
                    direction
                )));
            }
            if values.windows(2).any(|w| w[0] >= w[1]) {
                return Err(PersistenceError::InvalidInput(format!(
                    "thresholds of direction {} are not strictly increasing",
                    direction
                )));
            }
        }
        Ok(Self { thresholds })
    }

    #[inline]
    pub fn directions(&self) -> usize {
        self.thresholds.len()
    }

    pub fn thresholds(&self, direction: usize) -> &[Value] {
        &self.thresholds[direction]
    }

    /// 最粗（最大）阈值
    pub fn max_threshold(&self, direction: usize) -> Value {
        let values = &self.thresholds[direction];
        values[values.len() - 1]
    }

    pub fn max_thresholds(&self) -> Vec<Value> {
        (0..self.directions())
            .map(|d| self.max_threshold(d))
            .collect()
    }

    pub fn shape(&self) -> GridShape {
        GridShape::new(self.thresholds.iter().map(|t| t.len() - 1).collect())
    }

    /// 最小的坐标 i 使得 value ≤ thresholds[i]；超过最大阈值时返回 None
    pub fn filtration_index(&self, direction: usize, value: Value) -> Option<usize> {
        let values = &self.thresholds[direction];
        let index = values.partition_point(|&t| t < value);
        (index < values.len()).then_some(index)
    }
}

// ============================================================================
// GridShape
// ============================================================================

/// 网格形状：每个方向的最大坐标（含）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridShape {
    size: Vec<usize>,
    strides: Vec<usize>,
    len: usize,
}

impl GridShape {
    pub fn new(size: Vec<usize>) -> Self {
        let mut strides = vec![1; size.len()];
        for d in (0..size.len().saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * (size[d + 1] + 1);
        }
        let len = size.iter().map(|s| s + 1).product();
        Self { size, strides, len }
    }

    #[inline]
    pub fn directions(&self) -> usize {
        self.size.len()
    }

    /// 每个方向的最大坐标
    #[inline]
    pub fn size(&self) -> &[usize] {
        &self.size
    }

    /// 位置总数
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, v: &Position) -> bool {
        v.directions() == self.size.len()
            && v.coords().iter().zip(&self.size).all(|(c, s)| c <= s)
    }

    /// v 在方向 direction 上位于上边界（v + e_direction 越界）
    pub fn is_upper_boundary(&self, v: &Position, direction: usize) -> bool {
        v[direction] >= self.size[direction]
    }

    /// 打包键
    ///
    /// # Panics
    ///
    /// 位置不在网格内时 panic
    pub fn key(&self, v: &Position) -> usize {
        assert!(self.contains(v), "Position {} outside grid {:?}", v, self.size);
        v.coords()
            .iter()
            .zip(&self.strides)
            .map(|(c, s)| c * s)
            .sum()
    }

    /// 打包键 → 位置
    pub fn position(&self, key: usize) -> Position {
        assert!(key < self.len, "Key {} outside grid of {} cells", key, self.len);
        let coords = self
            .strides
            .iter()
            .zip(&self.size)
            .map(|(stride, size)| (key / stride) % (size + 1))
            .collect();
        Position::new(coords)
    }

    /// 所有位置（按键升序）
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.len).map(move |key| self.position(key))
    }

    /// 包围盒 [0, v] 内的所有位置的键
    pub fn keys_leq(&self, v: &Position) -> Vec<usize> {
        let bounding = GridShape::new(v.coords().to_vec());
        bounding
            .positions()
            .map(|w| self.key(&w))
            .collect()
    }

    /// 最大位置（右上角）
    pub fn max_position(&self) -> Position {
        Position::new(self.size.clone())
    }
}

// ============================================================================
// Grid<T>
// ============================================================================

/// 单元格存储布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageLayout {
    /// 每个位置一个槽位
    #[default]
    Dense,
    /// 只存储写入过的位置
    Sparse,
}

#[derive(Debug, Clone)]
enum Cells<T> {
    Dense(Vec<Option<T>>),
    Sparse(HashMap<usize, T>),
}

/// 以打包键索引的网格单元
#[derive(Debug, Clone)]
pub struct Grid<T> {
    shape: GridShape,
    cells: Cells<T>,
}

impl<T> Grid<T> {
    pub fn new(shape: GridShape, layout: StorageLayout) -> Self {
        let cells = match layout {
            StorageLayout::Dense => Cells::Dense((0..shape.len()).map(|_| None).collect()),
            StorageLayout::Sparse => Cells::Sparse(HashMap::new()),
        };
        Self { shape, cells }
    }

    #[inline]
    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    pub fn layout(&self) -> StorageLayout {
        match self.cells {
            Cells::Dense(_) => StorageLayout::Dense,
            Cells::Sparse(_) => StorageLayout::Sparse,
        }
    }

    pub fn get(&self, v: &Position) -> Option<&T> {
        if !self.shape.contains(v) {
            return None;
        }
        self.get_by_key(self.shape.key(v))
    }

    pub fn get_by_key(&self, key: usize) -> Option<&T> {
        match &self.cells {
            Cells::Dense(slots) => slots.get(key).and_then(Option::as_ref),
            Cells::Sparse(map) => map.get(&key),
        }
    }

    /// 写入单元，返回旧值
    ///
    /// # Panics
    ///
    /// 位置不在网格内时 panic
    pub fn insert(&mut self, v: &Position, value: T) -> Option<T> {
        let key = self.shape.key(v);
        self.insert_by_key(key, value)
    }

    pub fn insert_by_key(&mut self, key: usize, value: T) -> Option<T> {
        assert!(key < self.shape.len(), "Key {} outside grid", key);
        match &mut self.cells {
            Cells::Dense(slots) => slots[key].replace(value),
            Cells::Sparse(map) => map.insert(key, value),
        }
    }

    pub fn remove(&mut self, v: &Position) -> Option<T> {
        if !self.shape.contains(v) {
            return None;
        }
        let key = self.shape.key(v);
        match &mut self.cells {
            Cells::Dense(slots) => slots[key].take(),
            Cells::Sparse(map) => map.remove(&key),
        }
    }

    /// 已写入的单元数
    pub fn len(&self) -> usize {
        match &self.cells {
            Cells::Dense(slots) => slots.iter().filter(|s| s.is_some()).count(),
            Cells::Sparse(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 已写入的键（升序）
    pub fn keys(&self) -> Vec<usize> {
        match &self.cells {
            Cells::Dense(slots) => slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_some())
                .map(|(k, _)| k)
                .collect(),
            Cells::Sparse(map) => {
                let mut keys: Vec<usize> = map.keys().copied().collect();
                keys.sort_unstable();
                keys
            }
        }
    }
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtration_grid_validation() {
        assert!(FiltrationGrid::new(vec![]).is_err());
        assert!(FiltrationGrid::new(vec![vec![]]).is_err());
        assert!(FiltrationGrid::new(vec![vec![0.0, 0.0]]).is_err());
        assert!(FiltrationGrid::new(vec![vec![0.0, Value::NAN]]).is_err());
        assert!(FiltrationGrid::new(vec![vec![0.0, 1.0], vec![2.0]]).is_ok());
    }

    #[test]
    fn test_filtration_index() {
        let grid = FiltrationGrid::new(vec![vec![0.0, 0.5, 1.0]]).unwrap();

        assert_eq!(grid.filtration_index(0, 0.0), Some(0));
        assert_eq!(grid.filtration_index(0, 0.2), Some(1));
        // 恰好等于阈值时取该坐标
        assert_eq!(grid.filtration_index(0, 0.5), Some(1));
        assert_eq!(grid.filtration_index(0, 1.0), Some(2));
        assert_eq!(grid.filtration_index(0, 1.1), None);
        assert_eq!(grid.shape().size(), &[2]);
    }

    #[test]
    fn test_packed_keys_round_trip() {
        let shape = GridShape::new(vec![2, 1, 3]);
        assert_eq!(shape.len(), 3 * 2 * 4);

        let positions: Vec<Position> = shape.positions().collect();
        for (key, v) in positions.iter().enumerate() {
            assert_eq!(shape.key(v), key);
            assert_eq!(&shape.position(key), v);
        }

        // 最后一个方向变化最快
        assert_eq!(positions[1], Position::new(vec![0, 0, 1]));
        assert_eq!(positions[4], Position::new(vec![0, 1, 0]));
    }

    #[test]
    fn test_keys_leq_box() {
        let shape = GridShape::new(vec![3, 3]);
        let keys = shape.keys_leq(&Position::new(vec![1, 2]));

        assert_eq!(keys.len(), 6);
        for key in keys {
            assert!(shape.position(key).leq(&Position::new(vec![1, 2])));
        }
    }

    #[test]
    fn test_grid_layouts_agree() {
        let shape = GridShape::new(vec![2, 2]);
        for layout in [StorageLayout::Dense, StorageLayout::Sparse] {
            let mut grid: Grid<u32> = Grid::new(shape.clone(), layout);
            let p = Position::new(vec![1, 2]);

            assert!(grid.is_empty());
            assert_eq!(grid.insert(&p, 7), None);
            assert_eq!(grid.insert(&p, 8), Some(7));
            assert_eq!(grid.get(&p), Some(&8));
            assert_eq!(grid.get(&Position::new(vec![0, 0])), None);
            assert_eq!(grid.get(&Position::new(vec![3, 0])), None);
            assert_eq!(grid.keys(), vec![shape.key(&p)]);
            assert_eq!(grid.layout(), layout);
        }
    }
}
