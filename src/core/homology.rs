/*!
 * 单个网格单元的同调计算
 *
 * 对网格位置 v，受限复形由所有出生位置 ≤ v 的单纯形组成。对每个维度 d：
 *
 * 1. 用余边界枚举器得到 d 维单纯形与 (d+1) 维余面的关联关系，
 *    对 ∂_{d+1} 的列做基于 pivot 的归约（同时记录归约矩阵 V）：
 *    - 非零的归约列构成边界空间 B_d 的基（pivot 两两不同）
 *    - 零列对应的 V 列是 (d+1) 维闭链，留给下一个维度使用
 * 2. 以 B_d 为起点，把上一轮得到的闭链 Z_d 逐个约化进来；
 *    约化后非零的闭链就是同调代表元 H_d
 * 3. 新基按 [H_d, B_d, 补空间单位向量] 排列，记录：
 *    - `homology_dimension[d]` = |H_d|
 *    - `natural_transformation[d]`: 原始链坐标 → 新基坐标
 *    - `natural_transformation_inverse[d]`: 新基坐标 → 原始链坐标（列即新基向量）
 *
 * B_d 紧跟在 H_d 之后：包含映射把边界映到边界，因此截取前 |H_d| 行列后的
 * 映射仍然满足函子性与自然性。
 *
 * # 局部坐标
 *
 * d 维链的第 i 个坐标对应 `chains[d][i]`（按单纯形索引升序）。
 */

use super::grid::GridShape;
use super::matrix::GF2Matrix;
use super::simplex::CoboundaryEnumerator;
use super::storage::SimplexStore;
use crate::error::{PersistenceError, Result};
use crate::types::{Index, Position, Simplex};
use std::collections::HashMap;

// ============================================================================
// 稀疏列
// ============================================================================

/// 稀疏列向量（Z/2Z）
///
/// 使用降序向量存储非零元素的局部下标，pivot 是最大的下标。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseColumn {
    /// 非零元素的下标（降序排列）
    indices: Vec<usize>,
}

impl SparseColumn {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从下标创建（会自动排序并去重）
    pub fn from_indices(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        Self { indices }
    }

    /// 单位列 e_i
    pub fn unit(i: usize) -> Self {
        Self { indices: vec![i] }
    }

    /// 添加一个元素；已存在则删除（1 + 1 = 0）
    pub fn add(&mut self, index: usize) {
        match self.indices.binary_search_by(|x| index.cmp(x)) {
            Ok(pos) => {
                self.indices.remove(pos);
            }
            Err(pos) => self.indices.insert(pos, index),
        }
    }

    /// 加上另一列（按降序归并）
    pub fn add_column(&mut self, other: &SparseColumn) {
        let (a, b) = (&self.indices, &other.indices);
        let mut merged = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Greater => {
                    merged.push(a[i]);
                    i += 1;
                }
                std::cmp::Ordering::Less => {
                    merged.push(b[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&a[i..]);
        merged.extend_from_slice(&b[j..]);
        self.indices = merged;
    }

    /// pivot（最大的下标）
    #[inline]
    pub fn get_pivot(&self) -> Option<usize> {
        self.indices.first().copied()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

/// pivot → 列位置
struct PivotTracker {
    pivot_to_column: Vec<Option<usize>>,
}

impl PivotTracker {
    fn new(size: usize) -> Self {
        Self {
            pivot_to_column: vec![None; size],
        }
    }

    #[inline]
    fn get(&self, pivot: usize) -> Option<usize> {
        self.pivot_to_column.get(pivot).copied().flatten()
    }

    #[inline]
    fn set(&mut self, pivot: usize, column: usize) {
        self.pivot_to_column[pivot] = Some(column);
    }
}

// ============================================================================
// 边界归约
// ============================================================================

/// ∂_{d+1} 的列归约结果
struct BoundaryReduction {
    /// B_d 的基（pivot 两两不同），下标为 d 维局部坐标
    boundaries: Vec<SparseColumn>,
    /// Z_{d+1} 的基，下标为 (d+1) 维局部坐标
    cycles: Vec<SparseColumn>,
}

/// 单元同调结果
#[derive(Debug, Clone)]
pub struct CellHomology {
    pub position: Position,
    /// chains[d]: 出生位置 ≤ v 的 d 维单纯形（按索引升序），d = 0..max_dimension
    pub chains: Vec<Vec<Simplex>>,
    /// homology_dimension[d] = dim H_d(v)
    pub homology_dimension: Vec<usize>,
    /// 原始链坐标 → [H, B, 补] 坐标
    pub natural_transformation: Vec<GF2Matrix>,
    /// [H, B, 补] 坐标 → 原始链坐标
    pub natural_transformation_inverse: Vec<GF2Matrix>,
}

impl CellHomology {
    /// 第 d 维同调代表元（以单纯形列表表示的闭链）
    pub fn representatives(&self, d: usize) -> Vec<Vec<Simplex>> {
        let basis = self.natural_transformation_inverse[d].transpose();
        (0..self.homology_dimension[d])
            .map(|j| {
                basis
                    .row(j)
                    .iter_ones()
                    .map(|i| self.chains[d][i])
                    .collect()
            })
            .collect()
    }
}

/// 单个网格单元的同调计算
///
/// Created → `run`（消耗 self，不可重启）→ `CellHomology`
pub struct CellHomologyWorker<'a> {
    store: &'a SimplexStore,
    position: Position,
}

impl<'a> CellHomologyWorker<'a> {
    pub fn new(store: &'a SimplexStore, position: Position) -> Self {
        Self { store, position }
    }

    pub fn run(self) -> Result<CellHomology> {
        let shape: &GridShape = self.store.shape();
        if !shape.contains(&self.position) {
            return Err(PersistenceError::OutOfBounds(self.position));
        }

        let max_dim = self.store.max_dimension();
        let mut chains: Vec<Vec<Simplex>> = (0..=max_dim)
            .map(|d| self.store.simplices_leq(d, &self.position))
            .collect();

        // Z_0 = C_0
        let mut cycles: Vec<SparseColumn> = (0..chains[0].len()).map(SparseColumn::unit).collect();

        let mut homology_dimension = Vec::with_capacity(max_dim);
        let mut natural_transformation = Vec::with_capacity(max_dim);
        let mut natural_transformation_inverse = Vec::with_capacity(max_dim);

        for d in 0..max_dim {
            let reduction = self.reduce_boundaries(&chains[d], &chains[d + 1]);
            let (h, nat, nat_inv) =
                self.change_of_basis(d, chains[d].len(), &cycles, &reduction.boundaries)?;

            homology_dimension.push(h);
            natural_transformation.push(nat);
            natural_transformation_inverse.push(nat_inv);
            cycles = reduction.cycles;
        }

        // 最高维只用于计算边界
        chains.truncate(max_dim);

        tracing::trace!(
            position = %self.position,
            ?homology_dimension,
            "cell homology computed"
        );

        Ok(CellHomology {
            position: self.position,
            chains,
            homology_dimension,
            natural_transformation,
            natural_transformation_inverse,
        })
    }

    /// 归约 ∂_{d+1}：列 = cofaces，行 = faces
    ///
    /// 关联关系由 faces 的余边界枚举得到，只保留出现在当前单元中的余面。
    fn reduce_boundaries(&self, faces: &[Simplex], cofaces: &[Simplex]) -> BoundaryReduction {
        let n = self.store.num_vertices();
        let binomial = self.store.binomial();

        let coface_column: HashMap<Index, usize> = cofaces
            .iter()
            .enumerate()
            .map(|(col, s)| (s.index, col))
            .collect();

        let mut incidence: Vec<Vec<usize>> = vec![Vec::new(); cofaces.len()];
        if !cofaces.is_empty() {
            for (row, &face) in faces.iter().enumerate() {
                for coface in CoboundaryEnumerator::new(face, n, binomial) {
                    if let Some(&col) = coface_column.get(&coface.index) {
                        incidence[col].push(row);
                    }
                }
            }
        }

        let mut reduced: Vec<SparseColumn> =
            incidence.into_iter().map(SparseColumn::from_indices).collect();
        let mut record: Vec<SparseColumn> = (0..cofaces.len()).map(SparseColumn::unit).collect();
        let mut pivot_tracker = PivotTracker::new(faces.len());

        for j in 0..reduced.len() {
            let mut working = std::mem::take(&mut reduced[j]);
            let mut working_record = std::mem::take(&mut record[j]);

            // 持续消元直到 pivot 唯一或列变为零
            while let Some(pivot) = working.get_pivot() {
                match pivot_tracker.get(pivot) {
                    Some(prev) => {
                        working.add_column(&reduced[prev]);
                        working_record.add_column(&record[prev]);
                    }
                    None => {
                        pivot_tracker.set(pivot, j);
                        break;
                    }
                }
            }

            reduced[j] = working;
            record[j] = working_record;
        }

        let mut boundaries = Vec::new();
        let mut cycles = Vec::new();
        for (column, v) in reduced.into_iter().zip(record) {
            if column.is_empty() {
                cycles.push(v);
            } else {
                boundaries.push(column);
            }
        }

        BoundaryReduction { boundaries, cycles }
    }

    /// 构造 [H, B, 补] 基，返回 (|H|, 正变换, 逆变换)
    fn change_of_basis(
        &self,
        d: usize,
        size: usize,
        cycles: &[SparseColumn],
        boundaries: &[SparseColumn],
    ) -> Result<(usize, GF2Matrix, GF2Matrix)> {
        let mut tracker = PivotTracker::new(size);
        let mut spanning: Vec<SparseColumn> = Vec::with_capacity(cycles.len());

        for column in boundaries {
            let pivot = column.get_pivot().ok_or_else(|| self.inconsistent(d, "zero boundary column"))?;
            if tracker.get(pivot).is_some() {
                return Err(self.inconsistent(d, "boundary pivots are not distinct"));
            }
            tracker.set(pivot, spanning.len());
            spanning.push(column.clone());
        }

        let mut representatives = Vec::new();
        for cycle in cycles {
            let mut working = cycle.clone();
            while let Some(pivot) = working.get_pivot() {
                match tracker.get(pivot) {
                    Some(k) => working.add_column(&spanning[k]),
                    None => {
                        tracker.set(pivot, spanning.len());
                        spanning.push(working.clone());
                        representatives.push(working);
                        break;
                    }
                }
            }
        }

        let expected = cycles.len().checked_sub(boundaries.len()).ok_or_else(|| {
            self.inconsistent(d, "more boundaries than cycles")
        })?;
        if representatives.len() != expected {
            return Err(self.inconsistent(
                d,
                &format!(
                    "{} homology representatives, expected {} cycles - {} boundaries",
                    representatives.len(),
                    cycles.len(),
                    boundaries.len()
                ),
            ));
        }

        // 新基顺序：[H, B, 补]
        let h = representatives.len();
        let mut basis: Vec<SparseColumn> = Vec::with_capacity(size);
        basis.extend(representatives);
        basis.extend(boundaries.iter().cloned());
        basis.extend(
            (0..size)
                .filter(|&i| tracker.get(i).is_none())
                .map(SparseColumn::unit),
        );
        if basis.len() != size {
            return Err(self.inconsistent(
                d,
                &format!("basis has {} vectors for {} simplices", basis.len(), size),
            ));
        }

        // pivot → 新基中的位置
        let mut owner = PivotTracker::new(size);
        for (k, column) in basis.iter().enumerate() {
            match column.get_pivot() {
                Some(p) if owner.get(p).is_none() => owner.set(p, k),
                _ => return Err(self.inconsistent(d, "basis pivots are not distinct")),
            }
        }

        // 逆变换：列 k 为第 k 个基向量
        let inverse_entries: Vec<(usize, usize)> = basis
            .iter()
            .enumerate()
            .flat_map(|(k, column)| column.indices().iter().map(move |&i| (i, k)))
            .collect();
        let nat_inv = GF2Matrix::from_entries(size, size, &inverse_entries);

        // 正变换：列 i 为 e_i 在新基下的坐标（沿 pivot 逐步消去）
        let mut entries = Vec::new();
        for i in 0..size {
            let mut working = SparseColumn::unit(i);
            let mut coords = SparseColumn::new();
            while let Some(pivot) = working.get_pivot() {
                let k = owner
                    .get(pivot)
                    .ok_or_else(|| self.inconsistent(d, "pivot without basis vector"))?;
                working.add_column(&basis[k]);
                coords.add(k);
            }
            entries.extend(coords.indices().iter().map(|&k| (k, i)));
        }
        let nat = GF2Matrix::from_entries(size, size, &entries);

        Ok((h, nat, nat_inv))
    }

    fn inconsistent(&self, d: usize, detail: &str) -> PersistenceError {
        PersistenceError::Inconsistent {
            position: self.position.clone(),
            detail: format!("dimension {}: {}", d, detail),
        }
    }
}

// ============================================================================
// 单元测试
// ============================================================================
