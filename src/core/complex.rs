/*!
 * 多参数 Vietoris-Rips 复形构建
 *
 * # 算法流程
 *
 * 1. 在每个方向的最大阈值处构建 Vietoris-Rips 复形：
 *    - 0-simplex: 所有顶点
 *    - 1-simplex: 所有方向上距离都不超过最大阈值的顶点对
 *    - 高维: 对每个顶点做有界深度的团扩展，候选集每次与新顶点的上邻居求交
 * 2. 对每个单纯形、每个方向，取其顶点对最大距离，找到最小的网格坐标 i
 *    使得该距离 ≤ threshold[i]；各方向独立，出生位置是这些坐标组成的向量
 *
 * 顶点的直径为 0，出生在每个方向第一个非负阈值处（阈值都从 0 开始时即原点）。
 *
 * 上邻居计算与团扩展都按顶点并行（rayon），输出顺序与顶点顺序一致。
 */

use super::distance::CompressedDistanceMatrix;
use super::grid::FiltrationGrid;
use super::storage::{LookupStrategy, SimplexStore, SimplexStoreBuilder};
use crate::error::{PersistenceError, Result};
use crate::types::{Position, Value};
use rayon::prelude::*;

/// Vietoris-Rips 复形构建器
pub struct ComplexBuilder<'a> {
    distances: &'a [CompressedDistanceMatrix],
    filtration: &'a FiltrationGrid,
    max_dimension: usize,
}

impl<'a> ComplexBuilder<'a> {
    /// # Arguments
    ///
    /// * `distances` - 每个方向一个距离矩阵
    /// * `filtration` - 过滤网格（方向数必须与距离矩阵数一致）
    /// * `max_dimension` - 最高单纯形维度
    pub fn new(
        distances: &'a [CompressedDistanceMatrix],
        filtration: &'a FiltrationGrid,
        max_dimension: usize,
    ) -> Self {
        Self {
            distances,
            filtration,
            max_dimension,
        }
    }

    /// 构建复形并冻结为 `SimplexStore`
    pub fn build(&self, lookup: LookupStrategy) -> Result<SimplexStore> {
        let n = self.validate()?;
        let max_thresholds = self.filtration.max_thresholds();

        let neighbors: Vec<Vec<usize>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (i + 1..n)
                    .filter(|&j| self.within(i, j, &max_thresholds))
                    .collect()
            })
            .collect();

        let cliques: Vec<Vec<Vec<usize>>> = (0..n)
            .into_par_iter()
            .map(|v| {
                let mut out = Vec::new();
                let mut simplex = vec![v];
                self.extend(&mut simplex, &neighbors[v], &neighbors, &mut out);
                out
            })
            .collect();

        let mut builder =
            SimplexStoreBuilder::try_new(self.filtration.clone(), n, self.max_dimension)?;
        let mut counts = vec![0usize; self.max_dimension + 1];

        for vertices in cliques.into_iter().flatten() {
            let position = self.birth_position(&vertices)?;
            counts[vertices.len() - 1] += 1;
            builder.add_simplex(&vertices, &position)?;
        }

        tracing::debug!(
            vertices = n,
            directions = self.filtration.directions(),
            ?counts,
            "Vietoris-Rips complex built at maximal thresholds"
        );

        builder.build(lookup)
    }

    fn validate(&self) -> Result<usize> {
        if self.max_dimension == 0 {
            return Err(PersistenceError::InvalidInput(
                "max_dimension must be at least 1".to_string(),
            ));
        }
        if self.distances.len() != self.filtration.directions() {
            return Err(PersistenceError::InvalidInput(format!(
                "{} distance matrices for {} filtration directions",
                self.distances.len(),
                self.filtration.directions()
            )));
        }
        let n = self.distances[0].size();
        if n == 0 {
            return Err(PersistenceError::InvalidInput("no vertices".to_string()));
        }
        if let Some(other) = self.distances.iter().find(|d| d.size() != n) {
            return Err(PersistenceError::InvalidInput(format!(
                "distance matrices disagree on vertex count: {} vs {}",
                n,
                other.size()
            )));
        }
        Ok(n)
    }

    #[inline]
    fn within(&self, i: usize, j: usize, max_thresholds: &[Value]) -> bool {
        self.distances
            .iter()
            .zip(max_thresholds)
            .all(|(d, &t)| d.get(i, j) <= t)
    }

    /// 团扩展：simplex 的所有顶点都与 candidates 中的每个顶点相邻，且候选都大于末尾顶点
    fn extend(
        &self,
        simplex: &mut Vec<usize>,
        candidates: &[usize],
        neighbors: &[Vec<usize>],
        out: &mut Vec<Vec<usize>>,
    ) {
        out.push(simplex.clone());
        if simplex.len() > self.max_dimension {
            return;
        }
        for &w in candidates {
            let next = intersect_sorted(candidates, &neighbors[w]);
            simplex.push(w);
            self.extend(simplex, &next, neighbors, out);
            simplex.pop();
        }
    }

    fn birth_position(&self, vertices: &[usize]) -> Result<Position> {
        let coords = self
            .distances
            .iter()
            .enumerate()
            .map(|(direction, d)| {
                let diameter = d.diameter(vertices);
                self.filtration
                    .filtration_index(direction, diameter)
                    .ok_or_else(|| {
                        PersistenceError::InvalidInput(format!(
                            "simplex {:?} has diameter {} beyond the last threshold of direction {}",
                            vertices, diameter, direction
                        ))
                    })
            })
            .collect::<Result<Vec<usize>>>()?;
        Ok(Position::new(coords))
    }
}

/// 两个升序列表的交集
fn intersect_sorted(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut result = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                result.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    result
}

// ============================================================================
// 单元测试
// ============================================================================
