/*!
 * 单纯形边界/余边界枚举器
 *
 * 两个枚举器都基于组合数系统的增量索引运算，不需要解码出完整顶点列表：
 *
 * - `CoboundaryEnumerator`: 包含给定 k-simplex 的所有 (k+1)-simplex，索引严格递减
 * - `BoundaryEnumerator`: 给定 k-simplex 的所有 (k-1)-face，索引严格递增
 *
 * # 余边界的增量运算
 *
 * 设 simplex 的顶点为 v0 < ... < vk。顶点游标 v 从 n-1 向下扫描：
 *
 * - `idx_below`: 尚未扫描到的顶点（都 < v）贡献的编码
 * - `idx_above`: 已扫描顶点在插入新顶点后（位次 +1）的编码
 *
 * 若 v 属于 simplex，则把它从 `idx_below` 移到 `idx_above`；否则插入 v 得到的
 * cofacet 索引为 `idx_above + C(v, k+1) + idx_below`。
 *
 * # 示例
 *
 * ```ignore
 * let binomial = BinomialCoeffTable::new(4, 3);
 * let vertex = Simplex::new(0, 0);
 * let edges: Vec<_> = CoboundaryEnumerator::new(vertex, 4, &binomial).collect();
 * // {0,3}, {0,2}, {0,1}
 * assert_eq!(edges.iter().map(|s| s.index).collect::<Vec<_>>(), vec![3, 1, 0]);
 * ```
 */

use super::binomial::BinomialCoeffTable;
use crate::types::{Index, Simplex};

/// 解码单纯形的顶点（升序）
#[inline]
pub fn simplex_vertices(simplex: Simplex, n: usize, binomial: &BinomialCoeffTable) -> Vec<usize> {
    binomial.unrank(simplex.index, simplex.dim, n)
}

// ============================================================================
// 余边界枚举器
// ============================================================================

/// Simplex 余边界枚举器
///
/// 单次前向遍历，不可重启。需要 binomial 表覆盖 k = dim + 2。
pub struct CoboundaryEnumerator<'a> {
    binomial: &'a BinomialCoeffTable,
    /// cofacet 的维度
    coface_dim: usize,
    idx_below: Index,
    idx_above: Index,
    /// 顶点游标（isize 避免下溢）
    v: isize,
    /// 尚未扫描的 simplex 顶点数
    k: usize,
}

impl<'a> CoboundaryEnumerator<'a> {
    /// # Arguments
    ///
    /// * `simplex` - 起始 simplex
    /// * `n` - 顶点数
    /// * `binomial` - 二项式系数表
    pub fn new(simplex: Simplex, n: usize, binomial: &'a BinomialCoeffTable) -> Self {
        Self {
            binomial,
            coface_dim: simplex.dim + 1,
            idx_below: simplex.index,
            idx_above: 0,
            v: n as isize - 1,
            k: simplex.dim + 1,
        }
    }
}

impl Iterator for CoboundaryEnumerator<'_> {
    type Item = Simplex;

    fn next(&mut self) -> Option<Simplex> {
        // 跳过已属于 simplex 的顶点
        while self.v >= 0 {
            let v = self.v as usize;
            let below = self.binomial.get(v, self.k);
            if below > self.idx_below {
                break;
            }
            self.idx_below -= below;
            self.idx_above += self.binomial.get(v, self.k + 1);
            self.v -= 1;
            self.k -= 1;
        }

        if self.v < 0 {
            return None;
        }

        let v = self.v as usize;
        let index = self.idx_above + self.binomial.get(v, self.k + 1) + self.idx_below;
        self.v -= 1;

        Some(Simplex::new(index, self.coface_dim))
    }
}

// ============================================================================
// 边界枚举器
// ============================================================================

/// Simplex 边界枚举器
///
/// 第一次调用去掉最高顶点，因此 face 索引严格递增。0-simplex 没有 face。
pub struct BoundaryEnumerator<'a> {
    binomial: &'a BinomialCoeffTable,
    face_dim: usize,
    /// 剩余待移除的顶点位次 + 1（0 表示结束）
    remaining: usize,
    idx_below: Index,
    idx_above: Index,
    /// 下一个顶点的搜索上界
    upper: usize,
}

impl<'a> BoundaryEnumerator<'a> {
    pub fn new(simplex: Simplex, n: usize, binomial: &'a BinomialCoeffTable) -> Self {
        Self {
            binomial,
            face_dim: simplex.dim.saturating_sub(1),
            remaining: if simplex.dim == 0 { 0 } else { simplex.dim + 1 },
            idx_below: simplex.index,
            idx_above: 0,
            upper: n.saturating_sub(1),
        }
    }
}

impl Iterator for BoundaryEnumerator<'_> {
    type Item = Simplex;

    fn next(&mut self) -> Option<Simplex> {
        if self.remaining == 0 {
            return None;
        }

        // 当前顶点在 simplex 中的位次为 k，编码贡献为 C(j, k+1)
        let k = self.remaining - 1;
        let j = self.binomial.max_vertex(self.idx_below, k + 1, self.upper);
        let contribution = self.binomial.get(j, k + 1);

        let face_index = self.idx_above + self.idx_below - contribution;

        self.idx_below -= contribution;
        self.idx_above += self.binomial.get(j, k);
        self.upper = j.saturating_sub(1);
        self.remaining -= 1;

        Some(Simplex::new(face_index, self.face_dim))
    }
}

// ============================================================================
// 单元测试
// ============================================================================
