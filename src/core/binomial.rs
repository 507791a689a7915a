/*!
 * 二项式系数表与组合数系统（Combinatorial Number System）
 *
 * 这个模块实现单纯形顶点集合与整数索引之间的双射。
 *
 * # 编码方案
 *
 * 对于 k-simplex {v0, v1, ..., vk}（其中 v0 < v1 < ... < vk）：
 *
 * ```text
 * index = C(vk, k+1) + C(vk-1, k) + ... + C(v1, 2) + C(v0, 1)
 * ```
 *
 * 解码时从最高顶点开始，对 k = dim+1 .. 1 二分查找最大的 v 使得 C(v, k) ≤ 剩余索引。
 *
 * # 存储
 *
 * 转置存储 `table[k][n] = C(n, k)`：访问模式通常是固定 k 遍历不同的 n。
 *
 * # 示例
 *
 * ```ignore
 * let table = BinomialCoeffTable::new(10, 4);
 *
 * let index = table.rank(&[4, 1, 7]);
 * assert_eq!(table.unrank(index, 2, 10), vec![1, 4, 7]);
 * ```
 */

use crate::types::Index;
use std::fmt;

/// 表项数上限（2^28 个 i64，即 2 GiB）
const MAX_ENTRIES: usize = 1 << 28;

/// 二项式系数表
///
/// 存储所有 C(i, j)，其中 0 ≤ i ≤ n 且 0 ≤ j ≤ k。
/// 对单纯形编码而言，n 是顶点数，k 是 max_dimension + 2（余边界枚举需要 C(v, dim+2)）。
///
/// # 复杂度
///
/// - 构建: O(n * k)
/// - 查询: O(1)
#[derive(Clone, Debug)]
pub struct BinomialCoeffTable {
    /// table[k][n] = C(n, k)
    table: Vec<Vec<Index>>,
    max_n: usize,
    max_k: usize,
}

impl BinomialCoeffTable {
    /// 创建新的二项式系数表
    ///
    /// # Arguments
    ///
    /// * `n` - 最大 n（通常是顶点数）
    /// * `k` - 最大 k（通常是 max_dimension + 2）
    ///
    /// # Panics
    ///
    /// 系数超出 i64 范围或表过大时 panic；输入不可信时用 [`Self::try_new`]
    pub fn new(n: usize, k: usize) -> Self {
        match Self::try_new(n, k) {
            Some(table) => table,
            None => panic!("Binomial coefficient overflow: C({}, {})", n, k),
        }
    }

    /// 创建新的二项式系数表，系数超出 i64 范围或表项超过 `MAX_ENTRIES` 时返回 `None`
    ///
    /// j > n 时 C(n, j) = 0，所以只存储 min(k, n) + 1 行。
    pub fn try_new(n: usize, k: usize) -> Option<Self> {
        let cols = n.checked_add(1)?;
        let rows = k.min(n) + 1;
        if rows.checked_mul(cols)? > MAX_ENTRIES {
            return None;
        }
        let mut table = vec![vec![0i64; cols]; rows];

        // Pascal's triangle: C(i, j) = C(i-1, j-1) + C(i-1, j)
        for i in 0..=n {
            table[0][i] = 1;
            if i < rows {
                table[i][i] = 1;
            }
            for j in 1..std::cmp::min(i, rows) {
                table[j][i] = table[j - 1][i - 1].checked_add(table[j][i - 1])?;
            }
        }

        Some(Self {
            table,
            max_n: n,
            max_k: k,
        })
    }

    /// 获取二项式系数 C(n, k)
    ///
    /// k > n 时返回 0。
    ///
    /// # Panics
    ///
    /// 如果 `n > max_n` 或 `k > max_k`（且 k ≤ n）
    #[inline]
    pub fn get(&self, n: usize, k: usize) -> Index {
        if k > n {
            return 0;
        }
        assert!(k <= self.max_k, "k={} exceeds max_k={}", k, self.max_k);
        assert!(n <= self.max_n, "n={} exceeds max_n={}", n, self.max_n);

        self.table[k][n]
    }

    #[inline]
    pub fn max_n(&self) -> usize {
        self.max_n
    }

    #[inline]
    pub fn max_k(&self) -> usize {
        self.max_k
    }

    /// 顶点集合 → 索引
    ///
    /// 顶点无需预先排序；重复顶点属于调用方错误（debug 构建下断言）。
    pub fn rank(&self, vertices: &[usize]) -> Index {
        let mut sorted = vertices.to_vec();
        sorted.sort_unstable();
        debug_assert!(
            sorted.windows(2).all(|w| w[0] < w[1]),
            "Duplicate vertices: {:?}",
            vertices
        );

        sorted
            .iter()
            .enumerate()
            .map(|(i, &v)| self.get(v, i + 1))
            .sum()
    }

    /// 索引 → 顶点集合（升序）
    ///
    /// # Arguments
    ///
    /// * `index` - 组合编码索引
    /// * `dim` - 单纯形维度（返回 dim+1 个顶点）
    /// * `n` - 顶点数（所有顶点 < n）
    pub fn unrank(&self, mut index: Index, dim: usize, n: usize) -> Vec<usize> {
        let mut vertices = vec![0; dim + 1];
        let mut upper = n.saturating_sub(1);

        for k in (1..=dim + 1).rev() {
            let v = self.max_vertex(index, k, upper);
            vertices[k - 1] = v;
            index -= self.get(v, k);
            upper = v.saturating_sub(1);
        }

        vertices
    }

    /// 二分查找：最大的 v ∈ [0, upper] 使得 C(v, k) ≤ index
    ///
    /// C(v, k) 关于 v 单调不减，C(0, k) = 0（k ≥ 1），因此结果总是存在。
    pub fn max_vertex(&self, index: Index, k: usize, upper: usize) -> usize {
        let mut low = 0;
        let mut high = upper;

        while low < high {
            let mid = (low + high + 1) / 2;
            if self.get(mid, k) <= index {
                low = mid;
            } else {
                high = mid - 1;
            }
        }

        low
    }
}

impl fmt::Display for BinomialCoeffTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BinomialCoeffTable(max_n={}, max_k={})",
            self.max_n, self.max_k
        )
    }
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_simplex_counts() {
        // 10 个顶点上的 k-simplex 个数为 C(10, k+1)
        let table = BinomialCoeffTable::new(10, 4);
        let counts: Vec<Index> = (1..=4).map(|k| table.get(10, k)).collect();

        assert_eq!(counts, vec![10, 45, 120, 210]);
        assert_eq!(table.get(0, 0), 1);
        assert_eq!(table.get(2, 3), 0);
        assert_eq!(table.get(3, 7), 0);
    }

    #[test]
    fn test_binomial_recursive_property() {
        let table = BinomialCoeffTable::new(12, 6);

        for n in 1..=12 {
            for k in 1..=std::cmp::min(n, 6) {
                let expected = table.get(n - 1, k - 1) + table.get(n - 1, k);
                assert_eq!(table.get(n, k), expected, "Pascal failed at C({}, {})", n, k);
            }
        }
    }

    #[test]
    #[should_panic(expected = "exceeds max_n")]
    fn test_binomial_out_of_range_n() {
        let table = BinomialCoeffTable::new(10, 5);
        table.get(11, 2);
    }

    #[test]
    #[should_panic(expected = "exceeds max_k")]
    fn test_binomial_out_of_range_k() {
        let table = BinomialCoeffTable::new(10, 3);
        table.get(10, 4);
    }

    #[test]
    fn test_try_new_rejects_overflow() {
        // C(200, 100) 远超 i64
        assert!(BinomialCoeffTable::try_new(200, 42).is_none());
        assert!(BinomialCoeffTable::try_new(usize::MAX, 2).is_none());

        // 巨大的 k 只受 n 约束
        let table = BinomialCoeffTable::try_new(5, usize::MAX - 1).unwrap();
        assert_eq!(table.get(5, 2), 10);
        assert_eq!(table.get(5, 5), 1);
        assert_eq!(table.get(4, 9), 0);
    }

    #[test]
    #[should_panic(expected = "Binomial coefficient overflow")]
    fn test_new_panics_on_overflow() {
        BinomialCoeffTable::new(100, 60);
    }

    #[test]
    fn test_rank_known_values() {
        let table = BinomialCoeffTable::new(10, 4);

        // 边 {0, 1}: C(0,1) + C(1,2) = 0
        assert_eq!(table.rank(&[0, 1]), 0);
        // 边 {0, 2}: 0 + C(2,2) = 1
        assert_eq!(table.rank(&[0, 2]), 1);
        // 边 {1, 2}: 1 + 1 = 2
        assert_eq!(table.rank(&[1, 2]), 2);
        // 三角形 {0, 1, 2}
        assert_eq!(table.rank(&[0, 1, 2]), 0);
        // 顶点索引等于自身
        assert_eq!(table.rank(&[7]), 7);
        // 顺序无关
        assert_eq!(table.rank(&[3, 1]), table.rank(&[1, 3]));
    }

    #[test]
    fn test_unrank_all_triangles() {
        let n = 7;
        let table = BinomialCoeffTable::new(n, 4);
        let total = table.get(n, 3);

        for index in 0..total {
            let vertices = table.unrank(index, 2, n);
            assert_eq!(vertices.len(), 3);
            assert!(vertices.windows(2).all(|w| w[0] < w[1]));
            assert!(vertices.iter().all(|&v| v < n));
            assert_eq!(table.rank(&vertices), index);
        }
    }

    #[test]
    fn test_max_vertex() {
        let table = BinomialCoeffTable::new(10, 3);

        // C(4,2) = 6 ≤ 7 < C(5,2) = 10
        assert_eq!(table.max_vertex(7, 2, 9), 4);
        // 受 upper 限制
        assert_eq!(table.max_vertex(40, 2, 5), 5);
        assert_eq!(table.max_vertex(0, 1, 9), 0);
    }

    proptest! {
        #[test]
        fn prop_rank_unrank_round_trip(
            subset in proptest::collection::btree_set(0usize..30, 1..6)
        ) {
            let n = 30;
            let table = BinomialCoeffTable::new(n, 7);
            let vertices: Vec<usize> = subset.into_iter().collect();
            let dim = vertices.len() - 1;

            let index = table.rank(&vertices);
            prop_assert!(index >= 0);
            prop_assert_eq!(table.unrank(index, dim, n), vertices);
        }
    }
}
