/*!
 * 距离矩阵
 *
 * 多参数过滤的每个方向都有一个独立的距离矩阵。`CompressedDistanceMatrix`
 * 仅存储下三角（不含对角线），可以从以下输入构建：
 *
 * - 按行存储的下三角一维数组
 * - `ndarray` 方阵（校验对称性）
 * - 点云 + 距离度量
 *
 * # 使用示例
 *
 * ```ignore
 * let points = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
 * let dist = CompressedDistanceMatrix::from_points(&points, Metric::Euclidean);
 * let d01 = dist.get(0, 1);
 * ```
 */

use crate::error::{PersistenceError, Result};
use crate::types::Value;
use ndarray::ArrayView2;
use std::fmt;

/// 对称性校验的容差
const SYMMETRY_TOLERANCE: Value = 1e-9;

// ============================================================================
// Metric - 距离度量
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// L2
    Euclidean,
    /// L1
    Manhattan,
    /// L∞
    Chebyshev,
}

impl Metric {
    #[inline]
    pub fn distance(&self, p1: &[Value], p2: &[Value]) -> Value {
        assert_eq!(
            p1.len(),
            p2.len(),
            "Points must have same dimension: {} vs {}",
            p1.len(),
            p2.len()
        );

        let diffs = p1.iter().zip(p2.iter()).map(|(x, y)| (x - y).abs());
        match self {
            Metric::Euclidean => diffs.map(|d| d * d).sum::<Value>().sqrt(),
            Metric::Manhattan => diffs.sum(),
            Metric::Chebyshev => diffs.fold(0.0, Value::max),
        }
    }
}

// ============================================================================
// CompressedDistanceMatrix - 压缩存储
// ============================================================================

/// 压缩距离矩阵（仅存储下三角）
///
/// ```text
///   0   1   2   3
/// 0 0   -   -   -
/// 1 d10 0   -   -
/// 2 d20 d21 0   -
/// 3 d30 d31 d32 0
/// ```
///
/// 存储为一维数组 [d10, d20, d21, d30, d31, d32]，(i, j)（i > j）的偏移为 i*(i-1)/2 + j。
#[derive(Clone, PartialEq)]
pub struct CompressedDistanceMatrix {
    distances: Vec<Value>,
    n: usize,
}

impl CompressedDistanceMatrix {
    /// n 个点、距离全为 0
    pub fn new(n: usize) -> Self {
        Self {
            distances: vec![0.0; n * n.saturating_sub(1) / 2],
            n,
        }
    }

    /// 从下三角数组创建
    ///
    /// # Panics
    ///
    /// 数组长度不等于 n*(n-1)/2 时 panic
    pub fn from_distances(distances: Vec<Value>, n: usize) -> Self {
        let expected_len = n * n.saturating_sub(1) / 2;
        assert_eq!(
            distances.len(),
            expected_len,
            "Distance array length mismatch: expected {}, got {}",
            expected_len,
            distances.len()
        );

        Self { distances, n }
    }

    /// 从对称方阵创建
    ///
    /// # Errors
    ///
    /// `InvalidInput`: 非方阵、不对称、含负值或非有限值
    pub fn from_array(matrix: ArrayView2<'_, Value>) -> Result<Self> {
        let (rows, cols) = matrix.dim();
        if rows != cols {
            return Err(PersistenceError::InvalidInput(format!(
                "distance matrix must be square, got {}x{}",
                rows, cols
            )));
        }

        let mut distances = Vec::with_capacity(rows * rows.saturating_sub(1) / 2);
        for i in 1..rows {
            for j in 0..i {
                let d = matrix[[i, j]];
                if !d.is_finite() || d < 0.0 {
                    return Err(PersistenceError::InvalidInput(format!(
                        "invalid distance {} at ({}, {})",
                        d, i, j
                    )));
                }
                if (d - matrix[[j, i]]).abs() > SYMMETRY_TOLERANCE {
                    return Err(PersistenceError::InvalidInput(format!(
                        "distance matrix is not symmetric at ({}, {})",
                        i, j
                    )));
                }
                distances.push(d);
            }
        }

        Ok(Self { distances, n: rows })
    }

    /// 从点云构建
    pub fn from_points<P: AsRef<[Value]>>(points: &[P], metric: Metric) -> Self {
        let n = points.len();
        let mut distances = Vec::with_capacity(n * n.saturating_sub(1) / 2);

        for i in 1..n {
            for j in 0..i {
                distances.push(metric.distance(points[i].as_ref(), points[j].as_ref()));
            }
        }

        Self { distances, n }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    /// # Panics
    ///
    /// 索引越界时 panic
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Value {
        assert!(i < self.n, "Index i={} out of bounds (n={})", i, self.n);
        assert!(j < self.n, "Index j={} out of bounds (n={})", j, self.n);

        if i == j {
            return 0.0;
        }

        let (row, col) = if i > j { (i, j) } else { (j, i) };
        self.distances[row * (row - 1) / 2 + col]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: Value) {
        assert!(i < self.n, "Index i={} out of bounds (n={})", i, self.n);
        assert!(j < self.n, "Index j={} out of bounds (n={})", j, self.n);
        assert!(i != j, "Cannot set distance for i=j={}", i);

        let (row, col) = if i > j { (i, j) } else { (j, i) };
        self.distances[row * (row - 1) / 2 + col] = value;
    }

    /// 顶点集合的直径：所有顶点对的最大距离（单点为 0）
    pub fn diameter(&self, vertices: &[usize]) -> Value {
        let mut max = 0.0;
        for (a, &i) in vertices.iter().enumerate() {
            for &j in &vertices[a + 1..] {
                max = Value::max(max, self.get(i, j));
            }
        }
        max
    }
}

impl fmt::Debug for CompressedDistanceMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompressedDistanceMatrix(n={})", self.n)
    }
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_metrics() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];

        assert_relative_eq!(Metric::Euclidean.distance(&a, &b), 5.0);
        assert_relative_eq!(Metric::Manhattan.distance(&a, &b), 7.0);
        assert_relative_eq!(Metric::Chebyshev.distance(&a, &b), 4.0);
    }

    #[test]
    fn test_from_points_layout() {
        let points = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 2.0]];
        let dist = CompressedDistanceMatrix::from_points(&points, Metric::Euclidean);

        assert_eq!(dist.size(), 3);
        assert_relative_eq!(dist.get(0, 1), 1.0);
        assert_relative_eq!(dist.get(2, 0), 2.0);
        assert_relative_eq!(dist.get(1, 2), 5.0_f64.sqrt());
        assert_relative_eq!(dist.get(1, 1), 0.0);
    }

    #[test]
    fn test_from_array() {
        let m = array![[0.0, 1.0, 2.0], [1.0, 0.0, 3.0], [2.0, 3.0, 0.0]];
        let dist = CompressedDistanceMatrix::from_array(m.view()).unwrap();

        assert_eq!(dist, CompressedDistanceMatrix::from_distances(vec![1.0, 2.0, 3.0], 3));
        assert_relative_eq!(dist.diameter(&[0, 1, 2]), 3.0);
        assert_relative_eq!(dist.diameter(&[1]), 0.0);
    }

    #[test]
    fn test_from_array_rejects_bad_input() {
        let asymmetric = array![[0.0, 1.0], [2.0, 0.0]];
        assert!(CompressedDistanceMatrix::from_array(asymmetric.view()).is_err());

        let negative = array![[0.0, -1.0], [-1.0, 0.0]];
        assert!(CompressedDistanceMatrix::from_array(negative.view()).is_err());

        let rectangular = ndarray::Array2::<Value>::zeros((2, 3));
        assert!(CompressedDistanceMatrix::from_array(rectangular.view()).is_err());
    }

    #[test]
    fn test_set_get_symmetric() {
        let mut dist = CompressedDistanceMatrix::new(4);
        dist.set(3, 1, 2.5);

        assert_relative_eq!(dist.get(1, 3), 2.5);
        assert_relative_eq!(dist.get(3, 1), 2.5);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds() {
        let dist = CompressedDistanceMatrix::new(3);
        dist.get(0, 3);
    }
}
