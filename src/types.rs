/*!
 * 核心数据类型定义
 *
 * 这个模块定义了多参数持久同调计算中使用的基础数据类型。
 *
 * # 核心类型
 *
 * - `Value`: 过滤阈值（浮点数）
 * - `Index`: 单纯形组合编码索引（整数）
 * - `Simplex`: (索引, 维度) 二元组
 * - `Position`: 网格位置（r 元组，按分量偏序）
 */

use std::fmt;
use std::ops;

// ============================================================================
// 基础类型别名
// ============================================================================

/// 过滤阈值类型（filtration value）
///
/// 距离矩阵与阈值序列都使用 f64。
pub type Value = f64;

/// 单纯形索引类型
///
/// 组合数系统编码，调用方保证所有系数落在 63 位以内。
pub type Index = i64;

// ============================================================================
// Simplex
// ============================================================================

/// 单纯形：(组合编码索引, 维度)
///
/// 顶点集合不存储，需要时通过 `BinomialCoeffTable::unrank` 恢复。
/// 相等性与哈希均由 (index, dim) 决定。
///
/// # 排序
///
/// 先按索引、再按维度排序，与 `simplices_leq` 的输出顺序一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Simplex {
    /// 组合编码索引
    pub index: Index,
    /// 维度（k-simplex 有 k+1 个顶点）
    pub dim: usize,
}

impl Simplex {
    #[inline]
    pub fn new(index: Index, dim: usize) -> Self {
        Self { index, dim }
    }
}

impl fmt::Display for Simplex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Simplex(index={}, dim={})", self.index, self.dim)
    }
}

// ============================================================================
// Position - 网格位置
// ============================================================================

/// 网格位置：r 个非负整数组成的元组
///
/// 按分量比较的偏序 `leq`；单位步长 e_i 通过 `step_up` / `step_down` 实现。
/// 存储时不直接以 `Position` 作为键，而是使用 `GridShape::key` 得到的打包整数键。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position(Vec<usize>);

impl Position {
    /// 从坐标创建位置
    pub fn new(coords: Vec<usize>) -> Self {
        Self(coords)
    }

    /// r 维原点
    pub fn zeros(directions: usize) -> Self {
        Self(vec![0; directions])
    }

    /// 方向数 r
    #[inline]
    pub fn directions(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn coords(&self) -> &[usize] {
        &self.0
    }

    /// 分量偏序：self ≤ other 当且仅当每个坐标都不大于对方
    ///
    /// 方向数不同的位置不可比较，返回 false。
    pub fn leq(&self, other: &Position) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a <= b)
    }

    /// self + e_direction
    pub fn step_up(&self, direction: usize) -> Position {
        let mut coords = self.0.clone();
        coords[direction] += 1;
        Position(coords)
    }

    /// self - e_direction；坐标为 0 时返回 None
    pub fn step_down(&self, direction: usize) -> Option<Position> {
        if self.0[direction] == 0 {
            return None;
        }
        let mut coords = self.0.clone();
        coords[direction] -= 1;
        Some(Position(coords))
    }
}

impl From<Vec<usize>> for Position {
    fn from(coords: Vec<usize>) -> Self {
        Self(coords)
    }
}

impl ops::Index<usize> for Position {
    type Output = usize;

    #[inline]
    fn index(&self, direction: usize) -> &usize {
        &self.0[direction]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, ")")
    }
}

// ============================================================================
// 单元测试
// ============================================================================
