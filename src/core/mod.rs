/*!
 * 核心算法模块
 *
 * # 子模块
 *
 * - `binomial`: 二项式系数表（组合数系统编码）
 * - `simplex`: 余边界 / 边界枚举
 * - `matrix`: GF(2) 稀疏向量与矩阵
 * - `grid`: 过滤网格、打包键与网格单元存储
 * - `distance`: 每个方向的距离矩阵
 * - `storage`: 单纯形出生位置存储
 * - `complex`: 多参数 Vietoris-Rips 复形构建
 * - `homology`: 单个网格单元的同调与基变换
 * - `functor`: 网格上的函子与自然变换（结构映射、交换性、生成元）
 * - `assembler`: 并行运行单元计算并装配函子
 *
 * # 依赖关系
 *
 * ```text
 * binomial ← simplex      matrix    grid ← distance
 *               ↓           ↓         ↓
 *            storage ← complex       functor
 *               ↓           ↓         ↓
 *            homology ──────────→ assembler
 * ```
 */

pub mod binomial;
pub mod distance;
pub mod simplex;
pub mod matrix;
pub mod grid;
pub mod storage;
pub mod complex;
pub mod homology;
pub mod functor;
pub mod assembler;

// 重导出（便于外部使用）
pub use assembler::*;
pub use binomial::*;
pub use complex::*;
pub use distance::*;
pub use functor::*;
pub use grid::*;
pub use homology::*;
pub use matrix::*;
pub use simplex::*;
pub use storage::*;
