//! # multipers - 多参数持久同调（GF(2) 系数）
//!
//! 从每个方向的距离矩阵和阈值网格构建多参数 Vietoris-Rips 复形，
//! 在每个网格位置并行计算同调，并把各位置的同调用结构映射装配成
//! 网格上的函子（持久模）。
//!
//! # 模块结构
//!
//! - `types`: 单纯形、网格位置等基础类型
//! - `error`: 错误类型
//! - `config`: 引擎配置
//! - `core`: 核心算法（组合编码、GF(2) 线性代数、复形、单元同调、函子装配）
//! - `module`: 持久模与端到端流程
//! - `io`: 单纯形存储的文本交换格式

pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod module;
pub mod types;

pub use crate::config::EngineConfig;
pub use crate::core::{
    CompressedDistanceMatrix, FiltrationGrid, Functor, GF2Matrix, GF2Vector, Generator,
    LookupStrategy, Metric, Nat, SimplexStore, SimplexStoreBuilder, StorageLayout,
};
pub use crate::error::{FunctorError, MatrixError, PersistenceError, Result};
pub use crate::module::{
    compute_persistence_modules, persistence_modules_from_distances, PersistenceModule,
};
pub use crate::types::{Index, Position, Simplex, Value};
