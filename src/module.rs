/*!
 * 持久模与端到端流程
 *
 * ```ignore
 * let distances = vec![CompressedDistanceMatrix::from_points(&points, Metric::Euclidean)];
 * let filtration = FiltrationGrid::new(vec![thresholds])?;
 * let modules = persistence_modules_from_distances(&distances, &filtration, &EngineConfig::new(2))?;
 * let h1 = &modules[1];
 * let betti = h1.betti(&Position::new(vec![7]));
 * ```
 */

use crate::config::EngineConfig;
use crate::core::assembler::HomologyAssembler;
use crate::core::complex::ComplexBuilder;
use crate::core::distance::CompressedDistanceMatrix;
use crate::core::functor::{Functor, Generator};
use crate::core::grid::FiltrationGrid;
use crate::core::storage::SimplexStore;
use crate::error::{PersistenceError, Result};
use crate::types::Position;

/// 某个同调维度上的持久模
#[derive(Debug, Clone)]
pub struct PersistenceModule {
    dimension: usize,
    functor: Functor,
    filtration: FiltrationGrid,
}

impl PersistenceModule {
    pub fn new(dimension: usize, functor: Functor, filtration: FiltrationGrid) -> Self {
        Self {
            dimension,
            functor,
            filtration,
        }
    }

    /// 同调维度
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn functor(&self) -> &Functor {
        &self.functor
    }

    #[inline]
    pub fn filtration(&self) -> &FiltrationGrid {
        &self.filtration
    }

    /// Betti 数 dim H_k(v)
    pub fn betti(&self, v: &Position) -> usize {
        self.functor.dimension(v)
    }

    /// 秩不变量
    ///
    /// # Errors
    ///
    /// - `OutOfBounds`: 位置不在网格内
    /// - `InvalidInput`: from ≰ to
    pub fn rank(&self, from: &Position, to: &Position) -> Result<usize> {
        self.functor.rank(from, to)?.ok_or_else(|| {
            PersistenceError::InvalidInput(format!("{} is not below {}", from, to))
        })
    }

    pub fn generators(&self) -> Result<Vec<Generator>> {
        Ok(self.functor.generators()?)
    }
}

/// 对已构建的复形计算 0..max_dimension 的持久模（按同调维度排序）
pub fn compute_persistence_modules(
    store: &SimplexStore,
    config: &EngineConfig,
) -> Result<Vec<PersistenceModule>> {
    let assembler = HomologyAssembler::new(config.clone())?;
    let functors = assembler.assemble(store)?;

    Ok(functors
        .into_iter()
        .enumerate()
        .map(|(k, functor)| PersistenceModule::new(k, functor, store.filtration().clone()))
        .collect())
}

/// 从距离矩阵构建 Vietoris-Rips 复形并计算持久模
pub fn persistence_modules_from_distances(
    distances: &[CompressedDistanceMatrix],
    filtration: &FiltrationGrid,
    config: &EngineConfig,
) -> Result<Vec<PersistenceModule>> {
    config.validate()?;
    let store = ComplexBuilder::new(distances, filtration, config.max_dimension).build(config.lookup)?;
    compute_persistence_modules(&store, config)
}

// ============================================================================
// 单元测试
// ============================================================================
