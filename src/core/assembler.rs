/*!
 * 同调函子装配
 *
 * 1. 在自有的 rayon 线程池上，为每个网格位置运行一个 `CellHomologyWorker`
 *    （位置之间没有数据依赖）；第一个失败的单元使整个构建失败
 * 2. 对每个位置 v 和方向 i，计算链包含映射 C_k(v) → C_k(v + e_i) 并做基变换：
 *
 *    M_i(v) = nat(v + e_i) · inclusion · nat_inv(v)
 *
 *    上边界处 M_i(v) 为恒等映射
 * 3. （可选）校验基变换后的函子交换，且单元的 nat 构成从链包含函子出发的自然变换
 * 4. 用 `Functor::sub_functor` 截取前 dim H_k(v) 个坐标
 * 5. （可选）校验同调函子交换
 */

use super::functor::{Functor, Nat};
use super::grid::{Grid, GridShape, StorageLayout};
use super::homology::{CellHomology, CellHomologyWorker};
use super::matrix::GF2Matrix;
use super::storage::SimplexStore;
use crate::config::EngineConfig;
use crate::error::{PersistenceError, Result};
use crate::types::{Position, Simplex};
use rayon::prelude::*;

pub struct HomologyAssembler {
    config: EngineConfig,
    pool: rayon::ThreadPool,
}

impl HomologyAssembler {
    /// # Errors
    ///
    /// - `InvalidInput`: 配置非法
    /// - `ThreadPool`: 线程池创建失败
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let threads = config.thread_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("homology-worker-{}", i))
            .build()?;

        tracing::debug!(threads, "homology worker pool ready");
        Ok(Self { config, pool })
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 计算 0..store.max_dimension() 每个同调维度的函子
    pub fn assemble(&self, store: &SimplexStore) -> Result<Vec<Functor>> {
        let max_dim = store.max_dimension();
        if max_dim == 0 {
            return Err(PersistenceError::InvalidInput(
                "simplex store must contain dimension 1 to compute homology".to_string(),
            ));
        }

        let shape = store.shape().clone();
        let positions: Vec<Position> = shape.positions().collect();

        // cells[key] 对应打包键为 key 的位置
        let cells: Vec<CellHomology> = self.pool.install(|| {
            positions
                .par_iter()
                .map(|v| {
                    CellHomologyWorker::new(store, v.clone()).run().map_err(|e| {
                        tracing::error!(position = %v, error = %e, "cell homology failed");
                        e
                    })
                })
                .collect::<Result<Vec<_>>>()
        })?;

        tracing::debug!(cells = cells.len(), "cell homology complete");

        (0..max_dim)
            .map(|k| self.assemble_dimension(&shape, &cells, &positions, k))
            .collect()
    }

    fn assemble_dimension(
        &self,
        shape: &GridShape,
        cells: &[CellHomology],
        positions: &[Position],
        k: usize,
    ) -> Result<Functor> {
        let mut homology_dims = Grid::new(shape.clone(), StorageLayout::Dense);
        for (key, cell) in cells.iter().enumerate() {
            homology_dims.insert_by_key(key, cell.homology_dimension[k]);
        }

        let (chain, full) = self.change_of_basis(shape, cells, positions, k)?;
        if let Some(chain) = &chain {
            check_change_of_basis(chain, &full, cells, positions, k)?;
        }

        // 截断投影只在闭链上自然，不单独校验
        let (functor, _projection) = full.sub_functor(homology_dims)?;
        if self.config.verify {
            functor.verify().map_err(|e| {
                tracing::error!(dimension = k, error = %e, "homology functor is not commutative");
                e
            })?;
        }

        tracing::debug!(dimension = k, "functor assembled");
        Ok(functor)
    }

    /// 基变换后的 k-链函子；开启校验时同时返回原始的链包含函子
    fn change_of_basis(
        &self,
        shape: &GridShape,
        cells: &[CellHomology],
        positions: &[Position],
        k: usize,
    ) -> Result<(Option<Functor>, Functor)> {
        let mut chain_dims = Grid::new(shape.clone(), StorageLayout::Dense);
        for (key, cell) in cells.iter().enumerate() {
            chain_dims.insert_by_key(key, cell.chains[k].len());
        }

        // 每个位置、每个方向：(包含映射, 基变换后的映射)
        let maps: Vec<Vec<(GF2Matrix, GF2Matrix)>> = self.pool.install(|| {
            positions
                .par_iter()
                .enumerate()
                .map(|(key, v)| {
                    (0..shape.directions())
                        .map(|direction| {
                            if shape.is_upper_boundary(v, direction) {
                                let identity = GF2Matrix::identity(cells[key].chains[k].len());
                                return Ok((identity.clone(), identity));
                            }
                            let next = &cells[shape.key(&v.step_up(direction))];
                            let raw = chain_inclusion(&cells[key], next, k)?;
                            let conjugated = conjugate(&raw, &cells[key], next, k)?;
                            Ok((raw, conjugated))
                        })
                        .collect::<Result<Vec<_>>>()
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let layout = self.config.layout;
        let mut chain = self
            .config
            .verify
            .then(|| Functor::new(chain_dims.clone(), layout));
        let mut full = Functor::new(chain_dims, layout);
        for (v, per_direction) in positions.iter().zip(maps) {
            for (direction, (raw, map)) in per_direction.into_iter().enumerate() {
                if let Some(chain) = chain.as_mut() {
                    chain.set_map(v, direction, raw)?;
                }
                full.set_map(v, direction, map)?;
            }
        }
        Ok((chain, full))
    }
}

/// 校验基变换：基变换后的链函子本身交换，且各单元的 nat 构成
/// 链包含函子 ⇒ 基变换后函子的自然变换
fn check_change_of_basis(
    chain: &Functor,
    full: &Functor,
    cells: &[CellHomology],
    positions: &[Position],
    k: usize,
) -> Result<()> {
    full.verify().map_err(|e| {
        tracing::error!(dimension = k, error = %e, "change of basis broke commutativity");
        e
    })?;

    let mut nat = Nat::new(chain.shape().clone());
    for (v, cell) in positions.iter().zip(cells) {
        nat.set_map(v, cell.natural_transformation[k].clone())?;
    }
    nat.verify(chain, full).map_err(|e| {
        tracing::error!(dimension = k, error = %e, "change of basis is not natural");
        e
    })?;
    Ok(())
}

/// 链包含映射 C_k(v) → C_k(v + e_i)
fn chain_inclusion(from: &CellHomology, to: &CellHomology, k: usize) -> Result<GF2Matrix> {
    inclusion(&from.chains[k], &to.chains[k]).ok_or_else(|| PersistenceError::Inconsistent {
        position: from.position.clone(),
        detail: format!("{}-chains are not contained in those at {}", k, to.position),
    })
}

/// nat(w) · inclusion · nat_inv(v)，w = v + e_i
fn conjugate(
    incl: &GF2Matrix,
    from: &CellHomology,
    to: &CellHomology,
    k: usize,
) -> Result<GF2Matrix> {
    let raw = incl.multiply(&from.natural_transformation_inverse[k])?;
    Ok(to.natural_transformation[k].multiply(&raw)?)
}

/// 包含映射矩阵 |to| × |from|；两个列表均按索引升序
///
/// from 不是 to 的子集时返回 `None`。
fn inclusion(from: &[Simplex], to: &[Simplex]) -> Option<GF2Matrix> {
    let mut entries = Vec::with_capacity(from.len());
    let mut row = 0;
    for (col, simplex) in from.iter().enumerate() {
        while row < to.len() && to[row] < *simplex {
            row += 1;
        }
        if row == to.len() || to[row] != *simplex {
            return None;
        }
        entries.push((row, col));
        row += 1;
    }
    Some(GF2Matrix::from_entries(to.len(), from.len(), &entries))
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::complex::ComplexBuilder;
    use crate::core::distance::CompressedDistanceMatrix;
    use crate::core::grid::FiltrationGrid;
    use crate::core::storage::{LookupStrategy, SimplexStoreBuilder};
    use crate::error::FunctorError;
    use proptest::prelude::*;

    fn assembler() -> HomologyAssembler {
        HomologyAssembler::new(EngineConfig::new(1).with_threads(2)).unwrap()
    }

    /// 两个顶点，边在坐标 1 出生
    fn merging_pair() -> SimplexStore {
        let filtration = FiltrationGrid::new(vec![vec![0.0, 1.0, 2.0]]).unwrap();
        let mut builder = SimplexStoreBuilder::new(filtration, 2, 1);
        builder.add_simplex(&[0], &Position::new(vec![0])).unwrap();
        builder.add_simplex(&[1], &Position::new(vec![0])).unwrap();
        builder.add_simplex(&[0, 1], &Position::new(vec![1])).unwrap();
        builder.build(LookupStrategy::Dense).unwrap()
    }

    #[test]
    fn test_inclusion_matrix() {
        let s = |i| Simplex::new(i, 1);
        let incl = inclusion(&[s(1), s(4)], &[s(0), s(1), s(3), s(4)]).unwrap();

        assert_eq!(incl, GF2Matrix::from_entries(4, 2, &[(1, 0), (3, 1)]));
        assert!(inclusion(&[s(2)], &[s(0), s(1)]).is_none());
        assert_eq!(inclusion(&[], &[s(0)]).unwrap().cols(), 0);
    }

    #[test]
    fn test_components_merge() {
        let functors = assembler().assemble(&merging_pair()).unwrap();
        assert_eq!(functors.len(), 1);

        let h0 = &functors[0];
        let dims: Vec<usize> = (0..3).map(|i| h0.dimension(&Position::new(vec![i]))).collect();
        assert_eq!(dims, vec![2, 1, 1]);

        let merge = h0.map(&Position::new(vec![0]), 0).unwrap();
        assert_eq!((merge.rows(), merge.cols()), (1, 2));
        assert_eq!(merge.rank(), 1);
        assert!(h0.map(&Position::new(vec![2]), 0).unwrap().is_identity());
        assert_eq!(h0.generators().unwrap().len(), 2);
    }

    #[test]
    fn test_change_of_basis_check_detects_corrupted_nat() {
        let store = merging_pair();
        let shape = store.shape().clone();
        let positions: Vec<Position> = shape.positions().collect();
        let mut cells: Vec<CellHomology> = positions
            .iter()
            .map(|v| CellHomologyWorker::new(&store, v.clone()).run().unwrap())
            .collect();

        let assembler = assembler();
        let (chain, full) = assembler.change_of_basis(&shape, &cells, &positions, 0).unwrap();
        let chain = chain.unwrap();
        check_change_of_basis(&chain, &full, &cells, &positions, 0).unwrap();

        cells[0].natural_transformation[0] = GF2Matrix::zeros(2, 2);
        assert!(matches!(
            check_change_of_basis(&chain, &full, &cells, &positions, 0),
            Err(PersistenceError::Functor(FunctorError::NotNatural { direction: 0, .. }))
        ));
    }

    #[test]
    fn test_chain_functor_only_kept_when_verifying() {
        let store = merging_pair();
        let shape = store.shape().clone();
        let positions: Vec<Position> = shape.positions().collect();
        let cells: Vec<CellHomology> = positions
            .iter()
            .map(|v| CellHomologyWorker::new(&store, v.clone()).run().unwrap())
            .collect();

        let quiet = HomologyAssembler::new(EngineConfig::new(1).with_verify(false)).unwrap();
        let (chain, full) = quiet.change_of_basis(&shape, &cells, &positions, 0).unwrap();
        assert!(chain.is_none());
        assert_eq!(full.dimension(&Position::new(vec![2])), 2);
    }

    /// 先走最后一个方向的路径复合，与 `map_between` 的顺序相反
    fn compose_last_direction_first(functor: &Functor, from: &Position, to: &Position) -> GF2Matrix {
        let mut composite = GF2Matrix::identity(functor.dimension(from));
        let mut current = from.clone();
        for direction in (0..from.directions()).rev() {
            while current[direction] < to[direction] {
                composite = functor
                    .map(&current, direction)
                    .unwrap()
                    .multiply(&composite)
                    .unwrap();
                current = current.step_up(direction);
            }
        }
        composite
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_random_two_direction_functors_are_natural(
            first in proptest::collection::vec(0.0f64..1.0, 10),
            second in proptest::collection::vec(0.0f64..1.0, 10),
        ) {
            let distances = [
                CompressedDistanceMatrix::from_distances(first, 5),
                CompressedDistanceMatrix::from_distances(second, 5),
            ];
            let thresholds = vec![0.0, 0.25, 0.5, 0.75, 1.0];
            let filtration = FiltrationGrid::new(vec![thresholds.clone(), thresholds]).unwrap();
            let store = ComplexBuilder::new(&distances, &filtration, 2)
                .build(LookupStrategy::Dense)
                .unwrap();

            let functors = assembler().assemble(&store).unwrap();
            prop_assert_eq!(functors.len(), 2);

            for functor in &functors {
                prop_assert!(functor.verify().is_ok());
                let shape = functor.shape();
                for from in shape.positions() {
                    for to in shape.positions().filter(|to| from.leq(to)) {
                        let along_first = functor.map_between(&from, &to).unwrap().unwrap();
                        let along_last = compose_last_direction_first(functor, &from, &to);
                        prop_assert_eq!(along_first, along_last);
                    }
                }
            }
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(matches!(
            HomologyAssembler::new(EngineConfig::new(1).with_threads(0)),
            Err(PersistenceError::InvalidInput(_))
        ));
    }
}
