/*!
 * 单纯形存储（按出生位置索引）
 *
 * `SimplexStoreBuilder` 在构建阶段只允许追加；`build` 之后得到不可变的
 * `SimplexStore`，可在线程间共享只读。
 *
 * # 查询
 *
 * - `simplices_at(dim, v)`: 恰好在 v 出生的单纯形
 * - `simplices_leq(dim, v)`: 所有出生位置 w ≤ v 的单纯形并集，按索引升序
 *
 * # 查找策略
 *
 * - `Dense`: 扫描包围盒 [0, v] 内的所有位置，代价与网格大小成正比
 * - `Sparse`: 预先为每个已占用位置计算其在已占用位置偏序中的极大前驱
 *   （逐层提取 Pareto 前沿），查询时沿前驱图遍历，只访问真正有单纯形的位置
 *
 * 两种策略的结果完全相同。
 */

use super::binomial::BinomialCoeffTable;
use super::grid::{FiltrationGrid, GridShape};
use super::simplex::BoundaryEnumerator;
use crate::error::{PersistenceError, Result};
use crate::types::{Position, Simplex};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// `simplices_leq` 的查找策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupStrategy {
    #[default]
    Dense,
    Sparse,
}

// ============================================================================
// SimplexStoreBuilder - 构建阶段（仅追加）
// ============================================================================

pub struct SimplexStoreBuilder {
    filtration: FiltrationGrid,
    shape: GridShape,
    num_vertices: usize,
    max_dimension: usize,
    binomial: BinomialCoeffTable,
    /// births[simplex] = 出生位置的打包键
    births: HashMap<Simplex, usize>,
}

impl SimplexStoreBuilder {
    /// # Arguments
    ///
    /// * `filtration` - 过滤网格
    /// * `num_vertices` - 顶点数
    /// * `max_dimension` - 允许的最高单纯形维度
    ///
    /// # Panics
    ///
    /// 单纯形索引超出 i64 范围时 panic；输入不可信时用 [`Self::try_new`]
    pub fn new(filtration: FiltrationGrid, num_vertices: usize, max_dimension: usize) -> Self {
        match Self::try_new(filtration, num_vertices, max_dimension) {
            Ok(builder) => builder,
            Err(e) => panic!("{}", e),
        }
    }

    /// # Errors
    ///
    /// `InvalidInput`: num_vertices 个顶点上至 max_dimension + 1 维的单纯形索引无法用 i64 表示
    pub fn try_new(
        filtration: FiltrationGrid,
        num_vertices: usize,
        max_dimension: usize,
    ) -> Result<Self> {
        // 余边界枚举需要 C(v, dim + 2)
        let binomial = max_dimension
            .checked_add(2)
            .and_then(|k| BinomialCoeffTable::try_new(num_vertices, k))
            .ok_or_else(|| {
                PersistenceError::InvalidInput(format!(
                    "simplex indices for {} vertices up to dimension {} do not fit in i64",
                    num_vertices, max_dimension
                ))
            })?;
        let shape = filtration.shape();
        Ok(Self {
            filtration,
            shape,
            num_vertices,
            max_dimension,
            binomial,
            births: HashMap::new(),
        })
    }

    pub fn binomial(&self) -> &BinomialCoeffTable {
        &self.binomial
    }

    /// 追加单纯形
    ///
    /// 同一位置重复添加是空操作；同一单纯形出现在两个不同位置时报错。
    pub fn add_element(&mut self, simplex: Simplex, position: &Position) -> Result<()> {
        if !self.shape.contains(position) {
            return Err(PersistenceError::OutOfBounds(position.clone()));
        }
        if simplex.dim > self.max_dimension {
            return Err(PersistenceError::InvalidInput(format!(
                "{} exceeds max dimension {}",
                simplex, self.max_dimension
            )));
        }
        let count = self.binomial.get(self.num_vertices, simplex.dim + 1);
        if simplex.index < 0 || simplex.index >= count {
            return Err(PersistenceError::InvalidInput(format!(
                "{} references vertices outside 0..{}",
                simplex, self.num_vertices
            )));
        }

        let key = self.shape.key(position);
        match self.births.get(&simplex) {
            Some(&existing) if existing != key => Err(PersistenceError::InvalidInput(format!(
                "{} already born at {}",
                simplex,
                self.shape.position(existing)
            ))),
            Some(_) => Ok(()),
            None => {
                self.births.insert(simplex, key);
                Ok(())
            }
        }
    }

    /// 按顶点列表追加
    pub fn add_simplex(&mut self, vertices: &[usize], position: &Position) -> Result<()> {
        if vertices.is_empty() {
            return Err(PersistenceError::InvalidInput("empty simplex".to_string()));
        }
        let mut sorted = vertices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != vertices.len() {
            return Err(PersistenceError::InvalidInput(format!(
                "repeated vertex in {:?}",
                vertices
            )));
        }
        if let Some(&v) = sorted.last().filter(|&&v| v >= self.num_vertices) {
            return Err(PersistenceError::InvalidInput(format!(
                "vertex {} outside 0..{}",
                v, self.num_vertices
            )));
        }
        if sorted.len() - 1 > self.max_dimension {
            return Err(PersistenceError::InvalidInput(format!(
                "simplex {:?} exceeds max dimension {}",
                vertices, self.max_dimension
            )));
        }
        let simplex = Simplex::new(self.binomial.rank(&sorted), sorted.len() - 1);
        self.add_element(simplex, position)
    }

    /// 冻结为不可变存储
    ///
    /// # Errors
    ///
    /// `InvalidInput`: 某个单纯形的 face 缺失或出生得更晚（不是合法的过滤）
    pub fn build(self, lookup: LookupStrategy) -> Result<SimplexStore> {
        self.check_faces()?;

        let mut cells: Vec<BTreeMap<usize, Vec<Simplex>>> =
            vec![BTreeMap::new(); self.max_dimension + 1];
        for (&simplex, &key) in &self.births {
            cells[simplex.dim].entry(key).or_default().push(simplex);
        }
        for cell in cells.iter_mut().flat_map(|c| c.values_mut()) {
            cell.sort_unstable();
        }

        tracing::debug!(
            simplices = self.births.len(),
            vertices = self.num_vertices,
            max_dimension = self.max_dimension,
            cells = self.shape.len(),
            "simplex store built"
        );

        let mut store = SimplexStore {
            filtration: self.filtration,
            shape: self.shape,
            num_vertices: self.num_vertices,
            max_dimension: self.max_dimension,
            binomial: self.binomial,
            cells,
            births: self.births,
            lookup: LookupStrategy::Dense,
            predecessors: HashMap::new(),
        };
        store.set_lookup(lookup);
        Ok(store)
    }

    fn check_faces(&self) -> Result<()> {
        for (&simplex, &key) in &self.births {
            let birth = self.shape.position(key);
            for face in BoundaryEnumerator::new(simplex, self.num_vertices, &self.binomial) {
                let face_birth = self.births.get(&face).map(|&k| self.shape.position(k));
                if !face_birth.map_or(false, |w| w.leq(&birth)) {
                    return Err(PersistenceError::InvalidInput(format!(
                        "face {} of {} is missing or born after {}",
                        face, simplex, birth
                    )));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// SimplexStore - 不可变存储
// ============================================================================

pub struct SimplexStore {
    filtration: FiltrationGrid,
    shape: GridShape,
    num_vertices: usize,
    max_dimension: usize,
    binomial: BinomialCoeffTable,
    /// cells[dim][key]: 恰好在 key 出生的单纯形（按索引升序）
    cells: Vec<BTreeMap<usize, Vec<Simplex>>>,
    births: HashMap<Simplex, usize>,
    lookup: LookupStrategy,
    /// 稀疏策略：已占用位置 → 极大的已占用严格前驱
    predecessors: HashMap<usize, Vec<usize>>,
}

impl SimplexStore {
    #[inline]
    pub fn filtration(&self) -> &FiltrationGrid {
        &self.filtration
    }

    #[inline]
    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    #[inline]
    pub fn max_dimension(&self) -> usize {
        self.max_dimension
    }

    /// 覆盖 k = max_dimension + 2 的二项式系数表
    #[inline]
    pub fn binomial(&self) -> &BinomialCoeffTable {
        &self.binomial
    }

    #[inline]
    pub fn lookup(&self) -> LookupStrategy {
        self.lookup
    }

    /// 单纯形总数
    pub fn len(&self) -> usize {
        self.births.len()
    }

    pub fn is_empty(&self) -> bool {
        self.births.is_empty()
    }

    pub fn birth(&self, simplex: &Simplex) -> Option<Position> {
        self.births.get(simplex).map(|&key| self.shape.position(key))
    }

    /// 切换查找策略（稀疏策略会重新计算前驱图）
    pub fn set_lookup(&mut self, lookup: LookupStrategy) {
        self.lookup = lookup;
        self.predecessors = match lookup {
            LookupStrategy::Dense => HashMap::new(),
            LookupStrategy::Sparse => self.maximal_predecessors(),
        };
    }

    /// 恰好在 v 出生的 dim 维单纯形
    pub fn simplices_at(&self, dim: usize, v: &Position) -> &[Simplex] {
        if dim > self.max_dimension || !self.shape.contains(v) {
            return &[];
        }
        self.cells[dim]
            .get(&self.shape.key(v))
            .map_or(&[], Vec::as_slice)
    }

    /// 所有出生位置 ≤ v 的 dim 维单纯形，按索引升序
    pub fn simplices_leq(&self, dim: usize, v: &Position) -> Vec<Simplex> {
        if dim > self.max_dimension || !self.shape.contains(v) {
            return Vec::new();
        }

        let keys = match self.lookup {
            LookupStrategy::Dense => self.shape.keys_leq(v),
            LookupStrategy::Sparse => self.occupied_keys_leq(v),
        };

        let cells = &self.cells[dim];
        let mut simplices: Vec<Simplex> = keys
            .into_iter()
            .filter_map(|key| cells.get(&key))
            .flatten()
            .copied()
            .collect();
        simplices.sort_unstable();
        simplices
    }

    /// 所有 (单纯形, 出生位置)，按 (维度, 索引) 排序
    pub fn iter(&self) -> impl Iterator<Item = (Simplex, Position)> + '_ {
        self.cells.iter().flat_map(move |cells| {
            let mut entries: Vec<(Simplex, usize)> = cells
                .iter()
                .flat_map(|(&key, simplices)| simplices.iter().map(move |&s| (s, key)))
                .collect();
            entries.sort_unstable();
            entries
                .into_iter()
                .map(move |(s, key)| (s, self.shape.position(key)))
        })
    }

    // ------------------------------------------------------------------------
    // 稀疏查找
    // ------------------------------------------------------------------------

    fn occupied_keys(&self) -> Vec<usize> {
        let mut keys: Vec<usize> = self.births.values().copied().collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// 为每个已占用位置逐层提取 Pareto 前沿，得到极大严格前驱
    fn maximal_predecessors(&self) -> HashMap<usize, Vec<usize>> {
        let occupied: Vec<(usize, Position)> = self
            .occupied_keys()
            .into_iter()
            .map(|key| (key, self.shape.position(key)))
            .collect();

        occupied
            .iter()
            .map(|(key, z)| {
                let below: Vec<&(usize, Position)> = occupied
                    .iter()
                    .filter(|(k, w)| k != key && w.leq(z))
                    .collect();
                (*key, pareto_frontier(&below))
            })
            .collect()
    }

    /// 沿前驱图遍历，返回所有 ≤ v 的已占用键
    fn occupied_keys_leq(&self, v: &Position) -> Vec<usize> {
        let v_key = self.shape.key(v);
        let mut stack: Vec<usize> = if self.predecessors.contains_key(&v_key) {
            vec![v_key]
        } else {
            let below: Vec<(usize, Position)> = self
                .predecessors
                .keys()
                .map(|&key| (key, self.shape.position(key)))
                .filter(|(_, w)| w.leq(v))
                .collect();
            pareto_frontier(&below.iter().collect::<Vec<_>>())
        };

        let mut visited: HashSet<usize> = stack.iter().copied().collect();
        while let Some(key) = stack.pop() {
            for &pred in self.predecessors.get(&key).into_iter().flatten() {
                if visited.insert(pred) {
                    stack.push(pred);
                }
            }
        }
        visited.into_iter().collect()
    }
}

/// 极大元：不被其它元素严格支配的位置
fn pareto_frontier(candidates: &[&(usize, Position)]) -> Vec<usize> {
    let mut frontier: Vec<usize> = candidates
        .iter()
        .filter(|(key, w)| {
            !candidates
                .iter()
                .any(|(other, u)| other != key && w.leq(u))
        })
        .map(|(key, _)| *key)
        .collect();
    frontier.sort_unstable();
    frontier
}

impl fmt::Debug for SimplexStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SimplexStore(simplices={}, vertices={}, grid={:?})",
            self.births.len(),
            self.num_vertices,
            self.shape.size()
        )
    }
}

// ============================================================================
// 单元测试
// ============================================================================
