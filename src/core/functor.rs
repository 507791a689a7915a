/*!
 * 网格上的函子（持久模）
 *
 * 每个网格位置 v 对应一个 GF(2) 向量空间 V(v)（只记录维数），每个方向 i
 * 对应结构映射 M_i(v): V(v) → V(v + e_i)，用 dim(v+e_i) × dim(v) 的矩阵表示。
 * 在方向 i 的上边界处，M_i(v) 是 V(v) 上的恒等映射。
 *
 * # 存储布局
 *
 * - `StorageLayout::Dense`: 保存每个映射
 * - `StorageLayout::Sparse`: 不保存恒等映射，读取时再合成
 *
 * 未写入的映射在读取时：源、目标维数相同则视为恒等映射，否则视为零映射。
 */

use super::grid::{Grid, GridShape, StorageLayout};
use super::matrix::{GF2Matrix, GF2Vector};
use crate::error::{FunctorError, MatrixError};
use crate::types::Position;
use std::borrow::Cow;

type Result<T> = std::result::Result<T, FunctorError>;

/// 生成元：在 position 处出现、不来自任何入射映射像的向量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    pub position: Position,
    pub vector: GF2Vector,
}

#[derive(Debug, Clone)]
pub struct Functor {
    dimensions: Grid<usize>,
    /// maps[i]: 方向 i 的结构映射
    maps: Vec<Grid<GF2Matrix>>,
    layout: StorageLayout,
}

impl Functor {
    /// # Arguments
    ///
    /// * `dimensions` - 每个位置的向量空间维数（未写入的位置维数为 0）
    /// * `layout` - 结构映射的存储布局
    pub fn new(dimensions: Grid<usize>, layout: StorageLayout) -> Self {
        let shape = dimensions.shape().clone();
        let maps = (0..shape.directions())
            .map(|_| Grid::new(shape.clone(), layout))
            .collect();
        Self {
            dimensions,
            maps,
            layout,
        }
    }

    #[inline]
    pub fn shape(&self) -> &GridShape {
        self.dimensions.shape()
    }

    #[inline]
    pub fn layout(&self) -> StorageLayout {
        self.layout
    }

    pub fn dimension(&self, v: &Position) -> usize {
        self.dimensions.get(v).copied().unwrap_or(0)
    }

    /// M_direction(v) 的目标维数
    fn target_dimension(&self, v: &Position, direction: usize) -> usize {
        if self.shape().is_upper_boundary(v, direction) {
            self.dimension(v)
        } else {
            self.dimension(&v.step_up(direction))
        }
    }

    fn check_bounds(&self, v: &Position, direction: usize) -> Result<()> {
        if !self.shape().contains(v) || direction >= self.shape().directions() {
            return Err(FunctorError::OutOfBounds {
                position: v.clone(),
                direction,
            });
        }
        Ok(())
    }

    /// 写入 M_direction(v)
    ///
    /// # Errors
    ///
    /// - `OutOfBounds`: v 不在网格内或方向无效
    /// - `Matrix(WrongDimension)`: 矩阵形状不是 dim(v+e) × dim(v)
    pub fn set_map(&mut self, v: &Position, direction: usize, map: GF2Matrix) -> Result<()> {
        self.check_bounds(v, direction)?;

        let source = self.dimension(v);
        let target = self.target_dimension(v, direction);
        if map.rows() != target || map.cols() != source {
            return Err(MatrixError::wrong_dimension(
                "set_map",
                format!("{}x{}", target, source),
                format!("{}x{}", map.rows(), map.cols()),
            )
            .into());
        }

        let maps = &mut self.maps[direction];
        if self.layout == StorageLayout::Sparse && map.is_identity() {
            maps.remove(v);
        } else {
            maps.insert(v, map);
        }
        Ok(())
    }

    /// M_direction(v)
    pub fn map(&self, v: &Position, direction: usize) -> Result<Cow<'_, GF2Matrix>> {
        self.check_bounds(v, direction)?;

        if let Some(map) = self.maps[direction].get(v) {
            return Ok(Cow::Borrowed(map));
        }

        let source = self.dimension(v);
        let target = self.target_dimension(v, direction);
        Ok(Cow::Owned(if source == target {
            GF2Matrix::identity(source)
        } else {
            GF2Matrix::zeros(target, source)
        }))
    }

    /// 沿单调路径复合结构映射 V(from) → V(to)
    ///
    /// from = to 时返回恒等映射；from ≰ to 时返回 `None`。
    /// 由于自然性，结果与路径无关；这里先走方向 0，再走方向 1，依此类推。
    pub fn map_between(&self, from: &Position, to: &Position) -> Result<Option<GF2Matrix>> {
        if !self.shape().contains(from) {
            return Err(FunctorError::OutOfBounds {
                position: from.clone(),
                direction: 0,
            });
        }
        if !self.shape().contains(to) {
            return Err(FunctorError::OutOfBounds {
                position: to.clone(),
                direction: 0,
            });
        }
        if !from.leq(to) {
            return Ok(None);
        }

        let mut composite = GF2Matrix::identity(self.dimension(from));
        let mut current = from.clone();
        for direction in 0..self.shape().directions() {
            while current[direction] < to[direction] {
                composite = self.map(&current, direction)?.multiply(&composite)?;
                current = current.step_up(direction);
            }
        }
        Ok(Some(composite))
    }

    /// 秩不变量 rank(V(from) → V(to))；from ≰ to 时返回 `None`
    pub fn rank(&self, from: &Position, to: &Position) -> Result<Option<usize>> {
        Ok(self.map_between(from, to)?.map(|m| m.rank()))
    }

    /// 检查所有基本交换方块
    ///
    /// 对网格内的 v 与方向 i < j（v + e_i + e_j 在网格内）：
    /// M_j(v + e_i) · M_i(v) == M_i(v + e_j) · M_j(v)
    ///
    /// # Errors
    ///
    /// `Malformed`: 第一个不交换的方块
    pub fn verify(&self) -> Result<()> {
        let shape = self.shape();
        let r = shape.directions();

        for v in shape.positions() {
            for i in 0..r {
                if shape.is_upper_boundary(&v, i) {
                    continue;
                }
                for j in (i + 1)..r {
                    if shape.is_upper_boundary(&v, j) {
                        continue;
                    }
                    let (first, second) = (self.map(&v, i)?, self.map(&v, j)?);
                    let left = self.map(&v.step_up(i), j)?.multiply(&first)?;
                    let right = self.map(&v.step_up(j), i)?.multiply(&second)?;
                    if left != right {
                        return Err(FunctorError::Malformed {
                            position: v,
                            first: i,
                            second: j,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// 生成元
    ///
    /// 对每个 dim V(v) > 0 的位置：把所有入射映射 M_i(v - e_i) 横向拼接，
    /// 取其像的基；若像不能张成 V(v)，扩充为完整的基，新增的基向量就是
    /// v 处的生成元。原点处所有单位向量都是生成元。
    pub fn generators(&self) -> Result<Vec<Generator>> {
        let shape = self.shape();
        let mut generators = Vec::new();

        for v in shape.positions() {
            let dim = self.dimension(&v);
            if dim == 0 {
                continue;
            }

            let mut incoming: Option<GF2Matrix> = None;
            for i in 0..shape.directions() {
                let Some(prev) = v.step_down(i) else {
                    continue;
                };
                let map = self.map(&prev, i)?;
                incoming = Some(match incoming {
                    Some(acc) => acc.hconcat(&map)?,
                    None => map.into_owned(),
                });
            }

            let image = match incoming {
                Some(matrix) => matrix.reduction().1,
                None => GF2Matrix::zeros(0, dim),
            };
            if image.rows() == dim {
                continue;
            }

            let basis = image.extend_basis()?;
            generators.extend((image.rows()..dim).map(|k| Generator {
                position: v.clone(),
                vector: basis.row(k),
            }));
        }

        Ok(generators)
    }

    /// 截取子函子：每个位置只保留前 dims(v) 个坐标
    ///
    /// 结构映射取左上角 dims(v+e) × dims(v) 的块，同时返回坐标截断投影
    /// [I | 0]: V(v) → sub(v)。只有当截取的坐标子空间在原映射下封闭
    /// （到更高坐标的分量可忽略）时，结果才是函子；只有当映射不把后面的坐标
    /// 送入前面的坐标时，投影才是自然变换。
    ///
    /// # Errors
    ///
    /// `Matrix(WrongDimension)`: 某个位置的新维数超过原维数
    pub fn sub_functor(&self, dims: Grid<usize>) -> Result<(Functor, Nat)> {
        let shape = self.shape().clone();
        if dims.shape() != &shape {
            return Err(MatrixError::wrong_dimension(
                "sub_functor",
                format!("{:?}", shape.size()),
                format!("{:?}", dims.shape().size()),
            )
            .into());
        }
        for v in shape.positions() {
            let (new, old) = (dims.get(&v).copied().unwrap_or(0), self.dimension(&v));
            if new > old {
                return Err(MatrixError::wrong_dimension(
                    "sub_functor",
                    format!("{} at {}", old, v),
                    new,
                )
                .into());
            }
        }

        let mut sub = Functor::new(dims, self.layout);
        let mut projection = Nat::new(shape.clone());
        for v in shape.positions() {
            let (rows, cols) = (sub.dimension(&v), self.dimension(&v));
            projection.set_map(&v, GF2Matrix::identity(cols).sub_matrix(0..rows, 0..cols))?;
            for direction in 0..shape.directions() {
                let rows = sub.target_dimension(&v, direction);
                let block = self.map(&v, direction)?.sub_matrix(0..rows, 0..sub.dimension(&v));
                sub.set_map(&v, direction, block)?;
            }
        }
        Ok((sub, projection))
    }
}

// ============================================================================
// Nat - 自然变换
// ============================================================================

/// 自然变换 F ⇒ G：每个位置一个分量 nat(v): F(v) → G(v)
#[derive(Debug, Clone)]
pub struct Nat {
    components: Grid<GF2Matrix>,
}

impl Nat {
    pub fn new(shape: GridShape) -> Self {
        Self {
            components: Grid::new(shape, StorageLayout::Dense),
        }
    }

    #[inline]
    pub fn shape(&self) -> &GridShape {
        self.components.shape()
    }

    pub fn set_map(&mut self, v: &Position, map: GF2Matrix) -> Result<()> {
        if !self.shape().contains(v) {
            return Err(FunctorError::OutOfBounds {
                position: v.clone(),
                direction: 0,
            });
        }
        self.components.insert(v, map);
        Ok(())
    }

    pub fn map(&self, v: &Position) -> Option<&GF2Matrix> {
        self.components.get(v)
    }

    fn component(&self, v: &Position, source: &Functor, target: &Functor) -> Result<&GF2Matrix> {
        let map = self
            .map(v)
            .ok_or_else(|| FunctorError::MissingComponent { position: v.clone() })?;
        let (rows, cols) = (target.dimension(v), source.dimension(v));
        if map.rows() != rows || map.cols() != cols {
            return Err(MatrixError::wrong_dimension(
                "natural transformation",
                format!("{}x{} at {}", rows, cols, v),
                format!("{}x{}", map.rows(), map.cols()),
            )
            .into());
        }
        Ok(map)
    }

    /// 检查 source ⇒ target 的自然性
    ///
    /// 对网格内的 v 与方向 i（v + e_i 在网格内）：
    /// nat(v + e_i) · source_i(v) == target_i(v) · nat(v)
    ///
    /// # Errors
    ///
    /// - `MissingComponent`: 某个位置没有分量
    /// - `Matrix(WrongDimension)`: 网格形状不一致，或分量不是 dim G(v) × dim F(v)
    /// - `NotNatural`: 第一个不交换的方块
    pub fn verify(&self, source: &Functor, target: &Functor) -> Result<()> {
        let shape = self.shape();
        for other in [source.shape(), target.shape()] {
            if other != shape {
                return Err(MatrixError::wrong_dimension(
                    "natural transformation",
                    format!("{:?}", shape.size()),
                    format!("{:?}", other.size()),
                )
                .into());
            }
        }

        for v in shape.positions() {
            let here = self.component(&v, source, target)?;
            for direction in 0..shape.directions() {
                if shape.is_upper_boundary(&v, direction) {
                    continue;
                }
                let next = v.step_up(direction);
                let there = self.component(&next, source, target)?;
                let left = there.multiply(&*source.map(&v, direction)?)?;
                let right = target.map(&v, direction)?.multiply(here)?;
                if left != right {
                    return Err(FunctorError::NotNatural {
                        position: v,
                        direction,
                    });
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// 单元测试
// ============================================================================
