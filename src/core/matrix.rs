/*!
 * GF(2) 稀疏线性代数
 *
 * 这个模块实现 Z/2Z 系数域上的稀疏向量与稀疏矩阵：
 * - `GF2Vector`: 只存储值为 1 的下标（升序）
 * - `GF2Matrix`: 按行稀疏存储，只有非零行才会物化
 *
 * 加法是 XOR，点积是 AND 之后取奇偶。
 *
 * # 算法概览
 *
 * 所有分解都建立在同一个行消元原语 `reduce_rows` 之上：
 *
 * 1. 按行号顺序处理每个非零行，取其最小的非零列作为 pivot
 * 2. 将 pivot 行 XOR 进所有其它在该列为 1 的行（包括之前已处理的行）
 * 3. 可选的伴随矩阵（companion）同步执行相同的行操作
 *
 * 结果是约化行阶梯形：每个 pivot 列在约化后只剩 pivot 行一个 1。
 *
 * 在此之上：
 * - `rank`: pivot 个数
 * - `reduction`: 对 Aᵗ 消元并跟踪单位阵，得到 (核基, 像基)
 * - `solve`: 对 A 消元并携带 B，读出 X
 * - `basis` / `extend_basis`: 子空间的基与基扩充
 *
 * 所有运算都是纯函数：返回新矩阵，而不是修改参数。
 */

use crate::error::MatrixError;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// 可枚举仿射空间的维度上限（2^rank 必须能放进 u64）
pub const AFFINE_DIMENSION_LIMIT: usize = 63;

// ============================================================================
// GF2Vector
// ============================================================================

/// GF(2) 稀疏向量
///
/// `ones` 严格升序，所有元素 < `len`。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GF2Vector {
    len: usize,
    ones: Vec<usize>,
}

impl GF2Vector {
    /// 零向量
    pub fn zeros(len: usize) -> Self {
        Self {
            len,
            ones: Vec::new(),
        }
    }

    /// 单位向量 e_i
    pub fn unit(len: usize, i: usize) -> Self {
        assert!(i < len, "Unit index {} out of bounds (len={})", i, len);
        Self { len, ones: vec![i] }
    }

    /// 从非零下标创建（会自动排序并去重）
    pub fn from_indices(len: usize, mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        assert!(
            indices.last().map_or(true, |&i| i < len),
            "Index out of bounds (len={}): {:?}",
            len,
            indices
        );
        Self { len, ones: indices }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.ones.is_empty()
    }

    #[inline]
    pub fn count_ones(&self) -> usize {
        self.ones.len()
    }

    /// 非零下标（升序）
    #[inline]
    pub fn ones(&self) -> &[usize] {
        &self.ones
    }

    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.ones.iter().copied()
    }

    /// pivot：最小的非零下标
    #[inline]
    pub fn first_one(&self) -> Option<usize> {
        self.ones.first().copied()
    }

    #[inline]
    pub fn last_one(&self) -> Option<usize> {
        self.ones.last().copied()
    }

    #[inline]
    pub fn get(&self, i: usize) -> bool {
        self.ones.binary_search(&i).is_ok()
    }

    pub fn set(&mut self, i: usize, value: bool) {
        assert!(i < self.len, "Index {} out of bounds (len={})", i, self.len);
        match (self.ones.binary_search(&i), value) {
            (Ok(pos), false) => {
                self.ones.remove(pos);
            }
            (Err(pos), true) => self.ones.insert(pos, i),
            _ => {}
        }
    }

    /// 翻转单个分量（Z/2Z 中加 1）
    pub fn toggle(&mut self, i: usize) {
        let value = !self.get(i);
        self.set(i, value);
    }

    /// 向量加法（XOR）
    pub fn plus(&self, other: &GF2Vector) -> Result<GF2Vector, MatrixError> {
        if self.len != other.len {
            return Err(MatrixError::wrong_dimension("vector plus", self.len, other.len));
        }
        Ok(GF2Vector {
            len: self.len,
            ones: symmetric_difference(&self.ones, &other.ones),
        })
    }

    /// 原地 XOR，调用方保证长度一致
    pub(crate) fn xor_assign(&mut self, other: &GF2Vector) {
        debug_assert_eq!(self.len, other.len);
        self.ones = symmetric_difference(&self.ones, &other.ones);
    }

    /// 点积：AND 之后取奇偶
    pub fn dot(&self, other: &GF2Vector) -> Result<bool, MatrixError> {
        if self.len != other.len {
            return Err(MatrixError::wrong_dimension("vector dot", self.len, other.len));
        }
        Ok(intersection_parity(&self.ones, &other.ones))
    }

    /// 拼接 [self, other]
    pub fn concat(&self, other: &GF2Vector) -> GF2Vector {
        let mut ones = self.ones.clone();
        ones.extend(other.ones.iter().map(|&i| i + self.len));
        GF2Vector {
            len: self.len + other.len,
            ones,
        }
    }

    /// 子向量 [range.start, range.end)，下标重新从 0 开始
    pub fn sub_vector(&self, range: Range<usize>) -> GF2Vector {
        assert!(
            range.start <= range.end && range.end <= self.len,
            "Range {:?} out of bounds (len={})",
            range,
            self.len
        );
        let ones = self
            .ones
            .iter()
            .filter(|&&i| range.contains(&i))
            .map(|&i| i - range.start)
            .collect();
        GF2Vector {
            len: range.end - range.start,
            ones,
        }
    }
}

impl fmt::Display for GF2Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for i in 0..self.len {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", if self.get(i) { 1 } else { 0 })?;
        }
        write!(f, "]")
    }
}

/// 两个升序下标列表的对称差
fn symmetric_difference(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut result = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                result.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                result.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    result.extend_from_slice(&a[i..]);
    result.extend_from_slice(&b[j..]);
    result
}

fn intersection_parity(a: &[usize], b: &[usize]) -> bool {
    let (mut i, mut j) = (0, 0);
    let mut parity = false;
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                parity = !parity;
                i += 1;
                j += 1;
            }
        }
    }
    parity
}

// ============================================================================
// GF2Matrix
// ============================================================================

/// GF(2) 稀疏矩阵
///
/// 行号 → 非零行。零行不存储，因此结构相等即数学相等。
/// 行数与列数在构造时固定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GF2Matrix {
    rows: usize,
    cols: usize,
    data: BTreeMap<usize, GF2Vector>,
}

/// 带伴随矩阵的行消元结果
#[derive(Debug, Clone)]
pub struct RowReduction {
    /// 约化后的矩阵
    pub reduced: GF2Matrix,
    /// 经过相同行操作的伴随矩阵
    pub transform: GF2Matrix,
    /// (行, pivot 列)，按行处理顺序
    pub pivots: Vec<(usize, usize)>,
}

impl GF2Matrix {
    /// 零矩阵
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: BTreeMap::new(),
        }
    }

    /// n 阶单位阵
    pub fn identity(n: usize) -> Self {
        let data = (0..n).map(|i| (i, GF2Vector::unit(n, i))).collect();
        Self {
            rows: n,
            cols: n,
            data,
        }
    }

    /// 以向量为行构造矩阵；所有向量长度必须等于 `cols`
    pub fn from_rows(cols: usize, rows: Vec<GF2Vector>) -> Result<Self, MatrixError> {
        let mut matrix = Self::zeros(rows.len(), cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(MatrixError::wrong_dimension("from_rows", cols, row.len()));
            }
            matrix.put_row(i, row);
        }
        Ok(matrix)
    }

    /// 从 (行, 列) 非零元构造
    pub fn from_entries(rows: usize, cols: usize, entries: &[(usize, usize)]) -> Self {
        let mut matrix = Self::zeros(rows, cols);
        for &(i, j) in entries {
            matrix.set(i, j, true);
        }
        matrix
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn is_identity(&self) -> bool {
        self.is_square()
            && self.data.len() == self.rows
            && self
                .data
                .iter()
                .all(|(&i, row)| row.ones() == [i].as_slice())
    }

    pub fn get(&self, i: usize, j: usize) -> bool {
        assert!(
            i < self.rows && j < self.cols,
            "Entry ({}, {}) out of bounds ({}x{})",
            i,
            j,
            self.rows,
            self.cols
        );
        self.data.get(&i).map_or(false, |row| row.get(j))
    }

    pub fn set(&mut self, i: usize, j: usize, value: bool) {
        assert!(
            i < self.rows && j < self.cols,
            "Entry ({}, {}) out of bounds ({}x{})",
            i,
            j,
            self.rows,
            self.cols
        );
        let cols = self.cols;
        let row = self.data.entry(i).or_insert_with(|| GF2Vector::zeros(cols));
        row.set(j, value);
        if row.is_zero() {
            self.data.remove(&i);
        }
    }

    /// 第 i 行（零行返回零向量）
    pub fn row(&self, i: usize) -> GF2Vector {
        assert!(i < self.rows, "Row {} out of bounds (rows={})", i, self.rows);
        self.data
            .get(&i)
            .cloned()
            .unwrap_or_else(|| GF2Vector::zeros(self.cols))
    }

    /// 第 i 行的引用；零行为 None
    #[inline]
    pub fn row_ref(&self, i: usize) -> Option<&GF2Vector> {
        self.data.get(&i)
    }

    pub fn set_row(&mut self, i: usize, row: GF2Vector) -> Result<(), MatrixError> {
        if i >= self.rows {
            return Err(MatrixError::wrong_dimension("set_row", self.rows, i));
        }
        if row.len() != self.cols {
            return Err(MatrixError::wrong_dimension("set_row", self.cols, row.len()));
        }
        self.put_row(i, row);
        Ok(())
    }

    fn put_row(&mut self, i: usize, row: GF2Vector) {
        if row.is_zero() {
            self.data.remove(&i);
        } else {
            self.data.insert(i, row);
        }
    }

    /// 非零行（按行号升序）
    pub fn nonzero_rows(&self) -> impl Iterator<Item = (usize, &GF2Vector)> {
        self.data.iter().map(|(&i, row)| (i, row))
    }

    pub fn column(&self, j: usize) -> GF2Vector {
        assert!(j < self.cols, "Column {} out of bounds (cols={})", j, self.cols);
        let ones = self
            .data
            .iter()
            .filter(|(_, row)| row.get(j))
            .map(|(&i, _)| i)
            .collect();
        GF2Vector {
            len: self.rows,
            ones,
        }
    }

    pub fn count_ones(&self) -> usize {
        self.data.values().map(GF2Vector::count_ones).sum()
    }

    // ------------------------------------------------------------------------
    // 标准稀疏运算
    // ------------------------------------------------------------------------

    pub fn transpose(&self) -> GF2Matrix {
        let mut columns: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (&i, row) in &self.data {
            for j in row.iter_ones() {
                // 行号升序遍历，因此每列的下标天然有序
                columns.entry(j).or_default().push(i);
            }
        }
        let data = columns
            .into_iter()
            .map(|(j, ones)| {
                (
                    j,
                    GF2Vector {
                        len: self.rows,
                        ones,
                    },
                )
            })
            .collect();
        GF2Matrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// 矩阵乘法 self · other
    pub fn multiply(&self, other: &GF2Matrix) -> Result<GF2Matrix, MatrixError> {
        if self.cols != other.rows {
            return Err(MatrixError::wrong_dimension(
                "multiply",
                format!("{}x{}", self.rows, self.cols),
                format!("{}x{}", other.rows, other.cols),
            ));
        }
        let mut product = GF2Matrix::zeros(self.rows, other.cols);
        for (&i, row) in &self.data {
            let mut acc = GF2Vector::zeros(other.cols);
            for k in row.iter_ones() {
                if let Some(other_row) = other.data.get(&k) {
                    acc.xor_assign(other_row);
                }
            }
            product.put_row(i, acc);
        }
        Ok(product)
    }

    /// 矩阵乘向量 self · v
    pub fn multiply_vector(&self, v: &GF2Vector) -> Result<GF2Vector, MatrixError> {
        if self.cols != v.len() {
            return Err(MatrixError::wrong_dimension("multiply_vector", self.cols, v.len()));
        }
        let ones = self
            .data
            .iter()
            .filter(|(_, row)| intersection_parity(row.ones(), v.ones()))
            .map(|(&i, _)| i)
            .collect();
        Ok(GF2Vector {
            len: self.rows,
            ones,
        })
    }

    /// 矩阵加法（XOR）
    pub fn plus(&self, other: &GF2Matrix) -> Result<GF2Matrix, MatrixError> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(MatrixError::wrong_dimension(
                "plus",
                format!("{}x{}", self.rows, self.cols),
                format!("{}x{}", other.rows, other.cols),
            ));
        }
        let mut sum = self.clone();
        for (&i, row) in &other.data {
            let mut merged = sum.row(i);
            merged.xor_assign(row);
            sum.put_row(i, merged);
        }
        Ok(sum)
    }

    /// 水平拼接 [self | other]
    pub fn hconcat(&self, other: &GF2Matrix) -> Result<GF2Matrix, MatrixError> {
        if self.rows != other.rows {
            return Err(MatrixError::wrong_dimension("hconcat", self.rows, other.rows));
        }
        let mut result = GF2Matrix::zeros(self.rows, self.cols + other.cols);
        let left_zero = GF2Vector::zeros(self.cols);
        let right_zero = GF2Vector::zeros(other.cols);
        let touched: std::collections::BTreeSet<usize> =
            self.data.keys().chain(other.data.keys()).copied().collect();
        for i in touched {
            let left = self.data.get(&i).unwrap_or(&left_zero);
            let right = other.data.get(&i).unwrap_or(&right_zero);
            result.put_row(i, left.concat(right));
        }
        Ok(result)
    }

    /// 垂直拼接 [self; other]
    pub fn vconcat(&self, other: &GF2Matrix) -> Result<GF2Matrix, MatrixError> {
        if self.cols != other.cols {
            return Err(MatrixError::wrong_dimension("vconcat", self.cols, other.cols));
        }
        let mut result = self.clone();
        result.rows += other.rows;
        for (&i, row) in &other.data {
            result.data.insert(i + self.rows, row.clone());
        }
        Ok(result)
    }

    /// 子矩阵 [rows) × [cols)，下标重新从 0 开始
    pub fn sub_matrix(&self, rows: Range<usize>, cols: Range<usize>) -> GF2Matrix {
        assert!(
            rows.start <= rows.end && rows.end <= self.rows,
            "Row range {:?} out of bounds (rows={})",
            rows,
            self.rows
        );
        assert!(
            cols.start <= cols.end && cols.end <= self.cols,
            "Column range {:?} out of bounds (cols={})",
            cols,
            self.cols
        );
        let mut result = GF2Matrix::zeros(rows.end - rows.start, cols.end - cols.start);
        for (&i, row) in self.data.range(rows.clone()) {
            result.put_row(i - rows.start, row.sub_vector(cols.clone()));
        }
        result
    }

    // ------------------------------------------------------------------------
    // 消元与分解
    // ------------------------------------------------------------------------

    /// 行消元，返回 (约化矩阵, pivots)
    pub fn reduce_rows(&self) -> (GF2Matrix, Vec<(usize, usize)>) {
        let mut reduced = self.clone();
        let pivots = eliminate(&mut reduced, None);
        (reduced, pivots)
    }

    /// 行消元，伴随矩阵 `companion` 同步执行相同的行操作
    pub fn reduce_rows_with(&self, companion: &GF2Matrix) -> Result<RowReduction, MatrixError> {
        if companion.rows != self.rows {
            return Err(MatrixError::wrong_dimension(
                "reduce_rows_with",
                self.rows,
                companion.rows,
            ));
        }
        let mut reduced = self.clone();
        let mut transform = companion.clone();
        let pivots = eliminate(&mut reduced, Some(&mut transform));
        Ok(RowReduction {
            reduced,
            transform,
            pivots,
        })
    }

    pub fn rank(&self) -> usize {
        let mut scratch = self.clone();
        eliminate(&mut scratch, None).len()
    }

    /// (核基, 像基)
    ///
    /// 核基的每一行 k 满足 self · k = 0（k 的长度为 cols）；
    /// 像基的每一行是 self 的某一列（长度为 rows），这些列构成列空间的基。
    pub fn reduction(&self) -> (GF2Matrix, GF2Matrix) {
        let transposed = self.transpose();
        let mut reduced = transposed.clone();
        let mut source = GF2Matrix::identity(self.cols);
        eliminate(&mut reduced, Some(&mut source));

        let mut kernel = Vec::new();
        let mut image = Vec::new();
        for i in 0..transposed.rows {
            if reduced.data.contains_key(&i) {
                image.push(transposed.row(i));
            } else {
                kernel.push(source.row(i));
            }
        }

        (
            GF2Matrix::rows_unchecked(self.cols, kernel),
            GF2Matrix::rows_unchecked(self.rows, image),
        )
    }

    /// 核基（每行一个核向量）
    pub fn kernel(&self) -> GF2Matrix {
        self.reduction().0
    }

    /// 解 self · X = B
    ///
    /// # Errors
    ///
    /// - `WrongDimension`: 行数不一致
    /// - `NoSolution`: 某个无 pivot 的约化行在 B 中非零
    pub fn solve(&self, b: &GF2Matrix) -> Result<GF2Matrix, MatrixError> {
        let RowReduction {
            transform, pivots, ..
        } = self.reduce_rows_with(b)?;

        let pivot_rows: std::collections::HashSet<usize> =
            pivots.iter().map(|&(row, _)| row).collect();
        if let Some((row, _)) = transform
            .nonzero_rows()
            .find(|(row, _)| !pivot_rows.contains(row))
        {
            return Err(MatrixError::NoSolution(format!(
                "row {} reduces to zero but the right-hand side does not",
                row
            )));
        }

        let mut solution = GF2Matrix::zeros(self.cols, b.cols);
        for (row, col) in pivots {
            if let Some(value) = transform.data.get(&row) {
                solution.put_row(col, value.clone());
            }
        }
        Ok(solution)
    }

    /// 解 self · x = b
    pub fn solve_vector(&self, b: &GF2Vector) -> Result<GF2Vector, MatrixError> {
        if b.len() != self.rows {
            return Err(MatrixError::wrong_dimension("solve_vector", self.rows, b.len()));
        }
        let rhs = GF2Matrix::from_entries(
            self.rows,
            1,
            &b.iter_ones().map(|i| (i, 0)).collect::<Vec<_>>(),
        );
        Ok(self.solve(&rhs)?.column(0))
    }

    pub fn has_solution(&self, b: &GF2Matrix) -> bool {
        self.solve(b).is_ok()
    }

    /// 逆矩阵 = solve(self, I)
    pub fn inverse(&self) -> Result<GF2Matrix, MatrixError> {
        if !self.is_square() {
            return Err(MatrixError::wrong_dimension(
                "inverse",
                self.rows,
                self.cols,
            ));
        }
        self.solve(&GF2Matrix::identity(self.rows))
            .map_err(|_| MatrixError::NoSolution("matrix is singular".to_string()))
    }

    /// 行空间的基：原矩阵中的 pivot 行（按处理顺序）
    pub fn basis(&self) -> GF2Matrix {
        let (_, pivots) = self.reduce_rows();
        let rows = pivots.iter().map(|&(row, _)| self.row(row)).collect();
        GF2Matrix::rows_unchecked(self.cols, rows)
    }

    /// 将线性无关的行扩充为 GF(2)^cols 的一组基
    ///
    /// 返回 cols × cols 矩阵，前 `self.rows` 行就是 self。
    ///
    /// # Errors
    ///
    /// `NoSolution`: self 的行线性相关（或含零行）
    pub fn extend_basis(&self) -> Result<GF2Matrix, MatrixError> {
        let stacked = self.vconcat(&GF2Matrix::identity(self.cols))?;
        let extended = stacked.basis();

        let leading = extended.sub_matrix(0..self.rows.min(extended.rows), 0..self.cols);
        if extended.rows < self.rows || leading != *self {
            return Err(MatrixError::NoSolution(
                "rows are not linearly independent".to_string(),
            ));
        }
        Ok(extended)
    }

    /// 行空间的元素个数 2^rank
    ///
    /// # Errors
    ///
    /// `AffineVectorSpaceDimension`: rank 超过 63
    pub fn span_cardinality(&self) -> Result<u64, MatrixError> {
        let rank = self.rank();
        if rank > AFFINE_DIMENSION_LIMIT {
            return Err(MatrixError::AffineVectorSpaceDimension {
                dimension: rank,
                limit: AFFINE_DIMENSION_LIMIT,
            });
        }
        Ok(1u64 << rank)
    }

    fn rows_unchecked(cols: usize, rows: Vec<GF2Vector>) -> GF2Matrix {
        let mut matrix = GF2Matrix::zeros(rows.len(), cols);
        for (i, row) in rows.into_iter().enumerate() {
            debug_assert_eq!(row.len(), cols);
            matrix.put_row(i, row);
        }
        matrix
    }
}

/// 行消元原语
///
/// 就地约化 `matrix`，`companion`（若有）同步执行相同的行操作。
/// 零行在消元中保持为零，因此只需遍历初始的非零行。
fn eliminate(matrix: &mut GF2Matrix, mut companion: Option<&mut GF2Matrix>) -> Vec<(usize, usize)> {
    let mut pivots = Vec::new();
    let candidates: Vec<usize> = matrix.data.keys().copied().collect();

    for i in candidates {
        let pivot_row = match matrix.data.get(&i) {
            Some(row) => row.clone(),
            None => continue,
        };
        let pivot = match pivot_row.first_one() {
            Some(p) => p,
            None => continue,
        };
        pivots.push((i, pivot));

        let targets: Vec<usize> = matrix
            .data
            .iter()
            .filter(|&(&j, row)| j != i && row.get(pivot))
            .map(|(&j, _)| j)
            .collect();
        if targets.is_empty() {
            continue;
        }

        for &j in &targets {
            let mut row = matrix.row(j);
            row.xor_assign(&pivot_row);
            matrix.put_row(j, row);
        }

        if let Some(companion) = companion.as_deref_mut() {
            if let Some(source) = companion.data.get(&i).cloned() {
                for &j in &targets {
                    let mut row = companion.row(j);
                    row.xor_assign(&source);
                    companion.put_row(j, row);
                }
            }
        }
    }

    pivots
}

impl fmt::Display for GF2Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GF2Matrix({}x{})", self.rows, self.cols)?;
        for i in 0..self.rows {
            writeln!(f, "{}", self.row(i))?;
        }
        Ok(())
    }
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn matrix_from_bits(rows: usize, cols: usize, bits: &[bool]) -> GF2Matrix {
        let entries: Vec<(usize, usize)> = (0..rows * cols)
            .filter(|&k| bits[k])
            .map(|k| (k / cols, k % cols))
            .collect();
        GF2Matrix::from_entries(rows, cols, &entries)
    }

    fn arb_matrix(max_rows: usize, max_cols: usize) -> impl Strategy<Value = GF2Matrix> {
        (0..=max_rows, 0..=max_cols).prop_flat_map(|(rows, cols)| {
            proptest::collection::vec(any::<bool>(), rows * cols)
                .prop_map(move |bits| matrix_from_bits(rows, cols, &bits))
        })
    }

    /// 暴力秩：枚举所有行组合，统计张成空间的大小
    fn brute_force_rank(matrix: &GF2Matrix) -> usize {
        let rows: Vec<u16> = (0..matrix.rows())
            .map(|i| {
                matrix
                    .row(i)
                    .iter_ones()
                    .fold(0u16, |acc, j| acc | (1 << j))
            })
            .collect();
        let span: HashSet<u16> = (0u32..(1 << rows.len()))
            .map(|mask| {
                rows.iter()
                    .enumerate()
                    .filter(|(k, _)| mask & (1 << k) != 0)
                    .fold(0u16, |acc, (_, &r)| acc ^ r)
            })
            .collect();
        span.len().trailing_zeros() as usize
    }

    #[test]
    fn test_vector_basic_operations() {
        let mut v = GF2Vector::zeros(6);
        v.set(4, true);
        v.set(1, true);
        v.toggle(4);
        v.toggle(5);

        assert_eq!(v.ones(), &[1, 5]);
        assert_eq!(v.first_one(), Some(1));
        assert_eq!(v.last_one(), Some(5));
        assert!(!v.get(4));

        let w = GF2Vector::from_indices(6, vec![5, 2, 2]);
        assert_eq!(w.ones(), &[2, 5]);
        assert_eq!(v.plus(&w).unwrap().ones(), &[1, 2]);
        assert!(v.dot(&w).unwrap());
        assert!(v.plus(&GF2Vector::zeros(3)).is_err());
    }

    #[test]
    fn test_vector_concat_and_sub_vector() {
        let a = GF2Vector::from_indices(3, vec![0, 2]);
        let b = GF2Vector::from_indices(2, vec![1]);
        let c = a.concat(&b);

        assert_eq!(c.len(), 5);
        assert_eq!(c.ones(), &[0, 2, 4]);
        assert_eq!(c.sub_vector(2..5).ones(), &[0, 2]);
        assert_eq!(c.sub_vector(3..3).len(), 0);
        assert_eq!(format!("{}", b), "[0 1]");
    }

    #[test]
    fn test_set_clears_zero_rows() {
        let mut m = GF2Matrix::zeros(3, 3);
        m.set(1, 2, true);
        m.set(1, 2, false);

        assert!(m.is_zero());
        assert_eq!(m, GF2Matrix::zeros(3, 3));
    }

    #[test]
    fn test_multiply_known_product() {
        // [1 1]   [1 0]   [0 1]
        // [0 1] · [1 1] = [1 1]
        let a = GF2Matrix::from_entries(2, 2, &[(0, 0), (0, 1), (1, 1)]);
        let b = GF2Matrix::from_entries(2, 2, &[(0, 0), (1, 0), (1, 1)]);
        let expected = GF2Matrix::from_entries(2, 2, &[(0, 1), (1, 0), (1, 1)]);

        assert_eq!(a.multiply(&b).unwrap(), expected);
        assert!(a.multiply(&GF2Matrix::zeros(3, 1)).is_err());
    }

    #[test]
    fn test_concat_shapes() {
        let a = GF2Matrix::identity(2);
        let b = GF2Matrix::from_entries(2, 1, &[(1, 0)]);

        let h = a.hconcat(&b).unwrap();
        assert_eq!((h.rows(), h.cols()), (2, 3));
        assert!(h.get(1, 2));

        let v = a.vconcat(&GF2Matrix::from_entries(1, 2, &[(0, 1)])).unwrap();
        assert_eq!((v.rows(), v.cols()), (3, 2));
        assert!(v.get(2, 1));

        assert!(matches!(
            a.vconcat(&b),
            Err(MatrixError::WrongDimension { .. })
        ));
    }

    #[test]
    fn test_reduce_rows_pivots() {
        // 第三行 = 第一行 + 第二行
        let m = GF2Matrix::from_entries(
            3,
            4,
            &[(0, 1), (0, 2), (1, 2), (1, 3), (2, 1), (2, 3)],
        );
        let (reduced, pivots) = m.reduce_rows();

        assert_eq!(pivots, vec![(0, 1), (1, 2)]);
        assert!(reduced.row_ref(2).is_none());
        assert_eq!(m.rank(), 2);
        // pivot 列在约化后只剩 pivot 行
        assert_eq!(reduced.column(1).ones(), &[0]);
        assert_eq!(reduced.column(2).ones(), &[1]);
    }

    #[test]
    fn test_solve_and_inverse() {
        let a = GF2Matrix::from_entries(3, 3, &[(0, 0), (0, 1), (1, 1), (1, 2), (2, 2)]);
        let inverse = a.inverse().unwrap();

        assert!(a.multiply(&inverse).unwrap().is_identity());
        assert!(inverse.multiply(&a).unwrap().is_identity());

        let b = GF2Vector::from_indices(3, vec![0, 2]);
        let x = a.solve_vector(&b).unwrap();
        assert_eq!(a.multiply_vector(&x).unwrap(), b);
    }

    #[test]
    fn test_solve_without_solution() {
        // 两行相同，右端不同
        let a = GF2Matrix::from_entries(2, 2, &[(0, 0), (1, 0)]);
        let b = GF2Matrix::from_entries(2, 1, &[(0, 0)]);

        assert!(matches!(a.solve(&b), Err(MatrixError::NoSolution(_))));
        assert!(!a.has_solution(&b));
        assert!(a.inverse().is_err());
        assert!(GF2Matrix::zeros(2, 3).inverse().is_err());
    }

    #[test]
    fn test_basis_and_extend_basis() {
        let m = GF2Matrix::from_entries(3, 4, &[(0, 0), (0, 3), (1, 0), (1, 3), (2, 2)]);
        let basis = m.basis();
        assert_eq!(basis.rows(), 2);
        assert_eq!(basis.row(0), m.row(0));
        assert_eq!(basis.row(1), m.row(2));

        let extended = basis.extend_basis().unwrap();
        assert_eq!((extended.rows(), extended.cols()), (4, 4));
        assert_eq!(extended.sub_matrix(0..2, 0..4), basis);
        assert_eq!(extended.rank(), 4);

        // 线性相关的行不能扩充
        assert!(m.extend_basis().is_err());
        // 空集扩充为单位阵
        assert!(GF2Matrix::zeros(0, 3).extend_basis().unwrap().is_identity());
    }

    #[test]
    fn test_reduction_of_boundary_matrix() {
        // 三角形的边界矩阵 ∂1：行 = 顶点，列 = 边 {01, 02, 12}
        let d1 = GF2Matrix::from_entries(3, 3, &[(0, 0), (1, 0), (0, 1), (2, 1), (1, 2), (2, 2)]);
        let (kernel, image) = d1.reduction();

        assert_eq!(kernel.rows(), 1);
        assert_eq!(kernel.row(0).ones(), &[0, 1, 2]);
        assert_eq!(image.rows(), 2);
        assert_eq!(image.cols(), 3);
    }

    #[test]
    fn test_span_cardinality() {
        assert_eq!(GF2Matrix::identity(3).span_cardinality().unwrap(), 8);
        assert_eq!(GF2Matrix::zeros(2, 2).span_cardinality().unwrap(), 1);
        assert!(matches!(
            GF2Matrix::identity(64).span_cardinality(),
            Err(MatrixError::AffineVectorSpaceDimension { dimension: 64, .. })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(96))]

        #[test]
        fn prop_transpose_involution(m in arb_matrix(8, 8)) {
            prop_assert_eq!(m.transpose().transpose(), m);
        }

        #[test]
        fn prop_rank_invariant_under_transpose(m in arb_matrix(8, 8)) {
            prop_assert_eq!(m.rank(), m.transpose().rank());
        }

        #[test]
        fn prop_rank_matches_brute_force(m in arb_matrix(8, 8)) {
            prop_assert_eq!(m.rank(), brute_force_rank(&m));
        }

        #[test]
        fn prop_reduction_kernel_and_image(m in arb_matrix(8, 8)) {
            let (kernel, image) = m.reduction();
            let zero = GF2Vector::zeros(m.rows());

            for i in 0..kernel.rows() {
                prop_assert_eq!(m.multiply_vector(&kernel.row(i)).unwrap(), zero.clone());
            }
            prop_assert_eq!(image.rows(), m.rank());
            prop_assert_eq!(kernel.rows() + image.rows(), m.cols());
            prop_assert_eq!(kernel.rank(), kernel.rows());

            // 每一列都是像基的线性组合
            let image_t = image.transpose();
            for j in 0..m.cols() {
                prop_assert!(image_t.solve_vector(&m.column(j)).is_ok());
            }
        }

        #[test]
        fn prop_solve_recovers_product(m in arb_matrix(6, 6), x_bits in proptest::collection::vec(any::<bool>(), 6)) {
            let x = GF2Vector::from_indices(
                m.cols(),
                (0..m.cols()).filter(|&j| x_bits[j]).collect(),
            );
            let b = m.multiply_vector(&x).unwrap();
            let solution = m.solve_vector(&b).unwrap();
            prop_assert_eq!(m.multiply_vector(&solution).unwrap(), b);
        }
    }
}
