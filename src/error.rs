/*!
 * 错误类型
 *
 * - `MatrixError`: GF(2) 线性代数层的错误（维度不匹配、无解、仿射空间过大）
 * - `FunctorError`: 函子与自然变换层的错误（交换性校验失败、越界）
 * - `PersistenceError`: 顶层错误，聚合以上两者以及输入校验、解析、线程池错误
 */

use crate::types::Position;

/// GF(2) 矩阵运算错误
#[derive(Debug, thiserror::Error)]
pub enum MatrixError {
    #[error("Wrong dimension in {operation}: {left} vs {right}")]
    WrongDimension {
        operation: &'static str,
        left: String,
        right: String,
    },

    #[error("No solution: {0}")]
    NoSolution(String),

    #[error("Affine vector space of dimension {dimension} exceeds the enumeration limit of {limit}")]
    AffineVectorSpaceDimension { dimension: usize, limit: usize },
}

impl MatrixError {
    pub(crate) fn wrong_dimension(
        operation: &'static str,
        left: impl ToString,
        right: impl ToString,
    ) -> Self {
        MatrixError::WrongDimension {
            operation,
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

/// 函子错误
#[derive(Debug, thiserror::Error)]
pub enum FunctorError {
    /// 交换方块不交换：M_second(v + e_first) · M_first(v) ≠ M_first(v + e_second) · M_second(v)
    #[error("Malformed functor: square at {position} in directions ({first}, {second}) does not commute")]
    Malformed {
        position: Position,
        first: usize,
        second: usize,
    },

    #[error("Position {position} out of bounds (direction {direction})")]
    OutOfBounds { position: Position, direction: usize },

    #[error("Natural transformation has no component at {position}")]
    MissingComponent { position: Position },

    /// nat(v + e_direction) · F(v) ≠ G(v) · nat(v)
    #[error("Natural transformation does not commute with direction {direction} at {position}")]
    NotNatural { position: Position, direction: usize },

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// 顶层错误
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Position {0} is outside the filtration grid")]
    OutOfBounds(Position),

    /// 单元内部一致性检查失败（主元计数不符等），属于数据或逻辑缺陷
    #[error("Inconsistent homology at {position}: {detail}")]
    Inconsistent { position: Position, detail: String },

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Functor(#[from] FunctorError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = PersistenceError> = std::result::Result<T, E>;
