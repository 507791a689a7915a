/*!
 * 引擎配置
 *
 * 普通结构体加默认值；`with_*` 构建式 setter 返回修改后的副本。
 *
 * # 示例
 *
 * ```ignore
 * let config = EngineConfig::new(2)
 *     .with_threads(4)
 *     .with_layout(StorageLayout::Sparse);
 * ```
 */

use crate::core::grid::StorageLayout;
use crate::core::storage::LookupStrategy;
use crate::error::{PersistenceError, Result};

/// 计算线程池大小时硬件并行度的下限
const MIN_PARALLELISM: usize = 5;

// ============================================================================
// EngineConfig
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// 构建的最高单纯形维度；输出 0..max_dimension 的同调
    pub max_dimension: usize,
    /// 工作线程数；`None` 表示 `default_thread_count()`
    pub num_threads: Option<usize>,
    /// 输出函子的单元存储布局
    pub layout: StorageLayout,
    /// `SimplexStore::simplices_leq` 的查找策略
    pub lookup: LookupStrategy,
    /// 装配后运行交换性与自然性校验
    pub verify: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_dimension: 2,
            num_threads: None,
            layout: StorageLayout::Dense,
            lookup: LookupStrategy::Dense,
            verify: true,
        }
    }
}

impl EngineConfig {
    pub fn new(max_dimension: usize) -> Self {
        Self {
            max_dimension,
            ..Self::default()
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    pub fn with_layout(mut self, layout: StorageLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_lookup(mut self, lookup: LookupStrategy) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// 实际线程池大小
    pub fn thread_count(&self) -> usize {
        self.num_threads.unwrap_or_else(default_thread_count)
    }

    /// # Errors
    ///
    /// `InvalidInput`: max_dimension 为 0 或线程数为 0
    pub fn validate(&self) -> Result<()> {
        if self.max_dimension == 0 {
            return Err(PersistenceError::InvalidInput(
                "max_dimension must be at least 1".to_string(),
            ));
        }
        if self.num_threads == Some(0) {
            return Err(PersistenceError::InvalidInput(
                "num_threads must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// 2 × max(available hardware parallelism, 5)
pub fn default_thread_count() -> usize {
    let hardware = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    2 * hardware.max(MIN_PARALLELISM)
}

// ============================================================================
// 单元测试
// ============================================================================
