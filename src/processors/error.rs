// ==========================================
// 债务导入服务 - 处理器错误类型
// ==========================================
// 只表示批次级（或更严重）失败；行级失败写入审计条目
// ==========================================

use thiserror::Error;

use crate::repository::error::RepositoryError;

#[derive(Error, Debug)]
pub enum ProcessorError {
    /// 批次处理的前置依赖缺失（如 app 团队）
    #[error("{0}")]
    MissingDependency(String),

    #[error("批次级查询失败: {0}")]
    BatchLookup(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ProcessorResult<T> = Result<T, ProcessorError>;
