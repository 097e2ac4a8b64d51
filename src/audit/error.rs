// ==========================================
// 债务导入服务 - 审计账本错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("导入记录不存在: {0}")]
    RecordNotFound(String),

    #[error("审计库锁获取失败: {0}")]
    LockError(String),

    #[error("审计库写入失败: {0}")]
    Storage(String),

    #[error("审计文档序列化失败: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for AuditError {
    fn from(err: rusqlite::Error) -> Self {
        AuditError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        AuditError::Serialization(err.to_string())
    }
}

pub type AuditResult<T> = Result<T, AuditError>;
