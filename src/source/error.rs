// ==========================================
// 债务导入服务 - 数据源错误类型
// ==========================================
// 所有打开失败统一为 OpenError，携带底层原因
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenError {
    #[error("数据源定位串格式错误: {0}")]
    MalformedLocator(String),

    #[error("missing bucket: pass s3://bucket/key or https url ({0})")]
    MissingBucket(String),

    #[error("{0} opener not configured")]
    NotConfigured(&'static str),

    #[error("http status {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("对象不存在: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("数据源传输失败: {0}")]
    Transport(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for OpenError {
    fn from(err: reqwest::Error) -> Self {
        OpenError::Transport(err.to_string())
    }
}

pub type OpenResult<T> = Result<T, OpenError>;
