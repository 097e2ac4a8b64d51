// ==========================================
// 债务导入服务 - 导入请求与结果
// ==========================================
// 职责: 一次导入运行的输入/输出与数据源元信息
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::row::DEFAULT_BATCH_SIZE;

/// 默认导入超时（15 分钟）
pub const DEFAULT_IMPORT_TIMEOUT: Duration = Duration::from_secs(15 * 60);

// ==========================================
// 数据源
// ==========================================

/// 数据源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    Http,
    S3,
}

impl SourceOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceOrigin::Http => "http",
            SourceOrigin::S3 => "s3",
        }
    }
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 数据源元信息（打开时生成一次，之后不可变）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMeta {
    pub origin: SourceOrigin,
    pub content_type: String,
    /// 字节数，-1 表示未知
    pub size_bytes: i64,
    pub url: Option<String>,
    pub bucket: Option<String>,
    pub key: Option<String>,
}

impl SourceMeta {
    pub fn http(url: &str, content_type: String, size_bytes: i64) -> Self {
        Self {
            origin: SourceOrigin::Http,
            content_type,
            size_bytes,
            url: Some(url.to_string()),
            bucket: None,
            key: None,
        }
    }

    pub fn s3(bucket: &str, key: &str, content_type: String, size_bytes: i64) -> Self {
        Self {
            origin: SourceOrigin::S3,
            content_type,
            size_bytes,
            url: None,
            bucket: Some(bucket.to_string()),
            key: Some(key.to_string()),
        }
    }
}

// ==========================================
// 表格格式
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabularFormat {
    Csv,
    Xlsx,
    Unknown,
}

impl TabularFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TabularFormat::Csv => "csv",
            TabularFormat::Xlsx => "xlsx",
            TabularFormat::Unknown => "unknown",
        }
    }

    /// 回退时尝试的另一种格式
    pub fn other(&self) -> TabularFormat {
        match self {
            TabularFormat::Csv => TabularFormat::Xlsx,
            TabularFormat::Xlsx => TabularFormat::Csv,
            TabularFormat::Unknown => TabularFormat::Csv,
        }
    }
}

impl fmt::Display for TabularFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 请求 / 结果
// ==========================================

/// 导入请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    /// 处理器注册键
    pub import_type: String,
    /// 数据源定位串（http(s) URL / s3://bucket/key / 裸 key）
    pub file_path: String,
    pub batch_size: usize,
    pub timeout: Duration,
    /// 本次运行所有审计条目的关联 id
    pub import_record_id: String,
}

impl ImportRequest {
    pub fn new(import_type: &str, file_path: &str, import_record_id: &str) -> Self {
        Self {
            import_type: import_type.trim().to_string(),
            file_path: file_path.trim().to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            timeout: DEFAULT_IMPORT_TIMEOUT,
            import_record_id: import_record_id.trim().to_string(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 生效的批大小（0 → 默认值）
    pub fn effective_batch_size(&self) -> usize {
        if self.batch_size == 0 {
            DEFAULT_BATCH_SIZE
        } else {
            self.batch_size
        }
    }

    /// 生效的超时（0 → 默认值）
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_IMPORT_TIMEOUT
        } else {
            self.timeout
        }
    }
}

/// 导入结果汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub source: SourceOrigin,
    pub file_path: String,
    pub format: TabularFormat,
    pub rows_processed: usize,
    /// 全部源字节的 SHA-256（小写十六进制）
    pub sha256: String,
    pub content_type: String,
    pub size_bytes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}
