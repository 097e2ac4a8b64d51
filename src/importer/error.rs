// ==========================================
// 债务导入服务 - 导入管道错误类型
// ==========================================
// 分类: 初始化错误（致命）/ 格式错误（触发回退）/ 超时 / 批次级处理错误
// 行级错误不走这里，写入审计条目
// ==========================================

use thiserror::Error;

use crate::processors::error::ProcessorError;
use crate::source::error::OpenError;

/// 导入管道错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 初始化错误 =====
    #[error("no processor for type: {0}")]
    UnknownImportType(String),

    #[error("数据源打开失败: {0}")]
    Open(#[from] OpenError),

    #[error("数据源读取失败: {0}")]
    SourceRead(String),

    // ===== 格式错误 =====
    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("无可用格式 (xlsx: {xlsx}; csv: {csv})")]
    NoUsableFormat { xlsx: String, csv: String },

    // ===== 运行期错误 =====
    #[error("导入超时 (已处理 {rows_processed} 行)")]
    Timeout { rows_processed: usize },

    #[error("批次处理失败: {0}")]
    Processor(#[from] ProcessorError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否属于可以换另一种格式重试的错误
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ImportError::CsvParseError(_) | ImportError::ExcelParseError(_)
        )
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImporterResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_errors_are_retryable() {
        assert!(ImportError::CsvParseError("x".into()).is_format_error());
        assert!(ImportError::ExcelParseError("x".into()).is_format_error());
        assert!(!ImportError::UnknownImportType("x".into()).is_format_error());
        assert!(!ImportError::Timeout { rows_processed: 0 }.is_format_error());
    }

    #[test]
    fn test_unknown_type_message() {
        let err = ImportError::UnknownImportType("import_cats".into());
        assert_eq!(err.to_string(), "no processor for type: import_cats");
    }
}
