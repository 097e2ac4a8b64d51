// ==========================================
// 债务导入服务 - 导入管道层
// ==========================================
// 职责: 格式识别、表格读取、分批、摘要、处理器调度
// 红线: 不含实体写入逻辑（交给 processors）
// ==========================================

pub mod digest;
pub mod error;
pub mod file_parser;
pub mod format_detector;
pub mod orchestrator;
pub mod processor_trait;
pub mod registry;
pub mod run_context;

pub use digest::{sha256_hex, DigestTee};
pub use error::{ImportError, ImporterResult};
pub use file_parser::{reader_for, BatchReader, Batches, CsvBatchReader, RowIter, XlsxBatchReader};
pub use format_detector::detect_format;
pub use orchestrator::{dispatch_batches, open_rows_with_fallback, ImportOrchestrator};
pub use processor_trait::Processor;
pub use registry::ProcessorRegistry;
pub use run_context::{ImportRun, ResolutionCache, RunStats};
