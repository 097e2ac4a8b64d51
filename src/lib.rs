// ==========================================
// 债务导入服务 - 核心库
// ==========================================
// 职责: 从 HTTP / 对象存储读取 CSV 或 XLSX，分批交给导入类型对应的处理器
// 技术栈: Rust + tokio + SQLite
// 红线: 单行失败只写审计，不中止运行
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 行、请求/结果、审计与写模型
pub mod domain;

// 数据源层 - HTTP / S3
pub mod source;

// 导入层 - 格式识别、分批、编排
pub mod importer;

// 处理器层 - 各导入类型
pub mod processors;

// 数据仓储层 - 关系库访问
pub mod repository;

// 审计账本
pub mod audit;

// 配置层
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

pub use audit::{AuditLedger, MemoryAuditLedger, SqliteAuditLedger};
pub use config::ImporterConfig;
pub use domain::{
    AuditItem, AuditStatus, ImportRecord, ImportRequest, ImportResult, ModelType, Row,
    SourceMeta, TabularFormat,
};
pub use importer::{ImportError, ImportOrchestrator, ImporterResult, Processor, ProcessorRegistry};
pub use processors::{default_registry, DistributionSettings, Stores};
pub use source::{CompoundOpener, HttpOpener, S3Opener, SourceOpener};

// 服务版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 服务名称
pub const APP_NAME: &str = "债务导入服务";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
