// ==========================================
// 债务导入服务 - 审计账本层
// ==========================================
// 职责: 导入记录 (ImportRecord) 与逐行审计条目 (AuditItem) 的持久化
// 存储: 独立的 SQLite 库，文档以 JSON 保存
// ==========================================

pub mod error;
pub mod ledger_trait;
pub mod memory_ledger;
pub mod sqlite_ledger;

pub use error::{AuditError, AuditResult};
pub use ledger_trait::AuditLedger;
pub use memory_ledger::MemoryAuditLedger;
pub use sqlite_ledger::SqliteAuditLedger;
