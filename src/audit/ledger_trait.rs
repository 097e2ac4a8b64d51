// ==========================================
// 债务导入服务 - 审计账本接口
// ==========================================
// 职责: 逐行审计条目追加 + 导入记录状态迁移
// 红线: 条目只追加; 记录只允许 parsed → done
// ==========================================

use async_trait::async_trait;

use crate::audit::error::AuditResult;
use crate::domain::{AuditItem, ImportRecord};

// ==========================================
// AuditLedger Trait
// ==========================================
// 实现者: SqliteAuditLedger（JSON 文档）, MemoryAuditLedger（测试）
#[async_trait]
pub trait AuditLedger: Send + Sync {
    /// 追加一条审计条目
    ///
    /// # 返回
    /// - Ok(String): 条目 id
    async fn append_item(&self, item: &AuditItem) -> AuditResult<String>;

    /// 导入记录置为 done（重复调用无副作用）
    ///
    /// # 返回
    /// - Err(RecordNotFound): id 不存在
    async fn mark_record_done(&self, record_id: &str) -> AuditResult<()>;

    /// 新建导入记录
    async fn insert_record(&self, record: &ImportRecord) -> AuditResult<()>;

    /// 按 id 查导入记录
    async fn find_record(&self, record_id: &str) -> AuditResult<Option<ImportRecord>>;

    /// 某次运行的全部审计条目（按写入顺序）
    async fn list_items(&self, record_id: &str) -> AuditResult<Vec<AuditItem>>;
}
