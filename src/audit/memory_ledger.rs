// ==========================================
// 债务导入服务 - 内存审计账本
// ==========================================
// 用途: 单元测试与 dry-run
// ==========================================

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::audit::error::{AuditError, AuditResult};
use crate::audit::ledger_trait::AuditLedger;
use crate::domain::{AuditItem, AuditStatus, ImportRecord, ImportRecordStatus};

#[derive(Default)]
struct LedgerState {
    records: HashMap<String, ImportRecord>,
    items: Vec<AuditItem>,
}

/// 进程内账本
#[derive(Default)]
pub struct MemoryAuditLedger {
    state: Mutex<LedgerState>,
}

impl MemoryAuditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AuditResult<std::sync::MutexGuard<'_, LedgerState>> {
        self.state
            .lock()
            .map_err(|e| AuditError::LockError(e.to_string()))
    }

    /// 全部条目（所有运行）
    pub fn items(&self) -> Vec<AuditItem> {
        self.lock().map(|s| s.items.clone()).unwrap_or_default()
    }

    /// 某次运行中指定状态的条目数
    pub fn count_status(&self, record_id: &str, status: AuditStatus) -> usize {
        self.items()
            .iter()
            .filter(|i| i.import_record_id == record_id && i.status == status)
            .count()
    }
}

#[async_trait]
impl AuditLedger for MemoryAuditLedger {
    async fn append_item(&self, item: &AuditItem) -> AuditResult<String> {
        self.lock()?.items.push(item.clone());
        Ok(Uuid::new_v4().simple().to_string())
    }

    async fn mark_record_done(&self, record_id: &str) -> AuditResult<()> {
        let mut state = self.lock()?;
        let record = state
            .records
            .get_mut(record_id)
            .ok_or_else(|| AuditError::RecordNotFound(record_id.to_string()))?;
        if record.status != ImportRecordStatus::Done {
            record.status = ImportRecordStatus::Done;
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn insert_record(&self, record: &ImportRecord) -> AuditResult<()> {
        self.lock()?
            .records
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn find_record(&self, record_id: &str) -> AuditResult<Option<ImportRecord>> {
        Ok(self.lock()?.records.get(record_id).cloned())
    }

    async fn list_items(&self, record_id: &str) -> AuditResult<Vec<AuditItem>> {
        Ok(self
            .lock()?
            .items
            .iter()
            .filter(|i| i.import_record_id == record_id)
            .cloned()
            .collect())
    }
}
