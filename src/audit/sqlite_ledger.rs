// ==========================================
// 债务导入服务 - SQLite 审计账本
// ==========================================
// 存储: import_records / import_record_items 两个集合
//       每行一个 JSON 文档，按字符串 id 寻址
// ==========================================

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

use crate::audit::error::{AuditError, AuditResult};
use crate::audit::ledger_trait::AuditLedger;
use crate::db::{bootstrap_audit_schema, open_sqlite_connection};
use crate::domain::{AuditItem, ImportRecord, ImportRecordStatus};

// ==========================================
// SqliteAuditLedger
// ==========================================
pub struct SqliteAuditLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAuditLedger {
    /// 打开审计库文件并建表
    ///
    /// # 参数
    /// - db_path: 审计库路径（与关系库分开）
    pub fn new(db_path: &str) -> AuditResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        bootstrap_audit_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（调用方负责建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> AuditResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| AuditError::LockError(e.to_string()))
    }
}

#[async_trait]
impl AuditLedger for SqliteAuditLedger {
    async fn append_item(&self, item: &AuditItem) -> AuditResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        let document = serde_json::to_string(item)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO import_record_items (id, import_record_id, status, document, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                id,
                item.import_record_id,
                item.status.as_str(),
                document,
                item.created_at.to_rfc3339(),
            ],
        )?;
        Ok(id)
    }

    async fn mark_record_done(&self, record_id: &str) -> AuditResult<()> {
        let conn = self.get_conn()?;
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM import_records WHERE id = ?1",
                params![record_id],
                |row| row.get(0),
            )
            .optional()?;
        let document = document.ok_or_else(|| AuditError::RecordNotFound(record_id.to_string()))?;

        let mut record: ImportRecord = serde_json::from_str(&document)?;
        if record.status == ImportRecordStatus::Done {
            debug!(record_id, "导入记录已是 done");
            return Ok(());
        }
        record.status = ImportRecordStatus::Done;
        record.updated_at = Utc::now();

        conn.execute(
            "UPDATE import_records SET status = ?2, document = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                record_id,
                record.status.as_str(),
                serde_json::to_string(&record)?,
                record.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn insert_record(&self, record: &ImportRecord) -> AuditResult<()> {
        let document = serde_json::to_string(record)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO import_records (id, status, document, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.id,
                record.status.as_str(),
                document,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn find_record(&self, record_id: &str) -> AuditResult<Option<ImportRecord>> {
        let conn = self.get_conn()?;
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM import_records WHERE id = ?1",
                params![record_id],
                |row| row.get(0),
            )
            .optional()?;
        match document {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }

    async fn list_items(&self, record_id: &str) -> AuditResult<Vec<AuditItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT document FROM import_record_items WHERE import_record_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![record_id], |row| row.get::<_, String>(0))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(serde_json::from_str(&row?)?);
        }
        Ok(items)
    }
}
