// ==========================================
// 债务导入服务 - 法律文书仓储
// ==========================================
// 职责: enforcement_proceedings / executive_documents 插入
// 两者都没有自然键，重复导入会产生重复行
// ==========================================

use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

use crate::domain::{NewEnforcementProceeding, NewExecutiveDocument};
use crate::repository::error::{RepositoryError, RepositoryResult};

pub struct LegalRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LegalRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入执行程序
    ///
    /// # 返回
    /// - Ok(i64): 新记录 id
    pub fn insert_enforcement_proceeding(
        &self,
        proceeding: &NewEnforcementProceeding,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO enforcement_proceedings (
                serial_number, debt_id, amount, private_bailiff_name,
                private_bailiff_region, start_date, status_ais_oip, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                proceeding.serial_number,
                proceeding.debt_id,
                proceeding.amount,
                proceeding.private_bailiff_name,
                proceeding.private_bailiff_region,
                proceeding.start_date.map(|d| d.to_string()),
                proceeding.status_ais_oip,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 插入执行文书
    pub fn insert_executive_document(&self, doc: &NewExecutiveDocument) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO executive_documents (
                id, type, serial_number, debt_id, amount, start_date,
                status_court, issuing_authority, issue_place, issue_date,
                creditor_replacement, is_canceled, cancellation_number, cancellation_date,
                lawyer_received_at, private_bailiff_received_at, dvp_transferred_at,
                created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18
            )
            "#,
            params![
                doc.id,
                doc.doc_type,
                doc.serial_number,
                doc.debt_id,
                doc.amount,
                doc.start_date.map(|d| d.to_string()),
                doc.status_court,
                doc.issuing_authority,
                doc.issue_place,
                doc.issue_date.map(|d| d.to_string()),
                doc.creditor_replacement,
                doc.is_canceled,
                doc.cancellation_number,
                doc.cancellation_date,
                doc.lawyer_received_at.map(|d| d.to_string()),
                doc.private_bailiff_received_at.map(|d| d.to_string()),
                doc.dvp_transferred_at.map(|d| d.to_string()),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
