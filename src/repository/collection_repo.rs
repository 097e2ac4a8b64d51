// ==========================================
// 债务导入服务 - 还款与催收动作仓储
// ==========================================

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use crate::domain::{NewAction, NewPayment};
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// CollectionRepository - payments / actions
// ==========================================
pub struct CollectionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CollectionRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入还款，重复（同债务/用户/金额/日期）时忽略
    ///
    /// # 返回
    /// - Ok(String): 还款 id（重复时为已有记录的 id）
    pub fn insert_payment(&self, payment: &NewPayment) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let payment_date = payment.payment_date.to_string();
        conn.execute(
            r#"
            INSERT INTO payments (
                id, debt_id, user_id, amount, amount_after_subtraction,
                amount_government_duty, amount_representation_expenses,
                amount_notary_fees, amount_postage, amount_accounts_receivable,
                amount_main_debt, amount_accrual, amount_fine,
                payment_date, confirmed, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            ON CONFLICT (debt_id, user_id, amount, amount_after_subtraction, payment_date)
            DO NOTHING
            "#,
            params![
                payment.id,
                payment.debt_id,
                payment.user_id,
                payment.amount,
                payment.amount_after_subtraction,
                payment.amount_government_duty,
                payment.amount_representation_expenses,
                payment.amount_notary_fees,
                payment.amount_postage,
                payment.amount_accounts_receivable,
                payment.amount_main_debt,
                payment.amount_accrual,
                payment.amount_fine,
                payment_date,
                payment.confirmed,
                Utc::now().to_rfc3339(),
            ],
        )?;

        let existing: Option<String> = conn
            .query_row(
                r#"
                SELECT id FROM payments
                WHERE debt_id = ?1 AND user_id = ?2 AND amount = ?3
                  AND amount_after_subtraction = ?4 AND payment_date = ?5
                LIMIT 1
                "#,
                params![
                    payment.debt_id,
                    payment.user_id,
                    payment.amount,
                    payment.amount_after_subtraction,
                    payment_date,
                ],
                |row| row.get(0),
            )
            .optional()?;
        Ok(existing.unwrap_or_else(|| payment.id.clone()))
    }

    /// 插入催收动作
    pub fn insert_action(&self, action: &NewAction) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let created_at = action
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string());
        conn.execute(
            r#"
            INSERT INTO actions (id, debt_id, user_id, debt_status_id, type, comment, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                action.id,
                action.debt_id,
                action.user_id,
                action.debt_status_id,
                action.action_type,
                action.comment,
                created_at,
            ],
        )?;
        Ok(())
    }
}
