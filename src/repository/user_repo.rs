// ==========================================
// 债务导入服务 - 用户与计划仓储
// ==========================================

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use crate::domain::{UserPlanUpsert, UserUpsert};
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// UserRepository - users / user_plans
// ==========================================
pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按用户名 upsert 用户
    ///
    /// # 返回
    /// - Ok(i64): 用户 id
    pub fn upsert_user(&self, user: &UserUpsert) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let now = Utc::now().to_rfc3339();
        let id: i64 = conn.query_row(
            r#"
            INSERT INTO users (
                username, first_name, last_name, middle_name, email, phone,
                password, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            ON CONFLICT (username) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                middle_name = excluded.middle_name,
                email = excluded.email,
                phone = excluded.phone,
                password = excluded.password,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
            params![
                user.username,
                user.first_name,
                user.last_name,
                user.middle_name,
                user.email,
                user.phone,
                user.password_hash,
                now,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// 月度计划: (user_id, end_date) 已存在则更新，否则插入
    ///
    /// # 返回
    /// - Ok(i64): 计划 id
    pub fn upsert_user_plan(&self, plan: &UserPlanUpsert) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let now = Utc::now().to_rfc3339();
        let end_date = plan.end_date.to_string();

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM user_plans WHERE user_id = ?1 AND end_date = ?2 LIMIT 1",
                params![plan.user_id, end_date],
                |row| row.get(0),
            )
            .optional()?;

        let id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE user_plans SET amount = ?2, quantity = ?3, updated_at = ?4 WHERE id = ?1",
                    params![id, plan.amount, plan.quantity, now],
                )?;
                id
            }
            None => {
                tx.execute(
                    r#"
                    INSERT INTO user_plans (user_id, amount, quantity, end_date, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                    "#,
                    params![plan.user_id, plan.amount, plan.quantity, end_date, now],
                )?;
                tx.last_insert_rowid()
            }
        };

        tx.commit()?;
        Ok(id)
    }
}
