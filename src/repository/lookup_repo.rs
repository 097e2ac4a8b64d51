// ==========================================
// 债务导入服务 - 自然键查询仓储
// ==========================================
// 职责: 自然键 → 代理 id（债务号、用户名、状态简称、协议类型、团队）
// 红线: 只查不缓存，缓存由运行上下文负责
// ==========================================

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// LookupRepository
// ==========================================
pub struct LookupRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LookupRepository {
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

    /// 按债务号查债务 id
    pub fn find_debt_id(&self, number: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM debts WHERE number = ?1 LIMIT 1",
                params![number],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// 按用户名查用户 id
    pub fn find_user_id(&self, username: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1 LIMIT 1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// 按简称查债务状态 id
    ///
    /// 简称未命中且输入是整数时，按主键再查一次。
    pub fn find_status_id(&self, shortname: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let by_name: Option<i64> = conn
            .query_row(
                "SELECT id FROM debt_statuses WHERE shortname = ?1 LIMIT 1",
                params![shortname],
                |row| row.get(0),
            )
            .optional()?;
        if by_name.is_some() {
            return Ok(by_name);
        }

        match shortname.parse::<i64>() {
            Ok(id) => Ok(conn
                .query_row(
                    "SELECT id FROM debt_statuses WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?),
            Err(_) => Ok(None),
        }
    }

    /// 协议类型: 按名称（不区分大小写）查找，不存在则创建
    ///
    /// SQLite 的 lower() 只处理 ASCII，这里在内存中比较以支持西里尔字母。
    pub fn get_or_create_agreement_type(&self, name: &str) -> RepositoryResult<i64> {
        let wanted = name.trim().to_lowercase();
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let existing = {
            let mut stmt = tx.prepare("SELECT id, name FROM agreement_types ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?;
            let mut found = None;
            for row in rows {
                let (id, existing_name) = row?;
                if existing_name.trim().to_lowercase() == wanted {
                    found = Some(id);
                    break;
                }
            }
            found
        };

        let id = match existing {
            Some(id) => id,
            None => {
                tx.execute(
                    "INSERT INTO agreement_types (name, created_at) VALUES (?1, ?2)",
                    params![name.trim(), Utc::now().to_rfc3339()],
                )?;
                tx.last_insert_rowid()
            }
        };
        tx.commit()?;
        Ok(id)
    }

    /// 按名称查团队 id
    pub fn find_team_id(&self, name: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM teams WHERE name = ?1 LIMIT 1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// 用户在指定团队内的角色 id
    pub fn find_role_in_team(&self, user_id: i64, team_id: i64) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let id = conn
            .query_row(
                "SELECT role_id FROM role_user WHERE user_id = ?1 AND team_id = ?2 LIMIT 1",
                params![user_id, team_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}
