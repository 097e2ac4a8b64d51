// ==========================================
// 债务导入服务 - 团队与成员关系仓储
// ==========================================
// 职责: 债务访问组 (teams) 与角色成员 (role_user) 的维护
// 红线: 受保护的系统团队成员关系永不删除
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use crate::repository::error::{RepositoryError, RepositoryResult};

/// 债务访问组名前缀
pub const DEBT_TEAM_PREFIX: &str = "debt/";

/// 债务访问组名
pub fn debt_team_name(debt_id: &str) -> String {
    format!("{}{}", DEBT_TEAM_PREFIX, debt_id)
}

// ==========================================
// TeamRepository
// ==========================================
pub struct TeamRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TeamRepository {
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

    /// 团队不存在时创建
    pub fn ensure_team(&self, name: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO teams (name) VALUES (?1) ON CONFLICT (name) DO NOTHING",
            params![name],
        )?;
        Ok(())
    }

    /// 按名称取团队 (id, name)
    pub fn find_team(&self, name: &str) -> RepositoryResult<Option<(i64, String)>> {
        let conn = self.get_conn()?;
        let team = conn
            .query_row(
                "SELECT id, name FROM teams WHERE name = ?1 LIMIT 1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(team)
    }

    /// 删除债务访问组内与 (债务当前归属人, role_id) 不符的成员关系
    ///
    /// # 参数
    /// - team_id: 债务访问组 id（名称须以 `debt/` 开头）
    /// - debt_id: 债务 id（以其当前 user_id 为准）
    /// - role_id: 归属人应有的角色
    /// - protected_team_id: 永不删除的系统团队 id
    ///
    /// # 返回
    /// - Ok(usize): 删除的行数
    pub fn delete_stale_memberships(
        &self,
        team_id: i64,
        debt_id: &str,
        role_id: i64,
        protected_team_id: i64,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let deleted = conn.execute(
            r#"
            DELETE FROM role_user
            WHERE team_id = ?1
              AND team_id <> ?4
              AND EXISTS (
                  SELECT 1 FROM teams tm WHERE tm.id = ?1 AND tm.name LIKE 'debt/%'
              )
              AND EXISTS (
                  SELECT 1 FROM debts d
                  WHERE d.id = ?2
                    AND (role_user.user_id <> d.user_id
                         OR (role_user.user_id = d.user_id AND role_user.role_id <> ?3))
              )
            "#,
            params![team_id, debt_id, role_id, protected_team_id],
        )?;
        Ok(deleted)
    }

    /// 成员关系不存在时插入
    ///
    /// # 返回
    /// - Ok(true): 新插入
    /// - Ok(false): 已存在
    pub fn insert_membership_if_absent(
        &self,
        user_id: i64,
        role_id: i64,
        team_id: i64,
        user_type: &str,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO role_user (user_id, role_id, user_type, team_id)
            SELECT ?1, ?2, ?4, ?3
            WHERE NOT EXISTS (
                SELECT 1 FROM role_user ru
                WHERE ru.user_id = ?1 AND ru.role_id = ?2 AND ru.team_id = ?3
            )
            "#,
            params![user_id, role_id, team_id, user_type],
        )?;
        Ok(inserted > 0)
    }

    /// 团队内成员关系 (user_id, role_id)，按 id 排序
    pub fn memberships(&self, team_id: i64) -> RepositoryResult<Vec<(i64, i64)>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT user_id, role_id FROM role_user WHERE team_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![team_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::bootstrap_schema;

    fn setup() -> TeamRepository {
        let conn = Connection::open_in_memory().unwrap();
        bootstrap_schema(&conn).unwrap();
        conn.execute_batch("INSERT INTO debts (id, number, user_id) VALUES ('d-1', 'KZ-001', 7);")
            .unwrap();
        TeamRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_ensure_team_is_idempotent() {
        let repo = setup();
        let name = debt_team_name("d-1");
        repo.ensure_team(&name).unwrap();
        repo.ensure_team(&name).unwrap();
        let (_, found) = repo.find_team(&name).unwrap().unwrap();
        assert_eq!(found, "debt/d-1");
    }

    #[test]
    fn test_reconcile_memberships() {
        let repo = setup();
        let name = debt_team_name("d-1");
        repo.ensure_team(&name).unwrap();
        let (team_id, _) = repo.find_team(&name).unwrap().unwrap();

        // 旧归属人 + 归属人的错误角色
        repo.insert_membership_if_absent(3, 5, team_id, "User").unwrap();
        repo.insert_membership_if_absent(7, 9, team_id, "User").unwrap();

        let deleted = repo.delete_stale_memberships(team_id, "d-1", 5, 1).unwrap();
        assert_eq!(deleted, 2);

        assert!(repo.insert_membership_if_absent(7, 5, team_id, "User").unwrap());
        assert!(!repo.insert_membership_if_absent(7, 5, team_id, "User").unwrap());
        assert_eq!(repo.memberships(team_id).unwrap(), vec![(7, 5)]);
    }

    #[test]
    fn test_protected_team_is_spared() {
        let repo = setup();
        let name = debt_team_name("d-1");
        repo.ensure_team(&name).unwrap();
        let (team_id, _) = repo.find_team(&name).unwrap().unwrap();
        repo.insert_membership_if_absent(3, 5, team_id, "User").unwrap();

        let deleted = repo.delete_stale_memberships(team_id, "d-1", 5, team_id).unwrap();
        assert_eq!(deleted, 0);
    }
}
