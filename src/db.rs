// ==========================================
// 债务导入服务 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发导入时的偶发 busy 错误
// - 提供本地运行/测试用的建库入口
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 关系库建表脚本
pub const RELATIONAL_SCHEMA_SQL: &str = include_str!("../migrations/schema.sql");

/// 审计文档库建表脚本
pub const AUDIT_SCHEMA_SQL: &str = include_str!("../migrations/audit_schema.sql");

/// 进程内共享的连接句柄（多次导入并发复用）
pub type SharedConnection = Arc<Mutex<Connection>>;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开连接并包装为共享句柄
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<SharedConnection> {
    Ok(Arc::new(Mutex::new(open_sqlite_connection(db_path)?)))
}

/// 应用关系库 schema（幂等，全部为 IF NOT EXISTS）
pub fn bootstrap_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(RELATIONAL_SCHEMA_SQL)
}

/// 应用审计库 schema（幂等）
pub fn bootstrap_audit_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(AUDIT_SCHEMA_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        bootstrap_schema(&conn).unwrap();
        bootstrap_schema(&conn).unwrap();
        bootstrap_audit_schema(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('debts','role_user','import_records')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
