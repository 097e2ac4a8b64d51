// 处理器单元测试的公共夹具

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::audit::MemoryAuditLedger;
use crate::db::{bootstrap_schema, SharedConnection};
use crate::domain::Row;
use crate::importer::run_context::ImportRun;
use crate::processors::stores::Stores;

pub struct Fixture {
    pub conn: SharedConnection,
    pub stores: Arc<Stores>,
    pub ledger: Arc<MemoryAuditLedger>,
    pub run: ImportRun,
}

impl Fixture {
    /// 内存库 + 基础数据（债务 KZ-001、用户 ivanov、状态 promise）
    pub fn new(import_type: &str) -> Self {
        let conn = Connection::open_in_memory().unwrap();
        bootstrap_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO debts (id, number) VALUES ('d-1', 'KZ-001');
            INSERT INTO users (id, username) VALUES (7, 'ivanov');
            INSERT INTO debt_statuses (id, shortname) VALUES (3, 'promise');
            "#,
        )
        .unwrap();
        let conn = Arc::new(Mutex::new(conn));
        Self {
            stores: Arc::new(Stores::from_connection(conn.clone())),
            conn,
            ledger: Arc::new(MemoryAuditLedger::new()),
            run: ImportRun::new("rec-1", import_type),
        }
    }

    pub fn exec(&self, sql: &str) {
        self.conn.lock().unwrap().execute_batch(sql).unwrap();
    }

    pub fn count(&self, sql: &str) -> i64 {
        self.conn
            .lock()
            .unwrap()
            .query_row(sql, [], |row| row.get(0))
            .unwrap()
    }

    pub fn text(&self, sql: &str) -> Option<String> {
        self.conn
            .lock()
            .unwrap()
            .query_row(sql, [], |row| row.get(0))
            .unwrap()
    }

    /// 本次运行的 (status, errors) 列表
    pub fn outcomes(&self) -> Vec<(String, String)> {
        self.ledger
            .items()
            .into_iter()
            .map(|i| (i.status.as_str().to_string(), i.errors))
            .collect()
    }
}

pub fn row(pairs: &[(&str, &str)]) -> Row {
    pairs.iter().copied().collect()
}
