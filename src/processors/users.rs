// ==========================================
// 债务导入服务 - 用户导入
// ==========================================
// 必填: first_name, username, password
// 口令: 明文按 Argon2id 哈希，已哈希的原样保留
// 红线: role / department 列只告警，不做绑定
// ==========================================

use async_trait::async_trait;
use std::sync::Arc;

use crate::audit::AuditLedger;
use crate::domain::{ModelType, Row, UserUpsert};
use crate::importer::processor_trait::Processor;
use crate::importer::run_context::ImportRun;
use crate::processors::error::ProcessorResult;
use crate::processors::helpers::{ensure_password_hash, null_if_empty};
use crate::processors::row_pipeline::{drive_rows, RowHandler, RowOutcome};
use crate::processors::stores::Stores;

pub const IMPORT_TYPE: &str = "import_users";

pub const EXPECTED_COLUMNS: &[&str] = &[
    "username",
    "first_name",
    "last_name",
    "middle_name",
    "email",
    "phone",
    "password",
    "role",
    "department",
];

pub struct UsersProcessor {
    stores: Arc<Stores>,
    ledger: Arc<dyn AuditLedger>,
}

impl UsersProcessor {
    pub fn new(stores: Arc<Stores>, ledger: Arc<dyn AuditLedger>) -> Self {
        Self { stores, ledger }
    }
}

impl RowHandler for UsersProcessor {
    fn model_type(&self) -> ModelType {
        ModelType::User
    }

    fn handle_row(&self, _run: &mut ImportRun, row: &Row) -> ProcessorResult<RowOutcome> {
        let first_name = row.get("first_name");
        if first_name.is_empty() {
            return Ok(RowOutcome::failed("missing first_name"));
        }
        let username = row.get("username");
        if username.is_empty() {
            return Ok(RowOutcome::failed("missing username"));
        }
        let password = row.get("password");
        if password.is_empty() {
            return Ok(RowOutcome::failed("missing password"));
        }

        let mut warnings = Vec::new();
        if !row.get("role").is_empty() {
            warnings.push("role provided but not applied (no role-binding logic)".to_string());
        }
        if !row.get("department").is_empty() {
            warnings.push(
                "department provided but not applied (no department-binding logic)".to_string(),
            );
        }

        let password_hash = match ensure_password_hash(password) {
            Ok((hash, hashed_now)) => {
                if hashed_now {
                    warnings.push("password was plaintext -> argon2 applied".to_string());
                }
                hash
            }
            Err(e) => return Ok(RowOutcome::failed(format!("password hash failed: {}", e))),
        };

        let user = UserUpsert {
            username: username.to_string(),
            first_name: first_name.to_string(),
            last_name: null_if_empty(row.get("last_name")),
            middle_name: null_if_empty(row.get("middle_name")),
            email: null_if_empty(row.get("email")).map(|e| e.to_lowercase()),
            phone: null_if_empty(row.get("phone")),
            password_hash,
        };

        match self.stores.users.upsert_user(&user) {
            Ok(id) => Ok(RowOutcome::done_with(id.to_string(), warnings)),
            Err(e) => Ok(RowOutcome::failed(e.to_string())),
        }
    }
}

#[async_trait]
impl Processor for UsersProcessor {
    fn import_type(&self) -> &'static str {
        IMPORT_TYPE
    }

    fn expected_columns(&self) -> &'static [&'static str] {
        EXPECTED_COLUMNS
    }

    async fn process_batch(&self, run: &mut ImportRun, batch: &[Row]) -> ProcessorResult<()> {
        drive_rows(self, self.ledger.as_ref(), run, batch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::testing::{row, Fixture};

    #[tokio::test]
    async fn test_users_hash_and_warnings() {
        let mut fx = Fixture::new(IMPORT_TYPE);
        let processor = UsersProcessor::new(fx.stores.clone(), fx.ledger.clone());
        let bcrypt = "$2y$10$abcdefghijklmnopqrstuuZ1Xq9n0bQm1p2o3i4u5y6t7r8e9w0qa";
        let batch = vec![
            row(&[
                ("username", "petrov"),
                ("first_name", "Пётр"),
                ("email", "Petrov@Bank.KZ"),
                ("password", "secret"),
                ("role", "collector"),
            ]),
            row(&[("username", "sidorov"), ("first_name", "Иван"), ("password", bcrypt)]),
            row(&[("username", "x"), ("password", "p")]),
            row(&[("first_name", "Иван"), ("password", "p")]),
            row(&[("first_name", "Иван"), ("username", "y")]),
        ];

        processor.process_batch(&mut fx.run, &batch).await.unwrap();

        let reasons: Vec<String> = fx.outcomes().into_iter().map(|(_, e)| e).collect();
        assert_eq!(
            reasons,
            vec![
                "role provided but not applied (no role-binding logic); password was plaintext -> argon2 applied",
                "",
                "missing first_name",
                "missing username",
                "missing password",
            ]
        );
        assert_eq!(
            fx.text("SELECT email FROM users WHERE username = 'petrov'"),
            Some("petrov@bank.kz".to_string())
        );
        let stored = fx
            .text("SELECT password FROM users WHERE username = 'petrov'")
            .unwrap();
        assert!(stored.starts_with("$argon2"));
        assert_eq!(
            fx.text("SELECT password FROM users WHERE username = 'sidorov'"),
            Some(bcrypt.to_string())
        );
    }
}
