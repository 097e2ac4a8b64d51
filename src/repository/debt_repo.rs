// ==========================================
// 债务导入服务 - 债务与协议仓储
// ==========================================
// 职责: debts upsert / 局部更新 / 归属人变更, agreements upsert
// ==========================================

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::{AgreementUpsert, DebtPatch, DebtUpsert};
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// DebtRepository
// ==========================================
/// 债务仓储
/// 红线: 不含业务逻辑，只负责数据访问
pub struct DebtRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DebtRepository {
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

    /// 按债务号 upsert 债务
    ///
    /// 已有记录上，空值/缺失值不覆盖原值。
    ///
    /// # 返回
    /// - Ok(String): 债务 id
    pub fn upsert_debt(&self, debt: &DebtUpsert) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let now = Utc::now().to_rfc3339();
        let id = if debt.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            debt.id.clone()
        };
        let id: String = conn.query_row(
            r#"
            INSERT INTO debts (
                id, debtor_id, number, start_date, end_date, filial, product_name,
                amount_currency, amount_actual_debt, amount_credit, amount_main_debt,
                amount_fine, additional_data, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
                COALESCE(?9, 0), COALESCE(?10, 0), COALESCE(?11, 0), COALESCE(?12, 0),
                ?13, ?14, ?14
            )
            ON CONFLICT (number) DO UPDATE SET
                debtor_id = COALESCE(excluded.debtor_id, debts.debtor_id),
                start_date = COALESCE(excluded.start_date, debts.start_date),
                end_date = COALESCE(excluded.end_date, debts.end_date),
                filial = COALESCE(NULLIF(excluded.filial, ''), debts.filial),
                product_name = COALESCE(NULLIF(excluded.product_name, ''), debts.product_name),
                amount_currency = COALESCE(NULLIF(excluded.amount_currency, ''), debts.amount_currency),
                amount_actual_debt = COALESCE(?9, debts.amount_actual_debt),
                amount_credit = COALESCE(?10, debts.amount_credit),
                amount_main_debt = COALESCE(?11, debts.amount_main_debt),
                amount_fine = COALESCE(?12, debts.amount_fine),
                additional_data = CASE
                    WHEN excluded.additional_data = '{}' THEN debts.additional_data
                    ELSE excluded.additional_data
                END,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
            params![
                id,
                debt.debtor_id,
                debt.number,
                debt.start_date.map(|d| d.to_string()),
                debt.end_date.map(|d| d.to_string()),
                debt.filial,
                debt.product_name,
                debt.currency,
                debt.amount_actual_debt,
                debt.amount_credit,
                debt.amount_main_debt,
                debt.amount_fine,
                debt.additional_data,
                now,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// 按债务号局部更新
    ///
    /// # 返回
    /// - Ok(usize): 受影响行数（0 表示债务号不存在）
    pub fn patch_by_number(&self, number: &str, patch: &DebtPatch) -> RepositoryResult<usize> {
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(status_id) = patch.status_id {
            sets.push("status_id = ?");
            values.push(Value::Integer(status_id));
        }
        if let Some(end_date) = patch.end_date {
            sets.push("end_date = ?");
            values.push(Value::Text(end_date.to_string()));
        }
        let amounts = [
            ("amount_actual_debt = ?", &patch.amount_actual_debt),
            ("amount_main_debt = ?", &patch.amount_main_debt),
            ("amount_fine = ?", &patch.amount_fine),
            ("amount_accrual = ?", &patch.amount_accrual),
        ];
        for (clause, amount) in amounts {
            if let Some(amount) = amount {
                sets.push(clause);
                values.push(Value::Text(amount.clone()));
            }
        }
        if let Some(user_id) = patch.user_id {
            sets.push("user_id = ?");
            values.push(Value::Integer(user_id));
        }
        if let Some(counterparty_id) = &patch.counterparty_id {
            sets.push("counterparty_id = ?");
            values.push(Value::Text(counterparty_id.clone()));
        }
        if let Some(currency) = &patch.currency {
            sets.push("amount_currency = ?");
            values.push(Value::Text(currency.clone()));
        }

        if sets.is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "debt".to_string(),
                message: "no updatable fields".to_string(),
            });
        }

        sets.push("updated_at = ?");
        values.push(Value::Text(Utc::now().to_rfc3339()));
        values.push(Value::Text(number.to_string()));

        let sql = format!("UPDATE debts SET {} WHERE number = ?", sets.join(", "));
        let conn = self.get_conn()?;
        let affected = conn.execute(&sql, params_from_iter(values))?;
        Ok(affected)
    }

    /// 当前归属人
    pub fn find_owner(&self, debt_id: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let owner: Option<Option<i64>> = conn
            .query_row(
                "SELECT user_id FROM debts WHERE id = ?1",
                params![debt_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(owner.flatten())
    }

    /// 归属人不同时才更新（同时刷新 user_assigned_at）
    ///
    /// # 返回
    /// - Ok(true): 发生了写入
    /// - Ok(false): 已是该归属人
    pub fn assign_owner_if_different(&self, debt_id: &str, user_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE debts
            SET user_id = ?2, user_assigned_at = ?3
            WHERE id = ?1 AND user_id IS NOT ?2
            "#,
            params![debt_id, user_id, Utc::now().to_rfc3339()],
        )?;
        Ok(affected > 0)
    }

    /// 按 debt_id upsert 协议（已有协议的全部字段被覆盖）
    ///
    /// # 返回
    /// - Ok(i64): 协议 id
    pub fn upsert_agreement(&self, agreement: &AgreementUpsert) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let now = Utc::now().to_rfc3339();
        let id: i64 = conn.query_row(
            r#"
            INSERT INTO agreements (
                agreement_type_id, debt_id, user_id, amount_debt,
                monthly_payment_amount, scheduled_payment_day,
                start_date, end_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ON CONFLICT (debt_id) DO UPDATE SET
                agreement_type_id = excluded.agreement_type_id,
                user_id = excluded.user_id,
                amount_debt = excluded.amount_debt,
                monthly_payment_amount = excluded.monthly_payment_amount,
                scheduled_payment_day = excluded.scheduled_payment_day,
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
            params![
                agreement.agreement_type_id,
                agreement.debt_id,
                agreement.user_id,
                agreement.amount_debt,
                agreement.monthly_payment_amount,
                agreement.scheduled_payment_day,
                agreement.start_date.map(|d| d.to_string()),
                agreement.end_date.map(|d| d.to_string()),
                now,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::bootstrap_schema;

    fn setup() -> (DebtRepository, Arc<Mutex<Connection>>) {
        let conn = Connection::open_in_memory().unwrap();
        bootstrap_schema(&conn).unwrap();
        let shared = Arc::new(Mutex::new(conn));
        (DebtRepository::from_connection(shared.clone()), shared)
    }

    #[test]
    fn test_upsert_debt_is_keyed_by_number() {
        let (repo, _) = setup();
        let debt = DebtUpsert {
            number: "KZ-001".to_string(),
            amount_actual_debt: Some(100.5),
            additional_data: "{}".to_string(),
            ..Default::default()
        };
        let a = repo.upsert_debt(&debt).unwrap();
        let b = repo.upsert_debt(&debt).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_patch_by_number_reports_missing_debt() {
        let (repo, conn) = setup();
        repo.upsert_debt(&DebtUpsert {
            number: "KZ-001".to_string(),
            additional_data: "{}".to_string(),
            ..Default::default()
        })
        .unwrap();

        let patch = DebtPatch {
            amount_fine: Some("12.5".to_string()),
            currency: Some("KZT".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.patch_by_number("KZ-001", &patch).unwrap(), 1);
        assert_eq!(repo.patch_by_number("KZ-404", &patch).unwrap(), 0);

        let conn = conn.lock().unwrap();
        let currency: String = conn
            .query_row(
                "SELECT amount_currency FROM debts WHERE number = 'KZ-001'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(currency, "KZT");
    }

    #[test]
    fn test_empty_patch_is_rejected() {
        let (repo, _) = setup();
        assert!(repo.patch_by_number("KZ-001", &DebtPatch::default()).is_err());
    }

    #[test]
    fn test_assign_owner_only_when_different() {
        let (repo, _) = setup();
        let id = repo
            .upsert_debt(&DebtUpsert {
                number: "KZ-001".to_string(),
                additional_data: "{}".to_string(),
                ..Default::default()
            })
            .unwrap();

        assert!(repo.assign_owner_if_different(&id, 7).unwrap());
        assert!(!repo.assign_owner_if_different(&id, 7).unwrap());
        assert_eq!(repo.find_owner(&id).unwrap(), Some(7));
    }

    #[test]
    fn test_upsert_agreement_overwrites() {
        let (repo, _) = setup();
        let mut agreement = AgreementUpsert {
            agreement_type_id: None,
            debt_id: "d-1".to_string(),
            user_id: None,
            amount_debt: "1000".to_string(),
            monthly_payment_amount: "100".to_string(),
            scheduled_payment_day: Some("5".to_string()),
            start_date: None,
            end_date: None,
        };
        let a = repo.upsert_agreement(&agreement).unwrap();
        agreement.amount_debt = "900".to_string();
        let b = repo.upsert_agreement(&agreement).unwrap();
        assert_eq!(a, b);
    }
}
