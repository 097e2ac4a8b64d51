// ==========================================
// 债务导入服务 - 用户月度计划导入
// ==========================================
// 必填: username（用户必须存在）
// 归一: end_date 为空取今天，统一落到当月最后一天
// ==========================================

use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;

use crate::audit::AuditLedger;
use crate::domain::{ModelType, Row, UserPlanUpsert};
use crate::importer::processor_trait::Processor;
use crate::importer::run_context::ImportRun;
use crate::processors::error::ProcessorResult;
use crate::processors::helpers::{end_of_month, normalize_amount, parse_date_strict};
use crate::processors::row_pipeline::{drive_rows, RowHandler, RowOutcome};
use crate::processors::stores::Stores;

pub const IMPORT_TYPE: &str = "import_user_plans";

pub const EXPECTED_COLUMNS: &[&str] =
    &["username", "user_plan_amount", "user_plan_quantity", "end_date"];

pub struct UserPlansProcessor {
    stores: Arc<Stores>,
    ledger: Arc<dyn AuditLedger>,
}

impl UserPlansProcessor {
    pub fn new(stores: Arc<Stores>, ledger: Arc<dyn AuditLedger>) -> Self {
        Self { stores, ledger }
    }
}

/// 件数: 去掉空格和千分位符号；空值为 0
fn parse_quantity(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | ',' | '.'))
        .collect();
    if cleaned.is_empty() {
        return Some(0);
    }
    cleaned.parse().ok()
}

impl RowHandler for UserPlansProcessor {
    fn model_type(&self) -> ModelType {
        ModelType::UserPlan
    }

    fn handle_row(&self, run: &mut ImportRun, row: &Row) -> ProcessorResult<RowOutcome> {
        let username = row.get("username");
        if username.is_empty() {
            return Ok(RowOutcome::failed("missing username"));
        }
        let user_id = match self.stores.user_id(&mut run.cache, username) {
            Ok(Some(id)) => id,
            Ok(None) => return Ok(RowOutcome::failed(format!("username not found: {}", username))),
            Err(e) => return Ok(RowOutcome::failed(format!("user lookup error: {}", e))),
        };

        let Some(quantity) = parse_quantity(row.get("user_plan_quantity")) else {
            return Ok(RowOutcome::failed("bad user_plan_quantity"));
        };

        let raw_end = row.get("end_date");
        let end_date = if raw_end.is_empty() {
            Local::now().date_naive()
        } else {
            match parse_date_strict(raw_end) {
                Some(d) => d,
                None => return Ok(RowOutcome::failed("bad end_date")),
            }
        };

        let plan = UserPlanUpsert {
            user_id,
            amount: normalize_amount(row.get("user_plan_amount")),
            quantity,
            end_date: end_of_month(end_date),
        };

        match self.stores.users.upsert_user_plan(&plan) {
            Ok(id) => Ok(RowOutcome::done(id.to_string())),
            Err(e) => Ok(RowOutcome::failed(e.to_string())),
        }
    }
}

#[async_trait]
impl Processor for UserPlansProcessor {
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

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(""), Some(0));
        assert_eq!(parse_quantity("1 200"), Some(1200));
        assert_eq!(parse_quantity("1,200"), Some(1200));
        assert_eq!(parse_quantity("много"), None);
    }

    #[tokio::test]
    async fn test_plan_normalized_to_month_end() {
        let mut fx = Fixture::new(IMPORT_TYPE);
        let processor = UserPlansProcessor::new(fx.stores.clone(), fx.ledger.clone());
        let batch = vec![
            row(&[
                ("username", "ivanov"),
                ("user_plan_amount", "500 000"),
                ("user_plan_quantity", "40"),
                ("end_date", "10.02.2024"),
            ]),
            row(&[
                ("username", "ivanov"),
                ("user_plan_amount", "750000"),
                ("user_plan_quantity", "45"),
                ("end_date", "2024-02-29"),
            ]),
            row(&[("username", "ivanov"), ("user_plan_quantity", "x")]),
            row(&[("username", "ivanov"), ("end_date", "someday")]),
            row(&[("username", "ghost")]),
        ];

        processor.process_batch(&mut fx.run, &batch).await.unwrap();

        let reasons: Vec<String> = fx.outcomes().into_iter().map(|(_, e)| e).collect();
        assert_eq!(
            reasons,
            vec!["", "", "bad user_plan_quantity", "bad end_date", "username not found: ghost"]
        );
        assert_eq!(fx.count("SELECT COUNT(*) FROM user_plans"), 1);
        assert_eq!(
            fx.text("SELECT end_date FROM user_plans"),
            Some("2024-02-29".to_string())
        );
        assert_eq!(fx.count("SELECT quantity FROM user_plans"), 45);
    }

    #[tokio::test]
    async fn test_blank_username_fails_without_writes() {
        let mut fx = Fixture::new(IMPORT_TYPE);
        let processor = UserPlansProcessor::new(fx.stores.clone(), fx.ledger.clone());
        let batch = vec![row(&[
            ("username", ""),
            ("user_plan_amount", "500000"),
            ("user_plan_quantity", "40"),
            ("end_date", "2024-02-10"),
        ])];

        processor.process_batch(&mut fx.run, &batch).await.unwrap();

        assert_eq!(
            fx.outcomes(),
            vec![("failed".to_string(), "missing username".to_string())]
        );
        assert_eq!(fx.count("SELECT COUNT(*) FROM user_plans"), 0);
    }
}
