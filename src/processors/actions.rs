// ==========================================
// 债务导入服务 - 催收动作导入
// ==========================================
// 必填: debt_number（债务必须存在）
// 可选: username, status（缺失或未找到时置空并告警）
// ==========================================

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::audit::AuditLedger;
use crate::domain::{ModelType, NewAction, Row};
use crate::importer::processor_trait::Processor;
use crate::importer::run_context::ImportRun;
use crate::processors::error::ProcessorResult;
use crate::processors::helpers::{null_if_empty, parse_time_loose};
use crate::processors::row_pipeline::{drive_rows, RowHandler, RowOutcome};
use crate::processors::stores::Stores;

pub const IMPORT_TYPE: &str = "import_actions";

pub const EXPECTED_COLUMNS: &[&str] =
    &["debt_number", "username", "status", "type", "comment", "created_at"];

pub struct ActionsProcessor {
    stores: Arc<Stores>,
    ledger: Arc<dyn AuditLedger>,
}

impl ActionsProcessor {
    pub fn new(stores: Arc<Stores>, ledger: Arc<dyn AuditLedger>) -> Self {
        Self { stores, ledger }
    }

    fn optional_status(&self, run: &mut ImportRun, shortname: &str, warnings: &mut Vec<String>) -> Option<i64> {
        if shortname.is_empty() {
            warnings.push("missing status -> debt_status_id=NULL".to_string());
            return None;
        }
        match self.stores.status_id(&mut run.cache, shortname) {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                warnings.push(format!("status not found: {} -> debt_status_id=NULL", shortname));
                None
            }
            Err(e) => {
                warnings.push(format!("status lookup error: {} -> debt_status_id=NULL", e));
                None
            }
        }
    }
}

impl RowHandler for ActionsProcessor {
    fn model_type(&self) -> ModelType {
        ModelType::Action
    }

    fn handle_row(&self, run: &mut ImportRun, row: &Row) -> ProcessorResult<RowOutcome> {
        let debt_number = row.get("debt_number");
        if debt_number.is_empty() {
            return Ok(RowOutcome::failed("missing debt_number"));
        }
        let debt_id = match self.stores.debt_id(&mut run.cache, debt_number) {
            Ok(Some(id)) => id,
            Ok(None) => return Ok(RowOutcome::failed(format!("debt not found: {}", debt_number))),
            Err(e) => return Ok(RowOutcome::failed(format!("debt lookup error: {}", e))),
        };

        let mut warnings = Vec::new();
        let user_id = self
            .stores
            .optional_user_id(&mut run.cache, row.get("username"), &mut warnings);
        let debt_status_id = self.optional_status(run, row.get("status"), &mut warnings);

        let action = NewAction {
            id: Uuid::new_v4().to_string(),
            debt_id,
            user_id,
            debt_status_id,
            action_type: null_if_empty(row.get("type")),
            comment: null_if_empty(row.get("comment")),
            created_at: parse_time_loose(row.get("created_at")),
        };

        match self.stores.collection.insert_action(&action) {
            Ok(()) => Ok(RowOutcome::done_with(action.id, warnings)),
            Err(e) => Ok(RowOutcome::Failed {
                model_id: Some(action.id),
                reason: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Processor for ActionsProcessor {
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
