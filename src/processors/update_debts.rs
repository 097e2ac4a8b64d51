// ==========================================
// 债务导入服务 - 债务局部更新
// ==========================================
// 按债务号更新非空列；至少需要一个可更新字段
// 状态 / 用户按自然键解析，解析不到只告警、不更新该字段
// ==========================================

use async_trait::async_trait;
use std::sync::Arc;

use crate::audit::AuditLedger;
use crate::domain::{DebtPatch, ModelType, Row};
use crate::importer::processor_trait::Processor;
use crate::importer::run_context::ImportRun;
use crate::processors::error::ProcessorResult;
use crate::processors::helpers::{is_uuid, normalize_amount, parse_date_strict, strip_spaces};
use crate::processors::row_pipeline::{drive_rows, RowHandler, RowOutcome};
use crate::processors::stores::Stores;

pub const IMPORT_TYPE: &str = "update_debts";

pub const EXPECTED_COLUMNS: &[&str] = &[
    "debt_number",
    "debt_status",
    "debt_end_date",
    "debt_amount_actual_debt",
    "debt_amount_main_debt",
    "debt_amount_fine",
    "debt_amount_accrual",
    "debt_username",
    "debt_counterparty",
    "debt_currency",
];

pub struct UpdateDebtsProcessor {
    stores: Arc<Stores>,
    ledger: Arc<dyn AuditLedger>,
}

impl UpdateDebtsProcessor {
    pub fn new(stores: Arc<Stores>, ledger: Arc<dyn AuditLedger>) -> Self {
        Self { stores, ledger }
    }

    fn build_patch(&self, run: &mut ImportRun, row: &Row, warnings: &mut Vec<String>) -> DebtPatch {
        let non_empty = |column: &str| Some(row.get(column)).filter(|v| !v.is_empty());

        let status_id = non_empty("debt_status").and_then(|shortname| {
            match self.stores.status_id(&mut run.cache, shortname) {
                Ok(Some(id)) => Some(id),
                Ok(None) => {
                    warnings.push(format!("status not found: {} -> status not updated", shortname));
                    None
                }
                Err(e) => {
                    warnings.push(format!("status lookup error: {} -> status not updated", e));
                    None
                }
            }
        });

        let user_id = non_empty("debt_username").and_then(|username| {
            match self.stores.user_id(&mut run.cache, username) {
                Ok(Some(id)) => Some(id),
                Ok(None) => {
                    warnings.push(format!("username not found: {} -> user not updated", username));
                    None
                }
                Err(e) => {
                    warnings.push(format!("user lookup error: {} -> user not updated", e));
                    None
                }
            }
        });

        let end_date = non_empty("debt_end_date").and_then(|raw| {
            let parsed = parse_date_strict(raw);
            if parsed.is_none() {
                warnings.push(format!("bad debt_end_date: {}", raw));
            }
            parsed
        });

        DebtPatch {
            status_id,
            end_date,
            amount_actual_debt: non_empty("debt_amount_actual_debt").map(normalize_amount),
            amount_main_debt: non_empty("debt_amount_main_debt").map(normalize_amount),
            amount_fine: non_empty("debt_amount_fine").map(normalize_amount),
            amount_accrual: non_empty("debt_amount_accrual").map(normalize_amount),
            user_id,
            counterparty_id: non_empty("debt_counterparty")
                .filter(|v| is_uuid(v))
                .map(str::to_string),
            currency: non_empty("debt_currency").map(str::to_string),
        }
    }
}

impl RowHandler for UpdateDebtsProcessor {
    fn model_type(&self) -> ModelType {
        ModelType::Debt
    }

    fn handle_row(&self, run: &mut ImportRun, row: &Row) -> ProcessorResult<RowOutcome> {
        let debt_number = strip_spaces(row.get("debt_number"));
        if debt_number.is_empty() {
            return Ok(RowOutcome::failed("missing debt_number"));
        }

        let mut warnings = Vec::new();
        let patch = self.build_patch(run, row, &mut warnings);
        if patch.is_empty() {
            let mut reason = "no updatable fields found".to_string();
            if !warnings.is_empty() {
                reason = format!("{}; {}", reason, warnings.join("; "));
            }
            return Ok(RowOutcome::failed(reason));
        }

        let debt_id = self
            .stores
            .debt_id(&mut run.cache, &debt_number)
            .ok()
            .flatten();

        match self.stores.debts.patch_by_number(&debt_number, &patch) {
            Ok(0) => Ok(RowOutcome::failed(format!("debt not found: {}", debt_number))),
            Ok(_) => Ok(RowOutcome::done_with(debt_id.unwrap_or(debt_number), warnings)),
            Err(e) => Ok(RowOutcome::failed(e.to_string())),
        }
    }
}

#[async_trait]
impl Processor for UpdateDebtsProcessor {
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
