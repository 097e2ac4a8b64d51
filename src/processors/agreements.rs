// ==========================================
// 债务导入服务 - 协议导入
// ==========================================
// 必填: debt_number（债务必须存在）
// 可选: username, agreement_type（按名称取或建）
// 写入: agreements，按 debt_id upsert
// ==========================================

use async_trait::async_trait;
use std::sync::Arc;

use crate::audit::AuditLedger;
use crate::domain::{AgreementUpsert, ModelType, Row};
use crate::importer::processor_trait::Processor;
use crate::importer::run_context::ImportRun;
use crate::processors::error::ProcessorResult;
use crate::processors::helpers::{normalize_amount, null_if_empty, parse_date_strict};
use crate::processors::row_pipeline::{drive_rows, RowHandler, RowOutcome};
use crate::processors::stores::Stores;

pub const IMPORT_TYPE: &str = "import_agreements";

pub const EXPECTED_COLUMNS: &[&str] = &[
    "debt_number",
    "username",
    "agreement_type",
    "agreement_amount_debt",
    "agreement_monthly_payment_amount",
    "agreement_scheduled_payment_day",
    "agreement_start_date",
    "agreement_end_date",
];

pub struct AgreementsProcessor {
    stores: Arc<Stores>,
    ledger: Arc<dyn AuditLedger>,
}

impl AgreementsProcessor {
    pub fn new(stores: Arc<Stores>, ledger: Arc<dyn AuditLedger>) -> Self {
        Self { stores, ledger }
    }
}

impl RowHandler for AgreementsProcessor {
    fn model_type(&self) -> ModelType {
        ModelType::Agreement
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

        let type_name = row.get("agreement_type");
        let agreement_type_id = if type_name.is_empty() {
            warnings.push("missing agreement_type -> agreement_type_id=NULL".to_string());
            None
        } else {
            match self.stores.agreement_type_id(&mut run.cache, type_name) {
                Ok(id) => id,
                Err(e) => {
                    warnings.push(format!("agreement_type upsert failed: {}", e));
                    None
                }
            }
        };

        let agreement = AgreementUpsert {
            agreement_type_id,
            debt_id,
            user_id,
            amount_debt: normalize_amount(row.get("agreement_amount_debt")),
            monthly_payment_amount: normalize_amount(row.get("agreement_monthly_payment_amount")),
            scheduled_payment_day: null_if_empty(row.get("agreement_scheduled_payment_day")),
            start_date: parse_date_strict(row.get("agreement_start_date")),
            end_date: parse_date_strict(row.get("agreement_end_date")),
        };

        match self.stores.debts.upsert_agreement(&agreement) {
            Ok(id) => Ok(RowOutcome::done_with(id.to_string(), warnings)),
            Err(e) => Ok(RowOutcome::failed(e.to_string())),
        }
    }
}

#[async_trait]
impl Processor for AgreementsProcessor {
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
