// ==========================================
// 债务导入服务 - 还款导入
// ==========================================
// 必填: debt_number, username, payment_date, 非零 amount
// 写入: payments，重复还款（同债务/用户/金额/日期）忽略
// ==========================================

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::audit::AuditLedger;
use crate::domain::{ModelType, NewPayment, Row};
use crate::importer::processor_trait::Processor;
use crate::importer::run_context::ImportRun;
use crate::processors::error::ProcessorResult;
use crate::processors::helpers::{normalize_amount, parse_date_strict};
use crate::processors::row_pipeline::{drive_rows, RowHandler, RowOutcome};
use crate::processors::stores::Stores;

pub const IMPORT_TYPE: &str = "add_payments";

pub const EXPECTED_COLUMNS: &[&str] = &[
    "debt_number",
    "username",
    "payment_date",
    "amount",
    "amount_after_subtraction",
    "amount_government_duty",
    "amount_representation_expenses",
    "amount_notary_fees",
    "amount_postage",
    "amount_accounts_receivable",
    "amount_main_debt",
    "amount_accrual",
    "amount_fine",
];

pub struct PaymentsProcessor {
    stores: Arc<Stores>,
    ledger: Arc<dyn AuditLedger>,
}

impl PaymentsProcessor {
    pub fn new(stores: Arc<Stores>, ledger: Arc<dyn AuditLedger>) -> Self {
        Self { stores, ledger }
    }
}

impl RowHandler for PaymentsProcessor {
    fn model_type(&self) -> ModelType {
        ModelType::Payment
    }

    fn handle_row(&self, run: &mut ImportRun, row: &Row) -> ProcessorResult<RowOutcome> {
        let debt_number = row.get("debt_number");
        if debt_number.is_empty() {
            return Ok(RowOutcome::failed("missing debt_number"));
        }
        let debt_id = match self.stores.debt_id(&mut run.cache, debt_number) {
            Ok(Some(id)) => id,
            Ok(None) => return Ok(RowOutcome::failed(format!("debt not found: {}", debt_number))),
            Err(e) => {
                return Ok(RowOutcome::failed(format!(
                    "debt not found: {} ({})",
                    debt_number, e
                )))
            }
        };

        let username = row.get("username");
        if username.is_empty() {
            return Ok(RowOutcome::failed("missing username"));
        }
        let user_id = match self.stores.user_id(&mut run.cache, username) {
            Ok(Some(id)) => id,
            Ok(None) => return Ok(RowOutcome::failed(format!("username not found: {}", username))),
            Err(e) => {
                return Ok(RowOutcome::failed(format!(
                    "username not found: {} ({})",
                    username, e
                )))
            }
        };

        let Some(payment_date) = parse_date_strict(row.get("payment_date")) else {
            return Ok(RowOutcome::failed("bad payment_date"));
        };

        let amount = normalize_amount(row.get("amount"));
        if amount == "0" {
            return Ok(RowOutcome::failed("missing/zero amount"));
        }

        let payment = NewPayment {
            id: Uuid::new_v4().to_string(),
            debt_id,
            user_id,
            amount,
            amount_after_subtraction: normalize_amount(row.get("amount_after_subtraction")),
            amount_government_duty: normalize_amount(row.get("amount_government_duty")),
            amount_representation_expenses: normalize_amount(row.get("amount_representation_expenses")),
            amount_notary_fees: normalize_amount(row.get("amount_notary_fees")),
            amount_postage: normalize_amount(row.get("amount_postage")),
            amount_accounts_receivable: normalize_amount(row.get("amount_accounts_receivable")),
            amount_main_debt: normalize_amount(row.get("amount_main_debt")),
            amount_accrual: normalize_amount(row.get("amount_accrual")),
            amount_fine: normalize_amount(row.get("amount_fine")),
            payment_date,
            confirmed: false,
        };

        match self.stores.collection.insert_payment(&payment) {
            Ok(id) => Ok(RowOutcome::done(id)),
            Err(e) => Ok(RowOutcome::Failed {
                model_id: Some(payment.id),
                reason: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Processor for PaymentsProcessor {
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
