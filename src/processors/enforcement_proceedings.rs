// ==========================================
// 债务导入服务 - 执行程序导入
// ==========================================
// 必填: debt_number（去空白后，债务必须存在）
// 无自然键，重复导入会重复插入
// ==========================================

use async_trait::async_trait;
use std::sync::Arc;

use crate::audit::AuditLedger;
use crate::domain::{ModelType, NewEnforcementProceeding, Row};
use crate::importer::processor_trait::Processor;
use crate::importer::run_context::ImportRun;
use crate::processors::error::ProcessorResult;
use crate::processors::helpers::{normalize_amount, null_if_empty, parse_date_strict, strip_spaces};
use crate::processors::row_pipeline::{drive_rows, RowHandler, RowOutcome};
use crate::processors::stores::Stores;

pub const IMPORT_TYPE: &str = "import_enforcement_proceedings";

pub const EXPECTED_COLUMNS: &[&str] = &[
    "debt_number",
    "enforcement_proceeding_serial_number",
    "enforcement_proceeding_private_bailiff_name",
    "enforcement_proceeding_private_bailiff_region",
    "enforcement_proceeding_status_ais_oip",
    "enforcement_proceeding_start_date",
    "enforcement_proceeding_amount",
];

pub struct EnforcementProceedingsProcessor {
    stores: Arc<Stores>,
    ledger: Arc<dyn AuditLedger>,
}

impl EnforcementProceedingsProcessor {
    pub fn new(stores: Arc<Stores>, ledger: Arc<dyn AuditLedger>) -> Self {
        Self { stores, ledger }
    }
}

impl RowHandler for EnforcementProceedingsProcessor {
    fn model_type(&self) -> ModelType {
        ModelType::EnforcementProceeding
    }

    fn handle_row(&self, run: &mut ImportRun, row: &Row) -> ProcessorResult<RowOutcome> {
        let debt_number = strip_spaces(row.get("debt_number"));
        if debt_number.is_empty() {
            return Ok(RowOutcome::failed("missing debt_number"));
        }
        let debt_id = match self.stores.debt_id(&mut run.cache, &debt_number) {
            Ok(Some(id)) => id,
            Ok(None) => return Ok(RowOutcome::failed(format!("debt not found: {}", debt_number))),
            Err(e) => return Ok(RowOutcome::failed(format!("debt lookup error: {}", e))),
        };

        let proceeding = NewEnforcementProceeding {
            debt_id,
            serial_number: null_if_empty(row.get("enforcement_proceeding_serial_number")),
            amount: normalize_amount(row.get("enforcement_proceeding_amount")),
            private_bailiff_name: null_if_empty(row.get("enforcement_proceeding_private_bailiff_name")),
            private_bailiff_region: null_if_empty(
                row.get("enforcement_proceeding_private_bailiff_region"),
            ),
            start_date: parse_date_strict(row.get("enforcement_proceeding_start_date")),
            status_ais_oip: null_if_empty(row.get("enforcement_proceeding_status_ais_oip")),
        };

        match self.stores.legal.insert_enforcement_proceeding(&proceeding) {
            Ok(id) => Ok(RowOutcome::done(id.to_string())),
            Err(e) => Ok(RowOutcome::failed(e.to_string())),
        }
    }
}

#[async_trait]
impl Processor for EnforcementProceedingsProcessor {
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
    async fn test_proceedings() {
        let mut fx = Fixture::new(IMPORT_TYPE);
        let processor = EnforcementProceedingsProcessor::new(fx.stores.clone(), fx.ledger.clone());
        let batch = vec![
            row(&[
                ("debt_number", " KZ-001 "),
                ("enforcement_proceeding_serial_number", "ИП-77"),
                ("enforcement_proceeding_amount", "3 000"),
                ("enforcement_proceeding_start_date", "15.01.2024"),
            ]),
            row(&[("debt_number", "KZ-404")]),
            row(&[("enforcement_proceeding_serial_number", "ИП-78")]),
        ];

        processor.process_batch(&mut fx.run, &batch).await.unwrap();

        let reasons: Vec<String> = fx.outcomes().into_iter().map(|(_, e)| e).collect();
        assert_eq!(reasons, vec!["", "debt not found: KZ-404", "missing debt_number"]);
        assert_eq!(
            fx.text("SELECT start_date FROM enforcement_proceedings WHERE debt_id = 'd-1'"),
            Some("2024-01-15".to_string())
        );
        assert_eq!(fx.count("SELECT COUNT(*) FROM enforcement_proceedings"), 1);
    }
}
