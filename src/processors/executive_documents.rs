// ==========================================
// 债务导入服务 - 执行文书导入
// ==========================================
// 必填: executive_document_type
// 债务可选: 缺失 / 未找到 / 查询出错时 debt_id 置空并告警
// ==========================================

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::audit::AuditLedger;
use crate::domain::{ModelType, NewExecutiveDocument, Row};
use crate::importer::processor_trait::Processor;
use crate::importer::run_context::ImportRun;
use crate::processors::error::ProcessorResult;
use crate::processors::helpers::{bool_loose, normalize_amount, null_if_empty, parse_date_strict};
use crate::processors::row_pipeline::{drive_rows, RowHandler, RowOutcome};
use crate::processors::stores::Stores;

pub const IMPORT_TYPE: &str = "import_executive_documents";

pub const EXPECTED_COLUMNS: &[&str] = &[
    "debt_number",
    "executive_document_type",
    "executive_document_serial_number",
    "executive_document_amount",
    "executive_document_start_date",
    "executive_document_status_court",
    "executive_document_issuing_authority",
    "executive_document_issue_place",
    "executive_document_issue_date",
    "executive_document_creditor_replacement",
    "executive_document_is_canceled",
    "executive_document_cancellation_number",
    "executive_document_cancellation_date",
    "executive_document_lawyer_received_at",
    "executive_document_private_bailiff_received_at",
    "executive_document_dvp_transferred_at",
    "document_has_estate",
];

pub struct ExecutiveDocumentsProcessor {
    stores: Arc<Stores>,
    ledger: Arc<dyn AuditLedger>,
}

impl ExecutiveDocumentsProcessor {
    pub fn new(stores: Arc<Stores>, ledger: Arc<dyn AuditLedger>) -> Self {
        Self { stores, ledger }
    }

    fn optional_debt(&self, run: &mut ImportRun, debt_number: &str, warnings: &mut Vec<String>) -> Option<String> {
        if debt_number.is_empty() {
            warnings.push("missing debt_number -> debt_id=NULL".to_string());
            return None;
        }
        match self.stores.debt_id(&mut run.cache, debt_number) {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                warnings.push(format!("debt not found: {} -> debt_id=NULL", debt_number));
                None
            }
            Err(e) => {
                warnings.push(format!("debt lookup error: {} -> debt_id=NULL", e));
                None
            }
        }
    }
}

impl RowHandler for ExecutiveDocumentsProcessor {
    fn model_type(&self) -> ModelType {
        ModelType::ExecutiveDocument
    }

    fn handle_row(&self, run: &mut ImportRun, row: &Row) -> ProcessorResult<RowOutcome> {
        let mut warnings = Vec::new();
        let debt_id = self.optional_debt(run, row.get("debt_number"), &mut warnings);

        let doc_type = row.get("executive_document_type");
        if doc_type.is_empty() {
            return Ok(RowOutcome::failed("missing executive_document_type"));
        }
        if !row.get("document_has_estate").is_empty() {
            warnings.push("document_has_estate provided but column absent -> ignored".to_string());
        }

        let doc = NewExecutiveDocument {
            id: Uuid::new_v4().to_string(),
            doc_type: doc_type.to_string(),
            serial_number: null_if_empty(row.get("executive_document_serial_number")),
            debt_id,
            amount: normalize_amount(row.get("executive_document_amount")),
            start_date: parse_date_strict(row.get("executive_document_start_date")),
            status_court: null_if_empty(row.get("executive_document_status_court")),
            issuing_authority: null_if_empty(row.get("executive_document_issuing_authority")),
            issue_place: null_if_empty(row.get("executive_document_issue_place")),
            issue_date: parse_date_strict(row.get("executive_document_issue_date")),
            creditor_replacement: null_if_empty(row.get("executive_document_creditor_replacement")),
            is_canceled: bool_loose(row.get("executive_document_is_canceled")),
            cancellation_number: null_if_empty(row.get("executive_document_cancellation_number")),
            cancellation_date: null_if_empty(row.get("executive_document_cancellation_date")),
            lawyer_received_at: parse_date_strict(row.get("executive_document_lawyer_received_at")),
            private_bailiff_received_at: parse_date_strict(
                row.get("executive_document_private_bailiff_received_at"),
            ),
            dvp_transferred_at: parse_date_strict(row.get("executive_document_dvp_transferred_at")),
        };

        match self.stores.legal.insert_executive_document(&doc) {
            Ok(()) => Ok(RowOutcome::done_with(doc.id, warnings)),
            Err(e) => Ok(RowOutcome::Failed {
                model_id: Some(doc.id),
                reason: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Processor for ExecutiveDocumentsProcessor {
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
    async fn test_documents_with_optional_debt() {
        let mut fx = Fixture::new(IMPORT_TYPE);
        let processor = ExecutiveDocumentsProcessor::new(fx.stores.clone(), fx.ledger.clone());
        let batch = vec![
            row(&[
                ("debt_number", "KZ-001"),
                ("executive_document_type", "court_order"),
                ("executive_document_is_canceled", "да"),
                ("executive_document_issue_date", "2024/05/20"),
            ]),
            row(&[
                ("debt_number", "KZ-404"),
                ("executive_document_type", "writ"),
                ("document_has_estate", "1"),
            ]),
            row(&[("debt_number", "KZ-001")]),
        ];

        processor.process_batch(&mut fx.run, &batch).await.unwrap();

        let outcomes = fx.outcomes();
        assert_eq!(outcomes[0], ("done".to_string(), String::new()));
        assert_eq!(
            outcomes[1],
            (
                "done".to_string(),
                "debt not found: KZ-404 -> debt_id=NULL; document_has_estate provided but column absent -> ignored"
                    .to_string()
            )
        );
        assert_eq!(outcomes[2].1, "missing executive_document_type");
        assert_eq!(fx.count("SELECT COUNT(*) FROM executive_documents WHERE debt_id IS NULL"), 1);
        assert_eq!(
            fx.count("SELECT is_canceled FROM executive_documents WHERE type = 'court_order'"),
            1
        );
        assert_eq!(
            fx.text("SELECT issue_date FROM executive_documents WHERE type = 'court_order'"),
            Some("2024-05-20".to_string())
        );
    }
}
