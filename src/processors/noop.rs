// ==========================================
// 债务导入服务 - 空处理器
// ==========================================
// 不写任何实体，每行记一条 skipped 审计条目
// ==========================================

use async_trait::async_trait;
use std::sync::Arc;

use crate::audit::AuditLedger;
use crate::domain::{ModelType, Row};
use crate::importer::processor_trait::Processor;
use crate::importer::run_context::ImportRun;
use crate::processors::error::ProcessorResult;
use crate::processors::row_pipeline::{drive_rows, RowHandler, RowOutcome};

pub const IMPORT_TYPE: &str = "noop";

pub struct NoopProcessor {
    ledger: Arc<dyn AuditLedger>,
}

impl NoopProcessor {
    pub fn new(ledger: Arc<dyn AuditLedger>) -> Self {
        Self { ledger }
    }
}

impl RowHandler for NoopProcessor {
    fn model_type(&self) -> ModelType {
        ModelType::Debt
    }

    fn handle_row(&self, _run: &mut ImportRun, _row: &Row) -> ProcessorResult<RowOutcome> {
        Ok(RowOutcome::Skipped {
            reason: "noop processor".to_string(),
        })
    }
}

#[async_trait]
impl Processor for NoopProcessor {
    fn import_type(&self) -> &'static str {
        IMPORT_TYPE
    }

    fn expected_columns(&self) -> &'static [&'static str] {
        &[]
    }

    async fn process_batch(&self, run: &mut ImportRun, batch: &[Row]) -> ProcessorResult<()> {
        drive_rows(self, self.ledger.as_ref(), run, batch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditLedger;
    use crate::domain::AuditStatus;

    #[tokio::test]
    async fn test_noop_skips_every_row() {
        let ledger = Arc::new(MemoryAuditLedger::new());
        let processor = NoopProcessor::new(ledger.clone());
        let mut run = ImportRun::new("rec-1", IMPORT_TYPE);
        let batch = vec![Row::new().with("a", "1"), Row::new().with("a", "2")];

        processor.process_batch(&mut run, &batch).await.unwrap();
        assert_eq!(ledger.count_status("rec-1", AuditStatus::Skipped), 2);
        assert_eq!(run.stats.skipped, 2);
    }
}
