// ==========================================
// 债务导入服务 - 行级处理管道
// ==========================================
// 职责: 逐行调用处理逻辑，每行恰好写一条审计条目
// 红线: 单行失败不影响同批其他行; 只有批次级错误中止
// ==========================================

use tracing::{debug, error, info, instrument};

use crate::audit::AuditLedger;
use crate::domain::{surrogate_id, AuditItem, AuditStatus, ModelType, Row};
use crate::importer::run_context::ImportRun;
use crate::processors::error::ProcessorResult;

/// 单行处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// 已写入；warnings 以 "; " 连接写入审计
    Done { model_id: String, warnings: Vec<String> },
    /// 未写入（或写入失败）；model_id 缺省时生成代理 id
    Failed { model_id: Option<String>, reason: String },
    Skipped { reason: String },
}

impl RowOutcome {
    pub fn done(model_id: impl Into<String>) -> Self {
        RowOutcome::Done {
            model_id: model_id.into(),
            warnings: Vec::new(),
        }
    }

    pub fn done_with(model_id: impl Into<String>, warnings: Vec<String>) -> Self {
        RowOutcome::Done {
            model_id: model_id.into(),
            warnings,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        RowOutcome::Failed {
            model_id: None,
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> AuditStatus {
        match self {
            RowOutcome::Done { .. } => AuditStatus::Done,
            RowOutcome::Failed { .. } => AuditStatus::Failed,
            RowOutcome::Skipped { .. } => AuditStatus::Skipped,
        }
    }

    /// 转成审计条目
    pub fn into_audit_item(self, import_record_id: &str, model: ModelType, row: &Row) -> AuditItem {
        let status = self.status();
        let (model_id, errors) = match self {
            RowOutcome::Done { model_id, warnings } => (model_id, warnings.join("; ")),
            RowOutcome::Failed { model_id, reason } => {
                (model_id.unwrap_or_else(surrogate_id), reason)
            }
            RowOutcome::Skipped { reason } => (surrogate_id(), reason),
        };
        AuditItem::new(import_record_id, model, &model_id, row, status, errors)
    }
}

/// 行处理器: 处理一行并给出结果
///
/// `Err` 只用于批次级失败（例如前置依赖缺失），会中止整个运行。
pub trait RowHandler: Send + Sync {
    /// 审计条目上的模型类型
    fn model_type(&self) -> ModelType;

    /// 批次开始前的检查（默认无）
    fn begin_batch(&self, _run: &mut ImportRun) -> ProcessorResult<()> {
        Ok(())
    }

    fn handle_row(&self, run: &mut ImportRun, row: &Row) -> ProcessorResult<RowOutcome>;
}

/// 追加一条审计条目；写入失败只记日志和计数
pub async fn record_outcome(
    ledger: &dyn AuditLedger,
    run: &mut ImportRun,
    model: ModelType,
    row: &Row,
    outcome: RowOutcome,
) {
    let status = outcome.status();
    let item = outcome.into_audit_item(&run.import_record_id, model, row);
    if let Err(e) = ledger.append_item(&item).await {
        run.stats.audit_errors += 1;
        error!(model_id = %item.model_id, status = %status, error = %e, "审计条目写入失败");
    }
    run.stats.record(status);
}

/// 按源顺序处理一批行
#[instrument(skip_all, fields(import_type = %run.import_type, rows = batch.len()))]
pub async fn drive_rows<H: RowHandler>(
    handler: &H,
    ledger: &dyn AuditLedger,
    run: &mut ImportRun,
    batch: &[Row],
) -> ProcessorResult<()> {
    handler.begin_batch(run)?;

    let before = run.stats;
    for (index, row) in batch.iter().enumerate() {
        let outcome = handler.handle_row(run, row)?;
        if let RowOutcome::Failed { reason, .. } = &outcome {
            debug!(row = index, reason = %reason, "行处理失败");
        }
        record_outcome(ledger, run, handler.model_type(), row, outcome).await;
    }

    info!(
        done = run.stats.done - before.done,
        failed = run.stats.failed - before.failed,
        skipped = run.stats.skipped - before.skipped,
        "批次处理完成"
    );
    Ok(())
}
