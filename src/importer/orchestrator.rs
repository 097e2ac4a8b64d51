// ==========================================
// 债务导入服务 - 导入编排器
// ==========================================
// 流程: 查处理器 → 打开数据源 → 摘要分流 → 识别格式
//       → 读取（失败换另一种格式）→ 分批交给处理器 → 汇总结果
// 红线: 初始化错误不产生部分结果; 导入记录只在正常结束时置为 done
// ==========================================

use std::sync::Arc;
use std::time::Instant as StdInstant;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::audit::AuditLedger;
use crate::domain::{ImportRequest, ImportResult, TabularFormat, DEFAULT_BATCH_SIZE};
use crate::importer::digest::DigestTee;
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::file_parser::{reader_for, Batches, RowIter};
use crate::importer::format_detector::detect_format;
use crate::importer::processor_trait::Processor;
use crate::importer::registry::ProcessorRegistry;
use crate::importer::run_context::ImportRun;
use crate::source::SourceOpener;

// ==========================================
// ImportOrchestrator
// ==========================================
pub struct ImportOrchestrator {
    opener: Arc<dyn SourceOpener>,
    registry: ProcessorRegistry,
    ledger: Arc<dyn AuditLedger>,
    default_batch_size: usize,
}

impl ImportOrchestrator {
    /// 创建编排器
    ///
    /// # 参数
    /// - opener: 数据源（通常是 CompoundOpener）
    /// - registry: 处理器注册表
    /// - ledger: 审计账本（用于结束时标记导入记录）
    pub fn new(
        opener: Arc<dyn SourceOpener>,
        registry: ProcessorRegistry,
        ledger: Arc<dyn AuditLedger>,
    ) -> Self {
        Self {
            opener,
            registry,
            ledger,
            default_batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// 请求未指定批大小时使用的默认值
    pub fn with_default_batch_size(mut self, batch_size: usize) -> Self {
        if batch_size > 0 {
            self.default_batch_size = batch_size;
        }
        self
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    /// 执行一次导入
    ///
    /// # 返回
    /// - Ok(ImportResult): 全部批次已交给处理器
    /// - Err(ImportError): 初始化失败 / 两种格式都不可用 / 批次级失败 / 超时
    #[instrument(
        skip(self, request),
        fields(
            import_type = %request.import_type,
            import_record_id = %request.import_record_id,
        )
    )]
    pub async fn import(&self, request: ImportRequest) -> ImporterResult<ImportResult> {
        let started = StdInstant::now();
        let batch_size = if request.batch_size == 0 {
            self.default_batch_size
        } else {
            request.batch_size
        };
        let deadline = Instant::now() + request.effective_timeout();

        info!(path = %request.file_path, batch_size, "导入开始");

        // 1. 处理器
        let processor = self.registry.resolve(&request.import_type).map_err(|e| {
            error!(error = %e, "未注册的导入类型");
            e
        })?;

        // 2. 数据源 + 摘要
        let opened = timeout_at(deadline, self.opener.open(&request.file_path))
            .await
            .map_err(|_| ImportError::Timeout { rows_processed: 0 })?
            .map_err(|e| {
                error!(error = %e, "数据源打开失败");
                ImportError::from(e)
            })?;
        let meta = opened.meta;

        let mut tee = DigestTee::new();
        timeout_at(deadline, tee.drain(opened.stream))
            .await
            .map_err(|_| ImportError::Timeout { rows_processed: 0 })??;
        let (sha256, payload) = tee.finish();

        // 3. 格式
        let detected = detect_format(&request.file_path, &meta.content_type);
        info!(
            source = %meta.origin,
            content_type = %meta.content_type,
            size_bytes = meta.size_bytes,
            detected_format = %detected,
            "数据源已读取"
        );

        let (format, rows) = open_rows_with_fallback(&payload, detected)?;

        // 4. 分批处理
        let mut run = ImportRun::new(&request.import_record_id, processor.import_type())
            .with_deadline(deadline);
        let rows_processed = dispatch_batches(processor.as_ref(), &mut run, rows, batch_size).await?;

        // 5. 导入记录收尾（失败只记日志）
        self.finish_record(&run).await;

        info!(
            format = %format,
            rows = rows_processed,
            done = run.stats.done,
            failed = run.stats.failed,
            skipped = run.stats.skipped,
            sha256 = %sha256,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "导入完成"
        );

        Ok(ImportResult {
            source: meta.origin,
            file_path: request.file_path,
            format,
            rows_processed,
            sha256,
            content_type: meta.content_type,
            size_bytes: meta.size_bytes,
            bucket: meta.bucket,
            key: meta.key,
        })
    }

    async fn finish_record(&self, run: &ImportRun) {
        if run.import_record_id.is_empty() {
            debug!("未提供导入记录 id，跳过状态更新");
            return;
        }
        if let Err(e) = self.ledger.mark_record_done(&run.import_record_id).await {
            warn!(error = %e, "导入记录状态更新失败");
        }
    }
}

/// 按识别结果选择读取器，失败时换另一种格式
///
/// Unknown 先按 XLSX 再按 CSV 尝试。两次都失败时返回 NoUsableFormat。
pub fn open_rows_with_fallback(
    payload: &[u8],
    detected: TabularFormat,
) -> ImporterResult<(TabularFormat, RowIter<'_>)> {
    let first = reader_for(detected).format();
    let second = first.other();

    let first_err = match reader_for(first).read_rows(payload) {
        Ok(rows) => return Ok((first, rows)),
        Err(e) if e.is_format_error() => e,
        Err(e) => return Err(e),
    };
    warn!(format = %first, error = %first_err, fallback = %second, "读取失败，尝试另一种格式");

    match reader_for(second).read_rows(payload) {
        Ok(rows) => Ok((second, rows)),
        Err(second_err) => {
            error!(error = %second_err, "两种格式均无法读取");
            let (xlsx, csv) = match first {
                TabularFormat::Csv => (second_err.to_string(), first_err.to_string()),
                _ => (first_err.to_string(), second_err.to_string()),
            };
            Err(ImportError::NoUsableFormat { xlsx, csv })
        }
    }
}

/// 把行切成批次顺序交给处理器，返回已交付的行数
///
/// 每批开始前检查截止时间；已开始的批次会完整处理。
pub async fn dispatch_batches(
    processor: &dyn Processor,
    run: &mut ImportRun,
    rows: RowIter<'_>,
    batch_size: usize,
) -> ImporterResult<usize> {
    let mut rows_processed = 0usize;

    for (index, batch) in Batches::new(rows, batch_size).enumerate() {
        if run.is_expired() {
            warn!(rows_processed, "导入超时，停止分批");
            return Err(ImportError::Timeout { rows_processed });
        }

        debug!(batch = index + 1, size = batch.len(), rows_processed, "交付批次");
        processor.process_batch(run, &batch).await.map_err(|e| {
            error!(batch = index + 1, error = %e, "批次处理失败");
            ImportError::from(e)
        })?;
        rows_processed += batch.len();
    }

    Ok(rows_processed)
}
