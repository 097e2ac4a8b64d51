// ==========================================
// 债务导入服务 - 批处理器接口
// ==========================================
// 职责: 把一批行转换为已校验、已解析外键、幂等的写入
// 返回值只报告批次级（或更严重）失败，行级结果进入审计
// ==========================================

use async_trait::async_trait;

use crate::domain::Row;
use crate::importer::run_context::ImportRun;
use crate::processors::error::ProcessorResult;

// ==========================================
// Processor Trait
// ==========================================
// 实现者: processors 模块下各导入类型
#[async_trait]
pub trait Processor: Send + Sync {
    /// 注册键（导入类型）
    fn import_type(&self) -> &'static str;

    /// 处理器读取的列
    fn expected_columns(&self) -> &'static [&'static str];

    /// 处理一批行
    ///
    /// # 参数
    /// - run: 本次运行上下文（缓存与统计随批次累积）
    /// - batch: 按源顺序排列的行
    ///
    /// # 返回
    /// - Ok(()): 批次已处理（单行失败已写入审计）
    /// - Err(ProcessorError): 批次级失败，运行中止
    async fn process_batch(&self, run: &mut ImportRun, batch: &[Row]) -> ProcessorResult<()>;
}
