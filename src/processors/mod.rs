// ==========================================
// 债务导入服务 - 处理器层
// ==========================================
// 职责: 每种导入类型一个处理器，把行写成实体并逐行记审计
// 红线: 行级失败只影响该行; 处理器不跨运行保存状态
// ==========================================

pub mod actions;
pub mod agreements;
pub mod debtors;
pub mod distribution_debts;
pub mod enforcement_proceedings;
pub mod error;
pub mod executive_documents;
pub mod helpers;
pub mod noop;
pub mod payments;
pub mod row_pipeline;
pub mod stores;
pub mod update_debts;
pub mod user_plans;
pub mod users;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::audit::AuditLedger;
use crate::importer::registry::ProcessorRegistry;

pub use actions::ActionsProcessor;
pub use agreements::AgreementsProcessor;
pub use debtors::DebtorsProcessor;
pub use distribution_debts::{DistributionDebtsProcessor, DistributionSettings};
pub use enforcement_proceedings::EnforcementProceedingsProcessor;
pub use error::{ProcessorError, ProcessorResult};
pub use executive_documents::ExecutiveDocumentsProcessor;
pub use noop::NoopProcessor;
pub use payments::PaymentsProcessor;
pub use row_pipeline::{drive_rows, RowHandler, RowOutcome};
pub use stores::Stores;
pub use update_debts::UpdateDebtsProcessor;
pub use user_plans::UserPlansProcessor;
pub use users::UsersProcessor;

/// 注册全部内置处理器
///
/// # 参数
/// - stores: 共享的仓储集合
/// - ledger: 审计账本
/// - settings: 重新分配使用的团队配置
pub fn default_registry(
    stores: Arc<Stores>,
    ledger: Arc<dyn AuditLedger>,
    settings: DistributionSettings,
) -> ProcessorRegistry {
    ProcessorRegistry::new()
        .with(Arc::new(NoopProcessor::new(ledger.clone())))
        .with(Arc::new(DebtorsProcessor::new(stores.clone(), ledger.clone())))
        .with(Arc::new(AgreementsProcessor::new(stores.clone(), ledger.clone())))
        .with(Arc::new(PaymentsProcessor::new(stores.clone(), ledger.clone())))
        .with(Arc::new(ActionsProcessor::new(stores.clone(), ledger.clone())))
        .with(Arc::new(UserPlansProcessor::new(stores.clone(), ledger.clone())))
        .with(Arc::new(UsersProcessor::new(stores.clone(), ledger.clone())))
        .with(Arc::new(UpdateDebtsProcessor::new(stores.clone(), ledger.clone())))
        .with(Arc::new(EnforcementProceedingsProcessor::new(
            stores.clone(),
            ledger.clone(),
        )))
        .with(Arc::new(ExecutiveDocumentsProcessor::new(
            stores.clone(),
            ledger.clone(),
        )))
        .with(Arc::new(DistributionDebtsProcessor::new(stores, ledger, settings)))
}
