// ==========================================
// 债务导入服务 - 领域模型层
// ==========================================
// 职责: 行/批次、导入请求与结果、审计模型、各实体写模型
// 红线: 不含数据访问逻辑
// ==========================================

pub mod audit;
pub mod debt;
pub mod debtor;
pub mod import;
pub mod legal;
pub mod row;
pub mod user;

// 重导出核心类型
pub use audit::{
    surrogate_id, AuditItem, AuditStatus, ImportRecord, ImportRecordStatus, ModelType,
    ALL_MODEL_TYPES,
};
pub use debt::{AgreementUpsert, DebtPatch, DebtUpsert, NewAction, NewPayment};
pub use debtor::{
    AddressUpsert, ContactPhoneEntry, DebtorUpsert, PhoneUpsert, ADDRESS_COLUMNS, PHONE_COLUMNS,
};
pub use import::{
    ImportRequest, ImportResult, SourceMeta, SourceOrigin, TabularFormat, DEFAULT_IMPORT_TIMEOUT,
};
pub use legal::{NewEnforcementProceeding, NewExecutiveDocument};
pub use row::{Batch, Row, DEFAULT_BATCH_SIZE};
pub use user::{UserPlanUpsert, UserUpsert};
