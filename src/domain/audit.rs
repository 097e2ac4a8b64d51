// ==========================================
// 债务导入服务 - 审计领域模型
// ==========================================
// 职责: 逐行审计条目 (AuditItem) 与每次运行的导入记录 (ImportRecord)
// 红线: AuditItem 只追加不修改; ImportRecord 只有 parsed → done 一种迁移
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::row::Row;

// ==========================================
// 持久化模型类型
// ==========================================

/// 写入的实体类型，审计条目以其模型类名标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Debtor,
    Debt,
    Phone,
    Address,
    User,
    Agreement,
    ContactPerson,
    Payment,
    Action,
    UserPlan,
    EnforcementProceeding,
    ExecutiveDocument,
}

impl ModelType {
    /// 对应的数据表
    pub fn table(&self) -> &'static str {
        match self {
            ModelType::Debtor => "debtors",
            ModelType::Debt => "debts",
            ModelType::Phone => "phones",
            ModelType::Address => "addresses",
            ModelType::User => "users",
            ModelType::Agreement => "agreements",
            ModelType::ContactPerson => "contact_persons",
            ModelType::Payment => "payments",
            ModelType::Action => "actions",
            ModelType::UserPlan => "user_plans",
            ModelType::EnforcementProceeding => "enforcement_proceedings",
            ModelType::ExecutiveDocument => "executive_documents",
        }
    }

    /// 多态关联使用的模型类名
    pub fn class_name(&self) -> &'static str {
        match self {
            ModelType::Debtor => "App\\Infrastructure\\Persistence\\Models\\Debtor",
            ModelType::Debt => "App\\Infrastructure\\Persistence\\Models\\Debt",
            ModelType::Phone => "App\\Infrastructure\\Persistence\\Models\\Phone",
            ModelType::Address => "App\\Infrastructure\\Persistence\\Models\\Address",
            ModelType::User => "App\\Infrastructure\\Persistence\\Models\\User",
            ModelType::Agreement => "App\\Infrastructure\\Persistence\\Models\\Agreement",
            ModelType::ContactPerson => "App\\Infrastructure\\Persistence\\Models\\ContactPerson",
            ModelType::Payment => "App\\Infrastructure\\Persistence\\Models\\Payment",
            ModelType::Action => "App\\Infrastructure\\Persistence\\Models\\Action",
            ModelType::UserPlan => "App\\Infrastructure\\Persistence\\Models\\UserPlan",
            ModelType::EnforcementProceeding => {
                "App\\Infrastructure\\Persistence\\Models\\EnforcementProceeding"
            }
            ModelType::ExecutiveDocument => {
                "App\\Infrastructure\\Persistence\\Models\\ExecutiveDocument"
            }
        }
    }

    /// 按表名反查（未知表名 → None）
    pub fn from_table(table: &str) -> Option<ModelType> {
        ALL_MODEL_TYPES.iter().copied().find(|m| m.table() == table)
    }
}

pub const ALL_MODEL_TYPES: [ModelType; 12] = [
    ModelType::Debtor,
    ModelType::Debt,
    ModelType::Phone,
    ModelType::Address,
    ModelType::User,
    ModelType::Agreement,
    ModelType::ContactPerson,
    ModelType::Payment,
    ModelType::Action,
    ModelType::UserPlan,
    ModelType::EnforcementProceeding,
    ModelType::ExecutiveDocument,
];

// ==========================================
// AuditItem
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Done,
    Failed,
    Skipped,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Done => "done",
            AuditStatus::Failed => "failed",
            AuditStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单行处理结果（审计条目）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditItem {
    pub import_record_id: String,
    pub model_type: String,
    /// 实体 id；解析失败时为新生成的代理 id
    pub model_id: String,
    /// 原始行的 JSON 串
    pub payload: String,
    pub status: AuditStatus,
    /// 失败原因或以 "; " 连接的警告
    pub errors: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuditItem {
    pub fn new(
        import_record_id: &str,
        model_type: ModelType,
        model_id: &str,
        row: &Row,
        status: AuditStatus,
        errors: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            import_record_id: import_record_id.to_string(),
            model_type: model_type.class_name().to_string(),
            model_id: model_id.to_string(),
            payload: row.to_payload(),
            status,
            errors,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 生成代理 id（行在拿到实体 id 之前失败时使用）
pub fn surrogate_id() -> String {
    Uuid::new_v4().to_string()
}

// ==========================================
// ImportRecord
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportRecordStatus {
    Parsed,
    Done,
}

impl ImportRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportRecordStatus::Parsed => "parsed",
            ImportRecordStatus::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "parsed" => Some(ImportRecordStatus::Parsed),
            "done" => Some(ImportRecordStatus::Done),
            _ => None,
        }
    }
}

/// 一次导入运行的记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub count: i64,
    pub status: ImportRecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
    #[serde(rename = "type")]
    pub import_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ImportRecord {
    /// 新建一条 parsed 状态的记录
    pub fn parsed(import_type: &str, path: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().simple().to_string(),
            user_id: None,
            count: 0,
            status: ImportRecordStatus::Parsed,
            errors: None,
            import_type: import_type.to_string(),
            path: path.map(|p| p.to_string()),
            bucket: None,
            key: None,
            size_bytes: None,
            created_at: now,
            updated_at: now,
        }
    }
}
