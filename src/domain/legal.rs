// ==========================================
// 债务导入服务 - 法律文书写模型
// ==========================================

use chrono::NaiveDate;

/// 执行程序（直接插入）
#[derive(Debug, Clone, PartialEq)]
pub struct NewEnforcementProceeding {
    pub debt_id: String,
    pub serial_number: Option<String>,
    pub amount: String,
    pub private_bailiff_name: Option<String>,
    pub private_bailiff_region: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub status_ais_oip: Option<String>,
}

/// 执行文书（直接插入，债务可为空）
#[derive(Debug, Clone, PartialEq)]
pub struct NewExecutiveDocument {
    pub id: String,
    pub doc_type: String,
    pub serial_number: Option<String>,
    pub debt_id: Option<String>,
    pub amount: String,
    pub start_date: Option<NaiveDate>,
    pub status_court: Option<String>,
    pub issuing_authority: Option<String>,
    pub issue_place: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub creditor_replacement: Option<String>,
    pub is_canceled: bool,
    pub cancellation_number: Option<String>,
    /// 源系统中为自由文本
    pub cancellation_date: Option<String>,
    pub lawyer_received_at: Option<NaiveDate>,
    pub private_bailiff_received_at: Option<NaiveDate>,
    pub dvp_transferred_at: Option<NaiveDate>,
}
