// ==========================================
// 债务导入服务 - 用户与计划写模型
// ==========================================

use chrono::NaiveDate;

/// 用户 upsert（冲突键: username）
#[derive(Debug, Clone, PartialEq)]
pub struct UserUpsert {
    pub username: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// 已哈希的口令
    pub password_hash: String,
}

/// 用户月度计划（按 user_id + 月末日期更新，不存在则插入）
#[derive(Debug, Clone, PartialEq)]
pub struct UserPlanUpsert {
    pub user_id: i64,
    pub amount: String,
    pub quantity: i64,
    /// 已归一到月末
    pub end_date: NaiveDate,
}
