// ==========================================
// 债务导入服务 - 债务相关写模型
// ==========================================
// 职责: 债务 / 协议 / 还款 / 催收动作的写入形态
// 金额均为规范化后的十进制字符串
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};

/// 债务 upsert（冲突键: number）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebtUpsert {
    pub id: String,
    pub debtor_id: Option<String>,
    pub number: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub filial: String,
    pub product_name: String,
    pub currency: String,
    pub amount_actual_debt: Option<f64>,
    pub amount_credit: Option<f64>,
    pub amount_main_debt: Option<f64>,
    pub amount_fine: Option<f64>,
    /// JSON 对象/数组文本，非 JSON 时写入 `{}`
    pub additional_data: String,
}

/// 按债务号的局部更新，只有 Some 的字段会被写入
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebtPatch {
    pub status_id: Option<i64>,
    pub end_date: Option<NaiveDate>,
    pub amount_actual_debt: Option<String>,
    pub amount_main_debt: Option<String>,
    pub amount_fine: Option<String>,
    pub amount_accrual: Option<String>,
    pub user_id: Option<i64>,
    pub counterparty_id: Option<String>,
    pub currency: Option<String>,
}

impl DebtPatch {
    /// 没有任何可更新字段
    pub fn is_empty(&self) -> bool {
        self.status_id.is_none()
            && self.end_date.is_none()
            && self.amount_actual_debt.is_none()
            && self.amount_main_debt.is_none()
            && self.amount_fine.is_none()
            && self.amount_accrual.is_none()
            && self.user_id.is_none()
            && self.counterparty_id.is_none()
            && self.currency.is_none()
    }
}

/// 协议 upsert（冲突键: debt_id，一笔债务一份协议）
#[derive(Debug, Clone, PartialEq)]
pub struct AgreementUpsert {
    pub agreement_type_id: Option<i64>,
    pub debt_id: String,
    pub user_id: Option<i64>,
    pub amount_debt: String,
    pub monthly_payment_amount: String,
    pub scheduled_payment_day: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// 还款（冲突键: debt_id + user_id + amount + amount_after_subtraction + payment_date，冲突时忽略）
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub id: String,
    pub debt_id: String,
    pub user_id: i64,
    pub amount: String,
    pub amount_after_subtraction: String,
    pub amount_government_duty: String,
    pub amount_representation_expenses: String,
    pub amount_notary_fees: String,
    pub amount_postage: String,
    pub amount_accounts_receivable: String,
    pub amount_main_debt: String,
    pub amount_accrual: String,
    pub amount_fine: String,
    pub payment_date: NaiveDate,
    pub confirmed: bool,
}

/// 催收动作（无自然键，直接插入）
#[derive(Debug, Clone, PartialEq)]
pub struct NewAction {
    pub id: String,
    pub debt_id: String,
    pub user_id: Option<i64>,
    pub debt_status_id: Option<i64>,
    pub action_type: Option<String>,
    pub comment: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_patch() {
        assert!(DebtPatch::default().is_empty());
        let patch = DebtPatch {
            currency: Some("KZT".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
