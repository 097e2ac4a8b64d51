// ==========================================
// 债务导入服务 - 债务人写模型
// ==========================================
// 职责: 债务人及其地址/电话/联系人的写入形态
// ==========================================

use chrono::NaiveDate;

/// 债务人 upsert（冲突键: iin；空值不覆盖已有值）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebtorUpsert {
    pub iin: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub status: String,
    pub id_card_number: String,
    pub id_card_authorities_in_granting: String,
    pub id_card_start_date: Option<NaiveDate>,
    pub id_card_end_date: Option<NaiveDate>,
    pub birth_day: Option<NaiveDate>,
    pub birthplace: String,
    pub nationality: String,
}

/// 地址类型（列名 → type_id）
pub const ADDRESS_COLUMNS: [(&str, i64); 3] =
    [("reg_address", 1), ("fact_address", 2), ("work_address", 3)];

/// 电话类型（列名 → type_id）
pub const PHONE_COLUMNS: [(&str, i64); 3] = [("phones", 1), ("work_phones", 2), ("home_phones", 3)];

/// 地址 upsert（冲突键: subject_type + subject_id + type_id）
#[derive(Debug, Clone, PartialEq)]
pub struct AddressUpsert {
    pub subject_type: String,
    pub subject_id: String,
    pub address: String,
    pub type_id: i64,
}

/// 电话 upsert（冲突键: subject_type + subject_id + phone）
#[derive(Debug, Clone, PartialEq)]
pub struct PhoneUpsert {
    pub subject_type: String,
    pub subject_id: String,
    pub phone: String,
    pub type_id: i64,
}

/// 联系人电话条目，源格式 `phone,name,type|phone,name,type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactPhoneEntry {
    pub phone: String,
    pub full_name: String,
    pub type_id: i64,
}

impl ContactPhoneEntry {
    /// 解析联系人电话列
    ///
    /// 电话号码只保留数字；号码为空的条目被忽略；type 缺省或非法时为 1。
    pub fn parse_list(raw: &str) -> Vec<ContactPhoneEntry> {
        raw.split('|')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| {
                let mut parts = entry.split(',');
                let phone: String = parts
                    .next()
                    .unwrap_or("")
                    .chars()
                    .filter(|c| c.is_ascii_digit())
                    .collect();
                if phone.is_empty() {
                    return None;
                }
                let full_name = parts.next().map(str::trim).unwrap_or("").to_string();
                let type_id = parts
                    .next()
                    .and_then(|t| t.trim().parse::<i64>().ok())
                    .unwrap_or(1);
                Some(ContactPhoneEntry {
                    phone,
                    full_name,
                    type_id,
                })
            })
            .collect()
    }
}
