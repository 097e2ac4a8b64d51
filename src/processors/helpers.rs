// ==========================================
// 债务导入服务 - 行值规范化工具
// ==========================================
// 职责: 金额 / 日期 / 布尔 / 姓名 / 电话 的宽松解析
// 约束: 日期按固定格式列表依次尝试，首个匹配生效，全部失败为 None
// ==========================================

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use uuid::Uuid;

// ===== 金额 =====

/// 金额规范化: 空 → "0"，去掉空白，逗号换成点
pub fn normalize_amount(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "0".to_string();
    }
    trimmed
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}

/// 浮点解析（逗号视为小数点），空值或非法值为 None
pub fn parse_float_loose(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replace(',', ".").parse::<f64>().ok()
}

// ===== 日期 =====

const LOOSE_DATETIME_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%d.%m.%Y %H:%M:%S"];
const LOOSE_DATE_LAYOUTS: [&str; 2] = ["%d.%m.%Y", "%Y-%m-%d"];

/// 时间戳宽松解析
///
/// 顺序: RFC3339, `%Y-%m-%d %H:%M:%S`, `%d.%m.%Y %H:%M:%S`, `%d.%m.%Y`, `%Y-%m-%d`, RFC2822。
/// 带时区的格式保留原始墙上时间。
pub fn parse_time_loose(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.naive_local());
    }
    for layout in LOOSE_DATETIME_LAYOUTS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(t);
        }
    }
    for layout in LOOSE_DATE_LAYOUTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, layout) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    DateTime::parse_from_rfc2822(s).ok().map(|t| t.naive_local())
}

/// 日期严格解析（结果截断到日）
///
/// 顺序: `%Y-%m-%d`, `%d.%m.%Y`, `%Y/%m/%d`, RFC3339, `%Y-%m-%d %H:%M:%S`, `%d.%m.%Y %H:%M:%S`。
pub fn parse_date_strict(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for layout in ["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, layout) {
            return Some(d);
        }
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.naive_local().date());
    }
    for layout in LOOSE_DATETIME_LAYOUTS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(t.date());
        }
    }
    None
}

/// 证件/生日类日期
///
/// 顺序: `%Y-%m-%d`, `%d.%m.%Y`, `%d/%m/%Y`, `%d-%m-%Y`。
pub fn parse_person_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y"]
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(s, layout).ok())
}

/// 当月最后一天
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|first_of_next| first_of_next - Duration::days(1))
        .unwrap_or(date)
}

// ===== 布尔 / 文本 =====

/// 宽松布尔: 空 → false；无法识别的非空值按 true 处理
pub fn bool_loose(raw: &str) -> bool {
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        return false;
    }
    match value.as_str() {
        "1" | "true" | "t" | "yes" | "y" | "да" | "д" | "on" => true,
        "0" | "false" | "f" | "no" | "n" | "нет" | "off" => false,
        _ => true,
    }
}

/// 空串 → None
pub fn null_if_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// 去掉全部空白（债务号）
pub fn strip_spaces(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// "姓 名 父称" → (last, first, middle)；父称可含多个词
pub fn split_full_name(full_name: &str) -> (String, String, String) {
    let mut parts = full_name.split_whitespace();
    let last = parts.next().unwrap_or("").to_string();
    let first = parts.next().unwrap_or("").to_string();
    let middle = parts.collect::<Vec<_>>().join(" ");
    (last, first, middle)
}

/// 电话列拆分: 按 `/` `|` `,` 分割，只保留数字，去空去重
pub fn split_phones(raw: &str) -> Vec<String> {
    let mut phones: Vec<String> = Vec::new();
    for part in raw.split(&['/', '|', ','][..]) {
        let digits: String = part.chars().filter(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() && !phones.contains(&digits) {
            phones.push(digits);
        }
    }
    phones
}

/// 附加数据: 只接受 JSON 对象/数组文本，否则为 `{}`
pub fn json_or_empty(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        trimmed.to_string()
    } else {
        "{}".to_string()
    }
}

/// 是否为合法 UUID
pub fn is_uuid(raw: &str) -> bool {
    Uuid::parse_str(raw.trim()).is_ok()
}

// ===== 口令 =====

/// 口令哈希
///
/// 已是 bcrypt (`$2a$` / `$2b$` / `$2y$`，长度 ≥ 60) 或 argon2 哈希时原样保留，
/// 否则按 Argon2id 哈希。
///
/// # 返回
/// - Ok((hash, true)): 输入为明文，已哈希
/// - Ok((hash, false)): 输入已是哈希
pub fn ensure_password_hash(password: &str) -> Result<(String, bool), String> {
    let is_bcrypt = ["$2a$", "$2b$", "$2y$"]
        .iter()
        .any(|prefix| password.starts_with(prefix))
        && password.len() >= 60;
    if is_bcrypt || password.starts_with("$argon2") {
        return Ok((password.to_string(), false));
    }

    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes()).map_err(|e| e.to_string())?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?;
    Ok((hash.to_string(), true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_amount() {
        assert_eq!(normalize_amount(""), "0");
        assert_eq!(normalize_amount("  "), "0");
        assert_eq!(normalize_amount(" 1 500,75 "), "1500.75");
        assert_eq!(normalize_amount("12.5"), "12.5");
    }

    #[test]
    fn test_parse_float_loose() {
        assert_eq!(parse_float_loose("10,5"), Some(10.5));
        assert_eq!(parse_float_loose(""), None);
        assert_eq!(parse_float_loose("abc"), None);
    }

    #[test]
    fn test_parse_time_loose_layout_order() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(parse_time_loose("2024-03-01 10:30:00"), Some(expected));
        assert_eq!(parse_time_loose("01.03.2024 10:30:00"), Some(expected));
        assert_eq!(parse_time_loose("2024-03-01T10:30:00+05:00"), Some(expected));
        assert_eq!(
            parse_time_loose("01.03.2024"),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_time_loose("вчера"), None);
        assert_eq!(parse_time_loose(""), None);
    }

    #[test]
    fn test_parse_date_strict_truncates() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_date_strict("2024-03-01"), Some(d));
        assert_eq!(parse_date_strict("01.03.2024"), Some(d));
        assert_eq!(parse_date_strict("2024/03/01"), Some(d));
        assert_eq!(parse_date_strict("2024-03-01 23:59:59"), Some(d));
        assert_eq!(parse_date_strict("03/01/2024"), None);
    }

    #[test]
    fn test_parse_person_date() {
        let d = NaiveDate::from_ymd_opt(1990, 1, 15).unwrap();
        assert_eq!(parse_person_date("15/01/1990"), Some(d));
        assert_eq!(parse_person_date("15-01-1990"), Some(d));
        assert_eq!(parse_person_date("1990.01.15"), None);
    }

    #[test]
    fn test_end_of_month() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(end_of_month(d(2024, 2, 10)), d(2024, 2, 29));
        assert_eq!(end_of_month(d(2023, 12, 1)), d(2023, 12, 31));
        assert_eq!(end_of_month(d(2024, 4, 30)), d(2024, 4, 30));
    }

    #[test]
    fn test_bool_loose_defaults_to_true() {
        assert!(!bool_loose(""));
        assert!(!bool_loose("нет"));
        assert!(!bool_loose("0"));
        assert!(bool_loose("Да"));
        assert!(bool_loose("maybe"));
    }

    #[test]
    fn test_split_full_name() {
        assert_eq!(
            split_full_name("  Иванов   Иван Иванович "),
            ("Иванов".into(), "Иван".into(), "Иванович".into())
        );
        assert_eq!(split_full_name("Иванов"), ("Иванов".into(), "".into(), "".into()));
        assert_eq!(
            split_full_name("Ахметов Нурлан Серик улы"),
            ("Ахметов".into(), "Нурлан".into(), "Серик улы".into())
        );
    }

    #[test]
    fn test_split_phones() {
        assert_eq!(
            split_phones("+7 701 111 22 33 / 8(727)2500000| |+7 701 111 22 33"),
            vec!["77011112233".to_string(), "87272500000".to_string()]
        );
        assert!(split_phones(" / ").is_empty());
    }

    #[test]
    fn test_json_or_empty() {
        assert_eq!(json_or_empty(r#" {"a":1} "#), r#"{"a":1}"#);
        assert_eq!(json_or_empty("[1]"), "[1]");
        assert_eq!(json_or_empty("plain text"), "{}");
    }

    #[test]
    fn test_ensure_password_hash() {
        let bcrypt = format!("$2y$12${}", "a".repeat(53));
        assert_eq!(ensure_password_hash(&bcrypt).unwrap(), (bcrypt.clone(), false));

        let (hash, hashed) = ensure_password_hash("secret").unwrap();
        assert!(hashed);
        assert!(hash.starts_with("$argon2"));

        let (again, hashed) = ensure_password_hash(&hash).unwrap();
        assert!(!hashed);
        assert_eq!(again, hash);
    }
}
