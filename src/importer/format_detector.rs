// ==========================================
// 债务导入服务 - 表格格式识别
// ==========================================
// 顺序: 定位串路径扩展名 → Content-Type → Unknown
// ==========================================

use url::Url;

use crate::domain::TabularFormat;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const CSV_CONTENT_TYPES: [&str; 3] = ["text/csv", "application/csv", "text/plain"];

/// 识别表格格式
///
/// # 参数
/// - locator: 数据源定位串（URL 时只看 path 部分，忽略查询串）
/// - content_type: 数据源报告的 Content-Type，可带参数
pub fn detect_format(locator: &str, content_type: &str) -> TabularFormat {
    match extension_of(locator).as_deref() {
        Some("xlsx") => return TabularFormat::Xlsx,
        Some("csv") => return TabularFormat::Csv,
        _ => {}
    }

    let media_type = media_type_of(content_type);
    if media_type == XLSX_CONTENT_TYPE {
        TabularFormat::Xlsx
    } else if CSV_CONTENT_TYPES.contains(&media_type.as_str()) {
        TabularFormat::Csv
    } else {
        TabularFormat::Unknown
    }
}

/// 取路径最后一段的小写扩展名
fn extension_of(locator: &str) -> Option<String> {
    let locator = locator.trim();
    let path = match Url::parse(locator) {
        Ok(url) if !url.path().is_empty() => url.path().to_string(),
        _ => locator.to_string(),
    };

    let file_name = path.rsplit('/').next().unwrap_or("");
    let (_, ext) = file_name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// 去掉 `; charset=...` 等参数后的小写媒体类型
fn media_type_of(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
