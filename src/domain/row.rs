// ==========================================
// 债务导入服务 - 行与批次
// ==========================================
// 职责: 读取器与处理器之间的传输形态
// 约束: 行内只有去空白后的字符串，类型解析由处理器负责
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 默认批大小
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// 一行源数据：列名 → 值（均已 trim）
///
/// 缺失的列通过 [`Row::get`] 读取时为空串。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, String>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按表头投影一行数据
    ///
    /// # 参数
    /// - headers: 已 trim 的表头
    /// - values: 该行的单元格值（可能短于或长于表头）
    ///
    /// 超出表头的单元格被丢弃，不足的列补空串。
    pub fn project<'a, I>(headers: &[String], values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut values = values.into_iter();
        let mut map = BTreeMap::new();
        for header in headers {
            let value = values.next().unwrap_or("").trim().to_string();
            map.insert(header.clone(), value);
        }
        Self(map)
    }

    /// 读取列值（trim 后），缺失列返回空串
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(|v| v.trim()).unwrap_or("")
    }

    /// 写入列值（测试与构造用）
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.trim().to_string(), value.trim().to_string());
        self
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 序列化原始行（审计 payload）
    pub fn to_payload(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into().trim().to_string(), v.into().trim().to_string()))
                .collect(),
        )
    }
}

/// 一批行，长度不超过批大小（最后一批可以更短）
pub type Batch = Vec<Row>;
