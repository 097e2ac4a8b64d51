// ==========================================
// 债务导入服务 - 导入配置
// ==========================================
// 职责: 从环境变量加载导入运行参数，提供默认值与校验
// 来源: 进程环境（main 中先通过 dotenvy 加载 .env）
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use std::time::Duration;

/// 环境变量键
pub mod env_keys {
    // 存储
    pub const DATABASE_PATH: &str = "DATABASE_PATH";
    pub const AUDIT_DATABASE_PATH: &str = "AUDIT_DATABASE_PATH";

    // 对象存储
    pub const AWS_BUCKET: &str = "AWS_BUCKET";
    pub const AWS_REGION: &str = "AWS_DEFAULT_REGION";
    pub const AWS_ENDPOINT: &str = "AWS_ENDPOINT";
    pub const AWS_USE_PATH_STYLE_ENDPOINT: &str = "AWS_USE_PATH_STYLE_ENDPOINT";

    // 导入
    pub const IMPORT_BATCH_SIZE: &str = "IMPORT_BATCH_SIZE";
    pub const IMPORT_TIMEOUT_MINUTES: &str = "IMPORT_TIMEOUT_MINUTES";
    pub const HTTP_TIMEOUT_SECONDS: &str = "HTTP_TIMEOUT_SECONDS";

    // 权限模型
    pub const SYSTEM_TEAM_ID: &str = "SYSTEM_TEAM_ID";
    pub const APP_TEAM_NAME: &str = "APP_TEAM_NAME";
}

pub const DEFAULT_DATABASE_PATH: &str = "debt_import.db";
pub const DEFAULT_AUDIT_DATABASE_PATH: &str = "debt_import_audit.db";
pub const DEFAULT_BUCKET: &str = "exports";
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 15;
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_SYSTEM_TEAM_ID: i64 = 1;
pub const DEFAULT_APP_TEAM_NAME: &str = "app";

/// 导入服务配置
#[derive(Debug, Clone, PartialEq)]
pub struct ImporterConfig {
    // ===== 存储 =====
    pub database_path: String,
    pub audit_database_path: String,

    // ===== 对象存储 =====
    /// 裸 key 解析时使用的默认 bucket（None 表示未配置）
    pub default_bucket: Option<String>,
    pub aws_region: Option<String>,
    pub aws_endpoint: Option<String>,
    pub aws_path_style: bool,

    // ===== 导入 =====
    pub batch_size: usize,
    pub timeout: Duration,
    pub http_timeout: Duration,

    // ===== 权限模型 =====
    /// 清理成员关系时受保护的系统团队
    pub system_team_id: i64,
    pub app_team_name: String,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            audit_database_path: DEFAULT_AUDIT_DATABASE_PATH.to_string(),
            default_bucket: Some(DEFAULT_BUCKET.to_string()),
            aws_region: None,
            aws_endpoint: None,
            aws_path_style: false,
            batch_size: DEFAULT_BATCH_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_MINUTES * 60),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS),
            system_team_id: DEFAULT_SYSTEM_TEAM_ID,
            app_team_name: DEFAULT_APP_TEAM_NAME.to_string(),
        }
    }
}

impl ImporterConfig {
    /// 从进程环境变量加载
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载（空字符串视为未设置）
    ///
    /// # 参数
    /// - lookup: 键 → 值
    ///
    /// # 返回
    /// - Ok(config): 已通过 validate 的配置
    /// - Err(ConfigError): 值格式错误或校验失败
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let config = Self {
            database_path: get(env_keys::DATABASE_PATH).unwrap_or(defaults.database_path),
            audit_database_path: get(env_keys::AUDIT_DATABASE_PATH)
                .unwrap_or(defaults.audit_database_path),
            default_bucket: get(env_keys::AWS_BUCKET).or(defaults.default_bucket),
            aws_region: get(env_keys::AWS_REGION),
            aws_endpoint: get(env_keys::AWS_ENDPOINT),
            aws_path_style: match get(env_keys::AWS_USE_PATH_STYLE_ENDPOINT) {
                Some(v) => parse_flag(env_keys::AWS_USE_PATH_STYLE_ENDPOINT, &v)?,
                None => defaults.aws_path_style,
            },
            batch_size: match get(env_keys::IMPORT_BATCH_SIZE) {
                Some(v) => parse_number(env_keys::IMPORT_BATCH_SIZE, &v)?,
                None => defaults.batch_size,
            },
            timeout: match get(env_keys::IMPORT_TIMEOUT_MINUTES) {
                Some(v) => Duration::from_secs(parse_number::<u64>(env_keys::IMPORT_TIMEOUT_MINUTES, &v)? * 60),
                None => defaults.timeout,
            },
            http_timeout: match get(env_keys::HTTP_TIMEOUT_SECONDS) {
                Some(v) => Duration::from_secs(parse_number(env_keys::HTTP_TIMEOUT_SECONDS, &v)?),
                None => defaults.http_timeout,
            },
            system_team_id: match get(env_keys::SYSTEM_TEAM_ID) {
                Some(v) => parse_number(env_keys::SYSTEM_TEAM_ID, &v)?,
                None => defaults.system_team_id,
            },
            app_team_name: get(env_keys::APP_TEAM_NAME).unwrap_or(defaults.app_team_name),
        };

        config.validate()?;
        Ok(config)
    }

    /// 校验配置取值
    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: env_keys::IMPORT_BATCH_SIZE.to_string(),
                value: "0".to_string(),
                message: "批大小必须大于 0".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: env_keys::IMPORT_TIMEOUT_MINUTES.to_string(),
                value: "0".to_string(),
                message: "导入超时必须大于 0".to_string(),
            });
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: env_keys::HTTP_TIMEOUT_SECONDS.to_string(),
                value: "0".to_string(),
                message: "HTTP 超时必须大于 0".to_string(),
            });
        }
        if self.app_team_name.is_empty() {
            return Err(ConfigError::Missing(env_keys::APP_TEAM_NAME.to_string()));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        message: e.to_string(),
    })
}

fn parse_flag(key: &str, value: &str) -> ConfigResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            message: "期望布尔值".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_empty() {
        let config = ImporterConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ImporterConfig::default());
        assert_eq!(config.default_bucket.as_deref(), Some("exports"));
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.timeout, Duration::from_secs(15 * 60));
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = ImporterConfig::from_lookup(lookup_from(&[
            ("AWS_BUCKET", "imports"),
            ("IMPORT_BATCH_SIZE", "250"),
            ("IMPORT_TIMEOUT_MINUTES", "2"),
            ("AWS_USE_PATH_STYLE_ENDPOINT", "true"),
            ("SYSTEM_TEAM_ID", "7"),
        ]))
        .unwrap();

        assert_eq!(config.default_bucket.as_deref(), Some("imports"));
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(config.aws_path_style);
        assert_eq!(config.system_team_id, 7);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config =
            ImporterConfig::from_lookup(lookup_from(&[("AWS_BUCKET", "  "), ("IMPORT_BATCH_SIZE", "")]))
                .unwrap();
        assert_eq!(config.default_bucket.as_deref(), Some("exports"));
        assert_eq!(config.batch_size, 1000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ImporterConfig::from_lookup(lookup_from(&[("IMPORT_BATCH_SIZE", "abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = ImporterConfig::from_lookup(lookup_from(&[("IMPORT_BATCH_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = ImporterConfig::from_lookup(lookup_from(&[("AWS_USE_PATH_STYLE_ENDPOINT", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
