// ==========================================
// 债务导入服务 - 配置层
// ==========================================
// 职责: 环境变量 → ImporterConfig（默认值 + 校验）
// ==========================================

pub mod error;
pub mod importer_config;

pub use error::{ConfigError, ConfigResult};
pub use importer_config::{env_keys, ImporterConfig};
