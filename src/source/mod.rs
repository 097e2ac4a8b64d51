// ==========================================
// 债务导入服务 - 数据源层
// ==========================================
// 职责: 定位串 → 字节流 + 元信息
// 策略: HTTP / 对象存储，经 CompoundOpener 按前缀分派
// ==========================================

#[cfg(feature = "s3")]
pub mod aws_store;
pub mod compound_opener;
pub mod error;
pub mod http_opener;
pub mod opener_trait;
pub mod s3_opener;

#[cfg(feature = "s3")]
pub use aws_store::AwsObjectStore;
pub use compound_opener::{is_http_locator, CompoundOpener};
pub use error::{OpenError, OpenResult};
pub use http_opener::HttpOpener;
pub use opener_trait::{ByteStream, OpenedSource, SourceOpener};
pub use s3_opener::{clean_key, parse_s3_locator, ObjectStat, ObjectStore, S3Opener};
