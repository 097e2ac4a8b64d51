// ==========================================
// 债务导入服务 - 对象存储数据源
// ==========================================
// 职责: s3://bucket/key 与裸 key（默认 bucket）解析
//       先 stat 取元信息，再 get 取字节流
// ==========================================

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::SourceMeta;
use crate::source::error::{OpenError, OpenResult};
use crate::source::opener_trait::{ByteStream, OpenedSource, SourceOpener};

pub const S3_SCHEME: &str = "s3://";

/// 对象元信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStat {
    pub content_type: String,
    /// -1 表示未知
    pub size_bytes: i64,
}

// ==========================================
// ObjectStore Trait
// ==========================================
// 实现者: AwsObjectStore（aws-sdk-s3）、测试中的内存实现
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn stat(&self, bucket: &str, key: &str) -> OpenResult<ObjectStat>;

    async fn get(&self, bucket: &str, key: &str) -> OpenResult<ByteStream>;
}

/// 对象存储数据源
pub struct S3Opener {
    store: Arc<dyn ObjectStore>,
    default_bucket: Option<String>,
}

impl S3Opener {
    pub fn new(store: Arc<dyn ObjectStore>, default_bucket: Option<String>) -> Self {
        let default_bucket = default_bucket
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());
        Self {
            store,
            default_bucket,
        }
    }

    /// 打开指定 bucket/key
    #[instrument(skip(self))]
    pub async fn open_object(&self, bucket: &str, key: &str) -> OpenResult<OpenedSource> {
        let stat = self.store.stat(bucket, key).await?;
        let stream = self.store.get(bucket, key).await?;

        debug!(
            content_type = %stat.content_type,
            size_bytes = stat.size_bytes,
            "对象已打开"
        );

        Ok(OpenedSource {
            stream,
            meta: SourceMeta::s3(bucket, key, stat.content_type, stat.size_bytes),
        })
    }

    /// 把定位串解析为 (bucket, key)
    pub fn resolve(&self, locator: &str) -> OpenResult<(String, String)> {
        let locator = locator.trim();
        if locator.starts_with(S3_SCHEME) {
            return parse_s3_locator(locator);
        }

        let bucket = self
            .default_bucket
            .clone()
            .ok_or_else(|| OpenError::MissingBucket(locator.to_string()))?;
        let key = clean_key(locator);
        if key.is_empty() || key == "." || key == "/" {
            return Err(OpenError::MalformedLocator(format!("empty key: {}", locator)));
        }
        Ok((bucket, key))
    }
}

#[async_trait]
impl SourceOpener for S3Opener {
    async fn open(&self, locator: &str) -> OpenResult<OpenedSource> {
        let (bucket, key) = self.resolve(locator)?;
        self.open_object(&bucket, &key).await
    }
}

/// 解析 `s3://bucket/key`
///
/// key 经过路径规整；bucket 或 key 为空、key 为 "." 或 "/" 时报错。
pub fn parse_s3_locator(locator: &str) -> OpenResult<(String, String)> {
    let rest = locator
        .trim()
        .strip_prefix(S3_SCHEME)
        .ok_or_else(|| OpenError::MalformedLocator(format!("scheme must be s3: {}", locator)))?;

    let (bucket, raw_key) = rest.split_once('/').unwrap_or((rest, ""));
    let key = clean_key(raw_key);

    if bucket.is_empty() || key.is_empty() || key == "." || key == "/" {
        return Err(OpenError::MalformedLocator(format!(
            "empty bucket or key: {}",
            locator
        )));
    }
    Ok((bucket.to_string(), key))
}

/// 规整对象 key：去掉前导斜杠、重复斜杠和 "." 段，折叠 ".." 段
pub fn clean_key(raw: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in raw.trim().split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().map(|p| *p != "..").unwrap_or(false) {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
