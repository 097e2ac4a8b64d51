// ==========================================
// 债务导入服务 - 组合数据源（按前缀分派）
// ==========================================
// http:// / https:// → HTTP 数据源
// 其余（s3:// 与裸 key）→ 对象存储数据源
// ==========================================

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::source::error::{OpenError, OpenResult};
use crate::source::opener_trait::{OpenedSource, SourceOpener};
use crate::source::s3_opener::S3_SCHEME;

#[derive(Default, Clone)]
pub struct CompoundOpener {
    http: Option<Arc<dyn SourceOpener>>,
    object_store: Option<Arc<dyn SourceOpener>>,
}

impl CompoundOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http(mut self, opener: Arc<dyn SourceOpener>) -> Self {
        self.http = Some(opener);
        self
    }

    pub fn with_object_store(mut self, opener: Arc<dyn SourceOpener>) -> Self {
        self.object_store = Some(opener);
        self
    }
}

/// 定位串是否为 http(s)
pub fn is_http_locator(locator: &str) -> bool {
    let lower = locator.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[async_trait]
impl SourceOpener for CompoundOpener {
    async fn open(&self, locator: &str) -> OpenResult<OpenedSource> {
        let locator = locator.trim();

        if is_http_locator(locator) {
            debug!(locator, "dispatch → http");
            let opener = self.http.as_ref().ok_or(OpenError::NotConfigured("http"))?;
            return opener.open(locator).await;
        }

        match &self.object_store {
            Some(opener) => {
                debug!(locator, "dispatch → object store");
                opener.open(locator).await
            }
            None if locator.starts_with(S3_SCHEME) => Err(OpenError::NotConfigured("s3")),
            None => Err(OpenError::MissingBucket(locator.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceMeta;
    use futures::StreamExt;
    use std::sync::Mutex;

    /// 记录被调用的定位串
    struct RecordingOpener {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SourceOpener for RecordingOpener {
        async fn open(&self, locator: &str) -> OpenResult<OpenedSource> {
            self.calls.lock().unwrap().push(locator.to_string());
            Ok(OpenedSource {
                stream: futures::stream::empty().boxed(),
                meta: SourceMeta::http(locator, String::new(), -1),
            })
        }
    }

    fn recording() -> Arc<RecordingOpener> {
        Arc::new(RecordingOpener {
            calls: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_dispatch_by_prefix() {
        let http = recording();
        let store = recording();
        let opener = CompoundOpener::new()
            .with_http(http.clone())
            .with_object_store(store.clone());

        opener.open(" https://files.local/a.csv ").await.unwrap();
        opener.open("s3://exports/a.csv").await.unwrap();
        opener.open("imports/b.xlsx").await.unwrap();

        assert_eq!(*http.calls.lock().unwrap(), vec!["https://files.local/a.csv"]);
        assert_eq!(
            *store.calls.lock().unwrap(),
            vec!["s3://exports/a.csv", "imports/b.xlsx"]
        );
    }

    #[tokio::test]
    async fn test_missing_strategies() {
        let opener = CompoundOpener::new();
        assert!(matches!(
            opener.open("http://files.local/a.csv").await.unwrap_err(),
            OpenError::NotConfigured("http")
        ));
        assert!(matches!(
            opener.open("s3://exports/a.csv").await.unwrap_err(),
            OpenError::NotConfigured("s3")
        ));
        assert!(matches!(
            opener.open("a.csv").await.unwrap_err(),
            OpenError::MissingBucket(_)
        ));
    }
}
