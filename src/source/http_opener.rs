// ==========================================
// 债务导入服务 - HTTP 数据源
// ==========================================

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::domain::SourceMeta;
use crate::source::error::{OpenError, OpenResult};
use crate::source::opener_trait::{ByteStream, OpenedSource, SourceOpener};

/// 通过 GET 读取 http(s) 文件
pub struct HttpOpener {
    client: reqwest::Client,
}

impl HttpOpener {
    /// 按整体请求超时构造
    pub fn new(timeout: Duration) -> OpenResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceOpener for HttpOpener {
    #[instrument(skip(self))]
    async fn open(&self, locator: &str) -> OpenResult<OpenedSource> {
        let url = Url::parse(locator)
            .map_err(|e| OpenError::MalformedLocator(format!("{}: {}", locator, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(OpenError::MalformedLocator(locator.to_string()));
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "HTTP 数据源返回非 2xx");
            return Err(OpenError::HttpStatus {
                status: status.as_u16(),
                url: locator.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let size_bytes = response
            .content_length()
            .and_then(|n| i64::try_from(n).ok())
            .unwrap_or(-1);

        debug!(content_type = %content_type, size_bytes, "HTTP 数据源已打开");

        Ok(OpenedSource {
            stream: response_chunks(response),
            meta: SourceMeta::http(locator, content_type, size_bytes),
        })
    }
}

/// 响应体分块流
fn response_chunks(response: reqwest::Response) -> ByteStream {
    response
        .bytes_stream()
        .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(OpenError::from))
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_non_http_scheme() {
        let opener = HttpOpener::new(Duration::from_secs(5)).unwrap();
        let err = opener.open("ftp://files.local/a.csv").await.unwrap_err();
        assert!(matches!(err, OpenError::MalformedLocator(_)));
    }

    #[tokio::test]
    async fn test_rejects_unparseable_url() {
        let opener = HttpOpener::new(Duration::from_secs(5)).unwrap();
        let err = opener.open("http://").await.unwrap_err();
        assert!(matches!(err, OpenError::MalformedLocator(_)));
    }
}
