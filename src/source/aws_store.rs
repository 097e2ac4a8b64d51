// ==========================================
// 债务导入服务 - aws-sdk-s3 对象存储实现
// ==========================================
// 兼容 MinIO 等 S3 协议端点（endpoint + path-style）
// ==========================================

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use futures::StreamExt;
use tracing::info;

use crate::config::ImporterConfig;
use crate::source::error::{OpenError, OpenResult};
use crate::source::opener_trait::ByteStream;
use crate::source::s3_opener::{ObjectStat, ObjectStore};

pub struct AwsObjectStore {
    client: aws_sdk_s3::Client,
}

impl AwsObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// 按导入配置构造客户端（凭证走 SDK 默认链）
    pub async fn from_config(config: &ImporterConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.aws_region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.aws_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.aws_path_style)
            .build();

        info!(
            endpoint = config.aws_endpoint.as_deref().unwrap_or("default"),
            path_style = config.aws_path_style,
            "S3 客户端已初始化"
        );

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
        }
    }
}

#[async_trait]
impl ObjectStore for AwsObjectStore {
    async fn stat(&self, bucket: &str, key: &str) -> OpenResult<ObjectStat> {
        let output = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    OpenError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    OpenError::Transport(format!("s3 stat: {}", DisplayErrorContext(&service_err)))
                }
            })?;

        Ok(ObjectStat {
            content_type: output.content_type().unwrap_or("").to_string(),
            size_bytes: output.content_length().unwrap_or(-1),
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> OpenResult<ByteStream> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| OpenError::Transport(format!("s3 get: {}", DisplayErrorContext(&err))))?;

        let stream = futures::stream::unfold(Some(output.body), |state| async move {
            let mut body = state?;
            match body.next().await {
                Some(Ok(bytes)) => Some((Ok(bytes.to_vec()), Some(body))),
                Some(Err(e)) => Some((Err(OpenError::Transport(format!("s3 read: {}", e))), None)),
                None => None,
            }
        })
        .boxed();

        Ok(stream)
    }
}
