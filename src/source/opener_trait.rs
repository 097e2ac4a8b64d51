// ==========================================
// 债务导入服务 - 数据源打开接口
// ==========================================
// 职责: 定位串 → 字节流 + 元信息
// 实现者: HttpOpener / S3Opener / CompoundOpener
// ==========================================

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::SourceMeta;
use crate::source::error::OpenResult;

/// 按块读取的源字节流
pub type ByteStream = BoxStream<'static, OpenResult<Vec<u8>>>;

/// 已打开的数据源
pub struct OpenedSource {
    pub stream: ByteStream,
    pub meta: SourceMeta,
}

impl std::fmt::Debug for OpenedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedSource")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

// ==========================================
// SourceOpener Trait
// ==========================================
#[async_trait]
pub trait SourceOpener: Send + Sync {
    /// 打开数据源
    ///
    /// # 参数
    /// - locator: http(s) URL、`s3://bucket/key` 或裸 key
    ///
    /// # 返回
    /// - Ok(OpenedSource): 字节流与元信息
    /// - Err(OpenError): 定位串非法 / 传输失败 / 对象不存在
    async fn open(&self, locator: &str) -> OpenResult<OpenedSource>;
}
