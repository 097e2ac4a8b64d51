// ==========================================
// 债务导入服务 - 摘要分流
// ==========================================
// 读取源字节流的同时累计 SHA-256，整份内容缓冲在内存中
// 供格式回退时复用
// ==========================================

use futures::StreamExt;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::importer::error::{ImportError, ImporterResult};
use crate::source::ByteStream;

/// 边读边算摘要
#[derive(Default)]
pub struct DigestTee {
    hasher: Sha256,
    buffer: Vec<u8>,
}

impl DigestTee {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个块
    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.buffer.extend_from_slice(chunk);
    }

    /// 读空字节流
    ///
    /// 流中任一块出错则整体失败。
    pub async fn drain(&mut self, mut stream: ByteStream) -> ImporterResult<usize> {
        let mut chunks = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ImportError::SourceRead(e.to_string()))?;
            self.update(&chunk);
            chunks += 1;
        }
        debug!(chunks, bytes = self.buffer.len(), "源字节流读取完毕");
        Ok(self.buffer.len())
    }

    /// 已缓冲的全部字节
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// 结束并返回 (小写十六进制摘要, 缓冲内容)
    pub fn finish(self) -> (String, Vec<u8>) {
        (format!("{:x}", self.hasher.finalize()), self.buffer)
    }
}

/// 计算一段字节的 SHA-256（小写十六进制）
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
