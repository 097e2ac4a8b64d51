// ==========================================
// 债务导入服务 - 处理器注册表
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::processor_trait::Processor;

/// 导入类型 → 处理器
#[derive(Default, Clone)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册处理器（同名覆盖）
    pub fn register(&mut self, processor: Arc<dyn Processor>) -> &mut Self {
        self.processors
            .insert(processor.import_type().to_string(), processor);
        self
    }

    pub fn with(mut self, processor: Arc<dyn Processor>) -> Self {
        self.register(processor);
        self
    }

    /// 查找处理器，未注册为硬错误
    pub fn resolve(&self, import_type: &str) -> ImporterResult<Arc<dyn Processor>> {
        self.processors
            .get(import_type.trim())
            .cloned()
            .ok_or_else(|| ImportError::UnknownImportType(import_type.to_string()))
    }

    /// 已注册类型（排序后）
    pub fn import_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.processors.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}
