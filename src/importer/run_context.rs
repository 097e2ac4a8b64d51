// ==========================================
// 债务导入服务 - 单次运行上下文
// ==========================================
// 职责: 运行级关联 id、截止时间、解析缓存、行统计
// 红线: 每次运行新建，不跨运行共享
// ==========================================

use std::collections::HashMap;
use std::hash::Hash;
use tokio::time::Instant;

use crate::domain::AuditStatus;
use crate::repository::error::RepositoryResult;

// ==========================================
// ResolutionCache - 自然键 → 代理 id
// ==========================================
// 同时缓存命中与未命中（None）；查询出错不缓存
#[derive(Debug, Default)]
pub struct ResolutionCache {
    debts: HashMap<String, Option<String>>,
    users: HashMap<String, Option<i64>>,
    statuses: HashMap<String, Option<i64>>,
    agreement_types: HashMap<String, Option<i64>>,
    teams: HashMap<String, Option<i64>>,
    app_roles: HashMap<i64, Option<i64>>,
}

fn cached<K, V, F>(map: &mut HashMap<K, Option<V>>, key: K, lookup: F) -> RepositoryResult<Option<V>>
where
    K: Eq + Hash,
    V: Clone,
    F: FnOnce() -> RepositoryResult<Option<V>>,
{
    if let Some(hit) = map.get(&key) {
        return Ok(hit.clone());
    }
    let value = lookup()?;
    map.insert(key, value.clone());
    Ok(value)
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 债务号 → 债务 id
    pub fn debt_id<F>(&mut self, number: &str, lookup: F) -> RepositoryResult<Option<String>>
    where
        F: FnOnce() -> RepositoryResult<Option<String>>,
    {
        cached(&mut self.debts, number.to_string(), lookup)
    }

    /// 用户名 → 用户 id
    pub fn user_id<F>(&mut self, username: &str, lookup: F) -> RepositoryResult<Option<i64>>
    where
        F: FnOnce() -> RepositoryResult<Option<i64>>,
    {
        cached(&mut self.users, username.to_string(), lookup)
    }

    /// 状态简称 → 状态 id
    pub fn status_id<F>(&mut self, shortname: &str, lookup: F) -> RepositoryResult<Option<i64>>
    where
        F: FnOnce() -> RepositoryResult<Option<i64>>,
    {
        cached(&mut self.statuses, shortname.to_string(), lookup)
    }

    /// 协议类型名（不区分大小写）→ 类型 id
    pub fn agreement_type_id<F>(&mut self, name: &str, lookup: F) -> RepositoryResult<Option<i64>>
    where
        F: FnOnce() -> RepositoryResult<Option<i64>>,
    {
        cached(&mut self.agreement_types, name.trim().to_lowercase(), lookup)
    }

    /// 团队名 → 团队 id
    pub fn team_id<F>(&mut self, name: &str, lookup: F) -> RepositoryResult<Option<i64>>
    where
        F: FnOnce() -> RepositoryResult<Option<i64>>,
    {
        cached(&mut self.teams, name.to_string(), lookup)
    }

    /// 用户 id → app 团队内的角色 id
    pub fn app_role_id<F>(&mut self, user_id: i64, lookup: F) -> RepositoryResult<Option<i64>>
    where
        F: FnOnce() -> RepositoryResult<Option<i64>>,
    {
        cached(&mut self.app_roles, user_id, lookup)
    }

    /// 缓存条目总数（含未命中）
    pub fn len(&self) -> usize {
        self.debts.len()
            + self.users.len()
            + self.statuses.len()
            + self.agreement_types.len()
            + self.teams.len()
            + self.app_roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ==========================================
// RunStats - 行级结果统计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub done: usize,
    pub failed: usize,
    pub skipped: usize,
    /// 审计条目写入失败次数
    pub audit_errors: usize,
}

impl RunStats {
    pub fn record(&mut self, status: AuditStatus) {
        match status {
            AuditStatus::Done => self.done += 1,
            AuditStatus::Failed => self.failed += 1,
            AuditStatus::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.done + self.failed + self.skipped
    }
}

// ==========================================
// ImportRun
// ==========================================

/// 一次导入运行的上下文，按 `&mut` 传给处理器
#[derive(Debug)]
pub struct ImportRun {
    pub import_record_id: String,
    pub import_type: String,
    pub deadline: Option<Instant>,
    pub cache: ResolutionCache,
    pub stats: RunStats,
}

impl ImportRun {
    pub fn new(import_record_id: &str, import_type: &str) -> Self {
        Self {
            import_record_id: import_record_id.trim().to_string(),
            import_type: import_type.to_string(),
            deadline: None,
            cache: ResolutionCache::new(),
            stats: RunStats::default(),
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// 截止时间已过
    pub fn is_expired(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }
}
