// ==========================================
// 债务导入服务 - 处理器共享的仓储集合
// ==========================================
// 职责: 一个连接句柄上的全部仓储 + 经运行缓存的自然键解析
// ==========================================

use crate::db::SharedConnection;
use crate::importer::run_context::ResolutionCache;
use crate::repository::{
    CollectionRepository, DebtRepository, DebtorRepository, LegalRepository, LookupRepository,
    RepositoryResult, TeamRepository, UserRepository,
};

/// 进程级共享，可跨运行复用；缓存不在这里
pub struct Stores {
    pub lookup: LookupRepository,
    pub debtors: DebtorRepository,
    pub debts: DebtRepository,
    pub collection: CollectionRepository,
    pub legal: LegalRepository,
    pub users: UserRepository,
    pub teams: TeamRepository,
}

impl Stores {
    pub fn from_connection(conn: SharedConnection) -> Self {
        Self {
            lookup: LookupRepository::from_connection(conn.clone()),
            debtors: DebtorRepository::from_connection(conn.clone()),
            debts: DebtRepository::from_connection(conn.clone()),
            collection: CollectionRepository::from_connection(conn.clone()),
            legal: LegalRepository::from_connection(conn.clone()),
            users: UserRepository::from_connection(conn.clone()),
            teams: TeamRepository::from_connection(conn),
        }
    }

    // ===== 经缓存的解析 =====

    pub fn debt_id(&self, cache: &mut ResolutionCache, number: &str) -> RepositoryResult<Option<String>> {
        cache.debt_id(number, || self.lookup.find_debt_id(number))
    }

    pub fn user_id(&self, cache: &mut ResolutionCache, username: &str) -> RepositoryResult<Option<i64>> {
        cache.user_id(username, || self.lookup.find_user_id(username))
    }

    pub fn status_id(&self, cache: &mut ResolutionCache, shortname: &str) -> RepositoryResult<Option<i64>> {
        cache.status_id(shortname, || self.lookup.find_status_id(shortname))
    }

    /// 协议类型总能解析出 id（不存在即创建）
    pub fn agreement_type_id(&self, cache: &mut ResolutionCache, name: &str) -> RepositoryResult<Option<i64>> {
        cache.agreement_type_id(name, || self.lookup.get_or_create_agreement_type(name).map(Some))
    }

    pub fn team_id(&self, cache: &mut ResolutionCache, name: &str) -> RepositoryResult<Option<i64>> {
        cache.team_id(name, || self.lookup.find_team_id(name))
    }

    /// 可选用户: 空或未找到 → None 并追加警告
    pub fn optional_user_id(
        &self,
        cache: &mut ResolutionCache,
        username: &str,
        warnings: &mut Vec<String>,
    ) -> Option<i64> {
        if username.is_empty() {
            warnings.push("missing username -> user_id=NULL".to_string());
            return None;
        }
        match self.user_id(cache, username) {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                warnings.push(format!("username not found: {} -> user_id=NULL", username));
                None
            }
            Err(e) => {
                warnings.push(format!("user lookup error: {} -> user_id=NULL", e));
                None
            }
        }
    }

    pub fn app_role_id(
        &self,
        cache: &mut ResolutionCache,
        user_id: i64,
        app_team_id: i64,
    ) -> RepositoryResult<Option<i64>> {
        cache.app_role_id(user_id, || self.lookup.find_role_in_team(user_id, app_team_id))
    }
}
