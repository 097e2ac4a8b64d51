// ==========================================
// 债务导入服务 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 关系库的参数化查询与 upsert, 屏蔽 SQL 细节
// 约束: 同步 rusqlite 调用，连接以 Arc<Mutex<Connection>> 共享
// ==========================================

pub mod collection_repo;
pub mod debt_repo;
pub mod debtor_repo;
pub mod error;
pub mod legal_repo;
pub mod lookup_repo;
pub mod team_repo;
pub mod user_repo;

// 重导出核心仓储
pub use collection_repo::CollectionRepository;
pub use debt_repo::DebtRepository;
pub use debtor_repo::DebtorRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use legal_repo::LegalRepository;
pub use lookup_repo::LookupRepository;
pub use team_repo::{debt_team_name, TeamRepository, DEBT_TEAM_PREFIX};
pub use user_repo::UserRepository;
