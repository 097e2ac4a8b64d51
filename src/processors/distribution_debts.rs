// ==========================================
// 债务导入服务 - 债务重新分配
// ==========================================
// 职责: 把债务归给指定用户，并把访问组 `debt/<债务 id>` 的成员关系
//       收敛为 (该用户, 其在 app 团队中的角色)
// 红线: app 团队缺失是批次级错误; 受保护的系统团队成员关系永不删除
// ==========================================

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::audit::AuditLedger;
use crate::domain::{ModelType, Row};
use crate::importer::processor_trait::Processor;
use crate::importer::run_context::ImportRun;
use crate::processors::error::{ProcessorError, ProcessorResult};
use crate::processors::row_pipeline::{drive_rows, RowHandler, RowOutcome};
use crate::processors::stores::Stores;
use crate::repository::{debt_team_name, DEBT_TEAM_PREFIX};

pub const IMPORT_TYPE: &str = "distribution_debts";

pub const EXPECTED_COLUMNS: &[&str] = &["debt_number", "debt_username"];

/// 重新分配所需的团队配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionSettings {
    /// 提供用户角色的团队名
    pub app_team_name: String,
    /// 其成员关系永不删除的系统团队 id
    pub system_team_id: i64,
}

impl Default for DistributionSettings {
    fn default() -> Self {
        Self {
            app_team_name: "app".to_string(),
            system_team_id: 1,
        }
    }
}

pub struct DistributionDebtsProcessor {
    stores: Arc<Stores>,
    ledger: Arc<dyn AuditLedger>,
    settings: DistributionSettings,
}

impl DistributionDebtsProcessor {
    pub fn new(
        stores: Arc<Stores>,
        ledger: Arc<dyn AuditLedger>,
        settings: DistributionSettings,
    ) -> Self {
        Self {
            stores,
            ledger,
            settings,
        }
    }

    /// app 团队 id（经运行缓存）
    fn app_team_id(&self, run: &mut ImportRun) -> ProcessorResult<i64> {
        let name = &self.settings.app_team_name;
        match self.stores.team_id(&mut run.cache, name) {
            Ok(Some(id)) => Ok(id),
            Ok(None) => Err(ProcessorError::MissingDependency(format!(
                "app team not found: {}",
                name
            ))),
            Err(e) => Err(ProcessorError::BatchLookup(format!("lookup app team failed: {}", e))),
        }
    }

    /// 归属更新 + 访问组成员收敛；任一步失败返回该步的原因
    fn reassign(&self, debt_id: &str, user_id: i64, role_id: i64) -> Result<(), String> {
        let changed = self
            .stores
            .debts
            .assign_owner_if_different(debt_id, user_id)
            .map_err(|e| format!("update debts: {}", e))?;

        let group_name = debt_team_name(debt_id);
        self.stores
            .teams
            .ensure_team(&group_name)
            .map_err(|e| format!("ensure team: {}", e))?;

        let (team_id, team_name) = self
            .stores
            .teams
            .find_team(&group_name)
            .map_err(|e| format!("select team_id: {}", e))?
            .ok_or_else(|| format!("select team_id: team {} missing", group_name))?;
        if !team_name.starts_with(DEBT_TEAM_PREFIX) {
            return Err(format!("team name not debt/*: {}", team_name));
        }

        let removed = self
            .stores
            .teams
            .delete_stale_memberships(team_id, debt_id, role_id, self.settings.system_team_id)
            .map_err(|e| format!("delete wrong role_user: {}", e))?;

        let inserted = self
            .stores
            .teams
            .insert_membership_if_absent(user_id, role_id, team_id, ModelType::User.class_name())
            .map_err(|e| format!("insert correct role_user: {}", e))?;

        debug!(debt_id, user_id, role_id, changed, removed, inserted, "访问组已收敛");
        Ok(())
    }
}

impl RowHandler for DistributionDebtsProcessor {
    fn model_type(&self) -> ModelType {
        ModelType::Debt
    }

    fn begin_batch(&self, run: &mut ImportRun) -> ProcessorResult<()> {
        self.app_team_id(run).map(|_| ())
    }

    fn handle_row(&self, run: &mut ImportRun, row: &Row) -> ProcessorResult<RowOutcome> {
        let debt_number = row.get("debt_number");
        if debt_number.is_empty() {
            return Ok(RowOutcome::failed("missing debt_number"));
        }
        let username = row.get("debt_username");
        if username.is_empty() {
            return Ok(RowOutcome::failed("missing username"));
        }

        let debt_id = match self.stores.debt_id(&mut run.cache, debt_number) {
            Ok(Some(id)) => id,
            Ok(None) => return Ok(RowOutcome::failed(format!("debt not found: {}", debt_number))),
            Err(e) => return Ok(RowOutcome::failed(format!("debt lookup error: {}", e))),
        };
        let user_id = match self.stores.user_id(&mut run.cache, username) {
            Ok(Some(id)) => id,
            Ok(None) => return Ok(RowOutcome::failed(format!("username not found: {}", username))),
            Err(e) => return Ok(RowOutcome::failed(format!("user lookup error: {}", e))),
        };

        let app_team_id = self.app_team_id(run)?;
        let role_id = match self.stores.app_role_id(&mut run.cache, user_id, app_team_id) {
            Ok(Some(id)) => id,
            Ok(None) => {
                return Ok(RowOutcome::Failed {
                    model_id: Some(debt_id),
                    reason: "user has no role in app team".to_string(),
                })
            }
            Err(e) => {
                return Ok(RowOutcome::Failed {
                    model_id: Some(debt_id),
                    reason: format!("lookup app role failed: {}", e),
                })
            }
        };

        match self.reassign(&debt_id, user_id, role_id) {
            Ok(()) => Ok(RowOutcome::done(debt_id)),
            Err(reason) => Ok(RowOutcome::Failed {
                model_id: Some(debt_id),
                reason,
            }),
        }
    }
}

#[async_trait]
impl Processor for DistributionDebtsProcessor {
    fn import_type(&self) -> &'static str {
        IMPORT_TYPE
    }

    fn expected_columns(&self) -> &'static [&'static str] {
        EXPECTED_COLUMNS
    }

    async fn process_batch(&self, run: &mut ImportRun, batch: &[Row]) -> ProcessorResult<()> {
        drive_rows(self, self.ledger.as_ref(), run, batch).await
    }
}
