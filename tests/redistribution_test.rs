// ==========================================
// 债务重新分配集成测试
// ==========================================
// 测试目标: distribution_debts 经编排器运行时的归属与访问组收敛
// ==========================================


use debt_import::audit::AuditLedger;
use debt_import::domain::{AuditStatus, ImportRecord, ImportRequest};
use debt_import::importer::ImportError;
use test_helpers::{StubOpener, TestEnv};

#[tokio::test]
async fn test_user_without_app_role_is_failed_without_writes() {
    let env = TestEnv::new();
    let record = ImportRecord::parsed("distribution_debts", None);
    env.ledger.insert_record(&record).await.unwrap();
    let csv = "debt_number,debt_username\nKZ-001,petrov\n";
    let orchestrator = env.orchestrator(StubOpener::new(csv.as_bytes(), "text/csv"));

    orchestrator
        .import(ImportRequest::new("distribution_debts", "dist.csv", &record.id))
        .await
        .unwrap();

    let items = env.ledger.list_items(&record.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, AuditStatus::Failed);
    assert_eq!(items[0].errors, "user has no role in app team");
    assert_eq!(env.count("SELECT COUNT(*) FROM debts WHERE user_id IS NOT NULL"), 0);
    assert_eq!(env.count("SELECT COUNT(*) FROM teams"), 2);
}

#[tokio::test]
async fn test_reassignment_replaces_stale_memberships() {
    let env = TestEnv::new();
    env.conn
        .lock()
        .unwrap()
        .execute_batch(
            r#"
            UPDATE debts SET user_id = 8 WHERE id = 'd-2';
            INSERT INTO teams (id, name) VALUES (30, 'debt/d-2');
            INSERT INTO role_user (user_id, role_id, user_type, team_id) VALUES (8, 5, 'x', 30);
            INSERT INTO role_user (user_id, role_id, user_type, team_id) VALUES (8, 5, 'x', 1);
            "#,
        )
        .unwrap();
    let csv = "debt_number,debt_username\nKZ-001,ivanov\nKZ-002,ivanov\n";
    let orchestrator = env.orchestrator(StubOpener::new(csv.as_bytes(), "text/csv"));

    orchestrator
        .import(ImportRequest::new("distribution_debts", "dist.csv", "").with_batch_size(1))
        .await
        .unwrap();

    assert_eq!(env.count("SELECT COUNT(*) FROM debts WHERE user_id = 7"), 2);
    assert_eq!(
        env.count("SELECT COUNT(*) FROM role_user WHERE team_id = 30 AND user_id = 7 AND role_id = 5"),
        1
    );
    assert_eq!(env.count("SELECT COUNT(*) FROM role_user WHERE team_id = 30"), 1);
    assert_eq!(env.count("SELECT COUNT(*) FROM teams WHERE name = 'debt/d-1'"), 1);
    // 系统团队成员关系保留
    assert_eq!(env.count("SELECT COUNT(*) FROM role_user WHERE team_id = 1"), 1);
}

#[tokio::test]
async fn test_missing_app_team_aborts_run() {
    let env = TestEnv::new();
    env.conn
        .lock()
        .unwrap()
        .execute_batch("DELETE FROM role_user; DELETE FROM teams WHERE name = 'app';")
        .unwrap();
    let record = ImportRecord::parsed("distribution_debts", None);
    env.ledger.insert_record(&record).await.unwrap();
    let csv = "debt_number,debt_username\nKZ-001,ivanov\n";
    let orchestrator = env.orchestrator(StubOpener::new(csv.as_bytes(), "text/csv"));

    let err = orchestrator
        .import(ImportRequest::new("distribution_debts", "dist.csv", &record.id))
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Processor(_)));
    assert!(err.to_string().contains("app team not found: app"));
    assert!(env.ledger.list_items(&record.id).await.unwrap().is_empty());
}
