// ==========================================
// 导入管道集成测试
// ==========================================
// 测试目标: 数据源 → 摘要 → 格式回退 → 分批 → 处理器 → 审计 → 记录收尾
// ==========================================


use std::time::Duration;

use debt_import::audit::AuditLedger;
use debt_import::domain::{AuditStatus, ImportRecord, ImportRecordStatus, ImportRequest, TabularFormat};
use debt_import::importer::{sha256_hex, ImportError};
use test_helpers::{StubOpener, TestEnv};

const PAYMENTS_CSV: &str = "debt_number,username,payment_date,amount\n\
KZ-001,ivanov,2024-03-01,100\n\
KZ-404,ivanov,2024-03-01,200\n\
KZ-002,petrov,01.03.2024,\"1 500,50\"\n";

/// 生成 payments 工作簿: KZ-001 / 空行 / KZ-002，日期单元格为 dd.mm.yyyy
fn payments_workbook() -> Vec<u8> {
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let date_format = Format::new().set_num_format("dd.mm.yyyy");
    for (col, name) in ["debt_number", "username", "payment_date", "amount"].iter().enumerate() {
        sheet.write_string(0, col as u16, *name).unwrap();
    }
    for (row, number, user, day, amount) in [(1, "KZ-001", "ivanov", 1, 100.0), (3, "KZ-002", "petrov", 2, 1500.5)] {
        sheet.write_string(row, 0, number).unwrap();
        sheet.write_string(row, 1, user).unwrap();
        sheet
            .write_datetime_with_format(
                row,
                2,
                &ExcelDateTime::from_ymd(2024, 3, day).unwrap(),
                &date_format,
            )
            .unwrap();
        sheet.write_number(row, 3, amount).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

async fn create_record(env: &TestEnv, import_type: &str) -> String {
    let record = ImportRecord::parsed(import_type, Some("imports/payments.csv"));
    env.ledger.insert_record(&record).await.unwrap();
    record.id
}

#[tokio::test]
async fn test_csv_import_records_every_row_and_marks_done() {
    let env = TestEnv::new();
    let record_id = create_record(&env, "add_payments").await;
    let orchestrator = env.orchestrator(StubOpener::new(PAYMENTS_CSV.as_bytes(), "text/csv"));

    let result = orchestrator
        .import(ImportRequest::new("add_payments", "imports/payments.csv", &record_id))
        .await
        .unwrap();

    assert_eq!(result.format, TabularFormat::Csv);
    assert_eq!(result.rows_processed, 3);
    assert_eq!(result.sha256, sha256_hex(PAYMENTS_CSV.as_bytes()));
    assert_eq!(result.bucket.as_deref(), Some("exports"));

    let items = env.ledger.list_items(&record_id).await.unwrap();
    let statuses: Vec<AuditStatus> = items.iter().map(|i| i.status).collect();
    assert_eq!(
        statuses,
        vec![AuditStatus::Done, AuditStatus::Failed, AuditStatus::Done]
    );
    assert_eq!(items[1].errors, "debt not found: KZ-404");
    assert_eq!(env.count("SELECT COUNT(*) FROM payments"), 2);

    let record = env.ledger.find_record(&record_id).await.unwrap().unwrap();
    assert_eq!(record.status, ImportRecordStatus::Done);
}

#[tokio::test]
async fn test_blank_debt_number_row_fails_alone() {
    let env = TestEnv::new();
    let record_id = create_record(&env, "add_payments").await;
    let csv = "debt_number,username,payment_date,amount\n\
KZ-001,ivanov,2024-03-01,100\n\
,ivanov,2024-03-01,200\n\
KZ-002,petrov,2024-03-02,300\n";
    let orchestrator = env.orchestrator(StubOpener::new(csv.as_bytes(), "text/csv"));

    let result = orchestrator
        .import(ImportRequest::new("add_payments", "p.csv", &record_id))
        .await
        .unwrap();

    assert_eq!(result.rows_processed, 3);
    let items = env.ledger.list_items(&record_id).await.unwrap();
    let summary: Vec<(AuditStatus, &str)> =
        items.iter().map(|i| (i.status, i.errors.as_str())).collect();
    assert_eq!(
        summary,
        vec![
            (AuditStatus::Done, ""),
            (AuditStatus::Failed, "missing debt_number"),
            (AuditStatus::Done, ""),
        ]
    );
    assert_eq!(env.count("SELECT COUNT(*) FROM payments"), 2);
    let record = env.ledger.find_record(&record_id).await.unwrap().unwrap();
    assert_eq!(record.status, ImportRecordStatus::Done);
}

#[tokio::test]
async fn test_all_empty_row_gets_failed_item() {
    let env = TestEnv::new();
    let record_id = create_record(&env, "add_payments").await;
    let csv = "debt_number,username,payment_date,amount\n\
KZ-001,ivanov,2024-03-01,100\n\
,,,\n\
KZ-002,petrov,2024-03-02,300\n";
    let orchestrator = env.orchestrator(StubOpener::new(csv.as_bytes(), "text/csv"));

    let result = orchestrator
        .import(ImportRequest::new("add_payments", "p.csv", &record_id))
        .await
        .unwrap();

    assert_eq!(result.rows_processed, 3);
    let items = env.ledger.list_items(&record_id).await.unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[1].status, AuditStatus::Failed);
    assert_eq!(items[1].errors, "missing debt_number");
}

#[tokio::test]
async fn test_xlsx_import_reads_date_cells() {
    let env = TestEnv::new();
    let record_id = create_record(&env, "add_payments").await;
    let payload = payments_workbook();
    let orchestrator = env.orchestrator(StubOpener::new(&payload, "application/octet-stream"));

    let result = orchestrator
        .import(ImportRequest::new("add_payments", "imports/payments.xlsx", &record_id))
        .await
        .unwrap();

    assert_eq!(result.format, TabularFormat::Xlsx);
    assert_eq!(result.rows_processed, 3);
    assert_eq!(result.sha256, sha256_hex(&payload));
    let items = env.ledger.list_items(&record_id).await.unwrap();
    let statuses: Vec<AuditStatus> = items.iter().map(|i| i.status).collect();
    assert_eq!(
        statuses,
        vec![AuditStatus::Done, AuditStatus::Failed, AuditStatus::Done]
    );
    assert_eq!(items[1].errors, "missing debt_number");
    assert_eq!(
        env.count("SELECT COUNT(*) FROM payments WHERE payment_date IN ('2024-03-01', '2024-03-02')"),
        2
    );
    let record = env.ledger.find_record(&record_id).await.unwrap().unwrap();
    assert_eq!(record.status, ImportRecordStatus::Done);
}

#[tokio::test]
async fn test_batch_size_does_not_change_outcome() {
    let mut outcomes = Vec::new();
    for batch_size in [1, 2, 1000] {
        let env = TestEnv::new();
        let record_id = create_record(&env, "add_payments").await;
        let orchestrator = env.orchestrator(StubOpener::new(PAYMENTS_CSV.as_bytes(), "text/csv"));

        let result = orchestrator
            .import(
                ImportRequest::new("add_payments", "p.csv", &record_id).with_batch_size(batch_size),
            )
            .await
            .unwrap();
        assert_eq!(result.rows_processed, 3);

        let items = env.ledger.list_items(&record_id).await.unwrap();
        let summary: Vec<(AuditStatus, String)> =
            items.into_iter().map(|i| (i.status, i.errors)).collect();
        outcomes.push((summary, env.count("SELECT COUNT(*) FROM payments")));
    }

    assert_eq!(outcomes[0], outcomes[1]);
    assert_eq!(outcomes[1], outcomes[2]);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let env = TestEnv::new();
    let record_id = create_record(&env, "add_payments").await;

    for _ in 0..2 {
        let orchestrator = env.orchestrator(StubOpener::new(PAYMENTS_CSV.as_bytes(), "text/csv"));
        orchestrator
            .import(ImportRequest::new("add_payments", "p.csv", &record_id))
            .await
            .unwrap();
    }

    assert_eq!(env.count("SELECT COUNT(*) FROM payments"), 2);
    let items = env.ledger.list_items(&record_id).await.unwrap();
    assert_eq!(items.len(), 6);
}

#[tokio::test]
async fn test_misleading_extension_falls_back_to_csv() {
    let env = TestEnv::new();
    let record_id = create_record(&env, "noop").await;
    let orchestrator = env.orchestrator(StubOpener::new(b"a,b\n1,2\n3,4\n", "application/octet-stream"));

    let result = orchestrator
        .import(ImportRequest::new("noop", "imports/report.xlsx", &record_id))
        .await
        .unwrap();

    assert_eq!(result.format, TabularFormat::Csv);
    assert_eq!(result.rows_processed, 2);
    let items = env.ledger.list_items(&record_id).await.unwrap();
    assert!(items.iter().all(|i| i.status == AuditStatus::Skipped));
}

#[tokio::test]
async fn test_unknown_import_type_is_rejected() {
    let env = TestEnv::new();
    let record_id = create_record(&env, "import_cats").await;
    let orchestrator = env.orchestrator(StubOpener::new(b"a\n1\n", "text/csv"));

    let err = orchestrator
        .import(ImportRequest::new("import_cats", "cats.csv", &record_id))
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::UnknownImportType(ref t) if t == "import_cats"));
    assert_eq!(err.to_string(), "no processor for type: import_cats");
    let record = env.ledger.find_record(&record_id).await.unwrap().unwrap();
    assert_eq!(record.status, ImportRecordStatus::Parsed);
}

#[tokio::test]
async fn test_slow_source_times_out_and_leaves_record_parsed() {
    let env = TestEnv::new();
    let record_id = create_record(&env, "noop").await;
    let opener = StubOpener::new(b"a\n1\n", "text/csv").with_delay(Duration::from_millis(500));
    let orchestrator = env.orchestrator(opener);

    let err = orchestrator
        .import(
            ImportRequest::new("noop", "slow.csv", &record_id)
                .with_timeout(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Timeout { rows_processed: 0 }));
    assert!(env.ledger.list_items(&record_id).await.unwrap().is_empty());
    let record = env.ledger.find_record(&record_id).await.unwrap().unwrap();
    assert_eq!(record.status, ImportRecordStatus::Parsed);
}

#[tokio::test]
async fn test_header_only_source_processes_nothing() {
    let env = TestEnv::new();
    let record_id = create_record(&env, "add_payments").await;
    let orchestrator = env.orchestrator(StubOpener::new(
        b"debt_number,username,payment_date,amount\n",
        "text/csv",
    ));

    let result = orchestrator
        .import(ImportRequest::new("add_payments", "empty.csv", &record_id))
        .await
        .unwrap();

    assert_eq!(result.rows_processed, 0);
    let record = env.ledger.find_record(&record_id).await.unwrap().unwrap();
    assert_eq!(record.status, ImportRecordStatus::Done);
}
