// ==========================================
// HTTP 数据源集成测试
// ==========================================
// 测试目标: HttpOpener 经 CompoundOpener 分派、内容类型识别、非 2xx 处理
// ==========================================

use httpmock::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use debt_import::audit::{AuditLedger, MemoryAuditLedger};
use debt_import::domain::{AuditStatus, ImportRequest, SourceOrigin, TabularFormat};
use debt_import::importer::{sha256_hex, ImportError, ImportOrchestrator, ProcessorRegistry};
use debt_import::processors::NoopProcessor;
use debt_import::source::{CompoundOpener, HttpOpener, OpenError, SourceOpener};

fn orchestrator(ledger: Arc<MemoryAuditLedger>) -> ImportOrchestrator {
    let http = HttpOpener::new(Duration::from_secs(5)).unwrap();
    let opener: Arc<dyn SourceOpener> = Arc::new(CompoundOpener::new().with_http(Arc::new(http)));
    let registry = ProcessorRegistry::new().with(Arc::new(NoopProcessor::new(ledger.clone())));
    ImportOrchestrator::new(opener, registry, ledger)
}

#[tokio::test]
async fn test_http_csv_by_content_type() {
    let server = MockServer::start_async().await;
    let body = "name,amount\nA,1\nB,2\nC,3\n";
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/download");
            then.status(200)
                .header("content-type", "text/csv; charset=utf-8")
                .body(body);
        })
        .await;

    let ledger = Arc::new(MemoryAuditLedger::new());
    let result = orchestrator(ledger.clone())
        .import(ImportRequest::new("noop", &server.url("/download"), "rec-http"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.source, SourceOrigin::Http);
    assert_eq!(result.format, TabularFormat::Csv);
    assert_eq!(result.rows_processed, 3);
    assert_eq!(result.sha256, sha256_hex(body.as_bytes()));
    assert!(result.bucket.is_none());
    assert_eq!(ledger.count_status("rec-http", AuditStatus::Skipped), 3);
}

#[tokio::test]
async fn test_http_error_status_is_fatal() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/missing.csv");
            then.status(404);
        })
        .await;

    let ledger = Arc::new(MemoryAuditLedger::new());
    let err = orchestrator(ledger.clone())
        .import(ImportRequest::new("noop", &server.url("/missing.csv"), "rec-404"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ImportError::Open(OpenError::HttpStatus { status: 404, .. })
    ));
    assert!(ledger.list_items("rec-404").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_http_large_body_arrives_whole() {
    let server = MockServer::start_async().await;
    let mut body = String::from("debt_number\n");
    for i in 0..5000 {
        body.push_str(&format!("KZ-{:06}\n", i));
    }
    server
        .mock_async(|when, then| {
            when.method(GET).path("/big.csv");
            then.status(200).body(body.clone());
        })
        .await;

    let ledger = Arc::new(MemoryAuditLedger::new());
    let result = orchestrator(ledger.clone())
        .import(ImportRequest::new("noop", &server.url("/big.csv"), "rec-big"))
        .await
        .unwrap();

    assert_eq!(result.format, TabularFormat::Csv);
    assert_eq!(result.rows_processed, 5000);
    assert_eq!(result.sha256, sha256_hex(body.as_bytes()));
}
