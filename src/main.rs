// ==========================================
// 债务导入服务 - 命令行入口
// ==========================================
// 子命令:
// - run:     执行一次导入，结果以 JSON 输出到 stdout
// - init-db: 初始化关系库与审计库 schema
// - types:   列出已注册的导入类型
// 配置: 环境变量（启动时先加载 .env）
// ==========================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use debt_import::audit::{AuditLedger, SqliteAuditLedger};
use debt_import::config::ImporterConfig;
use debt_import::db::{bootstrap_audit_schema, bootstrap_schema, open_shared_connection, open_sqlite_connection};
use debt_import::domain::{ImportRecord, ImportRequest};
use debt_import::importer::ImportOrchestrator;
use debt_import::processors::{default_registry, DistributionSettings, Stores};
use debt_import::source::{CompoundOpener, HttpOpener};
use debt_import::{logging, APP_NAME, VERSION};

#[derive(Parser, Debug)]
#[command(name = "debt-import", version, about = "债务数据批量导入")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 执行一次导入
    Run {
        /// 导入类型（处理器注册键）
        #[arg(long = "type")]
        import_type: String,

        /// 数据源: http(s) URL、s3://bucket/key 或裸 key
        #[arg(long)]
        file: String,

        /// 关联的导入记录 id
        #[arg(long)]
        record_id: Option<String>,

        /// 先新建一条 parsed 状态的导入记录
        #[arg(long, default_value_t = false)]
        create_record: bool,

        /// 批大小（缺省取 IMPORT_BATCH_SIZE）
        #[arg(long)]
        batch_size: Option<usize>,

        /// 超时秒数（缺省取 IMPORT_TIMEOUT_MINUTES）
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// 初始化数据库 schema
    InitDb,

    /// 列出导入类型
    Types,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();
    let config = ImporterConfig::from_env().context("加载配置失败")?;

    tracing::info!(version = VERSION, "{} 启动", APP_NAME);

    match cli.command {
        Command::InitDb => init_db(&config),
        Command::Types => {
            let registry = build_registry(&config)?;
            for import_type in registry.import_types() {
                println!("{}", import_type);
            }
            Ok(())
        }
        Command::Run {
            import_type,
            file,
            record_id,
            create_record,
            batch_size,
            timeout_secs,
        } => {
            run_import(
                &config,
                RunArgs {
                    import_type,
                    file,
                    record_id,
                    create_record,
                    batch_size,
                    timeout_secs,
                },
            )
            .await
        }
    }
}

struct RunArgs {
    import_type: String,
    file: String,
    record_id: Option<String>,
    create_record: bool,
    batch_size: Option<usize>,
    timeout_secs: Option<u64>,
}

fn init_db(config: &ImporterConfig) -> Result<()> {
    let conn = open_sqlite_connection(&config.database_path)
        .with_context(|| format!("打开数据库失败: {}", config.database_path))?;
    bootstrap_schema(&conn).context("初始化关系库失败")?;

    let audit = open_sqlite_connection(&config.audit_database_path)
        .with_context(|| format!("打开审计库失败: {}", config.audit_database_path))?;
    bootstrap_audit_schema(&audit).context("初始化审计库失败")?;

    tracing::info!(
        database = %config.database_path,
        audit_database = %config.audit_database_path,
        "schema 初始化完成"
    );
    Ok(())
}

fn build_registry_with(
    config: &ImporterConfig,
    ledger: Arc<dyn AuditLedger>,
) -> Result<debt_import::ProcessorRegistry> {
    let conn = open_shared_connection(&config.database_path)
        .with_context(|| format!("打开数据库失败: {}", config.database_path))?;
    let stores = Arc::new(Stores::from_connection(conn));
    let settings = DistributionSettings {
        app_team_name: config.app_team_name.clone(),
        system_team_id: config.system_team_id,
    };
    Ok(default_registry(stores, ledger, settings))
}

fn build_registry(config: &ImporterConfig) -> Result<debt_import::ProcessorRegistry> {
    let ledger = open_ledger(config)?;
    build_registry_with(config, ledger)
}

fn open_ledger(config: &ImporterConfig) -> Result<Arc<dyn AuditLedger>> {
    let ledger = SqliteAuditLedger::new(&config.audit_database_path)
        .with_context(|| format!("打开审计库失败: {}", config.audit_database_path))?;
    Ok(Arc::new(ledger))
}

async fn build_opener(config: &ImporterConfig) -> Result<CompoundOpener> {
    let http = HttpOpener::new(config.http_timeout).context("初始化 HTTP 客户端失败")?;
    let opener = CompoundOpener::new().with_http(Arc::new(http));

    #[cfg(feature = "s3")]
    let opener = {
        use debt_import::source::{AwsObjectStore, S3Opener};
        let store = AwsObjectStore::from_config(config).await;
        opener.with_object_store(Arc::new(S3Opener::new(
            Arc::new(store),
            config.default_bucket.clone(),
        )))
    };

    Ok(opener)
}

async fn run_import(config: &ImporterConfig, args: RunArgs) -> Result<()> {
    let ledger = open_ledger(config)?;
    let registry = build_registry_with(config, ledger.clone())?;
    let opener = build_opener(config).await?;

    let record_id = if args.create_record {
        let record = ImportRecord::parsed(&args.import_type, Some(args.file.as_str()));
        ledger
            .insert_record(&record)
            .await
            .context("新建导入记录失败")?;
        tracing::info!(record_id = %record.id, "导入记录已创建");
        record.id
    } else {
        args.record_id.unwrap_or_default()
    };

    let request = ImportRequest::new(&args.import_type, &args.file, &record_id)
        .with_batch_size(args.batch_size.unwrap_or(config.batch_size))
        .with_timeout(
            args.timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(config.timeout),
        );

    let orchestrator = ImportOrchestrator::new(Arc::new(opener), registry, ledger)
        .with_default_batch_size(config.batch_size);

    let result = orchestrator.import(request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
