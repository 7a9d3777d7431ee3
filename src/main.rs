// ==========================================
// 工程量计算引擎 - CLI 主入口
// ==========================================
// 职责: 解析命令行 → 调用 API → 以 JSON 输出结果 (stdout)
// 日志: 写入 stderr
// ==========================================

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use quantity_takeoff::app::{get_default_db_path, AppState};
use quantity_takeoff::config::ConfigScope;

/// Quantity takeoff (BOQ) and supply reconciliation for residential buildings.
#[derive(Parser, Debug)]
#[command(name = "quantity-takeoff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database path (default: $TAKEOFF_DB_PATH or the user data dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Compact JSON output
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database schema (idempotent)
    InitDb,

    /// Compute the BOQ for a project and store it as the latest snapshot
    Calculate {
        #[arg(short, long)]
        project: i64,
    },

    /// Show the latest stored BOQ snapshot
    BoqSnapshot {
        #[arg(short, long)]
        project: i64,
    },

    /// Upsert the supply ledger from a freshly computed BOQ
    SyncSupply {
        #[arg(short, long)]
        project: i64,
    },

    /// Recompute received quantities from delivered purchase-order lines
    SyncFromDelivery {
        #[arg(short, long)]
        project: i64,
    },

    /// Supply ledger with completion percentages
    SupplyStatus {
        #[arg(short, long)]
        project: i64,
    },

    /// Import floors from a .csv/.xlsx/.xls file
    ImportFloors {
        #[arg(short, long)]
        project: i64,
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Import delivered purchase-order lines from a .csv/.xlsx/.xls file
    ImportDeliveries {
        #[arg(short, long)]
        project: i64,
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Set a configuration value (global, or per project with --project)
    SetConfig {
        key: String,
        value: String,
        #[arg(short, long)]
        project: Option<i64>,
    },
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", json);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    quantity_takeoff::logging::init_with_level(if cli.verbose { "debug" } else { "info" });

    let db_path = cli
        .db
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(get_default_db_path);
    info!("{} v{} 使用数据库: {}", quantity_takeoff::APP_NAME, quantity_takeoff::VERSION, db_path);

    let state = AppState::new(db_path.clone())
        .with_context(|| format!("无法初始化数据库 {}", db_path))?;
    let api = &state.takeoff_api;

    match cli.command {
        Command::InitDb => {
            info!("数据库 schema 已就绪");
            print_json(&serde_json::json!({ "db_path": state.db_path }), cli.compact)
        }
        Command::Calculate { project } => print_json(&api.calculate(project)?, cli.compact),
        Command::BoqSnapshot { project } => {
            print_json(&api.latest_boq_snapshot(project)?, cli.compact)
        }
        Command::SyncSupply { project } => print_json(&api.sync_supply(project)?, cli.compact),
        Command::SyncFromDelivery { project } => {
            print_json(&api.sync_supply_from_delivery(project)?, cli.compact)
        }
        Command::SupplyStatus { project } => print_json(&api.supply_report(project)?, cli.compact),
        Command::ImportFloors { project, file } => {
            let summary = state
                .importer
                .import_floors(project, &file)
                .with_context(|| format!("楼层导入失败: {}", file.display()))?;
            print_json(&summary, cli.compact)
        }
        Command::ImportDeliveries { project, file } => {
            let summary = state
                .importer
                .import_deliveries(project, &file)
                .with_context(|| format!("到货数据导入失败: {}", file.display()))?;
            print_json(&summary, cli.compact)
        }
        Command::SetConfig {
            key,
            value,
            project,
        } => {
            let scope = match project {
                Some(project_id) => ConfigScope::Project { project_id },
                None => ConfigScope::Global,
            };
            state
                .config_manager
                .set_config_value(&scope, &key, &value)
                .map_err(|e| anyhow!("配置写入失败: {}", e))?;
            print_json(
                &serde_json::json!({ "scope": scope.scope_id(), "key": key, "value": value }),
                cli.compact,
            )
        }
    }
}
