// ==========================================
// 模型铁路调车场交换系统 - 命令行入口
// ==========================================
// 用法:
//   railyard-exchange [--db PATH] [--json] [--log-json] <命令>
//   exchange <yard> <count|all> [--seed N]
//   off-layout <yard> <count|all> [--seed N]
//   import-spots <csv>
//   import-cars <csv>
//   summary [--yards|--industries]
//   history [N]
// ==========================================

use anyhow::{bail, Context, Result};
use railyard_exchange::config::default_db_path;
use railyard_exchange::logging::{self, LogFormat};
use railyard_exchange::report::SummaryFilter;
use railyard_exchange::ExchangeApi;
use std::path::PathBuf;

const USAGE: &str = r#"railyard-exchange - 模型铁路调车场交换

用法:
  railyard-exchange [--db PATH] [--json] [--log-json] <命令>

命令:
  exchange <调车场> <数量|all> [--seed N]     调车场 ↔ 工业 交换
  off-layout <调车场> <数量|all> [--seed N]   调车场 ↔ 场外 交换
  import-spots <csv>                          导入车位
  import-cars <csv>                           导入车辆
  summary [--yards|--industries]              车辆位置汇总
  history [N]                                 最近 N 条交换记录（默认 10）

环境变量:
  RAILYARD_EXCHANGE_DB_PATH   数据库路径（默认 ./railcars.db）
  RUST_LOG                    日志级别（默认 info）
"#;

#[derive(Debug, PartialEq)]
enum Command {
    Exchange {
        yard: String,
        count: String,
        seed: Option<u64>,
    },
    OffLayout {
        yard: String,
        count: String,
        seed: Option<u64>,
    },
    ImportSpots(PathBuf),
    ImportCars(PathBuf),
    Summary(SummaryFilter),
    History(usize),
    Help,
}

#[derive(Debug, PartialEq)]
struct Cli {
    db_path: Option<String>,
    json: bool,
    log_json: bool,
    command: Command,
}

fn parse_seed(raw: Option<String>) -> Result<u64> {
    let raw = raw.context("--seed 需要一个整数")?;
    raw.parse::<u64>()
        .with_context(|| format!("无效的种子: '{}'", raw))
}

/// 解析命令行参数（不含程序名）
fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Cli> {
    let mut db_path = None;
    let mut json = false;
    let mut log_json = false;
    let mut seed = None;
    let mut summary_filter = SummaryFilter::All;
    let mut positional = Vec::new();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--db" => db_path = Some(iter.next().context("--db 需要一个路径")?),
            "--json" => json = true,
            "--log-json" => log_json = true,
            "--seed" => seed = Some(parse_seed(iter.next())?),
            "--yards" => summary_filter = SummaryFilter::YardsOnly,
            "--industries" => summary_filter = SummaryFilter::IndustriesOnly,
            "-h" | "--help" => positional.insert(0, "help".to_string()),
            // 负数数量按位置参数处理，交给数量解析报错
            s if s.starts_with("--") => bail!("未知选项: {}", s),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let head = positional.next();
    let command = match head.as_deref() {
        None | Some("help") => Command::Help,
        Some(name @ ("exchange" | "off-layout")) => {
            let yard = positional.next().context("缺少调车场名称")?;
            let count = positional.next().context("缺少数量（整数或 all）")?;
            if name == "exchange" {
                Command::Exchange { yard, count, seed }
            } else {
                Command::OffLayout { yard, count, seed }
            }
        }
        Some("import-spots") => Command::ImportSpots(PathBuf::from(
            positional.next().context("缺少 CSV 路径")?,
        )),
        Some("import-cars") => Command::ImportCars(PathBuf::from(
            positional.next().context("缺少 CSV 路径")?,
        )),
        Some("summary") => Command::Summary(summary_filter),
        Some("history") => {
            let limit = match positional.next() {
                Some(raw) => raw
                    .parse::<usize>()
                    .with_context(|| format!("无效的条数: '{}'", raw))?,
                None => 10,
            };
            Command::History(limit)
        }
        Some(other) => bail!("未知命令: {}\n\n{}", other, USAGE),
    };

    Ok(Cli {
        db_path,
        json,
        log_json,
        command,
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = parse_args(std::env::args().skip(1))?;
    if cli.command == Command::Help {
        print!("{}", USAGE);
        return Ok(());
    }

    logging::init_with_format(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    let db_path = cli.db_path.clone().unwrap_or_else(default_db_path);
    let api = ExchangeApi::open(&db_path).with_context(|| format!("无法打开数据库: {}", db_path))?;

    match cli.command {
        Command::Exchange { yard, count, seed } => {
            let report = api.exchange(&yard, &count, seed)?;
            if cli.json {
                print_json(&report)?;
            } else {
                print!("{}", report);
            }
        }
        Command::OffLayout { yard, count, seed } => {
            let report = api.off_layout(&yard, &count, seed)?;
            if cli.json {
                print_json(&report)?;
            } else {
                print!("{}", report);
            }
        }
        Command::ImportSpots(path) => {
            let summary = api.import_spots(&path)?;
            if cli.json {
                print_json(&summary)?;
            } else {
                println!("车位导入完成: {}", summary);
            }
        }
        Command::ImportCars(path) => {
            let summary = api.import_cars(&path)?;
            if cli.json {
                print_json(&summary)?;
            } else {
                println!("车辆导入完成: {}", summary);
            }
        }
        Command::Summary(filter) => {
            let summary = api.summarize(filter)?;
            if cli.json {
                print_json(&summary)?;
            } else {
                print!("{}", summary);
            }
        }
        Command::History(limit) => {
            let logs = api.recent_actions(limit)?;
            if cli.json {
                print_json(&logs)?;
            } else {
                for log in &logs {
                    println!(
                        "{} {} {} {}",
                        log.action_ts.format("%Y-%m-%d %H:%M:%S"),
                        log.action_type,
                        log.actor,
                        log.detail.as_deref().unwrap_or("")
                    );
                }
            }
        }
        Command::Help => print!("{}", USAGE),
    }
    Ok(())
}
