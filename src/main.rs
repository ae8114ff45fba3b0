// ==========================================
// 混植群落空间规划 - 命令行入口
// ==========================================
// 用法:
//   huerto-planner [--db PATH] [--json]                交互式规划
//   huerto-planner [--db PATH] [--json] run PLAN.json  批处理规划
//   huerto-planner [--db PATH] import SPECIES.csv      导入物种目录
//   huerto-planner [--db PATH] init                    初始化数据库
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use huerto_planner::app::{
    resolve_db_path, run_plan_file, AppState, Console, OutputFormat, ReportEnvelope,
};
use huerto_planner::i18n::{self, t, t_with_args};
use huerto_planner::logging;

#[derive(Debug)]
enum CliCommand {
    Interactive,
    Init,
    Import(PathBuf),
    Run(PathBuf),
    Help,
}

#[derive(Debug)]
struct CliArgs {
    db_path: Option<String>,
    json: bool,
    command: CliCommand,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs> {
    let mut db_path = None;
    let mut json = false;
    let mut positional: Vec<String> = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                let value = args.next().ok_or_else(|| anyhow!("--db 缺少路径参数"))?;
                db_path = Some(value);
            }
            "--json" => json = true,
            "-h" | "--help" | "help" => positional.insert(0, "help".to_string()),
            other if other.starts_with("--") => bail!("未知参数: {}", other),
            other => positional.push(other.to_string()),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        None => CliCommand::Interactive,
        Some("help") => CliCommand::Help,
        Some("init") => CliCommand::Init,
        Some("import") => CliCommand::Import(PathBuf::from(
            positional.next().ok_or_else(|| anyhow!("import 缺少 CSV 文件路径"))?,
        )),
        Some("run") => CliCommand::Run(PathBuf::from(
            positional.next().ok_or_else(|| anyhow!("run 缺少规划文件路径"))?,
        )),
        Some(other) => bail!("未知命令: {}", other),
    };

    Ok(CliArgs {
        db_path,
        json,
        command,
    })
}

fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;

    if args.json {
        logging::init_json();
    } else {
        logging::init();
    }

    if let CliCommand::Help = args.command {
        println!("{}", t("usage.text"));
        return Ok(());
    }

    let db_path = resolve_db_path(args.db_path.as_deref());
    tracing::info!(db_path = %db_path, version = huerto_planner::VERSION, "启动");

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;
    i18n::set_locale(&state.locale());

    match args.command {
        CliCommand::Help => {}
        CliCommand::Init => {
            println!("{}", t_with_args("init.done", &[("path", state.db_path.as_str())]));
        }
        CliCommand::Import(path) => {
            let report = state
                .import_species(&path)
                .with_context(|| format!("导入物种目录失败: {}", path.display()))?;

            let written = report.written.to_string();
            let rejected = report.rejected.len().to_string();
            println!(
                "{}",
                t_with_args(
                    "import.done",
                    &[("written", written.as_str()), ("rejected", rejected.as_str())]
                )
            );
            for rejection in &report.rejected {
                let row = rejection.row.to_string();
                println!(
                    "{}",
                    t_with_args(
                        "import.rejected_row",
                        &[("row", row.as_str()), ("reason", rejection.reason.as_str())]
                    )
                );
            }
        }
        CliCommand::Run(path) => {
            let format = if args.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            };
            let output = run_plan_file(
                &state.planner_api,
                &path,
                format,
                state.area_precision(),
                state.config_snapshot(),
            )
            .with_context(|| format!("执行规划文件失败: {}", path.display()))?;
            println!("{}", output);
        }
        CliCommand::Interactive => {
            let stdin = io::stdin();
            if args.json {
                // stdout 只输出报告信封, 交互提示改走 stderr
                let mut stdout = io::stdout();
                run_interactive(&state, stdin.lock(), &mut io::stderr(), Some(&mut stdout))?;
            } else {
                run_interactive(&state, stdin.lock(), &mut io::stdout(), None)?;
            }
        }
    }

    Ok(())
}

fn run_interactive<R: BufRead>(
    state: &AppState,
    input: R,
    prompts: &mut dyn Write,
    json_out: Option<&mut dyn Write>,
) -> Result<()> {
    let mut console = Console::new(&state.planner_api, input, prompts, state.area_precision());
    let run = console.run()?;

    if let Some(out) = json_out {
        let dropped: Vec<String> = Vec::new();
        let envelope = ReportEnvelope::new(run.result.as_ref(), &dropped, state.config_snapshot());
        writeln!(out, "{}", envelope.to_json()?)?;
    }
    Ok(())
}
