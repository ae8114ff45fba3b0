// ==========================================
// 混植群落空间规划 - 交互式控制台
// ==========================================
// 职责: 读取用户输入, 驱动 GroupSession 与需求录入, 输出报告
// 流程: 构建群落 -> 录入需求 -> 空间计算 -> 显示结果
// 说明: 输入输出为泛型 (BufRead / Write), 测试可用内存脚本驱动
// ==========================================

use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{ApiError, PlannerApi};
use crate::app::report::render_text;
use crate::domain::calculation::CalculationResult;
use crate::domain::demand::{parse_demand_input, DemandError, DemandMap};
use crate::domain::guild::{GroupModel, GuildMember};
use crate::domain::species::SpeciesEntry;
use crate::domain::types::SelectionOutcome;
use crate::engine::group_session::GroupSession;
use crate::i18n::{t, t_with_args};

const RULE_WIDTH: usize = 50;

/// 控制台错误
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("控制台读写失败: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// 一次控制台会话的产出
#[derive(Debug, Clone)]
pub struct ConsoleRun {
    pub group_model: GroupModel,
    pub demand: DemandMap,
    /// None 表示没有录入需求
    pub result: Option<CalculationResult>,
}

// 构建循环中的命令
enum Command<'a> {
    List,
    Done,
    View,
    Undo,
    Clear,
    Finish,
    Search(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let command = match line.to_lowercase().as_str() {
            "list" => Command::List,
            "done" => Command::Done,
            "view" => Command::View,
            "undo" => Command::Undo,
            "clear" => Command::Clear,
            "finish" => Command::Finish,
            _ => Command::Search(line),
        };
        Some(command)
    }
}

// ==========================================
// Console - 交互式控制台
// ==========================================
pub struct Console<'a, R: BufRead, W: Write> {
    api: &'a PlannerApi,
    input: R,
    output: W,
    area_precision: usize,
}

impl<'a, R: BufRead, W: Write> Console<'a, R, W> {
    pub fn new(api: &'a PlannerApi, input: R, output: W, area_precision: usize) -> Self {
        Self {
            api,
            input,
            output,
            area_precision,
        }
    }

    /// 取回输出端（测试读取输出内容）
    pub fn into_output(self) -> W {
        self.output
    }

    /// 运行完整的交互流程
    pub fn run(&mut self) -> ConsoleResult<ConsoleRun> {
        writeln!(self.output, "{}", t("app.title"))?;
        writeln!(
            self.output,
            "{}",
            t_with_args("app.version", &[("version", crate::VERSION)])
        )?;
        writeln!(self.output, "{}", "=".repeat(RULE_WIDTH))?;

        let group_model = self.build_groups()?;
        let demand = self.collect_demand(&group_model)?;

        if demand.is_empty() {
            writeln!(self.output, "{}", t("demand.none"))?;
            return Ok(ConsoleRun {
                group_model,
                demand,
                result: None,
            });
        }

        let result = self.api.calculate(&group_model, &demand)?;
        if let Some(result) = &result {
            writeln!(self.output, "{}", render_text(result, self.area_precision))?;
        }

        Ok(ConsoleRun {
            group_model,
            demand,
            result,
        })
    }

    // ==========================================
    // 第一步: 构建群落
    // ==========================================

    /// 交互式构建群落集合
    ///
    /// 输入结束 (EOF) 等同于 finish
    pub fn build_groups(&mut self) -> ConsoleResult<GroupModel> {
        self.print_builder_help()?;
        let mut session = self.api.new_session();

        while !session.is_finished() {
            self.print_session_status(&session)?;

            let line = match self.prompt(&t("builder.prompt_search"))? {
                Some(line) => line,
                None => {
                    debug!("输入结束, 自动结束群落构建");
                    session.finish();
                    break;
                }
            };

            let command = match Command::parse(&line) {
                Some(command) => command,
                None => continue,
            };

            match command {
                Command::Finish => {
                    session.finish();
                }
                Command::Done => {
                    let outcome = session.commit();
                    self.print_outcome(&outcome, "")?;
                }
                Command::View => self.print_committed(&session)?,
                Command::List => self.print_all_species()?,
                Command::Undo => {
                    let name = session
                        .current()
                        .last()
                        .map(|m| m.display_name.clone())
                        .unwrap_or_default();
                    let outcome = session.remove_last();
                    self.print_outcome(&outcome, &name)?;
                }
                Command::Clear => {
                    let outcome = session.clear();
                    self.print_outcome(&outcome, "")?;
                }
                Command::Search(term) => self.search_and_select(&mut session, term)?,
            }
        }

        session
            .group_model()
            .ok_or_else(|| ApiError::InternalError("会话未结束".to_string()).into())
    }

    fn search_and_select(&mut self, session: &mut GroupSession, term: &str) -> ConsoleResult<()> {
        let matches = match self.api.search_species(term) {
            Ok(matches) => matches,
            Err(e) => {
                warn!(term = %term, error = %e, "物种搜索失败");
                let reason = e.to_string();
                writeln!(
                    self.output,
                    "{}",
                    t_with_args("search.failed", &[("reason", reason.as_str())])
                )?;
                return Ok(());
            }
        };

        if matches.is_empty() {
            writeln!(self.output, "{}", t("search.none"))?;
            return Ok(());
        }

        let count = matches.len().to_string();
        writeln!(self.output)?;
        writeln!(
            self.output,
            "{}",
            t_with_args("search.found", &[("count", count.as_str())])
        )?;
        for (index, entry) in matches.iter().enumerate() {
            writeln!(self.output, "{}. {}", index + 1, describe(entry))?;
        }

        let choice = match self.prompt(&t("search.prompt_select"))? {
            Some(choice) => choice,
            None => return Ok(()),
        };
        let choice = choice.trim();
        if choice.is_empty() {
            return Ok(());
        }

        let index = match choice.parse::<usize>() {
            Ok(index) => index,
            Err(_) => {
                writeln!(self.output, "{}", t("search.not_a_number"))?;
                return Ok(());
            }
        };

        match index.checked_sub(1).and_then(|i| matches.get(i)) {
            Some(entry) => {
                let outcome = session.add_entry(entry);
                self.print_outcome(&outcome, &entry.english_name)?;
            }
            None => writeln!(self.output, "{}", t("search.invalid_selection"))?,
        }
        Ok(())
    }

    // ==========================================
    // 第二步: 录入需求
    // ==========================================

    /// 按英文名顺序逐个录入周需求
    ///
    /// 空白 = 无需求; 非数字/非正数重新提示; EOF 视为空白
    pub fn collect_demand(&mut self, group_model: &GroupModel) -> ConsoleResult<DemandMap> {
        let mut demand = DemandMap::new();
        let prompts = self.api.demand_prompts(group_model);
        if prompts.is_empty() {
            return Ok(demand);
        }

        writeln!(self.output)?;
        writeln!(self.output, "{}", t("demand.title"))?;
        writeln!(self.output, "{}", t("demand.subtitle"))?;
        writeln!(self.output, "{}", "=".repeat(40))?;

        for member in &prompts {
            if let Some(kg) = self.prompt_demand(member)? {
                // 输入层已保证为正数
                if let Err(e) = demand.set(member.species_id.clone(), kg) {
                    warn!(species_id = %member.species_id, error = %e, "需求值被拒绝");
                }
            }
        }

        Ok(demand)
    }

    fn prompt_demand(&mut self, member: &GuildMember) -> ConsoleResult<Option<f64>> {
        let prompt = t_with_args("demand.prompt", &[("name", member.display_name.as_str())]);
        loop {
            let line = match self.prompt(&prompt)? {
                Some(line) => line,
                None => return Ok(None),
            };

            match parse_demand_input(&line) {
                Ok(kg) => return Ok(kg),
                Err(DemandError::NonPositive(_)) => {
                    writeln!(self.output, "{}", t("demand.not_positive"))?
                }
                Err(DemandError::NotANumber(_)) => {
                    writeln!(self.output, "{}", t("demand.not_a_number"))?
                }
            }
        }
    }

    // ==========================================
    // 输出辅助
    // ==========================================

    /// 输出提示并读取一行, EOF 返回 None
    fn prompt(&mut self, text: &str) -> ConsoleResult<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn print_builder_help(&mut self) -> ConsoleResult<()> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(self.output, "{}", t("builder.title"))?;
        writeln!(self.output, "{}", rule)?;
        for key in [
            "builder.help_search",
            "builder.help_list",
            "builder.help_done",
            "builder.help_view",
            "builder.help_undo",
            "builder.help_clear",
            "builder.help_finish",
        ] {
            writeln!(self.output, "{}", t(key))?;
        }
        writeln!(self.output, "{}", rule)?;
        Ok(())
    }

    fn print_session_status(&mut self, session: &GroupSession) -> ConsoleResult<()> {
        let plants = if session.current().is_empty() {
            t("builder.empty")
        } else {
            join_names(session.current())
        };
        let count = session.committed().len().to_string();

        writeln!(self.output)?;
        writeln!(
            self.output,
            "{}",
            t_with_args("builder.current_group", &[("plants", plants.as_str())])
        )?;
        writeln!(
            self.output,
            "{}",
            t_with_args("builder.total_groups", &[("count", count.as_str())])
        )?;
        Ok(())
    }

    fn print_committed(&mut self, session: &GroupSession) -> ConsoleResult<()> {
        writeln!(self.output)?;
        writeln!(self.output, "{}", t("builder.current_groups"))?;
        for (index, guild) in session.committed().iter().enumerate() {
            let number = (index + 1).to_string();
            let plants = guild
                .members()
                .iter()
                .map(|m| format!("{} ({})", m.display_name, m.species_id))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                self.output,
                "{}",
                t_with_args(
                    "builder.group_line",
                    &[("number", number.as_str()), ("plants", plants.as_str())]
                )
            )?;
        }
        Ok(())
    }

    fn print_all_species(&mut self) -> ConsoleResult<()> {
        match self.api.list_species() {
            Ok(all) => {
                writeln!(self.output)?;
                writeln!(self.output, "{}", t("builder.all_plants"))?;
                for entry in &all {
                    writeln!(self.output, "  - {}", describe(entry))?;
                }
            }
            Err(e) => {
                warn!(error = %e, "物种列表读取失败");
                let reason = e.to_string();
                writeln!(
                    self.output,
                    "{}",
                    t_with_args("search.failed", &[("reason", reason.as_str())])
                )?;
            }
        }
        Ok(())
    }

    fn print_outcome(&mut self, outcome: &SelectionOutcome, name: &str) -> ConsoleResult<()> {
        writeln!(self.output, "{}", outcome_message(outcome, name))?;
        Ok(())
    }
}

/// 操作反馈文案
///
/// name 为空时使用物种 id
pub fn outcome_message(outcome: &SelectionOutcome, name: &str) -> String {
    let named = |species_id: &str| -> String {
        if name.is_empty() {
            species_id.to_string()
        } else {
            name.to_string()
        }
    };
    match outcome {
        SelectionOutcome::Added { species_id } => {
            let shown = named(species_id);
            t_with_args("session.added", &[("name", shown.as_str())])
        }
        SelectionOutcome::AlreadyInGuild { species_id } => {
            let shown = named(species_id);
            t_with_args("session.already_in_group", &[("name", shown.as_str())])
        }
        SelectionOutcome::UnknownSpecies { species_id } => {
            t_with_args("session.unknown_species", &[("name", species_id.as_str())])
        }
        SelectionOutcome::Removed { species_id } => {
            let shown = named(species_id);
            t_with_args("session.removed", &[("name", shown.as_str())])
        }
        SelectionOutcome::Cleared { removed } => {
            let count = removed.to_string();
            t_with_args("session.cleared", &[("count", count.as_str())])
        }
        SelectionOutcome::Committed { guild_number } => {
            let number = guild_number.to_string();
            t_with_args("session.committed", &[("number", number.as_str())])
        }
        SelectionOutcome::EmptyGuild => t("session.empty_guild"),
        SelectionOutcome::SessionClosed => t("session.closed"),
    }
}

fn describe(entry: &SpeciesEntry) -> String {
    format!(
        "{} ({}) - {}",
        entry.english_name, entry.spanish_name, entry.latin_name
    )
}

fn join_names(members: &[GuildMember]) -> String {
    members
        .iter()
        .map(|m| m.display_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
