// ==========================================
// 混植群落空间规划 - 领域类型定义
// ==========================================
// 群落构建会话的状态与操作反馈
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 会话状态 (Session State)
// ==========================================
// Building -> Finished，单向，不可回退
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Building, // 构建中
    Finished, // 已结束 (群落集合只读)
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Building => write!(f, "BUILDING"),
            SessionState::Finished => write!(f, "FINISHED"),
        }
    }
}

// ==========================================
// 选择/编辑操作反馈 (Selection Outcome)
// ==========================================
// 红线: 用户误操作只产生提示，不报错
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionOutcome {
    /// 已加入当前群落
    Added { species_id: String },
    /// 当前群落已包含该物种
    AlreadyInGuild { species_id: String },
    /// 目录中不存在该物种
    UnknownSpecies { species_id: String },
    /// 已移除当前群落最后一个物种
    Removed { species_id: String },
    /// 当前群落已清空
    Cleared { removed: usize },
    /// 当前群落已提交，guild_number 为其序号
    Committed { guild_number: usize },
    /// 当前群落为空，无可操作内容
    EmptyGuild,
    /// 会话已结束，操作被忽略
    SessionClosed,
}

impl SelectionOutcome {
    /// 操作是否改变了会话内容
    pub fn changed(&self) -> bool {
        matches!(
            self,
            SelectionOutcome::Added { .. }
                | SelectionOutcome::Removed { .. }
                | SelectionOutcome::Cleared { .. }
                | SelectionOutcome::Committed { .. }
        )
    }
}

impl fmt::Display for SelectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionOutcome::Added { species_id } => write!(f, "ADDED({})", species_id),
            SelectionOutcome::AlreadyInGuild { species_id } => {
                write!(f, "ALREADY_IN_GUILD({})", species_id)
            }
            SelectionOutcome::UnknownSpecies { species_id } => {
                write!(f, "UNKNOWN_SPECIES({})", species_id)
            }
            SelectionOutcome::Removed { species_id } => write!(f, "REMOVED({})", species_id),
            SelectionOutcome::Cleared { removed } => write!(f, "CLEARED({})", removed),
            SelectionOutcome::Committed { guild_number } => {
                write!(f, "COMMITTED({})", guild_number)
            }
            SelectionOutcome::EmptyGuild => write!(f, "EMPTY_GUILD"),
            SelectionOutcome::SessionClosed => write!(f, "SESSION_CLOSED"),
        }
    }
}
