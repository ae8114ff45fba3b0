// ==========================================
// 混植群落空间规划 - 群落构建会话
// ==========================================
// 职责: 交互式构建群落集合的有限状态会话
// 状态: Building -> Finished (单向)
// 红线: 用户误操作 (重复添加/空群落移除/无效物种) 只返回提示,不报错
// 红线: 会话结束后群落集合只读
// ==========================================
// 说明: 会话不依赖任何输入方式, 控制台/批处理/测试共用同一套逻辑
// ==========================================

use crate::domain::guild::{GroupModel, Guild, GuildMember};
use crate::domain::species::{CatalogError, CatalogLookup, SpeciesCatalog, SpeciesEntry};
use crate::domain::types::{SelectionOutcome, SessionState};
use thiserror::Error;
use tracing::{debug, info, warn};

/// 会话错误
///
/// 仅目录查询失败会返回错误（数据完整性故障），用户误操作一律走 SelectionOutcome
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("物种目录查询失败 (species_id={species_id}): {source}")]
    CatalogLookupFailed {
        species_id: String,
        #[source]
        source: CatalogError,
    },
}

// ==========================================
// GroupSession - 群落构建会话
// ==========================================
#[derive(Debug, Clone)]
pub struct GroupSession {
    state: SessionState,
    current: Vec<GuildMember>,
    committed: Vec<Guild>,
}

impl Default for GroupSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Building,
            current: Vec::new(),
            committed: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    /// 当前正在构建的群落
    pub fn current(&self) -> &[GuildMember] {
        &self.current
    }

    /// 已提交的群落
    pub fn committed(&self) -> &[Guild] {
        &self.committed
    }

    // ==========================================
    // 编辑操作
    // ==========================================

    /// 按物种 id 加入当前群落
    ///
    /// # 返回
    /// - Ok(Added): 加入成功
    /// - Ok(AlreadyInGuild / UnknownSpecies / SessionClosed): 无操作
    /// - Err(CatalogLookupFailed): 目录查询失败
    pub fn add(
        &mut self,
        catalog: &dyn SpeciesCatalog,
        species_id: &str,
    ) -> Result<SelectionOutcome, SessionError> {
        if self.is_finished() {
            return Ok(SelectionOutcome::SessionClosed);
        }

        let species_id = species_id.trim();
        if self.current_contains(species_id) {
            return Ok(SelectionOutcome::AlreadyInGuild {
                species_id: species_id.to_string(),
            });
        }

        match catalog.lookup(species_id) {
            CatalogLookup::Found(entry) => Ok(self.add_entry(&entry)),
            CatalogLookup::NotFound => {
                debug!(species_id = %species_id, "物种不在目录中, 忽略");
                Ok(SelectionOutcome::UnknownSpecies {
                    species_id: species_id.to_string(),
                })
            }
            CatalogLookup::Failed(source) => {
                warn!(species_id = %species_id, error = %source, "物种目录查询失败");
                Err(SessionError::CatalogLookupFailed {
                    species_id: species_id.to_string(),
                    source,
                })
            }
        }
    }

    /// 加入一个已从目录解析出的物种（搜索结果选择）
    pub fn add_entry(&mut self, entry: &SpeciesEntry) -> SelectionOutcome {
        if self.is_finished() {
            return SelectionOutcome::SessionClosed;
        }

        if self.current_contains(&entry.latin_name) {
            return SelectionOutcome::AlreadyInGuild {
                species_id: entry.latin_name.clone(),
            };
        }

        self.current.push(GuildMember::new(
            entry.latin_name.clone(),
            entry.english_name.clone(),
        ));
        debug!(
            species_id = %entry.latin_name,
            current_size = self.current.len(),
            "物种已加入当前群落"
        );
        SelectionOutcome::Added {
            species_id: entry.latin_name.clone(),
        }
    }

    /// 移除当前群落最后加入的物种
    pub fn remove_last(&mut self) -> SelectionOutcome {
        if self.is_finished() {
            return SelectionOutcome::SessionClosed;
        }

        match self.current.pop() {
            Some(member) => SelectionOutcome::Removed {
                species_id: member.species_id,
            },
            None => SelectionOutcome::EmptyGuild,
        }
    }

    /// 清空当前群落
    pub fn clear(&mut self) -> SelectionOutcome {
        if self.is_finished() {
            return SelectionOutcome::SessionClosed;
        }

        if self.current.is_empty() {
            return SelectionOutcome::EmptyGuild;
        }

        let removed = self.current.len();
        self.current.clear();
        SelectionOutcome::Cleared { removed }
    }

    /// 提交当前群落（非空时）
    pub fn commit(&mut self) -> SelectionOutcome {
        if self.is_finished() {
            return SelectionOutcome::SessionClosed;
        }

        let members = std::mem::take(&mut self.current);
        match Guild::from_members(members) {
            Some(guild) => {
                self.committed.push(guild);
                let guild_number = self.committed.len();
                info!(guild_number = guild_number, "群落已提交");
                SelectionOutcome::Committed { guild_number }
            }
            None => SelectionOutcome::EmptyGuild,
        }
    }

    /// 结束会话
    ///
    /// 非空的当前群落会被提交, 空群落直接丢弃
    pub fn finish(&mut self) -> SelectionOutcome {
        if self.is_finished() {
            return SelectionOutcome::SessionClosed;
        }

        let outcome = self.commit();
        self.state = SessionState::Finished;
        info!(guild_count = self.committed.len(), "群落构建会话结束");
        outcome
    }

    // ==========================================
    // 输出
    // ==========================================

    /// 群落集合（仅会话结束后可用）
    pub fn group_model(&self) -> Option<GroupModel> {
        if self.is_finished() {
            Some(GroupModel::from_guilds(self.committed.clone()))
        } else {
            None
        }
    }

    fn current_contains(&self, species_id: &str) -> bool {
        self.current.iter().any(|m| m.species_id == species_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryCatalog;

    fn fixture_catalog() -> InMemoryCatalog {
        InMemoryCatalog::from_entries(vec![
            SpeciesEntry::new("Solanum_lycopersicum", "Tomato", "Tomate", 5.0, 2.0),
            SpeciesEntry::new("Ocimum_basilicum", "Basil", "Albahaca", 2.0, 1.0),
            SpeciesEntry::new("Allium_cepa", "Onion", "Cebolla", 3.0, 0.5),
        ])
    }

    #[test]
    fn test_add_commit_finish() {
        let catalog = fixture_catalog();
        let mut session = GroupSession::new();

        let outcome = session.add(&catalog, "Solanum_lycopersicum").unwrap();
        assert_eq!(
            outcome,
            SelectionOutcome::Added {
                species_id: "Solanum_lycopersicum".to_string()
            }
        );
        session.add(&catalog, "Ocimum_basilicum").unwrap();
        assert_eq!(session.commit(), SelectionOutcome::Committed { guild_number: 1 });
        assert!(session.current().is_empty());

        session.add(&catalog, "Allium_cepa").unwrap();
        assert!(session.group_model().is_none());

        // finish 提交非空的当前群落
        assert_eq!(session.finish(), SelectionOutcome::Committed { guild_number: 2 });
        let model = session.group_model().unwrap();
        assert_eq!(model.len(), 2);
        assert_eq!(model.guilds()[0].len(), 2);
        assert_eq!(model.guilds()[1].members()[0].display_name, "Onion");
    }

    #[test]
    fn test_duplicate_and_unknown_are_no_ops() {
        let catalog = fixture_catalog();
        let mut session = GroupSession::new();

        session.add(&catalog, "Solanum_lycopersicum").unwrap();
        let dup = session.add(&catalog, "Solanum_lycopersicum").unwrap();
        assert_eq!(
            dup,
            SelectionOutcome::AlreadyInGuild {
                species_id: "Solanum_lycopersicum".to_string()
            }
        );

        let unknown = session.add(&catalog, "Daucus_carota").unwrap();
        assert_eq!(
            unknown,
            SelectionOutcome::UnknownSpecies {
                species_id: "Daucus_carota".to_string()
            }
        );
        assert!(!unknown.changed());
        assert_eq!(session.current().len(), 1);
    }

    #[test]
    fn test_same_species_allowed_in_different_guilds() {
        let catalog = fixture_catalog();
        let mut session = GroupSession::new();

        session.add(&catalog, "Ocimum_basilicum").unwrap();
        session.commit();
        let outcome = session.add(&catalog, "Ocimum_basilicum").unwrap();
        assert!(outcome.changed());
    }

    #[test]
    fn test_remove_and_clear_on_empty_guild() {
        let catalog = fixture_catalog();
        let mut session = GroupSession::new();

        assert_eq!(session.remove_last(), SelectionOutcome::EmptyGuild);
        assert_eq!(session.clear(), SelectionOutcome::EmptyGuild);
        assert_eq!(session.commit(), SelectionOutcome::EmptyGuild);
        assert!(session.committed().is_empty());

        session.add(&catalog, "Solanum_lycopersicum").unwrap();
        session.add(&catalog, "Ocimum_basilicum").unwrap();
        assert_eq!(
            session.remove_last(),
            SelectionOutcome::Removed {
                species_id: "Ocimum_basilicum".to_string()
            }
        );
        assert_eq!(session.clear(), SelectionOutcome::Cleared { removed: 1 });
        assert!(session.current().is_empty());
    }

    #[test]
    fn test_finish_discards_empty_guild_and_closes_session() {
        let catalog = fixture_catalog();
        let mut session = GroupSession::new();

        session.add(&catalog, "Allium_cepa").unwrap();
        session.commit();
        assert_eq!(session.finish(), SelectionOutcome::EmptyGuild);
        assert_eq!(session.state(), SessionState::Finished);

        // 结束后所有操作被忽略
        assert_eq!(
            session.add(&catalog, "Ocimum_basilicum").unwrap(),
            SelectionOutcome::SessionClosed
        );
        assert_eq!(session.remove_last(), SelectionOutcome::SessionClosed);
        assert_eq!(session.clear(), SelectionOutcome::SessionClosed);
        assert_eq!(session.commit(), SelectionOutcome::SessionClosed);
        assert_eq!(session.finish(), SelectionOutcome::SessionClosed);
        assert_eq!(session.group_model().unwrap().len(), 1);
    }

    #[test]
    fn test_lookup_failure_is_an_error() {
        let catalog = fixture_catalog().with_failure("Ocimum_basilicum", "disk I/O error");
        let mut session = GroupSession::new();

        let err = session.add(&catalog, "Ocimum_basilicum").unwrap_err();
        assert!(matches!(
            err,
            SessionError::CatalogLookupFailed {
                source: CatalogError::Unavailable(ref m),
                ..
            } if m == "disk I/O error"
        ));
        assert!(session.current().is_empty());
    }
}
