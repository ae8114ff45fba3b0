// ==========================================
// 混植群落空间规划 - 群落 (Guild) 领域模型
// ==========================================
// 红线: 同一群落内物种不可重复
// 红线: 空群落不入库 (直接丢弃)
// 红线: 提交后的群落不可变
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// GuildMember - 群落成员
// ==========================================
// display_name 在选中时从目录拷贝，报告层无需再次查询目录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildMember {
    pub species_id: String,   // 拉丁学名
    pub display_name: String, // 英文名
}

impl GuildMember {
    pub fn new(species_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            species_id: species_id.into(),
            display_name: display_name.into(),
        }
    }
}

// ==========================================
// Guild - 已提交的群落 (只读)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    members: Vec<GuildMember>,
}

impl Guild {
    /// 从成员列表构造群落
    ///
    /// # 返回
    /// - Some(Guild): 去重后非空
    /// - None: 去重后为空 (空群落不保存)
    ///
    /// 重复出现的物种只保留第一次出现的位置
    pub fn from_members(members: Vec<GuildMember>) -> Option<Self> {
        let mut unique: Vec<GuildMember> = Vec::with_capacity(members.len());
        for member in members {
            if !unique.iter().any(|m| m.species_id == member.species_id) {
                unique.push(member);
            }
        }

        if unique.is_empty() {
            None
        } else {
            Some(Self { members: unique })
        }
    }

    pub fn members(&self) -> &[GuildMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, species_id: &str) -> bool {
        self.members.iter().any(|m| m.species_id == species_id)
    }
}

// ==========================================
// GroupModel - 群落集合
// ==========================================
// 按提交顺序保存；只能通过 GroupSession::finish 或 from_guilds 得到
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupModel {
    guilds: Vec<Guild>,
}

impl GroupModel {
    pub fn from_guilds(guilds: Vec<Guild>) -> Self {
        Self { guilds }
    }

    pub fn guilds(&self) -> &[Guild] {
        &self.guilds
    }

    pub fn len(&self) -> usize {
        self.guilds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty()
    }

    /// 任一群落是否引用该物种
    pub fn references(&self, species_id: &str) -> bool {
        self.guilds.iter().any(|g| g.contains(species_id))
    }

    /// 所有群落中出现过的物种（去重，按英文名排序）
    ///
    /// 用于需求录入时逐个提示
    pub fn distinct_species(&self) -> Vec<GuildMember> {
        let mut by_id: BTreeMap<&str, &GuildMember> = BTreeMap::new();
        for guild in &self.guilds {
            for member in guild.members() {
                by_id.entry(member.species_id.as_str()).or_insert(member);
            }
        }

        let mut distinct: Vec<GuildMember> = by_id.into_values().cloned().collect();
        distinct.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.species_id.cmp(&b.species_id))
        });
        distinct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, name: &str) -> GuildMember {
        GuildMember::new(id, name)
    }

    #[test]
    fn test_guild_from_members_dedups_and_keeps_order() {
        let guild = Guild::from_members(vec![
            member("Solanum_lycopersicum", "Tomato"),
            member("Ocimum_basilicum", "Basil"),
            member("Solanum_lycopersicum", "Tomato"),
        ])
        .unwrap();

        assert_eq!(guild.len(), 2);
        assert_eq!(guild.members()[0].species_id, "Solanum_lycopersicum");
        assert_eq!(guild.members()[1].species_id, "Ocimum_basilicum");
    }

    #[test]
    fn test_empty_guild_is_discarded() {
        assert!(Guild::from_members(Vec::new()).is_none());
    }

    #[test]
    fn test_distinct_species_sorted_by_display_name() {
        let g1 = Guild::from_members(vec![
            member("Solanum_lycopersicum", "Tomato"),
            member("Ocimum_basilicum", "Basil"),
        ])
        .unwrap();
        let g2 = Guild::from_members(vec![
            member("Ocimum_basilicum", "Basil"),
            member("Allium_cepa", "Onion"),
        ])
        .unwrap();
        let model = GroupModel::from_guilds(vec![g1, g2]);

        let names: Vec<String> = model
            .distinct_species()
            .into_iter()
            .map(|m| m.display_name)
            .collect();
        assert_eq!(names, vec!["Basil", "Onion", "Tomato"]);
        assert!(model.references("Allium_cepa"));
        assert!(!model.references("Daucus_carota"));
    }
}
