//! Quest search, id pickers and inline display names.

use crate::config::QuestIdRange;
use crate::dbc::{LookupKind, Lookups};
use crate::error::Result;
use crate::gateway::Gateway;
use crate::loot::LootTable;
use crate::quest::{ObjectiveKind, ObjectiveNames, RewardNames};
use crate::values;
use serde::Serialize;

pub const MAX_RESULTS: usize = 200;

/// World tables an id can be picked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PickerKind {
    Item,
    Creature,
    GameObject,
    Quest,
}

impl PickerKind {
    fn table(self) -> &'static str {
        match self {
            PickerKind::Item => "item_template",
            PickerKind::Creature => "creature_template",
            PickerKind::GameObject => "gameobject_template",
            PickerKind::Quest => "quest_template",
        }
    }

    fn name_column(self) -> &'static str {
        match self {
            PickerKind::Quest => "Title",
            _ => "name",
        }
    }
}

impl std::str::FromStr for PickerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "item" => Ok(PickerKind::Item),
            "creature" | "npc" => Ok(PickerKind::Creature),
            "gameobject" | "go" => Ok(PickerKind::GameObject),
            "quest" => Ok(PickerKind::Quest),
            other => Err(format!("unknown picker kind: {}", other)),
        }
    }
}

/// Where the id for a condition column comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Picker {
    World(PickerKind),
    Dbc(LookupKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickEntry {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestHit {
    pub entry: i64,
    pub title: String,
    pub min_level: i64,
}

fn parse_id(query: &str) -> Option<i64> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    query.parse().ok()
}

/// Numeric query is an exact id, anything else a title substring. Newest first.
pub fn search_quests(gateway: &dyn Gateway, query: &str, range: &QuestIdRange) -> Result<Vec<QuestHit>> {
    let rows = match parse_id(query) {
        Some(id) => gateway.fetch_all(
            &format!(
                "SELECT entry, Title, MinLevel FROM quest_template \
                 WHERE entry = ? AND entry BETWEEN ? AND ? LIMIT {}",
                MAX_RESULTS
            ),
            &values![id, range.min, range.max],
        )?,
        None => gateway.fetch_all(
            &format!(
                "SELECT entry, Title, MinLevel FROM quest_template \
                 WHERE Title LIKE ? AND entry BETWEEN ? AND ? ORDER BY entry DESC LIMIT {}",
                MAX_RESULTS
            ),
            &values![format!("%{}%", query.trim()), range.min, range.max],
        )?,
    };

    Ok(rows
        .iter()
        .map(|row| QuestHit {
            entry: row.get_i64("entry").unwrap_or(0),
            title: row.get_string("Title").unwrap_or_default(),
            min_level: row.get_i64("MinLevel").unwrap_or(0),
        })
        .collect())
}

pub fn pick(gateway: &dyn Gateway, kind: PickerKind, query: &str) -> Result<Vec<PickEntry>> {
    let name = kind.name_column();
    let rows = match parse_id(query) {
        Some(id) => gateway.fetch_all(
            &format!(
                "SELECT entry AS id, `{}` AS name FROM {} WHERE entry = ? LIMIT {}",
                name,
                kind.table(),
                MAX_RESULTS
            ),
            &values![id],
        )?,
        None => gateway.fetch_all(
            &format!(
                "SELECT entry AS id, `{0}` AS name FROM {1} WHERE `{0}` LIKE ? ORDER BY entry DESC LIMIT {2}",
                name,
                kind.table(),
                MAX_RESULTS
            ),
            &values![format!("%{}%", query.trim())],
        )?,
    };

    Ok(rows
        .iter()
        .map(|row| PickEntry {
            id: row.get_i64("id").unwrap_or(0),
            name: row.get_string("name").unwrap_or_default(),
        })
        .collect())
}

pub fn display_name(gateway: &dyn Gateway, kind: PickerKind, id: i64) -> Result<Option<String>> {
    if id <= 0 {
        return Ok(None);
    }
    let row = gateway.fetch_one(
        &format!(
            "SELECT `{}` AS name FROM {} WHERE entry = ? LIMIT 1",
            kind.name_column(),
            kind.table()
        ),
        &values![id],
    )?;
    Ok(row.and_then(|r| r.get_string("name")).filter(|n| !n.is_empty()))
}

/// Picker for SourceGroup. Only the loot templates keyed by a world entry have one.
pub fn source_group_picker(source_type: i32) -> Option<Picker> {
    match LootTable::for_source_type(source_type)? {
        LootTable::Creature | LootTable::Pickpocketing | LootTable::Skinning => {
            Some(Picker::World(PickerKind::Creature))
        }
        LootTable::GameObject => Some(Picker::World(PickerKind::GameObject)),
        LootTable::Item | LootTable::Disenchant | LootTable::Milling | LootTable::Prospecting => {
            Some(Picker::World(PickerKind::Item))
        }
        _ => None,
    }
}

/// Picker for SourceEntry. Loot sources key their rows by item.
pub fn source_entry_picker(source_type: i32) -> Option<Picker> {
    if source_type == crate::condition::QUEST_AVAILABLE_SOURCE_TYPE {
        return Some(Picker::World(PickerKind::Quest));
    }
    LootTable::for_source_type(source_type).map(|_| Picker::World(PickerKind::Item))
}

/// Picker for ConditionValue1 by condition type.
pub fn value1_picker(condition_type: i32) -> Option<Picker> {
    match condition_type {
        t if crate::condition::QUEST_CONDITION_TYPES.contains(&t) => Some(Picker::World(PickerKind::Quest)),
        2 | 3 => Some(Picker::World(PickerKind::Item)),
        29 => Some(Picker::World(PickerKind::Creature)),
        30 => Some(Picker::World(PickerKind::GameObject)),
        5 => Some(Picker::Dbc(LookupKind::Faction)),
        1 | 25 => Some(Picker::Dbc(LookupKind::Spell)),
        4 | 23 => Some(Picker::Dbc(LookupKind::Area)),
        7 => Some(Picker::Dbc(LookupKind::SkillLine)),
        _ => None,
    }
}

/// Run a picker against the world database or the loaded DBC tables.
pub fn run_picker(gateway: &dyn Gateway, lookups: &Lookups, picker: Picker, query: &str) -> Result<Vec<PickEntry>> {
    match picker {
        Picker::World(kind) => pick(gateway, kind, query),
        Picker::Dbc(kind) => Ok(lookups
            .search(kind, query)
            .into_iter()
            .take(MAX_RESULTS)
            .map(|(id, name)| PickEntry {
                id: i64::from(*id),
                name: name.clone(),
            })
            .collect()),
    }
}

/// Item names from the world database, currency names from CurrencyTypes.dbc.
pub struct WorldNames<'a> {
    pub gateway: &'a dyn Gateway,
    pub lookups: &'a Lookups,
}

impl RewardNames for WorldNames<'_> {
    fn item_name(&self, id: i64) -> Option<String> {
        display_name(self.gateway, PickerKind::Item, id).ok().flatten()
    }

    fn currency_name(&self, id: i64) -> Option<String> {
        let id = u32::try_from(id).ok()?;
        self.lookups
            .label(LookupKind::CurrencyTypes, id)
            .map(str::to_string)
    }
}

impl ObjectiveNames for WorldNames<'_> {
    fn objective_name(&self, kind: ObjectiveKind, id: i64) -> Option<String> {
        let picker = match kind {
            ObjectiveKind::Item => PickerKind::Item,
            ObjectiveKind::Creature => PickerKind::Creature,
            ObjectiveKind::GameObject => PickerKind::GameObject,
            ObjectiveKind::SpellCast => {
                let id = u32::try_from(id).ok()?;
                return self.lookups.label(LookupKind::Spell, id).map(str::to_string);
            }
            ObjectiveKind::None => return None,
        };
        display_name(self.gateway, picker, id).ok().flatten()
    }
}
