//! Typed quest objectives and the `quest_template` columns they fill.
//!
//! Four objective slots map onto `ReqCreatureOrGOId1-4` (game objects stored
//! negative), `ReqSpellCast1-4` and `ObjectiveText1-4`. Item objectives are
//! packed into `ReqItemId1-6` in slot order.

use super::record::QuestRecord;
use crate::error::{QuestforgeError, Result};
use serde::Serialize;

pub const OBJECTIVE_SLOTS: usize = 4;
const ITEM_COLUMNS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ObjectiveKind {
    #[default]
    None,
    Creature,
    GameObject,
    Item,
    SpellCast,
}

impl std::str::FromStr for ObjectiveKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "" => Ok(ObjectiveKind::None),
            "creature" | "npc" => Ok(ObjectiveKind::Creature),
            "gameobject" | "go" => Ok(ObjectiveKind::GameObject),
            "item" => Ok(ObjectiveKind::Item),
            "spell" | "spellcast" => Ok(ObjectiveKind::SpellCast),
            other => Err(format!("unknown objective kind: {}", other)),
        }
    }
}

/// Resolves display names for generated objective text.
pub trait ObjectiveNames {
    fn objective_name(&self, kind: ObjectiveKind, id: i64) -> Option<String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Objective {
    pub kind: ObjectiveKind,
    /// Always the positive template id, also for game objects.
    pub id: i64,
    pub count: i64,
    pub text: String,
}

impl Objective {
    pub fn new(kind: ObjectiveKind, id: i64, count: i64) -> Self {
        Self {
            kind,
            id: id.abs(),
            count,
            text: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind == ObjectiveKind::None
    }

    /// Replace the text with a generated line. Counted kinds get at least 1.
    ///
    /// Empty slots and ids of 0 keep their text.
    pub fn fill_text(&mut self, name: Option<&str>) {
        if self.is_empty() || self.id <= 0 {
            return;
        }
        if self.kind != ObjectiveKind::SpellCast && self.count <= 0 {
            self.count = 1;
        }
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let (id, count) = (self.id, self.count);
        self.text = match (self.kind, name) {
            (ObjectiveKind::Item, Some(name)) => format!("Collect {} {}", count, name),
            (ObjectiveKind::Item, None) => format!("Collect {} item(s) ({})", count, id),
            (ObjectiveKind::Creature, Some(name)) => format!("Slay {} {}", count, name),
            (ObjectiveKind::Creature, None) => format!("Slay {} creature(s) ({})", count, id),
            (ObjectiveKind::GameObject, Some(name)) => format!("Interact with {} ({})", name, count),
            (ObjectiveKind::GameObject, None) => format!("Interact with gameobject ({}) ({})", id, count),
            (ObjectiveKind::SpellCast, Some(name)) => format!("Cast {}", name),
            (ObjectiveKind::SpellCast, None) => format!("Cast spell {}", id),
            (ObjectiveKind::None, _) => return,
        };
    }
}

/// The four objective slots of one quest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Objectives {
    slots: [Objective; OBJECTIVE_SLOTS],
    /// Required items that found no free slot; written back after the slotted ones.
    extra_items: Vec<(i64, i64)>,
    extra_spells: Vec<i64>,
}

impl Objectives {
    /// Read the slots back from a quest row.
    ///
    /// Creature and game object requirements keep their slot. Items and spell
    /// casts fill the remaining empty slots in column order.
    pub fn from_record(record: &QuestRecord) -> Self {
        let mut objectives = Objectives::default();
        for (idx, slot) in objectives.slots.iter_mut().enumerate() {
            let n = idx + 1;
            slot.text = record
                .get(&format!("ObjectiveText{}", n))
                .map(|v| v.to_string().trim().to_string())
                .unwrap_or_default();

            let id = record.get_i64(&format!("ReqCreatureOrGOId{}", n));
            if id != 0 {
                slot.kind = if id < 0 {
                    ObjectiveKind::GameObject
                } else {
                    ObjectiveKind::Creature
                };
                slot.id = id.abs();
                slot.count = record.get_i64(&format!("ReqCreatureOrGOCount{}", n)).max(0);
            }
        }

        for n in 1..=ITEM_COLUMNS {
            let id = record.get_i64(&format!("ReqItemId{}", n));
            if id <= 0 {
                continue;
            }
            let count = record.get_i64(&format!("ReqItemCount{}", n)).max(0);
            match objectives.slots.iter_mut().find(|s| s.is_empty()) {
                Some(slot) => {
                    slot.kind = ObjectiveKind::Item;
                    slot.id = id;
                    slot.count = count;
                }
                None => objectives.extra_items.push((id, count)),
            }
        }

        for n in 1..=OBJECTIVE_SLOTS {
            let id = record.get_i64(&format!("ReqSpellCast{}", n));
            if id <= 0 {
                continue;
            }
            match objectives.slots.iter_mut().find(|s| s.is_empty()) {
                Some(slot) => {
                    slot.kind = ObjectiveKind::SpellCast;
                    slot.id = id;
                    slot.count = 1;
                }
                None => objectives.extra_spells.push(id),
            }
        }

        objectives
    }

    pub fn slots(&self) -> &[Objective] {
        &self.slots
    }

    fn slot_mut(&mut self, slot: usize) -> Result<&mut Objective> {
        slot.checked_sub(1)
            .and_then(|idx| self.slots.get_mut(idx))
            .ok_or_else(|| {
                QuestforgeError::validation(
                    "slot",
                    format!("objective slot {} is outside 1..={}", slot, OBJECTIVE_SLOTS),
                )
            })
    }

    /// Put an objective into a 1-based slot, keeping the slot's text.
    pub fn set(&mut self, slot: usize, objective: Objective) -> Result<()> {
        let target = self.slot_mut(slot)?;
        let text = std::mem::take(&mut target.text);
        *target = Objective { text, ..objective };
        Ok(())
    }

    pub fn set_text(&mut self, slot: usize, text: &str) -> Result<()> {
        self.slot_mut(slot)?.text = text.trim().to_string();
        Ok(())
    }

    /// Generate the text of a 1-based slot from its kind, id and count.
    pub fn autofill(&mut self, slot: usize, names: Option<&dyn ObjectiveNames>) -> Result<()> {
        let target = self.slot_mut(slot)?;
        let name = names.and_then(|n| n.objective_name(target.kind, target.id));
        target.fill_text(name.as_deref());
        Ok(())
    }

    /// Non-empty objective lines joined for the quest's `Objectives` text.
    pub fn summary(&self) -> String {
        self.slots
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Column edits for the quest save.
    ///
    /// Every requirement column is written, so cleared slots reset to 0.
    /// `Objectives` is only replaced when at least one line has text.
    pub fn to_edits(&self) -> Vec<(String, String)> {
        let mut creature_or_go = [(0i64, 0i64); OBJECTIVE_SLOTS];
        let mut spells = [0i64; OBJECTIVE_SLOTS];
        let mut items = Vec::with_capacity(ITEM_COLUMNS);

        for (idx, slot) in self.slots.iter().enumerate() {
            let id = slot.id.abs();
            let count = slot.count.max(0);
            match slot.kind {
                ObjectiveKind::Creature => creature_or_go[idx] = (id, count),
                ObjectiveKind::GameObject => creature_or_go[idx] = (-id, count),
                ObjectiveKind::Item => items.push((id, count)),
                ObjectiveKind::SpellCast => spells[idx] = id,
                ObjectiveKind::None => {}
            }
        }
        items.extend(self.extra_items.iter().copied());
        for &spell in &self.extra_spells {
            if let Some(free) = spells.iter_mut().find(|s| **s == 0) {
                *free = spell;
            }
        }

        let mut edits = Vec::new();
        for (idx, slot) in self.slots.iter().enumerate() {
            let n = idx + 1;
            let (id, count) = creature_or_go[idx];
            edits.push((format!("ObjectiveText{}", n), slot.text.trim().to_string()));
            edits.push((format!("ReqCreatureOrGOId{}", n), id.to_string()));
            edits.push((format!("ReqCreatureOrGOCount{}", n), count.to_string()));
            edits.push((format!("ReqSpellCast{}", n), spells[idx].to_string()));
        }
        for n in 1..=ITEM_COLUMNS {
            let (id, count) = items.get(n - 1).copied().unwrap_or((0, 0));
            edits.push((format!("ReqItemId{}", n), id.to_string()));
            edits.push((format!("ReqItemCount{}", n), count.to_string()));
        }

        let summary = self.summary();
        if !summary.is_empty() {
            edits.push(("Objectives".to_string(), summary));
        }
        edits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Row, Value};
    use std::sync::Arc;

    fn record(columns: &[(&str, Value)]) -> QuestRecord {
        let names: Vec<String> = columns.iter().map(|(name, _)| name.to_string()).collect();
        let values = columns.iter().map(|(_, value)| value.clone()).collect();
        QuestRecord::from_row(1_000_001, &Row::new(Arc::new(names), values))
    }

    fn edit<'a>(edits: &'a [(String, String)], column: &str) -> &'a str {
        edits
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }

    struct Names;

    impl ObjectiveNames for Names {
        fn objective_name(&self, kind: ObjectiveKind, id: i64) -> Option<String> {
            match (kind, id) {
                (ObjectiveKind::Creature, 38) => Some("Defias Thug".into()),
                (ObjectiveKind::GameObject, 1593) => Some("Corpse Laden Boat".into()),
                (ObjectiveKind::Item, 772) => Some("Large Candle".into()),
                _ => None,
            }
        }
    }

    #[test]
    fn test_game_objects_are_stored_negative() {
        let mut objectives = Objectives::default();
        objectives.set(1, Objective::new(ObjectiveKind::Creature, 38, 8)).unwrap();
        objectives.set(2, Objective::new(ObjectiveKind::GameObject, 1593, 1)).unwrap();
        objectives.set(3, Objective::new(ObjectiveKind::GameObject, -1594, 2)).unwrap();

        let edits = objectives.to_edits();
        assert_eq!(edit(&edits, "ReqCreatureOrGOId1"), "38");
        assert_eq!(edit(&edits, "ReqCreatureOrGOCount1"), "8");
        assert_eq!(edit(&edits, "ReqCreatureOrGOId2"), "-1593");
        assert_eq!(edit(&edits, "ReqCreatureOrGOId3"), "-1594");
        assert_eq!(edit(&edits, "ReqCreatureOrGOId4"), "0");
    }

    #[test]
    fn test_items_pack_in_slot_order() {
        let mut objectives = Objectives::default();
        objectives.set(2, Objective::new(ObjectiveKind::Item, 772, 5)).unwrap();
        objectives.set(4, Objective::new(ObjectiveKind::Item, 884, 0)).unwrap();
        objectives.set(3, Objective::new(ObjectiveKind::SpellCast, 8690, 1)).unwrap();

        let edits = objectives.to_edits();
        assert_eq!(edit(&edits, "ReqItemId1"), "772");
        assert_eq!(edit(&edits, "ReqItemCount1"), "5");
        assert_eq!(edit(&edits, "ReqItemId2"), "884");
        assert_eq!(edit(&edits, "ReqItemId3"), "0");
        assert_eq!(edit(&edits, "ReqSpellCast3"), "8690");
        assert_eq!(edit(&edits, "ReqSpellCast1"), "0");
        assert_eq!(edit(&edits, "ReqCreatureOrGOId2"), "0");
    }

    #[test]
    fn test_generated_text() {
        let mut objectives = Objectives::default();
        objectives.set(1, Objective::new(ObjectiveKind::Creature, 38, 8)).unwrap();
        objectives.set(2, Objective::new(ObjectiveKind::GameObject, 1593, 0)).unwrap();
        objectives.set(3, Objective::new(ObjectiveKind::Item, 9999, 3)).unwrap();
        objectives.set(4, Objective::new(ObjectiveKind::SpellCast, 8690, 0)).unwrap();
        for slot in 1..=OBJECTIVE_SLOTS {
            objectives.autofill(slot, Some(&Names)).unwrap();
        }

        let texts: Vec<&str> = objectives.slots().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Slay 8 Defias Thug",
                "Interact with Corpse Laden Boat (1)",
                "Collect 3 item(s) (9999)",
                "Cast spell 8690",
            ]
        );
        assert_eq!(objectives.slots()[1].count, 1);
        assert_eq!(objectives.slots()[3].count, 0);

        let edits = objectives.to_edits();
        assert_eq!(edit(&edits, "ObjectiveText2"), "Interact with Corpse Laden Boat (1)");
        assert_eq!(
            edit(&edits, "Objectives"),
            "Slay 8 Defias Thug\nInteract with Corpse Laden Boat (1)\nCollect 3 item(s) (9999)\nCast spell 8690"
        );
    }

    #[test]
    fn test_autofill_skips_empty_slots() {
        let mut objectives = Objectives::default();
        objectives.set_text(1, " Find the boat ").unwrap();
        objectives.autofill(1, Some(&Names)).unwrap();
        assert_eq!(objectives.slots()[0].text, "Find the boat");

        objectives.set(1, Objective::new(ObjectiveKind::Item, 772, 0)).unwrap();
        assert_eq!(objectives.slots()[0].text, "Find the boat");
        objectives.autofill(1, None).unwrap();
        assert_eq!(objectives.slots()[0].text, "Collect 1 item(s) (772)");

        assert!(objectives.set(0, Objective::default()).is_err());
        assert!(objectives.set_text(5, "x").is_err());
    }

    #[test]
    fn test_from_record_round_trips_columns() {
        let quest = record(&[
            ("ObjectiveText1", Value::Text("Slay 8 Defias Thug".into())),
            ("ReqCreatureOrGOId1", Value::Int(38)),
            ("ReqCreatureOrGOCount1", Value::Int(8)),
            ("ReqCreatureOrGOId3", Value::Int(-1593)),
            ("ReqCreatureOrGOCount3", Value::Int(1)),
            ("ReqItemId1", Value::Int(772)),
            ("ReqItemCount1", Value::Int(4)),
            ("ReqItemId2", Value::Int(884)),
            ("ReqItemCount2", Value::Int(1)),
            ("ReqItemId3", Value::Int(885)),
            ("ReqItemCount3", Value::Int(2)),
            ("ReqSpellCast1", Value::Int(8690)),
            ("ObjectiveText2", Value::Null),
        ]);

        let objectives = Objectives::from_record(&quest);
        let kinds: Vec<ObjectiveKind> = objectives.slots().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ObjectiveKind::Creature,
                ObjectiveKind::Item,
                ObjectiveKind::GameObject,
                ObjectiveKind::Item,
            ]
        );
        assert_eq!(objectives.slots()[2].id, 1593);
        assert_eq!(objectives.slots()[1].text, "");

        let edits = objectives.to_edits();
        assert_eq!(edit(&edits, "ReqCreatureOrGOId3"), "-1593");
        assert_eq!(edit(&edits, "ReqItemId1"), "772");
        assert_eq!(edit(&edits, "ReqItemId2"), "884");
        assert_eq!(edit(&edits, "ReqItemId3"), "885");
        assert_eq!(edit(&edits, "ReqItemCount3"), "2");
        assert_eq!(edit(&edits, "ReqSpellCast1"), "8690");
        assert_eq!(edit(&edits, "Objectives"), "Slay 8 Defias Thug");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("go".parse::<ObjectiveKind>().unwrap(), ObjectiveKind::GameObject);
        assert_eq!("Spell".parse::<ObjectiveKind>().unwrap(), ObjectiveKind::SpellCast);
        assert!("quest".parse::<ObjectiveKind>().is_err());
    }
}
