//! The `conditions` row and the rules that fill in and check its values.

mod catalog;
pub mod store;

pub use catalog::{
    ANCHOR_CONDITION_TYPE, CONDITION_TYPE_HEADER, CONDITION_TYPES, ConditionTypeInfo, FieldLabels,
    QUEST_AVAILABLE_SOURCE_TYPE, QUEST_CONDITION_TYPES, SOURCE_TYPE_HEADER, SOURCE_TYPES,
    SourceTypeInfo, condition_type_info, condition_type_tooltip, field_labels, source_type_info,
    source_type_tooltip, valid_condition_types,
};

use crate::error::{QuestforgeError, Result};
use crate::gateway::{Row, Value};
use crate::loot::LootTable;
use serde::Serialize;

/// Column order used for every insert and select.
pub const COLUMNS: [&str; 15] = [
    "SourceTypeOrReferenceId",
    "SourceGroup",
    "SourceEntry",
    "SourceId",
    "ElseGroup",
    "ConditionTypeOrReference",
    "ConditionTarget",
    "ConditionValue1",
    "ConditionValue2",
    "ConditionValue3",
    "NegativeCondition",
    "ErrorType",
    "ErrorTextId",
    "ScriptName",
    "Comment",
];

/// Composite primary key of `conditions`, a prefix of [`COLUMNS`].
pub const PRIMARY_KEY: [&str; 11] = [
    "SourceTypeOrReferenceId",
    "SourceGroup",
    "SourceEntry",
    "SourceId",
    "ElseGroup",
    "ConditionTypeOrReference",
    "ConditionTarget",
    "ConditionValue1",
    "ConditionValue2",
    "ConditionValue3",
    "NegativeCondition",
];

/// The four columns that say what a condition is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConditionKey {
    pub source_type: i32,
    pub source_group: i64,
    pub source_entry: i64,
    pub source_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub source_type: i32,
    pub source_group: i64,
    pub source_entry: i64,
    pub source_id: i64,
    pub else_group: i64,
    pub condition_type: i32,
    pub condition_target: i64,
    pub value1: i64,
    pub value2: i64,
    pub value3: i64,
    pub negative: i64,
    pub error_type: i64,
    pub error_text_id: i64,
    pub script_name: String,
    pub comment: String,
}

impl Condition {
    /// A fresh row for `source_type`.
    ///
    /// Quest-anchored loot sources get the quest as SourceId and a QUESTTAKEN anchor
    /// on it. QUEST_AVAILABLE points SourceEntry at the quest. Everything else is 0.
    pub fn new_for(source_type: i32, quest: Option<u32>) -> Self {
        let mut condition = Condition {
            source_type,
            ..Default::default()
        };
        let Some(quest) = quest else {
            return condition;
        };
        let quest = i64::from(quest);

        if source_type_info(source_type).is_some_and(|info| info.is_quest_anchored()) {
            condition.source_id = quest;
            condition.condition_type = ANCHOR_CONDITION_TYPE;
            condition.value1 = quest;
        } else if source_type == QUEST_AVAILABLE_SOURCE_TYPE {
            condition.source_entry = quest;
        }
        condition
    }

    /// Switch to another source type and move the quest anchors with it.
    ///
    /// Columns the new type anchors take the quest. Columns only the old type
    /// anchored are cleared while they still hold the quest; user values stay.
    pub fn retarget_source(&mut self, source_type: i32, quest: Option<u32>) {
        if source_type == self.source_type {
            return;
        }
        let stale = Condition::new_for(self.source_type, quest);
        let fresh = Condition::new_for(source_type, quest);
        self.source_type = source_type;

        let move_anchor = |current: i64, stale: i64, fresh: i64| {
            if fresh != 0 {
                fresh
            } else if stale != 0 && current == stale {
                0
            } else {
                current
            }
        };
        self.source_id = move_anchor(self.source_id, stale.source_id, fresh.source_id);
        self.source_entry = move_anchor(self.source_entry, stale.source_entry, fresh.source_entry);

        if self.condition_type == 0 && fresh.condition_type != 0 {
            self.condition_type = fresh.condition_type;
            self.value1 = fresh.value1;
        }
    }

    pub fn from_row(row: &Row) -> Self {
        let int = |name: &str| row.get_i64(name).unwrap_or(0);
        Condition {
            source_type: int("SourceTypeOrReferenceId") as i32,
            source_group: int("SourceGroup"),
            source_entry: int("SourceEntry"),
            source_id: int("SourceId"),
            else_group: int("ElseGroup"),
            condition_type: int("ConditionTypeOrReference") as i32,
            condition_target: int("ConditionTarget"),
            value1: int("ConditionValue1"),
            value2: int("ConditionValue2"),
            value3: int("ConditionValue3"),
            negative: int("NegativeCondition"),
            error_type: int("ErrorType"),
            error_text_id: int("ErrorTextId"),
            script_name: row.get_string("ScriptName").unwrap_or_default(),
            comment: row.get_string("Comment").unwrap_or_default(),
        }
    }

    pub fn key(&self) -> ConditionKey {
        ConditionKey {
            source_type: self.source_type,
            source_group: self.source_group,
            source_entry: self.source_entry,
            source_id: self.source_id,
        }
    }

    /// Values in [`COLUMNS`] order.
    pub fn column_values(&self) -> Vec<Value> {
        let mut values = self.primary_key_values();
        values.push(self.error_type.into());
        values.push(self.error_text_id.into());
        values.push(self.script_name.as_str().into());
        values.push(self.comment.as_str().into());
        values
    }

    /// Values in [`PRIMARY_KEY`] order.
    pub fn primary_key_values(&self) -> Vec<Value> {
        vec![
            self.source_type.into(),
            self.source_group.into(),
            self.source_entry.into(),
            self.source_id.into(),
            self.else_group.into(),
            self.condition_type.into(),
            self.condition_target.into(),
            self.value1.into(),
            self.value2.into(),
            self.value3.into(),
            self.negative.into(),
        ]
    }

    pub fn source_info(&self) -> Option<&'static SourceTypeInfo> {
        source_type_info(self.source_type)
    }

    pub fn condition_info(&self) -> Option<&'static ConditionTypeInfo> {
        condition_type_info(self.condition_type)
    }

    pub fn loot_table(&self) -> Option<LootTable> {
        LootTable::for_source_type(self.source_type)
    }

    pub fn labels(&self) -> FieldLabels {
        field_labels(self.source_type, self.condition_type)
    }

    /// Fill values the current condition type expects, leaving non-zero values alone.
    /// References (negative types) are never touched.
    pub fn apply_condition_type_defaults(&mut self, quest: Option<u32>) {
        if self.condition_type < 0 {
            return;
        }
        let Some(info) = self.condition_info() else {
            return;
        };
        if self.value2 == 0 && info.value2_default != 0 {
            self.value2 = info.value2_default;
        }
        if let Some(quest) = quest
            && info.takes_quest_id()
            && self.value1 == 0
        {
            self.value1 = i64::from(quest);
        }
    }

    /// Checks run before any write.
    pub fn normalize_and_validate(&mut self, quest: Option<u32>) -> Result<()> {
        self.script_name = self.script_name.trim().to_string();
        self.comment = self.comment.trim().to_string();

        if let Some(quest) = quest
            && self.condition_type == ANCHOR_CONDITION_TYPE
            && self.value1 <= 0
        {
            self.value1 = i64::from(quest);
        }

        if self.condition_type >= 0 {
            let allowed = valid_condition_types(self.source_type)
                .iter()
                .any(|info| info.id == self.condition_type);
            if !allowed {
                return Err(QuestforgeError::validation(
                    "ConditionTypeOrReference",
                    format!(
                        "condition type {} is not valid for source type {}",
                        self.condition_type, self.source_type
                    ),
                ));
            }
        }

        if self.loot_table().is_some() {
            if self.source_group <= 0 {
                return Err(QuestforgeError::validation(
                    "SourceGroup",
                    "Set SourceGroup (template entry).",
                ));
            }
            if self.source_entry <= 0 {
                return Err(QuestforgeError::validation(
                    "SourceEntry",
                    "Set SourceEntry (item id).",
                ));
            }
        }
        if self.else_group < 0 {
            return Err(QuestforgeError::validation("ElseGroup", "must not be negative"));
        }
        Ok(())
    }

    /// Quest-type condition pointing at `quest`.
    pub fn is_anchor_for(&self, quest: u32) -> bool {
        let quest = i64::from(quest);
        QUEST_CONDITION_TYPES.contains(&self.condition_type)
            && [self.value1, self.value2, self.value3].contains(&quest)
    }

    /// Set one column from user input. Changing the condition type applies its defaults.
    pub fn set_field(&mut self, column: &str, raw: &str, quest: Option<u32>) -> Result<()> {
        let raw = raw.trim();
        let int = || -> Result<i64> {
            if raw.is_empty() {
                return Ok(0);
            }
            raw.parse::<i64>()
                .map_err(|_| QuestforgeError::validation(column, format!("'{}' is not an integer", raw)))
        };
        let small = || -> Result<i32> {
            i32::try_from(int()?)
                .map_err(|_| QuestforgeError::validation(column, format!("'{}' is out of range", raw)))
        };

        match column {
            "SourceTypeOrReferenceId" => {
                let source_type = small()?;
                self.retarget_source(source_type, quest);
            }
            "SourceGroup" => self.source_group = int()?,
            "SourceEntry" => self.source_entry = int()?,
            "SourceId" => self.source_id = int()?,
            "ElseGroup" => self.else_group = int()?,
            "ConditionTypeOrReference" => {
                self.condition_type = small()?;
                self.apply_condition_type_defaults(quest);
            }
            "ConditionTarget" => self.condition_target = int()?,
            "ConditionValue1" => self.value1 = int()?,
            "ConditionValue2" => self.value2 = int()?,
            "ConditionValue3" => self.value3 = int()?,
            "NegativeCondition" => self.negative = int()?,
            "ErrorType" => self.error_type = int()?,
            "ErrorTextId" => self.error_text_id = int()?,
            "ScriptName" => self.script_name = raw.to_string(),
            "Comment" => self.comment = raw.to_string(),
            other => {
                return Err(QuestforgeError::validation(other, "unknown conditions column"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_condition_source_id_defaults_to_zero() {
        for source_type in [0, 13, 17, 22] {
            let condition = Condition::new_for(source_type, Some(12345));
            assert_eq!(condition.source_id, 0, "source {}", source_type);
        }
        assert_eq!(Condition::new_for(1, None).source_id, 0);
        // reference loot is shared and never takes the quest
        assert_eq!(Condition::new_for(10, Some(12345)).source_id, 0);
    }

    #[test]
    fn test_new_condition_for_quest_anchored_source() {
        let condition = Condition::new_for(1, Some(12345));
        assert_eq!(condition.source_id, 12345);
        assert_eq!(condition.condition_type, ANCHOR_CONDITION_TYPE);
        assert_eq!(condition.value1, 12345);
        assert!(condition.is_anchor_for(12345));
        assert!(!condition.is_anchor_for(12346));

        let available = Condition::new_for(QUEST_AVAILABLE_SOURCE_TYPE, Some(12345));
        assert_eq!(available.source_entry, 12345);
        assert_eq!(available.source_id, 0);
    }

    #[test]
    fn test_retarget_source_moves_quest_anchors() {
        let mut condition = Condition::new_for(1, Some(12345));
        condition.source_group = 38;
        condition.source_entry = 772;
        condition.set_field("SourceTypeOrReferenceId", "10", Some(12345)).unwrap();
        assert_eq!(condition.source_type, 10);
        assert_eq!(condition.source_id, 0);
        assert_eq!((condition.source_group, condition.source_entry), (38, 772));
        assert_eq!(condition.condition_type, ANCHOR_CONDITION_TYPE);

        condition.set_field("SourceTypeOrReferenceId", "4", Some(12345)).unwrap();
        assert_eq!(condition.source_id, 12345);

        let mut available = Condition::new_for(QUEST_AVAILABLE_SOURCE_TYPE, Some(12345));
        available.set_field("SourceTypeOrReferenceId", "1", Some(12345)).unwrap();
        assert_eq!(available.source_entry, 0);
        assert_eq!(available.source_id, 12345);
        assert!(available.is_anchor_for(12345));

        let mut loot = Condition::new_for(1, Some(12345));
        loot.source_entry = 884;
        loot.set_field("SourceTypeOrReferenceId", &QUEST_AVAILABLE_SOURCE_TYPE.to_string(), Some(12345))
            .unwrap();
        assert_eq!(loot.source_entry, 12345);
        assert_eq!(loot.source_id, 0);
    }

    #[test]
    fn test_retarget_keeps_user_source_id() {
        let mut condition = Condition::new_for(13, Some(12345));
        condition.source_id = 3;
        condition.retarget_source(22, Some(12345));
        assert_eq!(condition.source_id, 3);
    }

    #[test]
    fn test_condition_type_defaults_fill_only_empty_values() {
        let mut condition = Condition::new_for(1, None);
        condition.set_field("ConditionTypeOrReference", "2", Some(7)).unwrap();
        assert_eq!(condition.value2, 1);

        condition.value2 = 4;
        condition.set_field("ConditionTypeOrReference", "29", Some(7)).unwrap();
        assert_eq!(condition.value2, 4);

        let mut condition = Condition::new_for(1, None);
        condition.set_field("ConditionTypeOrReference", "28", Some(7)).unwrap();
        assert_eq!(condition.value1, 7);

        let mut condition = Condition::new_for(1, None);
        condition.set_field("ConditionTypeOrReference", "-3", Some(7)).unwrap();
        assert_eq!((condition.value1, condition.value2), (0, 0));
    }

    #[test]
    fn test_normalize_requires_loot_keys() {
        let mut condition = Condition::new_for(1, Some(99));
        let err = condition.normalize_and_validate(Some(99)).unwrap_err();
        assert!(matches!(err, QuestforgeError::Validation { ref field, .. } if field == "SourceGroup"));

        condition.source_group = 38;
        let err = condition.normalize_and_validate(Some(99)).unwrap_err();
        assert!(matches!(err, QuestforgeError::Validation { ref field, .. } if field == "SourceEntry"));

        condition.source_entry = 884;
        condition.value1 = 0;
        condition.comment = "  needs quest  ".into();
        condition.normalize_and_validate(Some(99)).unwrap();
        assert_eq!(condition.value1, 99);
        assert_eq!(condition.comment, "needs quest");
    }

    #[test]
    fn test_normalize_rejects_second_target_on_loot() {
        let mut condition = Condition::new_for(1, Some(5));
        condition.source_group = 1;
        condition.source_entry = 2;
        condition.condition_type = 33;
        assert!(condition.normalize_and_validate(Some(5)).is_err());
    }

    #[test]
    fn test_set_field_rejects_garbage() {
        let mut condition = Condition::default();
        let err = condition.set_field("SourceGroup", "abc", None).unwrap_err();
        assert!(matches!(err, QuestforgeError::Validation { ref field, .. } if field == "SourceGroup"));
        assert!(condition.set_field("Nope", "1", None).is_err());
        condition.set_field("SourceEntry", "", None).unwrap();
        assert_eq!(condition.source_entry, 0);
    }

    #[test]
    fn test_column_values_follow_column_order() {
        let mut condition = Condition::new_for(1, Some(3));
        condition.comment = "x".into();
        let values = condition.column_values();
        assert_eq!(values.len(), COLUMNS.len());
        assert_eq!(values[0], Value::Int(1));
        assert_eq!(values[3], Value::Int(3));
        assert_eq!(values[14], Value::Text("x".into()));
        assert_eq!(&COLUMNS[..11], &PRIMARY_KEY[..]);
    }
}
