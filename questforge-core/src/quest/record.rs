use super::fields::{FieldKind, SkillOrClass, ZoneOrSort, quest_field};
use crate::error::Result;
use crate::gateway::{Row, Value};
use serde::Serialize;

/// Resolves names for the reward summary.
pub trait RewardNames {
    fn item_name(&self, id: i64) -> Option<String>;
    fn currency_name(&self, id: i64) -> Option<String>;
}

/// One `quest_template` row, values normalized to their column kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestRecord {
    entry: u32,
    columns: Vec<(String, Value)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewardSummary {
    pub choice: Vec<String>,
    pub guaranteed: Vec<String>,
}

/// One column whose value differs from the loaded snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub column: String,
    pub old: Value,
    pub new: Value,
}

impl QuestRecord {
    pub fn from_row(entry: u32, row: &Row) -> Self {
        let columns = row
            .iter()
            .map(|(name, value)| match quest_field(name) {
                Some(field) => (field.column.to_string(), field.normalize(value)),
                None => (name.to_string(), value.clone()),
            })
            .collect();
        Self { entry, columns }
    }

    pub fn entry(&self) -> u32 {
        self.entry
    }

    pub fn columns(&self) -> &[(String, Value)] {
        &self.columns
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    pub fn get_i64(&self, column: &str) -> i64 {
        self.get(column).and_then(Value::as_i64).unwrap_or(0)
    }

    pub fn title(&self) -> String {
        self.get("Title").map(Value::to_string).unwrap_or_default()
    }

    /// Non-zero required item ids, ReqItemId1-6.
    pub fn required_items(&self) -> Vec<i64> {
        (1..=6)
            .map(|n| self.get_i64(&format!("ReqItemId{}", n)))
            .filter(|&id| id > 0)
            .collect()
    }

    pub fn zone_or_sort(&self) -> ZoneOrSort {
        ZoneOrSort::decode(self.get_i64("ZoneOrSort"))
    }

    pub fn skill_or_class(&self) -> SkillOrClass {
        SkillOrClass::decode(self.get_i64("SkillOrClassMask"))
    }

    /// Parse user edits by column kind. Unknown columns and `entry` are rejected.
    pub fn parse_edits(edits: &[(String, String)]) -> Result<Vec<(String, Value)>> {
        edits
            .iter()
            .map(|(column, raw)| {
                let field = quest_field(column)
                    .filter(|f| f.column != "entry")
                    .ok_or_else(|| {
                        crate::error::QuestforgeError::validation(column.as_str(), "not an editable quest_template column")
                    })?;
                Ok((field.column.to_string(), field.parse(raw)?))
            })
            .collect()
    }

    /// Columns whose rendered value differs from this snapshot.
    pub fn diff(&self, edits: &[(String, Value)]) -> Vec<FieldChange> {
        edits
            .iter()
            .filter_map(|(column, new)| {
                let old = self.get(column).cloned().unwrap_or(Value::Null);
                let same = match (quest_field(column).map(|f| f.kind), &old, new) {
                    (Some(FieldKind::Float), a, b) => match (a.as_f64(), b.as_f64()) {
                        (Some(a), Some(b)) => (a - b).abs() < 1e-6,
                        _ => a.to_string() == b.to_string(),
                    },
                    (_, a, b) => a.to_string() == b.to_string(),
                };
                (!same).then(|| FieldChange {
                    column: column.clone(),
                    old,
                    new: new.clone(),
                })
            })
            .collect()
    }

    pub fn reward_summary(&self, names: Option<&dyn RewardNames>) -> RewardSummary {
        let item_name = |id: i64| {
            names
                .and_then(|n| n.item_name(id))
                .unwrap_or_else(|| format!("Item {}", id))
        };
        let currency_name = |id: i64| {
            names
                .and_then(|n| n.currency_name(id))
                .unwrap_or_else(|| format!("Currency {}", id))
        };
        let count_or_one = |column: String| match self.get(&column).and_then(Value::as_i64) {
            Some(0) | None => 1,
            Some(count) => count,
        };

        let mut summary = RewardSummary::default();

        for n in 1..=6 {
            let id = self.get_i64(&format!("RewChoiceItemId{}", n));
            if id > 0 {
                let count = count_or_one(format!("RewChoiceItemCount{}", n));
                summary.choice.push(format!("{} \u{d7}{}", item_name(id), count));
            }
        }

        for n in 1..=4 {
            let id = self.get_i64(&format!("RewItemId{}", n));
            if id > 0 {
                let count = count_or_one(format!("RewItemCount{}", n));
                summary.guaranteed.push(format!("{} \u{d7}{}", item_name(id), count));
            }
        }

        let money = self.get_i64("RewOrReqMoney");
        if money != 0 {
            summary.guaranteed.push(format!("Money: {}", money_to_text(money)));
        }

        for n in 1..=4 {
            let id = self.get_i64(&format!("RewCurrencyId{}", n));
            let count = self.get_i64(&format!("RewCurrencyCount{}", n));
            if id > 0 && count > 0 {
                summary.guaranteed.push(format!("{} \u{d7}{}", currency_name(id), count));
            }
        }

        let spell = self.get_i64("RewSpell");
        if spell > 0 {
            summary.guaranteed.push(format!("Reward Spell: Spell {}", spell));
        }
        let cast = self.get_i64("RewSpellCast");
        if cast > 0 {
            summary.guaranteed.push(format!("Cast on Turn-in: Spell {}", cast));
        }

        summary
    }
}

/// `12g 3s 4c`; zero parts are left out, a negative amount keeps its sign.
pub fn money_to_text(copper: i64) -> String {
    let sign = if copper < 0 { "-" } else { "" };
    let copper = copper.unsigned_abs();
    let (gold, silver, copper) = (copper / 10_000, (copper % 10_000) / 100, copper % 100);

    let mut parts = Vec::new();
    if gold > 0 {
        parts.push(format!("{}g", gold));
    }
    if silver > 0 {
        parts.push(format!("{}s", silver));
    }
    if copper > 0 || parts.is_empty() {
        parts.push(format!("{}c", copper));
    }
    format!("{}{}", sign, parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(cells: &[(&str, Value)]) -> QuestRecord {
        let columns = Arc::new(cells.iter().map(|(c, _)| c.to_string()).collect::<Vec<_>>());
        let values = cells.iter().map(|(_, v)| v.clone()).collect();
        QuestRecord::from_row(1_000_001, &Row::new(columns, values))
    }

    struct Names;

    impl RewardNames for Names {
        fn item_name(&self, id: i64) -> Option<String> {
            (id == 2589).then(|| "Linen Cloth".to_string())
        }

        fn currency_name(&self, _id: i64) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_money_to_text() {
        assert_eq!(money_to_text(0), "0c");
        assert_eq!(money_to_text(12_345), "1g 23s 45c");
        assert_eq!(money_to_text(20_000), "2g");
        assert_eq!(money_to_text(-150), "-1s 50c");
    }

    #[test]
    fn test_reward_summary() {
        let quest = record(&[
            ("entry", Value::Int(1_000_001)),
            ("RewChoiceItemId1", Value::Int(2589)),
            ("RewChoiceItemCount1", Value::Int(0)),
            ("RewChoiceItemId2", Value::Int(25)),
            ("RewChoiceItemCount2", Value::Int(3)),
            ("RewItemId1", Value::Int(0)),
            ("RewOrReqMoney", Value::Int(-250)),
            ("RewCurrencyId1", Value::Int(395)),
            ("RewCurrencyCount1", Value::Int(10)),
            ("RewCurrencyId2", Value::Int(396)),
            ("RewCurrencyCount2", Value::Int(0)),
            ("RewSpell", Value::Int(0)),
            ("RewSpellCast", Value::Int(8690)),
        ]);

        let summary = quest.reward_summary(Some(&Names as &dyn RewardNames));
        assert_eq!(summary.choice, vec!["Linen Cloth \u{d7}1", "Item 25 \u{d7}3"]);
        assert_eq!(
            summary.guaranteed,
            vec!["Money: -2s 50c", "Currency 395 \u{d7}10", "Cast on Turn-in: Spell 8690"]
        );

        let plain = quest.reward_summary(None);
        assert_eq!(plain.choice[0], "Item 2589 \u{d7}1");
    }

    #[test]
    fn test_values_are_normalized_by_kind() {
        let quest = record(&[
            ("entry", Value::Int(1_000_001)),
            ("MinLevel", Value::Text("12".into())),
            ("PointX", Value::Int(3)),
            ("Title", Value::Null),
            ("ZoneOrSort", Value::Int(-284)),
            ("ReqItemId1", Value::Int(884)),
            ("ReqItemId3", Value::Int(2589)),
        ]);
        assert_eq!(quest.get("MinLevel"), Some(&Value::Int(12)));
        assert_eq!(quest.get("PointX"), Some(&Value::Float(3.0)));
        assert_eq!(quest.title(), "");
        assert_eq!(quest.zone_or_sort(), ZoneOrSort::Sort(284));
        assert_eq!(quest.required_items(), vec![884, 2589]);
    }

    #[test]
    fn test_diff_only_reports_changed_columns() {
        let quest = record(&[
            ("entry", Value::Int(1_000_001)),
            ("Title", Value::Text("Old".into())),
            ("MinLevel", Value::Int(5)),
            ("PointY", Value::Float(1.5)),
        ]);
        let edits = QuestRecord::parse_edits(&[
            ("title".to_string(), "New".to_string()),
            ("MinLevel".to_string(), "5".to_string()),
            ("PointY".to_string(), "1.5".to_string()),
        ])
        .unwrap();
        let changes = quest.diff(&edits);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].column, "Title");
        assert_eq!(changes[0].new, Value::Text("New".into()));

        assert!(QuestRecord::parse_edits(&[("entry".into(), "5".into())]).is_err());
        assert!(QuestRecord::parse_edits(&[("MinLevel".into(), "x".into())]).is_err());
    }
}
