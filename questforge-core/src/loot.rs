//! One loot editor for the whole `*_loot_template` family.
//!
//! The tables share a schema, so which one is edited is only a descriptor
//! looked up from the condition's `SourceTypeOrReferenceId`.

use crate::error::{QuestforgeError, Result};
use crate::gateway::{Gateway, Row, UpsertOutcome};
use crate::values;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

const CHANCE_EPSILON: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LootTable {
    Creature,
    Disenchant,
    Fishing,
    GameObject,
    Item,
    Mail,
    Milling,
    Pickpocketing,
    Prospecting,
    Reference,
    Skinning,
    Spell,
}

/// Static description of one loot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LootTableDescriptor {
    pub source_type: i32,
    pub label: &'static str,
    pub table: &'static str,
    pub key_columns: [&'static str; 2],
    pub columns: &'static [&'static str],
}

pub const LOOT_COLUMNS: &[&str] = &[
    "entry",
    "item",
    "ChanceOrQuestChance",
    "lootmode",
    "groupid",
    "mincountOrRef",
    "maxcount",
];

const fn descriptor(source_type: i32, label: &'static str, table: &'static str) -> LootTableDescriptor {
    LootTableDescriptor {
        source_type,
        label,
        table,
        key_columns: ["entry", "item"],
        columns: LOOT_COLUMNS,
    }
}

static DESCRIPTORS: [LootTableDescriptor; 12] = [
    descriptor(1, "Creature Loot", "creature_loot_template"),
    descriptor(2, "Disenchant Loot", "disenchant_loot_template"),
    descriptor(3, "Fishing Loot", "fishing_loot_template"),
    descriptor(4, "Object Loot", "gameobject_loot_template"),
    descriptor(5, "Item Loot", "item_loot_template"),
    descriptor(6, "Mail Loot", "mail_loot_template"),
    descriptor(7, "Milling Loot", "milling_loot_template"),
    descriptor(8, "Pickpocketing Loot", "pickpocketing_loot_template"),
    descriptor(9, "Prospecting Loot", "prospecting_loot_template"),
    descriptor(10, "Reference Loot", "reference_loot_template"),
    descriptor(11, "Skinning Loot", "skinning_loot_template"),
    descriptor(12, "Spell Loot", "spell_loot_template"),
];

impl LootTable {
    pub const ALL: [LootTable; 12] = [
        LootTable::Creature,
        LootTable::Disenchant,
        LootTable::Fishing,
        LootTable::GameObject,
        LootTable::Item,
        LootTable::Mail,
        LootTable::Milling,
        LootTable::Pickpocketing,
        LootTable::Prospecting,
        LootTable::Reference,
        LootTable::Skinning,
        LootTable::Spell,
    ];

    pub fn descriptor(self) -> &'static LootTableDescriptor {
        &DESCRIPTORS[self as usize]
    }

    pub fn for_source_type(source_type: i32) -> Option<LootTable> {
        LootTable::ALL
            .into_iter()
            .find(|table| table.descriptor().source_type == source_type)
    }

    pub fn table_name(self) -> &'static str {
        self.descriptor().table
    }

    pub fn label(self) -> &'static str {
        self.descriptor().label
    }

    pub fn source_type(self) -> i32 {
        self.descriptor().source_type
    }
}

impl std::fmt::Display for LootTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LootRow {
    pub entry: i64,
    pub item: i64,
    pub chance: f64,
    pub lootmode: i64,
    pub groupid: i64,
    pub mincount_or_ref: i64,
    pub maxcount: i64,
}

impl LootRow {
    /// Quest-drop defaults: a negative chance marks the drop as quest-only.
    pub fn with_defaults(entry: i64, item: i64) -> Self {
        LootRow {
            entry,
            item,
            chance: -100.0,
            lootmode: 1,
            groupid: 0,
            mincount_or_ref: 1,
            maxcount: 1,
        }
    }

    fn from_row(row: &Row) -> Self {
        LootRow {
            entry: row.get_i64("entry").unwrap_or(0),
            item: row.get_i64("item").unwrap_or(0),
            chance: row.get_f64("ChanceOrQuestChance").unwrap_or(0.0),
            lootmode: row.get_i64("lootmode").unwrap_or(0),
            groupid: row.get_i64("groupid").unwrap_or(0),
            mincount_or_ref: row.get_i64("mincountOrRef").unwrap_or(0),
            maxcount: row.get_i64("maxcount").unwrap_or(0),
        }
    }

    pub fn is_quest_drop(&self) -> bool {
        self.chance < 0.0
    }

    /// Same stored values; chance is a FLOAT column and compared with a tolerance.
    pub fn same_values(&self, other: &LootRow) -> bool {
        self.entry == other.entry
            && self.item == other.item
            && (self.chance - other.chance).abs() < CHANCE_EPSILON
            && self.lootmode == other.lootmode
            && self.groupid == other.groupid
            && self.mincount_or_ref == other.mincount_or_ref
            && self.maxcount == other.maxcount
    }

    pub fn validate(&self) -> Result<()> {
        check_key(self.entry, self.item)?;
        if self.mincount_or_ref > 0 && self.maxcount < self.mincount_or_ref {
            return Err(QuestforgeError::validation(
                "maxcount",
                format!("{} is below mincountOrRef {}", self.maxcount, self.mincount_or_ref),
            ));
        }
        Ok(())
    }
}

fn check_key(entry: i64, item: i64) -> Result<()> {
    if entry <= 0 {
        return Err(QuestforgeError::validation("entry", "must be positive"));
    }
    if item <= 0 {
        return Err(QuestforgeError::validation("item", "must be positive"));
    }
    Ok(())
}

fn select_sql(table: LootTable, filter: &str) -> String {
    format!(
        "SELECT {} FROM {} WHERE {}",
        table.descriptor().columns.join(", "),
        table.table_name(),
        filter
    )
}

/// Rows of `table` for one reference id, ordered by item.
pub fn fetch_rows(gateway: &dyn Gateway, table: LootTable, entry: i64) -> Result<Vec<LootRow>> {
    let sql = format!("{} ORDER BY item", select_sql(table, "entry = ?"));
    let rows = gateway.fetch_all(&sql, &values![entry])?;
    Ok(rows.iter().map(LootRow::from_row).collect())
}

pub fn fetch_row(gateway: &dyn Gateway, table: LootTable, entry: i64, item: i64) -> Result<Option<LootRow>> {
    let sql = select_sql(table, "entry = ? AND item = ?");
    Ok(gateway
        .fetch_one(&sql, &values![entry, item])?
        .map(|row| LootRow::from_row(&row)))
}

pub fn count_row(gateway: &dyn Gateway, table: LootTable, entry: i64, item: i64) -> Result<u64> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE entry = ? AND item = ?",
        table.table_name()
    );
    gateway.fetch_count(&sql, &values![entry, item])
}

pub fn delete_row(gateway: &dyn Gateway, table: LootTable, entry: i64, item: i64) -> Result<u64> {
    let sql = format!("DELETE FROM {} WHERE entry = ? AND item = ?", table.table_name());
    gateway.execute(&sql, &values![entry, item])
}

pub fn upsert_row(gateway: &dyn Gateway, table: LootTable, row: &LootRow) -> Result<UpsertOutcome> {
    row.validate()?;
    match fetch_row(gateway, table, row.entry, row.item)? {
        Some(existing) if existing.same_values(row) => Ok(UpsertOutcome::Unchanged),
        Some(_) => {
            let sql = format!(
                "UPDATE {} SET ChanceOrQuestChance = ?, lootmode = ?, groupid = ?, mincountOrRef = ?, maxcount = ? \
                 WHERE entry = ? AND item = ?",
                table.table_name()
            );
            gateway.execute(
                &sql,
                &values![
                    row.chance,
                    row.lootmode,
                    row.groupid,
                    row.mincount_or_ref,
                    row.maxcount,
                    row.entry,
                    row.item
                ],
            )?;
            info!("Updated {} entry={} item={}", table, row.entry, row.item);
            Ok(UpsertOutcome::Updated)
        }
        None => {
            let sql = format!(
                "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
                table.table_name(),
                table.descriptor().columns.join(", ")
            );
            gateway.execute(
                &sql,
                &values![
                    row.entry,
                    row.item,
                    row.chance,
                    row.lootmode,
                    row.groupid,
                    row.mincount_or_ref,
                    row.maxcount
                ],
            )?;
            info!("Inserted {} entry={} item={}", table, row.entry, row.item);
            Ok(UpsertOutcome::Inserted)
        }
    }
}

/// Editor over one loot table at a time, following the selected condition row.
pub struct LootEditor {
    gateway: Arc<dyn Gateway>,
    table: Option<LootTable>,
    reference_id: Option<i64>,
    focus: Option<(i64, i64)>,
    rows: Vec<LootRow>,
}

impl LootEditor {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            table: None,
            reference_id: None,
            focus: None,
            rows: Vec::new(),
        }
    }

    /// Point at another table. Rows loaded from the previous one are dropped.
    pub fn retarget(&mut self, table: LootTable) {
        if self.table != Some(table) {
            debug!("Loot editor now on {}", table);
        }
        self.table = Some(table);
        self.reference_id = None;
        self.focus = None;
        self.rows.clear();
    }

    /// Empty and disabled.
    pub fn reset(&mut self) {
        self.table = None;
        self.reference_id = None;
        self.focus = None;
        self.rows.clear();
    }

    pub fn is_active(&self) -> bool {
        self.table.is_some()
    }

    pub fn table(&self) -> Option<LootTable> {
        self.table
    }

    pub fn reference_id(&self) -> Option<i64> {
        self.reference_id
    }

    pub fn focus(&mut self, entry: i64, item: i64) {
        self.focus = Some((entry, item));
    }

    pub fn focused(&self) -> Option<(i64, i64)> {
        self.focus
    }

    /// The focused row, if it is among the loaded ones.
    pub fn focused_row(&self) -> Option<&LootRow> {
        let (entry, item) = self.focus?;
        self.rows.iter().find(|r| r.entry == entry && r.item == item)
    }

    pub fn rows(&self) -> &[LootRow] {
        &self.rows
    }

    fn active_table(&self) -> Result<LootTable> {
        self.table
            .ok_or_else(|| QuestforgeError::InvalidState("no loot table selected".to_string()))
    }

    /// Load exactly the rows whose entry equals `reference_id`.
    pub fn load(&mut self, reference_id: i64) -> Result<&[LootRow]> {
        let table = self.active_table()?;
        self.rows = fetch_rows(self.gateway.as_ref(), table, reference_id)?;
        self.reference_id = Some(reference_id);
        debug!("Loaded {} rows from {} for entry {}", self.rows.len(), table, reference_id);
        Ok(&self.rows)
    }

    fn reload(&mut self) -> Result<()> {
        if let Some(reference_id) = self.reference_id {
            self.load(reference_id)?;
        }
        Ok(())
    }

    pub fn get(&self, entry: i64, item: i64) -> Result<Option<LootRow>> {
        check_key(entry, item)?;
        fetch_row(self.gateway.as_ref(), self.active_table()?, entry, item)
    }

    pub fn upsert(&mut self, row: &LootRow) -> Result<UpsertOutcome> {
        let outcome = upsert_row(self.gateway.as_ref(), self.active_table()?, row)?;
        if outcome != UpsertOutcome::Unchanged {
            self.reload()?;
        }
        Ok(outcome)
    }

    pub fn save(&mut self, rows: &[LootRow]) -> Result<Vec<UpsertOutcome>> {
        let table = self.active_table()?;
        let outcomes = rows
            .iter()
            .map(|row| upsert_row(self.gateway.as_ref(), table, row))
            .collect::<Result<Vec<_>>>()?;
        self.reload()?;
        Ok(outcomes)
    }

    /// Insert a quest-drop row for the key unless one exists. Returns whether it inserted.
    pub fn create_if_missing(&mut self, entry: i64, item: i64) -> Result<bool> {
        if self.get(entry, item)?.is_some() {
            return Ok(false);
        }
        self.upsert(&LootRow::with_defaults(entry, item))?;
        Ok(true)
    }

    /// Delete the single row with this key.
    pub fn delete(&mut self, entry: i64, item: i64) -> Result<u64> {
        check_key(entry, item)?;
        let table = self.active_table()?;
        let deleted = delete_row(self.gateway.as_ref(), table, entry, item)?;
        if deleted > 0 {
            info!("Deleted {} entry={} item={}", table, entry, item);
        }
        if self.focus == Some((entry, item)) {
            self.focus = None;
        }
        self.reload()?;
        Ok(deleted)
    }

    pub fn count_for_keys(&self, keys: &[(i64, i64)]) -> Result<u64> {
        let table = self.active_table()?;
        let mut total = 0;
        for &(entry, item) in keys {
            total += count_row(self.gateway.as_ref(), table, entry, item)?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SqliteGateway;

    fn editor() -> LootEditor {
        let db = SqliteGateway::in_memory().unwrap();
        db.install_world_schema().unwrap();
        LootEditor::new(Arc::new(db))
    }

    #[test]
    fn test_descriptor_lookup() {
        assert_eq!(LootTable::for_source_type(1), Some(LootTable::Creature));
        assert_eq!(LootTable::for_source_type(4).unwrap().table_name(), "gameobject_loot_template");
        assert_eq!(LootTable::for_source_type(10), Some(LootTable::Reference));
        assert_eq!(LootTable::for_source_type(13), None);
        assert_eq!(LootTable::for_source_type(-1), None);
        for table in LootTable::ALL {
            assert_eq!(LootTable::for_source_type(table.source_type()), Some(table));
        }
    }

    #[test]
    fn test_load_returns_only_matching_entry() {
        let mut editor = editor();
        editor.retarget(LootTable::Creature);
        for (entry, item) in [(38, 884), (38, 2589), (40, 884)] {
            editor.upsert(&LootRow::with_defaults(entry, item)).unwrap();
        }
        let rows = editor.load(38).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.entry == 38));
    }

    #[test]
    fn test_upsert_twice_changes_nothing() {
        let mut editor = editor();
        editor.retarget(LootTable::Creature);
        let mut row = LootRow::with_defaults(38, 884);
        row.chance = -33.3;
        assert_eq!(editor.upsert(&row).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(editor.upsert(&row).unwrap(), UpsertOutcome::Unchanged);
        assert_eq!(editor.count_for_keys(&[(38, 884)]).unwrap(), 1);

        row.maxcount = 3;
        assert_eq!(editor.upsert(&row).unwrap(), UpsertOutcome::Updated);
        assert_eq!(editor.get(38, 884).unwrap().unwrap().maxcount, 3);
    }

    #[test]
    fn test_delete_removes_one_row() {
        let mut editor = editor();
        editor.retarget(LootTable::Skinning);
        editor.save(&[LootRow::with_defaults(5, 1), LootRow::with_defaults(5, 2)]).unwrap();
        editor.load(5).unwrap();
        assert_eq!(editor.delete(5, 1).unwrap(), 1);
        assert_eq!(editor.rows().len(), 1);
        assert_eq!(editor.rows()[0].item, 2);
        assert_eq!(editor.delete(5, 1).unwrap(), 0);
    }

    #[test]
    fn test_keys_must_be_positive() {
        let mut editor = editor();
        editor.retarget(LootTable::Creature);
        assert!(matches!(
            editor.upsert(&LootRow::with_defaults(0, 5)),
            Err(QuestforgeError::Validation { .. })
        ));
        assert!(editor.delete(5, -1).is_err());
    }

    #[test]
    fn test_retarget_and_reset_drop_rows() {
        let mut editor = editor();
        assert!(matches!(editor.load(1), Err(QuestforgeError::InvalidState(_))));

        editor.retarget(LootTable::Creature);
        editor.upsert(&LootRow::with_defaults(1, 2)).unwrap();
        editor.load(1).unwrap();
        editor.focus(1, 2);
        assert!(editor.focused_row().is_some());

        editor.retarget(LootTable::Item);
        assert!(editor.rows().is_empty());
        assert!(editor.create_if_missing(1, 2).unwrap());
        assert!(!editor.create_if_missing(1, 2).unwrap());

        editor.reset();
        assert!(!editor.is_active());
        assert!(editor.rows().is_empty());
    }
}
