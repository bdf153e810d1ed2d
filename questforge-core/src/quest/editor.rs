use super::cascade::{self, DeleteReport, DeletePreview};
use super::objectives::Objectives;
use super::record::{FieldChange, QuestRecord};
use crate::condition::{self, ANCHOR_CONDITION_TYPE, Condition};
use crate::config::{AppConfig, QuestIdRange};
use crate::error::{QuestforgeError, Result};
use crate::gateway::{Gateway, UpsertOutcome, Value, placeholders};
use crate::loot::{LootEditor, LootTable};
use crate::relations::{QuestRelation, RelationEntry};
use crate::values;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

const REQUIRED_ITEM_CHUNK: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EditorState {
    Idle,
    QuestLoaded,
    DeletePreviewShown,
}

/// A condition row as shown in the editor, with what is stored for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionSlot {
    pub condition: Condition,
    /// The stored row this slot was loaded from; `None` until first saved.
    pub stored: Option<Condition>,
}

impl ConditionSlot {
    pub fn is_dirty(&self) -> bool {
        self.stored.as_ref() != Some(&self.condition)
    }
}

/// Coordinates one quest: its row, relations, conditions and the loot editor.
pub struct QuestEditor {
    gateway: Arc<dyn Gateway>,
    range: QuestIdRange,
    state: EditorState,
    quest: Option<QuestRecord>,
    conditions: Vec<ConditionSlot>,
    relations: Vec<(QuestRelation, Vec<RelationEntry>)>,
    selected: Option<usize>,
    loot: LootEditor,
    preview: Option<DeletePreview>,
}

impl QuestEditor {
    pub fn new(gateway: Arc<dyn Gateway>, config: &AppConfig) -> Self {
        Self {
            loot: LootEditor::new(Arc::clone(&gateway)),
            gateway,
            range: config.quest_ids,
            state: EditorState::Idle,
            quest: None,
            conditions: Vec::new(),
            relations: Vec::new(),
            selected: None,
            preview: None,
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn quest(&self) -> Option<&QuestRecord> {
        self.quest.as_ref()
    }

    pub fn conditions(&self) -> &[ConditionSlot] {
        &self.conditions
    }

    pub fn relations(&self) -> &[(QuestRelation, Vec<RelationEntry>)] {
        &self.relations
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn loot(&self) -> &LootEditor {
        &self.loot
    }

    pub fn loot_mut(&mut self) -> &mut LootEditor {
        &mut self.loot
    }

    pub fn gateway(&self) -> &dyn Gateway {
        self.gateway.as_ref()
    }

    fn quest_id(&self) -> Result<u32> {
        match (&self.quest, self.state) {
            (Some(quest), EditorState::QuestLoaded) => Ok(quest.entry()),
            (_, EditorState::DeletePreviewShown) => Err(QuestforgeError::InvalidState(
                "a delete preview is pending; confirm or cancel it first".to_string(),
            )),
            _ => Err(QuestforgeError::InvalidState("no quest loaded".to_string())),
        }
    }

    fn clear(&mut self) {
        self.quest = None;
        self.conditions.clear();
        self.relations.clear();
        self.selected = None;
        self.loot.reset();
        self.preview = None;
        self.state = EditorState::Idle;
    }

    /// Load a quest with its relations and conditions. The loot editor starts reset.
    pub fn load(&mut self, quest_id: u32) -> Result<&QuestRecord> {
        if self.state == EditorState::DeletePreviewShown {
            return Err(QuestforgeError::InvalidState(
                "a delete preview is pending; confirm or cancel it first".to_string(),
            ));
        }
        self.range.check(quest_id)?;

        let row = self
            .gateway
            .fetch_one("SELECT * FROM quest_template WHERE entry = ?", &values![quest_id])?
            .ok_or_else(|| QuestforgeError::NotFound(format!("quest {}", quest_id)))?;
        let record = QuestRecord::from_row(quest_id, &row);

        self.clear();
        self.relations = load_relations(self.gateway.as_ref(), quest_id)?;
        self.conditions = load_slots(self.gateway.as_ref(), quest_id)?;
        info!(
            "Loaded quest {}: {} ({} conditions)",
            quest_id,
            record.title(),
            self.conditions.len()
        );
        self.state = EditorState::QuestLoaded;
        Ok(&*self.quest.insert(record))
    }

    pub fn reload(&mut self) -> Result<()> {
        let quest_id = self.quest_id()?;
        self.load(quest_id)?;
        Ok(())
    }

    fn reload_conditions(&mut self, quest_id: u32) -> Result<()> {
        self.conditions = load_slots(self.gateway.as_ref(), quest_id)?;
        self.selected = None;
        self.loot.reset();
        Ok(())
    }

    /// Change the selected condition row and re-point the loot editor at it.
    pub fn select_condition(&mut self, index: Option<usize>) -> Result<()> {
        self.quest_id()?;
        if let Some(idx) = index
            && idx >= self.conditions.len()
        {
            return Err(QuestforgeError::validation(
                "index",
                format!("no condition row {} ({} loaded)", idx, self.conditions.len()),
            ));
        }
        self.selected = index;
        self.sync_loot_selection()
    }

    fn sync_loot_selection(&mut self) -> Result<()> {
        let target = self
            .selected
            .and_then(|idx| self.conditions.get(idx))
            .map(|slot| &slot.condition)
            .and_then(|c| c.loot_table().map(|table| (table, c.source_group, c.source_entry)))
            .filter(|&(_, group, _)| group > 0);

        match target {
            Some((table, group, entry)) => {
                self.loot.retarget(table);
                self.loot.focus(group, entry);
                self.loot.load(group)?;
            }
            None => self.loot.reset(),
        }
        Ok(())
    }

    /// Append an unsaved condition with defaults for `source_type`.
    pub fn add_condition(&mut self, source_type: i32) -> Result<usize> {
        let quest_id = self.quest_id()?;
        let mut condition = Condition::new_for(source_type, Some(quest_id));
        condition.apply_condition_type_defaults(Some(quest_id));
        self.conditions.push(ConditionSlot {
            condition,
            stored: None,
        });
        Ok(self.conditions.len() - 1)
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut ConditionSlot> {
        let loaded = self.conditions.len();
        self.conditions.get_mut(index).ok_or_else(|| {
            QuestforgeError::validation("index", format!("no condition row {} ({} loaded)", index, loaded))
        })
    }

    /// Edit one column of an in-memory condition row.
    pub fn update_condition(&mut self, index: usize, column: &str, raw: &str) -> Result<()> {
        let quest_id = self.quest_id()?;
        self.slot_mut(index)?.condition.set_field(column, raw, Some(quest_id))?;
        if self.selected == Some(index) {
            self.sync_loot_selection()?;
        }
        Ok(())
    }

    /// Validate and write one condition row. A changed key replaces the stored row.
    pub fn save_condition(&mut self, index: usize) -> Result<UpsertOutcome> {
        let quest_id = self.quest_id()?;
        let slot = self.slot_mut(index)?;
        let mut condition = slot.condition.clone();
        condition.normalize_and_validate(Some(quest_id))?;
        let stored = slot.stored.clone();

        let gateway = self.gateway.as_ref();
        if let Some(old) = &stored
            && old.primary_key_values() != condition.primary_key_values()
        {
            condition::store::delete_exact(gateway, old)?;
            debug!("Replaced condition key for row {}", index);
        }
        let outcome = condition::store::upsert(gateway, &condition)?;
        self.reload_conditions(quest_id)?;
        Ok(outcome)
    }

    /// Delete a condition row.
    ///
    /// An anchor row takes its ElseGroup with it, and the loot row once no
    /// condition is left on the key. Unsaved rows are only dropped from the list.
    pub fn delete_condition(&mut self, index: usize) -> Result<u64> {
        let quest_id = self.quest_id()?;
        let slot = self.slot_mut(index)?.clone();
        let Some(stored) = slot.stored else {
            self.conditions.remove(index);
            self.selected = None;
            self.loot.reset();
            return Ok(0);
        };

        let gateway = self.gateway.as_ref();
        let deleted = if stored.is_anchor_for(quest_id) {
            let key = stored.key();
            let mut deleted = condition::store::delete_else_group(gateway, &key, stored.else_group)?;
            if let Some(table) = stored.loot_table()
                && stored.source_group > 0
                && stored.source_entry > 0
                && condition::store::count_key(gateway, &key)? == 0
            {
                deleted += crate::loot::delete_row(gateway, table, stored.source_group, stored.source_entry)?;
            }
            deleted
        } else {
            condition::store::delete_exact(gateway, &stored)?
        };

        info!("Deleted {} row(s) for condition {} of quest {}", deleted, index, quest_id);
        self.reload_conditions(quest_id)?;
        Ok(deleted)
    }

    /// Create anchor conditions for quest-only creature drops of the required items.
    ///
    /// Returns how many conditions were inserted.
    pub fn sync_from_required_items(&mut self) -> Result<usize> {
        let quest_id = self.quest_id()?;
        let items = self
            .quest
            .as_ref()
            .map(QuestRecord::required_items)
            .unwrap_or_default();
        if items.is_empty() {
            return Ok(0);
        }

        let quest = i64::from(quest_id);
        let mut present: HashSet<(i32, i64, i64)> = self
            .conditions
            .iter()
            .filter_map(|slot| slot.stored.as_ref())
            .filter(|c| c.condition_type == ANCHOR_CONDITION_TYPE && c.value1 == quest)
            .map(|c| (c.source_type, c.source_group, c.source_entry))
            .collect();

        let gateway = self.gateway.as_ref();
        let table = LootTable::Creature;
        let mut inserted = 0;
        for chunk in items.chunks(REQUIRED_ITEM_CHUNK) {
            let sql = format!(
                "SELECT DISTINCT entry, item FROM {} WHERE item IN ({}) AND ChanceOrQuestChance < 0 ORDER BY entry, item",
                table.table_name(),
                placeholders(chunk.len())
            );
            let params: Vec<Value> = chunk.iter().map(|&id| Value::from(id)).collect();
            for row in gateway.fetch_all(&sql, &params)? {
                let entry = row.get_i64("entry").unwrap_or(0);
                let item = row.get_i64("item").unwrap_or(0);
                if entry <= 0 || item <= 0 || !present.insert((table.source_type(), entry, item)) {
                    continue;
                }
                let mut condition = Condition::new_for(table.source_type(), Some(quest_id));
                condition.source_group = entry;
                condition.source_entry = item;
                if condition::store::upsert(gateway, &condition)? == UpsertOutcome::Inserted {
                    inserted += 1;
                }
            }
        }

        if inserted > 0 {
            info!("Synced {} quest-drop condition(s) for quest {}", inserted, quest_id);
            self.reload_conditions(quest_id)?;
        }
        Ok(inserted)
    }

    /// Insert a quest-drop loot row for the focused key unless one exists.
    pub fn create_selected_loot_row(&mut self) -> Result<bool> {
        self.quest_id()?;
        let (entry, item) = self.loot.focused().ok_or_else(|| {
            QuestforgeError::InvalidState(
                "select a loot condition row with SourceGroup/SourceEntry first".to_string(),
            )
        })?;
        self.loot.create_if_missing(entry, item)
    }

    pub fn add_relation(&mut self, relation: QuestRelation, id: i64) -> Result<bool> {
        let quest_id = self.quest_id()?;
        let added = relation.add(self.gateway.as_ref(), quest_id, id)?;
        self.relations = load_relations(self.gateway.as_ref(), quest_id)?;
        Ok(added)
    }

    pub fn remove_relation(&mut self, relation: QuestRelation, id: i64) -> Result<u64> {
        let quest_id = self.quest_id()?;
        let removed = relation.remove(self.gateway.as_ref(), quest_id, id)?;
        self.relations = load_relations(self.gateway.as_ref(), quest_id)?;
        Ok(removed)
    }

    /// Create the next free quest id in the configured range and load it.
    pub fn new_quest(&mut self) -> Result<u32> {
        if self.state == EditorState::DeletePreviewShown {
            return Err(QuestforgeError::InvalidState(
                "a delete preview is pending; confirm or cancel it first".to_string(),
            ));
        }
        let highest = self
            .gateway
            .fetch_one(
                "SELECT MAX(entry) AS m FROM quest_template WHERE entry BETWEEN ? AND ?",
                &values![self.range.min, self.range.max],
            )?
            .and_then(|row| row.get_i64("m"));
        let next = highest.map_or(i64::from(self.range.min), |m| m + 1);
        if next > i64::from(self.range.max) {
            return Err(QuestforgeError::validation(
                "entry",
                format!("no free quest ids in range {}..={}", self.range.min, self.range.max),
            ));
        }
        let quest_id = next as u32;

        self.gateway.execute(
            "INSERT INTO quest_template (entry, Method, QuestLevel, MinLevel, MaxLevel) VALUES (?, ?, ?, ?, ?)",
            &values![quest_id, 2, 1, 1, 1],
        )?;
        info!("Created new quest {}", quest_id);
        self.load(quest_id)?;
        Ok(quest_id)
    }

    /// Write the edited columns that differ from the loaded snapshot, then reload.
    pub fn save_quest(&mut self, edits: &[(String, String)]) -> Result<Vec<FieldChange>> {
        let quest_id = self.quest_id()?;
        let parsed = QuestRecord::parse_edits(edits)?;
        let changes = match &self.quest {
            Some(quest) => quest.diff(&parsed),
            None => Vec::new(),
        };
        if changes.is_empty() {
            info!("No changes to save for quest {}", quest_id);
            return Ok(changes);
        }

        let sets = changes
            .iter()
            .map(|c| format!("`{}` = ?", c.column))
            .collect::<Vec<_>>()
            .join(", ");
        let mut params: Vec<Value> = changes.iter().map(|c| c.new.clone()).collect();
        params.push(quest_id.into());
        self.gateway
            .execute(&format!("UPDATE quest_template SET {} WHERE entry = ?", sets), &params)?;
        info!("Saved quest {} ({} fields)", quest_id, changes.len());

        self.load(quest_id)?;
        Ok(changes)
    }

    /// Objective slots of the loaded quest.
    pub fn objectives(&self) -> Result<Objectives> {
        self.quest_id()?;
        self.quest
            .as_ref()
            .map(Objectives::from_record)
            .ok_or_else(|| QuestforgeError::InvalidState("no quest loaded".to_string()))
    }

    /// Write the objective columns through the regular quest save.
    pub fn save_objectives(&mut self, objectives: &Objectives) -> Result<Vec<FieldChange>> {
        self.save_quest(&objectives.to_edits())
    }

    /// Count what deleting the quest would remove. Nothing is written.
    pub fn request_delete(&mut self) -> Result<&DeletePreview> {
        let quest_id = self.quest_id()?;
        let title = self.quest.as_ref().map(QuestRecord::title).unwrap_or_default();
        let conditions: Vec<Condition> = self
            .conditions
            .iter()
            .filter_map(|slot| slot.stored.clone())
            .collect();

        let preview = DeletePreview::build(self.gateway.as_ref(), quest_id, title, &conditions)?;
        self.state = EditorState::DeletePreviewShown;
        Ok(&*self.preview.insert(preview))
    }

    pub fn pending_preview(&self) -> Option<&DeletePreview> {
        self.preview.as_ref()
    }

    pub fn cancel_delete(&mut self) -> Result<()> {
        if self.state != EditorState::DeletePreviewShown {
            return Err(QuestforgeError::InvalidState("no delete preview to cancel".to_string()));
        }
        self.preview = None;
        self.state = EditorState::QuestLoaded;
        Ok(())
    }

    /// Run the previewed plan and return to idle, whatever the individual steps did.
    pub fn confirm_delete(&mut self) -> Result<DeleteReport> {
        if self.state != EditorState::DeletePreviewShown {
            return Err(QuestforgeError::InvalidState("no delete preview to confirm".to_string()));
        }
        let preview = self
            .preview
            .take()
            .ok_or_else(|| QuestforgeError::InvalidState("delete preview went missing".to_string()))?;

        let report = cascade::execute(self.gateway.as_ref(), &preview.plan);
        self.clear();
        Ok(report)
    }
}

fn load_relations(gateway: &dyn Gateway, quest_id: u32) -> Result<Vec<(QuestRelation, Vec<RelationEntry>)>> {
    QuestRelation::ALL
        .into_iter()
        .map(|relation| Ok((relation, relation.list(gateway, quest_id)?)))
        .collect()
}

fn load_slots(gateway: &dyn Gateway, quest_id: u32) -> Result<Vec<ConditionSlot>> {
    Ok(condition::store::load_for_quest(gateway, quest_id)?
        .into_iter()
        .map(|condition| ConditionSlot {
            stored: Some(condition.clone()),
            condition,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SqliteGateway;
    use crate::loot::LootRow;

    const QUEST: u32 = 1_000_010;

    fn editor() -> QuestEditor {
        let db = SqliteGateway::in_memory().unwrap();
        db.install_world_schema().unwrap();
        db.execute(
            "INSERT INTO quest_template (entry, Title, ReqItemId1, ReqItemId2) VALUES (?, ?, ?, ?)",
            &values![QUEST, "Kobold Candles", 772, 884],
        )
        .unwrap();
        QuestEditor::new(Arc::new(db), &AppConfig::default())
    }

    fn add_loot(editor: &QuestEditor, table: LootTable, row: LootRow) {
        crate::loot::upsert_row(editor.gateway(), table, &row).unwrap();
    }

    #[test]
    fn test_load_checks_range_and_existence() {
        let mut editor = editor();
        assert!(matches!(editor.load(12), Err(QuestforgeError::Validation { .. })));
        assert!(matches!(editor.load(QUEST + 1), Err(QuestforgeError::NotFound(_))));
        assert_eq!(editor.state(), EditorState::Idle);

        let quest = editor.load(QUEST).unwrap();
        assert_eq!(quest.title(), "Kobold Candles");
        assert_eq!(editor.state(), EditorState::QuestLoaded);
        assert!(!editor.loot().is_active());
        assert_eq!(editor.relations().len(), 4);
    }

    #[test]
    fn test_add_and_save_condition() {
        let mut editor = editor();
        editor.load(QUEST).unwrap();

        let idx = editor.add_condition(1).unwrap();
        assert_eq!(editor.conditions()[idx].condition.source_id, i64::from(QUEST));
        assert!(matches!(
            editor.save_condition(idx),
            Err(QuestforgeError::Validation { .. })
        ));

        editor.update_condition(idx, "SourceGroup", "38").unwrap();
        editor.update_condition(idx, "SourceEntry", "772").unwrap();
        assert_eq!(editor.save_condition(idx).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(editor.conditions().len(), 1);
        assert!(!editor.conditions()[0].is_dirty());
        assert_eq!(editor.save_condition(0).unwrap(), UpsertOutcome::Unchanged);
    }

    #[test]
    fn test_changing_a_key_column_replaces_the_row() {
        let mut editor = editor();
        editor.load(QUEST).unwrap();
        let idx = editor.add_condition(1).unwrap();
        editor.update_condition(idx, "SourceGroup", "38").unwrap();
        editor.update_condition(idx, "SourceEntry", "772").unwrap();
        editor.save_condition(idx).unwrap();

        editor.update_condition(0, "SourceGroup", "40").unwrap();
        editor.save_condition(0).unwrap();
        assert_eq!(editor.conditions().len(), 1);
        assert_eq!(editor.conditions()[0].condition.source_group, 40);
        assert_eq!(
            editor.gateway().fetch_count("SELECT COUNT(*) FROM conditions", &[]).unwrap(),
            1
        );
    }

    #[test]
    fn test_selection_follows_loot_table() {
        let mut editor = editor();
        editor.load(QUEST).unwrap();
        add_loot(&editor, LootTable::Creature, LootRow::with_defaults(38, 772));
        add_loot(&editor, LootTable::Creature, LootRow::with_defaults(38, 884));
        add_loot(&editor, LootTable::Creature, LootRow::with_defaults(40, 772));

        let idx = editor.add_condition(1).unwrap();
        editor.update_condition(idx, "SourceGroup", "38").unwrap();
        editor.update_condition(idx, "SourceEntry", "772").unwrap();
        editor.save_condition(idx).unwrap();

        let mut spell = Condition::new_for(17, Some(QUEST));
        spell.source_entry = 8690;
        spell.condition_type = 9;
        spell.value1 = i64::from(QUEST);
        condition::store::upsert(editor.gateway(), &spell).unwrap();
        editor.reload().unwrap();
        assert_eq!(editor.conditions().len(), 2);

        let loot_idx = editor
            .conditions()
            .iter()
            .position(|s| s.condition.source_type == 1)
            .unwrap();
        editor.select_condition(Some(loot_idx)).unwrap();
        assert_eq!(editor.loot().table(), Some(LootTable::Creature));
        assert_eq!(editor.loot().rows().len(), 2);
        assert_eq!(editor.loot().focused_row().unwrap().item, 772);

        editor.select_condition(Some(1 - loot_idx)).unwrap();
        assert!(!editor.loot().is_active());
        assert!(editor.loot().rows().is_empty());

        editor.select_condition(Some(loot_idx)).unwrap();
        editor.select_condition(None).unwrap();
        assert!(editor.loot().rows().is_empty());
        assert!(editor.select_condition(Some(9)).is_err());
    }

    #[test]
    fn test_retargeted_selection_reanchors_source_id() {
        let mut editor = editor();
        editor.load(QUEST).unwrap();
        add_loot(&editor, LootTable::Reference, LootRow::with_defaults(38, 772));

        let idx = editor.add_condition(1).unwrap();
        editor.update_condition(idx, "SourceGroup", "38").unwrap();
        editor.update_condition(idx, "SourceEntry", "772").unwrap();
        editor.select_condition(Some(idx)).unwrap();
        assert_eq!(editor.loot().table(), Some(LootTable::Creature));

        editor.update_condition(idx, "SourceTypeOrReferenceId", "10").unwrap();
        let condition = &editor.conditions()[idx].condition;
        assert_eq!(condition.source_id, 0);
        assert_eq!(editor.loot().table(), Some(LootTable::Reference));
        assert_eq!(editor.loot().rows().len(), 1);

        editor.update_condition(idx, "SourceTypeOrReferenceId", "4").unwrap();
        assert_eq!(editor.conditions()[idx].condition.source_id, i64::from(QUEST));
        assert_eq!(editor.loot().table(), Some(LootTable::GameObject));
        assert_eq!(editor.save_condition(idx).unwrap(), UpsertOutcome::Inserted);
    }

    #[test]
    fn test_delete_anchor_removes_group_and_loot() {
        let mut editor = editor();
        editor.load(QUEST).unwrap();
        add_loot(&editor, LootTable::Creature, LootRow::with_defaults(38, 772));

        let idx = editor.add_condition(1).unwrap();
        editor.update_condition(idx, "SourceGroup", "38").unwrap();
        editor.update_condition(idx, "SourceEntry", "772").unwrap();
        editor.save_condition(idx).unwrap();

        let mut extra = editor.conditions()[0].condition.clone();
        extra.condition_type = 27;
        extra.value1 = 10;
        extra.value2 = 3;
        condition::store::upsert(editor.gateway(), &extra).unwrap();
        editor.reload().unwrap();
        assert_eq!(editor.conditions().len(), 2);

        let anchor = editor
            .conditions()
            .iter()
            .position(|s| s.condition.condition_type == ANCHOR_CONDITION_TYPE)
            .unwrap();
        assert_eq!(editor.delete_condition(anchor).unwrap(), 3);
        assert!(editor.conditions().is_empty());
        assert_eq!(
            crate::loot::count_row(editor.gateway(), LootTable::Creature, 38, 772).unwrap(),
            0
        );
    }

    #[test]
    fn test_delete_plain_condition_removes_only_itself() {
        let mut editor = editor();
        editor.load(QUEST).unwrap();
        let idx = editor.add_condition(1).unwrap();
        editor.update_condition(idx, "SourceGroup", "38").unwrap();
        editor.update_condition(idx, "SourceEntry", "772").unwrap();
        editor.save_condition(idx).unwrap();

        let mut extra = editor.conditions()[0].condition.clone();
        extra.condition_type = 27;
        extra.value1 = 10;
        condition::store::upsert(editor.gateway(), &extra).unwrap();
        editor.reload().unwrap();

        let plain = editor
            .conditions()
            .iter()
            .position(|s| s.condition.condition_type == 27)
            .unwrap();
        assert_eq!(editor.delete_condition(plain).unwrap(), 1);
        assert_eq!(editor.conditions().len(), 1);

        let unsaved = editor.add_condition(13).unwrap();
        assert_eq!(editor.delete_condition(unsaved).unwrap(), 0);
        assert_eq!(editor.conditions().len(), 1);
    }

    #[test]
    fn test_sync_from_required_items() {
        let mut editor = editor();
        let mut drop = LootRow::with_defaults(38, 772);
        drop.chance = -40.0;
        add_loot(&editor, LootTable::Creature, drop);
        add_loot(&editor, LootTable::Creature, LootRow::with_defaults(476, 884));
        let mut normal = LootRow::with_defaults(99, 884);
        normal.chance = 5.0;
        add_loot(&editor, LootTable::Creature, normal);

        editor.load(QUEST).unwrap();
        assert_eq!(editor.sync_from_required_items().unwrap(), 2);
        assert_eq!(editor.conditions().len(), 2);
        assert!(editor.conditions().iter().all(|s| s.condition.is_anchor_for(QUEST)));
        assert!(editor.conditions().iter().all(|s| s.condition.source_id == i64::from(QUEST)));

        assert_eq!(editor.sync_from_required_items().unwrap(), 0);
    }

    #[test]
    fn test_new_and_save_quest() {
        let mut editor = editor();
        let id = editor.new_quest().unwrap();
        assert_eq!(id, QUEST + 1);
        assert_eq!(editor.quest().unwrap().get_i64("Method"), 2);

        let changes = editor
            .save_quest(&[
                ("Title".to_string(), "Fresh".to_string()),
                ("MinLevel".to_string(), "1".to_string()),
            ])
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(editor.quest().unwrap().title(), "Fresh");
        assert!(editor.save_quest(&[("Title".into(), "Fresh".into())]).unwrap().is_empty());
    }

    #[test]
    fn test_save_objectives_writes_changed_columns() {
        use crate::quest::{Objective, ObjectiveKind};

        let mut editor = editor();
        assert!(editor.objectives().is_err());
        editor.load(QUEST).unwrap();

        let mut objectives = editor.objectives().unwrap();
        assert_eq!(objectives.slots()[0].kind, ObjectiveKind::Item);
        assert_eq!(objectives.slots()[1].id, 884);

        objectives.set(2, Objective::new(ObjectiveKind::GameObject, 1593, 1)).unwrap();
        objectives.autofill(2, None).unwrap();
        let changes = editor.save_objectives(&objectives).unwrap();
        let columns: Vec<&str> = changes.iter().map(|c| c.column.as_str()).collect();
        assert!(columns.contains(&"ReqCreatureOrGOId2"));
        assert!(columns.contains(&"ReqItemId2"));
        assert!(columns.contains(&"Objectives"));

        let quest = editor.quest().unwrap();
        assert_eq!(quest.get_i64("ReqCreatureOrGOId2"), -1593);
        assert_eq!(quest.get_i64("ReqCreatureOrGOCount2"), 1);
        assert_eq!(quest.get_i64("ReqItemId1"), 772);
        assert_eq!(quest.get_i64("ReqItemId2"), 0);
        assert_eq!(quest.get("ObjectiveText2").unwrap().to_string(), "Interact with gameobject (1593) (1)");

        let again = editor.objectives().unwrap();
        assert!(editor.save_objectives(&again).unwrap().is_empty());
    }

    #[test]
    fn test_new_quest_reports_exhausted_range() {
        let db = SqliteGateway::in_memory().unwrap();
        db.install_world_schema().unwrap();
        db.execute("INSERT INTO quest_template (entry) VALUES (?)", &values![5]).unwrap();
        let config = "[quest_ids]\nmin = 4\nmax = 5\n".parse::<AppConfig>().unwrap();
        let mut editor = QuestEditor::new(Arc::new(db), &config);
        assert!(matches!(editor.new_quest(), Err(QuestforgeError::Validation { .. })));
    }

    #[test]
    fn test_delete_state_machine() {
        let mut editor = editor();
        assert!(matches!(editor.request_delete(), Err(QuestforgeError::InvalidState(_))));
        assert!(editor.cancel_delete().is_err());

        editor.load(QUEST).unwrap();
        editor.request_delete().unwrap();
        assert_eq!(editor.state(), EditorState::DeletePreviewShown);
        assert!(matches!(editor.add_condition(1), Err(QuestforgeError::InvalidState(_))));
        assert!(editor.load(QUEST).is_err());

        editor.cancel_delete().unwrap();
        assert_eq!(editor.state(), EditorState::QuestLoaded);
        assert!(editor.confirm_delete().is_err());

        editor.request_delete().unwrap();
        let report = editor.confirm_delete().unwrap();
        assert!(report.is_complete());
        assert_eq!(report.deleted_from("quest_template"), 1);
        assert_eq!(editor.state(), EditorState::Idle);
        assert!(editor.quest().is_none());
    }
}
