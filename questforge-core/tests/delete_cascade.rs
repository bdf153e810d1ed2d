use questforge_core::condition::{self, Condition};
use questforge_core::gateway::{Gateway, SqliteGateway};
use questforge_core::loot::{self, LootRow, LootTable};
use questforge_core::quest::{EditorState, QuestEditor};
use questforge_core::relations::QuestRelation;
use questforge_core::{AppConfig, values};
use std::sync::Arc;

const QUEST: u32 = 12345;

fn config() -> AppConfig {
    "[quest_ids]\nmin = 1\nmax = 99999\n".parse::<AppConfig>().unwrap()
}

fn anchor(group: i64, entry: i64, else_group: i64) -> Condition {
    let mut condition = Condition::new_for(1, Some(QUEST));
    condition.source_group = group;
    condition.source_entry = entry;
    condition.else_group = else_group;
    condition
}

/// Quest 12345: two ElseGroups over five condition rows and three creature loot rows.
fn seed(db: &SqliteGateway) {
    db.install_world_schema().unwrap();
    db.execute(
        "INSERT INTO quest_template (entry, Title, ReqItemId1) VALUES (?, ?, ?)",
        &values![QUEST, "Candle Hunt", 772],
    )
    .unwrap();

    let mut level = anchor(38, 772, 0);
    level.condition_type = 27;
    level.value1 = 10;
    level.value2 = 3;

    for condition in [
        anchor(38, 772, 0),
        level,
        anchor(38, 772, 1),
        anchor(476, 884, 0),
        anchor(99, 2589, 1),
    ] {
        condition::store::upsert(db, &condition).unwrap();
    }

    for (entry, item) in [(38, 772), (476, 884), (99, 2589), (38, 999)] {
        loot::upsert_row(db, LootTable::Creature, &LootRow::with_defaults(entry, item)).unwrap();
    }

    // another quest sharing nothing with 12345
    let mut other = Condition::new_for(1, Some(777));
    other.source_group = 40;
    other.source_entry = 772;
    condition::store::upsert(db, &other).unwrap();

    QuestRelation::CreatureStarter.add(db, QUEST, 197).unwrap();
    QuestRelation::GameObjectEnder.add(db, QUEST, 2843).unwrap();
}

fn editor_with_seed() -> QuestEditor {
    let db = SqliteGateway::in_memory().unwrap();
    seed(&db);
    let mut editor = QuestEditor::new(Arc::new(db), &config());
    editor.load(QUEST).unwrap();
    editor
}

#[test]
fn test_preview_counts_match_seeded_scenario() {
    let mut editor = editor_with_seed();
    assert_eq!(editor.conditions().len(), 5);

    let preview = editor.request_delete().unwrap().clone();
    assert_eq!(preview.title, "Candle Hunt");
    assert_eq!(preview.condition_groups, 2);
    assert_eq!(preview.condition_rows, 5);
    assert_eq!(preview.loot_rows.get(&LootTable::Creature), Some(&3));
    assert_eq!(preview.total_loot_rows(), 3);
    assert!(preview.unmapped_sources.is_empty());
    assert_eq!(
        preview
            .relation_rows
            .iter()
            .map(|(_, n)| n)
            .sum::<u64>(),
        2
    );

    // previewing writes nothing
    assert_eq!(
        editor.gateway().fetch_count("SELECT COUNT(*) FROM conditions", &[]).unwrap(),
        6
    );
}

#[test]
fn test_confirm_removes_exactly_the_previewed_rows() {
    let mut editor = editor_with_seed();
    let preview = editor.request_delete().unwrap().clone();
    let report = editor.confirm_delete().unwrap();

    assert!(report.is_complete());
    assert_eq!(report.deleted_from("conditions"), preview.condition_rows);
    assert_eq!(
        report.deleted_from("creature_loot_template"),
        preview.loot_rows[&LootTable::Creature]
    );
    for (relation, count) in &preview.relation_rows {
        assert_eq!(report.deleted_from(relation.table_name()), *count);
    }
    assert_eq!(editor.state(), EditorState::Idle);
    assert!(editor.conditions().is_empty());

    let db = editor.gateway();
    assert_eq!(
        db.fetch_count("SELECT COUNT(*) FROM quest_template WHERE entry = ?", &values![QUEST])
            .unwrap(),
        0
    );
    for key in &preview.plan.condition_keys {
        assert_eq!(condition::store::count_key(db, key).unwrap(), 0);
    }
    for (entry, item) in [(38, 772), (476, 884), (99, 2589)] {
        assert_eq!(loot::count_row(db, LootTable::Creature, entry, item).unwrap(), 0);
    }

    // rows outside the quest's keys survive
    assert_eq!(loot::count_row(db, LootTable::Creature, 38, 999).unwrap(), 1);
    assert_eq!(condition::store::load_for_quest(db, 777).unwrap().len(), 1);
}

#[test]
fn test_cancel_keeps_everything() {
    let mut editor = editor_with_seed();
    editor.request_delete().unwrap();
    editor.cancel_delete().unwrap();

    assert_eq!(editor.state(), EditorState::QuestLoaded);
    assert_eq!(editor.conditions().len(), 5);
    assert_eq!(
        editor.gateway().fetch_count("SELECT COUNT(*) FROM creature_loot_template", &[]).unwrap(),
        4
    );
}

#[test]
fn test_unmapped_sources_are_listed() {
    let mut editor = editor_with_seed();
    let mut spell = Condition::new_for(17, Some(QUEST));
    spell.source_entry = 8690;
    spell.condition_type = 28;
    spell.value1 = i64::from(QUEST);
    condition::store::upsert(editor.gateway(), &spell).unwrap();
    editor.reload().unwrap();

    let preview = editor.request_delete().unwrap();
    assert_eq!(preview.unmapped_sources.len(), 1);
    assert_eq!(preview.unmapped_sources[0].source_type, 17);
    assert_eq!(preview.condition_rows, 6);
    assert_eq!(preview.total_loot_rows(), 3);
}

#[test]
fn test_selection_loads_only_the_reference_rows() {
    let mut editor = editor_with_seed();
    let idx = editor
        .conditions()
        .iter()
        .position(|slot| slot.condition.source_group == 38)
        .unwrap();
    editor.select_condition(Some(idx)).unwrap();

    let rows = editor.loot().rows();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.entry == 38));

    editor.loot_mut().delete(38, 999).unwrap();
    assert_eq!(editor.loot().rows().len(), 1);
    assert_eq!(loot::count_row(editor.gateway(), LootTable::Creature, 38, 772).unwrap(), 1);
}

#[test]
fn test_sandbox_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("world.sqlite");
    seed(&SqliteGateway::open(&path).unwrap());

    let mut editor = QuestEditor::new(Arc::new(SqliteGateway::open(&path).unwrap()), &config());
    assert_eq!(editor.load(QUEST).unwrap().title(), "Candle Hunt");
    assert_eq!(editor.relations()[0].1[0].id, 197);
}
