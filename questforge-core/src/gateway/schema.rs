//! DDL for the part of the TrinityCore world schema this tool touches.
//!
//! Installed into SQLite sandboxes; a MySQL world database already has it.

use crate::loot::LootTable;
use crate::quest::fields::{FieldKind, quest_columns};
use crate::relations::QuestRelation;

const CONDITIONS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS conditions (
    SourceTypeOrReferenceId INTEGER NOT NULL DEFAULT 0,
    SourceGroup INTEGER NOT NULL DEFAULT 0,
    SourceEntry INTEGER NOT NULL DEFAULT 0,
    SourceId INTEGER NOT NULL DEFAULT 0,
    ElseGroup INTEGER NOT NULL DEFAULT 0,
    ConditionTypeOrReference INTEGER NOT NULL DEFAULT 0,
    ConditionTarget INTEGER NOT NULL DEFAULT 0,
    ConditionValue1 INTEGER NOT NULL DEFAULT 0,
    ConditionValue2 INTEGER NOT NULL DEFAULT 0,
    ConditionValue3 INTEGER NOT NULL DEFAULT 0,
    NegativeCondition INTEGER NOT NULL DEFAULT 0,
    ErrorType INTEGER NOT NULL DEFAULT 0,
    ErrorTextId INTEGER NOT NULL DEFAULT 0,
    ScriptName TEXT NOT NULL DEFAULT '',
    Comment TEXT,
    PRIMARY KEY (
        SourceTypeOrReferenceId, SourceGroup, SourceEntry, SourceId, ElseGroup,
        ConditionTypeOrReference, ConditionTarget,
        ConditionValue1, ConditionValue2, ConditionValue3, NegativeCondition
    )
);
CREATE INDEX IF NOT EXISTS idx_conditions_value1 ON conditions(ConditionTypeOrReference, ConditionValue1);
"#;

const LOOKUP_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS item_template (
    entry INTEGER PRIMARY KEY,
    name TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS creature_template (
    entry INTEGER PRIMARY KEY,
    name TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS gameobject_template (
    entry INTEGER PRIMARY KEY,
    name TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS spell_ranks (
    first_spell_id INTEGER NOT NULL DEFAULT 0,
    spell_id INTEGER NOT NULL DEFAULT 0,
    `rank` INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (first_spell_id, `rank`)
);
"#;

fn quest_template_ddl() -> String {
    let mut columns = vec!["    entry INTEGER PRIMARY KEY".to_string()];
    for field in quest_columns() {
        if field.column == "entry" {
            continue;
        }
        let ty = match field.kind {
            FieldKind::Int => "INTEGER NOT NULL DEFAULT 0",
            FieldKind::Float => "REAL NOT NULL DEFAULT 0",
            FieldKind::Text => "TEXT",
        };
        columns.push(format!("    `{}` {}", field.column, ty));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS quest_template (\n{}\n);\n",
        columns.join(",\n")
    )
}

fn loot_ddl(table: LootTable) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {0} (
    entry INTEGER NOT NULL DEFAULT 0,
    item INTEGER NOT NULL DEFAULT 0,
    ChanceOrQuestChance REAL NOT NULL DEFAULT 100,
    lootmode INTEGER NOT NULL DEFAULT 1,
    groupid INTEGER NOT NULL DEFAULT 0,
    mincountOrRef INTEGER NOT NULL DEFAULT 1,
    maxcount INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (entry, item)
);
"#,
        table.table_name()
    )
}

fn relation_ddl(relation: QuestRelation) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {0} (
    id INTEGER NOT NULL DEFAULT 0,
    quest INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (id, quest)
);
CREATE INDEX IF NOT EXISTS idx_{0}_quest ON {0}(quest);
"#,
        relation.table_name()
    )
}

/// Full DDL batch, safe to run more than once.
pub fn world_schema_sql() -> String {
    let mut sql = quest_template_ddl();
    sql.push_str(CONDITIONS_DDL);
    sql.push_str(LOOKUP_DDL);
    for table in LootTable::ALL {
        sql.push_str(&loot_ddl(table));
    }
    for relation in QuestRelation::ALL {
        sql.push_str(&relation_ddl(relation));
    }
    sql
}
