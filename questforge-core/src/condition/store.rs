//! Reads and writes of `conditions` rows.
//!
//! Upserts compare before writing so a repeated save is a no-op. No statement
//! relies on MySQL-only syntax.

use super::{COLUMNS, Condition, ConditionKey, PRIMARY_KEY, QUEST_AVAILABLE_SOURCE_TYPE, QUEST_CONDITION_TYPES};
use crate::error::Result;
use crate::gateway::{Gateway, UpsertOutcome, Value, placeholders};
use crate::values;
use std::collections::BTreeSet;
use tracing::{debug, info};

fn select_columns() -> String {
    COLUMNS
        .iter()
        .map(|c| format!("`{}`", c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn primary_key_clause() -> String {
    PRIMARY_KEY
        .iter()
        .map(|c| format!("`{}` = ?", c))
        .collect::<Vec<_>>()
        .join(" AND ")
}

const KEY_CLAUSE: &str =
    "SourceTypeOrReferenceId = ? AND SourceGroup = ? AND SourceEntry = ? AND SourceId = ?";

fn key_values(key: &ConditionKey) -> [Value; 4] {
    values![key.source_type, key.source_group, key.source_entry, key.source_id]
}

/// Keys that belong to `quest`: quest-type rows naming it, and QUEST_AVAILABLE rows for it.
pub fn anchor_keys(gateway: &dyn Gateway, quest: u32) -> Result<BTreeSet<ConditionKey>> {
    let quest_types = QUEST_CONDITION_TYPES
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let sql = format!(
        "SELECT DISTINCT SourceTypeOrReferenceId, SourceGroup, SourceEntry, SourceId FROM conditions \
         WHERE (ConditionTypeOrReference IN ({}) \
                AND (ConditionValue1 = ? OR ConditionValue2 = ? OR ConditionValue3 = ?)) \
            OR (SourceTypeOrReferenceId = ? AND SourceEntry = ?)",
        quest_types
    );
    let rows = gateway.fetch_all(&sql, &values![quest, quest, quest, QUEST_AVAILABLE_SOURCE_TYPE, quest])?;

    Ok(rows
        .iter()
        .map(|row| ConditionKey {
            source_type: row.get_i64("SourceTypeOrReferenceId").unwrap_or(0) as i32,
            source_group: row.get_i64("SourceGroup").unwrap_or(0),
            source_entry: row.get_i64("SourceEntry").unwrap_or(0),
            source_id: row.get_i64("SourceId").unwrap_or(0),
        })
        .collect())
}

pub fn load_key(gateway: &dyn Gateway, key: &ConditionKey) -> Result<Vec<Condition>> {
    let sql = format!(
        "SELECT {} FROM conditions WHERE {} \
         ORDER BY ElseGroup, ConditionTypeOrReference, ConditionValue1, ConditionValue2, ConditionValue3",
        select_columns(),
        KEY_CLAUSE
    );
    let rows = gateway.fetch_all(&sql, &key_values(key))?;
    Ok(rows.iter().map(Condition::from_row).collect())
}

/// Every row sharing a key with one of the quest's anchors, ordered by key then ElseGroup.
pub fn load_for_quest(gateway: &dyn Gateway, quest: u32) -> Result<Vec<Condition>> {
    let keys = anchor_keys(gateway, quest)?;
    let mut conditions = Vec::new();
    for key in &keys {
        conditions.extend(load_key(gateway, key)?);
    }
    debug!(quest, keys = keys.len(), rows = conditions.len(), "Loaded conditions");
    Ok(conditions)
}

pub fn exists(gateway: &dyn Gateway, condition: &Condition) -> Result<bool> {
    let sql = format!("SELECT COUNT(*) FROM conditions WHERE {}", primary_key_clause());
    Ok(gateway.fetch_count(&sql, &condition.primary_key_values())? > 0)
}

/// Insert the row, or update its non-key columns when the key already exists.
pub fn upsert(gateway: &dyn Gateway, condition: &Condition) -> Result<UpsertOutcome> {
    let sql = format!(
        "SELECT {} FROM conditions WHERE {}",
        select_columns(),
        primary_key_clause()
    );
    let pk = condition.primary_key_values();

    let Some(existing) = gateway.fetch_one(&sql, &pk)? else {
        let insert = format!(
            "INSERT INTO conditions ({}) VALUES ({})",
            select_columns(),
            placeholders(COLUMNS.len())
        );
        gateway.execute(&insert, &condition.column_values())?;
        info!(
            "Inserted condition ST={} SG={} SE={} CT={} CV1={} SourceId={}",
            condition.source_type,
            condition.source_group,
            condition.source_entry,
            condition.condition_type,
            condition.value1,
            condition.source_id
        );
        return Ok(UpsertOutcome::Inserted);
    };

    if Condition::from_row(&existing) == *condition {
        return Ok(UpsertOutcome::Unchanged);
    }

    let update = format!(
        "UPDATE conditions SET ErrorType = ?, ErrorTextId = ?, ScriptName = ?, Comment = ? WHERE {}",
        primary_key_clause()
    );
    let mut params = values![
        condition.error_type,
        condition.error_text_id,
        &condition.script_name,
        &condition.comment
    ]
    .to_vec();
    params.extend(pk);
    gateway.execute(&update, &params)?;
    info!(
        "Updated condition ST={} SG={} SE={} CT={}",
        condition.source_type, condition.source_group, condition.source_entry, condition.condition_type
    );
    Ok(UpsertOutcome::Updated)
}

/// Delete the single row with this primary key.
pub fn delete_exact(gateway: &dyn Gateway, condition: &Condition) -> Result<u64> {
    let sql = format!("DELETE FROM conditions WHERE {}", primary_key_clause());
    gateway.execute(&sql, &condition.primary_key_values())
}

/// Delete the rows of one key that share an ElseGroup.
pub fn delete_else_group(gateway: &dyn Gateway, key: &ConditionKey, else_group: i64) -> Result<u64> {
    let sql = format!("DELETE FROM conditions WHERE {} AND ElseGroup = ?", KEY_CLAUSE);
    let mut params = key_values(key).to_vec();
    params.push(else_group.into());
    gateway.execute(&sql, &params)
}

pub fn delete_key(gateway: &dyn Gateway, key: &ConditionKey) -> Result<u64> {
    let sql = format!("DELETE FROM conditions WHERE {}", KEY_CLAUSE);
    gateway.execute(&sql, &key_values(key))
}

pub fn count_key(gateway: &dyn Gateway, key: &ConditionKey) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM conditions WHERE {}", KEY_CLAUSE);
    gateway.fetch_count(&sql, &key_values(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SqliteGateway;

    fn sandbox() -> SqliteGateway {
        let db = SqliteGateway::in_memory().unwrap();
        db.install_world_schema().unwrap();
        db
    }

    fn anchored(group: i64, entry: i64, quest: u32) -> Condition {
        let mut condition = Condition::new_for(1, Some(quest));
        condition.source_group = group;
        condition.source_entry = entry;
        condition
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let db = sandbox();
        let condition = anchored(38, 884, 12345);

        assert_eq!(upsert(&db, &condition).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(upsert(&db, &condition).unwrap(), UpsertOutcome::Unchanged);
        assert_eq!(db.fetch_count("SELECT COUNT(*) FROM conditions", &[]).unwrap(), 1);

        let mut edited = condition.clone();
        edited.comment = "Kobold candles".into();
        assert_eq!(upsert(&db, &edited).unwrap(), UpsertOutcome::Updated);
        let loaded = load_key(&db, &condition.key()).unwrap();
        assert_eq!(loaded, vec![edited]);
    }

    #[test]
    fn test_load_for_quest_finds_every_row_of_anchored_keys() {
        let db = sandbox();
        let anchor = anchored(38, 884, 12345);
        upsert(&db, &anchor).unwrap();

        let mut extra = anchor.clone();
        extra.else_group = 0;
        extra.condition_type = 2;
        extra.value1 = 884;
        extra.value2 = 1;
        upsert(&db, &extra).unwrap();

        let mut available = Condition::new_for(QUEST_AVAILABLE_SOURCE_TYPE, Some(12345));
        available.condition_type = 8;
        available.value1 = 12000;
        upsert(&db, &available).unwrap();

        upsert(&db, &anchored(40, 1, 777)).unwrap();

        let loaded = load_for_quest(&db, 12345).unwrap();
        assert_eq!(loaded.len(), 3);
        assert!(loaded.iter().all(|c| c.source_group != 40));
        assert_eq!(anchor_keys(&db, 12345).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_exact_removes_one_row() {
        let db = sandbox();
        let a = anchored(38, 884, 1);
        let mut b = a.clone();
        b.else_group = 1;
        upsert(&db, &a).unwrap();
        upsert(&db, &b).unwrap();

        assert_eq!(delete_exact(&db, &a).unwrap(), 1);
        assert!(!exists(&db, &a).unwrap());
        assert!(exists(&db, &b).unwrap());
        assert_eq!(count_key(&db, &a.key()).unwrap(), 1);

        assert_eq!(delete_else_group(&db, &b.key(), 1).unwrap(), 1);
        assert_eq!(delete_key(&db, &a.key()).unwrap(), 0);
    }
}
