//! Quest starter and ender relation tables, all shaped `(id, quest)`.

use crate::error::{QuestforgeError, Result};
use crate::gateway::Gateway;
use crate::values;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QuestRelation {
    CreatureStarter,
    CreatureEnder,
    GameObjectStarter,
    GameObjectEnder,
}

/// One related creature or game object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationEntry {
    pub id: i64,
    pub name: String,
}

impl QuestRelation {
    pub const ALL: [QuestRelation; 4] = [
        QuestRelation::CreatureStarter,
        QuestRelation::CreatureEnder,
        QuestRelation::GameObjectStarter,
        QuestRelation::GameObjectEnder,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            QuestRelation::CreatureStarter => "creature_quest_starter",
            QuestRelation::CreatureEnder => "creature_quest_ender",
            QuestRelation::GameObjectStarter => "gameobject_questrelation",
            QuestRelation::GameObjectEnder => "gameobject_involvedrelation",
        }
    }

    /// Table the related id points into.
    pub fn template_table(self) -> &'static str {
        match self {
            QuestRelation::CreatureStarter | QuestRelation::CreatureEnder => "creature_template",
            QuestRelation::GameObjectStarter | QuestRelation::GameObjectEnder => "gameobject_template",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuestRelation::CreatureStarter => "Creature Starters",
            QuestRelation::CreatureEnder => "Creature Enders",
            QuestRelation::GameObjectStarter => "GO Starters",
            QuestRelation::GameObjectEnder => "GO Enders",
        }
    }

    pub fn list(self, gateway: &dyn Gateway, quest: u32) -> Result<Vec<RelationEntry>> {
        let sql = format!(
            "SELECT r.id AS id, t.name AS name FROM {} r \
             LEFT JOIN {} t ON t.entry = r.id \
             WHERE r.quest = ? ORDER BY r.id",
            self.table_name(),
            self.template_table()
        );
        let rows = gateway.fetch_all(&sql, &values![quest])?;
        Ok(rows
            .iter()
            .map(|row| RelationEntry {
                id: row.get_i64("id").unwrap_or(0),
                name: row
                    .get_string("name")
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| "(no name)".to_string()),
            })
            .collect())
    }

    pub fn count(self, gateway: &dyn Gateway, quest: u32) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE quest = ?", self.table_name());
        gateway.fetch_count(&sql, &values![quest])
    }

    /// Link `id` to the quest. Returns false when the link already existed.
    pub fn add(self, gateway: &dyn Gateway, quest: u32, id: i64) -> Result<bool> {
        if id <= 0 {
            return Err(QuestforgeError::validation("id", "must be positive"));
        }
        let exists = gateway.fetch_count(
            &format!("SELECT COUNT(*) FROM {} WHERE id = ? AND quest = ?", self.table_name()),
            &values![id, quest],
        )?;
        if exists > 0 {
            return Ok(false);
        }
        gateway.execute(
            &format!("INSERT INTO {} (id, quest) VALUES (?, ?)", self.table_name()),
            &values![id, quest],
        )?;
        info!("Added id={} to {} for quest={}", id, self.table_name(), quest);
        Ok(true)
    }

    pub fn remove(self, gateway: &dyn Gateway, quest: u32, id: i64) -> Result<u64> {
        let removed = gateway.execute(
            &format!("DELETE FROM {} WHERE id = ? AND quest = ?", self.table_name()),
            &values![id, quest],
        )?;
        if removed > 0 {
            info!("Removed id={} from {} for quest={}", id, self.table_name(), quest);
        }
        Ok(removed)
    }

    pub fn delete_all(self, gateway: &dyn Gateway, quest: u32) -> Result<u64> {
        gateway.execute(
            &format!("DELETE FROM {} WHERE quest = ?", self.table_name()),
            &values![quest],
        )
    }
}

impl std::fmt::Display for QuestRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SqliteGateway;

    #[test]
    fn test_add_list_remove() {
        let db = SqliteGateway::in_memory().unwrap();
        db.install_world_schema().unwrap();
        db.execute(
            "INSERT INTO creature_template (entry, name) VALUES (?, ?)",
            &values![197, "Marshal McBride"],
        )
        .unwrap();

        let rel = QuestRelation::CreatureStarter;
        assert!(rel.add(&db, 783, 197).unwrap());
        assert!(!rel.add(&db, 783, 197).unwrap());
        assert!(rel.add(&db, 783, 9999).unwrap());

        let entries = rel.list(&db, 783).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Marshal McBride");
        assert_eq!(entries[1].name, "(no name)");
        assert_eq!(rel.count(&db, 783).unwrap(), 2);
        assert_eq!(QuestRelation::CreatureEnder.count(&db, 783).unwrap(), 0);

        assert_eq!(rel.remove(&db, 783, 9999).unwrap(), 1);
        assert_eq!(rel.delete_all(&db, 783).unwrap(), 1);
        assert!(rel.list(&db, 783).unwrap().is_empty());
    }

    #[test]
    fn test_add_rejects_zero_id() {
        let db = SqliteGateway::in_memory().unwrap();
        db.install_world_schema().unwrap();
        assert!(QuestRelation::GameObjectEnder.add(&db, 1, 0).is_err());
    }
}
