//! Quest deletion: count everything first, then delete table by table.

use crate::condition::{self, Condition, ConditionKey};
use crate::error::Result;
use crate::gateway::Gateway;
use crate::loot::{self, LootTable};
use crate::relations::QuestRelation;
use crate::values;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Which loot table, if any, a condition key points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceOwner {
    Loot(LootTable),
    Unmapped,
}

impl SourceOwner {
    pub fn of(key: &ConditionKey) -> Self {
        match LootTable::for_source_type(key.source_type) {
            Some(table) => SourceOwner::Loot(table),
            None => SourceOwner::Unmapped,
        }
    }
}

/// The rows a confirmed delete will remove, fixed when the preview is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletePlan {
    pub quest: u32,
    pub condition_keys: BTreeSet<ConditionKey>,
    pub loot_keys: BTreeMap<LootTable, BTreeSet<(i64, i64)>>,
}

impl DeletePlan {
    pub fn for_conditions(quest: u32, conditions: &[Condition]) -> Self {
        let mut loot_keys: BTreeMap<LootTable, BTreeSet<(i64, i64)>> = BTreeMap::new();
        for condition in conditions {
            if let Some(table) = condition.loot_table()
                && condition.source_group > 0
                && condition.source_entry > 0
            {
                loot_keys
                    .entry(table)
                    .or_default()
                    .insert((condition.source_group, condition.source_entry));
            }
        }
        DeletePlan {
            quest,
            condition_keys: conditions.iter().map(Condition::key).collect(),
            loot_keys,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletePreview {
    pub quest: u32,
    pub title: String,
    /// Distinct ElseGroup values over the quest's condition rows.
    pub condition_groups: usize,
    pub condition_rows: u64,
    pub loot_rows: BTreeMap<LootTable, u64>,
    pub relation_rows: Vec<(QuestRelation, u64)>,
    /// Condition keys with no loot table behind them. Their rows are deleted, nothing else is.
    pub unmapped_sources: Vec<ConditionKey>,
    pub plan: DeletePlan,
}

impl DeletePreview {
    /// Count, never mutate.
    pub fn build(gateway: &dyn Gateway, quest: u32, title: String, conditions: &[Condition]) -> Result<Self> {
        let plan = DeletePlan::for_conditions(quest, conditions);

        let condition_groups = conditions
            .iter()
            .map(|c| c.else_group)
            .collect::<BTreeSet<_>>()
            .len();

        let mut condition_rows = 0;
        for key in &plan.condition_keys {
            condition_rows += condition::store::count_key(gateway, key)?;
        }

        let mut loot_rows = BTreeMap::new();
        for (table, keys) in &plan.loot_keys {
            let mut count = 0;
            for &(entry, item) in keys {
                count += loot::count_row(gateway, *table, entry, item)?;
            }
            loot_rows.insert(*table, count);
        }

        let relation_rows = QuestRelation::ALL
            .into_iter()
            .map(|relation| Ok((relation, relation.count(gateway, quest)?)))
            .collect::<Result<Vec<_>>>()?;

        let unmapped_sources = plan
            .condition_keys
            .iter()
            .filter(|key| SourceOwner::of(key) == SourceOwner::Unmapped)
            .copied()
            .collect();

        Ok(DeletePreview {
            quest,
            title,
            condition_groups,
            condition_rows,
            loot_rows,
            relation_rows,
            unmapped_sources,
            plan,
        })
    }

    pub fn total_loot_rows(&self) -> u64 {
        self.loot_rows.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepOutcome {
    Deleted(u64),
    Failed { deleted: u64, message: String },
}

/// Result of deleting from one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteStep {
    pub table: String,
    pub outcome: StepOutcome,
}

impl DeleteStep {
    pub fn deleted(&self) -> u64 {
        match self.outcome {
            StepOutcome::Deleted(n) | StepOutcome::Failed { deleted: n, .. } => n,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, StepOutcome::Deleted(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub quest: u32,
    pub steps: Vec<DeleteStep>,
}

impl DeleteReport {
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(DeleteStep::is_ok)
    }

    pub fn deleted_from(&self, table: &str) -> u64 {
        self.steps
            .iter()
            .filter(|s| s.table == table)
            .map(DeleteStep::deleted)
            .sum()
    }
}

/// Run `ops` and fold them into one step; a failure is recorded and the rest still run.
fn run_step<I>(table: &str, ops: I) -> DeleteStep
where
    I: IntoIterator<Item = Result<u64>>,
{
    let mut deleted = 0;
    let mut errors = Vec::new();
    for op in ops {
        match op {
            Ok(n) => deleted += n,
            Err(e) => errors.push(e.to_string()),
        }
    }

    let outcome = if errors.is_empty() {
        StepOutcome::Deleted(deleted)
    } else {
        warn!("Delete from {} failed: {}", table, errors.join("; "));
        StepOutcome::Failed {
            deleted,
            message: errors.join("; "),
        }
    };
    DeleteStep {
        table: table.to_string(),
        outcome,
    }
}

/// Execute a plan: relations, loot rows, condition rows, then the quest row.
pub fn execute(gateway: &dyn Gateway, plan: &DeletePlan) -> DeleteReport {
    let quest = plan.quest;
    let mut steps = Vec::new();

    for relation in QuestRelation::ALL {
        steps.push(run_step(
            relation.table_name(),
            [relation.delete_all(gateway, quest)],
        ));
    }

    for (table, keys) in &plan.loot_keys {
        steps.push(run_step(
            table.table_name(),
            keys.iter()
                .map(|&(entry, item)| loot::delete_row(gateway, *table, entry, item)),
        ));
    }

    steps.push(run_step(
        "conditions",
        plan.condition_keys
            .iter()
            .map(|key| condition::store::delete_key(gateway, key)),
    ));

    steps.push(run_step(
        "quest_template",
        [gateway.execute("DELETE FROM quest_template WHERE entry = ?", &values![quest])],
    ));

    let report = DeleteReport { quest, steps };
    info!(
        "Deleted quest {}: {}",
        quest,
        report
            .steps
            .iter()
            .map(|s| format!("{}={}", s.table, s.deleted()))
            .collect::<Vec<_>>()
            .join(", ")
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuestforgeError;

    #[test]
    fn test_plan_groups_loot_keys_by_table() {
        let mut a = Condition::new_for(1, Some(7));
        a.source_group = 38;
        a.source_entry = 884;
        let mut b = a.clone();
        b.else_group = 1;
        let mut c = Condition::new_for(4, Some(7));
        c.source_group = 2843;
        c.source_entry = 884;
        let d = Condition::new_for(19, Some(7));

        let plan = DeletePlan::for_conditions(7, &[a, b, c, d]);
        assert_eq!(plan.condition_keys.len(), 3);
        assert_eq!(plan.loot_keys[&LootTable::Creature].len(), 1);
        assert_eq!(plan.loot_keys[&LootTable::GameObject].len(), 1);
        assert_eq!(plan.loot_keys.len(), 2);
    }

    #[test]
    fn test_run_step_keeps_going_after_failure() {
        let step = run_step(
            "conditions",
            [Ok(2), Err(QuestforgeError::Parse("boom".into())), Ok(1)],
        );
        assert_eq!(step.deleted(), 3);
        assert!(!step.is_ok());

        let report = DeleteReport {
            quest: 1,
            steps: vec![step, run_step("quest_template", [Ok(1)])],
        };
        assert!(!report.is_complete());
        assert_eq!(report.deleted_from("quest_template"), 1);
    }

    #[test]
    fn test_source_owner() {
        let key = Condition::new_for(13, None).key();
        assert_eq!(SourceOwner::of(&key), SourceOwner::Unmapped);
        let key = Condition::new_for(11, None).key();
        assert_eq!(SourceOwner::of(&key), SourceOwner::Loot(LootTable::Skinning));
    }
}
