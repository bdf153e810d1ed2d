//! Quest editing: the `quest_template` row, its conditions and the delete cascade.

pub mod cascade;
mod editor;
pub mod fields;
pub mod objectives;
mod record;

pub use cascade::{DeletePlan, DeletePreview, DeleteReport, DeleteStep, SourceOwner, StepOutcome};
pub use editor::{ConditionSlot, EditorState, QuestEditor};
pub use objectives::{Objective, ObjectiveKind, ObjectiveNames, Objectives};
pub use record::{FieldChange, QuestRecord, RewardNames, RewardSummary, money_to_text};
