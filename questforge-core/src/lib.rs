//! Core library for editing quests, conditions and loot in a TrinityCore world database.

pub mod condition;
pub mod config;
pub mod dbc;
pub mod error;
pub mod gateway;
pub mod loot;
pub mod quest;
pub mod relations;
pub mod search;

pub use config::AppConfig;
pub use error::{QuestforgeError, Result};
pub use gateway::{Gateway, MysqlGateway, SqliteGateway, UpsertOutcome, Value};
pub use quest::QuestEditor;
