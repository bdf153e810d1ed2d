//! Application configuration, read once at start and passed to components.
//!
//! Supports TOML files like:
//! ```toml
//! [database]
//! backend = "mysql"
//! host = "127.0.0.1"
//! port = 3306
//! user = "trinity"
//! password = "trinity"
//! database = "world"
//!
//! [lookups]
//! dbc_dir = "/srv/wow/dbc"
//! spell = "/srv/wow/dbc-extra/Spell.dbc"
//!
//! [quest_ids]
//! min = 1000000
//! max = 2000000
//! ```

use crate::dbc::LookupKind;
use crate::error::{QuestforgeError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Storage engine behind the gateway.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Mysql,
    Sqlite,
}

/// Connection parameters for the world database.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DbConfig {
    pub backend: Backend,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub charset: String,
    /// Database file used when `backend = "sqlite"`.
    pub sqlite_path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Mysql,
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "world".to_string(),
            charset: "utf8mb4".to_string(),
            sqlite_path: PathBuf::from("world.sqlite"),
        }
    }
}

/// Where the DBC label files live. Per-file entries override `dbc_dir`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LookupConfig {
    pub dbc_dir: PathBuf,
    pub area_table: Option<PathBuf>,
    pub quest_sort: Option<PathBuf>,
    pub skill_line: Option<PathBuf>,
    pub spell: Option<PathBuf>,
    pub faction: Option<PathBuf>,
    pub currency_types: Option<PathBuf>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            dbc_dir: PathBuf::from("dbc"),
            area_table: None,
            quest_sort: None,
            skill_line: None,
            spell: None,
            faction: None,
            currency_types: None,
        }
    }
}

impl LookupConfig {
    pub fn path_for(&self, kind: LookupKind) -> PathBuf {
        let override_path = match kind {
            LookupKind::Area => &self.area_table,
            LookupKind::QuestSort => &self.quest_sort,
            LookupKind::SkillLine => &self.skill_line,
            LookupKind::Spell => &self.spell,
            LookupKind::Faction => &self.faction,
            LookupKind::CurrencyTypes => &self.currency_types,
        };
        override_path
            .clone()
            .unwrap_or_else(|| self.dbc_dir.join(kind.file_name()))
    }
}

/// Inclusive id window the editor is allowed to touch.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct QuestIdRange {
    pub min: u32,
    pub max: u32,
}

impl Default for QuestIdRange {
    fn default() -> Self {
        Self {
            min: 1_000_000,
            max: 2_000_000,
        }
    }
}

impl QuestIdRange {
    pub fn contains(&self, id: u32) -> bool {
        (self.min..=self.max).contains(&id)
    }

    pub fn check(&self, id: u32) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(QuestforgeError::validation(
                "entry",
                format!("quest {} is outside the editable range {}..={}", id, self.min, self.max),
            ))
        }
    }
}

/// Complete configuration loaded from TOML.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub database: DbConfig,
    pub lookups: LookupConfig,
    pub quest_ids: QuestIdRange,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            QuestforgeError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config from {:?}: {}", path, e),
            ))
        })?;

        content.parse()
    }

    fn validate(&self) -> Result<()> {
        if self.quest_ids.min > self.quest_ids.max {
            return Err(QuestforgeError::Config(format!(
                "quest_ids.min ({}) is greater than quest_ids.max ({})",
                self.quest_ids.min, self.quest_ids.max
            )));
        }
        if self.quest_ids.min == 0 {
            return Err(QuestforgeError::Config("quest_ids.min must be positive".to_string()));
        }
        Ok(())
    }
}

impl FromStr for AppConfig {
    type Err = QuestforgeError;

    /// Parse configuration from a TOML string.
    fn from_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| QuestforgeError::Config(format!("Failed to parse config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}
