//! WDBC label tables (areas, quest sorts, skills, spells, factions, currencies).
//!
//! Every table is read once at start. A table that cannot be read is kept as an
//! explicit empty [`LookupTable`] with a reason, so pickers and labels degrade
//! instead of failing.

use crate::config::LookupConfig;
use crate::error::{QuestforgeError, Result};
use crate::gateway::Gateway;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const HEADER_SIZE: usize = 20;
const MAX_GUESS_ROWS: usize = 200;
const NAME_FIELD_CANDIDATES: &[usize] = &[
    1, 2, 3, 4, 5, 6, 7, 8, 10, 11, 12, 13, 14, 20, 21, 22, 23, 24, 25, 26, 27, 28,
];

/// The DBC files the editor knows how to label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LookupKind {
    Area,
    QuestSort,
    SkillLine,
    Spell,
    Faction,
    CurrencyTypes,
}

impl LookupKind {
    pub const ALL: [LookupKind; 6] = [
        LookupKind::Area,
        LookupKind::QuestSort,
        LookupKind::SkillLine,
        LookupKind::Spell,
        LookupKind::Faction,
        LookupKind::CurrencyTypes,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            LookupKind::Area => "AreaTable.dbc",
            LookupKind::QuestSort => "QuestSort.dbc",
            LookupKind::SkillLine => "SkillLine.dbc",
            LookupKind::Spell => "Spell.dbc",
            LookupKind::Faction => "Faction.dbc",
            LookupKind::CurrencyTypes => "CurrencyTypes.dbc",
        }
    }

    /// Field holding the name string offset, `None` when it has to be guessed.
    pub fn name_field(self) -> Option<usize> {
        match self {
            LookupKind::Area => Some(11),
            LookupKind::QuestSort => Some(1),
            LookupKind::SkillLine => Some(2),
            LookupKind::Faction => Some(23),
            LookupKind::Spell | LookupKind::CurrencyTypes => None,
        }
    }

    fn fallback_label(self, id: u32) -> String {
        match self {
            LookupKind::Area => format!("Area {}", id),
            LookupKind::QuestSort => format!("Sort {}", id),
            LookupKind::SkillLine => format!("(unnamed) SkillLine {}", id),
            _ => format!("ID {}", id),
        }
    }
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Raw WDBC header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WdbcHeader {
    pub record_count: u32,
    pub field_count: u32,
    pub record_size: u32,
    pub string_size: u32,
}

struct WdbcFile<'a> {
    header: WdbcHeader,
    records: &'a [u8],
    strings: &'a [u8],
}

impl<'a> WdbcFile<'a> {
    fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(QuestforgeError::InvalidFileFormat(format!(
                "WDBC header truncated ({} bytes)",
                data.len()
            )));
        }
        if &data[0..4] != b"WDBC" {
            return Err(QuestforgeError::InvalidFileFormat(format!(
                "not a WDBC file, magic={:?}",
                &data[0..4]
            )));
        }

        let word = |at: usize| u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);
        let header = WdbcHeader {
            record_count: word(4),
            field_count: word(8),
            record_size: word(12),
            string_size: word(16),
        };

        if header.record_size < 4 || u64::from(header.record_size) < u64::from(header.field_count) * 4 {
            return Err(QuestforgeError::InvalidFileFormat(format!(
                "WDBC record size {} too small for {} fields",
                header.record_size, header.field_count
            )));
        }

        let records_len = (header.record_count as usize)
            .checked_mul(header.record_size as usize)
            .filter(|&len| len <= data.len() - HEADER_SIZE)
            .ok_or_else(|| {
                QuestforgeError::InvalidFileFormat(format!(
                    "WDBC claims {} records of {} bytes, file has {} bytes",
                    header.record_count,
                    header.record_size,
                    data.len()
                ))
            })?;
        let strings_end = HEADER_SIZE + records_len + header.string_size as usize;
        if data.len() < strings_end {
            return Err(QuestforgeError::InvalidFileFormat(format!(
                "WDBC body truncated: expected {} bytes, found {}",
                strings_end,
                data.len()
            )));
        }

        Ok(Self {
            header,
            records: &data[HEADER_SIZE..HEADER_SIZE + records_len],
            strings: &data[HEADER_SIZE + records_len..strings_end],
        })
    }

    fn field(&self, record: usize, field: usize) -> Option<u32> {
        let size = self.header.record_size as usize;
        if (field + 1) * 4 > size {
            return None;
        }
        let at = record * size + field * 4;
        let bytes = self.records.get(at..at + 4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn string_at(&self, offset: u32) -> String {
        let offset = offset as usize;
        if offset == 0 || offset >= self.strings.len() {
            return String::new();
        }
        match self.strings[offset..].iter().position(|&b| b == 0) {
            Some(len) => String::from_utf8_lossy(&self.strings[offset..offset + len])
                .trim()
                .to_string(),
            None => String::new(),
        }
    }

    fn guess_name_field(&self) -> usize {
        let scan = (self.header.record_count as usize).min(MAX_GUESS_ROWS);
        let mut best: Option<(usize, usize)> = None;

        for &candidate in NAME_FIELD_CANDIDATES {
            let score = (0..scan)
                .filter_map(|row| self.field(row, candidate))
                .map(|offset| self.string_at(offset))
                .filter(|s| s.chars().any(char::is_alphabetic))
                .count();
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((candidate, score));
            }
        }

        best.map(|(field, _)| field).unwrap_or(1)
    }
}

/// Parse `(id, label)` pairs from WDBC bytes, sorted case-insensitively by label.
///
/// Records with id 0 are dropped. Empty names get the kind's fallback label.
pub fn parse_wdbc_labels(data: &[u8], kind: LookupKind) -> Result<Vec<(u32, String)>> {
    let file = WdbcFile::parse(data)?;
    let name_field = kind.name_field().unwrap_or_else(|| file.guess_name_field());
    debug!(
        "{}: {} records, {} fields, name field {}",
        kind, file.header.record_count, file.header.field_count, name_field
    );

    let mut out = Vec::new();
    for row in 0..file.header.record_count as usize {
        let id = file.field(row, 0).unwrap_or(0);
        if id == 0 {
            continue;
        }
        let name = file
            .field(row, name_field)
            .map(|offset| file.string_at(offset))
            .unwrap_or_default();
        let label = if name.is_empty() { kind.fallback_label(id) } else { name };
        out.push((id, label));
    }

    out.sort_by_key(|(_, label)| label.to_lowercase());
    Ok(out)
}

pub fn read_wdbc_labels(path: &Path, kind: LookupKind) -> Result<Vec<(u32, String)>> {
    let data = std::fs::read(path)?;
    parse_wdbc_labels(&data, kind)
}

/// Load outcome of one label table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStatus {
    Loaded(usize),
    Missing(String),
}

#[derive(Debug, Clone)]
pub struct LookupTable {
    pub path: PathBuf,
    pub status: LookupStatus,
    entries: Vec<(u32, String)>,
    by_id: HashMap<u32, usize>,
}

impl LookupTable {
    fn loaded(path: PathBuf, entries: Vec<(u32, String)>) -> Self {
        let by_id = entries
            .iter()
            .enumerate()
            .map(|(idx, (id, _))| (*id, idx))
            .collect();
        Self {
            path,
            status: LookupStatus::Loaded(entries.len()),
            entries,
            by_id,
        }
    }

    fn missing(path: PathBuf, reason: String) -> Self {
        Self {
            path,
            status: LookupStatus::Missing(reason),
            entries: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn label(&self, id: u32) -> Option<&str> {
        self.by_id.get(&id).map(|&idx| self.entries[idx].1.as_str())
    }

    pub fn entries(&self) -> &[(u32, String)] {
        &self.entries
    }

    /// Exact id when `needle` is numeric, otherwise case-insensitive substring.
    pub fn search(&self, needle: &str) -> Vec<&(u32, String)> {
        let needle = needle.trim();
        if let Ok(id) = needle.parse::<u32>() {
            return self
                .by_id
                .get(&id)
                .map(|&idx| vec![&self.entries[idx]])
                .unwrap_or_default();
        }
        let needle = needle.to_lowercase();
        self.entries
            .iter()
            .filter(|(_, label)| label.to_lowercase().contains(&needle))
            .collect()
    }

    /// Append ` (Rank N)` to labels with a known rank.
    pub fn decorate_ranks(&mut self, ranks: &HashMap<u32, u32>) {
        for (id, label) in self.entries.iter_mut() {
            if let Some(rank) = ranks.get(id) {
                label.push_str(&format!(" (Rank {})", rank));
            }
        }
    }
}

/// All label tables, keyed by kind.
#[derive(Debug, Clone)]
pub struct Lookups {
    tables: HashMap<LookupKind, LookupTable>,
}

impl Lookups {
    /// Read every configured DBC. Never fails; unreadable files become empty tables.
    pub fn load(config: &LookupConfig) -> Self {
        let mut tables = HashMap::new();
        for kind in LookupKind::ALL {
            let path = config.path_for(kind);
            let table = match read_wdbc_labels(&path, kind) {
                Ok(entries) => {
                    info!("Loaded {} labels from {}", entries.len(), path.display());
                    LookupTable::loaded(path, entries)
                }
                Err(e) => {
                    warn!("{} unavailable at {}: {}", kind, path.display(), e);
                    LookupTable::missing(path, e.to_string())
                }
            };
            tables.insert(kind, table);
        }
        Self { tables }
    }

    pub fn empty() -> Self {
        let tables = LookupKind::ALL
            .into_iter()
            .map(|kind| {
                (
                    kind,
                    LookupTable::missing(PathBuf::from(kind.file_name()), "not loaded".to_string()),
                )
            })
            .collect();
        Self { tables }
    }

    pub fn table(&self, kind: LookupKind) -> Option<&LookupTable> {
        self.tables.get(&kind)
    }

    pub fn label(&self, kind: LookupKind, id: u32) -> Option<&str> {
        self.tables.get(&kind).and_then(|t| t.label(id))
    }

    pub fn search(&self, kind: LookupKind, needle: &str) -> Vec<&(u32, String)> {
        self.tables
            .get(&kind)
            .map(|t| t.search(needle))
            .unwrap_or_default()
    }

    pub fn status(&self) -> Vec<(LookupKind, &Path, &LookupStatus)> {
        LookupKind::ALL
            .into_iter()
            .filter_map(|kind| {
                self.tables
                    .get(&kind)
                    .map(|t| (kind, t.path.as_path(), &t.status))
            })
            .collect()
    }

    /// Decorate spell labels with ranks from the `spell_ranks` world table.
    ///
    /// Best effort: a missing table or failed query leaves labels untouched.
    pub fn decorate_spell_ranks(&mut self, gateway: &dyn Gateway) {
        let Some(spells) = self.tables.get_mut(&LookupKind::Spell) else {
            return;
        };
        if spells.is_empty() {
            return;
        }
        match load_spell_ranks(gateway) {
            Ok(ranks) => {
                debug!("Applying {} spell ranks", ranks.len());
                spells.decorate_ranks(&ranks);
            }
            Err(e) => debug!("spell_ranks not available: {}", e),
        }
    }
}

pub fn load_spell_ranks(gateway: &dyn Gateway) -> Result<HashMap<u32, u32>> {
    let rows = gateway.fetch_all("SELECT spell_id, `rank` FROM spell_ranks", &[])?;
    let mut ranks = HashMap::new();
    for row in rows {
        let spell = row.get_i64("spell_id").unwrap_or(0);
        let rank = row.get_i64("rank").unwrap_or(0);
        if spell > 0 && rank > 0 {
            ranks.insert(spell as u32, rank as u32);
        }
    }
    Ok(ranks)
}
