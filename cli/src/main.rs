use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use questforge_core::condition::{self, ConditionKey, SOURCE_TYPES};
use questforge_core::dbc::{LookupKind, LookupStatus, Lookups};
use questforge_core::gateway::{self, Gateway, SqliteGateway};
use questforge_core::loot::LootRow;
use questforge_core::quest::fields::{self, SkillOrClass, ZoneOrSort};
use questforge_core::quest::{
    ConditionSlot, DeletePreview, DeleteReport, Objective, ObjectiveKind, ObjectiveNames, Objectives, QuestRecord,
    RewardNames, StepOutcome,
};
use questforge_core::relations::{QuestRelation, RelationEntry};
use questforge_core::search::{self, PickEntry, PickerKind, WorldNames};
use questforge_core::{AppConfig, QuestEditor};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(
    name = "questforge",
    version = "0.1.0",
    about = "Edit quests, conditions and quest loot in a Cataclysm 4.3.4 world database",
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, env = "QUESTFORGE_CONFIG", default_value = "questforge.toml")]
    config: PathBuf,

    /// Path to a SQLite world database (overrides [database] in the config)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Path to log file
    #[arg(long, global = true, default_value = "/tmp/questforge.log")]
    log_file: PathBuf,

    /// Verbosity level (repeat for more verbose output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search quests by id or title inside the configured id range
    Search {
        #[arg(default_value = "")]
        query: String,
    },

    /// Show a quest with its rewards, relations and conditions
    Show { quest: u32 },

    /// Work with the condition rows tied to a quest
    Conditions {
        quest: u32,
        #[command(subcommand)]
        action: ConditionAction,
    },

    /// Work with the loot rows behind one of the quest's condition rows
    Loot {
        quest: u32,
        /// Index of the condition row, as printed by `conditions <QUEST> list`
        #[arg(long)]
        row: usize,
        #[command(subcommand)]
        action: LootAction,
    },

    /// Manage quest starters and enders
    Relations {
        quest: u32,
        #[command(subcommand)]
        action: RelationAction,
    },

    /// Create the next free quest in the configured id range
    NewQuest {
        /// COLUMN=VALUE pairs to save right away
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },

    /// Update quest_template columns
    SaveQuest {
        quest: u32,
        /// COLUMN=VALUE pairs
        #[arg(long = "set", value_parser = parse_assignment, required = true)]
        set: Vec<(String, String)>,
    },

    /// Show the objective slots, or rewrite them and save the changed columns
    Objectives {
        quest: u32,
        /// SLOT=KIND:ID[:COUNT]; KIND is creature, go, item, spell or none. Regenerates the slot's text
        #[arg(long = "set", value_parser = parse_objective)]
        set: Vec<(usize, Objective)>,
        /// SLOT=TEXT to write ObjectiveText by hand
        #[arg(long = "text", value_parser = parse_slot_text)]
        text: Vec<(usize, String)>,
    },

    /// Count what deleting a quest would remove, without deleting anything
    DeletePreview { quest: u32 },

    /// Delete a quest with its relations, conditions and quest-drop loot rows
    Delete {
        quest: u32,
        /// Actually delete; without it only the preview is printed
        #[arg(long, default_value_t = false)]
        yes: bool,
    },

    /// Look up ids in a world table (item, creature, gameobject, quest)
    Pick {
        kind: PickerKind,
        #[arg(default_value = "")]
        query: String,
    },

    /// Look up ids for one column of a condition row
    PickFor {
        #[arg(long)]
        source_type: i32,
        #[arg(long, default_value_t = 0)]
        condition_type: i32,
        #[arg(long, value_enum)]
        column: PickColumn,
        #[arg(default_value = "")]
        query: String,
    },

    /// Show the DBC label tables, or search one of them
    Lookup {
        #[arg(value_enum)]
        kind: Option<LookupArg>,
        #[arg(default_value = "")]
        query: String,
    },

    /// List source types, or describe one with the condition types valid for it
    Catalog {
        #[arg(allow_negative_numbers = true)]
        source_type: Option<i32>,
        /// Also describe this condition type
        #[arg(long, allow_negative_numbers = true)]
        condition_type: Option<i32>,
    },

    /// Create a SQLite world database with the tables the editor uses
    InitSandbox { path: PathBuf },
}

#[derive(Subcommand)]
enum ConditionAction {
    /// List condition rows with their index
    List,
    /// Add a row for SOURCE_TYPE, apply the given columns and save it
    Add {
        #[arg(allow_negative_numbers = true)]
        source_type: i32,
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },
    /// Change columns of a row and save it
    Set {
        row: usize,
        #[arg(long = "set", value_parser = parse_assignment, required = true)]
        set: Vec<(String, String)>,
    },
    /// Delete a row; a QUESTTAKEN row takes its ElseGroup and orphaned loot row along
    Delete { row: usize },
    /// Add QUESTTAKEN rows for quest-only creature drops of the required items
    Sync,
}

#[derive(Subcommand)]
enum LootAction {
    /// List the rows sharing the selected reference id
    List {
        /// Also write the rows to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Insert or update one row under the selected reference id
    Save {
        item: i64,
        #[arg(long, default_value_t = -100.0, allow_negative_numbers = true)]
        chance: f64,
        #[arg(long, default_value_t = 1)]
        lootmode: i64,
        #[arg(long, default_value_t = 0)]
        groupid: i64,
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        mincount: i64,
        #[arg(long, default_value_t = 1)]
        maxcount: i64,
    },
    /// Delete one row under the selected reference id
    Delete { item: i64 },
    /// Insert the quest-drop row for the selected condition unless it exists
    Create,
}

#[derive(Subcommand)]
enum RelationAction {
    List,
    Add {
        #[arg(value_enum)]
        kind: RelationArg,
        id: i64,
    },
    Remove {
        #[arg(value_enum)]
        kind: RelationArg,
        id: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RelationArg {
    CreatureStarter,
    CreatureEnder,
    GoStarter,
    GoEnder,
}

impl From<RelationArg> for QuestRelation {
    fn from(arg: RelationArg) -> Self {
        match arg {
            RelationArg::CreatureStarter => QuestRelation::CreatureStarter,
            RelationArg::CreatureEnder => QuestRelation::CreatureEnder,
            RelationArg::GoStarter => QuestRelation::GameObjectStarter,
            RelationArg::GoEnder => QuestRelation::GameObjectEnder,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LookupArg {
    Area,
    QuestSort,
    SkillLine,
    Spell,
    Faction,
    Currency,
}

impl From<LookupArg> for LookupKind {
    fn from(arg: LookupArg) -> Self {
        match arg {
            LookupArg::Area => LookupKind::Area,
            LookupArg::QuestSort => LookupKind::QuestSort,
            LookupArg::SkillLine => LookupKind::SkillLine,
            LookupArg::Spell => LookupKind::Spell,
            LookupArg::Faction => LookupKind::Faction,
            LookupArg::Currency => LookupKind::CurrencyTypes,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PickColumn {
    SourceGroup,
    SourceEntry,
    Value1,
}

fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    let (column, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=VALUE, got '{}'", s))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("missing column name in '{}'", s));
    }
    Ok((column.to_string(), value.to_string()))
}

fn parse_slot(s: &str) -> std::result::Result<usize, String> {
    s.trim()
        .parse::<usize>()
        .map_err(|_| format!("'{}' is not an objective slot", s))
}

fn parse_slot_text(s: &str) -> std::result::Result<(usize, String), String> {
    let (slot, text) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SLOT=TEXT, got '{}'", s))?;
    Ok((parse_slot(slot)?, text.to_string()))
}

fn parse_objective(s: &str) -> std::result::Result<(usize, Objective), String> {
    let (slot, objective) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SLOT=KIND:ID[:COUNT], got '{}'", s))?;
    let slot = parse_slot(slot)?;

    let mut parts = objective.split(':');
    let kind: ObjectiveKind = parts.next().unwrap_or_default().trim().parse()?;
    if kind == ObjectiveKind::None {
        return Ok((slot, Objective::default()));
    }
    let number = |part: Option<&str>, what: &str| -> std::result::Result<i64, String> {
        match part.map(str::trim) {
            None | Some("") => Ok(0),
            Some(raw) => raw.parse().map_err(|_| format!("'{}' is not a valid {}", raw, what)),
        }
    };
    let id = number(parts.next(), "id")?;
    if id == 0 {
        return Err(format!("missing id in '{}'", s));
    }
    let count = number(parts.next(), "count")?;
    Ok((slot, Objective::new(kind, id, count)))
}

fn setup_logging(verbose: u8, log_file: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter_level = match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(filter_level.into());

    let file_appender = tracing_appender::rolling::never(
        log_file.parent().unwrap_or(Path::new(".")),
        log_file.file_name().unwrap_or(std::ffi::OsStr::new("questforge.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::Layer::new().with_writer(std::io::stderr).with_ansi(true))
        .with(fmt::Layer::new().with_writer(non_blocking).with_ansi(false));

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        info!("No config at {:?}, using defaults", path);
        return Ok(AppConfig::default());
    }
    AppConfig::from_file(path).with_context(|| format!("Failed to load config {:?}", path))
}

/// The configuration plus an open world database.
struct Session {
    config: AppConfig,
    gateway: Arc<dyn Gateway>,
}

impl Session {
    fn open(config: AppConfig, sqlite_override: Option<&Path>) -> Result<Self> {
        let gateway: Arc<dyn Gateway> = match sqlite_override {
            Some(path) => Arc::new(SqliteGateway::open(path)?),
            None => Arc::from(gateway::connect(&config.database)?),
        };
        info!("Using {} world database", gateway.backend_name());
        Ok(Self { config, gateway })
    }

    fn editor(&self) -> QuestEditor {
        QuestEditor::new(Arc::clone(&self.gateway), &self.config)
    }

    fn editor_for(&self, quest: u32) -> Result<QuestEditor> {
        let mut editor = self.editor();
        editor.load(quest)?;
        Ok(editor)
    }

    fn lookups(&self) -> Lookups {
        let mut lookups = Lookups::load(&self.config.lookups);
        lookups.decorate_spell_ranks(self.gateway.as_ref());
        lookups
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_entries(entries: &[PickEntry]) {
    if entries.is_empty() {
        println!("No matches");
    }
    for entry in entries {
        println!("{:>8}  {}", entry.id, entry.name);
    }
}

fn print_conditions(quest: u32, slots: &[ConditionSlot]) {
    if slots.is_empty() {
        println!("No conditions for quest {}", quest);
        return;
    }
    for (idx, slot) in slots.iter().enumerate() {
        let c = &slot.condition;
        let type_name = c.condition_info().map_or("?", |info| info.name);
        println!(
            "[{}]{} {}/{}/{}/{} else={} {}({}) target={} values=({}, {}, {}) negative={}{}{}",
            idx,
            if slot.is_dirty() { "*" } else { "" },
            c.source_type,
            c.source_group,
            c.source_entry,
            c.source_id,
            c.else_group,
            type_name,
            c.condition_type,
            c.condition_target,
            c.value1,
            c.value2,
            c.value3,
            c.negative,
            if c.is_anchor_for(quest) { " [quest]" } else { "" },
            if c.comment.is_empty() {
                String::new()
            } else {
                format!(" -- {}", c.comment)
            }
        );
    }
}

fn print_relations(relations: &[(QuestRelation, Vec<RelationEntry>)]) {
    for (relation, entries) in relations {
        let listed = entries
            .iter()
            .map(|e| format!("{} {}", e.id, e.name))
            .collect::<Vec<_>>()
            .join(", ");
        println!("{}: {}", relation.label(), if listed.is_empty() { "-" } else { &listed });
    }
}

fn print_loot(editor: &QuestEditor) {
    let loot = editor.loot();
    let (Some(table), Some(reference)) = (loot.table(), loot.reference_id()) else {
        println!("No loot table selected");
        return;
    };
    println!("{} entry={} ({} rows)", table.table_name(), reference, loot.rows().len());
    for row in loot.rows() {
        let focused = loot.focused() == Some((row.entry, row.item));
        println!(
            "{} item={:<8} chance={:<8} lootmode={} groupid={} mincountOrRef={} maxcount={}",
            if focused { ">" } else { " " },
            row.item,
            row.chance,
            row.lootmode,
            row.groupid,
            row.mincount_or_ref,
            row.maxcount
        );
    }
}

fn print_objectives(objectives: &Objectives) {
    for (idx, slot) in objectives.slots().iter().enumerate() {
        let requirement = match slot.kind {
            ObjectiveKind::None => "-".to_string(),
            ObjectiveKind::SpellCast => format!("{:?} {}", slot.kind, slot.id),
            kind => format!("{:?} {} x{}", kind, slot.id, slot.count),
        };
        println!("[{}] {:<24} {}", idx + 1, requirement, slot.text);
    }
}

fn mask_text(names: Vec<String>, empty: &str) -> String {
    if names.is_empty() {
        empty.to_string()
    } else {
        names.join(", ")
    }
}

fn print_preview(preview: &DeletePreview) {
    println!("Delete quest {}: {}", preview.quest, preview.title);
    println!("  condition groups: {}", preview.condition_groups);
    println!("  condition rows:   {}", preview.condition_rows);
    for (table, count) in &preview.loot_rows {
        println!("  {}: {}", table.table_name(), count);
    }
    for (relation, count) in &preview.relation_rows {
        println!("  {}: {}", relation.table_name(), count);
    }
    if !preview.unmapped_sources.is_empty() {
        let keys = preview
            .unmapped_sources
            .iter()
            .map(|ConditionKey { source_type, source_group, source_entry, source_id }| {
                format!("{}/{}/{}/{}", source_type, source_group, source_entry, source_id)
            })
            .collect::<Vec<_>>()
            .join(", ");
        println!("  condition sources without loot rows: {}", keys);
    }
}

fn print_report(report: &DeleteReport) {
    for step in &report.steps {
        match &step.outcome {
            StepOutcome::Deleted(n) => println!("  {}: {} deleted", step.table, n),
            StepOutcome::Failed { deleted, message } => {
                println!("  {}: FAILED after {} deleted: {}", step.table, deleted, message)
            }
        }
    }
}

fn zone_or_sort_text(value: ZoneOrSort, lookups: &Lookups) -> String {
    match value {
        ZoneOrSort::None => "-".to_string(),
        ZoneOrSort::Zone(id) => format!(
            "Zone {} ({})",
            id,
            lookups.label(LookupKind::Area, id).unwrap_or("unknown")
        ),
        ZoneOrSort::Sort(id) => format!(
            "Sort {} ({})",
            id,
            lookups.label(LookupKind::QuestSort, id).unwrap_or("unknown")
        ),
    }
}

fn skill_or_class_text(value: SkillOrClass, lookups: &Lookups) -> String {
    match value {
        SkillOrClass::None => "-".to_string(),
        SkillOrClass::Skill(id) => format!(
            "Skill {} ({})",
            id,
            lookups.label(LookupKind::SkillLine, id).unwrap_or("unknown")
        ),
        SkillOrClass::ClassMask(mask) => {
            format!("Classes {}", SkillOrClass::class_names(mask).join(", "))
        }
    }
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    quest: &'a QuestRecord,
    zone_or_sort: ZoneOrSort,
    skill_or_class: SkillOrClass,
    quest_flags: Vec<String>,
    required_races: Vec<String>,
    objectives: Objectives,
    rewards: questforge_core::quest::RewardSummary,
    relations: &'a [(QuestRelation, Vec<RelationEntry>)],
    conditions: &'a [ConditionSlot],
}

#[derive(Serialize)]
struct LookupLine {
    file: &'static str,
    path: String,
    labels: usize,
    error: Option<String>,
}

fn select_loot(session: &Session, quest: u32, row: usize) -> Result<QuestEditor> {
    let mut editor = session.editor_for(quest)?;
    editor.select_condition(Some(row))?;
    if !editor.loot().is_active() {
        bail!(
            "Condition row {} of quest {} has no loot table behind it (or SourceGroup is 0)",
            row,
            quest
        );
    }
    Ok(editor)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.config)?;
    let json = cli.json;
    let database = cli.database.clone();
    let open = |config: AppConfig| Session::open(config, database.as_deref());

    match cli.command {
        Commands::Search { query } => {
            let session = open(config)?;
            let hits = search::search_quests(session.gateway.as_ref(), &query, &session.config.quest_ids)?;
            if json {
                print_json(&hits)?;
            } else if hits.is_empty() {
                println!("No quests found");
            } else {
                for hit in &hits {
                    println!("{:>8}  L{:<3} {}", hit.entry, hit.min_level, hit.title);
                }
            }
        }
        Commands::Show { quest } => {
            let session = open(config)?;
            let lookups = session.lookups();
            let editor = session.editor_for(quest)?;
            let names = WorldNames {
                gateway: session.gateway.as_ref(),
                lookups: &lookups,
            };
            let Some(record) = editor.quest() else {
                bail!("Quest {} did not load", quest);
            };
            let rewards = record.reward_summary(Some(&names as &dyn RewardNames));
            let quest_flags = fields::quest_flag_names(record.get_i64("QuestFlags") as u32);
            let required_races = fields::race_names(record.get_i64("RequiredRaces") as u32);
            let objectives = editor.objectives()?;

            if json {
                print_json(&ShowOutput {
                    quest: record,
                    zone_or_sort: record.zone_or_sort(),
                    skill_or_class: record.skill_or_class(),
                    quest_flags,
                    required_races,
                    objectives,
                    rewards,
                    relations: editor.relations(),
                    conditions: editor.conditions(),
                })?;
            } else {
                println!("Quest {}: {}", record.entry(), record.title());
                println!("  Zone/Sort:   {}", zone_or_sort_text(record.zone_or_sort(), &lookups));
                println!("  Skill/Class: {}", skill_or_class_text(record.skill_or_class(), &lookups));
                println!(
                    "  Levels:      {} (min {}, max {})",
                    record.get_i64("QuestLevel"),
                    record.get_i64("MinLevel"),
                    record.get_i64("MaxLevel")
                );
                println!("  Flags:       {}", mask_text(quest_flags, "-"));
                println!("  Races:       {}", mask_text(required_races, "any"));
                let required = record.required_items();
                if !required.is_empty() {
                    let items = required
                        .iter()
                        .map(|id| names.item_name(*id).map_or(id.to_string(), |n| format!("{} {}", id, n)))
                        .collect::<Vec<_>>()
                        .join(", ");
                    println!("  Required items: {}", items);
                }
                println!("Objectives:");
                print_objectives(&objectives);
                if !rewards.choice.is_empty() {
                    println!("Choice rewards:");
                    for line in &rewards.choice {
                        println!("  {}", line);
                    }
                }
                if !rewards.guaranteed.is_empty() {
                    println!("Rewards:");
                    for line in &rewards.guaranteed {
                        println!("  {}", line);
                    }
                }
                print_relations(editor.relations());
                println!("Conditions:");
                print_conditions(quest, editor.conditions());
            }
        }
        Commands::Conditions { quest, action } => {
            let session = open(config)?;
            let mut editor = session.editor_for(quest)?;
            match action {
                ConditionAction::List => {}
                ConditionAction::Add { source_type, set } => {
                    let idx = editor.add_condition(source_type)?;
                    for (column, value) in &set {
                        editor.update_condition(idx, column, value)?;
                    }
                    let outcome = editor.save_condition(idx)?;
                    info!("Condition for quest {}: {:?}", quest, outcome);
                }
                ConditionAction::Set { row, set } => {
                    for (column, value) in &set {
                        editor.update_condition(row, column, value)?;
                    }
                    let outcome = editor.save_condition(row)?;
                    info!("Condition {} of quest {}: {:?}", row, quest, outcome);
                }
                ConditionAction::Delete { row } => {
                    let deleted = editor.delete_condition(row)?;
                    println!("Deleted {} row(s)", deleted);
                }
                ConditionAction::Sync => {
                    let inserted = editor.sync_from_required_items()?;
                    println!("Inserted {} condition(s)", inserted);
                }
            }
            if json {
                print_json(editor.conditions())?;
            } else {
                print_conditions(quest, editor.conditions());
            }
        }
        Commands::Loot { quest, row, action } => {
            let session = open(config)?;
            let mut editor = select_loot(&session, quest, row)?;
            match action {
                LootAction::List { csv } => {
                    if let Some(path) = csv {
                        let mut writer = csv::Writer::from_path(&path)
                            .with_context(|| format!("Failed to create {:?}", path))?;
                        for loot_row in editor.loot().rows() {
                            writer.serialize(loot_row)?;
                        }
                        writer.flush()?;
                        info!("Wrote {} loot rows to {:?}", editor.loot().rows().len(), path);
                    }
                }
                LootAction::Save {
                    item,
                    chance,
                    lootmode,
                    groupid,
                    mincount,
                    maxcount,
                } => {
                    let Some(entry) = editor.loot().reference_id() else {
                        bail!("No loot reference id selected");
                    };
                    let loot_row = LootRow {
                        entry,
                        item,
                        chance,
                        lootmode,
                        groupid,
                        mincount_or_ref: mincount,
                        maxcount,
                    };
                    let outcome = editor.loot_mut().upsert(&loot_row)?;
                    println!("entry={} item={}: {:?}", entry, item, outcome);
                }
                LootAction::Delete { item } => {
                    let Some(entry) = editor.loot().reference_id() else {
                        bail!("No loot reference id selected");
                    };
                    let deleted = editor.loot_mut().delete(entry, item)?;
                    println!("Deleted {} row(s)", deleted);
                }
                LootAction::Create => {
                    if editor.create_selected_loot_row()? {
                        println!("Created quest-drop row");
                    } else {
                        println!("Row already exists");
                    }
                }
            }
            if json {
                print_json(editor.loot().rows())?;
            } else {
                print_loot(&editor);
            }
        }
        Commands::Relations { quest, action } => {
            let session = open(config)?;
            let mut editor = session.editor_for(quest)?;
            match action {
                RelationAction::List => {}
                RelationAction::Add { kind, id } => {
                    if !editor.add_relation(kind.into(), id)? {
                        println!("Relation already present");
                    }
                }
                RelationAction::Remove { kind, id } => {
                    let removed = editor.remove_relation(kind.into(), id)?;
                    println!("Removed {} row(s)", removed);
                }
            }
            if json {
                print_json(editor.relations())?;
            } else {
                print_relations(editor.relations());
            }
        }
        Commands::NewQuest { set } => {
            let session = open(config)?;
            let mut editor = session.editor();
            let quest = editor.new_quest()?;
            if !set.is_empty() {
                editor.save_quest(&set)?;
            }
            if json {
                print_json(&editor.quest())?;
            } else {
                println!("Created quest {}", quest);
            }
        }
        Commands::SaveQuest { quest, set } => {
            let session = open(config)?;
            let mut editor = session.editor_for(quest)?;
            let changes = editor.save_quest(&set)?;
            if json {
                print_json(&changes)?;
            } else if changes.is_empty() {
                println!("No changes");
            } else {
                for change in &changes {
                    println!("{}: {} -> {}", change.column, change.old, change.new);
                }
            }
        }
        Commands::Objectives { quest, set, text } => {
            let session = open(config)?;
            let mut editor = session.editor_for(quest)?;
            let mut objectives = editor.objectives()?;
            if set.is_empty() && text.is_empty() {
                if json {
                    print_json(&objectives)?;
                } else {
                    print_objectives(&objectives);
                }
                return Ok(());
            }

            let lookups = session.lookups();
            let names = WorldNames {
                gateway: session.gateway.as_ref(),
                lookups: &lookups,
            };
            for (slot, objective) in set {
                objectives.set(slot, objective)?;
                objectives.autofill(slot, Some(&names as &dyn ObjectiveNames))?;
            }
            for (slot, line) in &text {
                objectives.set_text(*slot, line)?;
            }

            let changes = editor.save_objectives(&objectives)?;
            if json {
                print_json(&changes)?;
            } else {
                for change in &changes {
                    println!("{}: {} -> {}", change.column, change.old, change.new);
                }
                print_objectives(&editor.objectives()?);
            }
        }
        Commands::DeletePreview { quest } => {
            let session = open(config)?;
            let mut editor = session.editor_for(quest)?;
            let preview = editor.request_delete()?;
            if json {
                print_json(preview)?;
            } else {
                print_preview(preview);
            }
        }
        Commands::Delete { quest, yes } => {
            let session = open(config)?;
            let mut editor = session.editor_for(quest)?;
            let preview = editor.request_delete()?.clone();
            if !yes {
                if json {
                    print_json(&preview)?;
                } else {
                    print_preview(&preview);
                    println!("Nothing deleted. Re-run with --yes to delete quest {}.", quest);
                }
                return Ok(());
            }

            let report = editor.confirm_delete()?;
            if json {
                print_json(&report)?;
            } else {
                println!("Deleted quest {}: {}", quest, preview.title);
                print_report(&report);
            }
            if !report.is_complete() {
                bail!("Quest {} was only partly deleted; see the failed steps above", quest);
            }
        }
        Commands::Pick { kind, query } => {
            let session = open(config)?;
            let entries = search::pick(session.gateway.as_ref(), kind, &query)?;
            if json {
                print_json(&entries)?;
            } else {
                print_entries(&entries);
            }
        }
        Commands::PickFor {
            source_type,
            condition_type,
            column,
            query,
        } => {
            let picker = match column {
                PickColumn::SourceGroup => search::source_group_picker(source_type),
                PickColumn::SourceEntry => search::source_entry_picker(source_type),
                PickColumn::Value1 => search::value1_picker(condition_type),
            };
            let Some(picker) = picker else {
                bail!(
                    "No picker for {:?} with source type {} and condition type {}",
                    column,
                    source_type,
                    condition_type
                );
            };
            let session = open(config)?;
            let lookups = session.lookups();
            let entries = search::run_picker(session.gateway.as_ref(), &lookups, picker, &query)?;
            if json {
                print_json(&entries)?;
            } else {
                let labels = condition::field_labels(source_type, condition_type);
                let label = match column {
                    PickColumn::SourceGroup => labels.source_group,
                    PickColumn::SourceEntry => labels.source_entry,
                    PickColumn::Value1 => labels.value1,
                };
                println!("{}", label);
                print_entries(&entries);
            }
        }
        Commands::Lookup { kind, query } => {
            let lookups = Lookups::load(&config.lookups);
            match kind {
                Some(kind) => {
                    let kind = LookupKind::from(kind);
                    let entries: Vec<PickEntry> = lookups
                        .search(kind, &query)
                        .into_iter()
                        .take(search::MAX_RESULTS)
                        .map(|(id, name)| PickEntry {
                            id: i64::from(*id),
                            name: name.clone(),
                        })
                        .collect();
                    if json {
                        print_json(&entries)?;
                    } else {
                        print_entries(&entries);
                    }
                }
                None => {
                    let lines: Vec<LookupLine> = lookups
                        .status()
                        .into_iter()
                        .map(|(kind, path, status)| LookupLine {
                            file: kind.file_name(),
                            path: path.display().to_string(),
                            labels: match status {
                                LookupStatus::Loaded(n) => *n,
                                LookupStatus::Missing(_) => 0,
                            },
                            error: match status {
                                LookupStatus::Loaded(_) => None,
                                LookupStatus::Missing(reason) => Some(reason.clone()),
                            },
                        })
                        .collect();
                    if json {
                        print_json(&lines)?;
                    } else {
                        for line in &lines {
                            match &line.error {
                                None => println!("{:<18} {:>6} labels  {}", line.file, line.labels, line.path),
                                Some(reason) => println!("{:<18} missing       {} ({})", line.file, line.path, reason),
                            }
                        }
                    }
                }
            }
        }
        Commands::Catalog {
            source_type,
            condition_type,
        } => match source_type {
            None => {
                for info in SOURCE_TYPES.iter() {
                    println!("{:>3}  {}", info.id, info.name);
                }
            }
            Some(source_type) => {
                println!("{}", condition::source_type_tooltip(source_type));
                if let Some(condition_type) = condition_type {
                    println!("{}", condition::condition_type_tooltip(condition_type));
                } else {
                    println!("Valid condition types:");
                    for info in condition::valid_condition_types(source_type) {
                        println!("{:>3}  {}", info.id, info.name);
                    }
                }
            }
        },
        Commands::InitSandbox { path } => {
            let db = SqliteGateway::open(&path)?;
            db.install_world_schema()?;
            println!("World schema installed in {:?}", path);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = setup_logging(cli.verbose, &cli.log_file)?;

    info!("Starting questforge CLI");

    // the MySQL gateway drives its own runtime with block_on, so stay off the async workers
    tokio::task::spawn_blocking(move || run(cli)).await??;

    info!("Questforge CLI finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("Title=Kobold Candles").unwrap(),
            ("Title".to_string(), "Kobold Candles".to_string())
        );
        assert_eq!(parse_assignment("Comment=").unwrap().1, "");
        assert_eq!(parse_assignment("Details=a=b").unwrap().1, "a=b");
        assert!(parse_assignment("Title").is_err());
        assert!(parse_assignment("=5").is_err());
    }

    #[test]
    fn test_parse_objective() {
        let (slot, objective) = parse_objective("2=go:1593:3").unwrap();
        assert_eq!(slot, 2);
        assert_eq!(objective, Objective::new(ObjectiveKind::GameObject, 1593, 3));

        let (_, objective) = parse_objective("1=creature:38").unwrap();
        assert_eq!((objective.kind, objective.id, objective.count), (ObjectiveKind::Creature, 38, 0));

        assert_eq!(parse_objective("4=none").unwrap().1, Objective::default());
        assert!(parse_objective("1=item").is_err());
        assert!(parse_objective("1=quest:5").is_err());
        assert!(parse_objective("x=item:5").is_err());
        assert_eq!(parse_slot_text("3=Find the boat").unwrap(), (3, "Find the boat".to_string()));
    }

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from([
            "questforge",
            "--database",
            "world.sqlite",
            "conditions",
            "12345",
            "add",
            "1",
            "--set",
            "SourceGroup=38",
            "--set",
            "SourceEntry=772",
        ])
        .unwrap();
        assert_eq!(cli.database, Some(PathBuf::from("world.sqlite")));
        match cli.command {
            Commands::Conditions {
                quest,
                action: ConditionAction::Add { source_type, set },
            } => {
                assert_eq!(quest, 12345);
                assert_eq!(source_type, 1);
                assert_eq!(set.len(), 2);
            }
            _ => panic!("expected conditions add"),
        }

        let cli = Cli::try_parse_from([
            "questforge", "loot", "12345", "--row", "0", "save", "772", "--chance", "-40",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Loot {
                action: LootAction::Save { chance, .. },
                ..
            } if chance == -40.0
        ));

        let cli = Cli::try_parse_from(["questforge", "relations", "7", "add", "go-ender", "2843"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Relations {
                action: RelationAction::Add {
                    kind: RelationArg::GoEnder,
                    id: 2843
                },
                ..
            }
        ));
    }
}
