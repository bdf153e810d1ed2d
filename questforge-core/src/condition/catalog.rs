//! Static meaning tables for `SourceTypeOrReferenceId` and `ConditionTypeOrReference`.

use crate::loot::LootTable;

/// What the key columns of a `conditions` row mean for one source type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceTypeInfo {
    pub id: i32,
    pub name: &'static str,
    pub source_group: &'static str,
    pub source_entry: &'static str,
    pub source_id: &'static str,
    pub condition_target: &'static str,
    pub notes: &'static str,
}

impl SourceTypeInfo {
    pub fn loot_table(&self) -> Option<LootTable> {
        LootTable::for_source_type(self.id)
    }

    /// Loot sources whose rows are tied to the quest that needs the drop.
    /// Reference loot is shared between templates and cannot be tied to one quest.
    pub fn is_quest_anchored(&self) -> bool {
        matches!(self.loot_table(), Some(table) if table != LootTable::Reference)
    }

    /// The source exposes exactly one condition target.
    pub fn has_single_target(&self) -> bool {
        self.condition_target == ALWAYS_ZERO || self.condition_target == NEVER_USED
    }
}

/// What the value columns of a `conditions` row mean for one condition type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionTypeInfo {
    pub id: i32,
    pub name: &'static str,
    pub value1: &'static str,
    pub value2: &'static str,
    pub value3: &'static str,
    pub usage: &'static str,
    /// Filled into ConditionValue2 when it is still 0.
    pub value2_default: i64,
}

impl ConditionTypeInfo {
    /// ConditionValue1 holds a quest id.
    pub fn takes_quest_id(&self) -> bool {
        QUEST_CONDITION_TYPES.contains(&self.id)
    }

    /// Compares against a second target, which needs a source with more than one.
    pub fn needs_second_target(&self) -> bool {
        matches!(self.id, 33..=35)
    }
}

const ALWAYS_ZERO: &str = "Always 0";
const NEVER_USED: &str = "(Never used)";

/// Condition types whose ConditionValue1 is a quest id.
pub const QUEST_CONDITION_TYPES: [i32; 6] = [8, 9, 14, 28, 43, 47];
/// CONDITION_QUESTTAKEN, the row that ties a source key to a quest.
pub const ANCHOR_CONDITION_TYPE: i32 = 9;
pub const QUEST_AVAILABLE_SOURCE_TYPE: i32 = 19;

pub const SOURCE_TYPE_HEADER: &str = "SourceTypeOrReferenceId:\n\
    \u{2022} If negative: ID of a reference (referenced directly in ConditionTypeOrReference of another condition).\n\
    \u{2022} If positive: source type of the condition to be applied.";

pub const CONDITION_TYPE_HEADER: &str = "ConditionTypeOrReference:\n\
    \u{2022} If negative: ID of a reference (references SourceTypeOrReferenceId of another condition).\n\
    \u{2022} If positive: condition type to be applied.";

const fn src(
    id: i32,
    name: &'static str,
    source_group: &'static str,
    source_entry: &'static str,
    source_id: &'static str,
    condition_target: &'static str,
    notes: &'static str,
) -> SourceTypeInfo {
    SourceTypeInfo {
        id,
        name,
        source_group,
        source_entry,
        source_id,
        condition_target,
        notes,
    }
}

const fn loot_src(id: i32, name: &'static str, group: &'static str, entry: &'static str, notes: &'static str) -> SourceTypeInfo {
    src(id, name, group, entry, ALWAYS_ZERO, ALWAYS_ZERO, notes)
}

pub static SOURCE_TYPES: &[SourceTypeInfo] = &[
    src(0, "CONDITION_SOURCE_TYPE_NONE", NEVER_USED, NEVER_USED, NEVER_USED, NEVER_USED, ""),
    loot_src(
        1,
        "CONDITION_SOURCE_TYPE_CREATURE_LOOT_TEMPLATE",
        "creature_loot_template.Entry OR reference_loot_template.Entry",
        "Item ID (creature_loot_template.Item or reference_loot_template.Item)",
        "Used for creature loot drops.",
    ),
    loot_src(
        2,
        "CONDITION_SOURCE_TYPE_DISENCHANT_LOOT_TEMPLATE",
        "disenchant_loot_template.Entry OR reference_loot_template.Entry",
        "Item ID (disenchant_loot_template.Item or reference_loot_template.Item)",
        "Used for disenchant results.",
    ),
    loot_src(
        3,
        "CONDITION_SOURCE_TYPE_FISHING_LOOT_TEMPLATE",
        "fishing_loot_template.Entry OR reference_loot_template.Entry",
        "Item ID (fishing_loot_template.Item or reference_loot_template.Item)",
        "Used for fishing loot.",
    ),
    loot_src(
        4,
        "CONDITION_SOURCE_TYPE_GAMEOBJECT_LOOT_TEMPLATE",
        "gameobject_loot_template.Entry OR reference_loot_template.Entry",
        "Item ID (gameobject_loot_template.Item or reference_loot_template.Item)",
        "Used for object loot (chests, nodes, etc).",
    ),
    loot_src(
        5,
        "CONDITION_SOURCE_TYPE_ITEM_LOOT_TEMPLATE",
        "item_loot_template.Entry OR reference_loot_template.Entry",
        "Item ID (item_loot_template.Item or reference_loot_template.Item)",
        "Used for items that generate loot.",
    ),
    loot_src(
        6,
        "CONDITION_SOURCE_TYPE_MAIL_LOOT_TEMPLATE",
        "mail_loot_template.Entry OR reference_loot_template.Entry",
        "Item ID (mail_loot_template.Item or reference_loot_template.Item)",
        "Used for mail attachments.",
    ),
    loot_src(
        7,
        "CONDITION_SOURCE_TYPE_MILLING_LOOT_TEMPLATE",
        "milling_loot_template.Entry OR reference_loot_template.Entry",
        "Item ID (milling_loot_template.Item or reference_loot_template.Item)",
        "Used for milling results.",
    ),
    loot_src(
        8,
        "CONDITION_SOURCE_TYPE_PICKPOCKETING_LOOT_TEMPLATE",
        "pickpocketing_loot_template.Entry OR reference_loot_template.Entry",
        "Item ID (pickpocketing_loot_template.Item or reference_loot_template.Item)",
        "Used for pickpocketing loot.",
    ),
    loot_src(
        9,
        "CONDITION_SOURCE_TYPE_PROSPECTING_LOOT_TEMPLATE",
        "prospecting_loot_template.Entry OR reference_loot_template.Entry",
        "Item ID (prospecting_loot_template.Item or reference_loot_template.Item)",
        "Used for prospecting results.",
    ),
    loot_src(
        10,
        "CONDITION_SOURCE_TYPE_REFERENCE_LOOT_TEMPLATE",
        "reference_loot_template.Entry",
        "Item ID (reference_loot_template.Item)",
        "Used for shared reference loot pools.",
    ),
    loot_src(
        11,
        "CONDITION_SOURCE_TYPE_SKINNING_LOOT_TEMPLATE",
        "skinning_loot_template.Entry OR reference_loot_template.Entry",
        "Item ID (skinning_loot_template.Item or reference_loot_template.Item)",
        "Used for skinning loot.",
    ),
    loot_src(
        12,
        "CONDITION_SOURCE_TYPE_SPELL_LOOT_TEMPLATE",
        "spell_loot_template.Entry OR reference_loot_template.Entry",
        "Item ID (spell_loot_template.Item or reference_loot_template.Item)",
        "Used for spell-triggered loot.",
    ),
    src(
        13,
        "CONDITION_SOURCE_TYPE_SPELL_IMPLICIT_TARGET",
        "Effect mask (bitmask):\n1 = EFFECT_0, 2 = EFFECT_1, 4 = EFFECT_2 ... 2^31 = EFFECT_31",
        "Spell ID",
        ALWAYS_ZERO,
        "0 = Potential target\n1 = Spell caster",
        "Do NOT rely on Wowhead effect counts; they may be incorrect.",
    ),
    src(
        14,
        "CONDITION_SOURCE_TYPE_GOSSIP_MENU",
        "gossip_menu.entry",
        "gossip_menu.text_id (npc_text.ID)",
        ALWAYS_ZERO,
        "0 = Player\n1 = WorldObject",
        "Controls gossip menu visibility.",
    ),
    src(
        15,
        "CONDITION_SOURCE_TYPE_GOSSIP_MENU_OPTION",
        "gossip_menu_option.menu_id",
        "gossip_menu_option.id",
        ALWAYS_ZERO,
        "0 = Player\n1 = WorldObject",
        "Controls individual gossip options.",
    ),
    src(
        16,
        "CONDITION_SOURCE_TYPE_CREATURE_TEMPLATE_VEHICLE",
        ALWAYS_ZERO,
        "creature_template.entry",
        ALWAYS_ZERO,
        "0 = Player riding vehicle\n1 = Vehicle creature",
        "Used for vehicle logic.",
    ),
    src(
        17,
        "CONDITION_SOURCE_TYPE_SPELL",
        ALWAYS_ZERO,
        "Spell ID",
        ALWAYS_ZERO,
        "0 = Spell caster\n1 = Explicit target",
        "Only explicit targets are affected.\nAoE/implicit targets require SPELL_IMPLICIT_TARGET.\nElseGroup performs logical AND.",
    ),
    src(
        18,
        "CONDITION_SOURCE_TYPE_SPELL_CLICK_EVENT",
        "npc_spellclick_spells.npc_entry",
        "npc_spellclick_spells.spell_id",
        ALWAYS_ZERO,
        "0 = Clicker\n1 = Spellclick target",
        "Used for spell-click NPCs.",
    ),
    src(
        19,
        "CONDITION_SOURCE_TYPE_QUEST_AVAILABLE",
        ALWAYS_ZERO,
        "quest_template.ID",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
        "Controls quest availability.",
    ),
    src(
        21,
        "CONDITION_SOURCE_TYPE_VEHICLE_SPELL",
        "creature_template_spell.CreatureID",
        "creature_template_spell.Spell",
        ALWAYS_ZERO,
        "0 = Player\n1 = Vehicle creature",
        "Controls vehicle spell bar visibility.",
    ),
    src(
        22,
        "CONDITION_SOURCE_TYPE_SMART_EVENT",
        "smart_scripts.id + 1",
        "smart_scripts.entryorguid",
        "smart_scripts.source_type",
        "0 = Invoker\n1 = Object",
        "Used for SmartAI conditions.",
    ),
    src(
        23,
        "CONDITION_SOURCE_TYPE_NPC_VENDOR",
        "npc_vendor.entry",
        "npc_vendor.item",
        ALWAYS_ZERO,
        "0 = Player\n1 = WorldObject",
        "Controls vendor item visibility.",
    ),
    src(
        24,
        "CONDITION_SOURCE_TYPE_SPELL_PROC",
        ALWAYS_ZERO,
        "Spell ID of aura that triggers the proc",
        ALWAYS_ZERO,
        "0 = Actor\n1 = ActionTarget",
        "Used for proc conditions.",
    ),
    src(
        25,
        "CONDITION_SOURCE_TYPE_TERRAIN_SWAP",
        ALWAYS_ZERO,
        "terrain_swap_defaults.TerrainSwapMap",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
        "Used for terrain swaps.",
    ),
    src(
        26,
        "CONDITION_SOURCE_TYPE_PHASE",
        "phase_area.PhaseId",
        "phase_area.AreaId (0 = any)",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
        "Controls phase visibility.",
    ),
    src(
        27,
        "CONDITION_SOURCE_TYPE_GRAVEYARD",
        "graveyard_zone.GhostZone",
        "graveyard_zone.ID",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
        "Controls graveyard usage.",
    ),
    src(
        28,
        "CONDITION_SOURCE_TYPE_AREATRIGGER",
        "areatrigger_template.Id",
        "areatrigger_template.IsCustom",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
        "Used for area triggers.",
    ),
    src(
        29,
        "CONDITION_SOURCE_TYPE_CONVERSATION_LINE",
        ALWAYS_ZERO,
        "conversation_line_template.Id",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
        "Used for conversation logic.",
    ),
    src(
        30,
        "CONDITION_SOURCE_TYPE_AREATRIGGER_CLIENT_TRIGGERED",
        ALWAYS_ZERO,
        "AreatriggerID",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
        "Client-triggered areatriggers.",
    ),
    src(
        31,
        "CONDITION_SOURCE_TYPE_TRAINER_SPELL",
        "trainer_spell.TrainerId",
        "trainer_spell.SpellId",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
        "Controls trainer spells.",
    ),
    src(
        32,
        "CONDITION_SOURCE_TYPE_OBJECT_ID_VISIBILITY",
        "ObjectType:\n5 = Unit\n8 = GameObject",
        "CreatureID / GameObjectID",
        ALWAYS_ZERO,
        "0 = Player\n1 = WorldObject",
        "Controls object visibility.",
    ),
    src(
        33,
        "CONDITION_SOURCE_TYPE_SPAWN_GROUP",
        ALWAYS_ZERO,
        "spawn_group_template.groupId",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
        "Used for spawn groups.",
    ),
    src(
        34,
        "CONDITION_SOURCE_TYPE_PLAYER_CONDITION",
        ALWAYS_ZERO,
        "PlayerConditionID",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
        "Links to PlayerCondition table.",
    ),
    src(
        35,
        "CONDITION_SOURCE_TYPE_SKILL_LINE_ABILITY",
        ALWAYS_ZERO,
        "ID from SkillLineAbility.db2",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
        "Used for skill abilities.",
    ),
    src(
        36,
        "CONDITION_SOURCE_TYPE_PLAYER_CHOICE_RESPONSE",
        "playerchoice_response.ChoiceId",
        "playerchoice_response.ResponseId",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
        "Used for player choice responses.",
    ),
];

const fn cond(
    id: i32,
    name: &'static str,
    value1: &'static str,
    value2: &'static str,
    value3: &'static str,
) -> ConditionTypeInfo {
    ConditionTypeInfo {
        id,
        name,
        value1,
        value2,
        value3,
        usage: "",
        value2_default: 0,
    }
}

const fn quest_cond(id: i32, name: &'static str) -> ConditionTypeInfo {
    cond(id, name, "Quest ID (quest_template.id)", ALWAYS_ZERO, ALWAYS_ZERO)
}

const fn with_usage(info: ConditionTypeInfo, usage: &'static str) -> ConditionTypeInfo {
    ConditionTypeInfo { usage, ..info }
}

const fn with_value2_default(info: ConditionTypeInfo, value2_default: i64) -> ConditionTypeInfo {
    ConditionTypeInfo {
        value2_default,
        ..info
    }
}

const COMPARISON: &str = "ComparisonType:\n0 equal\n1 higher\n2 lower\n3 equal or higher\n4 equal or lower";
const RANK_MASK: &str = "  1 Hated\n  2 Hostile\n  4 Unfriendly\n  8 Neutral\n 16 Friendly\n 32 Honored\n 64 Revered\n128 Exalted";

pub static CONDITION_TYPES: &[ConditionTypeInfo] = &[
    cond(0, "CONDITION_NONE", NEVER_USED, NEVER_USED, NEVER_USED),
    cond(1, "CONDITION_AURA", "Spell ID from Spell.dbc", "Effect index (0-31)", ALWAYS_ZERO),
    with_value2_default(
        cond(
            2,
            "CONDITION_ITEM",
            "item entry (item_template.entry)",
            "item count",
            "0 = not in bank\n1 = in bank",
        ),
        1,
    ),
    cond(3, "CONDITION_ITEM_EQUIPPED", "item entry (item_template.entry)", ALWAYS_ZERO, ALWAYS_ZERO),
    cond(4, "CONDITION_ZONEID", "Zone ID where this condition will be true.", ALWAYS_ZERO, ALWAYS_ZERO),
    cond(
        5,
        "CONDITION_REPUTATION_RANK",
        "Faction template ID from Faction.dbc",
        "rank:\n  1 = Hated\n  2 = Hostile\n  4 = Unfriendly\n  8 = Neutral\n 16 = Friendly\n 32 = Honored\n 64 = Revered\n128 = Exalted\n\nAdd target ranks together for the condition to be true for all those ranks.",
        ALWAYS_ZERO,
    ),
    cond(6, "CONDITION_TEAM", "TeamID:\nAlliance = 469\nHorde = 67", ALWAYS_ZERO, ALWAYS_ZERO),
    cond(
        7,
        "CONDITION_SKILL",
        "Required skill.\nSee SkillLine.dbc.",
        "Skill rank value (e.g. 1..525)",
        ALWAYS_ZERO,
    ),
    quest_cond(8, "CONDITION_QUESTREWARDED"),
    quest_cond(9, "CONDITION_QUESTTAKEN"),
    cond(
        10,
        "CONDITION_DRUNKENSTATE",
        "Sober = 0\nTipsy = 1\nDrunk = 2\nSmashed = 3",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
    ),
    cond(11, "CONDITION_WORLD_STATE", "World state index", "World state value", ALWAYS_ZERO),
    cond(12, "CONDITION_ACTIVE_EVENT", "Event entry (game_event.eventEntry)", ALWAYS_ZERO, ALWAYS_ZERO),
    cond(
        13,
        "CONDITION_INSTANCE_INFO",
        "entry (see corresponding source script files)",
        "data (see corresponding script source files)",
        "0 = INSTANCE_INFO_DATA\n1 = INSTANCE_INFO_GUID_DATA\n2 = INSTANCE_INFO_BOSS_STATE\n3 = INSTANCE_INFO_DATA64",
    ),
    quest_cond(14, "CONDITION_QUEST_NONE"),
    cond(
        15,
        "CONDITION_CLASS",
        "Class mask from ChrClasses.dbc (sum flags):\n  1 = Warrior\n  2 = Paladin\n  4 = Hunter\n  8 = Rogue\n 16 = Priest\n 32 = Death Knight\n 64 = Shaman\n128 = Mage\n256 = Warlock\n1024 = Druid",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
    ),
    cond(
        16,
        "CONDITION_RACE",
        "Player must be this race.\nSee ChrRaces.dbc.\nAdd flags together for all races where condition is true.",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
    ),
    cond(17, "CONDITION_ACHIEVEMENT", "Achievement ID (Achievement.dbc)", ALWAYS_ZERO, ALWAYS_ZERO),
    cond(18, "CONDITION_TITLE", "Title ID (CharTitles.dbc)", ALWAYS_ZERO, ALWAYS_ZERO),
    cond(20, "CONDITION_GENDER", "0 = Male\n1 = Female\n2 = None", ALWAYS_ZERO, ALWAYS_ZERO),
    cond(21, "CONDITION_UNIT_STATE", "UnitState (enum from Unit.h)", ALWAYS_ZERO, ALWAYS_ZERO),
    cond(
        22,
        "CONDITION_MAPID",
        "Map entry from Map.dbc (0=Eastern Kingdoms, 1=Kalimdor, ...)",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
    ),
    cond(23, "CONDITION_AREAID", "Area ID from AreaTable.dbc", ALWAYS_ZERO, ALWAYS_ZERO),
    cond(
        24,
        "CONDITION_CREATURE_TYPE",
        "Creature type from creature_template.type (true if equals)",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
    ),
    cond(25, "CONDITION_SPELL", "Spell ID from Spell.dbc", ALWAYS_ZERO, ALWAYS_ZERO),
    cond(26, "CONDITION_PHASEID", "PhaseID", ALWAYS_ZERO, ALWAYS_ZERO),
    cond(
        27,
        "CONDITION_LEVEL",
        "Player level",
        "Optional:\n  0 = Level must be equal\n  1 = Level must be higher\n  2 = Level must be lower\n  3 = Level must be higher or equal\n  4 = Level must be lower or equal.",
        ALWAYS_ZERO,
    ),
    quest_cond(28, "CONDITION_QUEST_COMPLETE"),
    with_value2_default(
        cond(
            29,
            "CONDITION_NEAR_CREATURE",
            "Creature entry (creature_template.entry)",
            "Distance in yards",
            "Alive=0\nDead=1",
        ),
        5,
    ),
    with_value2_default(
        cond(
            30,
            "CONDITION_NEAR_GAMEOBJECT",
            "Gameobject entry (gameobject_template.entry)",
            "Distance in yards",
            ALWAYS_ZERO,
        ),
        5,
    ),
    cond(
        33,
        "CONDITION_RELATION_TO",
        "Target to which relation is checked (one of ConditionTargets available in current SourceType)",
        "RelationType:\n0 RELATION_SELF\n1 RELATION_IN_PARTY\n2 RELATION_IN_RAID_OR_PARTY\n3 RELATION_OWNED_BY\n4 RELATION_PASSENGER_OF\n5 RELATION_CREATED_BY",
        ALWAYS_ZERO,
    ),
    cond(
        34,
        "CONDITION_REACTION_TO",
        "Target to which reaction is checked (one of ConditionTargets available in current SourceType)",
        RANK_MASK,
        ALWAYS_ZERO,
    ),
    cond(
        35,
        "CONDITION_DISTANCE_TO",
        "Target to which distance is checked (one of ConditionTargets available in current SourceType)",
        "Distance (yards) between current ConditionTarget and target specified in Value1",
        COMPARISON,
    ),
    cond(
        36,
        "CONDITION_ALIVE",
        "Always 0.\nUse NegativeCondition:\n  NegativeCondition=0 => target must be ALIVE\n  NegativeCondition=1 => target must be DEAD.",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
    ),
    cond(37, "CONDITION_HP_VAL", "HP value", COMPARISON, ALWAYS_ZERO),
    cond(38, "CONDITION_HP_PCT", "Percentage of max HP", COMPARISON, ALWAYS_ZERO),
    cond(39, "CONDITION_REALM_ACHIEVEMENT", "Achievement ID (Achievement.dbc)", ALWAYS_ZERO, ALWAYS_ZERO),
    cond(
        40,
        "CONDITION_IN_WATER",
        "Always 0.\nUse NegativeCondition:\n  NegativeCondition=0 => target must be on land\n  NegativeCondition=1 => target must be in water",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
    ),
    cond(
        41,
        "CONDITION_TERRAIN_SWAP",
        "terrainSwap - true if object is in terrainswap",
        ALWAYS_ZERO,
        ALWAYS_ZERO,
    ),
    cond(
        42,
        "CONDITION_STAND_STATE",
        "stateType: 0=Exact state in Value2, 1=Any type of state in Value2",
        "Exact stand state or generic state; 0=Standing, 1=Sitting",
        ALWAYS_ZERO,
    ),
    quest_cond(43, "CONDITION_DAILY_QUEST_DONE"),
    cond(44, "CONDITION_CHARMED", ALWAYS_ZERO, ALWAYS_ZERO, ALWAYS_ZERO),
    cond(45, "CONDITION_PET_TYPE", "mask", ALWAYS_ZERO, ALWAYS_ZERO),
    cond(46, "CONDITION_TAXI", ALWAYS_ZERO, ALWAYS_ZERO, ALWAYS_ZERO),
    cond(
        47,
        "CONDITION_QUESTSTATE",
        "Quest ID (quest_template.id)",
        "state_mask:\n1 not taken\n2 completed\n8 in progress\n32 failed\n64 rewarded",
        ALWAYS_ZERO,
    ),
    cond(48, "CONDITION_QUEST_OBJECTIVE_PROGRESS", "Quest Objective ID", ALWAYS_ZERO, "Progress Value"),
    with_usage(
        cond(49, "CONDITION_DIFFICULTY_ID", "Difficulty (0 None, 1 Normal, etc)", ALWAYS_ZERO, ALWAYS_ZERO),
        "true if target's map has difficulty id",
    ),
    with_usage(
        cond(50, "CONDITION_GAMEMASTER", "canBeGM", ALWAYS_ZERO, ALWAYS_ZERO),
        "true if player is gamemaster (or can be gamemaster)",
    ),
    with_usage(
        cond(51, "CONDITION_OBJECT_ENTRY_GUID", "TypeID", "entry", "guid"),
        "true if object is type TypeID and:\n\u{2022} entry is 0 or matches object's entry\n\u{2022} OR guid matches object's guid",
    ),
    with_usage(
        cond(52, "CONDITION_TYPE_MASK", "TypeMask", ALWAYS_ZERO, ALWAYS_ZERO),
        "true if object's TypeMask matches provided TypeMask",
    ),
    with_usage(
        cond(53, "CONDITION_BATTLE_PET_COUNT", "SpeciesId", "count", "ComparisonType"),
        "true if player has count of battle pet species",
    ),
    with_usage(
        cond(54, "CONDITION_SCENARIO_STEP", "ScenarioStepId", ALWAYS_ZERO, ALWAYS_ZERO),
        "true if object is at scenario with current step equal to ScenarioStepID",
    ),
    with_usage(
        cond(55, "CONDITION_SCENE_IN_PROGRESS", "SceneScriptPackageId", ALWAYS_ZERO, ALWAYS_ZERO),
        "true if player is playing a scene with ScriptPackageId equal to given value",
    ),
    with_usage(
        cond(56, "CONDITION_PLAYER_CONDITION", "PlayerConditionId", ALWAYS_ZERO, ALWAYS_ZERO),
        "true if player satisfies PlayerCondition",
    ),
    with_usage(
        cond(57, "CONDITION_PRIVATE_OBJECT", ALWAYS_ZERO, ALWAYS_ZERO, ALWAYS_ZERO),
        "true if entity is private object",
    ),
    with_usage(
        cond(58, "CONDITION_STRING_ID", ALWAYS_ZERO, ALWAYS_ZERO, ALWAYS_ZERO),
        "true if entity uses string id (ConditionStringValue1)",
    ),
    with_usage(
        cond(59, "CONDITION_LABEL", "Label", ALWAYS_ZERO, ALWAYS_ZERO),
        "true if creature/gameobject has specified Label in CreatureLabel.db2/GameObjectLabel.db2",
    ),
];

pub fn source_type_info(id: i32) -> Option<&'static SourceTypeInfo> {
    SOURCE_TYPES.iter().find(|info| info.id == id)
}

pub fn condition_type_info(id: i32) -> Option<&'static ConditionTypeInfo> {
    CONDITION_TYPES.iter().find(|info| info.id == id)
}

/// Condition types that make sense under `source_type`.
///
/// A reference (negative) source can be reused anywhere, so every type is allowed.
/// Sources with a single target cannot host target-to-target comparisons.
pub fn valid_condition_types(source_type: i32) -> Vec<&'static ConditionTypeInfo> {
    let single_target = source_type >= 0
        && source_type_info(source_type).is_some_and(SourceTypeInfo::has_single_target);
    CONDITION_TYPES
        .iter()
        .filter(|info| !(single_target && info.needs_second_target()))
        .collect()
}

/// Per-column meaning for one (source type, condition type) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLabels {
    pub source_group: String,
    pub source_entry: String,
    pub source_id: String,
    pub condition_target: String,
    pub value1: String,
    pub value2: String,
    pub value3: String,
}

pub fn field_labels(source_type: i32, condition_type: i32) -> FieldLabels {
    const SOURCE_REFERENCE: &str =
        "Reference-based SourceType (negative). Meaning depends on reference usage.";
    const CONDITION_REFERENCE: &str =
        "Reference-based ConditionType (negative). Meaning depends on referenced rule.";

    let (source_group, source_entry, source_id, condition_target) = if source_type < 0 {
        (SOURCE_REFERENCE, SOURCE_REFERENCE, SOURCE_REFERENCE, SOURCE_REFERENCE)
    } else {
        match source_type_info(source_type) {
            Some(info) => (
                info.source_group,
                info.source_entry,
                info.source_id,
                info.condition_target,
            ),
            None => ("", "", "", ""),
        }
    };

    let (value1, value2, value3) = if condition_type < 0 {
        (CONDITION_REFERENCE, CONDITION_REFERENCE, CONDITION_REFERENCE)
    } else {
        match condition_type_info(condition_type) {
            Some(info) => (info.value1, info.value2, info.value3),
            None => ("", "", ""),
        }
    };

    FieldLabels {
        source_group: source_group.to_string(),
        source_entry: source_entry.to_string(),
        source_id: source_id.to_string(),
        condition_target: condition_target.to_string(),
        value1: value1.to_string(),
        value2: value2.to_string(),
        value3: value3.to_string(),
    }
}

pub fn source_type_tooltip(source_type: i32) -> String {
    if source_type < 0 {
        return "SourceTypeOrReferenceId is NEGATIVE:\n\
            \u{2022} This is a reference id.\n\
            \u{2022} It is referenced directly in ConditionTypeOrReference of another condition.\n\
            \u{2022} SourceGroup/SourceEntry meaning is defined by the referenced rule."
            .to_string();
    }
    let Some(info) = source_type_info(source_type) else {
        return format!("{}\n\n(Unknown SourceTypeOrReferenceId: {})", SOURCE_TYPE_HEADER, source_type);
    };

    let mut tip = format!(
        "{}\n\nWhat goes where:\n\u{2022} SourceGroup = {}\n\u{2022} SourceEntry = {}\n\u{2022} SourceId = {}\n\u{2022} ConditionTarget = {}\n",
        info.name, info.source_group, info.source_entry, info.source_id, info.condition_target
    );
    if !info.notes.is_empty() {
        tip.push_str(&format!("\nNotes:\n{}\n", info.notes));
    }
    tip
}

pub fn condition_type_tooltip(condition_type: i32) -> String {
    if condition_type < 0 {
        return "ConditionTypeOrReference is NEGATIVE:\n\
            \u{2022} This is a reference to another condition.\n\
            \u{2022} ConditionValue1/2/3 meaning depends on the referenced rule."
            .to_string();
    }
    let Some(info) = condition_type_info(condition_type) else {
        return format!(
            "{}\n\n(Unknown ConditionTypeOrReference: {})",
            CONDITION_TYPE_HEADER, condition_type
        );
    };

    let mut tip = format!(
        "{}\n\nCV1: {}\nCV2: {}\nCV3: {}\n",
        info.name, info.value1, info.value2, info.value3
    );
    if !info.usage.is_empty() {
        tip.push_str(&format!("\nUsage: {}\n", info.usage));
    }
    tip
}
