//! `quest_template` column metadata, grouped the way the editor shows it.

use crate::error::{QuestforgeError, Result};
use crate::gateway::Value;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    Int,
    Float,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestField {
    pub column: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTab {
    pub name: &'static str,
    pub fields: &'static [QuestField],
}

const fn field(column: &'static str, label: &'static str, kind: FieldKind) -> QuestField {
    QuestField { column, label, kind }
}

use FieldKind::{Float, Int, Text};

pub static QUEST_TABS: &[FieldTab] = &[
    FieldTab {
        name: "Core",
        fields: &[
            field("entry", "Quest ID", Int),
            field("Method", "Method", Int),
            field("ZoneOrSort", "Zone/Sort", Int),
            field("SkillOrClassMask", "Skill/Class Mask", Int),
            field("MinLevel", "Min Level", Int),
            field("MaxLevel", "Max Level", Int),
            field("QuestLevel", "Quest Level", Int),
            field("Type", "Type", Int),
            field("SuggestedPlayers", "Suggested Players", Int),
            field("LimitTime", "Time Limit (sec)", Int),
            field("QuestFlags", "Quest Flags", Int),
            field("SpecialFlags", "Special Flags", Int),
            field("RequiredRaces", "Required Races (mask)", Int),
            field("RequiredSkillValue", "Required Skill Value", Int),
            field("CharTitleId", "Char Title ID", Int),
            field("PlayersSlain", "Players Slain", Int),
            field("BonusTalents", "Bonus Talents", Int),
            field("RewardArenaPoints", "Reward Arena Points", Int),
        ],
    },
    FieldTab {
        name: "Chain",
        fields: &[
            field("PrevQuestId", "Prev Quest ID", Int),
            field("NextQuestId", "Next Quest ID", Int),
            field("ExclusiveGroup", "Exclusive Group", Int),
            field("NextQuestInChain", "Next Quest In Chain", Int),
        ],
    },
    FieldTab {
        name: "Reputation Requirements",
        fields: &[
            field("RepObjectiveFaction", "Rep Objective Faction 1", Int),
            field("RepObjectiveValue", "Rep Objective Value 1", Int),
            field("RepObjectiveFaction2", "Rep Objective Faction 2", Int),
            field("RepObjectiveValue2", "Rep Objective Value 2", Int),
            field("RequiredMinRepFaction", "Required Min Rep Faction", Int),
            field("RequiredMinRepValue", "Required Min Rep Value", Int),
            field("RequiredMaxRepFaction", "Required Max Rep Faction", Int),
            field("RequiredMaxRepValue", "Required Max Rep Value", Int),
        ],
    },
    FieldTab {
        name: "Source",
        fields: &[
            field("RewXPId", "Reward XP ID", Int),
            field("SrcItemId", "Source Item ID", Int),
            field("SrcItemCount", "Source Item Count", Int),
            field("SrcSpell", "Source Spell", Int),
        ],
    },
    FieldTab {
        name: "Text",
        fields: &[
            field("Title", "Title", Text),
            field("Details", "Details", Text),
            field("Objectives", "Objectives", Text),
            field("OfferRewardText", "Offer Reward Text", Text),
            field("RequestItemsText", "Request Items Text", Text),
            field("EndText", "End Text", Text),
            field("CompletedText", "Completed Text", Text),
        ],
    },
    FieldTab {
        name: "Objective Text",
        fields: &[
            field("ObjectiveText1", "Objective Text 1", Text),
            field("ObjectiveText2", "Objective Text 2", Text),
            field("ObjectiveText3", "Objective Text 3", Text),
            field("ObjectiveText4", "Objective Text 4", Text),
        ],
    },
    FieldTab {
        name: "Requirements - Items",
        fields: &[
            field("ReqItemId1", "Req Item ID 1", Int),
            field("ReqItemCount1", "Req Item Count 1", Int),
            field("ReqItemId2", "Req Item ID 2", Int),
            field("ReqItemCount2", "Req Item Count 2", Int),
            field("ReqItemId3", "Req Item ID 3", Int),
            field("ReqItemCount3", "Req Item Count 3", Int),
            field("ReqItemId4", "Req Item ID 4", Int),
            field("ReqItemCount4", "Req Item Count 4", Int),
            field("ReqItemId5", "Req Item ID 5", Int),
            field("ReqItemCount5", "Req Item Count 5", Int),
            field("ReqItemId6", "Req Item ID 6", Int),
            field("ReqItemCount6", "Req Item Count 6", Int),
        ],
    },
    FieldTab {
        name: "Requirements - Sources",
        fields: &[
            field("ReqSourceId1", "Req Source ID 1", Int),
            field("ReqSourceCount1", "Req Source Count 1", Int),
            field("ReqSourceId2", "Req Source ID 2", Int),
            field("ReqSourceCount2", "Req Source Count 2", Int),
            field("ReqSourceId3", "Req Source ID 3", Int),
            field("ReqSourceCount3", "Req Source Count 3", Int),
            field("ReqSourceId4", "Req Source ID 4", Int),
            field("ReqSourceCount4", "Req Source Count 4", Int),
        ],
    },
    FieldTab {
        name: "Requirements - NPC/GO",
        fields: &[
            field("ReqCreatureOrGOId1", "Req NPC/GO ID 1", Int),
            field("ReqCreatureOrGOCount1", "Req NPC/GO Count 1", Int),
            field("ReqCreatureOrGOId2", "Req NPC/GO ID 2", Int),
            field("ReqCreatureOrGOCount2", "Req NPC/GO Count 2", Int),
            field("ReqCreatureOrGOId3", "Req NPC/GO ID 3", Int),
            field("ReqCreatureOrGOCount3", "Req NPC/GO Count 3", Int),
            field("ReqCreatureOrGOId4", "Req NPC/GO ID 4", Int),
            field("ReqCreatureOrGOCount4", "Req NPC/GO Count 4", Int),
        ],
    },
    FieldTab {
        name: "Requirements - Spell Cast",
        fields: &[
            field("ReqSpellCast1", "Req Spell Cast 1", Int),
            field("ReqSpellCast2", "Req Spell Cast 2", Int),
            field("ReqSpellCast3", "Req Spell Cast 3", Int),
            field("ReqSpellCast4", "Req Spell Cast 4", Int),
        ],
    },
    FieldTab {
        name: "Rewards - Choice Items",
        fields: &[
            field("RewChoiceItemId1", "Choice Item ID 1", Int),
            field("RewChoiceItemCount1", "Choice Item Count 1", Int),
            field("RewChoiceItemId2", "Choice Item ID 2", Int),
            field("RewChoiceItemCount2", "Choice Item Count 2", Int),
            field("RewChoiceItemId3", "Choice Item ID 3", Int),
            field("RewChoiceItemCount3", "Choice Item Count 3", Int),
            field("RewChoiceItemId4", "Choice Item ID 4", Int),
            field("RewChoiceItemCount4", "Choice Item Count 4", Int),
            field("RewChoiceItemId5", "Choice Item ID 5", Int),
            field("RewChoiceItemCount5", "Choice Item Count 5", Int),
            field("RewChoiceItemId6", "Choice Item ID 6", Int),
            field("RewChoiceItemCount6", "Choice Item Count 6", Int),
        ],
    },
    FieldTab {
        name: "Rewards - Guaranteed Items",
        fields: &[
            field("RewItemId1", "Reward Item ID 1", Int),
            field("RewItemCount1", "Reward Item Count 1", Int),
            field("RewItemId2", "Reward Item ID 2", Int),
            field("RewItemCount2", "Reward Item Count 2", Int),
            field("RewItemId3", "Reward Item ID 3", Int),
            field("RewItemCount3", "Reward Item Count 3", Int),
            field("RewItemId4", "Reward Item ID 4", Int),
            field("RewItemCount4", "Reward Item Count 4", Int),
        ],
    },
    FieldTab {
        name: "Rewards - Money/Spells/Mail",
        fields: &[
            field("RewOrReqMoney", "Reward/Req Money", Int),
            field("RewMoneyMaxLevel", "Money at Max Level", Int),
            field("RewSpell", "Reward Spell", Int),
            field("RewSpellCast", "Reward Spell Cast", Int),
            field("RewMailTemplateId", "Mail Template ID", Int),
            field("RewMailDelaySecs", "Mail Delay (sec)", Int),
        ],
    },
    FieldTab {
        name: "Rewards - Skills/Honor",
        fields: &[
            field("RewHonorAddition", "Honor Addition", Int),
            field("RewHonorMultiplier", "Honor Multiplier", Float),
            field("RewSkillLineId", "Reward Skill Line ID", Int),
            field("RewSkillPoints", "Reward Skill Points", Int),
        ],
    },
    FieldTab {
        name: "Rewards - Reputation",
        fields: &[
            field("RewRepFaction1", "Rep Faction 1", Int),
            field("RewRepValueId1", "Rep Value ID 1", Int),
            field("RewRepValue1", "Rep Value 1", Int),
            field("RewRepFaction2", "Rep Faction 2", Int),
            field("RewRepValueId2", "Rep Value ID 2", Int),
            field("RewRepValue2", "Rep Value 2", Int),
            field("RewRepFaction3", "Rep Faction 3", Int),
            field("RewRepValueId3", "Rep Value ID 3", Int),
            field("RewRepValue3", "Rep Value 3", Int),
            field("RewRepFaction4", "Rep Faction 4", Int),
            field("RewRepValueId4", "Rep Value ID 4", Int),
            field("RewRepValue4", "Rep Value 4", Int),
            field("RewRepFaction5", "Rep Faction 5", Int),
            field("RewRepValueId5", "Rep Value ID 5", Int),
            field("RewRepValue5", "Rep Value 5", Int),
            field("RewRepMask", "Rep Mask", Int),
        ],
    },
    FieldTab {
        name: "Rewards - Currency",
        fields: &[
            field("RewCurrencyId1", "Reward Currency ID 1", Int),
            field("RewCurrencyCount1", "Reward Currency Count 1", Int),
            field("RewCurrencyId2", "Reward Currency ID 2", Int),
            field("RewCurrencyCount2", "Reward Currency Count 2", Int),
            field("RewCurrencyId3", "Reward Currency ID 3", Int),
            field("RewCurrencyCount3", "Reward Currency Count 3", Int),
            field("RewCurrencyId4", "Reward Currency ID 4", Int),
            field("RewCurrencyCount4", "Reward Currency Count 4", Int),
        ],
    },
    FieldTab {
        name: "Requirements - Currency",
        fields: &[
            field("ReqCurrencyId1", "Req Currency ID 1", Int),
            field("ReqCurrencyCount1", "Req Currency Count 1", Int),
            field("ReqCurrencyId2", "Req Currency ID 2", Int),
            field("ReqCurrencyCount2", "Req Currency Count 2", Int),
            field("ReqCurrencyId3", "Req Currency ID 3", Int),
            field("ReqCurrencyCount3", "Req Currency Count 3", Int),
            field("ReqCurrencyId4", "Req Currency ID 4", Int),
            field("ReqCurrencyCount4", "Req Currency Count 4", Int),
        ],
    },
    FieldTab {
        name: "Portraits",
        fields: &[
            field("QuestGiverPortrait", "Quest Giver Portrait", Int),
            field("QuestTurnInPortrait", "Quest Turn-In Portrait", Int),
            field("QuestGiverPortraitText", "Giver Portrait Text", Text),
            field("QuestGiverPortraitUnk", "Giver Portrait Unk", Text),
            field("QuestTurnInPortraitText", "Turn-In Portrait Text", Text),
            field("QuestTurnInPortraitUnk", "Turn-In Portrait Unk", Text),
            field("QuestTargetMark", "Quest Target Mark", Int),
            field("QuestStartType", "Quest Start Type", Int),
        ],
    },
    FieldTab {
        name: "Emotes",
        fields: &[
            field("DetailsEmote1", "Details Emote 1", Int),
            field("DetailsEmoteDelay1", "Details Emote Delay 1", Int),
            field("DetailsEmote2", "Details Emote 2", Int),
            field("DetailsEmoteDelay2", "Details Emote Delay 2", Int),
            field("DetailsEmote3", "Details Emote 3", Int),
            field("DetailsEmoteDelay3", "Details Emote Delay 3", Int),
            field("DetailsEmote4", "Details Emote 4", Int),
            field("DetailsEmoteDelay4", "Details Emote Delay 4", Int),
            field("IncompleteEmote", "Incomplete Emote", Int),
            field("CompleteEmote", "Complete Emote", Int),
            field("OfferRewardEmote1", "Offer Reward Emote 1", Int),
            field("OfferRewardEmoteDelay1", "Offer Reward Delay 1", Int),
            field("OfferRewardEmote2", "Offer Reward Emote 2", Int),
            field("OfferRewardEmoteDelay2", "Offer Reward Delay 2", Int),
            field("OfferRewardEmote3", "Offer Reward Emote 3", Int),
            field("OfferRewardEmoteDelay3", "Offer Reward Delay 3", Int),
            field("OfferRewardEmote4", "Offer Reward Emote 4", Int),
            field("OfferRewardEmoteDelay4", "Offer Reward Delay 4", Int),
        ],
    },
    FieldTab {
        name: "Point",
        fields: &[
            field("PointMapId", "Point Map ID", Int),
            field("PointX", "Point X", Float),
            field("PointY", "Point Y", Float),
            field("PointOpt", "Point Opt", Int),
        ],
    },
    FieldTab {
        name: "Sounds/Scripts",
        fields: &[
            field("SoundAccept", "Sound Accept", Int),
            field("SoundTurnIn", "Sound Turn-In", Int),
            field("RequiredSpell", "Required Spell", Int),
            field("StartScript", "Start Script", Int),
            field("CompleteScript", "Complete Script", Int),
        ],
    },
    FieldTab {
        name: "Misc",
        fields: &[
            field("RewRepMask", "Reward Rep Mask", Int),
            field("unk0", "unk0", Int),
            field("WDBVerified", "WDB Verified", Int),
        ],
    },
];

/// Every column once, in tab order. `RewRepMask` is listed on two tabs.
pub fn quest_columns() -> impl Iterator<Item = &'static QuestField> {
    let mut seen = HashSet::new();
    QUEST_TABS
        .iter()
        .flat_map(|tab| tab.fields.iter())
        .filter(move |f| seen.insert(f.column))
}

pub fn quest_field(column: &str) -> Option<&'static QuestField> {
    QUEST_TABS
        .iter()
        .flat_map(|tab| tab.fields.iter())
        .find(|f| f.column.eq_ignore_ascii_case(column))
}

impl QuestField {
    /// Parse user input for this column. Empty numeric input means 0.
    pub fn parse(&self, raw: &str) -> Result<Value> {
        match self.kind {
            FieldKind::Text => Ok(Value::Text(raw.to_string())),
            FieldKind::Int => {
                let raw = raw.trim();
                if raw.is_empty() {
                    return Ok(Value::Int(0));
                }
                raw.parse::<i64>().map(Value::Int).map_err(|_| {
                    QuestforgeError::validation(self.column, format!("'{}' is not an integer", raw))
                })
            }
            FieldKind::Float => {
                let raw = raw.trim();
                if raw.is_empty() {
                    return Ok(Value::Float(0.0));
                }
                raw.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(Value::Float)
                    .ok_or_else(|| {
                        QuestforgeError::validation(self.column, format!("'{}' is not a number", raw))
                    })
            }
        }
    }

    /// Coerce a fetched cell to this column's kind. NULL text stays NULL.
    pub fn normalize(&self, value: &Value) -> Value {
        match (self.kind, value) {
            (_, Value::Null) if self.kind == FieldKind::Text => Value::Null,
            (FieldKind::Int, v) => Value::Int(v.as_i64().unwrap_or(0)),
            (FieldKind::Float, v) => Value::Float(v.as_f64().unwrap_or(0.0)),
            (FieldKind::Text, v) => Value::Text(v.to_string()),
        }
    }
}

/// `ZoneOrSort`: positive is an AreaTable id, negative a QuestSort id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZoneOrSort {
    None,
    Zone(u32),
    Sort(u32),
}

impl ZoneOrSort {
    pub fn decode(raw: i64) -> Self {
        match raw {
            0 => ZoneOrSort::None,
            r if r > 0 => ZoneOrSort::Zone(r as u32),
            r => ZoneOrSort::Sort(r.unsigned_abs() as u32),
        }
    }

    pub fn encode(self) -> i64 {
        match self {
            ZoneOrSort::None => 0,
            ZoneOrSort::Zone(id) => i64::from(id),
            ZoneOrSort::Sort(id) => -i64::from(id),
        }
    }
}

/// `SkillOrClassMask`: positive is a SkillLine id, negative a class mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkillOrClass {
    None,
    Skill(u32),
    ClassMask(u32),
}

pub const CLASSES: &[(u32, &str)] = &[
    (1, "Warrior"),
    (2, "Paladin"),
    (3, "Hunter"),
    (4, "Rogue"),
    (5, "Priest"),
    (6, "Death Knight"),
    (7, "Shaman"),
    (8, "Mage"),
    (9, "Warlock"),
    (11, "Druid"),
];

impl SkillOrClass {
    pub fn decode(raw: i64) -> Self {
        match raw {
            0 => SkillOrClass::None,
            r if r > 0 => SkillOrClass::Skill(r as u32),
            r => SkillOrClass::ClassMask(r.unsigned_abs() as u32),
        }
    }

    pub fn encode(self) -> i64 {
        match self {
            SkillOrClass::None => 0,
            SkillOrClass::Skill(id) => i64::from(id),
            SkillOrClass::ClassMask(mask) => -i64::from(mask),
        }
    }

    /// Class names in a class mask, bit `1 << (class id - 1)`.
    pub fn class_names(mask: u32) -> Vec<&'static str> {
        CLASSES
            .iter()
            .filter(|(id, _)| mask & (1 << (id - 1)) != 0)
            .map(|(_, name)| *name)
            .collect()
    }
}

pub const QUEST_FLAGS: &[(u32, &str)] = &[
    (0x0000_0001, "Stay Alive"),
    (0x0000_0002, "Party Accept"),
    (0x0000_0004, "Exploration"),
    (0x0000_0008, "Sharable"),
    (0x0000_0010, "Has Condition"),
    (0x0000_0020, "Hide Reward POI"),
    (0x0000_0040, "Raid"),
    (0x0000_0080, "TBC"),
    (0x0000_0100, "No Money at Max Level"),
    (0x0000_0200, "Hidden Rewards"),
    (0x0000_0400, "Tracking"),
    (0x0000_0800, "Deprecated Reputation"),
    (0x0000_1000, "Daily"),
    (0x0000_2000, "PvP"),
    (0x0000_4000, "Unavailable"),
    (0x0000_8000, "Weekly"),
    (0x0001_0000, "Auto Complete"),
    (0x0002_0000, "Display Item in Tracker"),
    (0x0004_0000, "Objective Text"),
    (0x0008_0000, "Auto Accept"),
];

/// `RequiredRaces` bits. Goblin and Worgen sit outside the classic range.
pub const RACES: &[(u32, &str)] = &[
    (1, "Human"),
    (2, "Orc"),
    (4, "Dwarf"),
    (8, "Night Elf"),
    (16, "Undead"),
    (32, "Tauren"),
    (64, "Gnome"),
    (128, "Troll"),
    (256, "Goblin"),
    (512, "Blood Elf"),
    (1024, "Draenei"),
    (2_097_152, "Worgen"),
];

/// Names of the bits set in `mask`, in table order. Unknown bits come last as hex.
pub fn mask_names(options: &[(u32, &'static str)], mask: u32) -> Vec<String> {
    let known = options.iter().fold(0u32, |acc, (bit, _)| acc | bit);
    let mut names: Vec<String> = options
        .iter()
        .filter(|(bit, _)| mask & bit != 0)
        .map(|(_, name)| name.to_string())
        .collect();
    if mask & !known != 0 {
        names.push(format!("0x{:X}", mask & !known));
    }
    names
}

pub fn quest_flag_names(mask: u32) -> Vec<String> {
    mask_names(QUEST_FLAGS, mask)
}

/// A zero mask means every race may take the quest.
pub fn race_names(mask: u32) -> Vec<String> {
    mask_names(RACES, mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_are_unique() {
        let columns: Vec<_> = quest_columns().map(|f| f.column).collect();
        let unique: HashSet<_> = columns.iter().collect();
        assert_eq!(columns.len(), unique.len());
        assert_eq!(columns[0], "entry");
        assert_eq!(columns.iter().filter(|c| **c == "RewRepMask").count(), 1);
    }

    #[test]
    fn test_field_kinds() {
        assert_eq!(quest_field("RewHonorMultiplier").unwrap().kind, FieldKind::Float);
        assert_eq!(quest_field("pointx").unwrap().kind, FieldKind::Float);
        assert_eq!(quest_field("Title").unwrap().kind, FieldKind::Text);
        assert_eq!(quest_field("ReqItemId6").unwrap().kind, FieldKind::Int);
        assert!(quest_field("NoSuchColumn").is_none());
    }

    #[test]
    fn test_parse_by_kind() {
        let level = quest_field("MinLevel").unwrap();
        assert_eq!(level.parse(" 12 ").unwrap(), Value::Int(12));
        assert_eq!(level.parse("").unwrap(), Value::Int(0));
        assert!(matches!(level.parse("twelve"), Err(QuestforgeError::Validation { .. })));

        let x = quest_field("PointX").unwrap();
        assert_eq!(x.parse("-8913.5").unwrap(), Value::Float(-8913.5));
        assert!(x.parse("NaN").is_err());

        let title = quest_field("Title").unwrap();
        assert_eq!(title.parse(" Kobold Camp ").unwrap(), Value::Text(" Kobold Camp ".into()));
    }

    #[test]
    fn test_signed_encodings() {
        assert_eq!(ZoneOrSort::decode(12), ZoneOrSort::Zone(12));
        assert_eq!(ZoneOrSort::decode(-284), ZoneOrSort::Sort(284));
        assert_eq!(ZoneOrSort::Sort(284).encode(), -284);
        assert_eq!(SkillOrClass::decode(-1024), SkillOrClass::ClassMask(1024));
        assert_eq!(SkillOrClass::decode(185), SkillOrClass::Skill(185));
        assert_eq!(SkillOrClass::class_names(1024 | 1), vec!["Warrior", "Druid"]);
    }

    #[test]
    fn test_race_mask_names() {
        assert_eq!(race_names(256 | 2_097_152), vec!["Goblin", "Worgen"]);
        assert_eq!(race_names(1 | 4 | 64 | 1024), vec!["Human", "Dwarf", "Gnome", "Draenei"]);
        assert!(race_names(0).is_empty());
        assert_eq!(race_names(2048), vec!["0x800"]);
    }

    #[test]
    fn test_quest_flag_names() {
        assert_eq!(quest_flag_names(0x8 | 0x1000), vec!["Sharable", "Daily"]);
        assert_eq!(quest_flag_names(0x0008_0000), vec!["Auto Accept"]);
        assert_eq!(quest_flag_names(0x0010_0008), vec!["Sharable", "0x100000"]);
    }
}
