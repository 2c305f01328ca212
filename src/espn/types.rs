use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::extract::{FightHistoryEntry, StatsSections};

/// One past event row from a yearly schedule page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub id: String,
    pub url: String,
    pub name: String,
    /// ISO `YYYY-MM-DD`, or the cleaned raw cell when it didn't parse.
    pub date: String,
    pub location: String,
    pub league: Option<String>,
    pub year: i32,
    pub fight_of_the_night: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bout {
    pub fighter_ids: Vec<String>,
    pub fighter_names: Vec<String>,
    pub card_segment: String,
    pub bout_order_in_segment: usize,
    pub is_fotn: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardSegment {
    pub name: String,
    pub bouts: Vec<Bout>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bonuses {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fight_of_the_night: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_of_the_night: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus_mention: Option<String>,
}

impl Bonuses {
    pub fn is_empty(&self) -> bool {
        self.fight_of_the_night.is_none() && self.performance_of_the_night.is_none() && self.bonus_mention.is_none()
    }
}

/// An event page, optionally merged with its schedule row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub league: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub fight_of_the_night: Option<String>,
    pub card_segments: Vec<CardSegment>,
    #[serde(skip_serializing_if = "Bonuses::is_empty", default)]
    pub fight_bonuses: Bonuses,
    pub fighter_urls: Vec<String>,
    pub fighter_names_from_card: Vec<String>,
}

impl EventRecord {
    pub fn bouts(&self) -> impl Iterator<Item = &Bout> {
        self.card_segments.iter().flat_map(|s| s.bouts.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FighterProfile {
    pub id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fighting_style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FighterBio {
    pub id: String,
    pub bio_url: String,
    #[serde(flatten)]
    pub details: BioDetails,
}

/// Labelled bio items and the record block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BioDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    /// Raw `HT/WT` value when it didn't split on a comma.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reach: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ko_record: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_record: Option<String>,
}

/// `{meta ∪ metrics}` for one section row.
pub type FlatStatsRow = BTreeMap<String, Option<String>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FighterStats {
    pub id: String,
    pub stats_url: String,
    pub stats_sections: StatsSections,
    pub striking_fights: Vec<FlatStatsRow>,
    pub clinch_fights: Vec<FlatStatsRow>,
    pub ground_fights: Vec<FlatStatsRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FighterHistory {
    pub id: String,
    pub history_url: String,
    pub fights: Vec<FightHistoryEntry>,
}

/// Profile, bio, stats and history of one fighter in a single record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FighterRecord {
    pub id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fighting_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio_url: Option<String>,
    #[serde(flatten)]
    pub bio: BioDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_url: Option<String>,
    #[serde(skip_serializing_if = "StatsSections::is_empty", default)]
    pub stats_sections: StatsSections,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub striking_fights: Vec<FlatStatsRow>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub clinch_fights: Vec<FlatStatsRow>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ground_fights: Vec<FlatStatsRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_url: Option<String>,
    pub fights: Vec<FightHistoryEntry>,
}
