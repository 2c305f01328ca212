use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightRecord {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub no_contests: u32,
}

/// Career averages from the fighter page's info boxes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slpm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub str_acc: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sapm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub str_def: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub td_avg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub td_acc: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub td_def: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_avg: Option<f64>,
}

/// One row of a fighter's fight history, seen from that fighter's side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FighterFight {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fight_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fight_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kd: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub str: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub td: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UfcFighter {
    pub id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub record: Option<FightRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reach: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(flatten)]
    pub career: CareerStats,
    pub fights: Vec<FighterFight>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FightLink {
    pub fight_url: String,
    pub fight_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UfcEvent {
    pub id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub fights: Vec<FightLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FightParticipant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

/// Knockdowns, strikes, takedowns and control for one fighter, totals or one round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralStats {
    pub kd: u32,
    pub sig_str_landed: u32,
    pub sig_str_attempted: u32,
    pub sig_str_pct: u32,
    pub total_str_landed: u32,
    pub total_str_attempted: u32,
    pub td_landed: u32,
    pub td_attempted: u32,
    pub td_pct: u32,
    pub sub_att: u32,
    pub rev: u32,
    /// Seconds.
    pub control_time: u32,
}

/// Where significant strikes landed, from the breakdown table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SigStrikeBreakdown {
    pub sig_str_total_landed: u32,
    pub sig_str_total_attempted: u32,
    pub sig_str_pct_detailed: u32,
    pub head_landed: u32,
    pub head_attempted: u32,
    pub body_landed: u32,
    pub body_attempted: u32,
    pub leg_landed: u32,
    pub leg_attempted: u32,
    pub distance_landed: u32,
    pub distance_attempted: u32,
    pub clinch_landed: u32,
    pub clinch_attempted: u32,
    pub ground_landed: u32,
    pub ground_attempted: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FighterStatLine {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub general: GeneralStats,
    #[serde(flatten)]
    pub breakdown: Option<SigStrikeBreakdown>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundStats {
    pub round_number: u32,
    pub fighters: Vec<FighterStatLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UfcFight {
    pub id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    pub fighters: Vec<FightParticipant>,
    pub is_title_fight: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub totals: Vec<FighterStatLine>,
    pub rounds: Vec<RoundStats>,
}
