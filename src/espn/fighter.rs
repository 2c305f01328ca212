use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::types::{BioDetails, FighterBio, FighterHistory, FighterProfile, FighterRecord, FighterStats, FlatStatsRow};
use crate::extract::join::{parse_section_table, FightHistoryEntry};
use crate::extract::table::{find_table_by_title, header_text, read_rows, sel, HeaderMap};
use crate::extract::text::{clean, element_text};
use crate::extract::{attach_sections, Section, SectionPayload, Site, StatsSections};

static TITLE: LazyLock<Selector> = LazyLock::new(|| sel("title"));
static STYLED_TABLES: LazyLock<Selector> = LazyLock::new(|| sel("table.Table"));
static TABLES: LazyLock<Selector> = LazyLock::new(|| sel("table"));
static HEAD_CELLS: LazyLock<Selector> = LazyLock::new(|| sel("thead th"));
static BODY_ROWS: LazyLock<Selector> = LazyLock::new(|| sel("tbody tr"));
static CELLS: LazyLock<Selector> = LazyLock::new(|| sel("td"));
static BIO_ITEMS: LazyLock<Selector> = LazyLock::new(|| sel("section.Card.Bio div.Bio__Item"));
static BIO_LABEL: LazyLock<Selector> = LazyLock::new(|| sel("span.Bio__Label"));
static SPANS: LazyLock<Selector> = LazyLock::new(|| sel("span"));
static STAT_ITEMS: LazyLock<Selector> = LazyLock::new(|| sel("aside.StatBlock div.StatBlockInner"));
static STAT_LABEL: LazyLock<Selector> = LazyLock::new(|| sel("div.StatBlockInner__Label"));
static STAT_VALUE: LazyLock<Selector> = LazyLock::new(|| sel("div.StatBlockInner__Value"));

static NAME_BEFORE_PAREN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([^(]+)").expect("title name pattern"));
static HEIGHT_WEIGHT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([^,]+),\s*(.+)$").expect("ht/wt pattern"));
static BIRTHDATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{1,2}/\d{1,2}/\d{4})").expect("birthdate pattern"));
static AGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((\d+)\)").expect("age pattern"));

/// Layout of the history table when its header row is missing or truncated.
const HISTORY_FALLBACK_HEADERS: [&str; 7] = ["Date", "Opponent", "Res.", "Decision", "Rnd", "Time", "Event"];

/// Sub-pages hanging off a fighter's profile URL.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FighterPage {
    Bio,
    Stats,
    History,
}

impl FighterPage {
    /// `/mma/fighter/_/id/…` → `/mma/fighter/<page>/_/id/…`.
    pub fn url(self, fighter_url: &str) -> String {
        let seg = match self {
            FighterPage::Bio => "/fighter/bio/",
            FighterPage::Stats => "/fighter/stats/",
            FighterPage::History => "/fighter/history/",
        };
        fighter_url.replacen("/fighter/", seg, 1)
    }
}

pub fn build_profile(doc: &Html, fighter_url: &str) -> FighterProfile {
    let name = doc
        .select(&TITLE)
        .next()
        .map(|t| element_text(&t))
        .and_then(|title| NAME_BEFORE_PAREN.captures(&title).map(|c| clean(&c[1])))
        .filter(|n| !n.is_empty());

    FighterProfile {
        id: Site::Espn.extract_id(fighter_url),
        url: fighter_url.to_string(),
        name_slug: fighter_url.trim_end_matches('/').rsplit('/').next().map(str::to_string),
        name,
        fighting_style: fighting_style(doc),
    }
}

/// Value of the "Fighting Style" column in the first table that has one.
fn fighting_style(doc: &Html) -> Option<String> {
    let table = doc.select(&STYLED_TABLES).find(|t| {
        t.select(&HEAD_CELLS).any(|th| element_text(&th) == "Fighting Style")
    })?;
    let headers: Vec<String> = table.select(&HEAD_CELLS).map(|th| element_text(&th)).collect();
    let col = headers.iter().position(|h| h == "Fighting Style")?;
    table.select(&BODY_ROWS).find_map(|tr| {
        let cells: Vec<ElementRef<'_>> = tr.select(&CELLS).collect();
        if cells.len() < headers.len() { return None; }
        let style = element_text(&cells[col]);
        let junk = matches!(style.as_str(), "" | "-" | "Height" | "Weight" | "Fighter");
        (!junk).then_some(style)
    })
}

pub fn build_bio(doc: &Html, fighter_url: &str) -> FighterBio {
    let mut d = BioDetails::default();

    for item in doc.select(&BIO_ITEMS) {
        let Some(label) = item.select(&BIO_LABEL).next() else { continue };
        let Some(value) = item
            .select(&SPANS)
            .find(|s| s.value().classes().any(|c| c == "dib") && s.value().classes().any(|c| c == "flex-uniform"))
        else {
            continue;
        };
        let label = element_text(&label).to_lowercase();
        let value = element_text(&value);
        apply_bio_item(&mut d, &label, value);
    }

    for item in doc.select(&STAT_ITEMS) {
        let (Some(label), Some(value)) = (item.select(&STAT_LABEL).next(), item.select(&STAT_VALUE).next()) else {
            continue;
        };
        let label = element_text(&label).to_lowercase();
        let value = element_text(&value);
        if label.contains("w-l-d") || label.contains("wins-losses-draws") {
            d.record = Some(value);
        } else if label.contains("(t)ko") || label.contains("knockout") {
            d.ko_record = Some(value);
        } else if label.contains("sub") {
            d.sub_record = Some(value);
        }
    }

    FighterBio {
        id: Site::Espn.extract_id(fighter_url),
        bio_url: FighterPage::Bio.url(fighter_url),
        details: d,
    }
}

fn apply_bio_item(d: &mut BioDetails, label: &str, value: String) {
    if label.contains("country") {
        d.country = Some(value);
    } else if label.contains("wt class") || label.contains("weight class") {
        d.weight_class = Some(value);
    } else if label.contains("ht/wt") || label.contains("height") {
        match HEIGHT_WEIGHT.captures(&value) {
            Some(c) => {
                d.height = Some(clean(&c[1]));
                d.weight = Some(clean(&c[2]));
            }
            None => d.height_weight = Some(value),
        }
    } else if label.contains("birthdate") {
        d.birthdate = BIRTHDATE.captures(&value).map(|c| c[1].to_string());
        d.age = AGE.captures(&value).and_then(|c| c[1].parse().ok());
    } else if label.contains("team") {
        d.team = Some(value);
    } else if label.contains("nickname") {
        d.nickname = Some(value);
    } else if label.contains("stance") {
        d.stance = Some(value);
    } else if label.contains("reach") {
        d.reach = Some(value.replace('"', "").trim().to_string());
    }
}

pub fn build_stats(doc: &Html, fighter_url: &str) -> FighterStats {
    let mut sections = StatsSections::default();
    for section in Section::ALL {
        if let Some(table) = find_table_by_title(doc, section.title()) {
            *sections.get_mut(section) = parse_section_table(table, Site::Espn);
        }
    }
    debug!(
        striking = sections.striking.len(),
        clinch = sections.clinch.len(),
        ground = sections.ground.len(),
        "stats sections parsed"
    );
    FighterStats {
        id: Site::Espn.extract_id(fighter_url),
        stats_url: FighterPage::Stats.url(fighter_url),
        striking_fights: flatten_section(&sections.striking),
        clinch_fights: flatten_section(&sections.clinch),
        ground_fights: flatten_section(&sections.ground),
        stats_sections: sections,
    }
}

/// `{meta ∪ metrics}` per row, metrics winning on a name clash.
fn flatten_section(payload: &SectionPayload) -> Vec<FlatStatsRow> {
    payload
        .values()
        .map(|entry| {
            let m = &entry.meta;
            let mut row: FlatStatsRow = [
                ("date", &m.date),
                ("opponent", &m.opponent),
                ("opponent_url", &m.opponent_url),
                ("opponent_id", &m.opponent_id),
                ("event_url", &m.event_url),
                ("event_id", &m.event_id),
                ("result", &m.result),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
            row.extend(entry.metrics.iter().map(|(k, v)| (k.clone(), v.clone())));
            row
        })
        .collect()
}

pub fn build_history(doc: &Html, fighter_url: &str) -> FighterHistory {
    let mut fights = Vec::new();
    for table in doc.select(&TABLES) {
        let Some(header) = header_text(table) else { continue };
        if !["date", "opponent", "result", "event"].iter().any(|k| header.contains(k)) { continue; }
        fights.extend(read_history_table(table));
    }
    FighterHistory {
        id: Site::Espn.extract_id(fighter_url),
        history_url: FighterPage::History.url(fighter_url),
        fights,
    }
}

fn read_history_table(table: ElementRef<'_>) -> Vec<FightHistoryEntry> {
    let mut headers = HeaderMap::from_table(table);
    if headers.len() < 3 {
        headers = HeaderMap::from_labels(HISTORY_FALLBACK_HEADERS);
    }
    read_rows(table, &headers, Site::Espn)
        .map(|row| FightHistoryEntry::from_row(&row))
        .collect()
}

/// Merge the four fighter pages into one record and join section stats onto the fights.
///
/// On overlapping fields the earlier page wins: profile, then bio, then stats, then history.
pub fn compose_fighter(
    fighter_url: &str,
    profile: Option<FighterProfile>,
    bio: Option<FighterBio>,
    stats: Option<FighterStats>,
    history: Option<FighterHistory>,
) -> FighterRecord {
    let id_from = |id: &str| Some(id.to_string()).filter(|s| !s.is_empty());
    let mut id = None;
    let mut rec = FighterRecord { url: fighter_url.to_string(), ..Default::default() };

    if let Some(p) = profile {
        id = id.or(id_from(&p.id));
        rec.url = p.url;
        rec.name_slug = p.name_slug;
        rec.name = p.name;
        rec.fighting_style = p.fighting_style;
    }
    if let Some(b) = bio {
        id = id.or(id_from(&b.id));
        rec.bio_url = Some(b.bio_url);
        rec.bio = b.details;
    }
    if let Some(s) = stats {
        id = id.or(id_from(&s.id));
        rec.stats_url = Some(s.stats_url);
        rec.stats_sections = s.stats_sections;
        rec.striking_fights = s.striking_fights;
        rec.clinch_fights = s.clinch_fights;
        rec.ground_fights = s.ground_fights;
    }
    if let Some(h) = history {
        id = id.or(id_from(&h.id));
        rec.history_url = Some(h.history_url);
        rec.fights = h.fights;
    }
    rec.id = id.unwrap_or_else(|| Site::Espn.extract_id(fighter_url));

    attach_sections(&mut rec.fights, &rec.stats_sections);
    rec
}
