use std::collections::BTreeMap;

use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ids::Site;
use super::table::{HeaderMap, RowRecord, read_rows};
use super::text::clean;

/// Passthrough metric columns, keyed by their verbatim header label (`SDBL/A`, `TK ACC`, ...).
pub type Metrics = BTreeMap<String, Option<String>>;

/// Join key → section row.
pub type SectionPayload = BTreeMap<String, SectionEntry>;

/// Keys lifted out of a section row into [`SectionMeta`]; everything else is a metric.
const META_KEYS: [&str; 8] = ["date", "opponent", "opponent_url", "opponent_id", "event_url", "event_id", "result", "event"];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Section {
    Striking,
    Clinch,
    Ground,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Striking, Section::Clinch, Section::Ground];

    /// Visible title of the section's table, lower-cased.
    pub fn title(self) -> &'static str {
        match self {
            Section::Striking => "striking",
            Section::Clinch => "clinch",
            Section::Ground => "ground",
        }
    }
}

/// Fields that tie a section row back to a fight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionMeta {
    pub date: Option<String>,
    pub opponent: Option<String>,
    pub opponent_url: Option<String>,
    pub opponent_id: Option<String>,
    pub event_url: Option<String>,
    pub event_id: Option<String>,
    pub result: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionEntry {
    pub meta: SectionMeta,
    pub metrics: Metrics,
}

/// The three statistics sections of one fighter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSections {
    pub striking: SectionPayload,
    pub clinch: SectionPayload,
    pub ground: SectionPayload,
}

impl StatsSections {
    pub fn get(&self, section: Section) -> &SectionPayload {
        match section {
            Section::Striking => &self.striking,
            Section::Clinch => &self.clinch,
            Section::Ground => &self.ground,
        }
    }

    pub fn get_mut(&mut self, section: Section) -> &mut SectionPayload {
        match section {
            Section::Striking => &mut self.striking,
            Section::Clinch => &mut self.clinch,
            Section::Ground => &mut self.ground,
        }
    }

    pub fn is_empty(&self) -> bool {
        Section::ALL.iter().all(|s| self.get(*s).is_empty())
    }
}

/// Anything that can be matched against a section row.
pub trait Joinable {
    fn event_id(&self) -> Option<&str>;
    fn date(&self) -> Option<&str>;
    fn opponent(&self) -> Option<&str>;

    /// `event_id` when present and non-empty, else `"{date}|{opponent}"` with missing parts empty.
    fn join_key(&self) -> String {
        match self.event_id().filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => format!("{}|{}", self.date().unwrap_or_default(), self.opponent().unwrap_or_default()),
        }
    }
}

impl Joinable for SectionMeta {
    fn event_id(&self) -> Option<&str> { self.event_id.as_deref() }
    fn date(&self) -> Option<&str> { self.date.as_deref() }
    fn opponent(&self) -> Option<&str> { self.opponent.as_deref() }
}

/// One row of a fighter's fight history. Section metrics are attached by [`attach_sections`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FightHistoryEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub striking: Option<Metrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinch: Option<Metrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground: Option<Metrics>,
}

impl Joinable for FightHistoryEntry {
    fn event_id(&self) -> Option<&str> { self.event_id.as_deref() }
    fn date(&self) -> Option<&str> { self.date.as_deref() }
    fn opponent(&self) -> Option<&str> { self.opponent.as_deref() }
}

impl FightHistoryEntry {
    /// Canonical fields only; columns outside the fight-history schema are dropped.
    pub fn from_row(row: &RowRecord) -> Self {
        let field = |k: &str| row.get(k).map(str::to_string);
        FightHistoryEntry {
            date: field("date"),
            opponent: field("opponent"),
            opponent_url: field("opponent_url"),
            opponent_id: field("opponent_id"),
            result: row.get("result").map(normalize_result),
            method: field("method"),
            round: field("round"),
            time: field("time"),
            event: field("event"),
            event_url: field("event_url"),
            event_id: field("event_id"),
            ..Default::default()
        }
    }

    pub fn section(&self, section: Section) -> Option<&Metrics> {
        match section {
            Section::Striking => self.striking.as_ref(),
            Section::Clinch => self.clinch.as_ref(),
            Section::Ground => self.ground.as_ref(),
        }
    }

    fn section_slot(&mut self, section: Section) -> &mut Option<Metrics> {
        match section {
            Section::Striking => &mut self.striking,
            Section::Clinch => &mut self.clinch,
            Section::Ground => &mut self.ground,
        }
    }
}

/// `W`/`L`/`D`/`NC` in any case come back upper-cased; anything else comes back cleaned.
pub fn normalize_result(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    match upper.as_str() {
        "W" | "L" | "D" | "NC" => upper,
        _ => clean(raw),
    }
}

/// Parse one Striking/Clinch/Ground table into join key → `{meta, metrics}`.
///
/// A repeated join key overwrites the earlier row.
pub fn parse_section_table(table: ElementRef<'_>, site: Site) -> SectionPayload {
    let headers = HeaderMap::from_table(table);
    let mut out = SectionPayload::new();
    for row in read_rows(table, &headers, site) {
        let field = |k: &str| row.get(k).map(str::to_string);
        let meta = SectionMeta {
            date: field("date"),
            opponent: field("opponent"),
            opponent_url: field("opponent_url"),
            opponent_id: field("opponent_id"),
            event_url: field("event_url"),
            event_id: field("event_id"),
            result: field("result"),
        };
        let metrics: Metrics = row
            .iter()
            .filter(|(k, _)| !META_KEYS.contains(k))
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect();
        let key = meta.join_key();
        if out.insert(key.clone(), SectionEntry { meta, metrics }).is_some() {
            debug!(join_key = %key, "section row overwrote an earlier row with the same key");
        }
    }
    out
}

/// Attach each section's metrics to the entries whose join key matches.
///
/// Additive only: canonical fields are never touched, a missing section leaves its slot
/// alone, and running it again with the same sections yields the same entries.
pub fn attach_sections(entries: &mut [FightHistoryEntry], sections: &StatsSections) {
    if entries.is_empty() { return; }

    let mut combined: BTreeMap<String, Vec<(Section, &Metrics)>> = BTreeMap::new();
    for section in Section::ALL {
        for (key, entry) in sections.get(section) {
            let key = entry.meta.event_id.clone().filter(|id| !id.is_empty()).unwrap_or_else(|| key.clone());
            combined.entry(key).or_default().push((section, &entry.metrics));
        }
    }

    let mut attached = 0usize;
    for entry in entries.iter_mut() {
        let Some(found) = combined.get(&entry.join_key()) else { continue };
        for (section, metrics) in found {
            *entry.section_slot(*section) = Some((*metrics).clone());
        }
        attached += 1;
    }
    debug!(entries = entries.len(), attached, "attached section stats");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::table::{find_table_by_title, sel};
    use scraper::Html;

    const STATS: &str = r#"
    <div class="ResponsiveTable"><div class="Table__Title">Striking</div>
      <table class="Table">
        <thead><tr><th>Date</th><th>Opponent</th><th>Event</th><th>Res.</th><th>SDBL/A</th><th>TSL-TSA</th></tr></thead>
        <tbody>
          <tr><td>Oct 26, 2024</td><td><a href="/mma/fighter/_/id/100/khamzat-chimaev">Khamzat Chimaev</a></td>
              <td><a data-game-link href="/mma/fightcenter/_/id/600041207/league/ufc">UFC 308</a></td><td>L</td><td>10/30</td><td>40-90</td></tr>
          <tr><td>Feb 17, 2024</td><td>Paulo Costa</td><td>-</td><td>W</td><td>20/45</td><td>-</td></tr>
        </tbody>
      </table></div>
    <div class="ResponsiveTable"><div class="Table__Title">Clinch</div>
      <table class="Table">
        <thead><tr><th>Date</th><th>Opponent</th><th>Event</th><th>Res.</th><th>SCBL</th></tr></thead>
        <tbody>
          <tr><td>Oct 26, 2024</td><td>Khamzat Chimaev</td>
              <td><a href="/mma/fightcenter/_/id/600041207/league/ufc">UFC 308</a></td><td>L</td><td>3</td></tr>
        </tbody>
      </table></div>"#;

    fn sections(doc: &Html) -> StatsSections {
        let mut out = StatsSections::default();
        for s in Section::ALL {
            if let Some(t) = find_table_by_title(doc, s.title()) {
                *out.get_mut(s) = parse_section_table(t, Site::Espn);
            }
        }
        out
    }

    fn history() -> Vec<FightHistoryEntry> {
        vec![
            FightHistoryEntry {
                date: Some("Oct 26, 2024".into()),
                opponent: Some("Khamzat Chimaev".into()),
                event_id: Some("600041207".into()),
                result: Some("L".into()),
                ..Default::default()
            },
            FightHistoryEntry {
                date: Some("Feb 17, 2024".into()),
                opponent: Some("Paulo Costa".into()),
                result: Some("W".into()),
                ..Default::default()
            },
            FightHistoryEntry { date: Some("Jan 1, 2020".into()), opponent: Some("Nobody".into()), ..Default::default() },
        ]
    }

    #[test]
    fn metrics_keep_verbatim_labels() {
        let doc = Html::parse_document(STATS);
        let s = sections(&doc);
        let entry = &s.striking["600041207"];
        assert_eq!(entry.meta.opponent_id.as_deref(), Some("100"));
        assert_eq!(entry.metrics["SDBL/A"].as_deref(), Some("10/30"));
        assert_eq!(entry.metrics["TSL-TSA"].as_deref(), Some("40-90"));
        assert!(!entry.metrics.contains_key("date"));
        assert!(!entry.metrics.contains_key("event"));

        let fallback = &s.striking["Feb 17, 2024|Paulo Costa"];
        assert_eq!(fallback.metrics["TSL-TSA"], None);
    }

    #[test]
    fn same_fight_same_key_across_sections() {
        let doc = Html::parse_document(STATS);
        let s = sections(&doc);
        assert!(s.striking.contains_key("600041207"));
        assert!(s.clinch.contains_key("600041207"));
        assert_eq!(s.striking["600041207"].meta.join_key(), s.clinch["600041207"].meta.join_key());
    }

    #[test]
    fn repeated_key_last_write_wins() {
        let doc = Html::parse_document(
            r#"<table><thead><tr><th>Date</th><th>Opponent</th><th>X</th></tr></thead><tbody>
               <tr><td>May 1</td><td>A B</td><td>1</td></tr>
               <tr><td>May 1</td><td>A B</td><td>2</td></tr></tbody></table>"#,
        );
        let table = doc.select(&sel("table")).next().unwrap();
        let payload = parse_section_table(table, Site::Espn);
        assert_eq!(payload.len(), 1);
        assert_eq!(payload["May 1|A B"].metrics["X"].as_deref(), Some("2"));
    }

    #[test]
    fn join_attaches_present_sections_only() {
        let doc = Html::parse_document(STATS);
        let s = sections(&doc);
        let mut fights = history();
        attach_sections(&mut fights, &s);

        assert!(fights[0].striking.is_some());
        assert!(fights[0].clinch.is_some());
        assert!(fights[0].ground.is_none());

        assert!(fights[1].striking.is_some());
        assert!(fights[1].clinch.is_none());
        assert!(fights[1].ground.is_none());
        assert_eq!(fights[1].result.as_deref(), Some("W"));

        assert_eq!(fights[2], history()[2]);
    }

    #[test]
    fn join_is_idempotent() {
        let doc = Html::parse_document(STATS);
        let s = sections(&doc);
        let mut once = history();
        attach_sections(&mut once, &s);
        let mut twice = once.clone();
        attach_sections(&mut twice, &s);
        assert_eq!(once, twice);
    }

    #[test]
    fn join_key_fallback() {
        let e = FightHistoryEntry { date: Some("May 1".into()), event_id: Some(String::new()), ..Default::default() };
        assert_eq!(e.join_key(), "May 1|");
    }

    #[test]
    fn result_codes() {
        assert_eq!(normalize_result("w"), "W");
        assert_eq!(normalize_result(" nc "), "NC");
        assert_eq!(normalize_result("Win"), "Win");
        assert_eq!(normalize_result("  Win \n by  DQ "), "Win by DQ");
    }
}
