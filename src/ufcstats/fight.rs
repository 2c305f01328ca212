use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::page::{row_cells, stacked_texts};
use super::types::{FightParticipant, FighterStatLine, GeneralStats, RoundStats, SigStrikeBreakdown, UfcFight};
use crate::extract::Site;
use crate::extract::fields::{parse_count, parse_fraction, parse_percentage, parse_time_control};
use crate::extract::table::{find_table_by_header_keywords, first_table_after, sel};
use crate::extract::text::{clean, element_text};

static PERSONS: LazyLock<Selector> = LazyLock::new(|| sel("div.b-fight-details__person"));
static PERSON_STATUS: LazyLock<Selector> = LazyLock::new(|| sel("i.b-fight-details__person-status"));
static PERSON_LINK: LazyLock<Selector> = LazyLock::new(|| sel("a.b-fight-details__person-link"));
static PERSON_TITLE: LazyLock<Selector> = LazyLock::new(|| sel("p.b-fight-details__person-title"));
static CONTENT: LazyLock<Selector> = LazyLock::new(|| sel("div.b-fight-details__content"));
static TEXT_ITEMS: LazyLock<Selector> =
    LazyLock::new(|| sel("i.b-fight-details__text-item, i.b-fight-details__text-item_first"));
static LABEL: LazyLock<Selector> = LazyLock::new(|| sel("i.b-fight-details__label"));
static TEXT_PARAS: LazyLock<Selector> = LazyLock::new(|| sel("p.b-fight-details__text"));
static FIGHT_TITLE: LazyLock<Selector> = LazyLock::new(|| sel("i.b-fight-details__fight-title"));
static EVENT_LINK: LazyLock<Selector> = LazyLock::new(|| sel("h2.b-content__title a"));
static SECTIONS: LazyLock<Selector> = LazyLock::new(|| sel("section.b-fight-details__section"));
static ROUND_TOGGLE: LazyLock<Selector> = LazyLock::new(|| sel("a.b-fight-details__collapse-link_rnd"));
static STATS_TABLE: LazyLock<Selector> = LazyLock::new(|| sel("table.b-fight-details__table"));
static ROUND_TABLE_HEAD: LazyLock<Selector> = LazyLock::new(|| sel("thead.b-fight-details__table-head_rnd"));
static ROUND_HEADERS: LazyLock<Selector> = LazyLock::new(|| sel("thead.b-fight-details__table-row_type_head"));
static FIRST_BODY_ROW: LazyLock<Selector> = LazyLock::new(|| sel("tbody tr"));
static TR: LazyLock<Selector> = LazyLock::new(|| sel("tr"));
static TH: LazyLock<Selector> = LazyLock::new(|| sel("th"));
static ANCHORS: LazyLock<Selector> = LazyLock::new(|| sel("a"));
static B_LINKS: LazyLock<Selector> = LazyLock::new(|| sel("a.b-link"));

static DETAILS_PARA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bDetails:\s*(.+)").expect("details pattern"));
static TITLE_WORDS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(Title|Bout)\b").expect("title words pattern"));
static ROUND_NO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Round\s+(\d+)").expect("round pattern"));

const ROUND_HEADER_CLASS: &str = "b-fight-details__table-row_type_head";
/// Fighter, KD, Sig. str., Sig. str. %, Total str., Td, Td %, Sub. att, Rev., Ctrl.
const GENERAL_COLUMNS: usize = 10;
/// Fighter, Sig. str., Sig. str. %, Head, Body, Leg, Distance, Clinch, Ground.
const BREAKDOWN_COLUMNS: usize = 9;

/// `None` when the page has neither fighter blocks nor the fight details box.
pub fn build_fight(doc: &Html, fight_url: &str) -> Option<UfcFight> {
    let has_root = doc.select(&PERSONS).next().is_some() || doc.select(&CONTENT).next().is_some();
    if !has_root { return None; }

    let mut fight = UfcFight {
        id: Site::UfcStats.extract_id(fight_url),
        url: fight_url.to_string(),
        fighters: doc.select(&PERSONS).map(|p| participant(&p)).collect(),
        ..Default::default()
    };

    if let Some(a) = doc.select(&EVENT_LINK).next() {
        let href = a.value().attr("href").unwrap_or_default();
        fight.event_id = Some(Site::UfcStats.extract_id(href));
        fight.event_url = Some(href.to_string());
        fight.event_name = Some(element_text(&a));
    }

    if let Some(content) = doc.select(&CONTENT).next() {
        read_details_box(&mut fight, &content);
    }

    if let Some(title) = doc.select(&FIGHT_TITLE).next() {
        let text = element_text(&title);
        fight.is_title_fight = text.contains("Title");
        fight.weight_class = Some(clean(&TITLE_WORDS.replace_all(&text, "")));
    }

    fight.totals = extract_totals(doc);
    fight.rounds = extract_rounds(doc);
    debug!(id = %fight.id, totals = fight.totals.len(), rounds = fight.rounds.len(), "ufc fight parsed");
    Some(fight)
}

fn participant(person: &ElementRef<'_>) -> FightParticipant {
    let mut p = FightParticipant {
        result: person.select(&PERSON_STATUS).next().map(|e| element_text(&e)),
        nickname: person.select(&PERSON_TITLE).next().map(|e| element_text(&e)),
        ..Default::default()
    };
    if let Some(a) = person.select(&PERSON_LINK).next() {
        let href = a.value().attr("href").unwrap_or_default();
        p.name = Some(element_text(&a));
        p.id = Some(Site::UfcStats.extract_id(href));
        p.url = Some(href.to_string());
    }
    p
}

/// Labelled `Method:` / `Round:` / `Time:` / `Time format:` / `Referee:` / `Details:` items,
/// then the free-text `Details:` paragraph when no labelled details were found.
fn read_details_box(fight: &mut UfcFight, content: &ElementRef<'_>) {
    for item in content.select(&TEXT_ITEMS) {
        let Some(label_el) = item.select(&LABEL).next() else { continue };
        let label_text = element_text(&label_el);
        let label = label_text.to_lowercase();
        let value = clean(&element_text(&item).replacen(&label_text, "", 1));

        if label.contains("method:") {
            fight.method = Some(value);
        } else if label.contains("round:") {
            fight.round = Some(value.parse().unwrap_or(0));
        } else if label.contains("time format:") {
            fight.time_format = Some(value);
        } else if label.contains("time:") {
            fight.time = Some(value);
        } else if label.contains("referee:") {
            fight.referee = Some(value);
        } else if label.contains("details:") && !value.is_empty() {
            fight.details = Some(value);
        }
    }

    if fight.details.is_none() {
        fight.details = content.select(&TEXT_PARAS).find_map(|p| {
            let text = element_text(&p);
            let found = DETAILS_PARA.captures(&text).map(|c| c[1].trim().to_string())?;
            (!found.is_empty()).then_some(found)
        });
    }
}

fn section_containing<'a>(doc: &'a Html, needle: &str) -> Option<ElementRef<'a>> {
    doc.select(&SECTIONS).find(|s| s.text().collect::<String>().contains(needle))
}

fn first_body_row<'a>(table: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    table.select(&FIRST_BODY_ROW).next()
}

fn stacked_at(cols: &[ElementRef<'_>], col: usize, fighter: usize) -> String {
    cols.get(col)
        .and_then(|td| stacked_texts(td).into_iter().nth(fighter))
        .unwrap_or_default()
}

fn general_stats(cols: &[ElementRef<'_>], i: usize) -> GeneralStats {
    let at = |col: usize| stacked_at(cols, col, i);
    let (sig_str_landed, sig_str_attempted) = parse_fraction(&at(2));
    let (total_str_landed, total_str_attempted) = parse_fraction(&at(4));
    let (td_landed, td_attempted) = parse_fraction(&at(5));
    GeneralStats {
        kd: parse_count(&at(1)),
        sig_str_landed,
        sig_str_attempted,
        sig_str_pct: parse_percentage(&at(3)),
        total_str_landed,
        total_str_attempted,
        td_landed,
        td_attempted,
        td_pct: parse_percentage(&at(6)),
        sub_att: parse_count(&at(7)),
        rev: parse_count(&at(8)),
        control_time: parse_time_control(&at(9)),
    }
}

fn breakdown_stats(cols: &[ElementRef<'_>], i: usize) -> SigStrikeBreakdown {
    let at = |col: usize| parse_fraction(&stacked_at(cols, col, i));
    let (sig_str_total_landed, sig_str_total_attempted) = at(1);
    let (head_landed, head_attempted) = at(3);
    let (body_landed, body_attempted) = at(4);
    let (leg_landed, leg_attempted) = at(5);
    let (distance_landed, distance_attempted) = at(6);
    let (clinch_landed, clinch_attempted) = at(7);
    let (ground_landed, ground_attempted) = at(8);
    SigStrikeBreakdown {
        sig_str_total_landed,
        sig_str_total_attempted,
        sig_str_pct_detailed: parse_percentage(&stacked_at(cols, 2, i)),
        head_landed,
        head_attempted,
        body_landed,
        body_attempted,
        leg_landed,
        leg_attempted,
        distance_landed,
        distance_attempted,
        clinch_landed,
        clinch_attempted,
        ground_landed,
        ground_attempted,
    }
}

/// `(name, id)` for up to two fighter anchors in a row's first cell.
fn row_fighters(cols: &[ElementRef<'_>], anchors: &Selector) -> Vec<(String, String)> {
    let Some(first) = cols.first() else { return Vec::new() };
    first
        .select(anchors)
        .take(2)
        .map(|a| (element_text(&a), Site::UfcStats.extract_id(a.value().attr("href").unwrap_or_default())))
        .collect()
}

/// Whole-fight totals per fighter, each merged with the fighter's significant-strike breakdown.
pub fn extract_totals(doc: &Html) -> Vec<FighterStatLine> {
    let table = section_containing(doc, "Totals")
        .and_then(|s| first_table_after(doc, &s))
        .or_else(|| find_table_by_header_keywords(doc, &["fighter", "sig. str."]));
    let Some(row) = table.as_ref().and_then(first_body_row) else { return Vec::new() };
    let cols = row_cells(&row);
    if cols.len() < GENERAL_COLUMNS { return Vec::new(); }

    let mut lines: Vec<FighterStatLine> = row_fighters(&cols, &ANCHORS)
        .into_iter()
        .enumerate()
        .map(|(i, (name, id))| FighterStatLine { id, name, general: general_stats(&cols, i), breakdown: None })
        .collect();

    let breakdowns = extract_totals_breakdown(doc);
    for (line, extra) in lines.iter_mut().zip(breakdowns) {
        line.breakdown = Some(extra);
    }
    lines
}

fn extract_totals_breakdown(doc: &Html) -> Vec<SigStrikeBreakdown> {
    let table = section_containing(doc, "Significant Strikes")
        .and_then(|s| first_table_after(doc, &s))
        .or_else(|| find_table_by_header_keywords(doc, &["head", "body", "leg"]));
    let Some(row) = table.as_ref().and_then(first_body_row) else { return Vec::new() };
    let cols = row_cells(&row);
    if cols.len() < BREAKDOWN_COLUMNS { return Vec::new(); }
    (0..row_fighters(&cols, &ANCHORS).len()).map(|i| breakdown_stats(&cols, i)).collect()
}

/// The per-round tables: the general one first, the significant-strikes one if present.
fn per_round_tables(doc: &Html) -> Vec<ElementRef<'_>> {
    doc.select(&SECTIONS)
        .filter(|s| {
            s.select(&ROUND_TOGGLE)
                .next()
                .is_some_and(|a| element_text(&a).contains("Per round"))
        })
        .filter_map(|s| s.select(&STATS_TABLE).next())
        .collect()
}

fn round_head_text(table: &ElementRef<'_>) -> Option<String> {
    table.select(&ROUND_TABLE_HEAD).next().map(|h| element_text(&h))
}

/// `(round number, data row)` for every `Round N` header in a per-round table.
fn round_rows<'a>(table: &ElementRef<'a>) -> Vec<(u32, ElementRef<'a>)> {
    table
        .select(&ROUND_HEADERS)
        .filter_map(|header| {
            let th = header.select(&TH).next()?;
            let n: u32 = ROUND_NO.captures(&element_text(&th))?[1].parse().ok()?;
            Some((n, row_after_header(&header)?))
        })
        .collect()
}

/// First data row between a round header and the next one.
fn row_after_header<'a>(header: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    for sib in header.next_siblings().filter_map(ElementRef::wrap) {
        match sib.value().name() {
            "thead" if sib.value().classes().any(|c| c == ROUND_HEADER_CLASS) => return None,
            "tbody" => {
                if let Some(tr) = sib.select(&TR).next() { return Some(tr); }
            }
            "tr" => return Some(sib),
            _ => {}
        }
    }
    None
}

/// Per-round general stats, with the per-round significant-strike breakdown merged in by
/// round number and fighter ID.
pub fn extract_rounds(doc: &Html) -> Vec<RoundStats> {
    let tables = per_round_tables(doc);
    let Some(general) = tables.first() else { return Vec::new() };
    if round_head_text(general).is_some_and(|h| !h.contains("KD")) {
        return Vec::new();
    }

    let mut rounds: Vec<RoundStats> = round_rows(general)
        .into_iter()
        .filter_map(|(round_number, row)| {
            let cols = row_cells(&row);
            if cols.len() < GENERAL_COLUMNS { return None; }
            let fighters = row_fighters(&cols, &B_LINKS);
            if fighters.len() < 2 { return None; }
            let fighters = fighters
                .into_iter()
                .enumerate()
                .map(|(i, (name, id))| FighterStatLine { id, name, general: general_stats(&cols, i), breakdown: None })
                .collect();
            Some(RoundStats { round_number, fighters })
        })
        .collect();
    if rounds.is_empty() { return rounds; }

    let sig_table = tables.iter().find(|t| {
        round_head_text(t).is_some_and(|h| ["Head", "Body", "Leg", "Distance"].iter().all(|k| h.contains(k)))
    });
    let Some(sig_table) = sig_table else { return rounds };

    let mut by_round: HashMap<u32, HashMap<String, SigStrikeBreakdown>> = HashMap::new();
    for (round_number, row) in round_rows(sig_table) {
        let cols = row_cells(&row);
        if cols.len() < BREAKDOWN_COLUMNS { continue; }
        let per_fighter = row_fighters(&cols, &B_LINKS)
            .into_iter()
            .enumerate()
            .map(|(i, (_, id))| (id, breakdown_stats(&cols, i)))
            .collect();
        by_round.insert(round_number, per_fighter);
    }

    for round in &mut rounds {
        let Some(extra) = by_round.get_mut(&round.round_number) else { continue };
        for line in &mut round.fighters {
            if let Some(b) = extra.remove(&line.id) {
                line.breakdown = Some(b);
            }
        }
    }
    rounds
}
