use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use super::types::{Bonuses, Bout, CardSegment, EventRecord, ScheduleEvent};
use crate::extract::Site;
use crate::extract::names::{BOUT_NAME_CHAIN, names_match_fotn, resolve_with};
use crate::extract::table::sel;
use crate::extract::text::{clean, element_text};

static TITLE: LazyLock<Selector> = LazyLock::new(|| sel("title"));
static MAIN_LAYOUT: LazyLock<Selector> = LazyLock::new(|| sel("div.PageLayout__Main"));
static FIGHTER_LINKS: LazyLock<Selector> = LazyLock::new(|| sel(r#"a[href*="/mma/fighter/_/id/"]"#));
static PLAYER_UIDS: LazyLock<Selector> = LazyLock::new(|| sel("[data-player-uid]"));
static HEADINGS: LazyLock<Selector> = LazyLock::new(|| sel("h1, h2, h3, h4, h5, h6"));
static CARD_NAME_NODES: LazyLock<Selector> = LazyLock::new(|| {
    sel(".MMACompetitor__Detail h2, .Competitor__Detail h2, .Fighter__Name, .player__name, [data-player-uid] h2, [data-player-uid] .name")
});
static SPANS: LazyLock<Selector> = LazyLock::new(|| sel("span"));

static ESPN_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*-\s*ESPN.*$").expect("espn suffix pattern"));
static RESULTS_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*Fight Results\s*$").expect("results suffix pattern"));
static PLAYER_UID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~a:(\d+)").expect("player uid pattern"));

const FIGHTER_PATH: &str = "/mma/fighter/_/id/";
const BONUS_PHRASES: [&str; 5] = [
    "fight of the night",
    "performance of the night",
    "bonus winner",
    "fight bonus",
    "performance bonus",
];

/// Everything an event page yields on its own, before the schedule row is merged in.
pub fn build_event_page(doc: &Html, event_url: &str) -> EventRecord {
    let card_segments = extract_card_segments(doc);
    let fighter_urls = extract_fighter_urls(doc);
    let fighter_names_from_card = extract_card_names(doc);
    debug!(
        url = event_url,
        segments = card_segments.len(),
        fighters = fighter_urls.len(),
        names = fighter_names_from_card.len(),
        "event page parsed"
    );
    EventRecord {
        id: Site::Espn.extract_id(event_url),
        url: event_url.to_string(),
        name: event_name(doc),
        card_segments,
        fight_bonuses: extract_bonuses(doc),
        fighter_urls,
        fighter_names_from_card,
        ..Default::default()
    }
}

/// Fill gaps from the schedule row and flag the bout the Fight-of-the-Night text names.
pub fn merge_schedule(mut event: EventRecord, sched: &ScheduleEvent) -> EventRecord {
    if event.name.as_deref().is_none_or(str::is_empty) && !sched.name.is_empty() {
        event.name = Some(sched.name.clone());
    }
    if event.date.is_none() { event.date = Some(sched.date.clone()); }
    if event.location.is_none() { event.location = Some(sched.location.clone()); }
    if event.year.is_none() { event.year = Some(sched.year); }
    if event.league.is_none() { event.league = sched.league.clone(); }
    if event.fight_of_the_night.is_none() { event.fight_of_the_night = sched.fight_of_the_night.clone(); }

    if let Some(fotn) = event.fight_of_the_night.clone() {
        for bout in event.card_segments.iter_mut().flat_map(|s| s.bouts.iter_mut()) {
            bout.is_fotn = names_match_fotn(&bout.fighter_names, &fotn);
        }
    }
    event
}

fn event_name(doc: &Html) -> Option<String> {
    let title = doc.select(&TITLE).next().map(|t| element_text(&t))?;
    let name = ESPN_SUFFIX.replace(&title, "");
    let name = RESULTS_SUFFIX.replace(&name, "");
    Some(name.into_owned())
}

fn normalize_segment(title: &str) -> String {
    let t = clean(title).to_lowercase();
    if t.contains("main card") { return "Main Card".into(); }
    if t.contains("early") && t.contains("prelim") { return "Early Prelims".into(); }
    if t.contains("prelim") { return "Prelims".into(); }
    let cleaned = clean(title);
    if cleaned.is_empty() { "Unknown".into() } else { cleaned }
}

fn has_class_containing(el: &ElementRef<'_>, needles: &[&str]) -> bool {
    el.value().classes().any(|c| needles.iter().any(|n| c.contains(n)))
}

/// Bouts grouped by card segment, segments in page order.
///
/// Walks `header`/`div` elements in document order: a `Card__Header` opens a segment and
/// each fight card linking two distinct fighters becomes a bout in the current segment.
/// A fighter pair is counted once even when cards nest.
pub fn extract_card_segments(doc: &Html) -> Vec<CardSegment> {
    let root = doc.select(&MAIN_LAYOUT).next().unwrap_or_else(|| doc.root_element());
    let mut segments: Vec<CardSegment> = Vec::new();
    let mut current = "Unknown".to_string();
    let mut seen_pairs: HashSet<(String, String)> = HashSet::new();

    for el in root.descendants().filter_map(ElementRef::wrap) {
        let tag = el.value().name();
        if tag == "header" && has_class_containing(&el, &["Card__Header"]) {
            let title = el
                .select(&HEADINGS)
                .find(|h| has_class_containing(h, &["Card__Header__Title"]));
            if let Some(title) = title {
                current = normalize_segment(&element_text(&title));
                segment_mut(&mut segments, &current);
            }
            continue;
        }
        if tag != "div" || !has_class_containing(&el, &["MMAFightCard", "Gamestrip"]) { continue; }

        let Some((ids, names)) = bout_fighters(&el) else { continue };
        let mut pair = (ids[0].clone(), ids[1].clone());
        if pair.0 > pair.1 { std::mem::swap(&mut pair.0, &mut pair.1); }
        if !seen_pairs.insert(pair) { continue; }

        let segment = segment_mut(&mut segments, &current);
        segment.bouts.push(Bout {
            fighter_ids: ids,
            fighter_names: names,
            card_segment: current.clone(),
            bout_order_in_segment: segment.bouts.len(),
            is_fotn: false,
        });
    }
    segments
}

fn segment_mut<'s>(segments: &'s mut Vec<CardSegment>, name: &str) -> &'s mut CardSegment {
    let idx = match segments.iter().position(|s| s.name == name) {
        Some(i) => i,
        None => {
            segments.push(CardSegment { name: name.to_string(), bouts: Vec::new() });
            segments.len() - 1
        }
    };
    &mut segments[idx]
}

/// The first two distinct fighter IDs linked from a card, with their names.
fn bout_fighters(card: &ElementRef<'_>) -> Option<(Vec<String>, Vec<String>)> {
    let mut ids = Vec::with_capacity(2);
    let mut names = Vec::with_capacity(2);
    for a in card.select(&FIGHTER_LINKS) {
        let id = Site::Espn.extract_id(a.value().attr("href").unwrap_or_default());
        if id.is_empty() || ids.contains(&id) { continue; }
        ids.push(id);
        names.push(resolve_with(&BOUT_NAME_CHAIN, &a));
        if ids.len() == 2 { break; }
    }
    (ids.len() == 2).then_some((ids, names))
}

/// Bonus mentions by kind. The first text node in page order wins for each kind.
pub fn extract_bonuses(doc: &Html) -> Bonuses {
    let mut bonuses = Bonuses::default();
    for node in doc.root_element().descendants() {
        let Node::Text(text) = node.value() else { continue };
        let lower = text.to_lowercase();
        if !BONUS_PHRASES.iter().any(|p| lower.contains(p)) { continue; }
        let Some(parent) = node.parent().and_then(ElementRef::wrap) else { continue };
        if matches!(parent.value().name(), "script" | "style" | "title") { continue; }
        let context = element_text(&parent);

        let slot = if lower.contains("fight of the night") {
            &mut bonuses.fight_of_the_night
        } else if lower.contains("performance of the night") {
            &mut bonuses.performance_of_the_night
        } else {
            &mut bonuses.bonus_mention
        };
        if slot.is_none() { *slot = Some(context); }
    }
    bonuses
}

/// Absolute fighter profile URLs, one per fighter ID, sorted.
///
/// Collected from fighter anchors and `data-player-uid="...~a:<id>"` elements. When a
/// fighter appears both with and without a name slug after the ID, the slug form wins.
pub fn extract_fighter_urls(doc: &Html) -> Vec<String> {
    let mut raw: BTreeSet<String> = doc
        .select(&FIGHTER_LINKS)
        .filter_map(|a| a.value().attr("href"))
        .map(|h| Site::Espn.absolutize(h))
        .collect();

    for el in doc.select(&PLAYER_UIDS) {
        let uid = el.value().attr("data-player-uid").unwrap_or_default();
        let Some(id) = PLAYER_UID.captures(uid).map(|c| c[1].to_string()) else { continue };
        match el.value().attr("href") {
            Some(href) if el.value().name() == "a" => {
                if href.contains(FIGHTER_PATH) && href.contains(&id) {
                    raw.insert(Site::Espn.absolutize(href));
                }
            }
            _ => {
                raw.insert(format!("{}{FIGHTER_PATH}{id}/", Site::Espn.base_url()));
            }
        }
    }

    let mut by_id: BTreeMap<String, String> = BTreeMap::new();
    for url in raw {
        let id = Site::Espn.extract_id(&url);
        if id.is_empty() { continue; }
        if has_name_slug(&url) || !by_id.contains_key(&id) {
            by_id.insert(id, url);
        }
    }
    let mut urls: Vec<String> = by_id.into_values().collect();
    urls.sort();
    urls
}

fn has_name_slug(url: &str) -> bool {
    let parts: Vec<&str> = url.trim_end_matches('/').split('/').collect();
    parts
        .iter()
        .position(|p| *p == "id")
        .is_some_and(|i| i + 2 < parts.len())
}

/// Names printed on the card, deduplicated and sorted.
pub fn extract_card_names(doc: &Html) -> Vec<String> {
    let mut names = BTreeSet::new();
    for node in doc.select(&CARD_NAME_NODES) {
        let mut parts: Vec<String> = node.select(&SPANS).map(|s| element_text(&s)).filter(|p| !p.is_empty()).collect();
        if parts.is_empty() {
            parts = Some(element_text(&node)).into_iter().filter(|p| !p.is_empty()).collect();
        }
        if !parts.is_empty() {
            names.insert(parts.join(" "));
        }
    }
    names.into_iter().collect()
}
