use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::types::ScheduleEvent;
use crate::extract::Site;
use crate::extract::fields::parse_schedule_date;
use crate::extract::table::{HeaderMap, header_text, sel};
use crate::extract::text::{element_text, is_placeholder};

static SCHEDULE_TABLES: LazyLock<Selector> = LazyLock::new(|| sel("table.Table"));
static BODY_ROWS: LazyLock<Selector> = LazyLock::new(|| sel("tbody tr"));
static CELLS: LazyLock<Selector> = LazyLock::new(|| sel("td"));
static LINK: LazyLock<Selector> = LazyLock::new(|| sel("a[href]"));
static LEAGUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/league/([a-z0-9-]+)").expect("league pattern"));

const FIGHTCENTER_PATH: &str = "/mma/fightcenter/_/id/";

pub fn schedule_url(year: i32) -> String {
    format!("{}/mma/schedule/_/year/{year}", Site::Espn.base_url())
}

/// League slug from the `/league/<slug>` path segment, lower-cased.
pub fn league_from_url(url: &str) -> Option<String> {
    LEAGUE.captures(url).map(|c| c[1].to_lowercase())
}

/// Past-result events on a yearly schedule page.
///
/// Only tables whose header has event, location and date plus a Fight-of-the-Night column
/// count; upcoming-event tables are skipped. Events whose league isn't in `allowed` are
/// dropped; an empty `allowed` keeps every league.
pub fn build_schedule(doc: &Html, year: i32, allowed: &HashSet<String>) -> Vec<ScheduleEvent> {
    let mut events = Vec::new();
    let mut seen_urls = HashSet::new();

    for table in doc.select(&SCHEDULE_TABLES) {
        let Some(header) = header_text(table) else { continue };
        if !is_past_results(&header) { continue; }

        let headers = HeaderMap::from_table(table);
        let cols = Columns {
            date: headers.position(|h| h.starts_with("date")),
            event: headers.position(|h| h.starts_with("event")),
            location: headers.position(|h| h.starts_with("location")),
            fotn: headers.position(|h| h.contains("fight of the night") || h == "fotn"),
        };

        for tr in table.select(&BODY_ROWS) {
            let tds: Vec<ElementRef<'_>> = tr.select(&CELLS).collect();
            if tds.is_empty() { continue; }
            let Some(event) = read_event_row(&tds, &cols, year) else { continue };
            if !seen_urls.insert(event.url.clone()) { continue; }
            if !allowed.is_empty() && !event.league.as_ref().is_some_and(|l| allowed.contains(l)) {
                debug!(url = %event.url, league = ?event.league, "league filtered out");
                continue;
            }
            events.push(event);
        }
    }
    debug!(year, events = events.len(), "schedule parsed");
    events
}

fn is_past_results(header: &str) -> bool {
    let listing = header.contains("event") && header.contains("location") && header.contains("date");
    listing && (header.contains("fight of the night") || header.contains("fotn"))
}

struct Columns {
    date: Option<usize>,
    event: Option<usize>,
    location: Option<usize>,
    fotn: Option<usize>,
}

fn read_event_row(tds: &[ElementRef<'_>], cols: &Columns, year: i32) -> Option<ScheduleEvent> {
    let cell = |idx: Option<usize>| idx.and_then(|i| tds.get(i));
    let event_td = cell(cols.event)?;
    let a = event_td.select(&LINK).next()?;
    let href = a.value().attr("href")?;
    if !href.contains(FIGHTCENTER_PATH) { return None; }

    let url = Site::Espn.absolutize(href);
    let name = Some(element_text(&a)).filter(|n| !n.is_empty()).unwrap_or_else(|| element_text(event_td));
    let date_text = cell(cols.date).map(element_text).unwrap_or_default();
    let location = cell(cols.location).map(element_text).unwrap_or_default();
    let fight_of_the_night = cell(cols.fotn).map(element_text).filter(|t| !is_placeholder(t));

    Some(ScheduleEvent {
        id: Site::Espn.extract_id(&url),
        league: league_from_url(&url),
        name,
        date: parse_schedule_date(&date_text, year),
        location,
        year,
        fight_of_the_night,
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEDULE_2024: &str = r#"
    <html><body>
      <div class="Table__Title">Upcoming</div>
      <table class="Table">
        <thead><tr><th>Date</th><th>Event</th><th>Location</th><th>Time</th></tr></thead>
        <tbody><tr><td>Dec 14</td><td><a href="/mma/fightcenter/_/id/600050000/league/ufc">UFC Tampa</a></td><td>Tampa</td><td>7:00 PM</td></tr></tbody>
      </table>
      <div class="Table__Title">Past Results</div>
      <table class="Table">
        <thead><tr><th>Date</th><th>Event</th><th>Location</th><th>Fight of the Night</th></tr></thead>
        <tbody>
          <tr><td>Sep 28</td><td><a href="/mma/fightcenter/_/id/600041200/league/ufc">UFC Fight Night: Moicano vs. Saint Denis</a></td>
              <td>Paris, France</td><td>Benoit Saint Denis vs. Renato Moicano</td></tr>
          <tr><td>Sep 21</td><td>TBA</td><td>Somewhere</td><td></td></tr>
        </tbody>
      </table>
    </body></html>"#;

    fn ufc_only() -> HashSet<String> {
        ["ufc".to_string()].into_iter().collect()
    }

    #[test]
    fn past_results_row_becomes_event() {
        let doc = Html::parse_document(SCHEDULE_2024);
        let events = build_schedule(&doc, 2024, &ufc_only());
        assert_eq!(events.len(), 1);
        let ev = &events[0];
        assert_eq!(ev.id, "600041200");
        assert_eq!(ev.url, "https://www.espn.com/mma/fightcenter/_/id/600041200/league/ufc");
        assert_eq!(ev.date, "2024-09-28");
        assert_eq!(ev.location, "Paris, France");
        assert_eq!(ev.league.as_deref(), Some("ufc"));
        assert_eq!(ev.year, 2024);
        assert_eq!(ev.fight_of_the_night.as_deref(), Some("Benoit Saint Denis vs. Renato Moicano"));
    }

    #[test]
    fn league_filter_drops_other_leagues() {
        let doc = Html::parse_document(SCHEDULE_2024);
        let pfl: HashSet<String> = ["pfl".to_string()].into_iter().collect();
        assert!(build_schedule(&doc, 2024, &pfl).is_empty());
        assert_eq!(build_schedule(&doc, 2024, &HashSet::new()).len(), 1);
    }

    #[test]
    fn duplicate_event_links_collapse() {
        let doc = Html::parse_document(
            r#"<table class="Table"><thead><tr><th>Date</th><th>Event</th><th>Location</th><th>FOTN</th></tr></thead><tbody>
               <tr><td>Mar 2</td><td><a href="/mma/fightcenter/_/id/1/league/pfl">PFL 1</a></td><td>Riyadh</td><td>-</td></tr>
               <tr><td>Mar 2</td><td><a href="/mma/fightcenter/_/id/1/league/pfl">PFL 1</a></td><td>Riyadh</td><td>-</td></tr>
               </tbody></table>"#,
        );
        let events = build_schedule(&doc, 2023, &HashSet::new());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].date, "2023-03-02");
        assert_eq!(events[0].fight_of_the_night, None);
    }

    #[test]
    fn league_slug() {
        assert_eq!(league_from_url("https://www.espn.com/mma/fightcenter/_/id/1/league/ufc"), Some("ufc".into()));
        assert_eq!(league_from_url("https://www.espn.com/mma/fightcenter/_/id/1"), None);
    }
}
