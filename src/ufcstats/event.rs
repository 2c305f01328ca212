use scraper::Html;
use tracing::debug;

use super::page::{info_items, nav_rows, nav_target, title_highlight};
use super::types::{FightLink, UfcEvent};
use crate::extract::Site;

/// `None` when the page has no event title banner.
pub fn build_event(doc: &Html, event_url: &str) -> Option<UfcEvent> {
    let name = title_highlight(doc)?;
    let mut event = UfcEvent {
        id: Site::UfcStats.extract_id(event_url),
        url: event_url.to_string(),
        name: Some(name),
        ..Default::default()
    };
    for (label, value) in info_items(doc) {
        if label.contains("date:") {
            event.date = Some(value);
        } else if label.contains("location:") {
            event.location = Some(value);
        }
    }
    event.fights = nav_rows(doc)
        .filter_map(|tr| nav_target(&tr))
        .map(|url| FightLink { fight_id: Site::UfcStats.extract_id(&url), fight_url: url })
        .collect();
    debug!(id = %event.id, fights = event.fights.len(), "ufc event parsed");
    Some(event)
}
