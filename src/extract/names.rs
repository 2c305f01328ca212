use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::table::sel;
use super::text::{element_text, strip_accents};

/// One way of finding a fighter's display name from the anchor linking to them.
pub type NameStrategy = fn(&ElementRef<'_>) -> Option<String>;

/// Any fighter link on a page: competitor block, then the surrounding card, then the link.
pub const FIGHTER_NAME_CHAIN: [NameStrategy; 4] = [name_in_competitor, name_in_card, name_from_link_text, name_from_slug];

/// Links inside one bout card. The card itself names both fighters, so it is not consulted.
pub const BOUT_NAME_CHAIN: [NameStrategy; 3] = [name_in_competitor, name_from_link_text, name_from_slug];

static NAME_NODES: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        ".MMACompetitor__Name",
        ".Competitor__Name",
        ".MMACompetitor__Detail h2",
        ".Competitor__Detail h2",
        "h2",
        "h3",
        ".name",
        ".player__name",
        "span",
    ]
    .iter()
    .map(|s| sel(s))
    .collect()
});

pub fn resolve_fighter_name(a: &ElementRef<'_>) -> String {
    resolve_with(&FIGHTER_NAME_CHAIN, a)
}

/// First non-placeholder answer along `chain`, or an empty string.
pub fn resolve_with(chain: &[NameStrategy], a: &ElementRef<'_>) -> String {
    chain.iter().find_map(|strategy| strategy(a)).unwrap_or_default()
}

pub fn name_in_competitor(a: &ElementRef<'_>) -> Option<String> {
    let container = nearest_ancestor(a, |c| c == "MMACompetitor" || c == "Competitor")?;
    name_node_text(container)
}

pub fn name_in_card(a: &ElementRef<'_>) -> Option<String> {
    let container = nearest_ancestor(a, |c| c.contains("MMAFightCard") || c.contains("Gamestrip"))?;
    name_node_text(container)
}

fn name_node_text(container: ElementRef<'_>) -> Option<String> {
    NAME_NODES.iter().find_map(|s| {
        let el = container.select(s).next()?;
        usable(element_text(&el))
    })
}

pub fn name_from_link_text(a: &ElementRef<'_>) -> Option<String> {
    usable(element_text(a))
}

pub fn name_from_slug(a: &ElementRef<'_>) -> Option<String> {
    usable(slug_to_name(a.value().attr("href").unwrap_or_default()))
}

/// `/mma/fighter/_/id/3022677/robert-whittaker` → `Robert Whittaker`.
///
/// Only the segment right after the numeric ID counts; ID-only URLs give an empty name.
pub fn slug_to_name(href: &str) -> String {
    let parts: Vec<&str> = href.trim_end_matches('/').split('/').collect();
    let Some(i) = parts.iter().position(|p| *p == "id") else { return String::new() };
    let Some(slug) = parts.get(i + 2).filter(|s| !s.is_empty()) else { return String::new() };
    slug.replace('-', " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn usable(txt: String) -> Option<String> {
    let lower = txt.to_lowercase();
    if txt.is_empty() || lower == "full profile" || lower == "profile" { None } else { Some(txt) }
}

fn nearest_ancestor<'a>(a: &ElementRef<'a>, class_pred: impl Fn(&str) -> bool) -> Option<ElementRef<'a>> {
    a.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().classes().any(&class_pred))
}

/// Whether the Fight-of-the-Night text names both fighters of a bout.
///
/// Compares accent-folded, lower-cased last names by substring; both must hit.
pub fn names_match_fotn(names: &[String], fotn_text: &str) -> bool {
    let [first, second] = names else { return false };
    if fotn_text.trim().is_empty() { return false; }
    let haystack = strip_accents(fotn_text).to_lowercase();
    [first, second].iter().all(|n| {
        let last = last_name(n);
        !last.is_empty() && haystack.contains(&last)
    })
}

fn last_name(name: &str) -> String {
    strip_accents(name)
        .to_lowercase()
        .split_whitespace()
        .last()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn anchor(doc: &Html) -> ElementRef<'_> {
        doc.select(&sel("a")).next().unwrap()
    }

    #[test]
    fn slug_fallback() {
        assert_eq!(slug_to_name("https://www.espn.com/mma/fighter/_/id/3022677/robert-whittaker"), "Robert Whittaker");
        assert_eq!(slug_to_name("/mma/fighter/_/id/3022677/"), "");
        assert_eq!(slug_to_name("/mma/fighter/_/id/1/dricus-du-plessis/"), "Dricus Du Plessis");
        assert_eq!(slug_to_name(""), "");
    }

    #[test]
    fn container_name_beats_link_text() {
        let doc = Html::parse_document(
            r#"<div class="MMACompetitor"><h2 class="MMACompetitor__Name">Alex Pereira</h2>
               <a href="/mma/fighter/_/id/1/alex-pereira">Full Profile</a></div>"#,
        );
        assert_eq!(resolve_fighter_name(&anchor(&doc)), "Alex Pereira");
    }

    #[test]
    fn placeholder_link_text_falls_to_slug() {
        let doc = Html::parse_document(r#"<div><a href="/mma/fighter/_/id/9/jamahal-hill">Profile</a></div>"#);
        let a = anchor(&doc);
        assert_eq!(name_in_competitor(&a), None);
        assert_eq!(name_in_card(&a), None);
        assert_eq!(name_from_link_text(&a), None);
        assert_eq!(resolve_fighter_name(&a), "Jamahal Hill");
    }

    #[test]
    fn bout_chain_skips_card_level_names() {
        let doc = Html::parse_document(
            r#"<div class="MMAFightCard"><h2>Main Event</h2>
               <a href="/mma/fighter/_/id/2/tom-aspinall">Tom Aspinall</a></div>"#,
        );
        let a = anchor(&doc);
        assert_eq!(resolve_fighter_name(&a), "Main Event");
        assert_eq!(resolve_with(&BOUT_NAME_CHAIN, &a), "Tom Aspinall");
    }

    #[test]
    fn plain_link_text() {
        let doc = Html::parse_document(r#"<p><a href="/mma/fighter/_/id/9/">Jamahal Hill</a></p>"#);
        assert_eq!(resolve_fighter_name(&anchor(&doc)), "Jamahal Hill");
    }

    #[test]
    fn fotn_requires_both_last_names() {
        let names = vec!["Robert Whittaker".to_string(), "Dricus Du Plessis".to_string()];
        assert!(names_match_fotn(&names, "Robert Whittaker vs. Dricus Du Plessis"));
        assert!(!names_match_fotn(&names, "Robert Whittaker vs. Yoel Romero"));
        assert!(!names_match_fotn(&names, ""));
        assert!(!names_match_fotn(&names[..1], "Robert Whittaker"));
    }

    #[test]
    fn fotn_ignores_accents_and_case() {
        let names = vec!["José Aldo".to_string(), "Chad Mendes".to_string()];
        assert!(names_match_fotn(&names, "ALDO VS. MENDES"));
    }

    #[test]
    fn fotn_matches_decomposed_names() {
        let names = vec!["Jiri\u{301} Procha\u{301}zka".to_string(), "Glover Teixeira".to_string()];
        assert!(names_match_fotn(&names, "Jiří Procházka vs. Glover Teixeira"));
        let names = vec!["Jiří Procházka".to_string(), "Glover Teixeira".to_string()];
        assert!(names_match_fotn(&names, "Jiri\u{301} Procha\u{301}zka vs. Glover Teixeira"));
    }
}
