//! Markup shared by every UFC Stats page: title banner, labelled info boxes and the
//! `b-fight-details` tables whose cells stack one `<p>` per fighter.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::extract::Site;
use crate::extract::table::sel;
use crate::extract::text::{clean, element_text};

static TITLE_HIGHLIGHT: LazyLock<Selector> = LazyLock::new(|| sel("span.b-content__title-highlight"));
static INFO_ITEMS: LazyLock<Selector> = LazyLock::new(|| sel("li.b-list__box-list-item"));
static INFO_TITLE: LazyLock<Selector> = LazyLock::new(|| sel("i.b-list__box-item-title"));
static NAV_ROWS: LazyLock<Selector> = LazyLock::new(|| sel("tr.b-fight-details__table-row[onclick]"));
static CELL_TEXT: LazyLock<Selector> = LazyLock::new(|| sel("p.b-fight-details__table-text"));
static FIGHTER_ANCHORS: LazyLock<Selector> = LazyLock::new(|| sel(r#"a[href*="/fighter-details/"]"#));
static FIGHT_ANCHORS: LazyLock<Selector> = LazyLock::new(|| sel(r#"a[href*="/fight-details/"]"#));

static DO_NAV: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"doNav\('([^']+)'\)").expect("doNav pattern"));

pub fn fighter_index_url(letter: char) -> String {
    format!("{}/statistics/fighters?char={letter}&page=all", Site::UfcStats.base_url())
}

/// Text of the page's highlighted title (fighter or event name).
pub fn title_highlight(doc: &Html) -> Option<String> {
    doc.select(&TITLE_HIGHLIGHT).next().map(|e| element_text(&e)).filter(|t| !t.is_empty())
}

/// `(lower-cased label, value)` for each `Label: value` info-box item, in page order.
pub fn info_items(doc: &Html) -> Vec<(String, String)> {
    doc.select(&INFO_ITEMS)
        .filter_map(|item| {
            let title = element_text(&item.select(&INFO_TITLE).next()?);
            let value = clean(&element_text(&item).replacen(&title, "", 1));
            Some((title.to_lowercase(), value))
        })
        .collect()
}

/// Target of a clickable table row's `onclick="doNav('…')"`.
pub fn nav_target(tr: &ElementRef<'_>) -> Option<String> {
    let onclick = tr.value().attr("onclick")?;
    DO_NAV.captures(onclick).map(|c| c[1].to_string())
}

pub fn nav_rows(doc: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    doc.select(&NAV_ROWS)
}

/// Per-fighter values stacked inside one stats cell.
pub fn stacked_texts(td: &ElementRef<'_>) -> Vec<String> {
    td.select(&CELL_TEXT).map(|p| element_text(&p)).collect()
}

/// Direct `<td>` children of a row.
pub fn row_cells<'a>(tr: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    tr.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "td")
        .collect()
}

/// Absolute fighter-details links on the page, first occurrence order, deduplicated.
pub fn fighter_links(doc: &Html) -> Vec<String> {
    unique_hrefs(doc, &FIGHTER_ANCHORS)
}

pub fn fight_links(doc: &Html) -> Vec<String> {
    unique_hrefs(doc, &FIGHT_ANCHORS)
}

fn unique_hrefs(doc: &Html, selector: &Selector) -> Vec<String> {
    let mut seen = HashSet::new();
    doc.select(selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(|h| Site::UfcStats.absolutize(h))
        .filter(|h| seen.insert(h.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_items_split_label_and_value() {
        let doc = Html::parse_document(
            r#"<ul><li class="b-list__box-list-item"><i class="b-list__box-item-title">Height:</i> 5' 11" </li>
               <li class="b-list__box-list-item"><i class="b-list__box-item-title">STANCE:</i> Orthodox</li>
               <li class="b-list__box-list-item">no label</li></ul>"#,
        );
        assert_eq!(
            info_items(&doc),
            [("height:".to_string(), "5' 11\"".to_string()), ("stance:".to_string(), "Orthodox".to_string())]
        );
    }

    #[test]
    fn nav_rows_and_targets() {
        let doc = Html::parse_document(
            r#"<table><tbody>
               <tr class="b-fight-details__table-row"><th>head</th></tr>
               <tr class="b-fight-details__table-row" onclick="doNav('http://ufcstats.com/fight-details/abc123')"><td>x</td></tr>
               </tbody></table>"#,
        );
        let rows: Vec<_> = nav_rows(&doc).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(nav_target(&rows[0]).as_deref(), Some("http://ufcstats.com/fight-details/abc123"));
    }

    #[test]
    fn links_deduplicate() {
        let doc = Html::parse_document(
            r#"<a href="http://ufcstats.com/fighter-details/a1">A</a><a href="http://ufcstats.com/fighter-details/a1 ">A</a>
               <a href="http://ufcstats.com/fighter-details/b2">B</a><a href="http://ufcstats.com/fight-details/f1">F</a>"#,
        );
        assert_eq!(fighter_links(&doc), ["http://ufcstats.com/fighter-details/a1", "http://ufcstats.com/fighter-details/b2"]);
        assert_eq!(fight_links(&doc), ["http://ufcstats.com/fight-details/f1"]);
    }

    #[test]
    fn index_url() {
        assert_eq!(fighter_index_url('q'), "http://ufcstats.com/statistics/fighters?char=q&page=all");
    }
}
