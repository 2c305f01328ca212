use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::ids::Site;
use super::text::{clean, element_text, is_placeholder, normalize_header};

/// Keys every site agrees on; headers that fold to one of these are stored under it.
pub const CANONICAL_FIELDS: [&str; 7] = ["date", "opponent", "result", "method", "round", "time", "event"];

static HEAD_CELLS: LazyLock<Selector> = LazyLock::new(|| sel("thead th"));
static HEAD: LazyLock<Selector> = LazyLock::new(|| sel("thead"));
static BODY_ROWS: LazyLock<Selector> = LazyLock::new(|| sel("tbody tr"));
static TABLES: LazyLock<Selector> = LazyLock::new(|| sel("table"));
static RESPONSIVE_BOXES: LazyLock<Selector> = LazyLock::new(|| sel("div.ResponsiveTable"));
static BOX_TITLE: LazyLock<Selector> = LazyLock::new(|| sel(".Table__Title"));
static BOX_TABLE: LazyLock<Selector> = LazyLock::new(|| sel("table.Table"));
static GAME_LINK: LazyLock<Selector> = LazyLock::new(|| sel("a[data-game-link]"));
static LINK: LazyLock<Selector> = LazyLock::new(|| sel("a[href]"));

pub(crate) fn sel(s: &str) -> Selector {
    Selector::parse(s).unwrap_or_else(|e| panic!("invalid selector {s:?}: {e:?}"))
}

/// Header text → column index for one table.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl HeaderMap {
    pub fn from_table(table: ElementRef<'_>) -> Self {
        Self::from_labels(table.select(&HEAD_CELLS).map(|th| element_text(&th)))
    }

    /// Keys are lower-cased cleaned labels; on duplicates the first column wins.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels: Vec<String> = labels.into_iter().map(|l| clean(l.as_ref())).collect();
        let mut index = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            index.entry(label.to_lowercase()).or_insert(i);
        }
        HeaderMap { labels, index }
    }

    pub fn get(&self, key: &str) -> Option<usize> { self.index.get(&key.to_lowercase()).copied() }

    /// First column (left to right) whose lower-cased label satisfies `pred`.
    pub fn position(&self, pred: impl Fn(&str) -> bool) -> Option<usize> {
        self.labels.iter().position(|l| pred(&l.to_lowercase()))
    }

    pub fn label(&self, idx: usize) -> Option<&str> { self.labels.get(idx).map(String::as_str) }
    pub fn len(&self) -> usize { self.labels.len() }
    pub fn is_empty(&self) -> bool { self.labels.is_empty() }

    /// Row-record key for column `idx`: the canonical name when the label folds to one,
    /// the verbatim label otherwise, `col_<idx>` past the end of the header.
    pub fn column_key(&self, idx: usize) -> String {
        match self.label(idx) {
            Some(label) => {
                let canonical = normalize_header(label);
                if CANONICAL_FIELDS.contains(&canonical.as_str()) { canonical } else { label.to_string() }
            }
            None => format!("col_{idx}"),
        }
    }
}

/// One table row keyed by column. Values are `None` for empty or dash cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowRecord {
    fields: Vec<(String, Option<String>)>,
}

impl RowRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == key).and_then(|(_, v)| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool { self.fields.iter().any(|(k, _)| k == key) }

    /// Overwrites in place when `key` exists, so column order stays stable.
    pub fn set(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize { self.fields.len() }
    pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

/// Body rows of `table`, top to bottom, as row records. Rows without cells are skipped
/// and a repeated column key keeps the leftmost cell.
///
/// `opponent` and `event` columns also yield `<col>_url` and `<col>_id` when the cell
/// carries a link.
pub fn read_rows<'a>(table: ElementRef<'a>, headers: &'a HeaderMap, site: Site) -> impl Iterator<Item = RowRecord> + 'a {
    table.select(&BODY_ROWS).filter_map(move |tr| read_row(tr, headers, site))
}

fn read_row(tr: ElementRef<'_>, headers: &HeaderMap, site: Site) -> Option<RowRecord> {
    let cells: Vec<ElementRef<'_>> = tr
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "td")
        .collect();
    if cells.is_empty() { return None; }

    let mut row = RowRecord::default();
    for (i, td) in cells.iter().enumerate() {
        let key = headers.column_key(i);
        if row.contains_key(&key) { continue; }
        match key.as_str() {
            "opponent" | "event" => read_link_cell(&mut row, &key, td, site),
            _ => row.set(key, cell_value(td)),
        }
    }
    Some(row)
}

fn read_link_cell(row: &mut RowRecord, key: &str, td: &ElementRef<'_>, site: Site) {
    let anchor = if key == "event" { td.select(&GAME_LINK).next().or_else(|| td.select(&LINK).next()) } else { td.select(&LINK).next() };
    let Some(a) = anchor else {
        row.set(key, cell_value(td));
        return;
    };
    let text = element_text(&a);
    let name = if is_placeholder(&text) { cell_value(td) } else { Some(text) };
    let url = a.value().attr("href").map(|h| site.absolutize(h));
    let id = url.as_deref().map(|u| site.extract_id(u)).filter(|id| !id.is_empty());
    row.set(key, name);
    row.set(format!("{key}_url"), url);
    row.set(format!("{key}_id"), id);
}

pub fn cell_value(td: &ElementRef<'_>) -> Option<String> {
    let text = element_text(td);
    if is_placeholder(&text) { None } else { Some(text) }
}

/// Lower-cased text of the table's `<thead>`, words separated by single spaces.
pub fn header_text(table: ElementRef<'_>) -> Option<String> {
    table.select(&HEAD).next().map(|h| element_text(&h).to_lowercase())
}

/// Table inside the titled responsive box whose visible title equals `title_lower`.
pub fn find_table_by_title<'a>(doc: &'a Html, title_lower: &str) -> Option<ElementRef<'a>> {
    doc.select(&RESPONSIVE_BOXES).find_map(|bx| {
        let title = bx.select(&BOX_TITLE).next()?;
        if element_text(&title).to_lowercase() != title_lower { return None; }
        bx.select(&BOX_TABLE).next().or_else(|| bx.select(&TABLES).next())
    })
}

/// First table whose header contains every keyword (case-insensitive).
pub fn find_table_by_header_keywords<'a>(doc: &'a Html, keywords: &[&str]) -> Option<ElementRef<'a>> {
    doc.select(&TABLES).find(|t| {
        header_text(*t).is_some_and(|h| keywords.iter().all(|k| h.contains(&k.to_lowercase())))
    })
}

/// First `<table>` that starts after `anchor` opens, in document order.
pub fn first_table_after<'a>(doc: &'a Html, anchor: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    let mut passed = false;
    for node in doc.root_element().descendants() {
        if node.id() == anchor.id() {
            passed = true;
            continue;
        }
        if !passed { continue; }
        if let Some(el) = ElementRef::wrap(node) {
            if el.value().name() == "table" { return Some(el); }
        }
    }
    None
}
