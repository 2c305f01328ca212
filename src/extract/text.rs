use deunicode::deunicode_char;
use scraper::ElementRef;

/// Collapse every whitespace run to a single space and trim both ends.
pub fn clean(s: &str) -> String {
    let mut buf = String::with_capacity(s.len());
    let mut in_ws = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !in_ws {
                if !buf.is_empty() { buf.push(' '); }
                in_ws = true;
            }
        } else {
            buf.push(ch);
            in_ws = false;
        }
    }
    buf.trim_end().to_string()
}

pub fn clean_opt(s: Option<&str>) -> String {
    s.map(clean).unwrap_or_default()
}

/// Fold accented letters to their ASCII base so "Pérez" and "Perez" compare equal.
/// Combining marks of already-decomposed text are dropped.
pub fn strip_accents(s: &str) -> String {
    s.chars().filter(|c| !is_combining_mark(*c)).map(fold_char).collect()
}

fn is_combining_mark(ch: char) -> bool {
    matches!(ch,
        '\u{0300}'..='\u{036F}'
        | '\u{1AB0}'..='\u{1AFF}'
        | '\u{1DC0}'..='\u{1DFF}'
        | '\u{20D0}'..='\u{20FF}'
        | '\u{FE20}'..='\u{FE2F}')
}

fn fold_char(ch: char) -> String {
    if ch.is_ascii() || !ch.is_alphabetic() { return ch.to_string(); }
    match deunicode_char(ch) {
        Some(base) if !base.is_empty() && base.chars().all(|c| c.is_ascii_alphabetic()) => base.to_string(),
        _ => ch.to_string(),
    }
}

/// Canonical field name for a table header cell.
///
/// Lower-cases, drops every non-letter, then folds the fixed synonym set
/// (`Res.`/`Result`, `Decision`/`Method`, `Rnd`/`Round`). Unknown headers come
/// back in their stripped form.
pub fn normalize_header(s: &str) -> String {
    let stripped: String = s
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();
    match stripped.as_str() {
        "date" => "date",
        "opponent" => "opponent",
        "res" | "result" => "result",
        "decision" | "method" => "method",
        "rnd" | "round" => "round",
        "time" => "time",
        "event" => "event",
        other => other,
    }
    .to_string()
}

/// Visible text of an element, whitespace-collapsed.
pub fn element_text(el: &ElementRef<'_>) -> String {
    clean(&el.text().collect::<Vec<_>>().join(" "))
}

/// True for the dash placeholders the sites put in empty cells.
pub fn is_placeholder(s: &str) -> bool {
    matches!(s.trim(), "" | "-" | "--" | "---" | "\u{2014}" | "\u{2013}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_collapses_and_trims() {
        assert_eq!(clean("  Robert \n\t Whittaker  "), "Robert Whittaker");
        assert_eq!(clean(""), "");
        assert_eq!(clean_opt(None), "");
    }

    #[test]
    fn clean_is_idempotent() {
        for s in ["a  b", " x\u{a0}y ", "\n\n", "UFC 308:  Topuria vs. Holloway"] {
            let once = clean(s);
            assert_eq!(clean(&once), once);
        }
    }

    #[test]
    fn strip_accents_folds_diacritics() {
        assert_eq!(strip_accents("José Aldo"), "Jose Aldo");
        assert_eq!(strip_accents("Jiří Procházka"), "Jiri Prochazka");
        assert_eq!(strip_accents("plain"), "plain");
    }

    #[test]
    fn strip_accents_drops_decomposed_marks() {
        assert_eq!(strip_accents("Jose\u{301} Aldo"), "Jose Aldo");
        assert_eq!(strip_accents("Jir\u{30C}i\u{301} Procha\u{301}zka"), "Jiri Prochazka");
        assert_eq!(strip_accents("Jose\u{301} Aldo"), strip_accents("José Aldo"));
    }

    #[test]
    fn header_synonyms_fold() {
        assert_eq!(normalize_header("Res."), "result");
        assert_eq!(normalize_header("Result"), "result");
        assert_eq!(normalize_header("Decision"), "method");
        assert_eq!(normalize_header("Method"), "method");
        assert_eq!(normalize_header("Rnd"), "round");
        assert_eq!(normalize_header(" Round "), "round");
    }

    #[test]
    fn unknown_headers_pass_through_stripped() {
        assert_eq!(normalize_header("SDBL/A"), "sdbla");
        assert_eq!(normalize_header("TK ACC"), "tkacc");
        assert_eq!(normalize_header(""), "");
    }

    #[test]
    fn placeholders() {
        assert!(is_placeholder("-"));
        assert!(is_placeholder("\u{2014}"));
        assert!(is_placeholder("  "));
        assert!(!is_placeholder("0"));
    }
}
