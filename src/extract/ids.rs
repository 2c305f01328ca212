use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static NUMERIC_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/id/(\d+)").expect("numeric id pattern"));

/// Source site. Each one has a fixed URL scheme and ID flavor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Site {
    /// `/mma/fighter/_/id/3022677/robert-whittaker` style, numeric IDs.
    Espn,
    /// `/fighter-details/07225ba28ae309b6` style, opaque hash as the last segment.
    UfcStats,
}

impl Site {
    pub fn base_url(self) -> &'static str {
        match self {
            Site::Espn => "https://www.espn.com",
            Site::UfcStats => "http://ufcstats.com",
        }
    }

    /// Entity ID embedded in `url`, or an empty string when there isn't one.
    pub fn extract_id(self, url: &str) -> String {
        if url.is_empty() { return String::new(); }
        match self {
            Site::Espn => NUMERIC_ID
                .captures(url)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            Site::UfcStats => url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Resolve a possibly-relative href against the site root.
    pub fn absolutize(self, href: &str) -> String {
        let href = href.trim();
        match Url::parse(self.base_url()).and_then(|base| base.join(href)) {
            Ok(u) => u.to_string(),
            Err(_) => href.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn espn_numeric_ids() {
        assert_eq!(Site::Espn.extract_id("https://www.espn.com/mma/fighter/_/id/3022677/robert-whittaker"), "3022677");
        assert_eq!(Site::Espn.extract_id("/mma/fightcenter/_/id/600041207/league/ufc"), "600041207");
        assert_eq!(Site::Espn.extract_id("https://www.espn.com/mma/schedule"), "");
        assert_eq!(Site::Espn.extract_id(""), "");
    }

    #[test]
    fn ufcstats_last_segment() {
        assert_eq!(Site::UfcStats.extract_id("http://ufcstats.com/fighter-details/07225ba28ae309b6"), "07225ba28ae309b6");
        assert_eq!(Site::UfcStats.extract_id("http://ufcstats.com/event-details/daff32bc96d1eabf/"), "daff32bc96d1eabf");
        assert_eq!(Site::UfcStats.extract_id(""), "");
    }

    #[test]
    fn flavors_do_not_cross() {
        // A hash-style URL carries no numeric /id/ segment.
        assert_eq!(Site::Espn.extract_id("http://ufcstats.com/fighter-details/07225ba28ae309b6"), "");
        // The ESPN slug is the last segment, not the ID.
        assert_eq!(Site::UfcStats.extract_id("https://www.espn.com/mma/fighter/_/id/3022677/robert-whittaker"), "robert-whittaker");
    }

    #[test]
    fn absolutize_relative_and_absolute() {
        assert_eq!(Site::Espn.absolutize("/mma/fighter/_/id/1/x"), "https://www.espn.com/mma/fighter/_/id/1/x");
        assert_eq!(Site::Espn.absolutize("https://other.test/a"), "https://other.test/a");
    }
}
