use std::collections::HashSet;
use std::path::PathBuf;

use crate::fetch::{FetchConfig, Politeness};

pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Settings shared by every crawl: where records go and how politely pages are fetched.
#[derive(Clone, Debug)]
pub struct CrawlSettings {
    pub out_dir: PathBuf,
    pub fetch: FetchConfig,
}

impl CrawlSettings {
    /// `MMA_*` environment first, then the command's `--min-delay`/`--max-delay`.
    pub fn resolve(out_dir: PathBuf, min_delay: Option<f64>, max_delay: Option<f64>) -> Self {
        Self { out_dir, fetch: FetchConfig::from_env().with_delays(min_delay, max_delay) }
    }

    pub fn politeness(&self) -> Politeness {
        Politeness::from_config(&self.fetch)
    }
}

/// `"UFC, pfl,,"` → `{"ufc", "pfl"}`.
pub fn parse_leagues(csv: &str) -> HashSet<String> {
    csv.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Index letters to crawl, lower-cased, first occurrence order; `all` means a–z.
pub fn parse_letters(arg: &str) -> Vec<char> {
    let arg = arg.trim();
    let source = if arg.eq_ignore_ascii_case("all") { ALPHABET } else { arg };
    let mut seen = HashSet::new();
    source
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_lowercase())
        .filter(|c| seen.insert(*c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leagues_are_trimmed_and_lowercased() {
        let got = parse_leagues(" UFC, pfl,,Bellator ");
        let want: HashSet<String> = ["ufc", "pfl", "bellator"].into_iter().map(String::from).collect();
        assert_eq!(got, want);
        assert!(parse_leagues("").is_empty());
    }

    #[test]
    fn letters() {
        assert_eq!(parse_letters("qAq9b"), ['q', 'a', 'b']);
        assert_eq!(parse_letters("all").len(), 26);
        assert!(parse_letters("").is_empty());
    }
}
