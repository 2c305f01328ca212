use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Failed items at or past this many attempts are left alone by crawls and retries.
pub const MAX_ATTEMPTS: u32 = 3;

const PROGRESS_FILE: &str = "progress.json";
const FAILED_EVENTS_FILE: &str = "failed_events.json";
const FAILED_FIGHTERS_FILE: &str = "failed_fighters.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Event,
    Fighter,
}

impl ItemKind {
    fn label(self) -> &'static str {
        match self {
            ItemKind::Event => "event",
            ItemKind::Fighter => "fighter",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailedItem {
    pub url: String,
    pub error: String,
    pub timestamp: String,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt: Option<String>,
}

#[derive(Default, Serialize, Deserialize)]
struct ProgressFile {
    #[serde(default)]
    completed_events: Vec<String>,
    #[serde(default)]
    completed_fighters: Vec<String>,
    #[serde(default)]
    last_updated: Option<String>,
}

#[derive(Default, Serialize, Deserialize)]
struct FailedEventsFile {
    #[serde(default)]
    events: Vec<FailedItem>,
}

#[derive(Default, Serialize, Deserialize)]
struct FailedFightersFile {
    #[serde(default)]
    fighters: Vec<FailedItem>,
}

/// Completed and failed URLs for one output directory.
#[derive(Debug)]
pub struct ProgressLedger {
    dir: PathBuf,
    completed_events: BTreeSet<String>,
    completed_fighters: BTreeSet<String>,
    failed_events: Vec<FailedItem>,
    failed_fighters: Vec<FailedItem>,
}

impl ProgressLedger {
    /// Missing files start empty; unreadable ones are logged and start empty too.
    pub fn load(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let progress: ProgressFile = read_or_default(&dir.join(PROGRESS_FILE));
        let failed_events: FailedEventsFile = read_or_default(&dir.join(FAILED_EVENTS_FILE));
        let failed_fighters: FailedFightersFile = read_or_default(&dir.join(FAILED_FIGHTERS_FILE));

        let ledger = Self {
            dir,
            completed_events: progress.completed_events.into_iter().collect(),
            completed_fighters: progress.completed_fighters.into_iter().collect(),
            failed_events: failed_events.events,
            failed_fighters: failed_fighters.fighters,
        };
        info!(
            completed_events = ledger.completed_events.len(),
            completed_fighters = ledger.completed_fighters.len(),
            failed_events = ledger.failed_events.len(),
            failed_fighters = ledger.failed_fighters.len(),
            "progress loaded"
        );
        ledger
    }

    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| format!("creating {}", self.dir.display()))?;
        let progress = ProgressFile {
            completed_events: self.completed_events.iter().cloned().collect(),
            completed_fighters: self.completed_fighters.iter().cloned().collect(),
            last_updated: Some(Utc::now().to_rfc3339()),
        };
        write_json(&self.dir.join(PROGRESS_FILE), &progress)?;
        write_json(&self.dir.join(FAILED_EVENTS_FILE), &FailedEventsFile { events: self.failed_events.clone() })?;
        write_json(&self.dir.join(FAILED_FIGHTERS_FILE), &FailedFightersFile { fighters: self.failed_fighters.clone() })?;
        Ok(())
    }

    fn completed(&self, kind: ItemKind) -> &BTreeSet<String> {
        match kind {
            ItemKind::Event => &self.completed_events,
            ItemKind::Fighter => &self.completed_fighters,
        }
    }

    fn failed(&self, kind: ItemKind) -> &Vec<FailedItem> {
        match kind {
            ItemKind::Event => &self.failed_events,
            ItemKind::Fighter => &self.failed_fighters,
        }
    }

    fn failed_mut(&mut self, kind: ItemKind) -> &mut Vec<FailedItem> {
        match kind {
            ItemKind::Event => &mut self.failed_events,
            ItemKind::Fighter => &mut self.failed_fighters,
        }
    }

    pub fn is_completed(&self, kind: ItemKind, url: &str) -> bool {
        self.completed(kind).contains(url)
    }

    /// Marks `url` done and forgets any earlier failure for it.
    pub fn mark_completed(&mut self, kind: ItemKind, url: &str) {
        match kind {
            ItemKind::Event => self.completed_events.insert(url.to_string()),
            ItemKind::Fighter => self.completed_fighters.insert(url.to_string()),
        };
        self.failed_mut(kind).retain(|f| f.url != url);
    }

    /// Records a failure and returns the attempt count for `url`.
    pub fn record_failure(&mut self, kind: ItemKind, url: &str, error: &str) -> u32 {
        let now = Utc::now().to_rfc3339();
        let failed = self.failed_mut(kind);
        if let Some(existing) = failed.iter_mut().find(|f| f.url == url) {
            existing.attempts += 1;
            existing.last_error = Some(error.to_string());
            existing.last_attempt = Some(now);
            warn!(kind = kind.label(), url, attempts = existing.attempts, error, "failed again");
            return existing.attempts;
        }
        failed.push(FailedItem {
            url: url.to_string(),
            error: error.to_string(),
            timestamp: now,
            attempts: 1,
            last_error: None,
            last_attempt: None,
        });
        warn!(kind = kind.label(), url, error, "failed");
        1
    }

    pub fn attempts(&self, kind: ItemKind, url: &str) -> u32 {
        self.failed(kind).iter().find(|f| f.url == url).map(|f| f.attempts).unwrap_or(0)
    }

    /// True once `url` has failed `MAX_ATTEMPTS` times.
    pub fn should_skip(&self, kind: ItemKind, url: &str) -> bool {
        self.attempts(kind, url) >= MAX_ATTEMPTS
    }

    /// Failed URLs still under the attempt cap, in the order they first failed.
    pub fn retry_candidates(&self, kind: ItemKind) -> Vec<String> {
        self.failed(kind)
            .iter()
            .filter(|f| f.attempts < MAX_ATTEMPTS)
            .map(|f| f.url.clone())
            .collect()
    }

    pub fn completed_count(&self, kind: ItemKind) -> usize {
        self.completed(kind).len()
    }

    pub fn failed_count(&self, kind: ItemKind) -> usize {
        self.failed(kind).len()
    }
}

fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }
    let parsed = fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|s| serde_json::from_str(&s).map_err(anyhow::Error::from));
    match parsed {
        Ok(v) => v,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not load progress file; starting empty");
            T::default()
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EV: &str = "https://www.espn.com/mma/fightcenter/_/id/600041000/league/ufc";
    const FI: &str = "https://www.espn.com/mma/fighter/_/id/3022677/conor-mcgregor";

    #[test]
    fn failures_accumulate_attempts_until_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = ProgressLedger::load(dir.path());
        assert_eq!(ledger.record_failure(ItemKind::Event, EV, "timeout"), 1);
        assert!(!ledger.should_skip(ItemKind::Event, EV));
        assert_eq!(ledger.retry_candidates(ItemKind::Event), [EV]);

        ledger.record_failure(ItemKind::Event, EV, "timeout");
        assert_eq!(ledger.record_failure(ItemKind::Event, EV, "404"), 3);
        assert!(ledger.should_skip(ItemKind::Event, EV));
        assert!(ledger.retry_candidates(ItemKind::Event).is_empty());
        assert!(!ledger.should_skip(ItemKind::Fighter, EV));
        assert_eq!(ledger.failed_count(ItemKind::Event), 1);
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = ProgressLedger::load(dir.path());
        ledger.mark_completed(ItemKind::Event, EV);
        ledger.record_failure(ItemKind::Fighter, FI, "no fighter data");
        ledger.record_failure(ItemKind::Fighter, FI, "still nothing");
        ledger.save().unwrap();

        let reloaded = ProgressLedger::load(dir.path());
        assert!(reloaded.is_completed(ItemKind::Event, EV));
        assert_eq!(reloaded.attempts(ItemKind::Fighter, FI), 2);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(FAILED_FIGHTERS_FILE)).unwrap()).unwrap();
        assert_eq!(raw["fighters"][0]["error"], "no fighter data");
        assert_eq!(raw["fighters"][0]["last_error"], "still nothing");
        let progress: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(PROGRESS_FILE)).unwrap()).unwrap();
        assert!(progress["last_updated"].is_string());
    }

    #[test]
    fn completion_clears_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = ProgressLedger::load(dir.path());
        ledger.record_failure(ItemKind::Fighter, FI, "boom");
        ledger.mark_completed(ItemKind::Fighter, FI);
        assert_eq!(ledger.attempts(ItemKind::Fighter, FI), 0);
        assert_eq!(ledger.completed_count(ItemKind::Fighter), 1);
    }

    #[test]
    fn corrupt_files_start_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PROGRESS_FILE), "{ not json").unwrap();
        fs::write(dir.path().join(FAILED_EVENTS_FILE), r#"{"events": [{"url": "x"}]}"#).unwrap();
        let ledger = ProgressLedger::load(dir.path());
        assert_eq!(ledger.completed_count(ItemKind::Event), 0);
        assert_eq!(ledger.failed_count(ItemKind::Event), 0);
    }

    #[test]
    fn reads_files_without_optional_keys() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(FAILED_EVENTS_FILE),
            r#"{"events": [{"url": "u1", "error": "e", "timestamp": "2024-01-01T00:00:00", "attempts": 3}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join(PROGRESS_FILE), r#"{"completed_events": ["u2"]}"#).unwrap();
        let ledger = ProgressLedger::load(dir.path());
        assert!(ledger.should_skip(ItemKind::Event, "u1"));
        assert!(ledger.is_completed(ItemKind::Event, "u2"));
    }
}
