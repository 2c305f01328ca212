use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::Datelike;
use clap::{Args, ValueEnum};
use scraper::Html;
use serde::Serialize;
use serde_json::Value;

use crate::config::parse_leagues;
use crate::espn;
use crate::telemetry;
use crate::telemetry::ops::parse::Phase;
use crate::ufcstats;

/// Page builders runnable against a saved HTML file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    EspnSchedule,
    EspnEvent,
    EspnFighterProfile,
    EspnFighterBio,
    EspnFighterStats,
    EspnFighterHistory,
    UfcFighter,
    UfcEvent,
    UfcFight,
}

/// `mma parse <kind> <file>`
#[derive(Args)]
pub struct ParseCmd {
    #[arg(value_enum)] pub kind: PageKind,
    pub file: PathBuf,
    /// URL the page was fetched from; IDs are derived from it
    #[arg(long, default_value = "")] pub url: String,
    /// Year for schedule dates (defaults to the current year)
    #[arg(long)] pub year: Option<i32>,
    /// League filter for schedules; empty keeps every league
    #[arg(long, default_value = "")] pub leagues: String,
}

#[derive(Debug, Serialize)]
struct ParseResult {
    kind: PageKind,
    file: String,
    record: Value,
}

pub async fn run(args: ParseCmd) -> Result<()> {
    let started = Instant::now();
    let log = telemetry::parse();
    let _root = log.root_span_kv([("kind", format!("{:?}", args.kind)), ("file", args.file.display().to_string())]).entered();

    let html = {
        let _s = log.span(&Phase::Read).entered();
        fs::read_to_string(&args.file).with_context(|| format!("reading {}", args.file.display()))?
    };
    let year = args.year.unwrap_or_else(|| chrono::Utc::now().year());
    let record = {
        let _s = log.span(&Phase::Build).entered();
        build_record(args.kind, &html, &args.url, year, &args.leagues)?
    };

    if telemetry::config::json_mode() {
        let result = ParseResult { kind: args.kind, file: args.file.display().to_string(), record };
        let run_id = uuid::Uuid::new_v4().to_string();
        return log.result_timed(&result, started, &run_id);
    }
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &record)?;
    writeln!(out)?;
    Ok(())
}

/// Runs one builder over `html` and returns its record as JSON.
pub fn build_record(kind: PageKind, html: &str, url: &str, year: i32, leagues: &str) -> Result<Value> {
    let doc = Html::parse_document(html);
    let value = match kind {
        PageKind::EspnSchedule => serde_json::to_value(espn::build_schedule(&doc, year, &parse_leagues(leagues)))?,
        PageKind::EspnEvent => serde_json::to_value(espn::build_event_page(&doc, url))?,
        PageKind::EspnFighterProfile => serde_json::to_value(espn::build_profile(&doc, url))?,
        PageKind::EspnFighterBio => serde_json::to_value(espn::build_bio(&doc, url))?,
        PageKind::EspnFighterStats => serde_json::to_value(espn::build_stats(&doc, url))?,
        PageKind::EspnFighterHistory => serde_json::to_value(espn::build_history(&doc, url))?,
        PageKind::UfcFighter => match ufcstats::build_fighter(&doc, url) {
            Some(f) => serde_json::to_value(f)?,
            None => bail!("no fighter title on page"),
        },
        PageKind::UfcEvent => match ufcstats::build_event(&doc, url) {
            Some(e) => serde_json::to_value(e)?,
            None => bail!("no event title on page"),
        },
        PageKind::UfcFight => match ufcstats::build_fight(&doc, url) {
            Some(f) => serde_json::to_value(f)?,
            None => bail!("no fight details on page"),
        },
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEDULE: &str = r#"<html><body><table class="Table">
      <thead><tr><th>Date</th><th>Event</th><th>Location</th><th>Fight of the Night</th></tr></thead>
      <tbody>
        <tr><td>Mar 2</td><td><a href="/mma/fightcenter/_/id/600039000/league/ufc">UFC 299</a></td><td>Miami, FL</td><td>-</td></tr>
        <tr><td>Mar 8</td><td><a href="/mma/fightcenter/_/id/600039100/league/pfl">PFL Europe</a></td><td>Paris</td><td></td></tr>
      </tbody></table></body></html>"#;

    #[test]
    fn schedule_kind_honors_year_and_leagues() {
        let all = build_record(PageKind::EspnSchedule, SCHEDULE, "", 2024, "").unwrap();
        assert_eq!(all.as_array().unwrap().len(), 2);

        let ufc = build_record(PageKind::EspnSchedule, SCHEDULE, "", 2024, "UFC").unwrap();
        let rows = ufc.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["date"], "2024-03-02");
        assert!(rows[0]["fight_of_the_night"].is_null());
    }

    #[test]
    fn ufc_kinds_fail_without_a_root() {
        let err = build_record(PageKind::UfcFight, "<html><body></body></html>", "", 2024, "").unwrap_err();
        assert!(err.to_string().contains("fight"));
        assert!(build_record(PageKind::UfcFighter, "<p>x</p>", "", 2024, "").is_err());
    }

    #[test]
    fn espn_profile_takes_id_from_url() {
        let html = "<html><head><title>Amanda Nunes (Bantamweight) | ESPN</title></head></html>";
        let url = "https://www.espn.com/mma/fighter/_/id/2504169/amanda-nunes";
        let v = build_record(PageKind::EspnFighterProfile, html, url, 2024, "").unwrap();
        assert_eq!(v["id"], "2504169");
        assert_eq!(v["name"], "Amanda Nunes");
    }

    #[test]
    fn kind_names_are_kebab_case() {
        let v = PageKind::from_str("espn-fighter-history", true).unwrap();
        assert_eq!(v, PageKind::EspnFighterHistory);
        assert_eq!(serde_json::to_value(PageKind::UfcFight).unwrap(), "ufc-fight");
    }
}
