use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};
use scraper::Html;
use serde::Serialize;
use tracing::Instrument;

use crate::config::{CrawlSettings, parse_leagues};
use crate::espn::{
    EventRecord, FighterPage, FighterRecord, ScheduleEvent, build_bio, build_event_page, build_history,
    build_profile, build_schedule, build_stats, compose_fighter, merge_schedule, schedule_url,
};
use crate::fetch::{HttpFetcher, PageSource, Politeness, fetch_document};
use crate::progress::{ItemKind, ProgressLedger};
use crate::sink::JsonlSink;
use crate::telemetry::{self, ctx::LogCtx};
use crate::telemetry::ops::crawl_espn::{CrawlEspn, Phase as CrawlPhase};
use crate::telemetry::ops::retry::Phase as RetryPhase;

/// `mma espn ...`
#[derive(Args)]
pub struct EspnCmd {
    #[command(subcommand)]
    pub cmd: EspnSub,
}

#[derive(Subcommand)]
pub enum EspnSub {
    /// Crawl yearly schedules newest first, then each event and its fighters
    Crawl(CrawlArgs),
    /// Re-scrape failed events and fighters that are still under the attempt cap
    Retry(RetryArgs),
}

#[derive(Args)]
pub struct CrawlArgs {
    #[arg(long, default_value_t = 2025)] pub start_year: i32,
    #[arg(long, default_value_t = 1999)] pub end_year: i32,
    /// Stop after this many events have been saved
    #[arg(long)] pub limit_events: Option<usize>,
    /// Comma-separated league slugs, e.g. `ufc,pfl`
    #[arg(long, default_value = "ufc")] pub leagues: String,
    #[arg(long, default_value = "espn_out")] pub out_dir: PathBuf,
    #[arg(long)] pub min_delay: Option<f64>,
    #[arg(long)] pub max_delay: Option<f64>,
}

#[derive(Args)]
pub struct RetryArgs {
    #[arg(long, default_value = "espn_out")] pub out_dir: PathBuf,
    #[arg(long)] pub min_delay: Option<f64>,
    #[arg(long)] pub max_delay: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlPlan {
    pub start_year: i32,
    pub end_year: i32,
    pub limit_events: Option<usize>,
    pub leagues: Vec<String>,
}

impl CrawlPlan {
    fn allowed_leagues(&self) -> HashSet<String> {
        self.leagues.iter().cloned().collect()
    }
}

#[derive(Debug, Default, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub found: usize,
    pub saved: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct CrawlSummary {
    pub events: usize,
    pub fighters: usize,
    pub failed_events: usize,
    pub failed_fighters: usize,
    pub completed_events: usize,
    pub completed_fighters: usize,
    pub years: Vec<YearSummary>,
}

#[derive(Debug, Default, Serialize)]
pub struct RetrySummary {
    pub events_recovered: usize,
    pub fighters_recovered: usize,
    pub events_still_failing: usize,
    pub fighters_still_failing: usize,
}

pub async fn run(args: EspnCmd) -> Result<()> {
    let started = Instant::now();
    let run_id = uuid::Uuid::new_v4().to_string();
    match args.cmd {
        EspnSub::Crawl(a) => {
            let settings = CrawlSettings::resolve(a.out_dir, a.min_delay, a.max_delay);
            let fetcher = HttpFetcher::new(&settings.fetch)?;
            let mut leagues: Vec<String> = parse_leagues(&a.leagues).into_iter().collect();
            leagues.sort();
            let plan = CrawlPlan { start_year: a.start_year, end_year: a.end_year, limit_events: a.limit_events, leagues };
            let log = telemetry::crawl_espn();
            if telemetry::config::json_mode() {
                log.plan(&plan)?;
            }
            let summary = crawl(&fetcher, &settings.politeness(), &settings.out_dir, &plan).await?;
            log.result_timed(&summary, started, &run_id)?;
        }
        EspnSub::Retry(a) => {
            let settings = CrawlSettings::resolve(a.out_dir, a.min_delay, a.max_delay);
            let fetcher = HttpFetcher::new(&settings.fetch)?;
            let summary = retry(&fetcher, &settings.politeness(), &settings.out_dir).await?;
            telemetry::retry().result_timed(&summary, started, &run_id)?;
        }
    }
    Ok(())
}

/// Page fetches plus the ESPN builders; every method parses synchronously once the body is in.
struct EspnScraper<'a, S: ?Sized> {
    source: &'a S,
    polite: &'a Politeness,
}

impl<S: PageSource + ?Sized> EspnScraper<'_, S> {
    async fn page(&self, url: &str) -> Option<String> {
        fetch_document(self.source, url, self.polite).await
    }

    async fn schedule(&self, year: i32, allowed: &HashSet<String>) -> Result<Vec<ScheduleEvent>> {
        let url = schedule_url(year);
        let body = self.page(&url).await.ok_or_else(|| anyhow!("could not fetch schedule {url}"))?;
        Ok(build_schedule(&Html::parse_document(&body), year, allowed))
    }

    async fn event(&self, url: &str) -> Result<EventRecord> {
        let body = self.page(url).await.ok_or_else(|| anyhow!("no event data returned"))?;
        Ok(build_event_page(&Html::parse_document(&body), url))
    }

    /// Profile, bio, stats and history pages composed into one record; fails only when
    /// none of the four could be fetched.
    async fn fighter(&self, url: &str) -> Result<FighterRecord> {
        let profile = self.page(url).await.map(|b| build_profile(&Html::parse_document(&b), url));
        let bio = self
            .page(&FighterPage::Bio.url(url))
            .await
            .map(|b| build_bio(&Html::parse_document(&b), url));
        let stats = self
            .page(&FighterPage::Stats.url(url))
            .await
            .map(|b| build_stats(&Html::parse_document(&b), url));
        let history = self
            .page(&FighterPage::History.url(url))
            .await
            .map(|b| build_history(&Html::parse_document(&b), url));

        if profile.is_none() && bio.is_none() && stats.is_none() && history.is_none() {
            return Err(anyhow!("no fighter data returned"));
        }
        Ok(compose_fighter(url, profile, bio, stats, history))
    }
}

struct Outputs {
    events: JsonlSink,
    fighters: JsonlSink,
}

impl Outputs {
    fn open(out_dir: &Path) -> Result<Self> {
        Ok(Self {
            events: JsonlSink::in_dir(out_dir, "events.jsonl")?,
            fighters: JsonlSink::in_dir(out_dir, "fighters.jsonl")?,
        })
    }
}

/// Years from `start_year` down to `end_year`; the ledger is saved after every event and
/// once more at the end.
pub async fn crawl<S>(source: &S, polite: &Politeness, out_dir: &Path, plan: &CrawlPlan) -> Result<CrawlSummary>
where
    S: PageSource + ?Sized,
{
    let log = telemetry::crawl_espn();
    let root = log.root_span_kv([
        ("start_year", plan.start_year.to_string()),
        ("end_year", plan.end_year.to_string()),
        ("limit_events", format!("{:?}", plan.limit_events)),
        ("leagues", plan.leagues.join(",")),
        ("out_dir", out_dir.display().to_string()),
    ]);

    let scraper = EspnScraper { source, polite };
    let outputs = Outputs::open(out_dir)?;
    let mut ledger = ProgressLedger::load(out_dir);
    let mut summary = CrawlSummary::default();

    crawl_years(&scraper, &outputs, &mut ledger, plan, &mut summary, &log)
        .instrument(root)
        .await;

    let saved = {
        let _s = log.span(&CrawlPhase::SaveProgress).entered();
        ledger.save()
    };
    summary.failed_events = ledger.failed_count(ItemKind::Event);
    summary.failed_fighters = ledger.failed_count(ItemKind::Fighter);
    summary.completed_events = ledger.completed_count(ItemKind::Event);
    summary.completed_fighters = ledger.completed_count(ItemKind::Fighter);
    log.totals(summary.events, summary.fighters, summary.failed_events, summary.failed_fighters);

    saved?;
    Ok(summary)
}

async fn crawl_years<S>(
    scraper: &EspnScraper<'_, S>,
    outputs: &Outputs,
    ledger: &mut ProgressLedger,
    plan: &CrawlPlan,
    summary: &mut CrawlSummary,
    log: &LogCtx<CrawlEspn>,
) where
    S: PageSource + ?Sized,
{
    let allowed = plan.allowed_leagues();
    for year in (plan.end_year..=plan.start_year).rev() {
        let span = log.span_kv(&CrawlPhase::Year, [("year", year.to_string())]);
        let limit_reached = crawl_year(scraper, outputs, ledger, plan, &allowed, year, summary, log)
            .instrument(span)
            .await;
        if limit_reached {
            log.info(format!("Reached event limit of {}", summary.events));
            break;
        }
    }
}

/// One schedule page and its events; `true` once `limit_events` is reached.
#[allow(clippy::too_many_arguments)]
async fn crawl_year<S>(
    scraper: &EspnScraper<'_, S>,
    outputs: &Outputs,
    ledger: &mut ProgressLedger,
    plan: &CrawlPlan,
    allowed: &HashSet<String>,
    year: i32,
    summary: &mut CrawlSummary,
    log: &LogCtx<CrawlEspn>,
) -> bool
where
    S: PageSource + ?Sized,
{
    let schedule = scraper
        .schedule(year, allowed)
        .instrument(log.span(&CrawlPhase::Schedule))
        .await;
    let events = match schedule {
        Ok(events) => events,
        Err(e) => {
            log.error_kv("schedule failed", [("year", year.to_string()), ("error", format!("{e:#}"))]);
            return false;
        }
    };
    log.info(format!("Found {} events for year {}", events.len(), year));
    let mut year_summary = YearSummary { year, found: events.len(), saved: 0 };
    let mut limit_reached = false;

    for (i, sched) in events.iter().enumerate() {
        if plan.limit_events.is_some_and(|limit| summary.events >= limit) {
            limit_reached = true;
            break;
        }
        if ledger.is_completed(ItemKind::Event, &sched.url) {
            log.info_kv("↩️ skip completed event", [("url", sched.url.clone())]);
            continue;
        }
        if ledger.should_skip(ItemKind::Event, &sched.url) {
            log.warn_kv("↩️ skip event over attempt cap", [("url", sched.url.clone())]);
            continue;
        }

        log.info(format!("Processing event {}/{} for {}: {}", i + 1, events.len(), year, sched.name));
        let span = log.span_kv(&CrawlPhase::Event, [("url", sched.url.clone())]);
        match process_event(scraper, outputs, ledger, sched, summary, log).instrument(span).await {
            Ok(()) => year_summary.saved += 1,
            Err(e) => {
                ledger.record_failure(ItemKind::Event, &sched.url, &format!("{e:#}"));
            }
        }
        if let Err(e) = ledger.save() {
            log.error_kv("saving progress failed", [("error", format!("{e:#}"))]);
        }
    }
    summary.years.push(year_summary);
    if !limit_reached {
        log.info(format!("Completed year {year}"));
    }
    limit_reached
}

async fn process_event<S>(
    scraper: &EspnScraper<'_, S>,
    outputs: &Outputs,
    ledger: &mut ProgressLedger,
    sched: &ScheduleEvent,
    summary: &mut CrawlSummary,
    log: &LogCtx<CrawlEspn>,
) -> Result<()>
where
    S: PageSource + ?Sized,
{
    let event = merge_schedule(scraper.event(&sched.url).await?, sched);
    outputs.events.append(&event)?;
    ledger.mark_completed(ItemKind::Event, &sched.url);
    summary.events += 1;
    log.event_saved(
        event.name.as_deref().unwrap_or("Unknown"),
        event.date.as_deref().unwrap_or(""),
        event.fighter_urls.len(),
    );

    let total = event.fighter_urls.len();
    for (j, fighter_url) in event.fighter_urls.iter().enumerate() {
        if ledger.is_completed(ItemKind::Fighter, fighter_url) || ledger.should_skip(ItemKind::Fighter, fighter_url) {
            continue;
        }
        let span = log.span_kv(&CrawlPhase::Fighter, [("url", fighter_url.clone())]);
        let saved = async {
            let record = scraper.fighter(fighter_url).await?;
            outputs.fighters.append(&record)?;
            Ok::<_, anyhow::Error>(record)
        }
        .instrument(span)
        .await;

        match saved {
            Ok(record) => {
                ledger.mark_completed(ItemKind::Fighter, fighter_url);
                summary.fighters += 1;
                if j % 5 == 0 || j + 1 == total {
                    log.info(format!(
                        "  ✓ Fighter progress: {}/{} - Latest: {}",
                        j + 1,
                        total,
                        record.name.as_deref().unwrap_or("Unknown")
                    ));
                }
            }
            Err(e) => {
                ledger.record_failure(ItemKind::Fighter, fighter_url, &format!("{e:#}"));
            }
        }
    }
    Ok(())
}

/// Failed events are re-scraped from their event page alone, without the schedule row
/// or their fighters; failed fighters are re-scraped in full.
pub async fn retry<S>(source: &S, polite: &Politeness, out_dir: &Path) -> Result<RetrySummary>
where
    S: PageSource + ?Sized,
{
    let log = telemetry::retry();
    let root = log.root_span_kv([("out_dir", out_dir.display().to_string())]);

    let scraper = EspnScraper { source, polite };
    let outputs = Outputs::open(out_dir)?;
    let mut ledger = ProgressLedger::load(out_dir);
    let mut summary = RetrySummary::default();

    async {
        let events = ledger.retry_candidates(ItemKind::Event);
        log.info(format!("Retrying {} failed events", events.len()));
        for url in events {
            let span = log.span_kv(&RetryPhase::Events, [("url", url.clone())]);
            let saved = async {
                let event = scraper.event(&url).await?;
                outputs.events.append(&event)?;
                Ok::<_, anyhow::Error>(())
            }
            .instrument(span)
            .await;
            match saved {
                Ok(()) => {
                    ledger.mark_completed(ItemKind::Event, &url);
                    summary.events_recovered += 1;
                    log.info_kv("✓ Retry successful", [("url", url.clone())]);
                }
                Err(e) => {
                    ledger.record_failure(ItemKind::Event, &url, &format!("{e:#}"));
                }
            }
        }

        let fighters = ledger.retry_candidates(ItemKind::Fighter);
        log.info(format!("Retrying {} failed fighters", fighters.len()));
        for url in fighters {
            let span = log.span_kv(&RetryPhase::Fighters, [("url", url.clone())]);
            let saved = async {
                let record = scraper.fighter(&url).await?;
                outputs.fighters.append(&record)?;
                Ok::<_, anyhow::Error>(())
            }
            .instrument(span)
            .await;
            match saved {
                Ok(()) => {
                    ledger.mark_completed(ItemKind::Fighter, &url);
                    summary.fighters_recovered += 1;
                    log.info_kv("✓ Retry successful", [("url", url.clone())]);
                }
                Err(e) => {
                    ledger.record_failure(ItemKind::Fighter, &url, &format!("{e:#}"));
                }
            }
        }
    }
    .instrument(root)
    .await;

    ledger.save()?;
    summary.events_still_failing = ledger.failed_count(ItemKind::Event);
    summary.fighters_still_failing = ledger.failed_count(ItemKind::Fighter);
    log.totals(
        summary.events_recovered + summary.fighters_recovered,
        summary.events_still_failing + summary.fighters_still_failing,
    );
    Ok(summary)
}
