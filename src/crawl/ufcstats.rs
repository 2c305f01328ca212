use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use clap::{Args, Subcommand};
use scraper::Html;
use serde::Serialize;
use tracing::Instrument;

use crate::config::{CrawlSettings, parse_letters};
use crate::extract::Site;
use crate::fetch::{HttpFetcher, PageSource, Politeness, fetch_document};
use crate::progress::SeenSet;
use crate::sink::JsonlSink;
use crate::telemetry::{self, ctx::LogCtx};
use crate::telemetry::ops::crawl_ufc::{CrawlUfc, Phase};
use crate::ufcstats::{build_event, build_fight, build_fighter, fight_links, fighter_index_url, fighter_links, UfcFighter};

/// `mma ufc ...`
#[derive(Args)]
pub struct UfcCmd {
    #[command(subcommand)]
    pub cmd: UfcSub,
}

#[derive(Subcommand)]
pub enum UfcSub {
    /// Crawl fighters by index letter, then their fights and the events those fights belong to
    Crawl(UfcCrawlArgs),
}

#[derive(Args)]
pub struct UfcCrawlArgs {
    /// Index letters to crawl (`abc`), or `all`
    #[arg(long, default_value = "q")] pub letters: String,
    #[arg(long, default_value = "ufc_out")] pub out_dir: PathBuf,
    #[arg(long)] pub min_delay: Option<f64>,
    #[arg(long)] pub max_delay: Option<f64>,
}

#[derive(Debug, Serialize)]
struct UfcPlan<'a> {
    letters: &'a [char],
    out_dir: String,
}

#[derive(Debug, Default, Serialize)]
pub struct UfcSummary {
    pub letters: usize,
    pub fighters: usize,
    pub fights: usize,
    pub events: usize,
    pub errors: usize,
}

pub async fn run(args: UfcCmd) -> Result<()> {
    let started = Instant::now();
    let run_id = uuid::Uuid::new_v4().to_string();
    match args.cmd {
        UfcSub::Crawl(a) => {
            let letters = parse_letters(&a.letters);
            let settings = CrawlSettings::resolve(a.out_dir, a.min_delay, a.max_delay);
            let fetcher = HttpFetcher::new(&settings.fetch)?;
            let log = telemetry::crawl_ufc();
            if telemetry::config::json_mode() {
                log.plan(&UfcPlan { letters: &letters, out_dir: settings.out_dir.display().to_string() })?;
            }
            let summary = crawl(&fetcher, &settings.politeness(), &settings.out_dir, &letters).await?;
            log.result_timed(&summary, started, &run_id)?;
        }
    }
    Ok(())
}

struct Outputs {
    fighters: JsonlSink,
    fights: JsonlSink,
    events: JsonlSink,
}

#[derive(Default)]
struct Seen {
    fighters: SeenSet,
    fights: SeenSet,
    events: SeenSet,
}

struct UfcCrawler<'a, S: ?Sized> {
    source: &'a S,
    polite: &'a Politeness,
    out: Outputs,
    seen: Seen,
    summary: UfcSummary,
    log: LogCtx<CrawlUfc>,
}

/// Each fighter, fight and event is fetched at most once per run, keyed by its URL hash.
pub async fn crawl<S>(source: &S, polite: &Politeness, out_dir: &Path, letters: &[char]) -> Result<UfcSummary>
where
    S: PageSource + ?Sized,
{
    let log = telemetry::crawl_ufc();
    let root = log.root_span_kv([
        ("letters", letters.iter().collect::<String>()),
        ("out_dir", out_dir.display().to_string()),
    ]);
    let out = Outputs {
        fighters: JsonlSink::in_dir(out_dir, "fighters.jsonl")?,
        fights: JsonlSink::in_dir(out_dir, "fights.jsonl")?,
        events: JsonlSink::in_dir(out_dir, "events.jsonl")?,
    };
    let mut crawler = UfcCrawler { source, polite, out, seen: Seen::default(), summary: UfcSummary::default(), log };

    async {
        for &letter in letters {
            let span = crawler.log.span_kv(&Phase::Letter, [("letter", letter.to_string())]);
            crawler.letter(letter).instrument(span).await?;
            crawler.summary.letters += 1;
        }
        Ok::<_, anyhow::Error>(())
    }
    .instrument(root)
    .await?;

    let s = &crawler.summary;
    crawler.log.totals(s.fighters, s.fights, s.events, s.errors);
    Ok(crawler.summary)
}

impl<S: PageSource + ?Sized> UfcCrawler<'_, S> {
    async fn page(&self, url: &str) -> Option<String> {
        fetch_document(self.source, url, self.polite).await
    }

    async fn letter(&mut self, letter: char) -> Result<()> {
        let index_url = fighter_index_url(letter);
        let Some(body) = self.page(&index_url).await else {
            self.log.error_kv("fighter index unavailable", [("url", index_url)]);
            self.summary.errors += 1;
            return Ok(());
        };
        let links = fighter_links(&Html::parse_document(&body));
        self.log.info(format!("Found {} fighters for letter '{}'", links.len(), letter));

        for url in links {
            if !self.seen.fighters.insert(Site::UfcStats.extract_id(&url)) {
                continue;
            }
            let span = self.log.span_kv(&Phase::Fighter, [("url", url.clone())]);
            self.fighter(&url).instrument(span).await?;
        }
        Ok(())
    }

    async fn fighter(&mut self, url: &str) -> Result<()> {
        let Some(body) = self.page(url).await else {
            self.summary.errors += 1;
            return Ok(());
        };
        let (fighter, fights) = parse_fighter_page(&body, url);
        let Some(fighter) = fighter else {
            self.log.warn_kv("no fighter on page", [("url", url.to_string())]);
            self.summary.errors += 1;
            return Ok(());
        };
        self.out.fighters.append(&fighter)?;
        self.summary.fighters += 1;
        self.log.info(format!("✓ {} ({} fights)", fighter.name.as_deref().unwrap_or("Unknown"), fights.len()));

        for fight_url in fights {
            if !self.seen.fights.insert(Site::UfcStats.extract_id(&fight_url)) {
                continue;
            }
            let span = self.log.span_kv(&Phase::Fight, [("url", fight_url.clone())]);
            self.fight(&fight_url).instrument(span).await?;
        }
        Ok(())
    }

    async fn fight(&mut self, url: &str) -> Result<()> {
        let fight = match self.page(url).await {
            Some(body) => build_fight(&Html::parse_document(&body), url),
            None => None,
        };
        let Some(fight) = fight else {
            self.summary.errors += 1;
            return Ok(());
        };
        self.out.fights.append(&fight)?;
        self.summary.fights += 1;

        let Some(event_url) = fight.event_url.filter(|u| !u.is_empty()) else { return Ok(()) };
        if !self.seen.events.insert(Site::UfcStats.extract_id(&event_url)) {
            return Ok(());
        }
        let span = self.log.span_kv(&Phase::Event, [("url", event_url.clone())]);
        self.event(&event_url).instrument(span).await
    }

    async fn event(&mut self, url: &str) -> Result<()> {
        let event = match self.page(url).await {
            Some(body) => build_event(&Html::parse_document(&body), url),
            None => None,
        };
        match event {
            Some(event) => {
                self.out.events.append(&event)?;
                self.summary.events += 1;
            }
            None => self.summary.errors += 1,
        }
        Ok(())
    }
}

/// The fighter record and the fight-details links on the same page.
fn parse_fighter_page(body: &str, url: &str) -> (Option<UfcFighter>, Vec<String>) {
    let doc = Html::parse_document(body);
    (build_fighter(&doc, url), fight_links(&doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, MockSource};
    use reqwest::StatusCode;
    use std::fs;

    const INDEX: &str = r#"<html><body><table>
      <tr><td><a href="http://ufcstats.com/fighter-details/aaa111">Quinton</a></td>
          <td><a href="http://ufcstats.com/fighter-details/aaa111">Jackson</a></td></tr>
      <tr><td><a href="http://ufcstats.com/fighter-details/bbb222">Tatsuya</a></td>
          <td><a href="http://ufcstats.com/fighter-details/bbb222">Kawajiri</a></td></tr>
    </table></body></html>"#;

    fn fighter_page(name: &str) -> String {
        format!(
            r#"<html><body><h2><span class="b-content__title-highlight">{name}</span></h2>
            <table><tbody><tr><td><a href="http://ufcstats.com/fight-details/f1">win</a></td></tr></tbody></table>
            </body></html>"#
        )
    }

    const FIGHT: &str = r#"<html><body>
      <h2 class="b-content__title"><a href="http://ufcstats.com/event-details/e1">UFC 1</a></h2>
      <div class="b-fight-details__person"><i class="b-fight-details__person-status">W</i>
        <a class="b-fight-details__person-link" href="http://ufcstats.com/fighter-details/aaa111">Quinton Jackson</a></div>
      <div class="b-fight-details__person"><i class="b-fight-details__person-status">L</i>
        <a class="b-fight-details__person-link" href="http://ufcstats.com/fighter-details/bbb222">Tatsuya Kawajiri</a></div>
    </body></html>"#;

    const EVENT: &str = r#"<html><body><h2><span class="b-content__title-highlight">UFC 1</span></h2></body></html>"#;

    fn count_lines(path: &Path) -> usize {
        fs::read_to_string(path).map(|s| s.lines().count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn shared_fight_and_event_fetched_once() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockSource::new();
        mock.push_page(INDEX);
        mock.push_page(fighter_page("Quinton Jackson"));
        mock.push_page(FIGHT);
        mock.push_page(EVENT);
        mock.push_page(fighter_page("Tatsuya Kawajiri"));

        let summary = crawl(&mock, &Politeness::immediate(1), dir.path(), &['q']).await.unwrap();
        assert_eq!((summary.fighters, summary.fights, summary.events, summary.errors), (2, 1, 1, 0));
        assert_eq!(mock.calls().len(), 5);
        assert_eq!(mock.calls()[0], "http://ufcstats.com/statistics/fighters?char=q&page=all");

        assert_eq!(count_lines(&dir.path().join("fighters.jsonl")), 2);
        assert_eq!(count_lines(&dir.path().join("fights.jsonl")), 1);
        let event: serde_json::Value =
            serde_json::from_str(fs::read_to_string(dir.path().join("events.jsonl")).unwrap().trim()).unwrap();
        assert_eq!(event["id"], "e1");
    }

    #[tokio::test]
    async fn fetch_failures_are_counted_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockSource::new();
        mock.push_page(INDEX);
        mock.push_error(FetchError::Status { status: StatusCode::NOT_FOUND });
        mock.push_page("<html><body>nothing here</body></html>");

        let summary = crawl(&mock, &Politeness::immediate(1), dir.path(), &['q']).await.unwrap();
        assert_eq!(summary.fighters, 0);
        assert_eq!(summary.errors, 2);
        assert_eq!(summary.letters, 1);
        assert_eq!(count_lines(&dir.path().join("fighters.jsonl")), 0);
    }

    #[tokio::test]
    async fn missing_index_moves_to_next_letter() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockSource::new();
        mock.push_error(FetchError::Status { status: StatusCode::NOT_FOUND });
        mock.push_page("<html><body></body></html>");

        let summary = crawl(&mock, &Politeness::immediate(1), dir.path(), &['x', 'y']).await.unwrap();
        assert_eq!(summary.letters, 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(mock.calls()[1], "http://ufcstats.com/statistics/fighters?char=y&page=all");
    }
}
