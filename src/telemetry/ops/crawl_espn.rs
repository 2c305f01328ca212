use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct CrawlEspn;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Year, Schedule, Event, Fighter, SaveProgress }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Year => "year",
        Phase::Schedule => "schedule",
        Phase::Event => "event",
        Phase::Fighter => "fighter",
        Phase::SaveProgress => "save_progress",
    }}
    fn span(&self) -> Span { match self {
        Phase::Year => info_span!("year"),
        Phase::Schedule => info_span!("schedule"),
        Phase::Event => info_span!("event"),
        Phase::Fighter => info_span!("fighter"),
        Phase::SaveProgress => info_span!("save_progress"),
    }}
}

impl OpMarker for CrawlEspn {
    const NAME: &'static str = "crawl_espn";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("crawl_espn") }
}
