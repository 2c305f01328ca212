use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct CrawlUfc;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Letter, Fighter, Fight, Event }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Letter => "letter",
        Phase::Fighter => "fighter",
        Phase::Fight => "fight",
        Phase::Event => "event",
    }}
    fn span(&self) -> Span { match self {
        Phase::Letter => info_span!("letter"),
        Phase::Fighter => info_span!("fighter"),
        Phase::Fight => info_span!("fight"),
        Phase::Event => info_span!("event"),
    }}
}

impl OpMarker for CrawlUfc {
    const NAME: &'static str = "crawl_ufc";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("crawl_ufc") }
}
