use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Retry;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Events, Fighters }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Events => "events",
        Phase::Fighters => "fighters",
    }}
    fn span(&self) -> Span { match self {
        Phase::Events => info_span!("events"),
        Phase::Fighters => info_span!("fighters"),
    }}
}

impl OpMarker for Retry {
    const NAME: &'static str = "retry";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("retry") }
}
