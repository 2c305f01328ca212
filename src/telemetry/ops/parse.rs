use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Parse;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Read, Build }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Read => "read",
        Phase::Build => "build",
    }}
    fn span(&self) -> Span { match self {
        Phase::Read => info_span!("read"),
        Phase::Build => info_span!("build"),
    }}
}

impl OpMarker for Parse {
    const NAME: &'static str = "parse";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("parse") }
}
