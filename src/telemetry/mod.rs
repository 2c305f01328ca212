pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;
pub mod sink;

use ctx::LogCtx;

pub fn crawl_espn() -> LogCtx<ops::crawl_espn::CrawlEspn> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn crawl_ufc() -> LogCtx<ops::crawl_ufc::CrawlUfc> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn retry() -> LogCtx<ops::retry::Retry> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn parse() -> LogCtx<ops::parse::Parse> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
