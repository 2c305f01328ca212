pub mod crawl_espn;
pub mod crawl_ufc;
pub mod retry;
pub mod parse;
