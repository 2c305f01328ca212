//! Command handlers: site crawls driven over a `PageSource`, plus offline parsing of saved pages.

pub mod espn;
pub mod parse;
pub mod ufcstats;
