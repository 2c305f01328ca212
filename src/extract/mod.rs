//! Site-agnostic extraction primitives shared by the ESPN and UFC Stats builders.
//!
//! Everything here is synchronous and pure: documents come in already fetched, records
//! go out, and malformed markup degrades to defaults instead of errors.

pub mod fields;
pub mod ids;
pub mod join;
pub mod names;
pub mod table;
pub mod text;

pub use ids::Site;
pub use join::{FightHistoryEntry, Joinable, Metrics, Section, SectionPayload, StatsSections, attach_sections};
pub use table::{HeaderMap, RowRecord};
