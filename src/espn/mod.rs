//! ESPN MMA pages: yearly schedules, event fight centers and the four fighter pages.

pub mod event;
pub mod fighter;
pub mod schedule;
pub mod types;

pub use event::{build_event_page, merge_schedule};
pub use fighter::{FighterPage, build_bio, build_history, build_profile, build_stats, compose_fighter};
pub use schedule::{build_schedule, schedule_url};
pub use types::{EventRecord, FighterRecord, ScheduleEvent};
