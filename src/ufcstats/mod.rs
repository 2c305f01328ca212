//! UFC Stats pages: fighter details, event details and fight details.
//!
//! IDs on this site are opaque hashes taken from the last URL segment.

pub mod event;
pub mod fight;
pub mod fighter;
pub mod page;
pub mod types;

pub use event::build_event;
pub use fight::build_fight;
pub use fighter::build_fighter;
pub use page::{fight_links, fighter_index_url, fighter_links};
pub use types::{UfcEvent, UfcFight, UfcFighter};
