//! Crash-resumable crawl state: the on-disk ledger of completed and failed URLs, and the
//! in-memory seen-set the UFC crawl dedupes with.

mod ledger;
mod seen;

pub use ledger::{FailedItem, ItemKind, MAX_ATTEMPTS, ProgressLedger};
pub use seen::SeenSet;
