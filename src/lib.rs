pub mod bts;
pub mod deps;

pub use bts::{Bts, BtsError, Entry, EntryValue, InsertOutcome};
pub use deps::{base_entries, release_bts_path, DependencySet};
