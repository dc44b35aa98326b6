//! File-facing collaborators: reading method lists and writing result tables.

pub mod input;
pub mod output;

pub use input::load_records;
pub use output::save_results;
