//! Document state and logic: one ODS sheet rendered into one TeX file.

mod io;
mod state;

pub use io::{RunSummary, TableSize};
pub use state::{DEFAULT_TEX_FILE, Document};
