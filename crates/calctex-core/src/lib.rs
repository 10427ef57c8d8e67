//! calctex-core - ODS loading, TeX output and the run around the engine.

pub mod config;
pub mod document;
pub mod error;
pub mod storage;
pub mod watch;

pub use config::{Config, load_config};
pub use document::{DEFAULT_TEX_FILE, Document, RunSummary, TableSize};
pub use error::{CalctexError, Result};
pub use watch::FileWatcher;

pub use calctex_engine::render::RenderOptions;
