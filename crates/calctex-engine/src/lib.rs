//! calctex_engine - Spreadsheet rows → LaTeX derivation.

pub mod engine;
pub mod render;
