//! Spreadsheet-side engine API.
//!
//! This module provides everything the renderer needs to understand a
//! calculation spreadsheet:
//!
//! - [`Spreadsheet`], [`Table`], [`Cell`], [`ValueType`] - The read-only sheet model
//! - [`Address`] - Cell address parsing (`Sheet.A1` notation ↔ row/column indices)
//! - [`resolve_dependencies`] - Ordered formula dependencies
//! - [`equation_skeleton`] - Formula → `#k` display skeleton
//! - [`QuantityBuilder`] - Memoized row → [`Quantity`] mapping
//! - [`detect_cycle`] - Circular dependency detection
//! - [`round_digits_str`] - Significant-digit number display

mod address;
mod cycle;
mod deps;
mod diagnostics;
mod format;
mod quantity;
mod sheet;
mod template;

use thiserror::Error;

pub use address::Address;
pub use cycle::detect_cycle;
pub use deps::{Dependency, Reference, has_any_dependency, resolve_dependencies, scan_references};
pub use diagnostics::{Diagnostics, Warning};
pub use format::{
    decimal_exponent, display_number, escape_percent, escape_tex, fix_comma, format_fixed,
    format_significant, round_digits_str, round_to_significant,
};
pub use quantity::{Citation, Header, Quantity, QuantityBuilder};
pub use sheet::{
    Cell, EULER_TOKEN, NamedExpression, PI_TOKEN, Spreadsheet, Table, VIRTUAL_SHEET_NAME,
    ValueType, is_virtual,
};
pub use template::{equation_skeleton, substitute_markers};

/// Errors that abort a rendering run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Bad sheet name: \"{0}\" (missing or empty)")]
    MissingSheet(String),

    #[error("Unknown value type {tag:?} at {address}")]
    UnknownValueType { address: Address, tag: String },

    #[error("Circular dependency detected: {}", format_path(.0))]
    CircularDependency(Vec<Address>),
}

fn format_path(path: &[Address]) -> String {
    path.iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type Result<T> = std::result::Result<T, EngineError>;
