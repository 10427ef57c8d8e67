//! Error types for calctex core.

use thiserror::Error;

use calctex_engine::engine::EngineError;

/// Errors that can occur while loading, rendering or writing a document
#[derive(Error, Debug)]
pub enum CalctexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Malformed ODS: {0}")]
    Ods(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("No spreadsheet loaded")]
    NotLoaded,
}

pub type Result<T> = std::result::Result<T, CalctexError>;
