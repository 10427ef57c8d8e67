//! Storage: ODS spreadsheets in, TeX fragments out

mod ods;
mod tex;

pub use ods::{parse_content, read_ods, read_ods_from};
pub use tex::{write_tex, write_tex_content};
