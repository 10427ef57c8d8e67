//! Writer for the generated TeX fragment

use crate::error::Result;
use std::fs;
use std::path::Path;

/// Write the rendered blocks to `path`. Returns the number of bytes written.
pub fn write_tex(path: &Path, blocks: &[String]) -> Result<usize> {
    let content = write_tex_content(blocks);
    fs::write(path, &content)?;
    log::info!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(content.len())
}

/// The file content: the blocks in order. Each block already ends with an
/// empty line.
pub fn write_tex_content(blocks: &[String]) -> String {
    blocks.concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_tex_content_keeps_order() {
        let blocks = vec!["first\n\n".to_string(), "second\n\n".to_string()];
        assert_eq!(write_tex_content(&blocks), "first\n\nsecond\n\n");
    }

    #[test]
    fn test_write_tex_reports_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tex");
        let blocks = vec!["Длина $a = 5$.\n\n".to_string()];

        let written = write_tex(&path, &blocks).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, blocks[0]);
        assert_eq!(written, content.len());
    }

    #[test]
    fn test_write_tex_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.tex");
        assert!(write_tex(&path, &[]).is_err());
    }
}
