use super::Document;
use crate::error::{CalctexError, Result};
use crate::storage::{read_ods, write_tex};
use calctex_engine::engine::{Spreadsheet, Warning};
use calctex_engine::render::{Rendered, render_sheet};

/// Size of a table as read from the spreadsheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSize {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
}

/// What one load → render → write cycle did.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub tables: Vec<TableSize>,
    pub blocks: usize,
    pub bytes: usize,
    pub warnings: Vec<Warning>,
}

fn table_sizes(spreadsheet: &Spreadsheet) -> Vec<TableSize> {
    spreadsheet
        .tables()
        .into_iter()
        .map(|t| TableSize {
            name: t.name().to_string(),
            rows: t.row_count(),
            columns: t.column_count(),
        })
        .collect()
}

impl Document {
    /// (Re)read the .ods file. The previous spreadsheet is kept if reading fails.
    /// Returns the sizes of the tables read.
    pub fn load(&mut self) -> Result<Vec<TableSize>> {
        let spreadsheet = read_ods(&self.ods_path)?;
        let sizes = table_sizes(&spreadsheet);
        for size in &sizes {
            log::info!("{}: {} x {}", size.name, size.rows, size.columns);
        }
        self.spreadsheet = Some(spreadsheet);
        Ok(sizes)
    }

    /// Render the sheet of the loaded spreadsheet.
    pub fn render(&self) -> Result<Rendered> {
        let Some(spreadsheet) = &self.spreadsheet else {
            return Err(CalctexError::NotLoaded);
        };
        Ok(render_sheet(spreadsheet, &self.sheet, self.options.clone())?)
    }

    /// Write rendered blocks to the TeX file. Returns the number of bytes written.
    pub fn write(&self, rendered: &Rendered) -> Result<usize> {
        write_tex(&self.tex_path, &rendered.blocks)
    }

    /// Load, render and write. Nothing is written if loading or rendering fails.
    pub fn run(&mut self) -> Result<RunSummary> {
        let tables = self.load()?;
        let rendered = self.render()?;
        let bytes = self.write(&rendered)?;
        Ok(RunSummary {
            tables,
            blocks: rendered.blocks.len(),
            bytes,
            warnings: rendered.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calctex_engine::engine::EngineError;
    use calctex_engine::render::{Phrases, RenderOptions};
    use std::io::Write;
    use std::path::Path;

    const CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content><office:body><office:spreadsheet>
<table:table table:name="Calc">
<table:table-row>
<table:table-cell office:value-type="string"><text:p>data</text:p></table:table-cell>
<table:table-cell office:value-type="string"><text:p>texput</text:p></table:table-cell>
<table:table-cell office:value-type="string"><text:p>description</text:p></table:table-cell>
</table:table-row>
<table:table-row>
<table:table-cell office:value-type="float" office:value="5"><text:p>5</text:p></table:table-cell>
<table:table-cell office:value-type="string"><text:p>a</text:p></table:table-cell>
<table:table-cell office:value-type="string"><text:p>length</text:p></table:table-cell>
</table:table-row>
<table:table-row>
<table:table-cell table:formula="of:=[.A2]*2" office:value-type="float" office:value="10"><text:p>10</text:p></table:table-cell>
<table:table-cell office:value-type="string"><text:p>b</text:p></table:table-cell>
<table:table-cell office:value-type="string"><text:p>double length</text:p></table:table-cell>
</table:table-row>
</table:table>
</office:spreadsheet></office:body></office:document-content>
"#;

    fn write_ods(path: &Path, content: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("content.xml", options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_run_writes_the_derivation() {
        let dir = tempfile::tempdir().unwrap();
        let ods = dir.path().join("calc.ods");
        let tex = dir.path().join("calc.tex");
        write_ods(&ods, CONTENT);

        let mut doc = Document::new(&ods, "Calc").with_tex_path(&tex);
        let summary = doc.run().unwrap();

        assert_eq!(
            summary.tables,
            vec![TableSize {
                name: "Calc".to_string(),
                rows: 3,
                columns: 3,
            }]
        );
        assert_eq!(summary.blocks, 2);
        assert!(summary.warnings.is_empty());

        let text = std::fs::read_to_string(&tex).unwrap();
        assert_eq!(summary.bytes, text.len());
        assert!(text.starts_with("Length $a = 5$.\n\n"));
        assert!(text.contains("\t= 5 \\cdot 2\n"));
    }

    #[test]
    fn test_options_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let ods = dir.path().join("calc.ods");
        write_ods(&ods, CONTENT);

        let options = RenderOptions {
            use_equation_numbers: false,
            phrases: Phrases::russian(),
            ..RenderOptions::default()
        };
        let mut doc = Document::new(&ods, "Calc").with_options(options);
        doc.load().unwrap();
        let text = doc.render().unwrap().text();
        assert!(text.contains("Double length --- по формуле:\n\\begin{equation*}"));
    }

    #[test]
    fn test_render_before_load() {
        let doc = Document::new("calc.ods", "Calc");
        assert!(matches!(doc.render(), Err(CalctexError::NotLoaded)));
    }

    #[test]
    fn test_missing_sheet_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ods = dir.path().join("calc.ods");
        let tex = dir.path().join("calc.tex");
        write_ods(&ods, CONTENT);

        let mut doc = Document::new(&ods, "Other").with_tex_path(&tex);
        let err = doc.run().unwrap_err();
        assert!(matches!(
            err,
            CalctexError::Engine(EngineError::MissingSheet(ref name)) if name == "Other"
        ));
        assert!(!tex.exists());
    }

    #[test]
    fn test_failed_reload_keeps_previous_spreadsheet() {
        let dir = tempfile::tempdir().unwrap();
        let ods = dir.path().join("calc.ods");
        write_ods(&ods, CONTENT);

        let mut doc = Document::new(&ods, "Calc");
        doc.load().unwrap();

        std::fs::write(&ods, b"not a zip").unwrap();
        assert!(doc.load().is_err());
        assert!(doc.spreadsheet().is_some_and(|ss| ss.has_table("Calc")));
        assert_eq!(doc.render().unwrap().blocks.len(), 2);
    }
}
