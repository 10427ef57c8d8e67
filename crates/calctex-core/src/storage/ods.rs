//! Reader for OpenDocument spreadsheets (.ods)
//!
//! Only `content.xml` is read. Every `table:table` becomes a [`Table`] and
//! every `table:named-range` a [`NamedExpression`]. Cells keep the text the
//! spreadsheet application displayed, the numeric `office:value`, the value
//! type tag and the formula without its `of:=` namespace prefix.
//!
//! Empty cells are not stored. Rows with `table:number-rows-repeated > 1`
//! are counted but their contents are skipped (LibreOffice uses them for
//! padding), while `table:number-columns-repeated` copies the cell.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;

use calctex_engine::engine::{Address, Cell, NamedExpression, Spreadsheet, Table, ValueType};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{CalctexError, Result};

const CONTENT_XML: &str = "content.xml";

/// Read the spreadsheet stored in the .ods file at `path`.
pub fn read_ods(path: &Path) -> Result<Spreadsheet> {
    let file = File::open(path)?;
    read_ods_from(BufReader::new(file))
}

/// Read a spreadsheet from an .ods archive held by `reader`.
pub fn read_ods_from<R: Read + Seek>(reader: R) -> Result<Spreadsheet> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let content = match archive.by_name(CONTENT_XML) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(CalctexError::Ods(format!(
                "{} not found in the archive",
                CONTENT_XML
            )));
        }
        Err(err) => return Err(err.into()),
    };
    parse_content(BufReader::new(content))
}

/// Parse an ODF `content.xml` document.
pub fn parse_content<B: BufRead>(input: B) -> Result<Spreadsheet> {
    let mut reader = Reader::from_reader(input);
    let mut parser = ContentParser::new();
    let mut buf = Vec::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(source) => {
                return Err(CalctexError::Xml {
                    position: reader.buffer_position(),
                    source,
                });
            }
        };
        match event {
            Event::Start(e) => parser.start(&e, false),
            Event::Empty(e) => parser.start(&e, true),
            Event::End(e) => parser.end(e.name().as_ref()),
            Event::Text(e) => {
                if let Ok(text) = e.unescape() {
                    parser.push_text(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(parser.finish())
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|s| s.to_string()))
}

fn repeat_count(e: &BytesStart<'_>, name: &[u8]) -> usize {
    attribute(e, name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
}

/// `of:=[.A1]*2` → `[.A1]*2`.
fn strip_formula_prefix(formula: &str) -> &str {
    match formula.split_once(":=") {
        Some((namespace, rest)) if namespace.chars().all(|c| c.is_ascii_alphanumeric()) => rest,
        _ => formula.strip_prefix('=').unwrap_or(formula),
    }
}

struct PendingCell {
    cell: Cell,
    repeat: usize,
    paragraphs: Vec<String>,
}

impl PendingCell {
    fn from_start(e: &BytesStart<'_>) -> PendingCell {
        let value_type = ValueType::from_tag(&attribute(e, b"office:value-type").unwrap_or_default());
        let value = attribute(e, b"office:value").and_then(|v| v.trim().parse::<f64>().ok());
        let formula = attribute(e, b"table:formula")
            .map(|f| strip_formula_prefix(&f).to_string())
            .unwrap_or_default();

        PendingCell {
            cell: Cell {
                text: String::new(),
                value,
                value_type,
                formula,
            },
            repeat: repeat_count(e, b"table:number-columns-repeated"),
            paragraphs: Vec::new(),
        }
    }
}

struct ContentParser {
    spreadsheet: Spreadsheet,
    table: Option<Table>,
    row: usize,
    row_repeat: usize,
    column: usize,
    cell: Option<PendingCell>,
    paragraph: Option<String>,
    annotation_depth: usize,
}

impl ContentParser {
    fn new() -> Self {
        ContentParser {
            spreadsheet: Spreadsheet::new(),
            table: None,
            row: 0,
            row_repeat: 1,
            column: 0,
            cell: None,
            paragraph: None,
            annotation_depth: 0,
        }
    }

    fn start(&mut self, e: &BytesStart<'_>, empty: bool) {
        match e.name().as_ref() {
            b"table:table" => {
                let name = attribute(e, b"table:name").unwrap_or_default();
                self.table = Some(Table::new(&name));
                self.row = 0;
                if empty {
                    self.end_table();
                }
            }
            b"table:table-row" => {
                self.row_repeat = repeat_count(e, b"table:number-rows-repeated");
                self.column = 0;
                if empty {
                    self.end_row();
                }
            }
            b"table:table-cell" | b"table:covered-table-cell" => {
                self.cell = Some(PendingCell::from_start(e));
                if empty {
                    self.end_cell();
                }
            }
            b"office:annotation" => {
                if !empty {
                    self.annotation_depth += 1;
                }
            }
            b"text:p" if self.cell.is_some() && self.annotation_depth == 0 => {
                if empty {
                    self.end_paragraph(String::new());
                } else {
                    self.paragraph = Some(String::new());
                }
            }
            b"text:s" => {
                let spaces = " ".repeat(repeat_count(e, b"text:c"));
                self.push_text(&spaces);
            }
            b"text:tab" => self.push_text("\t"),
            b"text:line-break" => self.push_text(" "),
            b"table:named-range" => self.named_range(e),
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"table:table" => self.end_table(),
            b"table:table-row" => self.end_row(),
            b"table:table-cell" | b"table:covered-table-cell" => self.end_cell(),
            b"office:annotation" => {
                self.annotation_depth = self.annotation_depth.saturating_sub(1);
            }
            b"text:p" => {
                if let Some(paragraph) = self.paragraph.take() {
                    self.end_paragraph(paragraph);
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.annotation_depth > 0 {
            return;
        }
        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.push_str(text);
        }
    }

    fn end_paragraph(&mut self, paragraph: String) {
        if let Some(cell) = self.cell.as_mut() {
            cell.paragraphs.push(paragraph.trim().to_string());
        }
    }

    fn end_cell(&mut self) {
        let Some(pending) = self.cell.take() else {
            return;
        };
        self.paragraph = None;

        if self.row_repeat == 1
            && let Some(table) = self.table.as_mut()
        {
            let mut cell = pending.cell;
            cell.text = pending.paragraphs.join(" ").trim().to_string();
            if !cell.is_empty() {
                for i in 0..pending.repeat {
                    table.set_cell(self.row, self.column + i, cell.clone());
                }
            }
        }
        self.column += pending.repeat;
    }

    fn end_row(&mut self) {
        self.row += self.row_repeat;
        self.row_repeat = 1;
        self.column = 0;
    }

    fn end_table(&mut self) {
        if let Some(table) = self.table.take() {
            log::debug!(
                "Read table {}: {} x {}",
                table.name(),
                table.row_count(),
                table.column_count()
            );
            self.spreadsheet.set_table(table);
        }
    }

    fn named_range(&mut self, e: &BytesStart<'_>) {
        let name = attribute(e, b"table:name").unwrap_or_default();
        let range = attribute(e, b"table:cell-range-address").unwrap_or_default();
        if name.is_empty() {
            log::warn!("Skipping a named range without a name");
            return;
        }
        match Address::parse(&range) {
            Some(address) => self
                .spreadsheet
                .set_named_expression(NamedExpression::new(&name, address)),
            None => log::warn!(
                "Skipping named range {}: {:?} is not a single cell",
                name,
                range
            ),
        }
    }

    fn finish(mut self) -> Spreadsheet {
        self.end_table();
        self.spreadsheet
    }
}
