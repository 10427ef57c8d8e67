//! Spreadsheet data structures.
//!
//! This module provides the read-only model the engine consumes:
//! - [`ValueType`] - The value-type tag of a cell (`float`, `percentage`, ...)
//! - [`Cell`] - Display text, numeric value, value type and formula of one cell
//! - [`Table`] - A named sparse grid of cells (one sheet)
//! - [`NamedExpression`] - A name bound to a cell address
//! - [`Spreadsheet`] - All tables plus the global named-expression table
//!
//! Every [`Spreadsheet`] also carries a hidden virtual sheet holding the
//! mathematical constants π and e, reachable from formulas through the
//! named expressions `PI()` and `EXP(1)`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::address::Address;

/// Name of the hidden sheet holding the built-in constants.
pub const VIRTUAL_SHEET_NAME: &str = "__VIRTUAL_SHEET";

/// Named expression bound to the virtual π row.
pub const PI_TOKEN: &str = "PI()";
/// Named expression bound to the virtual e row.
pub const EULER_TOKEN: &str = "EXP(1)";

/// The value-type tag of a cell, as written by the spreadsheet application.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ValueType {
    Float,
    Percentage,
    String,
    #[default]
    Unset,
    /// Any other tag (`date`, `currency`, ...). The engine refuses to render these.
    Other(String),
}

impl ValueType {
    pub fn from_tag(tag: &str) -> ValueType {
        match tag {
            "float" => ValueType::Float,
            "percentage" => ValueType::Percentage,
            "string" => ValueType::String,
            "" => ValueType::Unset,
            other => ValueType::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            ValueType::Float => "float",
            ValueType::Percentage => "percentage",
            ValueType::String => "string",
            ValueType::Unset => "",
            ValueType::Other(tag) => tag,
        }
    }

    /// True for the tags that take part in numeric rendering.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Float | ValueType::Percentage)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.tag())
    }
}

/// A single spreadsheet cell.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Cell {
    /// Text as displayed by the spreadsheet application.
    pub text: String,
    pub value: Option<f64>,
    pub value_type: ValueType,
    /// Formula without the `of:=` prefix; empty for literal cells.
    pub formula: String,
}

static EMPTY_CELL: Cell = Cell {
    text: String::new(),
    value: None,
    value_type: ValueType::Unset,
    formula: String::new(),
};

impl Cell {
    pub fn new_empty() -> Cell {
        Cell::default()
    }

    pub fn new_text(text: &str) -> Cell {
        Cell {
            text: text.to_string(),
            value: None,
            value_type: ValueType::String,
            formula: String::new(),
        }
    }

    /// A float cell; the display text is the shortest representation of `value`.
    pub fn new_float(value: f64) -> Cell {
        Cell {
            text: value.to_string(),
            value: Some(value),
            value_type: ValueType::Float,
            formula: String::new(),
        }
    }

    /// A percentage cell holding the fraction `value` (0.15 displays as "15%").
    pub fn new_percentage(value: f64) -> Cell {
        Cell {
            text: format!("{}%", (value * 100.0 * 1e9).round() / 1e9),
            value: Some(value),
            value_type: ValueType::Percentage,
            formula: String::new(),
        }
    }

    /// Attach a formula (without the leading `=`).
    pub fn with_formula(mut self, formula: &str) -> Cell {
        self.formula = formula.to_string();
        self
    }

    /// Override the display text.
    pub fn with_text(mut self, text: &str) -> Cell {
        self.text = text.to_string();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One sheet: a sparse grid of cells addressed by 0-based row and column.
#[derive(Clone, Debug, Default)]
pub struct Table {
    name: String,
    cells: BTreeMap<usize, BTreeMap<usize, Cell>>,
}

impl Table {
    pub fn new(name: &str) -> Table {
        Table {
            name: name.to_string(),
            cells: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_cell(&mut self, row: usize, column: usize, cell: Cell) {
        self.cells.entry(row).or_default().insert(column, cell);
    }

    /// The cell at (row, column), or the empty cell when nothing is stored there.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.cells
            .get(&row)
            .and_then(|r| r.get(&column))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn row_count(&self) -> usize {
        self.cells.keys().next_back().map_or(0, |r| r + 1)
    }

    pub fn column_count(&self) -> usize {
        self.cells
            .values()
            .filter_map(|r| r.keys().next_back())
            .max()
            .map_or(0, |c| c + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Iterate the stored cells of one row in column order.
    pub fn row_cells(&self, row: usize) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells
            .get(&row)
            .into_iter()
            .flat_map(|r| r.iter().map(|(c, cell)| (*c, cell)))
    }
}

/// An alias binding a name to a cell address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedExpression {
    pub name: String,
    pub address: Address,
}

impl NamedExpression {
    pub fn new(name: &str, address: Address) -> NamedExpression {
        NamedExpression {
            name: name.to_string(),
            address,
        }
    }
}

/// A set of tables and named expressions.
#[derive(Clone, Debug)]
pub struct Spreadsheet {
    tables: HashMap<String, Table>,
    named_expressions: HashMap<String, NamedExpression>,
}

impl Spreadsheet {
    /// Create a spreadsheet holding only the virtual constants sheet.
    pub fn new() -> Self {
        let mut spreadsheet = Spreadsheet {
            tables: HashMap::new(),
            named_expressions: HashMap::new(),
        };
        spreadsheet.install_virtual_constants();
        spreadsheet
    }

    fn install_virtual_constants(&mut self) {
        let mut table = Table::new(VIRTUAL_SHEET_NAME);
        for (column, header) in ["data", "texput", "description", "is_known", "is_constant"]
            .into_iter()
            .enumerate()
        {
            table.set_cell(0, column, Cell::new_text(header));
        }

        let constants = [
            (PI_TOKEN, std::f64::consts::PI, "3.14159", r"\pi", "the ratio of a circle's circumference to its diameter"),
            (EULER_TOKEN, std::f64::consts::E, "2.71828", "e", "Euler's number"),
        ];
        for (i, (token, value, text, texput, description)) in constants.into_iter().enumerate() {
            let row = i + 1;
            table.set_cell(row, 0, Cell::new_float(value).with_text(text));
            table.set_cell(row, 1, Cell::new_text(texput));
            table.set_cell(row, 2, Cell::new_text(description));
            table.set_cell(row, 3, Cell::new_text("1"));
            table.set_cell(row, 4, Cell::new_text("1"));
            self.set_named_expression(NamedExpression::new(
                token,
                Address::new(VIRTUAL_SHEET_NAME, row, 0),
            ));
        }
        self.set_table(table);
    }

    pub fn set_table(&mut self, table: Table) {
        self.tables.insert(table.name().to_string(), table);
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Return the table called `name`, creating it if missing.
    pub fn ensure_table(&mut self, name: &str) -> &mut Table {
        self.tables
            .entry(name.to_string())
            .or_insert_with(|| Table::new(name))
    }

    /// User-visible tables (the virtual sheet is skipped), sorted by name.
    pub fn tables(&self) -> Vec<&Table> {
        let mut tables: Vec<&Table> = self
            .tables
            .values()
            .filter(|t| t.name() != VIRTUAL_SHEET_NAME)
            .collect();
        tables.sort_by(|a, b| a.name().cmp(b.name()));
        tables
    }

    /// The cell at `addr`, or the empty cell.
    pub fn cell(&self, addr: &Address) -> &Cell {
        match self.tables.get(&addr.sheet) {
            Some(table) => table.cell(addr.row, addr.column),
            None => &EMPTY_CELL,
        }
    }

    pub fn set_named_expression(&mut self, expression: NamedExpression) {
        self.named_expressions
            .insert(expression.name.clone(), expression);
    }

    pub fn named_expression(&self, name: &str) -> Option<&NamedExpression> {
        self.named_expressions.get(name)
    }

    pub fn has_named_expression(&self, name: &str) -> bool {
        self.named_expressions.contains_key(name)
    }

    pub fn named_expressions(&self) -> impl Iterator<Item = &NamedExpression> {
        self.named_expressions.values()
    }
}

impl Default for Spreadsheet {
    fn default() -> Self {
        Self::new()
    }
}

/// True if `addr` lives on the virtual constants sheet.
pub fn is_virtual(addr: &Address) -> bool {
    addr.sheet == VIRTUAL_SHEET_NAME
}
