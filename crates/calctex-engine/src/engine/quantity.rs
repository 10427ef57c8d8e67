//! Quantities: the typed view of one spreadsheet row.
//!
//! Row 0 of every sheet names the semantic columns (see [`Header`]); each
//! following row describes one physical quantity. [`QuantityBuilder`] reads
//! a row into a [`Quantity`] once per run and hands out shared references
//! afterwards.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::EngineError;
use super::address::Address;
use super::deps::{has_any_dependency, resolve_dependencies};
use super::diagnostics::Diagnostics;
use super::format::escape_tex;
use super::sheet::{Spreadsheet, ValueType};
use super::template::equation_skeleton;

/// Semantic columns, looked up by their header text in row 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Header {
    Data,
    Texput,
    UnitTexput,
    TexEquation,
    Description,
    IsKnown,
    IsConstant,
    DoNotPrint,
    IsRedirect,
    Source,
    SourceName,
    SourceAux,
    DigitsCount,
}

impl Header {
    pub fn name(self) -> &'static str {
        match self {
            Header::Data => "data",
            Header::Texput => "texput",
            Header::UnitTexput => "unit_texput",
            Header::TexEquation => "tex_equation",
            Header::Description => "description",
            Header::IsKnown => "is_known",
            Header::IsConstant => "is_constant",
            Header::DoNotPrint => "do_not_print",
            Header::IsRedirect => "is_redirect",
            Header::Source => "source",
            Header::SourceName => "source_name",
            Header::SourceAux => "source_aux",
            Header::DigitsCount => "digits_count",
        }
    }
}

/// Bibliography reference of a quantity: `\cite[aux]{name}`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Citation {
    pub name: String,
    pub aux: String,
}

impl Citation {
    /// Split a single `source` cell on its first comma.
    pub fn from_source(source: &str) -> Citation {
        match source.split_once(',') {
            Some((name, aux)) => Citation {
                name: name.trim().to_string(),
                aux: aux.trim().to_string(),
            },
            None => Citation {
                name: source.trim().to_string(),
                aux: String::new(),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// A physical quantity derived from one spreadsheet row. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Quantity {
    address: Address,
    description: String,
    texput: String,
    unit_texput: String,
    tex_equation: String,
    text: String,
    value: Option<f64>,
    value_type: ValueType,
    formula: String,
    is_known: bool,
    is_constant: bool,
    is_redirect: bool,
    do_not_print: bool,
    digits_count: i32,
    citation: Citation,
    empty: bool,
}

impl Quantity {
    /// The sentinel for rows without data, symbol and description.
    pub fn empty(address: Address) -> Quantity {
        Quantity {
            address,
            description: String::new(),
            texput: String::new(),
            unit_texput: String::new(),
            tex_equation: String::new(),
            text: String::new(),
            value: None,
            value_type: ValueType::Unset,
            formula: String::new(),
            is_known: false,
            is_constant: true,
            is_redirect: false,
            do_not_print: false,
            digits_count: -1,
            citation: Citation::default(),
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn texput(&self) -> &str {
        &self.texput
    }

    pub fn unit_texput(&self) -> &str {
        &self.unit_texput
    }

    pub fn tex_equation(&self) -> &str {
        &self.tex_equation
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn is_known(&self) -> bool {
        self.is_known
    }

    pub fn is_constant(&self) -> bool {
        self.is_constant
    }

    pub fn is_equation(&self) -> bool {
        !self.is_constant
    }

    pub fn is_redirect(&self) -> bool {
        self.is_redirect
    }

    pub fn do_not_print(&self) -> bool {
        self.do_not_print
    }

    /// Significant digits to print, -1 for the document default.
    pub fn digits_count(&self) -> i32 {
        self.digits_count
    }

    pub fn citation(&self) -> &Citation {
        &self.citation
    }
}

/// Builds and memoizes quantities for one spreadsheet snapshot.
///
/// Owns every cache of a run (quantities, dependency lists, header columns)
/// plus the run's diagnostics. Create a new builder for every snapshot.
pub struct QuantityBuilder<'a> {
    spreadsheet: &'a Spreadsheet,
    quantities: HashMap<Address, Rc<Quantity>>,
    dependencies: HashMap<Address, Rc<[Address]>>,
    headers: HashMap<String, HashMap<String, usize>>,
    resolving_redirects: HashSet<Address>,
    diagnostics: Diagnostics,
}

impl<'a> QuantityBuilder<'a> {
    pub fn new(spreadsheet: &'a Spreadsheet) -> Self {
        QuantityBuilder {
            spreadsheet,
            quantities: HashMap::new(),
            dependencies: HashMap::new(),
            headers: HashMap::new(),
            resolving_redirects: HashSet::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn spreadsheet(&self) -> &'a Spreadsheet {
        self.spreadsheet
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Column index of `header` on `sheet`, if its header row has one.
    pub fn column(&mut self, sheet: &str, header: Header) -> Option<usize> {
        let spreadsheet = self.spreadsheet;
        let columns = self.headers.entry(sheet.to_string()).or_insert_with(|| {
            let mut columns = HashMap::new();
            if let Some(table) = spreadsheet.table(sheet) {
                for (column, cell) in table.row_cells(0) {
                    columns.entry(cell.text.clone()).or_insert(column);
                }
            }
            columns
        });
        columns.get(header.name()).copied()
    }

    fn cell_text(&mut self, row: &Address, header: Header) -> String {
        match self.column(&row.sheet, header) {
            Some(column) => self.spreadsheet.cell(&row.with_column(column)).text.clone(),
            None => String::new(),
        }
    }

    /// The quantity of the row containing `addr`.
    pub fn quantity(&mut self, addr: &Address) -> Rc<Quantity> {
        let row = addr.row_address();
        if let Some(q) = self.quantities.get(&row) {
            return Rc::clone(q);
        }
        let q = Rc::new(self.build(&row));
        self.quantities.insert(row, Rc::clone(&q));
        q
    }

    /// Addresses the formula of `addr`'s row depends on, in order of first occurrence.
    pub fn dependencies(&mut self, addr: &Address) -> Rc<[Address]> {
        let q = self.quantity(addr);
        let key = q.address().clone();
        if let Some(deps) = self.dependencies.get(&key) {
            return Rc::clone(deps);
        }
        let deps: Rc<[Address]> = resolve_dependencies(
            q.formula(),
            &key.sheet,
            self.spreadsheet,
            Some(&mut self.diagnostics),
        )
        .into_iter()
        .map(|d| d.address)
        .collect();
        self.dependencies.insert(key, Rc::clone(&deps));
        deps
    }

    /// Row addresses of the printable, non-empty quantities of `sheet` (rows 1..n).
    pub fn row_addresses(&mut self, sheet: &str) -> Result<Vec<Address>, EngineError> {
        let table = match self.spreadsheet.table(sheet) {
            Some(table) if !table.is_empty() => table,
            _ => return Err(EngineError::MissingSheet(sheet.to_string())),
        };
        let mut rows = Vec::new();
        for row in 1..table.row_count() {
            let q = self.quantity(&Address::new(sheet, row, 0));
            if !q.is_empty() && !q.do_not_print() {
                rows.push(Address::new(sheet, row, 0));
            }
        }
        Ok(rows)
    }

    fn build(&mut self, row: &Address) -> Quantity {
        let data_column = self.column(&row.sheet, Header::Data);
        let data = match data_column {
            Some(column) => self.spreadsheet.cell(&row.with_column(column)).clone(),
            None => Default::default(),
        };

        if !self.cell_text(row, Header::IsRedirect).is_empty()
            && let Some(target) = self.resolve_redirect(row, &data.formula)
        {
            return target;
        }

        let texput = self.cell_text(row, Header::Texput);
        let description = self.cell_text(row, Header::Description);
        if data.text.is_empty() && texput.is_empty() && description.is_empty() {
            return Quantity::empty(row.clone());
        }

        let texput = if texput.is_empty() {
            if data.value_type.is_numeric() {
                self.diagnostics
                    .warn(format!("No texput for {}; using its address", row));
            }
            format!(r"\text{{{}}}", escape_tex(&row.to_string()))
        } else {
            texput
        };

        let tex_equation = match self.cell_text(row, Header::TexEquation) {
            eq if !eq.is_empty() => eq,
            _ => equation_skeleton(
                &data.formula,
                &row.sheet,
                self.spreadsheet,
                Some(&mut self.diagnostics),
            ),
        };

        let is_constant = !self.cell_text(row, Header::IsConstant).is_empty()
            || data.formula.is_empty()
            || !has_any_dependency(&data.formula, &row.sheet, self.spreadsheet);

        let citation = if self.column(&row.sheet, Header::SourceName).is_some() {
            Citation {
                name: self.cell_text(row, Header::SourceName).trim().to_string(),
                aux: self.cell_text(row, Header::SourceAux).trim().to_string(),
            }
        } else {
            Citation::from_source(&self.cell_text(row, Header::Source))
        };

        let digits_count = self
            .cell_text(row, Header::DigitsCount)
            .trim()
            .parse::<i32>()
            .unwrap_or(-1);

        Quantity {
            address: row.clone(),
            description,
            texput,
            unit_texput: self.cell_text(row, Header::UnitTexput),
            tex_equation,
            text: data.text,
            value: data.value,
            value_type: data.value_type,
            formula: data.formula,
            is_known: !self.cell_text(row, Header::IsKnown).is_empty(),
            is_constant,
            is_redirect: false,
            do_not_print: !self.cell_text(row, Header::DoNotPrint).is_empty(),
            digits_count,
            citation,
            empty: false,
        }
    }

    /// The target quantity of a redirect row, or None if the row must be
    /// treated as a normal one.
    fn resolve_redirect(&mut self, row: &Address, formula: &str) -> Option<Quantity> {
        let deps = resolve_dependencies(
            formula,
            &row.sheet,
            self.spreadsheet,
            Some(&mut self.diagnostics),
        );
        if deps.len() != 1 {
            self.diagnostics.warn(format!(
                "Redirect {} must reference exactly one cell, found {}; treating it as a normal row",
                row,
                deps.len()
            ));
            return None;
        }

        if !self.resolving_redirects.insert(row.clone()) {
            self.diagnostics.warn(format!(
                "Redirect loop through {}; treating it as a normal row",
                row
            ));
            return None;
        }
        let target = self.quantity(&deps[0].address);
        self.resolving_redirects.remove(row);

        let mut q = (*target).clone();
        q.is_redirect = true;
        Some(q)
    }
}
