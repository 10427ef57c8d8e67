//! The dependency-aware render loop.
//!
//! Every row address carries three monotone flags:
//! - `known`: the reader has seen the symbol (constant statement, equation or "where" line)
//! - `equation_known`: the symbolic form was shown
//! - `calculated`: the numeric value was shown (constants and text rows always are)
//!
//! Addresses come from the caller's list (FIFO) and from a deferred stack
//! (LIFO) that always takes priority. An equation whose dependencies are not
//! calculated yet is shown symbolically and pushed back, with its unknown
//! dependencies pushed on top of it in reverse order, so they pop left to
//! right before the equation comes back for its numeric evaluation. This
//! walks the dependency tree depth-first without building a graph.

use std::collections::HashSet;

use regex::{NoExpand, Regex};
use std::sync::OnceLock;

use crate::engine::{
    Address, Diagnostics, EngineError, Quantity, QuantityBuilder, Result, Spreadsheet, ValueType,
    detect_cycle, display_number, fix_comma, format_significant, is_virtual, round_digits_str,
    substitute_markers,
};

use super::blocks;
use super::options::RenderOptions;

fn times_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\x\b").expect("times macro regex must compile"))
}

fn pi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\pi\b").expect("pi macro regex must compile"))
}

#[derive(Debug, Default)]
struct Knowledge {
    known: HashSet<Address>,
    equation_known: HashSet<Address>,
    calculated: HashSet<Address>,
}

/// One rendering run over one spreadsheet snapshot.
///
/// All state (quantity caches, knowledge flags, deferred stack,
/// diagnostics) lives here and is dropped with the renderer.
pub struct Renderer<'a> {
    builder: QuantityBuilder<'a>,
    options: RenderOptions,
    knowledge: Knowledge,
    deferred: Vec<Address>,
}

impl<'a> Renderer<'a> {
    pub fn new(spreadsheet: &'a Spreadsheet, options: RenderOptions) -> Self {
        Renderer {
            builder: QuantityBuilder::new(spreadsheet),
            options,
            knowledge: Knowledge::default(),
            deferred: Vec::new(),
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn builder(&mut self) -> &mut QuantityBuilder<'a> {
        &mut self.builder
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.builder.diagnostics()
    }

    /// End the run and hand back its warnings.
    pub fn finish(self) -> Diagnostics {
        self.builder.into_diagnostics()
    }

    /// Render every printable row of `sheet`, top to bottom.
    pub fn render_sheet(&mut self, sheet: &str) -> Result<Vec<String>> {
        let targets = self.builder.row_addresses(sheet)?;
        self.render(targets)
    }

    /// Render `targets` in order, returning the emitted text blocks.
    ///
    /// Each block ends with an empty line. Addresses may be emitted out of
    /// the requested order when dependencies need to be introduced first.
    pub fn render<I>(&mut self, targets: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = Address>,
    {
        let mut queue = targets.into_iter();
        let mut out = Vec::new();

        while let Some(addr) = self.deferred.pop().or_else(|| queue.next()) {
            let block = self.process(&addr)?;
            if !block.is_empty() {
                out.push(block + "\n");
            }
        }

        Ok(out)
    }

    pub fn is_known(&mut self, addr: &Address) -> bool {
        let q = self.builder.quantity(addr);
        q.is_empty()
            || self.knowledge.known.contains(q.address())
            || (q.is_known() && (self.options.honor_known_flag || is_virtual(q.address())))
    }

    pub fn is_equation_known(&mut self, addr: &Address) -> bool {
        let q = self.builder.quantity(addr);
        self.knowledge.equation_known.contains(q.address())
    }

    /// Text rows never block an equation: they have no numeric state.
    pub fn is_calculated(&mut self, addr: &Address) -> bool {
        let q = self.builder.quantity(addr);
        q.is_constant()
            || !q.value_type().is_numeric()
            || self.knowledge.calculated.contains(q.address())
    }

    fn set_known(&mut self, addr: &Address) {
        self.knowledge.known.insert(addr.clone());
    }

    fn set_equation_known(&mut self, addr: &Address) {
        self.knowledge.equation_known.insert(addr.clone());
    }

    fn set_calculated(&mut self, addr: &Address) {
        self.knowledge.calculated.insert(addr.clone());
    }

    fn process(&mut self, addr: &Address) -> Result<String> {
        let q = self.builder.quantity(addr);
        if q.is_empty() {
            log::debug!("{} is empty; skipping", addr);
            return Ok(String::new());
        }
        let addr = q.address().clone();

        match q.value_type() {
            ValueType::String | ValueType::Unset => {
                self.set_known(&addr);
                Ok(blocks::text_line(&q, &self.options.phrases))
            }
            ValueType::Float | ValueType::Percentage if q.is_constant() => {
                if self.is_known(&addr) {
                    log::debug!("{} is known; skipping", addr);
                    return Ok(String::new());
                }
                let s = blocks::constant(&q, &self.value_text(&q, false));
                self.set_known(&addr);
                Ok(s)
            }
            ValueType::Float | ValueType::Percentage => self.process_equation(&q),
            ValueType::Other(tag) => Err(EngineError::UnknownValueType {
                address: addr,
                tag: tag.clone(),
            }),
        }
    }

    fn process_equation(&mut self, q: &Quantity) -> Result<String> {
        let addr = q.address().clone();

        if self.is_calculated(&addr) {
            if self.is_known(&addr) {
                return Ok(String::new());
            }
            let s = blocks::constant(q, &self.value_text(q, false));
            self.set_known(&addr);
            return Ok(s);
        }

        let deps = self.builder.dependencies(&addr);
        let mut unknown = Vec::new();
        let mut uncalculated = Vec::new();
        let mut all = Vec::new();
        for dep in deps.iter() {
            // Redirect rows and references to other columns share the state
            // of the row they stand for.
            let dq = self.builder.quantity(dep);
            let key = dq.address().clone();
            if dq.is_empty() || all.contains(&key) {
                continue;
            }
            if !self.is_known(&key) {
                unknown.push(key.clone());
            }
            if !self.is_calculated(&key) {
                uncalculated.push(key.clone());
            }
            all.push(key);
        }
        let where_list: Vec<Address> = if self.options.always_write_where {
            all
        } else {
            unknown.clone()
        };
        let with_where = !where_list.is_empty();

        if uncalculated.is_empty() {
            let numbers = self.subst_numbers(q);
            let value = self.value_text(q, false);

            if self.is_equation_known(&addr) {
                log::debug!("{}: numeric evaluation", addr);
                let s = blocks::equation_numeric(q, &numbers, &value, &self.options, false);
                self.set_calculated(&addr);
                return Ok(s);
            }

            log::debug!("{}: symbolic and numeric equation", addr);
            let symbols = self.subst_symbols(q);
            let mut s = blocks::equation_symbolic_numeric(
                q,
                &symbols,
                &numbers,
                &value,
                &self.options,
                with_where,
            );
            self.set_known(&addr);
            self.set_equation_known(&addr);
            self.set_calculated(&addr);

            if with_where {
                s += &self.where_clause(&where_list);
                for dep in &unknown {
                    self.set_known(dep);
                }
            }
            return Ok(s);
        }

        if self.is_equation_known(&addr) {
            return self.redefer(&addr, &uncalculated);
        }

        log::debug!("{}: symbolic equation, deferred", addr);
        let symbols = self.subst_symbols(q);
        let mut s = blocks::equation_symbolic(q, &symbols, &self.options, with_where);
        self.set_known(&addr);
        self.set_equation_known(&addr);
        self.deferred.push(addr.clone());

        if with_where {
            s += &self.where_clause(&where_list);
            for dep in &unknown {
                self.set_known(dep);
            }
            // The stack pops from the end: push right to left so the
            // dependencies come back in formula order.
            for dep in unknown.iter().rev() {
                let dq = self.builder.quantity(dep);
                if dq.is_equation() {
                    self.deferred.push(dq.address().clone());
                }
            }
        }
        Ok(s)
    }

    /// The equation of `addr` was shown but some dependency is still not
    /// calculated. Put `addr` back one slot below the top of the stack (never
    /// on top, or it would pop again immediately) and make sure every
    /// blocking equation is scheduled.
    fn redefer(&mut self, addr: &Address, uncalculated: &[Address]) -> Result<String> {
        if let Some(path) = detect_cycle(addr, &mut self.builder) {
            return Err(EngineError::CircularDependency(path));
        }

        let at = self.deferred.len().saturating_sub(1);
        self.deferred.insert(at, addr.clone());

        for dep in uncalculated {
            let dq = self.builder.quantity(dep);
            let key = dq.address().clone();
            if dq.is_equation() && dq.value_type().is_numeric() && !self.deferred.contains(&key) {
                self.deferred.push(key);
            }
        }

        let blockers: Vec<String> = uncalculated.iter().map(|a| a.to_string()).collect();
        self.builder.diagnostics_mut().warn(format!(
            "{} has its equation shown but cannot be calculated yet because of: {}",
            addr,
            blockers.join(", ")
        ));
        Ok(String::new())
    }

    fn where_clause(&mut self, addresses: &[Address]) -> String {
        let mut lines = Vec::with_capacity(addresses.len());
        for addr in addresses {
            let q = self.builder.quantity(addr);
            let value = if q.is_constant() && q.value_type().is_numeric() {
                Some(self.value_text(&q, false))
            } else {
                None
            };
            lines.push(blocks::where_line(&q, value.as_deref()));
        }
        blocks::where_clause(&lines, &self.options.phrases)
    }

    fn digits_for(&self, q: &Quantity) -> i32 {
        if q.digits_count() >= 1 {
            q.digits_count()
        } else {
            self.options.default_digits_count.max(1)
        }
    }

    /// Display text of a quantity's value.
    ///
    /// Statements print a constant's cell text; inside a substituted formula
    /// (`substituted`) the raw value is printed instead, so percentages show
    /// as the fraction `0,15` and the substitution matches the result. The
    /// built-in constants are rounded to the default digits there. Computed
    /// values are rounded to the row's significant digits, percentages as
    /// `15~\%` outside substitutions.
    fn value_text(&self, q: &Quantity, substituted: bool) -> String {
        let percentage = *q.value_type() == ValueType::Percentage;
        match q.value() {
            Some(v) if !q.is_constant() => {
                let digits = self.digits_for(q);
                if percentage && !substituted {
                    display_number(&format!("{}%", format_significant(v * 100.0, digits)))
                } else {
                    display_number(&format_significant(v, digits))
                }
            }
            Some(v) if substituted && is_virtual(q.address()) => {
                round_digits_str(v, self.options.default_digits_count.max(1))
            }
            Some(v) if substituted => display_number(&v.to_string()),
            _ => display_number(q.text()),
        }
    }

    fn subst_symbols(&mut self, q: &Quantity) -> String {
        let s = fix_comma(q.tex_equation());
        let s = times_re().replace_all(&s, NoExpand(" ")).replace("PI()", r"\pi");

        let deps = self.builder.dependencies(q.address());
        let symbols: Vec<String> = deps
            .iter()
            .map(|d| self.builder.quantity(d).texput().to_string())
            .collect();
        substitute_markers(&s, |k| k.checked_sub(1).and_then(|i| symbols.get(i)).cloned())
    }

    fn subst_numbers(&mut self, q: &Quantity) -> String {
        let pi = round_digits_str(std::f64::consts::PI, self.options.default_digits_count.max(1));
        let s = fix_comma(q.tex_equation());
        let s = times_re().replace_all(&s, NoExpand(r"\cdot"));
        let s = pi_re().replace_all(&s, NoExpand(&pi)).replace("PI()", &pi);

        let deps = self.builder.dependencies(q.address());
        let mut values = Vec::with_capacity(deps.len());
        for dep in deps.iter() {
            let dq = self.builder.quantity(dep);
            let mut value = self.value_text(&dq, true);
            if value.starts_with('-') {
                value = format!("({})", value);
            }
            if self.options.use_units {
                value.push_str(&blocks::unit(&dq));
            }
            values.push(value);
        }
        substitute_markers(&s, |k| k.checked_sub(1).and_then(|i| values.get(i)).cloned())
    }
}
