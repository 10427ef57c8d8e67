//! Equation skeletons.
//!
//! A skeleton is the formula text with every dependency reference replaced by
//! a positional marker `#k` (1-based, numbered in order of first occurrence)
//! and the `*` operator replaced by `\cdot`. Rendering later substitutes the
//! markers with dependency symbols or values.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::deps::scan_references;
use super::diagnostics::Diagnostics;
use super::sheet::Spreadsheet;

fn star_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\*\s*").expect("multiplication regex must compile"))
}

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#(\d+)").expect("marker regex must compile"))
}

/// Build the display skeleton of `formula`.
///
/// Only the exact matched spans are rewritten, so a named expression like
/// `a` never touches the `a` inside `area`.
pub fn equation_skeleton(
    formula: &str,
    sheet: &str,
    spreadsheet: &Spreadsheet,
    diagnostics: Option<&mut Diagnostics>,
) -> String {
    let references = scan_references(formula, sheet, spreadsheet, diagnostics);

    let mut order = Vec::new();
    let mut out = String::with_capacity(formula.len());
    let mut last = 0;
    for reference in &references {
        let k = match order.iter().position(|a| a == &reference.address) {
            Some(i) => i + 1,
            None => {
                order.push(reference.address.clone());
                order.len()
            }
        };
        out.push_str(&formula[last..reference.span.start]);
        out.push('#');
        out.push_str(&k.to_string());
        last = reference.span.end;
    }
    out.push_str(&formula[last..]);

    star_re().replace_all(&out, r" \cdot ").into_owned()
}

/// Replace every `#k` marker with `replacement(k)`.
///
/// Markers whose replacement is `None` are left as they are.
pub fn substitute_markers<F>(skeleton: &str, mut replacement: F) -> String
where
    F: FnMut(usize) -> Option<String>,
{
    marker_re()
        .replace_all(skeleton, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(&mut replacement)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
