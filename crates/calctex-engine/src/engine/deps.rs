//! Dependency extraction from formula strings.
//!
//! Scans formula text left to right for everything that points at another
//! row of the spreadsheet. The order of first occurrence is significant: it
//! numbers the `#k` markers of equation skeletons and the order in which
//! unknown symbols are introduced.
//!
//! Handles:
//! - Bracketed cell references: `[Sheet.A1]`, `[$Sheet.$A$1]`, `[.A1]` (same sheet)
//! - The built-in constants `PI()` and `EXP(1)`
//! - Bare identifiers that name a named expression
//! - Ignores references inside string literals
//!
//! Range references (`[.A1:.A5]`) are not supported; they are skipped with a
//! warning.

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

use super::address::Address;
use super::diagnostics::Diagnostics;
use super::sheet::Spreadsheet;

/// One resolved occurrence of a reference inside a formula.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    /// Byte range of the match in the formula text.
    pub span: Range<usize>,
    /// The matched text, e.g. `[.A1]` or `length`.
    pub raw: String,
    pub address: Address,
}

/// A distinct dependency of a formula, in order of first occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dependency {
    pub raw: String,
    pub address: Address,
}

enum Resolution {
    Address(Address),
    Range,
    Invalid,
    Local,
}

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[[^\]]*\]|\bPI\(\)|\bEXP\(1\)|\b[\p{L}_][\w]*")
            .expect("dependency reference regex must compile")
    })
}

fn resolve_match(raw: &str, sheet: &str, spreadsheet: &Spreadsheet) -> Resolution {
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        if inner.contains(':') {
            return Resolution::Range;
        }
        let addr = match inner.strip_prefix('.') {
            Some(cell) => Address::in_sheet(sheet, cell),
            None => Address::parse(inner),
        };
        return match addr {
            Some(addr) => Resolution::Address(addr),
            None => Resolution::Invalid,
        };
    }
    match spreadsheet.named_expression(raw) {
        Some(expr) => Resolution::Address(expr.address.clone()),
        None => Resolution::Local,
    }
}

/// Every resolvable reference occurrence in `formula`, left to right.
///
/// `sheet` is the sheet owning the formula (used to expand `[.A1]`).
/// Skipped references are reported to `diagnostics` when given.
pub fn scan_references(
    formula: &str,
    sheet: &str,
    spreadsheet: &Spreadsheet,
    mut diagnostics: Option<&mut Diagnostics>,
) -> Vec<Reference> {
    let masked = mask_string_literals(formula);
    let mut references = Vec::new();

    for m in reference_re().find_iter(&masked) {
        let raw = &formula[m.range()];
        match resolve_match(raw, sheet, spreadsheet) {
            Resolution::Address(address) => references.push(Reference {
                span: m.range(),
                raw: raw.to_string(),
                address,
            }),
            Resolution::Range => {
                if let Some(diag) = diagnostics.as_deref_mut() {
                    diag.warn(format!(
                        "Formula '{}' depends on range '{}'; ranges are not supported",
                        formula, raw
                    ));
                }
            }
            Resolution::Invalid => {
                if let Some(diag) = diagnostics.as_deref_mut() {
                    diag.warn(format!(
                        "Formula '{}' has an unreadable reference '{}'",
                        formula, raw
                    ));
                }
            }
            Resolution::Local => {}
        }
    }

    references
}

/// The distinct dependencies of `formula` in order of first occurrence.
pub fn resolve_dependencies(
    formula: &str,
    sheet: &str,
    spreadsheet: &Spreadsheet,
    diagnostics: Option<&mut Diagnostics>,
) -> Vec<Dependency> {
    let mut deps: Vec<Dependency> = Vec::new();
    for reference in scan_references(formula, sheet, spreadsheet, diagnostics) {
        if !deps.iter().any(|d| d.address == reference.address) {
            deps.push(Dependency {
                raw: reference.raw,
                address: reference.address,
            });
        }
    }
    deps
}

/// True as soon as `formula` contains one resolvable reference.
pub fn has_any_dependency(formula: &str, sheet: &str, spreadsheet: &Spreadsheet) -> bool {
    let masked = mask_string_literals(formula);
    reference_re().find_iter(&masked).any(|m| {
        matches!(
            resolve_match(&formula[m.range()], sheet, spreadsheet),
            Resolution::Address(_)
        )
    })
}

/// Blank out the contents of `"..."` literals, keeping byte offsets intact.
/// Spreadsheet formulas escape a quote inside a literal by doubling it.
fn mask_string_literals(formula: &str) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut in_string = false;

    for ch in formula.chars() {
        if ch == '"' {
            in_string = !in_string;
            out.push('"');
        } else if in_string {
            out.extend(std::iter::repeat_n(' ', ch.len_utf8()));
        } else {
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sheet::NamedExpression;

    fn spreadsheet() -> Spreadsheet {
        let mut ss = Spreadsheet::new();
        ss.set_named_expression(NamedExpression::new("length", Address::new("Calc", 3, 0)));
        ss
    }

    fn addresses(deps: &[Dependency]) -> Vec<String> {
        deps.iter().map(|d| d.address.to_string()).collect()
    }

    #[test]
    fn test_order_of_first_occurrence() {
        let ss = spreadsheet();
        let deps = resolve_dependencies(
            "x + [Sheet.B2] + y + [Sheet.A1] + [Sheet.B2]",
            "Calc",
            &ss,
            None,
        );
        assert_eq!(addresses(&deps), vec!["Sheet.B2", "Sheet.A1"]);
    }

    #[test]
    fn test_same_sheet_shorthand_and_absolute_markers() {
        let ss = spreadsheet();
        let deps = resolve_dependencies("[.A2]*[$Calc.$A$2]+[.$B$7]", "Calc", &ss, None);
        assert_eq!(addresses(&deps), vec!["Calc.A2", "Calc.B7"]);
        assert_eq!(deps[0].raw, "[.A2]");
    }

    #[test]
    fn test_sheet_name_with_dots() {
        let ss = spreadsheet();
        let mut diag = Diagnostics::new();
        let deps = resolve_dependencies(
            "[.A2]*['Calc v1.2'.$B$3]+[Other.C1]",
            "Calc v1.2",
            &ss,
            Some(&mut diag),
        );
        assert_eq!(
            deps.iter().map(|d| d.address.clone()).collect::<Vec<_>>(),
            vec![
                Address::new("Calc v1.2", 1, 0),
                Address::new("Calc v1.2", 2, 1),
                Address::new("Other", 0, 2),
            ]
        );
        assert!(diag.is_empty());
        assert!(has_any_dependency("[.A2]*2", "Calc v1.2", &ss));
    }

    #[test]
    fn test_named_expressions_and_builtins() {
        let ss = spreadsheet();
        let deps = resolve_dependencies("2*PI()*length + EXP(1) + width", "Calc", &ss, None);
        assert_eq!(deps.len(), 3);
        assert_eq!(deps[0].raw, "PI()");
        assert_eq!(deps[1].address, Address::new("Calc", 3, 0));
        assert_eq!(deps[2].raw, "EXP(1)");
    }

    #[test]
    fn test_function_names_are_not_dependencies() {
        let ss = spreadsheet();
        assert!(resolve_dependencies("SQRT(4) + EXP(2)", "Calc", &ss, None).is_empty());
        assert!(!has_any_dependency("SQRT(4) + 1.5e3", "Calc", &ss));
    }

    #[test]
    fn test_ranges_are_skipped_with_one_warning() {
        let ss = spreadsheet();
        let mut diag = Diagnostics::new();
        let formula = "SUM([.A1:.A4]) + [.B1]";
        for _ in 0..3 {
            let deps = resolve_dependencies(formula, "Calc", &ss, Some(&mut diag));
            assert_eq!(addresses(&deps), vec!["Calc.B1"]);
        }
        assert_eq!(diag.warnings().len(), 1);
        assert_eq!(diag.warnings()[0].count, 3);
    }

    #[test]
    fn test_string_literals_are_ignored() {
        let ss = spreadsheet();
        let refs = scan_references("IF([.A1]>0;\"length\";\"[.B2]\")", "Calc", &ss, None);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].span, 3..8);
    }

    #[test]
    fn test_has_any_dependency() {
        let ss = spreadsheet();
        assert!(has_any_dependency("length*2", "Calc", &ss));
        assert!(has_any_dependency("[.C3]", "Calc", &ss));
        assert!(!has_any_dependency("12*3", "Calc", &ss));
        assert!(!has_any_dependency("SUM([.A1:.A3])", "Calc", &ss));
    }
}
