//! Text blocks of the derivation.
//!
//! Pure functions of a quantity plus already-substituted formula text. The
//! renderer decides which block to emit; this module only decides how it
//! looks.

use crate::engine::{Address, Citation, Quantity};

use super::options::{Phrases, RenderOptions};

/// Cross-reference label of the equation of `addr`.
pub fn label(addr: &Address) -> String {
    format!("l_{}", addr)
}

/// `\cite[aux]{name}`, or `\cite{name}` without auxiliary text.
pub fn cite(citation: &Citation) -> String {
    if citation.aux.is_empty() {
        format!(r"\cite{{{}}}", citation.name)
    } else {
        format!(r"\cite[{}]{{{}}}", citation.aux, citation.name)
    }
}

/// ` \text{~unit}` or nothing.
pub fn unit(q: &Quantity) -> String {
    if q.unit_texput().is_empty() {
        String::new()
    } else {
        format!(r" \text{{~{}}}", q.unit_texput())
    }
}

fn source_suffix(q: &Quantity) -> String {
    if q.citation().is_empty() {
        String::new()
    } else {
        format!(" {}", cite(q.citation()))
    }
}

fn end_mark(with_comma: bool) -> &'static str {
    if with_comma { "," } else { "." }
}

pub fn first_uppercase(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `Description --- by formula \cite{..}:` heading line of an equation.
fn heading(q: &Quantity, phrase: &str, reference: &str, phrases: &Phrases) -> String {
    let description = first_uppercase(q.description());
    let dash = if description.is_empty() { "" } else { phrases.dash.as_str() };
    let phrase = if description.is_empty() {
        first_uppercase(phrase)
    } else {
        phrase.to_string()
    };
    format!("{}{}{}{}:\n", description, dash, phrase, reference)
}

/// A text row: `Description --- text`.
pub fn text_line(q: &Quantity, phrases: &Phrases) -> String {
    let description = first_uppercase(q.description());
    let sep = if !description.is_empty() && !q.text().is_empty() {
        phrases.dash.as_str()
    } else {
        ""
    };
    format!("{}{}{}\n", description, sep, q.text())
}

/// A constant statement: `Description $a = 5 \text{~m}$ \cite{src}.`
pub fn constant(q: &Quantity, value: &str) -> String {
    let description = first_uppercase(q.description());
    let space = if description.is_empty() { "" } else { " " };
    format!(
        "{}{}${} = {}{}${}.\n",
        description,
        space,
        q.texput(),
        value,
        unit(q),
        source_suffix(q)
    )
}

/// One line of a "where" clause. `value` is given for constants only.
pub fn where_line(q: &Quantity, value: Option<&str>) -> String {
    match value {
        Some(value) => format!(
            "${} = {}{}$ --- {}{}",
            q.texput(),
            value,
            unit(q),
            q.description(),
            source_suffix(q)
        ),
        None => format!("${}$ --- {}", q.texput(), q.description()),
    }
}

/// `where $a = 5$ --- length;\\ \phantom{where} $b$ --- ...`.
pub fn where_clause(lines: &[String], phrases: &Phrases) -> String {
    let joiner = format!(";\n\\\\ \\phantom{{{}}} ", phrases.where_);
    format!("{} {}.\n", phrases.where_, lines.join(&joiner))
}

/// The symbolic form only: `a = #1 \cdot 2` with symbols substituted.
pub fn equation_symbolic(
    q: &Quantity,
    symbols: &str,
    options: &RenderOptions,
    with_comma: bool,
) -> String {
    let numbered = options.use_equation_numbers;
    let env = if numbered { "equation" } else { "equation*" };
    let label = if numbered {
        format!("\n\t\\label{{{}}}", label(q.address()))
    } else {
        String::new()
    };
    let by_formula = format!("{}{}", options.phrases.by_formula, source_suffix(q));
    format!(
        "{}\\begin{{{env}}}\n\t{}\n\t= {}\n\t{}{}\n\\end{{{env}}}\n",
        heading(q, &by_formula, "", &options.phrases),
        q.texput(),
        symbols,
        end_mark(with_comma),
        label,
    )
}

/// Symbolic form, substituted numbers and the result.
///
/// Numbered equations (or `allow_symbolic_and_numeric_equation = false`)
/// use a two-line `gather`: the symbolic line carries the label and the
/// numeric line is `\notag`. Otherwise one `equation*` chains both forms.
pub fn equation_symbolic_numeric(
    q: &Quantity,
    symbols: &str,
    numbers: &str,
    value: &str,
    options: &RenderOptions,
    with_comma: bool,
) -> String {
    let numbered = options.use_equation_numbers;
    let star = if numbered { "" } else { "*" };
    let by_formula = format!("{}{}", options.phrases.by_formula, source_suffix(q));
    let head = heading(q, &by_formula, "", &options.phrases);
    let unit = unit(q);

    if numbered || !options.allow_symbolic_and_numeric_equation {
        let label = if numbered {
            format!("\n\t\\label{{{}}}", label(q.address()))
        } else {
            String::new()
        };
        let notag = if numbered { "\n\t\\notag" } else { "" };
        format!(
            "{head}\\begin{{gather{star}}}\n\t{t}\n\t= {symbols}\n\t,{label}\n\t\\\\\n\t{t}\n\t= {numbers}\n\t= {value}{unit}{end}{notag}\n\\end{{gather{star}}}\n",
            t = q.texput(),
            end = end_mark(with_comma),
        )
    } else {
        format!(
            "{head}\\begin{{equation{star}}}\n\t{t}\n\t= {symbols}\n\t= {numbers}\n\t= {value}{unit}{end}\n\\end{{equation{star}}}\n",
            t = q.texput(),
            end = end_mark(with_comma),
        )
    }
}

/// Numeric evaluation of an equation shown earlier.
pub fn equation_numeric(
    q: &Quantity,
    numbers: &str,
    value: &str,
    options: &RenderOptions,
    with_comma: bool,
) -> String {
    let head = if options.use_equation_numbers {
        let reference = format!(" (\\ref{{{}}})", label(q.address()));
        heading(q, &options.phrases.calculated_by_formula, &reference, &options.phrases)
    } else {
        heading(q, &options.phrases.calculated, "", &options.phrases)
    };
    format!(
        "{}\\begin{{equation*}}\n\t{}\n\t= {}\n\t= {}{}{}\n\\end{{equation*}}\n",
        head,
        q.texput(),
        numbers,
        value,
        unit(q),
        end_mark(with_comma),
    )
}
