//! Cell address parsing and formatting.
//!
//! Provides bidirectional conversion between sheet-qualified cell addresses
//! (e.g., "Calc.A1", "Calc.B2", "Data.AA100") and zero-indexed row/column
//! coordinates. The text form doubles as the cross-reference label format.
//!
//! # Examples
//!
//! ```
//! use calctex_engine::engine::Address;
//!
//! let addr = Address::parse("Calc.B3").unwrap();
//! assert_eq!(addr.column, 1); // 0-indexed
//! assert_eq!(addr.row, 2);
//! assert_eq!(addr.to_string(), "Calc.B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::EngineError;

/// A reference to a cell by sheet name, row and column (0-indexed).
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address {
    pub sheet: String,
    pub row: usize,
    pub column: usize,
}

impl Address {
    pub fn new(sheet: impl Into<String>, row: usize, column: usize) -> Address {
        Address {
            sheet: sheet.into(),
            row,
            column,
        }
    }

    /// Parse an address from `Sheet.A1` notation.
    ///
    /// `$` absolute markers are ignored and a quoted sheet name
    /// (`'My sheet'.A1`, `''` for a quote) is unquoted. An unquoted sheet
    /// name ends at the last `.`. Returns None if the input is invalid.
    pub fn parse(text: &str) -> Option<Address> {
        let text = text.replace('$', "");
        if text.contains(':') {
            return None;
        }
        let (sheet, cell) = split_sheet(&text)?;
        Address::in_sheet(&sheet, cell)
    }

    /// Parse a bare cell part (`A1`, `$B$7`) as an address on `sheet`.
    pub fn in_sheet(sheet: &str, cell: &str) -> Option<Address> {
        let cell = cell.replace('$', "");
        let caps = cell_re().captures(&cell)?;

        let column = Self::letters_to_column(&caps["letters"])?;
        let row = caps["numbers"].parse::<usize>().ok()?.checked_sub(1)?;

        Some(Address::new(sheet, row, column))
    }

    /// The same row with column 0. All per-row state is keyed by this.
    pub fn row_address(&self) -> Address {
        Address::new(self.sheet.clone(), self.row, 0)
    }

    /// Copy of this address pointing at another column of the same row.
    pub fn with_column(&self, column: usize) -> Address {
        Address::new(self.sheet.clone(), self.row, column)
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn column_to_letters(column: usize) -> String {
        let mut result = String::new();
        let mut n = column as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// Convert spreadsheet-style letters back to a column index (A -> 0, AA -> 26).
    /// Returns None on empty input, non-letters or overflow.
    pub fn letters_to_column(letters: &str) -> Option<usize> {
        if letters.is_empty() {
            return None;
        }
        let mut acc = 0usize;
        for c in letters.to_ascii_uppercase().bytes() {
            if !c.is_ascii_uppercase() {
                return None;
            }
            let digit = (c - b'A') as usize + 1;
            acc = acc.checked_mul(26)?.checked_add(digit)?;
        }
        acc.checked_sub(1)
    }
}

fn split_sheet(text: &str) -> Option<(String, &str)> {
    let Some(rest) = text.strip_prefix('\'') else {
        return text
            .rsplit_once('.')
            .map(|(sheet, cell)| (sheet.to_string(), cell));
    };

    let mut sheet = String::new();
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        if c != '\'' {
            sheet.push(c);
            continue;
        }
        match rest[i + 1..].chars().next() {
            Some('\'') => {
                sheet.push('\'');
                chars.next();
            }
            Some('.') => return Some((sheet, &rest[i + 2..])),
            _ => return None,
        }
    }
    None
}

fn needs_quotes(sheet: &str) -> bool {
    sheet.contains(['.', '\'', ' '])
}

fn cell_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$")
            .expect("address regex must compile")
    })
}

impl std::str::FromStr for Address {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| EngineError::InvalidAddress(s.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if needs_quotes(&self.sheet) {
            write!(f, "'{}'", self.sheet.replace('\'', "''"))?;
        } else {
            write!(f, "{}", self.sheet)?;
        }
        write!(
            f,
            ".{}{}",
            Address::column_to_letters(self.column),
            self.row + 1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Address;

    #[test]
    fn test_column_letters_round_trip() {
        for n in 0..20_000 {
            let letters = Address::column_to_letters(n);
            assert_eq!(Address::letters_to_column(&letters), Some(n), "{letters}");
        }
    }

    #[test]
    fn test_column_letters_boundaries() {
        assert_eq!(Address::column_to_letters(0), "A");
        assert_eq!(Address::column_to_letters(25), "Z");
        assert_eq!(Address::column_to_letters(26), "AA");
        assert_eq!(Address::column_to_letters(701), "ZZ");
        assert_eq!(Address::column_to_letters(702), "AAA");
    }

    #[test]
    fn test_parse_strips_absolute_markers() {
        let addr = Address::parse("$Calc.$B$12").unwrap();
        assert_eq!(addr, Address::new("Calc", 11, 1));
    }

    #[test]
    fn test_parse_quoted_sheet() {
        let addr = Address::parse("'Load cases'.C3").unwrap();
        assert_eq!(addr.sheet, "Load cases");
        assert_eq!(addr.row, 2);
        assert_eq!(addr.column, 2);
    }

    #[test]
    fn test_parse_render_round_trip() {
        for text in ["Calc.A1", "Calc.Z9", "Data.AA100", "S.ABC7"] {
            assert_eq!(Address::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_sheet_names_with_dots_and_quotes_round_trip() {
        for sheet in ["v1.2", "Calc v1.2", "O'Brien", "Load cases", "a.b.c"] {
            let addr = Address::new(sheet, 4, 27);
            let text = addr.to_string();
            assert!(text.starts_with('\''), "{text}");
            assert_eq!(Address::parse(&text), Some(addr));
        }
        assert_eq!(Address::new("O'Brien", 0, 0).to_string(), "'O''Brien'.A1");
        assert_eq!(Address::new("Calc", 0, 0).to_string(), "Calc.A1");
    }

    #[test]
    fn test_unquoted_sheet_ends_at_last_dot() {
        assert_eq!(Address::parse("v1.2.B3"), Some(Address::new("v1.2", 2, 1)));
    }

    #[test]
    fn test_in_sheet() {
        assert_eq!(
            Address::in_sheet("Calc v1.2", "$A$2"),
            Some(Address::new("Calc v1.2", 1, 0))
        );
        assert!(Address::in_sheet("Calc", "2A").is_none());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Address::parse("A1").is_none());
        assert!(Address::parse("Calc.A0").is_none());
        assert!(Address::parse("Calc.1A").is_none());
        assert!(Address::parse("Calc.A").is_none());
        assert!(Address::parse("Calc.A1:B2").is_none());
        assert!(Address::parse("Calc.A1:.A4").is_none());
        assert!(Address::parse("'Calc.A1").is_none());
    }

    #[test]
    fn test_parse_overflow_returns_none() {
        let huge = format!("Calc.{}1", "Z".repeat(40));
        assert!(Address::parse(&huge).is_none());
    }

    #[test]
    fn test_row_address_drops_column() {
        let addr = Address::new("Calc", 4, 7);
        assert_eq!(addr.row_address(), Address::new("Calc", 4, 0));
    }
}
