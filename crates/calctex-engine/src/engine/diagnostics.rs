//! Deduplicated warnings.
//!
//! Recoverable problems (missing symbols, malformed redirects, range
//! references, ...) are reported once through `log::warn!` and then only
//! counted, so a quantity visited many times does not flood the output.

use std::collections::HashMap;

/// A warning message and how many times it was raised during a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub count: usize,
}

/// Warnings of one run, in order of first occurrence.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
    index: HashMap<String, usize>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning. Logs it on first occurrence and returns true then.
    pub fn warn(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        if let Some(&i) = self.index.get(&message) {
            self.warnings[i].count += 1;
            return false;
        }
        log::warn!("{}", message);
        self.index.insert(message.clone(), self.warnings.len());
        self.warnings.push(Warning { message, count: 1 });
        true
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Number of times `message` was raised.
    pub fn count(&self, message: &str) -> usize {
        self.index
            .get(message)
            .map_or(0, |&i| self.warnings[i].count)
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::Diagnostics;

    #[test]
    fn test_repeated_warning_is_counted_once() {
        let mut diag = Diagnostics::new();
        assert!(diag.warn("no texput for Calc.A2"));
        assert!(!diag.warn("no texput for Calc.A2"));
        assert!(diag.warn("range in Calc.A3"));
        assert_eq!(diag.warnings().len(), 2);
        assert_eq!(diag.count("no texput for Calc.A2"), 2);
        assert_eq!(diag.count("unknown"), 0);
        assert_eq!(diag.warnings()[1].message, "range in Calc.A3");
    }
}
