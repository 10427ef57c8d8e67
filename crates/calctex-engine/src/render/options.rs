//! Rendering switches and the words used around formulas.

use serde::{Deserialize, Serialize};

/// How the renderer lays out equations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Number equations and label them so later blocks can `\ref` them.
    pub use_equation_numbers: bool,
    /// Put symbolic and numeric forms in one `equation` when no number is needed.
    pub allow_symbolic_and_numeric_equation: bool,
    /// List every dependency in "where" clauses, not only the unknown ones.
    pub always_write_where: bool,
    /// Print units next to substituted values.
    pub use_units: bool,
    /// Significant digits for rows without a `digits_count`.
    pub default_digits_count: i32,
    /// Treat rows with a non-empty `is_known` cell as already introduced.
    pub honor_known_flag: bool,
    pub phrases: Phrases,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            use_equation_numbers: true,
            allow_symbolic_and_numeric_equation: true,
            always_write_where: false,
            use_units: true,
            default_digits_count: 3,
            honor_known_flag: false,
            phrases: Phrases::default(),
        }
    }
}

/// Words placed around the formulas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Phrases {
    /// Introduces an equation: "Length --- by formula:".
    pub by_formula: String,
    /// Introduces a numeric evaluation of an earlier equation.
    pub calculated_by_formula: String,
    /// Same, when equations are not numbered and cannot be referenced.
    pub calculated: String,
    /// Starts a "where" clause.
    #[serde(rename = "where")]
    pub where_: String,
    /// Separates a description from the cell text of a text row.
    pub dash: String,
}

impl Default for Phrases {
    fn default() -> Self {
        Phrases {
            by_formula: "by formula".to_string(),
            calculated_by_formula: "calculated by formula".to_string(),
            calculated: "calculated value".to_string(),
            where_: "where".to_string(),
            dash: " --- ".to_string(),
        }
    }
}

impl Phrases {
    /// The wording of GOST-style Russian reports.
    pub fn russian() -> Self {
        Phrases {
            by_formula: "по формуле".to_string(),
            calculated_by_formula: "расчет значения по формуле".to_string(),
            calculated: "расчет значения".to_string(),
            where_: "где".to_string(),
            dash: " --- ".to_string(),
        }
    }
}
