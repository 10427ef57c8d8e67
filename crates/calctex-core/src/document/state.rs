use calctex_engine::engine::Spreadsheet;
use calctex_engine::render::RenderOptions;
use std::path::PathBuf;

/// Default output file name.
pub const DEFAULT_TEX_FILE: &str = "data_calc.tex";

/// A calculation sheet and where its derivation goes.
pub struct Document {
    /// The .ods file to read
    pub ods_path: PathBuf,
    /// Sheet whose rows are rendered
    pub sheet: String,
    /// The TeX file to write
    pub tex_path: PathBuf,
    pub options: RenderOptions,
    /// Spreadsheet of the last successful load
    pub(crate) spreadsheet: Option<Spreadsheet>,
}

impl Document {
    /// Create a document.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new(ods_path: impl Into<PathBuf>, sheet: &str) -> Self {
        Document {
            ods_path: ods_path.into(),
            sheet: sheet.to_string(),
            tex_path: PathBuf::from(DEFAULT_TEX_FILE),
            options: RenderOptions::default(),
            spreadsheet: None,
        }
    }

    pub fn with_tex_path(mut self, tex_path: impl Into<PathBuf>) -> Self {
        self.tex_path = tex_path.into();
        self
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn spreadsheet(&self) -> Option<&Spreadsheet> {
        self.spreadsheet.as_ref()
    }
}
