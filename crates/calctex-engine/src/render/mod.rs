//! Derivation rendering.
//!
//! - [`Renderer`] - The dependency-aware render loop
//! - [`RenderOptions`], [`Phrases`] - Layout switches and wording
//! - [`blocks`] - The text block templates

pub mod blocks;
mod options;
mod renderer;

pub use options::{Phrases, RenderOptions};
pub use renderer::Renderer;

use crate::engine::{Result, Spreadsheet, Warning};

/// Output of one rendering run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rendered {
    /// Text blocks in emission order, each ending with an empty line.
    pub blocks: Vec<String>,
    pub warnings: Vec<Warning>,
}

impl Rendered {
    /// The whole document body.
    pub fn text(&self) -> String {
        self.blocks.concat()
    }
}

/// Render every printable row of `sheet` with a fresh [`Renderer`].
pub fn render_sheet(
    spreadsheet: &Spreadsheet,
    sheet: &str,
    options: RenderOptions,
) -> Result<Rendered> {
    let mut renderer = Renderer::new(spreadsheet, options);
    let blocks = renderer.render_sheet(sheet)?;
    Ok(Rendered {
        blocks,
        warnings: renderer.finish().into_warnings(),
    })
}
