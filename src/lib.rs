//! Normalize the vertical metrics of OpenType fonts.
//!
//! The `OS/2` typo and win metrics and the `hhea` ascender, descender and
//! line gap are rewritten so that a font has the same line spacing in every
//! environment. The fonts themselves are handled as [`FontTree`]s, which a
//! [`FontCompiler`] produces from and turns back into font binaries.

pub mod compiler;
mod error;
pub mod fields;
pub mod fix;
pub mod font;
pub mod metrics;
pub mod tag;
pub mod tree;
pub mod ttx;
mod utils;

pub use crate::compiler::{FontCompiler, SfntCompiler, TtxCompiler};
pub use crate::error::{Result, VMetricsError};
pub use crate::fix::{fix_font_tree, fix_vertical_metrics, fix_vertical_metrics_with_report};
pub use crate::metrics::{
    LineSpacingFactor, LineSpacingPolicy, Report, VerticalMetricsInput, VerticalMetricsOutput,
    DEFAULT_LINE_SPACING_FACTOR,
};
pub use crate::tree::{Element, FontTree, Node};
