//! Normalizing the vertical metrics of a whole font.

use crate::compiler::FontCompiler;
use crate::error::{Result, VMetricsError};
use crate::fields::{self, HEAD, HHEA, OS2};
use crate::metrics::{LineSpacingFactor, Report, VerticalMetricsOutput};
use crate::tree::FontTree;
use log::{info, warn};

/// Smallest blob which can hold an sfnt header.
const MIN_FONT_SIZE: usize = 12;

/// Rewrite the vertical metrics of a tree in place.
///
/// Returns `Ok(None)`, leaving the tree untouched, if the font lacks one of
/// the `OS/2`, `hhea` or `head` tables.
pub fn fix_font_tree(
    tree: &mut FontTree,
    line_spacing_factor: LineSpacingFactor,
) -> Result<Option<Report>> {
    let input = match (tree.table(OS2), tree.table(HHEA), tree.table(HEAD)) {
        (Some(os2), Some(hhea), Some(head)) => {
            fields::extract(os2, hhea, head, line_spacing_factor)?
        }
        (None, _, _) => return no_table(OS2),
        (_, None, _) => return no_table(HHEA),
        (_, _, None) => return no_table(HEAD),
    };
    let report = Report::new(input);
    check_win_metrics(&report.after)?;
    info!(
        "Using the {} policy: hhea {}/{} -> {}/{}, win {}/{}",
        report.policy,
        report.before.hhea_ascender,
        report.before.hhea_descender,
        report.after.hhea_ascender,
        report.after.hhea_descender,
        report.after.win_ascent,
        report.after.win_descent
    );
    if let (Some(os2), Some(hhea)) = tree.table_pair_mut(OS2, HHEA) {
        fields::write(os2, hhea, &report.after);
    }
    Ok(Some(report))
}

/// The win metrics are unsigned copies of the hhea ascender and the
/// negated hhea descender, so an ascender below the baseline or a
/// descender above it cannot be written.
fn check_win_metrics(after: &VerticalMetricsOutput) -> Result<()> {
    let unmirrorable = if after.hhea_ascender < 0 {
        Some(("ascent", after.hhea_ascender))
    } else if after.hhea_descender > 0 {
        Some(("descent", after.hhea_descender))
    } else {
        None
    };
    match unmirrorable {
        Some((field, value)) => Err(VMetricsError::MalformedField {
            table: HHEA.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }),
        None => Ok(()),
    }
}

fn no_table(table: &str) -> Result<Option<Report>> {
    let missing = VMetricsError::MissingTable {
        table: table.to_string(),
    };
    info!("{}; leaving vertical metrics alone", missing);
    Ok(None)
}

/// Normalize the vertical metrics of a font binary.
///
/// A font without the tables needed comes back byte for byte unchanged.
pub fn fix_vertical_metrics<C: FontCompiler + ?Sized>(
    compiler: &C,
    data: &[u8],
    line_spacing_factor: LineSpacingFactor,
) -> Result<Vec<u8>> {
    fix_vertical_metrics_with_report(compiler, data, line_spacing_factor).map(|(data, _)| data)
}

/// As [`fix_vertical_metrics`], also returning what was done.
pub fn fix_vertical_metrics_with_report<C: FontCompiler + ?Sized>(
    compiler: &C,
    data: &[u8],
    line_spacing_factor: LineSpacingFactor,
) -> Result<(Vec<u8>, Option<Report>)> {
    if data.len() < MIN_FONT_SIZE {
        return Err(VMetricsError::InvalidArgument {
            reason: format!("{} bytes is too short to be a font", data.len()),
        });
    }
    let mut tree = compiler.decompile(data)?;
    match fix_font_tree(&mut tree, line_spacing_factor)? {
        Some(report) => Ok((compiler.compile(&tree)?, Some(report))),
        None => {
            warn!("Font was not modified");
            Ok((data.to_vec(), None))
        }
    }
}
