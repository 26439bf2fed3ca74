//! Reading the raw metrics out of a font's tables and writing the
//! normalized ones back.

use crate::error::{Result, VMetricsError};
use crate::metrics::{LineSpacingFactor, VerticalMetricsInput, VerticalMetricsOutput};
use crate::tree::Element;
use std::collections::BTreeMap;
use std::convert::TryFrom;

/// XML names of the tables the metrics live in.
pub const OS2: &str = "OS_2";
pub const HHEA: &str = "hhea";
pub const HEAD: &str = "head";

/// A field value as a table representation holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(i64),
}

/// Something with named fields holding integers, either as numbers or as
/// numeric strings.
pub trait MetricsTable {
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
    fn set_field(&mut self, name: &str, value: i64);
}

impl MetricsTable for Element {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        self.value(name).map(FieldValue::Text)
    }

    fn set_field(&mut self, name: &str, value: i64) {
        self.set_value(name, value.to_string());
    }
}

impl MetricsTable for BTreeMap<String, i64> {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        self.get(name).copied().map(FieldValue::Number)
    }

    fn set_field(&mut self, name: &str, value: i64) {
        self.insert(name.to_string(), value);
    }
}

pub(crate) fn read_field<T, U>(table: &T, table_name: &str, field: &str) -> Result<U>
where
    T: MetricsTable + ?Sized,
    U: TryFrom<i64>,
{
    let malformed = |value: String| VMetricsError::MalformedField {
        table: table_name.to_string(),
        field: field.to_string(),
        value,
    };
    let raw = match table.field(field) {
        Some(FieldValue::Number(n)) => n,
        Some(FieldValue::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| malformed(s.to_string()))?,
        None => {
            return Err(VMetricsError::MissingField {
                table: table_name.to_string(),
                field: field.to_string(),
            })
        }
    };
    U::try_from(raw).map_err(|_| malformed(raw.to_string()))
}

/// Read the six raw metrics from the `OS/2`, `hhea` and `head` tables.
pub fn extract<T>(
    os2: &T,
    hhea: &T,
    head: &T,
    line_spacing_factor: LineSpacingFactor,
) -> Result<VerticalMetricsInput>
where
    T: MetricsTable + ?Sized,
{
    let units_per_em: u32 = read_field(head, HEAD, "unitsPerEm")?;
    if units_per_em == 0 {
        return Err(VMetricsError::MalformedField {
            table: HEAD.to_string(),
            field: "unitsPerEm".to_string(),
            value: "0".to_string(),
        });
    }
    Ok(VerticalMetricsInput {
        typo_ascender: read_field(os2, OS2, "sTypoAscender")?,
        typo_descender: read_field(os2, OS2, "sTypoDescender")?,
        typo_line_gap: read_field(os2, OS2, "sTypoLineGap")?,
        hhea_ascender: read_field(hhea, HHEA, "ascent")?,
        hhea_descender: read_field(hhea, HHEA, "descent")?,
        units_per_em,
        line_spacing_factor,
    })
}

/// Write normalized metrics back to the `OS/2` and `hhea` tables.
pub fn write<T>(os2: &mut T, hhea: &mut T, metrics: &VerticalMetricsOutput)
where
    T: MetricsTable + ?Sized,
{
    os2.set_field("sTypoAscender", metrics.typo_ascender.into());
    os2.set_field("sTypoDescender", metrics.typo_descender.into());
    os2.set_field("sTypoLineGap", metrics.typo_line_gap.into());
    os2.set_field("usWinAscent", metrics.win_ascent.into());
    os2.set_field("usWinDescent", metrics.win_descent.into());

    hhea.set_field("ascent", metrics.hhea_ascender.into());
    hhea.set_field("descent", metrics.hhea_descender.into());
    hhea.set_field("lineGap", metrics.hhea_line_gap.into());
}
