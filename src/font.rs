//! Reading and writing the sfnt container.
//!
//! Every table is kept as `<hexdata>`. The fields the normalizer works on
//! are decoded next to it: `unitsPerEm` from `head`, the ascender,
//! descender and line gap from `hhea`, and the typo and win metrics from
//! `OS/2`. Compiling writes those fields back over the raw bytes and
//! leaves the table directory and checksums to [`FontBuilder`].

use crate::error::{Result, VMetricsError};
use crate::fields::{self, HEAD, HHEA, OS2};
use crate::tag;
use crate::tree::{Element, FontTree, Node, ROOT};
use crate::utils::{hex_decode, hex_encode};
use log::debug;
use std::convert::TryFrom;
use std::ops::Range;
use write_fonts::from_obj::ToOwnedTable;
use write_fonts::read::tables::{compute_checksum, head, hhea, os2};
use write_fonts::read::{FontData, FontRead, FontRef, ReadError, TableProvider, TopLevelTable};
use write_fonts::tables::hhea::Hhea;
use write_fonts::types::{FWord, Tag};
use write_fonts::FontBuilder;

/// Element holding the bytes of a table.
pub const HEXDATA: &str = "hexdata";

const CHECKSUM_MAGIC: u32 = 0xB1B0AFBA;
const TT_SFNT_VERSION: u32 = 0x00010000;

/// `hhea` fields, all FWORDs.
const HHEA_FIELDS: [&str; 3] = ["ascent", "descent", "lineGap"];
/// Signed `OS/2` fields, in the order [`os2_ranges`] returns them.
const OS2_SIGNED_FIELDS: [&str; 3] = ["sTypoAscender", "sTypoDescender", "sTypoLineGap"];
const OS2_UNSIGNED_FIELDS: [&str; 2] = ["usWinAscent", "usWinDescent"];

fn bad_font(reason: impl Into<String>) -> VMetricsError {
    VMetricsError::BadFont {
        reason: reason.into(),
    }
}

fn read_error(tag: Tag) -> impl FnOnce(ReadError) -> VMetricsError {
    move |e| bad_font(format!("table {}: {}", tag, e))
}

/// Format an sfnt version the way TTX does: printable characters as
/// themselves, anything else as `\xNN`.
fn sfnt_version_to_xml(version: u32) -> String {
    version
        .to_be_bytes()
        .iter()
        .map(|&b| {
            if (0x20..0x7f).contains(&b) && b != b'\\' {
                (b as char).to_string()
            } else {
                format!("\\x{:02x}", b)
            }
        })
        .collect()
}

fn sfnt_version_from_xml(text: &str) -> Result<u32> {
    let bad_version = || bad_font(format!("bad sfntVersion {:?}", text));
    let bytes = text.as_bytes();
    let mut out = vec![];
    let mut i = 0;
    while i < bytes.len() {
        if text.get(i..i + 2) == Some("\\x") {
            let byte = text
                .get(i + 2..i + 4)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(bad_version)?;
            out.push(byte);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    let raw = <[u8; 4]>::try_from(out.as_slice()).map_err(|_| bad_version())?;
    Ok(u32::from_be_bytes(raw))
}

fn decode_fields(font: &FontRef, tag: Tag, table: FontData, element: &mut Element) -> Result<()> {
    match tag {
        head::Head::TAG => {
            let head = font.head().map_err(read_error(tag))?;
            element.set_value("unitsPerEm", head.units_per_em().to_string());
        }
        hhea::Hhea::TAG => {
            let hhea = hhea::Hhea::read(table).map_err(read_error(tag))?;
            let values = [hhea.ascender(), hhea.descender(), hhea.line_gap()];
            for (field, value) in HHEA_FIELDS.iter().zip(values.iter()) {
                element.set_value(field, value.to_i16().to_string());
            }
        }
        os2::Os2::TAG => {
            let os2 = font.os2().map_err(read_error(tag))?;
            let signed = [os2.s_typo_ascender(), os2.s_typo_descender(), os2.s_typo_line_gap()];
            for (field, value) in OS2_SIGNED_FIELDS.iter().zip(signed.iter()) {
                element.set_value(field, value.to_string());
            }
            let unsigned = [os2.us_win_ascent(), os2.us_win_descent()];
            for (field, value) in OS2_UNSIGNED_FIELDS.iter().zip(unsigned.iter()) {
                element.set_value(field, value.to_string());
            }
        }
        _ => {}
    }
    Ok(())
}

/// Decompile a binary font into a tree.
pub fn decompile(data: &[u8]) -> Result<FontTree> {
    let font = FontRef::new(data).map_err(|e| bad_font(e.to_string()))?;
    let mut root = Element::new(ROOT).with_attribute(
        "sfntVersion",
        sfnt_version_to_xml(font.table_directory.sfnt_version()),
    );
    for record in font.table_directory.table_records() {
        let tag = record.tag();
        let table = font.table_data(tag).ok_or_else(|| {
            bad_font(format!(
                "table {} (offset {}, length {}) runs past the end of the font",
                tag,
                record.offset(),
                record.length()
            ))
        })?;
        if compute_checksum(table.as_bytes()) != record.checksum() && tag != head::Head::TAG {
            debug!("checksum mismatch in table {}", tag);
        }
        let mut element = Element::new(tag::to_xml_name(tag));
        decode_fields(&font, tag, table, &mut element)?;
        let mut hexdata = Element::new(HEXDATA);
        hexdata.children.push(Node::Text(hex_encode(table.as_bytes())));
        element.push(hexdata);
        root.push(element);
    }
    Ok(FontTree::new(root))
}

/// The value of a decoded field, if the tree still has it.
fn edited<U: TryFrom<i64>>(element: &Element, table: &str, field: &str) -> Result<Option<U>> {
    match element.value(field) {
        Some(_) => fields::read_field(element, table, field).map(Some),
        None => Ok(None),
    }
}

fn put(bytes: &mut [u8], range: Range<usize>, value: &[u8]) -> Result<()> {
    let slot = bytes
        .get_mut(range.clone())
        .filter(|slot| slot.len() == value.len())
        .ok_or_else(|| bad_font(format!("no room for a field at {:?}", range)))?;
    slot.copy_from_slice(value);
    Ok(())
}

fn encode_head(mut bytes: Vec<u8>, element: &Element) -> Result<Vec<u8>> {
    let (units_per_em, checksum_adjustment) = {
        let head = head::Head::read(FontData::new(&bytes)).map_err(read_error(head::Head::TAG))?;
        let shape = head.shape();
        (
            shape.units_per_em_byte_range(),
            shape.checksum_adjustment_byte_range(),
        )
    };
    if let Some(value) = edited::<u16>(element, HEAD, "unitsPerEm")? {
        put(&mut bytes, units_per_em, &value.to_be_bytes())?;
    }
    // Filled in once the whole font is assembled.
    put(&mut bytes, checksum_adjustment, &[0; 4])?;
    Ok(bytes)
}

fn encode_hhea(bytes: &[u8], element: &Element) -> Result<Hhea> {
    let mut hhea: Hhea = hhea::Hhea::read(FontData::new(bytes))
        .map_err(read_error(hhea::Hhea::TAG))?
        .to_owned_table();
    let slots = [&mut hhea.ascender, &mut hhea.descender, &mut hhea.line_gap];
    for (field, slot) in HHEA_FIELDS.iter().zip(slots) {
        if let Some(value) = edited::<i16>(element, HHEA, field)? {
            *slot = FWord::new(value);
        }
    }
    Ok(hhea)
}

fn os2_ranges(bytes: &[u8]) -> Result<([Range<usize>; 3], [Range<usize>; 2])> {
    let os2 = os2::Os2::read(FontData::new(bytes)).map_err(read_error(os2::Os2::TAG))?;
    let shape = os2.shape();
    Ok((
        [
            shape.s_typo_ascender_byte_range(),
            shape.s_typo_descender_byte_range(),
            shape.s_typo_line_gap_byte_range(),
        ],
        [
            shape.us_win_ascent_byte_range(),
            shape.us_win_descent_byte_range(),
        ],
    ))
}

/// Patch the metrics into the table in place, so that fields the
/// normalizer never sees keep their exact bytes and version.
fn encode_os2(mut bytes: Vec<u8>, element: &Element) -> Result<Vec<u8>> {
    let (signed, unsigned) = os2_ranges(&bytes)?;
    for (field, range) in OS2_SIGNED_FIELDS.iter().zip(signed) {
        if let Some(value) = edited::<i16>(element, OS2, field)? {
            put(&mut bytes, range, &value.to_be_bytes())?;
        }
    }
    for (field, range) in OS2_UNSIGNED_FIELDS.iter().zip(unsigned) {
        if let Some(value) = edited::<u16>(element, OS2, field)? {
            put(&mut bytes, range, &value.to_be_bytes())?;
        }
    }
    Ok(bytes)
}

fn table_bytes(tag: Tag, element: &Element) -> Result<Vec<u8>> {
    let hexdata = element
        .child(HEXDATA)
        .ok_or_else(|| bad_font(format!("table {} has no hexdata to compile", tag)))?;
    hex_decode(&hexdata.text())
        .ok_or_else(|| bad_font(format!("table {} has malformed hexdata", tag)))
}

fn set_checksum_adjustment(font: &mut [u8]) -> Result<()> {
    let at = {
        let font_ref = FontRef::new(font).map_err(|e| bad_font(e.to_string()))?;
        let record = font_ref
            .table_directory
            .table_records()
            .iter()
            .find(|record| record.tag() == head::Head::TAG);
        let offset = match record {
            Some(record) => record.offset() as usize,
            None => return Ok(()),
        };
        let head = font_ref.head().map_err(read_error(head::Head::TAG))?;
        offset + head.shape().checksum_adjustment_byte_range().start
    };
    let adjustment = CHECKSUM_MAGIC.wrapping_sub(compute_checksum(font));
    put(font, at..at + 4, &adjustment.to_be_bytes())
}

/// Compile a tree back into a binary font.
pub fn compile(tree: &FontTree) -> Result<Vec<u8>> {
    let sfnt_version = match tree.root.attribute("sfntVersion") {
        Some(v) => sfnt_version_from_xml(v)?,
        None => TT_SFNT_VERSION,
    };
    let mut builder = FontBuilder::new();
    for element in tree.tables() {
        let tag = tag::from_xml_name(&element.name)?;
        if builder.contains(tag) {
            return Err(bad_font(format!("table {} appears twice", tag)));
        }
        let bytes = table_bytes(tag, element)?;
        match tag {
            head::Head::TAG => {
                builder.add_raw(tag, encode_head(bytes, element)?);
            }
            hhea::Hhea::TAG => {
                let hhea = encode_hhea(&bytes, element)?;
                builder
                    .add_table(&hhea)
                    .map_err(|e| bad_font(format!("table {}: {:?}", e.tag, e.inner)))?;
            }
            os2::Os2::TAG => {
                builder.add_raw(tag, encode_os2(bytes, element)?);
            }
            _ => {
                builder.add_raw(tag, bytes);
            }
        }
    }
    let mut font = builder.build();
    put(&mut font, 0..4, &sfnt_version.to_be_bytes())?;
    set_checksum_adjustment(&mut font)?;
    Ok(font)
}
