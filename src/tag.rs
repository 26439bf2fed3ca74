//! The names tables go by in a TTX tree.

use crate::error::{Result, VMetricsError};
use write_fonts::types::Tag;

/// The element name TTX uses for this table.
///
/// `OS/2` becomes `OS_2`; tags which are already XML identifiers lose
/// their trailing padding (`cvt ` becomes `cvt`); anything else is
/// written as `_` followed by the tag bytes in hex.
pub fn to_xml_name(tag: Tag) -> String {
    let raw = tag.into_bytes();
    if &raw == b"OS/2" {
        return "OS_2".to_string();
    }
    let text = std::str::from_utf8(&raw).unwrap_or("");
    let trimmed = text.trim_end_matches(' ');
    let mut chars = trimmed.chars();
    let is_identifier = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_identifier {
        trimmed.to_string()
    } else {
        let hex: String = raw.iter().map(|b| format!("{:02x}", b)).collect();
        format!("_{}", hex)
    }
}

fn bad_tag(name: &str) -> VMetricsError {
    VMetricsError::BadFont {
        reason: format!("{:?} does not name a table", name),
    }
}

/// Inverse of [`to_xml_name`].
pub fn from_xml_name(name: &str) -> Result<Tag> {
    if name == "OS_2" {
        return Ok(Tag::new(b"OS/2"));
    }
    if name.len() == 9 && name.starts_with('_') {
        let bytes: Option<Vec<u8>> = (1..9)
            .step_by(2)
            .map(|i| name.get(i..i + 2))
            .map(|pair| pair.and_then(|pair| u8::from_str_radix(pair, 16).ok()))
            .collect();
        if let Some(bytes) = bytes {
            return Tag::new_checked(&bytes).map_err(|_| bad_tag(name));
        }
    }
    Tag::new_checked(name.as_bytes()).map_err(|_| bad_tag(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn xml_names() {
        assert_eq!(to_xml_name(Tag::new(b"OS/2")), "OS_2");
        assert_eq!(to_xml_name(Tag::new(b"hhea")), "hhea");
        assert_eq!(to_xml_name(Tag::new(b"cvt ")), "cvt");
        assert_eq!(to_xml_name(Tag::new(b"CFF ")), "CFF");
        assert_eq!(to_xml_name(Tag::new(b"1abc")), "_31616263");
        assert_eq!(to_xml_name(Tag::new(b"a/b ")), "_612f6220");
    }

    #[test]
    fn xml_names_round_trip() {
        for raw in &[b"OS/2", b"hhea", b"cvt ", b"1abc", b"a/b ", b"DSIG", b"_ab "] {
            let tag = Tag::new(raw);
            assert_eq!(from_xml_name(&to_xml_name(tag)).unwrap(), tag);
        }
    }

    #[test]
    fn unusable_names() {
        // The last two are nine bytes long but not ASCII.
        let names = [
            "",
            "oopsy",
            "\nok",
            "_zz616263",
            "_a\u{e9}bcdef",
            "_\u{e9}\u{e9}\u{e9}\u{e9}",
        ];
        for name in &names {
            assert!(matches!(from_xml_name(name), Err(VMetricsError::BadFont { .. })));
        }
    }
}
