//! Converting between TTX XML and [`FontTree`]s.

use crate::error::{Result, VMetricsError};
use crate::tree::{Element, FontTree, Node};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fmt::Display;

fn xml_error(e: impl Display) -> VMetricsError {
    VMetricsError::Xml {
        reason: e.to_string(),
    }
}

fn decode_name(raw: &[u8]) -> Result<String> {
    std::str::from_utf8(raw).map(str::to_string).map_err(xml_error)
}

fn start_element(start: &BytesStart) -> Result<Element> {
    let mut element = Element::new(decode_name(start.name().as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(xml_error)?;
        let key = decode_name(attribute.key.as_ref())?;
        let value = attribute.unescape_value().map_err(xml_error)?;
        element.attributes.insert(key, value.into_owned());
    }
    Ok(element)
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, node: Node) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(node);
            Ok(())
        }
        None => match node {
            Node::Element(e) if root.is_none() => {
                *root = Some(e);
                Ok(())
            }
            Node::Element(e) => Err(xml_error(format!(
                "second root element <{}> in document",
                e.name
            ))),
            // Comments and whitespace around the root are dropped.
            _ => Ok(()),
        },
    }
}

/// Parse TTX XML into a tree.
pub fn parse(xml: &str) -> Result<FontTree> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = vec![];
    let mut root: Option<Element> = None;
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => stack.push(start_element(&start)?),
            Event::Empty(start) => {
                let element = start_element(&start)?;
                attach(&mut stack, &mut root, Node::Element(element))?;
            }
            Event::End(end) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| xml_error("closing tag without an opening one"))?;
                if end.name().as_ref() != element.name.as_bytes() {
                    return Err(xml_error(format!(
                        "<{}> closed by </{}>",
                        element.name,
                        String::from_utf8_lossy(end.name().as_ref())
                    )));
                }
                attach(&mut stack, &mut root, Node::Element(element))?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(xml_error)?;
                attach(&mut stack, &mut root, Node::Text(text.into_owned()))?;
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                attach(&mut stack, &mut root, Node::Text(text))?;
            }
            Event::Comment(comment) => {
                // Comment bodies are not escaped.
                let text = String::from_utf8_lossy(&comment.into_inner()).into_owned();
                attach(&mut stack, &mut root, Node::Comment(text))?;
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }
    if let Some(open) = stack.last() {
        return Err(xml_error(format!("<{}> is never closed", open.name)));
    }
    root.map(FontTree::new)
        .ok_or_else(|| xml_error("document has no root element"))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(xml_error);
    }
    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(t) => writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(xml_error)?,
            Node::Comment(c) => writer
                .write_event(Event::Comment(BytesText::from_escaped(c.as_str())))
                .map_err(xml_error)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_error)
}

/// Serialize a tree as TTX XML.
pub fn build(tree: &FontTree) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    write_element(&mut writer, &tree.root)?;
    let mut xml = String::from_utf8(writer.into_inner()).map_err(xml_error)?;
    xml.push('\n');
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TTX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ttFont sfntVersion="\x00\x01\x00\x00" ttLibVersion="4.38">

  <GlyphOrder>
    <!-- The 'id' attribute is only for humans; it is ignored when parsed. -->
    <GlyphID id="0" name=".notdef"/>
    <GlyphID id="1" name="A&amp;B"/>
  </GlyphOrder>

  <head>
    <!-- Most of this table will be recalculated by the compiler -->
    <tableVersion value="1.0"/>
    <unitsPerEm value="1000"/>
    <created value="Tue Jan 28 21:31:22 2020"/>
  </head>

  <hhea>
    <tableVersion value="0x00010000"/>
    <ascent value="800"/>
    <descent value="-200"/>
    <lineGap value="0"/>
  </hhea>

  <prep>
    <assembly>
      PUSHB[ ]
      1
    </assembly>
  </prep>

</ttFont>
"#;

    #[test]
    fn parse_ttx() {
        let tree = parse(TTX).unwrap();
        assert_eq!(tree.root.name, "ttFont");
        assert_eq!(tree.root.attribute("sfntVersion"), Some("\\x00\\x01\\x00\\x00"));
        assert_eq!(
            tree.tables().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            vec!["GlyphOrder", "head", "hhea", "prep"]
        );
        assert_eq!(tree.table("hhea").unwrap().value("descent"), Some("-200"));
        assert_eq!(tree.table("head").unwrap().value("unitsPerEm"), Some("1000"));
        let glyph = tree.table("GlyphOrder").unwrap().elements().nth(1).unwrap();
        assert_eq!(glyph.attribute("name"), Some("A&B"));
        assert!(matches!(
            tree.table("head").unwrap().children[0],
            Node::Comment(_)
        ));
        let assembly = tree.table("prep").unwrap().child("assembly").unwrap();
        assert!(assembly.text().starts_with("PUSHB[ ]"));
    }

    #[test]
    fn build_is_reparseable() {
        let tree = parse(TTX).unwrap();
        let xml = build(&tree).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<ascent value=\"800\"/>"));
        assert!(xml.contains("name=\"A&amp;B\""));
        assert!(xml.contains("<!-- The 'id' attribute"));
        assert_eq!(parse(&xml).unwrap(), tree);
        assert_eq!(build(&parse(&xml).unwrap()).unwrap(), xml);
    }

    #[test]
    fn edits_survive_a_round_trip() {
        let mut tree = parse(TTX).unwrap();
        tree.table_mut("hhea").unwrap().set_value("ascent", "850");
        let reparsed = parse(&build(&tree).unwrap()).unwrap();
        assert_eq!(reparsed.table("hhea").unwrap().value("ascent"), Some("850"));
    }

    #[test]
    fn malformed_xml() {
        assert!(matches!(parse("<ttFont><head></ttFont>"), Err(VMetricsError::Xml { .. })));
        assert!(matches!(parse("<ttFont><head>"), Err(VMetricsError::Xml { .. })));
        assert!(matches!(parse(""), Err(VMetricsError::Xml { .. })));
        assert!(matches!(parse("<a/><b/>"), Err(VMetricsError::Xml { .. })));
    }
}
