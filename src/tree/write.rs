//! Element-tree to XML serialization.

use super::{NodeId, Tree};
use crate::error::Result;

/// Serialize the subtree rooted at `id` to XML bytes.
///
/// Elements, attributes and text are emitted in stored order with
/// standard entity escaping, so `parse_xml` followed by `write_xml`
/// round-trips the document structure.
pub fn write_xml(tree: &Tree, id: NodeId) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_element(tree, id, &mut out)?;
    Ok(out)
}

fn write_element(tree: &Tree, id: NodeId, out: &mut Vec<u8>) -> Result<()> {
    let element = tree.get(id)?;
    out.push(b'<');
    out.extend_from_slice(element.tag().as_bytes());
    for (key, value) in element.attrs() {
        out.push(b' ');
        out.extend_from_slice(key.as_bytes());
        out.extend_from_slice(b"=\"");
        escape_into(value, true, out);
        out.push(b'"');
    }

    let children = tree.children(id)?;
    let text = element.text();
    if children.is_empty() && text.is_none() {
        out.extend_from_slice(b"/>");
        return Ok(());
    }

    out.push(b'>');
    if let Some(text) = text {
        escape_into(text, false, out);
    }
    for child in children {
        write_element(tree, child, out)?;
    }
    out.extend_from_slice(b"</");
    out.extend_from_slice(element.tag().as_bytes());
    out.push(b'>');
    Ok(())
}

fn escape_into(value: &str, in_attr: bool, out: &mut Vec<u8>) {
    for byte in value.bytes() {
        match byte {
            b'<' => out.extend_from_slice(b"&lt;"),
            b'>' => out.extend_from_slice(b"&gt;"),
            b'&' => out.extend_from_slice(b"&amp;"),
            b'"' if in_attr => out.extend_from_slice(b"&quot;"),
            _ => out.push(byte),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_xml;

    #[test]
    fn test_write_round_trip() {
        let xml = br#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title &amp; More"/></p:nvSpPr><p:txBody><a:p><a:r><a:t>x &lt; y</a:t></a:r></a:p></p:txBody></p:sp>"#;
        let mut tree = Tree::new();
        let root = parse_xml(&mut tree, xml).unwrap();
        let written = write_xml(&tree, root).unwrap();
        assert_eq!(written, xml.to_vec());
    }

    #[test]
    fn test_write_empty_element_collapses() {
        let mut tree = Tree::new();
        let node = tree.new_element("a:bodyPr");
        tree.set_attr(node, "wrap", "none").unwrap();
        assert_eq!(write_xml(&tree, node).unwrap(), b"<a:bodyPr wrap=\"none\"/>");
    }
}
