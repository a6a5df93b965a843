//! XML to element-tree parsing.

use super::{NodeId, Tree};
use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

/// Parse an XML document into `tree`, returning the root element.
///
/// Element order, attribute order (namespace declarations included) and
/// character content are preserved so a subsequent [`super::write_xml`]
/// reproduces the document structure exactly. Insignificant whitespace
/// between elements is dropped.
pub fn parse_xml(tree: &mut Tree, xml: &[u8]) -> Result<NodeId> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<NodeId> = Vec::new();
    let mut root: Option<NodeId> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let node = open_element(tree, &e)?;
                attach(tree, &mut stack, &mut root, node)?;
                stack.push(node);
            },
            Ok(Event::Empty(e)) => {
                let node = open_element(tree, &e)?;
                attach(tree, &mut stack, &mut root, node)?;
            },
            Ok(Event::End(_)) => {
                stack.pop();
            },
            Ok(Event::Text(e)) => {
                if let Some(current) = stack.last() {
                    let raw =
                        std::str::from_utf8(&e).map_err(|err| Error::Xml(err.to_string()))?;
                    let text = unescape(raw).map_err(|err| Error::Xml(err.to_string()))?;
                    match tree.text(*current)? {
                        Some(existing) => {
                            let mut combined = existing.to_string();
                            combined.push_str(&text);
                            tree.set_text(*current, &combined)?;
                        },
                        None => tree.set_text(*current, &text)?,
                    }
                }
            },
            Ok(Event::Eof) => break,
            Ok(_) => {},
            Err(e) => return Err(Error::Xml(e.to_string())),
        }
        buf.clear();
    }

    root.ok_or_else(|| Error::Xml("document has no root element".to_string()))
}

fn open_element(tree: &mut Tree, e: &BytesStart<'_>) -> Result<NodeId> {
    let tag = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| Error::Xml(err.to_string()))?
        .to_string();
    let node = tree.new_element(&tag);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::Xml(err.to_string()))?;
        let key =
            std::str::from_utf8(attr.key.as_ref()).map_err(|err| Error::Xml(err.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|err| Error::Xml(err.to_string()))?;
        tree.set_attr(node, key, &value)?;
    }
    Ok(node)
}

fn attach(
    tree: &mut Tree,
    stack: &mut [NodeId],
    root: &mut Option<NodeId>,
    node: NodeId,
) -> Result<()> {
    if let Some(parent) = stack.last() {
        tree.append_child(*parent, node)?;
    } else if root.is_none() {
        *root = Some(node);
    } else {
        return Err(Error::Xml("multiple root elements".to_string()));
    }
    Ok(())
}
