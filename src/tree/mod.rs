//! Attributed element tree backing the presentation DOM.
//!
//! Nodes live in a generational arena and are addressed by [`NodeId`]
//! handles. Views higher up the crate (shapes, cells, paragraphs) hold
//! handles, never owned data, so a mutation through any view is visible
//! through every other view over the same node. Removing a node frees its
//! whole subtree and bumps the slot generations, which turns any retained
//! handle into a clean [`Error::DetachedShape`] instead of a stale read.

mod parse;
mod write;

pub use parse::parse_xml;
pub use write::write_xml;

use crate::error::{Error, Result};
use smallvec::SmallVec;

/// Generational handle to an element in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// A single XML element: qualified tag, attributes in document order,
/// child elements and optional character content.
#[derive(Debug, Clone)]
pub struct Element {
    tag: Box<str>,
    attrs: SmallVec<[(Box<str>, Box<str>); 4]>,
    children: Vec<NodeId>,
    text: Option<String>,
    parent: Option<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Element {
            tag: tag.into(),
            attrs: SmallVec::new(),
            children: Vec::new(),
            text: None,
            parent: None,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_ref(), v.as_ref()))
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// Arena of XML elements.
#[derive(Debug, Default)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Tree {
    pub fn new() -> Self {
        Tree::default()
    }

    /// Create a new detached element with the given qualified tag.
    pub fn new_element(&mut self, tag: &str) -> NodeId {
        let element = Element::new(tag);
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.element = Some(element);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                element: Some(element),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|s| s.generation == id.generation && s.element.is_some())
    }

    pub fn get(&self, id: NodeId) -> Result<&Element> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.element.as_ref())
            .ok_or(Error::DetachedShape)
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Element> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.element.as_mut())
            .ok_or(Error::DetachedShape)
    }

    pub fn tag(&self, id: NodeId) -> Result<&str> {
        Ok(self.get(id)?.tag())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Result<Option<&str>> {
        Ok(self
            .get(id)?
            .attrs
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_ref()))
    }

    pub fn attr_i64(&self, id: NodeId, name: &str) -> Result<Option<i64>> {
        Ok(self.attr(id, name)?.and_then(|v| v.parse().ok()))
    }

    pub fn attr_u32(&self, id: NodeId, name: &str) -> Result<Option<u32>> {
        Ok(self.attr(id, name)?.and_then(|v| v.parse().ok()))
    }

    /// Boolean attribute per the xsd:boolean lexical space ("1"/"true").
    pub fn attr_bool(&self, id: NodeId, name: &str) -> Result<bool> {
        Ok(matches!(self.attr(id, name)?, Some("1") | Some("true")))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        let element = self.get_mut(id)?;
        if let Some(entry) = element.attrs.iter_mut().find(|(k, _)| k.as_ref() == name) {
            entry.1 = value.into();
        } else {
            element.attrs.push((name.into(), value.into()));
        }
        Ok(())
    }

    pub fn set_attr_i64(&mut self, id: NodeId, name: &str, value: i64) -> Result<()> {
        let mut buf = itoa::Buffer::new();
        self.set_attr(id, name, buf.format(value))
    }

    pub fn set_attr_bool(&mut self, id: NodeId, name: &str, value: bool) -> Result<()> {
        self.set_attr(id, name, if value { "1" } else { "0" })
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<()> {
        self.get_mut(id)?.attrs.retain(|(k, _)| k.as_ref() != name);
        Ok(())
    }

    pub fn text(&self, id: NodeId) -> Result<Option<&str>> {
        Ok(self.get(id)?.text())
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<()> {
        self.get_mut(id)?.text = Some(text.to_string());
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(id)?.parent)
    }

    /// Child elements in document order. Returns an owned list so callers
    /// may mutate the tree while iterating.
    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self.get(id)?.children.clone())
    }

    pub fn child_count(&self, id: NodeId) -> Result<usize> {
        Ok(self.get(id)?.children.len())
    }

    /// First direct child with the given qualified tag.
    pub fn find_child(&self, id: NodeId, tag: &str) -> Result<Option<NodeId>> {
        for child in &self.get(id)?.children {
            if self.get(*child)?.tag() == tag {
                return Ok(Some(*child));
            }
        }
        Ok(None)
    }

    /// First direct child with the given tag, appending one if absent.
    pub fn get_or_add_child(&mut self, id: NodeId, tag: &str) -> Result<NodeId> {
        if let Some(child) = self.find_child(id, tag)? {
            return Ok(child);
        }
        let child = self.new_element(tag);
        self.append_child(id, child)?;
        Ok(child)
    }

    /// Pre-order traversal of the subtree rooted at `id`, including `id`.
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            let element = self.get(node)?;
            for child in element.children.iter().rev() {
                stack.push(*child);
            }
        }
        Ok(out)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.get(parent)?;
        self.detach(child)?;
        self.get_mut(child)?.parent = Some(parent);
        self.get_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Insert `new` immediately before `sibling` under the same parent.
    pub fn insert_before(&mut self, sibling: NodeId, new: NodeId) -> Result<()> {
        let parent = self
            .parent(sibling)?
            .ok_or_else(|| Error::Xml("cannot insert before a root element".to_string()))?;
        self.detach(new)?;
        self.get_mut(new)?.parent = Some(parent);
        let children = &mut self.get_mut(parent)?.children;
        let pos = children
            .iter()
            .position(|c| *c == sibling)
            .ok_or(Error::DetachedShape)?;
        children.insert(pos, new);
        Ok(())
    }

    /// Unlink `id` from its parent without freeing it.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        if let Some(parent) = self.get(id)?.parent {
            self.get_mut(parent)?.children.retain(|c| *c != id);
            self.get_mut(id)?.parent = None;
        }
        Ok(())
    }

    /// Remove `id` and free its whole subtree.
    ///
    /// Every handle into the removed subtree becomes detached: any
    /// further access through it fails with [`Error::DetachedShape`].
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        self.detach(id)?;
        for node in self.descendants(id)? {
            let slot = &mut self.slots[node.index as usize];
            slot.element = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node.index);
        }
        Ok(())
    }

    /// Concatenated text of every descendant element that carries
    /// character content, in document order.
    pub fn gather_text(&self, id: NodeId) -> Result<String> {
        let mut out = String::new();
        for node in self.descendants(id)? {
            if let Some(text) = self.get(node)?.text() {
                out.push_str(text);
            }
        }
        Ok(out)
    }
}
