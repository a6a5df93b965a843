//! Presentation document: slide-type parts and their inheritance wiring.
//!
//! A [`Presentation`] owns the element tree, the list of slide-type
//! parts and the relationship registry. Each part records the base part
//! it inherits placeholder formatting from: slide → layout → master, and
//! notes slide → notes master.

use crate::enums::{ContainerKind, PlaceholderType};
use crate::error::{Error, Result};
use crate::parts::PartStore;
use crate::shapes::ShapeCollection;
use crate::tree::{NodeId, Tree, parse_xml, write_xml};

pub const NS_DRAWINGML: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const NS_PRESENTATIONML: &str =
    "http://schemas.openxmlformats.org/presentationml/2006/main";
pub const NS_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Identifier of a slide-type part within a [`Presentation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartId(pub(crate) usize);

#[derive(Debug)]
pub(crate) struct SlidePart {
    pub root: NodeId,
    pub sp_tree: NodeId,
    pub kind: ContainerKind,
    pub base: Option<PartId>,
}

/// An in-memory presentation document.
#[derive(Debug, Default)]
pub struct Presentation {
    pub(crate) tree: Tree,
    parts: Vec<SlidePart>,
    pub(crate) store: PartStore,
}

impl Presentation {
    pub fn new() -> Self {
        Presentation::default()
    }

    /// Add an empty slide master.
    pub fn add_master(&mut self) -> Result<PartId> {
        self.new_part(ContainerKind::Master, None)
    }

    /// Add an empty slide layout based on `master`.
    pub fn add_layout(&mut self, master: PartId) -> Result<PartId> {
        self.expect_kind(master, ContainerKind::Master)?;
        self.new_part(ContainerKind::Layout, Some(master))
    }

    /// Add a slide based on `layout`.
    ///
    /// Cloneable placeholders on the layout (everything except date,
    /// footer and slide-number) are copied onto the new slide so it
    /// starts with the layout's content slots.
    pub fn add_slide(&mut self, layout: PartId) -> Result<PartId> {
        self.expect_kind(layout, ContainerKind::Layout)?;
        let slide = self.new_part(ContainerKind::Slide, Some(layout))?;

        let layout_phs = self.shapes(layout)?.placeholders(self)?;
        let mut shapes = self.shapes(slide)?;
        for ph in layout_phs {
            let format = ph.placeholder_format(self)?;
            if matches!(
                format.ph_type,
                PlaceholderType::Date | PlaceholderType::Footer | PlaceholderType::SlideNumber
            ) {
                continue;
            }
            shapes.clone_placeholder(self, &ph)?;
        }
        Ok(slide)
    }

    /// Add an empty notes master.
    pub fn add_notes_master(&mut self) -> Result<PartId> {
        self.new_part(ContainerKind::NotesMaster, None)
    }

    /// Add a notes slide based on `notes_master`.
    pub fn add_notes_slide(&mut self, notes_master: PartId) -> Result<PartId> {
        self.expect_kind(notes_master, ContainerKind::NotesMaster)?;
        self.new_part(ContainerKind::NotesSlide, Some(notes_master))
    }

    /// Parse an existing slide-part document into this presentation.
    pub fn load_part(
        &mut self,
        kind: ContainerKind,
        base: Option<PartId>,
        xml: &[u8],
    ) -> Result<PartId> {
        if let Some(base) = base {
            self.part(base)?;
        }
        let root = parse_xml(&mut self.tree, xml)?;
        let sp_tree = self
            .tree
            .descendants(root)?
            .into_iter()
            .find(|n| self.tree.tag(*n).map(|t| t == "p:spTree").unwrap_or(false))
            .ok_or_else(|| Error::Xml("part has no p:spTree element".to_string()))?;
        let id = PartId(self.parts.len());
        self.parts.push(SlidePart {
            root,
            sp_tree,
            kind,
            base,
        });
        Ok(id)
    }

    /// Serialize a part back to XML bytes.
    pub fn part_xml(&self, part: PartId) -> Result<Vec<u8>> {
        let root = self.part(part)?.root;
        write_xml(&self.tree, root)
    }

    /// The shape collection over a part's shape tree.
    pub fn shapes(&self, part: PartId) -> Result<ShapeCollection> {
        let part_ref = self.part(part)?;
        Ok(ShapeCollection::new(part, part_ref.sp_tree))
    }

    pub fn container_kind(&self, part: PartId) -> Result<ContainerKind> {
        Ok(self.part(part)?.kind)
    }

    /// The part this part inherits placeholder formatting from.
    pub fn part_base(&self, part: PartId) -> Result<Option<PartId>> {
        Ok(self.part(part)?.base)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn store(&self) -> &PartStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PartStore {
        &mut self.store
    }

    pub(crate) fn part(&self, part: PartId) -> Result<&SlidePart> {
        self.parts
            .get(part.0)
            .ok_or_else(|| Error::PartNotFound(format!("part #{}", part.0)))
    }

    pub(crate) fn sp_tree(&self, part: PartId) -> Result<NodeId> {
        Ok(self.part(part)?.sp_tree)
    }

    fn expect_kind(&self, part: PartId, kind: ContainerKind) -> Result<()> {
        if self.part(part)?.kind != kind {
            return Err(Error::InvalidFormat(format!(
                "expected a {:?} part, got {:?}",
                kind,
                self.part(part)?.kind
            )));
        }
        Ok(())
    }

    fn new_part(&mut self, kind: ContainerKind, base: Option<PartId>) -> Result<PartId> {
        let root_tag = match kind {
            ContainerKind::Master => "p:sldMaster",
            ContainerKind::Layout => "p:sldLayout",
            ContainerKind::Slide => "p:sld",
            ContainerKind::NotesMaster => "p:notesMaster",
            ContainerKind::NotesSlide => "p:notes",
        };
        let tree = &mut self.tree;
        let root = tree.new_element(root_tag);
        tree.set_attr(root, "xmlns:a", NS_DRAWINGML)?;
        tree.set_attr(root, "xmlns:r", NS_RELATIONSHIPS)?;
        tree.set_attr(root, "xmlns:p", NS_PRESENTATIONML)?;

        let c_sld = tree.new_element("p:cSld");
        tree.append_child(root, c_sld)?;
        let sp_tree = tree.new_element("p:spTree");
        tree.append_child(c_sld, sp_tree)?;

        // Standard group-shape header; its cNvPr occupies shape id 1.
        let nv = tree.new_element("p:nvGrpSpPr");
        tree.append_child(sp_tree, nv)?;
        let c_nv_pr = tree.new_element("p:cNvPr");
        tree.set_attr(c_nv_pr, "id", "1")?;
        tree.set_attr(c_nv_pr, "name", "")?;
        tree.append_child(nv, c_nv_pr)?;
        let c_nv_grp = tree.new_element("p:cNvGrpSpPr");
        tree.append_child(nv, c_nv_grp)?;
        let nv_pr = tree.new_element("p:nvPr");
        tree.append_child(nv, nv_pr)?;
        let grp_sp_pr = tree.new_element("p:grpSpPr");
        tree.append_child(sp_tree, grp_sp_pr)?;

        let id = PartId(self.parts.len());
        self.parts.push(SlidePart {
            root,
            sp_tree,
            kind,
            base,
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_part_structure() {
        let mut prs = Presentation::new();
        let master = prs.add_master().unwrap();
        assert_eq!(prs.container_kind(master).unwrap(), ContainerKind::Master);
        assert_eq!(prs.part_base(master).unwrap(), None);

        let sp_tree = prs.sp_tree(master).unwrap();
        assert_eq!(prs.tree.tag(sp_tree).unwrap(), "p:spTree");
        // Group-shape header present, no shapes yet.
        assert_eq!(prs.shapes(master).unwrap().len(&prs).unwrap(), 0);
    }

    #[test]
    fn test_part_chain_validation() {
        let mut prs = Presentation::new();
        let master = prs.add_master().unwrap();
        let layout = prs.add_layout(master).unwrap();
        assert_eq!(prs.part_base(layout).unwrap(), Some(master));
        // A master is not a layout.
        assert!(prs.add_slide(master).is_err());
    }

    #[test]
    fn test_load_part_round_trip() {
        let xml = concat!(
            r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
            r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#,
            r#"<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/>"#,
            r#"<p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#,
            r#"</p:spTree></p:cSld></p:sld>"#,
        );
        let mut prs = Presentation::new();
        let slide = prs
            .load_part(ContainerKind::Slide, None, xml.as_bytes())
            .unwrap();
        assert_eq!(prs.part_xml(slide).unwrap(), xml.as_bytes());
    }

    #[test]
    fn test_load_part_requires_sp_tree() {
        let mut prs = Presentation::new();
        let err = prs.load_part(ContainerKind::Slide, None, b"<p:sld/>");
        assert!(err.is_err());
    }
}
