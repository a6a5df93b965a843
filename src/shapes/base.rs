//! The `Shape` view and its kind taxonomy.

use crate::enums::{GraphicKind, Orientation, PlaceholderType};
use crate::error::{Error, Result};
use crate::package::{PartId, Presentation};
use crate::shapes::collection::ShapeCollection;
use crate::shapes::placeholder::{self, EffectiveAttr};
use crate::table::Table;
use crate::text::TextFrame;
use crate::tree::{NodeId, Tree};
use crate::unit::{Emu, ROT_UNITS_PER_DEGREE};

/// What kind of shape a node materialized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    AutoShape,
    Picture,
    Movie,
    Connector,
    Group,
    GraphicFrame(GraphicKind),
    Placeholder(PlaceholderFlavor),
    /// Unrecognized element; identity and geometry only.
    Base,
}

/// Placeholder behavior variant, selected by container kind and, on
/// slides, by the placeholder's declared type and carrying element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderFlavor {
    /// Master placeholder; the root of the inheritance chain.
    Master,
    /// Layout placeholder; inherits from the master by type.
    Layout,
    /// Plain slide placeholder; inherits from the layout by idx.
    Slide,
    /// Notes-slide placeholder; inherits from the notes master by type.
    NotesSlide,
    /// Slide placeholder accepting `insert_chart`.
    Chart,
    /// Slide placeholder accepting `insert_picture`.
    Picture,
    /// Slide placeholder accepting `insert_table`.
    Table,
    /// Graphic frame that took over a placeholder slot.
    PopulatedFrame(GraphicKind),
    /// Picture that took over a placeholder slot.
    PopulatedPicture,
}

impl PlaceholderFlavor {
    /// Whether unset geometry resolves through the inheritance chain.
    ///
    /// Masters are inheritance roots and populated graphic frames carry
    /// their own explicit geometry; everything else inherits.
    pub fn inherits_geometry(self) -> bool {
        !matches!(
            self,
            PlaceholderFlavor::Master | PlaceholderFlavor::PopulatedFrame(_)
        )
    }
}

/// The placeholder marker values of a shape: slot key, semantic type
/// and orientation, read from its `p:ph` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderFormat {
    pub idx: u32,
    pub ph_type: PlaceholderType,
    pub orientation: Orientation,
}

/// A shape on a slide-type part.
///
/// Holds a node handle, not data: every accessor re-reads the tree, and
/// a shape whose node was removed fails with [`Error::DetachedShape`].
#[derive(Debug, Clone, Copy)]
pub struct Shape {
    pub(crate) node: NodeId,
    pub(crate) part: PartId,
    kind: ShapeKind,
}

impl Shape {
    pub(crate) fn new(node: NodeId, part: PartId, kind: ShapeKind) -> Self {
        Shape { node, part, kind }
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn part(&self) -> PartId {
        self.part
    }

    pub(crate) fn node(&self) -> NodeId {
        self.node
    }

    /// Whether this shape occupies a placeholder slot.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, ShapeKind::Placeholder(_))
    }

    pub fn shape_id(&self, prs: &Presentation) -> Result<u32> {
        let cnv_pr = self.cnv_pr(prs)?;
        prs.tree
            .attr_u32(cnv_pr, "id")?
            .ok_or_else(|| Error::InvalidFormat("shape has no id".to_string()))
    }

    pub fn name(&self, prs: &Presentation) -> Result<String> {
        let cnv_pr = self.cnv_pr(prs)?;
        Ok(prs.tree.attr(cnv_pr, "name")?.unwrap_or_default().to_string())
    }

    pub fn set_name(&self, prs: &mut Presentation, name: &str) -> Result<()> {
        let cnv_pr = self.cnv_pr(prs)?;
        prs.tree.set_attr(cnv_pr, "name", name)
    }

    pub fn hidden(&self, prs: &Presentation) -> Result<bool> {
        let cnv_pr = self.cnv_pr(prs)?;
        prs.tree.attr_bool(cnv_pr, "hidden")
    }

    pub fn set_hidden(&self, prs: &mut Presentation, hidden: bool) -> Result<()> {
        let cnv_pr = self.cnv_pr(prs)?;
        if hidden {
            prs.tree.set_attr_bool(cnv_pr, "hidden", true)
        } else {
            prs.tree.remove_attr(cnv_pr, "hidden")
        }
    }

    /// The placeholder marker values.
    ///
    /// Fails with [`Error::NotAPlaceholder`] when this shape does not
    /// occupy a placeholder slot; use [`Shape::is_placeholder`] to ask.
    pub fn placeholder_format(&self, prs: &Presentation) -> Result<PlaceholderFormat> {
        if !self.is_placeholder() {
            return Err(Error::NotAPlaceholder);
        }
        let ph = self
            .ph_element(prs)?
            .ok_or(Error::NotAPlaceholder)?;
        read_ph_format(&prs.tree, ph)
    }

    pub fn left(&self, prs: &Presentation) -> Result<Option<Emu>> {
        self.geometry(prs, EffectiveAttr::Left)
    }

    pub fn top(&self, prs: &Presentation) -> Result<Option<Emu>> {
        self.geometry(prs, EffectiveAttr::Top)
    }

    pub fn width(&self, prs: &Presentation) -> Result<Option<Emu>> {
        self.geometry(prs, EffectiveAttr::Width)
    }

    pub fn height(&self, prs: &Presentation) -> Result<Option<Emu>> {
        self.geometry(prs, EffectiveAttr::Height)
    }

    fn geometry(&self, prs: &Presentation, attr: EffectiveAttr) -> Result<Option<Emu>> {
        if let ShapeKind::Placeholder(flavor) = self.kind
            && flavor.inherits_geometry()
        {
            return placeholder::effective_value(prs, self, attr);
        }
        self.explicit_value(prs, attr)
    }

    /// The value written directly on this shape's transform, if any.
    pub(crate) fn explicit_value(
        &self,
        prs: &Presentation,
        attr: EffectiveAttr,
    ) -> Result<Option<Emu>> {
        let Some(xfrm) = self.xfrm(prs)? else {
            return Ok(None);
        };
        let (child, name) = attr.xml_location();
        let Some(node) = prs.tree.find_child(xfrm, child)? else {
            return Ok(None);
        };
        Ok(prs.tree.attr_i64(node, name)?.map(Emu))
    }

    pub fn set_left(&self, prs: &mut Presentation, value: Emu) -> Result<()> {
        self.set_explicit_value(prs, EffectiveAttr::Left, value)
    }

    pub fn set_top(&self, prs: &mut Presentation, value: Emu) -> Result<()> {
        self.set_explicit_value(prs, EffectiveAttr::Top, value)
    }

    pub fn set_width(&self, prs: &mut Presentation, value: Emu) -> Result<()> {
        self.set_explicit_value(prs, EffectiveAttr::Width, value)
    }

    pub fn set_height(&self, prs: &mut Presentation, value: Emu) -> Result<()> {
        self.set_explicit_value(prs, EffectiveAttr::Height, value)
    }

    fn set_explicit_value(
        &self,
        prs: &mut Presentation,
        attr: EffectiveAttr,
        value: Emu,
    ) -> Result<()> {
        let xfrm = self.get_or_add_xfrm(prs)?;
        let (child, name) = attr.xml_location();
        let node = prs.tree.get_or_add_child(xfrm, child)?;
        prs.tree.set_attr_i64(node, name, value.0)
    }

    /// Clockwise rotation in degrees; 0.0 when unset.
    pub fn rotation(&self, prs: &Presentation) -> Result<f32> {
        let Some(xfrm) = self.xfrm(prs)? else {
            return Ok(0.0);
        };
        let rot = prs.tree.attr_i64(xfrm, "rot")?.unwrap_or(0);
        Ok(rot as f32 / ROT_UNITS_PER_DEGREE as f32)
    }

    pub fn set_rotation(&self, prs: &mut Presentation, degrees: f32) -> Result<()> {
        let xfrm = self.get_or_add_xfrm(prs)?;
        let normalized = degrees.rem_euclid(360.0);
        let rot = (normalized * ROT_UNITS_PER_DEGREE as f32).round() as i64;
        prs.tree.set_attr_i64(xfrm, "rot", rot)
    }

    /// Whether this shape can carry text. Only `p:sp` shapes do.
    pub fn has_text_frame(&self, prs: &Presentation) -> Result<bool> {
        Ok(prs.tree.tag(self.node)? == "p:sp")
    }

    /// The text frame of this shape.
    pub fn text_frame(&self, prs: &mut Presentation) -> Result<TextFrame> {
        if !self.has_text_frame(prs)? {
            return Err(Error::UnsupportedShapeOperation("text frame"));
        }
        let tx_body = prs.tree.get_or_add_child(self.node, "p:txBody")?;
        TextFrame::over(&mut prs.tree, tx_body)
    }

    /// The member shapes of this group shape.
    ///
    /// The returned collection supports the same enumeration and add
    /// operations as a part-level one; members land inside the group.
    pub fn shapes(&self, prs: &Presentation) -> Result<ShapeCollection> {
        if self.kind != ShapeKind::Group {
            return Err(Error::UnsupportedShapeOperation("group members"));
        }
        prs.tree.get(self.node)?;
        Ok(ShapeCollection::new(self.part, self.node))
    }

    /// Whether this shape is a graphic frame holding a table.
    pub fn has_table(&self) -> bool {
        matches!(
            self.kind,
            ShapeKind::GraphicFrame(GraphicKind::Table)
                | ShapeKind::Placeholder(PlaceholderFlavor::PopulatedFrame(GraphicKind::Table))
        )
    }

    /// The table contained in this graphic frame.
    pub fn table(&self, prs: &Presentation) -> Result<Table> {
        if !self.has_table() {
            return Err(Error::UnsupportedShapeOperation("table"));
        }
        let data = self
            .graphic_data(prs)?
            .ok_or_else(|| Error::InvalidFormat("graphic frame has no graphicData".to_string()))?;
        let tbl = prs
            .tree
            .find_child(data, "a:tbl")?
            .ok_or_else(|| Error::InvalidFormat("table frame has no a:tbl".to_string()))?;
        Ok(Table::over(tbl, self.node))
    }

    /// Relationship id of the chart part behind this chart frame.
    pub fn chart_r_id(&self, prs: &Presentation) -> Result<String> {
        let is_chart_frame = matches!(
            self.kind,
            ShapeKind::GraphicFrame(GraphicKind::Chart)
                | ShapeKind::Placeholder(PlaceholderFlavor::PopulatedFrame(GraphicKind::Chart))
        );
        if !is_chart_frame {
            return Err(Error::UnsupportedShapeOperation("chart"));
        }
        let data = self
            .graphic_data(prs)?
            .ok_or_else(|| Error::InvalidFormat("graphic frame has no graphicData".to_string()))?;
        let chart = prs
            .tree
            .find_child(data, "c:chart")?
            .ok_or_else(|| Error::InvalidFormat("chart frame has no c:chart".to_string()))?;
        prs.tree
            .attr(chart, "r:id")?
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidFormat("c:chart has no r:id".to_string()))
    }

    /// Relationship id of the embedded OLE object behind this frame.
    pub fn ole_r_id(&self, prs: &Presentation) -> Result<String> {
        let is_ole_frame = matches!(
            self.kind,
            ShapeKind::GraphicFrame(GraphicKind::OleObject)
                | ShapeKind::Placeholder(PlaceholderFlavor::PopulatedFrame(GraphicKind::OleObject))
        );
        if !is_ole_frame {
            return Err(Error::UnsupportedShapeOperation("ole object"));
        }
        let data = self
            .graphic_data(prs)?
            .ok_or_else(|| Error::InvalidFormat("graphic frame has no graphicData".to_string()))?;
        let ole = prs
            .tree
            .find_child(data, "p:oleObj")?
            .ok_or_else(|| Error::InvalidFormat("OLE frame has no p:oleObj".to_string()))?;
        prs.tree
            .attr(ole, "r:id")?
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidFormat("p:oleObj has no r:id".to_string()))
    }

    pub(crate) fn cnv_pr(&self, prs: &Presentation) -> Result<NodeId> {
        cnv_pr_element(&prs.tree, self.node)?
            .ok_or_else(|| Error::InvalidFormat("shape has no p:cNvPr".to_string()))
    }

    pub(crate) fn ph_element(&self, prs: &Presentation) -> Result<Option<NodeId>> {
        ph_element(&prs.tree, self.node)
    }

    pub(crate) fn graphic_data(&self, prs: &Presentation) -> Result<Option<NodeId>> {
        let Some(graphic) = prs.tree.find_child(self.node, "a:graphic")? else {
            return Ok(None);
        };
        prs.tree.find_child(graphic, "a:graphicData")
    }

    fn xfrm(&self, prs: &Presentation) -> Result<Option<NodeId>> {
        let tree = &prs.tree;
        match tree.tag(self.node)? {
            "p:graphicFrame" => tree.find_child(self.node, "p:xfrm"),
            "p:grpSp" => match tree.find_child(self.node, "p:grpSpPr")? {
                Some(pr) => tree.find_child(pr, "a:xfrm"),
                None => Ok(None),
            },
            _ => match tree.find_child(self.node, "p:spPr")? {
                Some(pr) => tree.find_child(pr, "a:xfrm"),
                None => Ok(None),
            },
        }
    }

    fn get_or_add_xfrm(&self, prs: &mut Presentation) -> Result<NodeId> {
        let tree = &mut prs.tree;
        match tree.tag(self.node)?.to_string().as_str() {
            "p:graphicFrame" => tree.get_or_add_child(self.node, "p:xfrm"),
            "p:grpSp" => {
                let pr = tree.get_or_add_child(self.node, "p:grpSpPr")?;
                tree.get_or_add_child(pr, "a:xfrm")
            },
            _ => {
                let pr = tree.get_or_add_child(self.node, "p:spPr")?;
                tree.get_or_add_child(pr, "a:xfrm")
            },
        }
    }
}

/// The non-visual-properties container tag for a shape element tag.
pub(crate) fn nv_container_tag(tag: &str) -> Option<&'static str> {
    match tag {
        "p:sp" => Some("p:nvSpPr"),
        "p:pic" => Some("p:nvPicPr"),
        "p:cxnSp" => Some("p:nvCxnSpPr"),
        "p:grpSp" => Some("p:nvGrpSpPr"),
        "p:graphicFrame" => Some("p:nvGraphicFramePr"),
        _ => None,
    }
}

/// The `p:cNvPr` element of a shape node, wherever its nv container is.
pub(crate) fn cnv_pr_element(tree: &Tree, node: NodeId) -> Result<Option<NodeId>> {
    let container = match nv_container_tag(tree.tag(node)?) {
        Some(tag) => match tree.find_child(node, tag)? {
            Some(c) => c,
            None => return Ok(None),
        },
        // Unrecognized element; accept a direct p:nvSpPr-style child.
        None => {
            for child in tree.children(node)? {
                if let Some(cnv) = tree.find_child(child, "p:cNvPr")? {
                    return Ok(Some(cnv));
                }
            }
            return Ok(None);
        },
    };
    tree.find_child(container, "p:cNvPr")
}

/// The `p:ph` placeholder marker of a shape node, if present.
pub(crate) fn ph_element(tree: &Tree, node: NodeId) -> Result<Option<NodeId>> {
    let Some(container_tag) = nv_container_tag(tree.tag(node)?) else {
        return Ok(None);
    };
    let Some(container) = tree.find_child(node, container_tag)? else {
        return Ok(None);
    };
    let Some(nv_pr) = tree.find_child(container, "p:nvPr")? else {
        return Ok(None);
    };
    tree.find_child(nv_pr, "p:ph")
}

/// Read idx/type/orientation from a `p:ph` element, applying the schema
/// defaults for absent attributes (idx 0, type obj, horizontal).
pub(crate) fn read_ph_format(tree: &Tree, ph: NodeId) -> Result<PlaceholderFormat> {
    let idx = tree.attr_u32(ph, "idx")?.unwrap_or(0);
    let ph_type = match tree.attr(ph, "type")? {
        Some(token) => PlaceholderType::from_xml_token(token),
        None => PlaceholderType::Object,
    };
    let orientation = match tree.attr(ph, "orient")? {
        Some(token) => Orientation::from_xml_token(token),
        None => Orientation::Horizontal,
    };
    Ok(PlaceholderFormat {
        idx,
        ph_type,
        orientation,
    })
}
