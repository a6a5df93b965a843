//! Placeholder inheritance resolution and content substitution.
//!
//! A placeholder with no explicit value for a geometry attribute
//! inherits it from its base placeholder: a slide placeholder from the
//! placeholder with the same idx on its layout, a layout placeholder
//! from the master placeholder named by a fixed type-to-type table, and
//! a notes-slide placeholder from the notes-master placeholder of the
//! same type. Masters are roots. Resolution is re-derived on every
//! access; nothing is cached across tree mutations.

use crate::enums::{ContainerKind, GraphicKind, PlaceholderType};
use crate::error::{Error, Result};
use crate::package::Presentation;
use crate::shapes::base::{self, PlaceholderFlavor, Shape, ShapeKind};
use crate::shapes::build::{self, Frame};
use crate::shapes::factory::make_shape;
use crate::unit::Emu;

/// Default height contribution of one table row on insertion.
const DEFAULT_ROW_HEIGHT: Emu = Emu(370_840);

/// A geometry attribute resolvable through the inheritance chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveAttr {
    Left,
    Top,
    Width,
    Height,
}

impl EffectiveAttr {
    /// The `a:xfrm` child element and attribute holding this value.
    pub(crate) fn xml_location(self) -> (&'static str, &'static str) {
        match self {
            EffectiveAttr::Left => ("a:off", "x"),
            EffectiveAttr::Top => ("a:off", "y"),
            EffectiveAttr::Width => ("a:ext", "cx"),
            EffectiveAttr::Height => ("a:ext", "cy"),
        }
    }
}

/// Resolve `attr` for a placeholder through its inheritance chain.
///
/// Returns the first explicit value found walking shape, base, base of
/// base. `None` when the chain bottoms out without one; the renderer's
/// format default applies then, which this layer does not synthesize.
pub(crate) fn effective_value(
    prs: &Presentation,
    shape: &Shape,
    attr: EffectiveAttr,
) -> Result<Option<Emu>> {
    if let Some(value) = shape.explicit_value(prs, attr)? {
        return Ok(Some(value));
    }
    match base_placeholder(prs, shape)? {
        Some(base) => effective_value(prs, &base, attr),
        None => Ok(None),
    }
}

/// The placeholder one level up the chain that `shape` inherits from,
/// or `None` when it is an inheritance root or no match exists.
pub(crate) fn base_placeholder(prs: &Presentation, shape: &Shape) -> Result<Option<Shape>> {
    let Some(ph) = shape.ph_element(prs)? else {
        return Ok(None);
    };
    let format = base::read_ph_format(&prs.tree, ph)?;
    let container = prs.container_kind(shape.part)?;
    let Some(base_part) = prs.part_base(shape.part)? else {
        return Ok(None);
    };
    let base_shapes = prs.shapes(base_part)?;
    match container {
        ContainerKind::Master | ContainerKind::NotesMaster => Ok(None),
        ContainerKind::Slide => base_shapes.placeholder_by_idx(prs, format.idx),
        ContainerKind::Layout => match layout_base_type(format.ph_type) {
            Some(base_type) => base_shapes.placeholder_by_type(prs, base_type),
            None => Ok(None),
        },
        ContainerKind::NotesSlide => base_shapes.placeholder_by_type(prs, format.ph_type),
    }
}

/// Which master placeholder type a layout placeholder inherits from.
/// Lookup at this level is by type, not idx.
fn layout_base_type(ph_type: PlaceholderType) -> Option<PlaceholderType> {
    use PlaceholderType::*;
    match ph_type {
        Title | CenterTitle => Some(Title),
        Body | Subtitle | Object | Chart | Table | Picture | Bitmap | OrgChart | MediaClip => {
            Some(Body)
        },
        Date => Some(Date),
        Footer => Some(Footer),
        SlideNumber => Some(SlideNumber),
        Header | SlideImage => None,
    }
}

impl Shape {
    /// The placeholder's semantic type after inheritance: its own
    /// explicit `type` token, else the base placeholder's effective
    /// type, else the schema default.
    pub fn effective_ph_type(&self, prs: &Presentation) -> Result<PlaceholderType> {
        let ph = self.ph_element(prs)?.ok_or(Error::NotAPlaceholder)?;
        if let Some(token) = prs.tree.attr(ph, "type")? {
            return Ok(PlaceholderType::from_xml_token(token));
        }
        match base_placeholder(prs, self)? {
            Some(b) => b.effective_ph_type(prs),
            None => Ok(PlaceholderType::Object),
        }
    }

    /// Replace this chart placeholder with a chart frame over a new
    /// embedded chart part.
    pub fn insert_chart(&self, prs: &mut Presentation, chart_xml: Vec<u8>) -> Result<Shape> {
        self.require_flavor(PlaceholderFlavor::Chart, "insert_chart")?;
        let frame = self.effective_frame(prs)?;
        let (id, name) = (self.shape_id(prs)?, self.name(prs)?);
        let r_id = prs.store.add_chart_part(chart_xml)?;
        let (node, data) =
            build::new_graphic_frame(&mut prs.tree, id, &name, GraphicKind::Chart, frame)?;
        build::add_chart_ref(&mut prs.tree, data, &r_id)?;
        self.replace_placeholder_with(prs, node)
    }

    /// Replace this picture placeholder with a picture filled by the
    /// image, cropped centrally to the placeholder's aspect ratio.
    pub fn insert_picture(&self, prs: &mut Presentation, image: &[u8], desc: &str) -> Result<Shape> {
        self.require_flavor(PlaceholderFlavor::Picture, "insert_picture")?;
        let frame = self.effective_frame(prs)?;
        let (id, name) = (self.shape_id(prs)?, self.name(prs)?);
        let image_ref = prs.store.get_or_add_image_part(image, desc)?;
        let node = build::new_pic(
            &mut prs.tree,
            id,
            &name,
            &image_ref.r_id,
            &image_ref.desc,
            frame,
            None,
        )?;
        add_crop_to_fill(prs, node, image_ref.px_size, frame)?;
        self.replace_placeholder_with(prs, node)
    }

    /// Replace this table placeholder with a table frame. The frame
    /// takes the placeholder's effective position and width; its height
    /// derives from the row count.
    pub fn insert_table(&self, prs: &mut Presentation, rows: usize, cols: usize) -> Result<Shape> {
        self.require_flavor(PlaceholderFlavor::Table, "insert_table")?;
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidFormat(
                "a table needs at least one row and one column".to_string(),
            ));
        }
        let mut frame = self.effective_frame(prs)?;
        frame.height = Emu(rows as i64 * DEFAULT_ROW_HEIGHT.0);
        let (id, name) = (self.shape_id(prs)?, self.name(prs)?);
        let (node, data) =
            build::new_graphic_frame(&mut prs.tree, id, &name, GraphicKind::Table, frame)?;
        let tbl = build::new_tbl(&mut prs.tree, rows, cols, frame.width, frame.height)?;
        prs.tree.append_child(data, tbl)?;
        self.replace_placeholder_with(prs, node)
    }

    fn require_flavor(&self, flavor: PlaceholderFlavor, op: &'static str) -> Result<()> {
        if self.kind() == ShapeKind::Placeholder(flavor) {
            Ok(())
        } else {
            Err(Error::UnsupportedShapeOperation(op))
        }
    }

    /// Effective geometry, so substituted content lands where the
    /// placeholder visually was even when its own geometry is inherited.
    fn effective_frame(&self, prs: &Presentation) -> Result<Frame> {
        Ok(Frame {
            left: effective_value(prs, self, EffectiveAttr::Left)?.unwrap_or(Emu(0)),
            top: effective_value(prs, self, EffectiveAttr::Top)?.unwrap_or(Emu(0)),
            width: effective_value(prs, self, EffectiveAttr::Width)?.unwrap_or(Emu(0)),
            height: effective_value(prs, self, EffectiveAttr::Height)?.unwrap_or(Emu(0)),
        })
    }

    /// Swap `new_node` in for this placeholder's node.
    ///
    /// The ph marker moves onto the new node so the slot identity is
    /// preserved; the new node takes the old node's tree position; the
    /// old node is removed, which detaches every view still holding it.
    /// Not retryable: a second call on the same value fails with
    /// [`Error::DetachedShape`] instead of double-inserting.
    fn replace_placeholder_with(
        &self,
        prs: &mut Presentation,
        new_node: crate::tree::NodeId,
    ) -> Result<Shape> {
        let ph = self.ph_element(prs)?.ok_or(Error::NotAPlaceholder)?;
        let tag = prs.tree.tag(new_node)?;
        let container_tag = base::nv_container_tag(tag)
            .ok_or_else(|| Error::InvalidFormat(format!("not a shape element: {tag}")))?;
        let container = prs
            .tree
            .find_child(new_node, container_tag)?
            .ok_or_else(|| Error::InvalidFormat("new shape has no nv properties".to_string()))?;
        let nv_pr = prs.tree.get_or_add_child(container, "p:nvPr")?;

        prs.tree.detach(ph)?;
        prs.tree.append_child(nv_pr, ph)?;
        prs.tree.insert_before(self.node, new_node)?;
        prs.tree.remove(self.node)?;
        make_shape(prs, self.part, new_node)
    }
}

/// Center-crop the picture's source rectangle so the image fills the
/// placeholder extent without distortion.
fn add_crop_to_fill(
    prs: &mut Presentation,
    pic: crate::tree::NodeId,
    px_size: (u32, u32),
    frame: Frame,
) -> Result<()> {
    if frame.width.0 <= 0 || frame.height.0 <= 0 || px_size.0 == 0 || px_size.1 == 0 {
        return Ok(());
    }
    let image_aspect = px_size.0 as f64 / px_size.1 as f64;
    let ph_aspect = frame.width.0 as f64 / frame.height.0 as f64;

    // ST_Percentage: thousandths of a percent.
    let (l_r, t_b) = if image_aspect > ph_aspect {
        let crop = (1.0 - ph_aspect / image_aspect) / 2.0;
        ((crop * 100_000.0).round() as i64, 0)
    } else {
        let crop = (1.0 - image_aspect / ph_aspect) / 2.0;
        (0, (crop * 100_000.0).round() as i64)
    };
    if l_r == 0 && t_b == 0 {
        return Ok(());
    }

    let blip_fill = prs
        .tree
        .find_child(pic, "p:blipFill")?
        .ok_or_else(|| Error::InvalidFormat("picture has no blipFill".to_string()))?;
    let src_rect = prs.tree.new_element("a:srcRect");
    if l_r != 0 {
        prs.tree.set_attr_i64(src_rect, "l", l_r)?;
        prs.tree.set_attr_i64(src_rect, "r", l_r)?;
    }
    if t_b != 0 {
        prs.tree.set_attr_i64(src_rect, "t", t_b)?;
        prs.tree.set_attr_i64(src_rect, "b", t_b)?;
    }
    match prs.tree.find_child(blip_fill, "a:stretch")? {
        Some(stretch) => prs.tree.insert_before(stretch, src_rect)?,
        None => prs.tree.append_child(blip_fill, src_rect)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PartId;
    use crate::parts::test_png;
    use crate::shapes::build::new_ph_sp;

    /// Append a bare placeholder sp to a part, outside the public add
    /// surface, so inheritance fixtures can be assembled precisely.
    fn put_ph(
        prs: &mut Presentation,
        part: PartId,
        id: u32,
        ph_attrs: &[(&str, &str)],
    ) -> Shape {
        let sp_tree = prs.sp_tree(part).unwrap();
        let node = new_ph_sp(&mut prs.tree, id, &format!("ph {id}"), ph_attrs).unwrap();
        prs.tree.append_child(sp_tree, node).unwrap();
        make_shape(prs, part, node).unwrap()
    }

    #[test]
    fn test_layout_inherits_master_width_by_type() {
        let mut prs = Presentation::new();
        let master = prs.add_master().unwrap();
        let layout = prs.add_layout(master).unwrap();

        let master_ph = put_ph(&mut prs, master, 2, &[("type", "body"), ("idx", "1")]);
        master_ph.set_width(&mut prs, Emu(6_000_000)).unwrap();
        let layout_ph = put_ph(&mut prs, layout, 2, &[("type", "body"), ("idx", "1")]);

        assert_eq!(layout_ph.width(&prs).unwrap(), Some(Emu(6_000_000)));
        // No explicit height anywhere in the chain.
        assert_eq!(layout_ph.height(&prs).unwrap(), None);
    }

    #[test]
    fn test_slide_inherits_through_layout_by_idx() {
        let mut prs = Presentation::new();
        let master = prs.add_master().unwrap();
        let layout = prs.add_layout(master).unwrap();
        let master_ph = put_ph(&mut prs, master, 2, &[("type", "body"), ("idx", "1")]);
        master_ph.set_width(&mut prs, Emu(6_000_000)).unwrap();
        master_ph.set_left(&mut prs, Emu(457_200)).unwrap();
        let layout_ph = put_ph(&mut prs, layout, 2, &[("type", "body"), ("idx", "1")]);
        layout_ph.set_left(&mut prs, Emu(914_400)).unwrap();

        let slide = prs.add_slide(layout).unwrap();
        let slide_ph = prs.shapes(slide).unwrap().placeholder_by_idx(&prs, 1).unwrap().unwrap();

        // Width falls through two levels; left stops at the layout.
        assert_eq!(slide_ph.width(&prs).unwrap(), Some(Emu(6_000_000)));
        assert_eq!(slide_ph.left(&prs).unwrap(), Some(Emu(914_400)));
    }

    #[test]
    fn test_explicit_value_wins_over_base() {
        let mut prs = Presentation::new();
        let master = prs.add_master().unwrap();
        let layout = prs.add_layout(master).unwrap();
        let master_ph = put_ph(&mut prs, master, 2, &[("type", "title")]);
        master_ph.set_width(&mut prs, Emu(1_000)).unwrap();
        let layout_ph = put_ph(&mut prs, layout, 2, &[("type", "title")]);
        layout_ph.set_width(&mut prs, Emu(2_000)).unwrap();

        assert_eq!(layout_ph.width(&prs).unwrap(), Some(Emu(2_000)));
    }

    #[test]
    fn test_notes_slide_inherits_by_type() {
        let mut prs = Presentation::new();
        let notes_master = prs.add_notes_master().unwrap();
        let notes = prs.add_notes_slide(notes_master).unwrap();
        let master_ph = put_ph(&mut prs, notes_master, 2, &[("type", "body"), ("idx", "1")]);
        master_ph.set_height(&mut prs, Emu(5_000_000)).unwrap();
        let notes_ph = put_ph(&mut prs, notes, 2, &[("type", "body"), ("idx", "7")]);

        // Notes lookup ignores idx and matches on type.
        assert_eq!(notes_ph.height(&prs).unwrap(), Some(Emu(5_000_000)));
    }

    #[test]
    fn test_effective_type_inherits() {
        let mut prs = Presentation::new();
        let master = prs.add_master().unwrap();
        let layout = prs.add_layout(master).unwrap();
        put_ph(&mut prs, master, 2, &[("type", "body"), ("idx", "1")]);
        let layout_ph = put_ph(&mut prs, layout, 2, &[("type", "subTitle"), ("idx", "1")]);

        // Own explicit token wins over the base.
        assert_eq!(
            layout_ph.effective_ph_type(&prs).unwrap(),
            PlaceholderType::Subtitle
        );

        // An untyped placeholder reads as Object, which maps to the
        // master's body placeholder; its effective type comes from there.
        let untyped = put_ph(&mut prs, layout, 3, &[("idx", "9")]);
        assert_eq!(
            untyped.effective_ph_type(&prs).unwrap(),
            PlaceholderType::Body
        );

        // At an inheritance root the schema default applies.
        let root_untyped = put_ph(&mut prs, master, 4, &[("idx", "9")]);
        assert_eq!(
            root_untyped.effective_ph_type(&prs).unwrap(),
            PlaceholderType::Object
        );
    }

    fn table_ph_slide() -> (Presentation, Shape) {
        let mut prs = Presentation::new();
        let master = prs.add_master().unwrap();
        let layout = prs.add_layout(master).unwrap();
        let master_ph = put_ph(&mut prs, master, 2, &[("type", "body"), ("idx", "10")]);
        master_ph.set_left(&mut prs, Emu(100)).unwrap();
        master_ph.set_top(&mut prs, Emu(200)).unwrap();
        master_ph.set_width(&mut prs, Emu(4_000_000)).unwrap();
        master_ph.set_height(&mut prs, Emu(3_000_000)).unwrap();
        put_ph(&mut prs, layout, 2, &[("type", "tbl"), ("idx", "10")]);
        let slide = prs.add_slide(layout).unwrap();
        let ph = prs
            .shapes(slide)
            .unwrap()
            .placeholder_by_idx(&prs, 10)
            .unwrap()
            .unwrap();
        (prs, ph)
    }

    #[test]
    fn test_insert_table_preserves_slot_identity() {
        let (mut prs, ph) = table_ph_slide();
        assert_eq!(ph.kind(), ShapeKind::Placeholder(PlaceholderFlavor::Table));

        let table_shape = ph.insert_table(&mut prs, 3, 2).unwrap();
        assert!(table_shape.is_placeholder());
        assert_eq!(
            table_shape.kind(),
            ShapeKind::Placeholder(PlaceholderFlavor::PopulatedFrame(GraphicKind::Table))
        );
        let format = table_shape.placeholder_format(&prs).unwrap();
        assert_eq!(format.idx, 10);
        assert_eq!(format.ph_type, PlaceholderType::Table);

        // Geometry came from the effective values, height from the rows.
        assert_eq!(table_shape.left(&prs).unwrap(), Some(Emu(100)));
        assert_eq!(table_shape.width(&prs).unwrap(), Some(Emu(4_000_000)));
        assert_eq!(
            table_shape.height(&prs).unwrap(),
            Some(Emu(3 * DEFAULT_ROW_HEIGHT.0))
        );
        assert!(table_shape.table(&prs).is_ok());
    }

    #[test]
    fn test_stale_value_after_substitution_is_detached() {
        let (mut prs, ph) = table_ph_slide();
        ph.insert_table(&mut prs, 2, 2).unwrap();

        assert!(matches!(ph.name(&prs), Err(Error::DetachedShape)));
        assert!(matches!(
            ph.insert_table(&mut prs, 2, 2),
            Err(Error::DetachedShape)
        ));
    }

    #[test]
    fn test_insert_rejects_wrong_flavor() {
        let (mut prs, ph) = table_ph_slide();
        assert!(matches!(
            ph.insert_chart(&mut prs, b"<c:chartSpace/>".to_vec()),
            Err(Error::UnsupportedShapeOperation("insert_chart"))
        ));
        assert!(matches!(
            ph.insert_picture(&mut prs, &test_png(8, 8), "x.png"),
            Err(Error::UnsupportedShapeOperation("insert_picture"))
        ));
    }

    #[test]
    fn test_insert_picture_crops_to_fill() {
        let mut prs = Presentation::new();
        let master = prs.add_master().unwrap();
        let layout = prs.add_layout(master).unwrap();
        let master_ph = put_ph(&mut prs, master, 2, &[("type", "body"), ("idx", "4")]);
        master_ph.set_width(&mut prs, Emu(2_000_000)).unwrap();
        master_ph.set_height(&mut prs, Emu(1_000_000)).unwrap();
        put_ph(&mut prs, layout, 2, &[("type", "pic"), ("idx", "4")]);
        let slide = prs.add_slide(layout).unwrap();
        let ph = prs
            .shapes(slide)
            .unwrap()
            .placeholder_by_idx(&prs, 4)
            .unwrap()
            .unwrap();
        assert_eq!(ph.kind(), ShapeKind::Placeholder(PlaceholderFlavor::Picture));

        // Square image into a 2:1 slot: crop 25% top and bottom.
        let pic = ph.insert_picture(&mut prs, &test_png(64, 64), "sq.png").unwrap();
        assert_eq!(
            pic.kind(),
            ShapeKind::Placeholder(PlaceholderFlavor::PopulatedPicture)
        );
        let blip_fill = prs.tree.find_child(pic.node(), "p:blipFill").unwrap().unwrap();
        let src_rect = prs.tree.find_child(blip_fill, "a:srcRect").unwrap().unwrap();
        assert_eq!(prs.tree.attr_i64(src_rect, "t").unwrap(), Some(25_000));
        assert_eq!(prs.tree.attr_i64(src_rect, "b").unwrap(), Some(25_000));
        assert_eq!(prs.tree.attr_i64(src_rect, "l").unwrap(), None);
    }

    #[test]
    fn test_insert_chart_registers_part() {
        let mut prs = Presentation::new();
        let master = prs.add_master().unwrap();
        let layout = prs.add_layout(master).unwrap();
        put_ph(&mut prs, master, 2, &[("type", "body"), ("idx", "3")]);
        put_ph(&mut prs, layout, 2, &[("type", "chart"), ("idx", "3")]);
        let slide = prs.add_slide(layout).unwrap();
        let ph = prs
            .shapes(slide)
            .unwrap()
            .placeholder_by_idx(&prs, 3)
            .unwrap()
            .unwrap();
        assert_eq!(ph.kind(), ShapeKind::Placeholder(PlaceholderFlavor::Chart));

        let chart = ph.insert_chart(&mut prs, b"<c:chartSpace/>".to_vec()).unwrap();
        let r_id = chart.chart_r_id(&prs).unwrap();
        assert!(prs.store().related_part(&r_id).is_ok());
    }
}
