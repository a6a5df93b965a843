//! Ordered shape collection over a part's `p:spTree`.

use crate::enums::{
    AutoShapeKind, ConnectorKind, ContainerKind, GraphicKind, Orientation, PlaceholderType,
};
use crate::error::{Error, Result};
use crate::package::{PartId, Presentation};
use crate::shapes::base::Shape;
use crate::shapes::build::{self, Frame};
use crate::shapes::factory::make_shape;
use crate::tree::NodeId;
use crate::unit::Emu;

/// Default display extent of an OLE object icon.
const OLE_ICON_WIDTH: Emu = Emu(965_200);
const OLE_ICON_HEIGHT: Emu = Emu(609_600);

/// Lazily-materialized, ordered view of a container's shapes.
///
/// Holds no shape state; every access walks the `p:spTree` children and
/// materializes fresh [`Shape`] views through the factory. The one piece
/// of held state is the optional fast-add id cache, which must only be
/// used while this collection is the sole writer to its container.
#[derive(Debug)]
pub struct ShapeCollection {
    part: PartId,
    sp_tree: NodeId,
    cached_max_shape_id: Option<u32>,
}

impl ShapeCollection {
    pub(crate) fn new(part: PartId, sp_tree: NodeId) -> Self {
        ShapeCollection {
            part,
            sp_tree,
            cached_max_shape_id: None,
        }
    }

    /// Direct shape children of the shape tree, in z-order (first child
    /// is backmost). The group-shape header elements are not shapes.
    fn member_nodes(&self, prs: &Presentation) -> Result<Vec<NodeId>> {
        let mut nodes = Vec::new();
        for child in prs.tree.children(self.sp_tree)? {
            match prs.tree.tag(child)? {
                "p:nvGrpSpPr" | "p:grpSpPr" => {},
                _ => nodes.push(child),
            }
        }
        Ok(nodes)
    }

    pub fn len(&self, prs: &Presentation) -> Result<usize> {
        Ok(self.member_nodes(prs)?.len())
    }

    pub fn is_empty(&self, prs: &Presentation) -> Result<bool> {
        Ok(self.member_nodes(prs)?.is_empty())
    }

    pub fn get(&self, prs: &Presentation, index: usize) -> Result<Shape> {
        let nodes = self.member_nodes(prs)?;
        let node = *nodes.get(index).ok_or(Error::IndexOutOfRange {
            kind: "shape",
            index,
        })?;
        make_shape(prs, self.part, node)
    }

    /// All shapes, materialized in z-order.
    pub fn shapes(&self, prs: &Presentation) -> Result<Vec<Shape>> {
        self.member_nodes(prs)?
            .into_iter()
            .map(|node| make_shape(prs, self.part, node))
            .collect()
    }

    /// Position of `shape` in this collection.
    pub fn index_of(&self, prs: &Presentation, shape: &Shape) -> Result<usize> {
        self.member_nodes(prs)?
            .iter()
            .position(|node| *node == shape.node())
            .ok_or(Error::NotInCollection)
    }

    /// The placeholder shapes, in idx order.
    pub fn placeholders(&self, prs: &Presentation) -> Result<Vec<Shape>> {
        let mut phs: Vec<Shape> = self
            .shapes(prs)?
            .into_iter()
            .filter(|s| s.is_placeholder())
            .collect();
        let mut keyed: Vec<(u32, Shape)> = Vec::with_capacity(phs.len());
        for ph in phs.drain(..) {
            keyed.push((ph.placeholder_format(prs)?.idx, ph));
        }
        keyed.sort_by_key(|(idx, _)| *idx);
        Ok(keyed.into_iter().map(|(_, ph)| ph).collect())
    }

    /// The placeholder occupying slot `idx`, if any.
    pub fn placeholder_by_idx(&self, prs: &Presentation, idx: u32) -> Result<Option<Shape>> {
        for ph in self.placeholders(prs)? {
            if ph.placeholder_format(prs)?.idx == idx {
                return Ok(Some(ph));
            }
        }
        Ok(None)
    }

    /// The first placeholder of the given semantic type, if any.
    pub fn placeholder_by_type(
        &self,
        prs: &Presentation,
        ph_type: PlaceholderType,
    ) -> Result<Option<Shape>> {
        for ph in self.placeholders(prs)? {
            if ph.placeholder_format(prs)?.ph_type == ph_type {
                return Ok(Some(ph));
            }
        }
        Ok(None)
    }

    /// The title placeholder (slot 0), if present.
    pub fn title(&self, prs: &Presentation) -> Result<Option<Shape>> {
        self.placeholder_by_idx(prs, 0)
    }

    /// Whether fast-add id allocation is active.
    pub fn turbo_add_enabled(&self) -> bool {
        self.cached_max_shape_id.is_some()
    }

    /// Toggle fast-add id allocation.
    ///
    /// While enabled, the next id comes from an in-memory counter seeded
    /// by one scan, skipping the per-add document scan. Single-writer
    /// only: adding shapes to the same container through any other path
    /// while enabled risks id collisions.
    pub fn set_turbo_add_enabled(&mut self, prs: &Presentation, enabled: bool) -> Result<()> {
        self.cached_max_shape_id = if enabled {
            Some(self.max_shape_id(prs)?)
        } else {
            None
        };
        Ok(())
    }

    fn max_shape_id(&self, prs: &Presentation) -> Result<u32> {
        let root = prs.part(self.part)?.root;
        let mut max_id = 0;
        for node in prs.tree.descendants(root)? {
            if prs.tree.tag(node)? == "p:cNvPr"
                && let Some(id) = prs.tree.attr_u32(node, "id")?
            {
                max_id = max_id.max(id);
            }
        }
        Ok(max_id)
    }

    fn next_shape_id(&mut self, prs: &Presentation) -> Result<u32> {
        let next = match self.cached_max_shape_id {
            Some(cached) => cached + 1,
            None => self.max_shape_id(prs)? + 1,
        };
        if self.cached_max_shape_id.is_some() {
            self.cached_max_shape_id = Some(next);
        }
        Ok(next)
    }

    fn finish_add(&self, prs: &mut Presentation, node: NodeId) -> Result<Shape> {
        prs.tree.append_child(self.sp_tree, node)?;
        make_shape(prs, self.part, node)
    }

    /// Add a textbox shape.
    pub fn add_textbox(
        &mut self,
        prs: &mut Presentation,
        left: Emu,
        top: Emu,
        width: Emu,
        height: Emu,
    ) -> Result<Shape> {
        let id = self.next_shape_id(prs)?;
        let name = format!("TextBox {}", id - 1);
        let frame = Frame { left, top, width, height };
        let node = build::new_sp(&mut prs.tree, id, &name, None, frame)?;
        self.finish_add(prs, node)
    }

    /// Add an auto shape with the given preset geometry.
    pub fn add_autoshape(
        &mut self,
        prs: &mut Presentation,
        kind: AutoShapeKind,
        left: Emu,
        top: Emu,
        width: Emu,
        height: Emu,
    ) -> Result<Shape> {
        let id = self.next_shape_id(prs)?;
        let name = format!("{} {}", kind.basename(), id - 1);
        let frame = Frame { left, top, width, height };
        let node = build::new_sp(&mut prs.tree, id, &name, Some(kind.prst()), frame)?;
        self.finish_add(prs, node)
    }

    /// Add a picture shape from image bytes.
    ///
    /// `width`/`height` of `None` derive from the image's native pixel
    /// size at 96 dpi; supplying one preserves the aspect ratio for the
    /// other. Identical image payloads share one embedded part.
    pub fn add_picture(
        &mut self,
        prs: &mut Presentation,
        image: &[u8],
        desc: &str,
        left: Emu,
        top: Emu,
        width: Option<Emu>,
        height: Option<Emu>,
    ) -> Result<Shape> {
        let image_ref = prs.store.get_or_add_image_part(image, desc)?;
        let (width, height) = image_ref.scale(width, height);
        let id = self.next_shape_id(prs)?;
        let name = format!("Picture {}", id - 1);
        let frame = Frame { left, top, width, height };
        let node = build::new_pic(
            &mut prs.tree,
            id,
            &name,
            &image_ref.r_id,
            &image_ref.desc,
            frame,
            None,
        )?;
        self.finish_add(prs, node)
    }

    /// Add a movie shape: a picture showing `poster` whose non-visual
    /// properties reference the embedded video.
    #[allow(clippy::too_many_arguments)]
    pub fn add_movie(
        &mut self,
        prs: &mut Presentation,
        movie: Vec<u8>,
        mime_type: &str,
        poster: &[u8],
        left: Emu,
        top: Emu,
        width: Emu,
        height: Emu,
    ) -> Result<Shape> {
        let video_r_id = prs.store.add_media_part(mime_type, movie);
        let poster_ref = prs.store.get_or_add_image_part(poster, "poster")?;
        let id = self.next_shape_id(prs)?;
        let name = format!("Movie {}", id - 1);
        let frame = Frame { left, top, width, height };
        let node = build::new_pic(
            &mut prs.tree,
            id,
            &name,
            &poster_ref.r_id,
            &poster_ref.desc,
            frame,
            Some(&video_r_id),
        )?;
        self.finish_add(prs, node)
    }

    /// Add a connector between two points.
    pub fn add_connector(
        &mut self,
        prs: &mut Presentation,
        kind: ConnectorKind,
        begin: (Emu, Emu),
        end: (Emu, Emu),
    ) -> Result<Shape> {
        let id = self.next_shape_id(prs)?;
        let name = format!("Connector {}", id - 1);
        let node = build::new_cxn_sp(&mut prs.tree, id, &name, kind.prst(), begin, end)?;
        self.finish_add(prs, node)
    }

    /// Add a graphic frame holding a `rows` x `cols` table.
    #[allow(clippy::too_many_arguments)]
    pub fn add_table(
        &mut self,
        prs: &mut Presentation,
        rows: usize,
        cols: usize,
        left: Emu,
        top: Emu,
        width: Emu,
        height: Emu,
    ) -> Result<Shape> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidFormat(
                "a table needs at least one row and one column".to_string(),
            ));
        }
        let id = self.next_shape_id(prs)?;
        let name = format!("Table {}", id - 1);
        let frame = Frame { left, top, width, height };
        let (node, data) =
            build::new_graphic_frame(&mut prs.tree, id, &name, GraphicKind::Table, frame)?;
        let tbl = build::new_tbl(&mut prs.tree, rows, cols, width, height)?;
        prs.tree.append_child(data, tbl)?;
        self.finish_add(prs, node)
    }

    /// Add a graphic frame referencing a new embedded chart part.
    pub fn add_chart(
        &mut self,
        prs: &mut Presentation,
        chart_xml: Vec<u8>,
        left: Emu,
        top: Emu,
        width: Emu,
        height: Emu,
    ) -> Result<Shape> {
        let r_id = prs.store.add_chart_part(chart_xml)?;
        let id = self.next_shape_id(prs)?;
        let name = format!("Chart {}", id - 1);
        let frame = Frame { left, top, width, height };
        let (node, data) =
            build::new_graphic_frame(&mut prs.tree, id, &name, GraphicKind::Chart, frame)?;
        build::add_chart_ref(&mut prs.tree, data, &r_id)?;
        self.finish_add(prs, node)
    }

    /// Add a graphic frame embedding an OLE object, shown as an icon.
    ///
    /// `width`/`height` default to the standard icon extent.
    #[allow(clippy::too_many_arguments)]
    pub fn add_ole_object(
        &mut self,
        prs: &mut Presentation,
        prog_id: &str,
        blob: Vec<u8>,
        left: Emu,
        top: Emu,
        width: Option<Emu>,
        height: Option<Emu>,
    ) -> Result<Shape> {
        let r_id = prs.store.add_ole_object_part(prog_id, blob)?;
        let width = width.unwrap_or(OLE_ICON_WIDTH);
        let height = height.unwrap_or(OLE_ICON_HEIGHT);
        let id = self.next_shape_id(prs)?;
        let name = format!("Object {}", id - 1);
        let frame = Frame { left, top, width, height };
        let (node, data) =
            build::new_graphic_frame(&mut prs.tree, id, &name, GraphicKind::OleObject, frame)?;
        build::add_ole_ref(&mut prs.tree, data, prog_id, &r_id, (width, height))?;
        self.finish_add(prs, node)
    }

    /// Add an empty group shape.
    pub fn add_group(&mut self, prs: &mut Presentation) -> Result<Shape> {
        let id = self.next_shape_id(prs)?;
        let name = format!("Group {}", id - 1);
        let node = build::new_grp_sp(&mut prs.tree, id, &name)?;
        self.finish_add(prs, node)
    }

    /// Copy a base part's placeholder into this collection.
    ///
    /// The ph marker attributes carry over verbatim so the new shape
    /// stays in the same slot; geometry is left unset and inherits.
    pub fn clone_placeholder(&mut self, prs: &mut Presentation, source: &Shape) -> Result<Shape> {
        let ph = source
            .ph_element(prs)?
            .ok_or(Error::NotAPlaceholder)?;
        let ph_attrs: Vec<(String, String)> = prs
            .tree
            .get(ph)?
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let format = source.placeholder_format(prs)?;

        let id = self.next_shape_id(prs)?;
        let name = self.next_ph_name(prs, format.ph_type, id, format.orientation)?;
        let borrowed: Vec<(&str, &str)> = ph_attrs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let node = build::new_ph_sp(&mut prs.tree, id, &name, &borrowed)?;
        self.finish_add(prs, node)
    }

    /// Derive a placeholder name: `"[Vertical ]<basename> <n>"`, where
    /// `n` starts at `id - 1` and probes upward past names already used
    /// anywhere in the part (manual edits can leave gaps and clashes).
    pub(crate) fn next_ph_name(
        &self,
        prs: &Presentation,
        ph_type: PlaceholderType,
        id: u32,
        orientation: Orientation,
    ) -> Result<String> {
        let container = prs.container_kind(self.part)?;
        let basename = ph_basename(container, ph_type);
        let basename = if orientation == Orientation::Vertical {
            format!("Vertical {basename}")
        } else {
            basename.to_string()
        };

        let root = prs.part(self.part)?.root;
        let mut used = Vec::new();
        for node in prs.tree.descendants(root)? {
            if prs.tree.tag(node)? == "p:cNvPr"
                && let Some(name) = prs.tree.attr(node, "name")?
            {
                used.push(name.to_string());
            }
        }

        let mut numpart = id.saturating_sub(1);
        loop {
            let name = format!("{basename} {numpart}");
            if !used.iter().any(|n| *n == name) {
                return Ok(name);
            }
            numpart += 1;
        }
    }
}

/// Display basename for a placeholder type, per container family.
fn ph_basename(container: ContainerKind, ph_type: PlaceholderType) -> &'static str {
    if matches!(
        container,
        ContainerKind::NotesMaster | ContainerKind::NotesSlide
    ) && ph_type == PlaceholderType::Body
    {
        return "Notes Placeholder";
    }
    match ph_type {
        PlaceholderType::Title | PlaceholderType::CenterTitle => "Title",
        PlaceholderType::Subtitle => "Subtitle",
        PlaceholderType::Body => "Text Placeholder",
        PlaceholderType::Object => "Content Placeholder",
        PlaceholderType::Chart => "Chart Placeholder",
        PlaceholderType::Table => "Table Placeholder",
        PlaceholderType::Picture => "Picture Placeholder",
        PlaceholderType::Bitmap => "ClipArt Placeholder",
        PlaceholderType::OrgChart => "SmartArt Placeholder",
        PlaceholderType::MediaClip => "Media Placeholder",
        PlaceholderType::Date => "Date Placeholder",
        PlaceholderType::Footer => "Footer Placeholder",
        PlaceholderType::Header => "Header Placeholder",
        PlaceholderType::SlideNumber => "Slide Number Placeholder",
        PlaceholderType::SlideImage => "Slide Image Placeholder",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::test_png;
    use crate::shapes::base::ShapeKind;

    fn slide_fixture() -> (Presentation, PartId) {
        let mut prs = Presentation::new();
        let master = prs.add_master().unwrap();
        let layout = prs.add_layout(master).unwrap();
        let slide = prs.add_slide(layout).unwrap();
        (prs, slide)
    }

    #[test]
    fn test_ids_unique_and_monotonic() {
        let (mut prs, slide) = slide_fixture();
        let mut shapes = prs.shapes(slide).unwrap();
        let a = shapes
            .add_textbox(&mut prs, Emu(0), Emu(0), Emu(100), Emu(100))
            .unwrap();
        let b = shapes
            .add_autoshape(
                &mut prs,
                AutoShapeKind::Oval,
                Emu(0),
                Emu(0),
                Emu(100),
                Emu(100),
            )
            .unwrap();
        let c = shapes
            .add_table(&mut prs, 2, 2, Emu(0), Emu(0), Emu(200), Emu(200))
            .unwrap();

        let ids = [
            a.shape_id(&prs).unwrap(),
            b.shape_id(&prs).unwrap(),
            c.shape_id(&prs).unwrap(),
        ];
        // spTree header occupies id 1.
        assert_eq!(ids, [2, 3, 4]);
    }

    #[test]
    fn test_default_names() {
        let (mut prs, slide) = slide_fixture();
        let mut shapes = prs.shapes(slide).unwrap();
        let tb = shapes
            .add_textbox(&mut prs, Emu(0), Emu(0), Emu(100), Emu(100))
            .unwrap();
        assert_eq!(tb.name(&prs).unwrap(), "TextBox 1");
        let oval = shapes
            .add_autoshape(
                &mut prs,
                AutoShapeKind::Oval,
                Emu(0),
                Emu(0),
                Emu(100),
                Emu(100),
            )
            .unwrap();
        assert_eq!(oval.name(&prs).unwrap(), "Oval 2");
    }

    #[test]
    fn test_turbo_add_caches_ids() {
        let (mut prs, slide) = slide_fixture();
        let mut shapes = prs.shapes(slide).unwrap();
        shapes.set_turbo_add_enabled(&prs, true).unwrap();
        assert!(shapes.turbo_add_enabled());
        let a = shapes
            .add_textbox(&mut prs, Emu(0), Emu(0), Emu(100), Emu(100))
            .unwrap();
        let b = shapes
            .add_textbox(&mut prs, Emu(0), Emu(0), Emu(100), Emu(100))
            .unwrap();
        assert_eq!(a.shape_id(&prs).unwrap() + 1, b.shape_id(&prs).unwrap());
        shapes.set_turbo_add_enabled(&prs, false).unwrap();
        assert!(!shapes.turbo_add_enabled());
    }

    #[test]
    fn test_index_and_membership() {
        let (mut prs, slide) = slide_fixture();
        let mut shapes = prs.shapes(slide).unwrap();
        let a = shapes
            .add_textbox(&mut prs, Emu(0), Emu(0), Emu(100), Emu(100))
            .unwrap();
        let b = shapes
            .add_group(&mut prs)
            .unwrap();
        assert_eq!(shapes.len(&prs).unwrap(), 2);
        assert_eq!(shapes.index_of(&prs, &a).unwrap(), 0);
        assert_eq!(shapes.index_of(&prs, &b).unwrap(), 1);
        assert!(matches!(
            shapes.get(&prs, 5),
            Err(Error::IndexOutOfRange { kind: "shape", index: 5 })
        ));

        let master = prs.add_master().unwrap();
        let other = prs.shapes(master).unwrap();
        assert!(matches!(
            other.index_of(&prs, &a),
            Err(Error::NotInCollection)
        ));
    }

    #[test]
    fn test_group_member_collection() {
        let (mut prs, slide) = slide_fixture();
        let mut shapes = prs.shapes(slide).unwrap();
        let group = shapes.add_group(&mut prs).unwrap();

        let mut members = group.shapes(&prs).unwrap();
        let inner = members
            .add_textbox(&mut prs, Emu(0), Emu(0), Emu(100), Emu(100))
            .unwrap();
        assert_eq!(members.len(&prs).unwrap(), 1);
        assert_eq!(members.index_of(&prs, &inner).unwrap(), 0);
        // The group stays a single member of the slide collection, and
        // ids keep climbing across the nesting boundary.
        assert_eq!(shapes.len(&prs).unwrap(), 1);
        assert_eq!(
            inner.shape_id(&prs).unwrap(),
            group.shape_id(&prs).unwrap() + 1
        );

        assert!(matches!(
            inner.shapes(&prs),
            Err(Error::UnsupportedShapeOperation("group members"))
        ));
    }

    #[test]
    fn test_add_picture_scales_from_image() {
        let (mut prs, slide) = slide_fixture();
        let mut shapes = prs.shapes(slide).unwrap();
        let png = test_png(96, 48);
        let pic = shapes
            .add_picture(&mut prs, &png, "logo.png", Emu(10), Emu(20), None, None)
            .unwrap();
        assert_eq!(pic.kind(), ShapeKind::Picture);
        assert_eq!(pic.width(&prs).unwrap(), Some(Emu::from_inches(1.0)));
        assert_eq!(pic.height(&prs).unwrap(), Some(Emu(457_200)));
    }

    #[test]
    fn test_add_movie_is_movie_kind() {
        let (mut prs, slide) = slide_fixture();
        let mut shapes = prs.shapes(slide).unwrap();
        let movie = shapes
            .add_movie(
                &mut prs,
                vec![0u8; 4],
                "video/mp4",
                &test_png(32, 32),
                Emu(0),
                Emu(0),
                Emu(100),
                Emu(100),
            )
            .unwrap();
        assert_eq!(movie.kind(), ShapeKind::Movie);
    }

    #[test]
    fn test_add_connector_flips() {
        let (mut prs, slide) = slide_fixture();
        let mut shapes = prs.shapes(slide).unwrap();
        let cxn = shapes
            .add_connector(
                &mut prs,
                ConnectorKind::Straight,
                (Emu(500), Emu(100)),
                (Emu(100), Emu(400)),
            )
            .unwrap();
        assert_eq!(cxn.kind(), ShapeKind::Connector);
        assert_eq!(cxn.left(&prs).unwrap(), Some(Emu(100)));
        assert_eq!(cxn.top(&prs).unwrap(), Some(Emu(100)));
        assert_eq!(cxn.width(&prs).unwrap(), Some(Emu(400)));
        assert_eq!(cxn.height(&prs).unwrap(), Some(Emu(300)));
    }

    #[test]
    fn test_add_ole_object_defaults_to_icon_size() {
        let (mut prs, slide) = slide_fixture();
        let mut shapes = prs.shapes(slide).unwrap();
        let obj = shapes
            .add_ole_object(
                &mut prs,
                "Excel.Sheet.12",
                vec![1, 2, 3],
                Emu(0),
                Emu(0),
                None,
                None,
            )
            .unwrap();
        assert_eq!(obj.kind(), ShapeKind::GraphicFrame(GraphicKind::OleObject));
        assert_eq!(obj.width(&prs).unwrap(), Some(OLE_ICON_WIDTH));
        assert_eq!(obj.height(&prs).unwrap(), Some(OLE_ICON_HEIGHT));
        let r_id = obj.ole_r_id(&prs).unwrap();
        assert!(prs.store().related_part(&r_id).is_ok());
    }

    #[test]
    fn test_chart_frame_resolves_part() {
        let (mut prs, slide) = slide_fixture();
        let mut shapes = prs.shapes(slide).unwrap();
        let chart = shapes
            .add_chart(
                &mut prs,
                b"<c:chartSpace/>".to_vec(),
                Emu(0),
                Emu(0),
                Emu(100),
                Emu(100),
            )
            .unwrap();
        let r_id = chart.chart_r_id(&prs).unwrap();
        assert!(prs.store().related_part(&r_id).is_ok());
    }
}
