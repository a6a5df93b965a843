//! Constructors for new shape element subtrees.
//!
//! Each function assembles the minimal schema-valid element for one
//! shape kind. Callers append the returned node to a `p:spTree`.

use crate::enums::GraphicKind;
use crate::error::Result;
use crate::tree::{NodeId, Tree};
use crate::unit::Emu;

/// Position and extent of a new shape, in EMU.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub left: Emu,
    pub top: Emu,
    pub width: Emu,
    pub height: Emu,
}

/// `a:xfrm` with `a:off` and `a:ext` under `parent`.
pub(crate) fn add_xfrm(tree: &mut Tree, parent: NodeId, tag: &str, frame: Frame) -> Result<NodeId> {
    let xfrm = tree.new_element(tag);
    tree.append_child(parent, xfrm)?;
    let off = tree.new_element("a:off");
    tree.set_attr_i64(off, "x", frame.left.0)?;
    tree.set_attr_i64(off, "y", frame.top.0)?;
    tree.append_child(xfrm, off)?;
    let ext = tree.new_element("a:ext");
    tree.set_attr_i64(ext, "cx", frame.width.0)?;
    tree.set_attr_i64(ext, "cy", frame.height.0)?;
    tree.append_child(xfrm, ext)?;
    Ok(xfrm)
}

/// Non-visual properties header shared by all shape elements. Returns
/// the `p:nvPr` node so callers can attach `p:ph` or `a:videoFile`.
fn add_nv_pr(
    tree: &mut Tree,
    shape: NodeId,
    container_tag: &str,
    c_nv_tag: &str,
    id: u32,
    name: &str,
) -> Result<NodeId> {
    let container = tree.new_element(container_tag);
    tree.append_child(shape, container)?;
    let c_nv_pr = tree.new_element("p:cNvPr");
    tree.set_attr_i64(c_nv_pr, "id", id as i64)?;
    tree.set_attr(c_nv_pr, "name", name)?;
    tree.append_child(container, c_nv_pr)?;
    let c_nv = tree.new_element(c_nv_tag);
    tree.append_child(container, c_nv)?;
    let nv_pr = tree.new_element("p:nvPr");
    tree.append_child(container, nv_pr)?;
    Ok(nv_pr)
}

fn add_tx_body(tree: &mut Tree, shape: NodeId, word_wrap: Option<bool>) -> Result<NodeId> {
    let tx_body = tree.new_element("p:txBody");
    tree.append_child(shape, tx_body)?;
    let body_pr = tree.new_element("a:bodyPr");
    if word_wrap == Some(false) {
        tree.set_attr(body_pr, "wrap", "none")?;
    }
    tree.append_child(tx_body, body_pr)?;
    let p = tree.new_element("a:p");
    tree.append_child(tx_body, p)?;
    Ok(tx_body)
}

fn add_prst_geom(tree: &mut Tree, sp_pr: NodeId, prst: &str) -> Result<()> {
    let geom = tree.new_element("a:prstGeom");
    tree.set_attr(geom, "prst", prst)?;
    tree.append_child(sp_pr, geom)?;
    let av_lst = tree.new_element("a:avLst");
    tree.append_child(geom, av_lst)
}

/// New `p:sp` with preset geometry; `prst` of `None` means a textbox
/// (no geometry element, `txBox` marker, wrap disabled).
pub(crate) fn new_sp(
    tree: &mut Tree,
    id: u32,
    name: &str,
    prst: Option<&str>,
    frame: Frame,
) -> Result<NodeId> {
    let sp = tree.new_element("p:sp");
    add_nv_pr(tree, sp, "p:nvSpPr", "p:cNvSpPr", id, name)?;
    if prst.is_none()
        && let Some(container) = tree.find_child(sp, "p:nvSpPr")?
        && let Some(c_nv_sp_pr) = tree.find_child(container, "p:cNvSpPr")?
    {
        tree.set_attr_bool(c_nv_sp_pr, "txBox", true)?;
    }
    let sp_pr = tree.new_element("p:spPr");
    tree.append_child(sp, sp_pr)?;
    add_xfrm(tree, sp_pr, "a:xfrm", frame)?;
    if let Some(prst) = prst {
        add_prst_geom(tree, sp_pr, prst)?;
    }
    add_tx_body(tree, sp, if prst.is_none() { Some(false) } else { None })?;
    Ok(sp)
}

/// New placeholder `p:sp`: ph marker in `p:nvPr`, no explicit geometry
/// so position and size inherit through the placeholder chain.
pub(crate) fn new_ph_sp(
    tree: &mut Tree,
    id: u32,
    name: &str,
    ph_attrs: &[(&str, &str)],
) -> Result<NodeId> {
    let sp = tree.new_element("p:sp");
    let nv_pr = add_nv_pr(tree, sp, "p:nvSpPr", "p:cNvSpPr", id, name)?;
    let ph = tree.new_element("p:ph");
    for (key, value) in ph_attrs {
        tree.set_attr(ph, key, value)?;
    }
    tree.append_child(nv_pr, ph)?;
    let sp_pr = tree.new_element("p:spPr");
    tree.append_child(sp, sp_pr)?;
    add_tx_body(tree, sp, None)?;
    Ok(sp)
}

/// New `p:pic` referencing an image relationship. A `video_r_id` turns
/// the picture into a movie via `a:videoFile` in its `p:nvPr`.
pub(crate) fn new_pic(
    tree: &mut Tree,
    id: u32,
    name: &str,
    image_r_id: &str,
    desc: &str,
    frame: Frame,
    video_r_id: Option<&str>,
) -> Result<NodeId> {
    let pic = tree.new_element("p:pic");
    let nv_pr = add_nv_pr(tree, pic, "p:nvPicPr", "p:cNvPicPr", id, name)?;
    if let Some(container) = tree.find_child(pic, "p:nvPicPr")?
        && let Some(c_nv_pr) = tree.find_child(container, "p:cNvPr")?
    {
        tree.set_attr(c_nv_pr, "descr", desc)?;
    }
    if let Some(video_r_id) = video_r_id {
        let video = tree.new_element("a:videoFile");
        tree.set_attr(video, "r:link", video_r_id)?;
        tree.append_child(nv_pr, video)?;
    }

    let blip_fill = tree.new_element("p:blipFill");
    tree.append_child(pic, blip_fill)?;
    let blip = tree.new_element("a:blip");
    tree.set_attr(blip, "r:embed", image_r_id)?;
    tree.append_child(blip_fill, blip)?;
    let stretch = tree.new_element("a:stretch");
    tree.append_child(blip_fill, stretch)?;
    let fill_rect = tree.new_element("a:fillRect");
    tree.append_child(stretch, fill_rect)?;

    let sp_pr = tree.new_element("p:spPr");
    tree.append_child(pic, sp_pr)?;
    add_xfrm(tree, sp_pr, "a:xfrm", frame)?;
    add_prst_geom(tree, sp_pr, "rect")?;
    Ok(pic)
}

/// New `p:cxnSp` between two points; flip flags encode direction.
pub(crate) fn new_cxn_sp(
    tree: &mut Tree,
    id: u32,
    name: &str,
    prst: &str,
    begin: (Emu, Emu),
    end: (Emu, Emu),
) -> Result<NodeId> {
    let cxn = tree.new_element("p:cxnSp");
    add_nv_pr(tree, cxn, "p:nvCxnSpPr", "p:cNvCxnSpPr", id, name)?;
    let sp_pr = tree.new_element("p:spPr");
    tree.append_child(cxn, sp_pr)?;
    let frame = Frame {
        left: Emu(begin.0.0.min(end.0.0)),
        top: Emu(begin.1.0.min(end.1.0)),
        width: Emu((begin.0.0 - end.0.0).abs()),
        height: Emu((begin.1.0 - end.1.0).abs()),
    };
    let xfrm = add_xfrm(tree, sp_pr, "a:xfrm", frame)?;
    if end.0.0 < begin.0.0 {
        tree.set_attr_bool(xfrm, "flipH", true)?;
    }
    if end.1.0 < begin.1.0 {
        tree.set_attr_bool(xfrm, "flipV", true)?;
    }
    add_prst_geom(tree, sp_pr, prst)?;
    Ok(cxn)
}

/// New empty `p:grpSp`.
pub(crate) fn new_grp_sp(tree: &mut Tree, id: u32, name: &str) -> Result<NodeId> {
    let grp = tree.new_element("p:grpSp");
    add_nv_pr(tree, grp, "p:nvGrpSpPr", "p:cNvGrpSpPr", id, name)?;
    let grp_sp_pr = tree.new_element("p:grpSpPr");
    tree.append_child(grp, grp_sp_pr)?;
    add_xfrm(
        tree,
        grp_sp_pr,
        "a:xfrm",
        Frame {
            left: Emu(0),
            top: Emu(0),
            width: Emu(0),
            height: Emu(0),
        },
    )?;
    Ok(grp)
}

/// New `p:graphicFrame` for the given graphic kind. Returns the frame
/// and its empty `a:graphicData` node.
pub(crate) fn new_graphic_frame(
    tree: &mut Tree,
    id: u32,
    name: &str,
    kind: GraphicKind,
    frame: Frame,
) -> Result<(NodeId, NodeId)> {
    let gf = tree.new_element("p:graphicFrame");
    add_nv_pr(tree, gf, "p:nvGraphicFramePr", "p:cNvGraphicFramePr", id, name)?;
    add_xfrm(tree, gf, "p:xfrm", frame)?;
    let graphic = tree.new_element("a:graphic");
    tree.append_child(gf, graphic)?;
    let data = tree.new_element("a:graphicData");
    tree.set_attr(data, "uri", kind.uri())?;
    tree.append_child(graphic, data)?;
    Ok((gf, data))
}

/// New `c:chart` reference element for a chart graphic frame.
pub(crate) fn add_chart_ref(tree: &mut Tree, data: NodeId, r_id: &str) -> Result<()> {
    let chart = tree.new_element("c:chart");
    tree.set_attr(
        chart,
        "xmlns:c",
        "http://schemas.openxmlformats.org/drawingml/2006/chart",
    )?;
    tree.set_attr(chart, "r:id", r_id)?;
    tree.append_child(data, chart)
}

/// New `p:oleObj` reference element for an OLE graphic frame.
pub(crate) fn add_ole_ref(
    tree: &mut Tree,
    data: NodeId,
    prog_id: &str,
    r_id: &str,
    icon: (Emu, Emu),
) -> Result<()> {
    let ole = tree.new_element("p:oleObj");
    tree.set_attr(ole, "progId", prog_id)?;
    tree.set_attr(ole, "r:id", r_id)?;
    tree.set_attr_bool(ole, "showAsIcon", true)?;
    tree.set_attr_i64(ole, "imgW", icon.0.0)?;
    tree.set_attr_i64(ole, "imgH", icon.1.0)?;
    tree.append_child(data, ole)?;
    let embed = tree.new_element("p:embed");
    tree.append_child(ole, embed)
}

const DEFAULT_TABLE_STYLE: &str = "{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}";

/// New `a:tbl` with a uniform grid. Column widths divide `width` with
/// the remainder on the last column; row heights likewise.
pub(crate) fn new_tbl(
    tree: &mut Tree,
    rows: usize,
    cols: usize,
    width: Emu,
    height: Emu,
) -> Result<NodeId> {
    let tbl = tree.new_element("a:tbl");
    let tbl_pr = tree.new_element("a:tblPr");
    tree.set_attr_bool(tbl_pr, "firstRow", true)?;
    tree.set_attr_bool(tbl_pr, "bandRow", true)?;
    tree.append_child(tbl, tbl_pr)?;
    let style_id = tree.new_element("a:tableStyleId");
    tree.set_text(style_id, DEFAULT_TABLE_STYLE)?;
    tree.append_child(tbl_pr, style_id)?;

    let grid = tree.new_element("a:tblGrid");
    tree.append_child(tbl, grid)?;
    let col_width = width.0 / cols as i64;
    for col in 0..cols {
        let grid_col = tree.new_element("a:gridCol");
        let w = if col == cols - 1 {
            width.0 - col_width * (cols as i64 - 1)
        } else {
            col_width
        };
        tree.set_attr_i64(grid_col, "w", w)?;
        tree.append_child(grid, grid_col)?;
    }

    let row_height = height.0 / rows as i64;
    for row in 0..rows {
        let tr = tree.new_element("a:tr");
        let h = if row == rows - 1 {
            height.0 - row_height * (rows as i64 - 1)
        } else {
            row_height
        };
        tree.set_attr_i64(tr, "h", h)?;
        tree.append_child(tbl, tr)?;
        for _ in 0..cols {
            let tc = new_tc(tree)?;
            tree.append_child(tr, tc)?;
        }
    }
    Ok(tbl)
}

/// New empty `a:tc` cell with its text body and properties stub.
pub(crate) fn new_tc(tree: &mut Tree) -> Result<NodeId> {
    let tc = tree.new_element("a:tc");
    let tx_body = tree.new_element("a:txBody");
    tree.append_child(tc, tx_body)?;
    let body_pr = tree.new_element("a:bodyPr");
    tree.append_child(tx_body, body_pr)?;
    let p = tree.new_element("a:p");
    tree.append_child(tx_body, p)?;
    let tc_pr = tree.new_element("a:tcPr");
    tree.append_child(tc, tc_pr)?;
    Ok(tc)
}
