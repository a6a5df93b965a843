//! The DrawingML table grid: rows, columns, cells, merge and split.
//!
//! Every grid position holds a real `a:tc` element, merged or not. A
//! merge is recorded on the cells themselves: the top-left origin cell
//! carries the span counts, continuation cells carry `hMerge`/`vMerge`
//! flags. Merging consolidates content into the origin one way; split
//! restores the span state but never redistributes content back out.

use crate::enums::VerticalAnchor;
use crate::error::{Error, Result};
use crate::package::Presentation;
use crate::text::TextFrame;
use crate::tree::{NodeId, Tree};
use crate::unit::Emu;

/// Default cell side margins.
const DEFAULT_MARGIN_LR: Emu = Emu(91_440);
const DEFAULT_MARGIN_TB: Emu = Emu(45_720);

/// View over an `a:tbl` inside a graphic frame.
#[derive(Debug, Clone, Copy)]
pub struct Table {
    tbl: NodeId,
    /// The owning `p:graphicFrame`; its extent mirrors the grid totals.
    frame: NodeId,
}

impl Table {
    pub(crate) fn over(tbl: NodeId, frame: NodeId) -> Table {
        Table { tbl, frame }
    }

    pub fn row_count(&self, prs: &Presentation) -> Result<usize> {
        Ok(self.tr_nodes(&prs.tree)?.len())
    }

    pub fn col_count(&self, prs: &Presentation) -> Result<usize> {
        Ok(self.grid_col_nodes(&prs.tree)?.len())
    }

    pub fn rows(&self, prs: &Presentation) -> Result<Vec<Row>> {
        Ok(self
            .tr_nodes(&prs.tree)?
            .into_iter()
            .map(|tr| Row { tr, table: *self })
            .collect())
    }

    pub fn columns(&self, prs: &Presentation) -> Result<Vec<Column>> {
        Ok(self
            .grid_col_nodes(&prs.tree)?
            .into_iter()
            .map(|grid_col| Column {
                grid_col,
                table: *self,
            })
            .collect())
    }

    /// The cell at grid position `(row, col)`. Spanned cells are
    /// addressable like any other.
    pub fn cell(&self, prs: &Presentation, row: usize, col: usize) -> Result<Cell> {
        let trs = self.tr_nodes(&prs.tree)?;
        let tr = *trs.get(row).ok_or(Error::IndexOutOfRange {
            kind: "row",
            index: row,
        })?;
        let tcs = tc_nodes(&prs.tree, tr)?;
        let tc = *tcs.get(col).ok_or(Error::IndexOutOfRange {
            kind: "column",
            index: col,
        })?;
        Ok(Cell { tc, tbl: self.tbl })
    }

    pub fn first_row(&self, prs: &Presentation) -> Result<bool> {
        self.style_flag(prs, "firstRow")
    }

    pub fn set_first_row(&self, prs: &mut Presentation, on: bool) -> Result<()> {
        self.set_style_flag(prs, "firstRow", on)
    }

    pub fn last_row(&self, prs: &Presentation) -> Result<bool> {
        self.style_flag(prs, "lastRow")
    }

    pub fn set_last_row(&self, prs: &mut Presentation, on: bool) -> Result<()> {
        self.set_style_flag(prs, "lastRow", on)
    }

    pub fn first_col(&self, prs: &Presentation) -> Result<bool> {
        self.style_flag(prs, "firstCol")
    }

    pub fn set_first_col(&self, prs: &mut Presentation, on: bool) -> Result<()> {
        self.set_style_flag(prs, "firstCol", on)
    }

    pub fn last_col(&self, prs: &Presentation) -> Result<bool> {
        self.style_flag(prs, "lastCol")
    }

    pub fn set_last_col(&self, prs: &mut Presentation, on: bool) -> Result<()> {
        self.set_style_flag(prs, "lastCol", on)
    }

    pub fn horz_banding(&self, prs: &Presentation) -> Result<bool> {
        self.style_flag(prs, "bandRow")
    }

    pub fn set_horz_banding(&self, prs: &mut Presentation, on: bool) -> Result<()> {
        self.set_style_flag(prs, "bandRow", on)
    }

    pub fn vert_banding(&self, prs: &Presentation) -> Result<bool> {
        self.style_flag(prs, "bandCol")
    }

    pub fn set_vert_banding(&self, prs: &mut Presentation, on: bool) -> Result<()> {
        self.set_style_flag(prs, "bandCol", on)
    }

    fn style_flag(&self, prs: &Presentation, name: &str) -> Result<bool> {
        match prs.tree.find_child(self.tbl, "a:tblPr")? {
            Some(tbl_pr) => prs.tree.attr_bool(tbl_pr, name),
            None => Ok(false),
        }
    }

    fn set_style_flag(&self, prs: &mut Presentation, name: &str, on: bool) -> Result<()> {
        let tbl_pr = match prs.tree.find_child(self.tbl, "a:tblPr")? {
            Some(tbl_pr) => tbl_pr,
            None => {
                let tbl_pr = prs.tree.new_element("a:tblPr");
                // tblPr leads the table element.
                match prs.tree.children(self.tbl)?.first() {
                    Some(first) => prs.tree.insert_before(*first, tbl_pr)?,
                    None => prs.tree.append_child(self.tbl, tbl_pr)?,
                }
                tbl_pr
            },
        };
        if on {
            prs.tree.set_attr_bool(tbl_pr, name, true)
        } else {
            prs.tree.remove_attr(tbl_pr, name)
        }
    }

    fn tr_nodes(&self, tree: &Tree) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        for child in tree.children(self.tbl)? {
            if tree.tag(child)? == "a:tr" {
                out.push(child);
            }
        }
        Ok(out)
    }

    fn grid_col_nodes(&self, tree: &Tree) -> Result<Vec<NodeId>> {
        let Some(grid) = tree.find_child(self.tbl, "a:tblGrid")? else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for child in tree.children(grid)? {
            if tree.tag(child)? == "a:gridCol" {
                out.push(child);
            }
        }
        Ok(out)
    }

    /// Re-derive the owning frame's extent from the grid totals. Runs
    /// after any row or column resize so the invariant that row heights
    /// sum to the frame height (and widths to its width) holds.
    fn sync_frame_extent(&self, prs: &mut Presentation) -> Result<()> {
        let mut width = 0i64;
        for grid_col in self.grid_col_nodes(&prs.tree)? {
            width += prs.tree.attr_i64(grid_col, "w")?.unwrap_or(0);
        }
        let mut height = 0i64;
        for tr in self.tr_nodes(&prs.tree)? {
            height += prs.tree.attr_i64(tr, "h")?.unwrap_or(0);
        }
        let xfrm = prs.tree.get_or_add_child(self.frame, "p:xfrm")?;
        let ext = prs.tree.get_or_add_child(xfrm, "a:ext")?;
        prs.tree.set_attr_i64(ext, "cx", width)?;
        prs.tree.set_attr_i64(ext, "cy", height)
    }
}

/// One table row.
#[derive(Debug, Clone, Copy)]
pub struct Row {
    tr: NodeId,
    table: Table,
}

impl Row {
    pub fn height(&self, prs: &Presentation) -> Result<Emu> {
        Ok(Emu(prs.tree.attr_i64(self.tr, "h")?.unwrap_or(0)))
    }

    pub fn set_height(&self, prs: &mut Presentation, height: Emu) -> Result<()> {
        prs.tree.set_attr_i64(self.tr, "h", height.0)?;
        self.table.sync_frame_extent(prs)
    }

    pub fn cells(&self, prs: &Presentation) -> Result<Vec<Cell>> {
        Ok(tc_nodes(&prs.tree, self.tr)?
            .into_iter()
            .map(|tc| Cell {
                tc,
                tbl: self.table.tbl,
            })
            .collect())
    }
}

/// One table column, as defined by the grid.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    grid_col: NodeId,
    table: Table,
}

impl Column {
    pub fn width(&self, prs: &Presentation) -> Result<Emu> {
        Ok(Emu(prs.tree.attr_i64(self.grid_col, "w")?.unwrap_or(0)))
    }

    pub fn set_width(&self, prs: &mut Presentation, width: Emu) -> Result<()> {
        prs.tree.set_attr_i64(self.grid_col, "w", width.0)?;
        self.table.sync_frame_extent(prs)
    }
}

/// One grid cell.
#[derive(Debug, Clone, Copy)]
pub struct Cell {
    tc: NodeId,
    tbl: NodeId,
}

impl Cell {
    pub fn text_frame(&self, prs: &mut Presentation) -> Result<TextFrame> {
        let tx_body = prs.tree.get_or_add_child(self.tc, "a:txBody")?;
        TextFrame::over(&mut prs.tree, tx_body)
    }

    pub fn text(&self, prs: &Presentation) -> Result<String> {
        match prs.tree.find_child(self.tc, "a:txBody")? {
            Some(tx_body) => TextFrame::attach(tx_body).text(prs),
            None => Ok(String::new()),
        }
    }

    pub fn set_text(&self, prs: &mut Presentation, text: &str) -> Result<()> {
        let frame = self.text_frame(prs)?;
        frame.set_text(prs, text)
    }

    /// Whether this cell is the top-left cell of a merged range. Only
    /// a merge origin carries meaningful span counts.
    pub fn is_merge_origin(&self, prs: &Presentation) -> Result<bool> {
        let spans = self.span_width(prs)? > 1 || self.span_height(prs)? > 1;
        Ok(spans && !self.is_spanned(prs)?)
    }

    /// Whether this cell is a continuation cell of some merged range.
    pub fn is_spanned(&self, prs: &Presentation) -> Result<bool> {
        Ok(prs.tree.attr_bool(self.tc, "hMerge")? || prs.tree.attr_bool(self.tc, "vMerge")?)
    }

    pub fn span_width(&self, prs: &Presentation) -> Result<usize> {
        Ok(prs.tree.attr_i64(self.tc, "gridSpan")?.unwrap_or(1).max(1) as usize)
    }

    pub fn span_height(&self, prs: &Presentation) -> Result<usize> {
        Ok(prs.tree.attr_i64(self.tc, "rowSpan")?.unwrap_or(1).max(1) as usize)
    }

    /// Merge the rectangular range cornered by this cell and `other`.
    ///
    /// The corners may be given in either order and either diagonal.
    /// Content of every cell in the range moves into the top-left
    /// origin cell. The move is one-way: split does not restore it.
    pub fn merge(&self, prs: &mut Presentation, other: &Cell) -> Result<()> {
        if self.tbl != other.tbl {
            return Err(Error::CrossTable);
        }
        let (r1, c1) = self.coords(prs)?;
        let (r2, c2) = other.coords(prs)?;
        let (top, bottom) = (r1.min(r2), r1.max(r2));
        let (left, right) = (c1.min(c2), c1.max(c2));
        let grid = tc_grid(&prs.tree, self.tbl)?;

        for r in top..=bottom {
            for c in left..=right {
                if in_merge(&prs.tree, grid_cell(&grid, r, c)?)? {
                    return Err(Error::OverlappingMerge);
                }
            }
        }

        let rows = bottom - top + 1;
        let cols = right - left + 1;
        let origin = grid_cell(&grid, top, left)?;

        for r in top..=bottom {
            for c in left..=right {
                let tc = grid_cell(&grid, r, c)?;
                if tc != origin {
                    move_cell_content(&mut prs.tree, tc, origin)?;
                }
            }
        }

        // Span counts on the leading row and column, continuation flags
        // on everything off the origin's row/column.
        if rows > 1 {
            for c in left..=right {
                prs.tree
                    .set_attr_i64(grid_cell(&grid, top, c)?, "rowSpan", rows as i64)?;
            }
        }
        if cols > 1 {
            for r in top..=bottom {
                prs.tree
                    .set_attr_i64(grid_cell(&grid, r, left)?, "gridSpan", cols as i64)?;
            }
        }
        for r in top..=bottom {
            for c in left..=right {
                let tc = grid_cell(&grid, r, c)?;
                if c != left {
                    prs.tree.set_attr_bool(tc, "hMerge", true)?;
                }
                if r != top {
                    prs.tree.set_attr_bool(tc, "vMerge", true)?;
                }
            }
        }
        Ok(())
    }

    /// Dissolve the merged range this origin cell anchors: every cell
    /// in the range returns to a 1x1 span with no merge flags. Content
    /// consolidated by merge stays in this cell.
    pub fn split(&self, prs: &mut Presentation) -> Result<()> {
        if !self.is_merge_origin(prs)? {
            return Err(Error::NotMergeOrigin);
        }
        let rows = self.span_height(prs)?;
        let cols = self.span_width(prs)?;
        let (top, left) = self.coords(prs)?;
        let grid = tc_grid(&prs.tree, self.tbl)?;

        for r in top..top + rows {
            for c in left..left + cols {
                let tc = grid_cell(&grid, r, c)?;
                prs.tree.remove_attr(tc, "rowSpan")?;
                prs.tree.remove_attr(tc, "gridSpan")?;
                prs.tree.remove_attr(tc, "hMerge")?;
                prs.tree.remove_attr(tc, "vMerge")?;
            }
        }
        Ok(())
    }

    pub fn margin_left(&self, prs: &Presentation) -> Result<Emu> {
        self.margin(prs, "marL", DEFAULT_MARGIN_LR)
    }

    pub fn margin_right(&self, prs: &Presentation) -> Result<Emu> {
        self.margin(prs, "marR", DEFAULT_MARGIN_LR)
    }

    pub fn margin_top(&self, prs: &Presentation) -> Result<Emu> {
        self.margin(prs, "marT", DEFAULT_MARGIN_TB)
    }

    pub fn margin_bottom(&self, prs: &Presentation) -> Result<Emu> {
        self.margin(prs, "marB", DEFAULT_MARGIN_TB)
    }

    pub fn set_margin_left(&self, prs: &mut Presentation, value: Emu) -> Result<()> {
        self.set_margin(prs, "marL", value)
    }

    pub fn set_margin_right(&self, prs: &mut Presentation, value: Emu) -> Result<()> {
        self.set_margin(prs, "marR", value)
    }

    pub fn set_margin_top(&self, prs: &mut Presentation, value: Emu) -> Result<()> {
        self.set_margin(prs, "marT", value)
    }

    pub fn set_margin_bottom(&self, prs: &mut Presentation, value: Emu) -> Result<()> {
        self.set_margin(prs, "marB", value)
    }

    fn margin(&self, prs: &Presentation, name: &str, default: Emu) -> Result<Emu> {
        match prs.tree.find_child(self.tc, "a:tcPr")? {
            Some(tc_pr) => Ok(prs.tree.attr_i64(tc_pr, name)?.map(Emu).unwrap_or(default)),
            None => Ok(default),
        }
    }

    fn set_margin(&self, prs: &mut Presentation, name: &str, value: Emu) -> Result<()> {
        let tc_pr = prs.tree.get_or_add_child(self.tc, "a:tcPr")?;
        prs.tree.set_attr_i64(tc_pr, name, value.0)
    }

    pub fn vertical_anchor(&self, prs: &Presentation) -> Result<Option<VerticalAnchor>> {
        match prs.tree.find_child(self.tc, "a:tcPr")? {
            Some(tc_pr) => Ok(prs
                .tree
                .attr(tc_pr, "anchor")?
                .and_then(VerticalAnchor::from_xml_token)),
            None => Ok(None),
        }
    }

    pub fn set_vertical_anchor(
        &self,
        prs: &mut Presentation,
        anchor: VerticalAnchor,
    ) -> Result<()> {
        let tc_pr = prs.tree.get_or_add_child(self.tc, "a:tcPr")?;
        prs.tree.set_attr(tc_pr, "anchor", anchor.xml_token())
    }

    /// Fill the cell with a solid RGB color given as six hex digits.
    pub fn set_fill_rgb(&self, prs: &mut Presentation, rgb: &str) -> Result<()> {
        if rgb.len() != 6 || !rgb.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidFormat(format!("not an RRGGBB value: {rgb}")));
        }
        let tc_pr = prs.tree.get_or_add_child(self.tc, "a:tcPr")?;
        if let Some(existing) = prs.tree.find_child(tc_pr, "a:solidFill")? {
            prs.tree.remove(existing)?;
        }
        let fill = prs.tree.new_element("a:solidFill");
        prs.tree.append_child(tc_pr, fill)?;
        let clr = prs.tree.new_element("a:srgbClr");
        prs.tree.set_attr(clr, "val", &rgb.to_ascii_uppercase())?;
        prs.tree.append_child(fill, clr)
    }

    pub fn fill_rgb(&self, prs: &Presentation) -> Result<Option<String>> {
        let Some(tc_pr) = prs.tree.find_child(self.tc, "a:tcPr")? else {
            return Ok(None);
        };
        let Some(fill) = prs.tree.find_child(tc_pr, "a:solidFill")? else {
            return Ok(None);
        };
        let Some(clr) = prs.tree.find_child(fill, "a:srgbClr")? else {
            return Ok(None);
        };
        Ok(prs.tree.attr(clr, "val")?.map(str::to_string))
    }

    /// Grid coordinates of this cell within its table.
    fn coords(&self, prs: &Presentation) -> Result<(usize, usize)> {
        let grid = tc_grid(&prs.tree, self.tbl)?;
        for (r, row) in grid.iter().enumerate() {
            if let Some(c) = row.iter().position(|tc| *tc == self.tc) {
                return Ok((r, c));
            }
        }
        Err(Error::DetachedShape)
    }
}

fn tc_nodes(tree: &Tree, tr: NodeId) -> Result<Vec<NodeId>> {
    let mut out = Vec::new();
    for child in tree.children(tr)? {
        if tree.tag(child)? == "a:tc" {
            out.push(child);
        }
    }
    Ok(out)
}

fn tc_grid(tree: &Tree, tbl: NodeId) -> Result<Vec<Vec<NodeId>>> {
    let mut grid = Vec::new();
    for child in tree.children(tbl)? {
        if tree.tag(child)? == "a:tr" {
            grid.push(tc_nodes(tree, child)?);
        }
    }
    Ok(grid)
}

/// The tc at a grid position. Fails instead of panicking when a row is
/// short of the position or a recorded span runs past the grid.
fn grid_cell(grid: &[Vec<NodeId>], row: usize, col: usize) -> Result<NodeId> {
    grid.get(row)
        .and_then(|tcs| tcs.get(col))
        .copied()
        .ok_or_else(|| {
            Error::InvalidFormat(format!("table grid has no cell at ({row}, {col})"))
        })
}

/// Whether a cell already participates in any merge.
fn in_merge(tree: &Tree, tc: NodeId) -> Result<bool> {
    Ok(tree.attr_i64(tc, "gridSpan")?.unwrap_or(1) > 1
        || tree.attr_i64(tc, "rowSpan")?.unwrap_or(1) > 1
        || tree.attr_bool(tc, "hMerge")?
        || tree.attr_bool(tc, "vMerge")?)
}

/// Move a source cell's paragraphs into the origin cell, leaving the
/// source with one empty paragraph. Empty sources are left alone; an
/// empty origin drops its placeholder paragraph before the first move.
fn move_cell_content(tree: &mut Tree, src_tc: NodeId, origin_tc: NodeId) -> Result<()> {
    let Some(src_body) = tree.find_child(src_tc, "a:txBody")? else {
        return Ok(());
    };
    if cell_body_is_empty(tree, src_body)? {
        return Ok(());
    }
    let origin_body = tree.get_or_add_child(origin_tc, "a:txBody")?;
    if cell_body_is_empty(tree, origin_body)? {
        for child in tree.children(origin_body)? {
            if tree.tag(child)? == "a:p" {
                tree.remove(child)?;
            }
        }
    }
    for child in tree.children(src_body)? {
        if tree.tag(child)? == "a:p" {
            tree.detach(child)?;
            tree.append_child(origin_body, child)?;
        }
    }
    let empty_p = tree.new_element("a:p");
    tree.append_child(src_body, empty_p)
}

/// A body with a single paragraph holding no runs or breaks is empty.
fn cell_body_is_empty(tree: &Tree, tx_body: NodeId) -> Result<bool> {
    let mut paragraphs = 0;
    for child in tree.children(tx_body)? {
        if tree.tag(child)? != "a:p" {
            continue;
        }
        paragraphs += 1;
        if paragraphs > 1 {
            return Ok(false);
        }
        for item in tree.children(child)? {
            if matches!(tree.tag(item)?, "a:r" | "a:br" | "a:fld") {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PartId;
    use crate::unit::Emu;

    fn table_fixture(rows: usize, cols: usize) -> (Presentation, Table) {
        let mut prs = Presentation::new();
        let master = prs.add_master().unwrap();
        let layout = prs.add_layout(master).unwrap();
        let slide: PartId = prs.add_slide(layout).unwrap();
        let mut shapes = prs.shapes(slide).unwrap();
        let frame = shapes
            .add_table(
                &mut prs,
                rows,
                cols,
                Emu(0),
                Emu(0),
                Emu(rows as i64 * 914_400),
                Emu(cols as i64 * 370_840),
            )
            .unwrap();
        let table = frame.table(&prs).unwrap();
        (prs, table)
    }

    #[test]
    fn test_grid_dimensions_and_addressing() {
        let (prs, table) = table_fixture(2, 3);
        assert_eq!(table.row_count(&prs).unwrap(), 2);
        assert_eq!(table.col_count(&prs).unwrap(), 3);
        assert!(table.cell(&prs, 1, 2).is_ok());
        assert!(matches!(
            table.cell(&prs, 2, 0),
            Err(Error::IndexOutOfRange { kind: "row", index: 2 })
        ));
        assert!(matches!(
            table.cell(&prs, 0, 3),
            Err(Error::IndexOutOfRange { kind: "column", index: 3 })
        ));
    }

    #[test]
    fn test_two_by_two_merge_and_split() {
        let (mut prs, table) = table_fixture(2, 2);
        let origin = table.cell(&prs, 0, 0).unwrap();
        let far = table.cell(&prs, 1, 1).unwrap();
        origin.merge(&mut prs, &far).unwrap();

        assert!(origin.is_merge_origin(&prs).unwrap());
        assert_eq!(origin.span_width(&prs).unwrap(), 2);
        assert_eq!(origin.span_height(&prs).unwrap(), 2);

        let right = table.cell(&prs, 0, 1).unwrap();
        let below = table.cell(&prs, 1, 0).unwrap();
        assert!(right.is_spanned(&prs).unwrap());
        assert!(!right.is_merge_origin(&prs).unwrap());
        assert_eq!(right.span_height(&prs).unwrap(), 2);
        assert!(below.is_spanned(&prs).unwrap());
        assert_eq!(below.span_width(&prs).unwrap(), 2);
        assert!(far.is_spanned(&prs).unwrap());

        origin.split(&mut prs).unwrap();
        for r in 0..2 {
            for c in 0..2 {
                let cell = table.cell(&prs, r, c).unwrap();
                assert_eq!(cell.span_width(&prs).unwrap(), 1);
                assert_eq!(cell.span_height(&prs).unwrap(), 1);
                assert!(!cell.is_spanned(&prs).unwrap());
                assert!(!cell.is_merge_origin(&prs).unwrap());
            }
        }
    }

    #[test]
    fn test_merge_accepts_either_diagonal_and_order() {
        let (mut prs, table) = table_fixture(3, 3);
        // Bottom-left to top-right, reversed order.
        let bl = table.cell(&prs, 2, 0).unwrap();
        let tr = table.cell(&prs, 0, 2).unwrap();
        tr.merge(&mut prs, &bl).unwrap();

        let origin = table.cell(&prs, 0, 0).unwrap();
        assert!(origin.is_merge_origin(&prs).unwrap());
        assert_eq!(origin.span_width(&prs).unwrap(), 3);
        assert_eq!(origin.span_height(&prs).unwrap(), 3);
    }

    #[test]
    fn test_single_row_merge_spans_one_dimension() {
        let (mut prs, table) = table_fixture(2, 3);
        let a = table.cell(&prs, 0, 0).unwrap();
        let b = table.cell(&prs, 0, 2).unwrap();
        a.merge(&mut prs, &b).unwrap();

        assert!(a.is_merge_origin(&prs).unwrap());
        assert_eq!(a.span_width(&prs).unwrap(), 3);
        assert_eq!(a.span_height(&prs).unwrap(), 1);
        assert!(table.cell(&prs, 0, 1).unwrap().is_spanned(&prs).unwrap());
        // The second row is untouched.
        assert!(!table.cell(&prs, 1, 1).unwrap().is_spanned(&prs).unwrap());
    }

    #[test]
    fn test_cross_table_merge_rejected() {
        let (mut prs, table_a) = table_fixture(2, 2);
        // Second table on the same slide.
        let slide = PartId(2);
        let mut shapes = prs.shapes(slide).unwrap();
        let other_frame = shapes
            .add_table(&mut prs, 2, 2, Emu(0), Emu(0), Emu(100), Emu(100))
            .unwrap();
        let table_b = other_frame.table(&prs).unwrap();

        let a = table_a.cell(&prs, 0, 0).unwrap();
        let b = table_b.cell(&prs, 1, 1).unwrap();
        assert!(matches!(a.merge(&mut prs, &b), Err(Error::CrossTable)));
    }

    #[test]
    fn test_overlapping_merge_rejected() {
        let (mut prs, table) = table_fixture(2, 2);
        let a = table.cell(&prs, 0, 0).unwrap();
        let b = table.cell(&prs, 0, 1).unwrap();
        a.merge(&mut prs, &b).unwrap();

        let c = table.cell(&prs, 1, 1).unwrap();
        assert!(matches!(
            b.merge(&mut prs, &c),
            Err(Error::OverlappingMerge)
        ));
    }

    #[test]
    fn test_split_requires_merge_origin() {
        let (mut prs, table) = table_fixture(2, 2);
        let plain = table.cell(&prs, 1, 1).unwrap();
        assert!(matches!(plain.split(&mut prs), Err(Error::NotMergeOrigin)));

        let a = table.cell(&prs, 0, 0).unwrap();
        let spanned = table.cell(&prs, 0, 1).unwrap();
        a.merge(&mut prs, &spanned).unwrap();
        assert!(matches!(spanned.split(&mut prs), Err(Error::NotMergeOrigin)));
    }

    #[test]
    fn test_merge_over_ragged_grid_rejected() {
        let (mut prs, table) = table_fixture(2, 2);
        // Knock a tc out of the second row so the grid is ragged.
        let missing = table.cell(&prs, 1, 1).unwrap();
        prs.tree.remove(missing.tc).unwrap();

        let a = table.cell(&prs, 0, 1).unwrap();
        let b = table.cell(&prs, 1, 0).unwrap();
        assert!(matches!(
            a.merge(&mut prs, &b),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_split_with_span_past_grid_rejected() {
        let (mut prs, table) = table_fixture(2, 2);
        let cell = table.cell(&prs, 0, 0).unwrap();
        // A span count larger than the grid can come from a loaded part.
        prs.tree.set_attr_i64(cell.tc, "gridSpan", 5).unwrap();
        assert!(cell.is_merge_origin(&prs).unwrap());
        assert!(matches!(cell.split(&mut prs), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_merge_consolidates_content_one_way() {
        let (mut prs, table) = table_fixture(2, 2);
        for (r, c, text) in [(0, 0, "a"), (0, 1, "b"), (1, 0, ""), (1, 1, "d")] {
            table.cell(&prs, r, c).unwrap().set_text(&mut prs, text).unwrap();
        }
        let origin = table.cell(&prs, 0, 0).unwrap();
        let far = table.cell(&prs, 1, 1).unwrap();
        origin.merge(&mut prs, &far).unwrap();

        // Origin keeps its paragraph and gains one per non-empty source.
        assert_eq!(origin.text(&prs).unwrap(), "a\nb\nd");
        assert_eq!(table.cell(&prs, 0, 1).unwrap().text(&prs).unwrap(), "");
        assert_eq!(table.cell(&prs, 1, 1).unwrap().text(&prs).unwrap(), "");

        // Split restores the grid but never the content distribution.
        origin.split(&mut prs).unwrap();
        assert_eq!(origin.text(&prs).unwrap(), "a\nb\nd");
        assert_eq!(table.cell(&prs, 0, 1).unwrap().text(&prs).unwrap(), "");
        assert_eq!(table.cell(&prs, 1, 1).unwrap().text(&prs).unwrap(), "");
    }

    #[test]
    fn test_merge_into_empty_origin_drops_placeholder_paragraph() {
        let (mut prs, table) = table_fixture(1, 2);
        table.cell(&prs, 0, 1).unwrap().set_text(&mut prs, "x").unwrap();
        let origin = table.cell(&prs, 0, 0).unwrap();
        let source = table.cell(&prs, 0, 1).unwrap();
        origin.merge(&mut prs, &source).unwrap();
        assert_eq!(origin.text(&prs).unwrap(), "x");
    }

    #[test]
    fn test_resize_syncs_frame_extent() {
        let mut prs = Presentation::new();
        let master = prs.add_master().unwrap();
        let layout = prs.add_layout(master).unwrap();
        let slide = prs.add_slide(layout).unwrap();
        let mut shapes = prs.shapes(slide).unwrap();
        let frame = shapes
            .add_table(&mut prs, 2, 2, Emu(0), Emu(0), Emu(1_000_000), Emu(800_000))
            .unwrap();
        let table = frame.table(&prs).unwrap();

        table.rows(&prs).unwrap()[0]
            .set_height(&mut prs, Emu(600_000))
            .unwrap();
        assert_eq!(frame.height(&prs).unwrap(), Some(Emu(1_000_000)));

        table.columns(&prs).unwrap()[1]
            .set_width(&mut prs, Emu(700_000))
            .unwrap();
        assert_eq!(frame.width(&prs).unwrap(), Some(Emu(1_200_000)));

        let total: Emu = table
            .rows(&prs)
            .unwrap()
            .iter()
            .map(|r| r.height(&prs).unwrap())
            .sum();
        assert_eq!(frame.height(&prs).unwrap(), Some(total));
    }

    #[test]
    fn test_cell_margins_and_anchor() {
        let (mut prs, table) = table_fixture(1, 1);
        let cell = table.cell(&prs, 0, 0).unwrap();
        assert_eq!(cell.margin_left(&prs).unwrap(), DEFAULT_MARGIN_LR);
        assert_eq!(cell.margin_top(&prs).unwrap(), DEFAULT_MARGIN_TB);

        cell.set_margin_left(&mut prs, Emu(10_000)).unwrap();
        assert_eq!(cell.margin_left(&prs).unwrap(), Emu(10_000));
        assert_eq!(cell.margin_right(&prs).unwrap(), DEFAULT_MARGIN_LR);

        assert_eq!(cell.vertical_anchor(&prs).unwrap(), None);
        cell.set_vertical_anchor(&mut prs, VerticalAnchor::Middle)
            .unwrap();
        assert_eq!(
            cell.vertical_anchor(&prs).unwrap(),
            Some(VerticalAnchor::Middle)
        );
    }

    #[test]
    fn test_cell_fill() {
        let (mut prs, table) = table_fixture(1, 1);
        let cell = table.cell(&prs, 0, 0).unwrap();
        assert_eq!(cell.fill_rgb(&prs).unwrap(), None);
        cell.set_fill_rgb(&mut prs, "4f81bd").unwrap();
        assert_eq!(cell.fill_rgb(&prs).unwrap(), Some("4F81BD".to_string()));
        assert!(cell.set_fill_rgb(&mut prs, "red").is_err());
    }

    #[test]
    fn test_banding_flags() {
        let (mut prs, table) = table_fixture(2, 2);
        // add_table seeds firstRow and bandRow.
        assert!(table.first_row(&prs).unwrap());
        assert!(table.horz_banding(&prs).unwrap());
        assert!(!table.first_col(&prs).unwrap());

        table.set_first_col(&mut prs, true).unwrap();
        table.set_horz_banding(&mut prs, false).unwrap();
        assert!(table.first_col(&prs).unwrap());
        assert!(!table.horz_banding(&prs).unwrap());
    }
}
