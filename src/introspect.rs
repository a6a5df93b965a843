//! Read-only structural enumeration for diagnostic tooling.
//!
//! External tools (dump serializers, inspectors) walk the returned
//! [`Inspection`] values; no serialization format is committed to here.

use crate::error::Result;
use crate::package::Presentation;
use crate::shapes::Shape;
use crate::table::{Cell, Table};
use crate::text::{Paragraph, Run, TextFrame};
use crate::unit::Emu;

/// A single introspected property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    Str(String),
    Length(Emu),
}

/// One node of the structural enumeration.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub kind: &'static str,
    pub props: Vec<(&'static str, PropValue)>,
    pub children: Vec<Inspection>,
}

impl Inspection {
    fn new(kind: &'static str) -> Self {
        Inspection {
            kind,
            props: Vec::new(),
            children: Vec::new(),
        }
    }

    fn prop(&mut self, name: &'static str, value: PropValue) {
        self.props.push((name, value));
    }

    /// The first property with the given name, if present.
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.props
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }
}

/// Structural enumeration of attributes and children.
pub trait Introspect {
    fn inspect(&self, prs: &Presentation) -> Result<Inspection>;
}

impl Introspect for Shape {
    fn inspect(&self, prs: &Presentation) -> Result<Inspection> {
        let mut node = Inspection::new("shape");
        node.prop("id", PropValue::Int(self.shape_id(prs)? as i64));
        node.prop("name", PropValue::Str(self.name(prs)?));
        node.prop("kind", PropValue::Str(format!("{:?}", self.kind())));
        node.prop("is_placeholder", PropValue::Bool(self.is_placeholder()));
        node.prop("hidden", PropValue::Bool(self.hidden(prs)?));
        node.prop("rotation", PropValue::Float(self.rotation(prs)?));
        if let Some(left) = self.left(prs)? {
            node.prop("left", PropValue::Length(left));
        }
        if let Some(top) = self.top(prs)? {
            node.prop("top", PropValue::Length(top));
        }
        if let Some(width) = self.width(prs)? {
            node.prop("width", PropValue::Length(width));
        }
        if let Some(height) = self.height(prs)? {
            node.prop("height", PropValue::Length(height));
        }
        if self.is_placeholder() {
            let format = self.placeholder_format(prs)?;
            node.prop("ph_idx", PropValue::Int(format.idx as i64));
            node.prop(
                "ph_type",
                PropValue::Str(format.ph_type.xml_token().to_string()),
            );
        }
        if self.has_table() {
            node.children.push(self.table(prs)?.inspect(prs)?);
        }
        if self.has_text_frame(prs)?
            && let Some(tx_body) = prs.tree.find_child(self.node(), "p:txBody")?
        {
            node.children.push(TextFrame::attach(tx_body).inspect(prs)?);
        }
        Ok(node)
    }
}

impl Introspect for Table {
    fn inspect(&self, prs: &Presentation) -> Result<Inspection> {
        let mut node = Inspection::new("table");
        let rows = self.row_count(prs)?;
        let cols = self.col_count(prs)?;
        node.prop("rows", PropValue::Int(rows as i64));
        node.prop("cols", PropValue::Int(cols as i64));
        node.prop("first_row", PropValue::Bool(self.first_row(prs)?));
        node.prop("horz_banding", PropValue::Bool(self.horz_banding(prs)?));
        for r in 0..rows {
            for c in 0..cols {
                node.children.push(self.cell(prs, r, c)?.inspect(prs)?);
            }
        }
        Ok(node)
    }
}

impl Introspect for Cell {
    fn inspect(&self, prs: &Presentation) -> Result<Inspection> {
        let mut node = Inspection::new("cell");
        node.prop("text", PropValue::Str(self.text(prs)?));
        node.prop("is_merge_origin", PropValue::Bool(self.is_merge_origin(prs)?));
        node.prop("is_spanned", PropValue::Bool(self.is_spanned(prs)?));
        node.prop("span_width", PropValue::Int(self.span_width(prs)? as i64));
        node.prop("span_height", PropValue::Int(self.span_height(prs)? as i64));
        Ok(node)
    }
}

impl Introspect for TextFrame {
    fn inspect(&self, prs: &Presentation) -> Result<Inspection> {
        let mut node = Inspection::new("text_frame");
        node.prop("text", PropValue::Str(self.text(prs)?));
        for para in self.paragraphs(prs)? {
            node.children.push(para.inspect(prs)?);
        }
        Ok(node)
    }
}

impl Introspect for Paragraph {
    fn inspect(&self, prs: &Presentation) -> Result<Inspection> {
        let mut node = Inspection::new("paragraph");
        node.prop("level", PropValue::Int(self.level(prs)? as i64));
        if let Some(alignment) = self.alignment(prs)? {
            node.prop(
                "alignment",
                PropValue::Str(alignment.xml_token().to_string()),
            );
        }
        node.prop(
            "line_breaks",
            PropValue::Int(self.line_break_count(prs)? as i64),
        );
        for run in self.runs(prs)? {
            node.children.push(run.inspect(prs)?);
        }
        Ok(node)
    }
}

impl Introspect for Run {
    fn inspect(&self, prs: &Presentation) -> Result<Inspection> {
        let mut node = Inspection::new("run");
        node.prop("text", PropValue::Str(self.text(prs)?));
        let font = self.font();
        node.prop("bold", PropValue::Bool(font.bold(prs)?));
        node.prop("italic", PropValue::Bool(font.italic(prs)?));
        if let Some(size) = font.size_pt(prs)? {
            node.prop("size_pt", PropValue::Float(size));
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::Emu;

    #[test]
    fn test_shape_inspection_covers_identity_and_text() {
        let mut prs = Presentation::new();
        let master = prs.add_master().unwrap();
        let layout = prs.add_layout(master).unwrap();
        let slide = prs.add_slide(layout).unwrap();
        let mut shapes = prs.shapes(slide).unwrap();
        let tb = shapes
            .add_textbox(&mut prs, Emu(0), Emu(0), Emu(914_400), Emu(457_200))
            .unwrap();
        tb.text_frame(&mut prs).unwrap().set_text(&mut prs, "hi").unwrap();

        let inspection = tb.inspect(&prs).unwrap();
        assert_eq!(inspection.kind, "shape");
        assert_eq!(inspection.get("name"), Some(&PropValue::Str("TextBox 1".to_string())));
        assert_eq!(inspection.get("width"), Some(&PropValue::Length(Emu(914_400))));

        let frame = &inspection.children[0];
        assert_eq!(frame.kind, "text_frame");
        assert_eq!(frame.get("text"), Some(&PropValue::Str("hi".to_string())));
        assert_eq!(frame.children[0].kind, "paragraph");
        assert_eq!(frame.children[0].children[0].kind, "run");
    }

    #[test]
    fn test_table_inspection_enumerates_cells() {
        let mut prs = Presentation::new();
        let master = prs.add_master().unwrap();
        let layout = prs.add_layout(master).unwrap();
        let slide = prs.add_slide(layout).unwrap();
        let mut shapes = prs.shapes(slide).unwrap();
        let frame = shapes
            .add_table(&mut prs, 2, 2, Emu(0), Emu(0), Emu(100), Emu(100))
            .unwrap();

        let inspection = frame.inspect(&prs).unwrap();
        let table = &inspection.children[0];
        assert_eq!(table.kind, "table");
        assert_eq!(table.get("rows"), Some(&PropValue::Int(2)));
        assert_eq!(table.children.len(), 4);
        assert_eq!(
            table.children[0].get("is_merge_origin"),
            Some(&PropValue::Bool(false))
        );
    }
}
