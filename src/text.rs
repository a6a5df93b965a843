//! Paragraph/run text model with a reversible plain-text projection.
//!
//! The projection contract: paragraph boundaries read and write as
//! `'\n'`, intra-paragraph line breaks as `'\v'`, and control characters
//! the storage format forbids travel as `_xHHHH_` tokens. Frame-level
//! assignment round-trips exactly; paragraph-level assignment folds
//! `'\n'` into line breaks because a paragraph cannot create siblings.

use crate::enums::{ParagraphAlignment, VerticalAnchor};
use crate::error::{Error, Result};
use crate::package::Presentation;
use crate::tree::{NodeId, Tree};
use crate::unit::Emu;
use memchr::memchr_iter;

/// Default text-body insets when `a:bodyPr` carries none.
const DEFAULT_INSET_LR: Emu = Emu(91_440);
const DEFAULT_INSET_TB: Emu = Emu(45_720);

/// Text container of a shape or table cell.
///
/// Always holds at least one paragraph.
#[derive(Debug, Clone, Copy)]
pub struct TextFrame {
    tx_body: NodeId,
}

impl TextFrame {
    /// View over a `p:txBody`/`a:txBody`, adding the mandatory first
    /// paragraph when the body is empty.
    pub(crate) fn over(tree: &mut Tree, tx_body: NodeId) -> Result<TextFrame> {
        if tree.find_child(tx_body, "a:p")?.is_none() {
            let p = tree.new_element("a:p");
            tree.append_child(tx_body, p)?;
        }
        Ok(TextFrame { tx_body })
    }

    /// View over a text body known to already hold its paragraph.
    pub(crate) fn attach(tx_body: NodeId) -> TextFrame {
        TextFrame { tx_body }
    }

    pub fn paragraphs(&self, prs: &Presentation) -> Result<Vec<Paragraph>> {
        let mut out = Vec::new();
        for child in prs.tree.children(self.tx_body)? {
            if prs.tree.tag(child)? == "a:p" {
                out.push(Paragraph { p: child });
            }
        }
        Ok(out)
    }

    /// Plain-text projection: paragraph texts joined with `'\n'`.
    pub fn text(&self, prs: &Presentation) -> Result<String> {
        let mut out = String::new();
        for (i, para) in self.paragraphs(prs)?.into_iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&para.text(prs)?);
        }
        Ok(out)
    }

    /// Replace all content from a plain-text string.
    ///
    /// `'\n'` separates paragraphs, `'\v'` becomes a line break within
    /// one. Reading [`TextFrame::text`] back returns `text` exactly.
    pub fn set_text(&self, prs: &mut Presentation, text: &str) -> Result<()> {
        for para in self.paragraphs(prs)? {
            prs.tree.remove(para.p)?;
        }
        for segment in text.split('\n') {
            let p = prs.tree.new_element("a:p");
            prs.tree.append_child(self.tx_body, p)?;
            fill_paragraph(&mut prs.tree, p, segment)?;
        }
        Ok(())
    }

    /// Append an empty paragraph.
    pub fn add_paragraph(&self, prs: &mut Presentation) -> Result<Paragraph> {
        let p = prs.tree.new_element("a:p");
        prs.tree.append_child(self.tx_body, p)?;
        Ok(Paragraph { p })
    }

    /// Word wrap: `None` means inherit the format default.
    pub fn word_wrap(&self, prs: &Presentation) -> Result<Option<bool>> {
        let Some(body_pr) = prs.tree.find_child(self.tx_body, "a:bodyPr")? else {
            return Ok(None);
        };
        Ok(match prs.tree.attr(body_pr, "wrap")? {
            Some("square") => Some(true),
            Some("none") => Some(false),
            _ => None,
        })
    }

    pub fn set_word_wrap(&self, prs: &mut Presentation, wrap: Option<bool>) -> Result<()> {
        let body_pr = self.get_or_add_body_pr(prs)?;
        match wrap {
            Some(true) => prs.tree.set_attr(body_pr, "wrap", "square"),
            Some(false) => prs.tree.set_attr(body_pr, "wrap", "none"),
            None => prs.tree.remove_attr(body_pr, "wrap"),
        }
    }

    pub fn vertical_anchor(&self, prs: &Presentation) -> Result<Option<VerticalAnchor>> {
        let Some(body_pr) = prs.tree.find_child(self.tx_body, "a:bodyPr")? else {
            return Ok(None);
        };
        Ok(prs
            .tree
            .attr(body_pr, "anchor")?
            .and_then(VerticalAnchor::from_xml_token))
    }

    pub fn set_vertical_anchor(
        &self,
        prs: &mut Presentation,
        anchor: VerticalAnchor,
    ) -> Result<()> {
        let body_pr = self.get_or_add_body_pr(prs)?;
        prs.tree.set_attr(body_pr, "anchor", anchor.xml_token())
    }

    pub fn margin_left(&self, prs: &Presentation) -> Result<Emu> {
        self.margin(prs, "lIns", DEFAULT_INSET_LR)
    }

    pub fn margin_right(&self, prs: &Presentation) -> Result<Emu> {
        self.margin(prs, "rIns", DEFAULT_INSET_LR)
    }

    pub fn margin_top(&self, prs: &Presentation) -> Result<Emu> {
        self.margin(prs, "tIns", DEFAULT_INSET_TB)
    }

    pub fn margin_bottom(&self, prs: &Presentation) -> Result<Emu> {
        self.margin(prs, "bIns", DEFAULT_INSET_TB)
    }

    pub fn set_margin_left(&self, prs: &mut Presentation, value: Emu) -> Result<()> {
        self.set_margin(prs, "lIns", value)
    }

    pub fn set_margin_right(&self, prs: &mut Presentation, value: Emu) -> Result<()> {
        self.set_margin(prs, "rIns", value)
    }

    pub fn set_margin_top(&self, prs: &mut Presentation, value: Emu) -> Result<()> {
        self.set_margin(prs, "tIns", value)
    }

    pub fn set_margin_bottom(&self, prs: &mut Presentation, value: Emu) -> Result<()> {
        self.set_margin(prs, "bIns", value)
    }

    fn margin(&self, prs: &Presentation, name: &str, default: Emu) -> Result<Emu> {
        match prs.tree.find_child(self.tx_body, "a:bodyPr")? {
            Some(body_pr) => Ok(prs.tree.attr_i64(body_pr, name)?.map(Emu).unwrap_or(default)),
            None => Ok(default),
        }
    }

    fn set_margin(&self, prs: &mut Presentation, name: &str, value: Emu) -> Result<()> {
        let body_pr = self.get_or_add_body_pr(prs)?;
        prs.tree.set_attr_i64(body_pr, name, value.0)
    }

    fn get_or_add_body_pr(&self, prs: &mut Presentation) -> Result<NodeId> {
        if let Some(body_pr) = prs.tree.find_child(self.tx_body, "a:bodyPr")? {
            return Ok(body_pr);
        }
        let body_pr = prs.tree.new_element("a:bodyPr");
        // bodyPr is the first element of a text body.
        match prs.tree.children(self.tx_body)?.first() {
            Some(first) => prs.tree.insert_before(*first, body_pr)?,
            None => prs.tree.append_child(self.tx_body, body_pr)?,
        }
        Ok(body_pr)
    }
}

/// One `a:p` paragraph: runs interleaved with line-break items.
#[derive(Debug, Clone, Copy)]
pub struct Paragraph {
    p: NodeId,
}

impl Paragraph {
    pub fn runs(&self, prs: &Presentation) -> Result<Vec<Run>> {
        let mut out = Vec::new();
        for child in prs.tree.children(self.p)? {
            if prs.tree.tag(child)? == "a:r" {
                out.push(Run { r: child });
            }
        }
        Ok(out)
    }

    /// Number of line-break items.
    pub fn line_break_count(&self, prs: &Presentation) -> Result<usize> {
        let mut count = 0;
        for child in prs.tree.children(self.p)? {
            if prs.tree.tag(child)? == "a:br" {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Plain-text projection of this paragraph: run text with `'\v'`
    /// for each line break.
    pub fn text(&self, prs: &Presentation) -> Result<String> {
        let mut out = String::new();
        for child in prs.tree.children(self.p)? {
            match prs.tree.tag(child)? {
                "a:r" => out.push_str(&Run { r: child }.text(prs)?),
                "a:br" => out.push('\x0b'),
                _ => {},
            }
        }
        Ok(out)
    }

    /// Replace this paragraph's content from a string.
    ///
    /// Both `'\n'` and `'\v'` become line breaks here: a paragraph
    /// cannot create sibling paragraphs, so unlike the frame-level
    /// setter this projection is deliberately not reversible.
    pub fn set_text(&self, prs: &mut Presentation, text: &str) -> Result<()> {
        for child in prs.tree.children(self.p)? {
            match prs.tree.tag(child)? {
                "a:r" | "a:br" | "a:fld" | "a:endParaRPr" => prs.tree.remove(child)?,
                _ => {},
            }
        }
        let folded = text.replace('\n', "\x0b");
        fill_paragraph(&mut prs.tree, self.p, &folded)?;
        Ok(())
    }

    /// Append a text run.
    pub fn add_run(&self, prs: &mut Presentation, text: &str) -> Result<Run> {
        let run = add_run_element(&mut prs.tree, self.p, text)?;
        Ok(Run { r: run })
    }

    /// Append a line-break item.
    pub fn add_line_break(&self, prs: &mut Presentation) -> Result<()> {
        let br = prs.tree.new_element("a:br");
        prs.tree.append_child(self.p, br)
    }

    pub fn alignment(&self, prs: &Presentation) -> Result<Option<ParagraphAlignment>> {
        let Some(p_pr) = prs.tree.find_child(self.p, "a:pPr")? else {
            return Ok(None);
        };
        Ok(prs
            .tree
            .attr(p_pr, "algn")?
            .and_then(ParagraphAlignment::from_xml_token))
    }

    pub fn set_alignment(
        &self,
        prs: &mut Presentation,
        alignment: ParagraphAlignment,
    ) -> Result<()> {
        let p_pr = self.get_or_add_p_pr(prs)?;
        prs.tree.set_attr(p_pr, "algn", alignment.xml_token())
    }

    /// Indentation level, 0 through 8.
    pub fn level(&self, prs: &Presentation) -> Result<u32> {
        let Some(p_pr) = prs.tree.find_child(self.p, "a:pPr")? else {
            return Ok(0);
        };
        Ok(prs.tree.attr_u32(p_pr, "lvl")?.unwrap_or(0))
    }

    pub fn set_level(&self, prs: &mut Presentation, level: u32) -> Result<()> {
        if level > 8 {
            return Err(Error::IndexOutOfRange {
                kind: "paragraph level",
                index: level as usize,
            });
        }
        let p_pr = self.get_or_add_p_pr(prs)?;
        if level == 0 {
            prs.tree.remove_attr(p_pr, "lvl")
        } else {
            prs.tree.set_attr_i64(p_pr, "lvl", level as i64)
        }
    }

    fn get_or_add_p_pr(&self, prs: &mut Presentation) -> Result<NodeId> {
        if let Some(p_pr) = prs.tree.find_child(self.p, "a:pPr")? {
            return Ok(p_pr);
        }
        let p_pr = prs.tree.new_element("a:pPr");
        // pPr leads the paragraph's content.
        match prs.tree.children(self.p)?.first() {
            Some(first) => prs.tree.insert_before(*first, p_pr)?,
            None => prs.tree.append_child(self.p, p_pr)?,
        }
        Ok(p_pr)
    }
}

/// One `a:r` text run.
#[derive(Debug, Clone, Copy)]
pub struct Run {
    r: NodeId,
}

impl Run {
    pub fn text(&self, prs: &Presentation) -> Result<String> {
        let Some(t) = prs.tree.find_child(self.r, "a:t")? else {
            return Ok(String::new());
        };
        Ok(decode_ctrl(prs.tree.text(t)?.unwrap_or_default()))
    }

    pub fn set_text(&self, prs: &mut Presentation, text: &str) -> Result<()> {
        let t = prs.tree.get_or_add_child(self.r, "a:t")?;
        prs.tree.set_text(t, &encode_ctrl(text))
    }

    pub fn font(&self) -> Font {
        Font { r: self.r }
    }
}

/// Character formatting of a run, stored on its `a:rPr`.
#[derive(Debug, Clone, Copy)]
pub struct Font {
    r: NodeId,
}

impl Font {
    pub fn bold(&self, prs: &Presentation) -> Result<bool> {
        self.flag(prs, "b")
    }

    pub fn set_bold(&self, prs: &mut Presentation, bold: bool) -> Result<()> {
        let r_pr = self.get_or_add_r_pr(prs)?;
        prs.tree.set_attr_bool(r_pr, "b", bold)
    }

    pub fn italic(&self, prs: &Presentation) -> Result<bool> {
        self.flag(prs, "i")
    }

    pub fn set_italic(&self, prs: &mut Presentation, italic: bool) -> Result<()> {
        let r_pr = self.get_or_add_r_pr(prs)?;
        prs.tree.set_attr_bool(r_pr, "i", italic)
    }

    /// Font size in points, when explicitly set.
    pub fn size_pt(&self, prs: &Presentation) -> Result<Option<f32>> {
        let Some(r_pr) = prs.tree.find_child(self.r, "a:rPr")? else {
            return Ok(None);
        };
        // sz is hundredths of a point.
        Ok(prs.tree.attr_i64(r_pr, "sz")?.map(|sz| sz as f32 / 100.0))
    }

    pub fn set_size_pt(&self, prs: &mut Presentation, points: f32) -> Result<()> {
        let r_pr = self.get_or_add_r_pr(prs)?;
        prs.tree
            .set_attr_i64(r_pr, "sz", (points * 100.0).round() as i64)
    }

    pub fn typeface(&self, prs: &Presentation) -> Result<Option<String>> {
        let Some(r_pr) = prs.tree.find_child(self.r, "a:rPr")? else {
            return Ok(None);
        };
        let Some(latin) = prs.tree.find_child(r_pr, "a:latin")? else {
            return Ok(None);
        };
        Ok(prs.tree.attr(latin, "typeface")?.map(str::to_string))
    }

    pub fn set_typeface(&self, prs: &mut Presentation, typeface: &str) -> Result<()> {
        let r_pr = self.get_or_add_r_pr(prs)?;
        let latin = prs.tree.get_or_add_child(r_pr, "a:latin")?;
        prs.tree.set_attr(latin, "typeface", typeface)
    }

    fn flag(&self, prs: &Presentation, name: &str) -> Result<bool> {
        match prs.tree.find_child(self.r, "a:rPr")? {
            Some(r_pr) => prs.tree.attr_bool(r_pr, name),
            None => Ok(false),
        }
    }

    fn get_or_add_r_pr(&self, prs: &mut Presentation) -> Result<NodeId> {
        if let Some(r_pr) = prs.tree.find_child(self.r, "a:rPr")? {
            return Ok(r_pr);
        }
        let r_pr = prs.tree.new_element("a:rPr");
        // rPr precedes the run's a:t.
        match prs.tree.children(self.r)?.first() {
            Some(first) => prs.tree.insert_before(*first, r_pr)?,
            None => prs.tree.append_child(self.r, r_pr)?,
        }
        Ok(r_pr)
    }
}

/// Fill `p` with runs and `a:br` items from a single-paragraph string
/// (`'\v'` marks the breaks).
fn fill_paragraph(tree: &mut Tree, p: NodeId, segment: &str) -> Result<()> {
    for (i, piece) in segment.split('\x0b').enumerate() {
        if i > 0 {
            let br = tree.new_element("a:br");
            tree.append_child(p, br)?;
        }
        if !piece.is_empty() {
            add_run_element(tree, p, piece)?;
        }
    }
    Ok(())
}

fn add_run_element(tree: &mut Tree, p: NodeId, text: &str) -> Result<NodeId> {
    let r = tree.new_element("a:r");
    tree.append_child(p, r)?;
    let t = tree.new_element("a:t");
    tree.set_text(t, &encode_ctrl(text))?;
    tree.append_child(r, t)?;
    Ok(r)
}

/// Encode control characters (other than tab) as `_xHHHH_` tokens, and
/// escape the leading underscore of any literal `_xHHHH_` pattern as
/// `_x005F_` so the encoding stays reversible for every input.
pub(crate) fn encode_ctrl(text: &str) -> String {
    let bytes = text.as_bytes();
    let needs_escape = text
        .chars()
        .any(|c| c.is_control() && c != '\t')
        || memchr_iter(b'_', bytes).any(|i| is_escape_token(bytes, i));
    if !needs_escape {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 8);
    for (i, c) in text.char_indices() {
        if c.is_control() && c != '\t' {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else if c == '_' && is_escape_token(bytes, i) {
            out.push_str("_x005F_");
        } else {
            out.push(c);
        }
    }
    out
}

/// Decode `_xHHHH_` tokens back to their characters.
pub(crate) fn decode_ctrl(text: &str) -> String {
    let bytes = text.as_bytes();
    if !memchr_iter(b'_', bytes).any(|i| is_escape_token(bytes, i)) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'_' && is_escape_token(bytes, i) {
            let hex = std::str::from_utf8(&bytes[i + 2..i + 6]).unwrap_or("");
            if let Ok(code) = u32::from_str_radix(hex, 16)
                && let Some(c) = char::from_u32(code)
            {
                out.push(c);
                i += 7;
                continue;
            }
        }
        let c = text[i..].chars().next().unwrap_or('\u{FFFD}');
        out.push(c);
        i += c.len_utf8();
    }
    out
}

/// Whether position `i` starts a `_xHHHH_` token.
fn is_escape_token(bytes: &[u8], i: usize) -> bool {
    i + 7 <= bytes.len()
        && bytes[i] == b'_'
        && bytes[i + 1] == b'x'
        && bytes[i + 2..i + 6].iter().all(u8::is_ascii_hexdigit)
        && bytes[i + 6] == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PartId;
    use crate::unit::Emu;
    use proptest::prelude::*;

    fn frame_fixture() -> (Presentation, TextFrame) {
        let mut prs = Presentation::new();
        let master = prs.add_master().unwrap();
        let layout = prs.add_layout(master).unwrap();
        let slide: PartId = prs.add_slide(layout).unwrap();
        let mut shapes = prs.shapes(slide).unwrap();
        let tb = shapes
            .add_textbox(&mut prs, Emu(0), Emu(0), Emu(914_400), Emu(914_400))
            .unwrap();
        let frame = tb.text_frame(&mut prs).unwrap();
        (prs, frame)
    }

    #[test]
    fn test_frame_starts_with_one_paragraph() {
        let (prs, frame) = frame_fixture();
        assert_eq!(frame.paragraphs(&prs).unwrap().len(), 1);
        assert_eq!(frame.text(&prs).unwrap(), "");
    }

    #[test]
    fn test_set_text_structure() {
        let (mut prs, frame) = frame_fixture();
        frame.set_text(&mut prs, "A\nB\x0bC").unwrap();

        let paras = frame.paragraphs(&prs).unwrap();
        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0].runs(&prs).unwrap().len(), 1);
        let second_runs = paras[1].runs(&prs).unwrap();
        assert_eq!(second_runs.len(), 2);
        assert_eq!(second_runs[0].text(&prs).unwrap(), "B");
        assert_eq!(second_runs[1].text(&prs).unwrap(), "C");
        assert_eq!(paras[1].line_break_count(&prs).unwrap(), 1);

        assert_eq!(frame.text(&prs).unwrap(), "A\nB\x0bC");
    }

    #[test]
    fn test_paragraph_setter_folds_newlines() {
        let (mut prs, frame) = frame_fixture();
        frame.set_text(&mut prs, "seed").unwrap();
        let para = frame.paragraphs(&prs).unwrap()[0];

        para.set_text(&mut prs, "A\nB\x0bC").unwrap();
        // A paragraph cannot split itself; both separators became breaks.
        assert_eq!(para.text(&prs).unwrap(), "A\x0bB\x0bC");
        assert_eq!(frame.paragraphs(&prs).unwrap().len(), 1);
    }

    #[test]
    fn test_control_chars_round_trip_through_frame() {
        let (mut prs, frame) = frame_fixture();
        let s = "bell\x07 esc\x1b tab\t done";
        frame.set_text(&mut prs, s).unwrap();
        assert_eq!(frame.text(&prs).unwrap(), s);
    }

    #[test]
    fn test_literal_escape_token_round_trips() {
        let (mut prs, frame) = frame_fixture();
        let s = "literal _x001B_ token and real \x1b";
        frame.set_text(&mut prs, s).unwrap();
        assert_eq!(frame.text(&prs).unwrap(), s);
    }

    #[test]
    fn test_encode_decode_units() {
        assert_eq!(encode_ctrl("plain"), "plain");
        assert_eq!(encode_ctrl("\x1b"), "_x001B_");
        assert_eq!(encode_ctrl("_x0041_"), "_x005F_x0041_");
        assert_eq!(decode_ctrl("_x001B_"), "\x1b");
        assert_eq!(decode_ctrl("_x005F_x0041_"), "_x0041_");
        assert_eq!(decode_ctrl("_xZZZZ_ stays"), "_xZZZZ_ stays");
        assert_eq!(decode_ctrl(&encode_ctrl("tab\tok")), "tab\tok");
    }

    #[test]
    fn test_font_properties() {
        let (mut prs, frame) = frame_fixture();
        frame.set_text(&mut prs, "styled").unwrap();
        let run = frame.paragraphs(&prs).unwrap()[0].runs(&prs).unwrap()[0];
        let font = run.font();

        assert!(!font.bold(&prs).unwrap());
        font.set_bold(&mut prs, true).unwrap();
        font.set_size_pt(&mut prs, 18.0).unwrap();
        font.set_typeface(&mut prs, "Calibri").unwrap();
        assert!(font.bold(&prs).unwrap());
        assert_eq!(font.size_pt(&prs).unwrap(), Some(18.0));
        assert_eq!(font.typeface(&prs).unwrap(), Some("Calibri".to_string()));
        // Run text is unaffected by the rPr insertion.
        assert_eq!(run.text(&prs).unwrap(), "styled");
    }

    #[test]
    fn test_paragraph_formatting() {
        let (mut prs, frame) = frame_fixture();
        let para = frame.paragraphs(&prs).unwrap()[0];
        assert_eq!(para.alignment(&prs).unwrap(), None);
        para.set_alignment(&mut prs, ParagraphAlignment::Center)
            .unwrap();
        assert_eq!(
            para.alignment(&prs).unwrap(),
            Some(ParagraphAlignment::Center)
        );
        para.set_level(&mut prs, 2).unwrap();
        assert_eq!(para.level(&prs).unwrap(), 2);
        assert!(para.set_level(&mut prs, 9).is_err());
    }

    #[test]
    fn test_body_margins_default_and_set() {
        let (mut prs, frame) = frame_fixture();
        assert_eq!(frame.margin_left(&prs).unwrap(), DEFAULT_INSET_LR);
        assert_eq!(frame.margin_top(&prs).unwrap(), DEFAULT_INSET_TB);

        frame.set_margin_left(&mut prs, Emu(12_700)).unwrap();
        assert_eq!(frame.margin_left(&prs).unwrap(), Emu(12_700));
        assert_eq!(frame.margin_right(&prs).unwrap(), DEFAULT_INSET_LR);
    }

    proptest! {
        #[test]
        fn prop_frame_text_round_trips(
            s in "[a-zA-Z0-9 _x\\t\\n\\x0B\\x01\\x07\\x1B]{0,48}"
        ) {
            let (mut prs, frame) = frame_fixture();
            frame.set_text(&mut prs, &s).unwrap();
            prop_assert_eq!(frame.text(&prs).unwrap(), s);
        }
    }
}
