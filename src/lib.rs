//! Longan - A document object model for PresentationML slide parts
//!
//! This library makes a schema with inheritance, polymorphic element
//! kinds and content-replacement semantics feel like a normal typed
//! object graph, while preserving exact round-trip fidelity with the
//! underlying XML.
//!
//! # Features
//!
//! - **Typed shapes**: Auto shapes, pictures, movies, connectors, groups
//!   and graphic frames, materialized from their XML elements
//! - **Placeholder inheritance**: Effective geometry resolved through
//!   the master/layout/slide chain, and notes master/notes slide
//! - **Content substitution**: Turn an empty chart/picture/table
//!   placeholder into populated content that keeps its slot identity
//! - **Table grid**: Cell merge, span and split with frame-size
//!   synchronization
//! - **Text model**: Paragraph/run tree with a reversible plain-text
//!   encoding, control characters included
//!
//! # Example - Building a slide
//!
//! ```
//! use longan::{Presentation, Emu};
//!
//! # fn main() -> longan::Result<()> {
//! let mut prs = Presentation::new();
//! let master = prs.add_master()?;
//! let layout = prs.add_layout(master)?;
//! let slide = prs.add_slide(layout)?;
//!
//! // Add a textbox and fill it with two paragraphs.
//! let mut shapes = prs.shapes(slide)?;
//! let textbox = shapes.add_textbox(
//!     &mut prs,
//!     Emu::from_inches(1.0),
//!     Emu::from_inches(1.0),
//!     Emu::from_inches(4.0),
//!     Emu::from_inches(1.0),
//! )?;
//! let frame = textbox.text_frame(&mut prs)?;
//! frame.set_text(&mut prs, "Hello\nWorld")?;
//! assert_eq!(frame.text(&prs)?, "Hello\nWorld");
//!
//! // Serialize the slide part back to XML.
//! let xml = prs.part_xml(slide)?;
//! assert!(!xml.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Merging table cells
//!
//! ```
//! use longan::{Presentation, Emu};
//!
//! # fn main() -> longan::Result<()> {
//! let mut prs = Presentation::new();
//! let master = prs.add_master()?;
//! let layout = prs.add_layout(master)?;
//! let slide = prs.add_slide(layout)?;
//!
//! let mut shapes = prs.shapes(slide)?;
//! let frame = shapes.add_table(
//!     &mut prs,
//!     2,
//!     2,
//!     Emu(0),
//!     Emu(0),
//!     Emu(4_000_000),
//!     Emu(800_000),
//! )?;
//! let table = frame.table(&prs)?;
//!
//! let origin = table.cell(&prs, 0, 0)?;
//! let far = table.cell(&prs, 1, 1)?;
//! origin.merge(&mut prs, &far)?;
//! assert!(origin.is_merge_origin(&prs)?);
//! assert_eq!(origin.span_width(&prs)?, 2);
//! # Ok(())
//! # }
//! ```

pub mod enums;
pub mod error;
pub mod introspect;
pub mod package;
pub mod parts;
pub mod shapes;
pub mod table;
pub mod text;
pub mod tree;
pub mod unit;

pub use enums::{
    AutoShapeKind, ConnectorKind, ContainerKind, GraphicKind, Orientation, ParagraphAlignment,
    PlaceholderType, VerticalAnchor,
};
pub use error::{Error, Result};
pub use introspect::{Inspection, Introspect, PropValue};
pub use package::{PartId, Presentation};
pub use parts::{EmbeddedPart, ImageRef, PartStore};
pub use shapes::{PlaceholderFlavor, PlaceholderFormat, Shape, ShapeCollection, ShapeKind};
pub use table::{Cell, Column, Row, Table};
pub use text::{Font, Paragraph, Run, TextFrame};
pub use unit::Emu;
