//! Node-to-shape dispatch.

use crate::enums::{ContainerKind, GraphicKind, PlaceholderType};
use crate::error::Result;
use crate::package::{PartId, Presentation};
use crate::shapes::base::{self, PlaceholderFlavor, Shape, ShapeKind};
use crate::tree::{NodeId, Tree};

/// Materialize the correctly-typed [`Shape`] over `node`.
///
/// Pure mapping from node plus container context to a typed value; no
/// side effects on the tree. Placeholder-marked nodes dispatch by the
/// container kind (slide containers further by declared type and by the
/// carrying element for populated slots); unmarked nodes by tag. An
/// unrecognized element becomes a minimal base shape whose type-specific
/// operations fail with `UnsupportedShapeOperation`.
pub fn make_shape(prs: &Presentation, part: PartId, node: NodeId) -> Result<Shape> {
    let container = prs.container_kind(part)?;
    let tree = &prs.tree;
    let tag = tree.tag(node)?;

    if let Some(ph) = base::ph_element(tree, node)? {
        let flavor = placeholder_flavor(tree, node, ph, container, tag)?;
        return Ok(Shape::new(node, part, ShapeKind::Placeholder(flavor)));
    }

    let kind = match tag {
        "p:pic" if has_video(tree, node)? => ShapeKind::Movie,
        "p:pic" => ShapeKind::Picture,
        "p:cxnSp" => ShapeKind::Connector,
        "p:grpSp" => ShapeKind::Group,
        "p:sp" => ShapeKind::AutoShape,
        "p:graphicFrame" => match graphic_kind(tree, node)? {
            Some(kind) => ShapeKind::GraphicFrame(kind),
            None => ShapeKind::Base,
        },
        _ => ShapeKind::Base,
    };
    Ok(Shape::new(node, part, kind))
}

fn placeholder_flavor(
    tree: &Tree,
    node: NodeId,
    ph: NodeId,
    container: ContainerKind,
    tag: &str,
) -> Result<PlaceholderFlavor> {
    Ok(match container {
        ContainerKind::Master | ContainerKind::NotesMaster => PlaceholderFlavor::Master,
        ContainerKind::Layout => PlaceholderFlavor::Layout,
        ContainerKind::NotesSlide => PlaceholderFlavor::NotesSlide,
        ContainerKind::Slide => {
            // A placeholder slot already taken over by real content.
            if tag == "p:graphicFrame" {
                let kind = graphic_kind(tree, node)?.unwrap_or(GraphicKind::Table);
                return Ok(PlaceholderFlavor::PopulatedFrame(kind));
            }
            if tag == "p:pic" {
                return Ok(PlaceholderFlavor::PopulatedPicture);
            }
            let format = base::read_ph_format(tree, ph)?;
            match format.ph_type {
                PlaceholderType::Chart => PlaceholderFlavor::Chart,
                PlaceholderType::Picture | PlaceholderType::Bitmap => PlaceholderFlavor::Picture,
                PlaceholderType::Table => PlaceholderFlavor::Table,
                _ => PlaceholderFlavor::Slide,
            }
        },
    })
}

fn graphic_kind(tree: &Tree, frame: NodeId) -> Result<Option<GraphicKind>> {
    let Some(graphic) = tree.find_child(frame, "a:graphic")? else {
        return Ok(None);
    };
    let Some(data) = tree.find_child(graphic, "a:graphicData")? else {
        return Ok(None);
    };
    Ok(tree.attr(data, "uri")?.and_then(GraphicKind::from_uri))
}

/// An image shape with an embedded video reference is a movie.
fn has_video(tree: &Tree, pic: NodeId) -> Result<bool> {
    let Some(nv) = tree.find_child(pic, "p:nvPicPr")? else {
        return Ok(false);
    };
    let Some(nv_pr) = tree.find_child(nv, "p:nvPr")? else {
        return Ok(false);
    };
    Ok(tree.find_child(nv_pr, "a:videoFile")?.is_some())
}
