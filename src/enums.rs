//! Closed enumerations for the presentation schema.
//!
//! These map one-to-one onto the XML token catalogs of the format. The
//! catalogs are immutable, so lookups go through compile-time `phf` maps
//! or plain `match` tables rather than any runtime cache.

use phf::phf_map;

/// Semantic type of a placeholder, from the `type` attribute of `p:ph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderType {
    Title,
    CenterTitle,
    Subtitle,
    Body,
    Object,
    Chart,
    Table,
    Picture,
    Bitmap,
    OrgChart,
    MediaClip,
    Date,
    Footer,
    Header,
    SlideNumber,
    SlideImage,
}

static PH_TYPE_TOKENS: phf::Map<&'static str, PlaceholderType> = phf_map! {
    "title" => PlaceholderType::Title,
    "ctrTitle" => PlaceholderType::CenterTitle,
    "subTitle" => PlaceholderType::Subtitle,
    "body" => PlaceholderType::Body,
    "obj" => PlaceholderType::Object,
    "chart" => PlaceholderType::Chart,
    "tbl" => PlaceholderType::Table,
    "pic" => PlaceholderType::Picture,
    "clipArt" => PlaceholderType::Bitmap,
    "dgm" => PlaceholderType::OrgChart,
    "media" => PlaceholderType::MediaClip,
    "dt" => PlaceholderType::Date,
    "ftr" => PlaceholderType::Footer,
    "hdr" => PlaceholderType::Header,
    "sldNum" => PlaceholderType::SlideNumber,
    "sldImg" => PlaceholderType::SlideImage,
};

impl PlaceholderType {
    /// Parse the XML token value. An unrecognized or absent token reads
    /// as `Object`, the schema default for `p:ph/@type`.
    pub fn from_xml_token(token: &str) -> PlaceholderType {
        PH_TYPE_TOKENS
            .get(token)
            .copied()
            .unwrap_or(PlaceholderType::Object)
    }

    pub fn xml_token(self) -> &'static str {
        match self {
            PlaceholderType::Title => "title",
            PlaceholderType::CenterTitle => "ctrTitle",
            PlaceholderType::Subtitle => "subTitle",
            PlaceholderType::Body => "body",
            PlaceholderType::Object => "obj",
            PlaceholderType::Chart => "chart",
            PlaceholderType::Table => "tbl",
            PlaceholderType::Picture => "pic",
            PlaceholderType::Bitmap => "clipArt",
            PlaceholderType::OrgChart => "dgm",
            PlaceholderType::MediaClip => "media",
            PlaceholderType::Date => "dt",
            PlaceholderType::Footer => "ftr",
            PlaceholderType::Header => "hdr",
            PlaceholderType::SlideNumber => "sldNum",
            PlaceholderType::SlideImage => "sldImg",
        }
    }
}

/// The kind of slide-type part a shape lives on.
///
/// Selects the placeholder inheritance strategy: slide inherits from its
/// layout by idx, layout from its master by type, notes slide from the
/// notes master by type. Masters are inheritance roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Master,
    Layout,
    Slide,
    NotesMaster,
    NotesSlide,
}

/// Placeholder orientation, from `p:ph/@orient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn from_xml_token(token: &str) -> Orientation {
        if token == "vert" {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        }
    }

    pub fn xml_token(self) -> &'static str {
        match self {
            Orientation::Horizontal => "horz",
            Orientation::Vertical => "vert",
        }
    }
}

/// The kind of graphical object embedded in a `p:graphicFrame`,
/// discriminated by the `a:graphicData/@uri` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphicKind {
    Chart,
    Table,
    SmartArt,
    OleObject,
}

pub const GRAPHIC_URI_CHART: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
pub const GRAPHIC_URI_TABLE: &str = "http://schemas.openxmlformats.org/drawingml/2006/table";
pub const GRAPHIC_URI_SMARTART: &str = "http://schemas.openxmlformats.org/drawingml/2006/diagram";
pub const GRAPHIC_URI_OLE: &str = "http://schemas.openxmlformats.org/presentationml/2006/ole";

impl GraphicKind {
    pub fn from_uri(uri: &str) -> Option<GraphicKind> {
        match uri {
            GRAPHIC_URI_CHART => Some(GraphicKind::Chart),
            GRAPHIC_URI_TABLE => Some(GraphicKind::Table),
            GRAPHIC_URI_SMARTART => Some(GraphicKind::SmartArt),
            GRAPHIC_URI_OLE => Some(GraphicKind::OleObject),
            _ => None,
        }
    }

    pub fn uri(self) -> &'static str {
        match self {
            GraphicKind::Chart => GRAPHIC_URI_CHART,
            GraphicKind::Table => GRAPHIC_URI_TABLE,
            GraphicKind::SmartArt => GRAPHIC_URI_SMARTART,
            GraphicKind::OleObject => GRAPHIC_URI_OLE,
        }
    }
}

/// Vertical alignment of text within a cell or text frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAnchor {
    Top,
    Middle,
    Bottom,
}

impl VerticalAnchor {
    pub fn from_xml_token(token: &str) -> Option<VerticalAnchor> {
        match token {
            "t" => Some(VerticalAnchor::Top),
            "ctr" => Some(VerticalAnchor::Middle),
            "b" => Some(VerticalAnchor::Bottom),
            _ => None,
        }
    }

    pub fn xml_token(self) -> &'static str {
        match self {
            VerticalAnchor::Top => "t",
            VerticalAnchor::Middle => "ctr",
            VerticalAnchor::Bottom => "b",
        }
    }
}

/// Horizontal alignment of a paragraph, from `a:pPr/@algn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphAlignment {
    Left,
    Center,
    Right,
    Justify,
}

impl ParagraphAlignment {
    pub fn from_xml_token(token: &str) -> Option<ParagraphAlignment> {
        match token {
            "l" => Some(ParagraphAlignment::Left),
            "ctr" => Some(ParagraphAlignment::Center),
            "r" => Some(ParagraphAlignment::Right),
            "just" => Some(ParagraphAlignment::Justify),
            _ => None,
        }
    }

    pub fn xml_token(self) -> &'static str {
        match self {
            ParagraphAlignment::Left => "l",
            ParagraphAlignment::Center => "ctr",
            ParagraphAlignment::Right => "r",
            ParagraphAlignment::Justify => "just",
        }
    }
}

/// Connector geometry presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorKind {
    Straight,
    Elbow,
    Curved,
}

impl ConnectorKind {
    pub fn prst(self) -> &'static str {
        match self {
            ConnectorKind::Straight => "line",
            ConnectorKind::Elbow => "bentConnector3",
            ConnectorKind::Curved => "curvedConnector3",
        }
    }
}

/// Auto-shape geometry presets supported by `add_autoshape`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoShapeKind {
    Rectangle,
    RoundedRectangle,
    Oval,
    Diamond,
    IsoscelesTriangle,
    RightArrow,
    Chevron,
}

impl AutoShapeKind {
    pub fn prst(self) -> &'static str {
        match self {
            AutoShapeKind::Rectangle => "rect",
            AutoShapeKind::RoundedRectangle => "roundRect",
            AutoShapeKind::Oval => "ellipse",
            AutoShapeKind::Diamond => "diamond",
            AutoShapeKind::IsoscelesTriangle => "triangle",
            AutoShapeKind::RightArrow => "rightArrow",
            AutoShapeKind::Chevron => "chevron",
        }
    }

    /// Display basename used when deriving a default shape name.
    pub fn basename(self) -> &'static str {
        match self {
            AutoShapeKind::Rectangle => "Rectangle",
            AutoShapeKind::RoundedRectangle => "Rounded Rectangle",
            AutoShapeKind::Oval => "Oval",
            AutoShapeKind::Diamond => "Diamond",
            AutoShapeKind::IsoscelesTriangle => "Isosceles Triangle",
            AutoShapeKind::RightArrow => "Right Arrow",
            AutoShapeKind::Chevron => "Chevron",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ph_type_tokens_round_trip() {
        for (token, ph_type) in PH_TYPE_TOKENS.entries() {
            assert_eq!(ph_type.xml_token(), *token);
            assert_eq!(PlaceholderType::from_xml_token(token), *ph_type);
        }
    }

    #[test]
    fn test_unknown_ph_type_defaults_to_object() {
        assert_eq!(
            PlaceholderType::from_xml_token("nonsense"),
            PlaceholderType::Object
        );
    }

    #[test]
    fn test_graphic_kind_from_uri() {
        assert_eq!(
            GraphicKind::from_uri(GRAPHIC_URI_TABLE),
            Some(GraphicKind::Table)
        );
        assert_eq!(GraphicKind::from_uri("urn:unknown"), None);
    }
}
