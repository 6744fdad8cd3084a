use crate::geometry::path_commands::PathCommand;
use crate::geometry::vector_network::VectorNetwork;
use crate::id::Id;
use crate::schema::value::Value;

/// The closed set of recognized node type tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Canvas,
    Frame,
    Group,
    Component,
    ComponentSet,
    Instance,
    Vector,
    Line,
    Ellipse,
    Rectangle,
    RegularPolygon,
    Star,
    BooleanOperation,
    Text,
    Slice,
    /// A recognized-but-uncommon tag the source tool may emit; carried
    /// through rather than rejected.
    Other(String),
}

impl NodeType {
    pub fn from_tag(s: &str) -> Self {
        match s {
            "DOCUMENT" => NodeType::Document,
            "CANVAS" => NodeType::Canvas,
            "FRAME" => NodeType::Frame,
            "GROUP" => NodeType::Group,
            "COMPONENT" => NodeType::Component,
            "COMPONENT_SET" => NodeType::ComponentSet,
            "INSTANCE" => NodeType::Instance,
            "VECTOR" => NodeType::Vector,
            "LINE" => NodeType::Line,
            "ELLIPSE" => NodeType::Ellipse,
            "RECTANGLE" => NodeType::Rectangle,
            "REGULAR_POLYGON" => NodeType::RegularPolygon,
            "STAR" => NodeType::Star,
            "BOOLEAN_OPERATION" => NodeType::BooleanOperation,
            "TEXT" => NodeType::Text,
            "SLICE" => NodeType::Slice,
            other => NodeType::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageScaleMode {
    Fill,
    Fit,
    Tile,
    Stretch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid { color: Rgba },
    Image { hash: String, scale_mode: ImageScaleMode },
    /// Recognized but unsupported: gradients, video fills, emoji.
    Unrenderable { kind: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeCap {
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeJoin {
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeAlign {
    Center,
    Inside,
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CornerRadius {
    Uniform(f32),
    PerCorner([f32; 4]),
}

impl Default for CornerRadius {
    fn default() -> Self {
        CornerRadius::Uniform(0.0)
    }
}

/// A filled path's winding rule. Defaults to `NonZero` when the source
/// doesn't declare one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindingRule {
    NonZero,
    EvenOdd,
}

impl Default for WindingRule {
    fn default() -> Self {
        WindingRule::NonZero
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    DropShadow { color: Rgba, offset: (f32, f32), radius: f32, spread: f32, visible: bool },
    InnerShadow { color: Rgba, offset: (f32, f32), radius: f32, spread: f32, visible: bool },
    LayerBlur { radius: f32 },
    BackgroundBlur { radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBaseline {
    pub first_character: u32,
    pub end_character: u32,
    pub line_height: f32,
}

/// A 2x3 affine transform `[a b c d tx ty]`, applied as
/// `x' = a*x + c*y + tx`, `y' = b*x + d*y + ty`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub m: [f64; 6],
}

impl Transform {
    pub fn identity() -> Self {
        Self { m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0] }
    }

    pub fn translate(x: f64, y: f64) -> Self {
        Self { m: [1.0, 0.0, 0.0, 1.0, x, y] }
    }

    /// `self` applied after `other`: `self.compose(other)(p) == self(other(p))`.
    pub fn compose(&self, other: &Transform) -> Transform {
        let [a1, b1, c1, d1, tx1, ty1] = self.m;
        let [a2, b2, c2, d2, tx2, ty2] = other.m;
        Transform {
            m: [
                a1 * a2 + c1 * b2,
                b1 * a2 + d1 * b2,
                a1 * c2 + c1 * d2,
                b1 * c2 + d1 * d2,
                a1 * tx2 + c1 * ty2 + tx1,
                b1 * tx2 + d1 * ty2 + ty1,
            ],
        }
    }

    pub fn apply(&self, point: (f64, f64)) -> (f64, f64) {
        let [a, b, c, d, tx, ty] = self.m;
        (a * point.0 + c * point.1 + tx, b * point.0 + d * point.1 + ty)
    }
}

/// A reference to path geometry: either an index into the document's blob
/// array, or an inline command sequence decoded directly from the node's
/// own record.
#[derive(Debug, Clone)]
pub enum GeometryRef {
    Blob(u32),
    Inline(Vec<PathCommand>),
}

/// A single override entry from an instance's `symbolOverrides`, keyed by a
/// guid path rather than a node id. Field values are kept as raw decoded
/// values; [`crate::tree::override_resolver`] interprets the ones it knows.
#[derive(Debug, Clone)]
pub struct OverrideEntry {
    pub guid_path: String,
    pub fields: Vec<(String, Value)>,
}

#[derive(Debug, Clone)]
pub struct PropAssignment {
    pub def_id: String,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub struct PropRef {
    pub def_id: String,
    pub node_field: String,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: Id,
    pub node_type: NodeType,
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    pub blend_mode: String,
    pub transform: Transform,
    pub size: (f64, f64),
    pub fill_paints: Vec<Paint>,
    pub stroke_paints: Vec<Paint>,
    pub stroke_weight: f32,
    pub stroke_cap: StrokeCap,
    pub stroke_join: StrokeJoin,
    pub stroke_align: StrokeAlign,
    pub stroke_dashes: Vec<f32>,
    pub corner_radius: CornerRadius,
    pub effects: Vec<Effect>,

    pub characters: String,
    pub font_name: String,
    pub font_size: f32,
    pub line_height_px: f32,
    pub text_align_horizontal: TextAlign,
    pub baselines: Vec<TextBaseline>,

    pub winding_rule: WindingRule,
    pub fill_geometry: Vec<GeometryRef>,
    pub stroke_geometry: Vec<GeometryRef>,
    pub vector_network_blob: Option<u32>,
    /// A structured vector network carried directly on the node rather than
    /// by blob index; takes precedence over `vector_network_blob` when set.
    pub inline_vector_network: Option<VectorNetwork>,

    pub text_auto_resize: String,

    pub is_mask: bool,
    pub clips_content: bool,

    pub symbol_id: Option<Id>,
    pub symbol_overrides_raw: Vec<OverrideEntry>,
    pub component_prop_assignments_raw: Vec<PropAssignment>,
    pub override_key: Option<String>,
    pub component_prop_refs: Vec<PropRef>,

    pub children: Vec<Id>,
}

impl Node {
    pub fn is_container(&self) -> bool {
        matches!(
            self.node_type,
            NodeType::Document
                | NodeType::Canvas
                | NodeType::Frame
                | NodeType::Group
                | NodeType::Component
                | NodeType::ComponentSet
                | NodeType::Instance
        )
    }
}
