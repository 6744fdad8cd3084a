use std::collections::HashMap;
use std::fmt::Write as _;

use crate::error::Warning;
use crate::geometry::bounds::command_bounds;
use crate::geometry::path_commands::{decode_byte_stream, PathCommand};
use crate::geometry::vector_network::VectorNetwork;
use crate::id::Id;
use crate::tree::node::{
    CornerRadius, GeometryRef, Node, NodeType, Paint, StrokeAlign, StrokeCap, StrokeJoin, Transform, WindingRule,
};

use super::options::RenderOptions;
use super::{resolve_children, shadow, svg_writer::SvgWriter, text, Scope};

const VECTOR_NETWORK_TOLERANCE: f32 = 2.0;
const VECTOR_NETWORK_CEILING: usize = 1000;

/// Depth-first pre-order traversal that emits one SVG primitive group per
/// visible node. `active_clip`, when set, is a clip-path id applied by a
/// preceding mask sibling to every node in the current child list until the
/// next mask is reached.
#[allow(clippy::too_many_arguments)]
pub fn render_node(
    node: &Node,
    by_id: &HashMap<Id, Node>,
    scope: &Scope,
    world: Transform,
    depth: u32,
    options: &RenderOptions,
    blobs: &[Vec<u8>],
    images: &HashMap<String, Vec<u8>>,
    writer: &mut SvgWriter,
    warnings: &mut Vec<Warning>,
) {
    render_node_clipped(node, by_id, scope, world, depth, options, blobs, images, writer, warnings, None)
}

#[allow(clippy::too_many_arguments)]
fn render_node_clipped(
    node: &Node,
    by_id: &HashMap<Id, Node>,
    scope: &Scope,
    world: Transform,
    depth: u32,
    options: &RenderOptions,
    blobs: &[Vec<u8>],
    images: &HashMap<String, Vec<u8>>,
    writer: &mut SvgWriter,
    warnings: &mut Vec<Warning>,
    active_clip: Option<u32>,
) {
    if !node.visible || depth > options.max_depth {
        return;
    }

    let node_world = world.compose(&node.transform);

    let mut filter_id = None;
    if options.include_shadows {
        if let Some(filter_body) = build_filter_body(node, warnings) {
            let id = writer.alloc_id();
            writer.add_raw_filter(id, &filter_body);
            filter_id = Some(id);
        }
    }

    let clip_id = if node.clips_content {
        let id = writer.alloc_id();
        writer.add_clip_rect(id, 0.0, 0.0, node.size.0, node.size.1);
        Some(id)
    } else {
        active_clip
    };

    writer.open_group(&node_world, node.opacity, clip_id, filter_id);
    emit_primitive(node, blobs, images, options, writer, warnings);

    let (children, child_scope) = resolve_children(node, by_id, scope);
    let mut sibling_clip = None;
    for child_id in children {
        let Some(child) = child_scope.get(child_id, by_id) else {
            warnings.push(Warning::new(Some(child_id), "child id did not resolve to a node"));
            continue;
        };

        if child.is_mask {
            let id = mask_clip_id(child, blobs, writer);
            sibling_clip = Some(id);
            continue;
        }

        render_node_clipped(
            child, by_id, &child_scope, node_world, depth + 1, options, blobs, images, writer, warnings,
            sibling_clip,
        );
    }

    writer.close_group();
}

fn mask_clip_id(mask: &Node, blobs: &[Vec<u8>], writer: &mut SvgWriter) -> u32 {
    let id = writer.alloc_id();
    let commands = resolve_fill_commands(mask, blobs);
    if let Some(commands) = commands.filter(|c| !c.is_empty()) {
        writer.add_clip_path(id, &commands_to_svg_d(&commands));
    } else {
        writer.add_clip_rect(id, 0.0, 0.0, mask.size.0, mask.size.1);
    }
    id
}

/// Only the first visible drop shadow and the first visible inner shadow on
/// a node are rendered; any further shadow of either kind is reported as a
/// warning instead of being silently stacked into the same filter.
fn build_filter_body(node: &Node, warnings: &mut Vec<Warning>) -> Option<String> {
    let mut body = String::new();
    let mut any = false;
    let mut seen_drop = false;
    let mut seen_inner = false;
    for effect in &node.effects {
        match effect {
            crate::tree::node::Effect::DropShadow { color, offset, radius, spread, visible: true } => {
                if seen_drop {
                    warnings.push(Warning::new(Some(node.id), "only the first drop shadow is rendered, extra drop shadow ignored"));
                    continue;
                }
                seen_drop = true;
                body.push_str(&shadow::drop_shadow_filter(*offset, *radius, *spread, color));
                any = true;
            }
            crate::tree::node::Effect::InnerShadow { color, offset, radius, spread, visible: true } => {
                if seen_inner {
                    warnings.push(Warning::new(Some(node.id), "only the first inner shadow is rendered, extra inner shadow ignored"));
                    continue;
                }
                seen_inner = true;
                body.push_str(&shadow::inner_shadow_filter(*offset, *radius, *spread, color));
                any = true;
            }
            _ => {}
        }
    }
    any.then_some(body)
}

fn emit_primitive(
    node: &Node,
    blobs: &[Vec<u8>],
    images: &HashMap<String, Vec<u8>>,
    options: &RenderOptions,
    writer: &mut SvgWriter,
    warnings: &mut Vec<Warning>,
) {
    match node.node_type {
        NodeType::Rectangle | NodeType::Frame | NodeType::Component | NodeType::ComponentSet | NodeType::Instance => {
            if options.include_fills {
                emit_rect_fill(node, images, options.include_images, writer);
            }
        }
        NodeType::Text => {
            if options.include_text {
                emit_text(node, writer);
            }
        }
        NodeType::Vector | NodeType::BooleanOperation | NodeType::RegularPolygon | NodeType::Star | NodeType::Ellipse => {
            if options.include_fills {
                emit_vector_fill(node, blobs, writer);
            }
            if options.include_strokes {
                emit_vector_stroke(node, blobs, writer, warnings);
            }
        }
        NodeType::Line => {
            if options.include_strokes {
                emit_vector_stroke(node, blobs, writer, warnings);
            }
        }
        _ => {}
    }
}

fn emit_rect_fill(node: &Node, images: &HashMap<String, Vec<u8>>, include_images: bool, writer: &mut SvgWriter) {
    let Some(paint) = node.fill_paints.first() else { return };
    match paint {
        Paint::Solid { color } => {
            let (w, h) = node.size;
            let r = clamp_corner_radius(&node.corner_radius, w, h);
            writer.rect(0.0, 0.0, w, h, r as f64, r as f64, &shadow::color_to_css(color));
        }
        Paint::Image { hash, scale_mode } => {
            if !include_images {
                return;
            }
            if let Some(bytes) = images.get(&hash.to_lowercase()) {
                let href = super::image::data_uri(bytes);
                writer.image(0.0, 0.0, node.size.0, node.size.1, super::image::preserve_aspect_ratio(*scale_mode), &href);
            }
        }
        Paint::Unrenderable { .. } => {}
    }
}

fn clamp_corner_radius(radius: &CornerRadius, w: f64, h: f64) -> f32 {
    let r = match radius {
        CornerRadius::Uniform(r) => *r,
        CornerRadius::PerCorner(corners) => corners.iter().cloned().fold(0.0, f32::max),
    };
    let max = (w.min(h) / 2.0) as f32;
    r.min(max).max(0.0)
}

fn emit_text(node: &Node, writer: &mut SvgWriter) {
    let (anchor, dx) = text::horizontal_anchor(node.text_align_horizontal, node.size.0);
    for span in text::layout_spans(node) {
        if span.content.is_empty() {
            continue;
        }
        let y = span.y_offset as f64 + node.font_size as f64;
        writer.text(dx, y, anchor, &span.content);
    }
}

/// Returns the commands of the first `fill_geometry` entry that decodes to
/// anything, rather than concatenating every entry into one path.
fn resolve_fill_commands(node: &Node, blobs: &[Vec<u8>]) -> Option<Vec<PathCommand>> {
    for geometry in &node.fill_geometry {
        let commands = match geometry {
            GeometryRef::Inline(commands) => commands.clone(),
            GeometryRef::Blob(index) => match blobs.get(*index as usize) {
                Some(bytes) => decode_byte_stream(bytes),
                None => continue,
            },
        };
        if !commands.is_empty() {
            return Some(commands);
        }
    }
    None
}

/// Maps a command sequence's own bounds onto the node's local box: scale
/// each axis by `targetSize / commandBounds`, then translate the bounds'
/// minimum corner to the origin.
fn fit_commands_to_node(commands: &[PathCommand], node: &Node) -> Vec<PathCommand> {
    let Some(bounds) = command_bounds(commands) else { return commands.to_vec() };
    let scale_x = if bounds.width() > 0.0 { node.size.0 / bounds.width() } else { 1.0 };
    let scale_y = if bounds.height() > 0.0 { node.size.1 / bounds.height() } else { 1.0 };
    let local = Transform { m: [scale_x, 0.0, 0.0, scale_y, 0.0, 0.0] }
        .compose(&Transform::translate(-bounds.min_x, -bounds.min_y));
    transform_commands(commands, &local)
}

fn transform_commands(commands: &[PathCommand], t: &Transform) -> Vec<PathCommand> {
    commands
        .iter()
        .map(|command| match *command {
            PathCommand::MoveTo(x, y) => {
                let (x, y) = t.apply((x, y));
                PathCommand::MoveTo(x, y)
            }
            PathCommand::LineTo(x, y) => {
                let (x, y) = t.apply((x, y));
                PathCommand::LineTo(x, y)
            }
            PathCommand::QuadTo(cx, cy, x, y) => {
                let (cx, cy) = t.apply((cx, cy));
                let (x, y) = t.apply((x, y));
                PathCommand::QuadTo(cx, cy, x, y)
            }
            PathCommand::CubicTo(c1x, c1y, c2x, c2y, x, y) => {
                let (c1x, c1y) = t.apply((c1x, c1y));
                let (c2x, c2y) = t.apply((c2x, c2y));
                let (x, y) = t.apply((x, y));
                PathCommand::CubicTo(c1x, c1y, c2x, c2y, x, y)
            }
            PathCommand::Arc(x, y, rx, ry) => {
                let (x, y) = t.apply((x, y));
                PathCommand::Arc(x, y, rx, ry)
            }
            PathCommand::Close => PathCommand::Close,
        })
        .collect()
}

fn emit_vector_fill(node: &Node, blobs: &[Vec<u8>], writer: &mut SvgWriter) {
    let Some(paint) = node.fill_paints.first() else { return };
    let Paint::Solid { color } = paint else { return };
    let Some(commands) = resolve_fill_commands(node, blobs) else { return };
    let placed = fit_commands_to_node(&commands, node);
    let fill_rule = match node.winding_rule {
        WindingRule::EvenOdd => "evenodd",
        WindingRule::NonZero => "nonzero",
    };
    writer.path(&commands_to_svg_d(&placed), &shadow::color_to_css(color), fill_rule);
}

fn emit_vector_stroke(node: &Node, blobs: &[Vec<u8>], writer: &mut SvgWriter, warnings: &mut Vec<Warning>) {
    if node.stroke_weight <= 0.0 {
        return;
    }
    let Some(paint) = node.stroke_paints.first() else { return };
    let Paint::Solid { color } = paint else { return };

    let commands = stroke_commands(node, blobs, warnings);
    let d = commands_to_svg_d(&commands);

    // Centerline reconstruction already approximates the path at the node's
    // nominal size; inside/outside alignment would require offsetting the
    // path by half the stroke weight, which the fallback-to-diagonal path
    // can't support anyway. Render at the stroke weight for all alignments.
    let weight = node.stroke_weight;
    let dasharray = node
        .stroke_dashes
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",");

    writer.stroked_path(&d, &shadow::color_to_css(color), weight, cap_str(node.stroke_cap), join_str(node.stroke_join), &dasharray);
}

fn stroke_commands(node: &Node, blobs: &[Vec<u8>], warnings: &mut Vec<Warning>) -> Vec<PathCommand> {
    if !node.stroke_geometry.is_empty() {
        let mut out = Vec::new();
        for geometry in &node.stroke_geometry {
            match geometry {
                GeometryRef::Inline(commands) => out.extend(commands.iter().cloned()),
                GeometryRef::Blob(index) => {
                    if let Some(bytes) = blobs.get(*index as usize) {
                        out.extend(decode_byte_stream(bytes));
                    }
                }
            }
        }
        if !out.is_empty() {
            return out;
        }
    }

    let normalized = (node.size.0 as f32, node.size.1 as f32);

    if let Some(network) = &node.inline_vector_network {
        if let Some(commands) =
            network.reconstruct_centerline(normalized, VECTOR_NETWORK_TOLERANCE, VECTOR_NETWORK_CEILING)
        {
            return commands;
        }
        warnings.push(Warning::new(Some(node.id), "inline vector network rejected, falling back to a diagonal line"));
        return vec![PathCommand::MoveTo(0.0, 0.0), PathCommand::LineTo(node.size.0, node.size.1)];
    }

    // A node with no vector-network blob at all (the common case for a plain
    // LINE) falls back to the diagonal silently — that's the expected path,
    // not a degraded one. Only a blob that's present but fails to decode or
    // reconstruct warrants a warning.
    if let Some(blob_index) = node.vector_network_blob {
        match blobs.get(blob_index as usize).map(|bytes| VectorNetwork::decode(bytes)) {
            Some(Ok(network)) => {
                if let Some(commands) =
                    network.reconstruct_centerline(normalized, VECTOR_NETWORK_TOLERANCE, VECTOR_NETWORK_CEILING)
                {
                    return commands;
                }
                warnings.push(Warning::new(Some(node.id), "vector network rejected, falling back to a diagonal line"));
            }
            Some(Err(_)) => {
                warnings.push(Warning::new(Some(node.id), "vector network failed to decode, falling back to a diagonal line"));
            }
            None => {
                warnings.push(Warning::new(Some(node.id), "vector network blob index out of range, falling back to a diagonal line"));
            }
        }
    }

    vec![PathCommand::MoveTo(0.0, 0.0), PathCommand::LineTo(node.size.0, node.size.1)]
}

fn cap_str(cap: StrokeCap) -> &'static str {
    match cap {
        StrokeCap::Butt => "butt",
        StrokeCap::Round => "round",
        StrokeCap::Square => "square",
    }
}

fn join_str(join: StrokeJoin) -> &'static str {
    match join {
        StrokeJoin::Miter => "miter",
        StrokeJoin::Round => "round",
        StrokeJoin::Bevel => "bevel",
    }
}

fn commands_to_svg_d(commands: &[PathCommand]) -> String {
    let mut d = String::new();
    for command in commands {
        match *command {
            PathCommand::MoveTo(x, y) => {
                let _ = write!(d, "M{x} {y} ");
            }
            PathCommand::LineTo(x, y) => {
                let _ = write!(d, "L{x} {y} ");
            }
            PathCommand::QuadTo(cx, cy, x, y) => {
                let _ = write!(d, "Q{cx} {cy} {x} {y} ");
            }
            PathCommand::CubicTo(c1x, c1y, c2x, c2y, x, y) => {
                let _ = write!(d, "C{c1x} {c1y} {c2x} {c2y} {x} {y} ");
            }
            PathCommand::Arc(x, y, rx, ry) => {
                let bounds = command_bounds(&[PathCommand::Arc(x, y, rx, ry)]);
                if let Some(b) = bounds {
                    let _ = write!(d, "L{} {} ", b.max_x, b.max_y);
                }
            }
            PathCommand::Close => {
                d.push_str("Z ");
            }
        }
    }
    d.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::Rgba;

    fn bare_node(id: Id, ty: NodeType) -> Node {
        Node {
            id,
            node_type: ty,
            name: String::new(),
            visible: true,
            opacity: 1.0,
            blend_mode: "NORMAL".into(),
            transform: Transform::identity(),
            size: (20.0, 10.0),
            fill_paints: Vec::new(),
            stroke_paints: Vec::new(),
            stroke_weight: 0.0,
            stroke_cap: StrokeCap::Butt,
            stroke_join: StrokeJoin::Miter,
            stroke_align: StrokeAlign::Center,
            stroke_dashes: Vec::new(),
            corner_radius: CornerRadius::default(),
            effects: Vec::new(),
            characters: String::new(),
            font_name: String::new(),
            font_size: 0.0,
            line_height_px: 0.0,
            text_align_horizontal: crate::tree::node::TextAlign::Left,
            baselines: Vec::new(),
            winding_rule: Default::default(),
            fill_geometry: Vec::new(),
            stroke_geometry: Vec::new(),
            vector_network_blob: None,
            inline_vector_network: None,
            text_auto_resize: "NONE".into(),
            is_mask: false,
            clips_content: false,
            symbol_id: None,
            symbol_overrides_raw: Vec::new(),
            component_prop_assignments_raw: Vec::new(),
            override_key: None,
            component_prop_refs: Vec::new(),
            children: Vec::new(),
        }
    }

    #[test]
    fn corner_radius_clamps_to_a_stadium_on_a_short_side() {
        let r = clamp_corner_radius(&CornerRadius::Uniform(100.0), 20.0, 10.0);
        assert_eq!(r, 5.0);
    }

    #[test]
    fn missing_vector_network_falls_back_to_a_diagonal_line_without_warning() {
        let mut node = bare_node(Id::new(1, 1), NodeType::Line);
        node.stroke_weight = 2.0;
        node.stroke_paints = vec![Paint::Solid { color: Rgba { r: 0.0, g: 0.0, b: 0.0, a: 1.0 } }];
        let mut warnings = Vec::new();
        let commands = stroke_commands(&node, &[], &mut warnings);
        assert_eq!(commands, vec![PathCommand::MoveTo(0.0, 0.0), PathCommand::LineTo(20.0, 10.0)]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn out_of_range_vector_network_blob_falls_back_with_a_warning() {
        let mut node = bare_node(Id::new(1, 1), NodeType::Line);
        node.stroke_weight = 2.0;
        node.stroke_paints = vec![Paint::Solid { color: Rgba { r: 0.0, g: 0.0, b: 0.0, a: 1.0 } }];
        node.vector_network_blob = Some(0);
        let mut warnings = Vec::new();
        let commands = stroke_commands(&node, &[], &mut warnings);
        assert_eq!(commands, vec![PathCommand::MoveTo(0.0, 0.0), PathCommand::LineTo(20.0, 10.0)]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn path_d_round_trips_a_simple_triangle() {
        let commands = vec![
            PathCommand::MoveTo(0.0, 0.0),
            PathCommand::LineTo(10.0, 0.0),
            PathCommand::LineTo(5.0, 10.0),
            PathCommand::Close,
        ];
        let d = commands_to_svg_d(&commands);
        assert_eq!(d, "M0 0 L10 0 L5 10 Z");
    }

    #[test]
    fn inline_vector_network_is_preferred_over_the_blob_form() {
        let mut node = bare_node(Id::new(1, 1), NodeType::Line);
        node.stroke_weight = 2.0;
        node.stroke_paints = vec![Paint::Solid { color: Rgba { r: 0.0, g: 0.0, b: 0.0, a: 1.0 } }];
        node.size = (10.0, 0.0);
        node.vector_network_blob = Some(0);
        node.inline_vector_network = Some(crate::geometry::vector_network::VectorNetwork {
            vertices: vec![
                crate::geometry::vector_network::Vertex { style: 0, x: 0.0, y: 0.0 },
                crate::geometry::vector_network::Vertex { style: 0, x: 10.0, y: 0.0 },
            ],
            segments: vec![crate::geometry::vector_network::Segment {
                style: 0,
                start_vertex: 0,
                start_dx: 0.0,
                start_dy: 0.0,
                end_vertex: 1,
                end_dx: 0.0,
                end_dy: 0.0,
            }],
            region_count: 0,
        });

        let mut warnings = Vec::new();
        // An out-of-range blob index would warn if the blob path were taken;
        // the inline network must win before that branch is even reached.
        let commands = stroke_commands(&node, &[], &mut warnings);
        assert_eq!(commands, vec![PathCommand::MoveTo(0.0, 0.0), PathCommand::LineTo(10.0, 0.0)]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn fill_geometry_is_scaled_and_translated_to_the_node_box() {
        let mut node = bare_node(Id::new(1, 1), NodeType::Vector);
        node.size = (20.0, 20.0);
        node.fill_paints = vec![Paint::Solid { color: Rgba { r: 1.0, g: 0.0, b: 0.0, a: 1.0 } }];
        node.fill_geometry = vec![GeometryRef::Inline(vec![
            PathCommand::MoveTo(10.0, 10.0),
            PathCommand::LineTo(20.0, 10.0),
            PathCommand::LineTo(20.0, 20.0),
            PathCommand::Close,
        ])];

        let commands = resolve_fill_commands(&node, &[]).unwrap();
        let placed = fit_commands_to_node(&commands, &node);
        assert_eq!(
            placed,
            vec![
                PathCommand::MoveTo(0.0, 0.0),
                PathCommand::LineTo(20.0, 0.0),
                PathCommand::LineTo(20.0, 20.0),
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn resolve_fill_commands_stops_at_the_first_successful_entry() {
        let mut node = bare_node(Id::new(1, 1), NodeType::Vector);
        node.fill_geometry = vec![
            GeometryRef::Inline(vec![PathCommand::MoveTo(0.0, 0.0), PathCommand::LineTo(1.0, 1.0)]),
            GeometryRef::Inline(vec![PathCommand::MoveTo(9.0, 9.0), PathCommand::LineTo(9.0, 9.0)]),
        ];
        let commands = resolve_fill_commands(&node, &[]).unwrap();
        assert_eq!(commands, vec![PathCommand::MoveTo(0.0, 0.0), PathCommand::LineTo(1.0, 1.0)]);
    }

    #[test]
    fn only_the_first_drop_shadow_renders_and_the_rest_warn() {
        let mut node = bare_node(Id::new(1, 1), NodeType::Rectangle);
        let shadow = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 0.5 };
        node.effects = vec![
            crate::tree::node::Effect::DropShadow { color: shadow, offset: (1.0, 1.0), radius: 2.0, spread: 0.0, visible: true },
            crate::tree::node::Effect::DropShadow { color: shadow, offset: (3.0, 3.0), radius: 4.0, spread: 0.0, visible: true },
        ];
        let mut warnings = Vec::new();
        let body = build_filter_body(&node, &mut warnings).unwrap();
        assert_eq!(body.matches("feDropShadow").count(), 1);
        assert_eq!(warnings.len(), 1);
    }
}
