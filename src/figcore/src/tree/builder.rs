use std::collections::HashMap;

use crate::error::FigError;
use crate::geometry::path_commands;
use crate::geometry::vector_network::VectorNetwork;
use crate::id::Id;
use crate::schema::value::Value;

use super::node::{
    CornerRadius, Effect, GeometryRef, ImageScaleMode, Node, NodeType, OverrideEntry, Paint,
    PropAssignment, PropRef, Rgba, StrokeAlign, StrokeCap, StrokeJoin, TextAlign, TextBaseline,
    Transform, WindingRule,
};

pub struct BuiltTree {
    pub root: Id,
    pub by_id: HashMap<Id, Node>,
    pub by_id_to_path: HashMap<Id, String>,
    pub pages: Vec<Id>,
}

/// Reconstructs the parent-linked tree from the flat, ordered sequence of
/// node change records in the document's root value.
pub fn build(root_value: &Value) -> Result<BuiltTree, FigError> {
    let records = root_value.field_seq("nodeChanges");

    let mut by_id: HashMap<Id, Node> = HashMap::with_capacity(records.len());
    let mut parent_of: HashMap<Id, (Option<Id>, String)> = HashMap::with_capacity(records.len());

    for record in records {
        let node = node_from_value(record)?;
        let parent_index = record.get_field("parentIndex");
        let parent_id = parent_index.and_then(|p| p.get_field("guid")).and_then(guid_to_id);
        let position = parent_index.and_then(|p| p.field_str("position")).unwrap_or("").to_string();

        parent_of.insert(node.id, (parent_id, position));
        by_id.insert(node.id, node);
    }

    let mut groups: HashMap<Id, Vec<(String, Id)>> = HashMap::new();
    let mut root = None;

    for (id, (parent_id, position)) in &parent_of {
        match parent_id {
            Some(parent) => groups.entry(*parent).or_default().push((position.clone(), *id)),
            None => {
                let node_type = by_id.get(id).map(|n| n.node_type.clone());
                if node_type == Some(NodeType::Document) {
                    root = Some(*id);
                } else {
                    tracing::warn!(?id, "dropping orphan node with no parent");
                }
            }
        }
    }

    let root = root.ok_or_else(|| FigError::SchemaMismatch {
        reason: "no DOCUMENT-typed root node in node change stream".into(),
    })?;

    for (parent, mut children) in groups {
        children.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(node) = by_id.get_mut(&parent) {
            node.children = children.into_iter().map(|(_, id)| id).collect();
        } else {
            tracing::warn!(?parent, "parentIndex references an id with no node change record");
        }
    }

    let mut by_id_to_path = HashMap::with_capacity(by_id.len());
    build_paths(root, "", &by_id, &mut by_id_to_path);

    let pages = by_id
        .get(&root)
        .map(|r| r.children.iter().copied().filter(|id| is_canvas(&by_id, *id)).collect())
        .unwrap_or_default();

    Ok(BuiltTree { root, by_id, by_id_to_path, pages })
}

fn is_canvas(by_id: &HashMap<Id, Node>, id: Id) -> bool {
    by_id.get(&id).map(|n| n.node_type == NodeType::Canvas).unwrap_or(false)
}

fn build_paths(id: Id, prefix: &str, by_id: &HashMap<Id, Node>, out: &mut HashMap<Id, String>) {
    let path = if prefix.is_empty() { id.to_string() } else { format!("{prefix}/{id}") };
    out.insert(id, path.clone());
    if let Some(node) = by_id.get(&id) {
        for child in &node.children {
            build_paths(*child, &path, by_id, out);
        }
    }
}

pub(crate) fn guid_to_id(value: &Value) -> Option<Id> {
    let session = value.get_field("sessionID").and_then(Value::as_i64)? as u32;
    let local = value.get_field("localID").and_then(Value::as_i64)? as u32;
    Some(Id::new(session, local))
}

pub(crate) fn node_from_value(record: &Value) -> Result<Node, FigError> {
    let id = record
        .get_field("guid")
        .and_then(guid_to_id)
        .ok_or_else(|| FigError::SchemaMismatch { reason: "node change record has no guid".into() })?;

    let node_type = record.field_str("type").map(NodeType::from_tag).unwrap_or(NodeType::Other(String::new()));
    let name = record.field_str("name").unwrap_or_default().to_string();
    let visible = record.field_bool("visible").unwrap_or(true);
    let opacity = record.field_f64("opacity").unwrap_or(1.0) as f32;
    let blend_mode = record.field_str("blendMode").unwrap_or("NORMAL").to_string();

    let transform = match record.get_field("transform") {
        Some(t) => transform_from_value(t),
        None => {
            let x = record.field_f64("x").unwrap_or(0.0);
            let y = record.field_f64("y").unwrap_or(0.0);
            Transform::translate(x, y)
        }
    };

    let size = record
        .get_field("size")
        .map(|s| (s.field_f64("x").unwrap_or(0.0), s.field_f64("y").unwrap_or(0.0)))
        .unwrap_or((0.0, 0.0));

    let corner_radius = match record.get_field("rectangleCornerRadii") {
        Some(r) => CornerRadius::PerCorner([
            r.field_f64("topLeft").unwrap_or(0.0) as f32,
            r.field_f64("topRight").unwrap_or(0.0) as f32,
            r.field_f64("bottomRight").unwrap_or(0.0) as f32,
            r.field_f64("bottomLeft").unwrap_or(0.0) as f32,
        ]),
        None => CornerRadius::Uniform(record.field_f64("cornerRadius").unwrap_or(0.0) as f32),
    };

    let stroke_weight = record.field_f64("strokeWeight").unwrap_or(0.0) as f32;
    let stroke_cap = match record.field_str("strokeCap") {
        Some("ROUND") => StrokeCap::Round,
        Some("SQUARE") => StrokeCap::Square,
        _ => StrokeCap::Butt,
    };
    let stroke_join = match record.field_str("strokeJoin") {
        Some("ROUND") => StrokeJoin::Round,
        Some("BEVEL") => StrokeJoin::Bevel,
        _ => StrokeJoin::Miter,
    };
    let stroke_align = match record.field_str("strokeAlign") {
        Some("INSIDE") => StrokeAlign::Inside,
        Some("OUTSIDE") => StrokeAlign::Outside,
        _ => StrokeAlign::Center,
    };
    let stroke_dashes = record
        .field_seq("strokeDashes")
        .iter()
        .filter_map(Value::as_f64)
        .map(|v| v as f32)
        .collect();

    let fill_paints = record.field_seq("fillPaints").iter().map(paint_from_value).collect();
    let stroke_paints = record.field_seq("strokePaints").iter().map(paint_from_value).collect();
    let effects = record.field_seq("effects").iter().filter_map(effect_from_value).collect();

    let characters = record.field_str("characters").unwrap_or_default().to_string();
    let font_name = record
        .get_field("fontName")
        .and_then(|f| f.field_str("family"))
        .or_else(|| record.field_str("fontName"))
        .unwrap_or_default()
        .to_string();
    let font_size = record.field_f64("fontSize").unwrap_or(0.0) as f32;
    let line_height_px = record.field_f64("lineHeightPx").unwrap_or(0.0) as f32;
    let text_align_horizontal = match record.field_str("textAlignHorizontal") {
        Some("CENTER") => TextAlign::Center,
        Some("RIGHT") => TextAlign::Right,
        _ => TextAlign::Left,
    };
    let baselines = record.get_field("derivedTextData").map(baselines_from_value).unwrap_or_default();
    let text_auto_resize = record.field_str("textAutoResize").unwrap_or("NONE").to_string();

    let winding_rule = match record.field_str("windingRule") {
        Some("EVENODD") => WindingRule::EvenOdd,
        _ => WindingRule::NonZero,
    };

    let fill_geometry = record.field_seq("fillGeometry").iter().filter_map(geometry_ref_from_value).collect();
    let stroke_geometry = record.field_seq("strokeGeometry").iter().filter_map(geometry_ref_from_value).collect();
    let vector_network_blob = record
        .get_field("vectorData")
        .and_then(|v| v.get_field("blob"))
        .and_then(Value::as_i64)
        .map(|v| v as u32);
    let inline_vector_network = record.get_field("vectorNetwork").and_then(VectorNetwork::from_value);

    let is_mask = record.field_bool("isMask").unwrap_or(false);
    let clips_content = record.field_bool("clipsContent").unwrap_or(false);

    let symbol_id = record.get_field("symbolData").and_then(|s| s.get_field("symbolID")).and_then(guid_to_id);

    let symbol_overrides_raw = record
        .field_seq("symbolOverrides")
        .iter()
        .map(override_entry_from_value)
        .collect();

    let component_prop_assignments_raw = record
        .field_seq("componentPropAssignments")
        .iter()
        .filter_map(|a| {
            let def_id = a.field_str("defID")?.to_string();
            let value = a.get_field("value")?.clone();
            Some(PropAssignment { def_id, value })
        })
        .collect();

    let override_key = record.get_field("overrideKey").and_then(Value::as_bytes).map(hex_encode);

    let component_prop_refs = record
        .field_seq("componentPropRefs")
        .iter()
        .filter_map(|r| {
            Some(PropRef {
                def_id: r.field_str("defID")?.to_string(),
                node_field: r.field_str("nodeField")?.to_string(),
            })
        })
        .collect();

    Ok(Node {
        id,
        node_type,
        name,
        visible,
        opacity,
        blend_mode,
        transform,
        size,
        fill_paints,
        stroke_paints,
        stroke_weight,
        stroke_cap,
        stroke_join,
        stroke_align,
        stroke_dashes,
        corner_radius,
        effects,
        characters,
        font_name,
        font_size,
        line_height_px,
        text_align_horizontal,
        baselines,
        winding_rule,
        fill_geometry,
        stroke_geometry,
        vector_network_blob,
        inline_vector_network,
        text_auto_resize,
        is_mask,
        clips_content,
        symbol_id,
        symbol_overrides_raw,
        component_prop_assignments_raw,
        override_key,
        component_prop_refs,
        children: Vec::new(),
    })
}

pub(crate) fn transform_from_value(t: &Value) -> Transform {
    Transform {
        m: [
            t.field_f64("m00").unwrap_or(1.0),
            t.field_f64("m10").unwrap_or(0.0),
            t.field_f64("m01").unwrap_or(0.0),
            t.field_f64("m11").unwrap_or(1.0),
            t.field_f64("m02").unwrap_or(0.0),
            t.field_f64("m12").unwrap_or(0.0),
        ],
    }
}

pub(crate) fn baselines_from_value(d: &Value) -> Vec<TextBaseline> {
    d.field_seq("baselines")
        .iter()
        .map(|b| TextBaseline {
            first_character: b.field_f64("firstCharacter").unwrap_or(0.0) as u32,
            end_character: b.field_f64("endCharacter").unwrap_or(0.0) as u32,
            line_height: b.field_f64("lineHeight").unwrap_or(0.0) as f32,
        })
        .collect()
}

pub(crate) fn paint_from_value(value: &Value) -> Paint {
    match value.field_str("type") {
        Some("SOLID") => {
            let color = value.get_field("color");
            Paint::Solid {
                color: Rgba {
                    r: color.and_then(|c| c.field_f64("r")).unwrap_or(0.0) as f32,
                    g: color.and_then(|c| c.field_f64("g")).unwrap_or(0.0) as f32,
                    b: color.and_then(|c| c.field_f64("b")).unwrap_or(0.0) as f32,
                    a: value.field_f64("opacity").unwrap_or(1.0) as f32,
                },
            }
        }
        Some("IMAGE") => Paint::Image {
            hash: value.field_str("imageHash").unwrap_or_default().to_string(),
            scale_mode: match value.field_str("scaleMode") {
                Some("FIT") => ImageScaleMode::Fit,
                Some("TILE") => ImageScaleMode::Tile,
                Some("STRETCH") => ImageScaleMode::Stretch,
                _ => ImageScaleMode::Fill,
            },
        },
        other => Paint::Unrenderable { kind: other.unwrap_or("UNKNOWN").to_string() },
    }
}

fn effect_from_value(value: &Value) -> Option<Effect> {
    let color = value.get_field("color");
    let rgba = Rgba {
        r: color.and_then(|c| c.field_f64("r")).unwrap_or(0.0) as f32,
        g: color.and_then(|c| c.field_f64("g")).unwrap_or(0.0) as f32,
        b: color.and_then(|c| c.field_f64("b")).unwrap_or(0.0) as f32,
        a: color.and_then(|c| c.field_f64("a")).unwrap_or(1.0) as f32,
    };
    let offset = (
        value.get_field("offset").and_then(|o| o.field_f64("x")).unwrap_or(0.0) as f32,
        value.get_field("offset").and_then(|o| o.field_f64("y")).unwrap_or(0.0) as f32,
    );
    let radius = value.field_f64("radius").unwrap_or(0.0) as f32;
    let spread = value.field_f64("spread").unwrap_or(0.0) as f32;
    let visible = value.field_bool("visible").unwrap_or(true);

    match value.field_str("effectType") {
        Some("DROP_SHADOW") => Some(Effect::DropShadow { color: rgba, offset, radius, spread, visible }),
        Some("INNER_SHADOW") => Some(Effect::InnerShadow { color: rgba, offset, radius, spread, visible }),
        Some("LAYER_BLUR") => Some(Effect::LayerBlur { radius }),
        Some("BACKGROUND_BLUR") => Some(Effect::BackgroundBlur { radius }),
        _ => None,
    }
}

pub(crate) fn geometry_ref_from_value(value: &Value) -> Option<GeometryRef> {
    if let Some(bytes) = value.get_field("commands").and_then(Value::as_bytes) {
        return Some(GeometryRef::Inline(path_commands::decode_byte_stream(bytes)));
    }
    if let Some(text) = value.field_str("path") {
        return Some(GeometryRef::Inline(path_commands::decode_text_form(text)));
    }
    if let Some(blob) = value.get_field("blob").and_then(Value::as_i64) {
        return Some(GeometryRef::Blob(blob as u32));
    }
    None
}

fn override_entry_from_value(value: &Value) -> OverrideEntry {
    let guid_path = value
        .field_seq("guidPath")
        .iter()
        .filter_map(Value::as_bytes)
        .map(hex_encode)
        .collect::<Vec<_>>()
        .join(">");

    let fields = match value.get_field("overriddenFields") {
        Some(Value::Record(fields)) => fields.clone(),
        _ => match value {
            Value::Record(fields) => {
                fields.iter().filter(|(n, _)| n != "guidPath").cloned().collect()
            }
            _ => Vec::new(),
        },
    };

    OverrideEntry { guid_path, fields }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::value::Value;

    fn guid(session: i64, local: i64) -> Value {
        Value::Record(vec![
            ("sessionID".into(), Value::Int(session)),
            ("localID".into(), Value::Int(local)),
        ])
    }

    fn node_change(id: (i64, i64), ty: &str, parent: Option<(i64, i64)>, position: &str) -> Value {
        let mut fields = vec![
            ("guid".into(), guid(id.0, id.1)),
            ("type".into(), Value::Str(ty.into())),
            ("name".into(), Value::Str(ty.to_lowercase())),
        ];
        if let Some(p) = parent {
            fields.push((
                "parentIndex".into(),
                Value::Record(vec![
                    ("guid".into(), guid(p.0, p.1)),
                    ("position".into(), Value::Str(position.into())),
                ]),
            ));
        }
        Value::Record(fields)
    }

    #[test]
    fn builds_document_canvas_tree_and_pages() {
        let root_value = Value::Record(vec![(
            "nodeChanges".into(),
            Value::Seq(vec![
                node_change((1, 1), "DOCUMENT", None, ""),
                node_change((1, 2), "CANVAS", Some((1, 1)), "a"),
            ]),
        )]);

        let built = build(&root_value).unwrap();
        assert_eq!(built.root, Id::new(1, 1));
        assert_eq!(built.pages, vec![Id::new(1, 2)]);
        assert_eq!(built.by_id_to_path[&Id::new(1, 2)], "1:1/1:2");
    }

    #[test]
    fn orphan_non_document_node_is_dropped() {
        let root_value = Value::Record(vec![(
            "nodeChanges".into(),
            Value::Seq(vec![
                node_change((1, 1), "DOCUMENT", None, ""),
                node_change((1, 2), "FRAME", None, ""),
            ]),
        )]);

        let built = build(&root_value).unwrap();
        assert_eq!(built.by_id.len(), 2);
        assert!(built.by_id[&built.root].children.is_empty());
    }
}
