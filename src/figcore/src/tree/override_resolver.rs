use std::collections::{HashMap, HashSet};

use crate::id::Id;
use crate::schema::value::Value;

use super::node::{Node, NodeType};

/// The outcome of expanding an INSTANCE: the symbol's own top-level child
/// ids (to use as the instance's children) plus a local index of every
/// cloned node in the expanded subtree, keyed by its id within the symbol.
///
/// Clones are logically distinct per-instance even though they carry the
/// symbol subtree's original ids; callers must look nodes up in this local
/// index first and only fall back to the document-wide index for ids the
/// expansion didn't touch (there should be none inside the expanded
/// subtree, since every descendant of the symbol gets cloned).
pub struct Expansion {
    pub top_children: Vec<Id>,
    pub local_index: HashMap<Id, Node>,
}

/// Resolves an INSTANCE's children by cloning its symbol's subtree and
/// applying `symbolOverrides` and `componentPropAssignments`.
pub fn resolve_instance(instance: &Node, by_id: &HashMap<Id, Node>) -> Expansion {
    let mut visited = HashSet::new();
    resolve_instance_guarded(instance, by_id, &mut visited)
}

fn resolve_instance_guarded(
    instance: &Node,
    by_id: &HashMap<Id, Node>,
    visited: &mut HashSet<Id>,
) -> Expansion {
    let symbol_id = match instance.symbol_id {
        Some(id) => id,
        None => return Expansion { top_children: Vec::new(), local_index: HashMap::new() },
    };

    if !visited.insert(symbol_id) {
        tracing::warn!(?symbol_id, "cyclic instance/symbol reference, stopping expansion");
        return Expansion { top_children: Vec::new(), local_index: HashMap::new() };
    }

    let symbol = match by_id.get(&symbol_id) {
        Some(n) => n,
        None => {
            tracing::warn!(?symbol_id, "instance references a symbol id not present in the graph");
            return Expansion { top_children: Vec::new(), local_index: HashMap::new() };
        }
    };

    let mut path_to_node_id = HashMap::new();
    build_path_index(symbol, by_id, "", &mut path_to_node_id);

    let mut overrides_by_node_id = resolve_overrides(instance, &path_to_node_id);
    apply_component_prop_assignments(instance, symbol, by_id, &mut overrides_by_node_id);

    let mut local_index = HashMap::new();
    clone_subtree(symbol, by_id, &overrides_by_node_id, visited, &mut local_index);

    Expansion { top_children: symbol.children.clone(), local_index }
}

fn build_path_index(
    node: &Node,
    by_id: &HashMap<Id, Node>,
    prefix: &str,
    out: &mut HashMap<String, Id>,
) {
    let path = match &node.override_key {
        Some(key) if prefix.is_empty() => key.clone(),
        Some(key) => format!("{prefix}>{key}"),
        None => prefix.to_string(),
    };
    if !path.is_empty() {
        out.insert(path.clone(), node.id);
    }
    for child_id in &node.children {
        if let Some(child) = by_id.get(child_id) {
            build_path_index(child, by_id, &path, out);
        }
    }
}

/// A per-node accumulation of override fields. Later (deeper/duplicate)
/// writes for the same field win, per the nested-override precedence rule.
#[derive(Default, Clone)]
struct NodeOverride {
    fields: Vec<(String, Value)>,
}

impl NodeOverride {
    fn merge(&mut self, fields: &[(String, Value)]) {
        for (name, value) in fields {
            if let Some(existing) = self.fields.iter_mut().find(|(n, _)| n == name) {
                existing.1 = value.clone();
            } else {
                self.fields.push((name.clone(), value.clone()));
            }
        }
    }
}

fn resolve_overrides(
    instance: &Node,
    path_to_node_id: &HashMap<String, Id>,
) -> HashMap<Id, NodeOverride> {
    let mut out: HashMap<Id, NodeOverride> = HashMap::new();
    for entry in &instance.symbol_overrides_raw {
        if let Some(&node_id) = path_to_node_id.get(&entry.guid_path) {
            out.entry(node_id).or_default().merge(&entry.fields);
        } else {
            tracing::warn!(path = %entry.guid_path, "override guid path did not resolve to a node");
        }
    }
    out
}

/// Maps `componentPropAssignments` onto whichever descendant declares a
/// matching `componentPropRef`, via a def-id-to-(node, field) index built
/// ahead of time (symmetric to `build_path_index`).
fn apply_component_prop_assignments(
    instance: &Node,
    symbol: &Node,
    by_id: &HashMap<Id, Node>,
    overrides_by_node_id: &mut HashMap<Id, NodeOverride>,
) {
    if instance.component_prop_assignments_raw.is_empty() {
        return;
    }

    let mut ref_index: HashMap<String, Vec<(Id, String)>> = HashMap::new();
    build_ref_index(symbol, by_id, &mut ref_index);

    for assignment in &instance.component_prop_assignments_raw {
        let Some(targets) = ref_index.get(&assignment.def_id) else {
            tracing::warn!(def_id = %assignment.def_id, "componentPropAssignment has no matching componentPropRef");
            continue;
        };
        for (node_id, node_field) in targets {
            match prop_field_to_node_field(node_field) {
                Some(field_name) => {
                    overrides_by_node_id
                        .entry(*node_id)
                        .or_default()
                        .merge(&[(field_name.to_string(), assignment.value.clone())]);
                }
                None => {
                    tracing::warn!(node_field = %node_field, "unrecognized componentPropNodeField");
                }
            }
        }
    }
}

fn prop_field_to_node_field(node_field: &str) -> Option<&'static str> {
    match node_field {
        "TEXT_DATA" => Some("characters"),
        "VISIBLE" => Some("visible"),
        "OVERRIDDEN_SYMBOL_ID" => Some("overrideSymbolId"),
        _ => None,
    }
}

fn build_ref_index(node: &Node, by_id: &HashMap<Id, Node>, out: &mut HashMap<String, Vec<(Id, String)>>) {
    for prop_ref in &node.component_prop_refs {
        out.entry(prop_ref.def_id.clone()).or_default().push((node.id, prop_ref.node_field.clone()));
    }
    for child_id in &node.children {
        if let Some(child) = by_id.get(child_id) {
            build_ref_index(child, by_id, out);
        }
    }
}

fn clone_subtree(
    node: &Node,
    by_id: &HashMap<Id, Node>,
    overrides_by_node_id: &HashMap<Id, NodeOverride>,
    visited: &mut HashSet<Id>,
    out: &mut HashMap<Id, Node>,
) {
    let mut clone = node.clone();

    if let Some(over) = overrides_by_node_id.get(&node.id) {
        apply_fields(&mut clone, &over.fields);
    }

    if clone.node_type == NodeType::Instance {
        let nested = resolve_instance_guarded(&clone, by_id, visited);
        clone.children = nested.top_children;
        out.extend(nested.local_index);
    }

    out.insert(node.id, clone);

    for child_id in &node.children {
        if let Some(child) = by_id.get(child_id) {
            clone_subtree(child, by_id, overrides_by_node_id, visited, out);
        }
    }
}

fn apply_fields(node: &mut Node, fields: &[(String, Value)]) {
    for (name, value) in fields {
        match name.as_str() {
            "characters" => {
                if let Some(s) = value.as_str() {
                    node.characters = s.to_string();
                }
            }
            "visible" => {
                if let Some(b) = value.as_bool() {
                    node.visible = b;
                }
            }
            "opacity" => {
                if let Some(f) = value.as_f64() {
                    node.opacity = f as f32;
                }
            }
            "fontName" => {
                if let Some(family) = value.field_str("family").or_else(|| value.as_str()) {
                    node.font_name = family.to_string();
                }
            }
            "fontSize" => {
                if let Some(f) = value.as_f64() {
                    node.font_size = f as f32;
                }
            }
            "lineHeightPx" => {
                if let Some(f) = value.as_f64() {
                    node.line_height_px = f as f32;
                }
            }
            "textAutoResize" => {
                if let Some(s) = value.as_str() {
                    node.text_auto_resize = s.to_string();
                }
            }
            "derivedTextData" => {
                node.baselines = super::builder::baselines_from_value(value);
            }
            "size" => {
                let x = value.field_f64("x").unwrap_or(node.size.0);
                let y = value.field_f64("y").unwrap_or(node.size.1);
                node.size = (x, y);
            }
            "transform" => {
                node.transform = super::builder::transform_from_value(value);
            }
            "cornerRadius" => {
                if let Some(f) = value.as_f64() {
                    node.corner_radius = super::node::CornerRadius::Uniform(f as f32);
                } else if matches!(value, Value::Record(_)) {
                    node.corner_radius = super::node::CornerRadius::PerCorner([
                        value.field_f64("topLeft").unwrap_or(0.0) as f32,
                        value.field_f64("topRight").unwrap_or(0.0) as f32,
                        value.field_f64("bottomRight").unwrap_or(0.0) as f32,
                        value.field_f64("bottomLeft").unwrap_or(0.0) as f32,
                    ]);
                }
            }
            "fillPaints" => {
                if let Some(seq) = value.as_seq() {
                    node.fill_paints = seq.iter().map(super::builder::paint_from_value).collect();
                }
            }
            "strokePaints" => {
                if let Some(seq) = value.as_seq() {
                    node.stroke_paints = seq.iter().map(super::builder::paint_from_value).collect();
                }
            }
            "fillGeometry" => {
                if let Some(seq) = value.as_seq() {
                    node.fill_geometry = seq.iter().filter_map(super::builder::geometry_ref_from_value).collect();
                }
            }
            "strokeGeometry" => {
                if let Some(seq) = value.as_seq() {
                    node.stroke_geometry = seq.iter().filter_map(super::builder::geometry_ref_from_value).collect();
                }
            }
            "overrideSymbolId" => {
                node.symbol_id = super::builder::guid_to_id(value);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::{NodeType, Transform};

    fn bare_node(id: Id, ty: NodeType) -> Node {
        Node {
            id,
            node_type: ty,
            name: String::new(),
            visible: true,
            opacity: 1.0,
            blend_mode: "NORMAL".into(),
            transform: Transform::identity(),
            size: (0.0, 0.0),
            fill_paints: Vec::new(),
            stroke_paints: Vec::new(),
            stroke_weight: 0.0,
            stroke_cap: super::super::node::StrokeCap::Butt,
            stroke_join: super::super::node::StrokeJoin::Miter,
            stroke_align: super::super::node::StrokeAlign::Center,
            stroke_dashes: Vec::new(),
            corner_radius: Default::default(),
            effects: Vec::new(),
            characters: String::new(),
            font_name: String::new(),
            font_size: 0.0,
            line_height_px: 0.0,
            text_align_horizontal: super::super::node::TextAlign::Left,
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
    fn resolves_a_text_override_by_guid_path() {
        let mut by_id = HashMap::new();

        let mut text = bare_node(Id::new(4, 2), NodeType::Text);
        text.characters = "old".into();
        text.override_key = Some("aa".into());

        let mut frame = bare_node(Id::new(4, 1), NodeType::Frame);
        frame.children = vec![text.id];

        by_id.insert(frame.id, frame.clone());
        by_id.insert(text.id, text.clone());

        let mut instance = bare_node(Id::new(5, 1), NodeType::Instance);
        instance.symbol_id = Some(frame.id);
        instance.symbol_overrides_raw = vec![crate::tree::node::OverrideEntry {
            guid_path: "aa".into(),
            fields: vec![("characters".into(), Value::Str("new".into()))],
        }];

        let expansion = resolve_instance(&instance, &by_id);
        assert_eq!(expansion.top_children, vec![text.id]);
        assert_eq!(expansion.local_index[&text.id].characters, "new");
    }

    #[test]
    fn component_prop_assignment_maps_onto_the_referencing_descendant() {
        let mut by_id = HashMap::new();

        let mut text = bare_node(Id::new(4, 2), NodeType::Text);
        text.characters = "old".into();
        text.component_prop_refs = vec![crate::tree::node::PropRef {
            def_id: "label".into(),
            node_field: "TEXT_DATA".into(),
        }];

        let mut frame = bare_node(Id::new(4, 1), NodeType::Frame);
        frame.children = vec![text.id];

        by_id.insert(frame.id, frame.clone());
        by_id.insert(text.id, text.clone());

        let mut instance = bare_node(Id::new(5, 1), NodeType::Instance);
        instance.symbol_id = Some(frame.id);
        instance.component_prop_assignments_raw = vec![crate::tree::node::PropAssignment {
            def_id: "label".into(),
            value: Value::Str("assigned".into()),
        }];

        let expansion = resolve_instance(&instance, &by_id);
        assert_eq!(expansion.local_index[&text.id].characters, "assigned");
    }
}
