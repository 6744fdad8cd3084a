mod bounds_pass;
mod image;
mod render_pass;
mod shadow;
mod svg_writer;
mod text;

pub mod options;

pub use options::{RenderOptions, RenderResult};

use std::collections::HashMap;

use crate::error::{FigError, Warning};
use crate::id::Id;
use crate::tree::node::{Node, NodeType};
use crate::tree::override_resolver;

/// A stack of instance-local node overlays, most recently pushed first.
/// An id inside an expanded INSTANCE subtree is looked up here before
/// falling back to the document-wide index.
#[derive(Default, Clone)]
pub(crate) struct Scope {
    layers: Vec<HashMap<Id, Node>>,
}

impl Scope {
    fn get<'a>(&'a self, id: Id, by_id: &'a HashMap<Id, Node>) -> Option<&'a Node> {
        for layer in self.layers.iter().rev() {
            if let Some(n) = layer.get(&id) {
                return Some(n);
            }
        }
        by_id.get(&id)
    }

    fn pushed(&self, layer: HashMap<Id, Node>) -> Scope {
        let mut layers = self.layers.clone();
        layers.push(layer);
        Scope { layers }
    }
}

/// Resolves a node's children as a list of ids resolvable through `scope`.
/// For an INSTANCE with no materialized children, expands it on demand and
/// returns a scope extended with the expansion's clones.
pub(crate) fn resolve_children(
    node: &Node,
    by_id: &HashMap<Id, Node>,
    scope: &Scope,
) -> (Vec<Id>, Scope) {
    if node.node_type == NodeType::Instance && node.children.is_empty() {
        let expansion = override_resolver::resolve_instance(node, by_id);
        let new_scope = scope.pushed(expansion.local_index);
        (expansion.top_children, new_scope)
    } else {
        (node.children.clone(), scope.clone())
    }
}

pub fn render(
    root: &Node,
    by_id: &HashMap<Id, Node>,
    blobs: &[Vec<u8>],
    images: &HashMap<String, Vec<u8>>,
    options: &RenderOptions,
) -> Result<RenderResult, FigError> {
    options.validate()?;

    let scope = Scope::default();
    let aabb = bounds_pass::compute_bounds(root, by_id, &scope, crate::tree::node::Transform::identity(), options.max_depth);

    let Some(aabb) = aabb else {
        return Ok(RenderResult { output: String::new(), width: 0.0, height: 0.0, warnings: vec![Warning::new(None, "no bounds")] });
    };

    let mut warnings = Vec::new();
    let mut writer = svg_writer::SvgWriter::new(aabb.width() * options.scale, aabb.height() * options.scale);
    let origin = crate::tree::node::Transform::translate(-aabb.min_x, -aabb.min_y);
    let scale = crate::tree::node::Transform { m: [options.scale, 0.0, 0.0, options.scale, 0.0, 0.0] };
    let world = scale.compose(&origin);

    if let Some(bg) = &options.background {
        writer.background_rect(aabb.width() * options.scale, aabb.height() * options.scale, bg);
    }

    render_pass::render_node(root, by_id, &scope, world, 0, options, blobs, images, &mut writer, &mut warnings);

    Ok(RenderResult {
        output: writer.finish(),
        width: aabb.width() * options.scale,
        height: aabb.height() * options.scale,
        warnings,
    })
}
