use std::collections::HashMap;

use crate::geometry::bounds::Aabb;
use crate::id::Id;
use crate::tree::node::{Node, NodeType, Transform};

use super::{resolve_children, Scope};

/// Composes transforms top-down and unions the transformed corners of
/// every non-DOCUMENT, non-CANVAS node into a single AABB.
pub fn compute_bounds(
    node: &Node,
    by_id: &HashMap<Id, Node>,
    scope: &Scope,
    parent_world: Transform,
    max_depth: u32,
) -> Option<Aabb> {
    compute_bounds_inner(node, by_id, scope, parent_world, max_depth, 0)
}

fn compute_bounds_inner(
    node: &Node,
    by_id: &HashMap<Id, Node>,
    scope: &Scope,
    parent_world: Transform,
    max_depth: u32,
    depth: u32,
) -> Option<Aabb> {
    if !node.visible || depth > max_depth {
        return None;
    }

    let world = parent_world.compose(&node.transform);
    let mut aabb = if matches!(node.node_type, NodeType::Document | NodeType::Canvas) {
        None
    } else {
        let (w, h) = node.size;
        let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
        let mut b: Option<Aabb> = None;
        for (x, y) in corners {
            let (tx, ty) = world.apply((x, y));
            match &mut b {
                Some(existing) => existing.union(&Aabb { min_x: tx, min_y: ty, max_x: tx, max_y: ty }),
                None => b = Some(Aabb { min_x: tx, min_y: ty, max_x: tx, max_y: ty }),
            }
        }
        b
    };

    let (children, child_scope) = resolve_children(node, by_id, scope);
    for child_id in children {
        if let Some(child) = child_scope.get(child_id, by_id) {
            if let Some(child_aabb) =
                compute_bounds_inner(child, by_id, &child_scope, world, max_depth, depth + 1)
            {
                match &mut aabb {
                    Some(existing) => existing.union(&child_aabb),
                    None => aabb = Some(child_aabb),
                }
            }
        }
    }

    aabb
}
