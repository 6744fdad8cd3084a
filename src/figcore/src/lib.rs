mod archive;
mod error;
mod geometry;
mod id;
mod render;
mod schema;
mod tree;

pub use archive::Archive;
pub use error::{FigError, Warning};
pub use geometry::path_commands::PathCommand;
pub use geometry::vector_network::VectorNetwork;
pub use id::Id;
pub use render::{RenderOptions, RenderResult};
pub use schema::value::Value;
pub use tree::node::{Node, NodeType, Paint, StrokeAlign, StrokeCap, StrokeJoin};

use std::collections::HashMap;

/// A fully parsed archive: the resolved scene graph plus the raw blobs the
/// renderer needs to reach back into (geometry blobs, image bytes).
pub struct FigDocument {
    root: Id,
    by_id: HashMap<Id, Node>,
    by_id_to_path: HashMap<Id, String>,
    pages: Vec<Id>,
    geometry_blobs: Vec<Vec<u8>>,
    images: HashMap<String, Vec<u8>>,
}

impl FigDocument {
    /// Parses an archive (C1), decodes its schema-driven document (C2), and
    /// builds the resolved scene graph (C3).
    pub fn open(bytes: &[u8]) -> Result<Self, FigError> {
        tracing::debug!(len = bytes.len(), "opening archive");
        let archive = Archive::parse(bytes)?;
        let canvas = archive
            .entry("canvas.fig")
            .ok_or_else(|| FigError::MissingEntry { name: "canvas.fig".into() })?;

        let document = schema::document::KiwiDocument::parse(canvas)?;
        tracing::debug!(definitions = document.schema.defs.len(), "schema compiled");

        let built = tree::builder::build(&document.root_value)?;
        tracing::debug!(nodes = built.by_id.len(), "tree built");

        Ok(Self {
            root: built.root,
            by_id: built.by_id,
            by_id_to_path: built.by_id_to_path,
            pages: built.pages,
            geometry_blobs: document.blobs,
            images: archive.images,
        })
    }

    pub fn root(&self) -> Id {
        self.root
    }

    /// Resolves a node by id.
    pub fn resolve(&self, id: Id) -> Result<&Node, FigError> {
        self.by_id
            .get(&id)
            .ok_or_else(|| FigError::NotFound { what: format!("id {id}") })
    }

    pub fn path_of(&self, id: Id) -> Result<&str, FigError> {
        self.by_id_to_path
            .get(&id)
            .map(|s| s.as_str())
            .ok_or_else(|| FigError::NotFound { what: format!("id {id}") })
    }

    /// Ordered CANVAS-typed children of the root node.
    pub fn pages(&self) -> Vec<&Node> {
        self.pages.iter().filter_map(|id| self.by_id.get(id)).collect()
    }

    pub fn find(&self, ty: Option<NodeType>, name_substring: Option<&str>) -> Vec<&Node> {
        self.by_id
            .values()
            .filter(|n| ty.map_or(true, |t| n.node_type == t))
            .filter(|n| {
                name_substring.map_or(true, |sub| {
                    n.name.to_lowercase().contains(&sub.to_lowercase())
                })
            })
            .collect()
    }

    pub fn image(&self, hash: &str) -> Result<&[u8], FigError> {
        self.images
            .get(&hash.to_lowercase())
            .map(|v| v.as_slice())
            .ok_or_else(|| FigError::NotFound { what: format!("image {hash}") })
    }

    pub fn render_subtree(
        &self,
        root: Id,
        options: &RenderOptions,
    ) -> Result<RenderResult, FigError> {
        let node = self.resolve(root)?;
        render::render(node, &self.by_id, &self.geometry_blobs, &self.images, options)
    }
}
