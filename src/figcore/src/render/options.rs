use crate::error::{FigError, Warning};

/// The renderer's single configurable surface. Unknown flags are a
/// programmer error at the call boundary (fatal), never silently ignored.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub max_depth: u32,
    pub include_text: bool,
    pub include_fills: bool,
    pub include_strokes: bool,
    pub include_images: bool,
    pub include_shadows: bool,
    pub background: Option<String>,
    pub scale: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_depth: 200,
            include_text: true,
            include_fills: true,
            include_strokes: true,
            include_images: false,
            include_shadows: true,
            background: None,
            scale: 1.0,
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> Result<(), FigError> {
        if self.scale <= 0.0 || !self.scale.is_finite() {
            return Err(FigError::InvalidOption { reason: format!("scale must be positive and finite, got {}", self.scale) });
        }
        if self.max_depth == 0 {
            return Err(FigError::InvalidOption { reason: "maxDepth must be at least 1".into() });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RenderResult {
    pub output: String,
    pub width: f64,
    pub height: f64,
    pub warnings: Vec<Warning>,
}
