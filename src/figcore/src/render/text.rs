use crate::tree::node::{Node, TextAlign};

pub struct Span {
    pub content: String,
    pub y_offset: f32,
}

/// Splits a text node's content into baseline-positioned spans. Prefers
/// `derivedTextData.baselines` when present; otherwise splits on newlines
/// and advances by `lineHeightPx` (or `fontSize * 1.2`).
pub fn layout_spans(node: &Node) -> Vec<Span> {
    if !node.baselines.is_empty() {
        let chars: Vec<char> = node.characters.chars().collect();
        let mut y = 0.0f32;
        let mut spans = Vec::with_capacity(node.baselines.len());
        for baseline in &node.baselines {
            let start = baseline.first_character as usize;
            let end = (baseline.end_character as usize).min(chars.len());
            let text: String = if start < end { chars[start..end].iter().collect() } else { String::new() };
            let trimmed = text.trim_end().to_string();
            spans.push(Span { content: trimmed, y_offset: y });
            y += baseline.line_height;
        }
        spans
    } else {
        let line_height = if node.line_height_px > 0.0 { node.line_height_px } else { node.font_size * 1.2 };
        node.characters
            .split('\n')
            .enumerate()
            .map(|(i, line)| Span { content: line.to_string(), y_offset: line_height * i as f32 })
            .collect()
    }
}

/// Returns the SVG text-anchor keyword and the horizontal shift to apply
/// to the node's local origin.
pub fn horizontal_anchor(align: TextAlign, width: f64) -> (&'static str, f64) {
    match align {
        TextAlign::Left => ("start", 0.0),
        TextAlign::Center => ("middle", width / 2.0),
        TextAlign::Right => ("end", width),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Id;
    use crate::tree::node::{
        CornerRadius, StrokeAlign, StrokeCap, StrokeJoin, TextBaseline, Transform,
    };

    fn text_node(characters: &str, baselines: Vec<TextBaseline>) -> Node {
        Node {
            id: Id::new(1, 1),
            node_type: crate::tree::node::NodeType::Text,
            name: String::new(),
            visible: true,
            opacity: 1.0,
            blend_mode: "NORMAL".into(),
            transform: Transform::identity(),
            size: (0.0, 0.0),
            fill_paints: Vec::new(),
            stroke_paints: Vec::new(),
            stroke_weight: 0.0,
            stroke_cap: StrokeCap::Butt,
            stroke_join: StrokeJoin::Miter,
            stroke_align: StrokeAlign::Center,
            stroke_dashes: Vec::new(),
            corner_radius: CornerRadius::default(),
            effects: Vec::new(),
            characters: characters.to_string(),
            font_name: String::new(),
            font_size: 0.0,
            line_height_px: 0.0,
            text_align_horizontal: TextAlign::Left,
            baselines,
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
    fn splits_by_baselines_when_present() {
        let node = text_node(
            "Hello World",
            vec![
                TextBaseline { first_character: 0, end_character: 5, line_height: 16.0 },
                TextBaseline { first_character: 6, end_character: 11, line_height: 16.0 },
            ],
        );
        let spans = layout_spans(&node);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].content, "Hello");
        assert_eq!(spans[1].content, "World");
        assert_eq!(spans[1].y_offset, 16.0);
    }
}
