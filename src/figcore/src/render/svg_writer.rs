use std::fmt::Write as _;

use crate::tree::node::Transform;

/// Hand-rolled vector markup emission. Attribute order within each element
/// is fixed so that two renders of the same input are byte-identical.
pub struct SvgWriter {
    width: f64,
    height: f64,
    body: String,
    defs: String,
    next_id: u32,
}

impl SvgWriter {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, body: String::new(), defs: String::new(), next_id: 0 }
    }

    pub fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn background_rect(&mut self, width: f64, height: f64, color: &str) {
        let _ = write!(self.body, "<rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"{color}\"/>");
    }

    pub fn open_group(&mut self, transform: &Transform, opacity: f32, clip_id: Option<u32>, filter_id: Option<u32>) {
        let _ = write!(self.body, "<g transform=\"matrix({} {} {} {} {} {})\"", transform.m[0], transform.m[1], transform.m[2], transform.m[3], transform.m[4], transform.m[5]);
        if opacity < 1.0 {
            let _ = write!(self.body, " opacity=\"{opacity}\"");
        }
        if let Some(id) = clip_id {
            let _ = write!(self.body, " clip-path=\"url(#clip{id})\"");
        }
        if let Some(id) = filter_id {
            let _ = write!(self.body, " filter=\"url(#filter{id})\"");
        }
        self.body.push('>');
    }

    pub fn close_group(&mut self) {
        self.body.push_str("</g>");
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, rx: f64, ry: f64, fill: &str) {
        let _ = write!(
            self.body,
            "<rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" rx=\"{rx}\" ry=\"{ry}\" fill=\"{fill}\"/>"
        );
    }

    pub fn path(&mut self, d: &str, fill: &str, fill_rule: &str) {
        let _ = write!(self.body, "<path d=\"{d}\" fill=\"{fill}\" fill-rule=\"{fill_rule}\"/>");
    }

    pub fn stroked_path(&mut self, d: &str, stroke: &str, width: f32, cap: &str, join: &str, dasharray: &str) {
        let _ = write!(
            self.body,
            "<path d=\"{d}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"{width}\" stroke-linecap=\"{cap}\" stroke-linejoin=\"{join}\""
        );
        if !dasharray.is_empty() {
            let _ = write!(self.body, " stroke-dasharray=\"{dasharray}\"");
        }
        self.body.push_str("/>");
    }

    pub fn text(&mut self, x: f64, y: f64, anchor: &str, content: &str) {
        let _ = write!(self.body, "<text x=\"{x}\" y=\"{y}\" text-anchor=\"{anchor}\">{}</text>", escape(content));
    }

    pub fn image(&mut self, x: f64, y: f64, w: f64, h: f64, preserve_aspect: &str, href: &str) {
        let _ = write!(
            self.body,
            "<image x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"{preserve_aspect}\" href=\"{href}\"/>"
        );
    }

    pub fn add_clip_rect(&mut self, id: u32, x: f64, y: f64, w: f64, h: f64) {
        let _ = write!(self.defs, "<clipPath id=\"clip{id}\"><rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\"/></clipPath>");
    }

    pub fn add_clip_path(&mut self, id: u32, d: &str) {
        let _ = write!(self.defs, "<clipPath id=\"clip{id}\"><path d=\"{d}\"/></clipPath>");
    }

    pub fn add_raw_filter(&mut self, id: u32, body: &str) {
        let _ = write!(self.defs, "<filter id=\"filter{id}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\">{body}</filter>");
    }

    pub fn finish(self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">",
            self.width, self.height, self.width, self.height
        );
        if !self.defs.is_empty() {
            let _ = write!(out, "<defs>{}</defs>", self.defs);
        }
        out.push_str(&self.body);
        out.push_str("</svg>");
        out
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
