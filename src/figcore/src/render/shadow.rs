use crate::tree::node::Rgba;

pub(crate) fn color_to_css(color: &Rgba) -> String {
    format!("rgba({},{},{},{})", (color.r * 255.0) as u8, (color.g * 255.0) as u8, (color.b * 255.0) as u8, color.a)
}

/// Drop shadow: a built-in `feDropShadow` when `spread` is zero; otherwise
/// composed from blur, dilate-by-spread, offset, flood, and a merge above
/// the source graphic.
pub fn drop_shadow_filter(offset: (f32, f32), radius: f32, spread: f32, color: &Rgba) -> String {
    let std_dev = radius / 2.0;
    let css_color = color_to_css(color);

    if spread == 0.0 {
        return format!(
            "<feDropShadow dx=\"{}\" dy=\"{}\" stdDeviation=\"{std_dev}\" flood-color=\"{css_color}\"/>",
            offset.0, offset.1
        );
    }

    format!(
        "<feGaussianBlur in=\"SourceAlpha\" stdDeviation=\"{std_dev}\" result=\"blur\"/>\
         <feMorphology in=\"blur\" operator=\"dilate\" radius=\"{spread_abs}\" result=\"dilated\"/>\
         <feOffset in=\"dilated\" dx=\"{dx}\" dy=\"{dy}\" result=\"offset\"/>\
         <feFlood flood-color=\"{css_color}\" result=\"flood\"/>\
         <feComposite in=\"flood\" in2=\"offset\" operator=\"in\" result=\"shadow\"/>\
         <feMerge><feMergeNode in=\"shadow\"/><feMergeNode in=\"SourceGraphic\"/></feMerge>",
        spread_abs = spread.abs(),
        dx = offset.0,
        dy = offset.1,
    )
}

/// Inner shadow: inverted source alpha, blurred, offset, flooded, then
/// composited beneath the source graphic.
pub fn inner_shadow_filter(offset: (f32, f32), radius: f32, spread: f32, color: &Rgba) -> String {
    let std_dev = radius / 2.0;
    let css_color = color_to_css(color);
    let _ = spread;

    format!(
        "<feComponentTransfer in=\"SourceAlpha\" result=\"inverted\">\
           <feFuncA type=\"table\" tableValues=\"1 0\"/>\
         </feComponentTransfer>\
         <feGaussianBlur in=\"inverted\" stdDeviation=\"{std_dev}\" result=\"blurred\"/>\
         <feOffset in=\"blurred\" dx=\"{dx}\" dy=\"{dy}\" result=\"offset\"/>\
         <feFlood flood-color=\"{css_color}\" result=\"flood\"/>\
         <feComposite in=\"flood\" in2=\"offset\" operator=\"in\" result=\"innershadow\"/>\
         <feComposite in=\"innershadow\" in2=\"SourceAlpha\" operator=\"in\" result=\"clipped\"/>\
         <feMerge><feMergeNode in=\"clipped\"/><feMergeNode in=\"SourceGraphic\"/></feMerge>",
        dx = offset.0,
        dy = offset.1,
    )
}
