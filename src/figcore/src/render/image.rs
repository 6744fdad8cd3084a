use base64::Engine;

use crate::tree::node::ImageScaleMode;

/// Sniffs the leading bytes of an image blob and returns its MIME type.
/// Falls back to `application/octet-stream` for anything unrecognized; the
/// renderer still emits a data URI with that type rather than erroring.
pub fn detect_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8]) {
        "image/jpeg"
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        "image/png"
    } else if bytes.starts_with(&[0x47, 0x49, 0x46]) {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "application/octet-stream"
    }
}

/// Encodes an image blob as a `data:` URI suitable for an SVG `<image>` href.
pub fn data_uri(bytes: &[u8]) -> String {
    let mime = detect_mime(bytes);
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

/// Maps a fill's scale mode to the SVG `preserveAspectRatio` value used when
/// placing the image inside its node's bounding box.
pub fn preserve_aspect_ratio(mode: ImageScaleMode) -> &'static str {
    match mode {
        ImageScaleMode::Fit => "xMidYMid meet",
        ImageScaleMode::Stretch => "none",
        ImageScaleMode::Fill | ImageScaleMode::Tile => "xMidYMid slice",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_png_by_magic_bytes() {
        let bytes = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_mime(&bytes), "image/png");
    }

    #[test]
    fn unknown_bytes_fall_back_to_octet_stream() {
        assert_eq!(detect_mime(&[0x00, 0x01, 0x02]), "application/octet-stream");
    }

    #[test]
    fn fit_maps_to_meet_and_stretch_to_none() {
        assert_eq!(preserve_aspect_ratio(ImageScaleMode::Fit), "xMidYMid meet");
        assert_eq!(preserve_aspect_ratio(ImageScaleMode::Stretch), "none");
        assert_eq!(preserve_aspect_ratio(ImageScaleMode::Fill), "xMidYMid slice");
    }

    #[test]
    fn data_uri_carries_the_detected_mime_type() {
        let uri = data_uri(&[0xFF, 0xD8, 0xFF, 0xE0]);
        assert!(uri.starts_with("data:image/jpeg;base64,"));
    }
}
