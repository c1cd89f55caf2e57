//! MIME utilities shared across modules

const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// Lowercases the essence of a MIME type and drops parameters.
#[must_use]
pub fn canonicalize_mime(mime: &str) -> String {
    let main = mime
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    match main.as_str() {
        "image/jpg" => "image/jpeg".to_string(),
        other => other.to_string(),
    }
}

/// Returns whether a given MIME type is an image format the platforms render inline.
#[must_use]
pub fn is_supported_image_mime(mime: &str) -> bool {
    let canon = canonicalize_mime(mime);
    ["image/jpeg", "image/png", "image/gif", "image/webp"].contains(&canon.as_str())
}

/// File extension for an image content type, falling back to `png`.
#[must_use]
pub fn image_extension(content_type: Option<&str>) -> &'static str {
    let Some(mime) = content_type.map(canonicalize_mime) else {
        return DEFAULT_IMAGE_EXTENSION;
    };
    if !is_supported_image_mime(&mime) {
        return DEFAULT_IMAGE_EXTENSION;
    }
    if mime == "image/jpeg" {
        return "jpg";
    }
    mime_guess::get_mime_extensions_str(&mime)
        .and_then(|exts| exts.first().copied())
        .unwrap_or(DEFAULT_IMAGE_EXTENSION)
}

/// Builds an upload filename such as `generated-image.png`.
#[must_use]
pub fn image_filename(stem: &str, content_type: Option<&str>) -> String {
    format!("{stem}.{}", image_extension(content_type))
}
