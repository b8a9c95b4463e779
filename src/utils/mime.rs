//! Extension based content types

/// Content type for a path or URL path, judged by its extension
#[must_use]
pub fn content_type_for(path: &str) -> Option<&'static str> {
    let (path, _) = super::split_url_suffix(path);
    let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        "bmp" => "image/bmp",
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        _ => return None,
    };
    Some(mime)
}

/// Image content type for a path, `None` for anything that is not an image
#[must_use]
pub fn image_content_type(path: &str) -> Option<&'static str> {
    content_type_for(path).filter(|mime| mime.starts_with("image/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_by_extension() {
        assert_eq!(image_content_type("img/logo.PNG"), Some("image/png"));
        assert_eq!(image_content_type("icons.svg#home"), Some("image/svg+xml"));
        assert_eq!(image_content_type("photo.jpeg?w=200"), Some("image/jpeg"));
        assert_eq!(image_content_type("font.woff2"), None);
        assert_eq!(image_content_type("no-extension"), None);
    }
}
