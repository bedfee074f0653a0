//! Photo/asset column decoding.
//!
//! Historic writers stored photo columns in two shapes: a JSON object with a
//! `url` property, or a bare URL string. Both must be accepted on read; no
//! canonical form is assumed during migration.

use serde::Deserialize;

#[derive(Deserialize)]
struct PhotoBlob {
    url: Option<String>,
}

/// Decode a stored photo/image column into a URL.
///
/// Fallback chain: JSON-object-with-`url` first, then a bare string that
/// itself looks like a URL (`http...`), otherwise the field is treated as
/// absent.
///
/// # Examples
///
/// ```
/// use claimbase::media::decode_photo_field;
///
/// assert_eq!(
///     decode_photo_field(Some(r#"{"url":"https://x/y.png"}"#)),
///     Some("https://x/y.png".to_string())
/// );
/// assert_eq!(
///     decode_photo_field(Some("https://x/y.png")),
///     Some("https://x/y.png".to_string())
/// );
/// assert_eq!(decode_photo_field(Some("garbage")), None);
/// assert_eq!(decode_photo_field(None), None);
/// ```
pub fn decode_photo_field(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    if let Ok(blob) = serde_json::from_str::<PhotoBlob>(raw) {
        return blob.url;
    }
    if raw.starts_with("http") {
        return Some(raw.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_object_form() {
        let url = decode_photo_field(Some(r#"{"url":"https://cdn.example/p/1.png"}"#));
        assert_eq!(url, Some("https://cdn.example/p/1.png".to_string()));
    }

    #[test]
    fn test_bare_url_form() {
        let url = decode_photo_field(Some("http://cdn.example/p/1.png"));
        assert_eq!(url, Some("http://cdn.example/p/1.png".to_string()));
    }

    #[test]
    fn test_garbage_is_absent() {
        assert_eq!(decode_photo_field(Some("garbage")), None);
        assert_eq!(decode_photo_field(Some("")), None);
        assert_eq!(decode_photo_field(None), None);
    }

    #[test]
    fn test_json_object_without_url_is_absent() {
        assert_eq!(decode_photo_field(Some(r#"{"key":"p/1.png"}"#)), None);
    }

    #[test]
    fn test_json_takes_precedence_over_bare_string() {
        // A JSON blob whose url is null decodes as absent even though the
        // raw text does not start with http.
        assert_eq!(decode_photo_field(Some(r#"{"url":null}"#)), None);
    }
}
