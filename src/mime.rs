use std::path::Path;

pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Guess the MIME type of a reference image: extension first, then magic bytes.
pub fn guess_image_mime(path: &Path, bytes: &[u8]) -> &'static str {
    mime_from_extension(path)
        .or_else(|| sniff_image_mime(bytes))
        .unwrap_or_else(|| {
            tracing::warn!(
                "Could not guess MIME type of {} (first 4 bytes: {:02X?}), using {}",
                path.display(),
                &bytes[..bytes.len().min(4)],
                FALLBACK_MIME
            );
            FALLBACK_MIME
        })
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    mime_guess::from_path(path).first_raw()
}

pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        _ => None,
    }
}
