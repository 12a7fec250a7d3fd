//! Image reference normalization and pending uploads.

#![forbid(unsafe_code)]

use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;
use tracing::debug;

/// Shown wherever a record has no image.
pub const PLACEHOLDER: &str = "https://via.placeholder.com/150?text=No+Image";
/// Shown in the form's upload area when there is neither an existing nor a pending image.
pub const FORM_PLACEHOLDER: &str = "https://via.placeholder.com/400x300?text=Upload+Image";

const STORAGE_MARKER: &str = "images/";
const PREVIEW_SCHEME: &str = "blob:arcadia/";

/// Resolves stored image references against the configured media base.
///
/// The one resolver is shared by list thumbnails and the form preview so both render
/// the same URL for the same reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaResolver {
    base: String,
}

impl MediaResolver {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self { base: base.trim_end_matches('/').to_string() }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Turn a raw reference (absolute URL, storage path, or local preview) into a displayable URL.
    ///
    /// Pure and idempotent: the output of one call is returned unchanged by the next.
    pub fn resolve_display_url(&self, raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() {
            return PLACEHOLDER.to_string();
        }
        if is_absolute(raw) {
            return raw.to_string();
        }
        let normalized = raw.replace('\\', "/");
        let clean = match normalized.rfind(STORAGE_MARKER) {
            Some(pos) => &normalized[pos + STORAGE_MARKER.len()..],
            None => normalized.as_str(),
        };
        format!("{}/{}{}", self.base, STORAGE_MARKER, clean.trim_start_matches('/'))
    }
}

fn is_absolute(raw: &str) -> bool {
    ["http://", "https://", "blob:", "data:"].iter().any(|p| raw.starts_with(p))
}

/// A local file picked in the form, held until the next submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
    /// Transient reference for previewing the file before it is uploaded.
    pub preview_url: String,
}

impl PendingImage {
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        let preview_url = format!("{}{}", PREVIEW_SCHEME, uuid::Uuid::new_v4());
        Self { file_name, content_type, bytes: bytes.into(), preview_url }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Read a local file for upload. Nothing is sent until the form is submitted.
pub fn accept_pending_file(path: &Path) -> Result<PendingImage> {
    let bytes = std::fs::read(path).with_context(|| format!("reading image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());
    let img = PendingImage::from_bytes(file_name, bytes);
    debug!(file = %img.file_name, bytes = img.len(), content_type = %img.content_type, "media: pending file accepted");
    Ok(img)
}

/// Content type guessed from the file extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> MediaResolver {
        MediaResolver::new("http://cdn.test/")
    }

    #[test]
    fn blank_reference_yields_placeholder() {
        assert_eq!(resolver().resolve_display_url(""), PLACEHOLDER);
        assert_eq!(resolver().resolve_display_url("   "), PLACEHOLDER);
    }

    #[test]
    fn absolute_and_preview_references_pass_through() {
        let r = resolver();
        assert_eq!(r.resolve_display_url("https://img.example/a.png"), "https://img.example/a.png");
        assert_eq!(r.resolve_display_url("blob:arcadia/123"), "blob:arcadia/123");
    }

    #[test]
    fn storage_paths_are_rebuilt_against_base() {
        let r = resolver();
        assert_eq!(r.resolve_display_url("public\\images\\cover.jpg"), "http://cdn.test/images/cover.jpg");
        assert_eq!(r.resolve_display_url("/var/app/images/x/images/y.png"), "http://cdn.test/images/y.png");
        assert_eq!(r.resolve_display_url("cover.jpg"), "http://cdn.test/images/cover.jpg");
    }

    #[test]
    fn resolution_is_idempotent() {
        let r = resolver();
        for raw in ["", "uploads/images/a.png", "b.gif", "https://x.test/c.png"] {
            let once = r.resolve_display_url(raw);
            assert_eq!(r.resolve_display_url(&once), once);
            assert_eq!(r.resolve_display_url(raw), once);
        }
    }

    #[test]
    fn pending_image_infers_content_type_and_preview() {
        let img = PendingImage::from_bytes("Cover.PNG", vec![1u8, 2, 3]);
        assert_eq!(img.content_type, "image/png");
        assert_eq!(img.len(), 3);
        assert!(img.preview_url.starts_with("blob:"));
        assert_eq!(resolver().resolve_display_url(&img.preview_url), img.preview_url);
        assert_eq!(content_type_for("notes"), "application/octet-stream");
    }

    #[test]
    fn accept_pending_file_reads_disk() {
        let mut p = std::env::temp_dir();
        p.push(format!("arcadia-media-{}.jpg", uuid::Uuid::new_v4()));
        std::fs::write(&p, b"jpeg").unwrap();
        let img = accept_pending_file(&p).expect("accepted");
        assert_eq!(&img.bytes[..], b"jpeg");
        assert_eq!(img.content_type, "image/jpeg");
        let _ = std::fs::remove_file(&p);
        assert!(accept_pending_file(&p).is_err());
    }
}
