//! Multipart file validation: MIME allow-list, per-category size ceilings,
//! filename sanitization, and image magic-number sniffing.

use crate::errors::{AppError, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Image,
    Document,
    Text,
}

impl FileCategory {
    pub fn max_bytes(self) -> usize {
        match self {
            Self::Image => 5 * 1024 * 1024,
            Self::Document => 10 * 1024 * 1024,
            Self::Text => 1024 * 1024,
        }
    }
}

/// Accepted MIME types and their canonical extensions.
fn category_for(content_type: &str) -> Option<(FileCategory, &'static str)> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some((FileCategory::Image, "jpg")),
        "image/png" => Some((FileCategory::Image, "png")),
        "image/gif" => Some((FileCategory::Image, "gif")),
        "image/webp" => Some((FileCategory::Image, "webp")),
        "application/pdf" => Some((FileCategory::Document, "pdf")),
        "text/plain" => Some((FileCategory::Text, "txt")),
        _ => None,
    }
}

const MAX_FILENAME_LEN: usize = 100;

/// Strip path components, replace disallowed characters, clamp length.
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);

    let mut sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Never emit a bare dot-name after stripping
    if sanitized.trim_matches(['.', '_']).is_empty() {
        sanitized = "file".to_string();
    }

    if sanitized.len() > MAX_FILENAME_LEN {
        sanitized.truncate(MAX_FILENAME_LEN);
    }

    sanitized
}

/// First-bytes signature check for the image formats we accept.
/// JPEG `FF D8`, PNG `89 50`, GIF `47 49`, WEBP has `WEBP` at offset 8.
fn image_magic_matches(extension: &str, data: &[u8]) -> bool {
    match extension {
        "jpg" => data.starts_with(&[0xFF, 0xD8]),
        "png" => data.starts_with(&[0x89, 0x50]),
        "gif" => data.starts_with(&[0x47, 0x49]),
        "webp" => data.len() >= 12 && &data[8..12] == b"WEBP",
        _ => false,
    }
}

#[derive(Debug)]
pub struct ValidatedUpload {
    pub filename: String,
    pub content_type: String,
    pub extension: &'static str,
    pub category: FileCategory,
}

/// Validate a single uploaded part against the allow-list, the category size
/// ceiling, and (for images) the declared type against the actual bytes.
pub fn validate_upload(
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> Result<ValidatedUpload, AppError> {
    let (category, extension) = category_for(content_type).ok_or_else(|| {
        AppError::new(
            ErrorCode::InvalidFileType,
            format!("unsupported file type: {content_type}"),
        )
    })?;

    if data.len() > category.max_bytes() {
        return Err(AppError::new(
            ErrorCode::FileTooLarge,
            format!(
                "file exceeds the {} byte limit for this type",
                category.max_bytes()
            ),
        ));
    }

    if category == FileCategory::Image && !image_magic_matches(extension, data) {
        return Err(AppError::new(
            ErrorCode::FileContentMismatch,
            format!("file content does not match declared type {content_type}"),
        ));
    }

    Ok(ValidatedUpload {
        filename: sanitize_filename(filename),
        content_type: content_type.to_string(),
        extension,
        category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_png() {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47];
        data.extend_from_slice(&[0u8; 64]);
        let upload = validate_upload("avatar.png", "image/png", &data).unwrap();
        assert_eq!(upload.extension, "png");
        assert_eq!(upload.category, FileCategory::Image);
    }

    #[test]
    fn rejects_png_with_wrong_magic() {
        // Declared image/png but first two bytes are not 0x89 0x50
        let data = vec![0xFF, 0xD8, 0xFF, 0xE0];
        let err = validate_upload("fake.png", "image/png", &data).unwrap_err();
        match err {
            AppError::Known { code, .. } => assert_eq!(code, ErrorCode::FileContentMismatch),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_6mb_image() {
        let mut data = vec![0xFF, 0xD8];
        data.resize(6 * 1024 * 1024, 0);
        let err = validate_upload("big.jpg", "image/jpeg", &data).unwrap_err();
        match err {
            AppError::Known { code, .. } => assert_eq!(code, ErrorCode::FileTooLarge),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_mime() {
        let err = validate_upload("x.exe", "application/x-msdownload", &[0u8; 4]).unwrap_err();
        match err {
            AppError::Known { code, .. } => assert_eq!(code, ErrorCode::InvalidFileType),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn webp_signature_checked_at_offset_8() {
        let mut data = b"RIFF\x00\x00\x00\x00WEBPVP8 ".to_vec();
        data.extend_from_slice(&[0u8; 16]);
        assert!(validate_upload("pic.webp", "image/webp", &data).is_ok());

        let bad = b"RIFF\x00\x00\x00\x00WAVE".to_vec();
        assert!(validate_upload("pic.webp", "image/webp", &bad).is_err());
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_filename("..\\..\\boot.ini"), "boot.ini");
        assert_eq!(sanitize_filename("..."), "file");

        let long = "a".repeat(300);
        assert_eq!(sanitize_filename(&long).len(), 100);
    }
}
