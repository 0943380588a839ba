use axum::body::Bytes;
use axum::extract::Multipart;

use crate::error::ApiError;

/// Form field the upload page posts the file under.
pub const DOCUMENT_FIELD: &str = "document";

/// The file part of an upload, before validation.
pub struct UploadedFile {
    /// Name as sent by the client (unsanitized, possibly empty).
    pub filename: String,
    pub data: Bytes,
}

/// Reads the first `document` field of the form; other fields are skipped.
pub async fn read_document_field(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(DOCUMENT_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        return Ok(UploadedFile { filename, data });
    }

    Err(ApiError::NoFilePart)
}

/// Reduces a client-supplied file name to a safe single path component.
///
/// Path separators become spaces, whitespace runs become `_`, anything outside
/// `[A-Za-z0-9_.-]` is dropped, and leading/trailing `.` and `_` are stripped.
/// May return an empty string.
pub fn sanitize_filename(filename: &str) -> String {
    let separated = filename.replace(['/', '\\'], " ");
    let joined = separated.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    kept.trim_matches(['.', '_']).to_string()
}
