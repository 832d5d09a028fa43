//! Image loading with content-based type detection

use anviksha_core::ImagePayload;
use anviksha_llm::AnalysisError;
use std::path::Path;

/// Read an upload and accept it only if its content is JPEG or PNG.
///
/// The declared type comes from the file's magic bytes, never its extension.
pub fn load_image(path: &Path) -> Result<ImagePayload, AnalysisError> {
    let bytes = std::fs::read(path)
        .map_err(|e| AnalysisError::InvalidImage(format!("cannot read {}: {e}", path.display())))?;

    let unsupported = || {
        AnalysisError::InvalidImage(format!(
            "{} is not a supported image; please upload a JPEG or PNG file",
            path.display()
        ))
    };
    let mime_type = detect_mime_type(&bytes).ok_or_else(unsupported)?;
    let payload = ImagePayload::new(bytes, mime_type).map_err(|_| unsupported())?;
    if !payload.is_accepted_upload() {
        return Err(unsupported());
    }
    Ok(payload)
}

/// MIME type sniffed from the leading bytes
pub fn detect_mime_type(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes).map(|kind| kind.mime_type())
}
