/// File types the conversion backend accepts for upload.
const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Check a file locally before it is sent to the backend.
///
/// Rejections here never reach the network: the backend enforces the same
/// rules, so failing early saves a round trip for a guaranteed 400.
pub fn validate_upload(filename: &str, bytes: &[u8], max_bytes: u64) -> Result<(), UploadError> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => {
            return Err(UploadError::UnsupportedType {
                filename: filename.to_string(),
            })
        }
    }

    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }

    if bytes.len() as u64 > max_bytes {
        return Err(UploadError::TooLarge {
            size: bytes.len() as u64,
            max: max_bytes,
        });
    }

    // Extension alone is not trustworthy; confirm the magic bytes.
    image::guess_format(bytes).map_err(|_| UploadError::NotAnImage)?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("unsupported file type for '{filename}', expected png, jpg, jpeg or webp")]
    UnsupportedType { filename: String },

    #[error("file is empty")]
    Empty,

    #[error("file is {size} bytes, exceeding the {max} byte limit")]
    TooLarge { size: u64, max: u64 },

    #[error("file contents are not a recognizable image")]
    NotAnImage,
}
