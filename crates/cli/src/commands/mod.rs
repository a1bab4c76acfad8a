//! CLI subcommand implementations.

use std::path::Path;

use base64::Engine as _;
use tracing::debug;

pub mod ask;
pub mod chat;
pub mod engine_status;
pub mod onboard;

/// Read an image file and base64-encode it for the vision model.
pub(crate) fn read_image_base64(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("cannot read image {}: {e}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Image encoded for the vision model");
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn read_image_base64_encodes_file_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"fake png bytes").unwrap();

        let b64 = read_image_base64(file.path()).unwrap();

        assert_eq!(b64, "ZmFrZSBwbmcgYnl0ZXM=");
    }

    #[test]
    fn read_image_base64_names_the_missing_path() {
        let err = read_image_base64(Path::new("/no/such/image.png")).unwrap_err();

        assert!(err.to_string().contains("/no/such/image.png"));
    }
}
