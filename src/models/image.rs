use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::TempPath;

use crate::error::{PollenError, Result};

pub const DEFAULT_MODEL: &str = "flux";
pub const DEFAULT_DIMENSION: u32 = 1024;

/// Everything the caller chooses for one generation attempt. The seed is
/// not part of the request: a fresh one is drawn inside the client on every
/// invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub model: String,
    pub reference_image: Option<String>,
    pub api_key: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        GenerationRequest {
            prompt: prompt.into(),
            width: DEFAULT_DIMENSION,
            height: DEFAULT_DIMENSION,
            model: DEFAULT_MODEL.to_string(),
            reference_image: None,
            api_key: None,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_reference_image(mut self, url: impl Into<String>) -> Self {
        self.reference_image = Some(url.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// The prompt with surrounding whitespace removed, or `None` when
    /// nothing remains. Requests are only issued for `Some`.
    pub fn trimmed_prompt(&self) -> Option<&str> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            None
        } else {
            Some(prompt)
        }
    }

    /// The request-level key, trimmed; empty strings count as no key.
    pub fn trimmed_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// A generated payload spooled to a private temp file. The backing file is
/// removed when the handle drops, so replacing a displayed handle releases
/// the old resource on every exit path.
#[derive(Debug)]
pub struct ImageHandle {
    path: TempPath,
    content_type: Option<String>,
    len: u64,
}

impl ImageHandle {
    pub fn from_bytes(bytes: &[u8], content_type: Option<String>) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("rpollen-")
            .tempfile()
            .map_err(|e| PollenError::Io(format!("Failed to create image spool file: {}", e)))?;
        file.write_all(bytes)
            .map_err(|e| PollenError::Io(format!("Failed to spool image payload: {}", e)))?;
        file.flush()
            .map_err(|e| PollenError::Io(format!("Failed to flush image payload: {}", e)))?;

        Ok(ImageHandle {
            path: file.into_temp_path(),
            content_type,
            len: bytes.len() as u64,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// File extension derived from the reported content type. The service
    /// serves PNG unless asked otherwise, so that is the default.
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_deref() {
            Some(kind) if kind.starts_with("image/jpeg") => "jpg",
            Some(kind) if kind.starts_with("image/webp") => "webp",
            Some(kind) if kind.starts_with("image/gif") => "gif",
            _ => "png",
        }
    }

    /// Copy the payload to `dest`, creating missing parent directories.
    pub fn save_to(&self, dest: impl AsRef<Path>) -> Result<u64> {
        let dest = dest.as_ref();
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    PollenError::Io(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }
        fs::copy(&self.path, dest)
            .map_err(|e| PollenError::Io(format!("Failed to save image to {}: {}", dest.display(), e)))
    }
}

/// Successful outcome of one generation attempt.
#[derive(Debug)]
pub struct GeneratedImage {
    pub handle: ImageHandle,
    pub seed: u32,
    pub model: String,
}

impl GeneratedImage {
    /// Default download name, `rpollen-<seed>.<ext>`.
    pub fn suggested_filename(&self) -> String {
        format!("rpollen-{}.{}", self.seed, self.handle.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let request = GenerationRequest::new("a cat");
        assert_eq!(request.width, 1024);
        assert_eq!(request.height, 1024);
        assert_eq!(request.model, "flux");
        assert!(request.reference_image.is_none());
        assert!(request.api_key.is_none());
    }

    #[test]
    fn whitespace_prompt_trims_to_none() {
        assert_eq!(GenerationRequest::new("   \t ").trimmed_prompt(), None);
        assert_eq!(GenerationRequest::new(" a cat ").trimmed_prompt(), Some("a cat"));
    }

    #[test]
    fn blank_request_key_counts_as_absent() {
        let request = GenerationRequest::new("x").with_api_key("  ");
        assert_eq!(request.trimmed_api_key(), None);
    }

    #[test]
    fn handle_releases_backing_file_on_drop() {
        let handle = ImageHandle::from_bytes(b"payload", None).unwrap();
        let path = handle.path().to_path_buf();
        assert!(path.exists());
        drop(handle);
        assert!(!path.exists());
    }

    #[test]
    fn save_to_copies_payload_and_creates_parents() {
        let handle = ImageHandle::from_bytes(b"\x89PNG-ish", Some("image/png".into())).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested/out.png");

        let written = handle.save_to(&dest).unwrap();
        assert_eq!(written, 8);
        assert_eq!(fs::read(&dest).unwrap(), b"\x89PNG-ish");
    }

    #[test]
    fn extension_follows_content_type() {
        let jpeg = ImageHandle::from_bytes(b"j", Some("image/jpeg".into())).unwrap();
        assert_eq!(jpeg.extension(), "jpg");
        let unknown = ImageHandle::from_bytes(b"?", None).unwrap();
        assert_eq!(unknown.extension(), "png");
    }

    #[test]
    fn suggested_filename_uses_seed_and_extension() {
        let image = GeneratedImage {
            handle: ImageHandle::from_bytes(b"w", Some("image/webp".into())).unwrap(),
            seed: 424242,
            model: "flux".to_string(),
        };
        assert_eq!(image.suggested_filename(), "rpollen-424242.webp");
    }
}
