use anyhow::Context;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::constants::IMAGE_EXTENSIONS;
use crate::domain::AccountId;

const PROFILE_IMAGE_DIR: &str = "profile_images";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image must be {max_mb}MB or smaller")]
    TooLarge { max_mb: usize },

    #[error("File must be an image")]
    NotAnImage,

    #[error("Image is empty")]
    Empty,

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// Stores profile images on local disk under the uploads directory.
#[derive(Debug, Clone)]
pub struct ImageService {
    uploads_path: PathBuf,
    max_bytes: usize,
}

impl ImageService {
    #[must_use]
    pub fn new(uploads_path: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            uploads_path: uploads_path.into(),
            max_bytes,
        }
    }

    /// Checks size and type. Returns the normalized file extension.
    pub fn validate(
        &self,
        filename: &str,
        content_type: Option<&str>,
        len: usize,
    ) -> Result<String, ImageError> {
        if len == 0 {
            return Err(ImageError::Empty);
        }
        if len > self.max_bytes {
            return Err(ImageError::TooLarge {
                max_mb: self.max_bytes / (1024 * 1024),
            });
        }

        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
            .ok_or(ImageError::NotAnImage)?;

        let guessed_is_image = mime_guess::from_ext(&extension)
            .first()
            .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE);
        let declared_is_image =
            content_type.is_none_or(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"));

        if !guessed_is_image || !declared_is_image {
            return Err(ImageError::NotAnImage);
        }

        Ok(extension)
    }

    /// Writes the image and returns the stored path relative to the uploads
    /// directory.
    pub async fn save_profile_image(
        &self,
        account_id: AccountId,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String, ImageError> {
        let dir = self.uploads_path.join(PROFILE_IMAGE_DIR);
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let filename = format!("{account_id}_{}.{extension}", &suffix[..12]);
        let file_path = dir.join(&filename);

        fs::write(&file_path, bytes)
            .await
            .with_context(|| format!("Failed to write image to {}", file_path.display()))?;

        info!(account_id = %account_id, path = %file_path.display(), "Saved profile image");

        Ok(format!("{PROFILE_IMAGE_DIR}/{filename}"))
    }

    /// Best-effort removal of a previously stored image.
    pub async fn remove(&self, stored: &str) {
        let path = Path::new(stored);
        // Never follow a stored value outside the uploads directory.
        if path.is_absolute() || path.components().any(|c| c.as_os_str() == "..") {
            warn!(path = stored, "Refusing to remove image outside uploads directory");
            return;
        }

        let file_path = self.uploads_path.join(path);
        if let Err(e) = fs::remove_file(&file_path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %file_path.display(), error = %e, "Failed to remove old profile image");
        }
    }

    #[must_use]
    pub fn resolve(&self, stored: &str) -> PathBuf {
        self.uploads_path.join(stored)
    }
}
