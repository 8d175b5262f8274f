use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;

use crate::utils::errors::ApiError;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
/// URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Local directory holding uploaded photos.
#[derive(Clone, Debug)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        UploadStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Lower-cased extension of an accepted image file name.
    pub fn image_extension(original_name: &str) -> Result<String, ApiError> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "Formato de imagen no permitido ({}). Usa: {}",
                original_name,
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }
        Ok(extension)
    }

    /// `<unix-millis>-<9 random digits>.<ext>`
    pub fn generate_name(extension: &str) -> String {
        let suffix: u32 = rand::rng().random_range(100_000_000..1_000_000_000);
        format!("{}-{}.{}", Utc::now().timestamp_millis(), suffix, extension)
    }

    /// Writes the file and returns the public path it is served under.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, ApiError> {
        let extension = Self::image_extension(original_name)?;
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(too_large());
        }

        let name = Self::generate_name(&extension);
        tokio::fs::write(self.dir.join(&name), bytes)
            .await
            .map_err(|e| ApiError::InternalServerError(format!("No se pudo guardar el archivo: {}", e)))?;

        Ok(format!("{}/{}", PUBLIC_PREFIX, name))
    }

    /// Best effort; files outside the upload directory are never touched.
    pub async fn remove(&self, public_path: &str) {
        let Some(name) = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && *name != "..")
        else {
            return;
        };

        if let Err(e) = tokio::fs::remove_file(self.dir.join(name)).await {
            log::warn!("Could not remove upload {}: {}", public_path, e);
        }
    }
}

pub fn too_large() -> ApiError {
    ApiError::BadRequest(format!(
        "La imagen supera el tamaño máximo de {} MB",
        MAX_UPLOAD_BYTES / (1024 * 1024)
    ))
}
