//! Upload storage and post-processing for profile images and CVs.
//!
//! Uploads are sniffed by content (not by the client-supplied name or MIME
//! type) and written under `storage.upload_dir`. Resizing and size checks
//! run later in the `files` queue.

use std::io;
use std::path::{Component, Path, PathBuf};

use image::{imageops::FilterType, GenericImageView};
use thiserror::Error;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum FileProcessingError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File is empty")]
    Empty,

    #[error("File exceeds {max} bytes ({actual} bytes)")]
    TooLarge { actual: u64, max: u64 },

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl From<FileProcessingError> for ApiError {
    fn from(err: FileProcessingError) -> Self {
        match err {
            FileProcessingError::UnsupportedType(_) | FileProcessingError::Empty => {
                ApiError::Validation(err.to_string())
            }
            FileProcessingError::TooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Kind of upload accepted by the self-service endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    ProfileImage,
    Cv,
}

impl UploadKind {
    fn prefix(&self) -> &'static str {
        match self {
            UploadKind::ProfileImage => "profile",
            UploadKind::Cv => "cv",
        }
    }

    fn allowed(&self) -> &'static [&'static str] {
        match self {
            UploadKind::ProfileImage => &["image/jpeg", "image/png", "image/webp"],
            UploadKind::Cv => &["application/pdf"],
        }
    }
}

/// A file written to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path relative to the upload directory, `/`-separated.
    pub relative_path: String,
    pub mime_type: &'static str,
    pub size: u64,
}

/// Result of resizing a profile image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub width: u32,
    pub height: u32,
    pub thumbnail_path: PathBuf,
}

/// Detects the content type and checks it against the kind's allow-list.
/// Returns the MIME type and canonical extension.
pub fn sniff(kind: UploadKind, bytes: &[u8]) -> Result<(&'static str, &'static str), FileProcessingError> {
    if bytes.is_empty() {
        return Err(FileProcessingError::Empty);
    }

    let detected = infer::get(bytes)
        .ok_or_else(|| FileProcessingError::UnsupportedType("unknown".to_string()))?;

    if !kind.allowed().contains(&detected.mime_type()) {
        return Err(FileProcessingError::UnsupportedType(
            detected.mime_type().to_string(),
        ));
    }

    Ok((detected.mime_type(), detected.extension()))
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.upload_dir.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validates and writes an upload for a professional.
    pub async fn save(
        &self,
        kind: UploadKind,
        professional_id: Uuid,
        bytes: &[u8],
    ) -> Result<StoredFile, FileProcessingError> {
        let (mime_type, extension) = sniff(kind, bytes)?;

        let relative_path = format!(
            "professionals/{}/{}-{}.{}",
            professional_id,
            kind.prefix(),
            Uuid::new_v4().simple(),
            extension
        );
        let absolute = self.resolve(&relative_path)?;

        if let Some(parent) = absolute.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&absolute, bytes).await?;

        tracing::debug!(path = %relative_path, mime_type, size = bytes.len(), "Stored upload");

        Ok(StoredFile {
            relative_path,
            mime_type,
            size: bytes.len() as u64,
        })
    }

    /// Maps a stored relative path to an absolute one, refusing anything
    /// that would escape the upload directory.
    pub fn resolve(&self, relative_path: &str) -> Result<PathBuf, FileProcessingError> {
        let relative = Path::new(relative_path);
        let safe = !relative_path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !safe {
            return Err(FileProcessingError::InvalidPath(relative_path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    pub async fn remove(&self, relative_path: &str) -> Result<(), FileProcessingError> {
        let path = self.resolve(relative_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes a stored file together with the thumbnail generated for it.
    pub async fn remove_with_thumbnail(&self, relative_path: &str) -> Result<(), FileProcessingError> {
        self.remove(relative_path).await?;
        match thumbnail_path(Path::new(relative_path)).to_str() {
            Some(thumb) => self.remove(thumb).await,
            None => Ok(()),
        }
    }
}

/// `dir/name.ext` -> `dir/name_thumb.ext`
pub fn thumbnail_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_thumb.{}", stem, ext.to_string_lossy()),
        None => format!("{stem}_thumb"),
    };
    path.with_file_name(name)
}

/// Downscales an image in place so its longest side is at most
/// `max_dimension` and writes a thumbnail next to it. Blocking; run it on
/// the blocking pool.
pub fn process_image(
    path: &Path,
    max_dimension: u32,
    thumbnail_dimension: u32,
) -> Result<ProcessedImage, FileProcessingError> {
    let img = image::open(path)?;
    let (width, height) = img.dimensions();

    let resized = if width > max_dimension || height > max_dimension {
        let resized = img.resize(max_dimension, max_dimension, FilterType::Lanczos3);
        resized.save(path)?;
        resized
    } else {
        img
    };

    let thumbnail_path = thumbnail_path(path);
    resized
        .thumbnail(thumbnail_dimension, thumbnail_dimension)
        .save(&thumbnail_path)?;

    let (width, height) = resized.dimensions();
    Ok(ProcessedImage {
        width,
        height,
        thumbnail_path,
    })
}

/// Returns the file size, or `TooLarge` when it exceeds `max_bytes`.
pub async fn check_file_size(path: &Path, max_bytes: u64) -> Result<u64, FileProcessingError> {
    let size = tokio::fs::metadata(path).await?.len();
    if size > max_bytes {
        return Err(FileProcessingError::TooLarge {
            actual: size,
            max: max_bytes,
        });
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;
    use tempfile::TempDir;

    const PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\ntrailer\n<<>>\n%%EOF\n";

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb([200u8, 120, 40]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn store(dir: &TempDir) -> FileStore {
        FileStore::new(&StorageConfig {
            upload_dir: dir.path().to_path_buf(),
            ..StorageConfig::default()
        })
    }

    #[test]
    fn test_sniff_accepts_png_as_image() {
        let (mime, ext) = sniff(UploadKind::ProfileImage, &png_bytes(4, 4)).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(ext, "png");
    }

    #[test]
    fn test_sniff_rejects_pdf_as_image() {
        let err = sniff(UploadKind::ProfileImage, PDF).unwrap_err();
        assert!(matches!(err, FileProcessingError::UnsupportedType(m) if m == "application/pdf"));
    }

    #[test]
    fn test_sniff_cv_requires_pdf() {
        assert_eq!(sniff(UploadKind::Cv, PDF).unwrap().0, "application/pdf");
        assert!(sniff(UploadKind::Cv, &png_bytes(4, 4)).is_err());
        assert!(matches!(
            sniff(UploadKind::Cv, b""),
            Err(FileProcessingError::Empty)
        ));
        assert!(sniff(UploadKind::Cv, b"plain text, no magic").is_err());
    }

    #[test]
    fn test_resolve_refuses_traversal() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(store.resolve("professionals/a/b.png").is_ok());
        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("/etc/passwd").is_err());
        assert!(store.resolve("").is_err());
    }

    #[tokio::test]
    async fn test_save_writes_under_professional_dir() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let id = Uuid::new_v4();

        let stored = store.save(UploadKind::Cv, id, PDF).await.unwrap();
        assert!(stored
            .relative_path
            .starts_with(&format!("professionals/{id}/cv-")));
        assert!(stored.relative_path.ends_with(".pdf"));
        assert_eq!(stored.size, PDF.len() as u64);
        assert!(dir.path().join(&stored.relative_path).exists());

        store.remove(&stored.relative_path).await.unwrap();
        assert!(!dir.path().join(&stored.relative_path).exists());
        store.remove(&stored.relative_path).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_with_thumbnail() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let stored = store
            .save(UploadKind::ProfileImage, Uuid::new_v4(), &png_bytes(300, 200))
            .await
            .unwrap();
        let absolute = dir.path().join(&stored.relative_path);
        process_image(&absolute, 1024, 64).unwrap();
        assert!(thumbnail_path(&absolute).exists());

        store.remove_with_thumbnail(&stored.relative_path).await.unwrap();
        assert!(!absolute.exists());
        assert!(!thumbnail_path(&absolute).exists());
    }

    #[test]
    fn test_process_image_resizes_and_thumbnails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.png");
        std::fs::write(&path, png_bytes(1600, 800)).unwrap();

        let processed = process_image(&path, 800, 100).unwrap();
        assert_eq!((processed.width, processed.height), (800, 400));
        assert_eq!(processed.thumbnail_path, dir.path().join("profile_thumb.png"));

        let thumb = image::open(&processed.thumbnail_path).unwrap();
        assert!(thumb.width() <= 100 && thumb.height() <= 100);
        assert_eq!(image::open(&path).unwrap().width(), 800);
    }

    #[test]
    fn test_process_image_keeps_small_images() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("small.png");
        std::fs::write(&path, png_bytes(300, 200)).unwrap();

        let processed = process_image(&path, 800, 100).unwrap();
        assert_eq!((processed.width, processed.height), (300, 200));
    }

    #[tokio::test]
    async fn test_check_file_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cv.pdf");
        std::fs::write(&path, PDF).unwrap();

        assert_eq!(check_file_size(&path, 1024).await.unwrap(), PDF.len() as u64);
        let err = check_file_size(&path, 10).await.unwrap_err();
        assert!(matches!(err, FileProcessingError::TooLarge { max: 10, .. }));
    }

    #[test]
    fn test_thumbnail_path() {
        assert_eq!(
            thumbnail_path(Path::new("a/b/photo.webp")),
            PathBuf::from("a/b/photo_thumb.webp")
        );
        assert_eq!(thumbnail_path(Path::new("noext")), PathBuf::from("noext_thumb"));
    }
}
