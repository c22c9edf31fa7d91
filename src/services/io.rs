//! Image I/O operations service
//!
//! Separates file I/O from the edit pipeline, making the session testable
//! against in-memory images.

use crate::error::{EditorError, Result};
use crate::services::format::OutputFormatHandler;
use crate::types::RasterImage;
use std::path::{Path, PathBuf};

/// Service for handling image file input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Load and decode-validate an image from a file path
    ///
    /// # Examples
    /// ```rust,no_run
    /// use snapedit::services::ImageIOService;
    ///
    /// let image = ImageIOService::load_image("input.jpg")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<RasterImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(EditorError::file_io_error(
                "read image file",
                path_ref,
                std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        RasterImage::open(path_ref).map_err(|e| {
            log::debug!("failed to load {}: {}", path_ref.display(), e);
            e
        })
    }

    /// Write an image's encoded bytes to a file, creating parent directories
    pub fn save_image<P: AsRef<Path>>(image: &RasterImage, path: P) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    EditorError::file_io_error("create output directory", parent, e)
                })?;
            }
        }

        image.save(path_ref)
    }

    /// Derive an output path from the input path, suffix, and target format
    ///
    /// # Examples
    /// ```rust
    /// use snapedit::{services::ImageIOService, config::OutputFormat};
    /// use std::path::Path;
    ///
    /// let output = ImageIOService::derive_output_path(
    ///     Path::new("photos/cat.jpg"),
    ///     "edited",
    ///     OutputFormat::Png,
    /// );
    /// assert_eq!(output, Path::new("photos/cat_edited.png"));
    /// ```
    #[must_use]
    pub fn derive_output_path(
        input: &Path,
        suffix: &str,
        format: crate::config::OutputFormat,
    ) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let file_name = format!(
            "{}_{}.{}",
            stem,
            suffix,
            OutputFormatHandler::get_extension(format)
        );
        input.with_file_name(file_name)
    }
}
