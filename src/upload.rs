//! Photo upload: image files in, `data:` URIs out.
//!
//! Images are stored verbatim. Decoding only sniffs the format and reads the
//! header so that non-images are rejected before they reach the store; pixels
//! are never resized or re-encoded.
//!
//! ## Concurrency
//!
//! [`decode_all`] decodes files on the rayon pool and reports each result as
//! an [`UploadEvent`] on a channel. Results arrive in completion order, not
//! argument order. The receiving side (the journal's owning thread) appends
//! each decoded image as it arrives and re-renders after every one; nothing
//! else touches the store from the workers.

use base64::prelude::*;
use image::ImageReader;
use rayon::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

/// Extensions picked up when expanding directories.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Not an image: {0}")]
    NotAnImage(PathBuf),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
}

/// An uploaded image ready to become a photo record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub source: PathBuf,
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
pub enum UploadEvent {
    Decoded(DecodedImage),
    Failed(UploadError),
}

/// Expand directories (recursively) into the image files they contain.
/// Plain file arguments are kept as given, image or not; decoding decides.
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file() && has_image_extension(e.path()))
                .map(|e| e.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// Read and validate one image file.
pub fn decode_image(path: &Path) -> Result<DecodedImage, UploadError> {
    let bytes = std::fs::read(path).map_err(|source| UploadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_bytes(&bytes, path)
}

/// Validate image bytes and wrap them in a `data:` URI.
pub fn decode_bytes(bytes: &[u8], source: &Path) -> Result<DecodedImage, UploadError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| UploadError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;
    let format = reader
        .format()
        .ok_or_else(|| UploadError::NotAnImage(source.to_path_buf()))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| UploadError::Decode {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;
    let data_uri = format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        BASE64_STANDARD.encode(bytes)
    );
    Ok(DecodedImage {
        source: source.to_path_buf(),
        data_uri,
        width,
        height,
    })
}

/// Decode every file in parallel, sending one event per file.
pub fn decode_all(paths: &[PathBuf], events: Sender<UploadEvent>) {
    paths.par_iter().for_each_with(events, |tx, path| {
        let event = match decode_image(path) {
            Ok(decoded) => UploadEvent::Decoded(decoded),
            Err(e) => UploadEvent::Failed(e),
        };
        // Receiver gone means nobody wants the result
        let _ = tx.send(event);
    });
}
