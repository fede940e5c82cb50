//! Avatar pipeline: accept a small JPEG or PNG upload, normalise it to a 250×250 PNG.

use std::io::Cursor;

use image::imageops::FilterType;
use image::ImageOutputFormat;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

/// Largest accepted upload, in bytes.
pub const MAX_AVATAR_BYTES: usize = 1_000_000;
/// Width and height of every stored avatar.
pub const AVATAR_SIZE: u32 = 250;
/// Content type of stored avatars.
pub const AVATAR_CONTENT_TYPE: &str = "image/png";

lazy_static! {
    static ref IMAGE_FILENAME: Regex =
        Regex::new(r"(?i)\.(jpg|jpeg|png)$").expect("avatar filename pattern is valid");
}

pub fn check_filename(filename: &str) -> Result<(), AppError> {
    if IMAGE_FILENAME.is_match(filename) {
        Ok(())
    } else {
        Err(AppError::Media(
            "Please upload an image file (.jpg, .jpeg, .png only)".into(),
        ))
    }
}

pub fn check_size(len: usize) -> Result<(), AppError> {
    if len > MAX_AVATAR_BYTES {
        return Err(AppError::Media(format!(
            "File too large: the limit is {} bytes",
            MAX_AVATAR_BYTES
        )));
    }
    Ok(())
}

/// Decodes `bytes`, resizes to `AVATAR_SIZE` square and re-encodes as PNG.
///
/// CPU-bound; call it from a blocking context.
pub fn process_avatar(bytes: &[u8]) -> Result<Vec<u8>, AppError> {
    check_size(bytes.len())?;
    let image = image::load_from_memory(bytes)?;
    let resized = image.resize_exact(AVATAR_SIZE, AVATAR_SIZE, FilterType::Triangle);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, ImageOutputFormat::Png)
        .map_err(|e| AppError::InternalServerError(format!("Failed to encode avatar: {}", e)))?;
    Ok(out.into_inner())
}
