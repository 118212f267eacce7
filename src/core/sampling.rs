//! Image decoding with power-of-two subsampling.
//!
//! The natural size of an image is read first (header only) and the
//! subsampling factor is derived from it. The decoder still produces the
//! full-resolution pixel buffer, which is then shrunk by that factor, so
//! peak memory is that of the natural-size image. Only the returned image
//! is bounded by the request.

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageReader};

/// Largest power-of-two factor `n` such that both halved source dimensions
/// divided by `n` still exceed the requested bounds.
///
/// Returns 1 when the source already fits inside the request.
pub fn calculate_in_sample_size(height: u32, width: u32, req_height: u32, req_width: u32) -> u32 {
    let mut in_sample_size = 1;

    if height > req_height || width > req_width {
        let half_height = height / 2;
        let half_width = width / 2;

        while half_height / in_sample_size > req_height && half_width / in_sample_size > req_width {
            in_sample_size *= 2;
        }
    }

    in_sample_size
}

/// Natural (width, height) from the image header, without decoding pixels
pub fn read_bounds(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
}

/// Decode `bytes`, subsampled towards `target` (width, height) when given
pub fn decode(bytes: &[u8], target: Option<(u32, u32)>) -> Result<DynamicImage, ImageError> {
    let sample_size = match target {
        Some((req_width, req_height)) => {
            let (width, height) = read_bounds(bytes)?;
            calculate_in_sample_size(height, width, req_height, req_width)
        }
        None => 1,
    };

    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;

    Ok(subsample(image, sample_size))
}

/// Decode an image file at its natural size
pub fn decode_file(path: &Path) -> Result<DynamicImage, ImageError> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}

/// Shrink by an integer factor; a factor of 1 returns the image untouched
pub fn subsample(image: DynamicImage, sample_size: u32) -> DynamicImage {
    if sample_size <= 1 {
        return image;
    }

    let width = image.width().div_ceil(sample_size).max(1);
    let height = image.height().div_ceil(sample_size).max(1);
    image.thumbnail_exact(width, height)
}

/// Scale `source` to cover `width` x `height` and crop the center.
/// An image already at that size is returned as is.
pub fn extract_thumbnail(source: DynamicImage, width: u32, height: u32) -> DynamicImage {
    if source.width() == width && source.height() == height {
        return source;
    }
    source.resize_to_fill(width, height, FilterType::Triangle)
}
