// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decode a single still image, normalise its colour model,
// and encode it as JPEG, PNG or single-frame TIFF using the `image` crate.

use std::io::Cursor;

use convertdmc_core::error::{ConvertError, Result};
use image::{DynamicImage, ImageFormat};
use tracing::{debug, instrument};

/// A single in-memory still image on its way to another format.
///
/// Transformations consume `self` and return a new `ImageProcessor`, so calls
/// chain:
///
/// ```ignore
/// let jpeg = ImageProcessor::from_bytes(&upload)?
///     .normalize_rgb()
///     .to_jpeg_bytes(75)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw bytes in any still-image format the `image` crate recognises.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| ConvertError::decode("still image", err))?;
        debug!(
            width = img.width(),
            height = img.height(),
            color = ?img.color(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Convert to 8-bit RGB, dropping alpha, palette and grayscale layouts.
    pub fn normalize_rgb(self) -> Self {
        match self.image {
            DynamicImage::ImageRgb8(_) => self,
            other => Self {
                image: DynamicImage::ImageRgb8(other.to_rgb8()),
            },
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png, "PNG image")
    }

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| ConvertError::encode("JPEG image", err))?;
        Ok(buffer)
    }

    /// Encode the current image as a single-frame TIFF, keeping its pixels.
    ///
    /// Colour models the TIFF encoder cannot store are widened first: gray+alpha
    /// becomes RGBA, floating point becomes 16-bit.
    pub fn to_tiff_bytes(&self) -> Result<Vec<u8>> {
        match tiff_compatible(&self.image) {
            Some(widened) => {
                debug!(from = ?self.image.color(), to = ?widened.color(), "Widening for TIFF");
                encode_to_format(&widened, ImageFormat::Tiff, "TIFF image")
            }
            None => encode_to_format(&self.image, ImageFormat::Tiff, "TIFF image"),
        }
    }
}

/// The nearest layout the TIFF encoder accepts, or `None` if `image` already is one.
fn tiff_compatible(image: &DynamicImage) -> Option<DynamicImage> {
    match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba8(_)
        | DynamicImage::ImageRgba16(_) => None,
        DynamicImage::ImageLumaA8(_) => Some(DynamicImage::ImageRgba8(image.to_rgba8())),
        DynamicImage::ImageRgb32F(_) => Some(DynamicImage::ImageRgb16(image.to_rgb16())),
        _ => Some(DynamicImage::ImageRgba16(image.to_rgba16())),
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(
    image: &DynamicImage,
    format: ImageFormat,
    target: &'static str,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| ConvertError::encode(target, err))?;
    Ok(buffer)
}
