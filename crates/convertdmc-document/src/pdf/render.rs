// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF rasteriser: render every page of a PDF to an RGB bitmap via pdfium.

use std::path::PathBuf;

use convertdmc_core::error::{ConvertError, Result};
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info, instrument};

/// Renders PDF pages to bitmaps at a fixed resolution.
///
/// The pdfium shared library is bound per call. When no explicit library path
/// is configured the system search path is used.
#[derive(Debug, Clone)]
pub struct PdfRasterizer {
    dpi: u16,
    library: Option<PathBuf>,
}

impl PdfRasterizer {
    pub fn new(dpi: u16) -> Self {
        Self { dpi, library: None }
    }

    /// Bind to the pdfium library at `path` instead of searching for it.
    pub fn with_library(mut self, path: Option<PathBuf>) -> Self {
        self.library = path;
        self
    }

    fn bind(&self) -> Result<Pdfium> {
        let bindings = match &self.library {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|err| ConvertError::Internal(format!("PDF renderer unavailable: {err}")))?;

        Ok(Pdfium::new(bindings))
    }

    /// Render every page, in page order, to an 8-bit RGB image.
    #[instrument(skip_all, fields(bytes_len = data.len(), dpi = self.dpi))]
    pub fn render_pages(&self, data: &[u8]) -> Result<Vec<DynamicImage>> {
        if self.dpi == 0 {
            return Err(ConvertError::encode(
                "page bitmap",
                "rendering resolution must be positive",
            ));
        }

        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(data, None)
            .map_err(|err| ConvertError::decode("PDF document", format!("{err:?}")))?;

        let render_config =
            PdfRenderConfig::new().scale_page_by_factor(f32::from(self.dpi) / 72.0);

        let pages = document.pages();
        info!(pages = pages.len(), "Rasterising PDF");

        let mut frames = Vec::with_capacity(usize::from(pages.len()));
        for (index, page) in pages.iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|err| {
                ConvertError::encode("page bitmap", format!("page {}: {err:?}", index + 1))
            })?;

            let frame = DynamicImage::ImageRgb8(bitmap.as_image().to_rgb8());
            debug!(
                page = index + 1,
                width = frame.width(),
                height = frame.height(),
                "Page rendered"
            );
            frames.push(frame);
        }

        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::PdfWriter;
    use image::{Rgb, RgbImage};

    /// A rasteriser bound the same way the engine binds it, or `None` when no
    /// pdfium library can be found on this machine.
    fn available() -> Option<PdfRasterizer> {
        let rasterizer = PdfRasterizer::new(144)
            .with_library(std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));
        match rasterizer.bind() {
            Ok(_) => Some(rasterizer),
            Err(err) => {
                eprintln!("SKIP: {err}");
                None
            }
        }
    }

    #[test]
    fn renders_each_page_at_the_requested_resolution() {
        let Some(rasterizer) = available() else {
            return;
        };

        let frames = vec![
            DynamicImage::ImageRgb8(RgbImage::from_pixel(72, 36, Rgb([255, 0, 0]))),
            DynamicImage::ImageRgb8(RgbImage::from_pixel(36, 72, Rgb([0, 0, 255]))),
        ];
        let pdf = PdfWriter::new(72.0).create_from_images(&frames).unwrap();

        let pages = rasterizer.render_pages(&pdf).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!((pages[0].width(), pages[0].height()), (144, 72));
        assert_eq!((pages[1].width(), pages[1].height()), (72, 144));

        let centre = pages[0].to_rgb8().get_pixel(72, 36).0;
        assert!(centre[0] > 200 && centre[2] < 60, "got {centre:?}");
    }

    #[test]
    fn missing_library_is_internal() {
        let rasterizer =
            PdfRasterizer::new(72).with_library(Some(PathBuf::from("/nonexistent/libpdfium.so")));
        let err = rasterizer.render_pages(b"%PDF-1.4").err().unwrap();
        assert!(matches!(err, ConvertError::Internal(_)));
    }
}
