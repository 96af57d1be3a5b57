// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: turn a sequence of raster frames into a paginated PDF with
// `printpdf` 0.8.
//
// Each frame is registered once as an image XObject and drawn by a single
// `Op::UseXobject` on a page cut to the frame's size, so nothing is scaled or
// letterboxed.

use convertdmc_core::error::{ConvertError, Result};
use image::DynamicImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

/// Points per inch, the PDF user-space unit.
const POINTS_PER_INCH: f32 = 72.0;

/// Millimetres per inch.
const MM_PER_INCH: f32 = 25.4;

/// Creates PDF documents with one full-bleed image per page.
///
/// Each page is sized to its image at the writer's resolution, so a frame at
/// 72 DPI becomes a page with one point per pixel.
pub struct PdfWriter {
    /// Resolution the images are placed at.
    dpi: f32,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl PdfWriter {
    /// Create a new writer placing images at `dpi`.
    pub fn new(dpi: f32) -> Self {
        Self {
            dpi,
            title: "ConvertDMC".into(),
        }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Page size in points for an image of `width` x `height` pixels.
    pub fn page_size_pt(&self, width: u32, height: u32) -> (f32, f32) {
        (
            width as f32 / self.dpi * POINTS_PER_INCH,
            height as f32 / self.dpi * POINTS_PER_INCH,
        )
    }

    /// Create a PDF with one page per frame, in the order given.
    ///
    /// Frames are embedded as 8-bit RGB. An empty slice is refused rather than
    /// producing a document without pages.
    #[instrument(skip_all, fields(frames = frames.len(), dpi = self.dpi))]
    pub fn create_from_images(&self, frames: &[DynamicImage]) -> Result<Vec<u8>> {
        if frames.is_empty() {
            return Err(ConvertError::EmptyResult(
                "no images to place in the PDF".into(),
            ));
        }
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(ConvertError::encode(
                "PDF document",
                format!("invalid page resolution {}", self.dpi),
            ));
        }

        info!(title = %self.title, "Creating image PDF");

        let mut doc = PdfDocument::new(&self.title);
        let mut pages: Vec<PdfPage> = Vec::with_capacity(frames.len());

        for (index, frame) in frames.iter().enumerate() {
            let rgb = frame.to_rgb8();
            let (width, height) = rgb.dimensions();
            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let (page_w_pt, page_h_pt) = self.page_size_pt(width, height);
            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: Some(1.0),
                    scale_y: Some(1.0),
                    dpi: Some(self.dpi),
                    rotate: None,
                },
            }];

            debug!(index, width, height, page_w_pt, page_h_pt, "Image placed on page");
            pages.push(PdfPage::new(pt_to_mm(page_w_pt), pt_to_mm(page_h_pt), ops));
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(
            pages = frames.len(),
            warnings = warnings.len(),
            output_bytes = output.len(),
            "PDF serialised"
        );

        Ok(output)
    }
}

fn pt_to_mm(points: f32) -> Mm {
    Mm(points / POINTS_PER_INCH * MM_PER_INCH)
}
