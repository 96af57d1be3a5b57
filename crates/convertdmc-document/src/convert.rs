// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion engine: one decode → transform → encode strategy per operation.
//
// Every call works on its own buffers and returns a tagged outcome: either a
// finished `Output` or a `Failure` describing what went wrong. Codec panics are
// caught here and reported like any other failure.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use convertdmc_core::error::{ConvertError, Result};
use convertdmc_core::{ConversionResult, EngineConfig, Failure, Operation, Output};
use image::DynamicImage;
use sha2::{Digest, Sha256};
use tracing::{debug, info, info_span, warn};

use crate::archive::{ImageArchive, write_archive};
use crate::pdf::{PdfRasterizer, PdfReader, PdfWriter};
use crate::raster::{FrameReader, ImageProcessor, multipage};

/// How far into the input a PDF header may start.
const PDF_HEADER_WINDOW: usize = 1024;

/// Runs conversions with a fixed [`EngineConfig`].
///
/// Holds no per-call state, so one engine can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct ConversionEngine {
    config: EngineConfig,
}

impl ConversionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Convert `input` with the operation named `operation`.
    ///
    /// The name must match an [`Operation`] identifier exactly.
    pub fn convert(&self, operation: &str, input: &[u8]) -> ConversionResult {
        let operation: Operation = operation.parse().map_err(|err: ConvertError| {
            warn!(requested = operation, "Unknown operation");
            Failure::from(err)
        })?;
        self.convert_operation(operation, input)
    }

    /// Convert `input` with an already-parsed operation.
    pub fn convert_operation(&self, operation: Operation, input: &[u8]) -> ConversionResult {
        let started = Instant::now();
        match self.run(operation, input) {
            Ok(output) => {
                info!(
                    %operation,
                    input_bytes = input.len(),
                    output_bytes = output.bytes.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Conversion finished"
                );
                Ok(output)
            }
            Err(err) => {
                warn!(%operation, kind = ?err.kind(), error = %err, "Conversion failed");
                Err(err.into())
            }
        }
    }

    /// Run a parsed operation, keeping the typed error.
    ///
    /// A panic inside a codec is caught and returned as
    /// [`ConvertError::Internal`].
    pub fn run(&self, operation: Operation, input: &[u8]) -> Result<Output> {
        catch_unwind(AssertUnwindSafe(|| self.execute(operation, input))).unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            warn!(%operation, panic = %message, "Codec panicked");
            Err(ConvertError::Internal(message))
        })
    }

    fn execute(&self, operation: Operation, input: &[u8]) -> Result<Output> {
        let span = info_span!(
            "convert",
            %operation,
            input_sha256 = %format!("{:x}", Sha256::digest(input))
        );
        let _entered = span.enter();

        let bytes = match operation {
            Operation::JpgToTif => self.jpg_to_tif(input)?,
            Operation::TifToPdf => self.tif_to_pdf(input)?,
            Operation::TifToJpg => self.tif_to_jpg(input)?,
            Operation::PdfToTif => self.pdf_to_tif(input)?,
            Operation::SplitPdf => self.split_pdf(input)?,
            Operation::ZipImagesToPdf => self.zip_images_to_pdf(input)?,
        };

        if bytes.is_empty() {
            return Err(ConvertError::encode(
                operation.output_type().mime_type(),
                "encoder produced no bytes",
            ));
        }
        Ok(Output::for_operation(operation, bytes))
    }

    // -- Strategies -----------------------------------------------------------

    fn jpg_to_tif(&self, input: &[u8]) -> Result<Vec<u8>> {
        ImageProcessor::from_bytes(input)?.to_tiff_bytes()
    }

    fn tif_to_pdf(&self, input: &[u8]) -> Result<Vec<u8>> {
        let frames = FrameReader::new(input)?
            .map(|frame| frame.map(normalize))
            .collect::<Result<Vec<_>>>()?;

        if frames.is_empty() {
            return Err(ConvertError::EmptyResult(
                "the image contains no frames".into(),
            ));
        }
        debug!(frames = frames.len(), "Frames collected");

        self.page_writer().create_from_images(&frames)
    }

    fn tif_to_jpg(&self, input: &[u8]) -> Result<Vec<u8>> {
        let frame = multipage::first_frame(input)?;
        ImageProcessor::from_dynamic(frame)
            .normalize_rgb()
            .to_jpeg_bytes(self.config.jpeg_quality)
    }

    fn pdf_to_tif(&self, input: &[u8]) -> Result<Vec<u8>> {
        if !has_pdf_header(input) {
            return Err(ConvertError::decode("PDF document", "missing %PDF header"));
        }

        let rasterizer = PdfRasterizer::new(self.config.raster_dpi)
            .with_library(self.config.pdfium_library.clone());
        let pages: Vec<DynamicImage> = rasterizer
            .render_pages(input)?
            .into_iter()
            .map(normalize)
            .collect();

        if pages.is_empty() {
            return Err(ConvertError::EmptyResult("the PDF has no pages".into()));
        }
        multipage::write_frames(&pages)
    }

    fn split_pdf(&self, input: &[u8]) -> Result<Vec<u8>> {
        let reader = PdfReader::from_bytes(input)?;
        if reader.page_count() == 0 {
            return Err(ConvertError::EmptyResult("the PDF has no pages".into()));
        }

        let members = reader
            .split_pages()?
            .into_iter()
            .enumerate()
            .map(|(index, page)| (format!("pagina_{}.pdf", index + 1), page));
        write_archive(members)
    }

    fn zip_images_to_pdf(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut archive = ImageArchive::from_bytes(input)?;
        let names = archive.image_members();
        debug!(
            images = names.len(),
            skipped = archive.member_count().saturating_sub(names.len()),
            "Archive members filtered"
        );

        if names.is_empty() {
            return Err(ConvertError::EmptyResult(
                "no recognized images found in the archive".into(),
            ));
        }

        let mut pages = Vec::with_capacity(names.len());
        for name in &names {
            let data = archive.read_member(name)?;
            let image = image::load_from_memory(&data)
                .map_err(|err| ConvertError::decode("still image", format!("{name}: {err}")))?;
            debug!(member = %name, width = image.width(), height = image.height(), "Member decoded");
            pages.push(normalize(image));
        }

        self.page_writer().create_from_images(&pages)
    }

    fn page_writer(&self) -> PdfWriter {
        let mut writer = PdfWriter::new(self.config.page_dpi);
        writer.set_title(self.config.pdf_title.clone());
        writer
    }
}

/// Convert with the default [`EngineConfig`].
pub fn convert(operation: &str, input: &[u8]) -> ConversionResult {
    ConversionEngine::default().convert(operation, input)
}

fn normalize(image: DynamicImage) -> DynamicImage {
    ImageProcessor::from_dynamic(image)
        .normalize_rgb()
        .into_dynamic()
}

fn has_pdf_header(data: &[u8]) -> bool {
    data[..data.len().min(PDF_HEADER_WINDOW)]
        .windows(5)
        .any(|window| window == b"%PDF-")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into());
    format!("codec panicked: {detail}")
}
