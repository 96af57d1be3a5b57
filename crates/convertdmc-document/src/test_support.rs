// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory fixtures shared by the unit tests.

use std::path::PathBuf;

use convertdmc_core::EngineConfig;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::Document;

use crate::archive::write_archive;
use crate::convert::ConversionEngine;
use crate::pdf::{PdfRasterizer, PdfWriter};
use crate::raster::{ImageProcessor, multipage};

/// Smooth RGB gradient; survives JPEG with little loss.
pub fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    }))
}

pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
}

/// Average colour of an image.
pub fn mean_colour(image: &DynamicImage) -> [u8; 3] {
    mean_of(image.to_rgb8().as_raw(), 3)
}

pub fn colour_close(a: [u8; 3], b: [u8; 3], tolerance: u8) -> bool {
    a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= tolerance)
}

/// Average colour of the image drawn on `page_number` of `pdf`, decoding the
/// XObject whether it was stored as JPEG or deflated samples.
pub fn page_image_colour(pdf: &[u8], page_number: u32) -> [u8; 3] {
    let doc = Document::load_mem(pdf).unwrap();
    let page_id = doc.get_pages()[&page_number];
    let images = doc.get_page_images(page_id).unwrap();
    assert_eq!(images.len(), 1, "page {page_number} images");
    let embedded = &images[0];

    let filters = embedded.filters.clone().unwrap_or_default();
    if filters.iter().any(|filter| filter == "DCTDecode") {
        let decoded = image::load_from_memory_with_format(embedded.content, ImageFormat::Jpeg).unwrap();
        return mean_colour(&decoded);
    }

    let stream = doc.get_object(embedded.id).unwrap().as_stream().unwrap();
    let samples = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream.decompressed_content().unwrap()
    };
    let channels = match embedded.color_space.as_deref() {
        Some("DeviceGray") => 1,
        _ => 3,
    };
    mean_of(&samples, channels)
}

fn mean_of(samples: &[u8], channels: usize) -> [u8; 3] {
    let pixels = (samples.len() / channels).max(1) as u64;
    let mut sums = [0u64; 3];
    for pixel in samples.chunks_exact(channels) {
        for (channel, sum) in sums.iter_mut().enumerate() {
            *sum += u64::from(pixel[channel.min(channels - 1)]);
        }
    }
    sums.map(|sum| (sum / pixels) as u8)
}

pub fn frame_size(image: &DynamicImage) -> (u32, u32) {
    (image.width(), image.height())
}

pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    ImageProcessor::from_dynamic(image.clone())
        .to_png_bytes()
        .unwrap()
}

pub fn jpeg_bytes(image: &DynamicImage) -> Vec<u8> {
    ImageProcessor::from_dynamic(image.clone())
        .to_jpeg_bytes(90)
        .unwrap()
}

pub fn multi_frame_tiff(frames: &[DynamicImage]) -> Vec<u8> {
    multipage::write_frames(frames).unwrap()
}

/// A PDF with one blank-ish page per `(width, height)` in points.
pub fn pdf_with_pages(sizes: &[(u32, u32)]) -> Vec<u8> {
    let frames: Vec<DynamicImage> = sizes.iter().map(|&(w, h)| gradient(w, h)).collect();
    PdfWriter::new(72.0).create_from_images(&frames).unwrap()
}

/// A PDF whose pages are all `size` points square, one flat colour each.
pub fn pdf_with_colours(size: u32, colours: &[[u8; 3]]) -> Vec<u8> {
    let frames: Vec<DynamicImage> = colours.iter().map(|&rgb| solid(size, size, rgb)).collect();
    PdfWriter::new(72.0).create_from_images(&frames).unwrap()
}

pub fn zip_of(entries: Vec<(&str, Vec<u8>)>) -> Vec<u8> {
    write_archive(entries).unwrap()
}

/// An engine that can rasterise PDFs, or `None` (with a SKIP notice) when no
/// pdfium library is available to this test run.
pub fn engine_with_renderer() -> Option<ConversionEngine> {
    let config = EngineConfig {
        pdfium_library: std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from),
        ..EngineConfig::default()
    };

    let renderer = PdfRasterizer::new(config.raster_dpi).with_library(config.pdfium_library.clone());
    match renderer.render_pages(&pdf_with_pages(&[(10, 10)])) {
        Ok(_) => Some(ConversionEngine::new(config)),
        Err(err) => {
            eprintln!("SKIP: pdfium unavailable ({err})");
            None
        }
    }
}
