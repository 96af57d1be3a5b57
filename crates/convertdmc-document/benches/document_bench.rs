// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the convertdmc-document crate: the TIFF → PDF and
// ZIP of images → PDF conversions on small synthetic inputs.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use convertdmc_document::ConversionEngine;
use convertdmc_document::archive::write_archive;
use convertdmc_document::raster::{ImageProcessor, multipage};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A 200x150 RGB frame with a diagonal ramp, shifted by `seed` so frames differ.
fn frame(seed: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(200, 150, |x, y| {
        Rgb([(x as u8).wrapping_add(seed), (y as u8).wrapping_add(seed), 96])
    }))
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Four-frame TIFF to a four-page PDF.
fn bench_tif_to_pdf(c: &mut Criterion) {
    let frames: Vec<DynamicImage> = (0..4).map(|i| frame(i * 40)).collect();
    let Ok(tiff) = multipage::write_frames(&frames) else {
        return;
    };
    let engine = ConversionEngine::default();

    c.bench_function("tif_to_pdf (4 x 200x150)", |b| {
        b.iter(|| black_box(engine.convert("TifToPdf", black_box(&tiff))).is_ok());
    });
}

/// Archive of four PNG members to a four-page PDF.
fn bench_zip_images_to_pdf(c: &mut Criterion) {
    let members: Vec<(String, Vec<u8>)> = (0..4u8)
        .filter_map(|i| {
            let png = ImageProcessor::from_dynamic(frame(i * 40)).to_png_bytes().ok()?;
            Some((format!("page_{i}.png"), png))
        })
        .collect();
    let Ok(zip) = write_archive(members) else {
        return;
    };
    let engine = ConversionEngine::default();

    c.bench_function("zip_images_to_pdf (4 x 200x150 png)", |b| {
        b.iter(|| black_box(engine.convert("ZipImagesToPdf", black_box(&zip))).is_ok());
    });
}

criterion_group!(benches, bench_tif_to_pdf, bench_zip_images_to_pdf);
criterion_main!(benches);
