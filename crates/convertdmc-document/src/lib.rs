// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// convertdmc-document: the ConvertDMC conversion engine.
//
// Provides still-image and multi-frame TIFF I/O, PDF reading, splitting,
// rasterising and creation, ZIP archive handling, and the engine that runs the
// six conversions on top of them.

pub mod archive;
pub mod convert;
pub mod pdf;
pub mod raster;

#[cfg(test)]
mod test_support;

// Re-export the primary structs so callers can use `convertdmc_document::ConversionEngine` etc.
pub use archive::ImageArchive;
pub use convert::{ConversionEngine, convert};
pub use pdf::{PdfRasterizer, PdfReader, PdfWriter};
pub use raster::{FrameReader, ImageProcessor};
