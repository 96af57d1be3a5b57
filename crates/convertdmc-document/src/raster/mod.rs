// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster module: still-image decode/normalise/encode and multi-frame TIFF I/O.

pub mod multipage;
pub mod processor;

pub use multipage::FrameReader;
pub use processor::ImageProcessor;
