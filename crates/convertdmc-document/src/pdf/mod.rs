// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: reading and splitting, rasterising, and creating image PDFs.

pub mod reader;
pub mod render;
pub mod writer;

pub use reader::PdfReader;
pub use render::PdfRasterizer;
pub use writer::PdfWriter;
