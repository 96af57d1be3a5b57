// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Tunables shared by every conversion. Defaults reproduce library defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Resolution used when rasterising PDF pages.
    pub raster_dpi: u16,
    /// Resolution assumed for images placed on PDF pages (72 => 1 px per pt).
    pub page_dpi: f32,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
    /// Title written into generated PDFs.
    pub pdf_title: String,
    /// Explicit libpdfium to bind; the system library is used when unset.
    pub pdfium_library: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            raster_dpi: 200,
            page_dpi: 72.0,
            jpeg_quality: 75,
            pdf_title: "ConvertDMC".into(),
            pdfium_library: None,
        }
    }
}
