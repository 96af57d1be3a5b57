// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the ConvertDMC engine.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConvertError;

/// The six conversions the engine offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    JpgToTif,
    TifToPdf,
    TifToJpg,
    PdfToTif,
    SplitPdf,
    ZipImagesToPdf,
}

impl Operation {
    /// Every operation, in the order the selection form lists them.
    pub const ALL: [Operation; 6] = [
        Self::JpgToTif,
        Self::TifToPdf,
        Self::TifToJpg,
        Self::PdfToTif,
        Self::SplitPdf,
        Self::ZipImagesToPdf,
    ];

    /// Identifier accepted by [`Operation::from_str`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JpgToTif => "JpgToTif",
            Self::TifToPdf => "TifToPdf",
            Self::TifToJpg => "TifToJpg",
            Self::PdfToTif => "PdfToTif",
            Self::SplitPdf => "SplitPdf",
            Self::ZipImagesToPdf => "ZipImagesToPdf",
        }
    }

    /// Human label for selection lists.
    pub fn label(&self) -> &'static str {
        match self {
            Self::JpgToTif => "JPG to TIF",
            Self::TifToPdf => "TIF to PDF",
            Self::TifToJpg => "TIF to JPG",
            Self::PdfToTif => "PDF to TIF",
            Self::SplitPdf => "Split PDF",
            Self::ZipImagesToPdf => "ZIP of images to PDF",
        }
    }

    /// Suggested download name for the result.
    pub fn output_filename(&self) -> &'static str {
        match self {
            Self::JpgToTif | Self::PdfToTif => "convertido.tif",
            Self::TifToPdf => "convertido.pdf",
            Self::TifToJpg => "convertido.jpg",
            Self::SplitPdf => "separado.zip",
            Self::ZipImagesToPdf => "imagenes_convertidas.pdf",
        }
    }

    /// Format of the bytes the operation produces.
    pub fn output_type(&self) -> DocumentType {
        match self {
            Self::JpgToTif | Self::PdfToTif => DocumentType::Tiff,
            Self::TifToPdf | Self::ZipImagesToPdf => DocumentType::Pdf,
            Self::TifToJpg => DocumentType::Jpeg,
            Self::SplitPdf => DocumentType::Zip,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ConvertError;

    /// Exact, case-sensitive match on the identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ConvertError::UnknownOperation {
                requested: s.to_owned(),
            })
    }
}

/// File formats the engine reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    Pdf,
    Jpeg,
    Png,
    Tiff,
    Zip,
}

impl DocumentType {
    /// MIME type for the HTTP Content-Type header.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Tiff => "image/tiff",
            Self::Zip => "application/zip",
        }
    }

    /// Infer document type from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            "zip" => Some(Self::Zip),
            _ => None,
        }
    }

    /// Infer document type from the extension of a file or archive member name.
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

/// A finished conversion, ready to hand back as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

impl Output {
    /// Package encoded bytes with the operation's filename and MIME type.
    pub fn for_operation(operation: Operation, bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            filename: operation.output_filename().to_owned(),
            content_type: operation.output_type().mime_type().to_owned(),
        }
    }
}

/// Outcome of a single conversion call.
pub type ConversionResult = std::result::Result<Output, crate::error::Failure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_identifier() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!("jpgtotif".parse::<Operation>().is_err());
        assert!(" JpgToTif".parse::<Operation>().is_err());
        assert!("Not A Real Option".parse::<Operation>().is_err());
    }

    #[test]
    fn output_names_match_operations() {
        let out = Output::for_operation(Operation::SplitPdf, vec![1, 2, 3]);
        assert_eq!(out.filename, "separado.zip");
        assert_eq!(out.content_type, "application/zip");

        let out = Output::for_operation(Operation::ZipImagesToPdf, Vec::new());
        assert_eq!(out.filename, "imagenes_convertidas.pdf");
        assert_eq!(out.content_type, "application/pdf");
    }

    #[test]
    fn member_names_map_to_types() {
        assert_eq!(DocumentType::from_name("scans/A.JPG"), Some(DocumentType::Jpeg));
        assert_eq!(DocumentType::from_name("b.png"), Some(DocumentType::Png));
        assert_eq!(DocumentType::from_name("notes.txt"), None);
        assert_eq!(DocumentType::from_name("README"), None);
    }
}
