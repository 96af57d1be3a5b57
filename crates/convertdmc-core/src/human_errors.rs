// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable failure messages for the upload page.
//
// The engine's messages are precise but technical ("could not decode PDF
// document: invalid file header"). Front ends show a plain heading with a
// suggestion and keep the technical detail underneath.

use crate::error::{ErrorKind, Failure};

/// A failure rewritten for the person who uploaded the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What to try next.
    pub suggestion: String,
    /// The engine's own message.
    pub detail: String,
}

/// Convert a [`Failure`] into a [`HumanError`].
pub fn humanize(failure: &Failure) -> HumanError {
    let (message, suggestion) = match failure.kind {
        ErrorKind::Decode => (
            "The file could not be read.",
            "Check that the file matches the selected option (for example a PDF for \
             \"PDF to TIF\") and that it is not damaged, then try again.",
        ),
        ErrorKind::EmptyResult if failure.message.contains("archive") => (
            "No images were found in the ZIP.",
            "Only .jpg, .jpeg and .png files inside the archive are converted.",
        ),
        ErrorKind::EmptyResult => (
            "The file has no pages or frames to convert.",
            "Try a different file.",
        ),
        ErrorKind::UnknownOperation => (
            "That option is not available.",
            "Choose one of the options from the list and submit again.",
        ),
        ErrorKind::Encode => (
            "The result could not be written in the target format.",
            "The image may use an unusual colour format. Try saving it as a JPEG or PNG first.",
        ),
        ErrorKind::Internal => (
            "Something went wrong on our side.",
            "Try again. If this keeps happening, try a different file or option.",
        ),
    };

    HumanError {
        message: message.into(),
        suggestion: suggestion.into(),
        detail: failure.message.clone(),
    }
}
