// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the ConvertDMC engine.
//
// `ConvertError` is what the strategies raise internally; `Failure` is the
// flattened value handed across the engine boundary to callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every way a conversion can fail.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input bytes could not be read as the format the operation expects.
    #[error("could not decode {expected}: {detail}")]
    Decode {
        expected: &'static str,
        detail: String,
    },

    /// The transform produced nothing where at least one frame/page is needed.
    #[error("{0}")]
    EmptyResult(String),

    /// The operation selector is not one of the recognised names.
    #[error("invalid option")]
    UnknownOperation { requested: String },

    /// Decoded data could not be serialised into the target format.
    #[error("could not encode {target}: {detail}")]
    Encode {
        target: &'static str,
        detail: String,
    },

    /// Renderer unavailable, or a codec panicked and was caught at the boundary.
    #[error("internal conversion error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Shorthand for a [`ConvertError::Decode`].
    pub fn decode(expected: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::Decode {
            expected,
            detail: detail.to_string(),
        }
    }

    /// Shorthand for a [`ConvertError::Encode`].
    pub fn encode(target: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::Encode {
            target,
            detail: detail.to_string(),
        }
    }

    /// Coarse classification used by callers to pick a response.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode { .. } => ErrorKind::Decode,
            Self::EmptyResult(_) => ErrorKind::EmptyResult,
            Self::UnknownOperation { .. } => ErrorKind::UnknownOperation,
            Self::Encode { .. } => ErrorKind::Encode,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Classification of a [`Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Decode,
    EmptyResult,
    UnknownOperation,
    Encode,
    Internal,
}

impl ErrorKind {
    /// Whether the user can fix this by sending a different file or option.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal)
    }
}

/// The failure half of a conversion outcome, as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {}

impl From<ConvertError> for Failure {
    fn from(err: ConvertError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ConvertError>;
