// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Server configuration: optional JSON file, then environment overrides.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use convertdmc_core::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::error::WebError;

/// Names a JSON config file to load before applying overrides.
pub const CONFIG_ENV: &str = "CONVERTDMC_CONFIG";
pub const BIND_ENV: &str = "CONVERTDMC_BIND";
pub const MAX_UPLOAD_ENV: &str = "CONVERTDMC_MAX_UPLOAD";
pub const PDFIUM_ENV: &str = "PDFIUM_LIB_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub bind_addr: SocketAddr,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    pub engine: EngineConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            max_upload_bytes: 64 * 1024 * 1024,
            engine: EngineConfig::default(),
        }
    }
}

impl WebConfig {
    /// Load from the process environment.
    pub fn load() -> Result<Self, WebError> {
        Self::from_sources(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to read environment variables.
    pub fn from_sources(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WebError> {
        let mut config = match lookup(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(value) = lookup(BIND_ENV) {
            config.bind_addr = value.parse().map_err(|_| WebError::InvalidSetting {
                name: BIND_ENV,
                value,
            })?;
        }
        if let Some(value) = lookup(MAX_UPLOAD_ENV) {
            config.max_upload_bytes = value.parse().map_err(|_| WebError::InvalidSetting {
                name: MAX_UPLOAD_ENV,
                value,
            })?;
        }
        if let Some(value) = lookup(PDFIUM_ENV) {
            config.engine.pdfium_library = Some(PathBuf::from(value));
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, WebError> {
        let data = std::fs::read_to_string(path).map_err(|source| WebError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| WebError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
