// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ZIP archives: list and read the image members of an uploaded archive, and
// pack conversion results into a stored (uncompressed) archive.

use std::io::{Cursor, Read, Write};

use convertdmc_core::DocumentType;
use convertdmc_core::error::{ConvertError, Result};
use tracing::{debug, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// A ZIP archive opened over an in-memory upload.
pub struct ImageArchive<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> ImageArchive<'a> {
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &'a [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))
            .map_err(|err| ConvertError::decode("ZIP archive", err))?;
        debug!(members = archive.len(), "Archive opened");
        Ok(Self { archive })
    }

    /// Number of entries in the archive, directories included.
    pub fn member_count(&self) -> usize {
        self.archive.len()
    }

    /// Names of the JPEG and PNG members, sorted byte-wise.
    ///
    /// Matching is on the name's extension only, case-insensitively. Directory
    /// entries and every other member are ignored.
    pub fn image_members(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .archive
            .file_names()
            .filter(|name| is_image_member(name))
            .map(str::to_owned)
            .collect();
        names.sort_unstable();
        names
    }

    /// Decompress a member in full.
    pub fn read_member(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut member = self
            .archive
            .by_name(name)
            .map_err(|err| ConvertError::decode("ZIP archive", format!("{name}: {err}")))?;

        let mut buffer = Vec::with_capacity(usize::try_from(member.size()).unwrap_or(0));
        member
            .read_to_end(&mut buffer)
            .map_err(|err| ConvertError::decode("ZIP archive", format!("{name}: {err}")))?;
        Ok(buffer)
    }
}

fn is_image_member(name: &str) -> bool {
    !name.ends_with('/')
        && matches!(
            DocumentType::from_name(name),
            Some(DocumentType::Jpeg | DocumentType::Png)
        )
}

/// Write `entries` into a new archive, in the order given, without compression.
pub fn write_archive<N, I>(entries: I) -> Result<Vec<u8>>
where
    N: Into<String>,
    I: IntoIterator<Item = (N, Vec<u8>)>,
{
    let zip_err = |err: zip::result::ZipError| ConvertError::encode("ZIP archive", err);
    let io_err = |err: std::io::Error| ConvertError::encode("ZIP archive", err);

    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut count = 0usize;
    for (name, data) in entries {
        zip.start_file(name.into(), options).map_err(zip_err)?;
        zip.write_all(&data).map_err(io_err)?;
        count += 1;
    }
    zip.finish().map_err(zip_err)?;

    debug!(members = count, output_bytes = buffer.len(), "Archive written");
    Ok(buffer)
}
