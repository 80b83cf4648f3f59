// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::info;

use super::error::ArchiveError;

/// Builds an archive from in-memory assets.
#[derive(Default)]
pub struct ArchiveWriter {
    entries: Vec<(String, Vec<u8>)>,
}

impl ArchiveWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an asset under the given logical path. A later asset with the same
    /// path shadows the earlier one when the archive is read back.
    pub fn add<S: Into<String>>(&mut self, path: S, data: Vec<u8>) -> &mut Self {
        self.entries.push((path.into(), data));
        self
    }

    /// Number of assets added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the archive to the given writer.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), ArchiveError> {
        let count = u32::try_from(self.entries.len())
            .map_err(|_| invalid_input("too many archive entries"))?;

        let index_len: u64 = 4 + self
            .entries
            .iter()
            .map(|(path, _)| 4 + path.len() as u64 + 16)
            .sum::<u64>();

        out.write_all(&count.to_le_bytes())?;
        let mut offset = index_len;
        for (path, data) in &self.entries {
            let path_len =
                u32::try_from(path.len()).map_err(|_| invalid_input("archive path too long"))?;
            out.write_all(&path_len.to_le_bytes())?;
            out.write_all(path.as_bytes())?;
            out.write_all(&offset.to_le_bytes())?;
            out.write_all(&(data.len() as u64).to_le_bytes())?;
            offset += data.len() as u64;
        }

        for (_, data) in &self.entries {
            out.write_all(data)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Writes the archive to a file.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), ArchiveError> {
        let mut out = BufWriter::new(File::create(path.as_ref())?);
        self.write_to(&mut out)
    }

    /// Serializes the archive into a byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArchiveError> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }
}

fn invalid_input(msg: &str) -> ArchiveError {
    ArchiveError::Io(io::Error::new(io::ErrorKind::InvalidInput, msg.to_string()))
}

/// Packs every regular file under `dir` into an archive at `out`. Logical
/// paths are relative to `dir` and use `/` as the separator. Returns the
/// number of packed files.
pub fn pack_directory<P: AsRef<Path>, Q: AsRef<Path>>(
    dir: P,
    out: Q,
) -> Result<usize, ArchiveError> {
    let dir = dir.as_ref();
    let mut files = Vec::new();
    collect_files(dir, "", &mut files)?;
    // An earlier archive at `out` is about to be replaced, not packed.
    if let Ok(out) = fs::canonicalize(out.as_ref()) {
        files.retain(|(_, path)| fs::canonicalize(path).map_or(true, |path| path != out));
    }
    files.sort();

    let mut writer = ArchiveWriter::new();
    for (logical, path) in files {
        writer.add(logical, fs::read(path)?);
    }
    writer.write(out.as_ref())?;

    info!(
        dir = ?dir,
        out = ?out.as_ref(),
        files = writer.len(),
        "Packed archive"
    );
    Ok(writer.len())
}

fn collect_files(
    dir: &Path,
    prefix: &str,
    files: &mut Vec<(String, std::path::PathBuf)>,
) -> Result<(), ArchiveError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        let logical = if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        };

        if path.is_dir() {
            collect_files(&path, &logical, files)?;
        } else if path.is_file() {
            files.push((logical, path));
        }
    }
    Ok(())
}
