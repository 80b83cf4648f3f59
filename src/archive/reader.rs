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

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::error::ArchiveError;

/// Location of one asset inside an archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Absolute byte offset of the asset in the archive file.
    pub offset: u64,
    /// Length of the asset in bytes.
    pub size: u64,
}

/// An opened archive. The whole index is resident after `open`; asset bytes
/// are read from disk on demand.
pub struct Archive {
    /// Where the archive was opened from.
    path: PathBuf,
    /// The backing file.
    file: File,
    /// Logical path -> entry.
    index: HashMap<String, Entry>,
}

impl Archive {
    /// Opens an archive and reads its index.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ArchiveError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let file_len = file.metadata()?.len();

        let mut reader = BufReader::new(file);
        let index = read_index(&mut reader, file_len)?;

        info!(path = ?path, entries = index.len(), "Archive opened");

        Ok(Self {
            path: path.to_path_buf(),
            file: reader.into_inner(),
            index,
        })
    }

    /// Reads the bytes stored for the given logical path. Returns `Ok(None)` if
    /// the archive has no such entry.
    pub fn read(&mut self, path: &str) -> Result<Option<Vec<u8>>, ArchiveError> {
        let entry = match self.index.get(path) {
            Some(entry) => *entry,
            None => {
                debug!(path, "Asset not present in archive");
                return Ok(None);
            }
        };

        let size =
            usize::try_from(entry.size).map_err(|_| ArchiveError::EntryTooLarge(path.into()))?;
        self.file.seek(SeekFrom::Start(entry.offset))?;
        let mut data = vec![0u8; size];
        self.file.read_exact(&mut data)?;
        Ok(Some(data))
    }

    /// Returns true if the archive holds the given logical path.
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Looks up the entry for a logical path.
    pub fn entry(&self, path: &str) -> Option<Entry> {
        self.index.get(path).copied()
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the archive holds no entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All entries, sorted by path.
    pub fn entries(&self) -> Vec<(&str, Entry)> {
        let mut entries: Vec<(&str, Entry)> = self
            .index
            .iter()
            .map(|(path, entry)| (path.as_str(), *entry))
            .collect();
        entries.sort_by_key(|(path, _)| *path);
        entries
    }

    /// The file the archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("path", &self.path)
            .field("entries", &self.index.len())
            .finish()
    }
}

/// Parses the index at the start of an archive. Every record must be complete
/// and point inside the file.
fn read_index<R: Read>(
    reader: &mut R,
    file_len: u64,
) -> Result<HashMap<String, Entry>, ArchiveError> {
    let count = read_u32(reader).map_err(|e| truncated(e, 0, 0))?;

    // The count comes from the file, so don't trust it for preallocation.
    let mut index = HashMap::with_capacity((count as usize).min(4096));
    let mut consumed: u64 = 4;

    for entry in 0..count {
        let path_len = read_u32(reader).map_err(|e| truncated(e, entry, count))? as u64;
        if consumed + 4 + path_len > file_len {
            return Err(ArchiveError::TruncatedIndex { entry, count });
        }

        let mut raw = vec![0u8; path_len as usize];
        reader
            .read_exact(&mut raw)
            .map_err(|e| truncated(e, entry, count))?;
        let offset = read_u64(reader).map_err(|e| truncated(e, entry, count))?;
        let size = read_u64(reader).map_err(|e| truncated(e, entry, count))?;
        consumed += 4 + path_len + 16;

        let path = String::from_utf8(raw).map_err(|_| ArchiveError::InvalidPath { entry })?;
        match offset.checked_add(size) {
            Some(end) if end <= file_len => {}
            _ => {
                return Err(ArchiveError::EntryOutOfBounds {
                    path,
                    offset,
                    size,
                    file_len,
                })
            }
        }

        index.insert(path, Entry { offset, size });
    }

    Ok(index)
}

fn truncated(e: io::Error, entry: u32, count: u32) -> ArchiveError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        ArchiveError::TruncatedIndex { entry, count }
    } else {
        ArchiveError::Io(e)
    }
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::archive::ArchiveWriter;

    #[test]
    fn test_open_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kit.pak");

        let mut writer = ArchiveWriter::new();
        writer.add("kick_r1_v01.wav", vec![1, 2, 3]);
        writer.add("snare_r1_v01.wav", vec![4, 5, 6, 7]);
        writer.write(&path).unwrap();

        let mut archive = Archive::open(&path).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.contains("kick_r1_v01.wav"));
        assert_eq!(
            archive.read("snare_r1_v01.wav").unwrap(),
            Some(vec![4, 5, 6, 7])
        );
        assert_eq!(archive.read("kick_r1_v01.wav").unwrap(), Some(vec![1, 2, 3]));

        let paths: Vec<&str> = archive.entries().iter().map(|(p, _)| *p).collect();
        assert_eq!(paths, vec!["kick_r1_v01.wav", "snare_r1_v01.wav"]);
    }

    #[test]
    fn test_missing_asset_is_not_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kit.pak");
        let mut writer = ArchiveWriter::new();
        writer.add("kick_r1_v01.wav", vec![1]);
        writer.write(&path).unwrap();

        let mut archive = Archive::open(&path).unwrap();
        assert_eq!(archive.read("missing.wav").unwrap(), None);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempdir().unwrap();
        let result = Archive::open(dir.path().join("nope.pak"));
        assert!(matches!(result, Err(ArchiveError::Open { .. })));
    }

    #[test]
    fn test_empty_file_is_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.pak");
        fs::write(&path, b"").unwrap();

        let result = Archive::open(&path);
        assert!(matches!(
            result,
            Err(ArchiveError::TruncatedIndex { entry: 0, count: 0 })
        ));
    }

    #[test]
    fn test_truncated_index_is_a_hard_failure() {
        let mut writer = ArchiveWriter::new();
        writer.add("a.wav", vec![0; 16]);
        writer.add("b.wav", vec![0; 16]);
        let bytes = writer.to_bytes().unwrap();

        // Cut inside the second record: count (4) + first record (4 + 5 + 16)
        // + part of the second record's path.
        let cut = 4 + 25 + 6;
        let dir = tempdir().unwrap();
        let path = dir.path().join("cut.pak");
        fs::write(&path, &bytes[..cut]).unwrap();

        let result = Archive::open(&path);
        assert!(matches!(
            result,
            Err(ArchiveError::TruncatedIndex { entry: 1, count: 2 })
        ));
    }

    #[test]
    fn test_entry_out_of_bounds() {
        let mut writer = ArchiveWriter::new();
        writer.add("a.wav", vec![9; 32]);
        let bytes = writer.to_bytes().unwrap();

        // Keep the full index but drop the tail of the data.
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.pak");
        fs::write(&path, &bytes[..bytes.len() - 8]).unwrap();

        let result = Archive::open(&path);
        assert!(matches!(result, Err(ArchiveError::EntryOutOfBounds { .. })));
    }

    #[test]
    fn test_invalid_utf8_path() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());

        let mut cursor = io::Cursor::new(bytes.clone());
        let result = read_index(&mut cursor, bytes.len() as u64);
        assert!(matches!(result, Err(ArchiveError::InvalidPath { entry: 0 })));
    }

    #[test]
    fn test_huge_path_length_does_not_allocate() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());

        let mut cursor = io::Cursor::new(bytes.clone());
        let result = read_index(&mut cursor, bytes.len() as u64);
        assert!(matches!(
            result,
            Err(ArchiveError::TruncatedIndex { entry: 0, count: 1 })
        ));
    }
}
