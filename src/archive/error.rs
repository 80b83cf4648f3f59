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

use std::path::PathBuf;

/// Error types for archive operations.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Unable to open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive index truncated in entry {entry} of {count}")]
    TruncatedIndex { entry: u32, count: u32 },

    #[error("Archive entry {entry} has a path that is not valid UTF-8")]
    InvalidPath { entry: u32 },

    #[error("Archive entry '{path}' ({offset}+{size}) exceeds the file length {file_len}")]
    EntryOutOfBounds {
        path: String,
        offset: u64,
        size: u64,
        file_len: u64,
    },

    #[error("Archive entry '{0}' is too large for this platform")]
    EntryTooLarge(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
