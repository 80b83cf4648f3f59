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

//! Packed sample archives.
//!
//! An archive is a single file holding every sample of a kit. It starts with
//! an index (little-endian):
//!
//! ```text
//! u32 entry_count
//! entry_count x { u32 path_len, [u8; path_len] path, u64 offset, u64 size }
//! ```
//!
//! followed by the raw asset bytes. Offsets are absolute positions in the file.

mod error;
mod reader;
mod writer;

pub use error::ArchiveError;
pub use reader::{Archive, Entry};
pub use writer::{pack_directory, ArchiveWriter};
