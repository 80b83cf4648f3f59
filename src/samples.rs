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

//! Decoded sample storage.
//!
//! Samples are decoded once while the kit loads and then kept in memory as
//! planar `f32` data (one or two channels), so playback never touches the
//! decoder or the disk.

mod decode;
mod error;
mod resample;
mod sample;

pub use decode::{decode, decode_path};
pub use error::SampleError;
pub use sample::DecodedSample;
