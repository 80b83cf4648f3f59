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

//! Host adapters that drive an [`Instrument`](crate::engine::Instrument):
//! an offline renderer from standard MIDI files to WAV, and a live host
//! that plays MIDI input through an audio device.

mod error;
pub mod live;
pub mod midi;
pub mod offline;
mod thread_priority;

pub use error::HostError;
