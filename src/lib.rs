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

//! A multi-output drum sample playback engine.
//!
//! A kit is a set of instrument declarations mapping MIDI notes to sample
//! names in a single archive. Each declaration expands to velocity layers and
//! round-robin variants, loaded once up front. Triggers then start one-shot
//! voices that are mixed into a fixed set of output channels, block by block.

pub mod archive;
pub mod config;
pub mod engine;
pub mod event;
pub mod host;
pub mod library;
pub mod samples;
pub mod voice;

#[cfg(test)]
mod testutil;
