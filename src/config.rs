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

//! Kit configuration.
//!
//! A kit file names the sample archive and declares which samples play for
//! which trigger note, on which output channel, with how many velocity layers
//! and round-robin variants.

mod error;
mod kit;

pub use error::ConfigError;
pub use kit::{
    ChokeGroup, InstrumentDeclaration, KitConfig, DEFAULT_MAX_VOICES, DEFAULT_OUTPUT_CHANNELS,
};
