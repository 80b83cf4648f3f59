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

//! The instrument library: every decoded sample of a kit, organized by
//! trigger note, output channel, velocity band and round-robin variant.
//!
//! The library is built once before the engine accepts triggers. After that
//! the only thing that changes is each band's round-robin cursor.

mod band;
mod builder;
mod report;

pub use band::{velocity_bands, OutputGroup, VelocityBand};
pub use builder::LibraryBuilder;
pub use report::{AssetFailure, LoadReport};

use crate::samples::DecodedSample;

/// Number of addressable trigger notes.
pub const NOTE_COUNT: usize = 128;

/// Index of a decoded sample inside a [`Library`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SampleId(u32);

impl SampleId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Everything mapped to one trigger note.
#[derive(Debug, Default)]
struct NoteMapping {
    /// Output groups in declaration order.
    groups: Vec<OutputGroup>,
    /// Distinct non-zero choke ids across `groups`.
    chokes: Vec<u32>,
}

/// The built sample library.
pub struct Library {
    /// Sample arena; bands refer to samples by [`SampleId`].
    samples: Vec<DecodedSample>,
    /// One entry per note, 0-127.
    notes: Vec<NoteMapping>,
}

impl Library {
    fn new(samples: Vec<DecodedSample>, groups: Vec<Vec<OutputGroup>>) -> Self {
        let notes = groups
            .into_iter()
            .map(|groups| {
                let mut chokes: Vec<u32> = Vec::new();
                for group in &groups {
                    let id = group.choke_group();
                    if id != 0 && !chokes.contains(&id) {
                        chokes.push(id);
                    }
                }
                NoteMapping { groups, chokes }
            })
            .collect();

        Self { samples, notes }
    }

    /// An empty library. Every trigger is a no-op.
    pub fn empty() -> Self {
        Self::new(Vec::new(), (0..NOTE_COUNT).map(|_| Vec::new()).collect())
    }

    /// The output groups mapped to a note, in declaration order.
    pub fn groups(&self, note: u8) -> &[OutputGroup] {
        self.notes
            .get(note as usize)
            .map(|mapping| mapping.groups.as_slice())
            .unwrap_or(&[])
    }

    /// Mutable access to a note's output groups, for round-robin selection.
    pub fn groups_mut(&mut self, note: u8) -> &mut [OutputGroup] {
        match self.notes.get_mut(note as usize) {
            Some(mapping) => mapping.groups.as_mut_slice(),
            None => &mut [],
        }
    }

    /// The distinct non-zero choke ids of a note's output groups.
    pub fn chokes(&self, note: u8) -> &[u32] {
        self.notes
            .get(note as usize)
            .map(|mapping| mapping.chokes.as_slice())
            .unwrap_or(&[])
    }

    /// Returns true if the note has at least one output group.
    pub fn contains(&self, note: u8) -> bool {
        !self.groups(note).is_empty()
    }

    /// Looks up a decoded sample.
    pub fn sample(&self, id: SampleId) -> Option<&DecodedSample> {
        self.samples.get(id.index())
    }

    /// Number of notes with at least one output group.
    pub fn note_count(&self) -> usize {
        self.notes.iter().filter(|m| !m.groups.is_empty()).count()
    }

    /// Number of decoded samples.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Total memory held by decoded samples, in bytes.
    pub fn memory_size(&self) -> usize {
        self.samples.iter().map(DecodedSample::memory_size).sum()
    }
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("notes", &self.note_count())
            .field("samples", &self.samples.len())
            .field("memory_kb", &(self.memory_size() / 1024))
            .finish()
    }
}
