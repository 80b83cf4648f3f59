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

use tracing::{debug, info, warn};

use super::band::{velocity_bands, OutputGroup};
use super::report::LoadReport;
use super::{Library, SampleId, NOTE_COUNT};
use crate::archive::Archive;
use crate::config::{InstrumentDeclaration, KitConfig};
use crate::samples::{self, DecodedSample, SampleError};

/// Accumulates declarations into a [`Library`].
pub struct LibraryBuilder {
    /// Sample rate samples are converted to, if any.
    target_sample_rate: Option<u32>,
    samples: Vec<DecodedSample>,
    /// Output groups per note, 0-127.
    groups: Vec<Vec<OutputGroup>>,
    report: LoadReport,
}

impl LibraryBuilder {
    /// Creates a builder that keeps samples at their own sample rate.
    pub fn new() -> Self {
        Self {
            target_sample_rate: None,
            samples: Vec::new(),
            groups: (0..NOTE_COUNT).map(|_| Vec::new()).collect(),
            report: LoadReport::default(),
        }
    }

    /// Converts every sample added afterwards to the given sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.target_sample_rate = Some(sample_rate);
        self
    }

    /// Builds a library from a kit, reading every declared asset from the
    /// archive. Missing or undecodable assets are recorded in the report and
    /// skipped.
    pub fn from_kit(kit: &KitConfig, archive: &mut Archive, sample_rate: u32) -> Self {
        let mut builder = if kit.resample() {
            Self::new().with_sample_rate(sample_rate)
        } else {
            Self::new()
        };

        for decl in kit.instruments() {
            builder.declare(decl, archive);
        }
        for group in kit.choke_groups() {
            for note in &group.notes {
                builder.assign_choke_group(*note, group.id);
            }
        }
        builder
    }

    /// Loads every velocity layer and round-robin variant of a declaration.
    pub fn declare(&mut self, decl: &InstrumentDeclaration, archive: &mut Archive) {
        for (layer, (min, max)) in (1u8..).zip(velocity_bands(decl.velocity_layers)) {
            for round_robin in 1..=decl.round_robin {
                let path = decl.asset_path(layer, round_robin);
                self.report.declared += 1;

                let bytes = match archive.read(&path) {
                    Ok(Some(bytes)) => bytes,
                    Ok(None) => {
                        self.report.record_missing(path);
                        continue;
                    }
                    Err(e) => {
                        self.report.record_failure(path, e.to_string());
                        continue;
                    }
                };

                match samples::decode_path(bytes, &path, decl.stereo)
                    .and_then(|sample| self.conform(sample))
                {
                    Ok(sample) => {
                        if self
                            .add_sample(decl.note, decl.output, min, max, sample)
                            .is_some()
                        {
                            self.report.loaded += 1;
                        }
                    }
                    Err(e) => self.report.record_failure(path, e.to_string()),
                }
            }
        }

        debug!(
            note = decl.note,
            sample = decl.sample,
            output = decl.output,
            "Instrument declared"
        );
    }

    /// Adds one decoded variant to the band `[min, max]` of the (note, output)
    /// group, creating the group and band on first use. Empty samples and
    /// notes above 127 are rejected.
    pub fn add_sample(
        &mut self,
        note: u8,
        output: usize,
        min: u8,
        max: u8,
        sample: DecodedSample,
    ) -> Option<SampleId> {
        if sample.is_empty() {
            return None;
        }
        if note as usize >= self.groups.len() {
            return None;
        }

        let sample = match self.conform(sample) {
            Ok(sample) => sample,
            Err(e) => {
                warn!(note, err = %e, "Unable to convert sample");
                return None;
            }
        };
        let groups = self.groups.get_mut(note as usize)?;
        let id = SampleId::new(self.samples.len());
        self.samples.push(sample);

        let index = match groups.iter().position(|group| group.output() == output) {
            Some(index) => index,
            None => {
                groups.push(OutputGroup::new(output));
                groups.len() - 1
            }
        };
        groups[index].add_variant(min, max, id);
        Some(id)
    }

    /// Converts a sample to the target sample rate, if one is set.
    fn conform(&self, sample: DecodedSample) -> Result<DecodedSample, SampleError> {
        match self.target_sample_rate {
            Some(rate) if rate != sample.sample_rate() => sample.resampled(rate),
            _ => Ok(sample),
        }
    }

    /// Assigns a choke group to every output group of a note.
    pub fn assign_choke_group(&mut self, note: u8, id: u32) {
        if let Some(groups) = self.groups.get_mut(note as usize) {
            for group in groups.iter_mut() {
                group.set_choke_group(id);
            }
        }
    }

    /// Finishes the build.
    pub fn build(self) -> (Library, LoadReport) {
        let library = Library::new(self.samples, self.groups);
        let mut report = self.report;
        report.notes = library.note_count();
        report.memory_bytes = library.memory_size();

        info!(
            notes = report.notes,
            samples = library.sample_count(),
            "Library built"
        );
        (library, report)
    }
}

impl Default for LibraryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
