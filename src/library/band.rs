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

use super::SampleId;

/// Splits velocity 1-127 into `layers` contiguous bands. Each band is
/// `127 / layers` wide and the last one absorbs the remainder up to 127.
/// `layers` is clamped to 1-127.
pub fn velocity_bands(layers: u8) -> Vec<(u8, u8)> {
    let layers = layers.clamp(1, 127);
    let range = 127 / layers;
    (1..=layers)
        .map(|layer| {
            let min = (layer - 1) * range + 1;
            let max = if layer == layers { 127 } else { layer * range };
            (min, max)
        })
        .collect()
}

/// A velocity range with its round-robin variants.
#[derive(Debug, Clone)]
pub struct VelocityBand {
    min: u8,
    max: u8,
    variants: Vec<SampleId>,
    /// Index of the next variant to play.
    cursor: usize,
}

impl VelocityBand {
    pub(crate) fn new(min: u8, max: u8) -> Self {
        Self {
            min,
            max,
            variants: Vec::new(),
            cursor: 0,
        }
    }

    pub(crate) fn push(&mut self, sample: SampleId) {
        self.variants.push(sample);
    }

    /// The inclusive velocity range.
    pub fn range(&self) -> (u8, u8) {
        (self.min, self.max)
    }

    /// Returns true if the band covers the velocity.
    pub fn contains(&self, velocity: u8) -> bool {
        velocity >= self.min && velocity <= self.max
    }

    /// Returns true if the band has exactly this range.
    pub fn matches(&self, min: u8, max: u8) -> bool {
        self.min == min && self.max == max
    }

    /// Round-robin variants in declaration order.
    pub fn variants(&self) -> &[SampleId] {
        &self.variants
    }

    /// Index of the variant the next trigger will play.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the variant at the cursor and moves the cursor to the next one,
    /// wrapping after the last.
    pub fn next_sample(&mut self) -> Option<SampleId> {
        let sample = *self.variants.get(self.cursor)?;
        self.cursor = (self.cursor + 1) % self.variants.len();
        Some(sample)
    }
}

/// The velocity bands of one (note, output) pair.
#[derive(Debug, Clone)]
pub struct OutputGroup {
    output: usize,
    choke_group: u32,
    bands: Vec<VelocityBand>,
}

impl OutputGroup {
    pub(crate) fn new(output: usize) -> Self {
        Self {
            output,
            choke_group: 0,
            bands: Vec::new(),
        }
    }

    /// Adds a variant to the band with exactly this range, creating the band
    /// at the end of the list if needed.
    pub(crate) fn add_variant(&mut self, min: u8, max: u8, sample: SampleId) {
        match self.bands.iter_mut().find(|band| band.matches(min, max)) {
            Some(band) => band.push(sample),
            None => {
                let mut band = VelocityBand::new(min, max);
                band.push(sample);
                self.bands.push(band);
            }
        }
    }

    pub(crate) fn set_choke_group(&mut self, id: u32) {
        self.choke_group = id;
    }

    /// The output channel.
    pub fn output(&self) -> usize {
        self.output
    }

    /// The choke group id, 0 for none.
    pub fn choke_group(&self) -> u32 {
        self.choke_group
    }

    /// Velocity bands in declaration order.
    pub fn bands(&self) -> &[VelocityBand] {
        &self.bands
    }

    /// Picks the next sample for a velocity. The first band containing the
    /// velocity wins; if none does, the first band is used.
    pub fn sample_for_velocity(&mut self, velocity: u8) -> Option<SampleId> {
        let index = self
            .bands
            .iter()
            .position(|band| band.contains(velocity))
            .unwrap_or(0);
        self.bands.get_mut(index)?.next_sample()
    }
}
