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

//! Voice management for polyphonic sample playback.
//!
//! Handles voice allocation, stealing, and choke groups. The pool reserves its
//! full capacity up front and never grows, so nothing here allocates once the
//! engine is running.

use tracing::trace;

use crate::library::SampleId;

/// One sample being played back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Voice {
    /// The sample being played.
    sample: SampleId,
    /// Next frame to play.
    position: usize,
    /// Total frames of the sample.
    length: usize,
    /// The output channel (stereo samples also use `output + 1`).
    output: usize,
    /// Gain applied to every frame.
    gain: f32,
    /// Choke group id, 0 for none.
    choke_group: u32,
}

impl Voice {
    /// Creates a voice positioned at the start of the sample.
    pub fn new(sample: SampleId, length: usize, output: usize, gain: f32, choke_group: u32) -> Self {
        Self {
            sample,
            position: 0,
            length,
            output,
            gain,
            choke_group,
        }
    }

    pub fn sample(&self) -> SampleId {
        self.sample
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn output(&self) -> usize {
        self.output
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn choke_group(&self) -> u32 {
        self.choke_group
    }

    /// Frames left to play.
    pub fn remaining(&self) -> usize {
        self.length.saturating_sub(self.position)
    }

    /// Returns true once every frame has been played.
    pub fn is_finished(&self) -> bool {
        self.position >= self.length
    }

    pub(crate) fn advance(&mut self, frames: usize) {
        self.position = (self.position + frames).min(self.length);
    }

    #[cfg(test)]
    pub(crate) fn at_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }
}

/// A bounded collection of active voices. Order carries no meaning.
pub struct VoicePool {
    voices: Vec<Voice>,
    capacity: usize,
}

impl VoicePool {
    /// Creates a pool holding at most `capacity` voices (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            voices: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Adds a voice. When the pool is full, the voice that has progressed
    /// furthest is overwritten and returned.
    pub fn push(&mut self, voice: Voice) -> Option<Voice> {
        if self.voices.len() < self.capacity {
            self.voices.push(voice);
            return None;
        }

        let index = self.steal_index();
        let stolen = std::mem::replace(&mut self.voices[index], voice);
        trace!(
            position = stolen.position,
            length = stolen.length,
            "Voice limit reached, stealing furthest voice"
        );
        Some(stolen)
    }

    /// Index of the voice with the largest position. Ties go to the earliest.
    fn steal_index(&self) -> usize {
        let mut index = 0;
        let mut max_position = 0;
        for (i, voice) in self.voices.iter().enumerate() {
            if voice.position > max_position {
                max_position = voice.position;
                index = i;
            }
        }
        index
    }

    /// Removes every voice whose choke group is in `groups`. Returns how many
    /// voices were removed.
    pub fn choke(&mut self, groups: &[u32]) -> usize {
        if groups.is_empty() {
            return 0;
        }
        let before = self.voices.len();
        self.voices
            .retain(|voice| !groups.contains(&voice.choke_group));
        before - self.voices.len()
    }

    /// Visits every voice once, keeping those for which `f` returns true.
    pub(crate) fn retain_mut<F>(&mut self, f: F)
    where
        F: FnMut(&mut Voice) -> bool,
    {
        self.voices.retain_mut(f);
    }

    /// Removes all voices.
    pub fn clear(&mut self) {
        self.voices.clear();
    }

    /// Number of active voices.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Returns true if no voice is active.
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Maximum number of voices.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over the active voices.
    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }
}

impl std::fmt::Debug for VoicePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoicePool")
            .field("active_voices", &self.voices.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    fn voice(sample: usize, position: usize, choke_group: u32) -> Voice {
        Voice::new(SampleId::new(sample), 1000, 0, 1.0, choke_group).at_position(position)
    }

    #[test]
    fn test_push_within_capacity() {
        let mut pool = VoicePool::with_capacity(4);
        for i in 0..4 {
            assert!(pool.push(voice(i, 0, 0)).is_none());
        }
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn test_steals_furthest_voice() {
        let mut pool = VoicePool::with_capacity(3);
        pool.push(voice(0, 100, 0));
        pool.push(voice(1, 700, 0));
        pool.push(voice(2, 300, 0));

        let stolen = pool.push(voice(3, 0, 0)).unwrap();
        assert_eq!(stolen.sample(), SampleId::new(1));
        assert_eq!(pool.len(), 3);
        assert!(pool.iter().any(|v| v.sample() == SampleId::new(3)));
        assert!(!pool.iter().any(|v| v.sample() == SampleId::new(1)));
    }

    #[test]
    fn test_steal_tie_takes_first() {
        let mut pool = VoicePool::with_capacity(2);
        pool.push(voice(0, 0, 0));
        pool.push(voice(1, 0, 0));

        let stolen = pool.push(voice(2, 0, 0)).unwrap();
        assert_eq!(stolen.sample(), SampleId::new(0));
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut rng = rand::thread_rng();
        let mut pool = VoicePool::with_capacity(16);

        for i in 0..500 {
            let max_before = pool.iter().map(Voice::position).max();
            let full = pool.len() == pool.capacity();

            let stolen = pool.push(voice(i, rng.gen_range(0..1000), 0));
            assert!(pool.len() <= pool.capacity());

            if full {
                let stolen = stolen.expect("full pool must steal");
                assert_eq!(Some(stolen.position()), max_before);
            } else {
                assert!(stolen.is_none());
            }
        }
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let pool = VoicePool::with_capacity(0);
        assert_eq!(pool.capacity(), 1);
    }

    #[test]
    fn test_choke_removes_matching_groups() {
        let mut pool = VoicePool::with_capacity(8);
        pool.push(voice(0, 0, 1));
        pool.push(voice(1, 0, 0));
        pool.push(voice(2, 0, 2));
        pool.push(voice(3, 0, 1));

        assert_eq!(pool.choke(&[1]), 2);
        assert_eq!(pool.len(), 2);
        assert!(pool.iter().all(|v| v.choke_group() != 1));

        assert_eq!(pool.choke(&[]), 0);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_voice_advance_is_bounded() {
        let mut v = Voice::new(SampleId::new(0), 100, 0, 1.0, 0);
        v.advance(60);
        assert_eq!(v.remaining(), 40);
        v.advance(60);
        assert_eq!(v.position(), 100);
        assert!(v.is_finished());
    }
}
