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

use tracing::trace;

use crate::library::Library;
use crate::voice::{Voice, VoicePool};

/// Gain of the softest possible hit.
pub const GAIN_FLOOR: f32 = 0.4;

/// Maps a velocity (1-127) to a gain in `[GAIN_FLOOR, 1.0]`, linear above the
/// floor.
pub fn velocity_gain(velocity: u8) -> f32 {
    let floor = f64::from(GAIN_FLOOR);
    let normalized = f64::from(velocity.min(127)) / 127.0;
    (floor + (1.0 - floor) * normalized) as f32
}

/// Starts a voice for every output group of the note. Voices in the note's
/// choke groups are cut first. Returns the number of voices started.
pub(crate) fn dispatch(library: &mut Library, voices: &mut VoicePool, note: u8, velocity: u8) -> usize {
    if velocity == 0 || !library.contains(note) {
        return 0;
    }

    let choked = voices.choke(library.chokes(note));
    let gain = velocity_gain(velocity);

    let mut started = 0;
    for index in 0..library.groups(note).len() {
        let group = &mut library.groups_mut(note)[index];
        let output = group.output();
        let choke_group = group.choke_group();
        let id = match group.sample_for_velocity(velocity) {
            Some(id) => id,
            None => continue,
        };

        let length = match library.sample(id) {
            Some(sample) if !sample.is_empty() => sample.frames(),
            _ => continue,
        };

        voices.push(Voice::new(id, length, output, gain, choke_group));
        started += 1;
    }

    trace!(note, velocity, started, choked, "Note triggered");
    started
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_bounds() {
        assert_eq!(velocity_gain(127), 1.0);
        assert!((velocity_gain(1) - (0.4 + 0.6 / 127.0)).abs() < 1e-6);
        assert!((velocity_gain(1) - 0.4047).abs() < 1e-4);
        assert!((velocity_gain(100) - 0.872).abs() < 1e-3);
    }

    #[test]
    fn test_gain_is_monotonic() {
        let mut previous = velocity_gain(0);
        assert!((previous - GAIN_FLOOR).abs() < 1e-6);
        for velocity in 1..=255u8 {
            let gain = velocity_gain(velocity);
            assert!(gain >= previous, "velocity {}", velocity);
            assert!((GAIN_FLOOR..=1.0).contains(&gain), "velocity {}", velocity);
            previous = gain;
        }
    }
}
