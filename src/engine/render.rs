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

use crate::library::Library;
use crate::voice::VoicePool;

/// Mixes every voice into frames `start..end` of the outputs and advances it.
/// Each voice is visited exactly once; voices that are finished, or whose
/// sample is gone or empty, are dropped.
pub(crate) fn render(
    library: &Library,
    voices: &mut VoicePool,
    outputs: &mut [&mut [f32]],
    start: usize,
    end: usize,
) {
    if start >= end {
        return;
    }
    let block = end - start;

    voices.retain_mut(|voice| {
        let sample = match library.sample(voice.sample()) {
            Some(sample) if !sample.is_empty() => sample,
            _ => return false,
        };

        let from = voice.position();
        let to = (from + block.min(voice.remaining())).min(sample.frames());
        if from >= to {
            return false;
        }

        let gain = voice.gain();
        mix(outputs, voice.output(), start, &sample.left()[from..to], gain);
        if let (Some(right), Some(channel)) = (sample.right(), voice.output().checked_add(1)) {
            mix(outputs, channel, start, &right[from..to], gain);
        }

        voice.advance(to - from);
        !voice.is_finished()
    });
}

/// Adds `source * gain` into one output channel starting at `start`. Writes
/// past the channel's end, or to a channel that isn't connected, are dropped.
fn mix(outputs: &mut [&mut [f32]], channel: usize, start: usize, source: &[f32], gain: f32) {
    let destination = match outputs.get_mut(channel).and_then(|c| c.get_mut(start..)) {
        Some(destination) => destination,
        None => return,
    };

    for (out, sample) in destination.iter_mut().zip(source) {
        *out += sample * gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::LibraryBuilder;
    use crate::samples::DecodedSample;
    use crate::voice::Voice;

    fn library_with(sample: DecodedSample) -> (Library, crate::library::SampleId) {
        let mut builder = LibraryBuilder::new();
        let id = builder.add_sample(36, 0, 1, 127, sample).unwrap();
        (builder.build().0, id)
    }

    #[test]
    fn test_mix_is_additive() {
        let (library, id) = library_with(DecodedSample::mono(48000, vec![1.0; 8]));
        let mut voices = VoicePool::with_capacity(4);
        voices.push(Voice::new(id, 8, 0, 0.5, 0));
        voices.push(Voice::new(id, 8, 0, 0.25, 0));

        let mut left = vec![0.0f32; 8];
        let mut outputs: Vec<&mut [f32]> = vec![&mut left];
        render(&library, &mut voices, &mut outputs, 0, 8);

        assert!(left.iter().all(|s| (s - 0.75).abs() < 1e-6));
        assert!(voices.is_empty());
    }

    #[test]
    fn test_stereo_writes_two_channels() {
        let (library, id) =
            library_with(DecodedSample::stereo(48000, vec![1.0; 4], vec![-1.0; 4]));
        let mut voices = VoicePool::with_capacity(4);
        voices.push(Voice::new(id, 4, 1, 1.0, 0));

        let mut channels = vec![vec![0.0f32; 4]; 3];
        let mut outputs: Vec<&mut [f32]> = channels.iter_mut().map(|c| c.as_mut_slice()).collect();
        render(&library, &mut voices, &mut outputs, 0, 4);

        assert_eq!(channels[0], vec![0.0; 4]);
        assert_eq!(channels[1], vec![1.0; 4]);
        assert_eq!(channels[2], vec![-1.0; 4]);
    }

    #[test]
    fn test_out_of_range_output_is_skipped() {
        let (library, id) =
            library_with(DecodedSample::stereo(48000, vec![1.0; 4], vec![1.0; 4]));
        let mut voices = VoicePool::with_capacity(4);
        // Right side lands past the last channel, left side past both.
        voices.push(Voice::new(id, 4, 1, 1.0, 0));
        voices.push(Voice::new(id, 4, 9, 1.0, 0));

        let mut channels = vec![vec![0.0f32; 4]; 2];
        let mut outputs: Vec<&mut [f32]> = channels.iter_mut().map(|c| c.as_mut_slice()).collect();
        render(&library, &mut voices, &mut outputs, 0, 4);

        assert_eq!(channels[0], vec![0.0; 4]);
        assert_eq!(channels[1], vec![1.0; 4]);
        assert!(voices.is_empty());
    }

    #[test]
    fn test_render_segment_offsets() {
        let (library, id) = library_with(DecodedSample::mono(48000, vec![1.0; 3]));
        let mut voices = VoicePool::with_capacity(4);
        voices.push(Voice::new(id, 3, 0, 1.0, 0));

        let mut left = vec![0.0f32; 8];
        let mut outputs: Vec<&mut [f32]> = vec![&mut left];
        render(&library, &mut voices, &mut outputs, 4, 8);

        assert_eq!(left, vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_short_channel_buffer_is_clipped() {
        let (library, id) = library_with(DecodedSample::mono(48000, vec![1.0; 8]));
        let mut voices = VoicePool::with_capacity(4);
        voices.push(Voice::new(id, 8, 0, 1.0, 0));

        let mut left = vec![0.0f32; 3];
        let mut outputs: Vec<&mut [f32]> = vec![&mut left];
        render(&library, &mut voices, &mut outputs, 0, 8);

        assert_eq!(left, vec![1.0; 3]);
        assert!(voices.is_empty());
    }

    #[test]
    fn test_voice_with_unknown_sample_is_dropped() {
        let (library, id) = library_with(DecodedSample::mono(48000, vec![1.0; 8]));
        let mut voices = VoicePool::with_capacity(4);
        voices.push(Voice::new(id, 8, 0, 1.0, 0));
        voices.push(Voice::new(crate::library::SampleId::new(99), 8, 0, 1.0, 0));

        let mut left = vec![0.0f32; 4];
        let mut outputs: Vec<&mut [f32]> = vec![&mut left];
        render(&library, &mut voices, &mut outputs, 0, 4);

        assert_eq!(voices.len(), 1);
        assert_eq!(left, vec![1.0; 4]);
    }
}
