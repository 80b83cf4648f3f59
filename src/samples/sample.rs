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

use super::resample;
use super::SampleError;

/// One decoded, immutable audio asset. Holds one (mono) or two (stereo)
/// equal-length planar channels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedSample {
    /// Sample rate of the audio data.
    sample_rate: u32,
    /// Left channel, or the only channel for mono samples.
    left: Vec<f32>,
    /// Right channel for stereo samples.
    right: Option<Vec<f32>>,
}

impl DecodedSample {
    /// Creates a mono sample.
    pub fn mono(sample_rate: u32, data: Vec<f32>) -> Self {
        Self {
            sample_rate,
            left: data,
            right: None,
        }
    }

    /// Creates a stereo sample. The longer channel is cut to the length of the
    /// shorter one.
    pub fn stereo(sample_rate: u32, mut left: Vec<f32>, mut right: Vec<f32>) -> Self {
        let frames = left.len().min(right.len());
        left.truncate(frames);
        right.truncate(frames);
        Self {
            sample_rate,
            left,
            right: Some(right),
        }
    }

    /// Builds a sample from interleaved frames, applying the channel policy:
    ///
    /// - `force_stereo` with two or more channels keeps the first two channels.
    /// - A mono source stays mono.
    /// - Anything else is downmixed to mono by averaging every channel.
    pub fn from_interleaved(
        interleaved: &[f32],
        channels: usize,
        sample_rate: u32,
        force_stereo: bool,
    ) -> Self {
        if channels == 0 {
            return Self::mono(sample_rate, Vec::new());
        }
        let frames = interleaved.len() / channels;

        if force_stereo && channels >= 2 {
            let mut left = Vec::with_capacity(frames);
            let mut right = Vec::with_capacity(frames);
            for frame in interleaved.chunks_exact(channels) {
                left.push(frame[0]);
                right.push(frame[1]);
            }
            Self::stereo(sample_rate, left, right)
        } else if channels == 1 {
            Self::mono(sample_rate, interleaved.to_vec())
        } else {
            let scale = 1.0 / channels as f32;
            let data = interleaved
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() * scale)
                .collect();
            Self::mono(sample_rate, data)
        }
    }

    /// Number of channels (1 or 2).
    pub fn channels(&self) -> u16 {
        if self.right.is_some() {
            2
        } else {
            1
        }
    }

    /// Returns true for stereo samples.
    pub fn is_stereo(&self) -> bool {
        self.right.is_some()
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.left.len()
    }

    /// Returns true if the sample holds no audio and must not be played.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Sample rate of the audio data.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The left (or only) channel.
    pub fn left(&self) -> &[f32] {
        &self.left
    }

    /// The right channel, if stereo.
    pub fn right(&self) -> Option<&[f32]> {
        self.right.as_deref()
    }

    /// Returns the memory size in bytes.
    pub fn memory_size(&self) -> usize {
        (self.left.len() + self.right.as_ref().map_or(0, Vec::len)) * std::mem::size_of::<f32>()
    }

    /// Converts the sample to another sample rate with a band-limited sinc
    /// resampler. Runs at load time, never on the audio thread.
    pub fn resampled(&self, target_rate: u32) -> Result<Self, SampleError> {
        if target_rate == self.sample_rate || self.is_empty() {
            return Ok(Self {
                sample_rate: target_rate,
                ..self.clone()
            });
        }

        let mut channels = vec![self.left.as_slice()];
        if let Some(right) = &self.right {
            channels.push(right.as_slice());
        }
        let mut resampled = resample::resample(&channels, self.sample_rate, target_rate)?.into_iter();

        Ok(Self {
            sample_rate: target_rate,
            left: resampled.next().unwrap_or_default(),
            right: resampled.next(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_source_stays_mono() {
        let sample = DecodedSample::from_interleaved(&[0.1, 0.2, 0.3], 1, 44100, true);
        assert_eq!(sample.channels(), 1);
        assert_eq!(sample.left(), &[0.1, 0.2, 0.3]);
        assert!(sample.right().is_none());
    }

    #[test]
    fn test_force_stereo_keeps_first_two_channels() {
        // Three channels, two frames.
        let interleaved = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let sample = DecodedSample::from_interleaved(&interleaved, 3, 48000, true);
        assert!(sample.is_stereo());
        assert_eq!(sample.frames(), 2);
        assert_eq!(sample.left(), &[1.0, 4.0]);
        assert_eq!(sample.right(), Some(&[2.0, 5.0][..]));
    }

    #[test]
    fn test_stereo_without_force_is_downmixed() {
        let interleaved = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        let sample = DecodedSample::from_interleaved(&interleaved, 2, 48000, false);
        assert_eq!(sample.channels(), 1);
        assert_eq!(sample.left(), &[0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_multichannel_downmix_averages_every_channel() {
        let interleaved = [0.3, 0.6, 0.9, 0.0];
        let sample = DecodedSample::from_interleaved(&interleaved, 4, 48000, false);
        assert_eq!(sample.frames(), 1);
        assert!((sample.left()[0] - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_zero_channels_is_empty() {
        let sample = DecodedSample::from_interleaved(&[1.0, 2.0], 0, 48000, false);
        assert!(sample.is_empty());
    }

    #[test]
    fn test_stereo_channels_are_equal_length() {
        let sample = DecodedSample::stereo(48000, vec![0.0; 10], vec![0.0; 7]);
        assert_eq!(sample.frames(), 7);
        assert_eq!(sample.right().map(|r| r.len()), Some(7));
    }

    #[test]
    fn test_resample_length() {
        let source: Vec<f32> = (0..4410)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let sample = DecodedSample::mono(44100, source);

        let resampled = sample.resampled(48000).unwrap();
        assert_eq!(resampled.sample_rate(), 48000);
        assert_eq!(resampled.frames(), 4800);
        assert!(!resampled.is_stereo());
    }

    #[test]
    fn test_resample_preserves_channels() {
        let sample = DecodedSample::stereo(44100, vec![1.0; 4410], vec![-1.0; 4410]);
        let resampled = sample.resampled(48000).unwrap();
        assert!(resampled.is_stereo());
        assert_eq!(resampled.right().map(<[f32]>::len), Some(resampled.frames()));
        assert!((resampled.left()[2400] - 1.0).abs() < 1e-2);
        assert!((resampled.right().unwrap()[2400] + 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let sample = DecodedSample::mono(48000, vec![0.25, 0.5]);
        assert_eq!(sample.resampled(48000).unwrap(), sample);
    }
}
