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

//! Shared fixtures for unit tests: WAV blobs, archives and kit files.

use std::f32::consts::PI;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::archive::ArchiveWriter;

/// A 440Hz sine of the given length at half amplitude.
pub fn sine(frames: usize, sample_rate: u32) -> Vec<f32> {
    (0..frames)
        .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// A ramp 1/frames, 2/frames, ..., 1.0, handy for checking frame positions.
pub fn ramp(frames: usize) -> Vec<f32> {
    (1..=frames).map(|i| i as f32 / frames as f32).collect()
}

/// Encodes planar channels as a 32-bit float WAV file in memory.
pub fn wav_bytes(channels: Vec<Vec<f32>>, sample_rate: u32) -> Vec<u8> {
    encode_wav(&channels, sample_rate, 32, SampleFormat::Float)
}

/// Encodes planar channels as a 16-bit integer WAV file in memory.
pub fn wav_bytes_i16(channels: Vec<Vec<i16>>, sample_rate: u32) -> Vec<u8> {
    encode_wav(&channels, sample_rate, 16, SampleFormat::Int)
}

fn encode_wav<S: hound::Sample + Copy>(
    channels: &[Vec<S>],
    sample_rate: u32,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Vec<u8> {
    let mut bytes = Vec::new();
    let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
    {
        let mut writer = WavWriter::new(
            Cursor::new(&mut bytes),
            WavSpec {
                channels: channels.len() as u16,
                sample_rate,
                bits_per_sample,
                sample_format,
            },
        )
        .unwrap();

        for frame in 0..frames {
            for channel in channels {
                writer.write_sample(channel[frame]).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    bytes
}

/// Writes an archive holding the given (path, bytes) assets into `dir`.
pub fn write_archive(dir: &Path, assets: Vec<(String, Vec<u8>)>) -> PathBuf {
    let path = dir.join("sounds.pak");
    let mut writer = ArchiveWriter::new();
    for (name, data) in assets {
        writer.add(name, data);
    }
    writer.write(&path).unwrap();
    path
}
