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

use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use super::error::SampleError;
use super::sample::DecodedSample;

/// Decodes an encoded audio blob (WAV, FLAC, etc.) into a sample, applying the
/// channel policy of [`DecodedSample::from_interleaved`]. The extension is
/// only a hint for format probing.
pub fn decode(
    bytes: Vec<u8>,
    extension: Option<&str>,
    force_stereo: bool,
) -> Result<DecodedSample, SampleError> {
    let (interleaved, channels, sample_rate) = decode_interleaved(bytes, extension)?;
    if channels == 0 || interleaved.len() < channels {
        return Err(SampleError::Empty);
    }

    let sample =
        DecodedSample::from_interleaved(&interleaved, channels, sample_rate, force_stereo);
    if sample.is_empty() {
        return Err(SampleError::Empty);
    }
    Ok(sample)
}

/// Like [`decode`], taking the format hint from a logical path.
pub fn decode_path(
    bytes: Vec<u8>,
    path: &str,
    force_stereo: bool,
) -> Result<DecodedSample, SampleError> {
    let extension = Path::new(path).extension().and_then(|ext| ext.to_str());
    decode(bytes, extension, force_stereo)
}

/// Decodes every packet of the first audio track. Returns the interleaved
/// frames, the channel count and the sample rate.
fn decode_interleaved(
    bytes: Vec<u8>,
    extension: Option<&str>,
) -> Result<(Vec<f32>, usize, u32), SampleError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = extension {
        hint.with_extension(extension);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(SampleError::NoAudioTrack)?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let sample_rate = params.sample_rate.ok_or(SampleError::UnknownSampleRate)?;
    let mut channels = params.channels.map(|c| c.count()).unwrap_or(0);
    let mut decoder = get_codecs().make(&params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet)?;
        let spec = *decoded.spec();
        if channels == 0 {
            channels = spec.channels.count();
        }
        if decoded.frames() == 0 {
            continue;
        }

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    Ok((samples, channels, sample_rate))
}
