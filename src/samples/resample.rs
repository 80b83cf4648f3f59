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
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use super::SampleError;

/// Input block size for the sinc resampler.
const INPUT_BLOCK_SIZE: usize = 1024;

fn sinc_params() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        oversampling_factor: 128,
        interpolation: SincInterpolationType::Linear,
        window: WindowFunction::BlackmanHarris2,
    }
}

/// Resamples planar channels with a band-limited sinc resampler. Each output
/// channel is `ceil(frames * target_rate / source_rate)` frames long and lines
/// up with the input: the filter delay is dropped and the tail is flushed.
pub(crate) fn resample(
    channels: &[&[f32]],
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<Vec<f32>>, SampleError> {
    let failed = || SampleError::ResamplingFailed(source_rate, target_rate);
    if source_rate == 0 || target_rate == 0 {
        return Err(failed());
    }

    let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
    if frames == 0 {
        return Ok(vec![Vec::new(); channels.len()]);
    }
    let target_frames =
        (frames as f64 * f64::from(target_rate) / f64::from(source_rate)).ceil() as usize;

    let mut resampler = SincFixedIn::<f32>::new(
        f64::from(target_rate) / f64::from(source_rate),
        1.0,
        sinc_params(),
        INPUT_BLOCK_SIZE,
        channels.len(),
    )
    .map_err(|_e| failed())?;
    let delay = resampler.output_delay();
    let wanted = delay + target_frames;

    let mut output = vec![Vec::with_capacity(wanted + resampler.output_frames_max()); channels.len()];
    let mut scratch = resampler.output_buffer_allocate(true);
    let mut position = 0;

    while output.first().map_or(0, Vec::len) < wanted {
        let end = (position + INPUT_BLOCK_SIZE).min(frames);
        let input: Vec<&[f32]> = channels.iter().map(|c| &c[position..end]).collect();

        let result = if end - position == INPUT_BLOCK_SIZE {
            resampler.process_into_buffer(&input, &mut scratch, None)
        } else if end > position {
            // The last partial block, zero padded.
            resampler.process_partial_into_buffer(Some(input.as_slice()), &mut scratch, None)
        } else {
            // Input is used up, push silence through to flush the filter.
            resampler.process_partial_into_buffer(None::<&[&[f32]]>, &mut scratch, None)
        };
        let (_, written) = result.map_err(|_e| failed())?;
        position = end;

        if written == 0 {
            break;
        }
        for (out, chunk) in output.iter_mut().zip(&scratch) {
            out.extend_from_slice(&chunk[..written]);
        }
    }

    for channel in output.iter_mut() {
        channel.drain(..delay.min(channel.len()));
        channel.resize(target_frames, 0.0);
    }
    Ok(output)
}
