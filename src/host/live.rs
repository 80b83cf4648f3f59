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

//! Live playback: MIDI triggers in, cpal audio out.
//!
//! The engine is loaded before the stream is built and then moved into the
//! output callback, which owns it from that point on. Triggers arrive over a
//! bounded channel that the callback drains without blocking.

use std::fmt;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use midir::MidiInputConnection;
use tracing::{error, info, span, warn, Level};

use super::thread_priority::{
    callback_thread_priority, configure_audio_thread_priority, rt_audio_enabled,
};
use super::{midi, HostError};
use crate::engine::{Engine, Instrument};
use crate::event::TriggerEvent;

/// Largest block handed to the engine. Larger device buffers are split.
const MAX_BLOCK_FRAMES: usize = 1024;

/// Most engine output channels the live host can carry.
pub const MAX_OUTPUT_CHANNELS: usize = 32;

/// Capacity of the trigger queue and of the per-callback event list.
const TRIGGER_QUEUE_SIZE: usize = 256;

/// An output device as shown by `devices`.
pub struct DeviceInfo {
    pub name: String,
    pub host: String,
    pub max_channels: u16,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Channels={}) ({})", self.name, self.max_channels, self.host)
    }
}

/// Lists every output device across all cpal hosts.
pub fn list_devices() -> Result<Vec<DeviceInfo>, HostError> {
    Ok(output_devices()?
        .into_iter()
        .map(|(info, _)| info)
        .collect())
}

fn output_devices() -> Result<Vec<(DeviceInfo, cpal::Device)>, HostError> {
    let mut devices = Vec::new();
    for host_id in cpal::available_hosts() {
        let host = match cpal::host_from_id(host_id) {
            Ok(host) => host,
            Err(e) => {
                error!(err = %e, host = host_id.name(), "Unable to open host");
                continue;
            }
        };
        let host_devices = match host.output_devices() {
            Ok(host_devices) => host_devices,
            Err(e) => {
                error!(err = %e, host = host_id.name(), "Unable to list devices for host");
                continue;
            }
        };

        for device in host_devices {
            let max_channels = match device.supported_output_configs() {
                Ok(configs) => configs.map(|config| config.channels()).max().unwrap_or(0),
                Err(_) => continue,
            };
            if max_channels == 0 {
                continue;
            }
            devices.push((
                DeviceInfo {
                    name: device.name()?,
                    host: host_id.name().to_string(),
                    max_channels,
                },
                device,
            ));
        }
    }

    devices.sort_by(|a, b| a.0.name.cmp(&b.0.name));
    Ok(devices)
}

fn find_device(name: &str) -> Result<(DeviceInfo, cpal::Device), HostError> {
    output_devices()?
        .into_iter()
        .find(|(info, _)| info.name.trim() == name)
        .ok_or_else(|| HostError::DeviceNotFound(name.to_string()))
}

/// The sample rate the named device runs at by default. The engine must be
/// created at this rate before calling [`start`].
pub fn device_sample_rate(name: &str) -> Result<u32, HostError> {
    let (_, device) = find_device(name)?;
    Ok(device.default_output_config()?.sample_rate().0)
}

/// A running live session. Dropping it stops the stream and closes the MIDI
/// connection.
pub struct LiveSession {
    _stream: cpal::Stream,
    _midi: Option<MidiInputConnection<()>>,
    triggers: Sender<TriggerEvent>,
    device: String,
    channels: u16,
    sample_rate: u32,
}

impl LiveSession {
    /// Queues a trigger as if it had arrived over MIDI.
    pub fn trigger(&self, note: u8, velocity: u8) -> bool {
        self.triggers
            .try_send(TriggerEvent::new(0, note, velocity))
            .is_ok()
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSession")
            .field("device", &self.device)
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("midi", &self._midi.is_some())
            .finish()
    }
}

/// Opens the audio device, optionally connects a MIDI input and starts
/// streaming. `engine` must already be loaded at the device's sample rate.
pub fn start(
    mut engine: Engine,
    output_channels: usize,
    device_name: &str,
    midi_device: Option<&str>,
) -> Result<LiveSession, HostError> {
    let span = span!(Level::INFO, "start (cpal)");
    let _enter = span.enter();

    let (info, device) = find_device(device_name)?;
    let sample_rate = engine.sample_rate();

    let engine_channels = output_channels.min(MAX_OUTPUT_CHANNELS);
    if engine_channels < output_channels {
        warn!(
            requested = output_channels,
            used = engine_channels,
            "Too many output channels, extra outputs are dropped"
        );
    }
    let stream_channels = info.max_channels.min(engine_channels.max(1) as u16);
    if (stream_channels as usize) < engine_channels {
        warn!(
            device = info.name,
            device_channels = info.max_channels,
            engine_channels,
            "Device has fewer channels than the kit, extra outputs are dropped"
        );
    }

    let (sender, receiver) = crossbeam_channel::bounded(TRIGGER_QUEUE_SIZE);
    let midi = match midi_device {
        Some(name) => Some(midi::connect(name, sender.clone())?),
        None => None,
    };

    let config = cpal::StreamConfig {
        channels: stream_channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    engine.activate();
    let mut callback = OutputCallback::new(engine, receiver, engine_channels, stream_channels as usize);
    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| callback.fill(data),
        |err| error!("CPAL output stream error: {}", err),
        None,
    )?;
    stream.play()?;

    info!(
        device = info.name,
        channels = stream_channels,
        sample_rate,
        midi = midi_device.unwrap_or("none"),
        "Live playback started"
    );

    Ok(LiveSession {
        _stream: stream,
        _midi: midi,
        triggers: sender,
        device: info.name,
        channels: stream_channels,
        sample_rate,
    })
}

/// State owned by the audio callback. Everything is allocated up front.
struct OutputCallback {
    engine: Engine,
    triggers: Receiver<TriggerEvent>,
    events: Vec<TriggerEvent>,
    /// Planar engine output, `engine_channels` runs of `MAX_BLOCK_FRAMES`.
    scratch: Vec<f32>,
    engine_channels: usize,
    stream_channels: usize,
    priority: u8,
    rt_audio: bool,
    priority_set: bool,
}

impl OutputCallback {
    fn new(
        engine: Engine,
        triggers: Receiver<TriggerEvent>,
        engine_channels: usize,
        stream_channels: usize,
    ) -> Self {
        Self {
            engine,
            triggers,
            events: Vec::with_capacity(TRIGGER_QUEUE_SIZE),
            scratch: vec![0.0; engine_channels * MAX_BLOCK_FRAMES],
            engine_channels,
            stream_channels,
            priority: callback_thread_priority(),
            rt_audio: rt_audio_enabled(),
            priority_set: false,
        }
    }

    /// Fills one interleaved device buffer.
    fn fill(&mut self, data: &mut [f32]) {
        configure_audio_thread_priority(self.priority, self.rt_audio, &mut self.priority_set);

        if self.stream_channels == 0 {
            data.fill(0.0);
            return;
        }

        // Everything queued since the last callback plays at the start of
        // this buffer.
        self.events.clear();
        while self.events.len() < self.events.capacity() {
            match self.triggers.try_recv() {
                Ok(event) => self.events.push(event),
                Err(_) => break,
            }
        }

        let max_frames = MAX_BLOCK_FRAMES * self.stream_channels;
        for (index, chunk) in data.chunks_mut(max_frames).enumerate() {
            let frames = chunk.len() / self.stream_channels;
            let events: &[TriggerEvent] = if index == 0 { &self.events } else { &[] };
            render_planar(
                &mut self.engine,
                &mut self.scratch,
                self.engine_channels,
                frames,
                events,
            );
            self.interleave(chunk, frames);
        }
    }

    fn interleave(&self, chunk: &mut [f32], frames: usize) {
        for (frame, out) in chunk.chunks_mut(self.stream_channels).take(frames).enumerate() {
            for (channel, sample) in out.iter_mut().enumerate() {
                *sample = if channel < self.engine_channels {
                    self.scratch[channel * MAX_BLOCK_FRAMES + frame]
                } else {
                    0.0
                };
            }
        }
        // Trailing samples that don't form a full frame.
        let used = frames * self.stream_channels;
        chunk[used..].fill(0.0);
    }
}

/// Runs the engine into the planar scratch buffer without allocating.
fn render_planar(
    engine: &mut Engine,
    scratch: &mut [f32],
    channels: usize,
    frames: usize,
    events: &[TriggerEvent],
) {
    let mut outputs: [&mut [f32]; MAX_OUTPUT_CHANNELS] = Default::default();
    for (slot, channel) in outputs.iter_mut().zip(scratch.chunks_mut(MAX_BLOCK_FRAMES)) {
        *slot = &mut channel[..frames];
    }
    engine.run(frames, events, &mut outputs[..channels.min(MAX_OUTPUT_CHANNELS)]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::LibraryBuilder;
    use crate::samples::DecodedSample;

    fn callback(engine_channels: usize, stream_channels: usize) -> (OutputCallback, Sender<TriggerEvent>) {
        let mut builder = LibraryBuilder::new();
        builder.add_sample(36, 0, 1, 127, DecodedSample::mono(48000, vec![1.0; 3000]));
        builder.add_sample(38, 1, 1, 127, DecodedSample::mono(48000, vec![0.5; 3000]));
        let engine = Engine::with_library(48000, 16, builder.build().0);

        let (sender, receiver) = crossbeam_channel::bounded(TRIGGER_QUEUE_SIZE);
        let mut callback = OutputCallback::new(engine, receiver, engine_channels, stream_channels);
        // Keep tests off the scheduler.
        callback.priority_set = true;
        (callback, sender)
    }

    #[test]
    fn test_interleaves_engine_outputs() {
        let (mut callback, sender) = callback(2, 2);
        sender.send(TriggerEvent::new(0, 36, 127)).unwrap();
        sender.send(TriggerEvent::new(0, 38, 127)).unwrap();

        let mut data = vec![9.0f32; 8];
        callback.fill(&mut data);
        assert_eq!(data, vec![1.0, 0.5, 1.0, 0.5, 1.0, 0.5, 1.0, 0.5]);
    }

    #[test]
    fn test_device_with_more_channels_gets_silence() {
        let (mut callback, sender) = callback(1, 3);
        sender.send(TriggerEvent::new(0, 36, 127)).unwrap();
        sender.send(TriggerEvent::new(0, 38, 127)).unwrap();

        let mut data = vec![9.0f32; 6];
        callback.fill(&mut data);
        assert_eq!(data, vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_large_buffers_are_split() {
        let (mut callback, sender) = callback(2, 2);
        sender.send(TriggerEvent::new(0, 36, 127)).unwrap();

        let frames = MAX_BLOCK_FRAMES * 2 + 10;
        let mut data = vec![9.0f32; frames * 2];
        callback.fill(&mut data);

        assert!(data.chunks(2).all(|frame| frame == [1.0, 0.0]));
        // The trigger is applied once, not once per chunk.
        assert_eq!(callback.engine.active_voices(), 1);
    }

    #[test]
    fn test_no_triggers_is_silence() {
        let (mut callback, _sender) = callback(2, 2);
        let mut data = vec![9.0f32; 64];
        callback.fill(&mut data);
        assert!(data.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_partial_trailing_frame_is_zeroed() {
        let (mut callback, sender) = callback(2, 2);
        sender.send(TriggerEvent::new(0, 36, 127)).unwrap();
        let mut data = vec![9.0f32; 5];
        callback.fill(&mut data);
        assert_eq!(data, vec![1.0, 0.0, 1.0, 0.0, 0.0]);
    }
}
