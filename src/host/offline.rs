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

//! Renders a standard MIDI file through the engine into a multichannel WAV.

use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::time::Duration;

use hound::{SampleFormat, WavSpec, WavWriter};
use midly::{Format, MidiMessage, Smf};
use nodi::timers::Ticker;
use nodi::{Connection, MidiEvent, Player, Sheet, Timer};
use tracing::{debug, info, span, Level};

use super::HostError;
use crate::engine::{Engine, Instrument};
use crate::event::TriggerEvent;

/// Tempo used until the file sets one: 120 BPM.
const DEFAULT_TEMPO_MICROS: u32 = 500_000;

/// A trigger at an absolute frame position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimedTrigger {
    pub frame: u64,
    pub note: u8,
    pub velocity: u8,
}

/// How an offline render is blocked and laid out.
#[derive(Clone, Copy, Debug)]
pub struct RenderSettings {
    /// Frames per engine block.
    pub block_size: usize,
    /// Number of output channels written to the WAV file.
    pub output_channels: usize,
    /// Upper bound on how long voices may ring after the last trigger, in frames.
    pub max_tail_frames: u64,
}

/// What a render produced.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderSummary {
    pub triggers: usize,
    pub frames: u64,
    pub peak: f32,
}

/// Reads a MIDI file and converts its note-ons to absolute frames.
pub fn read_midi_triggers(path: &Path, sample_rate: u32) -> Result<Vec<TimedTrigger>, HostError> {
    let buf = fs::read(path)?;
    let triggers = parse_midi_triggers(&buf, sample_rate)?;
    debug!(path = ?path, triggers = triggers.len(), "MIDI file parsed");
    Ok(triggers)
}

/// Converts the note-ons of an in-memory MIDI file to absolute frames.
/// Single-track and sequential files play their tracks one after another,
/// parallel files play them together. Note On with velocity 0 is dropped.
pub fn parse_midi_triggers(buf: &[u8], sample_rate: u32) -> Result<Vec<TimedTrigger>, HostError> {
    let smf = Smf::parse(buf)?;
    let mut ticker =
        Ticker::try_from(smf.header.timing).map_err(|e| HostError::MidiTiming(e.to_string()))?;
    ticker.change_tempo(DEFAULT_TEMPO_MICROS);

    let sheet = match smf.header.format {
        Format::SingleTrack | Format::Sequential => Sheet::sequential(&smf.tracks),
        Format::Parallel => Sheet::parallel(&smf.tracks),
    };

    let elapsed = Cell::new(Duration::ZERO);
    let mut triggers = Vec::new();
    {
        let mut player = Player::new(
            RenderTimer {
                timer: ticker,
                elapsed: &elapsed,
            },
            TriggerConnection {
                elapsed: &elapsed,
                sample_rate,
                triggers: &mut triggers,
            },
        );
        player.play(&sheet);
    }
    Ok(triggers)
}

/// A nodi timer that advances a clock instead of sleeping, so a whole file is
/// walked as fast as it can be read.
struct RenderTimer<'a, T: Timer> {
    timer: T,
    elapsed: &'a Cell<Duration>,
}

impl<T: Timer> Timer for RenderTimer<'_, T> {
    fn sleep_duration(&mut self, n_ticks: u32) -> Duration {
        self.timer.sleep_duration(n_ticks)
    }

    fn change_tempo(&mut self, tempo: u32) {
        self.timer.change_tempo(tempo);
    }

    fn sleep(&mut self, n_ticks: u32) {
        let duration = self.timer.sleep_duration(n_ticks);
        self.elapsed.set(self.elapsed.get() + duration);
    }
}

/// A nodi connection that records note-ons at the current clock position.
struct TriggerConnection<'a> {
    elapsed: &'a Cell<Duration>,
    sample_rate: u32,
    triggers: &'a mut Vec<TimedTrigger>,
}

impl Connection for TriggerConnection<'_> {
    fn play(&mut self, event: MidiEvent) -> bool {
        if let MidiMessage::NoteOn { key, vel } = event.message {
            if vel.as_int() > 0 {
                let seconds = self.elapsed.get().as_secs_f64();
                self.triggers.push(TimedTrigger {
                    frame: (seconds * f64::from(self.sample_rate)).round() as u64,
                    note: key.as_int(),
                    velocity: vel.as_int(),
                });
            }
        }
        true
    }
}

/// Runs the triggers through the engine block by block and hands each
/// rendered block to `sink` as planar channels. Rendering continues after the
/// last trigger until every voice is done or the tail limit is hit.
pub fn render_blocks<F>(
    engine: &mut Engine,
    triggers: &[TimedTrigger],
    settings: &RenderSettings,
    mut sink: F,
) -> Result<RenderSummary, HostError>
where
    F: FnMut(&[Vec<f32>], usize) -> Result<(), HostError>,
{
    if settings.block_size == 0 {
        return Err(HostError::InvalidBlockSize(settings.block_size));
    }
    let block_size = settings.block_size as u64;
    let last_frame = triggers.iter().map(|t| t.frame).max().unwrap_or(0);
    let end_limit = last_frame + settings.max_tail_frames;

    let mut channels = vec![vec![0.0f32; settings.block_size]; settings.output_channels];
    let mut events = Vec::with_capacity(triggers.len().min(1024));
    let mut summary = RenderSummary {
        triggers: triggers.len(),
        ..Default::default()
    };

    engine.activate();
    let mut next = 0;
    let mut block_start: u64 = 0;
    loop {
        let block_end = block_start + block_size;
        let pending = next < triggers.len();
        if !pending && block_start > last_frame && engine.active_voices() == 0 {
            break;
        }
        if block_start >= end_limit && !pending {
            break;
        }

        events.clear();
        while next < triggers.len() && triggers[next].frame < block_end {
            let trigger = triggers[next];
            let offset = trigger.frame.saturating_sub(block_start) as u32;
            events.push(TriggerEvent::new(offset, trigger.note, trigger.velocity));
            next += 1;
        }

        {
            let mut outputs: Vec<&mut [f32]> = channels.iter_mut().map(|c| c.as_mut_slice()).collect();
            engine.run(settings.block_size, &events, &mut outputs);
        }

        summary.peak = channels
            .iter()
            .flatten()
            .fold(summary.peak, |peak, s| peak.max(s.abs()));
        sink(&channels, settings.block_size)?;
        summary.frames += block_size;
        block_start = block_end;
    }
    engine.deactivate();

    Ok(summary)
}

/// Renders the triggers into a 32-bit float WAV file with one channel per
/// engine output.
pub fn render_to_wav(
    engine: &mut Engine,
    triggers: &[TimedTrigger],
    out: &Path,
    settings: &RenderSettings,
) -> Result<RenderSummary, HostError> {
    let span = span!(Level::INFO, "render (offline)");
    let _enter = span.enter();

    let spec = WavSpec {
        channels: settings.output_channels as u16,
        sample_rate: engine.sample_rate(),
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(out, spec)?;

    let summary = render_blocks(engine, triggers, settings, |channels, frames| {
        for frame in 0..frames {
            for channel in channels {
                writer.write_sample(channel[frame])?;
            }
        }
        Ok(())
    })?;
    writer.finalize()?;

    info!(
        out = ?out,
        triggers = summary.triggers,
        frames = summary.frames,
        peak = summary.peak,
        "Render complete"
    );
    Ok(summary)
}
