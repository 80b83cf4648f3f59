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

//! The playback engine: owns the instrument library and the voice pool, turns
//! trigger events into voices and mixes the voices into the output channels
//! one block at a time.
//!
//! Loading happens in [`Engine::load`], which must complete before the host
//! starts streaming. After that, [`Engine::process`] runs on the audio thread
//! only. It never blocks, never allocates and never fails: every per-voice or
//! per-event anomaly is a silent no-op.

mod render;
mod trigger;


use tracing::{error, info, span, Level};

use crate::archive::{Archive, ArchiveError};
use crate::config::{KitConfig, DEFAULT_MAX_VOICES};
use crate::event::TriggerEvent;
use crate::library::{Library, LibraryBuilder, LoadReport};
use crate::voice::VoicePool;

pub use trigger::{velocity_gain, GAIN_FLOOR};

/// Error types for engine initialization.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
}

/// The host-facing lifecycle of an instrument.
pub trait Instrument: Send {
    /// Called before the host starts streaming.
    fn activate(&mut self) {}

    /// Processes one block: applies the events and writes `frames` frames to
    /// every output channel.
    fn run(&mut self, frames: usize, events: &[TriggerEvent], outputs: &mut [&mut [f32]]);

    /// Called after the host stops streaming.
    fn deactivate(&mut self) {}
}

/// The sample playback engine.
pub struct Engine {
    /// Output sample rate, fixed for the engine's lifetime.
    sample_rate: u32,
    /// The loaded library. `None` until a kit loads successfully; an unloaded
    /// engine renders silence.
    library: Option<Library>,
    /// Active voices.
    voices: VoicePool,
}

impl Engine {
    /// Creates an engine with no kit loaded.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            library: None,
            voices: VoicePool::with_capacity(DEFAULT_MAX_VOICES),
        }
    }

    /// Creates an engine around an already built library.
    pub fn with_library(sample_rate: u32, max_voices: usize, library: Library) -> Self {
        Self {
            sample_rate,
            library: Some(library),
            voices: VoicePool::with_capacity(max_voices),
        }
    }

    /// Opens the kit's archive and builds the library. Missing or broken
    /// assets are reported but don't fail the load; an unreadable archive
    /// does, and leaves the engine unloaded.
    pub fn load(&mut self, kit: &KitConfig) -> Result<LoadReport, EngineError> {
        let span = span!(Level::INFO, "load kit");
        let _enter = span.enter();

        self.library = None;
        self.voices = VoicePool::with_capacity(kit.max_voices());

        if self.sample_rate == 0 {
            error!("No sample rate available, engine stays silent");
            return Err(EngineError::InvalidSampleRate(self.sample_rate));
        }

        let archive_path = kit.archive_path();
        info!(archive = ?archive_path, sample_rate = self.sample_rate, "Loading kit");
        let mut archive = match Archive::open(&archive_path) {
            Ok(archive) => archive,
            Err(e) => {
                error!(err = %e, "Unable to open archive, engine stays silent");
                return Err(e.into());
            }
        };

        let (library, report) =
            LibraryBuilder::from_kit(kit, &mut archive, self.sample_rate).build();
        report.log();
        self.library = Some(library);
        Ok(report)
    }

    /// Processes one block of `frames` frames. Every output channel is
    /// cleared first. Events are applied at their frame offsets; offsets past
    /// the block are clamped to its end, and an event earlier than the
    /// previous one plays at the previous one's offset.
    pub fn process(&mut self, frames: usize, events: &[TriggerEvent], outputs: &mut [&mut [f32]]) {
        for channel in outputs.iter_mut() {
            let len = frames.min(channel.len());
            channel[..len].fill(0.0);
        }

        let library = match self.library.as_mut() {
            Some(library) => library,
            None => return,
        };

        let mut rendered = 0;
        for event in events {
            let offset = (event.offset as usize).min(frames);
            if offset > rendered {
                render::render(library, &mut self.voices, outputs, rendered, offset);
                rendered = offset;
            }
            trigger::dispatch(library, &mut self.voices, event.note, event.velocity);
        }
        if frames > rendered {
            render::render(library, &mut self.voices, outputs, rendered, frames);
        }
    }

    /// Triggers a note immediately, outside of block processing.
    pub fn trigger(&mut self, note: u8, velocity: u8) -> usize {
        match self.library.as_mut() {
            Some(library) => trigger::dispatch(library, &mut self.voices, note, velocity),
            None => 0,
        }
    }

    /// Stops every voice.
    pub fn reset(&mut self) {
        self.voices.clear();
    }

    /// Returns true once a kit is loaded.
    pub fn is_loaded(&self) -> bool {
        self.library.is_some()
    }

    /// The output sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of voices currently playing.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// The active voices.
    pub fn voices(&self) -> &VoicePool {
        &self.voices
    }

    /// The loaded library, if any.
    pub fn library(&self) -> Option<&Library> {
        self.library.as_ref()
    }
}

impl Instrument for Engine {
    fn activate(&mut self) {
        info!(
            loaded = self.is_loaded(),
            max_voices = self.voices.capacity(),
            "Engine activated"
        );
    }

    fn run(&mut self, frames: usize, events: &[TriggerEvent], outputs: &mut [&mut [f32]]) {
        self.process(frames, events, outputs);
    }

    fn deactivate(&mut self) {
        self.reset();
        info!("Engine deactivated");
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("sample_rate", &self.sample_rate)
            .field("library", &self.library)
            .field("voices", &self.voices)
            .finish()
    }
}
