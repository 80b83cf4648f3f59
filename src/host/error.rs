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

use std::io;

use crate::engine::EngineError;

/// Errors raised while setting up or running a host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Unable to parse MIDI file: {0}")]
    MidiFile(#[from] midly::Error),

    #[error("Unsupported MIDI file timing: {0}")]
    MidiTiming(String),

    #[error("Unable to write WAV file: {0}")]
    Wav(#[from] hound::Error),

    #[error("No device found with name {0}")]
    DeviceNotFound(String),

    #[error("Found too many devices that match ({0}), use a less ambiguous device name")]
    AmbiguousDevice(String),

    #[error("Audio device error: {0}")]
    Audio(String),

    #[error("MIDI device error: {0}")]
    Midi(String),

    #[error("Invalid block size: {0}")]
    InvalidBlockSize(usize),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<cpal::DevicesError> for HostError {
    fn from(e: cpal::DevicesError) -> Self {
        HostError::Audio(e.to_string())
    }
}

impl From<cpal::DeviceNameError> for HostError {
    fn from(e: cpal::DeviceNameError) -> Self {
        HostError::Audio(e.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for HostError {
    fn from(e: cpal::DefaultStreamConfigError) -> Self {
        HostError::Audio(e.to_string())
    }
}

impl From<cpal::BuildStreamError> for HostError {
    fn from(e: cpal::BuildStreamError) -> Self {
        HostError::Audio(e.to_string())
    }
}

impl From<cpal::PlayStreamError> for HostError {
    fn from(e: cpal::PlayStreamError) -> Self {
        HostError::Audio(e.to_string())
    }
}

impl From<midir::InitError> for HostError {
    fn from(e: midir::InitError) -> Self {
        HostError::Midi(e.to_string())
    }
}

impl From<midir::PortInfoError> for HostError {
    fn from(e: midir::PortInfoError) -> Self {
        HostError::Midi(e.to_string())
    }
}
