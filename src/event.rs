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

//! Trigger events delivered to the engine each block.

use midly::live::LiveEvent;
use midly::MidiMessage;

/// A note trigger at a frame offset inside the current block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerEvent {
    /// Frame offset from the start of the block.
    pub offset: u32,
    /// The trigger note (0-127).
    pub note: u8,
    /// The velocity (1-127). Velocity 0 is ignored by the engine.
    pub velocity: u8,
}

impl TriggerEvent {
    /// Creates a trigger event.
    pub fn new(offset: u32, note: u8, velocity: u8) -> Self {
        Self {
            offset,
            note,
            velocity,
        }
    }

    /// Parses a raw MIDI message. Only Note On with a non-zero velocity (on
    /// any channel) is a trigger. Note Off and Note On with velocity 0 are
    /// ignored because samples are one-shots.
    pub fn from_midi(offset: u32, raw: &[u8]) -> Option<Self> {
        match LiveEvent::parse(raw).ok()? {
            LiveEvent::Midi {
                message: MidiMessage::NoteOn { key, vel },
                ..
            } if u8::from(vel) > 0 => Some(Self::new(offset, key.into(), vel.into())),
            _ => None,
        }
    }
}
