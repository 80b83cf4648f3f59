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

//! MIDI input through midir. Incoming note-ons are parsed on the MIDI thread
//! and forwarded to the audio thread over a bounded channel.

use crossbeam_channel::{Sender, TrySendError};
use midir::{MidiInput, MidiInputConnection, MidiInputPort};
use tracing::{debug, info, span, warn, Level};

use super::HostError;
use crate::event::TriggerEvent;

/// Names of the available MIDI input ports, sorted.
pub fn list_inputs() -> Result<Vec<String>, HostError> {
    let input = MidiInput::new("multidrum input listing")?;
    let mut names = input
        .ports()
        .iter()
        .map(|port| input.port_name(port))
        .collect::<Result<Vec<String>, _>>()?;
    names.sort();
    Ok(names)
}

/// Finds the single input port whose name contains `name`.
fn find_port(input: &MidiInput, name: &str) -> Result<MidiInputPort, HostError> {
    let mut matches = Vec::new();
    for port in input.ports() {
        let port_name = input.port_name(&port)?;
        if port_name.contains(name) {
            matches.push((port_name, port));
        }
    }

    match matches.len() {
        0 => Err(HostError::DeviceNotFound(name.to_string())),
        1 => Ok(matches.swap_remove(0).1),
        _ => Err(HostError::AmbiguousDevice(
            matches
                .iter()
                .map(|(name, _)| name.clone())
                .collect::<Vec<String>>()
                .join(", "),
        )),
    }
}

/// Connects to the named input and sends every trigger to `sender`. The
/// connection lasts as long as the returned handle.
pub fn connect(name: &str, sender: Sender<TriggerEvent>) -> Result<MidiInputConnection<()>, HostError> {
    let span = span!(Level::INFO, "connect (midir)");
    let _enter = span.enter();

    let input = MidiInput::new("multidrum trigger input")?;
    let port = find_port(&input, name)?;
    let connection = input
        .connect(
            &port,
            "multidrum trigger watcher",
            move |_, raw_event, _| forward(&sender, raw_event),
            (),
        )
        .map_err(|e| HostError::Midi(e.to_string()))?;

    info!(device = name, "Watching MIDI events.");
    Ok(connection)
}

/// Parses a raw message and queues it if it is a trigger. Never blocks: when
/// the audio thread falls behind, the trigger is dropped.
fn forward(sender: &Sender<TriggerEvent>, raw_event: &[u8]) {
    let event = match TriggerEvent::from_midi(0, raw_event) {
        Some(event) => event,
        None => return,
    };
    debug!(note = event.note, velocity = event.velocity, "Received trigger.");

    match sender.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => warn!(note = event.note, "Trigger queue full, dropping trigger"),
        Err(TrySendError::Disconnected(_)) => {}
    }
}
