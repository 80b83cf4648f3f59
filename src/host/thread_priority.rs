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

use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::{info, warn};

/// Default priority for the audio callback thread when MULTIDRUM_THREAD_PRIORITY is unset.
const DEFAULT_CALLBACK_THREAD_PRIORITY: u8 = 70;

/// Reads MULTIDRUM_THREAD_PRIORITY (0-99) once, before the stream is built,
/// so the callback never touches the environment.
pub fn callback_thread_priority() -> u8 {
    std::env::var("MULTIDRUM_THREAD_PRIORITY")
        .ok()
        .and_then(|v| parse_priority(&v))
        .unwrap_or(DEFAULT_CALLBACK_THREAD_PRIORITY)
}

fn parse_priority(value: &str) -> Option<u8> {
    let n = value.trim().parse::<u8>().ok()?;
    (n < 100).then_some(n)
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    value == "1"
        || value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("yes")
        || value.eq_ignore_ascii_case("on")
}

/// Returns whether to attempt RT (SCHED_FIFO) scheduling for the audio callback thread.
/// Enabled unless MULTIDRUM_DISABLE_RT_AUDIO is set.
pub fn rt_audio_enabled() -> bool {
    !env_flag("MULTIDRUM_DISABLE_RT_AUDIO")
}

/// Raises the priority of the calling thread. Runs once per thread; later
/// calls return immediately.
pub fn configure_audio_thread_priority(priority: u8, rt_audio: bool, priority_set: &mut bool) {
    if *priority_set {
        return;
    }
    *priority_set = true;

    let priority = match ThreadPriorityValue::try_from(priority) {
        Ok(priority) => priority,
        Err(e) => {
            warn!(priority, error = ?e, "Invalid audio callback thread priority");
            return;
        }
    };
    let tp = ThreadPriority::Crossplatform(priority);
    if let Err(e) = set_current_thread_priority(tp) {
        warn!(error = ?e, "Failed to raise audio callback thread priority");
    }

    #[cfg(unix)]
    if rt_audio {
        use thread_priority::unix::{
            set_thread_priority_and_policy, thread_native_id, RealtimeThreadSchedulePolicy,
            ThreadSchedulePolicy,
        };
        match set_thread_priority_and_policy(
            thread_native_id(),
            tp,
            ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo),
        ) {
            Ok(()) => info!("Enabled RT SCHED_FIFO for audio callback thread"),
            Err(e) => warn!(error = %e, "Failed to set RT SCHED_FIFO for audio callback thread"),
        }
    }
    #[cfg(not(unix))]
    let _ = rt_audio;
}
