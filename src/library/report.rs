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

use std::fmt;

use tracing::{info, warn};

/// A declared asset that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFailure {
    /// The archive path of the asset.
    pub path: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Outcome of building a library. Asset problems never stop the build; they
/// are collected here and reported once at the end.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Number of assets the kit declared.
    pub declared: usize,
    /// Number of assets decoded into the library.
    pub loaded: usize,
    /// Declared assets the archive does not contain.
    pub missing: Vec<String>,
    /// Assets that were present but could not be read or decoded.
    pub failed: Vec<AssetFailure>,
    /// Number of notes with at least one playable sample.
    pub notes: usize,
    /// Memory held by decoded samples, in bytes.
    pub memory_bytes: usize,
}

impl LoadReport {
    /// Returns true if every declared asset was loaded.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty()
    }

    pub(crate) fn record_missing(&mut self, path: String) {
        self.missing.push(path);
    }

    pub(crate) fn record_failure(&mut self, path: String, reason: String) {
        self.failed.push(AssetFailure { path, reason });
    }

    /// Emits the report through tracing.
    pub fn log(&self) {
        for path in &self.missing {
            warn!(path, "Sample not found in archive");
        }
        for failure in &self.failed {
            warn!(path = failure.path, reason = failure.reason, "Sample skipped");
        }
        info!(
            notes = self.notes,
            declared = self.declared,
            loaded = self.loaded,
            missing = self.missing.len(),
            failed = self.failed.len(),
            memory_kb = self.memory_bytes / 1024,
            "Kit loaded"
        );
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Notes: {}", self.notes)?;
        writeln!(f, "Samples: {}/{} loaded", self.loaded, self.declared)?;
        writeln!(f, "Memory: {} KiB", self.memory_bytes / 1024)?;
        if !self.missing.is_empty() {
            writeln!(f, "Missing (count: {}):", self.missing.len())?;
            for path in &self.missing {
                writeln!(f, "- {}", path)?;
            }
        }
        if !self.failed.is_empty() {
            writeln!(f, "Failed (count: {}):", self.failed.len())?;
            for failure in &self.failed {
                writeln!(f, "- {}: {}", failure.path, failure.reason)?;
            }
        }
        Ok(())
    }
}
