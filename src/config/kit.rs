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

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ::config::{Config, File, FileFormat};
use serde::Deserialize;
use tracing::debug;

use super::error::ConfigError;

/// Default maximum number of concurrent voices.
pub const DEFAULT_MAX_VOICES: usize = 128;

/// Default number of output channels (mono slots; stereo sources use two).
pub const DEFAULT_OUTPUT_CHANNELS: usize = 12;

/// The kit shipped with the crate.
const DEFAULT_KIT: &str = include_str!("../../assets/kit.yaml");

/// A YAML representation of a drum kit.
#[derive(Deserialize, Clone, Debug)]
pub struct KitConfig {
    /// The sample archive, relative to the kit file unless absolute.
    archive: PathBuf,

    /// Maximum number of concurrent voices.
    #[serde(default = "default_max_voices")]
    max_voices: usize,

    /// Number of output channels the kit writes to.
    #[serde(default = "default_output_channels")]
    output_channels: usize,

    /// Whether samples are converted to the engine sample rate on load.
    #[serde(default = "default_resample")]
    resample: bool,

    /// Instrument declarations, in the order they are built.
    #[serde(default)]
    instruments: Vec<InstrumentDeclaration>,

    /// Mutually exclusive note families.
    #[serde(default)]
    choke_groups: Vec<ChokeGroup>,

    /// Directory the kit was loaded from.
    #[serde(skip)]
    base_path: PathBuf,
}

fn default_max_voices() -> usize {
    DEFAULT_MAX_VOICES
}

fn default_output_channels() -> usize {
    DEFAULT_OUTPUT_CHANNELS
}

fn default_resample() -> bool {
    true
}

impl KitConfig {
    /// Creates a kit from parts.
    pub fn new(
        archive: PathBuf,
        instruments: Vec<InstrumentDeclaration>,
        choke_groups: Vec<ChokeGroup>,
    ) -> Self {
        Self {
            archive,
            max_voices: DEFAULT_MAX_VOICES,
            output_channels: DEFAULT_OUTPUT_CHANNELS,
            resample: true,
            instruments,
            choke_groups,
            base_path: PathBuf::new(),
        }
    }

    /// Loads and validates a kit file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut kit: KitConfig = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        kit.base_path = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        kit.validate()?;

        debug!(
            path = ?path,
            instruments = kit.instruments.len(),
            choke_groups = kit.choke_groups.len(),
            "Kit file loaded"
        );
        Ok(kit)
    }

    /// Parses and validates a kit from YAML. Relative archive paths resolve
    /// against `base_path`.
    pub fn from_yaml(yaml: &str, base_path: &Path) -> Result<Self, ConfigError> {
        let mut kit: KitConfig = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;
        kit.base_path = base_path.to_path_buf();
        kit.validate()?;
        Ok(kit)
    }

    /// The built-in kit, with its archive expected in `base_path`.
    pub fn default_kit(base_path: &Path) -> Result<Self, ConfigError> {
        Self::from_yaml(DEFAULT_KIT, base_path)
    }

    /// Checks the declarations against each other and the output layout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_voices == 0 {
            return Err(ConfigError::Invalid("max_voices must be at least 1".into()));
        }

        for decl in &self.instruments {
            if decl.note > 127 {
                return Err(ConfigError::Invalid(format!(
                    "note {} for sample {} is out of range (0-127)",
                    decl.note, decl.sample
                )));
            }
            if !(1..=127).contains(&decl.velocity_layers) {
                return Err(ConfigError::Invalid(format!(
                    "sample {} needs 1-127 velocity layers, got {}",
                    decl.sample, decl.velocity_layers
                )));
            }
            if decl.round_robin == 0 {
                return Err(ConfigError::Invalid(format!(
                    "sample {} needs at least one round robin variant",
                    decl.sample
                )));
            }
            let last_channel = decl.output + usize::from(decl.stereo);
            if last_channel >= self.output_channels {
                return Err(ConfigError::Invalid(format!(
                    "sample {} writes to output {} but the kit only has {} outputs",
                    decl.sample, last_channel, self.output_channels
                )));
            }
        }

        let mut seen_ids = HashSet::new();
        for group in &self.choke_groups {
            if group.id == 0 {
                return Err(ConfigError::Invalid(
                    "choke group id 0 is reserved for \"no choke group\"".into(),
                ));
            }
            if !seen_ids.insert(group.id) {
                return Err(ConfigError::Invalid(format!(
                    "choke group {} is declared twice",
                    group.id
                )));
            }
            if let Some(note) = group.notes.iter().find(|note| **note > 127) {
                return Err(ConfigError::Invalid(format!(
                    "choke group {} lists note {} which is out of range (0-127)",
                    group.id, note
                )));
            }
        }

        Ok(())
    }

    /// The archive path, resolved against the kit's directory.
    pub fn archive_path(&self) -> PathBuf {
        if self.archive.is_absolute() {
            self.archive.clone()
        } else {
            self.base_path.join(&self.archive)
        }
    }

    /// Maximum number of concurrent voices.
    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    /// Number of output channels.
    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    /// Whether samples are resampled to the engine rate.
    pub fn resample(&self) -> bool {
        self.resample
    }

    /// Instrument declarations in build order.
    pub fn instruments(&self) -> &[InstrumentDeclaration] {
        &self.instruments
    }

    /// Choke group assignments.
    pub fn choke_groups(&self) -> &[ChokeGroup] {
        &self.choke_groups
    }

    /// Sets the maximum number of voices.
    pub fn with_max_voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices;
        self
    }

    /// Sets the number of output channels.
    pub fn with_output_channels(mut self, output_channels: usize) -> Self {
        self.output_channels = output_channels;
        self
    }

    /// Enables or disables resampling on load.
    pub fn with_resample(mut self, resample: bool) -> Self {
        self.resample = resample;
        self
    }
}

/// One sample family: every velocity layer and round-robin variant of a
/// sample, mapped to a trigger note and an output channel.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct InstrumentDeclaration {
    /// The trigger note (0-127).
    pub note: u8,

    /// Base name of the sample files in the archive.
    pub sample: String,

    /// The output channel (0-indexed). Stereo samples also use `output + 1`.
    pub output: usize,

    /// Number of velocity layers, spread evenly over 1-127.
    pub velocity_layers: u8,

    /// Number of round-robin variants per velocity layer.
    pub round_robin: u8,

    /// Keep stereo sources as stereo instead of downmixing.
    #[serde(default)]
    pub stereo: bool,
}

impl InstrumentDeclaration {
    /// Creates a declaration.
    pub fn new(
        note: u8,
        sample: &str,
        output: usize,
        velocity_layers: u8,
        round_robin: u8,
        stereo: bool,
    ) -> Self {
        Self {
            note,
            sample: sample.to_string(),
            output,
            velocity_layers,
            round_robin,
            stereo,
        }
    }

    /// The archive path of one variant. Both indices are 1-based.
    pub fn asset_path(&self, velocity_layer: u8, round_robin: u8) -> String {
        format!("{}_r{}_v{:02}.wav", self.sample, round_robin, velocity_layer)
    }
}

/// Notes that silence each other.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChokeGroup {
    /// The group id. 0 is reserved for "no group".
    pub id: u32,

    /// Notes belonging to the group.
    pub notes: Vec<u8>,
}
