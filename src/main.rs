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

use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use multidrum::archive::{self, Archive};
use multidrum::config::KitConfig;
use multidrum::engine::Engine;
use multidrum::host::{live, midi, offline};
use multidrum::library::LoadReport;

const DEFAULT_SAMPLE_RATE: u32 = 48000;
const DEFAULT_BLOCK_SIZE: usize = 256;

/// How long voices may ring past the last trigger in an offline render.
const MAX_RENDER_TAIL: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A multi-output drum sampler."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Packs every file under a directory into a sample archive.
    Pack {
        /// The directory holding the samples.
        dir: PathBuf,
        /// The archive to write.
        out: PathBuf,
    },
    /// Lists the contents of a sample archive.
    List {
        /// The archive to read.
        archive: PathBuf,
    },
    /// Loads a kit and reports which samples could not be loaded.
    Verify {
        /// The kit file. Defaults to the built-in kit with sounds.pak in the
        /// current directory.
        #[arg(short, long)]
        kit: Option<PathBuf>,
        /// The sample rate to load the kit at.
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,
    },
    /// Renders a MIDI file through the kit into a multichannel WAV file.
    Render {
        /// The MIDI file to render.
        midi_file: PathBuf,
        /// The WAV file to write.
        out: PathBuf,
        /// The kit file.
        #[arg(short, long)]
        kit: Option<PathBuf>,
        /// The output sample rate.
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,
        /// Frames per engine block.
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Lists the available MIDI input devices.
    MidiDevices {},
    /// Plays the kit live through an audio device.
    Play {
        /// The device name to play through.
        device_name: String,
        /// The kit file.
        #[arg(short, long)]
        kit: Option<PathBuf>,
        /// The MIDI input to take triggers from.
        #[arg(short, long)]
        midi_device_name: Option<String>,
        /// Overrides the device's default sample rate.
        #[arg(short, long)]
        sample_rate: Option<u32>,
    },
}

fn load_kit(path: Option<&Path>) -> Result<KitConfig, Box<dyn Error>> {
    Ok(match path {
        Some(path) => KitConfig::load(path)?,
        None => KitConfig::default_kit(&std::env::current_dir()?)?,
    })
}

fn print_report(report: &LoadReport) {
    print!("{}", report);
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pack { dir, out } => {
            let count = archive::pack_directory(&dir, &out)?;
            println!("Packed {} files into {}.", count, out.display());
        }
        Commands::List { archive } => {
            let archive = Archive::open(&archive)?;
            if archive.is_empty() {
                println!("No entries found.");
                return Ok(());
            }

            println!("Entries (count: {}):", archive.len());
            for (path, entry) in archive.entries() {
                println!("- {} ({} bytes)", path, entry.size);
            }
        }
        Commands::Verify { kit, sample_rate } => {
            let kit = load_kit(kit.as_deref())?;
            let mut engine = Engine::new(sample_rate);
            let report = engine.load(&kit)?;
            print_report(&report);

            if !report.is_complete() {
                return Err(format!(
                    "{} of {} samples could not be loaded",
                    report.declared - report.loaded,
                    report.declared
                )
                .into());
            }
        }
        Commands::Render {
            midi_file,
            out,
            kit,
            sample_rate,
            block_size,
        } => {
            let kit = load_kit(kit.as_deref())?;
            let mut engine = Engine::new(sample_rate);
            let report = engine.load(&kit)?;
            if !report.is_complete() {
                print_report(&report);
            }

            let triggers = offline::read_midi_triggers(&midi_file, sample_rate)?;
            let settings = offline::RenderSettings {
                block_size,
                output_channels: kit.output_channels(),
                max_tail_frames: MAX_RENDER_TAIL.as_secs() * u64::from(sample_rate),
            };
            let summary = offline::render_to_wav(&mut engine, &triggers, &out, &settings)?;
            println!(
                "Rendered {} triggers, {:.2}s, peak {:.3} to {}.",
                summary.triggers,
                summary.frames as f64 / f64::from(sample_rate),
                summary.peak,
                out.display()
            );
        }
        Commands::Devices {} => {
            let devices = live::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::MidiDevices {} => {
            let devices = midi::list_inputs()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Play {
            device_name,
            kit,
            midi_device_name,
            sample_rate,
        } => {
            let kit = load_kit(kit.as_deref())?;
            let sample_rate = match sample_rate {
                Some(sample_rate) => sample_rate,
                None => live::device_sample_rate(&device_name)?,
            };

            let mut engine = Engine::new(sample_rate);
            let report = engine.load(&kit)?;
            if !report.is_complete() {
                print_report(&report);
            }

            let session = live::start(
                engine,
                kit.output_channels(),
                &device_name,
                midi_device_name.as_deref(),
            )?;
            println!(
                "Playing through {} ({} channels, {} Hz). Press Enter to stop.",
                session.device(),
                session.channels(),
                session.sample_rate()
            );

            let mut line = String::new();
            io::stdin().read_line(&mut line)?;
            drop(session);
        }
    }

    Ok(())
}
