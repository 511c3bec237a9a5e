use std::path::PathBuf;

use crate::config::{parse_millis, Options};
use crate::logging::LogLevel;
use anyhow::{Context, Result};
use clap::Parser;

/// Audio output for the demo driver
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioOutput {
    /// Accept every sound and play nothing
    #[default]
    Null,
    /// Play through the default output device (needs the `rodio` feature)
    Rodio,
}

/// Animated assistant engine - interactive demo driver
#[derive(Parser, Debug)]
#[command(name = "imp-engine")]
#[command(version)]
#[command(about = "Drive the animated assistant from stdin commands", long_about = None)]
pub struct Cli {
    /// Configuration file (key = value)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Preference file; preferences stay in memory when omitted
    #[arg(short, long, value_name = "FILE")]
    pub prefs: Option<PathBuf>,

    /// Directory holding sprite sheets and sounds
    #[arg(short, long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Show only the first frame of every animation
    #[arg(long)]
    pub reduced_motion: bool,

    /// Start with audio disabled unless a preference says otherwise
    #[arg(long)]
    pub mute: bool,

    /// Inactivity before mischief, in milliseconds
    #[arg(long, value_name = "MS")]
    pub mischief_delay: Option<String>,

    /// Inactivity before going dormant, in milliseconds
    #[arg(long, value_name = "MS")]
    pub dormant_delay: Option<String>,

    /// Idle animation cadence, in milliseconds
    #[arg(long, value_name = "MS")]
    pub idle_period: Option<String>,

    /// Engine pump period, in milliseconds
    #[arg(long, value_name = "MS")]
    pub tick: Option<String>,

    /// Log level (nothing, error, warning, info, debug, all)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Increase verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Audio output
    #[arg(long, value_enum, default_value_t = AudioOutput::Null)]
    pub audio: AudioOutput,
}

impl Cli {
    /// Merge CLI arguments into the options struct
    pub fn merge_into_options(&self, mut opts: Options) -> Result<Options> {
        if let Some(ref prefs) = self.prefs {
            opts.prefs_path = Some(prefs.clone());
        }
        if let Some(ref assets) = self.assets {
            opts.assets_dir = Some(assets.clone());
        }
        if self.reduced_motion {
            opts.reduced_motion = true;
        }
        if self.mute {
            opts.audio_default = false;
        }
        if let Some(ref ms) = self.mischief_delay {
            opts.mischief_delay = Self::parse_ms(ms).context("Invalid mischief delay")?;
        }
        if let Some(ref ms) = self.dormant_delay {
            opts.dormant_delay = Self::parse_ms(ms).context("Invalid dormant delay")?;
        }
        if let Some(ref ms) = self.idle_period {
            opts.idle_variety_period = Self::parse_ms(ms).context("Invalid idle period")?;
        }
        if let Some(ref ms) = self.tick {
            opts.tick = Self::parse_ms(ms).context("Invalid tick")?;
        }
        if let Some(ref level) = self.log_level {
            opts.log_level = level
                .parse::<LogLevel>()
                .map_err(anyhow::Error::msg)
                .context("Invalid log level")?;
        }
        for _ in 0..self.verbose {
            opts.log_level = opts.log_level.louder();
        }

        opts.validate()?;
        Ok(opts)
    }

    fn parse_ms(s: &str) -> Result<std::time::Duration> {
        parse_millis(s).map_err(anyhow::Error::msg)
    }
}
