//! Configuration management for the toolpath optimizer.
//!
//! Handles:
//! - Command-line argument parsing
//! - Optional TOML configuration file (CLI values win)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Deserialize;

use crate::machine::{DEFAULT_MAX_ARC_DEVIATION, DEFAULT_MIN_ARC_LINE_LENGTH};

/// Collinearity / lateral-travel tolerance used when none is configured (mm)
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// Command-line arguments for the toolpath optimizer
#[derive(Debug, Parser)]
#[command(name = "gcode-opt")]
#[command(about = "Interpret and optimize G-code toolpaths")]
#[command(version)]
pub struct Args {
    /// G-code program to process
    pub input: PathBuf,

    /// Configuration file (defaults to <config dir>/gcode-opt/config.toml)
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Maximum chord deviation for arcs in mm")]
    pub max_arc_deviation: Option<f64>,

    #[arg(long, help = "Minimum segment length for arcs in mm")]
    pub min_arc_line_length: Option<f64>,

    #[arg(long, help = "Rapid through already drilled depth")]
    pub drill: bool,

    #[arg(long, help = "Reorder down groups nearest-first")]
    pub route_grouping: bool,

    #[arg(long, help = "Use rapid moves for pure Z retractions")]
    pub lift: bool,

    #[arg(long, help = "Merge moves continuing in the same direction")]
    pub bogus: bool,

    #[arg(long, help = "Drop nearly collinear waypoints")]
    pub vector: bool,

    #[arg(long, help = "Tolerance for vector and route grouping passes in mm")]
    pub tolerance: Option<f64>,

    #[arg(long, help = "Swap the X and Y axes")]
    pub flip_xy: bool,

    #[arg(long, help = "Clamp feedrates to this value")]
    pub feed_limit: Option<f64>,

    #[arg(long, help = "Multiply all feedrates")]
    pub feed_multiplier: Option<f64>,

    #[arg(long, help = "Multiply all coordinates (changes the part!)")]
    pub move_multiplier: Option<f64>,

    #[arg(long, help = "Move the safety plane to this height")]
    pub safety_height: Option<f64>,

    #[arg(long, help = "Force the spindle on at this speed")]
    pub spindle_speed: Option<f64>,

    #[arg(long, help = "Run the forced spindle counterclockwise")]
    pub spindle_ccw: bool,

    #[arg(long, help = "Return to X0 Y0 Z0 at the end")]
    pub return_home: bool,

    #[arg(long, help = "Turn the spindle off on the final return")]
    pub disable_spindle: bool,

    #[arg(long, help = "Turn coolant off on the final return")]
    pub disable_coolant: bool,

    #[arg(long, help = "Print the final toolpath as JSON")]
    pub json: bool,

    /// Log level for the optimizer
    #[arg(long, help = "Log level (trace, debug, info, warn, error) [default: info]")]
    pub log_level: Option<String>,
}

/// Forced spindle settings
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct SpindleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub clockwise: bool,
    pub speed: f64,
}

fn default_true() -> bool {
    true
}

/// Passes to run and their parameters
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PassConfig {
    pub drill: bool,
    pub route_grouping: bool,
    pub lift: bool,
    pub bogus: bool,
    pub vector: bool,
    pub tolerance: Option<f64>,
    pub flip_xy: bool,
    pub feed_limit: Option<f64>,
    pub feed_multiplier: Option<f64>,
    pub move_multiplier: Option<f64>,
    pub safety_height: Option<f64>,
    pub spindle: Option<SpindleSettings>,
    pub return_home: bool,
    pub disable_spindle: bool,
    pub disable_coolant: bool,
}

impl PassConfig {
    pub fn tolerance(&self) -> f64 {
        self.tolerance.unwrap_or(DEFAULT_TOLERANCE)
    }
}

/// `[machine]` section of the configuration file
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MachineSection {
    pub max_arc_deviation: Option<f64>,
    pub min_arc_line_length: Option<f64>,
}

/// Configuration file layout (matches TOML)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub log_level: Option<String>,
    pub machine: MachineSection,
    pub passes: PassConfig,
}

impl FileConfig {
    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub max_arc_deviation: f64,
    pub min_arc_line_length: f64,
    pub passes: PassConfig,
    pub json: bool,
    pub log_level: String,
    /// Configuration file that was loaded, if any
    pub config_file: Option<PathBuf>,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        let config_file = match args.config.clone() {
            Some(path) => Some(path),
            None => default_config_path().filter(|path| path.is_file()),
        };

        let file = match &config_file {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let config = Self::merge(args, file, config_file);
        config.validate()?;
        Ok(config)
    }

    fn merge(args: Args, file: FileConfig, config_file: Option<PathBuf>) -> Self {
        let file_passes = file.passes;
        let spindle = args
            .spindle_speed
            .map(|speed| SpindleSettings {
                enabled: true,
                clockwise: !args.spindle_ccw,
                speed,
            })
            .or(file_passes.spindle);

        let passes = PassConfig {
            drill: args.drill || file_passes.drill,
            route_grouping: args.route_grouping || file_passes.route_grouping,
            lift: args.lift || file_passes.lift,
            bogus: args.bogus || file_passes.bogus,
            vector: args.vector || file_passes.vector,
            tolerance: args.tolerance.or(file_passes.tolerance),
            flip_xy: args.flip_xy || file_passes.flip_xy,
            feed_limit: args.feed_limit.or(file_passes.feed_limit),
            feed_multiplier: args.feed_multiplier.or(file_passes.feed_multiplier),
            move_multiplier: args.move_multiplier.or(file_passes.move_multiplier),
            safety_height: args.safety_height.or(file_passes.safety_height),
            spindle,
            return_home: args.return_home || file_passes.return_home,
            disable_spindle: args.disable_spindle || file_passes.disable_spindle,
            disable_coolant: args.disable_coolant || file_passes.disable_coolant,
        };

        Config {
            input: args.input,
            max_arc_deviation: args
                .max_arc_deviation
                .or(file.machine.max_arc_deviation)
                .unwrap_or(DEFAULT_MAX_ARC_DEVIATION),
            min_arc_line_length: args
                .min_arc_line_length
                .or(file.machine.min_arc_line_length)
                .unwrap_or(DEFAULT_MIN_ARC_LINE_LENGTH),
            passes,
            json: args.json,
            log_level: args
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| "info".to_string()),
            config_file,
        }
    }

    /// Reject values no pass can work with
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("max_arc_deviation", Some(self.max_arc_deviation)),
            ("min_arc_line_length", Some(self.min_arc_line_length)),
            ("tolerance", self.passes.tolerance),
            ("feed_limit", self.passes.feed_limit),
            ("feed_multiplier", self.passes.feed_multiplier),
            ("move_multiplier", self.passes.move_multiplier),
        ];
        for (name, value) in positive {
            if let Some(value) = value
                && !(value > 0.0 && value.is_finite())
            {
                bail!("{} must be a positive number, got {}", name, value);
            }
        }

        if let Some(spindle) = self.passes.spindle
            && (spindle.speed < 0.0 || !spindle.speed.is_finite())
        {
            bail!("spindle speed must not be negative, got {}", spindle.speed);
        }

        Ok(())
    }
}

/// `<config dir>/gcode-opt/config.toml`, if a config directory exists
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gcode-opt").join("config.toml"))
}
