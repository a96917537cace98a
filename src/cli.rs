//! `gcode-opt` driver
//!
//! Reads a program, interprets it, runs the configured passes and reports
//! the result either as a short summary or as JSON.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analysis::{self, PathInfo};
use crate::config::{Config, PassConfig};
use crate::machine::{Machine, Toolpath, Waypoint};
use crate::optimize;
use crate::parser::parse_program;
use crate::transform;

/// Everything printed by `--json`
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub info: Option<PathInfo>,
    pub estimated_seconds: f64,
    pub toolpath: &'a [Waypoint],
}

impl<'a> Report<'a> {
    pub fn new(toolpath: &'a [Waypoint]) -> Self {
        Report {
            info: analysis::info(toolpath),
            estimated_seconds: analysis::estimate_runtime(toolpath).as_secs_f64(),
            toolpath,
        }
    }
}

pub fn run() -> Result<()> {
    // Parse configuration from command line and config file
    let config = Config::from_args_and_env()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    if let Some(path) = &config.config_file {
        log::info!("Using config file {}", path.display());
    }

    let content = std::fs::read_to_string(&config.input)
        .with_context(|| format!("failed to read {}", config.input.display()))?;
    let toolpath = compile(&content, &config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if config.json {
        serde_json::to_writer_pretty(&mut out, &Report::new(&toolpath))
            .context("failed to write JSON report")?;
        writeln!(out)?;
    } else {
        write_summary(&mut out, &toolpath)?;
    }

    Ok(())
}

/// Interpret `content` and apply the configured passes.
pub fn compile(content: &str, config: &Config) -> Result<Toolpath> {
    let blocks = parse_program(content).context("failed to parse program")?;

    let mut machine =
        Machine::with_tolerances(config.max_arc_deviation, config.min_arc_line_length)?;
    machine
        .run_program(&blocks)
        .context("failed to interpret program")?;

    let mut toolpath = machine.into_toolpath();
    log::info!(
        "Interpreted {} blocks into {} waypoints",
        blocks.len(),
        toolpath.len()
    );

    apply_passes(&mut toolpath, &config.passes)?;
    Ok(toolpath)
}

/// Run the enabled passes in their fixed order.
///
/// Route grouping gives up on toolpaths it cannot reason about; that is
/// reported and the remaining passes still run. A safety height that
/// would collide with the part is an error.
pub fn apply_passes(toolpath: &mut Toolpath, passes: &PassConfig) -> Result<()> {
    let tolerance = passes.tolerance();

    if passes.drill {
        optimize::optimize_drill_speed(toolpath);
    }
    if passes.route_grouping
        && let Err(e) = optimize::optimize_route_grouping(toolpath, tolerance)
    {
        log::warn!("Skipping route grouping: {}", e);
    }
    if passes.lift {
        optimize::optimize_lift_speed(toolpath);
    }
    if passes.bogus {
        optimize::optimize_bogus_moves(toolpath);
    }
    if passes.vector {
        optimize::optimize_vector(toolpath, tolerance);
    }

    if passes.flip_xy {
        transform::flip_xy(toolpath);
    }
    if let Some(multiplier) = passes.feed_multiplier {
        transform::multiply_feedrate(toolpath, multiplier);
    }
    if let Some(multiplier) = passes.move_multiplier {
        log::warn!("Scaling all moves by {}", multiplier);
        transform::multiply_moves(toolpath, multiplier);
    }
    if let Some(ceiling) = passes.feed_limit {
        transform::limit_feedrate(toolpath, ceiling);
    }
    if let Some(spindle) = passes.spindle {
        transform::enforce_spindle(toolpath, spindle.enabled, spindle.clockwise, spindle.speed);
    }
    if let Some(height) = passes.safety_height {
        transform::set_safety_height(toolpath, height)
            .with_context(|| format!("failed to set safety height {}", height))?;
    }
    if passes.return_home {
        transform::return_to_origin(toolpath, passes.disable_spindle, passes.disable_coolant);
    }

    Ok(())
}

/// Human-readable summary of a toolpath
pub fn write_summary(out: &mut impl Write, toolpath: &[Waypoint]) -> Result<()> {
    writeln!(out, "Waypoints: {}", toolpath.len())?;

    if let Some(info) = analysis::info(toolpath) {
        writeln!(
            out,
            "Extent: X {:.3}..{:.3}  Y {:.3}..{:.3}  Z {:.3}..{:.3}",
            info.min.x, info.max.x, info.min.y, info.max.y, info.min.z, info.max.z
        )?;
        let feeds: Vec<String> = info.feedrates.iter().map(|f| format!("{}", f)).collect();
        writeln!(out, "Feedrates: {}", feeds.join(", "))?;
    }

    writeln!(
        out,
        "Estimated runtime: {}",
        format_duration(analysis::estimate_runtime(toolpath))
    )?;
    Ok(())
}

fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}
