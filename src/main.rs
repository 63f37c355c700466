//! Izzyblock: drag-and-drop block placement puzzle in the terminal.

mod app;
mod game;
mod input;
mod shape;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{ArgAction, Parser, ValueEnum};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{Level, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

/// Options derived from CLI that affect the game and its presentation.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Seed for the tray RNG; None draws from OS entropy.
    pub seed: Option<u64>,
    pub compact: bool,
    pub animation: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            compact: false,
            animation: true,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), args.verbose)?;
    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(theme) => theme,
        Err(err) => {
            warn!(%err, "theme not loaded, using defaults");
            theme::Theme::default()
        }
    };
    let config = GameConfig {
        seed: args.seed,
        compact: args.compact,
        animation: !args.no_animation,
    };
    let mut app = App::new(config, theme, args.frame_rate);
    app.run()
}

/// Log to `path` when given; the terminal itself is owned by the UI.
fn init_logging(path: Option<&Path>, verbose: u8) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(LevelFilter::from_level(level))
        .init();
    Ok(())
}

/// Block placement puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "izzyblock",
    version,
    about = "Drag pieces onto a 10x10 board; fill rows or columns to clear them for bonus points.",
    long_about = "Izzyblock is a terminal block placement puzzle.\n\n\
        Drag one of the three tray pieces onto the board with the mouse; it snaps to the nearest \
        spot where it fits. Full rows and columns clear for a bonus. When none of the remaining \
        pieces fits anywhere, the game is over.\n\n\
        CONTROLS:\n  Mouse drag  Place piece     Q / E       Rotate selected left / right\n  \
        1 2 3 / Tab Select piece    Arrows/hjkl Move cursor\n  Enter/Space Place at cursor  \
        R           Reset           Esc         Quit"
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]=\"value\"). Uses the slate theme if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Seed for the piece generator (same seed, same pieces).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Always use small board cells (chosen automatically when the terminal is small).
    #[arg(long)]
    pub compact: bool,

    /// Disable the line-clear fade.
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Write logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// More log detail (-v debug, -vv trace). Needs --log-file.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
