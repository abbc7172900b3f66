//! gemtui: match-three gem puzzle in the terminal.

mod app;
mod fx;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use gemtui::engine::EngineConfig;
use simplelog::{LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args)?;
    args.engine_config(args.difficulty)
        .validate()
        .context("invalid board options")?;

    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|err| {
        log::warn!("theme not loaded, using defaults: {err}");
        theme::Theme::default_for_palette(args.palette)
    });
    let mut app = App::new(args, theme)?;
    app.run()?;
    Ok(())
}

/// The terminal belongs to the UI, so logs only go to a file when one is asked for.
fn setup_logging(args: &Args) -> Result<()> {
    let Some(path) = args.log_file.as_deref() else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    WriteLogger::init(
        args.log_level,
        simplelog::ConfigBuilder::new()
            .set_target_level(LevelFilter::Error)
            .build(),
        file,
    )?;
    log::info!("logging at {} to {}", args.log_level, path.display());
    Ok(())
}

/// Match-three gem puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "gemtui",
    version,
    about = "Match-three gem puzzle in the terminal. Swap neighbouring gems to line up three or more.",
    long_about = "gemtui is a terminal match-three puzzle.\n\n\
        Pick a gem, then pick a neighbour to swap them. A swap that lines up three or more \
        gems of one colour removes them; the gems above fall and new ones drop in, which can \
        set off a chain. Each link in a chain multiplies the points per gem.\n\n\
        CONTROLS:\n  Arrows/WASD  Move cursor   Enter/Space  Pick gem   Mouse  Click gem\n  \
        H            Hint          P            Pause       Q / Esc  Quit menu\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Game mode: endless, timed (score within a time limit) or moves (score within a move limit).
    #[arg(short, long, default_value = "endless")]
    pub mode: GameMode,

    /// Difficulty: number of gem colours in play (easy 4, medium 5, hard 6).
    #[arg(short, long, default_value = "medium")]
    pub difficulty: Difficulty,

    /// Override the number of gem colours (3..=7).
    #[arg(long, value_name = "N")]
    pub gems: Option<u8>,

    /// Board height in gems.
    #[arg(long, default_value = "8", value_name = "ROWS")]
    pub rows: usize,

    /// Board width in gems.
    #[arg(long, default_value = "8", value_name = "COLS")]
    pub cols: usize,

    /// Seed for board generation. Random if not set.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// In mode 'timed': time limit in seconds.
    #[arg(long, default_value = "120", value_name = "SECS")]
    pub time_limit: u32,

    /// In mode 'moves': number of moves.
    #[arg(long, default_value = "30", value_name = "N")]
    pub move_limit: u32,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Skip main menu and start game immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Near-instant swaps and falls, no removal flash.
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Write a log to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for --log-file (error, warn, info, debug, trace).
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: LevelFilter,
}

impl Args {
    /// Engine settings for a session at the given difficulty.
    pub fn engine_config(&self, difficulty: Difficulty) -> EngineConfig {
        let mut config = EngineConfig {
            rows: self.rows,
            cols: self.cols,
            gem_kinds: self.gems.unwrap_or(difficulty.gem_kinds()),
            ..EngineConfig::default()
        };
        if self.no_animation {
            config.swap_ticks = 1;
            config.fall_speed = 600.0;
            config.pop_in_speed = 600.0;
        }
        config
    }
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GameMode {
    #[default]
    Endless,
    Timed,
    Moves,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn gem_kinds(self) -> u8 {
        match self {
            Self::Easy => 4,
            Self::Medium => 5,
            Self::Hard => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_sets_gem_kinds() {
        let args = Args::parse_from(["gemtui", "--difficulty", "hard"]);
        assert_eq!(args.engine_config(args.difficulty).gem_kinds, 6);
        let args = Args::parse_from(["gemtui", "--gems", "7"]);
        assert_eq!(args.engine_config(Difficulty::Easy).gem_kinds, 7);
    }

    #[test]
    fn test_defaults_match_classic_board() {
        let args = Args::parse_from(["gemtui"]);
        assert_eq!(args.engine_config(args.difficulty), EngineConfig::default());
        assert_eq!(args.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_no_animation_speeds_up_engine() {
        let args = Args::parse_from(["gemtui", "--no-animation", "--mode", "moves"]);
        let config = args.engine_config(args.difficulty);
        assert_eq!(config.swap_ticks, 1);
        assert!(config.validate().is_ok());
        assert_eq!(args.mode, GameMode::Moves);
    }
}
