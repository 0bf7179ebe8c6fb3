use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use colortail::{actions, palette::Palette, tail::TailConfig};

/// Follow a growing log file, coloring lines tagged [error], [warning] or [info].
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// The file to follow
    path: PathBuf,

    /// How long the file must stay unchanged before new text is read
    #[arg(long, value_name = "MS", default_value_t = 50)]
    quiet_window_ms: u64,

    /// Print lines without colors
    #[arg(long)]
    no_color: bool,

    /// Log diagnostics to stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = TailConfig {
        quiet_window: Duration::from_millis(cli.quiet_window_ms),
    };

    actions::follow::follow_file(&cli.path, config, Palette::default())
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::from_default_env().add_directive(format!("colortail={level}").parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
