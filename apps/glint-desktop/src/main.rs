mod app;
mod config;
mod overlay;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use winit::event_loop::{ControlFlow, EventLoop};

use crate::app::GpuApp;
use crate::config::AppConfig;

/// Process status for any initialization failure (`-1` as a byte).
const INIT_FAILURE: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    /// Multi-light forward rendering with a shadow map
    Lit,
    /// Compute-shader Menger sponge
    Sponge,
}

#[derive(Debug, Parser)]
#[command(name = "glint-desktop", about = "Lighting and shadow mapping demos")]
pub struct Cli {
    /// Number of spinning cubes in the lit demo
    #[arg(default_value_t = 16)]
    num_cubes: usize,

    /// Show the debug overlay at startup
    #[arg(default_value_t = true, action = ArgAction::Set)]
    imgui: bool,

    /// Append one row of frame statistics per frame to the CSV file
    #[arg(default_value_t = false, action = ArgAction::Set)]
    save_csv: bool,

    #[arg(long, value_enum, default_value_t = Demo::Lit)]
    demo: Demo,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where frame statistics are written when `save_csv` is true
    #[arg(long, default_value = "scene_stats.csv")]
    csv: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(&cli, config)?;
    event_loop.run_app(&mut app)?;
    app.finish()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("glint-desktop starting ({:?} demo)", cli.demo);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(INIT_FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_defaults() {
        let cli = Cli::try_parse_from(["glint-desktop"]).unwrap();
        assert_eq!(cli.num_cubes, 16);
        assert!(cli.imgui);
        assert!(!cli.save_csv);
        assert_eq!(cli.demo, Demo::Lit);
        assert_eq!(cli.csv, PathBuf::from("scene_stats.csv"));
    }

    #[test]
    fn positionals_in_order() {
        let cli = Cli::try_parse_from(["glint-desktop", "100", "false", "true"]).unwrap();
        assert_eq!(cli.num_cubes, 100);
        assert!(!cli.imgui);
        assert!(cli.save_csv);
    }

    #[test]
    fn options() {
        let cli = Cli::try_parse_from([
            "glint-desktop",
            "--demo",
            "sponge",
            "--config",
            "glint.json",
            "--csv",
            "out.csv",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.demo, Demo::Sponge);
        assert_eq!(cli.config, Some(PathBuf::from("glint.json")));
        assert_eq!(cli.csv, PathBuf::from("out.csv"));
        assert!(cli.verbose);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Cli::try_parse_from(["glint-desktop", "many"]).is_err());
        assert!(Cli::try_parse_from(["glint-desktop", "4", "yes"]).is_err());
        assert!(Cli::try_parse_from(["glint-desktop", "--demo", "cascade"]).is_err());
    }
}
