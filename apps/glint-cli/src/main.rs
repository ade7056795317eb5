use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use glint_assets::ModelData;
use glint_render::{DebugTextRenderer, RenderView, Renderer};
use glint_scene::Scene;
use glint_tools::StatsSummary;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "glint-cli", about = "Headless glint tools")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Describe the lit demo scene
    Inspect {
        /// Number of cubes in the scene
        #[arg(short, long, default_value = "16")]
        cubes: usize,
    },
    /// Summarize a frame statistics CSV
    Stats { csv: PathBuf },
    /// Load an OBJ model and report what it contains
    ValidateObj { path: PathBuf },
}

fn inspect(cubes: usize) -> anyhow::Result<String> {
    let scene = Scene::demo(cubes);
    let table = scene.bind_lights().context("binding demo lights")?;
    tracing::debug!(
        cubes,
        points = table.points().len(),
        spots = table.spots().len(),
        "demo scene built"
    );
    Ok(DebugTextRenderer.render(&scene, &RenderView::default()))
}

fn stats(path: &Path) -> anyhow::Result<StatsSummary> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let summary = StatsSummary::from_csv(BufReader::new(file))
        .with_context(|| format!("reading {}", path.display()))?;
    tracing::debug!(frames = summary.frames, "summarized {}", path.display());
    Ok(summary)
}

fn validate_obj(path: &Path) -> anyhow::Result<String> {
    let model = ModelData::load_obj(path)?;
    let mut report = format!(
        "{}: {} meshes, {} triangles, {} textures",
        model.path.display(),
        model.meshes.len(),
        model.triangle_count(),
        model.textures.len()
    );
    for mesh in &model.meshes {
        let texture = mesh
            .diffuse
            .and_then(|t| model.textures.get(t.0))
            .map_or_else(|| "untextured".to_string(), |p| p.display().to_string());
        report.push_str(&format!(
            "\n  {}: {} vertices, {} triangles, {texture}",
            mesh.name,
            mesh.vertices.len(),
            mesh.triangle_count()
        ));
    }
    Ok(report)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("glint-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", glint_render::crate_info());
            println!("tools: {}", glint_tools::crate_info());
        }
        Commands::Inspect { cubes } => print!("{}", inspect(cubes)?),
        Commands::Stats { csv } => println!("{}", stats(&csv)?),
        Commands::ValidateObj { path } => println!("{}", validate_obj(&path)?),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn inspect_lists_every_cube() {
        let text = inspect(3).unwrap();
        assert_eq!(text.matches("  Cube ").count(), 3);
        assert!(text.contains("Spot[0]"));
    }

    #[test]
    fn stats_summarizes_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", glint_tools::CSV_HEADER).unwrap();
        writeln!(file, "60.000,16.667,16.667,4.000,12.667,10,1200,12.000,0.500").unwrap();
        writeln!(file, "30.000,33.333,25.000,5.000,28.333,10,1200,14.000,0.500").unwrap();

        let summary = stats(file.path()).unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.max_fps, 60.0);
        assert_eq!(summary.peak_vram_mb, 14.0);
    }

    #[test]
    fn stats_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = stats(&dir.path().join("none.csv")).unwrap_err();
        assert!(err.to_string().contains("opening"));
    }

    #[test]
    fn validate_obj_counts_meshes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::write(&path, "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let report = validate_obj(&path).unwrap();
        assert!(report.contains("1 meshes, 1 triangles, 0 textures"));
        assert!(report.contains("untextured"));
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from(["glint-cli", "inspect", "--cubes", "4"]).unwrap();
        assert!(matches!(cli.command, Commands::Inspect { cubes: 4 }));
        let cli = Cli::try_parse_from(["glint-cli", "validate-obj", "m.obj"]).unwrap();
        assert!(matches!(cli.command, Commands::ValidateObj { .. }));
    }
}
