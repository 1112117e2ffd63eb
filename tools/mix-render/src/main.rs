//! mix-render - offline renderer for nether-mix scenes
//!
//! # Commands
//!
//! - `mix-render render <scene.toml>` - Mix the scene's voices into a 16-bit WAV
//! - `mix-render check <scene.toml>` - Validate the scene and its samples
//!
//! # Scene (scene.toml)
//!
//! ```toml
//! [output]
//! sample_rate = 44100
//! seconds = 2.0
//! mixer = "r"          # "r" or "q"
//!
//! [[voice]]
//! sample = "loop.wav"  # relative to the scene file
//! rate = 22050
//! volume = 48
//! pan = -16
//! interpolation = "linear"
//!
//! [voice.loop]
//! start = 100
//! end = 4000
//! mode = "pingpong"
//! ```

mod check;
mod render;
mod scene;
mod wav;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// mix-render - offline renderer for nether-mix scenes
#[derive(Parser)]
#[command(name = "mix-render")]
#[command(about = "Render WAV voice scenes through the nether-mix channel mixer")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mix a scene into a WAV file
    Render(render::RenderArgs),

    /// Validate a scene and its samples without rendering
    Check(check::CheckArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => render::execute(args),
        Commands::Check(args) => check::execute(args),
    }
}
