mod app;
mod config;
mod error;
mod logging;

use std::path::PathBuf;

use clap::Parser;

use crate::app::HeadlessApp;
use crate::config::RuntimeConfig;
use crate::error::AppError;

/// Headless chunk meshing and streaming run over a generated map.
#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(about = "Streams, meshes and draws a generated voxel map without a window")]
struct Args {
    /// Runtime configuration TOML (defaults are used when omitted).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Block definitions.
    #[arg(short, long, default_value = "assets/blocks.toml")]
    blocks: PathBuf,

    /// Frames to simulate.
    #[arg(short, long, default_value_t = 600)]
    frames: u32,

    /// Terrain seed override.
    #[arg(long)]
    seed: Option<i32>,

    /// World size override as `X,Y,Z`.
    #[arg(long, value_delimiter = ',', num_args = 3)]
    size: Option<Vec<usize>>,

    /// Camera speed override in blocks per second.
    #[arg(long)]
    fly_speed: Option<f32>,

    /// Also write debug-level logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), AppError> {
    logging::init(args.log_file.as_deref())?;

    let mut cfg = match &args.config {
        Some(path) => {
            log::info!("loading config from {}", path.display());
            RuntimeConfig::load(path)?
        }
        None => RuntimeConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.world.terrain.seed = seed;
    }
    if let Some(size) = &args.size {
        if let [x, y, z] = size[..] {
            cfg.world.size = [x, y, z];
        }
    }
    if let Some(speed) = args.fly_speed {
        cfg.fly.speed = speed;
    }
    cfg.validate()?;

    let mut app = HeadlessApp::new(cfg, &args.blocks)?;
    let summary = app.run(args.frames);
    log::info!(
        "done: {} frames, {} chunk builds, {} evictions, {} edits, {} draw calls, {} triangles, peak {} buffers",
        summary.frames,
        summary.chunks_built,
        summary.evicted,
        summary.edits,
        summary.draw_calls,
        summary.triangles,
        summary.peak_buffers
    );
    if summary.leaked_buffers > 0 {
        return Err(AppError::Leaked(summary.leaked_buffers));
    }
    Ok(())
}

fn main() {
    if let Err(e) = run(Args::parse()) {
        eprintln!("quarry: {e}");
        std::process::exit(1);
    }
}
