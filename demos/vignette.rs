//! Idle vignette demo
//!
//! Run with:
//!   cargo run --example vignette
//!   cargo run --example vignette -- --anchored-stars --timed-spin 0.6 --seed 7

use clap::Parser;
use vignette::{FigureSpin, StarMotion, VignetteConfig};

/// Idle vignette command line arguments.
#[derive(Parser, Debug)]
#[command(name = "vignette", about = "A looping idle scene: figure, tree and twinkling stars")]
struct Args {
    /// Initial window width in pixels.
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial window height in pixels.
    #[arg(long, default_value = "720")]
    height: u32,

    /// Disable vertical sync (may cause tearing).
    #[arg(long)]
    no_vsync: bool,

    /// Keep stars oscillating around where they were placed instead of drifting.
    #[arg(long)]
    anchored_stars: bool,

    /// Turn the figure at this many radians per second instead of a fixed step per frame.
    #[arg(long, value_name = "RAD_PER_SEC")]
    timed_spin: Option<f32>,

    /// Seed for star placement.
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn into_config(self) -> VignetteConfig {
        VignetteConfig {
            width: self.width,
            height: self.height,
            vsync: !self.no_vsync,
            star_motion: if self.anchored_stars {
                StarMotion::Anchored
            } else {
                StarMotion::Accumulate
            },
            figure_spin: match self.timed_spin {
                Some(radians) => FigureSpin::PerSecond { radians },
                None => FigureSpin::default(),
            },
            seed: self.seed,
            ..Default::default()
        }
    }
}

fn main() {
    vignette::init_logging();

    let config = Args::parse().into_config();
    log::info!("Starting {} at {}x{}", config.title, config.width, config.height);

    if let Err(e) = vignette::window::run(config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
