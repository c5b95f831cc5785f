use anyhow::Result;
use clap::Parser;

use prism_demo::{launch, DemoArgs};
use prism_engine::render::FrameRenderer;
use prism_engine::scene::{BaseFan, PyramidConfig, PyramidScene};

/// Pyramid seen from a camera orbiting above it.
#[derive(Parser, Debug)]
#[command(name = "pyramid", version)]
struct Cli {
    #[command(flatten)]
    demo: DemoArgs,

    /// Draw the base as `(12, 4), (14, 4)` instead of two 3-vertex calls.
    #[arg(long)]
    legacy_base: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let base = if cli.legacy_base { BaseFan::Legacy } else { BaseFan::Corrected };

    let scene = PyramidScene::new(PyramidConfig { base });
    launch("Prism Pyramid", &cli.demo, FrameRenderer::new(scene))
}
