use anyhow::Result;
use clap::Parser;

use prism_demo::{launch, DemoArgs};
use prism_engine::render::FrameRenderer;
use prism_engine::scene::TriangleScene;

/// Static triangle on a blue background.
#[derive(Parser, Debug)]
#[command(name = "triangle", version)]
struct Cli {
    #[command(flatten)]
    demo: DemoArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    launch("Prism Triangle", &cli.demo, FrameRenderer::new(TriangleScene))
}
