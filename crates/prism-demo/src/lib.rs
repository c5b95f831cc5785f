//! Shared launcher for the demo binaries.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use winit::dpi::LogicalSize;

use prism_engine::core::SurfaceRenderer;
use prism_engine::device::GpuInit;
use prism_engine::logging::{init_logging, LoggingConfig};
use prism_engine::render::HeadlessContext;
use prism_engine::window::{Runtime, RuntimeConfig};

/// Options common to every demo.
#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    /// Initial window width in logical pixels.
    #[arg(long, default_value = "800")]
    pub width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, default_value = "600")]
    pub height: u32,

    /// Present without waiting for vertical sync.
    #[arg(long)]
    pub no_vsync: bool,

    /// Log filter in `env_logger` syntax; overrides RUST_LOG.
    #[arg(long)]
    pub log: Option<String>,

    /// Draw N frames into an in-memory context instead of opening a window.
    #[arg(long, value_name = "FRAMES")]
    pub dry_run: Option<u32>,
}

impl DemoArgs {
    fn gpu_init(&self) -> GpuInit {
        GpuInit::default().with_vsync(!self.no_vsync)
    }
}

/// Initializes logging, then either opens a window or performs a dry run.
pub fn launch<R>(title: &str, args: &DemoArgs, renderer: R) -> Result<()>
where
    R: SurfaceRenderer + 'static,
{
    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..Default::default()
    });

    if let Some(frames) = args.dry_run {
        return dry_run(renderer, args.width, args.height, frames);
    }

    let config = RuntimeConfig {
        title: title.to_string(),
        initial_size: LogicalSize::new(args.width as f64, args.height as f64),
    };
    Runtime::run(config, args.gpu_init(), renderer).with_context(|| format!("{title} failed"))
}

/// Drives `renderer` through a full lifecycle on a [`HeadlessContext`],
/// advancing time by one 60 Hz frame per draw.
pub fn dry_run<R: SurfaceRenderer>(mut renderer: R, width: u32, height: u32, frames: u32) -> Result<()> {
    let mut ctx = HeadlessContext::new();
    let start = Instant::now();

    renderer
        .on_surface_created(&mut ctx, start)
        .context("renderer setup failed")?;
    renderer.on_surface_changed(&mut ctx, width, height);

    let frame = Duration::from_micros(16_667);
    for i in 0..frames {
        renderer.on_draw_frame(&mut ctx, start + frame * (i + 1));
        let commands = ctx.take_commands();
        log::info!("frame {i}: {} commands", commands.len());
        for cmd in &commands {
            log::debug!("  {cmd:?}");
        }
    }

    renderer.on_surface_destroyed(&mut ctx);
    anyhow::ensure!(
        ctx.program_count() == 0 && ctx.buffer_count() == 0,
        "resources left in the context after teardown"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use prism_engine::render::FrameRenderer;
    use prism_engine::scene::{BaseFan, PyramidConfig, PyramidScene, TriangleScene};

    #[derive(Parser, Debug)]
    struct Cli {
        #[command(flatten)]
        demo: DemoArgs,
    }

    #[test]
    fn defaults_open_an_800x600_window() {
        let cli = Cli::try_parse_from(["demo"]).unwrap();
        assert_eq!((cli.demo.width, cli.demo.height), (800, 600));
        assert!(!cli.demo.no_vsync);
        assert!(cli.demo.dry_run.is_none());
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "demo", "--width", "1024", "--height", "768", "--no-vsync", "--dry-run", "3",
        ])
        .unwrap();
        assert_eq!((cli.demo.width, cli.demo.height), (1024, 768));
        assert!(cli.demo.no_vsync);
        assert_eq!(cli.demo.dry_run, Some(3));
    }

    #[test]
    fn dry_runs_tear_down_cleanly() {
        dry_run(FrameRenderer::new(TriangleScene), 800, 600, 2).unwrap();
        dry_run(
            FrameRenderer::new(PyramidScene::new(PyramidConfig { base: BaseFan::Legacy })),
            640,
            480,
            3,
        )
        .unwrap();
    }
}
