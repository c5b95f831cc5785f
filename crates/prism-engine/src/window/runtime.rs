use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::SurfaceRenderer;
use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::render::{RenderTarget, WgpuContext};
use crate::time::FrameClock;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "prism".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        }
    }
}

/// Runs one window and drives a [`SurfaceRenderer`] through its lifecycle.
pub struct Runtime;

impl Runtime {
    /// Blocks until the window closes. Returns the first fatal error, if any.
    pub fn run<R>(config: RuntimeConfig, gpu_init: GpuInit, renderer: R) -> Result<()>
    where
        R: SurfaceRenderer + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, renderer);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<R> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    renderer: R,

    entry: Option<WindowEntry>,
    context: Option<WgpuContext>,

    fatal: Option<anyhow::Error>,
}

impl<R: SurfaceRenderer> AppState<R> {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, renderer: R) -> Self {
        Self {
            config,
            gpu_init,
            renderer,
            entry: None,
            context: None,
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.destroy_surface();
        if self.fatal.is_none() {
            self.fatal = Some(err);
        }
        event_loop.exit();
    }

    /// Creates the window, its GPU surface and context, then runs the
    /// renderer's creation and first size callbacks.
    fn create_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntryTryBuilder {
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        let (mut context, size) = entry.with_gpu(|gpu| {
            let context = WgpuContext::new(
                gpu.device().clone(),
                gpu.queue().clone(),
                gpu.surface_format(),
                gpu.depth_format(),
            );
            (context, gpu.size())
        });

        self.renderer
            .on_surface_created(&mut context, Instant::now())
            .context("renderer setup failed")?;
        self.renderer
            .on_surface_changed(&mut context, size.width, size.height);

        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
        self.context = Some(context);
        log::debug!("surface created at {}x{}", size.width, size.height);
        Ok(())
    }

    fn destroy_surface(&mut self) {
        if let Some(context) = self.context.as_mut() {
            self.renderer.on_surface_destroyed(context);
        }
        self.context = None;
        if self.entry.take().is_some() {
            log::debug!("surface destroyed");
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let Some(entry) = self.entry.as_mut() else { return };
        entry.with_gpu_mut(|gpu| gpu.resize(new_size));

        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Some(context) = self.context.as_mut() {
            self.renderer
                .on_surface_changed(context, new_size.width, new_size.height);
        }
        entry.with_window(|w| w.request_redraw());
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(entry), Some(context)) = (self.entry.as_mut(), self.context.as_mut()) else {
            return;
        };
        let renderer = &mut self.renderer;

        let action = entry.with_mut(|fields| {
            let size = fields.gpu.size();
            if size.width == 0 || size.height == 0 {
                return None;
            }

            let ft = fields.clock.tick();
            if ft.frame_index == 0 {
                log::debug!("first frame at {}x{}", size.width, size.height);
            }

            let mut frame = match fields.gpu.begin_frame() {
                Ok(f) => f,
                Err(err) => return Some(fields.gpu.handle_surface_error(err)),
            };

            renderer.on_draw_frame(context, ft.now);

            {
                let mut target = RenderTarget::new(
                    &mut frame.encoder,
                    &frame.view,
                    fields.gpu.depth_view(),
                    (size.width, size.height),
                );
                context.encode(&mut target);
            }

            fields.window.pre_present_notify();
            fields.gpu.submit(frame);
            None
        });

        if action == Some(SurfaceErrorAction::Fatal) {
            self.fail(event_loop, anyhow!("surface is out of memory"));
        }
    }
}

impl<R> ApplicationHandler for AppState<R>
where
    R: SurfaceRenderer + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }
        if let Err(err) = self.create_surface(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.destroy_surface();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; the pyramid animates every frame.
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let ours = self
            .entry
            .as_ref()
            .is_some_and(|e| e.with_window(|w| w.id()) == window_id);
        if !ours {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.destroy_surface();
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => self.resize(new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.entry.as_ref().map(|e| e.with_window(|w| w.inner_size())) {
                    self.resize(size);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.destroy_surface();
    }
}
