// src/app.rs

use aqua_visual::{Library, Renderer, RendererConfig, Result, SurfaceTarget};
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

/// Smoke-test harness: opens a window and holds a renderer until it closes.
pub struct App {
    library: Library,
    config: RendererConfig,
    renderer: Option<Box<dyn Renderer>>, // declared before `window`: drops first
    window: Option<Window>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => self.window.insert(window),
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        // SAFETY: the renderer is shut down before the window is dropped.
        let config = match unsafe { SurfaceTarget::from_window(&*window) } {
            Ok(target) => self.config.clone().with_surface(target),
            Err(e) => {
                error!("Window has no usable handles: {e}");
                event_loop.exit();
                return;
            }
        };

        match self.library.create_renderer(config) {
            Ok(renderer) => {
                info!(
                    "Renderer '{}' ready with {} supported features",
                    renderer.backend_name(),
                    renderer.capabilities().len()
                );
                self.renderer = Some(renderer);
            }
            Err(e) => {
                error!("Failed to create renderer: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if matches!(event, WindowEvent::CloseRequested) {
            event_loop.exit();
        }
    }
}

impl App {
    pub fn run(config: RendererConfig) -> Result<()> {
        let library = Library::initialize()?;
        info!("AquaVisual version {}", Library::version());

        let mut app = App {
            library,
            config,
            renderer: None,
            window: None,
        };

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Wait);
        event_loop.run_app(&mut app)?;

        if let Some(mut renderer) = app.renderer.take() {
            renderer.shutdown();
        }
        app.window = None;
        app.library.shutdown();
        Ok(())
    }
}
