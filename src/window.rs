//! Native run loop using winit

use crate::engine::Engine;
use crate::error::VignetteError;
use crate::vignette::Vignette;
use crate::VignetteConfig;
use std::sync::Arc;
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    window::{Window as WinitWindow, WindowBuilder},
};

/// Wrapper around winit window with additional state
pub struct Window {
    window: Arc<WinitWindow>,
    width: u32,
    height: u32,
}

impl Window {
    /// Create a new window with the given title and dimensions
    pub fn new(
        event_loop: &EventLoop<()>,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<Self, VignetteError> {
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(title)
                .with_inner_size(PhysicalSize::new(width, height))
                .build(event_loop)?,
        );
        let size = window.inner_size();

        Ok(Self {
            window,
            width: size.width,
            height: size.height,
        })
    }

    /// Get arc reference to window
    pub fn window_arc(&self) -> Arc<WinitWindow> {
        Arc::clone(&self.window)
    }

    /// Get current window dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Record a resize; returns false for the zero size reported while minimized
    pub fn handle_resize(&mut self, size: PhysicalSize<u32>) -> bool {
        if size.width == 0 || size.height == 0 {
            return false;
        }
        self.width = size.width;
        self.height = size.height;
        true
    }

    /// Request a redraw
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

/// Open a window and play the vignette until it is closed
pub fn run(config: VignetteConfig) -> Result<(), VignetteError> {
    let event_loop = EventLoop::new()?;
    let mut window = Window::new(&event_loop, &config.title, config.width, config.height)?;

    let mut vignette = Vignette::new(&config)?;
    let engine = Engine::new(window.window_arc(), &config, vignette.scene())?;
    let (width, height) = engine.dimensions();
    vignette.resize(width, height);

    // Dropped on close so the surface is released before the loop exits
    let mut engine = Some(engine);
    vignette.start();

    event_loop.run(move |event, elwt: &EventLoopWindowTarget<()>| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    vignette.stop();
                    engine = None;
                    elwt.exit();
                }
                WindowEvent::Resized(size) => {
                    if window.handle_resize(size) {
                        if let Some(engine) = engine.as_mut() {
                            let (width, height) = window.dimensions();
                            let (width, height) = engine.resize(width, height);
                            vignette.resize(width, height);
                        }
                    }
                }
                WindowEvent::RedrawRequested => {
                    if let Some(engine) = engine.as_mut() {
                        vignette.update();
                        engine.draw(vignette.scene(), vignette.camera());
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                if engine.is_some() {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    })?;

    Ok(())
}
