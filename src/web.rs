//! Browser entry point
//!
//! Creates a canvas-backed window, initializes wgpu asynchronously and drives
//! the vignette from the browser's animation frames.

use crate::engine::Engine;
use crate::error::VignetteError;
use crate::vignette::Vignette;
use crate::{init_web_logging, VignetteConfig};
use std::sync::Arc;
use wasm_bindgen::prelude::*;
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    platform::web::{EventLoopExtWebSys, WindowExtWebSys},
    window::WindowBuilder,
};

fn browser_window() -> Result<web_sys::Window, VignetteError> {
    web_sys::window().ok_or_else(|| VignetteError::Web("no global window exists".into()))
}

/// Get the browser viewport size in CSS pixels
pub fn get_window_size() -> Result<(u32, u32), VignetteError> {
    let window = browser_window()?;
    let dimension = |value: Result<JsValue, JsValue>| {
        value
            .ok()
            .and_then(|v| v.as_f64())
            .ok_or_else(|| VignetteError::Web("viewport size unavailable".into()))
    };
    let width = dimension(window.inner_width())? as u32;
    let height = dimension(window.inner_height())? as u32;
    Ok((width.max(100), height.max(100)))
}

/// Attach the window's canvas to the page and size it for the device pixel ratio
pub fn setup_canvas(
    window: &winit::window::Window,
    container_id: &str,
) -> Result<web_sys::HtmlCanvasElement, VignetteError> {
    let canvas = window
        .canvas()
        .ok_or_else(|| VignetteError::Web("window has no canvas".into()))?;

    let web_window = browser_window()?;
    let document = web_window
        .document()
        .ok_or_else(|| VignetteError::Web("no document exists".into()))?;

    // Try to find existing container, or use body
    let container: web_sys::Element = match document.get_element_by_id(container_id) {
        Some(element) => element,
        None => document
            .body()
            .ok_or_else(|| VignetteError::Web("document has no body".into()))?
            .into(),
    };
    container
        .append_child(&canvas)
        .map_err(|_| VignetteError::Web("couldn't append canvas".into()))?;

    let dpr = web_window.device_pixel_ratio();
    let (css_width, css_height) = get_window_size()?;

    let canvas_width = (css_width as f64 * dpr) as u32;
    let canvas_height = (css_height as f64 * dpr) as u32;
    canvas.set_width(canvas_width);
    canvas.set_height(canvas_height);

    let style = canvas.style();
    for (property, value) in [
        ("width", format!("{}px", css_width)),
        ("height", format!("{}px", css_height)),
        ("display", "block".to_string()),
    ] {
        style
            .set_property(property, &value)
            .map_err(|_| VignetteError::Web(format!("couldn't set canvas {}", property)))?;
    }

    log::info!(
        "Canvas setup: {}x{} (CSS: {}x{}, DPR: {})",
        canvas_width,
        canvas_height,
        css_width,
        css_height,
        dpr
    );

    Ok(canvas)
}

/// Main entry point for web - called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn main() {
    init_web_logging();
    wasm_bindgen_futures::spawn_local(async {
        if let Err(e) = run(VignetteConfig::default()).await {
            log::error!("Vignette failed to start: {}", e);
        }
    });
}

/// Build the vignette in the page and hand the loop to the browser
pub async fn run(config: VignetteConfig) -> Result<(), VignetteError> {
    let event_loop = EventLoop::new()?;

    let (width, height) = get_window_size()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(&config.title)
            .with_inner_size(PhysicalSize::new(width, height))
            .build(&event_loop)?,
    );

    let canvas = setup_canvas(&window, "canvas-container")?;
    let config = VignetteConfig {
        width: canvas.width(),
        height: canvas.height(),
        ..config
    };

    let mut vignette = Vignette::new(&config)?;
    let mut engine = Engine::new_async(Arc::clone(&window), &config, vignette.scene()).await?;

    // Ensure engine size matches canvas
    let (width, height) = engine.resize(config.width, config.height);
    vignette.resize(width, height);

    let mut engine = Some(engine);
    vignette.start();

    // Run event loop (web-style, non-blocking)
    event_loop.spawn(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    vignette.stop();
                    engine = None;
                    elwt.exit();
                }
                WindowEvent::Resized(size) => {
                    if let Some(engine) = engine.as_mut() {
                        let (width, height) = engine.resize(size.width, size.height);
                        vignette.resize(width, height);
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
    });

    Ok(())
}
