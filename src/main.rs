// src/main.rs

mod app;
mod ui;

use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    window::WindowBuilder,
};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use app::VrRoomApp;
use vr_room_demo::config::DemoConfig;

#[cfg_attr(target_arch = "wasm32", wasm_bindgen(start))]
pub async fn run() {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));
            // Nowhere to report a failure before a logger exists.
            console_log::init_with_level(log::Level::Warn).ok();
        } else {
            env_logger::init();
        }
    }

    if let Err(err) = try_run().await {
        log::error!("{err:#}");
    }
}

async fn try_run() -> anyhow::Result<()> {
    let demo_config = DemoConfig::from_env();
    let event_loop = EventLoop::new()?;
    let window = std::sync::Arc::new(
        WindowBuilder::new()
            .with_title(demo_config.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(demo_config.window_size.0, demo_config.window_size.1))
            .build(&event_loop)?,
    );

    #[cfg(target_arch = "wasm32")]
    {
        use anyhow::Context;
        use winit::platform::web::WindowExtWebSys;
        web_sys::window()
            .and_then(|win| win.document())
            .and_then(|doc| {
                let dst = doc.get_element_by_id("wasm-viewport")?;
                let canvas = web_sys::Element::from(window.canvas()?);
                dst.append_child(&canvas).ok()?;
                Some(())
            })
            .context("Couldn't append canvas to document body.")?;
    }

    let mut app_state = VrRoomApp::new(window.clone(), demo_config).await?;
    window.request_redraw();

    event_loop.run(move |event, target: &EventLoopWindowTarget<()>| {
        target.set_control_flow(ControlFlow::Wait);

        match event {
            Event::WindowEvent { ref event, window_id } if window_id == window.id() => {
                if app_state.handle_window_event(event, &window) {
                    return;
                }
                match event {
                    WindowEvent::CloseRequested => {
                        log::info!("Close requested; exiting");
                        target.exit();
                    }
                    WindowEvent::Resized(physical_size) => {
                        app_state.resize(*physical_size);
                        window.request_redraw();
                    }
                    // Frames are scheduled by the demo itself through redraw requests.
                    WindowEvent::RedrawRequested => match app_state.render(&window) {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            app_state.resize(app_state.get_size());
                            window.request_redraw();
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("WGPU Out Of Memory! Exiting.");
                            target.exit();
                        }
                        Err(e) => {
                            log::warn!("Surface error: {e:?}");
                            window.request_redraw();
                        }
                    },
                    _ => {}
                }
            }
            Event::DeviceEvent { event: device_event, .. } => {
                app_state.handle_device_event(&device_event);
            }
            _ => {}
        }
    })?;
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() {
    run().await;
}

#[cfg(target_arch = "wasm32")]
fn main() {}
