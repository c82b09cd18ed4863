// src/app.rs

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use log::{debug, info};
use winit::{
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::ui::{build_ui, UiAction, UiStatus};
use vr_room_demo::bootstrap::{install, Libraries};
use vr_room_demo::config::DemoConfig;
use vr_room_demo::demo::{Demo, FrameOutcome};
use vr_room_demo::engine_lib::controller::PoseControls;
use vr_room_demo::engine_lib::stereo::FrameScheduler;
use vr_room_demo::rendering_lib::backend::RenderBackend;
use vr_room_demo::rendering_lib::renderer::Renderer;
use vr_room_demo::rendering_lib::shader::WGSL_SHADER_SOURCE;
use vr_room_demo::vr::display::DisplayEvent;

const CLEAR_COLOR: wgpu::Color = wgpu::Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };

/// Maps "run me again" onto a winit redraw request.
struct RedrawScheduler<'a> {
    window: &'a Window,
}

impl FrameScheduler for RedrawScheduler<'_> {
    fn request_animation_frame(&mut self) {
        self.window.request_redraw();
    }
}

pub struct VrRoomApp {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    renderer: Renderer,
    demo: Demo,
    pose_controls: PoseControls,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    started: Instant,
    last_update: Instant,
    pending_action: UiAction,
}

impl VrRoomApp {
    pub async fn new(window: Arc<Window>, demo_config: DemoConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone()).context("creating window surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter")?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: None,
                },
                None,
            )
            .await
            .context("requesting GPU device")?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut renderer = Renderer::new(
            device.clone(),
            queue.clone(),
            config.format,
            WGSL_SHADER_SOURCE,
            config.width,
            config.height,
        );
        renderer.set_clear_color(CLEAR_COLOR);

        let mut demo = Demo::new(demo_config.clone(), &mut renderer, config.width, config.height);
        let mut libraries = install(Libraries::new(), &demo_config);
        let pose_controls = libraries.pose_controls.take().unwrap_or_default();
        demo.setup_vr(&mut libraries, &mut renderer);
        info!("{}", demo.vr().status_label());

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        let now = Instant::now();
        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            renderer,
            demo,
            pose_controls,
            egui_ctx,
            egui_state,
            egui_renderer,
            started: now,
            last_update: now,
            pending_action: UiAction::None,
        })
    }

    pub fn get_size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.demo.resize(&mut self.renderer, new_size.width, new_size.height);
        }
    }

    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        self.pose_controls.update((now - self.last_update).as_secs_f32());
        self.last_update = now;

        let output_texture = self.surface.get_current_texture()?;
        let scene_view = output_texture.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let gui_view = output_texture.texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.begin_frame(scene_view);
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut scheduler = RedrawScheduler { window };
        let outcome = self.demo.tick(elapsed_ms, &mut self.renderer, &mut scheduler);
        if outcome == FrameOutcome::SkippedFirstVrFrame {
            // Nothing was drawn; don't present stale swapchain contents.
            self.renderer.clear();
        }
        let scene_commands = self.renderer.end_frame();

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("GUI Command Encoder"),
        });
        let status = UiStatus {
            vr_status: self.demo.vr().status_label(),
            toggle_label: self.demo.toggle_label(),
            showing_modal: self.demo.vr().is_showing_modal(),
            hovered: self.demo.ray_input().and_then(|r| r.hovered()).is_some(),
        };
        let raw_input = self.egui_state.take_egui_input(window);
        let mut action = UiAction::None;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            action = build_ui(ctx, &status);
        });
        self.egui_state.handle_platform_output(window, full_output.platform_output);
        let tris = self.egui_ctx.tessellate(full_output.shapes, self.egui_ctx.pixels_per_point());
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };
        self.egui_renderer.update_buffers(&self.device, &self.queue, &mut encoder, &tris, &screen_descriptor);
        {
            let mut gui_render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("GUI Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &gui_view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.egui_renderer.render(&mut gui_render_pass, &tris, &screen_descriptor);
        }
        for tex_id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(tex_id);
        }

        self.queue.submit(scene_commands.into_iter().chain(std::iter::once(encoder.finish())));
        output_texture.present();

        if action != UiAction::None {
            self.pending_action = action;
        }
        self.apply_pending_action();
        Ok(())
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent, window: &Window) -> bool {
        if self.egui_state.on_window_event(window, event).consumed {
            return true;
        }
        if self.pose_controls.handle_window_event(event) {
            return true;
        }
        match event {
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                let pressed = key_event.state == ElementState::Pressed;
                match key_event.physical_key {
                    PhysicalKey::Code(KeyCode::KeyV) if pressed && !key_event.repeat => {
                        self.pending_action = UiAction::ToggleVr;
                        true
                    }
                    PhysicalKey::Code(KeyCode::Space | KeyCode::Enter) => {
                        self.set_ray_button(pressed);
                        true
                    }
                    _ => false,
                }
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                self.set_ray_button(*state == ElementState::Pressed);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(ray_input) = self.demo.ray_input_mut() {
                    ray_input.set_pointer(position.x as f32, position.y as f32);
                }
                false
            }
            WindowEvent::Occluded(true) => {
                self.demo.handle_display_event(DisplayEvent::Deactivate, &mut self.renderer);
                false
            }
            _ => false,
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        self.pose_controls.handle_device_event(event);
    }

    fn set_ray_button(&mut self, down: bool) {
        match self.demo.ray_input_mut() {
            Some(ray_input) => ray_input.controller_mut().set_button(down),
            None => debug!("ignoring button: no ray input attached"),
        }
    }

    fn apply_pending_action(&mut self) {
        match std::mem::replace(&mut self.pending_action, UiAction::None) {
            UiAction::None => {}
            UiAction::ToggleVr => self.demo.toggle_vr(&mut self.renderer),
        }
    }
}
