use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use glam::Vec2;

mod config;
mod error;
mod interaction;
mod math;
mod media;
mod renderer;
mod ui;

use config::AppConfig;
use error::AppError;
use interaction::InteractionKey;
use media::{CameraFeed, TextureLoader};
use renderer::{GpuState, ModelId, RenderSession, TextureSlot};
use ui::{MediaStatus, UiActions, UiState, apply_theme, draw_help_overlay, draw_side_panel};

fn interaction_key(code: KeyCode) -> Option<InteractionKey> {
    match code {
        KeyCode::ArrowLeft => Some(InteractionKey::LightBackward),
        KeyCode::ArrowRight => Some(InteractionKey::LightForward),
        KeyCode::KeyW => Some(InteractionKey::PointUp),
        KeyCode::KeyS => Some(InteractionKey::PointDown),
        KeyCode::KeyA => Some(InteractionKey::PointLeft),
        KeyCode::KeyD => Some(InteractionKey::PointRight),
        _ => None,
    }
}

struct App {
    config: AppConfig,

    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    egui_ctx: egui::Context,

    session: RenderSession,
    ui_state: UiState,
    texture_loader: TextureLoader,
    camera_feed: CameraFeed,

    uploaded_revision: Option<u64>,
    cursor: Vec2,
    tick: Duration,
    next_tick: Instant,

    error: Option<AppError>,
}

impl App {
    fn new(config: AppConfig) -> Result<Self, AppError> {
        let session = RenderSession::from_config(&config)?;
        log::info!(
            "Tessellated surface: {} vertices (step {})",
            session.mesh.vertex_count(),
            session.domain.step
        );

        let ui_state = UiState::new(&session.domain);
        let texture_loader = TextureLoader::spawn(config.media.texture_path.clone());
        let camera_feed =
            CameraFeed::start(config.media.camera_directory.clone(), config.media.camera_fps);
        let tick = Duration::from_secs_f64(1.0 / config.tick_hz.clamp(1.0, 240.0));

        Ok(Self {
            config,
            window: None,
            gpu: None,
            egui_state: None,
            egui_renderer: None,
            egui_ctx: egui::Context::default(),
            session,
            ui_state,
            texture_loader,
            camera_feed,
            uploaded_revision: None,
            cursor: Vec2::ZERO,
            tick,
            next_tick: Instant::now(),
            error: None,
        })
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        log::info!("Window created");

        let mut gpu = pollster::block_on(GpuState::new(window.clone()))?;
        gpu.upload_vertex_attributes(ModelId::Background, &self.session.background);

        let size = window.inner_size();
        self.session
            .trackball
            .set_viewport(size.width as f32, size.height as f32);

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            self.egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.config.format, None, 1, false);

        apply_theme(&self.egui_ctx);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("{}", error.user_message());
        self.error = Some(error);
        event_loop.exit();
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn poll_media(&mut self) -> bool {
        let Some(gpu) = &mut self.gpu else {
            return false;
        };
        let mut changed = false;

        if let Some(image) = self.texture_loader.poll() {
            gpu.upload_texture(TextureSlot::Surface, image.width, image.height, &image.pixels);
            changed = true;
        }
        if let Some(frame) = self.camera_feed.poll() {
            gpu.upload_texture(TextureSlot::Camera, frame.width, frame.height, &frame.pixels);
            changed = true;
        }
        changed
    }

    fn sync_mesh(&mut self) {
        let Some(gpu) = &mut self.gpu else { return };
        let revision = self.session.mesh_revision();
        if self.uploaded_revision != Some(revision) {
            gpu.upload_vertex_attributes(ModelId::Surface, &self.session.mesh);
            self.uploaded_revision = Some(revision);
        }
    }

    fn handle_ui_actions(&mut self, actions: UiActions) {
        if let Some(domain) = actions.rebuild_mesh {
            match self.session.rebuild_mesh(domain) {
                Ok(()) => self.ui_state.domain_applied(&self.session.domain),
                Err(e) => {
                    log::warn!("Mesh rebuild rejected: {}", e);
                    self.ui_state.domain_error = Some(e.to_string());
                }
            }
            self.request_redraw();
        }

        if actions.reset_view {
            self.session.trackball.reset();
            self.request_redraw();
        }

        if actions.redraw {
            self.request_redraw();
        }
    }

    fn render(&mut self) -> Result<(), AppError> {
        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return Ok(());
        };

        let raw_input = egui_state.take_egui_input(window);

        let mut ui_actions = UiActions::default();
        let media = MediaStatus {
            texture: self.texture_loader.state(),
            camera: self.camera_feed.state(),
        };

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui_actions = draw_side_panel(ctx, &mut self.ui_state, &mut self.session, &media);
            if self.ui_state.show_help {
                draw_help_overlay(ctx);
            }
        });

        self.handle_ui_actions(ui_actions);
        self.sync_mesh();

        let Some(gpu) = &mut self.gpu else {
            return Ok(());
        };
        let Some(window) = &self.window else {
            return Ok(());
        };
        let Some(egui_state) = &mut self.egui_state else {
            return Ok(());
        };
        let Some(egui_renderer) = &mut self.egui_renderer else {
            return Ok(());
        };

        egui_state.handle_platform_output(window, full_output.platform_output);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                gpu.resize(gpu.size);
                window.request_redraw();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                return Ok(());
            }
            Err(e @ wgpu::SurfaceError::OutOfMemory) => {
                return Err(e.into());
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.session.draw_frame(gpu);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, id, &delta);
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });

        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        gpu.encode_frame(&view, &mut encoder);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in full_output.textures_delta.free {
            egui_renderer.free_texture(&id);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let (Some(egui_state), Some(window)) = (&mut self.egui_state, &self.window) {
            let response = egui_state.on_window_event(window, &event);
            if response.repaint {
                window.request_redraw();
            }
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                    self.session
                        .trackball
                        .set_viewport(size.width as f32, size.height as f32);
                }
                self.request_redraw();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(key) = interaction_key(code) {
                        if self.session.interaction.handle_key(key) {
                            self.request_redraw();
                        }
                    }
                }
            }

            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => match state {
                ElementState::Pressed => self.session.trackball.begin_drag(self.cursor),
                ElementState::Released => self.session.trackball.end_drag(),
            },

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                if self.session.trackball.is_dragging() && self.session.trackball.drag_to(self.cursor) {
                    self.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    self.fail(event_loop, e);
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_tick {
            self.poll_media();
            self.request_redraw();
            self.next_tick = now + self.tick;
        } else if self.poll_media() {
            self.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
    }
}

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
