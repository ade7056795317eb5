use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use glam::Vec3;
use glint_assets::{ImageData, ModelData, ShaderLibrary};
use glint_common::Transform;
use glint_input::{Action, InputState, Key};
use glint_render_wgpu::{FrameStats, FreeCamera, SpongeRenderer, WgpuRenderer};
use glint_scene::{ModelInstance, Scene};
use glint_tools::{FrameCounters, HISTORY, PerfTracker, StatsCsv};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::AppConfig;
use crate::overlay::Overlay;
use crate::{Cli, Demo};

/// Longest step fed to the simulation, so a stalled frame does not teleport
/// the camera.
const MAX_DT: f32 = 0.1;
const MODEL_POSITION: Vec3 = Vec3::new(0.0, -0.5, 3.0);
const CHECKER_SIZE: u32 = 256;
const CHECKER_CELL: u32 = 32;

fn map_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::Escape => Key::Escape,
        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        _ => return None,
    };
    Some(key)
}

fn counters(stats: FrameStats) -> FrameCounters {
    FrameCounters {
        draw_calls: stats.draw_calls,
        triangles: stats.triangles,
        shader_binds: stats.pipeline_binds,
        texture_binds: stats.texture_binds,
        upload_bytes: stats.upload_bytes,
    }
}

/// Feed one key event to `input`. Presses the overlay consumed are dropped;
/// releases always go through.
fn key_event(
    input: &mut InputState,
    code: KeyCode,
    key_state: ElementState,
    consumed: bool,
) -> Option<Action> {
    let key = map_key(code)?;
    match key_state {
        ElementState::Pressed if consumed => None,
        ElementState::Pressed => input.press(key),
        ElementState::Released => {
            input.release(key);
            None
        }
    }
}

/// Forward the change in renderer allocations to `perf` as allocs and frees.
/// Returns the new reported total.
fn report_vram(perf: &mut PerfTracker, reported: u64, allocated: u64) -> u64 {
    if allocated > reported {
        perf.track_alloc(allocated - reported);
    } else if allocated < reported {
        perf.track_free(reported - allocated);
    }
    allocated
}

enum DemoRenderer {
    Lit(WgpuRenderer),
    Sponge(SpongeRenderer),
}

impl DemoRenderer {
    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        match self {
            Self::Lit(r) => r.resize(device, width, height),
            Self::Sponge(r) => r.resize(device, width, height),
        }
    }

    fn allocated_bytes(&self) -> u64 {
        match self {
            Self::Lit(r) => r.allocated_bytes(),
            Self::Sponge(r) => r.allocated_bytes(),
        }
    }
}

/// Window, device and everything created against them.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: DemoRenderer,
    egui_ctx: egui::Context,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct AppState {
    scene: Scene,
    camera: FreeCamera,
    input: InputState,
    perf: PerfTracker,
    /// Renderer allocations already forwarded to `perf`.
    vram_reported: u64,
    csv: Option<StatsCsv>,
    show_overlay: bool,
    started: Instant,
    last_frame: Instant,
}

pub struct GpuApp {
    demo: Demo,
    config: AppConfig,
    state: AppState,
    gpu: Option<Gpu>,
    error: Option<anyhow::Error>,
}

impl GpuApp {
    pub fn new(cli: &Cli, config: AppConfig) -> anyhow::Result<Self> {
        let csv = if cli.save_csv {
            let csv = StatsCsv::create(&cli.csv)
                .with_context(|| format!("creating stats file {}", cli.csv.display()))?;
            tracing::info!("writing frame statistics to {}", cli.csv.display());
            Some(csv)
        } else {
            None
        };

        let mut scene = Scene::demo(cli.num_cubes);
        scene.spin_degrees_per_sec = config.spin_degrees_per_sec;

        let mut camera = FreeCamera::new(config.camera.position, Vec3::NEG_Z, config.camera.speed);
        camera.rot_speed = config.camera.rot_speed;

        let now = Instant::now();
        Ok(Self {
            demo: cli.demo,
            state: AppState {
                scene,
                camera,
                input: InputState::new(),
                perf: PerfTracker::new(),
                vram_reported: 0,
                csv,
                show_overlay: cli.imgui,
                started: now,
                last_frame: now,
            },
            config,
            gpu: None,
            error: None,
        })
    }

    /// Report the first initialization error, or flush statistics after a
    /// clean exit.
    pub fn finish(mut self) -> anyhow::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        if let Some(csv) = &mut self.state.csv {
            csv.flush()?;
            tracing::info!(rows = csv.rows(), "frame statistics saved");
        }
        tracing::info!("{}", self.state.perf.summary_line());
        Ok(())
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<Gpu> {
        let window_config = &self.config.window;
        let attrs = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height));
        let window = Arc::new(event_loop.create_window(attrs).context("creating window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("creating surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no GPU adapter can present to this window")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("glint_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("creating device")?;
        device.on_uncaptured_error(Box::new(|e: wgpu::Error| tracing::error!("wgpu: {e}")));

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if window_config.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        self.state.camera.aspect = config.width as f32 / config.height as f32;

        let shaders = self
            .config
            .shader_dir
            .clone()
            .map(ShaderLibrary::with_dir)
            .unwrap_or_default();
        if let Some(dir) = shaders.dir() {
            tracing::info!("shader overrides read from {}", dir.display());
        }
        let wall_image = match &self.config.wall_texture {
            Some(path) => ImageData::load(path)
                .with_context(|| format!("loading wall texture {}", path.display()))?,
            None => ImageData::checker(CHECKER_SIZE, CHECKER_SIZE, CHECKER_CELL),
        };

        let renderer = match self.demo {
            Demo::Lit => {
                let mut renderer = WgpuRenderer::new(
                    &device,
                    &queue,
                    surface_format,
                    config.width,
                    config.height,
                    &shaders,
                    &wall_image,
                    self.config.shadow_map_size,
                )?;
                if let Some(path) = &self.config.model {
                    match ModelData::load_obj(path) {
                        Ok(model) => {
                            let index = renderer.upload_model(&device, &queue, &model);
                            self.state.scene.add_model(ModelInstance::new(
                                index,
                                model.triangle_count(),
                                Transform::at(MODEL_POSITION),
                                true,
                            ));
                        }
                        Err(e) => tracing::warn!("continuing without model: {e}"),
                    }
                }
                tracing::info!(
                    shadow_map = renderer.shadow_map_size(),
                    cubes = self.state.scene.cubes.len(),
                    "lit demo ready"
                );
                DemoRenderer::Lit(renderer)
            }
            Demo::Sponge => DemoRenderer::Sponge(SpongeRenderer::new(
                &device,
                &queue,
                surface_format,
                config.width,
                config.height,
                &shaders,
                &wall_image,
            )?),
        };

        let egui_ctx = egui::Context::default();
        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            adapter = %adapter.get_info().name,
            "GPU initialized"
        );

        Ok(Gpu {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_ctx,
            egui_winit,
            egui_renderer,
        })
    }

    fn apply(&mut self, action: Action, event_loop: &ActiveEventLoop) {
        match action {
            Action::Quit => event_loop.exit(),
            Action::ToggleOverlay => self.state.show_overlay = !self.state.show_overlay,
            Action::ToggleShadows => {
                if let Some(Gpu {
                    renderer: DemoRenderer::Lit(renderer),
                    ..
                }) = &mut self.gpu
                {
                    let enabled = !renderer.shadows_enabled();
                    renderer.set_shadows(enabled);
                    tracing::info!(enabled, "shadows toggled");
                }
            }
            // Held movement keys are polled once per frame.
            Action::Move(_) => {}
        }
    }

    fn redraw(&mut self) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        let state = &mut self.state;

        state.perf.begin_frame();
        let now = Instant::now();
        let dt = (now - state.last_frame).as_secs_f32().min(MAX_DT);
        state.last_frame = now;

        if let Some(Action::Move(movement)) = state.input.poll_move() {
            state.camera.update(movement.dis, movement.look, dt);
        }
        state.scene.update(dt);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        state.perf.begin_cpu();
        let stats = match &mut gpu.renderer {
            DemoRenderer::Lit(renderer) => {
                match renderer.render(&gpu.device, &gpu.queue, &view, &state.scene, &state.camera) {
                    Ok(stats) => stats,
                    Err(e) => {
                        tracing::error!("frame skipped: {e}");
                        FrameStats::default()
                    }
                }
            }
            DemoRenderer::Sponge(renderer) => renderer.render(
                &gpu.device,
                &gpu.queue,
                &view,
                state.started.elapsed().as_secs_f32(),
            ),
        };
        state.perf.add_counters(counters(stats));
        state.vram_reported = report_vram(
            &mut state.perf,
            state.vram_reported,
            gpu.renderer.allocated_bytes(),
        );

        if state.show_overlay {
            gpu.paint_overlay(&view, state);
        }
        state.perf.end_cpu();

        output.present();
        let sample = state.perf.end_frame();

        let failed = match &mut state.csv {
            Some(csv) => csv.append(&sample).err(),
            None => None,
        };
        if let Some(e) = failed {
            tracing::error!("stats logging stopped: {e}");
            state.csv = None;
        }
        if state.perf.frame_count() % HISTORY as u64 == 0 {
            state.perf.log_summary();
        }
    }
}

impl Gpu {
    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    fn paint_overlay(&mut self, view: &wgpu::TextureView, state: &mut AppState) {
        let lit = matches!(self.renderer, DemoRenderer::Lit(_));
        let mut shadows = match &self.renderer {
            DemoRenderer::Lit(r) => Some(r.shadows_enabled()),
            DemoRenderer::Sponge(_) => None,
        };

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            Overlay {
                perf: &state.perf,
                camera: &state.camera,
                scene: lit.then_some(&mut state.scene),
                shadows: shadows.as_mut(),
            }
            .show(ctx);
        });
        if let (Some(enabled), DemoRenderer::Lit(r)) = (shadows, &mut self.renderer) {
            if enabled != r.shadows_enabled() {
                r.set_shadows(enabled);
            }
        }

        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);
        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        state.perf.count_shader_bind();
        for job in &paint_jobs {
            if let egui::epaint::Primitive::Mesh(mesh) = &job.primitive {
                state.perf.count_draw_call();
                state.perf.count_triangles(mesh.indices.len() as u64 / 3);
            }
        }
        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
            state.perf.count_texture_bind();
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("overlay_encoder"),
            });
        self.egui_renderer
            .update_buffers(&self.device, &self.queue, &mut encoder, &paint_jobs, &screen);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("overlay_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer.render(&mut pass, &paint_jobs, &screen);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match self.init_gpu(event_loop) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                self.error = Some(e.context("initialization failed"));
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let mut consumed = false;
        if let Some(gpu) = &mut self.gpu {
            consumed = self.state.show_overlay
                && gpu.egui_winit.on_window_event(&gpu.window, &event).consumed;
        }
        // Releases still reach the input state so no key stays held.
        if consumed && !matches!(event, WindowEvent::KeyboardInput { .. }) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                    self.state.camera.aspect = gpu.aspect();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if let Some(action) = key_event(&mut self.state.input, code, key_state, consumed) {
                    self.apply(action, event_loop);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(gpu) = &self.gpu {
                    gpu.window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}
