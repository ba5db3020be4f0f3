mod window;

use anyhow::{Context as _, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec3;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use viewport_common::{SharedViewportSize, ViewportSize};
use viewport_render::{PerspectiveCamera, ProjectionCamera};
use viewport_render_wgpu::SurfaceTarget;
use viewport_sync::{
    ControlPanelLifecycle, HostComponent, SyncConfig, WindowEventSource, bind_control_panel,
    bind_resize_sync,
};
use viewport_tools::TweakPanel;
use window::WinitWindowSource;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "viewport-desktop", about = "Window-synchronized 3D viewport")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML file with resize pipeline settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial window width in logical units
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial window height in logical units
    #[arg(long, default_value = "720")]
    height: u32,
}

/// Everything that only exists while a window does.
struct Gfx {
    // Declared first so hooks detach before the surface and window drop.
    host: HostComponent,
    window: Arc<Window>,
    source: Rc<WinitWindowSource>,
    target: Rc<RefCell<SurfaceTarget>>,
    panel: Rc<RefCell<ControlPanelLifecycle<TweakPanel>>>,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct ViewportApp {
    config: SyncConfig,
    initial_size: LogicalSize<u32>,
    size: SharedViewportSize,
    camera: Rc<RefCell<PerspectiveCamera>>,
    egui_ctx: EguiContext,
    gfx: Option<Gfx>,
    keys_held: HashSet<KeyCode>,
    mouse_captured: bool,
    last_frame: Instant,
}

impl ViewportApp {
    fn new(config: SyncConfig, width: u32, height: u32) -> Self {
        Self {
            config,
            initial_size: LogicalSize::new(width, height),
            size: ViewportSize::new(width as f64, height as f64).shared(),
            camera: Rc::new(RefCell::new(PerspectiveCamera::default())),
            egui_ctx: EguiContext::default(),
            gfx: None,
            keys_held: HashSet::new(),
            mouse_captured: false,
            last_frame: Instant::now(),
        }
    }

    fn init_gfx(&self, event_loop: &ActiveEventLoop) -> Result<Gfx> {
        let attrs = Window::default_attributes()
            .with_title("Viewport")
            .with_inner_size(self.initial_size);
        let window = Arc::new(event_loop.create_window(attrs)?);
        let source = Rc::new(WinitWindowSource::new(&window));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("viewport_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;
        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        let target = Rc::new(RefCell::new(SurfaceTarget::new(
            surface,
            &adapter,
            device,
            queue,
            source.inner_size(),
            source.device_pixel_ratio().min(self.config.max_pixel_ratio),
        )));

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = {
            let target = target.borrow();
            egui_wgpu::Renderer::new(target.device(), target.format(), None, 1, false)
        };

        let mut host = HostComponent::new("viewport");
        let sync = bind_resize_sync(
            &mut host,
            source.clone(),
            self.size.clone(),
            self.camera.clone(),
            target.clone(),
            self.config,
        );
        let panel = bind_control_panel(&mut host, || {
            let camera = self.camera.borrow();
            let mut panel = TweakPanel::new("Tweaks");
            panel.add_slider("fov", camera.fov.to_degrees(), 30.0..=110.0);
            panel.add_slider("speed", camera.speed, 1.0..=50.0);
            panel.add_toggle("show stats", true);
            Ok::<_, anyhow::Error>(panel)
        })?;

        host.mount()?;
        sync.borrow().sync_now()?;

        Ok(Gfx {
            host,
            window,
            source,
            target,
            panel,
            egui_winit,
            egui_renderer,
        })
    }

    fn update(&mut self, dt: f32) {
        let mut axes = Vec3::ZERO;
        for (key, axis) in [
            (KeyCode::KeyW, Vec3::Z),
            (KeyCode::KeyS, Vec3::NEG_Z),
            (KeyCode::KeyD, Vec3::X),
            (KeyCode::KeyA, Vec3::NEG_X),
            (KeyCode::Space, Vec3::Y),
            (KeyCode::ControlLeft, Vec3::NEG_Y),
        ] {
            if self.keys_held.contains(&key) {
                axes += axis;
            }
        }
        let boost = if self.keys_held.contains(&KeyCode::ShiftLeft) {
            3.0
        } else {
            1.0
        };
        if axes != Vec3::ZERO {
            self.camera.borrow_mut().translate_local(axes, dt * boost);
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if !pressed {
            self.keys_held.remove(&key);
            return;
        }
        self.keys_held.insert(key);

        if key == KeyCode::F1 {
            if let Some(gfx) = &self.gfx {
                if let Some(panel) = gfx.panel.borrow_mut().panel_mut() {
                    let visible = panel.is_visible();
                    panel.set_visible(!visible);
                }
            }
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;
        self.update(dt);

        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };
        let target = gfx.target.borrow();
        let Some(frame) = target.acquire_frame() else {
            return;
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        target.render(&view, &self.camera.borrow());

        let raw_input = gfx.egui_winit.take_egui_input(&gfx.window);
        let full_output = {
            let mut lifecycle = gfx.panel.borrow_mut();
            let camera = &self.camera;
            let size = &self.size;
            let ctx = &self.egui_ctx;
            ctx.run(raw_input, |ctx| {
                if let Some(panel) = lifecycle.panel_mut() {
                    draw_panel(ctx, panel, camera, size);
                }
            })
        };
        gfx.egui_winit
            .handle_platform_output(&gfx.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor =
            screen_descriptor(target.physical_size(), target.pixel_density());

        let (device, queue) = (target.device(), target.queue());
        for (id, image_delta) in &full_output.textures_delta.set {
            gfx.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        gfx.egui_renderer.update_buffers(
            device,
            queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
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
            gfx.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gfx.egui_renderer.free_texture(id);
        }

        frame.present();
        gfx.window.request_redraw();
    }
}

/// Screen description for the egui pass over a surface of `physical` pixels.
///
/// The surface holds `logical * pixel_density` pixels, where the density may be
/// clamped below the window scale factor. Using the same density here keeps
/// egui's point space equal to the window's logical size.
fn screen_descriptor(physical: (u32, u32), pixel_density: f64) -> egui_wgpu::ScreenDescriptor {
    egui_wgpu::ScreenDescriptor {
        size_in_pixels: [physical.0, physical.1],
        pixels_per_point: pixel_density as f32,
    }
}

/// Draw the tuning panel and push changed values into the camera.
fn draw_panel(
    ctx: &EguiContext,
    panel: &mut TweakPanel,
    camera: &Rc<RefCell<PerspectiveCamera>>,
    size: &SharedViewportSize,
) {
    if panel.show(ctx) {
        let mut camera = camera.borrow_mut();
        if let Some(fov) = panel.slider("fov") {
            camera.fov = fov.to_radians();
            camera.recompute_projection();
        }
        if let Some(speed) = panel.slider("speed") {
            camera.speed = speed;
        }
    }

    if panel.is_visible() && panel.toggle("show stats") == Some(true) {
        let size = *size.borrow();
        let aspect = camera.borrow().aspect();
        egui::Area::new(egui::Id::new("stats"))
            .anchor(egui::Align2::LEFT_BOTTOM, [8.0, -8.0])
            .show(ctx, |ui| {
                ui.label(format!(
                    "{:.0}x{:.0}  aspect {:.4}",
                    size.width, size.height, aspect
                ));
                ui.small("F1: Toggle Panel | RMB: Look | WASD: Move");
            });
    }
}

impl ApplicationHandler for ViewportApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_some() {
            return;
        }
        match self.init_gfx(event_loop) {
            Ok(gfx) => self.gfx = Some(gfx),
            Err(e) => {
                tracing::error!("failed to initialize viewport: {e:#}");
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
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };
        let response = gfx.egui_winit.on_window_event(&gfx.window, &event);
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                gfx.host.unmount();
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                gfx.source.refresh(&gfx.window);
                if let Err(e) = gfx.source.notify() {
                    tracing::error!("resize handling failed: {e}");
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state: btn_state,
                ..
            } => {
                self.mouse_captured = btn_state == ElementState::Pressed;
                gfx.window.set_cursor_visible(!self.mouse_captured);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.mouse_captured {
                self.camera
                    .borrow_mut()
                    .rotate(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gfx) = &self.gfx {
            gfx.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => SyncConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SyncConfig::default(),
    };
    tracing::info!(max_pixel_ratio = config.max_pixel_ratio, "viewport-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewportApp::new(config, cli.width, cli.height);
    event_loop.run_app(&mut app)?;

    Ok(())
}
