use std::sync::Arc;
use std::time::Instant;

use winit::window::Window;

use crate::config::{Policy, SimConfig};
use crate::rendering::camera::Camera;
use crate::rendering::pipelines::ParticlePipeline;
use crate::simulation::buffers::ParticleState;
use crate::simulation::init::{self, InitialState};
use crate::simulation::kernel::BodyIntegrator;
use crate::simulation::stepper::Stepper;

/// Owns the GPU context, the running simulation and the point renderer,
/// and drives one tick + one draw per frame.
pub(crate) struct Renderer {
    window: Arc<Window>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    size: winit::dpi::PhysicalSize<u32>,
    surface: wgpu::Surface<'static>,

    pipeline: ParticlePipeline,
    bind_groups: [wgpu::BindGroup; 2],

    stepper: Stepper<BodyIntegrator>,
    last_update: Instant,

    camera: Camera,
}

fn generate_for(cfg: &SimConfig) -> InitialState {
    init::generate(
        cfg.policy,
        cfg.num_bodies,
        cfg.seed,
        cfg.position_scale,
        cfg.velocity_scale,
    )
}

impl Renderer {
    pub(crate) async fn new(window: Arc<Window>, config: SimConfig) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .expect("failed to find a gpu adapter");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("failed to acquire a gpu device");

        let size = window.inner_size();

        let surface = instance
            .create_surface(window.clone())
            .expect("failed to create surface");
        let cap = surface.get_capabilities(&adapter);
        let surface_format = cap.formats[0];

        // Configuration is normalized exactly once, before any buffer is
        // sized.
        let cfg = config.normalize();

        let initial = generate_for(&cfg);
        let state = ParticleState::create(&device, &initial);
        let kernel = BodyIntegrator::new(&device, &queue);

        let pipeline = ParticlePipeline::new(&device, surface_format);
        let bind_groups = pipeline.create_bind_groups(
            &device,
            [state.positions().slot(0), state.positions().slot(1)],
        );

        let camera = Camera::new(12.0 * cfg.position_scale);

        let stepper = Stepper::new(kernel, state, cfg);

        let renderer = Self {
            window,
            device,
            queue,
            size,
            surface,
            pipeline,
            bind_groups,
            stepper,
            last_update: Instant::now(),
            camera,
        };

        renderer.configure_surface();

        renderer
    }

    pub(crate) fn get_window(&self) -> &Window {
        &self.window
    }

    fn configure_surface(&self) {
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.pipeline.surface_format,
            // Request compatibility with the sRGB-format texture view we're going to create later.
            view_formats: vec![self.pipeline.surface_format.add_srgb_suffix()],
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            width: self.size.width,
            height: self.size.height,
            desired_maximum_frame_latency: 2,
            present_mode: wgpu::PresentMode::AutoVsync,
        };
        self.surface.configure(&self.device, &surface_config);
    }

    pub(crate) fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.size = new_size;
        self.configure_surface();
    }

    pub(crate) fn render(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f32();
        self.last_update = now;

        // Cap the step so the first frame (and hitches) don't jump the
        // integration.
        let dt = dt.min(0.016);

        // Advance the simulation: dispatch then swap. The render pass is
        // enqueued after the dispatch on the same queue, so in-order
        // execution guarantees it sees the freshly written buffer.
        self.stepper.step(dt);

        let aspect = self.size.width as f32 / self.size.height as f32;
        self.pipeline
            .update_camera(&self.queue, &self.camera.uniform(aspect));

        let surface_texture = self
            .surface
            .get_current_texture()
            .expect("failed to acquire next swapchain texture");
        let texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor {
                format: Some(self.pipeline.surface_format.add_srgb_suffix()),
                ..Default::default()
            });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Particle Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Particle Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.0,
                            g: 0.0,
                            b: 0.03,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline.render_pipeline);
            // Post-swap READ slot: the buffer this tick's dispatch wrote.
            render_pass.set_bind_group(0, &self.bind_groups[self.stepper.state().read_index()], &[]);
            render_pass.draw(0..self.stepper.config().num_bodies, 0..1);
        }

        self.queue.submit([encoder.finish()]);
        self.window.pre_present_notify();
        surface_texture.present();
    }

    /// Re-runs the generator under a different policy and rewrites both
    /// slots of both buffers.
    pub(crate) fn switch_policy(&mut self, policy: Policy) {
        if self.stepper.config().policy == policy {
            return;
        }
        self.stepper.config_mut().policy = policy;
        self.reseed_state();
    }

    /// Re-seeds the current policy with a fresh seed.
    pub(crate) fn reseed(&mut self) {
        let seed = self.stepper.config().seed.wrapping_add(1);
        self.stepper.config_mut().seed = seed;
        self.reseed_state();
    }

    fn reseed_state(&mut self) {
        let cfg = *self.stepper.config();
        log::info!(
            "seeding policy {} with seed {}",
            cfg.policy.name(),
            cfg.seed
        );
        let initial = generate_for(&cfg);
        self.stepper.state().reseed(&self.queue, &initial);
    }

    /// Terminal teardown: stop ticking, then release the particle buffers.
    /// Nothing referencing them is enqueued after this point.
    pub(crate) fn shutdown(self) {
        log::info!("simulation stopped after {} ticks", self.stepper.ticks());
        let mut state = self.stepper.into_state();
        state.release();
    }

    // Camera controls, routed from the event loop.

    pub(crate) fn pan_camera(&mut self, delta_x: f32, delta_y: f32) {
        self.camera.pan(delta_x, delta_y);
    }

    pub(crate) fn zoom_camera(&mut self, delta: f32) {
        self.camera.zoom(delta);
    }

    pub(crate) fn rotate_camera(&mut self, delta: f32) {
        self.camera.rotate(delta);
    }

    pub(crate) fn reset_camera(&mut self) {
        self.camera = Camera::new(12.0 * self.stepper.config().position_scale);
    }

    pub(crate) fn handle_mouse_press(&mut self, position: [f32; 2], ctrl: bool, shift: bool) {
        self.camera.handle_mouse_press(position, ctrl, shift);
    }

    pub(crate) fn handle_mouse_release(&mut self) {
        self.camera.handle_mouse_release();
    }

    pub(crate) fn handle_mouse_move(&mut self, position: [f32; 2]) {
        self.camera.handle_mouse_move(position);
    }

    pub(crate) fn handle_mouse_wheel(&mut self, delta: f32) {
        self.camera.handle_mouse_wheel(delta);
    }

    pub(crate) fn handle_key_state(&mut self, ctrl: bool, shift: bool) {
        self.camera.handle_key_state(ctrl, shift);
    }
}
