use std::sync::Arc;

// Use web-time for cross-platform time support (works on both desktop and web)
#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

use wgpu::util::DeviceExt;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::{Cursor, CursorIcon, Fullscreen, Window},
};

use crate::backend::PixelBackend;
use crate::engine::CanvasEngine;
use crate::input::{InputEvent, KeyCommand, PointerButton};
use crate::viewport::Point;
use crate::{constants, now_millis, Config};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[cfg(target_arch = "wasm32")]
    #[error("canvas element '{0}' not found")]
    Canvas(String),
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 2],
    tex_coords: [f32; 2],
}

impl Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

// Full-window quad; texture row 0 is the top of the frame
#[rustfmt::skip]
const VERTICES: &[Vertex] = &[
    Vertex { position: [-1.0, -1.0], tex_coords: [0.0, 1.0] },
    Vertex { position: [1.0, -1.0], tex_coords: [1.0, 1.0] },
    Vertex { position: [1.0, 1.0], tex_coords: [1.0, 0.0] },
    Vertex { position: [-1.0, 1.0], tex_coords: [0.0, 0.0] },
];

const INDICES: &[u16] = &[0, 1, 2, 2, 3, 0];

// The frame holds sRGB-encoded bytes. The desktop surface is sRGB, so sample
// through an sRGB view; the web surface is linear, so pass bytes through.
#[cfg(target_arch = "wasm32")]
const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
#[cfg(not(target_arch = "wasm32"))]
const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// GPU copy of the composed frame, recreated when the window size changes
struct FrameTarget {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

pub struct RenderApp {
    engine: CanvasEngine,
    window: Option<Arc<Window>>,
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    surface: Option<wgpu::Surface<'static>>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: Option<wgpu::SurfaceConfiguration>,
    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    // Built once the surface format is known
    render_pipeline: Option<wgpu::RenderPipeline>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    frame_target: Option<FrameTarget>,

    // Window dimensions
    window_width: u32,
    window_height: u32,

    // Last position reported by the window, used for button events
    cursor_position: Point,

    // Throttle title updates; the frame itself repaints every refresh
    last_title_update: Option<Instant>,
}

impl RenderApp {
    /// Acquire the GPU, prepare presentation resources and load the canvas.
    /// The window itself is created on `resumed`.
    pub async fn new(config: Config, backend: Box<dyn PixelBackend>) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        let info = adapter.get_info();
        log::info!("Using GPU: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Main Device"),
                required_features: wgpu::Features::empty(),
                #[cfg(target_arch = "wasm32")]
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                #[cfg(not(target_arch = "wasm32"))]
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Present Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/present.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Present Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        // Cells must stay crisp at every zoom level
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Frame Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let window_width = config.width;
        let window_height = config.height;

        let mut engine = CanvasEngine::new(config, backend);
        let report = engine.load_initial(now_millis());
        log::info!(
            "Canvas ready: {} pixels loaded, {} rows rejected{}",
            report.loaded,
            report.rejected,
            if report.failed { " (load failed)" } else { "" }
        );

        Ok(Self {
            engine,
            window: None,
            instance,
            adapter,
            surface: None,
            device,
            queue,
            surface_config: None,
            shader,
            pipeline_layout,
            render_pipeline: None,
            vertex_buffer,
            index_buffer,
            bind_group_layout,
            sampler,
            frame_target: None,
            window_width,
            window_height,
            cursor_position: Point::default(),
            last_title_update: None,
        })
    }

    pub fn engine(&self) -> &CanvasEngine {
        &self.engine
    }

    fn init_window(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) -> Result<(), RenderError> {
        let mut window_attributes = Window::default_attributes().with_title("pixgrid");

        // On desktop, set the window size. On web, don't - let it use the canvas's existing size
        #[cfg(not(target_arch = "wasm32"))]
        {
            window_attributes = window_attributes
                .with_inner_size(winit::dpi::PhysicalSize::new(self.window_width, self.window_height));
            if self.engine.config().fullscreen {
                window_attributes = window_attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let canvas = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.get_element_by_id(crate::web::CANVAS_ID))
                .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
                .ok_or_else(|| RenderError::Canvas(crate::web::CANVAS_ID.to_string()))?;
            window_attributes = window_attributes.with_canvas(Some(canvas));
        }

        let window = Arc::new(event_loop.create_window(window_attributes)?);

        // Actual size may differ from the request (fullscreen, web canvas)
        let actual_size = window.inner_size();
        if actual_size.width > 0 && actual_size.height > 0 {
            self.window_width = actual_size.width;
            self.window_height = actual_size.height;
        } else {
            log::warn!(
                "Window reported size {}x{}, using config dimensions {}x{}",
                actual_size.width,
                actual_size.height,
                self.window_width,
                self.window_height
            );
        }

        let surface = self.instance.create_surface(window.clone())?;
        let surface_caps = surface.get_capabilities(&self.adapter);
        let surface_format =
            pick_surface_format(&surface_caps.formats).ok_or(RenderError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: self.window_width,
            height: self.window_height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&self.device, &config);
        self.render_pipeline = Some(self.create_pipeline(surface_format));
        log::info!(
            "Surface {}x{} ({:?})",
            self.window_width,
            self.window_height,
            surface_format
        );

        self.window = Some(window);
        self.surface = Some(surface);
        self.surface_config = Some(config);
        Ok(())
    }

    /// Present pipeline whose colour target matches the configured surface
    fn create_pipeline(&self, format: wgpu::TextureFormat) -> wgpu::RenderPipeline {
        self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Present Pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    fn create_frame_target(&self, width: u32, height: u32) -> FrameTarget {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Frame Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FRAME_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        log::debug!("Frame texture {}x{}", width, height);
        FrameTarget {
            texture,
            bind_group,
            width,
            height,
        }
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
        if width == 0 || height == 0 {
            return;
        }
        if let (Some(config), Some(surface)) = (&mut self.surface_config, &self.surface) {
            config.width = width;
            config.height = height;
            surface.configure(&self.device, config);
        }
    }

    fn update_title(&mut self, now: u64) {
        let throttle = Duration::from_millis(constants::TITLE_THROTTLE_MS);
        if let Some(last) = self.last_title_update {
            if last.elapsed() < throttle {
                return;
            }
        }
        if let Some(window) = &self.window {
            window.set_title(&format!("pixgrid | {}", self.engine.status_line(now)));
        }
        self.last_title_update = Some(Instant::now());
    }

    fn dispatch(&mut self, event: InputEvent) {
        let was_panning = self.engine.is_panning();
        self.engine.handle_input(event, now_millis());

        let panning = self.engine.is_panning();
        if panning != was_panning {
            if let Some(window) = &self.window {
                let icon = if panning { CursorIcon::Grabbing } else { CursorIcon::Default };
                window.set_cursor(Cursor::Icon(icon));
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn apply_web_commands(&mut self) {
        for command in crate::web::drain_commands() {
            crate::web::apply_command(&mut self.engine, command);
        }
        crate::web::publish_status(&self.engine, now_millis());
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let (width, height) = (self.window_width, self.window_height);
        if width == 0 || height == 0 || self.surface.is_none() {
            return Ok(());
        }

        let now = now_millis();

        let stale = self
            .frame_target
            .as_ref()
            .map_or(true, |t| t.width != width || t.height != height);
        if stale {
            self.frame_target = Some(self.create_frame_target(width, height));
        }

        let Some(frame) = self.engine.frame(now, width, height) else {
            return Ok(());
        };
        let (Some(surface), Some(target), Some(pipeline)) =
            (&self.surface, &self.frame_target, &self.render_pipeline)
        else {
            return Ok(());
        };

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            frame.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let output = surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &target.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..INDICES.len() as u32, 0, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.update_title(now);
        Ok(())
    }
}

impl Drop for RenderApp {
    fn drop(&mut self) {
        // Persist before GPU teardown
        self.engine.shutdown(now_millis());

        // Drop GPU resources before surface, and surface before window
        self.frame_target = None;
        self.render_pipeline = None;
        self.surface_config = None;
        if let Some(surface) = self.surface.take() {
            drop(surface);
        }
        self.window = None;
    }
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Middle => Some(PointerButton::Middle),
        MouseButton::Right => Some(PointerButton::Secondary),
        _ => None,
    }
}

/// Surface format for presenting the frame. Desktop wants an sRGB format
/// so the sRGB frame texture round-trips; the web canvas prefers linear
/// `Bgra8Unorm`. Falls back to the first reported format.
fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    #[cfg(target_arch = "wasm32")]
    let preferred = formats.iter().find(|f| **f == wgpu::TextureFormat::Bgra8Unorm);
    #[cfg(not(target_arch = "wasm32"))]
    let preferred = formats.iter().find(|f| f.is_srgb());

    preferred.or_else(|| formats.first()).copied()
}

/// Wheel delta in DOM convention (positive = scroll down, ~100 per notch)
fn wheel_delta_y(delta: MouseScrollDelta) -> f64 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -(y as f64) * 100.0,
        MouseScrollDelta::PixelDelta(pos) => -pos.y,
    }
}

impl ApplicationHandler for RenderApp {
    // Write-back timers keep firing while nothing is painted (minimized, occluded)
    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        self.engine.tick(now_millis());
    }

    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init_window(event_loop) {
                log::error!("Window initialisation failed: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                self.engine.shutdown(now_millis());
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                #[cfg(target_arch = "wasm32")]
                self.apply_web_commands();

                match self.render() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(window) = &self.window {
                            let size = window.inner_size();
                            self.resize_surface(size.width, size.height);
                        }
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("GPU out of memory, exiting");
                        self.engine.shutdown(now_millis());
                        event_loop.exit();
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
            WindowEvent::Resized(physical_size) => {
                self.resize_surface(physical_size.width, physical_size.height);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.dispatch(InputEvent::Wheel {
                    delta_y: wheel_delta_y(delta),
                    position: self.cursor_position,
                });
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_position = Point::new(position.x, position.y);
                self.dispatch(InputEvent::PointerMove {
                    position: self.cursor_position,
                });
            }
            WindowEvent::CursorLeft { .. } => {
                self.dispatch(InputEvent::PointerLeave);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = pointer_button(button) {
                    let position = self.cursor_position;
                    self.dispatch(match state {
                        ElementState::Pressed => InputEvent::PointerDown { button, position },
                        ElementState::Released => InputEvent::PointerUp { button, position },
                    });
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(keycode) = event.physical_key {
                        match keycode {
                            KeyCode::KeyG => self.dispatch(InputEvent::Key(KeyCommand::ToggleGrid)),
                            KeyCode::KeyR => self.dispatch(InputEvent::Key(KeyCommand::PickColor)),
                            KeyCode::BracketLeft => {
                                self.engine.cycle_color(-1);
                            }
                            KeyCode::BracketRight => {
                                self.engine.cycle_color(1);
                            }
                            KeyCode::Digit0 | KeyCode::Numpad0 => self.engine.reset_viewport(),
                            KeyCode::F1 => log::info!("{}", self.engine.config().help_text()),
                            KeyCode::F11 => {
                                if let Some(window) = &self.window {
                                    let is_fullscreen = window.fullscreen().is_some();
                                    window.set_fullscreen(if is_fullscreen {
                                        None
                                    } else {
                                        Some(Fullscreen::Borderless(None))
                                    });
                                }
                            }
                            KeyCode::Escape => {
                                // Exit fullscreen or close
                                if let Some(window) = &self.window {
                                    if window.fullscreen().is_some() {
                                        window.set_fullscreen(None);
                                    } else {
                                        log::info!("Escape pressed, exiting...");
                                        self.engine.shutdown(now_millis());
                                        event_loop.exit();
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }
            _ => {}
        }

        // No redraw requests outlive the engine's repaint loop
        if self.engine.is_running() {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn wheel_deltas_follow_dom_convention() {
        // winit: positive y scrolls up; DOM: positive deltaY scrolls down
        assert_eq!(wheel_delta_y(MouseScrollDelta::LineDelta(0.0, 1.0)), -100.0);
        assert_eq!(wheel_delta_y(MouseScrollDelta::LineDelta(0.0, -2.0)), 200.0);
        assert_eq!(
            wheel_delta_y(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 30.0))),
            -30.0
        );
    }

    #[test]
    fn pan_buttons_map_to_middle_and_right() {
        assert!(pointer_button(MouseButton::Middle).unwrap().pans());
        assert!(pointer_button(MouseButton::Right).unwrap().pans());
        assert_eq!(pointer_button(MouseButton::Left), Some(PointerButton::Primary));
        assert_eq!(pointer_button(MouseButton::Back), None);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn surface_format_prefers_srgb_whatever_its_channel_order() {
        use wgpu::TextureFormat::*;
        assert_eq!(pick_surface_format(&[Rgba8Unorm, Rgba8UnormSrgb, Bgra8UnormSrgb]), Some(Rgba8UnormSrgb));
        assert_eq!(pick_surface_format(&[Bgra8Unorm, Bgra8UnormSrgb]), Some(Bgra8UnormSrgb));
        assert_eq!(pick_surface_format(&[Rgb10a2Unorm]), Some(Rgb10a2Unorm));
        assert_eq!(pick_surface_format(&[]), None);
    }
}
