//! Window, GL context, and the per-frame draw loop.

use std::num::NonZeroU32;
use std::path::PathBuf;

use anyhow::{anyhow, Context as _, Result};
use glow::HasContext as _;
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version,
};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow as _};
use raw_window_handle::HasWindowHandle;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::drawer_triangle::{Drawer, TRIANGLE_VERTICES};
use crate::shader;

/// Background color of every frame.
pub const CLEAR_COLOR: [f32; 4] = [0.2, 0.3, 0.3, 1.0];

/// Window/runtime configuration.
///
/// The defaults are the whole configuration surface; nothing is read
/// from the command line or the environment.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub size: PhysicalSize<u32>,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "tri-glow".to_string(),
            size: PhysicalSize::new(800, 600),
            vertex_shader: PathBuf::from("shaders/vertex.glsl"),
            fragment_shader: PathBuf::from("shaders/frag.glsl"),
        }
    }
}

/// Draw-loop state. The only transition is `Running` -> `Closing`;
/// once closing, no further frame is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Running,
    Closing,
}

impl LoopState {
    pub fn close(&mut self) {
        *self = LoopState::Closing;
    }

    pub fn is_closing(self) -> bool {
        matches!(self, LoopState::Closing)
    }
}

/// One window with its OpenGL 3.3 core context and loaded function pointers.
///
/// Field order matters for drop: surface and context release before the window.
pub struct GlSession {
    pub gl: glow::Context,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: Window,
}

impl GlSession {
    pub fn new(event_loop: &ActiveEventLoop, config: &WindowConfig) -> Result<Self> {
        let window_attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(config.size);

        let display_builder = DisplayBuilder::new().with_window_attributes(Some(window_attributes));
        let (window, gl_config) = display_builder
            .build(event_loop, ConfigTemplateBuilder::new(), |mut configs| {
                configs.next().expect("display offered no GL config")
            })
            .map_err(|e| anyhow!("failed to create window and GL config: {e}"))?;
        let window = window.context("display builder returned no window")?;

        let raw_window_handle = window
            .window_handle()
            .context("window has no native handle")?
            .as_raw();

        let gl_display = gl_config.display();
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(Some(raw_window_handle));
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .context("failed to create OpenGL 3.3 core context")?;

        let surface_attributes = window
            .build_surface_attributes(SurfaceAttributesBuilder::<WindowSurface>::new())
            .map_err(|e| anyhow!("failed to build surface attributes: {e}"))?;
        let surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes) }
            .context("failed to create window surface")?;

        let context = not_current
            .make_current(&surface)
            .context("failed to make the GL context current")?;

        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|symbol| {
                gl_display.get_proc_address(symbol) as *const _
            })
        };

        Ok(GlSession {
            gl,
            surface,
            context,
            window,
        })
    }

    /// Presents the finished frame. May block on vertical sync.
    pub fn swap(&self) -> Result<()> {
        self.surface
            .swap_buffers(&self.context)
            .context("buffer swap failed")
    }

    pub fn resize(&self, size: PhysicalSize<u32>) {
        let (Some(width), Some(height)) =
            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return; // minimized
        };
        self.surface.resize(&self.context, width, height);
        unsafe { self.gl.viewport(0, 0, size.width as i32, size.height as i32) };
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

struct App {
    config: WindowConfig,
    session: Option<GlSession>,
    drawer: Drawer,
    state: LoopState,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(config: WindowConfig) -> Self {
        Self {
            config,
            session: None,
            drawer: Drawer::new(),
            state: LoopState::default(),
            failure: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let session = GlSession::new(event_loop, &self.config)?;

        let vertex_source = shader::load_source(&self.config.vertex_shader)?;
        let fragment_source = shader::load_source(&self.config.fragment_shader)?;
        self.drawer
            .compile_shader(&session.gl, &vertex_source, &fragment_source)?;
        self.drawer.set_vtx2xyz(&session.gl, &TRIANGLE_VERTICES)?;

        session.resize(session.window.inner_size());
        log::info!(
            "session up: {}x{} \"{}\"",
            self.config.size.width,
            self.config.size.height,
            self.config.title
        );
        self.session = Some(session);
        Ok(())
    }

    /// One loop iteration: clear, draw, present.
    fn redraw(&mut self) -> Result<()> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        let gl = &session.gl;
        unsafe {
            gl.clear_color(CLEAR_COLOR[0], CLEAR_COLOR[1], CLEAR_COLOR[2], CLEAR_COLOR[3]);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }
        self.drawer.paint(gl);
        session.swap()
    }

    /// Enters `Closing` and releases GL objects, then the session.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.state.close();
        if let Some(session) = self.session.take() {
            self.drawer.destroy(&session.gl);
        }
        event_loop.exit();
    }

    fn fail(&mut self, err: anyhow::Error, event_loop: &ActiveEventLoop) {
        log::error!("{err:#}");
        if self.failure.is_none() {
            self.failure = Some(err);
        }
        self.shutdown(event_loop);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(e, event_loop);
            return;
        }
        if let Some(session) = &self.session {
            session.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.shutdown(event_loop),

            WindowEvent::Resized(size) => {
                if let Some(session) = &self.session {
                    session.resize(size);
                }
            }

            WindowEvent::RedrawRequested => {
                if self.state.is_closing() {
                    return;
                }
                if let Err(e) = self.redraw() {
                    self.fail(e, event_loop);
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_closing() {
            event_loop.exit();
            return;
        }
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(session) = &self.session {
            session.request_redraw();
        }
    }
}

/// Runs the draw loop to completion. Returns after the window closes or
/// a startup/frame failure.
pub fn run(config: WindowConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut app = App::new(config);

    event_loop
        .run_app(&mut app)
        .context("winit event loop terminated with error")?;

    match app.failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
