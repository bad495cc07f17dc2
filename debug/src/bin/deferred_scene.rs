//! Interactive demo scene through the window backend; the host never touches wgpu directly.
//! Run: cargo run -p debug --bin deferred_scene [-- path/to/model.obj]
//!
//! WASD move, Space rises, holding LeftShift moves four times faster.
//! Right mouse drag looks around; O toggles orbit mode, where left drag orbits the target.
//! The scroll wheel zooms. F toggles deferred/forward, 1-5 pick the composite target
//! (position, diffuse, normals, depth, final), Esc quits.

use std::path::PathBuf;
use std::time::Instant;

use penumbra_bridge::PenumbraWindowBackend;
use penumbra_renderer::demo::build_demo_scene;
use penumbra_renderer::RendererConfig;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use render_api::{FrameInfo, Input, Key, MouseButton, RenderBackend, RenderBackendWindow};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

fn map_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::Space => Key::Space,
        KeyCode::ShiftLeft => Key::LeftShift,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyF => Key::F,
        KeyCode::Digit1 => Key::Digit1,
        KeyCode::Digit2 => Key::Digit2,
        KeyCode::Digit3 => Key::Digit3,
        KeyCode::Digit4 => Key::Digit4,
        KeyCode::Digit5 => Key::Digit5,
        KeyCode::Escape => Key::Escape,
        _ => return None,
    })
}

fn map_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

struct App {
    config: RendererConfig,
    model_path: Option<PathBuf>,
    window: Option<Window>,
    backend: Option<PenumbraWindowBackend>,
    input: Input,
    size: (u32, u32),
    last_frame: Instant,
}

impl App {
    fn new(config: RendererConfig, model_path: Option<PathBuf>) -> Self {
        Self {
            config,
            model_path,
            window: None,
            backend: None,
            input: Input::new(),
            size: (1280, 720),
            last_frame: Instant::now(),
        }
    }

    fn create_backend(&self, window: &Window) -> anyhow::Result<PenumbraWindowBackend> {
        let mut backend = PenumbraWindowBackend::from_window(window, self.config.clone(), self.size)?;
        let model_path = self.model_path.as_deref();
        backend.setup(|renderer, device| build_demo_scene(renderer, device, model_path))?;
        Ok(backend)
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let Some(window) = &self.window else {
            return Ok(());
        };
        if self.backend.is_none() {
            self.backend = Some(self.create_backend(window)?);
            self.last_frame = Instant::now();
        }
        let (raw_window, raw_display) = (window.window_handle()?.as_raw(), window.display_handle()?.as_raw());
        let Some(backend) = &mut self.backend else {
            return Ok(());
        };

        if self.input.was_key_pressed(Key::Escape) {
            event_loop.exit();
            return Ok(());
        }
        let now = Instant::now();
        let frame = FrameInfo {
            viewport_size: self.size,
            delta_seconds: now.duration_since(self.last_frame).as_secs_f32(),
        };
        self.last_frame = now;

        backend.update(&self.input, &frame)?;
        backend.render_frame_to_window(&frame, raw_window, raw_display)?;
        self.input.end_frame();
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title("Penumbra")
            .with_inner_size(winit::dpi::PhysicalSize::new(self.size.0, self.size.1));
        match event_loop.create_window(attrs) {
            Ok(window) => {
                let size = window.inner_size();
                self.size = (size.width, size.height);
                window.request_redraw();
                self.window = Some(window);
            }
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.size = (size.width, size.height),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(key) = map_key(code) {
                        if !event.repeat {
                            self.input.key_event(key, event.state == ElementState::Pressed);
                        }
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = map_button(button) {
                    self.input.button_event(button, state == ElementState::Pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.cursor_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                self.input.scroll_event(lines);
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw(event_loop) {
                    log::error!("frame failed: {e:#}");
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = RendererConfig::from_env();
    let model_path = std::env::args().nth(1).map(PathBuf::from);
    log::info!("starting in {:?} mode, target {}", config.mode, config.target.name());

    let event_loop = winit::event_loop::EventLoop::new()?;
    let mut app = App::new(config, model_path);
    event_loop.run_app(&mut app)?;
    Ok(())
}
