//! Fly camera with an orbit (arc-ball) mode around a pivot.

use std::f32::consts::PI;

use glam::{Mat4, Quat, Vec3};
use render_api::{FrameInfo, Input, Key, MouseButton};

pub const DEFAULT_YAW: f32 = 90.0;
pub const DEFAULT_PITCH: f32 = -15.0;
pub const DEFAULT_SPEED: f32 = 2.5;
pub const DEFAULT_SENSITIVITY: f32 = 0.1;
pub const DEFAULT_ZOOM: f32 = 45.0;
const BOOST: f32 = 4.0;
const PITCH_LIMIT: f32 = 89.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub world_up: Vec3,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    /// Degrees.
    yaw: f32,
    /// Degrees, clamped to ±89.
    pitch: f32,
    pub speed: f32,
    pub sensitivity: f32,
    /// Vertical field of view in degrees, 1..=45.
    zoom: f32,
    pub boost: bool,
    /// Orbit mode: look at `pivot` and rotate around it.
    pub orbit: bool,
    pub pivot: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            world_up: Vec3::Y,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            speed: DEFAULT_SPEED,
            sensitivity: DEFAULT_SENSITIVITY,
            zoom: DEFAULT_ZOOM,
            boost: false,
            orbit: false,
            pivot: Vec3::ZERO,
            near: 0.1,
            far: 1000.0,
        };
        camera.update_vectors();
        camera
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn view_matrix(&self) -> Mat4 {
        if self.orbit {
            Mat4::look_at_rh(self.position, self.pivot, self.up)
        } else {
            Mat4::look_at_rh(self.position, self.position + self.front, self.up)
        }
    }

    /// Right-handed perspective with depth in [0, 1].
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.zoom.to_radians(), aspect, self.near, self.far)
    }

    pub fn process_keyboard(&mut self, movement: Movement, delta_seconds: f32) {
        let boost = if self.boost { BOOST } else { 1.0 };
        let velocity = self.speed * boost * delta_seconds;
        match movement {
            Movement::Forward => self.position += self.front * velocity,
            Movement::Backward => self.position -= self.front * velocity,
            Movement::Left => self.position -= self.right * velocity,
            Movement::Right => self.position += self.right * velocity,
            Movement::Up => self.position += self.up * velocity,
        }
    }

    /// Offsets in pixels; positive y looks up.
    pub fn process_mouse(&mut self, x_offset: f32, y_offset: f32) {
        self.yaw += x_offset * self.sensitivity;
        self.pitch = (self.pitch + y_offset * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    /// Rotate the position around the pivot: a drag across the whole width is a full turn,
    /// across the whole height half a turn.
    pub fn process_arc_ball(&mut self, x_offset: f32, y_offset: f32, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let angle_x = x_offset * (2.0 * PI / width);
        let angle_y = y_offset * (PI / height);

        let offset = Quat::from_axis_angle(self.world_up, angle_x) * (self.position - self.pivot);
        let offset = Quat::from_axis_angle(self.right, angle_y) * offset;
        let position = self.pivot + offset;

        let front = (self.pivot - position).normalize_or_zero();
        let right = front.cross(self.world_up).normalize_or_zero();
        // Directly above or below the pivot the basis degenerates; keep the last one.
        if front == Vec3::ZERO || right == Vec3::ZERO {
            return;
        }
        self.position = position;
        self.front = front;
        self.right = right;
        self.up = right.cross(front).normalize();
    }

    pub fn process_scroll(&mut self, lines: f32) {
        self.zoom = (self.zoom - lines).clamp(1.0, 45.0);
    }

    /// Enter or leave orbit mode. Leaving restores the fly basis from yaw/pitch.
    pub fn set_orbit(&mut self, orbit: bool) {
        self.orbit = orbit;
        if !orbit {
            self.update_vectors();
        }
    }

    /// Map one frame of input onto the camera.
    pub fn apply_input(&mut self, input: &Input, frame: &FrameInfo) {
        let dt = frame.delta_seconds;
        self.boost = input.is_key_down(Key::LeftShift);
        if input.was_key_pressed(Key::O) {
            self.set_orbit(!self.orbit);
        }
        for (key, movement) in [
            (Key::W, Movement::Forward),
            (Key::S, Movement::Backward),
            (Key::A, Movement::Left),
            (Key::D, Movement::Right),
            (Key::Space, Movement::Up),
        ] {
            if input.is_key_down(key) {
                self.process_keyboard(movement, dt);
            }
        }

        let (dx, dy) = input.mouse_delta();
        if self.orbit {
            if input.is_button_down(MouseButton::Left) {
                let (w, h) = frame.viewport_size;
                self.process_arc_ball(-dx, -dy, w as f32, h as f32);
            }
        } else if input.is_button_down(MouseButton::Right) {
            // Window y grows downwards.
            self.process_mouse(dx, -dy);
        }

        let scroll = input.scroll();
        if scroll != 0.0 {
            self.process_scroll(scroll);
        }
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(-3.0, 5.0, -15.0), DEFAULT_YAW, DEFAULT_PITCH)
    }
}
