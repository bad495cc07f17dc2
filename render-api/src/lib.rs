//! Shared render backend API for Penumbra.
//! The host fills an [`Input`] snapshot from its window events and drives any backend through
//! [`RenderBackend`] (update + render_frame), optionally presenting via [`RenderBackendWindow`].

mod backend;
mod frame;
mod input;

pub use backend::{RenderBackend, RenderBackendWindow};
pub use frame::{FrameInfo, RenderMode, RenderTarget};
pub use input::{ButtonState, Input, Key, MouseButton};
pub use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
