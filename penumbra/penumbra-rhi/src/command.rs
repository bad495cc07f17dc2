//! Recorded command lists. The renderer records one list per frame; the device replays it.

use crate::{BufferId, FramebufferId, PipelineState, ProgramId, TextureId, VertexArrayId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOp<T> {
    Load,
    Clear(T),
}

/// Where a pass draws: the presentable default target or an offscreen framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTargetRef {
    Default,
    Framebuffer(FramebufferId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassDescriptor {
    pub label: &'static str,
    pub target: RenderTargetRef,
    pub color_load: LoadOp<ClearColor>,
    /// Ignored when the target has no depth attachment.
    pub depth_load: LoadOp<f32>,
    /// Ignored when the target has no stencil aspect.
    pub stencil_load: LoadOp<u32>,
}

impl PassDescriptor {
    /// Load everything the target already holds.
    pub fn load(label: &'static str, target: RenderTargetRef) -> Self {
        Self {
            label,
            target,
            color_load: LoadOp::Load,
            depth_load: LoadOp::Load,
            stencil_load: LoadOp::Load,
        }
    }

    /// Clear color to `color`, depth to 1.0 and stencil to 0.
    pub fn clear(label: &'static str, target: RenderTargetRef, color: ClearColor) -> Self {
        Self {
            label,
            target,
            color_load: LoadOp::Clear(color),
            depth_load: LoadOp::Clear(1.0),
            stencil_load: LoadOp::Clear(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BeginPass(PassDescriptor),
    SetViewport { width: u32, height: u32 },
    SetState(PipelineState),
    UseProgram(ProgramId),
    /// Bind `[offset, offset + size)` of a uniform buffer to `binding` in the uniform group.
    BindUniformRange { binding: u32, buffer: BufferId, offset: u64, size: u64 },
    BindTexture { unit: u32, texture: TextureId },
    BindVertexArray(VertexArrayId),
    DrawIndexed { index_count: u32, first_index: u32 },
    EndPass,
}

/// Per-pass summary used by tests and the headless trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub label: &'static str,
    pub target: RenderTargetRef,
    pub draws: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandList {
    commands: Vec<Command>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_pass(&mut self, desc: PassDescriptor) {
        self.commands.push(Command::BeginPass(desc));
    }

    pub fn end_pass(&mut self) {
        self.commands.push(Command::EndPass);
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.commands.push(Command::SetViewport { width, height });
    }

    pub fn set_state(&mut self, state: PipelineState) {
        self.commands.push(Command::SetState(state));
    }

    pub fn use_program(&mut self, program: ProgramId) {
        self.commands.push(Command::UseProgram(program));
    }

    pub fn bind_uniform_range(&mut self, binding: u32, buffer: BufferId, offset: u64, size: u64) {
        self.commands.push(Command::BindUniformRange {
            binding,
            buffer,
            offset,
            size,
        });
    }

    pub fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.commands.push(Command::BindTexture { unit, texture });
    }

    pub fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.commands.push(Command::BindVertexArray(vertex_array));
    }

    pub fn draw_indexed(&mut self, index_count: u32, first_index: u32) {
        self.commands.push(Command::DrawIndexed {
            index_count,
            first_index,
        });
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::DrawIndexed { .. }))
            .count()
    }

    /// Passes in recording order with their draw counts.
    pub fn passes(&self) -> Vec<PassSummary> {
        let mut out: Vec<PassSummary> = Vec::new();
        for command in &self.commands {
            match command {
                Command::BeginPass(desc) => out.push(PassSummary {
                    label: desc.label,
                    target: desc.target,
                    draws: 0,
                }),
                Command::DrawIndexed { .. } => {
                    if let Some(last) = out.last_mut() {
                        last.draws += 1;
                    }
                }
                _ => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_count_draws_per_pass() {
        let mut list = CommandList::new();
        list.begin_pass(PassDescriptor::clear("a", RenderTargetRef::Default, ClearColor::BLACK));
        list.draw_indexed(3, 0);
        list.draw_indexed(6, 3);
        list.end_pass();
        list.begin_pass(PassDescriptor::load("b", RenderTargetRef::Framebuffer(FramebufferId(2))));
        list.end_pass();

        let passes = list.passes();
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[0].label, "a");
        assert_eq!(passes[0].draws, 2);
        assert_eq!(passes[1].target, RenderTargetRef::Framebuffer(FramebufferId(2)));
        assert_eq!(passes[1].draws, 0);
        assert_eq!(list.draw_count(), 2);
    }
}
