//! Constant buffer allocator: a GPU uniform buffer filled through a CPU shadow with a moving head.
//!
//! Writes happen inside a [`MappedBuffer`] scope. `finish` uploads `[0, head)`; dropping the
//! scope without finishing unmaps without uploading. Offsets handed out stay valid until the
//! next [`ConstantBuffer::reset`].

use glam::{Mat4, Vec3, Vec4};
use penumbra_rhi::{BufferDescriptor, BufferId, BufferUsage, GpuDevice};

use crate::error::ConstantBufferError;

/// Round `value` up to the next multiple of `alignment` (any non-zero value).
pub fn align_up(value: u32, alignment: u32) -> u64 {
    let a = u64::from(alignment);
    (u64::from(value) + a - 1) / a * a
}

/// Byte range of a constant buffer bound to one uniform binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UniformRange {
    pub offset: u32,
    pub size: u32,
}

#[derive(Debug)]
pub struct ConstantBuffer {
    label: String,
    handle: BufferId,
    capacity: u32,
    head: u32,
    mapped: bool,
    shadow: Vec<u8>,
}

impl ConstantBuffer {
    pub fn new(device: &mut dyn GpuDevice, label: &str, capacity: u32) -> Result<Self, ConstantBufferError> {
        let handle = device.create_buffer(
            &BufferDescriptor {
                label: Some(label),
                size: u64::from(capacity),
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            },
            None,
        )?;
        log::debug!("constant buffer '{label}': {capacity} bytes");
        Ok(Self {
            label: label.to_string(),
            handle,
            capacity,
            head: 0,
            mapped: false,
            shadow: vec![0; capacity as usize],
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn handle(&self) -> BufferId {
        self.handle
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn head(&self) -> u32 {
        self.head
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    /// Rewind to offset 0. Called before every frame's packing.
    pub fn reset(&mut self) {
        self.head = 0;
    }

    /// Start a write scope. The head is kept; call [`ConstantBuffer::reset`] first to rewrite from 0.
    pub fn map(&mut self) -> MappedBuffer<'_> {
        self.mapped = true;
        MappedBuffer {
            buffer: self,
            finished: false,
        }
    }

    /// Checked binding of a range written this frame.
    pub fn binding(&self, range: UniformRange) -> Result<(BufferId, UniformRange), ConstantBufferError> {
        if self.mapped {
            return Err(ConstantBufferError::Mapped(self.label.clone()));
        }
        if range.size == 0 || u64::from(range.offset) + u64::from(range.size) > u64::from(self.head) {
            return Err(ConstantBufferError::Unwritten {
                label: self.label.clone(),
                offset: range.offset,
                size: range.size,
                head: self.head,
            });
        }
        Ok((self.handle, range))
    }

    /// Bytes written so far (what the GPU sees after `finish`).
    pub fn written(&self) -> &[u8] {
        &self.shadow[..self.head as usize]
    }
}

/// Write scope over a [`ConstantBuffer`]; exclusive while alive.
pub struct MappedBuffer<'a> {
    buffer: &'a mut ConstantBuffer,
    finished: bool,
}

impl MappedBuffer<'_> {
    pub fn head(&self) -> u32 {
        self.buffer.head
    }

    /// Move the head to the next multiple of `alignment`. Returns the new head.
    pub fn align_head(&mut self, alignment: u32) -> Result<u32, ConstantBufferError> {
        if alignment == 0 {
            return Err(ConstantBufferError::ZeroAlignment);
        }
        let aligned = align_up(self.buffer.head, alignment);
        if aligned > u64::from(self.buffer.capacity) {
            return Err(self.overflow(0));
        }
        // Padding bytes are zeroed so uploads are deterministic.
        let start = self.buffer.head as usize;
        self.buffer.shadow[start..aligned as usize].fill(0);
        self.buffer.head = aligned as u32;
        Ok(self.buffer.head)
    }

    /// Copy `bytes` at the head and advance. Returns the offset written at.
    pub fn push(&mut self, bytes: &[u8]) -> Result<u32, ConstantBufferError> {
        let offset = self.buffer.head;
        let end = u64::from(offset) + bytes.len() as u64;
        if end > u64::from(self.buffer.capacity) {
            return Err(self.overflow(bytes.len()));
        }
        self.buffer.shadow[offset as usize..end as usize].copy_from_slice(bytes);
        self.buffer.head = end as u32;
        Ok(offset)
    }

    /// Zero-fill up to `offset` (no-op when the head is already past it).
    pub fn pad_to(&mut self, offset: u32) -> Result<(), ConstantBufferError> {
        let head = self.buffer.head;
        if offset > head {
            let zeros = vec![0u8; (offset - head) as usize];
            self.push(&zeros)?;
        }
        Ok(())
    }

    pub fn push_u32(&mut self, value: u32) -> Result<u32, ConstantBufferError> {
        self.align_head(4)?;
        self.push(&value.to_le_bytes())
    }

    pub fn push_f32(&mut self, value: f32) -> Result<u32, ConstantBufferError> {
        self.align_head(4)?;
        self.push(&value.to_le_bytes())
    }

    /// 16-byte aligned, 12 bytes written; a following scalar packs into the last lane.
    pub fn push_vec3(&mut self, value: Vec3) -> Result<u32, ConstantBufferError> {
        self.align_head(16)?;
        self.push(bytemuck::cast_slice(&value.to_array()))
    }

    pub fn push_vec4(&mut self, value: Vec4) -> Result<u32, ConstantBufferError> {
        self.align_head(16)?;
        self.push(bytemuck::cast_slice(&value.to_array()))
    }

    /// Column-major, 64 bytes.
    pub fn push_mat4(&mut self, value: &Mat4) -> Result<u32, ConstantBufferError> {
        self.align_head(16)?;
        self.push(bytemuck::cast_slice(&value.to_cols_array()))
    }

    /// Upload `[0, head)` and unmap.
    pub fn finish(mut self, device: &mut dyn GpuDevice) -> Result<(), ConstantBufferError> {
        let head = self.buffer.head as usize;
        if head > 0 {
            device.write_buffer(self.buffer.handle, 0, &self.buffer.shadow[..head])?;
        }
        self.finished = true;
        Ok(())
    }

    fn overflow(&self, requested: usize) -> ConstantBufferError {
        ConstantBufferError::Overflow {
            label: self.buffer.label.clone(),
            head: self.buffer.head,
            requested: requested as u32,
            capacity: self.buffer.capacity,
        }
    }
}

impl Drop for MappedBuffer<'_> {
    fn drop(&mut self) {
        self.buffer.mapped = false;
        if !self.finished {
            log::warn!(
                "constant buffer '{}' unmapped without upload ({} bytes discarded)",
                self.buffer.label,
                self.buffer.head
            );
        }
    }
}
