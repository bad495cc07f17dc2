use thiserror::Error;

#[derive(Debug, Error)]
pub enum RhiError {
    #[error("unknown {kind} handle {index}")]
    UnknownHandle { kind: &'static str, index: u32 },

    #[error("shader compilation failed for '{name}':\n{diagnostic}")]
    ShaderCompilation { name: String, diagnostic: String },

    #[error("buffer write out of bounds: offset {offset} + {len} bytes exceeds size {size}")]
    OutOfBounds { offset: u64, len: u64, size: u64 },

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("invalid command list: {0}")]
    InvalidCommand(String),

    #[error("backend error: {0}")]
    Backend(String),
}
