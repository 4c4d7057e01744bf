//! The handler contract.
//!
//! A handler is an opaque actor that converts between the formats it
//! declares. It may be slow, may fail, and may produce empty output; the
//! executor treats all of that as recoverable. Handlers are large and
//! stateful, so every subsystem refers to them through `Arc<dyn Handler>`.

use async_trait::async_trait;

use crate::format::{FileData, FormatDescriptor};

/// An actor that converts files between its declared formats.
///
/// `init` must be idempotent and safe to call multiple times; `ready`
/// reports whether a prior `init` succeeded. `supported_formats` is only
/// meaningful once `ready` is true.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Globally unique, non-empty name.
    fn name(&self) -> &str;

    /// The formats this handler declared, populated by a successful
    /// `init`. Empty before that.
    fn supported_formats(&self) -> Vec<FormatDescriptor>;

    /// Handlers with this flag act as fallbacks when no declared format
    /// matches an input MIME.
    fn supports_any_input(&self) -> bool {
        false
    }

    /// Whether a prior `init` succeeded.
    fn ready(&self) -> bool;

    /// Prepare the handler (load a binary module, fetch resources, ...).
    async fn init(&self) -> Result<(), HandlerError>;

    /// Convert `files` from `input` to `output`, both of which this
    /// handler previously declared. Output bytes must be non-empty on
    /// success.
    async fn convert(
        &self,
        files: Vec<FileData>,
        input: &FormatDescriptor,
        output: &FormatDescriptor,
    ) -> Result<Vec<FileData>, HandlerError>;
}

/// Errors surfaced by handlers.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("handler initialization failed: {0}")]
    Init(String),

    #[error("conversion failed: {0}")]
    Failed(String),

    #[error("conversion not supported by this handler")]
    Unsupported,

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
