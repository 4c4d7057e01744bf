//! Test support: scriptable in-memory handlers.
//!
//! `MockHandler` implements the full handler contract without touching
//! any real codec. Conversions prepend the output format tag to each
//! file's bytes, so tests can assert which steps actually ran.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::format::{FileData, FormatDescriptor};
use crate::handler::{Handler, HandlerError};

/// An in-memory handler with scriptable failure modes.
pub struct MockHandler {
    name: String,
    formats: Vec<FormatDescriptor>,
    any_input: bool,
    fail_init: bool,
    fail_convert: bool,
    empty_output: bool,
    ready: AtomicBool,
    init_calls: AtomicUsize,
    convert_calls: AtomicUsize,
}

impl MockHandler {
    pub fn new(name: impl Into<String>, formats: Vec<FormatDescriptor>) -> Self {
        Self {
            name: name.into(),
            formats,
            any_input: false,
            fail_init: false,
            fail_convert: false,
            empty_output: false,
            ready: AtomicBool::new(false),
            init_calls: AtomicUsize::new(0),
            convert_calls: AtomicUsize::new(0),
        }
    }

    /// Every `init` call fails and `ready` stays false.
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Every `convert` call returns an error.
    pub fn failing_convert(mut self) -> Self {
        self.fail_convert = true;
        self
    }

    /// `convert` succeeds but returns zero-length bytes.
    pub fn empty_output(mut self) -> Self {
        self.empty_output = true;
        self
    }

    pub fn any_input(mut self) -> Self {
        self.any_input = true;
        self
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn convert_calls(&self) -> usize {
        self.convert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Handler for MockHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_formats(&self) -> Vec<FormatDescriptor> {
        if self.ready() {
            self.formats.clone()
        } else {
            Vec::new()
        }
    }

    fn supports_any_input(&self) -> bool {
        self.any_input
    }

    fn ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn init(&self) -> Result<(), HandlerError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(HandlerError::Init(format!("{} refused to start", self.name)));
        }
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn convert(
        &self,
        files: Vec<FileData>,
        _input: &FormatDescriptor,
        output: &FormatDescriptor,
    ) -> Result<Vec<FileData>, HandlerError> {
        self.convert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_convert {
            return Err(HandlerError::Failed(format!(
                "{} cannot produce {}",
                self.name, output.format
            )));
        }
        Ok(files
            .into_iter()
            .map(|file| {
                let stem = file.name.rsplit_once('.').map(|(s, _)| s).unwrap_or(&file.name);
                let name = format!("{}.{}", stem, output.extension);
                let bytes = if self.empty_output {
                    Vec::new()
                } else {
                    let mut bytes = output.format.clone().into_bytes();
                    bytes.push(b':');
                    bytes.extend_from_slice(&file.bytes);
                    bytes
                };
                FileData::new(name, bytes)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> FormatDescriptor {
        FormatDescriptor::new("PNG", "png", "png", "image/png")
            .accepting()
            .producing()
            .lossless()
            .category("image")
    }

    fn jpeg() -> FormatDescriptor {
        FormatDescriptor::new("JPEG", "jpeg", "jpg", "image/jpeg")
            .accepting()
            .producing()
            .category("image")
    }

    #[tokio::test]
    async fn test_init_populates_formats() {
        let handler = MockHandler::new("mock", vec![png()]);
        assert!(handler.supported_formats().is_empty());
        handler.init().await.unwrap();
        assert!(handler.ready());
        assert_eq!(handler.supported_formats().len(), 1);
        assert_eq!(handler.init_calls(), 1);
    }

    #[tokio::test]
    async fn test_convert_tags_output() {
        let handler = MockHandler::new("mock", vec![png(), jpeg()]);
        handler.init().await.unwrap();
        let out = handler
            .convert(vec![FileData::new("photo.png", b"raw".to_vec())], &png(), &jpeg())
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "photo.jpg");
        assert_eq!(out[0].bytes, b"jpeg:raw");
    }

    #[tokio::test]
    async fn test_failing_init_stays_unready() {
        let handler = MockHandler::new("mock", vec![png()]).failing_init();
        assert!(handler.init().await.is_err());
        assert!(!handler.ready());
    }
}
