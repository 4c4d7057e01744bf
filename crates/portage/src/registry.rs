//! Registry of handlers and the format options they expose.
//!
//! The registry owns the handler list and the supported-format cache,
//! initializes handlers that the cache does not already cover, and
//! flattens everything into a dense option list for lookup by extension
//! or MIME.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::cache::FormatCache;
use crate::format::{FileData, FormatDescriptor};
use crate::handler::{Handler, HandlerError};
use crate::mime::normalize_mime;

/// One `(handler, format)` pairing, with a dense index into the flat
/// option list. The index exists for UI binding; the core attaches no
/// meaning to it.
#[derive(Clone)]
pub struct FormatOption {
    pub handler: Arc<dyn Handler>,
    pub format: FormatDescriptor,
    pub index: usize,
}

impl fmt::Debug for FormatOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatOption")
            .field("handler", &self.handler.name())
            .field("format", &self.format.format)
            .field("mime", &self.format.mime)
            .field("index", &self.index)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate handler name: {0}")]
    DuplicateHandler(String),

    #[error("cache entry for {handler} carries unnormalized MIME {mime}")]
    UnnormalizedMime { handler: String, mime: String },
}

/// Handler set, format cache, and the flattened option list.
pub struct Registry {
    handlers: Vec<Arc<dyn Handler>>,
    cache: FormatCache,
    options: Vec<FormatOption>,
    any_input: Vec<Arc<dyn Handler>>,
}

impl Registry {
    /// Create a registry with an empty cache.
    pub fn new(handlers: Vec<Arc<dyn Handler>>) -> Result<Self, RegistryError> {
        Self::with_cache(handlers, FormatCache::new())
    }

    /// Create a registry over a previously persisted cache.
    ///
    /// Every MIME in the cache must already be normalized; leakage of raw
    /// spellings into persisted state is a configuration error.
    pub fn with_cache(
        handlers: Vec<Arc<dyn Handler>>,
        cache: FormatCache,
    ) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for handler in &handlers {
            if !seen.insert(handler.name().to_owned()) {
                return Err(RegistryError::DuplicateHandler(handler.name().to_owned()));
            }
        }
        for (name, formats) in cache.iter() {
            for format in formats {
                if normalize_mime(&format.mime) != format.mime {
                    return Err(RegistryError::UnnormalizedMime {
                        handler: name.to_owned(),
                        mime: format.mime.clone(),
                    });
                }
            }
        }
        Ok(Self {
            handlers,
            cache,
            options: Vec::new(),
            any_input: Vec::new(),
        })
    }

    /// Initialize handlers missing from the cache and rebuild the option
    /// list.
    ///
    /// A handler whose `init` fails is skipped for the rest of this
    /// build; everything else proceeds without it.
    pub async fn init(&mut self) {
        for handler in &self.handlers {
            if self.cache.contains(handler.name()) {
                continue;
            }
            match handler.init().await {
                Ok(()) => {
                    let formats = normalized_formats(handler.as_ref());
                    self.cache.fill(handler.name(), formats);
                }
                Err(error) => {
                    warn!(handler = handler.name(), %error, "handler failed to initialize, excluding it");
                }
            }
        }
        self.rebuild_options();
    }

    fn rebuild_options(&mut self) {
        self.options.clear();
        let mut index = 0;
        for handler in &self.handlers {
            let Some(formats) = self.cache.get(handler.name()) else {
                continue;
            };
            for format in formats {
                if format.mime.is_empty() {
                    continue;
                }
                self.options.push(FormatOption {
                    handler: Arc::clone(handler),
                    format: format.clone(),
                    index,
                });
                index += 1;
            }
        }
        self.any_input = self
            .handlers
            .iter()
            .filter(|h| h.supports_any_input())
            .cloned()
            .collect();
    }

    /// Look up an input-capable option by filename extension,
    /// case-insensitively.
    pub fn by_extension(&self, extension: &str) -> Option<&FormatOption> {
        self.options
            .iter()
            .find(|o| o.format.from && o.format.extension.eq_ignore_ascii_case(extension))
    }

    /// Look up an input-capable option by MIME. The query is normalized
    /// first; when nothing matches, any-input handlers serve as a
    /// fallback.
    pub fn by_mime(&self, mime: &str) -> Option<&FormatOption> {
        let mime = normalize_mime(mime);
        self.options
            .iter()
            .find(|o| o.format.from && o.format.mime == mime)
            .or_else(|| {
                self.any_input.iter().find_map(|handler| {
                    self.options
                        .iter()
                        .find(|o| o.format.from && o.handler.name() == handler.name())
                })
            })
    }

    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    pub fn cache(&self) -> &FormatCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut FormatCache {
        &mut self.cache
    }

    pub fn options(&self) -> &[FormatOption] {
        &self.options
    }

    /// Handlers declaring `supports_any_input`, precomputed at build.
    pub fn any_input_handlers(&self) -> &[Arc<dyn Handler>] {
        &self.any_input
    }
}

/// A handler's declared formats with every MIME normalized.
pub fn normalized_formats(handler: &dyn Handler) -> Vec<FormatDescriptor> {
    handler
        .supported_formats()
        .into_iter()
        .map(|mut format| {
            format.mime = normalize_mime(&format.mime).to_owned();
            format
        })
        .collect()
}

/// A handler materialized from a cache entry alone.
///
/// Ready from the start, no-op `init`, and `convert` always fails with
/// `Unsupported`. This is how routes are planned against a persisted
/// cache without any live handler implementations.
pub struct DeclaredHandler {
    name: String,
    formats: Vec<FormatDescriptor>,
}

impl DeclaredHandler {
    pub fn new(name: impl Into<String>, formats: Vec<FormatDescriptor>) -> Self {
        Self {
            name: name.into(),
            formats,
        }
    }
}

#[async_trait]
impl Handler for DeclaredHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_formats(&self) -> Vec<FormatDescriptor> {
        self.formats.clone()
    }

    fn ready(&self) -> bool {
        true
    }

    async fn init(&self) -> Result<(), HandlerError> {
        Ok(())
    }

    async fn convert(
        &self,
        _files: Vec<FileData>,
        _input: &FormatDescriptor,
        _output: &FormatDescriptor,
    ) -> Result<Vec<FileData>, HandlerError> {
        Err(HandlerError::Unsupported)
    }
}

/// One declaration-only handler per cache entry, in cache order.
pub fn declared_handlers(cache: &FormatCache) -> Vec<Arc<dyn Handler>> {
    cache
        .iter()
        .map(|(name, formats)| {
            Arc::new(DeclaredHandler::new(name, formats.to_vec())) as Arc<dyn Handler>
        })
        .collect()
}
